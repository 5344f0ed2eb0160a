use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};

use tyre_rules::{
    build_database, documents_from_paths, process_pages, run_pipeline, DocumentOutcome, DocumentRef, HeadingStyle,
    PageTextSource, RegulationDatabase, SourceError, ZERO_ALLOCATION_WARNING,
};

struct FakeSource {
    docs: HashMap<PathBuf, Vec<Option<String>>>,
}

impl FakeSource {
    fn new() -> Self {
        let mut docs = HashMap::new();
        docs.insert(
            PathBuf::from("regs-2019.pdf"),
            vec![
                Some("FIA FORMULA ONE SPORTING REGULATIONS\n23. TYRES\nGeneral".to_string()),
                None,
                Some("24. SUPPLY OF TYRES\nEach driver must use at least two (2) different".to_string()),
                Some("specifications... allocated thirteen (13) sets per event.\nUnless he has used intermediate or wet-weather tyres during the race".to_string()),
            ],
        );
        docs.insert(
            PathBuf::from("regs-2026.pdf"),
            vec![Some("SECTION B SPORTING\nARTICLE B6\nSupply of tyres\nEach driver will be allocated eight (8) sets.".to_string())],
        );
        docs.insert(
            PathBuf::from("regs-2021.pdf"),
            vec![Some("30. SUPPLY OF TYRES\nEach driver must use at least two (2) different specifications.".to_string())],
        );
        docs.insert(
            PathBuf::from("regs-2020.pdf"),
            vec![Some("25. TYRE RESTRICTIONS\nallocated thirteen (13) sets".to_string())],
        );
        Self { docs }
    }
}

impl PageTextSource for FakeSource {
    fn pages(&self, path: &Path) -> Result<Vec<Option<String>>, SourceError> {
        self.docs
            .get(path)
            .cloned()
            .ok_or_else(|| SourceError::FileNotFound(path.display().to_string()))
    }
}

fn all_docs() -> Vec<DocumentRef> {
    vec![
        DocumentRef::new(2018, "missing-2018.pdf"),
        DocumentRef::new(2019, "regs-2019.pdf"),
        DocumentRef::new(2020, "regs-2020.pdf"),
        DocumentRef::new(2021, "regs-2021.pdf"),
        DocumentRef::new(2026, "regs-2026.pdf"),
    ]
}

#[test]
fn numeric_form_document_end_to_end() {
    let pages = vec![Some(
        "24. SUPPLY OF TYRES\nEach driver must use at least two (2) different\nspecifications... allocated thirteen (13) sets per event.",
    )];
    match process_pages(2024, HeadingStyle::Numeric, pages) {
        DocumentOutcome::Extracted { record, warnings, .. } => {
            assert_eq!(record.source_article, "24");
            assert_eq!(record.mandatory_dry_compounds, 2);
            assert_eq!(record.total_sets_allocated, 13);
            assert!(!record.wet_race_exception);
            assert!(!record.q2_start_tyre_rule);
            assert!(warnings.is_empty());
        }
        other => panic!("expected Extracted, got {:?}", other),
    }
}

#[test]
fn batch_skips_unreadable_and_unlocated_years() {
    let source = FakeSource::new();
    let run = run_pipeline(&source, &all_docs(), Some(1));

    let years: Vec<&str> = run.database.iter().map(|(y, _)| y).collect();
    assert_eq!(years, vec!["2019", "2021", "2026"]);

    let r2019 = run.database.get(2019).unwrap();
    assert_eq!(r2019.source_article, "24");
    assert_eq!(r2019.total_sets_allocated, 13);
    assert!(r2019.wet_race_exception);

    let r2026 = run.database.get(2026).unwrap();
    assert_eq!(r2026.source_article, "B6");
    assert_eq!(r2026.total_sets_allocated, 8);

    assert!(matches!(run.outcomes[0], DocumentOutcome::ReadFailed { year: 2018, .. }));
    assert!(matches!(run.outcomes[2], DocumentOutcome::NotLocated { year: 2020, .. }));
    assert!(!run.database.contains_year(2018));
    assert!(!run.database.contains_year(2020));
}

#[test]
fn zero_allocation_is_kept_with_warning() {
    let source = FakeSource::new();
    let run = run_pipeline(&source, &all_docs(), Some(1));

    let r2021 = run.database.get(2021).unwrap();
    assert_eq!(r2021.total_sets_allocated, 0);
    assert_eq!(r2021.mandatory_dry_compounds, 2);
    assert_eq!(run.outcomes[3].warnings(), &[ZERO_ALLOCATION_WARNING.to_string()]);
    assert_eq!(run.warnings(), 1);
}

#[test]
fn parallel_run_matches_sequential_run() {
    let source = FakeSource::new();
    let sequential = run_pipeline(&source, &all_docs(), Some(1));
    let pooled = run_pipeline(&source, &all_docs(), Some(4));
    let global = run_pipeline(&source, &all_docs(), None);
    assert_eq!(sequential, pooled);
    assert_eq!(sequential, global);
}

#[test]
fn output_is_byte_identical_across_runs() {
    let source = FakeSource::new();
    let a = run_pipeline(&source, &all_docs(), None).database.to_json().unwrap();
    let b = run_pipeline(&source, &all_docs(), None).database.to_json().unwrap();
    assert_eq!(a, b);
}

#[test]
fn database_round_trips_through_json() {
    let source = FakeSource::new();
    let db = run_pipeline(&source, &all_docs(), Some(1)).database;
    let bytes = db.to_json().unwrap();
    let back = RegulationDatabase::from_json(&bytes).unwrap();
    assert_eq!(db, back);
}

#[test]
fn serialized_record_has_exactly_five_fields() {
    let source = FakeSource::new();
    let db = run_pipeline(&source, &all_docs(), Some(1)).database;
    let value: serde_json::Value = serde_json::from_slice(&db.to_json().unwrap()).unwrap();
    let rec = value["2019"].as_object().unwrap();
    let mut keys: Vec<&str> = rec.keys().map(|k| k.as_str()).collect();
    keys.sort();
    assert_eq!(
        keys,
        vec![
            "mandatory_dry_compounds",
            "q2_start_tyre_rule",
            "source_article",
            "total_sets_allocated",
            "wet_race_exception"
        ]
    );
    assert_eq!(value["2019"]["total_sets_allocated"], 13);
}

#[test]
fn heading_style_override_changes_segmentation() {
    let source = FakeSource::new();
    let docs = vec![DocumentRef::new(2026, "regs-2026.pdf").with_heading_style(HeadingStyle::Numeric)];
    let run = run_pipeline(&source, &docs, Some(1));
    assert!(run.database.is_empty());
}

#[test]
fn fold_keeps_last_outcome_per_year() {
    let first = process_pages(2022, HeadingStyle::Numeric, vec![Some("1. SUPPLY OF TYRES\nallocated 8 sets")]);
    let second = process_pages(2022, HeadingStyle::Numeric, vec![Some("2. SUPPLY OF TYRES\nallocated 12 sets")]);
    let db = build_database(&[first, second]);
    assert_eq!(db.len(), 1);
    assert_eq!(db.get(2022).unwrap().source_article, "2");
}

#[test]
fn documents_from_year_mapping() {
    let mut paths = BTreeMap::new();
    paths.insert(2026u16, "b.pdf");
    paths.insert(2018u16, "a.pdf");
    let docs = documents_from_paths(&paths);
    assert_eq!(docs[0], DocumentRef::new(2018, "a.pdf"));
    assert_eq!(docs[1].heading_style(), HeadingStyle::Sectioned);
}
