//! Per-document pipeline and the fold that builds the regulation database.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::fields::{extract_tyre_fields, TyreFields};
use crate::locate::find_tyre_article_id;
use crate::segment::{segment_articles, HeadingStyle};
use crate::source::PageTextSource;

pub const ZERO_ALLOCATION_WARNING: &str = "allocation count is 0; no allocation phrasing matched";

/// One regulation document: its edition year and where its text lives.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentRef {
    pub year: u16,
    pub path: PathBuf,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub heading_style: Option<HeadingStyle>,
}

impl DocumentRef {
    pub fn new(year: u16, path: impl Into<PathBuf>) -> Self {
        Self { year, path: path.into(), heading_style: None }
    }

    pub fn with_heading_style(mut self, style: HeadingStyle) -> Self {
        self.heading_style = Some(style);
        self
    }

    pub fn heading_style(&self) -> HeadingStyle {
        self.heading_style.unwrap_or_else(|| HeadingStyle::for_year(self.year))
    }
}

/// Tyre rules of one edition, as written to the output file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TyreConstraints {
    pub mandatory_dry_compounds: u32,
    pub total_sets_allocated: u32,
    pub wet_race_exception: bool,
    pub q2_start_tyre_rule: bool,
    pub source_article: String,
}

impl TyreConstraints {
    pub fn new(fields: TyreFields, source_article: impl Into<String>) -> Self {
        Self {
            mandatory_dry_compounds: fields.mandatory_dry_compounds,
            total_sets_allocated: fields.total_sets_allocated,
            wet_race_exception: fields.wet_race_exception,
            q2_start_tyre_rule: fields.q2_start_tyre_rule,
            source_article: source_article.into(),
        }
    }

    /// Validation warnings for a record that was still accepted.
    pub fn warnings(&self) -> Vec<String> {
        let mut out = Vec::new();
        if self.total_sets_allocated == 0 {
            out.push(ZERO_ALLOCATION_WARNING.to_string());
        }
        out
    }
}

/// Year (as string) → tyre rules. Years without a located tyre article are absent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RegulationDatabase(BTreeMap<String, TyreConstraints>);

impl RegulationDatabase {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, year: u16, record: TyreConstraints) {
        self.0.insert(year.to_string(), record);
    }

    pub fn get(&self, year: u16) -> Option<&TyreConstraints> {
        self.0.get(&year.to_string())
    }

    pub fn contains_year(&self, year: u16) -> bool {
        self.0.contains_key(&year.to_string())
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &TyreConstraints)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }
}

/// What happened to one document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum DocumentOutcome {
    Extracted {
        year: u16,
        record: TyreConstraints,
        #[serde(skip_serializing_if = "Option::is_none")]
        allocation_strategy: Option<String>,
        warnings: Vec<String>,
    },
    NotLocated {
        year: u16,
        articles: usize,
    },
    ReadFailed {
        year: u16,
        error: String,
    },
}

impl DocumentOutcome {
    pub fn year(&self) -> u16 {
        match self {
            DocumentOutcome::Extracted { year, .. }
            | DocumentOutcome::NotLocated { year, .. }
            | DocumentOutcome::ReadFailed { year, .. } => *year,
        }
    }

    pub fn record(&self) -> Option<&TyreConstraints> {
        match self {
            DocumentOutcome::Extracted { record, .. } => Some(record),
            _ => None,
        }
    }

    pub fn warnings(&self) -> &[String] {
        match self {
            DocumentOutcome::Extracted { warnings, .. } => warnings.as_slice(),
            _ => &[],
        }
    }
}

/// Segment, locate and extract one document's pages.
pub fn process_pages<I, S>(year: u16, style: HeadingStyle, pages: I) -> DocumentOutcome
where
    I: IntoIterator<Item = Option<S>>,
    S: AsRef<str>,
{
    let articles = segment_articles(pages, style);
    let Some(article_id) = find_tyre_article_id(&articles) else {
        tracing::warn!(year, articles = articles.len(), "could not identify tyre article");
        return DocumentOutcome::NotLocated { year, articles: articles.len() };
    };
    let Some(article) = articles.get(article_id) else {
        return DocumentOutcome::NotLocated { year, articles: articles.len() };
    };

    tracing::info!(year, article = %article.id, "found tyre rules");
    let extraction = extract_tyre_fields(&article.text);
    let record = TyreConstraints::new(extraction.fields, article.id.as_str());
    let warnings = record.warnings();
    for w in &warnings {
        tracing::warn!(year, article = %record.source_article, "{}", w);
    }
    tracing::debug!(year, strategy = ?extraction.allocation_strategy, ?record, "extracted");

    DocumentOutcome::Extracted {
        year,
        record,
        allocation_strategy: extraction.allocation_strategy.map(str::to_string),
        warnings,
    }
}

/// Read one document through `source` and run it through the pipeline.
/// Read failures are reported in the outcome, never propagated.
pub fn process_document<S>(source: &S, doc: &DocumentRef) -> DocumentOutcome
where
    S: PageTextSource + ?Sized,
{
    tracing::info!(year = doc.year, path = %doc.path.display(), "parsing");
    match source.pages(&doc.path) {
        Ok(pages) => process_pages(doc.year, doc.heading_style(), pages),
        Err(e) => {
            tracing::warn!(year = doc.year, path = %doc.path.display(), error = %e, "error reading file");
            DocumentOutcome::ReadFailed { year: doc.year, error: e.to_string() }
        }
    }
}

/// Fold per-document outcomes into the database. Later outcomes for the same year win.
pub fn build_database<'a, I>(outcomes: I) -> RegulationDatabase
where
    I: IntoIterator<Item = &'a DocumentOutcome>,
{
    outcomes.into_iter().fold(RegulationDatabase::new(), |mut db, outcome| {
        if let Some(record) = outcome.record() {
            db.insert(outcome.year(), record.clone());
        }
        db
    })
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineRun {
    pub database: RegulationDatabase,
    pub outcomes: Vec<DocumentOutcome>,
}

impl PipelineRun {
    pub fn warnings(&self) -> usize {
        self.outcomes.iter().map(|o| o.warnings().len()).sum()
    }
}

/// Process all documents and fold the results.
/// `jobs`: `Some(1)` runs on the calling thread, `Some(n)` on a pool of `n`, `None` on the
/// global rayon pool. Outcomes keep the order of `docs` in every case.
pub fn run_pipeline<S>(source: &S, docs: &[DocumentRef], jobs: Option<usize>) -> PipelineRun
where
    S: PageTextSource + Sync + ?Sized,
{
    let outcomes: Vec<DocumentOutcome> = match jobs {
        Some(1) => docs.iter().map(|d| process_document(source, d)).collect(),
        Some(n) => match rayon::ThreadPoolBuilder::new().num_threads(n).build() {
            Ok(pool) => pool.install(|| docs.par_iter().map(|d| process_document(source, d)).collect()),
            Err(e) => {
                tracing::warn!(error = %e, "thread pool unavailable, running sequentially");
                docs.iter().map(|d| process_document(source, d)).collect()
            }
        },
        None => docs.par_iter().map(|d| process_document(source, d)).collect(),
    };

    let database = build_database(&outcomes);
    PipelineRun { database, outcomes }
}

/// Convenience for callers with a year → path mapping.
pub fn documents_from_paths<P: AsRef<Path>>(paths: &BTreeMap<u16, P>) -> Vec<DocumentRef> {
    paths
        .iter()
        .map(|(year, path)| DocumentRef::new(*year, path.as_ref()))
        .collect()
}
