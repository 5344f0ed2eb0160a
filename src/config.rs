use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use globwalk::GlobWalkerBuilder;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::aggregate::DocumentRef;
use crate::segment::{HeadingStyle, SECTIONED_EDITION_YEAR};

pub const DEFAULT_CONFIG_FILE: &str = "regulations.yaml";
pub const DEFAULT_OUTPUT_FILE: &str = "f1_tyre_constraints.json";

static YEAR_IN_NAME: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?:19|20)\d{2}").expect("valid year regex"));

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentEntry {
    pub year: u16,
    pub path: PathBuf,
    #[serde(default)]
    pub heading_style: Option<HeadingStyle>,
}

fn default_sectioned_years() -> Vec<u16> {
    vec![SECTIONED_EDITION_YEAR]
}

/// Run configuration, read from `regulations.yaml`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunConfig {
    #[serde(default)]
    pub output: Option<PathBuf>,
    #[serde(default)]
    pub layout: bool,
    /// Worker threads; 0 or absent uses the rayon default.
    #[serde(default)]
    pub jobs: Option<usize>,
    #[serde(default = "default_sectioned_years")]
    pub sectioned_years: Vec<u16>,
    #[serde(default)]
    pub documents: Vec<DocumentEntry>,
    /// Glob for regulation files; the year is taken from each file name.
    #[serde(default)]
    pub discover: Option<String>,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            output: None,
            layout: false,
            jobs: None,
            sectioned_years: default_sectioned_years(),
            documents: Vec::new(),
            discover: None,
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config: {0}")]
    Read(String),
    #[error("Failed to parse config: {0}")]
    Parse(String),
    #[error("Invalid config: {0}")]
    Invalid(String),
}

#[derive(Debug, Error)]
pub enum DiscoverError {
    #[error("NoFilesFound")]
    NoFilesFound { guidance: String },
}

/// Parse and validate a run configuration from YAML text.
pub fn parse_config(raw: &str) -> Result<RunConfig, ConfigError> {
    let cfg: RunConfig = serde_yaml::from_str(raw).map_err(|e| ConfigError::Parse(e.to_string()))?;

    if cfg.documents.is_empty() && cfg.discover.as_deref().map_or(true, |g| g.trim().is_empty()) {
        return Err(ConfigError::Invalid("missing documents or discover".into()));
    }

    let mut seen = std::collections::HashSet::new();
    for entry in &cfg.documents {
        if !seen.insert(entry.year) {
            return Err(ConfigError::Invalid(format!("duplicate year: {}", entry.year)));
        }
        if entry.path.as_os_str().is_empty() {
            return Err(ConfigError::Invalid(format!("empty path for year {}", entry.year)));
        }
    }

    Ok(cfg)
}

/// Read and validate `regulations.yaml`.
pub fn load_config(path: &Path) -> Result<RunConfig, ConfigError> {
    let raw = std::fs::read_to_string(path).map_err(|e| ConfigError::Read(e.to_string()))?;
    parse_config(&raw)
}

impl RunConfig {
    pub fn output_path(&self) -> PathBuf {
        self.output
            .clone()
            .unwrap_or_else(|| PathBuf::from(DEFAULT_OUTPUT_FILE))
    }

    /// Rayon pool size; `None` means the global pool.
    pub fn worker_threads(&self) -> Option<usize> {
        self.jobs.filter(|&n| n > 0)
    }

    fn style_for(&self, year: u16, explicit: Option<HeadingStyle>) -> HeadingStyle {
        explicit.unwrap_or(if self.sectioned_years.contains(&year) {
            HeadingStyle::Sectioned
        } else {
            HeadingStyle::Numeric
        })
    }

    /// Documents to process, ordered by year. Explicit entries override discovered files.
    /// A discovery glob that matches nothing is only an error when no explicit
    /// documents are configured.
    pub fn resolve_documents(&self) -> Result<Vec<DocumentRef>, DiscoverError> {
        let mut by_year: BTreeMap<u16, DocumentRef> = BTreeMap::new();

        if let Some(pattern) = self.discover.as_deref().filter(|g| !g.trim().is_empty()) {
            match discover_documents(pattern) {
                Ok(found) => {
                    for doc in found {
                        by_year.entry(doc.year).or_insert(doc);
                    }
                }
                Err(DiscoverError::NoFilesFound { .. }) if !self.documents.is_empty() => {
                    tracing::warn!(pattern, "discovery matched no files; using explicit documents only");
                }
                Err(e) => return Err(e),
            }
        }
        for entry in &self.documents {
            by_year.insert(entry.year, DocumentRef::new(entry.year, entry.path.clone()));
        }

        let explicit: BTreeMap<u16, Option<HeadingStyle>> =
            self.documents.iter().map(|e| (e.year, e.heading_style)).collect();

        Ok(by_year
            .into_values()
            .map(|doc| {
                let style = self.style_for(doc.year, explicit.get(&doc.year).copied().flatten());
                doc.with_heading_style(style)
            })
            .collect())
    }
}

/// Edition year in a file name: the last 19xx/20xx group of the stem.
pub fn year_from_path(path: &Path) -> Option<u16> {
    let stem = path.file_stem()?.to_str()?;
    YEAR_IN_NAME
        .find_iter(stem)
        .last()
        .and_then(|m| m.as_str().parse::<u16>().ok())
}

/// Split a glob into its literal leading directory and the remaining pattern, so the walk
/// starts at the deepest directory that has no glob characters.
pub fn split_glob_base(pattern: &str) -> (PathBuf, String) {
    let is_glob = |c: &str| c.contains(|ch: char| matches!(ch, '*' | '?' | '[' | '{'));
    let components: Vec<&str> = pattern.split('/').collect();
    let literal = components
        .iter()
        .take(components.len().saturating_sub(1))
        .take_while(|c| !is_glob(**c))
        .count();

    let mut base = components[..literal].join("/");
    if base.is_empty() {
        base = if pattern.starts_with('/') { "/".to_string() } else { ".".to_string() };
    }
    (PathBuf::from(base), components[literal..].join("/"))
}

/// Enumerate regulation files with a glob (e.g. "./fia-pdfs/*.pdf") and infer their years.
/// Files whose name carries no year are skipped.
pub fn discover_documents(glob_pattern: &str) -> Result<Vec<DocumentRef>, DiscoverError> {
    let (root, pat) = split_glob_base(glob_pattern);
    let mut paths: Vec<PathBuf> = GlobWalkerBuilder::from_patterns(&root, &[pat.as_str()])
        .case_insensitive(false)
        .follow_links(false)
        .build()
        .map_err(|_| DiscoverError::NoFilesFound { guidance: folder_guidance(glob_pattern) })?
        .filter_map(|e| e.ok())
        .map(|e| e.path().to_path_buf())
        .collect();

    paths.sort();
    paths.retain(|p| p.is_file());

    let mut docs = Vec::with_capacity(paths.len());
    for path in paths {
        match year_from_path(&path) {
            Some(year) => docs.push(DocumentRef::new(year, path)),
            None => tracing::warn!(path = %path.display(), "no year in file name, skipping"),
        }
    }

    if docs.is_empty() {
        return Err(DiscoverError::NoFilesFound { guidance: folder_guidance(glob_pattern) });
    }

    Ok(docs)
}

fn folder_guidance(pattern: &str) -> String {
    format!(
        r#"No regulation files match {}
Name each file after its edition year, for example:
  ./fia-pdfs/fia-sporting-regulations-2018.pdf
  ./fia-pdfs/fia-sporting-regulations-2026.pdf
Or list them explicitly under `documents:` in {}"#,
        pattern, DEFAULT_CONFIG_FILE
    )
}
