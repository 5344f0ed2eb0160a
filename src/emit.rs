use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::aggregate::{DocumentOutcome, PipelineRun, RegulationDatabase};

#[derive(Debug, Error)]
pub enum EmitError {
    #[error("WriteFailed: {0}")]
    WriteFailed(String),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmitPaths {
    pub database_path: String,
    pub report_path: String,
    pub database_sha256: String,
}

/// Sidecar describing one run.
#[derive(Debug, Clone, Serialize)]
pub struct RunReport<'a> {
    pub documents: usize,
    pub extracted: usize,
    pub warnings: usize,
    pub database_sha256: String,
    pub outcomes: &'a [DocumentOutcome],
}

/// Pretty JSON with four-space indentation and a trailing newline.
pub fn to_pretty_json<T: Serialize + ?Sized>(value: &T) -> Result<Vec<u8>, serde_json::Error> {
    let mut buf = Vec::new();
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
    let mut ser = serde_json::Serializer::with_formatter(&mut buf, formatter);
    value.serialize(&mut ser)?;
    buf.push(b'\n');
    Ok(buf)
}

impl RegulationDatabase {
    pub fn to_json(&self) -> Result<Vec<u8>, serde_json::Error> {
        to_pretty_json(self)
    }

    pub fn from_json(bytes: &[u8]) -> Result<Self, serde_json::Error> {
        serde_json::from_slice(bytes)
    }
}

/// `<stem>.meta.json` next to the database file.
pub fn report_path_for(database_path: &Path) -> PathBuf {
    let stem = database_path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("database");
    database_path.with_file_name(format!("{}.meta.json", stem))
}

fn write_atomic(path: &Path, bytes: &[u8]) -> Result<(), EmitError> {
    let pid = std::process::id();
    let name = path
        .file_name()
        .and_then(|s| s.to_str())
        .unwrap_or("out");
    let tmp = path.with_file_name(format!("{}.tmp.{}", name, pid));
    std::fs::write(&tmp, bytes).map_err(|e| EmitError::WriteFailed(e.to_string()))?;
    std::fs::rename(&tmp, path).map_err(|e| EmitError::WriteFailed(e.to_string()))
}

/// Atomically write the database JSON and its run report.
pub fn emit_run(run: &PipelineRun, database_path: &Path) -> Result<EmitPaths, EmitError> {
    if let Some(parent) = database_path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|e| EmitError::WriteFailed(e.to_string()))?;
    }

    let db_bytes = run.database.to_json().map_err(|e| EmitError::WriteFailed(e.to_string()))?;
    let digest = sha256_hex(&db_bytes);

    let report = RunReport {
        documents: run.outcomes.len(),
        extracted: run.database.len(),
        warnings: run.warnings(),
        database_sha256: digest.clone(),
        outcomes: &run.outcomes,
    };
    let report_bytes = to_pretty_json(&report).map_err(|e| EmitError::WriteFailed(e.to_string()))?;
    let report_path = report_path_for(database_path);

    write_atomic(database_path, &db_bytes)?;
    write_atomic(&report_path, &report_bytes)?;

    Ok(EmitPaths {
        database_path: database_path.to_string_lossy().to_string(),
        report_path: report_path.to_string_lossy().to_string(),
        database_sha256: digest,
    })
}

// Utility to compute sha256 hex
pub fn sha256_hex(bytes: &[u8]) -> String {
    use sha2::{Digest, Sha256};
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    let out = hasher.finalize();
    out.iter().map(|b| format!("{:02x}", b)).collect()
}
