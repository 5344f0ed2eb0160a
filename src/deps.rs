use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DepsResult {
    pub ok: bool,
    pub missing: Vec<String>,
}

/// Check the Poppler tools used to read PDFs.
/// - Required: pdftotext
/// - Optional: pdfinfo (page-by-page extraction)
/// `ok` is true iff required deps are present.
pub fn check_deps() -> DepsResult {
    let mut missing = Vec::new();

    // required
    let has_pdftotext = which::which("pdftotext").is_ok();
    if !has_pdftotext {
        missing.push("pdftotext".to_string());
    }

    // optional; without it pages are split on form feeds
    if which::which("pdfinfo").is_err() {
        missing.push("pdfinfo".to_string());
    }

    DepsResult { ok: has_pdftotext, missing }
}

/// Installation help for missing Poppler tools.
pub fn install_help_for(missing: &[String]) -> String {
    if !missing.iter().any(|m| m == "pdftotext" || m == "pdfinfo") {
        return String::new();
    }
    format!(
        "Missing {}. Install Poppler:\n  sudo apt install poppler-utils\n  brew install poppler",
        missing.join(", ")
    )
}
