use std::path::Path;
use std::process::Command;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("FileNotFound: {0}")]
    FileNotFound(String),
    #[error("EncryptedPDF: {0}")]
    EncryptedPdf(String),
    #[error("PopplerError: {0}")]
    Poppler(String),
    #[error("ReadFailed: {0}")]
    Io(#[from] std::io::Error),
}

/// Per-page text of a document. Pages that yield no text at all are `None`;
/// whitespace-only pages are kept as text.
pub trait PageTextSource {
    fn pages(&self, path: &Path) -> Result<Vec<Option<String>>, SourceError>;
}

fn page_text(raw: &str) -> Option<String> {
    // pdftotext terminates pages with a form feed
    let text = raw.trim_end_matches('\u{000C}');
    if text.is_empty() {
        None
    } else {
        Some(text.to_string())
    }
}

fn is_encrypted(stderr: &[u8]) -> bool {
    let err = String::from_utf8_lossy(stderr).to_lowercase();
    err.contains("encrypt") || err.contains("password")
}

/// Extract pages with Poppler's `pdftotext`.
/// Uses `pdfinfo` for the page count and extracts page by page; without `pdfinfo`
/// runs a single pass and splits on form feeds.
#[derive(Debug, Clone, Copy, Default)]
pub struct PopplerSource {
    pub layout: bool,
}

impl PopplerSource {
    pub fn new(layout: bool) -> Self {
        Self { layout }
    }

    fn page_count(&self, path: &Path) -> Result<Option<usize>, SourceError> {
        if which::which("pdfinfo").is_err() {
            return Ok(None);
        }
        let out = match Command::new("pdfinfo").arg(path).output() {
            Ok(out) => out,
            Err(_) => return Ok(None),
        };
        if !out.status.success() {
            if is_encrypted(&out.stderr) {
                return Err(SourceError::EncryptedPdf(path.display().to_string()));
            }
            return Ok(None);
        }
        let info = String::from_utf8_lossy(&out.stdout);
        Ok(info
            .lines()
            .find_map(|line| line.strip_prefix("Pages:"))
            .and_then(|rest| rest.trim().parse::<usize>().ok()))
    }

    fn pdftotext(&self, path: &Path, page: Option<usize>) -> Result<String, SourceError> {
        let mut cmd = Command::new("pdftotext");
        if self.layout {
            cmd.arg("-layout");
        }
        cmd.arg("-q");
        if let Some(i) = page {
            cmd.arg("-f").arg(i.to_string());
            cmd.arg("-l").arg(i.to_string());
        }
        cmd.arg(path);
        cmd.arg("-"); // write to stdout

        let out = cmd.output().map_err(|e| SourceError::Poppler(e.to_string()))?;
        if !out.status.success() {
            if is_encrypted(&out.stderr) {
                return Err(SourceError::EncryptedPdf(path.display().to_string()));
            }
            return Err(SourceError::Poppler(match page {
                Some(i) => format!("pdftotext failed on page {}", i),
                None => "pdftotext failed".to_string(),
            }));
        }
        Ok(String::from_utf8_lossy(&out.stdout).into_owned())
    }
}

impl PageTextSource for PopplerSource {
    fn pages(&self, path: &Path) -> Result<Vec<Option<String>>, SourceError> {
        if !path.exists() {
            return Err(SourceError::FileNotFound(path.display().to_string()));
        }

        match self.page_count(path)? {
            Some(n_pages) => (1..=n_pages)
                .map(|i| self.pdftotext(path, Some(i)).map(|raw| page_text(&raw)))
                .collect(),
            None => {
                let raw = self.pdftotext(path, None)?;
                Ok(split_form_feeds(&raw))
            }
        }
    }
}

/// Split text on form feeds into pages, dropping trailing blank pages.
pub fn split_form_feeds(raw: &str) -> Vec<Option<String>> {
    let mut pages: Vec<Option<String>> = raw.split('\u{000C}').map(page_text).collect();
    while pages
        .last()
        .is_some_and(|p| p.as_deref().map_or(true, |t| t.trim().is_empty()))
    {
        pages.pop();
    }
    pages
}

/// Plain UTF-8 text files, one page per form-feed separated block.
#[derive(Debug, Clone, Copy, Default)]
pub struct PlainTextSource;

impl PageTextSource for PlainTextSource {
    fn pages(&self, path: &Path) -> Result<Vec<Option<String>>, SourceError> {
        if !path.exists() {
            return Err(SourceError::FileNotFound(path.display().to_string()));
        }
        let raw = std::fs::read_to_string(path)?;
        Ok(split_form_feeds(&raw))
    }
}

/// `.txt` files are read directly, everything else goes through Poppler.
#[derive(Debug, Clone, Copy, Default)]
pub struct AutoSource {
    pub poppler: PopplerSource,
}

impl AutoSource {
    pub fn new(layout: bool) -> Self {
        Self { poppler: PopplerSource::new(layout) }
    }
}

pub fn is_plain_text(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("txt"))
}

impl PageTextSource for AutoSource {
    fn pages(&self, path: &Path) -> Result<Vec<Option<String>>, SourceError> {
        if is_plain_text(path) {
            PlainTextSource.pages(path)
        } else {
            self.poppler.pages(path)
        }
    }
}
