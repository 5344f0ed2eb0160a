//! Split page-ordered regulation text into articles keyed by their heading id.

use std::collections::HashMap;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

/// First edition that numbers its sporting articles with a section letter (`B6`, `B6.1`).
pub const SECTIONED_EDITION_YEAR: u16 = 2026;

// "ARTICLE 24" or "24. SUPPLY OF TYRES" / "24) SUPPLY"; case-insensitive throughout
static NUMERIC_HEADING: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^\s*(?:ARTICLE\s+(\d+)|(\d+)[.)]\s+[A-Z])").expect("valid numeric heading regex")
});

// "ARTICLE B6" or "B6.1 ..."
static SECTIONED_HEADING: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^\s*(?:ARTICLE\s+)?(B\d+(?:\.\d+)?)").expect("valid sectioned heading regex")
});

/// Heading convention used by one edition of the regulations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HeadingStyle {
    Numeric,
    Sectioned,
}

impl HeadingStyle {
    /// Default style for an edition year.
    pub fn for_year(year: u16) -> Self {
        if year == SECTIONED_EDITION_YEAR {
            HeadingStyle::Sectioned
        } else {
            HeadingStyle::Numeric
        }
    }

    pub fn pattern(self) -> &'static Regex {
        match self {
            HeadingStyle::Numeric => &NUMERIC_HEADING,
            HeadingStyle::Sectioned => &SECTIONED_HEADING,
        }
    }

    /// Article id of a heading line: the first non-empty capture group, if the line is a heading.
    pub fn article_id(self, line: &str) -> Option<&str> {
        let caps = self.pattern().captures(line)?;
        caps.iter()
            .skip(1)
            .flatten()
            .map(|m| m.as_str())
            .find(|id| !id.is_empty())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Article {
    pub id: String,
    pub text: String,
}

/// Articles of one document in the order their headings first appeared.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ArticleCollection {
    articles: Vec<Article>,
    index: HashMap<String, usize>,
}

impl ArticleCollection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.articles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.articles.is_empty()
    }

    pub fn get(&self, id: &str) -> Option<&Article> {
        self.index.get(id).map(|&i| &self.articles[i])
    }

    pub fn iter(&self) -> impl Iterator<Item = &Article> {
        self.articles.iter()
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.articles.iter().map(|a| a.id.as_str())
    }

    /// Append one line (plus newline) to `id`, creating the article on first use.
    /// Repeated headings accumulate into the same article.
    pub fn append_line(&mut self, id: &str, line: &str) {
        let slot = match self.index.get(id) {
            Some(&i) => i,
            None => {
                self.articles.push(Article { id: id.to_string(), text: String::new() });
                self.index.insert(id.to_string(), self.articles.len() - 1);
                self.articles.len() - 1
            }
        };
        let text = &mut self.articles[slot].text;
        text.push_str(line);
        text.push('\n');
    }
}

/// Segment pages into articles using `style`.
/// - `None` and empty pages are skipped.
/// - Lines before the first heading belong to no article and are dropped.
/// - Heading lines are kept as the first line of their article.
pub fn segment_articles<I, S>(pages: I, style: HeadingStyle) -> ArticleCollection
where
    I: IntoIterator<Item = Option<S>>,
    S: AsRef<str>,
{
    let mut articles = ArticleCollection::new();
    let mut current: Option<String> = None;

    for page in pages.into_iter().flatten() {
        let text = page.as_ref();
        if text.is_empty() {
            continue;
        }
        for line in text.split('\n') {
            if let Some(id) = style.article_id(line) {
                current = Some(id.to_string());
            }
            if let Some(id) = current.as_deref() {
                articles.append_line(id, line);
            }
        }
    }

    articles
}

/// Segment a document with the default heading style of its edition year.
pub fn segment_document<I, S>(year: u16, pages: I) -> ArticleCollection
where
    I: IntoIterator<Item = Option<S>>,
    S: AsRef<str>,
{
    segment_articles(pages, HeadingStyle::for_year(year))
}
