use crate::segment::ArticleCollection;

/// Phrases that identify the tyre article from its heading or opening sentence.
pub const TYRE_KEYWORDS: [&str; 3] = ["supply of tyres", "quantity of tyres", "use of tyres"];

/// Number of leading characters of an article inspected for keywords.
pub const HEADER_WINDOW_CHARS: usize = 1000;

/// True when the opening window of `text` mentions one of the tyre keywords.
pub fn is_tyre_article(text: &str) -> bool {
    let header: String = text.chars().take(HEADER_WINDOW_CHARS).collect::<String>().to_lowercase();
    TYRE_KEYWORDS.iter().any(|k| header.contains(k))
}

/// Id of the first article, in document order, that governs tyre allocation.
/// Returns None when no article matches; later matches are never considered.
pub fn find_tyre_article_id(articles: &ArticleCollection) -> Option<&str> {
    articles
        .iter()
        .find(|a| is_tyre_article(&a.text))
        .map(|a| a.id.as_str())
}
