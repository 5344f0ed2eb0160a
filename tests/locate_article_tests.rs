use tyre_rules::locate::{is_tyre_article, HEADER_WINDOW_CHARS};
use tyre_rules::{find_tyre_article_id, segment_articles, HeadingStyle};

#[test]
fn first_matching_article_wins() {
    let pages = vec![Some(
        "10. GENERAL\nnothing here\n24. SUPPLY OF TYRES\nbody\n25. QUANTITY OF TYRES\nbody",
    )];
    let articles = segment_articles(pages, HeadingStyle::Numeric);
    for _ in 0..5 {
        assert_eq!(find_tyre_article_id(&articles), Some("24"));
    }
}

#[test]
fn each_keyword_is_recognised() {
    assert!(is_tyre_article("30. Supply of Tyres during the championship"));
    assert!(is_tyre_article("B6 Quantity of tyres"));
    assert!(is_tyre_article("ARTICLE 12\nThe use of tyres is restricted"));
    assert!(!is_tyre_article("24. TYRES\nEach driver may use"));
}

#[test]
fn not_found_when_keyword_is_beyond_window() {
    let mut body = String::from("24. TYRE RULES\n");
    body.push_str(&"a".repeat(HEADER_WINDOW_CHARS));
    body.push_str("\nsupply of tyres");
    let articles = segment_articles(vec![Some(body)], HeadingStyle::Numeric);
    assert_eq!(find_tyre_article_id(&articles), None);
}

#[test]
fn empty_collection_has_no_tyre_article() {
    let articles = segment_articles(Vec::<Option<String>>::new(), HeadingStyle::Numeric);
    assert_eq!(find_tyre_article_id(&articles), None);
}
