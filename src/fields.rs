//! Pull the four tyre facts out of an article's prose.

use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use serde::{Deserialize, Serialize};

/// The four facts extracted from a tyre article.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TyreFields {
    pub mandatory_dry_compounds: u32,
    pub total_sets_allocated: u32,
    pub wet_race_exception: bool,
    pub q2_start_tyre_rule: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldExtraction {
    pub fields: TyreFields,
    /// Name of the allocation strategy that produced `total_sets_allocated`.
    pub allocation_strategy: Option<&'static str>,
}

/// Convert "thirteen", "13" or "(13)" to an integer. Unknown tokens give 0.
pub fn text_to_int(token: &str) -> u32 {
    let clean: String = token
        .chars()
        .filter(|c| *c != '(' && *c != ')')
        .collect::<String>()
        .to_lowercase();
    match clean.as_str() {
        "one" | "1" => 1,
        "two" | "2" => 2,
        "three" | "3" => 3,
        "four" | "4" => 4,
        "five" | "5" => 5,
        "six" => 6,
        "seven" => 7,
        "eight" | "8" => 8,
        "nine" => 9,
        "ten" => 10,
        "eleven" => 11,
        "twelve" | "12" => 12,
        "thirteen" | "13" => 13,
        "fourteen" => 14,
        _ => 0,
    }
}

fn first_group_value(caps: &Captures<'_>) -> u32 {
    caps.get(1).map_or(0, |m| text_to_int(m.as_str()))
}

/// One way of phrasing the allocation, tried in order by [`extract_allocation`].
pub struct AllocationStrategy {
    pub name: &'static str,
    pattern: Regex,
    value: fn(&Captures<'_>) -> u32,
}

impl AllocationStrategy {
    pub fn new(name: &'static str, pattern: &str, value: fn(&Captures<'_>) -> u32) -> Result<Self, regex::Error> {
        Ok(Self { name, pattern: Regex::new(pattern)?, value })
    }

    /// Value of the first match, or None when there is no match or it normalizes to 0.
    pub fn apply(&self, text: &str) -> Option<u32> {
        let caps = self.pattern.captures(text)?;
        let value = (self.value)(&caps);
        (value > 0).then_some(value)
    }
}

/// Allocation phrasings in priority order. The broad form must stay last: it also matches
/// everything the adjacent form does.
pub static ALLOCATION_STRATEGIES: Lazy<Vec<AllocationStrategy>> = Lazy::new(|| {
    [
        // "allocated thirteen (13) sets"
        ("allocated_adjacent", r"(?is)allocated\s+(\w+|\d+)(?:\s*\(\d+\))?\s+sets"),
        // "use no more than thirteen sets"
        ("use_no_more_than", r"(?is)use\s+no\s+more\s+than\s+(\w+|\d+)\s+sets"),
        // "allocated for each Competition eight (8) sets"
        ("allocated_broad", r"(?is)allocated\s+.*?(\w+|\d+)(?:\s*\(\d+\))?\s+sets"),
    ]
    .into_iter()
    .map(|(name, pattern)| {
        AllocationStrategy::new(name, pattern, first_group_value).expect("valid allocation regex")
    })
    .collect()
});

static MANDATORY_USAGE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?is)must\s+use\s+at\s+least\s+(\w+|\d+)(?:\s*\(\d+\))?\s+different").expect("valid usage regex")
});

static WET_RACE_EXCEPTION: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)unless\s+(?:he|they|the\s+driver)\s+(?:has|have)\s+used\s+intermediate\s+or\s+wet[\s-]weather\s+tyres",
    )
    .expect("valid wet race regex")
});

static Q2_START_TYRE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?is)start\s+the\s+race.*?tyres.*?fastest\s+time.*?during\s+(?:Q2|the\s+second\s+period)")
        .expect("valid q2 regex")
});

/// Number of different dry compounds a driver must use; 0 when not stated.
pub fn extract_mandatory_compounds(text: &str) -> u32 {
    MANDATORY_USAGE
        .captures(text)
        .map_or(0, |caps| first_group_value(&caps))
}

/// Run `strategies` in order; the first non-zero value wins.
pub fn extract_allocation_with<'a>(
    strategies: &'a [AllocationStrategy],
    text: &str,
) -> Option<(u32, &'a str)> {
    strategies
        .iter()
        .find_map(|s| s.apply(text).map(|v| (v, s.name)))
}

pub fn extract_allocation(text: &str) -> Option<(u32, &'static str)> {
    let strategies: &'static [AllocationStrategy] = ALLOCATION_STRATEGIES.as_slice();
    extract_allocation_with(strategies, text)
}

pub fn has_wet_race_exception(text: &str) -> bool {
    WET_RACE_EXCEPTION.is_match(text)
}

pub fn has_q2_start_tyre_rule(text: &str) -> bool {
    Q2_START_TYRE.is_match(text)
}

/// Extract all four facts from the full text of the tyre article.
pub fn extract_tyre_fields(text: &str) -> FieldExtraction {
    let allocation = extract_allocation(text);
    FieldExtraction {
        fields: TyreFields {
            mandatory_dry_compounds: extract_mandatory_compounds(text),
            total_sets_allocated: allocation.map_or(0, |(v, _)| v),
            wet_race_exception: has_wet_race_exception(text),
            q2_start_tyre_rule: has_q2_start_tyre_rule(text),
        },
        allocation_strategy: allocation.map(|(_, name)| name),
    }
}
