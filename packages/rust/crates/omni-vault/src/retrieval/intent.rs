//! Query intent: whole-project overview versus a focused question.

use crate::parser::is_hangul;

/// Retrieval path chosen for a query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryIntent {
    /// Asks about the project as a whole; answered from hubs and clusters.
    Overview,
    /// Anything else; answered from semantic seeds and graph expansion.
    Focused,
}

/// Lowercase, trim and collapse whitespace.
fn normalize_query(query: &str) -> String {
    query
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

/// Lowercased alphanumeric words, punctuation dropped.
fn query_words(text: &str) -> Vec<String> {
    text.split(|ch: char| !ch.is_alphanumeric())
        .filter(|word| !word.is_empty())
        .map(str::to_lowercase)
        .collect()
}

/// Hangul triggers match as substrings so attached particles still hit;
/// other triggers must line up with whole query words.
fn matches_trigger(normalized: &str, words: &[String], trigger: &str) -> bool {
    let trigger = normalize_query(trigger);
    if trigger.is_empty() {
        return false;
    }
    if trigger.chars().any(is_hangul) {
        return normalized.contains(&trigger);
    }
    let trigger_words = query_words(&trigger);
    !trigger_words.is_empty()
        && words
            .windows(trigger_words.len())
            .any(|window| window == trigger_words.as_slice())
}

/// Classify `query` against `overview_triggers`.
#[must_use]
pub fn detect_intent(query: &str, overview_triggers: &[String]) -> QueryIntent {
    let normalized = normalize_query(query);
    if normalized.is_empty() {
        return QueryIntent::Focused;
    }
    let words = query_words(&normalized);
    let is_overview = overview_triggers
        .iter()
        .any(|trigger| matches_trigger(&normalized, &words, trigger));
    if is_overview {
        QueryIntent::Overview
    } else {
        QueryIntent::Focused
    }
}
