//! Term extraction shared by indexing and querying.
//!
//! Tokens are lowercased runs of alphanumeric characters. Hangul tokens lose
//! one trailing particle or verb ending (longest match wins), then a trailing
//! plural `들`, so `기획자들은` and `기획자가` both index as `기획자`. Stop
//! words are checked on the raw token and again on the stripped stem.

use crate::parser::is_hangul;
use std::collections::HashSet;
use std::sync::LazyLock;

const HANGUL_SUFFIXES: &[&str] = &[
    // Compound particles
    "으로부터",
    "에서부터",
    "에게서",
    "한테서",
    "으로서",
    "으로써",
    "에서는",
    "에게는",
    "으로는",
    "까지는",
    "부터는",
    "에서도",
    "에게도",
    "으로도",
    "이라고",
    "이라는",
    "이라면",
    "이지만",
    // Polite and plain verb endings
    "했습니다",
    "였습니다",
    "입니다",
    "습니다",
    "합니다",
    "됩니다",
    "이었다",
    "하였다",
    "했다",
    "한다",
    "하는",
    "하고",
    "하여",
    "해서",
    "하면",
    "되는",
    "되어",
    "된다",
    // Two-syllable particles
    "에서",
    "에게",
    "한테",
    "께서",
    "부터",
    "까지",
    "마다",
    "처럼",
    "보다",
    "조차",
    "밖에",
    "라고",
    "라는",
    "로서",
    "로써",
    "이나",
    "이며",
    "이고",
    "이다",
    "이랑",
    "으로",
    "와의",
    "과의",
    // Single-syllable particles
    "의",
    "은",
    "는",
    "이",
    "가",
    "을",
    "를",
    "에",
    "와",
    "과",
    "도",
    "만",
    "로",
    "께",
    "랑",
];

const PLURAL_SUFFIX: &str = "들";

const STOP_WORDS: &[&str] = &[
    "a", "an", "the", "and", "or", "but", "of", "to", "in", "on", "at", "for", "with", "by",
    "from", "is", "are", "was", "were", "be", "been", "it", "this", "that", "these", "those",
    "as", "what", "which", "who", "how", "why", "when", "where", "do", "does", "did", "can",
    "could", "should", "would", "will", "about", "into", "we", "you", "they", "he", "she", "me",
    "my", "our", "your", "their", "its", "not", "no", "so", "if", "then", "than", "there",
    "here", "그리고", "그러나", "하지만", "그래서", "또한", "및", "등", "것", "수", "이", "그",
    "저", "이것", "그것", "저것", "여기", "거기", "우리", "저희", "무엇", "어떤", "어떻게",
    "왜", "언제", "어디", "좀", "더", "잘", "또", "정말", "너무", "아주", "매우", "있다",
    "없다", "하다", "되다", "같다", "있", "없", "하", "되",
];

static SORTED_SUFFIXES: LazyLock<Vec<&'static str>> = LazyLock::new(|| {
    let mut suffixes: Vec<&'static str> = HANGUL_SUFFIXES.to_vec();
    suffixes.sort_by(|left, right| {
        right
            .chars()
            .count()
            .cmp(&left.chars().count())
            .then_with(|| left.cmp(right))
    });
    suffixes.dedup();
    suffixes
});

static STOP_WORD_SET: LazyLock<HashSet<&'static str>> =
    LazyLock::new(|| STOP_WORDS.iter().copied().collect());

fn is_stop_word(token: &str) -> bool {
    STOP_WORD_SET.contains(token)
}

/// Strip one grammatical suffix, longest first, keeping a non-empty stem.
#[must_use]
pub fn strip_hangul_suffix(token: &str) -> &str {
    let mut stem = token;
    for suffix in SORTED_SUFFIXES.iter() {
        if let Some(rest) = stem.strip_suffix(suffix)
            && !rest.is_empty()
        {
            stem = rest;
            break;
        }
    }
    if let Some(rest) = stem.strip_suffix(PLURAL_SUFFIX)
        && !rest.is_empty()
    {
        stem = rest;
    }
    stem
}

/// Split text into index terms.
#[must_use]
pub fn tokenize(text: &str) -> Vec<String> {
    let mut terms = Vec::new();
    for raw in text.split(|ch: char| !ch.is_alphanumeric()) {
        if raw.is_empty() {
            continue;
        }
        let token = raw.to_lowercase();
        if is_stop_word(&token) {
            continue;
        }
        if token.chars().any(is_hangul) {
            let stem = strip_hangul_suffix(&token);
            if !is_stop_word(stem) {
                terms.push(stem.to_string());
            }
            continue;
        }
        if token.chars().count() < 2 {
            continue;
        }
        terms.push(token);
    }
    terms
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn suffix_table_is_large_enough() {
        assert!(HANGUL_SUFFIXES.len() >= 50);
    }

    #[test]
    fn inflected_forms_collapse() {
        assert_eq!(strip_hangul_suffix("기획자들은"), "기획자");
        assert_eq!(strip_hangul_suffix("기획자가"), "기획자");
        assert_eq!(strip_hangul_suffix("서버에서부터"), "서버");
        assert_eq!(strip_hangul_suffix("진행합니다"), "진행");
    }

    #[test]
    fn single_syllable_is_never_emptied() {
        assert_eq!(strip_hangul_suffix("은"), "은");
        assert_eq!(strip_hangul_suffix("들"), "들");
    }

    #[test]
    fn tokenize_mixes_scripts_and_drops_stop_words() {
        let terms = tokenize("The Level design 문서는 그리고 레벨을 UI");
        assert_eq!(terms, vec!["level", "design", "문서", "레벨", "ui"]);
    }

    #[test]
    fn stripped_stop_words_are_dropped() {
        assert!(tokenize("있습니다 하는").is_empty());
    }
}
