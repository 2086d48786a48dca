use crate::error::VaultError;
use crate::models::Speaker;
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use regex::Regex;
use serde_yaml::{Mapping, Value};
use std::sync::LazyLock;

pub(super) fn compile_regex(pattern: &str) -> Regex {
    match Regex::new(pattern) {
        Ok(regex) => regex,
        Err(_compile_err) => match Regex::new(r"$^") {
            Ok(fallback) => fallback,
            Err(fallback_err) => panic!("hardcoded fallback regex must compile: {fallback_err}"),
        },
    }
}

static FRONTMATTER_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    compile_regex(r"(?s)\A---[ \t]*\n(?:(.*?)\n)??(?:---|\.\.\.)[ \t]*(?:\n|\z)")
});

const DATE_TIME_FORMATS: &[&str] = &["%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S", "%Y-%m-%d %H:%M"];
const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d", "%Y.%m.%d"];

/// Frontmatter fields the vault model cares about.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(super) struct Frontmatter {
    pub speaker: Speaker,
    pub date: String,
    pub tags: Vec<String>,
}

/// Split a leading frontmatter block off `content`.
///
/// Returns the parsed mapping (if any) and the remaining body.
pub(super) fn split_frontmatter<'a>(
    relative_path: &str,
    content: &'a str,
) -> Result<(Option<Mapping>, &'a str), VaultError> {
    let content = content.strip_prefix('\u{feff}').unwrap_or(content);
    let Some(caps) = FRONTMATTER_REGEX.captures(content) else {
        return Ok((None, content));
    };
    let body = caps.get(0).map_or(content, |m| &content[m.end()..]);
    let raw = caps.get(1).map_or("", |m| m.as_str());
    if raw.trim().is_empty() {
        return Ok((None, body));
    }
    let parsed = serde_yaml::from_str::<Value>(raw).map_err(|err| {
        VaultError::MalformedFrontmatter {
            path: relative_path.to_string(),
            reason: err.to_string(),
        }
    })?;
    match parsed {
        Value::Null => Ok((None, body)),
        Value::Mapping(mapping) => Ok((Some(mapping), body)),
        _ => Err(VaultError::FrontmatterNotMapping {
            path: relative_path.to_string(),
        }),
    }
}

pub(super) fn extract_frontmatter(mapping: Option<&Mapping>) -> Frontmatter {
    let Some(mapping) = mapping else {
        return Frontmatter::default();
    };
    let speaker = mapping
        .get("speaker")
        .and_then(Value::as_str)
        .map_or(Speaker::Unknown, Speaker::from_alias);
    let date = mapping.get("date").map(extract_date).unwrap_or_default();
    let tags = mapping.get("tags").map(extract_tags).unwrap_or_default();
    Frontmatter {
        speaker,
        date,
        tags,
    }
}

fn extract_date(value: &Value) -> String {
    match value {
        Value::String(raw) => normalize_date(raw),
        Value::Tagged(tagged) => extract_date(&tagged.value),
        _ => String::new(),
    }
}

/// Normalize a date or timestamp string to `YYYY-MM-DD`, empty when unparseable.
pub fn normalize_date(raw: &str) -> String {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return String::new();
    }
    if let Ok(timestamp) = DateTime::parse_from_rfc3339(trimmed) {
        return timestamp.date_naive().format("%Y-%m-%d").to_string();
    }
    for format in DATE_TIME_FORMATS {
        if let Ok(timestamp) = NaiveDateTime::parse_from_str(trimmed, format) {
            return timestamp.date().format("%Y-%m-%d").to_string();
        }
    }
    for format in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(trimmed, format) {
            return date.format("%Y-%m-%d").to_string();
        }
    }
    String::new()
}

fn clean_tag(raw: &str) -> Option<String> {
    let cleaned = raw.trim().trim_start_matches('#').trim();
    if cleaned.is_empty() {
        None
    } else {
        Some(cleaned.to_string())
    }
}

fn extract_tags(value: &Value) -> Vec<String> {
    let mut out: Vec<String> = match value {
        Value::String(raw) => raw.split(',').filter_map(clean_tag).collect(),
        Value::Sequence(seq) => seq
            .iter()
            .filter_map(|item| match item {
                Value::String(tag) => clean_tag(tag),
                Value::Number(number) => clean_tag(&number.to_string()),
                _ => None,
            })
            .collect(),
        _ => Vec::new(),
    };
    out.sort();
    out.dedup();
    out
}
