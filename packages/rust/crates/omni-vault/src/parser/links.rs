use super::frontmatter::compile_regex;
use regex::Regex;
use std::borrow::Cow;
use std::sync::LazyLock;

static WIKILINK_REGEX: LazyLock<Regex> =
    LazyLock::new(|| compile_regex(r"(!?)\[\[([^\[\]\n]+?)\]\]"));

/// Reference slugs found in one block of markdown.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(super) struct References {
    pub wiki_links: Vec<String>,
    pub image_embeds: Vec<String>,
}

/// Reduce `target#anchor|display` to `target`.
fn wikilink_target(raw: &str) -> Option<&str> {
    let target = raw.split_once('|').map_or(raw, |(left, _)| left);
    let target = target.split_once('#').map_or(target, |(left, _)| left).trim();
    if target.is_empty() {
        None
    } else {
        Some(target)
    }
}

fn push_unique(out: &mut Vec<String>, value: &str) {
    if !out.iter().any(|existing| existing == value) {
        out.push(value.to_string());
    }
}

pub(super) fn is_code_fence(line: &str) -> bool {
    let trimmed = line.trim_start();
    trimmed.starts_with("```") || trimmed.starts_with("~~~")
}

fn backtick_run_end(bytes: &[u8], start: usize) -> usize {
    let mut end = start;
    while bytes.get(end) == Some(&b'`') {
        end += 1;
    }
    end
}

/// Replace each inline code span with a single space.
///
/// A span opens with a run of backticks and closes at the next run of the
/// same length; an unmatched run stays literal text.
fn blank_code_spans(line: &str) -> Cow<'_, str> {
    if !line.contains('`') {
        return Cow::Borrowed(line);
    }
    let bytes = line.as_bytes();
    let mut out = String::with_capacity(line.len());
    let mut copied = 0;
    let mut idx = 0;
    while idx < bytes.len() {
        if bytes[idx] != b'`' {
            idx += 1;
            continue;
        }
        let open_start = idx;
        let open_end = backtick_run_end(bytes, idx);
        let run = open_end - open_start;
        let mut scan = open_end;
        let mut close_end = None;
        while scan < bytes.len() {
            if bytes[scan] == b'`' {
                let end = backtick_run_end(bytes, scan);
                if end - scan == run {
                    close_end = Some(end);
                    break;
                }
                scan = end;
            } else {
                scan += 1;
            }
        }
        match close_end {
            Some(end) => {
                out.push_str(&line[copied..open_start]);
                out.push(' ');
                copied = end;
                idx = end;
            }
            None => idx = open_end,
        }
    }
    if copied == 0 {
        return Cow::Borrowed(line);
    }
    out.push_str(&line[copied..]);
    Cow::Owned(out)
}

/// Extract `[[wikilinks]]` and `![[embeds]]`, ignoring fenced and inline code.
pub(super) fn extract_references(body: &str) -> References {
    let mut refs = References::default();
    let mut in_code_fence = false;
    for line in body.lines() {
        if is_code_fence(line) {
            in_code_fence = !in_code_fence;
            continue;
        }
        if in_code_fence {
            continue;
        }
        let line = blank_code_spans(line);
        for caps in WIKILINK_REGEX.captures_iter(&line) {
            let Some(target) = caps.get(2).and_then(|m| wikilink_target(m.as_str())) else {
                continue;
            };
            let is_embed = caps.get(1).is_some_and(|m| !m.as_str().is_empty());
            if is_embed {
                push_unique(&mut refs.image_embeds, target);
            } else {
                push_unique(&mut refs.wiki_links, target);
            }
        }
    }
    refs
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_and_anchor_are_stripped() {
        let refs = extract_references("see [[Art Bible#Palette|palette]] and [[ plan ]]");
        assert_eq!(refs.wiki_links, vec!["Art Bible", "plan"]);
    }

    #[test]
    fn embeds_are_kept_apart() {
        let refs = extract_references("![[cover.png]] then [[cover]] and [[cover]]");
        assert_eq!(refs.image_embeds, vec!["cover.png"]);
        assert_eq!(refs.wiki_links, vec!["cover"]);
    }

    #[test]
    fn fenced_code_is_ignored() {
        let refs = extract_references("```\n[[hidden]]\n```\n[[shown]]");
        assert_eq!(refs.wiki_links, vec!["shown"]);
    }

    #[test]
    fn inline_code_spans_are_ignored() {
        let refs = extract_references("use `[[not_a_link]]` syntax, ``![[x.png]] `` or [[real]]");
        assert_eq!(refs.wiki_links, vec!["real"]);
        assert!(refs.image_embeds.is_empty());
    }

    #[test]
    fn unmatched_backticks_stay_literal() {
        assert_eq!(blank_code_spans("a `b` c"), "a   c");
        assert_eq!(blank_code_spans("``x` [[y]]"), "``x` [[y]]");
        let refs = extract_references("stray ` then [[kept]]");
        assert_eq!(refs.wiki_links, vec!["kept"]);
    }
}
