use unicode_normalization::UnicodeNormalization;

/// Id used when a path normalizes to nothing.
pub const UNTITLED_DOC_ID: &str = "untitled";
const UNTITLED_SECTION_SLUG: &str = "section";

/// Hangul syllables plus conjoining and compatibility jamo.
pub(crate) fn is_hangul(ch: char) -> bool {
    matches!(
        ch,
        '\u{AC00}'..='\u{D7A3}' | '\u{1100}'..='\u{11FF}' | '\u{3130}'..='\u{318F}'
    )
}

fn keep_id_char(ch: char) -> bool {
    ch.is_ascii_lowercase() || ch.is_ascii_digit() || ch == '_' || is_hangul(ch)
}

fn normalize_id_text(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut in_gap = false;
    for ch in raw.nfc().flat_map(char::to_lowercase) {
        if ch == '/' || ch == '\\' || ch.is_whitespace() {
            if !in_gap {
                out.push('_');
                in_gap = true;
            }
            continue;
        }
        in_gap = false;
        if keep_id_char(ch) {
            out.push(ch);
        }
    }
    out.trim_matches('_').to_string()
}

fn strip_markdown_suffix(path: &str) -> &str {
    let len = path.len();
    if len >= 3 && path.is_char_boundary(len - 3) && path[len - 3..].eq_ignore_ascii_case(".md") {
        &path[..len - 3]
    } else {
        path
    }
}

/// Derive the stable document id for a vault-relative path.
///
/// `Design/Art Bible.md` becomes `design_art_bible`; Hangul survives as-is.
#[must_use]
pub fn file_path_to_doc_id(path: &str) -> String {
    let id = normalize_id_text(strip_markdown_suffix(path.trim()));
    if id.is_empty() {
        UNTITLED_DOC_ID.to_string()
    } else {
        id
    }
}

/// Slug used as the heading part of a section id.
#[must_use]
pub fn slugify_heading(heading: &str) -> String {
    let slug = normalize_id_text(heading);
    if slug.is_empty() {
        UNTITLED_SECTION_SLUG.to_string()
    } else {
        slug
    }
}

/// Split a relative path into `(filename, folder_path)` with `/` separators.
pub(super) fn split_relative_path(relative_path: &str) -> (String, String) {
    let normalized = relative_path.trim().replace('\\', "/");
    let normalized = normalized.trim_start_matches("./").trim_matches('/');
    match normalized.rsplit_once('/') {
        Some((folder, filename)) => (filename.to_string(), folder.to_string()),
        None => (normalized.to_string(), String::new()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn doc_id_strips_suffix_and_joins_folders() {
        assert_eq!(file_path_to_doc_id("Design/Art Bible.md"), "design_art_bible");
        assert_eq!(file_path_to_doc_id("notes\\Weekly  Sync.MD"), "notes_weekly_sync");
    }

    #[test]
    fn doc_id_keeps_hangul_and_drops_punctuation() {
        assert_eq!(file_path_to_doc_id("기획/레벨 디자인!.md"), "기획_레벨_디자인");
        assert_eq!(file_path_to_doc_id("(draft) v2.md"), "draft_v2");
    }

    #[test]
    fn doc_id_composes_decomposed_hangul() {
        let decomposed: String = "회의록.md".nfd().collect();
        assert_eq!(file_path_to_doc_id(&decomposed), "회의록");
    }

    #[test]
    fn doc_id_falls_back_to_sentinel() {
        assert_eq!(file_path_to_doc_id("!!!.md"), UNTITLED_DOC_ID);
        assert_eq!(file_path_to_doc_id(""), UNTITLED_DOC_ID);
    }

    #[test]
    fn doc_id_is_idempotent() {
        for raw in ["A/B c.md", "기획/플랜 노트.md", "x__y.md", "---.md"] {
            let once = file_path_to_doc_id(raw);
            assert_eq!(file_path_to_doc_id(&once), once);
        }
    }

    #[test]
    fn split_path_handles_root_and_nested() {
        assert_eq!(
            split_relative_path("a/b/c.md"),
            ("c.md".to_string(), "a/b".to_string())
        );
        assert_eq!(
            split_relative_path("./c.md"),
            ("c.md".to_string(), String::new())
        );
    }
}
