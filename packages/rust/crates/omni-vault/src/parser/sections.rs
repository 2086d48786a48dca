use super::links::{extract_references, is_code_fence};
use super::paths::slugify_heading;
use crate::models::Section;
use std::collections::HashSet;

const INTRO_SUFFIX: &str = "intro";

struct RawSection<'a> {
    heading: Option<String>,
    lines: Vec<&'a str>,
}

impl RawSection<'_> {
    fn text(&self) -> String {
        self.lines.join("\n").trim().to_string()
    }
}

fn parse_level2_heading(line: &str) -> Option<String> {
    let trimmed = line.trim_start();
    let rest = trimmed
        .strip_prefix("## ")
        .or_else(|| trimmed.strip_prefix("##\t"))
        .or_else(|| (trimmed == "##").then_some(""))?;
    Some(rest.trim().trim_end_matches('#').trim().to_string())
}

fn claim_unique_id(candidate: String, used: &mut HashSet<String>) -> String {
    if used.insert(candidate.clone()) {
        return candidate;
    }
    let mut suffix = 2usize;
    loop {
        let next = format!("{candidate}_{suffix}");
        if used.insert(next.clone()) {
            return next;
        }
        suffix += 1;
    }
}

fn build_section(id: String, heading: String, body: String) -> Section {
    let refs = extract_references(&body);
    Section {
        id,
        heading,
        body,
        wiki_links: refs.wiki_links,
        image_embeds: refs.image_embeds,
    }
}

/// Split a document body at level-2 headings.
///
/// Always returns at least one section. Ids are unique within the document.
pub(super) fn split_sections(doc_id: &str, body: &str) -> Vec<Section> {
    let mut raw_sections: Vec<RawSection<'_>> = vec![RawSection {
        heading: None,
        lines: Vec::new(),
    }];
    let mut in_code_fence = false;

    for line in body.lines() {
        if is_code_fence(line) {
            in_code_fence = !in_code_fence;
        } else if !in_code_fence && let Some(heading) = parse_level2_heading(line) {
            raw_sections.push(RawSection {
                heading: Some(heading),
                lines: Vec::new(),
            });
            continue;
        }
        if let Some(current) = raw_sections.last_mut() {
            current.lines.push(line);
        }
    }

    let intro_id = format!("{doc_id}_{INTRO_SUFFIX}");
    if raw_sections.len() == 1 {
        return vec![build_section(intro_id, String::new(), body.trim().to_string())];
    }

    let mut used: HashSet<String> = HashSet::new();
    let mut sections = Vec::with_capacity(raw_sections.len());
    for raw in &raw_sections {
        let text = raw.text();
        match &raw.heading {
            None if text.is_empty() => {}
            None => {
                let id = claim_unique_id(intro_id.clone(), &mut used);
                sections.push(build_section(id, String::new(), text));
            }
            Some(heading) => {
                let candidate = format!("{doc_id}_{}", slugify_heading(heading));
                let id = claim_unique_id(candidate, &mut used);
                sections.push(build_section(id, heading.clone(), text));
            }
        }
    }
    sections
}
