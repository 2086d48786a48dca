use super::{ContextEntry, RetrievalContext, RetrievalMode, SelectionReason};
use crate::config::RetrievalConfig;
use crate::models::{Document, Section};
use crate::semantic::{SemanticIndex, tokenize};
use crate::vault::VaultCorpus;
use std::collections::HashSet;
use std::fmt::Write as _;

const TRUNCATION_MARKER: &str = "...";

fn reason_label(reason: &SelectionReason) -> String {
    match reason {
        SelectionReason::Seed { score } => format!("seed {score:.3}"),
        SelectionReason::HubFallback { score } => format!("hub fallback {score:.3}"),
        SelectionReason::Linked { via } => format!("linked via {via}"),
        SelectionReason::ImplicitLink { of, score } => {
            format!("implicit link of {of} {score:.3}")
        }
        SelectionReason::GlobalHub { score } => format!("global hub {score:.3}"),
    }
}

pub(super) fn truncate_chars(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let kept: String = text.chars().take(max_chars).collect();
    format!("{}{TRUNCATION_MARKER}", kept.trim_end())
}

fn section_relevance(
    section: &Section,
    query_terms: &HashSet<String>,
    index: &SemanticIndex,
) -> f64 {
    if query_terms.is_empty() {
        return 0.0;
    }
    let mut seen: HashSet<String> = HashSet::new();
    tokenize(&format!("{}\n{}", section.heading, section.body))
        .into_iter()
        .filter(|term| query_terms.contains(term) && seen.insert(term.clone()))
        .map(|term| index.term_weight(&term).unwrap_or(0.0))
        .sum()
}

/// Sections in display order: query-relevant first when focused, else as authored.
fn ordered_sections<'d>(
    doc: &'d Document,
    query_terms: &HashSet<String>,
    index: Option<&SemanticIndex>,
) -> Vec<&'d Section> {
    let mut scored: Vec<(usize, f64, &Section)> = doc
        .sections
        .iter()
        .enumerate()
        .map(|(position, section)| {
            let relevance =
                index.map_or(0.0, |index| section_relevance(section, query_terms, index));
            (position, relevance, section)
        })
        .collect();
    scored.sort_by(|left, right| {
        right
            .1
            .partial_cmp(&left.1)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| left.0.cmp(&right.0))
    });
    scored.into_iter().map(|(_, _, section)| section).collect()
}

/// Most query-relevant non-empty section of `doc`.
pub(super) fn best_section<'d>(
    doc: &'d Document,
    query: &str,
    index: &SemanticIndex,
) -> Option<&'d Section> {
    let query_terms: HashSet<String> = tokenize(query).into_iter().collect();
    ordered_sections(doc, &query_terms, Some(index))
        .into_iter()
        .find(|section| !section.heading.is_empty() || !section.body.trim().is_empty())
}

fn excerpt(
    doc: &Document,
    query_terms: &HashSet<String>,
    index: Option<&SemanticIndex>,
    max_chars: usize,
) -> String {
    let mut text = String::new();
    for section in ordered_sections(doc, query_terms, index) {
        let body = section.body.trim();
        if section.heading.is_empty() && body.is_empty() {
            continue;
        }
        if !text.is_empty() {
            text.push_str("\n\n");
        }
        if !section.heading.is_empty() {
            let _ = writeln!(text, "#### {}", section.heading);
        }
        text.push_str(body);
        if text.chars().count() > max_chars {
            break;
        }
    }
    truncate_chars(text.trim(), max_chars)
}

fn render_entry(
    out: &mut String,
    doc: &Document,
    entry: &ContextEntry,
    query_terms: &HashSet<String>,
    index: Option<&SemanticIndex>,
    config: &RetrievalConfig,
) {
    let _ = writeln!(out, "### {}", doc.label());
    out.push('\n');
    let body = excerpt(doc, query_terms, index, config.excerpt_chars);
    if !body.is_empty() {
        out.push_str(&body);
        out.push_str("\n\n");
    }
    let _ = writeln!(
        out,
        "_source: {} | speaker: {} | hop: {} | {}_",
        doc.filename,
        doc.speaker,
        entry.hop,
        reason_label(&entry.reason)
    );
    out.push('\n');
}

/// Markdown rendering of `context`; empty string for an empty context.
pub(super) fn render_context(
    corpus: &VaultCorpus,
    index: Option<&SemanticIndex>,
    context: &RetrievalContext,
    config: &RetrievalConfig,
) -> String {
    if context.is_empty() {
        return String::new();
    }
    let query_terms: HashSet<String> = match context.mode {
        RetrievalMode::Focused => tokenize(&context.query).into_iter().collect(),
        RetrievalMode::Global | RetrievalMode::Empty => HashSet::new(),
    };

    let mut out = String::new();
    if !context.hubs.is_empty() || !context.clusters.is_empty() {
        out.push_str("## Vault structure\n\n");
        if !context.hubs.is_empty() {
            out.push_str("### Hub documents\n\n");
            for hub in &context.hubs {
                let _ = writeln!(
                    out,
                    "- {} ({}, rank {:.3})",
                    hub.label, hub.speaker, hub.score
                );
            }
            out.push('\n');
        }
        if !context.clusters.is_empty() {
            out.push_str("### Topic clusters\n\n");
            for cluster in &context.clusters {
                let mut members = cluster.preview.join(", ");
                if cluster.size > cluster.preview.len() {
                    let _ = write!(members, ", +{} more", cluster.size - cluster.preview.len());
                }
                let _ = writeln!(
                    out,
                    "- cluster {} ({} documents): {members}",
                    cluster.cluster_id, cluster.size
                );
            }
            out.push('\n');
        }
    }

    out.push_str("## Retrieved documents\n\n");
    for entry in &context.entries {
        let Some(doc) = corpus.document(&entry.doc_id) else {
            log::warn!("context entry '{}' has no document", entry.doc_id);
            continue;
        };
        render_entry(&mut out, doc, entry, &query_terms, index, config);
    }
    let trimmed_len = out.trim_end().len();
    out.truncate(trimmed_len);
    out.push('\n');
    out
}
