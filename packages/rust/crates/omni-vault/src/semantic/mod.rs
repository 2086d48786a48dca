//! TF-IDF semantic index over vault documents.

mod fingerprint;
mod implicit;
mod snapshot;
mod tokenizer;

pub use fingerprint::corpus_fingerprint;
pub use implicit::ImplicitLinks;
pub use snapshot::{
    CacheLookupOutcome, IndexBuildMeta, IndexCacheStatus, SEMANTIC_INDEX_SCHEMA_VERSION,
    load_or_build_index,
};
pub use tokenizer::{strip_hangul_suffix, tokenize};

use crate::models::Document;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap};

/// Sparse term vector, L2-normalized.
pub type TermVector = HashMap<String, f64>;

/// One scored document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SemanticHit {
    /// Document id.
    pub doc_id: String,
    /// Cosine similarity in `[0, 1]`.
    pub score: f64,
}

/// Immutable TF-IDF index.
///
/// Construct with [`SemanticIndex::build`] or restore from a snapshot; there
/// is no in-place update.
#[derive(Debug, Clone, PartialEq)]
pub struct SemanticIndex {
    fingerprint: String,
    term_weights: HashMap<String, f64>,
    document_vectors: BTreeMap<String, TermVector>,
    doc_ids: Vec<String>,
    postings: HashMap<String, Vec<(usize, f64)>>,
}

fn document_text(doc: &Document) -> String {
    let mut text = String::with_capacity(doc.raw_content.len() + 64);
    text.push_str(doc.label());
    for tag in &doc.tags {
        text.push(' ');
        text.push_str(tag);
    }
    for section in &doc.sections {
        text.push('\n');
        text.push_str(&section.heading);
        text.push('\n');
        text.push_str(&section.body);
    }
    text
}

fn term_counts(terms: Vec<String>) -> HashMap<String, usize> {
    let mut counts: HashMap<String, usize> = HashMap::new();
    for term in terms {
        *counts.entry(term).or_insert(0) += 1;
    }
    counts
}

#[allow(clippy::cast_precision_loss)]
fn sublinear_tf(count: usize) -> f64 {
    1.0 + (count as f64).ln()
}

fn normalize(vector: &mut TermVector) {
    let norm = vector.values().map(|w| w * w).sum::<f64>().sqrt();
    if norm > 0.0 {
        for weight in vector.values_mut() {
            *weight /= norm;
        }
    }
}

pub(crate) fn rank_hits(hits: &mut Vec<SemanticHit>, k: usize) {
    hits.sort_by(|left, right| {
        right
            .score
            .partial_cmp(&left.score)
            .unwrap_or(Ordering::Equal)
            .then_with(|| left.doc_id.cmp(&right.doc_id))
    });
    hits.truncate(k);
}

impl SemanticIndex {
    /// Build the index from scratch.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn build(documents: &[Document]) -> Self {
        let fingerprint = corpus_fingerprint(documents);
        let counted: Vec<(String, HashMap<String, usize>)> = documents
            .par_iter()
            .map(|doc| (doc.id.clone(), term_counts(tokenize(&document_text(doc)))))
            .collect();

        let mut document_frequency: HashMap<&str, usize> = HashMap::new();
        for (_, counts) in &counted {
            for term in counts.keys() {
                *document_frequency.entry(term.as_str()).or_insert(0) += 1;
            }
        }
        let corpus_size = documents.len() as f64;
        let term_weights: HashMap<String, f64> = document_frequency
            .into_iter()
            .map(|(term, df)| {
                let idf = ((1.0 + corpus_size) / (1.0 + df as f64)).ln() + 1.0;
                (term.to_string(), idf)
            })
            .collect();

        let document_vectors: BTreeMap<String, TermVector> = counted
            .into_iter()
            .map(|(doc_id, counts)| {
                let mut vector: TermVector = counts
                    .into_iter()
                    .map(|(term, count)| {
                        let idf = term_weights.get(&term).copied().unwrap_or(0.0);
                        (term, sublinear_tf(count) * idf)
                    })
                    .collect();
                normalize(&mut vector);
                (doc_id, vector)
            })
            .collect();

        log::debug!(
            "semantic index built: documents={} terms={}",
            document_vectors.len(),
            term_weights.len()
        );
        Self::from_parts(fingerprint, term_weights, document_vectors)
    }

    pub(crate) fn from_parts(
        fingerprint: String,
        term_weights: HashMap<String, f64>,
        document_vectors: BTreeMap<String, TermVector>,
    ) -> Self {
        let doc_ids: Vec<String> = document_vectors.keys().cloned().collect();
        let mut postings: HashMap<String, Vec<(usize, f64)>> = HashMap::new();
        for (idx, vector) in document_vectors.values().enumerate() {
            for (term, weight) in vector {
                postings.entry(term.clone()).or_default().push((idx, *weight));
            }
        }
        Self {
            fingerprint,
            term_weights,
            document_vectors,
            doc_ids,
            postings,
        }
    }

    /// Corpus fingerprint this index was built from.
    #[must_use]
    pub fn fingerprint(&self) -> &str {
        &self.fingerprint
    }

    /// Indexed document count.
    #[must_use]
    pub fn document_count(&self) -> usize {
        self.doc_ids.len()
    }

    /// Distinct term count.
    #[must_use]
    pub fn term_count(&self) -> usize {
        self.term_weights.len()
    }

    /// Inverse document frequency for `term`, when indexed.
    #[must_use]
    pub fn term_weight(&self, term: &str) -> Option<f64> {
        self.term_weights.get(term).copied()
    }

    /// Normalized vector for `doc_id`.
    #[must_use]
    pub fn document_vector(&self, doc_id: &str) -> Option<&TermVector> {
        self.document_vectors.get(doc_id)
    }

    /// Vectorize free text the same way documents are vectorized.
    ///
    /// Terms unknown to the index are dropped.
    #[must_use]
    pub fn vectorize(&self, text: &str) -> TermVector {
        let mut vector: TermVector = term_counts(tokenize(text))
            .into_iter()
            .filter_map(|(term, count)| {
                let idf = self.term_weights.get(&term)?;
                Some((term, sublinear_tf(count) * idf))
            })
            .collect();
        normalize(&mut vector);
        vector
    }

    fn score_all(&self, query: &TermVector) -> Vec<f64> {
        let mut scores = vec![0.0; self.doc_ids.len()];
        for (term, query_weight) in query {
            let Some(postings) = self.postings.get(term) else {
                continue;
            };
            for &(idx, weight) in postings {
                scores[idx] += query_weight * weight;
            }
        }
        scores
    }

    fn top_hits(
        &self,
        query: &TermVector,
        k: usize,
        min_score: f64,
        skip: impl Fn(&str) -> bool,
    ) -> Vec<SemanticHit> {
        if k == 0 || query.is_empty() {
            return Vec::new();
        }
        let mut hits: Vec<SemanticHit> = self
            .score_all(query)
            .into_iter()
            .zip(&self.doc_ids)
            .filter(|(score, doc_id)| *score > min_score && !skip(doc_id))
            .map(|(score, doc_id)| SemanticHit {
                doc_id: doc_id.clone(),
                score,
            })
            .collect();
        rank_hits(&mut hits, k);
        hits
    }

    /// Top-`k` documents by cosine similarity with score above `min_score`.
    #[must_use]
    pub fn query(&self, text: &str, k: usize, min_score: f64) -> Vec<SemanticHit> {
        self.top_hits(&self.vectorize(text), k, min_score, |_| false)
    }

    /// Documents most similar to `doc_id`, excluding itself and `skip` matches.
    #[must_use]
    pub fn similar_to(
        &self,
        doc_id: &str,
        k: usize,
        min_score: f64,
        skip: impl Fn(&str) -> bool,
    ) -> Vec<SemanticHit> {
        let Some(vector) = self.document_vectors.get(doc_id) else {
            return Vec::new();
        };
        self.top_hits(vector, k, min_score, |candidate| {
            candidate == doc_id || skip(candidate)
        })
    }
}
