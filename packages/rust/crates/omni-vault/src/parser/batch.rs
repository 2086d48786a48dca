use super::{parse_document, parse_document_with_id};
use crate::models::{Document, VaultFile};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Files parsed between two progress events.
pub const DEFAULT_PARSE_BATCH_SIZE: usize = 25;

/// Progress event emitted after each parsed batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParseProgress {
    /// Files processed so far, skipped ones included.
    pub parsed: usize,
    /// Files in this run.
    pub total: usize,
}

/// A file the parser refused.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkippedFile {
    /// Vault-relative path.
    pub relative_path: String,
    /// Human-readable failure.
    pub reason: String,
}

/// Final result of a batch run.
#[derive(Debug, Clone, Default)]
pub struct ParsedVault {
    /// Successfully parsed documents with corpus-unique ids.
    pub documents: Vec<Document>,
    /// Files that failed structurally.
    pub skipped: Vec<SkippedFile>,
}

/// Lazy batch parser.
///
/// Each call to `next` parses one batch and yields a [`ParseProgress`].
/// Dropping the iterator cancels the run; [`BatchParse::finish`] drains it.
#[derive(Debug)]
pub struct BatchParse<'a> {
    files: &'a [VaultFile],
    batch_size: usize,
    cursor: usize,
    documents: Vec<Document>,
    skipped: Vec<SkippedFile>,
    claimed_doc_ids: HashSet<String>,
    claimed_section_ids: HashSet<String>,
}

impl<'a> BatchParse<'a> {
    fn new(files: &'a [VaultFile], batch_size: usize) -> Self {
        Self {
            files,
            batch_size: batch_size.max(1),
            cursor: 0,
            documents: Vec::with_capacity(files.len()),
            skipped: Vec::new(),
            claimed_doc_ids: HashSet::new(),
            claimed_section_ids: HashSet::new(),
        }
    }

    /// Documents accepted so far.
    #[must_use]
    pub fn documents(&self) -> &[Document] {
        &self.documents
    }

    /// Parse any remaining batches and return the outcome.
    #[must_use]
    pub fn finish(mut self) -> ParsedVault {
        while self.next().is_some() {}
        ParsedVault {
            documents: self.documents,
            skipped: self.skipped,
        }
    }

    fn collides(&self, doc: &Document) -> bool {
        self.claimed_doc_ids.contains(&doc.id)
            || doc
                .sections
                .iter()
                .any(|section| self.claimed_section_ids.contains(&section.id))
    }

    fn claim(&mut self, file: &VaultFile, doc: Document) {
        let base_id = doc.id.clone();
        let mut candidate = doc;
        let mut suffix = 1usize;
        while self.collides(&candidate) {
            suffix += 1;
            let next_id = format!("{base_id}_{suffix}");
            match parse_document_with_id(file, &next_id) {
                Ok(doc) => candidate = doc,
                Err(err) => {
                    self.skip(file, &err.to_string());
                    return;
                }
            }
        }
        if suffix > 1 {
            log::debug!(
                "resolved duplicate doc id '{base_id}' for '{}' as '{}'",
                file.relative_path,
                candidate.id
            );
        }
        self.claimed_doc_ids.insert(candidate.id.clone());
        self.claimed_section_ids
            .extend(candidate.sections.iter().map(|section| section.id.clone()));
        self.documents.push(candidate);
    }

    fn skip(&mut self, file: &VaultFile, reason: &str) {
        log::warn!("skipping vault file '{}': {reason}", file.relative_path);
        self.skipped.push(SkippedFile {
            relative_path: file.relative_path.clone(),
            reason: reason.to_string(),
        });
    }
}

impl Iterator for BatchParse<'_> {
    type Item = ParseProgress;

    fn next(&mut self) -> Option<Self::Item> {
        let total = self.files.len();
        if self.cursor >= total {
            return None;
        }
        let end = (self.cursor + self.batch_size).min(total);
        let chunk = &self.files[self.cursor..end];
        let parsed: Vec<_> = chunk.par_iter().map(parse_document).collect();
        for (file, result) in chunk.iter().zip(parsed) {
            match result {
                Ok(doc) => self.claim(file, doc),
                Err(err) => self.skip(file, &err.to_string()),
            }
        }
        self.cursor = end;
        Some(ParseProgress {
            parsed: end,
            total,
        })
    }
}

/// Start an incremental parse that yields after every `batch_size` files.
#[must_use]
pub fn parse_batch_incremental(files: &[VaultFile], batch_size: usize) -> BatchParse<'_> {
    BatchParse::new(files, batch_size)
}

/// Parse every file, skipping failures, and return the accepted documents.
#[must_use]
pub fn parse_batch(files: &[VaultFile]) -> Vec<Document> {
    parse_batch_incremental(files, DEFAULT_PARSE_BATCH_SIZE)
        .finish()
        .documents
}
