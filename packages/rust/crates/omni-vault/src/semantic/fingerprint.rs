use crate::models::Document;
use xxhash_rust::xxh3::Xxh3;

const FIELD_SEPARATOR: &[u8] = &[0x1f];
const RECORD_SEPARATOR: &[u8] = &[0x1e];

/// Deterministic digest over every document's path, id, content and mtime.
///
/// Input order does not matter.
#[must_use]
pub fn corpus_fingerprint(documents: &[Document]) -> String {
    let mut ordered: Vec<&Document> = documents.iter().collect();
    ordered.sort_by(|left, right| {
        left.relative_path
            .cmp(&right.relative_path)
            .then_with(|| left.id.cmp(&right.id))
    });

    let mut hasher = Xxh3::new();
    hasher.update(&(ordered.len() as u64).to_le_bytes());
    for doc in ordered {
        hasher.update(doc.relative_path.as_bytes());
        hasher.update(FIELD_SEPARATOR);
        hasher.update(doc.id.as_bytes());
        hasher.update(FIELD_SEPARATOR);
        hasher.update(doc.raw_content.as_bytes());
        hasher.update(FIELD_SEPARATOR);
        hasher.update(&doc.modified_ts.unwrap_or(-1).to_le_bytes());
        hasher.update(RECORD_SEPARATOR);
    }
    format!("{:016x}", hasher.digest())
}
