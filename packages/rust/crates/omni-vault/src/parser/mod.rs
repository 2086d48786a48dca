//! Markdown vault parser: frontmatter, level-2 sections and wikilinks.

mod batch;
mod frontmatter;
mod links;
mod paths;
mod sections;

use crate::error::VaultError;
use crate::models::{Document, VaultFile};

pub use batch::{
    BatchParse, DEFAULT_PARSE_BATCH_SIZE, ParseProgress, ParsedVault, SkippedFile, parse_batch,
    parse_batch_incremental,
};
pub use frontmatter::normalize_date;
pub(crate) use paths::is_hangul;
pub use paths::{UNTITLED_DOC_ID, file_path_to_doc_id, slugify_heading};

/// Parse one file, deriving its id from the relative path.
///
/// # Errors
///
/// Returns an error when the frontmatter block is malformed or not a mapping.
pub fn parse_document(file: &VaultFile) -> Result<Document, VaultError> {
    parse_document_with_id(file, &file_path_to_doc_id(&file.relative_path))
}

/// Parse one file under an explicit document id.
///
/// # Errors
///
/// Returns an error when the frontmatter block is malformed or not a mapping.
pub fn parse_document_with_id(file: &VaultFile, doc_id: &str) -> Result<Document, VaultError> {
    let (mapping, body) = frontmatter::split_frontmatter(&file.relative_path, &file.content)?;
    let fields = frontmatter::extract_frontmatter(mapping.as_ref());
    let (filename, folder_path) = paths::split_relative_path(&file.relative_path);
    Ok(Document {
        id: doc_id.to_string(),
        relative_path: file.relative_path.clone(),
        filename,
        folder_path,
        speaker: fields.speaker,
        date: fields.date,
        tags: fields.tags,
        sections: sections::split_sections(doc_id, body),
        raw_content: file.content.clone(),
        modified_ts: file.mtime,
    })
}
