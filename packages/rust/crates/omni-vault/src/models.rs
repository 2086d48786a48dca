//! Shared models for vault documents and their parsed sections.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// Persona that authored a document, taken from the `speaker` frontmatter key.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Speaker {
    /// Overall project direction.
    ChiefDirector,
    /// Art and visual direction.
    ArtDirector,
    /// Game design and planning.
    PlanDirector,
    /// Level design.
    LevelDirector,
    /// Programming and engineering.
    ProgDirector,
    /// Missing or unrecognized speaker.
    #[default]
    Unknown,
}

impl Speaker {
    /// Every known persona, excluding `Unknown`.
    pub const KNOWN: [Self; 5] = [
        Self::ChiefDirector,
        Self::ArtDirector,
        Self::PlanDirector,
        Self::LevelDirector,
        Self::ProgDirector,
    ];

    /// Parse speaker aliases from frontmatter input. Never fails.
    #[must_use]
    pub fn from_alias(raw: &str) -> Self {
        let normalized = raw.trim().to_lowercase().replace(['-', ' '], "_");
        match normalized.as_str() {
            "chief_director" | "chief" => Self::ChiefDirector,
            "art_director" | "art" => Self::ArtDirector,
            "plan_director" | "plan" => Self::PlanDirector,
            "level_director" | "level" => Self::LevelDirector,
            "prog_director" | "prog" | "programming_director" => Self::ProgDirector,
            _ => Self::Unknown,
        }
    }

    /// Canonical snake-case name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::ChiefDirector => "chief_director",
            Self::ArtDirector => "art_director",
            Self::PlanDirector => "plan_director",
            Self::LevelDirector => "level_director",
            Self::ProgDirector => "prog_director",
            Self::Unknown => "unknown",
        }
    }
}

impl fmt::Display for Speaker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One raw markdown file handed to the parser.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VaultFile {
    /// Path relative to the vault root, `/`-separated.
    pub relative_path: String,
    /// Absolute path on disk.
    pub absolute_path: PathBuf,
    /// UTF-8 file contents.
    pub content: String,
    /// Modification time in unix milliseconds, when known.
    pub mtime: Option<i64>,
}

impl VaultFile {
    /// Build an in-memory file record without a backing path on disk.
    #[must_use]
    pub fn new(relative_path: impl Into<String>, content: impl Into<String>) -> Self {
        let relative_path = relative_path.into();
        Self {
            absolute_path: PathBuf::from(&relative_path),
            relative_path,
            content: content.into(),
            mtime: None,
        }
    }

    /// Attach a modification timestamp.
    #[must_use]
    pub fn with_mtime(mut self, mtime: i64) -> Self {
        self.mtime = Some(mtime);
        self
    }
}

/// A body section split at a level-2 heading.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Section {
    /// Corpus-unique id, `<doc_id>_<heading slug>`.
    pub id: String,
    /// Heading text, empty for the synthetic intro section.
    pub heading: String,
    /// Section text below the heading.
    pub body: String,
    /// Wikilink slugs in first-seen order.
    pub wiki_links: Vec<String>,
    /// `![[...]]` embed targets, kept apart from wikilinks.
    pub image_embeds: Vec<String>,
}

/// Structured document produced by the parser.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    /// Stable id derived from the relative path.
    pub id: String,
    /// Path relative to the vault root.
    pub relative_path: String,
    /// File name including extension.
    pub filename: String,
    /// Parent folder relative to the vault root, empty at the root.
    pub folder_path: String,
    /// Authoring persona.
    pub speaker: Speaker,
    /// `YYYY-MM-DD` or empty.
    pub date: String,
    /// Sorted, deduplicated tags.
    pub tags: Vec<String>,
    /// Ordered body sections, never empty.
    pub sections: Vec<Section>,
    /// Full file contents including frontmatter.
    pub raw_content: String,
    /// Modification time in unix milliseconds, when known.
    pub modified_ts: Option<i64>,
}

impl Document {
    /// File name without its extension.
    #[must_use]
    pub fn label(&self) -> &str {
        match self.filename.rsplit_once('.') {
            Some((stem, _)) if !stem.is_empty() => stem,
            _ => &self.filename,
        }
    }

    /// Iterate every wikilink slug across all sections.
    pub fn wiki_links(&self) -> impl Iterator<Item = &str> {
        self.sections
            .iter()
            .flat_map(|section| section.wiki_links.iter().map(String::as_str))
    }
}
