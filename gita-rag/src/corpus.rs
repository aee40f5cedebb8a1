//! Corpus normalization for per-verse Gita source records.
//!
//! The upstream dataset ships one JSON file per shloka. Each file holds
//! the verse identity (`_id`, `chapter`, `verse`, `slok`,
//! `transliteration`) plus an arbitrary set of top-level author blocks,
//! each containing an `author` name and up to five commentary-text
//! fields (`et`, `ec`, `ht`, `hc`, `sc`). Normalization flattens this
//! into one [`CommentaryRecord`] per non-empty author/type pair.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{info, warn};

use crate::error::{GitaError, Result};

/// The kind of commentary text attached to a verse by one author.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CommentaryType {
    EnglishTranslation,
    EnglishCommentary,
    HindiTranslation,
    HindiCommentary,
    SanskritCommentary,
}

/// The five recognized commentary-text keys in an author block, in the
/// order they are scanned.
const COMMENTARY_KEYS: [(&str, CommentaryType); 5] = [
    ("et", CommentaryType::EnglishTranslation),
    ("ec", CommentaryType::EnglishCommentary),
    ("ht", CommentaryType::HindiTranslation),
    ("hc", CommentaryType::HindiCommentary),
    ("sc", CommentaryType::SanskritCommentary),
];

impl CommentaryType {
    /// The snake_case name used in artifacts and store payloads.
    pub fn as_str(&self) -> &'static str {
        match self {
            CommentaryType::EnglishTranslation => "english_translation",
            CommentaryType::EnglishCommentary => "english_commentary",
            CommentaryType::HindiTranslation => "hindi_translation",
            CommentaryType::HindiCommentary => "hindi_commentary",
            CommentaryType::SanskritCommentary => "sanskrit_commentary",
        }
    }

    /// Parse the snake_case name back into a variant.
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "english_translation" => Some(CommentaryType::EnglishTranslation),
            "english_commentary" => Some(CommentaryType::EnglishCommentary),
            "hindi_translation" => Some(CommentaryType::HindiTranslation),
            "hindi_commentary" => Some(CommentaryType::HindiCommentary),
            "sanskrit_commentary" => Some(CommentaryType::SanskritCommentary),
            _ => None,
        }
    }
}

/// The verse identity shared by all commentaries in one source file.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct VerseRecord {
    /// Stable unique identifier, e.g. `BG2.47`.
    pub shloka_id: String,
    /// Chapter number, 1-based.
    pub chapter: u32,
    /// Verse number within the chapter, 1-based.
    pub verse: u32,
    /// The verse in its original Devanagari script.
    pub shloka_sanskrit: String,
    /// Roman transliteration of the verse, when present.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shloka_transliteration: Option<String>,
}

/// One author's commentary of one type on one verse.
///
/// Invariant: `commentary_text` is non-empty; author blocks with
/// empty or missing text for a given type are dropped silently
/// during normalization.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CommentaryRecord {
    pub shloka_id: String,
    pub chapter: u32,
    pub verse: u32,
    pub shloka_sanskrit: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shloka_transliteration: Option<String>,
    /// Display name of the commentator.
    pub author: String,
    pub commentary_type: CommentaryType,
    pub commentary_text: String,
}

/// Counts reported after a normalization pass so that skipped files
/// are visible to the operator.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NormalizeSummary {
    /// Number of source files found.
    pub files_total: usize,
    /// Number of files skipped because they could not be read or parsed.
    pub files_skipped: usize,
    /// Number of commentary records emitted.
    pub records: usize,
}

/// Parse one per-verse JSON value into its commentary records.
///
/// Any top-level object value containing an `author` string is treated
/// as an author block; unrecognized keys and empty text fields are
/// skipped without error.
///
/// # Errors
///
/// Returns [`GitaError::Ingestion`] if the value is not an object or
/// lacks the base verse fields.
pub fn parse_verse_value(value: &Value) -> Result<Vec<CommentaryRecord>> {
    let obj = value.as_object().ok_or_else(|| GitaError::Ingestion {
        stage: "normalize".to_string(),
        message: "verse record is not a JSON object".to_string(),
    })?;

    let missing = |field: &str| GitaError::Ingestion {
        stage: "normalize".to_string(),
        message: format!("verse record missing field '{field}'"),
    };

    let base = VerseRecord {
        shloka_id: obj
            .get("_id")
            .and_then(Value::as_str)
            .ok_or_else(|| missing("_id"))?
            .to_string(),
        chapter: obj.get("chapter").and_then(Value::as_u64).ok_or_else(|| missing("chapter"))?
            as u32,
        verse: obj.get("verse").and_then(Value::as_u64).ok_or_else(|| missing("verse"))? as u32,
        shloka_sanskrit: obj
            .get("slok")
            .and_then(Value::as_str)
            .ok_or_else(|| missing("slok"))?
            .to_string(),
        shloka_transliteration: obj
            .get("transliteration")
            .and_then(Value::as_str)
            .map(str::to_string),
    };

    let mut records = Vec::new();
    for author_block in obj.values() {
        let Some(block) = author_block.as_object() else { continue };
        let Some(author) = block.get("author").and_then(Value::as_str) else { continue };

        for (key, commentary_type) in COMMENTARY_KEYS {
            let Some(text) = block.get(key).and_then(Value::as_str) else { continue };
            if text.is_empty() {
                continue;
            }
            records.push(CommentaryRecord {
                shloka_id: base.shloka_id.clone(),
                chapter: base.chapter,
                verse: base.verse,
                shloka_sanskrit: base.shloka_sanskrit.clone(),
                shloka_transliteration: base.shloka_transliteration.clone(),
                author: author.to_string(),
                commentary_type,
                commentary_text: text.to_string(),
            });
        }
    }

    Ok(records)
}

/// Normalize every `*.json` file in a directory into a flat record list.
///
/// Files that cannot be read or parsed are logged at `warn` and
/// skipped; the pass never aborts on a single bad file. Files are
/// processed in sorted path order so output is deterministic.
///
/// # Errors
///
/// Returns [`GitaError::Ingestion`] only if the directory itself
/// cannot be read.
pub fn normalize_dir(dir: &Path) -> Result<(Vec<CommentaryRecord>, NormalizeSummary)> {
    let entries = fs::read_dir(dir).map_err(|e| GitaError::Ingestion {
        stage: "normalize".to_string(),
        message: format!("cannot read data directory '{}': {e}", dir.display()),
    })?;

    let mut paths: Vec<_> = entries
        .filter_map(|e| e.ok().map(|e| e.path()))
        .filter(|p| p.extension().is_some_and(|ext| ext == "json"))
        .collect();
    paths.sort();

    let mut summary = NormalizeSummary { files_total: paths.len(), ..Default::default() };
    let mut records = Vec::new();

    for path in &paths {
        let parsed = fs::read_to_string(path)
            .map_err(|e| GitaError::Ingestion {
                stage: "normalize".to_string(),
                message: e.to_string(),
            })
            .and_then(|text| {
                serde_json::from_str::<Value>(&text).map_err(|e| GitaError::Ingestion {
                    stage: "normalize".to_string(),
                    message: e.to_string(),
                })
            })
            .and_then(|value| parse_verse_value(&value));

        match parsed {
            Ok(file_records) => records.extend(file_records),
            Err(e) => {
                warn!(file = %path.display(), error = %e, "skipping unparseable verse file");
                summary.files_skipped += 1;
            }
        }
    }

    summary.records = records.len();
    info!(
        files_total = summary.files_total,
        files_skipped = summary.files_skipped,
        records = summary.records,
        "normalized corpus"
    );

    Ok((records, summary))
}
