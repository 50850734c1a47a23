//! Structured error types for the Folio PDF writer.
//!
//! Font parsing, resource resolution and object-graph consistency each get
//! their own variant so the document driver can decide whether to fall back
//! or abort. Any error that escapes `Document::generate` aborts the whole
//! document; no partial file is ever returned.

use thiserror::Error;

/// The unified error type returned by all public Folio API functions.
#[derive(Error, Debug)]
pub enum FolioError {
    /// A font binary is malformed: bad signature, missing required table,
    /// or a read past the end of a table.
    #[error("font parse error in '{tag}': {reason}")]
    FontParse { tag: String, reason: String },

    /// A font family or image key has no registered resource at write time.
    #[error("missing resource: {0}")]
    MissingResource(String),

    /// An object was referenced but never written before the xref table.
    #[error("object {0} is referenced but was never written")]
    DanglingReference(u32),

    /// An object was written twice in the same pass.
    #[error("object {0} was written more than once")]
    DuplicateObject(u32),

    /// Subsetting could not produce a reduced font. Recoverable: callers
    /// embed the full font instead.
    #[error("font subsetting failed: {0}")]
    Subset(String),

    /// Pixel data is inconsistent with its dimensions, or could not be decoded.
    #[error("image error: {0}")]
    Image(String),

    /// JSON input failed to parse as a valid Folio document.
    #[error("failed to parse document: {source}{}", hint_suffix(.hint))]
    Parse {
        source: serde_json::Error,
        hint: String,
    },

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience alias used across the crate.
pub type Result<T> = std::result::Result<T, FolioError>;

impl FolioError {
    pub(crate) fn font(tag: impl Into<String>, reason: impl Into<String>) -> Self {
        FolioError::FontParse {
            tag: tag.into(),
            reason: reason.into(),
        }
    }
}

fn hint_suffix(hint: &str) -> String {
    if hint.is_empty() {
        String::new()
    } else {
        format!("\n  Hint: {}", hint)
    }
}

impl From<serde_json::Error> for FolioError {
    fn from(e: serde_json::Error) -> Self {
        let hint = match e.classify() {
            serde_json::error::Category::Syntax => {
                "Check for trailing commas, missing quotes, or unescaped characters.".to_string()
            }
            serde_json::error::Category::Data => {
                "The JSON is valid but doesn't match the Folio document schema. Check field names and types.".to_string()
            }
            serde_json::error::Category::Eof => "Unexpected end of input. Is the JSON truncated?".to_string(),
            serde_json::error::Category::Io => String::new(),
        };
        FolioError::Parse { source: e, hint }
    }
}
