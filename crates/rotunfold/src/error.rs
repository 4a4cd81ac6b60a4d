//! Error taxonomy shared by all three stages.
//!
//! Every kind is fatal for the stage that hits it; nothing is retried.
//! Upstream outputs stay valid when a downstream stage fails.

use thiserror::Error;

/// Fatal stage errors.
#[derive(Debug, Error)]
pub enum UnfoldError {
    /// Malformed or inconsistent input document (bad adjacency, missing
    /// fields, edge not on a face).
    #[error("structural input error: {0}")]
    Structure(String),

    /// Input document or record carries an unsupported schema version.
    #[error("schema version mismatch: expected {expected}, found {found}")]
    Schema { expected: u32, found: u32 },

    /// A stream record failed to parse or violates the record schema.
    #[error("record error at line {line}: {message}")]
    Record { line: u64, message: String },

    /// A face or edge identifier does not resolve in the polyhedron.
    #[error("unknown reference: {0}")]
    Reference(String),

    /// The exact engine could not decide a comparison. Must not occur; if it
    /// does it surfaces here instead of being skipped.
    #[error("exact arithmetic could not decide: {0}")]
    Undecidable(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl UnfoldError {
    /// Attach a line number to a JSON parse failure from a record stream.
    pub fn record_at(line: u64, err: impl std::fmt::Display) -> Self {
        UnfoldError::Record {
            line,
            message: err.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, UnfoldError>;
