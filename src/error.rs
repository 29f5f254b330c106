//! Error types shared by every stage of the conversion pipeline.

use std::io;
use thiserror::Error;

/// Errors that can occur while reading, grouping, encoding or writing tracks.
#[derive(Error, Debug)]
pub enum TrackError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("Parse error at line {line}: {message}")]
    Parse { line: usize, message: String },

    /// A mandatory field is absent from the record schema, or a record
    /// does not match the schema.
    #[error("Schema error: {0}")]
    Schema(String),

    /// A single-track operation was invoked on a multi-track group.
    #[error("Precondition failed: {0}")]
    Precondition(String),

    /// A merge or filter references an unknown track or category id.
    #[error("Invalid selection: {0}")]
    InvalidSelection(String),

    /// Bad color restriction, range or unsupported output mode.
    #[error("Configuration error: {0}")]
    Configuration(String),
}

pub type Result<T> = std::result::Result<T, TrackError>;
