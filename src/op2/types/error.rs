//! Custom error types for the op2-reader crate.

use std::fmt;

use thiserror::Error;

use super::models::{MatrixHeader, TableName};

/// The primary error type for all framing and dispatch operations.
///
/// Every variant is fatal for the parse that produced it: once the byte
/// alignment of the stream is in doubt, nothing after it can be trusted.
#[derive(Debug, Error)]
pub enum Op2Error {
    /// An error originating from I/O operations.
    #[error("I/O error: {0:?}")]
    Io(#[from] std::io::Error),

    /// Fewer bytes remain in the stream than the framing protocol requires.
    #[error("Truncated stream at offset {offset}: needed {needed} bytes, only {available} available")]
    TruncatedStream {
        offset: u64,
        needed: u64,
        available: u64,
    },

    /// A marker carried a different value than the protocol step expected.
    #[error("Marker mismatch at offset {offset}: expected {expected}, found {actual}")]
    MarkerMismatch {
        offset: u64,
        expected: i32,
        actual: i32,
    },

    /// The leading and trailing length words of a block disagree.
    #[error("Block length mismatch at offset {offset}: leading length {leading}, trailing length {trailing}")]
    BlockLengthMismatch {
        offset: u64,
        leading: i32,
        trailing: i32,
    },

    /// A marker block did not have the 4-byte payload every marker carries.
    #[error("Invalid marker at offset {offset}: block length {length}, expected 4")]
    InvalidMarker { offset: u64, length: i32 },

    /// A read that had to succeed did not, and the stream cannot be resumed.
    #[error("Fatal stream error at offset {offset}: {reason}")]
    FatalStream { offset: u64, reason: String },

    /// The first word of the stream is not a marker length in either byte order.
    #[error("Cannot detect byte order: first word {first_word:#010x} is not a marker length")]
    UnknownEndianness { first_word: u32 },

    /// A table name matches no known catalog and is not an additional matrix.
    #[error(
        "Unrecognized table {name}; if it is a matrix, register it with \
         ReaderOptions::with_additional_matrices"
    )]
    UnrecognizedTable { name: TableName },

    /// A matrix header declares a shape that fails cross-validation.
    #[error("Inconsistent header for matrix {name}: {reason} ({header})")]
    MatrixHeaderInconsistent {
        name: TableName,
        header: MatrixHeader,
        reason: String,
    },

    /// A table name appears in more than one routing category.
    #[error("Routing catalog conflict: {name} is listed as both {first} and {second}")]
    CatalogConflict {
        name: String,
        first: String,
        second: String,
    },

    /// The stream is structurally valid but its content is not what the table expects.
    #[error("Invalid format: {0}")]
    InvalidFormat(String),

    /// An external result decoder rejected a record.
    #[error("Decoder for {table} failed: {message}")]
    Decoder { table: TableName, message: String },
}

impl Op2Error {
    /// The stream offset the error points at, for errors that carry one.
    pub fn offset(&self) -> Option<u64> {
        match self {
            Op2Error::TruncatedStream { offset, .. }
            | Op2Error::MarkerMismatch { offset, .. }
            | Op2Error::BlockLengthMismatch { offset, .. }
            | Op2Error::InvalidMarker { offset, .. }
            | Op2Error::FatalStream { offset, .. } => Some(*offset),
            _ => None,
        }
    }
}

/// A convenience `Result` type alias using the crate's `Op2Error` type.
pub type Result<T> = std::result::Result<T, Op2Error>;

/// The terminal error of a parse, carrying the context needed for post-mortem
/// diagnosis without re-running the parse with tracing enabled.
#[derive(Debug, Error)]
pub struct ParseError {
    /// The table being handled when the failure happened, if any.
    pub table: Option<TableName>,
    /// Absolute stream offset at the time of failure.
    pub offset: u64,
    /// The most recent marker values read, oldest first.
    pub recent_markers: Vec<i32>,
    #[source]
    pub source: Op2Error,
}

impl ParseError {
    /// The underlying error that ended the parse.
    pub fn kind(&self) -> &Op2Error {
        &self.source
    }
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.table {
            Some(table) => write!(f, "failed in table {} at offset {}", table, self.offset)?,
            None => write!(f, "failed at offset {}", self.offset)?,
        }
        write!(f, " (recent markers {:?}): {}", self.recent_markers, self.source)
    }
}
