//! Structured error types for the Velella crates.

use thiserror::Error;

/// Unified error type for all Velella operations.
#[derive(Debug, Error)]
pub enum VelellaError {
    /// I/O error (file not found, permission denied, etc.)
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Parse error (malformed input data)
    #[error("parse error: {0}")]
    Parse(String),

    /// Invalid input (bad arguments, out-of-range values)
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// A spaced-seed pattern string violates the pattern grammar
    #[error("malformed pattern '{pattern}': {reason}")]
    MalformedPattern { pattern: String, reason: String },

    /// Two reference sequences share a name
    #[error("duplicate sequence name: '{0}'")]
    DuplicateSequenceName(String),

    /// A tree leaf names a sequence that is not a known reference
    #[error("tree leaf '{0}' does not match any reference sequence")]
    UnknownLeaf(String),

    /// An internal node lookup failed; indicates a broken invariant
    #[error("no tree node with sequence id {0}")]
    NodeNotFound(u32),

    /// The host requested a cooperative abort via [`crate::CancelFlag`]
    #[error("operation cancelled")]
    Cancelled,
}

/// Convenience alias used throughout the Velella crates.
pub type Result<T> = std::result::Result<T, VelellaError>;
