//! Error types for the oracle pipeline.
//!
//! All fallible operations return `OracleResult<T>`. Most variants are
//! absorbed at a component boundary and only logged; `EmptyQuestion` is the
//! one error a caller of `Oracle::ask` is expected to handle.

use thiserror::Error;

/// The unified error type for the oracle crates.
#[derive(Debug, Error)]
pub enum OracleError {
    /// The submitted question was empty after trimming.
    #[error("question cannot be empty")]
    EmptyQuestion,

    /// The heuristic scorer could not process the text.
    ///
    /// Never surfaced to callers of the scorer's infallible entry point; it
    /// degrades to the neutral default instead.
    #[error("scoring failed: {reason}")]
    ScoringFailed { reason: String },

    /// The answer generator returned an error or a malformed response.
    #[error("answer generator failed: {reason}")]
    GeneratorFailed { reason: String },

    /// The answer generator did not respond within the configured bound.
    #[error("answer generator timed out after {after_ms} ms")]
    GeneratorTimeout { after_ms: u64 },

    /// The ledger store could not persist a record.
    #[error("ledger write failed: {reason}")]
    LedgerWriteFailed { reason: String },

    /// The ledger store could not be read.
    #[error("ledger read failed: {reason}")]
    LedgerReadFailed { reason: String },

    /// A configuration value or policy table is missing or invalid.
    #[error("configuration error: {reason}")]
    ConfigError { reason: String },

    /// A verification request did not match the expected JSON shape.
    #[error("schema validation error: {reason}")]
    SchemaValidation { reason: String },

    /// A record could not be encoded or decoded.
    #[error("serialization error: {reason}")]
    Serialization { reason: String },
}

/// Convenience alias used throughout the oracle crates.
pub type OracleResult<T> = Result<T, OracleError>;
