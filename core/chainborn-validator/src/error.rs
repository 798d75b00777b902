//! Error types for the loader and the orchestrator.

use chainborn_policy::PolicyError;
use chainborn_types::EnvelopeError;
use std::path::PathBuf;
use thiserror::Error;

/// Result type for orchestrator operations.
pub type ValidatorResult<T> = Result<T, ValidatorError>;

/// Errors the orchestrator raises to its caller.
///
/// Everything else (expired nonces, failed verification, binding
/// mismatches) is reported inside the returned
/// [`ValidationResult`](chainborn_types::ValidationResult), not here.
#[derive(Debug, Error)]
pub enum ValidatorError {
    /// The policy store failed (malformed document or I/O). Transient:
    /// the next call retries, since these are never memoized.
    #[error(transparent)]
    Policy(#[from] PolicyError),
}

/// Errors from proof envelope loading.
#[derive(Debug, Error)]
pub enum LoaderError {
    /// No source provided a proof.
    #[error("no proof envelope available (checked: {})", checked.join(", "))]
    NoProofAvailable { checked: Vec<String> },

    /// The inline variable is not valid base64.
    #[error("failed to decode LICENSE_PROOF as base64: {0}")]
    Base64Decode(#[from] base64::DecodeError),

    /// The inline variable decoded to bytes that are not UTF-8.
    #[error("decoded LICENSE_PROOF is not UTF-8")]
    InlineNotUtf8,

    /// The named proof file does not exist.
    #[error("proof file not found: {}", .0.display())]
    FileNotFound(PathBuf),

    /// Reading the proof file failed for a reason other than absence.
    #[error("failed to read proof file {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The proof document is not valid JSON.
    #[error("invalid proof JSON: {0}")]
    JsonParse(#[source] serde_json::Error),

    /// The envelope parsed but violates a structural invariant.
    #[error("invalid proof envelope: {0}")]
    Structure(#[source] EnvelopeError),
}
