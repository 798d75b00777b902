//! Error types for the policy store.

use chainborn_types::PolicyValidationError;
use std::path::PathBuf;
use thiserror::Error;

/// Result type for policy operations.
pub type PolicyResult<T> = Result<T, PolicyError>;

/// Errors that can occur while resolving a policy.
#[derive(Debug, Error)]
pub enum PolicyError {
    /// The product id contains path separators or parent references.
    #[error("invalid product id '{0}'")]
    InvalidProductId(String),

    /// The resolved document lives outside the canonical policy directory.
    #[error("policy path {} resolves outside the policy directory", .0.display())]
    OutsidePolicyDirectory(PathBuf),

    /// Reading the policy file failed for a reason other than absence.
    #[error("failed to read policy file {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The policy document is not valid JSON for the policy schema.
    #[error("malformed policy for '{product_id}': {source}")]
    Parse {
        product_id: String,
        #[source]
        source: serde_json::Error,
    },

    /// The document parsed but violates a policy invariant.
    #[error("invalid policy for '{product_id}': {source}")]
    Invalid {
        product_id: String,
        #[source]
        source: PolicyValidationError,
    },

    /// The document declares a different product than its file stem.
    #[error("policy file for '{expected}' declares productId '{found}'")]
    ProductIdMismatch { expected: String, found: String },
}
