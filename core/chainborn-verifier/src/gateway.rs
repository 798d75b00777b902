//! The verify-proof boundary.

use async_trait::async_trait;
use chainborn_types::Challenge;
use std::collections::BTreeMap;

/// What a backend reports for one verification.
///
/// The shape is infallible on purpose: a backend that is unreachable or
/// crashes reports `valid: false` with an error message, the same as an
/// invalid proof, so the pipeline has exactly one failure path.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VerifierOutcome {
    /// Whether the proof verified against the key and challenge.
    pub valid: bool,
    /// Backend diagnostic when `valid` is false.
    pub error: Option<String>,
    /// Public outputs the backend surfaced (org id, tier, …), when the
    /// circuit exposes them.
    pub public_inputs: Option<BTreeMap<String, String>>,
}

impl VerifierOutcome {
    /// A successful verification with no public outputs.
    #[must_use]
    pub fn accepted() -> Self {
        Self {
            valid: true,
            error: None,
            public_inputs: None,
        }
    }

    /// A successful verification surfacing public outputs.
    #[must_use]
    pub fn accepted_with(public_inputs: BTreeMap<String, String>) -> Self {
        Self {
            valid: true,
            error: None,
            public_inputs: Some(public_inputs),
        }
    }

    /// A rejection with a diagnostic.
    #[must_use]
    pub fn rejected(error: impl Into<String>) -> Self {
        Self {
            valid: false,
            error: Some(error.into()),
            public_inputs: None,
        }
    }
}

/// A ZK verification backend.
///
/// Implementations must be free of shared mutable state; the orchestrator
/// calls `verify` concurrently from many requests.
#[async_trait]
pub trait ProofVerifier: Send + Sync {
    /// Verifies `proof` against `verification_key` for `challenge`.
    async fn verify(
        &self,
        proof: &[u8],
        verification_key: &[u8],
        challenge: &Challenge,
    ) -> VerifierOutcome;
}
