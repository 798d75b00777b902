//! Mock verification backend.

use crate::gateway::{ProofVerifier, VerifierOutcome};
use async_trait::async_trait;
use chainborn_types::Challenge;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use tracing::debug;

/// Backend that accepts any non-empty proof and key.
///
/// Used by tests and by deployments that have not yet wired a production
/// backend. Can be configured to surface public outputs or to reject,
/// and counts its invocations so tests can assert on cache behavior.
#[derive(Debug, Default)]
pub struct MockVerifier {
    public_inputs: Option<BTreeMap<String, String>>,
    rejection: Option<String>,
    calls: AtomicUsize,
}

impl MockVerifier {
    /// A verifier accepting any non-empty inputs.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Surfaces the given public outputs on every successful verification.
    #[must_use]
    pub fn with_public_inputs(mut self, public_inputs: BTreeMap<String, String>) -> Self {
        self.public_inputs = Some(public_inputs);
        self
    }

    /// Rejects every proof with the given diagnostic.
    #[must_use]
    pub fn rejecting(mut self, error: impl Into<String>) -> Self {
        self.rejection = Some(error.into());
        self
    }

    /// How many times `verify` has been called.
    #[must_use]
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ProofVerifier for MockVerifier {
    async fn verify(
        &self,
        proof: &[u8],
        verification_key: &[u8],
        challenge: &Challenge,
    ) -> VerifierOutcome {
        self.calls.fetch_add(1, Ordering::SeqCst);
        debug!(nonce = %challenge.nonce, "mock verification");

        if let Some(error) = &self.rejection {
            return VerifierOutcome::rejected(error.clone());
        }
        if proof.is_empty() {
            return VerifierOutcome::rejected("proof is empty");
        }
        if verification_key.is_empty() {
            return VerifierOutcome::rejected("verification key is empty");
        }

        match &self.public_inputs {
            Some(inputs) => VerifierOutcome::accepted_with(inputs.clone()),
            None => VerifierOutcome::accepted(),
        }
    }
}
