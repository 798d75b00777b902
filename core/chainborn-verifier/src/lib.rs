//! Verifier gateway for the Chainborn license validator.
//!
//! The [`ProofVerifier`] trait is the single cryptographic boundary in the
//! pipeline: it is the only place proof bytes are handed to a ZK backend.
//! Backends are pluggable (an in-process WASM module and an out-of-process
//! sidecar are anticipated alongside the [`MockVerifier`] shipped here)
//! and the orchestrator treats them uniformly. Timeouts and retries are
//! backend concerns.

mod gateway;
mod mock;

pub use gateway::{ProofVerifier, VerifierOutcome};
pub use mock::MockVerifier;
