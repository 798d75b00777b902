//! Core type definitions for the Chainborn license validator.
//!
//! This crate defines the portable, component-agnostic types shared across
//! the validation pipeline:
//! - The proof envelope (proof bytes, verification key, anti-replay challenge)
//! - Per-product license policies (binding mode, tier, features, cache TTL)
//! - Validation contexts and results
//! - The persisted cache record
//!
//! Component logic (policy resolution, binding collection, caching,
//! orchestration) lives in the sibling crates, not here.

mod context;
mod envelope;
mod policy;
mod result;

pub use context::{BindingData, Strictness, ValidationContext};
pub use envelope::{Challenge, EnvelopeError, ProofEnvelope, ENVELOPE_VERSION};
pub use policy::{
    BindingMode, LicensePolicy, LicenseTier, PolicyValidationError, RevocationModel,
    MAX_CACHE_TTL_SECS, MIN_CACHE_TTL_SECS,
};
pub use result::{CacheEntry, ValidationResult};
