//! Validation pipeline for the Chainborn license validator.
//!
//! This crate ties the core together:
//! - [`ProofLoader`] resolves a proof envelope from its priority-ordered
//!   sources (inline variable, file variable, default path) and validates
//!   its structure. The embedding application calls it once at startup.
//! - [`LicenseValidator`] runs the validation pipeline per request:
//!   product guard → cache probe → policy fetch → binding assembly → nonce
//!   checks → cryptographic verification → binding check → policy gating →
//!   cache write.
//!
//! # Example
//!
//! ```no_run
//! use chainborn_cache::{CacheConfig, ValidationCache};
//! use chainborn_policy::PolicyStore;
//! use chainborn_types::ValidationContext;
//! use chainborn_validator::{LicenseValidator, ProofLoader};
//! use chainborn_verifier::MockVerifier;
//! use std::sync::Arc;
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let proof = ProofLoader::new().load().await?;
//! let validator = LicenseValidator::new(
//!     Arc::new(PolicyStore::new("/etc/chainborn/policies")),
//!     Arc::new(ValidationCache::open(CacheConfig::new("/var/cache/chainborn")).await),
//!     Arc::new(MockVerifier::new()),
//! );
//!
//! let result = validator
//!     .validate(&proof, &ValidationContext::new("acme-analytics"))
//!     .await?;
//! assert!(result.is_valid);
//! # Ok(())
//! # }
//! ```

mod error;
mod loader;
mod validator;

pub use error::{LoaderError, ValidatorError, ValidatorResult};
pub use loader::{ProofLoader, DEFAULT_PROOF_PATH, INLINE_PROOF_VAR, PROOF_FILE_VAR};
pub use validator::{binding_signature, build_cache_key, LicenseValidator};
