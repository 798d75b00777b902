//! Shared test helpers for loader and orchestrator tests.

#![allow(dead_code)]

use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use chainborn_cache::{CacheConfig, ValidationCache};
use chainborn_policy::PolicyStore;
use chainborn_types::{Challenge, ProofEnvelope, ENVELOPE_VERSION};
use chainborn_validator::LicenseValidator;
use chainborn_verifier::MockVerifier;
use chrono::{Duration, Utc};
use std::path::Path;
use std::sync::Arc;
use tempfile::TempDir;

/// Builds an envelope whose challenge was issued a minute ago and expires
/// `expires_in` from now.
pub fn make_envelope(product_id: &str, nonce: &str, expires_in: Duration) -> ProofEnvelope {
    let now = Utc::now();
    ProofEnvelope {
        proof_bytes: BASE64.encode(b"proof"),
        verification_key_bytes: BASE64.encode(b"vk"),
        product_id: product_id.to_string(),
        challenge: Challenge {
            nonce: nonce.to_string(),
            issued_at: now - Duration::minutes(1),
            expires_at: now + expires_in,
        },
        metadata: None,
        version: ENVELOPE_VERSION.to_string(),
    }
}

/// Writes a policy document with the given binding mode and TTL.
pub fn write_policy(dir: &Path, product_id: &str, binding_mode: &str, cache_ttl: u64) {
    let json = format!(
        r#"{{
            "productId": "{product_id}",
            "version": "1.0.0",
            "bindingMode": "{binding_mode}",
            "cacheTtl": {cache_ttl},
            "revocationModel": "none"
        }}"#
    );
    std::fs::write(dir.join(format!("{product_id}.json")), json).unwrap();
}

/// Writes a policy document with tier/feature requirements.
pub fn write_gated_policy(
    dir: &Path,
    product_id: &str,
    required_tier: &str,
    required_features: &[&str],
) {
    let features = required_features
        .iter()
        .map(|f| format!(r#""{f}""#))
        .collect::<Vec<_>>()
        .join(", ");
    let json = format!(
        r#"{{
            "productId": "{product_id}",
            "version": "1.0.0",
            "requiredTier": "{required_tier}",
            "requiredFeatures": [{features}],
            "bindingMode": "none",
            "cacheTtl": 600,
            "revocationModel": "none"
        }}"#
    );
    std::fs::write(dir.join(format!("{product_id}.json")), json).unwrap();
}

/// A wired orchestrator over temp policy and cache directories.
pub struct TestRig {
    pub policy_dir: TempDir,
    pub cache_dir: TempDir,
    pub cache: Arc<ValidationCache>,
    pub verifier: Arc<MockVerifier>,
    pub validator: LicenseValidator,
}

/// Builds a rig around the given verifier.
pub async fn rig_with(verifier: MockVerifier) -> TestRig {
    let policy_dir = TempDir::new().unwrap();
    let cache_dir = TempDir::new().unwrap();
    let cache = Arc::new(ValidationCache::open(CacheConfig::new(cache_dir.path())).await);
    let verifier = Arc::new(verifier);
    let validator = LicenseValidator::new(
        Arc::new(PolicyStore::new(policy_dir.path())),
        cache.clone(),
        verifier.clone(),
    );
    TestRig {
        policy_dir,
        cache_dir,
        cache,
        verifier,
        validator,
    }
}

/// Builds a rig around a default accept-everything verifier.
pub async fn rig() -> TestRig {
    rig_with(MockVerifier::new()).await
}
