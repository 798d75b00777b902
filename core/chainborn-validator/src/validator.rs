//! The validation pipeline.

use crate::error::ValidatorResult;
use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use chainborn_binding::{collect, validate_binding};
use chainborn_cache::ValidationCache;
use chainborn_policy::PolicyStore;
use chainborn_types::{
    BindingData, BindingMode, LicensePolicy, LicenseTier, ProofEnvelope, ValidationContext,
    ValidationResult,
};
use chainborn_verifier::ProofVerifier;
use chrono::Utc;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// Deterministic encoding of binding data for the cache key: entries sorted
/// by key, `key=value` pairs joined with `|`, then base64-encoded so binding
/// values cannot inject key separators.
#[must_use]
pub fn binding_signature(binding_data: Option<&BindingData>) -> String {
    let Some(data) = binding_data.filter(|d| !d.is_empty()) else {
        return String::new();
    };
    let joined = data
        .iter()
        .map(|(k, v)| format!("{k}={v}"))
        .collect::<Vec<_>>()
        .join("|");
    BASE64.encode(joined)
}

/// The cache key covering everything that affects a result's validity:
/// product, nonce, strictness, and the binding signature.
#[must_use]
pub fn build_cache_key(context: &ValidationContext, nonce: &str) -> String {
    format!(
        "{}:{}:{}:{}",
        context.product_id,
        nonce,
        context.strictness,
        binding_signature(context.binding_data.as_ref())
    )
}

/// What the cache probe concluded about a stored result.
enum CacheProbe {
    Hit,
    InvariantViolation,
    PolicyUnavailable,
}

/// The validation orchestrator.
///
/// Owns the pipeline; a single instance serves the whole process and is safe
/// for concurrent use. Two concurrent validations for the same key may both
/// compute and both write; the last write wins and both derive identical
/// results from the same inputs.
pub struct LicenseValidator {
    policies: Arc<PolicyStore>,
    cache: Arc<ValidationCache>,
    verifier: Arc<dyn ProofVerifier>,
}

impl LicenseValidator {
    /// Wires the orchestrator to its collaborators.
    #[must_use]
    pub fn new(
        policies: Arc<PolicyStore>,
        cache: Arc<ValidationCache>,
        verifier: Arc<dyn ProofVerifier>,
    ) -> Self {
        Self {
            policies,
            cache,
            verifier,
        }
    }

    /// Validates `proof` for `context` and returns the authoritative result.
    ///
    /// # Errors
    ///
    /// Only policy-store failures (malformed policy document, I/O) are
    /// raised; they are transient-retryable. Every other failure is reported
    /// inside the returned result.
    pub async fn validate(
        &self,
        proof: &ProofEnvelope,
        context: &ValidationContext,
    ) -> ValidatorResult<ValidationResult> {
        let product_id = context.product_id.as_str();

        // 1. Product guard: a proof for product A must not validate B.
        if proof.product_id != context.product_id {
            warn!(product_id, outcome = "product_mismatch", proof_product = %proof.product_id,
                "proof product does not match validation context");
            return Ok(ValidationResult::invalid(format!(
                "Proof is for product '{}' but validation was requested for '{}'",
                proof.product_id, context.product_id
            )));
        }

        // 2. Cache probe.
        let cache_key = build_cache_key(context, &proof.challenge.nonce);
        if let Some(cached) = self.cache.get(&cache_key).await {
            match self.probe_cached(&cached, proof).await {
                CacheProbe::Hit => {
                    info!(product_id, outcome = "cache_hit", "serving cached validation result");
                    return Ok(cached);
                }
                CacheProbe::InvariantViolation => {
                    self.cache.invalidate(&cache_key).await;
                    error!(product_id, outcome = "cache_invariant_violation",
                        "cached expiry exceeds its permitted bound; entry discarded");
                    return Ok(ValidationResult::invalid(format!(
                        "Cache invariant violation for '{product_id}': cached result outlived its proof or policy TTL and was discarded"
                    )));
                }
                CacheProbe::PolicyUnavailable => {
                    debug!(product_id, "policy unavailable during cache probe, treating as miss");
                }
            }
        }

        // 3. Policy fetch.
        let Some(policy) = self.policies.get_policy(product_id).await? else {
            warn!(product_id, outcome = "policy_missing", "no policy for product");
            return Ok(ValidationResult::invalid(format!(
                "Policy not found for '{product_id}'"
            )));
        };

        // 4. Binding data assembly, for this request only.
        let binding_data = match (&policy.binding_mode, &context.binding_data) {
            (BindingMode::None, supplied) => supplied.clone(),
            (_, Some(supplied)) if !supplied.is_empty() => Some(supplied.clone()),
            _ => {
                debug!(product_id, "collecting runtime binding data");
                Some(collect())
            }
        };

        // 5. Nonce checks, before any cryptographic work.
        let now = Utc::now();
        if proof.challenge.expires_at <= now {
            info!(product_id, outcome = "nonce_expired", "challenge has expired");
            return Ok(ValidationResult::invalid(format!(
                "Challenge has expired at {}",
                proof.challenge.expires_at.to_rfc3339()
            )));
        }
        if proof.challenge.issued_at > now {
            info!(product_id, outcome = "nonce_from_future", "challenge issued in the future");
            return Ok(ValidationResult::invalid(format!(
                "Challenge issued in the future at {}",
                proof.challenge.issued_at.to_rfc3339()
            )));
        }

        // 6. Cryptographic verification.
        let proof_bytes = match proof.decode_proof_bytes() {
            Ok(bytes) => bytes,
            Err(e) => {
                info!(product_id, outcome = "envelope_invalid", "proof bytes undecodable");
                return Ok(ValidationResult::invalid(format!("Invalid proof envelope: {e}")));
            }
        };
        let verification_key = match proof.decode_verification_key() {
            Ok(bytes) => bytes,
            Err(e) => {
                info!(product_id, outcome = "envelope_invalid", "verification key undecodable");
                return Ok(ValidationResult::invalid(format!("Invalid proof envelope: {e}")));
            }
        };
        let outcome = self
            .verifier
            .verify(&proof_bytes, &verification_key, &proof.challenge)
            .await;
        if !outcome.valid {
            let message = outcome
                .error
                .unwrap_or_else(|| "Proof verification failed".to_string());
            info!(product_id, outcome = "verify_failed", "backend rejected proof");
            return Ok(ValidationResult::invalid(message));
        }

        // 7. Binding check.
        let check = validate_binding(
            policy.binding_mode,
            binding_data.as_ref(),
            outcome.public_inputs.as_ref(),
        );
        if !check.valid {
            info!(product_id, outcome = "binding_failed", "binding check rejected proof");
            return Ok(ValidationResult::invalid_many(check.errors));
        }

        // 8. Policy gating on tier/feature public outputs.
        let gating_errors = gate_on_policy(&policy, outcome.public_inputs.as_ref());
        if !gating_errors.is_empty() {
            info!(product_id, outcome = "gating_failed", "policy gating rejected proof");
            return Ok(ValidationResult::invalid_many(gating_errors));
        }

        // 9. The single authority over cache lifetime.
        let expires_at = proof.challenge.expires_at.min(now + policy.cache_ttl());

        // 10–11. Cache and return.
        let result = ValidationResult::valid(expires_at, cache_key.clone());
        self.cache.set(&cache_key, &result, expires_at - now).await;
        info!(product_id, outcome = "validated", expires_at = %expires_at.to_rfc3339(),
            "validation succeeded");
        Ok(result)
    }

    /// Re-verifies the TTL invariant for a cached result:
    /// `expires_at ≤ min(challenge.expires_at, validated_at + cache_ttl)`.
    /// Self-healing against clock skew, corrupted persistence, or upstream
    /// bugs.
    async fn probe_cached(&self, cached: &ValidationResult, proof: &ProofEnvelope) -> CacheProbe {
        let policy = match self.policies.get_policy(&proof.product_id).await {
            Ok(Some(policy)) => policy,
            Ok(None) => return CacheProbe::PolicyUnavailable,
            Err(e) => {
                debug!("policy store failed during cache probe: {e}");
                return CacheProbe::PolicyUnavailable;
            }
        };

        let Some(expires_at) = cached.expires_at else {
            return CacheProbe::InvariantViolation;
        };
        let bound = proof
            .challenge
            .expires_at
            .min(cached.validated_at + policy.cache_ttl());
        if expires_at > bound {
            return CacheProbe::InvariantViolation;
        }
        CacheProbe::Hit
    }
}

/// Tier and feature enforcement against the verifier's public outputs.
/// Outputs that are not surfaced yet leave enforcement pending (stub mode).
fn gate_on_policy(
    policy: &LicensePolicy,
    public_inputs: Option<&std::collections::BTreeMap<String, String>>,
) -> Vec<String> {
    let mut errors = Vec::new();
    let Some(inputs) = public_inputs.filter(|m| !m.is_empty()) else {
        debug!(product_id = %policy.product_id,
            "no public outputs surfaced; tier/feature enforcement pending");
        return errors;
    };

    if let Some(required) = policy.required_tier {
        match inputs.get("tier") {
            Some(raw) => match LicenseTier::parse(raw) {
                Some(present) if present >= required => {}
                Some(present) => errors.push(format!(
                    "License tier '{present}' does not satisfy required tier '{required}'"
                )),
                None => errors.push(format!("Unknown license tier '{raw}' in proof outputs")),
            },
            None => {
                debug!(product_id = %policy.product_id,
                    "no 'tier' output surfaced; tier enforcement pending");
            }
        }
    }

    if let Some(required) = &policy.required_features {
        match inputs.get("features") {
            Some(raw) => {
                let present: HashSet<&str> = raw
                    .split(',')
                    .map(str::trim)
                    .filter(|f| !f.is_empty())
                    .collect();
                for feature in required {
                    if !present.contains(feature.as_str()) {
                        errors.push(format!("Required feature '{feature}' is not licensed"));
                    }
                }
            }
            None => {
                debug!(product_id = %policy.product_id,
                    "no 'features' output surfaced; feature enforcement pending");
            }
        }
    }

    errors
}
