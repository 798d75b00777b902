//! Per-product license policies.
//!
//! Policies are authored declaratively, one JSON document per product, and
//! loaded by the policy store. The document's file stem equals the
//! `productId` it declares:
//!
//! ```json
//! {
//!   "productId": "acme-analytics",
//!   "version": "1.2.0",
//!   "requiredTier": "professional",
//!   "requiredFeatures": ["export", "sso"],
//!   "bindingMode": "organization",
//!   "cacheTtl": 1800,
//!   "revocationModel": "on_chain"
//! }
//! ```

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use thiserror::Error;

/// Lower bound for `cacheTtl`, in seconds (one minute).
pub const MIN_CACHE_TTL_SECS: u64 = 60;

/// Upper bound for `cacheTtl`, in seconds (seven days).
pub const MAX_CACHE_TTL_SECS: u64 = 7 * 24 * 60 * 60;

/// Errors from policy structural validation.
#[derive(Debug, Error)]
pub enum PolicyValidationError {
    /// `productId` is missing or empty.
    #[error("policy has an empty productId")]
    EmptyProductId,

    /// `cacheTtl` is outside `[60, 604800]` seconds.
    #[error("cacheTtl {0}s is outside the permitted range [{MIN_CACHE_TTL_SECS}, {MAX_CACHE_TTL_SECS}] seconds")]
    CacheTtlOutOfRange(u64),

    /// `requiredFeatures` lists the same feature twice.
    #[error("requiredFeatures contains duplicate entry '{0}'")]
    DuplicateFeature(String),
}

/// How a proof is tied to a runtime identity.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BindingMode {
    /// No binding; any runtime may use the proof.
    #[default]
    None,
    /// The proof's organization must match the runtime's `org_id`.
    Organization,
    /// The proof's environment must match the runtime's `environment_id`.
    Environment,
    /// Reserved for host-attestation evidence.
    Attestation,
}

/// How licenses for this product are revoked. Advisory at runtime: it
/// shapes the recommended cache TTL but the core never performs revocation
/// calls itself.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RevocationModel {
    /// Licenses are never revoked before expiry.
    #[default]
    None,
    /// Revocation happens on-chain; new proofs stop being issued.
    OnChain,
    /// An out-of-band job re-checks licenses periodically.
    PeriodicCheck,
}

impl RevocationModel {
    /// Recommended `cacheTtl` for this model, in seconds. Tighter models
    /// bound how long a revoked license can keep validating from cache.
    #[must_use]
    pub fn recommended_ttl_secs(&self) -> u64 {
        match self {
            Self::None => MAX_CACHE_TTL_SECS,
            Self::OnChain => 60 * 60,
            Self::PeriodicCheck => 24 * 60 * 60,
        }
    }
}

/// The ordered license tier set. Ordering is part of the contract:
/// a proof for a higher tier satisfies a policy requiring a lower one.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum LicenseTier {
    Starter,
    Professional,
    Enterprise,
}

impl LicenseTier {
    /// Parses a tier from its lowercase wire form. Case-sensitive.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "starter" => Some(Self::Starter),
            "professional" => Some(Self::Professional),
            "enterprise" => Some(Self::Enterprise),
            _ => None,
        }
    }
}

impl fmt::Display for LicenseTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Starter => "starter",
            Self::Professional => "professional",
            Self::Enterprise => "enterprise",
        };
        f.write_str(s)
    }
}

/// A per-product license policy.
///
/// Unknown optional JSON fields are ignored so that minor policy-schema
/// versions can add fields without breaking older validators. Missing
/// required fields and unknown enumeration values are parse errors.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LicensePolicy {
    /// The product this policy governs. Matches the document's file stem.
    pub product_id: String,
    /// Policy schema version (semver).
    pub version: String,
    /// Minimum tier the proof must carry, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub required_tier: Option<LicenseTier>,
    /// Features the proof must carry, if any. Unique.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub required_features: Option<Vec<String>>,
    /// How the proof is bound to a runtime identity.
    pub binding_mode: BindingMode,
    /// How long a successful validation may be cached, in seconds.
    #[serde(rename = "cacheTtl")]
    pub cache_ttl_secs: u64,
    /// The product's revocation model.
    pub revocation_model: RevocationModel,
    /// Grace window after proof expiry, in seconds. Advisory.
    #[serde(default, rename = "gracePeriod", skip_serializing_if = "Option::is_none")]
    pub grace_period_secs: Option<u64>,
    /// Free-form product properties, opaque to the validator.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom_properties: Option<serde_json::Map<String, serde_json::Value>>,
}

impl LicensePolicy {
    /// Checks the policy's structural invariants.
    ///
    /// # Errors
    ///
    /// Returns the first violated invariant: empty product id, `cacheTtl`
    /// out of `[60s, 7d]`, or a duplicated required feature.
    pub fn validate(&self) -> Result<(), PolicyValidationError> {
        if self.product_id.trim().is_empty() {
            return Err(PolicyValidationError::EmptyProductId);
        }
        if !(MIN_CACHE_TTL_SECS..=MAX_CACHE_TTL_SECS).contains(&self.cache_ttl_secs) {
            return Err(PolicyValidationError::CacheTtlOutOfRange(self.cache_ttl_secs));
        }
        if let Some(features) = &self.required_features {
            let mut seen = HashSet::new();
            for feature in features {
                if !seen.insert(feature.as_str()) {
                    return Err(PolicyValidationError::DuplicateFeature(feature.clone()));
                }
            }
        }
        Ok(())
    }

    /// The cache TTL as a `chrono::Duration`.
    #[must_use]
    pub fn cache_ttl(&self) -> chrono::Duration {
        chrono::Duration::seconds(self.cache_ttl_secs as i64)
    }
}
