//! Validation results and the persisted cache record.
//!
//! Results use PascalCase field names on the wire (`IsValid`, `Errors`, …)
//! for compatibility with the cache files already deployed in the field.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// The orchestrator's single authoritative answer. Immutable once emitted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ValidationResult {
    /// Whether the process is licensed to operate.
    pub is_valid: bool,
    /// Failure descriptions, in the order the pipeline produced them.
    pub errors: Vec<String>,
    /// When this result was computed.
    pub validated_at: DateTime<Utc>,
    /// When this result stops being citable; bounded by both proof expiry
    /// and policy cache TTL.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<DateTime<Utc>>,
    /// The cache key the result was stored under, when it was cacheable.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cache_key: Option<String>,
}

impl ValidationResult {
    /// A valid result computed now.
    #[must_use]
    pub fn valid(expires_at: DateTime<Utc>, cache_key: impl Into<String>) -> Self {
        Self {
            is_valid: true,
            errors: Vec::new(),
            validated_at: Utc::now(),
            expires_at: Some(expires_at),
            cache_key: Some(cache_key.into()),
        }
    }

    /// An invalid result with a single error.
    #[must_use]
    pub fn invalid(error: impl Into<String>) -> Self {
        Self::invalid_many(vec![error.into()])
    }

    /// An invalid result with several errors, kept in order.
    #[must_use]
    pub fn invalid_many(errors: Vec<String>) -> Self {
        Self {
            is_valid: false,
            errors,
            validated_at: Utc::now(),
            expires_at: None,
            cache_key: None,
        }
    }
}

/// The record persisted per cache entry: the result plus the entry's own
/// expiry instant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct CacheEntry {
    pub result: ValidationResult,
    pub expires_at: DateTime<Utc>,
}

impl CacheEntry {
    /// True when the entry may no longer be served (strict at the boundary).
    #[must_use]
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now
    }
}
