//! Proof envelope parsing and structural validation.
//!
//! An envelope is the portable JSON container a proving toolchain hands to
//! the embedding application. It carries the opaque ZK proof, the
//! verification parameters for the circuit that produced it, the product the
//! proof pertains to, and an anti-replay challenge:
//!
//! ```json
//! {
//!   "proofBytes": "<base64>",
//!   "verificationKeyBytes": "<base64>",
//!   "productId": "acme-analytics",
//!   "challenge": { "nonce": "…", "issuedAt": "…", "expiresAt": "…" },
//!   "metadata": { "issuer": "…" },
//!   "version": "1.0"
//! }
//! ```
//!
//! Issuers may also ship the wrapper form `{ "proof": <envelope>, … }`;
//! [`ProofEnvelope::from_json`] accepts both.

use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;

/// Envelope format version written when the issuer omits one.
pub const ENVELOPE_VERSION: &str = "1.0";

/// Errors from envelope parsing or structural validation.
#[derive(Debug, Error)]
pub enum EnvelopeError {
    /// The envelope JSON is malformed.
    #[error("invalid envelope JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// A byte field does not decode as standard base64.
    #[error("invalid base64 in '{field}': {source}")]
    Base64 {
        field: &'static str,
        source: base64::DecodeError,
    },

    /// A required field is missing or empty.
    #[error("missing or empty field '{0}'")]
    EmptyField(&'static str),

    /// The challenge was issued after its own expiry.
    #[error("challenge issued at {issued_at} is after its expiry {expires_at}")]
    ChallengeOutOfOrder {
        issued_at: DateTime<Utc>,
        expires_at: DateTime<Utc>,
    },
}

/// The anti-replay challenge binding a proof to a single validation window.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Challenge {
    /// Unique nonce issued alongside the proof.
    pub nonce: String,
    /// When the challenge was issued.
    pub issued_at: DateTime<Utc>,
    /// When the challenge (and any result derived from it) expires.
    pub expires_at: DateTime<Utc>,
}

/// A portable proof envelope.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProofEnvelope {
    /// The ZK proof, standard base64.
    pub proof_bytes: String,
    /// Verification parameters for the circuit, standard base64.
    pub verification_key_bytes: String,
    /// The product this proof licenses.
    pub product_id: String,
    /// Anti-replay challenge.
    pub challenge: Challenge,
    /// Optional issuer metadata, opaque to the validator.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<BTreeMap<String, String>>,
    /// Envelope format version.
    #[serde(default = "default_version")]
    pub version: String,
}

fn default_version() -> String {
    ENVELOPE_VERSION.to_string()
}

/// Wrapper form some issuers emit: the envelope nested under a `proof` key.
#[derive(Debug, Deserialize)]
struct EnvelopeWrapper {
    proof: ProofEnvelope,
}

impl ProofEnvelope {
    /// Parses an envelope from JSON, accepting both the bare and the
    /// wrapped (`{ "proof": … }`) shapes.
    ///
    /// # Errors
    ///
    /// Returns [`EnvelopeError::Json`] when the document is malformed.
    /// Structural invariants are checked separately by [`Self::validate`].
    pub fn from_json(json: &str) -> Result<Self, EnvelopeError> {
        let value: serde_json::Value = serde_json::from_str(json)?;
        if value.get("proof").is_some() {
            let wrapper: EnvelopeWrapper = serde_json::from_value(value)?;
            Ok(wrapper.proof)
        } else {
            Ok(serde_json::from_value(value)?)
        }
    }

    /// Serializes the envelope to JSON.
    ///
    /// Optional fields are omitted when absent and metadata keys are kept in
    /// sorted order, so serialize → deserialize → serialize is stable.
    pub fn to_json(&self) -> Result<String, EnvelopeError> {
        Ok(serde_json::to_string(self)?)
    }

    /// Checks the envelope's structural invariants: both byte fields decode
    /// as base64, `product_id` and `nonce` are non-empty, and the challenge
    /// timestamps are ordered.
    ///
    /// # Errors
    ///
    /// Returns the first violated invariant.
    pub fn validate(&self) -> Result<(), EnvelopeError> {
        if self.product_id.trim().is_empty() {
            return Err(EnvelopeError::EmptyField("productId"));
        }
        if self.challenge.nonce.trim().is_empty() {
            return Err(EnvelopeError::EmptyField("challenge.nonce"));
        }
        self.decode_proof_bytes()?;
        self.decode_verification_key()?;
        if self.challenge.issued_at > self.challenge.expires_at {
            return Err(EnvelopeError::ChallengeOutOfOrder {
                issued_at: self.challenge.issued_at,
                expires_at: self.challenge.expires_at,
            });
        }
        Ok(())
    }

    /// Decodes the proof bytes.
    pub fn decode_proof_bytes(&self) -> Result<Vec<u8>, EnvelopeError> {
        if self.proof_bytes.is_empty() {
            return Err(EnvelopeError::EmptyField("proofBytes"));
        }
        BASE64
            .decode(&self.proof_bytes)
            .map_err(|source| EnvelopeError::Base64 {
                field: "proofBytes",
                source,
            })
    }

    /// Decodes the verification key bytes.
    pub fn decode_verification_key(&self) -> Result<Vec<u8>, EnvelopeError> {
        if self.verification_key_bytes.is_empty() {
            return Err(EnvelopeError::EmptyField("verificationKeyBytes"));
        }
        BASE64
            .decode(&self.verification_key_bytes)
            .map_err(|source| EnvelopeError::Base64 {
                field: "verificationKeyBytes",
                source,
            })
    }
}
