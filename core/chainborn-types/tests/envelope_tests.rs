use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use chainborn_types::{EnvelopeError, ProofEnvelope, ENVELOPE_VERSION};
use chrono::{Duration, Utc};

fn envelope_json(product_id: &str, nonce: &str) -> String {
    let issued = Utc::now();
    let expires = issued + Duration::minutes(10);
    format!(
        r#"{{
            "proofBytes": "{}",
            "verificationKeyBytes": "{}",
            "productId": "{}",
            "challenge": {{
                "nonce": "{}",
                "issuedAt": "{}",
                "expiresAt": "{}"
            }}
        }}"#,
        BASE64.encode(b"proof"),
        BASE64.encode(b"vk"),
        product_id,
        nonce,
        issued.to_rfc3339(),
        expires.to_rfc3339(),
    )
}

// ── Parsing ──────────────────────────────────────────────────────

#[test]
fn parse_bare_envelope() {
    let envelope = ProofEnvelope::from_json(&envelope_json("acme", "n-1")).unwrap();
    assert_eq!(envelope.product_id, "acme");
    assert_eq!(envelope.challenge.nonce, "n-1");
    assert_eq!(envelope.version, ENVELOPE_VERSION);
}

#[test]
fn parse_wrapped_envelope() {
    let wrapped = format!(
        r#"{{ "proof": {}, "version": "1.0", "metadata": {{}} }}"#,
        envelope_json("acme", "n-1")
    );
    let envelope = ProofEnvelope::from_json(&wrapped).unwrap();
    assert_eq!(envelope.product_id, "acme");
}

#[test]
fn parse_rejects_malformed_json() {
    let result = ProofEnvelope::from_json("{ not json");
    assert!(matches!(result, Err(EnvelopeError::Json(_))));
}

#[test]
fn parse_rejects_missing_challenge() {
    let result = ProofEnvelope::from_json(
        r#"{"proofBytes":"cHJvb2Y=","verificationKeyBytes":"dms=","productId":"p"}"#,
    );
    assert!(matches!(result, Err(EnvelopeError::Json(_))));
}

#[test]
fn parse_ignores_unknown_fields() {
    let json = envelope_json("acme", "n-1").replacen('{', r#"{"futureField": 42,"#, 1);
    assert!(ProofEnvelope::from_json(&json).is_ok());
}

// ── Structural validation ────────────────────────────────────────

#[test]
fn validate_happy_path() {
    let envelope = ProofEnvelope::from_json(&envelope_json("acme", "n-1")).unwrap();
    assert!(envelope.validate().is_ok());
}

#[test]
fn validate_rejects_empty_product_id() {
    let envelope = ProofEnvelope::from_json(&envelope_json("  ", "n-1")).unwrap();
    assert!(matches!(
        envelope.validate(),
        Err(EnvelopeError::EmptyField("productId"))
    ));
}

#[test]
fn validate_rejects_empty_nonce() {
    let envelope = ProofEnvelope::from_json(&envelope_json("acme", " ")).unwrap();
    assert!(matches!(
        envelope.validate(),
        Err(EnvelopeError::EmptyField("challenge.nonce"))
    ));
}

#[test]
fn validate_rejects_bad_proof_base64() {
    let mut envelope = ProofEnvelope::from_json(&envelope_json("acme", "n-1")).unwrap();
    envelope.proof_bytes = "!!not base64!!".to_string();
    assert!(matches!(
        envelope.validate(),
        Err(EnvelopeError::Base64 { field: "proofBytes", .. })
    ));
}

#[test]
fn validate_rejects_bad_verification_key_base64() {
    let mut envelope = ProofEnvelope::from_json(&envelope_json("acme", "n-1")).unwrap();
    envelope.verification_key_bytes = "???".to_string();
    assert!(matches!(
        envelope.validate(),
        Err(EnvelopeError::Base64 { field: "verificationKeyBytes", .. })
    ));
}

#[test]
fn validate_rejects_issued_after_expiry() {
    let mut envelope = ProofEnvelope::from_json(&envelope_json("acme", "n-1")).unwrap();
    envelope.challenge.issued_at = envelope.challenge.expires_at + Duration::seconds(1);
    assert!(matches!(
        envelope.validate(),
        Err(EnvelopeError::ChallengeOutOfOrder { .. })
    ));
}

#[test]
fn validate_accepts_issued_equal_to_expiry() {
    let mut envelope = ProofEnvelope::from_json(&envelope_json("acme", "n-1")).unwrap();
    envelope.challenge.issued_at = envelope.challenge.expires_at;
    assert!(envelope.validate().is_ok());
}

// ── Byte decoding ────────────────────────────────────────────────

#[test]
fn decode_byte_fields() {
    let envelope = ProofEnvelope::from_json(&envelope_json("acme", "n-1")).unwrap();
    assert_eq!(envelope.decode_proof_bytes().unwrap(), b"proof");
    assert_eq!(envelope.decode_verification_key().unwrap(), b"vk");
}

#[test]
fn decode_rejects_empty_proof_bytes() {
    let mut envelope = ProofEnvelope::from_json(&envelope_json("acme", "n-1")).unwrap();
    envelope.proof_bytes = String::new();
    assert!(matches!(
        envelope.decode_proof_bytes(),
        Err(EnvelopeError::EmptyField("proofBytes"))
    ));
}

// ── Round-trip ───────────────────────────────────────────────────

#[test]
fn serialize_roundtrip_is_stable() {
    let mut envelope = ProofEnvelope::from_json(&envelope_json("acme", "n-1")).unwrap();
    envelope.metadata = Some(
        [("zeta", "1"), ("alpha", "2")]
            .into_iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect(),
    );

    let first = envelope.to_json().unwrap();
    let reparsed = ProofEnvelope::from_json(&first).unwrap();
    let second = reparsed.to_json().unwrap();
    assert_eq!(first, second);
    assert_eq!(envelope, reparsed);
}

#[test]
fn roundtrip_without_optional_fields() {
    let envelope = ProofEnvelope::from_json(&envelope_json("acme", "n-1")).unwrap();
    let json = envelope.to_json().unwrap();
    assert!(!json.contains("metadata"));
    let reparsed = ProofEnvelope::from_json(&json).unwrap();
    assert_eq!(envelope, reparsed);
}
