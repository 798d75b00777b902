//! Binding-mode enforcement.
//!
//! Compares collected binding data against the public outputs the verifier
//! surfaced. While the verifier backend does not yet surface public outputs
//! the comparator accepts with a warning (stub mode); the comparison turns
//! strict the moment outputs appear, with no interface change.

use chainborn_types::{BindingData, BindingMode};
use std::collections::BTreeMap;
use tracing::warn;

/// Outcome of a binding check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BindingCheck {
    pub valid: bool,
    pub errors: Vec<String>,
}

impl BindingCheck {
    fn ok() -> Self {
        Self {
            valid: true,
            errors: Vec::new(),
        }
    }

    fn fail(error: String) -> Self {
        Self {
            valid: false,
            errors: vec![error],
        }
    }
}

/// Validates binding data against the proof's public outputs under the
/// policy's binding mode. Purely functional.
#[must_use]
pub fn validate_binding(
    mode: BindingMode,
    binding_data: Option<&BindingData>,
    public_inputs: Option<&BTreeMap<String, String>>,
) -> BindingCheck {
    match mode {
        BindingMode::None => BindingCheck::ok(),
        BindingMode::Organization => check_key("org_id", binding_data, public_inputs),
        BindingMode::Environment => check_key("environment_id", binding_data, public_inputs),
        BindingMode::Attestation => {
            warn!("attestation binding is reserved and not yet enforced");
            BindingCheck::ok()
        }
    }
}

fn check_key(
    key: &str,
    binding_data: Option<&BindingData>,
    public_inputs: Option<&BTreeMap<String, String>>,
) -> BindingCheck {
    // Stub mode: the backend does not surface public outputs yet, so the
    // comparison cannot be performed. Accept, loudly.
    let Some(inputs) = public_inputs.filter(|m| !m.is_empty()) else {
        warn!(key, "proof has no public outputs; skipping binding comparison");
        return BindingCheck::ok();
    };

    let Some(data) = binding_data.filter(|m| !m.is_empty()) else {
        return BindingCheck::fail(format!(
            "binding is required but no binding data was collected (needs '{key}')"
        ));
    };

    let bound = match data.get(key).filter(|v| !v.is_empty()) {
        Some(v) => v,
        None => {
            return BindingCheck::fail(format!("binding data is missing '{key}'"));
        }
    };
    let expected = match inputs.get(key).filter(|v| !v.is_empty()) {
        Some(v) => v,
        None => {
            return BindingCheck::fail(format!("proof public outputs are missing '{key}'"));
        }
    };

    if bound != expected {
        return BindingCheck::fail(format!(
            "binding mismatch for '{key}': proof is bound to '{expected}' but the runtime reports '{bound}'"
        ));
    }

    BindingCheck::ok()
}
