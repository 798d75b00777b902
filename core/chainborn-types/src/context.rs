//! Validation contexts supplied by the embedding application.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Runtime binding data: identity key → observed value.
///
/// A `BTreeMap` so iteration (and therefore the cache-key encoding of this
/// data) is deterministic.
pub type BindingData = BTreeMap<String, String>;

/// How strictly the pipeline treats recoverable ambiguity.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Strictness {
    #[default]
    Strict,
    Permissive,
}

impl fmt::Display for Strictness {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Strict => "strict",
            Self::Permissive => "permissive",
        })
    }
}

/// Per-request validation context.
#[derive(Debug, Clone)]
pub struct ValidationContext {
    /// The product the caller is validating for.
    pub product_id: String,
    /// Pre-collected binding data. When absent and the policy requires
    /// binding, the orchestrator collects it for the request.
    pub binding_data: Option<BindingData>,
    /// Validation strictness.
    pub strictness: Strictness,
}

impl ValidationContext {
    /// Creates a strict context with no pre-collected binding data.
    #[must_use]
    pub fn new(product_id: impl Into<String>) -> Self {
        Self {
            product_id: product_id.into(),
            binding_data: None,
            strictness: Strictness::Strict,
        }
    }

    /// Sets pre-collected binding data.
    #[must_use]
    pub fn with_binding_data(mut self, binding_data: BindingData) -> Self {
        self.binding_data = Some(binding_data);
        self
    }

    /// Sets the strictness.
    #[must_use]
    pub fn with_strictness(mut self, strictness: Strictness) -> Self {
        self.strictness = strictness;
        self
    }
}
