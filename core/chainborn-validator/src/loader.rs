//! Proof envelope resolution.
//!
//! An envelope reaches the validator through exactly one of three sources,
//! consulted in priority order; the first source that is present wins and
//! later sources are never touched:
//!
//! 1. `LICENSE_PROOF`: the envelope JSON itself, base64-encoded;
//! 2. `LICENSE_PROOF_FILE`: a path to the envelope JSON;
//! 3. the default path, `/etc/chainborn/proof.json`.

use crate::error::LoaderError;
use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use chainborn_types::{EnvelopeError, ProofEnvelope};
use std::env;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Variable carrying the base64-encoded envelope JSON. Priority 1.
pub const INLINE_PROOF_VAR: &str = "LICENSE_PROOF";

/// Variable naming a file containing the envelope JSON. Priority 2.
pub const PROOF_FILE_VAR: &str = "LICENSE_PROOF_FILE";

/// Fallback path consulted when neither variable is set.
pub const DEFAULT_PROOF_PATH: &str = "/etc/chainborn/proof.json";

/// Resolves a proof envelope from the configured sources.
#[derive(Debug, Clone)]
pub struct ProofLoader {
    default_path: PathBuf,
}

impl Default for ProofLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl ProofLoader {
    /// A loader using the standard default path.
    #[must_use]
    pub fn new() -> Self {
        Self {
            default_path: PathBuf::from(DEFAULT_PROOF_PATH),
        }
    }

    /// Overrides the fallback path (priority 3).
    #[must_use]
    pub fn with_default_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.default_path = path.into();
        self
    }

    /// Loads and structurally validates a proof envelope from the highest-
    /// priority source that is present.
    ///
    /// # Errors
    ///
    /// [`LoaderError::NoProofAvailable`] when every source is absent,
    /// listing what was checked; otherwise the distinguished error for the
    /// source that was selected but failed.
    pub async fn load(&self) -> Result<ProofEnvelope, LoaderError> {
        if let Some(inline) = nonempty_var(INLINE_PROOF_VAR) {
            debug!("loading proof from {INLINE_PROOF_VAR}");
            return self.load_inline(&inline);
        }

        if let Some(path) = nonempty_var(PROOF_FILE_VAR) {
            debug!(path, "loading proof from {PROOF_FILE_VAR}");
            return self.load_file(Path::new(&path)).await;
        }

        match tokio::fs::read_to_string(&self.default_path).await {
            Ok(json) => {
                debug!(path = %self.default_path.display(), "loading proof from default path");
                self.parse(&json)
            }
            Err(e) if e.kind() == ErrorKind::NotFound => {
                Err(LoaderError::NoProofAvailable {
                    checked: vec![
                        INLINE_PROOF_VAR.to_string(),
                        PROOF_FILE_VAR.to_string(),
                        self.default_path.display().to_string(),
                    ],
                })
            }
            Err(source) => Err(LoaderError::Io {
                path: self.default_path.clone(),
                source,
            }),
        }
    }

    fn load_inline(&self, encoded: &str) -> Result<ProofEnvelope, LoaderError> {
        let bytes = BASE64.decode(encoded.trim())?;
        let json = String::from_utf8(bytes).map_err(|_| LoaderError::InlineNotUtf8)?;
        self.parse(&json)
    }

    async fn load_file(&self, path: &Path) -> Result<ProofEnvelope, LoaderError> {
        let json = match tokio::fs::read_to_string(path).await {
            Ok(json) => json,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(LoaderError::FileNotFound(path.to_path_buf()));
            }
            Err(source) => {
                return Err(LoaderError::Io {
                    path: path.to_path_buf(),
                    source,
                });
            }
        };
        self.parse(&json)
    }

    fn parse(&self, json: &str) -> Result<ProofEnvelope, LoaderError> {
        let envelope = ProofEnvelope::from_json(json).map_err(|e| match e {
            EnvelopeError::Json(e) => LoaderError::JsonParse(e),
            other => LoaderError::Structure(other),
        })?;
        envelope.validate().map_err(LoaderError::Structure)?;
        info!(
            product_id = %envelope.product_id,
            version = %envelope.version,
            "loaded proof envelope"
        );
        Ok(envelope)
    }
}

fn nonempty_var(name: &str) -> Option<String> {
    env::var(name).ok().filter(|v| !v.trim().is_empty())
}
