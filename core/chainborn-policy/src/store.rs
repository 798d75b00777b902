//! Lazy, memoizing policy resolution.

use crate::error::{PolicyError, PolicyResult};
use chainborn_types::LicensePolicy;
use std::collections::HashMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

/// Process-wide store mapping product ids to their parsed policies.
///
/// Lookup results are memoized: `Some(policy)` for a parsed document,
/// `None` for "no document exists". A restart re-reads from disk; there is
/// no invalidation at runtime.
pub struct PolicyStore {
    directory: PathBuf,
    cache: RwLock<HashMap<String, Option<Arc<LicensePolicy>>>>,
}

impl PolicyStore {
    /// Creates a store over the given policy directory. The directory is
    /// probed lazily; it may not exist yet when the store is built.
    #[must_use]
    pub fn new(directory: impl Into<PathBuf>) -> Self {
        Self {
            directory: directory.into(),
            cache: RwLock::new(HashMap::new()),
        }
    }

    /// The policy directory this store reads from.
    #[must_use]
    pub fn directory(&self) -> &Path {
        &self.directory
    }

    /// Resolves the policy for `product_id`.
    ///
    /// Returns `Ok(None)` when no document exists for the product (memoized
    /// so later calls skip the disk probe).
    ///
    /// # Errors
    ///
    /// - [`PolicyError::InvalidProductId`] / [`PolicyError::OutsidePolicyDirectory`]
    ///   when the id would traverse out of the policy directory;
    /// - [`PolicyError::Parse`] / [`PolicyError::Invalid`] for malformed
    ///   documents (not memoized, so a fixed file is retried);
    /// - [`PolicyError::Io`] for read failures other than absence (not
    ///   memoized).
    pub async fn get_policy(
        &self,
        product_id: &str,
    ) -> PolicyResult<Option<Arc<LicensePolicy>>> {
        validate_product_id(product_id)?;

        if let Some(cached) = self.cache.read().await.get(product_id) {
            return Ok(cached.clone());
        }

        let path = self.directory.join(format!("{product_id}.json"));
        let canonical = match tokio::fs::canonicalize(&path).await {
            Ok(p) => p,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!(product_id, "no policy document found");
                self.cache
                    .write()
                    .await
                    .insert(product_id.to_string(), None);
                return Ok(None);
            }
            Err(source) => return Err(PolicyError::Io { path, source }),
        };

        // The character check above already blocks traversal; this catches
        // symlinks pointing out of the directory.
        let canonical_dir = tokio::fs::canonicalize(&self.directory)
            .await
            .map_err(|source| PolicyError::Io {
                path: self.directory.clone(),
                source,
            })?;
        if !canonical.starts_with(&canonical_dir) {
            warn!(product_id, path = %canonical.display(), "policy path escapes the policy directory");
            return Err(PolicyError::OutsidePolicyDirectory(canonical));
        }

        let contents = tokio::fs::read_to_string(&canonical)
            .await
            .map_err(|source| PolicyError::Io {
                path: canonical.clone(),
                source,
            })?;

        let policy: LicensePolicy =
            serde_json::from_str(&contents).map_err(|source| PolicyError::Parse {
                product_id: product_id.to_string(),
                source,
            })?;
        policy.validate().map_err(|source| PolicyError::Invalid {
            product_id: product_id.to_string(),
            source,
        })?;
        if policy.product_id != product_id {
            return Err(PolicyError::ProductIdMismatch {
                expected: product_id.to_string(),
                found: policy.product_id,
            });
        }

        info!(product_id, version = %policy.version, "loaded policy");
        let policy = Arc::new(policy);
        self.cache
            .write()
            .await
            .insert(product_id.to_string(), Some(policy.clone()));
        Ok(Some(policy))
    }
}

fn validate_product_id(product_id: &str) -> PolicyResult<()> {
    if product_id.is_empty()
        || product_id.contains("..")
        || product_id.contains('/')
        || product_id.contains('\\')
    {
        return Err(PolicyError::InvalidProductId(product_id.to_string()));
    }
    Ok(())
}
