//! Cache implementation.

use chainborn_types::{CacheEntry, ValidationResult};
use chrono::{DateTime, Duration, Utc};
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::{debug, warn};

/// Default entry capacity.
pub const DEFAULT_MAX_ENTRIES: usize = 100;

/// Returns the file name an entry for `key` is stored under:
/// lowercase hex of SHA-256 over the key, plus `.json`.
#[must_use]
pub fn cache_file_name(key: &str) -> String {
    let digest = Sha256::digest(key.as_bytes());
    let mut name: String = digest.iter().map(|b| format!("{b:02x}")).collect();
    name.push_str(".json");
    name
}

/// Cache configuration.
#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// Directory the cache owns exclusively.
    pub directory: PathBuf,
    /// Entry capacity; inserts beyond it evict the LRU entry.
    pub max_entries: usize,
}

impl CacheConfig {
    /// Configuration with the default capacity.
    #[must_use]
    pub fn new(directory: impl Into<PathBuf>) -> Self {
        Self {
            directory: directory.into(),
            max_entries: DEFAULT_MAX_ENTRIES,
        }
    }

    /// Overrides the entry capacity.
    #[must_use]
    pub fn with_max_entries(mut self, max_entries: usize) -> Self {
        self.max_entries = max_entries;
        self
    }
}

/// In-memory shadow of one persisted entry.
#[derive(Debug, Clone)]
struct EntryMeta {
    file_name: String,
    created_at: DateTime<Utc>,
    last_accessed_at: DateTime<Utc>,
    expires_at: DateTime<Utc>,
}

/// The durable key → result store.
///
/// The mutex guards only the metadata index and eviction decisions; entry
/// file I/O happens outside it.
pub struct ValidationCache {
    directory: PathBuf,
    max_entries: usize,
    enabled: bool,
    index: Mutex<HashMap<String, EntryMeta>>,
}

impl ValidationCache {
    /// Opens the cache: ensures the directory exists, removes stray `.tmp`
    /// files, loads surviving entries, and drops expired or corrupt ones.
    ///
    /// Never fails; an unusable directory yields a disabled cache.
    pub async fn open(config: CacheConfig) -> Self {
        if let Err(e) = tokio::fs::create_dir_all(&config.directory).await {
            warn!(
                directory = %config.directory.display(),
                "cache directory unusable, running without cache: {e}"
            );
            return Self {
                directory: config.directory,
                max_entries: config.max_entries,
                enabled: false,
                index: Mutex::new(HashMap::new()),
            };
        }

        let index = Self::scan_directory(&config.directory).await;
        debug!(
            directory = %config.directory.display(),
            entries = index.len(),
            "validation cache opened"
        );
        Self {
            directory: config.directory,
            max_entries: config.max_entries,
            enabled: true,
            index: Mutex::new(index),
        }
    }

    async fn scan_directory(directory: &Path) -> HashMap<String, EntryMeta> {
        let mut index = HashMap::new();
        let mut entries = match tokio::fs::read_dir(directory).await {
            Ok(rd) => rd,
            Err(e) => {
                warn!("cache directory scan failed: {e}");
                return index;
            }
        };

        let now = Utc::now();
        loop {
            let dir_entry = match entries.next_entry().await {
                Ok(Some(dir_entry)) => dir_entry,
                Ok(None) => break,
                Err(e) => {
                    warn!("cache directory scan interrupted: {e}");
                    break;
                }
            };
            let path = dir_entry.path();
            let Some(file_name) = path.file_name().and_then(|n| n.to_str()) else {
                continue;
            };

            if file_name.ends_with(".tmp") {
                debug!(file_name, "removing stray temp file");
                let _ = tokio::fs::remove_file(&path).await;
                continue;
            }
            if !file_name.ends_with(".json") {
                continue;
            }

            match Self::read_entry_file(&path).await {
                Some(entry) if !entry.is_expired(now) => {
                    index.insert(
                        file_name.to_string(),
                        EntryMeta {
                            file_name: file_name.to_string(),
                            created_at: entry.result.validated_at,
                            last_accessed_at: entry.result.validated_at,
                            expires_at: entry.expires_at,
                        },
                    );
                }
                Some(_) => {
                    debug!(file_name, "dropping expired cache entry");
                    let _ = tokio::fs::remove_file(&path).await;
                }
                None => {
                    warn!(file_name, "dropping corrupt cache entry");
                    let _ = tokio::fs::remove_file(&path).await;
                }
            }
        }
        index
    }

    async fn read_entry_file(path: &Path) -> Option<CacheEntry> {
        let contents = tokio::fs::read_to_string(path).await.ok()?;
        serde_json::from_str(&contents).ok()
    }

    /// Looks up `key`. Misses when the entry is absent, expired, or corrupt;
    /// expired and corrupt files are deleted on the way out. A hit records
    /// an access timestamp for the LRU ordering.
    pub async fn get(&self, key: &str) -> Option<ValidationResult> {
        if !self.enabled {
            return None;
        }
        let file_name = cache_file_name(key);

        let expired_in_index = {
            let index = self.index.lock().expect("cache index poisoned");
            match index.get(&file_name) {
                None => return None,
                Some(meta) => meta.expires_at <= Utc::now(),
            }
        };
        if expired_in_index {
            debug!(file_name, "cache entry expired");
            self.remove_entry(&file_name).await;
            return None;
        }

        let path = self.directory.join(&file_name);
        let entry = match Self::read_entry_file(&path).await {
            Some(entry) => entry,
            None => {
                warn!(file_name, "cache entry unreadable, treating as miss");
                self.remove_entry(&file_name).await;
                return None;
            }
        };

        let now = Utc::now();
        if entry.is_expired(now) {
            debug!(file_name, "cache entry expired");
            self.remove_entry(&file_name).await;
            return None;
        }

        let mut index = self.index.lock().expect("cache index poisoned");
        if let Some(meta) = index.get_mut(&file_name) {
            meta.last_accessed_at = now;
        }
        Some(entry.result)
    }

    /// Stores `result` under `key` with `expires_at = now + ttl`, evicting
    /// the least-recently-accessed entry when a new key lands at capacity.
    /// Updates to an existing key never evict. I/O failures are logged and
    /// leave the cache consistent; the caller's request is unaffected.
    pub async fn set(&self, key: &str, result: &ValidationResult, ttl: Duration) {
        if !self.enabled {
            return;
        }
        let now = Utc::now();
        let expires_at = now + ttl;
        if expires_at <= now {
            debug!(key, "refusing to store already-expired entry");
            return;
        }

        let entry = CacheEntry {
            result: result.clone(),
            expires_at,
        };
        let json = match serde_json::to_string(&entry) {
            Ok(json) => json,
            Err(e) => {
                warn!("cache entry serialization failed: {e}");
                return;
            }
        };

        let file_name = cache_file_name(key);
        let path = self.directory.join(&file_name);
        let tmp_path = self.directory.join(format!("{file_name}.tmp"));

        if let Err(e) = tokio::fs::write(&tmp_path, json.as_bytes()).await {
            warn!(file_name, "cache write failed: {e}");
            return;
        }
        if let Err(e) = tokio::fs::rename(&tmp_path, &path).await {
            warn!(file_name, "cache rename failed: {e}");
            let _ = tokio::fs::remove_file(&tmp_path).await;
            return;
        }

        let evicted = {
            let mut index = self.index.lock().expect("cache index poisoned");
            let evicted = if !index.contains_key(&file_name) && index.len() >= self.max_entries
            {
                Self::evict_lru(&mut index)
            } else {
                None
            };
            index.insert(
                file_name.clone(),
                EntryMeta {
                    file_name,
                    created_at: now,
                    last_accessed_at: now,
                    expires_at,
                },
            );
            evicted
        };

        if let Some(victim) = evicted {
            debug!(file_name = victim.as_str(), "evicted least-recently-used entry");
            let _ = tokio::fs::remove_file(self.directory.join(&victim)).await;
        }
    }

    /// Removes any entry stored under `key`.
    pub async fn invalidate(&self, key: &str) {
        if !self.enabled {
            return;
        }
        let file_name = cache_file_name(key);
        self.remove_entry(&file_name).await;
    }

    /// Number of live entries in the metadata index.
    #[must_use]
    pub fn len(&self) -> usize {
        self.index.lock().expect("cache index poisoned").len()
    }

    /// True when the cache holds no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whether the cache directory was usable at open.
    #[must_use]
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Picks the entry with the oldest `last_accessed_at`, removes its
    /// metadata, and returns its file name. Caller deletes the file.
    fn evict_lru(index: &mut HashMap<String, EntryMeta>) -> Option<String> {
        let victim = index
            .values()
            .min_by_key(|meta| (meta.last_accessed_at, meta.created_at))?
            .file_name
            .clone();
        index.remove(&victim);
        Some(victim)
    }

    async fn remove_entry(&self, file_name: &str) {
        {
            let mut index = self.index.lock().expect("cache index poisoned");
            index.remove(file_name);
        }
        let _ = tokio::fs::remove_file(self.directory.join(file_name)).await;
    }
}
