//! Durable validation cache for the Chainborn license validator.
//!
//! One JSON file per entry under a cache directory, named by the SHA-256 of
//! the cache key. Entries carry their own expiry; reads past expiry miss and
//! lazily delete. Capacity is bounded: inserting a new key at capacity
//! evicts the least-recently-accessed entry.
//!
//! # Crash safety
//!
//! Writes go to a sibling `.tmp` file and are renamed into place, so a crash
//! mid-write never leaves a partial entry observable. Startup deletes stray
//! `.tmp` files and drops expired or corrupt entries while rebuilding the
//! in-memory metadata index.
//!
//! # Degraded mode
//!
//! If the cache directory cannot be created the cache disables itself:
//! `get` always misses and `set`/`invalidate` are no-ops. A cache problem
//! never fails a validation request.

mod cache;

pub use cache::{cache_file_name, CacheConfig, ValidationCache, DEFAULT_MAX_ENTRIES};
