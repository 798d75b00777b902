//! Policy store for the Chainborn license validator.
//!
//! Loads per-product [`LicensePolicy`](chainborn_types::LicensePolicy)
//! documents from a policy directory, lazily on first request, and memoizes
//! both hits and misses so repeated validations don't probe the disk.
//! Malformed documents and I/O failures are *not* memoized, so a corrected
//! file or a recovered disk is picked up on the next request.

mod error;
mod store;

pub use error::{PolicyError, PolicyResult};
pub use store::PolicyStore;
