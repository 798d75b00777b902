//! Runtime binding for the Chainborn license validator.
//!
//! Two halves:
//! - [`collector`] observes the runtime's identity (host name, container id,
//!   orchestrator metadata, `CHAINBORN_BINDING_*` variables) and emits a
//!   binding-data map. Best-effort: individual sources that fail are logged
//!   and skipped, the collector itself never fails.
//! - [`comparator`] enforces a policy's binding mode by comparing collected
//!   binding data against the public outputs the verifier surfaced. Purely
//!   functional.

pub mod collector;
pub mod comparator;

pub use collector::{collect, BINDING_VAR_PREFIX};
pub use comparator::{validate_binding, BindingCheck};
