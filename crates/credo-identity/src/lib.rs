//! Credo Identity Registry
//!
//! The single source of truth for "who may act for identity X":
//! - monotone identity id assignment (starting at 1, never reused)
//! - controlling principal, single-id delegates, and all-ids operators
//! - descriptor URIs and last-write-wins metadata
//! - the read-only `OwnershipOracle` capability the feedback ledger and
//!   validation protocol re-query on every authorization-sensitive write

pub mod error;
pub mod oracle;
pub mod registry;

pub use error::IdentityError;
pub use oracle::OwnershipOracle;
pub use registry::{DelegateScope, IdentityRecord, IdentityRegistry};
