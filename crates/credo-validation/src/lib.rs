//! Credo Validation Protocol
//!
//! Lets an identity's controller commission an out-of-band validation from
//! a named validator, and lets that validator answer with a numeric
//! verdict, possibly more than once, each answer replacing the last
//! (progressive finality). Requests are keyed by write-once commitment
//! hashes: a hash, once used, can never denote a different request.

pub mod error;
pub mod registry;

pub use error::ValidationError;
pub use registry::{
    ValidationRegistry, ValidationRequest, ValidationStatus, ValidationSummary,
};
