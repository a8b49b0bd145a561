//! Credo Core: fundamental types, errors, events, and configuration for the
//! Credo trust-registry protocol.

pub mod config;
pub mod error;
pub mod events;
pub mod types;

pub use config::RegistryConfig;
pub use error::CoreError;
pub use events::{EventBus, RegistryEvent};
pub use types::{Hash, IdentityId, Principal};
