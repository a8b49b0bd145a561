use serde::{Deserialize, Serialize};

/// Configuration for a Credo registry deployment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegistryConfig {
    /// Protocol domain identifier (chain/network id). Feedback
    /// authorizations are bound to one domain and rejected elsewhere.
    pub domain: u64,
    /// Human-readable registry label. The registry reference hash that
    /// authorizations are cross-checked against is derived from it.
    pub registry_label: String,
    /// Capacity of the registry event broadcast channel.
    pub event_capacity: usize,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            domain: 1,
            registry_label: "credo-main".into(),
            event_capacity: 256,
        }
    }
}
