use credo_core::{Hash, IdentityId, Principal};

use crate::error::IdentityError;

/// Read-only authorization capability over the identity registry.
///
/// The feedback ledger and validation protocol hold an
/// `Arc<dyn OwnershipOracle>` injected at construction and re-query it on
/// every authorization-sensitive operation. Ownership transfers therefore
/// take effect immediately for future writes, with no propagation step.
pub trait OwnershipOracle: Send + Sync {
    /// Whether the identity id has been assigned.
    fn exists(&self, id: IdentityId) -> bool;

    /// The current controlling principal of the identity.
    fn owner_of(&self, id: IdentityId) -> Result<Principal, IdentityError>;

    /// Whether the principal is the identity's owner, its single-id
    /// delegate, or an operator for the current owner.
    fn is_authorized(&self, principal: &Principal, id: IdentityId) -> bool;

    /// Stable reference hash identifying this registry deployment.
    /// Feedback authorizations are cross-checked against it.
    fn registry_ref(&self) -> Hash;

    /// Protocol domain identifier this registry lives on.
    fn domain(&self) -> u64;
}
