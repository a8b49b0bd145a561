use chrono::{DateTime, Utc};
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use credo_core::{EventBus, Hash, IdentityId, Principal, RegistryConfig, RegistryEvent};
use credo_crypto::hash;

use crate::error::IdentityError;
use crate::oracle::OwnershipOracle;

/// Scope of a delegate approval.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DelegateScope {
    /// Approval over a single identity (cleared on transfer).
    Identity,
    /// Operator rights over all identities the granting principal controls.
    AllIdentities,
}

/// Stored state of one registered identity.
///
/// The id itself is the map key and immutable once assigned. Records are
/// never deleted; metadata values are overwritten in place, never removed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IdentityRecord {
    /// Current controlling principal.
    pub owner: Principal,
    /// Optional descriptor URI, typically pointing to off-ledger JSON.
    pub descriptor_uri: Option<String>,
    /// Single-id delegate, cleared on transfer.
    pub delegate: Option<Principal>,
    /// Metadata entries, last write wins.
    pub metadata: HashMap<String, Vec<u8>>,
    /// When the identity was registered.
    pub created_at: DateTime<Utc>,
}

/// Ownership-and-metadata store for Credo identities.
///
/// Ids are assigned from an atomic counter starting at 1; a failed
/// registration never consumes an id. All tables are concurrent maps, so
/// the registry is shareable across threads behind an `Arc`.
pub struct IdentityRegistry {
    config: RegistryConfig,
    registry_ref: Hash,
    next_id: AtomicU64,
    records: DashMap<IdentityId, IdentityRecord>,
    /// (owner, operator) pairs granted all-ids delegation.
    operators: DashMap<(Principal, Principal), ()>,
    events: Arc<EventBus>,
}

impl IdentityRegistry {
    /// Create a registry for the given deployment configuration.
    pub fn new(config: RegistryConfig, events: Arc<EventBus>) -> Self {
        let registry_ref = hash(config.registry_label.as_bytes());
        Self {
            config,
            registry_ref,
            next_id: AtomicU64::new(1),
            records: DashMap::new(),
            operators: DashMap::new(),
            events,
        }
    }

    /// Register a new identity controlled by `caller`.
    ///
    /// Returns the assigned id: unique, strictly increasing from 1, and
    /// immediately queryable. Metadata keys are validated before the id is
    /// allocated, so a rejected batch leaves the counter untouched.
    pub fn register(
        &self,
        caller: Principal,
        descriptor_uri: Option<&str>,
        metadata: &[(String, Vec<u8>)],
    ) -> Result<IdentityId, IdentityError> {
        if metadata.iter().any(|(key, _)| key.is_empty()) {
            return Err(IdentityError::InvalidMetadataKey);
        }

        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        let record = IdentityRecord {
            owner: caller,
            descriptor_uri: descriptor_uri.map(str::to_owned),
            delegate: None,
            metadata: metadata.iter().cloned().collect(),
            created_at: Utc::now(),
        };
        self.records.insert(id, record);

        tracing::info!(id, owner = %caller, "identity registered");
        self.events.emit(RegistryEvent::IdentityRegistered {
            id,
            descriptor_uri: descriptor_uri.map(str::to_owned),
            owner: caller,
        });
        for (key, value) in metadata {
            self.events.emit(RegistryEvent::MetadataSet {
                id,
                key: key.clone(),
                value: value.clone(),
            });
        }

        Ok(id)
    }

    /// Set or overwrite a metadata entry. Owner or delegate only.
    pub fn set_metadata(
        &self,
        caller: Principal,
        id: IdentityId,
        key: &str,
        value: Vec<u8>,
    ) -> Result<(), IdentityError> {
        if key.is_empty() {
            return Err(IdentityError::EmptyKey);
        }
        let mut record = self
            .records
            .get_mut(&id)
            .ok_or(IdentityError::UnknownIdentity(id))?;
        if !self.may_act(&caller, &record) {
            return Err(IdentityError::NotAuthorized {
                principal: caller,
                id,
            });
        }
        record.metadata.insert(key.to_owned(), value.clone());
        drop(record);

        tracing::info!(id, key, "metadata set");
        self.events.emit(RegistryEvent::MetadataSet {
            id,
            key: key.to_owned(),
            value,
        });
        Ok(())
    }

    /// Read a metadata entry. An unset key yields an empty value, never an
    /// error, as long as the identity exists.
    pub fn metadata(&self, id: IdentityId, key: &str) -> Result<Vec<u8>, IdentityError> {
        let record = self
            .records
            .get(&id)
            .ok_or(IdentityError::UnknownIdentity(id))?;
        Ok(record.metadata.get(key).cloned().unwrap_or_default())
    }

    /// Replace the descriptor URI. Owner or delegate only.
    pub fn set_descriptor_uri(
        &self,
        caller: Principal,
        id: IdentityId,
        descriptor_uri: Option<&str>,
    ) -> Result<(), IdentityError> {
        let mut record = self
            .records
            .get_mut(&id)
            .ok_or(IdentityError::UnknownIdentity(id))?;
        if !self.may_act(&caller, &record) {
            return Err(IdentityError::NotAuthorized {
                principal: caller,
                id,
            });
        }
        record.descriptor_uri = descriptor_uri.map(str::to_owned);
        drop(record);

        tracing::info!(id, "descriptor updated");
        self.events.emit(RegistryEvent::DescriptorUpdated {
            id,
            descriptor_uri: descriptor_uri.map(str::to_owned),
        });
        Ok(())
    }

    /// Read the descriptor URI.
    pub fn descriptor_uri(&self, id: IdentityId) -> Result<Option<String>, IdentityError> {
        let record = self
            .records
            .get(&id)
            .ok_or(IdentityError::UnknownIdentity(id))?;
        Ok(record.descriptor_uri.clone())
    }

    /// Transfer control of an identity.
    ///
    /// Caller must be the owner, the single-id delegate, or an operator for
    /// the owner. The single-id approval is cleared atomically with the
    /// owner change.
    pub fn transfer(
        &self,
        caller: Principal,
        id: IdentityId,
        new_owner: Principal,
    ) -> Result<(), IdentityError> {
        if new_owner.is_zero() {
            return Err(IdentityError::InvalidRecipient);
        }
        let mut record = self
            .records
            .get_mut(&id)
            .ok_or(IdentityError::UnknownIdentity(id))?;
        if !self.may_act(&caller, &record) {
            return Err(IdentityError::NotAuthorized {
                principal: caller,
                id,
            });
        }
        let previous = record.owner;
        record.owner = new_owner;
        record.delegate = None;
        drop(record);

        tracing::info!(id, from = %previous, to = %new_owner, "ownership transferred");
        self.events.emit(RegistryEvent::OwnershipTransferred {
            id,
            from: previous,
            to: new_owner,
        });
        Ok(())
    }

    /// Grant or revoke a delegate approval.
    ///
    /// `Identity` scope sets (or clears, when `approved` is false) the
    /// single-id delegate and requires the caller to be the owner or one of
    /// the owner's operators. `AllIdentities` scope grants `principal`
    /// operator rights over all of the caller's identities; the id argument
    /// is carried through to the event only.
    pub fn delegate(
        &self,
        caller: Principal,
        id: IdentityId,
        principal: Principal,
        scope: DelegateScope,
        approved: bool,
    ) -> Result<(), IdentityError> {
        let owner = match scope {
            DelegateScope::Identity => {
                let mut record = self
                    .records
                    .get_mut(&id)
                    .ok_or(IdentityError::UnknownIdentity(id))?;
                let owner = record.owner;
                let caller_is_operator =
                    self.operators.contains_key(&(owner, caller));
                if caller != owner && !caller_is_operator {
                    return Err(IdentityError::NotAuthorized {
                        principal: caller,
                        id,
                    });
                }
                record.delegate = if approved { Some(principal) } else { None };
                owner
            }
            DelegateScope::AllIdentities => {
                if approved {
                    self.operators.insert((caller, principal), ());
                } else {
                    self.operators.remove(&(caller, principal));
                }
                caller
            }
        };

        tracing::info!(id, delegate = %principal, ?scope, approved, "delegate approval changed");
        self.events.emit(RegistryEvent::DelegateApproved {
            id,
            owner,
            delegate: principal,
            approved,
        });
        Ok(())
    }

    /// The single-id delegate of an identity, if any.
    pub fn delegate_of(&self, id: IdentityId) -> Result<Option<Principal>, IdentityError> {
        let record = self
            .records
            .get(&id)
            .ok_or(IdentityError::UnknownIdentity(id))?;
        Ok(record.delegate)
    }

    /// Whether `operator` holds all-ids delegation from `owner`.
    pub fn is_delegate_for_all(&self, owner: &Principal, operator: &Principal) -> bool {
        self.operators.contains_key(&(*owner, *operator))
    }

    /// Total number of identities ever registered.
    pub fn count(&self) -> u64 {
        self.next_id.load(Ordering::SeqCst) - 1
    }

    fn may_act(&self, principal: &Principal, record: &IdentityRecord) -> bool {
        *principal == record.owner
            || record.delegate.as_ref() == Some(principal)
            || self.operators.contains_key(&(record.owner, *principal))
    }
}

impl OwnershipOracle for IdentityRegistry {
    fn exists(&self, id: IdentityId) -> bool {
        self.records.contains_key(&id)
    }

    fn owner_of(&self, id: IdentityId) -> Result<Principal, IdentityError> {
        self.records
            .get(&id)
            .map(|record| record.owner)
            .ok_or(IdentityError::UnknownIdentity(id))
    }

    fn is_authorized(&self, principal: &Principal, id: IdentityId) -> bool {
        self.records
            .get(&id)
            .map(|record| self.may_act(principal, &record))
            .unwrap_or(false)
    }

    fn registry_ref(&self) -> Hash {
        self.registry_ref
    }

    fn domain(&self) -> u64 {
        self.config.domain
    }
}
