//! Integration test: identity registry lifecycle properties.

use std::sync::Arc;

use credo_core::{EventBus, RegistryConfig};
use credo_crypto::KeyPair;
use credo_identity::{DelegateScope, IdentityError, IdentityRegistry, OwnershipOracle};

fn setup() -> Arc<IdentityRegistry> {
    let config = RegistryConfig::default();
    let events = Arc::new(EventBus::new(config.event_capacity));
    Arc::new(IdentityRegistry::new(config, events))
}

#[test]
fn test_ids_unique_and_strictly_increasing_from_one() {
    let registry = setup();
    let mut previous = 0;
    for seed in 1..=5u8 {
        let caller = KeyPair::from_seed(&[seed; 32]).principal();
        let id = registry.register(caller, None, &[]).unwrap();
        assert_eq!(id, previous + 1);
        assert!(registry.exists(id));
        previous = id;
    }
    assert_eq!(registry.count(), 5);
}

#[test]
fn test_metadata_roundtrip_exact_bytes() {
    let registry = setup();
    let owner = KeyPair::from_seed(&[1u8; 32]).principal();
    let id = registry.register(owner, None, &[]).unwrap();

    let value = vec![0x00, 0xFF, 0x10, 0x20];
    registry
        .set_metadata(owner, id, "payload", value.clone())
        .unwrap();
    assert_eq!(registry.metadata(id, "payload").unwrap(), value);

    // Unset keys read as empty values on an existing identity, never as an
    // error.
    assert!(registry.metadata(id, "unset").unwrap().is_empty());
    assert!(matches!(
        registry.metadata(99, "payload"),
        Err(IdentityError::UnknownIdentity(99))
    ));
}

#[test]
fn test_transfer_chain_keeps_single_current_controller() {
    let registry = setup();
    let first = KeyPair::from_seed(&[1u8; 32]).principal();
    let second = KeyPair::from_seed(&[2u8; 32]).principal();
    let third = KeyPair::from_seed(&[3u8; 32]).principal();

    let id = registry.register(first, None, &[]).unwrap();
    registry.transfer(first, id, second).unwrap();
    registry.transfer(second, id, third).unwrap();

    assert_eq!(registry.owner_of(id).unwrap(), third);
    assert!(!registry.is_authorized(&first, id));
    assert!(!registry.is_authorized(&second, id));
    assert!(registry.is_authorized(&third, id));

    // A stale controller cannot act anymore.
    assert!(matches!(
        registry.transfer(first, id, second),
        Err(IdentityError::NotAuthorized { .. })
    ));
}

#[test]
fn test_operator_rights_span_current_identities_of_grantor() {
    let registry = setup();
    let owner = KeyPair::from_seed(&[1u8; 32]).principal();
    let operator = KeyPair::from_seed(&[2u8; 32]).principal();

    let id_a = registry.register(owner, None, &[]).unwrap();
    let id_b = registry.register(owner, None, &[]).unwrap();
    registry
        .delegate(owner, id_a, operator, DelegateScope::AllIdentities, true)
        .unwrap();

    assert!(registry.is_authorized(&operator, id_a));
    assert!(registry.is_authorized(&operator, id_b));

    // Operator rights follow the grantor, not the identity: after a
    // transfer the operator loses access to the moved identity.
    let new_owner = KeyPair::from_seed(&[3u8; 32]).principal();
    registry.transfer(operator, id_a, new_owner).unwrap();
    assert!(!registry.is_authorized(&operator, id_a));
    assert!(registry.is_authorized(&operator, id_b));
}

#[test]
fn test_descriptor_rotation() {
    let registry = setup();
    let owner = KeyPair::from_seed(&[1u8; 32]).principal();
    let id = registry
        .register(owner, Some("ipfs://v1"), &[])
        .unwrap();
    assert_eq!(registry.descriptor_uri(id).unwrap().as_deref(), Some("ipfs://v1"));

    registry
        .set_descriptor_uri(owner, id, Some("ipfs://v2"))
        .unwrap();
    assert_eq!(registry.descriptor_uri(id).unwrap().as_deref(), Some("ipfs://v2"));

    registry.set_descriptor_uri(owner, id, None).unwrap();
    assert_eq!(registry.descriptor_uri(id).unwrap(), None);
}
