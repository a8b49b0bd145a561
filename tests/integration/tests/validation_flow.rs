//! Integration test: validation request/response lifecycle against the
//! real identity registry.

use std::sync::Arc;

use credo_core::{EventBus, Hash, Principal, RegistryConfig};
use credo_crypto::KeyPair;
use credo_identity::{DelegateScope, IdentityRegistry, OwnershipOracle};
use credo_validation::{ValidationError, ValidationRegistry, ValidationSummary};

fn setup() -> (Arc<IdentityRegistry>, ValidationRegistry) {
    let config = RegistryConfig::default();
    let events = Arc::new(EventBus::new(config.event_capacity));
    let registry = Arc::new(IdentityRegistry::new(config, events.clone()));
    let validation = ValidationRegistry::new(registry.clone() as Arc<dyn OwnershipOracle>, events);
    (registry, validation)
}

#[test]
fn test_commission_and_progressive_response() {
    let (registry, validation) = setup();
    let owner = KeyPair::from_seed(&[1u8; 32]);
    let validator = KeyPair::from_seed(&[2u8; 32]);

    let id = registry.register(owner.principal(), None, &[]).unwrap();

    // No hash supplied: one is derived and is immediately resolvable.
    let commitment = validation
        .request_validation(owner.principal(), validator.principal(), id, "req://1", None)
        .unwrap();
    assert!(validation.request_exists(commitment));

    validation
        .submit_response(validator.principal(), commitment, 100, None, None, "hard")
        .unwrap();
    let status = validation.status(commitment);
    assert_eq!(status.validator, validator.principal());
    assert_eq!(status.identity_id, id);
    assert_eq!(status.response, 100);
    assert_eq!(status.tag, "hard");
    assert!(status.updated_at.is_some());

    // Anyone but the named validator is rejected.
    let impostor = KeyPair::from_seed(&[3u8; 32]);
    let result =
        validation.submit_response(impostor.principal(), commitment, 0, None, None, "veto");
    assert!(matches!(
        result,
        Err(ValidationError::NotAuthorizedValidator { .. })
    ));
}

#[test]
fn test_progressive_finality_overwrites() {
    let (registry, validation) = setup();
    let owner = KeyPair::from_seed(&[1u8; 32]);
    let validator = KeyPair::from_seed(&[2u8; 32]);
    let id = registry.register(owner.principal(), None, &[]).unwrap();

    let commitment = validation
        .request_validation(owner.principal(), validator.principal(), id, "req://1", None)
        .unwrap();

    validation
        .submit_response(validator.principal(), commitment, 80, None, None, "soft")
        .unwrap();
    validation
        .submit_response(validator.principal(), commitment, 100, None, None, "hard")
        .unwrap();

    let status = validation.status(commitment);
    assert_eq!((status.response, status.tag.as_str()), (100, "hard"));
}

#[test]
fn test_commitment_hash_write_once_across_arguments() {
    let (registry, validation) = setup();
    let owner = KeyPair::from_seed(&[1u8; 32]);
    let validator = KeyPair::from_seed(&[2u8; 32]);
    let other_validator = KeyPair::from_seed(&[3u8; 32]);
    let id = registry.register(owner.principal(), None, &[]).unwrap();

    let commitment = Hash::from_bytes([0x42u8; 32]);
    validation
        .request_validation(
            owner.principal(),
            validator.principal(),
            id,
            "req://1",
            Some(commitment),
        )
        .unwrap();

    let result = validation.request_validation(
        owner.principal(),
        other_validator.principal(),
        id,
        "req://hijack",
        Some(commitment),
    );
    assert!(matches!(
        result,
        Err(ValidationError::RequestHashAlreadyExists(_))
    ));
    // The original binding is intact.
    let details = validation.request_details(commitment).unwrap();
    assert_eq!(details.validator, validator.principal());
    assert_eq!(details.request_uri, "req://1");
}

#[test]
fn test_only_controller_commissions_and_independence_enforced() {
    let (registry, validation) = setup();
    let owner = KeyPair::from_seed(&[1u8; 32]);
    let delegate = KeyPair::from_seed(&[2u8; 32]);
    let validator = KeyPair::from_seed(&[3u8; 32]);
    let outsider = KeyPair::from_seed(&[4u8; 32]);
    let id = registry.register(owner.principal(), None, &[]).unwrap();

    // Outsiders cannot commission.
    let result = validation.request_validation(
        outsider.principal(),
        validator.principal(),
        id,
        "req://1",
        None,
    );
    assert!(matches!(result, Err(ValidationError::NotAuthorized { .. })));

    // The owner cannot name themselves.
    let result =
        validation.request_validation(owner.principal(), owner.principal(), id, "req://1", None);
    assert!(matches!(
        result,
        Err(ValidationError::SelfValidationNotAllowed)
    ));

    // A delegate can commission, but not name themselves.
    registry
        .delegate(
            owner.principal(),
            id,
            delegate.principal(),
            DelegateScope::Identity,
            true,
        )
        .unwrap();
    let result = validation.request_validation(
        delegate.principal(),
        delegate.principal(),
        id,
        "req://1",
        None,
    );
    assert!(matches!(
        result,
        Err(ValidationError::SelfValidationNotAllowed)
    ));
    let commitment = validation
        .request_validation(
            delegate.principal(),
            validator.principal(),
            id,
            "req://1",
            None,
        )
        .unwrap();
    assert!(validation.request_exists(commitment));
}

#[test]
fn test_summary_and_enumeration() {
    let (registry, validation) = setup();
    let owner = KeyPair::from_seed(&[1u8; 32]);
    let validator_a = KeyPair::from_seed(&[2u8; 32]);
    let validator_b = KeyPair::from_seed(&[3u8; 32]);
    let id = registry.register(owner.principal(), None, &[]).unwrap();

    let a = validation
        .request_validation(owner.principal(), validator_a.principal(), id, "req://a", None)
        .unwrap();
    let b = validation
        .request_validation(owner.principal(), validator_b.principal(), id, "req://b", None)
        .unwrap();

    validation
        .submit_response(validator_a.principal(), a, 90, None, None, "confirmed")
        .unwrap();
    validation
        .submit_response(validator_b.principal(), b, 71, None, None, "confirmed")
        .unwrap();

    assert_eq!(validation.requests_for_identity(id), vec![a, b]);
    assert_eq!(
        validation.requests_for_validator(&validator_a.principal()),
        vec![a]
    );

    let summary = validation.summary(id, &[], Some("confirmed"));
    assert_eq!(
        summary,
        ValidationSummary {
            count: 2,
            average_response: 80
        }
    );
}

#[test]
fn test_status_sentinel_requires_existence_check() {
    let (registry, validation) = setup();
    let owner = KeyPair::from_seed(&[1u8; 32]);
    let validator = KeyPair::from_seed(&[2u8; 32]);
    let id = registry.register(owner.principal(), None, &[]).unwrap();

    let commitment = validation
        .request_validation(owner.principal(), validator.principal(), id, "req://1", None)
        .unwrap();
    let never_used = Hash::from_bytes([0x99u8; 32]);

    // Both read as sentinels; only the existence check tells them apart.
    assert_eq!(validation.status(commitment).validator, Principal::ZERO);
    assert_eq!(validation.status(never_used).validator, Principal::ZERO);
    assert!(validation.request_exists(commitment));
    assert!(!validation.request_exists(never_used));
}
