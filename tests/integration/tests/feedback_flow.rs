//! Integration test: end-to-end feedback flow across the identity registry
//! and the feedback ledger.
//!
//! The ledger consults the real registry through the OwnershipOracle seam,
//! so these tests cover the cross-registry authorization paths: signed
//! grants, index limits, self-feedback rejection, and the effect of
//! ownership transfers on in-flight authorizations.

use std::sync::Arc;

use chrono::{Duration, Utc};

use credo_core::{EventBus, IdentityId, Principal, RegistryConfig, RegistryEvent};
use credo_crypto::KeyPair;
use credo_feedback::{
    FeedbackAuthorization, FeedbackError, FeedbackLedger, FeedbackSummary, SignerDirectory,
};
use credo_identity::{IdentityRegistry, OwnershipOracle};

fn setup() -> (Arc<IdentityRegistry>, FeedbackLedger, Arc<EventBus>) {
    let config = RegistryConfig::default();
    let events = Arc::new(EventBus::new(config.event_capacity));
    let registry = Arc::new(IdentityRegistry::new(config, events.clone()));
    let ledger = FeedbackLedger::new(
        registry.clone() as Arc<dyn OwnershipOracle>,
        SignerDirectory::new(),
        events.clone(),
    );
    (registry, ledger, events)
}

fn grant(
    registry: &IdentityRegistry,
    identity_id: IdentityId,
    rater: Principal,
    index_limit: u64,
    signer: &KeyPair,
) -> Vec<u8> {
    FeedbackAuthorization {
        identity_id,
        rater,
        index_limit,
        expiry: Utc::now() + Duration::hours(1),
        domain: registry.domain(),
        registry_ref: registry.registry_ref(),
        signer: signer.principal(),
    }
    .sign(signer)
}

#[test]
fn test_bounded_grant_scenario() {
    let (registry, ledger, _events) = setup();
    let owner = KeyPair::from_seed(&[1u8; 32]);
    let client = KeyPair::from_seed(&[2u8; 32]);

    let id = registry.register(owner.principal(), None, &[]).unwrap();
    assert_eq!(id, 1);

    // Client submits under a grant bounded to a single entry.
    let blob = grant(&registry, id, client.principal(), 1, &owner);
    let index = ledger
        .submit_feedback(
            client.principal(),
            id,
            95,
            "quality",
            "",
            Some("ipfs://evidence-1"),
            None,
            &blob,
        )
        .unwrap();
    assert_eq!(index, 1);
    assert_eq!(ledger.last_index(id, &client.principal()), 1);

    // Reusing the same grant exceeds its index limit.
    let result = ledger.submit_feedback(
        client.principal(),
        id,
        90,
        "quality",
        "",
        None,
        None,
        &blob,
    );
    assert!(matches!(
        result,
        Err(FeedbackError::IndexLimitExceeded { limit: 1, next: 2 })
    ));
}

#[test]
fn test_owner_cannot_rate_own_identity() {
    let (registry, ledger, _events) = setup();
    let owner = KeyPair::from_seed(&[1u8; 32]);
    let id = registry.register(owner.principal(), None, &[]).unwrap();

    // A technically valid self-grant is still rejected.
    let blob = grant(&registry, id, owner.principal(), 5, &owner);
    let result = ledger.submit_feedback(
        owner.principal(),
        id,
        100,
        "",
        "",
        None,
        None,
        &blob,
    );
    assert!(matches!(result, Err(FeedbackError::SelfFeedbackNotAllowed)));
}

#[test]
fn test_transfer_invalidates_previous_owner_grants() {
    let (registry, ledger, _events) = setup();
    let owner = KeyPair::from_seed(&[1u8; 32]);
    let next_owner = KeyPair::from_seed(&[2u8; 32]);
    let client = KeyPair::from_seed(&[3u8; 32]);

    let id = registry.register(owner.principal(), None, &[]).unwrap();
    let old_grant = grant(&registry, id, client.principal(), 5, &owner);

    registry
        .transfer(owner.principal(), id, next_owner.principal())
        .unwrap();

    // The ledger re-queries ownership on every submission, so the old
    // owner's signature no longer carries authority.
    let result = ledger.submit_feedback(
        client.principal(),
        id,
        80,
        "",
        "",
        None,
        None,
        &old_grant,
    );
    assert!(matches!(result, Err(FeedbackError::InvalidSigner(_))));

    // A grant signed by the new owner works immediately.
    let new_grant = grant(&registry, id, client.principal(), 5, &next_owner);
    assert_eq!(
        ledger
            .submit_feedback(client.principal(), id, 80, "", "", None, None, &new_grant)
            .unwrap(),
        1
    );
}

#[test]
fn test_delegate_signed_grant() {
    let (registry, ledger, _events) = setup();
    let owner = KeyPair::from_seed(&[1u8; 32]);
    let delegate = KeyPair::from_seed(&[2u8; 32]);
    let client = KeyPair::from_seed(&[3u8; 32]);

    let id = registry.register(owner.principal(), None, &[]).unwrap();
    registry
        .delegate(
            owner.principal(),
            id,
            delegate.principal(),
            credo_identity::DelegateScope::Identity,
            true,
        )
        .unwrap();

    let blob = grant(&registry, id, client.principal(), 3, &delegate);
    assert_eq!(
        ledger
            .submit_feedback(client.principal(), id, 70, "", "", None, None, &blob)
            .unwrap(),
        1
    );
}

#[test]
fn test_summary_across_raters_skips_revoked() {
    let (registry, ledger, _events) = setup();
    let owner = KeyPair::from_seed(&[1u8; 32]);
    let rater_a = KeyPair::from_seed(&[2u8; 32]);
    let rater_b = KeyPair::from_seed(&[3u8; 32]);

    let id = registry.register(owner.principal(), None, &[]).unwrap();

    let blob_a = grant(&registry, id, rater_a.principal(), 5, &owner);
    let blob_b = grant(&registry, id, rater_b.principal(), 5, &owner);
    ledger
        .submit_feedback(rater_a.principal(), id, 90, "", "", None, None, &blob_a)
        .unwrap();
    ledger
        .submit_feedback(rater_b.principal(), id, 80, "", "", None, None, &blob_b)
        .unwrap();
    ledger
        .revoke_feedback(rater_a.principal(), id, 1)
        .unwrap();

    let summary = ledger.summary(id, &[], None, None);
    assert_eq!(
        summary,
        FeedbackSummary {
            count: 1,
            average_score: 80
        }
    );
    assert_eq!(
        ledger.raters(id),
        vec![rater_a.principal(), rater_b.principal()]
    );
}

#[test]
fn test_event_stream_reconstructs_mutation_history() {
    let (registry, ledger, events) = setup();
    let mut rx = events.subscribe();

    let owner = KeyPair::from_seed(&[1u8; 32]);
    let client = KeyPair::from_seed(&[2u8; 32]);

    let id = registry.register(owner.principal(), None, &[]).unwrap();
    let blob = grant(&registry, id, client.principal(), 2, &owner);
    ledger
        .submit_feedback(
            client.principal(),
            id,
            95,
            "",
            "",
            Some("ipfs://evidence"),
            None,
            &blob,
        )
        .unwrap();
    ledger.revoke_feedback(client.principal(), id, 1).unwrap();

    assert!(matches!(
        rx.try_recv().unwrap(),
        RegistryEvent::IdentityRegistered { id: 1, .. }
    ));
    // Evidence URI travels only on the event; the ledger does not store it.
    match rx.try_recv().unwrap() {
        RegistryEvent::FeedbackSubmitted { evidence_uri, .. } => {
            assert_eq!(evidence_uri.as_deref(), Some("ipfs://evidence"));
        }
        other => panic!("unexpected event: {:?}", other),
    }
    assert!(matches!(
        rx.try_recv().unwrap(),
        RegistryEvent::FeedbackRevoked { index: 1, .. }
    ));
}
