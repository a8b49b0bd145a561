//! Registry event stream.
//!
//! Every state mutation in the three registries emits a `RegistryEvent`.
//! The event stream is the primary off-ledger interface: external indexers
//! reconstruct full history from it, since on-ledger storage intentionally
//! omits bulky fields (evidence URIs and integrity hashes are emitted here
//! but never persisted).

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

use crate::types::{Hash, IdentityId, Principal};

/// Events emitted by the Credo registries.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum RegistryEvent {
    /// A new identity was registered.
    IdentityRegistered {
        id: IdentityId,
        descriptor_uri: Option<String>,
        owner: Principal,
    },

    /// A metadata entry was set or overwritten.
    MetadataSet {
        id: IdentityId,
        key: String,
        value: Vec<u8>,
    },

    /// Control of an identity moved to a new principal.
    OwnershipTransferred {
        id: IdentityId,
        from: Principal,
        to: Principal,
    },

    /// A delegate approval was granted or revoked.
    DelegateApproved {
        id: IdentityId,
        owner: Principal,
        delegate: Principal,
        approved: bool,
    },

    /// An identity's descriptor URI was replaced.
    DescriptorUpdated {
        id: IdentityId,
        descriptor_uri: Option<String>,
    },

    /// A feedback entry was stored.
    FeedbackSubmitted {
        id: IdentityId,
        rater: Principal,
        index: u64,
        score: u8,
        tag1: String,
        tag2: String,
        evidence_uri: Option<String>,
        evidence_hash: Option<Hash>,
    },

    /// A feedback entry was revoked by its rater.
    FeedbackRevoked {
        id: IdentityId,
        rater: Principal,
        index: u64,
    },

    /// A response annotation was appended to a feedback entry.
    ResponseAppended {
        id: IdentityId,
        rater: Principal,
        index: u64,
        responder: Principal,
        response_uri: String,
        response_hash: Option<Hash>,
    },

    /// A validation request was created.
    ValidationRequested {
        validator: Principal,
        id: IdentityId,
        request_uri: String,
        request_hash: Hash,
    },

    /// A validator answered (or re-answered) a validation request.
    ValidationResponded {
        validator: Principal,
        id: IdentityId,
        request_hash: Hash,
        response: u8,
        response_uri: Option<String>,
        response_hash: Option<Hash>,
        tag: String,
    },
}

/// Broadcast bus carrying registry events to off-ledger subscribers.
///
/// Emission is best-effort: an event with no live subscribers is dropped,
/// never an error. Each subscriber receives events in emission order.
#[derive(Debug, Clone)]
pub struct EventBus {
    sender: broadcast::Sender<RegistryEvent>,
}

impl EventBus {
    /// Create a bus with the given channel capacity.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Subscribe to the event stream.
    pub fn subscribe(&self) -> broadcast::Receiver<RegistryEvent> {
        self.sender.subscribe()
    }

    /// Emit an event to all current subscribers.
    pub fn emit(&self, event: RegistryEvent) {
        let _ = self.sender.send(event);
    }

    /// Number of live subscribers.
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}
