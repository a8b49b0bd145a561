use chrono::{DateTime, Utc};
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use credo_core::{EventBus, Hash, IdentityId, Principal, RegistryEvent};
use credo_identity::OwnershipOracle;

use crate::authorization::FeedbackAuthorization;
use crate::error::FeedbackError;
use crate::signers::SignerDirectory;

/// One stored feedback entry.
///
/// Evidence URI and integrity hash are emitted in the submission event but
/// never stored; off-ledger indexers keep them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedbackEntry {
    /// Score in 0-100.
    pub score: u8,
    /// First free-form categorization tag.
    pub tag1: String,
    /// Second free-form categorization tag.
    pub tag2: String,
    /// One-way revocation flag.
    pub revoked: bool,
    /// When the entry was stored.
    pub submitted_at: DateTime<Utc>,
}

/// A feedback entry together with its ledger position, as returned by the
/// read operations.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedbackRecord {
    pub rater: Principal,
    pub index: u64,
    pub entry: FeedbackEntry,
}

/// Filtered aggregate over feedback entries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedbackSummary {
    /// Number of entries that passed the filters.
    pub count: u64,
    /// Integer-truncated average score of those entries (0 when empty).
    pub average_score: u64,
}

/// Signature-authorized feedback ledger.
///
/// Entries are keyed by (identity, rater, sequence index); indices are
/// assigned by the ledger, strictly increasing from 1 per (identity, rater)
/// pair, and are the sole replay protection for authorization re-use. The
/// identity registry is consulted through the injected `OwnershipOracle` on
/// every write, so ownership changes bind immediately.
pub struct FeedbackLedger {
    oracle: Arc<dyn OwnershipOracle>,
    signers: SignerDirectory,
    entries: DashMap<(IdentityId, Principal, u64), FeedbackEntry>,
    /// Last assigned sequence index per (identity, rater). The entry guard
    /// on this map serializes the append path for one pair.
    sequences: DashMap<(IdentityId, Principal), u64>,
    /// Raters that have submitted against an identity, in first-seen order.
    raters: DashMap<IdentityId, Vec<Principal>>,
    /// Response annotation counters per (identity, rater, index, responder).
    responses: DashMap<(IdentityId, Principal, u64, Principal), u64>,
    events: Arc<EventBus>,
}

impl FeedbackLedger {
    /// Create a ledger backed by the given ownership oracle and signer
    /// directory.
    pub fn new(
        oracle: Arc<dyn OwnershipOracle>,
        signers: SignerDirectory,
        events: Arc<EventBus>,
    ) -> Self {
        Self {
            oracle,
            signers,
            entries: DashMap::new(),
            sequences: DashMap::new(),
            raters: DashMap::new(),
            responses: DashMap::new(),
            events,
        }
    }

    /// Contract-style signer directory, for registering signers whose
    /// signatures the direct Ed25519 path cannot verify.
    pub fn signers(&self) -> &SignerDirectory {
        &self.signers
    }

    /// Submit a feedback entry under a signed authorization.
    ///
    /// Returns the ledger-assigned sequence index. The authorization must
    /// target this identity, name the caller as rater, match the ledger's
    /// domain and identity registry, be unexpired, leave index room, and be
    /// signed by the identity's current owner or a delegate. The caller must
    /// not be the identity's own controller.
    #[allow(clippy::too_many_arguments)]
    pub fn submit_feedback(
        &self,
        caller: Principal,
        identity_id: IdentityId,
        score: u8,
        tag1: &str,
        tag2: &str,
        evidence_uri: Option<&str>,
        evidence_hash: Option<Hash>,
        authorization: &[u8],
    ) -> Result<u64, FeedbackError> {
        if score > 100 {
            return Err(FeedbackError::InvalidScore(score));
        }
        if !self.oracle.exists(identity_id) {
            return Err(FeedbackError::UnknownIdentity(identity_id));
        }

        let (auth, signature) = FeedbackAuthorization::decode(authorization)?;

        if auth.identity_id != identity_id {
            return Err(FeedbackError::IdentityMismatch {
                authorized: auth.identity_id,
                submitted: identity_id,
            });
        }
        if auth.rater != caller {
            return Err(FeedbackError::RaterMismatch {
                authorized: auth.rater,
                caller,
            });
        }
        if auth.domain != self.oracle.domain() {
            return Err(FeedbackError::DomainMismatch {
                authorized: auth.domain,
                registry: self.oracle.domain(),
            });
        }
        if auth.registry_ref != self.oracle.registry_ref() {
            return Err(FeedbackError::RegistryMismatch);
        }
        if Utc::now() >= auth.expiry {
            return Err(FeedbackError::AuthorizationExpired(auth.expiry));
        }

        // The entry guard is held from index computation through storage so
        // concurrent replays of one authorization serialize.
        let mut last = self.sequences.entry((identity_id, caller)).or_insert(0);
        let next = *last + 1;
        if next > auth.index_limit {
            return Err(FeedbackError::IndexLimitExceeded {
                limit: auth.index_limit,
                next,
            });
        }

        let owner = self
            .oracle
            .owner_of(identity_id)
            .map_err(|_| FeedbackError::UnknownIdentity(identity_id))?;
        if caller == owner {
            return Err(FeedbackError::SelfFeedbackNotAllowed);
        }

        let payload = auth.signing_payload();
        if !self.signers.attests(&auth.signer, &payload, &signature)
            || !self.oracle.is_authorized(&auth.signer, identity_id)
        {
            return Err(FeedbackError::InvalidSigner(auth.signer));
        }

        *last = next;
        drop(last);

        self.entries.insert(
            (identity_id, caller, next),
            FeedbackEntry {
                score,
                tag1: tag1.to_owned(),
                tag2: tag2.to_owned(),
                revoked: false,
                submitted_at: Utc::now(),
            },
        );
        let mut raters = self.raters.entry(identity_id).or_default();
        if !raters.contains(&caller) {
            raters.push(caller);
        }
        drop(raters);

        tracing::info!(identity_id, rater = %caller, index = next, score, "feedback submitted");
        self.events.emit(RegistryEvent::FeedbackSubmitted {
            id: identity_id,
            rater: caller,
            index: next,
            score,
            tag1: tag1.to_owned(),
            tag2: tag2.to_owned(),
            evidence_uri: evidence_uri.map(str::to_owned),
            evidence_hash,
        });

        Ok(next)
    }

    /// Revoke a previously submitted entry. Only the original rater may
    /// revoke, and only once; revocation is one-way.
    pub fn revoke_feedback(
        &self,
        caller: Principal,
        identity_id: IdentityId,
        index: u64,
    ) -> Result<(), FeedbackError> {
        if index == 0 || index > self.last_index(identity_id, &caller) {
            return Err(FeedbackError::InvalidIndex(index));
        }
        let mut entry = self
            .entries
            .get_mut(&(identity_id, caller, index))
            .ok_or(FeedbackError::InvalidIndex(index))?;
        if entry.revoked {
            return Err(FeedbackError::AlreadyRevoked { index });
        }
        entry.revoked = true;
        drop(entry);

        tracing::info!(identity_id, rater = %caller, index, "feedback revoked");
        self.events.emit(RegistryEvent::FeedbackRevoked {
            id: identity_id,
            rater: caller,
            index,
        });
        Ok(())
    }

    /// Append a response annotation to an existing entry. Open to any
    /// caller; purely an audit trail, with no on-ledger dispute resolution.
    pub fn append_response(
        &self,
        caller: Principal,
        identity_id: IdentityId,
        rater: Principal,
        index: u64,
        response_uri: &str,
        response_hash: Option<Hash>,
    ) -> Result<(), FeedbackError> {
        if index == 0 || index > self.last_index(identity_id, &rater) {
            return Err(FeedbackError::InvalidIndex(index));
        }
        if response_uri.is_empty() {
            return Err(FeedbackError::EmptyUri);
        }

        *self
            .responses
            .entry((identity_id, rater, index, caller))
            .or_insert(0) += 1;

        tracing::info!(identity_id, rater = %rater, index, responder = %caller, "response appended");
        self.events.emit(RegistryEvent::ResponseAppended {
            id: identity_id,
            rater,
            index,
            responder: caller,
            response_uri: response_uri.to_owned(),
            response_hash,
        });
        Ok(())
    }

    /// Filtered aggregate: count and integer-truncated average of
    /// non-revoked entries matching the tag filters.
    ///
    /// An empty `rater_filter` iterates every known rater for the identity.
    /// Cost is proportional to the entries scanned; unfiltered aggregation
    /// over an identity with many raters is a liability the caller opts
    /// into, not something the ledger bounds.
    pub fn summary(
        &self,
        identity_id: IdentityId,
        rater_filter: &[Principal],
        tag1_filter: Option<&str>,
        tag2_filter: Option<&str>,
    ) -> FeedbackSummary {
        let mut count = 0u64;
        let mut total = 0u64;
        self.scan(identity_id, rater_filter, |_, _, entry| {
            if !entry.revoked && Self::matches_tags(entry, tag1_filter, tag2_filter) {
                count += 1;
                total += entry.score as u64;
            }
        });
        FeedbackSummary {
            count,
            average_score: if count == 0 { 0 } else { total / count },
        }
    }

    /// Raw non-revoked entries matching the filters.
    pub fn read_feedback(
        &self,
        identity_id: IdentityId,
        rater_filter: &[Principal],
        tag1_filter: Option<&str>,
        tag2_filter: Option<&str>,
    ) -> Vec<FeedbackRecord> {
        let mut records = Vec::new();
        self.scan(identity_id, rater_filter, |rater, index, entry| {
            if !entry.revoked && Self::matches_tags(entry, tag1_filter, tag2_filter) {
                records.push(FeedbackRecord {
                    rater,
                    index,
                    entry: entry.clone(),
                });
            }
        });
        records
    }

    /// Raw entries matching the filters, revoked ones included (audit
    /// view; the revoked flag stays visible).
    pub fn read_all_feedback(
        &self,
        identity_id: IdentityId,
        rater_filter: &[Principal],
        tag1_filter: Option<&str>,
        tag2_filter: Option<&str>,
    ) -> Vec<FeedbackRecord> {
        let mut records = Vec::new();
        self.scan(identity_id, rater_filter, |rater, index, entry| {
            if Self::matches_tags(entry, tag1_filter, tag2_filter) {
                records.push(FeedbackRecord {
                    rater,
                    index,
                    entry: entry.clone(),
                });
            }
        });
        records
    }

    /// Total response annotations for an entry across the listed
    /// responders. Returns 0 when the filter list is empty: the ledger does
    /// not track unfiltered response totals, keeping writes cheap.
    pub fn response_count(
        &self,
        identity_id: IdentityId,
        rater: &Principal,
        index: u64,
        responder_filter: &[Principal],
    ) -> u64 {
        responder_filter
            .iter()
            .filter_map(|responder| {
                self.responses
                    .get(&(identity_id, *rater, index, *responder))
                    .map(|n| *n)
            })
            .sum()
    }

    /// Raters that have submitted feedback against the identity, in
    /// first-seen order.
    pub fn raters(&self, identity_id: IdentityId) -> Vec<Principal> {
        self.raters
            .get(&identity_id)
            .map(|list| list.clone())
            .unwrap_or_default()
    }

    /// Last sequence index assigned to the (identity, rater) pair, 0 if
    /// none.
    pub fn last_index(&self, identity_id: IdentityId, rater: &Principal) -> u64 {
        self.sequences
            .get(&(identity_id, *rater))
            .map(|last| *last)
            .unwrap_or(0)
    }

    fn matches_tags(
        entry: &FeedbackEntry,
        tag1_filter: Option<&str>,
        tag2_filter: Option<&str>,
    ) -> bool {
        tag1_filter.map_or(true, |t| entry.tag1 == t)
            && tag2_filter.map_or(true, |t| entry.tag2 == t)
    }

    fn scan<F>(&self, identity_id: IdentityId, rater_filter: &[Principal], mut visit: F)
    where
        F: FnMut(Principal, u64, &FeedbackEntry),
    {
        let raters: Vec<Principal> = if rater_filter.is_empty() {
            self.raters(identity_id)
        } else {
            rater_filter.to_vec()
        };
        for rater in raters {
            let last = self.last_index(identity_id, &rater);
            for index in 1..=last {
                if let Some(entry) = self.entries.get(&(identity_id, rater, index)) {
                    visit(rater, index, &entry);
                }
            }
        }
    }
}
