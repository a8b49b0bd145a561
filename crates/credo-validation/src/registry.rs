use chrono::{DateTime, Utc};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use credo_core::{EventBus, Hash, IdentityId, Principal, RegistryEvent};
use credo_crypto::{hash, TaggedEncoder};
use credo_identity::OwnershipOracle;

use crate::error::ValidationError;

/// An immutable validation request, keyed by its commitment hash.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationRequest {
    /// The one validator allowed to answer.
    pub validator: Principal,
    /// Identity whose work is being validated.
    pub identity_id: IdentityId,
    /// Evidence the validator is asked to assess.
    pub request_uri: String,
    /// Principal that commissioned the validation.
    pub requester: Principal,
    /// When the request was created.
    pub created_at: DateTime<Utc>,
}

/// Current response state for a request.
///
/// Defaults to all-zero sentinel values. A defaulted status is returned
/// both for a request that exists but is unanswered and for a hash that
/// never denoted a request; callers that must tell the two apart call
/// `request_exists` separately.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationStatus {
    pub validator: Principal,
    pub identity_id: IdentityId,
    /// Verdict in 0-100.
    pub response: u8,
    /// Free-form finality tag (e.g. "provisional", "confirmed").
    pub tag: String,
    /// When the response was last overwritten; None while unanswered.
    pub updated_at: Option<DateTime<Utc>>,
}

impl Default for ValidationStatus {
    fn default() -> Self {
        Self {
            validator: Principal::ZERO,
            identity_id: 0,
            response: 0,
            tag: String::new(),
            updated_at: None,
        }
    }
}

/// Filtered aggregate over answered validation requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationSummary {
    /// Number of answered requests that passed the filters.
    pub count: u64,
    /// Integer-truncated average response of those requests (0 when empty).
    pub average_response: u64,
}

/// Registry of validation requests and their progressive responses.
///
/// A request is Created, then Answered after its first response, and stays
/// Answered through any number of overwrites; there is no terminal state.
pub struct ValidationRegistry {
    oracle: Arc<dyn OwnershipOracle>,
    requests: DashMap<Hash, ValidationRequest>,
    responses: DashMap<Hash, ValidationStatus>,
    by_identity: DashMap<IdentityId, Vec<Hash>>,
    by_validator: DashMap<Principal, Vec<Hash>>,
    events: Arc<EventBus>,
}

impl ValidationRegistry {
    /// Create a registry backed by the given ownership oracle.
    pub fn new(oracle: Arc<dyn OwnershipOracle>, events: Arc<EventBus>) -> Self {
        Self {
            oracle,
            requests: DashMap::new(),
            responses: DashMap::new(),
            by_identity: DashMap::new(),
            by_validator: DashMap::new(),
            events,
        }
    }

    /// Commission a validation of `identity_id` from `validator`.
    ///
    /// Only the identity's owner or a delegate may commission, and the
    /// validator must be independent: neither the owner nor the caller.
    /// When no commitment hash is supplied one is derived from the request
    /// parameters and the current time, so uncoordinated callers get unique
    /// hashes. Commitment hashes are write-once; reuse fails regardless of
    /// the other arguments.
    pub fn request_validation(
        &self,
        caller: Principal,
        validator: Principal,
        identity_id: IdentityId,
        request_uri: &str,
        request_hash: Option<Hash>,
    ) -> Result<Hash, ValidationError> {
        if validator.is_zero() {
            return Err(ValidationError::InvalidValidator);
        }
        if request_uri.is_empty() {
            return Err(ValidationError::EmptyUri);
        }
        if !self.oracle.exists(identity_id) {
            return Err(ValidationError::UnknownIdentity(identity_id));
        }
        if !self.oracle.is_authorized(&caller, identity_id) {
            return Err(ValidationError::NotAuthorized {
                principal: caller,
                id: identity_id,
            });
        }
        let owner = self
            .oracle
            .owner_of(identity_id)
            .map_err(|_| ValidationError::UnknownIdentity(identity_id))?;
        if validator == owner || validator == caller {
            return Err(ValidationError::SelfValidationNotAllowed);
        }

        let now = Utc::now();
        let commitment = request_hash.unwrap_or_else(|| {
            derive_request_hash(&validator, identity_id, request_uri, now, &caller)
        });

        // Explicit existence-check-then-insert under the shard entry guard:
        // commitment hashes are write-once, never silently overwritten.
        match self.requests.entry(commitment) {
            Entry::Occupied(_) => {
                return Err(ValidationError::RequestHashAlreadyExists(commitment))
            }
            Entry::Vacant(vacant) => {
                vacant.insert(ValidationRequest {
                    validator,
                    identity_id,
                    request_uri: request_uri.to_owned(),
                    requester: caller,
                    created_at: now,
                });
            }
        }
        self.by_identity
            .entry(identity_id)
            .or_default()
            .push(commitment);
        self.by_validator.entry(validator).or_default().push(commitment);

        tracing::info!(
            identity_id,
            validator = %validator,
            request_hash = %commitment,
            "validation requested"
        );
        self.events.emit(RegistryEvent::ValidationRequested {
            validator,
            id: identity_id,
            request_uri: request_uri.to_owned(),
            request_hash: commitment,
        });
        Ok(commitment)
    }

    /// Answer (or re-answer) a validation request.
    ///
    /// Only the validator named on the request may answer. Each call
    /// replaces the response record wholesale; no history is kept
    /// on-ledger.
    pub fn submit_response(
        &self,
        caller: Principal,
        request_hash: Hash,
        response: u8,
        response_uri: Option<&str>,
        response_hash: Option<Hash>,
        tag: &str,
    ) -> Result<(), ValidationError> {
        if response > 100 {
            return Err(ValidationError::InvalidResponse(response));
        }
        let request = self
            .requests
            .get(&request_hash)
            .ok_or(ValidationError::RequestNotFound(request_hash))?;
        if caller != request.validator {
            return Err(ValidationError::NotAuthorizedValidator {
                caller,
                validator: request.validator,
            });
        }
        let identity_id = request.identity_id;
        drop(request);

        self.responses.insert(
            request_hash,
            ValidationStatus {
                validator: caller,
                identity_id,
                response,
                tag: tag.to_owned(),
                updated_at: Some(Utc::now()),
            },
        );

        tracing::info!(
            identity_id,
            validator = %caller,
            request_hash = %request_hash,
            response,
            tag,
            "validation response recorded"
        );
        self.events.emit(RegistryEvent::ValidationResponded {
            validator: caller,
            id: identity_id,
            request_hash,
            response,
            response_uri: response_uri.map(str::to_owned),
            response_hash,
            tag: tag.to_owned(),
        });
        Ok(())
    }

    /// Current response record for a request.
    ///
    /// Returns sentinel defaults for unanswered and unknown requests alike;
    /// `request_exists` disambiguates.
    pub fn status(&self, request_hash: Hash) -> ValidationStatus {
        self.responses
            .get(&request_hash)
            .map(|status| status.clone())
            .unwrap_or_default()
    }

    /// Whether a commitment hash denotes a request.
    pub fn request_exists(&self, request_hash: Hash) -> bool {
        self.requests.contains_key(&request_hash)
    }

    /// The immutable request record, if the hash denotes one.
    pub fn request_details(&self, request_hash: Hash) -> Option<ValidationRequest> {
        self.requests
            .get(&request_hash)
            .map(|request| request.clone())
    }

    /// Commitment hashes of all requests naming the identity.
    pub fn requests_for_identity(&self, identity_id: IdentityId) -> Vec<Hash> {
        self.by_identity
            .get(&identity_id)
            .map(|hashes| hashes.clone())
            .unwrap_or_default()
    }

    /// Commitment hashes of all requests naming the validator.
    pub fn requests_for_validator(&self, validator: &Principal) -> Vec<Hash> {
        self.by_validator
            .get(validator)
            .map(|hashes| hashes.clone())
            .unwrap_or_default()
    }

    /// Filtered aggregate over the identity's answered requests.
    ///
    /// An empty validator filter iterates every request for the identity;
    /// cost is proportional to the requests scanned and is the caller's
    /// liability on busy identities.
    pub fn summary(
        &self,
        identity_id: IdentityId,
        validator_filter: &[Principal],
        tag_filter: Option<&str>,
    ) -> ValidationSummary {
        let mut count = 0u64;
        let mut total = 0u64;
        for commitment in self.requests_for_identity(identity_id) {
            let Some(status) = self.responses.get(&commitment) else {
                continue;
            };
            if !validator_filter.is_empty() && !validator_filter.contains(&status.validator) {
                continue;
            }
            if let Some(tag) = tag_filter {
                if status.tag != tag {
                    continue;
                }
            }
            count += 1;
            total += status.response as u64;
        }
        ValidationSummary {
            count,
            average_response: if count == 0 { 0 } else { total / count },
        }
    }
}

/// Derive a commitment hash for a request submitted without one.
fn derive_request_hash(
    validator: &Principal,
    identity_id: IdentityId,
    request_uri: &str,
    created_at: DateTime<Utc>,
    requester: &Principal,
) -> Hash {
    let payload = TaggedEncoder::new()
        .push_bytes(validator.as_bytes())
        .push_u64(identity_id)
        .push_str(request_uri)
        .push_i64(created_at.timestamp_micros())
        .push_bytes(requester.as_bytes())
        .finish();
    hash(&payload)
}
