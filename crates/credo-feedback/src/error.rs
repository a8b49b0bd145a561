use chrono::{DateTime, Utc};

use credo_core::{IdentityId, Principal};

/// Feedback ledger errors.
///
/// Every variant is a precondition violation surfaced synchronously; a
/// failed operation leaves ledger state untouched.
#[derive(Debug, thiserror::Error)]
pub enum FeedbackError {
    #[error("score {0} is out of range (0-100)")]
    InvalidScore(u8),

    #[error("unknown identity: {0}")]
    UnknownIdentity(IdentityId),

    #[error("malformed authorization: expected {expected} bytes, got {actual}")]
    MalformedAuthorization { expected: usize, actual: usize },

    #[error("authorization identity mismatch: authorized {authorized}, submitted {submitted}")]
    IdentityMismatch {
        authorized: IdentityId,
        submitted: IdentityId,
    },

    #[error("authorization rater mismatch: authorized {authorized}, caller {caller}")]
    RaterMismatch {
        authorized: Principal,
        caller: Principal,
    },

    #[error("authorization domain mismatch: authorized {authorized}, registry {registry}")]
    DomainMismatch { authorized: u64, registry: u64 },

    #[error("authorization registry reference mismatch")]
    RegistryMismatch,

    #[error("authorization expired at {0}")]
    AuthorizationExpired(DateTime<Utc>),

    #[error("authorization index limit {limit} exhausted (next index {next})")]
    IndexLimitExceeded { limit: u64, next: u64 },

    #[error("self-feedback is not allowed")]
    SelfFeedbackNotAllowed,

    #[error("signature does not attest to an authorized signer: {0}")]
    InvalidSigner(Principal),

    #[error("invalid feedback index: {0}")]
    InvalidIndex(u64),

    #[error("feedback entry {index} already revoked")]
    AlreadyRevoked { index: u64 },

    #[error("response URI must not be empty")]
    EmptyUri,
}
