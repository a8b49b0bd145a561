use credo_core::{IdentityId, Principal};

/// Identity registry errors.
#[derive(Debug, thiserror::Error)]
pub enum IdentityError {
    #[error("unknown identity: {0}")]
    UnknownIdentity(IdentityId),

    #[error("principal {principal} is not authorized for identity {id}")]
    NotAuthorized {
        principal: Principal,
        id: IdentityId,
    },

    #[error("metadata key must not be empty")]
    EmptyKey,

    #[error("invalid metadata key in registration batch")]
    InvalidMetadataKey,

    #[error("recipient principal must not be zero")]
    InvalidRecipient,
}
