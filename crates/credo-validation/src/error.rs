use credo_core::{Hash, IdentityId, Principal};

/// Validation protocol errors.
#[derive(Debug, thiserror::Error)]
pub enum ValidationError {
    #[error("validator principal must not be zero")]
    InvalidValidator,

    #[error("request URI must not be empty")]
    EmptyUri,

    #[error("unknown identity: {0}")]
    UnknownIdentity(IdentityId),

    #[error("principal {principal} is not authorized for identity {id}")]
    NotAuthorized {
        principal: Principal,
        id: IdentityId,
    },

    #[error("self-validation is not allowed")]
    SelfValidationNotAllowed,

    #[error("request hash already exists: {0}")]
    RequestHashAlreadyExists(Hash),

    #[error("response value {0} is out of range (0-100)")]
    InvalidResponse(u8),

    #[error("request not found: {0}")]
    RequestNotFound(Hash),

    #[error("caller {caller} is not the validator named on the request ({validator})")]
    NotAuthorizedValidator {
        caller: Principal,
        validator: Principal,
    },
}
