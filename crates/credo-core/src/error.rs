/// Core protocol errors.
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("invalid principal encoding: {0}")]
    InvalidPrincipal(String),

    #[error("invalid hash encoding: {0}")]
    InvalidHash(String),
}
