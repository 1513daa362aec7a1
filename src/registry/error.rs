use thiserror::Error;

#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("invalid URL: {0}")]
    InvalidUrl(String),
    #[error("invalid custom code: {0}")]
    InvalidCustomCode(String),
    #[error("expiry must be a positive duration")]
    InvalidTtl,
    #[error("custom code already exists: {0}")]
    CodeConflict(String),
    #[error("short code not found")]
    NotFound,
    #[error("short code has expired")]
    Expired,
    #[error("no unused short code available")]
    CodeSpaceExhausted,
    #[error(transparent)]
    Storage(#[from] anyhow::Error),
}

pub type RegistryResult<T> = Result<T, RegistryError>;
