pub mod blog;
pub mod gallery;

use thiserror::Error;

/// Failure taxonomy for the access layers. Handlers map `Invalid` to 400,
/// `NotFound` to 404 and `Database` to 500.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("{0}")]
    Invalid(&'static str),
    #[error("record not found")]
    NotFound,
    #[error(transparent)]
    Database(#[from] sqlx::Error),
}

pub type StoreResult<T> = Result<T, StoreError>;
