use thiserror::Error;

use crate::{dao::storage::StorageError, services::team_loader::LoaderError};

/// Errors that can occur in service layer operations.
///
/// Store methods absorb their own failures; only startup, seeding and
/// bootstrap report errors this way.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// The database could not be opened or prepared.
    #[error("storage unavailable")]
    Unavailable(#[source] StorageError),
    /// Team documents could not be enumerated.
    #[error("team documents unavailable")]
    Loader(#[from] LoaderError),
}

impl From<StorageError> for ServiceError {
    fn from(err: StorageError) -> Self {
        ServiceError::Unavailable(err)
    }
}

/// Result alias for service layer operations.
pub type ServiceResult<T> = Result<T, ServiceError>;
