//! Write paths and populated reads per collection.

pub mod bookings;
pub mod reviews;
pub mod tours;
pub mod users;

use thiserror::Error;

use natours_auth::PasswordError;
use natours_core::DomainError;

use crate::store::StoreError;

pub use bookings::BookingRepository;
pub use reviews::ReviewRepository;
pub use tours::{TourDistance, TourRepository};
pub use users::UserRepository;

#[derive(Debug, Error)]
pub enum RepoError {
    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Password(#[from] PasswordError),

    #[error("document encoding failed: {0}")]
    Encoding(#[from] serde_json::Error),
}

pub type RepoResult<T> = Result<T, RepoError>;
