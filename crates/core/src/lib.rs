//! `natours-core`: shared domain building blocks.
//!
//! Pure types only: identifiers, the domain error model and field-level
//! validation helpers. No IO lives here.

pub mod entity;
pub mod error;
pub mod id;
pub mod validate;

pub use entity::Entity;
pub use error::{DomainError, DomainResult, FieldError, ValidationErrors};
pub use id::{BookingId, ReviewId, TourId, UserId};
pub use validate::Validator;
