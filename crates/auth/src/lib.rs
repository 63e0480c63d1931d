//! `natours-auth`: users, roles and the credentials that identify them.
//!
//! Decoupled from HTTP and storage: the API layer extracts tokens, the infra
//! layer persists users.

pub mod authorize;
pub mod claims;
pub mod password;
pub mod roles;
pub mod user;

pub use authorize::{AuthzError, restrict_to};
pub use claims::{JwtClaims, JwtKeys, TokenError, validate_claims};
pub use password::{PasswordError, generate_reset_token, hash_password, hash_reset_token, verify_password};
pub use roles::Role;
pub use user::{NewUser, PasswordChange, User, UserPatch, UserProfile, validate_password};
