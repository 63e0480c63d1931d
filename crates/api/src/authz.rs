//! Role checks for routes that need more than a logged-in user.

use natours_auth::Role;

use crate::app::errors::AppError;
use crate::context::CurrentUser;

pub const ADMIN_OR_LEAD: &[Role] = &[Role::Admin, Role::LeadGuide];
pub const STAFF: &[Role] = &[Role::Admin, Role::LeadGuide, Role::Guide];

/// Call after authentication, before touching any data.
pub fn restrict_to(user: &CurrentUser, roles: &[Role]) -> Result<(), AppError> {
    natours_auth::restrict_to(user.0.role, roles).map_err(|err| {
        tracing::debug!(user_id = %user.0.id, role = %user.0.role, "role not allowed");
        AppError::from(err)
    })
}
