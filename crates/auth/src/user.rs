//! The user document and its credential lifecycle.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use natours_core::{DomainError, DomainResult, Entity, UserId, Validator};

use crate::Role;
use crate::password::{generate_reset_token, hash_reset_token, verify_password};

pub const DEFAULT_PHOTO: &str = "default.jpg";
const PASSWORD_MIN: usize = 8;
const RESET_TOKEN_TTL_MINUTES: i64 = 10;

fn default_photo() -> String {
    DEFAULT_PHOTO.to_string()
}

fn default_active() -> bool {
    true
}

/// The user document as stored, credentials included.
///
/// Never serialize this to a client; use [`UserProfile`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: UserId,
    pub name: String,
    pub email: String,
    #[serde(default = "default_photo")]
    pub photo: String,
    #[serde(default)]
    pub role: Role,
    pub password_hash: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password_changed_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password_reset_token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password_reset_expires: Option<DateTime<Utc>>,
    #[serde(default = "default_active")]
    pub active: bool,
}

/// Public projection of a user: no password material, no `passwordChangedAt`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub id: UserId,
    pub name: String,
    pub email: String,
    pub photo: String,
    pub role: Role,
}

/// Signup / admin-create payload.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewUser {
    pub name: Option<String>,
    pub email: Option<String>,
    pub photo: Option<String>,
    pub role: Option<Role>,
    pub password: Option<String>,
    pub password_confirm: Option<String>,
}

/// Profile fields a user or an admin may change. Passwords are changed only
/// through [`PasswordChange`].
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserPatch {
    pub name: Option<String>,
    pub email: Option<String>,
    pub photo: Option<String>,
    pub role: Option<Role>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PasswordChange {
    pub password_current: Option<String>,
    pub password: Option<String>,
    pub password_confirm: Option<String>,
}

/// Rough shape check: `local@domain.tld` without whitespace.
fn is_valid_email(email: &str) -> bool {
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    !local.is_empty()
        && !domain.contains('@')
        && domain.split('.').count() >= 2
        && domain.split('.').all(|part| !part.is_empty())
        && !email.chars().any(char::is_whitespace)
}

fn check_email(v: &mut Validator, email: Option<&str>) -> Option<String> {
    let email = v.required_text("email", email, "Please provide your email")?.to_lowercase();
    v.check("email", is_valid_email(&email), "Please provide a valid email");
    Some(email)
}

/// Check a new password and its confirmation.
pub fn validate_password(password: Option<&str>, confirm: Option<&str>) -> DomainResult<String> {
    let mut v = Validator::new();
    let password = v.required("password", password, "Please provide a password");
    let confirm = v.required("passwordConfirm", confirm, "Please confirm your password");
    if let Some(password) = password {
        v.check(
            "password",
            password.chars().count() >= PASSWORD_MIN,
            "A password must have more or equal than 8 characters",
        );
        if let Some(confirm) = confirm {
            v.check("passwordConfirm", password == confirm, "Passwords are not the same!");
        }
    }
    v.finish()?;
    Ok(password.unwrap_or_default().to_string())
}

impl NewUser {
    /// Validate the profile fields and the password pair.
    ///
    /// Returns the normalized `(name, email, password)`.
    pub fn validate(&self) -> DomainResult<(String, String, String)> {
        let mut v = Validator::new();
        let name = v.required_text("name", self.name.as_deref(), "Please tell us your name!");
        let email = check_email(&mut v, self.email.as_deref());

        let password = match validate_password(self.password.as_deref(), self.password_confirm.as_deref()) {
            Ok(password) => Some(password),
            Err(DomainError::Validation(errors)) => {
                for e in errors.iter() {
                    v.check(&e.field, false, e.message.clone());
                }
                None
            }
            Err(other) => return Err(other),
        };

        match (name, email, password) {
            (Some(name), Some(email), Some(password)) if v.is_valid() => Ok((name, email, password)),
            _ => Err(v.into_error()),
        }
    }
}

impl User {
    /// Build a user from a validated payload and an already-hashed password.
    pub fn new(name: String, email: String, password_hash: String, input: &NewUser) -> Self {
        Self {
            id: UserId::new(),
            name,
            email,
            photo: input.photo.clone().unwrap_or_else(default_photo),
            role: input.role.unwrap_or_default(),
            password_hash,
            password_changed_at: None,
            password_reset_token: None,
            password_reset_expires: None,
            active: true,
        }
    }

    pub fn profile(&self) -> UserProfile {
        UserProfile {
            id: self.id,
            name: self.name.clone(),
            email: self.email.clone(),
            photo: self.photo.clone(),
            role: self.role,
        }
    }

    /// First whitespace-separated token of the name.
    pub fn first_name(&self) -> &str {
        self.name.split_whitespace().next().unwrap_or(&self.name)
    }

    pub fn correct_password(&self, candidate: &str) -> bool {
        verify_password(candidate, &self.password_hash)
    }

    /// Whether the password changed after a token issued at `issued_at` (unix seconds).
    pub fn changed_password_after(&self, issued_at: i64) -> bool {
        self.password_changed_at
            .is_some_and(|changed| changed.timestamp() > issued_at)
    }

    /// Apply profile changes; the patch is validated before anything is written.
    pub fn apply_patch(&mut self, patch: UserPatch) -> DomainResult<()> {
        let mut v = Validator::new();
        let name = match patch.name.as_deref() {
            Some(raw) => v.required_text("name", Some(raw), "Please tell us your name!"),
            None => None,
        };
        let email = match patch.email.as_deref() {
            Some(raw) => check_email(&mut v, Some(raw)),
            None => None,
        };
        v.finish()?;

        if let Some(name) = name {
            self.name = name;
        }
        if let Some(email) = email {
            self.email = email;
        }
        if let Some(photo) = patch.photo {
            self.photo = photo;
        }
        if let Some(role) = patch.role {
            self.role = role;
        }
        Ok(())
    }

    /// Store a new password hash and invalidate any outstanding reset token.
    ///
    /// The change time is backdated one second so a token signed right after
    /// the change is still accepted.
    pub fn set_password_hash(&mut self, password_hash: String, now: DateTime<Utc>) {
        self.password_hash = password_hash;
        self.password_changed_at = Some(now - Duration::seconds(1));
        self.clear_password_reset();
    }

    /// Issue a reset token valid for ten minutes; returns the plain token.
    pub fn create_password_reset_token(&mut self, now: DateTime<Utc>) -> String {
        let token = generate_reset_token();
        self.password_reset_token = Some(hash_reset_token(&token));
        self.password_reset_expires = Some(now + Duration::minutes(RESET_TOKEN_TTL_MINUTES));
        token
    }

    pub fn clear_password_reset(&mut self) {
        self.password_reset_token = None;
        self.password_reset_expires = None;
    }

    /// Whether `hashed_token` is this user's unexpired reset token.
    pub fn reset_token_matches(&self, hashed_token: &str, now: DateTime<Utc>) -> bool {
        self.password_reset_token.as_deref() == Some(hashed_token)
            && self.password_reset_expires.is_some_and(|expires| expires > now)
    }
}

impl Entity for User {
    type Id = UserId;

    fn id(&self) -> UserId {
        self.id
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::password::hash_password;

    fn signup(name: &str, email: &str, password: &str, confirm: &str) -> NewUser {
        NewUser {
            name: Some(name.to_string()),
            email: Some(email.to_string()),
            password: Some(password.to_string()),
            password_confirm: Some(confirm.to_string()),
            ..NewUser::default()
        }
    }

    fn user() -> User {
        let input = signup("Jonas Schmedtmann", "jonas@example.com", "pass1234", "pass1234");
        let (name, email, password) = input.validate().unwrap();
        User::new(name, email, hash_password(&password).unwrap(), &input)
    }

    #[test]
    fn signup_normalizes_and_defaults() {
        let input = signup("  Jonas  ", "Jonas@Example.COM", "pass1234", "pass1234");
        let (name, email, _) = input.validate().unwrap();
        assert_eq!(name, "Jonas");
        assert_eq!(email, "jonas@example.com");

        let u = User::new(name, email, "hash".to_string(), &input);
        assert_eq!(u.photo, "default.jpg");
        assert_eq!(u.role, Role::User);
        assert!(u.active);
    }

    #[test]
    fn signup_reports_every_failure() {
        let err = NewUser::default().validate().unwrap_err();
        assert_eq!(
            err.to_string(),
            "Invalid input data. Please tell us your name!. Please provide your email. \
             Please provide a password. Please confirm your password"
        );
    }

    #[test]
    fn signup_rejects_bad_email_short_password_and_mismatch() {
        let err = signup("Jonas", "not-an-email", "short", "other").validate().unwrap_err();
        let DomainError::Validation(errors) = err else {
            panic!("expected validation error");
        };
        assert_eq!(errors.message_for("email"), Some("Please provide a valid email"));
        assert_eq!(
            errors.message_for("password"),
            Some("A password must have more or equal than 8 characters")
        );
        assert_eq!(errors.message_for("passwordConfirm"), Some("Passwords are not the same!"));
    }

    #[test]
    fn email_shapes() {
        assert!(is_valid_email("a@b.io"));
        assert!(!is_valid_email("a@b"));
        assert!(!is_valid_email("@b.io"));
        assert!(!is_valid_email("a b@c.io"));
        assert!(!is_valid_email("a@@b.io"));
    }

    #[test]
    fn first_name_is_the_first_word() {
        assert_eq!(user().first_name(), "Jonas");
    }

    #[test]
    fn profile_carries_no_credentials() {
        let json = serde_json::to_value(user().profile()).unwrap();
        let obj = json.as_object().unwrap();
        assert!(!obj.contains_key("passwordHash"));
        assert!(!obj.contains_key("passwordChangedAt"));
        assert_eq!(obj["role"], "user");
    }

    #[test]
    fn password_change_invalidates_older_tokens() {
        let mut u = user();
        let issued = Utc::now() - Duration::hours(1);
        assert!(!u.changed_password_after(issued.timestamp()));

        u.set_password_hash(hash_password("newpass123").unwrap(), Utc::now());
        assert!(u.changed_password_after(issued.timestamp()));
        assert!(u.correct_password("newpass123"));
        assert!(!u.correct_password("pass1234"));
    }

    #[test]
    fn reset_token_expires_after_ten_minutes() {
        let mut u = user();
        let now = Utc::now();
        let token = u.create_password_reset_token(now);
        let hashed = hash_reset_token(&token);

        assert!(u.reset_token_matches(&hashed, now + Duration::minutes(9)));
        assert!(!u.reset_token_matches(&hashed, now + Duration::minutes(11)));
        assert!(!u.reset_token_matches("other", now));

        u.clear_password_reset();
        assert!(!u.reset_token_matches(&hashed, now));
    }

    #[test]
    fn patch_validates_before_writing() {
        let mut u = user();
        let err = u
            .apply_patch(UserPatch {
                name: Some("Jonas S".to_string()),
                email: Some("broken".to_string()),
                ..UserPatch::default()
            })
            .unwrap_err();
        assert!(err.to_string().contains("Please provide a valid email"));
        assert_eq!(u.name, "Jonas Schmedtmann");

        u.apply_patch(UserPatch {
            email: Some("NEW@example.com".to_string()),
            ..UserPatch::default()
        })
        .unwrap();
        assert_eq!(u.email, "new@example.com");
    }
}
