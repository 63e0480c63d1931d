use chrono::{DateTime, Utc};
use serde_json::Value as JsonValue;

use natours_auth::{NewUser, User, UserPatch, hash_password, validate_password};
use natours_core::UserId;

use super::RepoResult;
use crate::query::ApiFeatures;
use crate::store::Collection;

/// Users. Every find-family read skips deactivated accounts.
#[derive(Clone)]
pub struct UserRepository {
    users: Collection<User>,
}

impl UserRepository {
    pub fn new(users: Collection<User>) -> Self {
        Self { users }
    }

    async fn active(&self) -> RepoResult<Vec<User>> {
        Ok(self.users.all().await?.into_iter().filter(|u| u.active).collect())
    }

    pub async fn create(&self, input: NewUser) -> RepoResult<User> {
        let (name, email, password) = input.validate()?;
        let user = User::new(name, email, hash_password(&password)?, &input);
        self.users.insert(&user).await?;
        tracing::info!(user_id = %user.id, role = %user.role, "user created");
        Ok(user)
    }

    pub async fn find(&self, id: UserId) -> RepoResult<Option<User>> {
        Ok(self.users.get(id).await?.filter(|u| u.active))
    }

    pub async fn find_by_email(&self, email: &str) -> RepoResult<Option<User>> {
        let email = email.trim().to_lowercase();
        Ok(self.active().await?.into_iter().find(|u| u.email == email))
    }

    pub async fn find_by_reset_token(&self, hashed_token: &str, now: DateTime<Utc>) -> RepoResult<Option<User>> {
        Ok(self
            .active()
            .await?
            .into_iter()
            .find(|u| u.reset_token_matches(hashed_token, now)))
    }

    /// `Some` only for a matching email and password.
    pub async fn authenticate(&self, email: &str, password: &str) -> RepoResult<Option<User>> {
        Ok(self
            .find_by_email(email)
            .await?
            .filter(|u| u.correct_password(password)))
    }

    /// Public profiles with list features applied.
    pub async fn list(&self, features: &ApiFeatures) -> RepoResult<Vec<JsonValue>> {
        let docs = self
            .active()
            .await?
            .iter()
            .map(|u| serde_json::to_value(u.profile()))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(features.apply(docs))
    }

    pub async fn save(&self, user: &User) -> RepoResult<()> {
        Ok(self.users.save(user).await?)
    }

    pub async fn update(&self, id: UserId, patch: UserPatch) -> RepoResult<Option<User>> {
        let Some(mut user) = self.find(id).await? else {
            return Ok(None);
        };
        user.apply_patch(patch)?;
        self.users.save(&user).await?;
        Ok(Some(user))
    }

    /// Validate, hash and store a new password for `user`.
    pub async fn set_password(&self, user: &mut User, password: Option<&str>, confirm: Option<&str>) -> RepoResult<()> {
        let password = validate_password(password, confirm)?;
        user.set_password_hash(hash_password(&password)?, Utc::now());
        self.users.save(user).await?;
        Ok(())
    }

    /// Soft delete: the account disappears from every read.
    pub async fn deactivate(&self, id: UserId) -> RepoResult<bool> {
        let Some(mut user) = self.find(id).await? else {
            return Ok(false);
        };
        user.active = false;
        self.users.save(&user).await?;
        tracing::info!(user_id = %id, "user deactivated");
        Ok(true)
    }

    pub async fn delete(&self, id: UserId) -> RepoResult<bool> {
        if self.find(id).await?.is_none() {
            return Ok(false);
        }
        Ok(self.users.delete(id).await?)
    }
}
