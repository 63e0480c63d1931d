use std::sync::Arc;

use axum::extract::{Extension, Path};
use axum::http::{HeaderMap, HeaderValue, StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum::routing::{delete, get, patch, post};
use axum::{Json, Router};
use chrono::Utc;
use serde::Deserialize;
use serde_json::{Value as JsonValue, json};

use natours_auth::{JwtClaims, NewUser, PasswordChange, Role, User, UserPatch, hash_reset_token};
use natours_core::UserId;

use crate::app::dto::{self, AppJson, Params};
use crate::app::errors::AppError;
use crate::app::services::AppServices;
use crate::authz;
use crate::context::CurrentUser;
use crate::middleware::cookies::token_cookie;

const ADMIN: &[Role] = &[Role::Admin];

pub fn router() -> Router {
    Router::new()
        .route("/signup", post(signup))
        .route("/login", post(login))
        .route("/logout", get(logout))
        .route("/forgotPassword", post(forgot_password))
        .route("/resetPassword/:token", patch(reset_password))
        .route("/updateMyPassword", patch(update_my_password))
        .route("/me", get(get_me))
        .route("/updateMe", patch(update_me))
        .route("/deleteMe", delete(delete_me))
        .route("/", get(list_users))
        .route("/:id", get(get_user).patch(update_user).delete(delete_user))
}

#[derive(Debug, Default, Deserialize)]
pub struct LoginRequest {
    pub email: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ForgotPasswordRequest {
    pub email: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResetPasswordRequest {
    pub password: Option<String>,
    pub password_confirm: Option<String>,
}

/// Sign a token for `user` and send it both in the body and as a cookie.
fn send_token(services: &AppServices, user: &User, status: StatusCode) -> Result<Response, AppError> {
    let claims = JwtClaims::new(user.id, Utc::now(), services.token_ttl());
    let token = services.jwt.sign(&claims)?;

    let cookie = token_cookie(
        &token,
        services.cookie_max_age_secs(),
        services.config.environment.is_production(),
    );
    let body = json!({
        "status": "success",
        "token": token,
        "data": { "user": user.profile() },
    });

    let mut res = (status, Json(body)).into_response();
    res.headers_mut().insert(
        header::SET_COOKIE,
        HeaderValue::from_str(&cookie).map_err(AppError::internal)?,
    );
    Ok(res)
}

pub async fn signup(
    Extension(services): Extension<Arc<AppServices>>,
    headers: HeaderMap,
    AppJson(body): AppJson<NewUser>,
) -> Result<Response, AppError> {
    // Role and photo are never taken from a signup.
    let input = NewUser {
        role: None,
        photo: None,
        ..body
    };
    let user = services.users.create(input).await?;

    let url = format!("{}/me", dto::origin(&headers));
    services.mailer.send_welcome(&user, &url).await?;

    send_token(&services, &user, StatusCode::CREATED)
}

pub async fn login(
    Extension(services): Extension<Arc<AppServices>>,
    AppJson(body): AppJson<LoginRequest>,
) -> Result<Response, AppError> {
    let (Some(email), Some(password)) = (body.email, body.password) else {
        return Err(AppError::BadRequest("Please provide email and password!".to_string()));
    };

    let user = services
        .users
        .authenticate(&email, &password)
        .await?
        .ok_or_else(|| AppError::Unauthorized("Incorrect email or password".to_string()))?;

    tracing::info!(user_id = %user.id, "user logged in");
    send_token(&services, &user, StatusCode::OK)
}

/// Overwrite the session cookie with a short-lived placeholder.
pub async fn logout() -> Response {
    let mut res = (StatusCode::OK, Json(json!({ "status": "success" }))).into_response();
    res.headers_mut().insert(
        header::SET_COOKIE,
        HeaderValue::from_static("jwt=loggedout; Max-Age=10; Path=/; HttpOnly"),
    );
    res
}

pub async fn forgot_password(
    Extension(services): Extension<Arc<AppServices>>,
    headers: HeaderMap,
    AppJson(body): AppJson<ForgotPasswordRequest>,
) -> Result<Response, AppError> {
    let email = body.email.unwrap_or_default();
    let mut user = services
        .users
        .find_by_email(&email)
        .await?
        .ok_or_else(|| AppError::NotFound("There is no user with email address.".to_string()))?;

    let token = user.create_password_reset_token(Utc::now());
    services.users.save(&user).await?;

    let url = format!("{}/api/v1/users/resetPassword/{token}", dto::origin(&headers));
    if let Err(err) = services.mailer.send_password_reset(&user, &url).await {
        tracing::error!(user_id = %user.id, error = %err, "password reset email failed");
        user.clear_password_reset();
        services.users.save(&user).await?;
        return Err(AppError::Unavailable(
            "There was an error sending the email. Try again later!".to_string(),
        ));
    }

    Ok(dto::message("Token sent to email!"))
}

pub async fn reset_password(
    Extension(services): Extension<Arc<AppServices>>,
    Path(token): Path<String>,
    AppJson(body): AppJson<ResetPasswordRequest>,
) -> Result<Response, AppError> {
    let hashed = hash_reset_token(&token);
    let mut user = services
        .users
        .find_by_reset_token(&hashed, Utc::now())
        .await?
        .ok_or_else(|| AppError::BadRequest("Token is invalid or has expired".to_string()))?;

    services
        .users
        .set_password(&mut user, body.password.as_deref(), body.password_confirm.as_deref())
        .await?;

    send_token(&services, &user, StatusCode::OK)
}

pub async fn update_my_password(
    Extension(services): Extension<Arc<AppServices>>,
    CurrentUser(mut user): CurrentUser,
    AppJson(body): AppJson<PasswordChange>,
) -> Result<Response, AppError> {
    let current = body.password_current.unwrap_or_default();
    if !user.correct_password(&current) {
        return Err(AppError::Unauthorized("Your current password is wrong.".to_string()));
    }

    services
        .users
        .set_password(&mut user, body.password.as_deref(), body.password_confirm.as_deref())
        .await?;

    send_token(&services, &user, StatusCode::OK)
}

pub async fn get_me(CurrentUser(user): CurrentUser) -> Response {
    dto::document(StatusCode::OK, user.profile())
}

fn text_field(body: &JsonValue, key: &str) -> Option<String> {
    body.get(key).and_then(JsonValue::as_str).map(str::to_string)
}

/// Only `name` and `email` can be changed here; passwords have their own route.
pub async fn update_me(
    Extension(services): Extension<Arc<AppServices>>,
    CurrentUser(user): CurrentUser,
    AppJson(body): AppJson<JsonValue>,
) -> Result<Response, AppError> {
    if body.get("password").is_some() || body.get("passwordConfirm").is_some() {
        return Err(AppError::BadRequest(
            "This route is not for password updates. Please use /updateMyPassword.".to_string(),
        ));
    }

    let patch = UserPatch {
        name: text_field(&body, "name"),
        email: text_field(&body, "email"),
        ..UserPatch::default()
    };
    let updated = services
        .users
        .update(user.id, patch)
        .await?
        .ok_or_else(AppError::not_found)?;

    Ok(dto::named("user", updated.profile()))
}

pub async fn delete_me(
    Extension(services): Extension<Arc<AppServices>>,
    CurrentUser(user): CurrentUser,
) -> Result<Response, AppError> {
    services.users.deactivate(user.id).await?;
    Ok(dto::no_content())
}

pub async fn list_users(
    Extension(services): Extension<Arc<AppServices>>,
    user: CurrentUser,
    params: Params,
) -> Result<Response, AppError> {
    authz::restrict_to(&user, ADMIN)?;
    let docs = services.users.list(&params.features()).await?;
    Ok(dto::documents(docs))
}

pub async fn get_user(
    Extension(services): Extension<Arc<AppServices>>,
    user: CurrentUser,
    Path(id): Path<String>,
) -> Result<Response, AppError> {
    authz::restrict_to(&user, ADMIN)?;
    let id: UserId = dto::parse_id(&id)?;
    let found = services.users.find(id).await?.ok_or_else(AppError::not_found)?;
    Ok(dto::document(StatusCode::OK, found.profile()))
}

/// Admin profile edits. Passwords are not changed through this route.
pub async fn update_user(
    Extension(services): Extension<Arc<AppServices>>,
    user: CurrentUser,
    Path(id): Path<String>,
    AppJson(body): AppJson<UserPatch>,
) -> Result<Response, AppError> {
    authz::restrict_to(&user, ADMIN)?;
    let id: UserId = dto::parse_id(&id)?;
    let updated = services
        .users
        .update(id, body)
        .await?
        .ok_or_else(AppError::not_found)?;
    Ok(dto::document(StatusCode::OK, updated.profile()))
}

pub async fn delete_user(
    Extension(services): Extension<Arc<AppServices>>,
    user: CurrentUser,
    Path(id): Path<String>,
) -> Result<Response, AppError> {
    authz::restrict_to(&user, ADMIN)?;
    let id: UserId = dto::parse_id(&id)?;
    if !services.users.delete(id).await? {
        return Err(AppError::not_found());
    }
    Ok(dto::no_content())
}
