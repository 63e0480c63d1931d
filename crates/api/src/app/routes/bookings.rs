use std::sync::Arc;

use axum::extract::{Extension, Path};
use axum::http::StatusCode;
use axum::response::Response;
use axum::routing::get;
use axum::Router;

use natours_bookings::{BookingPatch, NewBooking};
use natours_core::BookingId;

use crate::app::dto::{self, AppJson, Params};
use crate::app::errors::AppError;
use crate::app::services::AppServices;
use crate::authz::{self, ADMIN_OR_LEAD};
use crate::context::CurrentUser;

pub fn router() -> Router {
    Router::new()
        .route("/", get(list_bookings).post(create_booking))
        .route("/:id", get(get_booking).patch(update_booking).delete(delete_booking))
}

pub async fn list_bookings(
    Extension(services): Extension<Arc<AppServices>>,
    user: CurrentUser,
    params: Params,
) -> Result<Response, AppError> {
    authz::restrict_to(&user, ADMIN_OR_LEAD)?;
    let docs = services.bookings.list(&params.features()).await?;
    Ok(dto::documents(docs))
}

pub async fn create_booking(
    Extension(services): Extension<Arc<AppServices>>,
    user: CurrentUser,
    AppJson(body): AppJson<NewBooking>,
) -> Result<Response, AppError> {
    authz::restrict_to(&user, ADMIN_OR_LEAD)?;
    let booking = services.bookings.create(body).await?;
    Ok(dto::document(StatusCode::CREATED, booking))
}

pub async fn get_booking(
    Extension(services): Extension<Arc<AppServices>>,
    user: CurrentUser,
    Path(id): Path<String>,
) -> Result<Response, AppError> {
    authz::restrict_to(&user, ADMIN_OR_LEAD)?;
    let id: BookingId = dto::parse_id(&id)?;
    let booking = services.bookings.get(id).await?.ok_or_else(AppError::not_found)?;
    Ok(dto::document(StatusCode::OK, booking))
}

pub async fn update_booking(
    Extension(services): Extension<Arc<AppServices>>,
    user: CurrentUser,
    Path(id): Path<String>,
    AppJson(body): AppJson<BookingPatch>,
) -> Result<Response, AppError> {
    authz::restrict_to(&user, ADMIN_OR_LEAD)?;
    let id: BookingId = dto::parse_id(&id)?;
    let booking = services
        .bookings
        .update(id, body)
        .await?
        .ok_or_else(AppError::not_found)?;
    Ok(dto::document(StatusCode::OK, booking))
}

pub async fn delete_booking(
    Extension(services): Extension<Arc<AppServices>>,
    user: CurrentUser,
    Path(id): Path<String>,
) -> Result<Response, AppError> {
    authz::restrict_to(&user, ADMIN_OR_LEAD)?;
    let id: BookingId = dto::parse_id(&id)?;
    if !services.bookings.delete(id).await? {
        return Err(AppError::not_found());
    }
    Ok(dto::no_content())
}
