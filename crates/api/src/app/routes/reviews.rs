use std::sync::Arc;

use axum::extract::{Extension, Path};
use axum::http::StatusCode;
use axum::response::Response;
use axum::routing::get;
use axum::Router;

use natours_auth::Role;
use natours_core::{ReviewId, TourId};
use natours_reviews::{NewReview, ReviewPatch};

use crate::app::dto::{self, AppJson, Params};
use crate::app::errors::AppError;
use crate::app::services::AppServices;
use crate::authz;
use crate::context::CurrentUser;

const AUTHORS: &[Role] = &[Role::User];
const EDITORS: &[Role] = &[Role::User, Role::Admin];

/// Every route here requires a logged-in user; `/tours/:id/reviews` reuses the
/// list and create handlers with the tour taken from the path.
pub fn router() -> Router {
    Router::new()
        .route("/", get(list_reviews).post(create_review))
        .route("/:id", get(get_review).patch(update_review).delete(delete_review))
}

async fn list(services: &AppServices, tour: Option<TourId>, params: &Params) -> Result<Response, AppError> {
    let docs = services.reviews.list(tour, &params.features()).await?;
    Ok(dto::documents(docs))
}

async fn create(
    services: &AppServices,
    user: &CurrentUser,
    tour: Option<TourId>,
    mut body: NewReview,
) -> Result<Response, AppError> {
    authz::restrict_to(user, AUTHORS)?;
    if body.tour.is_none() {
        body.tour = tour;
    }
    if body.user.is_none() {
        body.user = Some(user.0.id);
    }
    let review = services.reviews.create(body).await?;
    Ok(dto::document(StatusCode::CREATED, review))
}

pub async fn list_reviews(
    Extension(services): Extension<Arc<AppServices>>,
    _user: CurrentUser,
    params: Params,
) -> Result<Response, AppError> {
    list(&services, None, &params).await
}

pub async fn list_tour_reviews(
    Extension(services): Extension<Arc<AppServices>>,
    _user: CurrentUser,
    Path(tour): Path<String>,
    params: Params,
) -> Result<Response, AppError> {
    let tour: TourId = dto::parse_id(&tour)?;
    list(&services, Some(tour), &params).await
}

pub async fn create_review(
    Extension(services): Extension<Arc<AppServices>>,
    user: CurrentUser,
    AppJson(body): AppJson<NewReview>,
) -> Result<Response, AppError> {
    create(&services, &user, None, body).await
}

pub async fn create_tour_review(
    Extension(services): Extension<Arc<AppServices>>,
    user: CurrentUser,
    Path(tour): Path<String>,
    AppJson(body): AppJson<NewReview>,
) -> Result<Response, AppError> {
    let tour: TourId = dto::parse_id(&tour)?;
    create(&services, &user, Some(tour), body).await
}

pub async fn get_review(
    Extension(services): Extension<Arc<AppServices>>,
    _user: CurrentUser,
    Path(id): Path<String>,
) -> Result<Response, AppError> {
    let id: ReviewId = dto::parse_id(&id)?;
    let review = services.reviews.get(id).await?.ok_or_else(AppError::not_found)?;
    Ok(dto::document(StatusCode::OK, review))
}

pub async fn update_review(
    Extension(services): Extension<Arc<AppServices>>,
    user: CurrentUser,
    Path(id): Path<String>,
    AppJson(body): AppJson<ReviewPatch>,
) -> Result<Response, AppError> {
    authz::restrict_to(&user, EDITORS)?;
    let id: ReviewId = dto::parse_id(&id)?;
    let review = services
        .reviews
        .update(id, body)
        .await?
        .ok_or_else(AppError::not_found)?;
    Ok(dto::document(StatusCode::OK, review))
}

pub async fn delete_review(
    Extension(services): Extension<Arc<AppServices>>,
    user: CurrentUser,
    Path(id): Path<String>,
) -> Result<Response, AppError> {
    authz::restrict_to(&user, EDITORS)?;
    let id: ReviewId = dto::parse_id(&id)?;
    if !services.reviews.delete(id).await? {
        return Err(AppError::not_found());
    }
    Ok(dto::no_content())
}
