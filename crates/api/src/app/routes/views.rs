use std::sync::Arc;

use axum::extract::{Extension, Path};
use axum::response::Html;
use axum::routing::get;
use axum::Router;

use crate::app::errors::AppError;
use crate::app::services::AppServices;
use crate::app::views;
use crate::context::{CurrentUser, MaybeUser};

pub fn router() -> Router {
    Router::new()
        .route("/", get(overview))
        .route("/tour/:slug", get(tour))
        .route("/login", get(login))
        .route("/me", get(account))
        .route("/my-tours", get(my_tours))
}

pub async fn overview(
    Extension(services): Extension<Arc<AppServices>>,
    MaybeUser(user): MaybeUser,
) -> Result<Html<String>, AppError> {
    let tours = services.tours.query().find_matching(|_| true).await?;
    Ok(Html(views::overview("All Tours", &tours, user.as_ref())))
}

pub async fn tour(
    Extension(services): Extension<Arc<AppServices>>,
    MaybeUser(user): MaybeUser,
    Path(slug): Path<String>,
) -> Result<Html<String>, AppError> {
    let tour = services
        .tours
        .query()
        .find_by_slug(&slug)
        .await?
        .ok_or_else(|| AppError::NotFound("There is no tour with that name.".to_string()))?;
    Ok(Html(views::tour_detail(&tour, user.as_ref())))
}

pub async fn login(MaybeUser(user): MaybeUser) -> Html<String> {
    Html(views::login(user.as_ref()))
}

pub async fn account(CurrentUser(user): CurrentUser) -> Html<String> {
    Html(views::account(&user))
}

pub async fn my_tours(
    Extension(services): Extension<Arc<AppServices>>,
    CurrentUser(user): CurrentUser,
) -> Result<Html<String>, AppError> {
    let tours = services.bookings.booked_tours(user.id).await?;
    Ok(Html(views::overview("My Tours", &tours, Some(&user))))
}
