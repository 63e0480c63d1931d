use std::sync::Arc;

use axum::extract::{Extension, Path};
use axum::http::StatusCode;
use axum::response::Response;
use axum::routing::get;
use axum::Router;

use natours_core::TourId;
use natours_tours::{DistanceUnit, LatLng, NewTour, TourPatch};

use crate::app::dto::{self, AppJson, Params};
use crate::app::errors::AppError;
use crate::app::routes::reviews;
use crate::app::services::AppServices;
use crate::authz::{self, ADMIN_OR_LEAD, STAFF};
use crate::context::CurrentUser;

const TOP_TOURS_FIELDS: &str = "name,price,ratingsAverage,summary,difficulty";

pub fn router() -> Router {
    Router::new()
        .route("/top-5-cheap", get(top_tours))
        .route("/tour-stats", get(tour_stats))
        .route("/monthly-plan/:year", get(monthly_plan))
        .route("/tours-within/:distance/center/:latlng/unit/:unit", get(tours_within))
        .route("/distances/:latlng/unit/:unit", get(distances))
        .route("/", get(list_tours).post(create_tour))
        .route("/:id", get(get_tour).patch(update_tour).delete(delete_tour))
        .route(
            "/:id/reviews",
            get(reviews::list_tour_reviews).post(reviews::create_tour_review),
        )
}

pub async fn list_tours(
    Extension(services): Extension<Arc<AppServices>>,
    params: Params,
) -> Result<Response, AppError> {
    let docs = services.tours.query().find(&params.features()).await?;
    Ok(dto::documents(docs))
}

/// Five best-rated, cheapest tours with a short field set.
pub async fn top_tours(
    services: Extension<Arc<AppServices>>,
    Params(mut pairs): Params,
) -> Result<Response, AppError> {
    pairs.retain(|(key, _)| !matches!(key.as_str(), "limit" | "sort" | "fields"));
    pairs.push(("limit".to_string(), "5".to_string()));
    pairs.push(("sort".to_string(), "-ratingsAverage,price".to_string()));
    pairs.push(("fields".to_string(), TOP_TOURS_FIELDS.to_string()));
    list_tours(services, Params(pairs)).await
}

pub async fn get_tour(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> Result<Response, AppError> {
    let id: TourId = dto::parse_id(&id)?;
    let tour = services
        .tours
        .query()
        .find_by_id(id)
        .await?
        .ok_or_else(AppError::not_found)?;
    Ok(dto::document(StatusCode::OK, tour))
}

pub async fn create_tour(
    Extension(services): Extension<Arc<AppServices>>,
    user: CurrentUser,
    AppJson(body): AppJson<NewTour>,
) -> Result<Response, AppError> {
    authz::restrict_to(&user, ADMIN_OR_LEAD)?;
    let tour = services.tours.create(body).await?;
    Ok(dto::document(StatusCode::CREATED, tour))
}

pub async fn update_tour(
    Extension(services): Extension<Arc<AppServices>>,
    user: CurrentUser,
    Path(id): Path<String>,
    AppJson(body): AppJson<TourPatch>,
) -> Result<Response, AppError> {
    authz::restrict_to(&user, ADMIN_OR_LEAD)?;
    let id: TourId = dto::parse_id(&id)?;
    let tour = services
        .tours
        .update(id, body)
        .await?
        .ok_or_else(AppError::not_found)?;
    Ok(dto::document(StatusCode::OK, tour))
}

pub async fn delete_tour(
    Extension(services): Extension<Arc<AppServices>>,
    user: CurrentUser,
    Path(id): Path<String>,
) -> Result<Response, AppError> {
    authz::restrict_to(&user, ADMIN_OR_LEAD)?;
    let id: TourId = dto::parse_id(&id)?;
    if !services.tours.delete(id).await? {
        return Err(AppError::not_found());
    }
    Ok(dto::no_content())
}

pub async fn tour_stats(Extension(services): Extension<Arc<AppServices>>) -> Result<Response, AppError> {
    let stats = services.tours.stats().await?;
    Ok(dto::named("stats", stats))
}

pub async fn monthly_plan(
    Extension(services): Extension<Arc<AppServices>>,
    user: CurrentUser,
    Path(year): Path<String>,
) -> Result<Response, AppError> {
    authz::restrict_to(&user, STAFF)?;
    let year: i32 = year
        .parse()
        .map_err(|_| AppError::BadRequest(format!("Invalid year: {year}.")))?;
    let plan = services.tours.monthly_plan(year).await?;
    Ok(dto::named("plan", plan))
}

fn parse_distance(raw: &str) -> Result<f64, AppError> {
    raw.parse::<f64>()
        .ok()
        .filter(|d| d.is_finite() && *d >= 0.0)
        .ok_or_else(|| AppError::BadRequest(format!("Invalid distance: {raw}.")))
}

/// Tours starting within `distance` of `latlng`.
pub async fn tours_within(
    Extension(services): Extension<Arc<AppServices>>,
    Path((distance, latlng, unit)): Path<(String, String, String)>,
) -> Result<Response, AppError> {
    let distance = parse_distance(&distance)?;
    let center: LatLng = latlng.parse()?;
    let unit: DistanceUnit = unit.parse()?;

    let tours = services.tours.within(distance, center, unit).await?;
    let docs = tours
        .iter()
        .map(|t| t.to_json())
        .collect::<Result<Vec<_>, _>>()?;
    Ok(dto::documents(docs))
}

/// Every tour's distance from `latlng`, nearest first.
pub async fn distances(
    Extension(services): Extension<Arc<AppServices>>,
    Path((latlng, unit)): Path<(String, String)>,
) -> Result<Response, AppError> {
    let center: LatLng = latlng.parse()?;
    let unit: DistanceUnit = unit.parse()?;
    let distances = services.tours.distances(center, unit).await?;
    Ok(dto::document(StatusCode::OK, distances))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn distance_must_be_a_non_negative_number() {
        assert_eq!(parse_distance("200").unwrap(), 200.0);
        assert!(parse_distance("-1").is_err());
        assert!(parse_distance("far").is_err());
    }
}
