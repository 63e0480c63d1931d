use chrono::Utc;
use serde::Serialize;

use natours_core::TourId;
use natours_reviews::RatingsSummary;
use natours_tours::{DifficultyStats, DistanceUnit, LatLng, MonthPlan, NewTour, Tour, TourPatch, monthly_plan, tour_stats};

use super::RepoResult;
use crate::query::{TourQuery, TourView};
use crate::store::Collection;

/// Distance of a tour's start from a reference point.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TourDistance {
    pub id: TourId,
    pub name: String,
    pub distance: f64,
}

#[derive(Clone)]
pub struct TourRepository {
    query: TourQuery,
    tours: Collection<Tour>,
}

impl TourRepository {
    pub fn new(query: TourQuery, tours: Collection<Tour>) -> Self {
        Self { query, tours }
    }

    pub fn query(&self) -> &TourQuery {
        &self.query
    }

    pub async fn create(&self, input: NewTour) -> RepoResult<Tour> {
        let tour = Tour::create(input, Utc::now())?;
        self.tours.insert(&tour).await?;
        tracing::info!(tour_id = %tour.id, slug = %tour.slug, "tour created");
        Ok(tour)
    }

    /// The updated tour with its guides populated; `None` when no visible tour
    /// has this id.
    pub async fn update(&self, id: TourId, patch: TourPatch) -> RepoResult<Option<TourView>> {
        let Some(mut tour) = self.query.find_document(id).await? else {
            return Ok(None);
        };
        tour.apply_patch(patch)?;
        self.tours.save(&tour).await?;
        Ok(Some(self.query.view(tour).await?))
    }

    pub async fn delete(&self, id: TourId) -> RepoResult<bool> {
        if self.query.find_document(id).await?.is_none() {
            return Ok(false);
        }
        Ok(self.tours.delete(id).await?)
    }

    /// Store the ratings summary of a tour's reviews. Secret tours included.
    pub async fn set_ratings(&self, id: TourId, summary: RatingsSummary) -> RepoResult<()> {
        if let Some(mut tour) = self.tours.get(id).await? {
            tour.set_ratings(summary.quantity, summary.average);
            self.tours.save(&tour).await?;
        }
        Ok(())
    }

    pub async fn stats(&self) -> RepoResult<Vec<DifficultyStats>> {
        let tours = self.query.find_documents().await?;
        Ok(tour_stats(&tours))
    }

    pub async fn monthly_plan(&self, year: i32) -> RepoResult<Vec<MonthPlan>> {
        let tours = self.query.find_documents().await?;
        Ok(monthly_plan(&tours, year))
    }

    /// Tours starting within `distance` (in `unit`) of `center`.
    pub async fn within(&self, distance: f64, center: LatLng, unit: DistanceUnit) -> RepoResult<Vec<TourView>> {
        let radius = unit.radians(distance);
        let views = self
            .query
            .find_matching(move |tour| {
                tour.start_location
                    .as_ref()
                    .and_then(|p| p.lat_lng())
                    .is_some_and(|start| start.angular_distance(&center) <= radius)
            })
            .await?;
        Ok(views)
    }

    /// Every located tour with its distance from `center`, nearest first.
    pub async fn distances(&self, center: LatLng, unit: DistanceUnit) -> RepoResult<Vec<TourDistance>> {
        let tours = self.query.find_documents().await?;
        let mut out: Vec<TourDistance> = tours
            .iter()
            .filter_map(|tour| {
                let start = tour.start_location.as_ref()?.lat_lng()?;
                Some(TourDistance {
                    id: tour.id,
                    name: tour.name.clone(),
                    distance: center.distance_meters(&start) * unit.from_meters(),
                })
            })
            .collect();
        out.sort_by(|a, b| a.distance.total_cmp(&b.distance));
        Ok(out)
    }
}
