//! The single read path for tours.
//!
//! Every find-family read goes through [`TourQuery`]: secret tours are
//! dropped, guides are joined with their public profile, and the elapsed time
//! is logged once the read completes.

use std::collections::HashMap;
use std::time::Instant;

use serde_json::Value as JsonValue;

use natours_auth::User;
use natours_core::{TourId, UserId};
use natours_reviews::Review;
use natours_tours::Tour;

use super::features::ApiFeatures;
use super::views::{ReviewView, TourView};
use crate::store::{Collection, StoreError};

/// Never shown unless a projection asks for it.
const TOUR_HIDDEN_FIELDS: &[&str] = &["createdAt"];

#[derive(Clone)]
pub struct TourQuery {
    tours: Collection<Tour>,
    users: Collection<User>,
    reviews: Collection<Review>,
}

fn log_elapsed(operation: &'static str, started: Instant, results: usize) {
    let elapsed_ms = started.elapsed().as_millis() as u64;
    tracing::info!(operation, elapsed_ms, results, "Query took {elapsed_ms} milliseconds!");
}

impl TourQuery {
    pub fn new(tours: Collection<Tour>, users: Collection<User>, reviews: Collection<Review>) -> Self {
        Self { tours, users, reviews }
    }

    async fn visible(&self) -> Result<Vec<Tour>, StoreError> {
        Ok(self
            .tours
            .all()
            .await?
            .into_iter()
            .filter(|t| !t.secret_tour)
            .collect())
    }

    async fn active_users(&self) -> Result<HashMap<UserId, User>, StoreError> {
        Ok(self
            .users
            .all()
            .await?
            .into_iter()
            .filter(|u| u.active)
            .map(|u| (u.id, u))
            .collect())
    }

    async fn populate(&self, tours: Vec<Tour>, with_reviews: bool) -> Result<Vec<TourView>, StoreError> {
        let users = self.active_users().await?;
        let reviews = if with_reviews { self.reviews.all().await? } else { Vec::new() };

        Ok(tours
            .into_iter()
            .map(|tour| {
                let guides = tour
                    .guides
                    .iter()
                    .filter_map(|id| users.get(id))
                    .map(User::profile)
                    .collect();
                let reviews = with_reviews.then(|| {
                    reviews
                        .iter()
                        .filter(|r| r.tour == tour.id)
                        .map(|r| ReviewView::new(r.clone(), users.get(&r.user)))
                        .collect()
                });
                TourView { tour, guides, reviews }
            })
            .collect())
    }

    /// List with filtering, sorting, field limiting and pagination applied.
    pub async fn find(&self, features: &ApiFeatures) -> Result<Vec<JsonValue>, StoreError> {
        let started = Instant::now();
        let views = self.populate(self.visible().await?, false).await?;
        let docs = views
            .iter()
            .map(TourView::to_json)
            .collect::<Result<Vec<_>, _>>()?;
        let out = features.clone().hide(TOUR_HIDDEN_FIELDS).apply(docs);
        log_elapsed("find", started, out.len());
        Ok(out)
    }

    pub async fn find_by_id(&self, id: TourId) -> Result<Option<TourView>, StoreError> {
        let started = Instant::now();
        let tour = self.find_document_untimed(id).await?;
        let view = match tour {
            Some(tour) => self.populate(vec![tour], true).await?.pop(),
            None => None,
        };
        log_elapsed("find_by_id", started, usize::from(view.is_some()));
        Ok(view)
    }

    pub async fn find_by_slug(&self, slug: &str) -> Result<Option<TourView>, StoreError> {
        let started = Instant::now();
        let tour = self.visible().await?.into_iter().find(|t| t.slug == slug);
        let view = match tour {
            Some(tour) => self.populate(vec![tour], true).await?.pop(),
            None => None,
        };
        log_elapsed("find_by_slug", started, usize::from(view.is_some()));
        Ok(view)
    }

    /// Visible tours satisfying `predicate`, guides populated.
    pub async fn find_matching<F>(&self, predicate: F) -> Result<Vec<TourView>, StoreError>
    where
        F: Fn(&Tour) -> bool + Send,
    {
        let started = Instant::now();
        let tours = self.visible().await?.into_iter().filter(|t| predicate(t)).collect();
        let views = self.populate(tours, false).await?;
        log_elapsed("find_matching", started, views.len());
        Ok(views)
    }

    /// Populate guides on a document just written, as a find would return it.
    pub async fn view(&self, tour: Tour) -> Result<TourView, StoreError> {
        let mut views = self.populate(vec![tour.clone()], false).await?;
        Ok(views.pop().unwrap_or(TourView {
            tour,
            guides: Vec::new(),
            reviews: None,
        }))
    }

    /// Visible tour documents, unpopulated. Feeds aggregations.
    pub async fn find_documents(&self) -> Result<Vec<Tour>, StoreError> {
        let started = Instant::now();
        let tours = self.visible().await?;
        log_elapsed("find_documents", started, tours.len());
        Ok(tours)
    }

    /// Lookup behind update and delete by id; secret tours are not found.
    pub async fn find_document(&self, id: TourId) -> Result<Option<Tour>, StoreError> {
        let started = Instant::now();
        let tour = self.find_document_untimed(id).await?;
        log_elapsed("find_document", started, usize::from(tour.is_some()));
        Ok(tour)
    }

    async fn find_document_untimed(&self, id: TourId) -> Result<Option<Tour>, StoreError> {
        Ok(self.tours.get(id).await?.filter(|t| !t.secret_tour))
    }
}
