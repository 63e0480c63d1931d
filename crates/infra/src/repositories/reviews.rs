use std::collections::HashMap;

use chrono::Utc;
use serde_json::Value as JsonValue;

use natours_auth::User;
use natours_core::{ReviewId, TourId, UserId};
use natours_reviews::{NewReview, RatingsSummary, Review, ReviewPatch};

use super::{RepoResult, TourRepository};
use crate::query::{ApiFeatures, ReviewView};
use crate::store::Collection;

/// Reviews. Every write recomputes the reviewed tour's rating summary.
#[derive(Clone)]
pub struct ReviewRepository {
    reviews: Collection<Review>,
    users: Collection<User>,
    tours: TourRepository,
}

impl ReviewRepository {
    pub fn new(reviews: Collection<Review>, users: Collection<User>, tours: TourRepository) -> Self {
        Self { reviews, users, tours }
    }

    async fn authors(&self) -> RepoResult<HashMap<UserId, User>> {
        Ok(self
            .users
            .all()
            .await?
            .into_iter()
            .filter(|u| u.active)
            .map(|u| (u.id, u))
            .collect())
    }

    async fn recompute(&self, tour: TourId) -> RepoResult<()> {
        let ratings = self
            .reviews
            .all()
            .await?
            .into_iter()
            .filter(|r| r.tour == tour)
            .map(|r| r.rating);
        let summary = RatingsSummary::from_ratings(ratings);
        tracing::debug!(tour_id = %tour, quantity = summary.quantity, average = summary.average, "ratings recomputed");
        self.tours.set_ratings(tour, summary).await
    }

    pub async fn create(&self, input: NewReview) -> RepoResult<Review> {
        let review = Review::create(input, Utc::now())?;
        self.reviews.insert(&review).await?;
        self.recompute(review.tour).await?;
        Ok(review)
    }

    pub async fn get(&self, id: ReviewId) -> RepoResult<Option<ReviewView>> {
        let Some(review) = self.reviews.get(id).await? else {
            return Ok(None);
        };
        let author = self.users.get(review.user).await?.filter(|u| u.active);
        Ok(Some(ReviewView::new(review, author.as_ref())))
    }

    /// Reviews (optionally of one tour) with list features applied.
    pub async fn list(&self, tour: Option<TourId>, features: &ApiFeatures) -> RepoResult<Vec<JsonValue>> {
        let authors = self.authors().await?;
        let docs = self
            .reviews
            .all()
            .await?
            .into_iter()
            .filter(|r| tour.is_none_or(|t| r.tour == t))
            .map(|r| {
                let author = authors.get(&r.user);
                serde_json::to_value(ReviewView::new(r, author))
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(features.apply(docs))
    }

    pub async fn update(&self, id: ReviewId, patch: ReviewPatch) -> RepoResult<Option<Review>> {
        let Some(mut review) = self.reviews.get(id).await? else {
            return Ok(None);
        };
        review.apply_patch(patch)?;
        self.reviews.save(&review).await?;
        self.recompute(review.tour).await?;
        Ok(Some(review))
    }

    pub async fn delete(&self, id: ReviewId) -> RepoResult<bool> {
        let Some(review) = self.reviews.get(id).await? else {
            return Ok(false);
        };
        self.reviews.delete(id).await?;
        self.recompute(review.tour).await?;
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use natours_tours::{NewTour, Tour};

    use super::*;
    use crate::query::TourQuery;
    use crate::repositories::RepoError;
    use crate::store::{DocumentStore, InMemoryDocumentStore, StoreError};

    struct Fixture {
        reviews: ReviewRepository,
        tours: TourRepository,
    }

    fn fixture() -> Fixture {
        let store: Arc<dyn DocumentStore> = Arc::new(InMemoryDocumentStore::new());
        let tours = Collection::<Tour>::new(store.clone());
        let users = Collection::<User>::new(store.clone());
        let reviews = Collection::<Review>::new(store);
        let query = TourQuery::new(tours.clone(), users.clone(), reviews.clone());
        let tour_repo = TourRepository::new(query, tours);
        Fixture {
            reviews: ReviewRepository::new(reviews, users, tour_repo.clone()),
            tours: tour_repo,
        }
    }

    async fn tour(f: &Fixture) -> Tour {
        f.tours
            .create(NewTour {
                name: Some("The Forest Hiker".to_string()),
                duration: Some(5),
                max_group_size: Some(25),
                difficulty: Some("easy".to_string()),
                price: Some(397.0),
                description: Some("Breathtaking hike through the Canadian Banff National Park".to_string()),
                image_cover: Some("tour-1-cover.jpg".to_string()),
                ..NewTour::default()
            })
            .await
            .unwrap()
    }

    fn review(tour: TourId, user: UserId, rating: f64) -> NewReview {
        NewReview {
            review: Some("Great".to_string()),
            rating: Some(rating),
            tour: Some(tour),
            user: Some(user),
        }
    }

    async fn ratings(f: &Fixture, id: TourId) -> (u32, f64) {
        let t = f.tours.query().find_document(id).await.unwrap().unwrap();
        (t.ratings_quantity, t.ratings_average)
    }

    #[tokio::test]
    async fn writes_recompute_tour_ratings() {
        let f = fixture();
        let t = tour(&f).await;

        let a = f.reviews.create(review(t.id, UserId::new(), 5.0)).await.unwrap();
        f.reviews.create(review(t.id, UserId::new(), 4.0)).await.unwrap();
        f.reviews.create(review(t.id, UserId::new(), 5.0)).await.unwrap();
        assert_eq!(ratings(&f, t.id).await, (3, 4.7));

        f.reviews
            .update(
                a.id,
                ReviewPatch {
                    rating: Some(3.0),
                    ..ReviewPatch::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(ratings(&f, t.id).await, (3, 4.0));

        f.reviews.delete(a.id).await.unwrap();
        assert_eq!(ratings(&f, t.id).await, (2, 4.5));
    }

    #[tokio::test]
    async fn last_review_deleted_resets_to_defaults() {
        let f = fixture();
        let t = tour(&f).await;
        let r = f.reviews.create(review(t.id, UserId::new(), 1.0)).await.unwrap();
        assert_eq!(ratings(&f, t.id).await, (1, 1.0));

        f.reviews.delete(r.id).await.unwrap();
        assert_eq!(ratings(&f, t.id).await, (0, 4.5));
    }

    #[tokio::test]
    async fn one_review_per_user_and_tour() {
        let f = fixture();
        let t = tour(&f).await;
        let user = UserId::new();
        f.reviews.create(review(t.id, user, 4.0)).await.unwrap();

        let err = f.reviews.create(review(t.id, user, 5.0)).await.unwrap_err();
        assert!(matches!(err, RepoError::Store(StoreError::Duplicate { .. })));
        assert_eq!(ratings(&f, t.id).await, (1, 4.0));
    }

    #[tokio::test]
    async fn list_filters_by_tour() {
        let f = fixture();
        let t = tour(&f).await;
        f.reviews.create(review(t.id, UserId::new(), 4.0)).await.unwrap();
        f.reviews.create(review(TourId::new(), UserId::new(), 4.0)).await.unwrap();

        let features = ApiFeatures::default();
        assert_eq!(f.reviews.list(Some(t.id), &features).await.unwrap().len(), 1);
        assert_eq!(f.reviews.list(None, &features).await.unwrap().len(), 2);
    }
}
