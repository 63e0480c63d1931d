use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use natours_core::{DomainResult, Entity, ReviewId, TourId, UserId, Validator};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Review {
    pub id: ReviewId,
    pub review: String,
    pub rating: f64,
    pub created_at: DateTime<Utc>,
    pub tour: TourId,
    pub user: UserId,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewReview {
    pub review: Option<String>,
    pub rating: Option<f64>,
    pub tour: Option<TourId>,
    pub user: Option<UserId>,
}

/// Only the text and the rating can change after creation.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewPatch {
    pub review: Option<String>,
    pub rating: Option<f64>,
}

fn check_rating(v: &mut Validator, rating: f64) {
    v.within("rating", rating, 1.0, 5.0, "Rating must be above 1.0", "Rating must be below 5.0");
}

impl Review {
    pub fn create(input: NewReview, now: DateTime<Utc>) -> DomainResult<Review> {
        let mut v = Validator::new();
        let text = v.required_text("review", input.review.as_deref(), "Review can not be empty!");
        let rating = v.required("rating", input.rating, "A review must have a rating");
        let tour = v.required("tour", input.tour, "Review must belong to a tour");
        let user = v.required("user", input.user, "Review must belong to a user");
        if let Some(rating) = rating {
            check_rating(&mut v, rating);
        }

        match (text, rating, tour, user) {
            (Some(review), Some(rating), Some(tour), Some(user)) if v.is_valid() => Ok(Review {
                id: ReviewId::new(),
                review,
                rating,
                created_at: now,
                tour,
                user,
            }),
            _ => Err(v.into_error()),
        }
    }

    /// Validated partial update; on error `self` is untouched.
    pub fn apply_patch(&mut self, patch: ReviewPatch) -> DomainResult<()> {
        let mut v = Validator::new();
        let text = match patch.review.as_deref() {
            Some(raw) => v.required_text("review", Some(raw), "Review can not be empty!"),
            None => None,
        };
        if let Some(rating) = patch.rating {
            check_rating(&mut v, rating);
        }
        v.finish()?;

        if let Some(text) = text {
            self.review = text;
        }
        if let Some(rating) = patch.rating {
            self.rating = rating;
        }
        Ok(())
    }
}

impl Entity for Review {
    type Id = ReviewId;

    fn id(&self) -> ReviewId {
        self.id
    }
}
