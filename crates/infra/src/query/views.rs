//! Read projections with references populated.

use chrono::{DateTime, Utc};
use serde::{Serialize, Serializer};
use serde_json::Value as JsonValue;

use natours_auth::{User, UserProfile};
use natours_bookings::Booking;
use natours_core::{BookingId, ReviewId, TourId, UserId};
use natours_reviews::Review;
use natours_tours::Tour;

/// A tour with its guides populated and, on single reads, its reviews.
#[derive(Debug, Clone, PartialEq)]
pub struct TourView {
    pub tour: Tour,
    pub guides: Vec<UserProfile>,
    pub reviews: Option<Vec<ReviewView>>,
}

impl TourView {
    pub fn to_json(&self) -> Result<JsonValue, serde_json::Error> {
        let mut value = serde_json::to_value(&self.tour)?;
        if let JsonValue::Object(map) = &mut value {
            map.insert("guides".to_string(), serde_json::to_value(&self.guides)?);
            map.insert("durationWeeks".to_string(), self.tour.duration_weeks().into());
            if let Some(reviews) = &self.reviews {
                map.insert("reviews".to_string(), serde_json::to_value(reviews)?);
            }
        }
        Ok(value)
    }
}

impl Serialize for TourView {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_json()
            .map_err(serde::ser::Error::custom)?
            .serialize(serializer)
    }
}

/// Reviewer as shown next to a review.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Author {
    pub id: UserId,
    pub name: String,
    pub photo: String,
}

impl From<&User> for Author {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            name: user.name.clone(),
            photo: user.photo.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewView {
    pub id: ReviewId,
    pub review: String,
    pub rating: f64,
    pub created_at: DateTime<Utc>,
    pub tour: TourId,
    /// `None` once the author's account is gone.
    pub user: Option<Author>,
}

impl ReviewView {
    pub fn new(review: Review, author: Option<&User>) -> Self {
        Self {
            id: review.id,
            review: review.review,
            rating: review.rating,
            created_at: review.created_at,
            tour: review.tour,
            user: author.map(Author::from),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TourSummary {
    pub id: TourId,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BookingView {
    pub id: BookingId,
    pub tour: Option<TourSummary>,
    pub user: Option<UserProfile>,
    pub price: f64,
    pub created_at: DateTime<Utc>,
    pub paid: bool,
}

impl BookingView {
    pub fn new(booking: Booking, tour: Option<&Tour>, user: Option<&User>) -> Self {
        Self {
            id: booking.id,
            tour: tour.map(|t| TourSummary {
                id: t.id,
                name: t.name.clone(),
            }),
            user: user.map(User::profile),
            price: booking.price,
            created_at: booking.created_at,
            paid: booking.paid,
        }
    }
}
