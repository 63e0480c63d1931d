use chrono::Utc;
use serde_json::Value as JsonValue;

use natours_auth::User;
use natours_bookings::{Booking, BookingPatch, NewBooking};
use natours_core::{BookingId, UserId};

use super::RepoResult;
use crate::query::{ApiFeatures, BookingView, TourQuery, TourView};
use crate::store::Collection;

#[derive(Clone)]
pub struct BookingRepository {
    bookings: Collection<Booking>,
    users: Collection<User>,
    query: TourQuery,
}

impl BookingRepository {
    pub fn new(bookings: Collection<Booking>, users: Collection<User>, query: TourQuery) -> Self {
        Self { bookings, users, query }
    }

    /// Tours are resolved through the find pipeline, so a secret tour shows as `null`.
    async fn view(&self, booking: Booking) -> RepoResult<BookingView> {
        let tour = self.query.find_document(booking.tour).await?;
        let user = self.users.get(booking.user).await?.filter(|u| u.active);
        Ok(BookingView::new(booking, tour.as_ref(), user.as_ref()))
    }

    pub async fn create(&self, input: NewBooking) -> RepoResult<Booking> {
        let booking = Booking::create(input, Utc::now())?;
        self.bookings.insert(&booking).await?;
        tracing::info!(booking_id = %booking.id, tour_id = %booking.tour, "booking created");
        Ok(booking)
    }

    pub async fn get(&self, id: BookingId) -> RepoResult<Option<BookingView>> {
        match self.bookings.get(id).await? {
            Some(booking) => Ok(Some(self.view(booking).await?)),
            None => Ok(None),
        }
    }

    pub async fn list(&self, features: &ApiFeatures) -> RepoResult<Vec<JsonValue>> {
        let mut docs = Vec::new();
        for booking in self.bookings.all().await? {
            docs.push(serde_json::to_value(self.view(booking).await?)?);
        }
        Ok(features.apply(docs))
    }

    pub async fn update(&self, id: BookingId, patch: BookingPatch) -> RepoResult<Option<Booking>> {
        let Some(mut booking) = self.bookings.get(id).await? else {
            return Ok(None);
        };
        booking.apply_patch(patch)?;
        self.bookings.save(&booking).await?;
        Ok(Some(booking))
    }

    pub async fn delete(&self, id: BookingId) -> RepoResult<bool> {
        Ok(self.bookings.delete(id).await?)
    }

    /// Visible tours the user has booked.
    pub async fn booked_tours(&self, user: UserId) -> RepoResult<Vec<TourView>> {
        let booked: Vec<_> = self
            .bookings
            .all()
            .await?
            .into_iter()
            .filter(|b| b.user == user)
            .map(|b| b.tour)
            .collect();
        Ok(self.query.find_matching(move |t| booked.contains(&t.id)).await?)
    }
}
