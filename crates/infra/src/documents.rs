//! Collection bindings for the domain documents.

use natours_auth::User;
use natours_bookings::Booking;
use natours_reviews::Review;
use natours_tours::Tour;

use crate::store::{Document, UniqueKey};

impl Document for Tour {
    const COLLECTION: &'static str = "tours";

    fn unique_keys(&self) -> Vec<UniqueKey> {
        vec![UniqueKey::new("name", self.name.clone())]
    }
}

impl Document for User {
    const COLLECTION: &'static str = "users";

    fn unique_keys(&self) -> Vec<UniqueKey> {
        vec![UniqueKey::new("email", self.email.clone())]
    }
}

impl Document for Review {
    const COLLECTION: &'static str = "reviews";

    /// One review per user and tour.
    fn unique_keys(&self) -> Vec<UniqueKey> {
        vec![UniqueKey::new("tour_user", format!("{}:{}", self.tour, self.user))]
    }
}

impl Document for Booking {
    const COLLECTION: &'static str = "bookings";
}
