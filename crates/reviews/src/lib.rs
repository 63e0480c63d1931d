//! `natours-reviews`: tour reviews and the rating summary they feed.

pub mod review;
pub mod summary;

pub use review::{NewReview, Review, ReviewPatch};
pub use summary::RatingsSummary;
