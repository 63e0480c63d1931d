//! Read-side query helpers: list features and the tour read pipeline.

pub mod features;
pub mod tour_query;
pub mod views;

pub use features::{ApiFeatures, DEFAULT_LIMIT, QueryParams};
pub use tour_query::TourQuery;
pub use views::{Author, BookingView, ReviewView, TourView};
