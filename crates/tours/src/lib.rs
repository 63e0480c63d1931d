//! `natours-tours`: the tour document with its schema, validation, derived fields and
//! the pure aggregations computed over tours.

pub mod geo;
pub mod slug;
pub mod stats;
pub mod tour;

pub use geo::{DistanceUnit, GeoError, GeoKind, GeoPoint, LatLng, Location};
pub use slug::slugify;
pub use stats::{DifficultyStats, MonthPlan, monthly_plan, tour_stats};
pub use tour::{DEFAULT_RATINGS_AVERAGE, Difficulty, NewTour, Tour, TourPatch, round_rating};
