use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

use natours_core::{DomainResult, Entity, TourId, UserId, Validator};

use crate::geo::{GeoPoint, Location};
use crate::slug::slugify;

/// Rating given to a tour before anyone has reviewed it.
pub const DEFAULT_RATINGS_AVERAGE: f64 = 4.5;

const NAME_MIN: usize = 10;
const NAME_MAX: usize = 40;

/// Round a rating to one decimal place (4.666 -> 4.7).
pub fn round_rating(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Easy,
    Medium,
    Difficult,
}

impl Difficulty {
    pub fn as_str(&self) -> &'static str {
        match self {
            Difficulty::Easy => "easy",
            Difficulty::Medium => "medium",
            Difficulty::Difficult => "difficult",
        }
    }

    fn parse(raw: &str) -> Option<Self> {
        match raw {
            "easy" => Some(Difficulty::Easy),
            "medium" => Some(Difficulty::Medium),
            "difficult" => Some(Difficulty::Difficult),
            _ => None,
        }
    }
}

/// The tour document as stored.
///
/// Fields are public for (de)serialization; writes go through [`Tour::create`],
/// [`Tour::apply_patch`] and [`Tour::set_ratings`], which keep the slug, the
/// rating rounding and the field constraints consistent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Tour {
    pub id: TourId,
    pub name: String,
    pub slug: String,
    pub duration: u32,
    pub max_group_size: u32,
    pub difficulty: Difficulty,
    pub ratings_average: f64,
    pub ratings_quantity: u32,
    pub price: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price_discount: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    pub description: String,
    pub image_cover: String,
    #[serde(default)]
    pub images: Vec<String>,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub start_dates: Vec<DateTime<Utc>>,
    #[serde(default)]
    pub secret_tour: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_location: Option<GeoPoint>,
    #[serde(default)]
    pub locations: Vec<Location>,
    #[serde(default)]
    pub guides: Vec<UserId>,
}

/// Create payload. Everything is optional so that missing fields surface as
/// validation messages rather than parse failures.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewTour {
    pub name: Option<String>,
    pub duration: Option<u32>,
    pub max_group_size: Option<u32>,
    pub difficulty: Option<String>,
    pub ratings_average: Option<f64>,
    pub ratings_quantity: Option<u32>,
    pub price: Option<f64>,
    pub price_discount: Option<f64>,
    pub summary: Option<String>,
    pub description: Option<String>,
    pub image_cover: Option<String>,
    #[serde(default)]
    pub images: Vec<String>,
    #[serde(default)]
    pub start_dates: Vec<DateTime<Utc>>,
    pub secret_tour: Option<bool>,
    pub start_location: Option<GeoPoint>,
    #[serde(default)]
    pub locations: Vec<Location>,
    #[serde(default)]
    pub guides: Vec<UserId>,
}

/// `Some(None)` for an explicit `null`, `None` when the key is absent.
fn nullable<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

/// Partial update payload.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TourPatch {
    pub name: Option<String>,
    pub duration: Option<u32>,
    pub max_group_size: Option<u32>,
    pub difficulty: Option<String>,
    pub ratings_average: Option<f64>,
    pub ratings_quantity: Option<u32>,
    pub price: Option<f64>,
    /// `null` removes the discount.
    #[serde(default, deserialize_with = "nullable")]
    pub price_discount: Option<Option<f64>>,
    pub summary: Option<String>,
    pub description: Option<String>,
    pub image_cover: Option<String>,
    pub images: Option<Vec<String>>,
    pub start_dates: Option<Vec<DateTime<Utc>>>,
    pub secret_tour: Option<bool>,
    pub start_location: Option<GeoPoint>,
    pub locations: Option<Vec<Location>>,
    pub guides: Option<Vec<UserId>>,
}

impl Tour {
    /// Validate a create payload and build the document.
    ///
    /// Defaults: `ratingsAverage` 4.5, `ratingsQuantity` 0, `secretTour` false.
    pub fn create(input: NewTour, now: DateTime<Utc>) -> DomainResult<Tour> {
        let mut v = Validator::new();

        let name = v.required_text("name", input.name.as_deref(), "A tour must have a name");
        let duration = v.required("duration", input.duration, "A tour must have a duration");
        let max_group_size = v.required("maxGroupSize", input.max_group_size, "A tour must have a group size");
        let difficulty = match v.required("difficulty", input.difficulty.as_deref(), "A tour must have a difficulty") {
            Some(raw) => {
                let parsed = Difficulty::parse(raw);
                v.check("difficulty", parsed.is_some(), "Difficulty is either: easy, medium, difficult");
                parsed
            }
            None => None,
        };
        let price = v.required("price", input.price, "A tour must have a price");
        let description = v.required_text("description", input.description.as_deref(), "A tour must have a description");
        let image_cover = v.required_text("imageCover", input.image_cover.as_deref(), "A tour must have a cover image");

        // Required-field failures are reported before cross-field checks run.
        let (Some(name), Some(duration), Some(max_group_size), Some(difficulty), Some(price), Some(description), Some(image_cover)) =
            (name, duration, max_group_size, difficulty, price, description, image_cover)
        else {
            return Err(v.into_error());
        };

        let tour = Tour {
            id: TourId::new(),
            slug: slugify(&name),
            name,
            duration,
            max_group_size,
            difficulty,
            ratings_average: round_rating(input.ratings_average.unwrap_or(DEFAULT_RATINGS_AVERAGE)),
            ratings_quantity: input.ratings_quantity.unwrap_or(0),
            price,
            price_discount: input.price_discount,
            summary: trimmed(input.summary),
            description,
            image_cover,
            images: input.images,
            created_at: now,
            start_dates: input.start_dates,
            secret_tour: input.secret_tour.unwrap_or(false),
            start_location: input.start_location,
            locations: input.locations,
            guides: input.guides,
        };

        tour.validate_into(v)?;
        Ok(tour)
    }

    /// Apply a partial update. The merged document is validated as a whole and
    /// the slug follows the (possibly new) name. On error `self` is untouched.
    pub fn apply_patch(&mut self, patch: TourPatch) -> DomainResult<()> {
        let mut v = Validator::new();
        let mut next = self.clone();

        if let Some(name) = patch.name {
            next.name = name.trim().to_string();
        }
        if let Some(duration) = patch.duration {
            next.duration = duration;
        }
        if let Some(size) = patch.max_group_size {
            next.max_group_size = size;
        }
        if let Some(raw) = patch.difficulty {
            match Difficulty::parse(&raw) {
                Some(d) => next.difficulty = d,
                None => v.check("difficulty", false, "Difficulty is either: easy, medium, difficult"),
            }
        }
        if let Some(avg) = patch.ratings_average {
            next.ratings_average = round_rating(avg);
        }
        if let Some(qty) = patch.ratings_quantity {
            next.ratings_quantity = qty;
        }
        if let Some(price) = patch.price {
            next.price = price;
        }
        if let Some(discount) = patch.price_discount {
            next.price_discount = discount;
        }
        if let Some(summary) = patch.summary {
            next.summary = trimmed(Some(summary));
        }
        if let Some(description) = patch.description {
            next.description = description.trim().to_string();
        }
        if let Some(cover) = patch.image_cover {
            next.image_cover = cover.trim().to_string();
        }
        if let Some(images) = patch.images {
            next.images = images;
        }
        if let Some(dates) = patch.start_dates {
            next.start_dates = dates;
        }
        if let Some(secret) = patch.secret_tour {
            next.secret_tour = secret;
        }
        if let Some(start) = patch.start_location {
            next.start_location = Some(start);
        }
        if let Some(locations) = patch.locations {
            next.locations = locations;
        }
        if let Some(guides) = patch.guides {
            next.guides = guides;
        }

        next.slug = slugify(&next.name);
        next.validate_into(v)?;
        *self = next;
        Ok(())
    }

    /// Store the rating summary computed from reviews.
    pub fn set_ratings(&mut self, quantity: u32, average: f64) {
        self.ratings_quantity = quantity;
        self.ratings_average = round_rating(average);
    }

    /// Derived: duration expressed in weeks.
    pub fn duration_weeks(&self) -> f64 {
        f64::from(self.duration) / 7.0
    }

    /// Price actually charged, honouring a discount when present.
    pub fn effective_price(&self) -> f64 {
        self.price_discount.unwrap_or(self.price)
    }

    fn validate_into(&self, mut v: Validator) -> DomainResult<()> {
        v.check("name", !self.name.is_empty(), "A tour must have a name");
        v.length_between(
            "name",
            &self.name,
            NAME_MIN,
            NAME_MAX,
            "A tour name must have more or equal than 10 characters",
            "A tour name must have less or equal than 40 characters",
        );
        v.check("duration", self.duration > 0, "A tour must last at least one day");
        v.check("maxGroupSize", self.max_group_size > 0, "A tour group must have at least one person");
        v.within(
            "ratingsAverage",
            self.ratings_average,
            1.0,
            5.0,
            "Rating must be above 1.0",
            "Rating must be below 5.0",
        );
        v.check("price", self.price.is_finite() && self.price >= 0.0, "A tour price cannot be negative");
        if let Some(discount) = self.price_discount {
            v.check(
                "priceDiscount",
                discount < self.price,
                format!("Discount price ({discount}) should be below regular price"),
            );
        }
        v.check("description", !self.description.is_empty(), "A tour must have a description");
        v.check("imageCover", !self.image_cover.is_empty(), "A tour must have a cover image");
        if let Some(start) = &self.start_location {
            v.check(
                "startLocation",
                start.lat_lng().is_some(),
                "Coordinates must be [longitude, latitude]",
            );
        }
        for loc in &self.locations {
            v.check(
                "locations",
                loc.point.lat_lng().is_some(),
                "Coordinates must be [longitude, latitude]",
            );
        }
        v.finish()
    }
}

impl Entity for Tour {
    type Id = TourId;

    fn id(&self) -> TourId {
        self.id
    }
}

fn trimmed(value: Option<String>) -> Option<String> {
    value
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use natours_core::DomainError;
    use proptest::prelude::*;

    fn valid_input() -> NewTour {
        NewTour {
            name: Some("The Forest Hiker".to_string()),
            duration: Some(5),
            max_group_size: Some(25),
            difficulty: Some("easy".to_string()),
            price: Some(397.0),
            summary: Some("  Breathtaking hike through the Canadian Banff National Park  ".to_string()),
            description: Some("Ut enim ad minim veniam.".to_string()),
            image_cover: Some("tour-1-cover.jpg".to_string()),
            ..NewTour::default()
        }
    }

    fn validation_errors(err: DomainError) -> natours_core::ValidationErrors {
        match err {
            DomainError::Validation(errors) => errors,
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn create_applies_defaults_and_derives_slug() {
        let tour = Tour::create(valid_input(), Utc::now()).unwrap();
        assert_eq!(tour.slug, "the-forest-hiker");
        assert_eq!(tour.ratings_average, 4.5);
        assert_eq!(tour.ratings_quantity, 0);
        assert!(!tour.secret_tour);
        assert_eq!(
            tour.summary.as_deref(),
            Some("Breathtaking hike through the Canadian Banff National Park")
        );
    }

    #[test]
    fn create_reports_every_missing_required_field() {
        let errors = validation_errors(Tour::create(NewTour::default(), Utc::now()).unwrap_err());
        for field in ["name", "duration", "maxGroupSize", "difficulty", "price", "description", "imageCover"] {
            assert!(errors.message_for(field).is_some(), "missing message for {field}");
        }
        assert_eq!(errors.message_for("name"), Some("A tour must have a name"));
    }

    #[test]
    fn create_rejects_unknown_difficulty() {
        let mut input = valid_input();
        input.difficulty = Some("extreme".to_string());
        let errors = validation_errors(Tour::create(input, Utc::now()).unwrap_err());
        assert_eq!(
            errors.message_for("difficulty"),
            Some("Difficulty is either: easy, medium, difficult")
        );
    }

    #[test]
    fn create_rejects_discount_not_below_price() {
        for discount in [397.0, 500.0] {
            let mut input = valid_input();
            input.price_discount = Some(discount);
            let errors = validation_errors(Tour::create(input, Utc::now()).unwrap_err());
            assert!(errors.message_for("priceDiscount").is_some());
        }

        let mut input = valid_input();
        input.price_discount = Some(100.0);
        assert!(Tour::create(input, Utc::now()).is_ok());
    }

    #[test]
    fn create_rejects_ratings_out_of_bounds() {
        for (avg, msg) in [(0.5, "Rating must be above 1.0"), (5.5, "Rating must be below 5.0")] {
            let mut input = valid_input();
            input.ratings_average = Some(avg);
            let errors = validation_errors(Tour::create(input, Utc::now()).unwrap_err());
            assert_eq!(errors.message_for("ratingsAverage"), Some(msg));
        }
    }

    #[test]
    fn ratings_are_rounded_to_one_decimal() {
        let mut input = valid_input();
        input.ratings_average = Some(4.666);
        let tour = Tour::create(input, Utc::now()).unwrap();
        assert_eq!(tour.ratings_average, 4.7);
    }

    #[test]
    fn name_length_is_bounded() {
        let mut input = valid_input();
        input.name = Some("Short".to_string());
        let errors = validation_errors(Tour::create(input, Utc::now()).unwrap_err());
        assert_eq!(
            errors.message_for("name"),
            Some("A tour name must have more or equal than 10 characters")
        );

        let mut input = valid_input();
        input.name = Some("x".repeat(41));
        let errors = validation_errors(Tour::create(input, Utc::now()).unwrap_err());
        assert_eq!(
            errors.message_for("name"),
            Some("A tour name must have less or equal than 40 characters")
        );
    }

    #[test]
    fn patch_recomputes_slug_and_validates_merged_document() {
        let mut tour = Tour::create(valid_input(), Utc::now()).unwrap();

        tour.apply_patch(TourPatch {
            name: Some("The Sea Explorer".to_string()),
            ..TourPatch::default()
        })
        .unwrap();
        assert_eq!(tour.slug, "the-sea-explorer");

        let before = tour.clone();
        let err = tour
            .apply_patch(TourPatch {
                price: Some(50.0),
                price_discount: Some(Some(80.0)),
                ..TourPatch::default()
            })
            .unwrap_err();
        assert!(validation_errors(err).message_for("priceDiscount").is_some());
        assert_eq!(tour, before);
    }

    #[test]
    fn patch_clears_the_discount_only_on_explicit_null() {
        let mut input = valid_input();
        input.price_discount = Some(100.0);
        let mut tour = Tour::create(input, Utc::now()).unwrap();

        let untouched: TourPatch = serde_json::from_str(r#"{"price": 450}"#).unwrap();
        tour.apply_patch(untouched).unwrap();
        assert_eq!(tour.price_discount, Some(100.0));

        let cleared: TourPatch = serde_json::from_str(r#"{"priceDiscount": null}"#).unwrap();
        tour.apply_patch(cleared).unwrap();
        assert_eq!(tour.price_discount, None);
        assert_eq!(tour.effective_price(), 450.0);
    }

    #[test]
    fn duration_weeks_is_derived() {
        let mut input = valid_input();
        input.duration = Some(14);
        let tour = Tour::create(input, Utc::now()).unwrap();
        assert_eq!(tour.duration_weeks(), 2.0);
    }

    #[test]
    fn serializes_camel_case_fields() {
        let tour = Tour::create(valid_input(), Utc::now()).unwrap();
        let json = serde_json::to_value(&tour).unwrap();
        assert_eq!(json["maxGroupSize"], 25);
        assert_eq!(json["secretTour"], false);
        assert_eq!(json["difficulty"], "easy");
        assert!(json.get("priceDiscount").is_none());
    }

    proptest! {
        #![proptest_config(ProptestConfig {
            cases: 256,
            .. ProptestConfig::default()
        })]

        #[test]
        fn accepted_ratings_stay_in_bounds_with_one_decimal(avg in 0.0f64..6.0) {
            let mut input = valid_input();
            input.ratings_average = Some(avg);
            if let Ok(tour) = Tour::create(input, Utc::now()) {
                prop_assert!((1.0..=5.0).contains(&tour.ratings_average));
                let scaled = tour.ratings_average * 10.0;
                prop_assert!((scaled - scaled.round()).abs() < 1e-9);
            }
        }
    }
}
