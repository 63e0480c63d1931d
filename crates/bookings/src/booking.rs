use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use natours_core::{BookingId, DomainResult, Entity, TourId, UserId, Validator};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Booking {
    pub id: BookingId,
    pub tour: TourId,
    pub user: UserId,
    pub price: f64,
    pub created_at: DateTime<Utc>,
    #[serde(default = "default_paid")]
    pub paid: bool,
}

fn default_paid() -> bool {
    true
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewBooking {
    pub tour: Option<TourId>,
    pub user: Option<UserId>,
    pub price: Option<f64>,
    pub paid: Option<bool>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookingPatch {
    pub price: Option<f64>,
    pub paid: Option<bool>,
}

fn check_price(v: &mut Validator, price: f64) {
    v.check("price", price.is_finite() && price > 0.0, "Booking price must be positive");
}

impl Booking {
    pub fn create(input: NewBooking, now: DateTime<Utc>) -> DomainResult<Booking> {
        let mut v = Validator::new();
        let tour = v.required("tour", input.tour, "Booking must belong to a tour");
        let user = v.required("user", input.user, "Booking must belong to a user");
        let price = v.required("price", input.price, "Booking must have a price");
        if let Some(price) = price {
            check_price(&mut v, price);
        }

        match (tour, user, price) {
            (Some(tour), Some(user), Some(price)) if v.is_valid() => Ok(Booking {
                id: BookingId::new(),
                tour,
                user,
                price,
                created_at: now,
                paid: input.paid.unwrap_or_else(default_paid),
            }),
            _ => Err(v.into_error()),
        }
    }

    pub fn apply_patch(&mut self, patch: BookingPatch) -> DomainResult<()> {
        let mut v = Validator::new();
        if let Some(price) = patch.price {
            check_price(&mut v, price);
        }
        v.finish()?;

        if let Some(price) = patch.price {
            self.price = price;
        }
        if let Some(paid) = patch.paid {
            self.paid = paid;
        }
        Ok(())
    }
}

impl Entity for Booking {
    type Id = BookingId;

    fn id(&self) -> BookingId {
        self.id
    }
}
