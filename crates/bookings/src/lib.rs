//! `natours-bookings`: a user's purchase of a tour.

pub mod booking;

pub use booking::{Booking, BookingPatch, NewBooking};
