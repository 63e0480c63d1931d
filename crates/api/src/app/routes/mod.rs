pub mod bookings;
pub mod reviews;
pub mod system;
pub mod tours;
pub mod users;
pub mod views;
