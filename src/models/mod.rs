pub mod booking;
pub mod health;
pub mod pet;
pub mod user;

pub use booking::{Booking, BookingStatus, Ledger};
pub use health::{DietPlan, HealthRecord, UpcomingItem, Vaccination};
pub use pet::Pet;
pub use user::User;
