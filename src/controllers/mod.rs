pub mod booking;
pub mod listing;
pub mod review;

pub use booking::{BookingController, BookingFilter};
pub use listing::ListingController;
pub use review::{ReviewController, ReviewFilter};
