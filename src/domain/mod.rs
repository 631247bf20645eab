pub mod booking;
pub mod listing;
pub mod pricing;
pub mod review;
pub mod search_params;

use crate::error::Result;

/// Input payloads check themselves before they reach storage, filling in
/// defaults on the way.
pub trait Validate: Sized {
    fn validate(self) -> Result<Self>;
}
