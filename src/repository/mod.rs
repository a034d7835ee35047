pub mod favorites;
pub mod filters;

pub use favorites::{CouponStream, FavoritesRepository};
pub use filters::{CategoryStream, FilterRepository};
