pub mod coupon;
pub mod favorite;
pub mod filter;

pub use coupon::{merge_with_catalog, Coupon, Merchant};
pub use favorite::{FavoriteCoupon, FavoriteRecord};
pub use filter::FilterClickCounter;
