use futures_util::stream::Map;
use futures_util::StreamExt;

use crate::db::{LocalStore, Subscription};
use crate::error::Result;
use crate::models::{Coupon, FavoriteCoupon};

/// Live list of saved coupons, newest first
pub type CouponStream =
    Map<Subscription<Vec<FavoriteCoupon>>, fn(Result<Vec<FavoriteCoupon>>) -> Result<Vec<Coupon>>>;

/// Saved coupons in domain shape
///
/// Stateless: every emission is translated from the store's rows.
#[derive(Clone)]
pub struct FavoritesRepository {
    store: LocalStore,
}

impl FavoritesRepository {
    pub fn new(store: LocalStore) -> Self {
        Self { store }
    }

    /// Saved coupons with placeholder merchant and description fields
    pub async fn observe(&self) -> Result<CouponStream> {
        let rows = self.store.observe_favorites().await?;
        Ok(rows.map(to_coupons as fn(_) -> _))
    }

    pub async fn is_favorite_flow(&self, id: &str) -> Result<Subscription<bool>> {
        self.store.is_favorite(id).await
    }

    /// Save a coupon, stamped with the current time
    pub async fn add(&self, coupon: &Coupon) -> Result<()> {
        let favorite = FavoriteCoupon::new(
            coupon.id.as_str(),
            coupon.title.as_str(),
            coupon.discount_text.as_str(),
        );
        self.store.upsert_favorite(favorite).await?;
        tracing::info!("Coupon {} added to favorites", coupon.id);
        Ok(())
    }

    pub async fn remove(&self, id: &str) -> Result<()> {
        if self.store.delete_favorite(id).await? {
            tracing::info!("Coupon {} removed from favorites", id);
        }
        Ok(())
    }
}

fn to_coupons(rows: Result<Vec<FavoriteCoupon>>) -> Result<Vec<Coupon>> {
    rows.map(|rows| rows.into_iter().map(Coupon::from).collect())
}
