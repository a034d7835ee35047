use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::constants::{
    PLACEHOLDER_DESCRIPTION, PLACEHOLDER_IMAGE_URL, PLACEHOLDER_MERCHANT_CATEGORY,
    PLACEHOLDER_MERCHANT_ID, PLACEHOLDER_MERCHANT_LOGO_URL, PLACEHOLDER_MERCHANT_NAME,
};
use crate::models::FavoriteCoupon;

/// Merchant a coupon is redeemed at
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Merchant {
    pub id: String,
    pub name: String,
    pub logo_url: String,
    pub category: String,
}

/// Coupon as shown to the user, in the catalog's JSON shape
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Coupon {
    pub id: String,
    pub title: String,
    pub description: String,
    pub image_url: String,
    pub discount_text: String,
    pub merchant: Merchant,
    #[serde(default)]
    pub valid_until: Option<String>,
    #[serde(default)]
    pub qr_code_url: Option<String>,
}

impl Coupon {
    /// Minimal coupon rebuilt from the fields a favorite keeps
    pub fn placeholder(
        id: impl Into<String>,
        title: impl Into<String>,
        discount_text: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            description: PLACEHOLDER_DESCRIPTION.to_string(),
            image_url: PLACEHOLDER_IMAGE_URL.to_string(),
            discount_text: discount_text.into(),
            merchant: Merchant {
                id: PLACEHOLDER_MERCHANT_ID.to_string(),
                name: PLACEHOLDER_MERCHANT_NAME.to_string(),
                logo_url: PLACEHOLDER_MERCHANT_LOGO_URL.to_string(),
                category: PLACEHOLDER_MERCHANT_CATEGORY.to_string(),
            },
            valid_until: None,
            qr_code_url: None,
        }
    }
}

impl From<FavoriteCoupon> for Coupon {
    fn from(favorite: FavoriteCoupon) -> Self {
        Coupon::placeholder(favorite.id, favorite.title, favorite.discount_text)
    }
}

/// Swap favorite placeholders for their full catalog entries
///
/// Favorites missing from the catalog keep their placeholder. Order follows `favorites`.
pub fn merge_with_catalog(favorites: Vec<Coupon>, catalog: &[Coupon]) -> Vec<Coupon> {
    let by_id: HashMap<&str, &Coupon> = catalog.iter().map(|c| (c.id.as_str(), c)).collect();

    favorites
        .into_iter()
        .map(|favorite| match by_id.get(favorite.id.as_str()) {
            Some(full) => (*full).clone(),
            None => favorite,
        })
        .collect()
}
