use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::constants::ERR_EMPTY_COUPON_ID;
use crate::error::{AppError, Result};

/// Favorite record stored in redb, keyed by coupon id
/// Uses epoch millis for compact storage with bincode
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FavoriteRecord {
    pub title: String,
    pub discount_text: String,
    /// When the coupon was saved (epoch millis)
    pub saved_at: i64,
}

/// A saved coupon as seen by callers of the local store
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FavoriteCoupon {
    pub id: String,
    pub title: String,
    pub discount_text: String,
    pub saved_at: i64,
}

impl FavoriteCoupon {
    /// Create a favorite stamped with the current time
    pub fn new(
        id: impl Into<String>,
        title: impl Into<String>,
        discount_text: impl Into<String>,
    ) -> Self {
        Self::saved_at(id, title, discount_text, Utc::now().timestamp_millis())
    }

    /// Create a favorite with an explicit saved-at timestamp
    pub fn saved_at(
        id: impl Into<String>,
        title: impl Into<String>,
        discount_text: impl Into<String>,
        saved_at: i64,
    ) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            discount_text: discount_text.into(),
            saved_at,
        }
    }

    /// Validate that a coupon id is usable as a primary key
    pub fn validate_id(id: &str) -> Result<()> {
        if id.trim().is_empty() {
            return Err(AppError::InvalidInput(ERR_EMPTY_COUPON_ID.to_string()));
        }
        Ok(())
    }

    /// Split into the table key and the stored value
    pub fn into_parts(self) -> (String, FavoriteRecord) {
        (
            self.id,
            FavoriteRecord {
                title: self.title,
                discount_text: self.discount_text,
                saved_at: self.saved_at,
            },
        )
    }

    pub fn from_parts(id: impl Into<String>, record: FavoriteRecord) -> Self {
        Self {
            id: id.into(),
            title: record.title,
            discount_text: record.discount_text,
            saved_at: record.saved_at,
        }
    }
}

/// Order favorites newest first; equal timestamps fall back to id order
pub(crate) fn sort_newest_first(favorites: &mut [FavoriteCoupon]) {
    favorites.sort_by(|a, b| b.saved_at.cmp(&a.saved_at).then_with(|| a.id.cmp(&b.id)));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_id() {
        assert!(FavoriteCoupon::validate_id("c1").is_ok());
        assert!(matches!(
            FavoriteCoupon::validate_id(""),
            Err(AppError::InvalidInput(_))
        ));
        assert!(FavoriteCoupon::validate_id("   ").is_err());
    }

    #[test]
    fn test_new_stamps_current_time() {
        let before = Utc::now().timestamp_millis();
        let favorite = FavoriteCoupon::new("c1", "Latte 2x1", "2x1");
        let after = Utc::now().timestamp_millis();

        assert!(favorite.saved_at >= before && favorite.saved_at <= after);
    }

    #[test]
    fn test_parts_preserve_fields() {
        let favorite = FavoriteCoupon::saved_at("c1", "Latte 2x1", "2x1", 42);
        let (id, record) = favorite.clone().into_parts();

        assert_eq!(id, "c1");
        assert_eq!(record.saved_at, 42);
        assert_eq!(FavoriteCoupon::from_parts(id, record), favorite);
    }

    #[test]
    fn test_record_bincode_encoding() {
        let record = FavoriteRecord {
            title: "Latte 2x1".to_string(),
            discount_text: "2x1".to_string(),
            saved_at: 1733788800000,
        };

        let config = bincode::config::standard();
        let bytes = bincode::serde::encode_to_vec(&record, config).unwrap();
        let (decoded, _): (FavoriteRecord, _) =
            bincode::serde::decode_from_slice(&bytes, config).unwrap();

        assert_eq!(decoded, record);
    }

    #[test]
    fn test_sort_newest_first_breaks_ties_by_id() {
        let mut favorites = vec![
            FavoriteCoupon::saved_at("b", "B", "10%", 100),
            FavoriteCoupon::saved_at("c", "C", "10%", 300),
            FavoriteCoupon::saved_at("a", "A", "10%", 100),
        ];
        sort_newest_first(&mut favorites);

        let ids: Vec<_> = favorites.iter().map(|f| f.id.as_str()).collect();
        assert_eq!(ids, vec!["c", "a", "b"]);
    }
}
