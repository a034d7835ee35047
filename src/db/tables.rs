use redb::TableDefinition;

/// Favorites table: coupon_id -> FavoriteRecord (serialized)
pub const FAVORITES: TableDefinition<&str, &[u8]> = TableDefinition::new("favorites");

/// Filter clicks table: category -> click count
pub const FILTER_CLICKS: TableDefinition<&str, u64> = TableDefinition::new("filter_clicks");
