/// Default on-disk location of the local store
pub const DEFAULT_DATABASE_PATH: &str = "./data/coupons.redb";

/// Number of most-clicked categories surfaced as quick filters
pub const DEFAULT_TOP_FILTER_LIMIT: usize = 3;

// =============================================================================
// Favorites placeholders
// =============================================================================
// A saved favorite only keeps id, title and discount label. The rest of the
// coupon is filled with these values until the catalog entry is joined in.

pub const PLACEHOLDER_DESCRIPTION: &str = "";

pub const PLACEHOLDER_IMAGE_URL: &str = "";

pub const PLACEHOLDER_MERCHANT_ID: &str = "";

pub const PLACEHOLDER_MERCHANT_NAME: &str = "";

pub const PLACEHOLDER_MERCHANT_LOGO_URL: &str = "";

pub const PLACEHOLDER_MERCHANT_CATEGORY: &str = "";

// =============================================================================
// Error Messages
// =============================================================================

/// Error message for a blank coupon identifier
pub const ERR_EMPTY_COUPON_ID: &str = "Coupon id must not be empty";

/// Error message for a blank filter category
pub const ERR_EMPTY_CATEGORY: &str = "Filter category must not be empty";

/// Error message for an attempt to lower a click counter
pub const ERR_CLICK_COUNT_DECREASE: &str = "Click counts can only increase";
