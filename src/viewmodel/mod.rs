//! Presentation state holders.
//!
//! A view-model subscribes to repository streams on a background task and
//! republishes them as a `watch` channel the UI can observe. User intents are
//! forwarded to the repositories; failures land in the state's `error` field.

pub mod favorites;
pub mod filters;

pub use favorites::{FavoritesState, FavoritesViewModel};
pub use filters::{FilterState, FilterViewModel};
