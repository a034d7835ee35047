use futures_util::stream::Map;
use futures_util::StreamExt;

use crate::constants::DEFAULT_TOP_FILTER_LIMIT;
use crate::db::{LocalStore, Subscription};
use crate::error::Result;
use crate::models::FilterClickCounter;

/// Live list of category names, most clicked first
pub type CategoryStream = Map<
    Subscription<Vec<FilterClickCounter>>,
    fn(Result<Vec<FilterClickCounter>>) -> Result<Vec<String>>,
>;

/// Category filter click analytics
#[derive(Clone)]
pub struct FilterRepository {
    store: LocalStore,
}

impl FilterRepository {
    pub fn new(store: LocalStore) -> Self {
        Self { store }
    }

    /// The three most-clicked categories
    pub async fn observe_top_three(&self) -> Result<CategoryStream> {
        self.observe_top(DEFAULT_TOP_FILTER_LIMIT).await
    }

    /// The `limit` most-clicked categories
    pub async fn observe_top(&self, limit: usize) -> Result<CategoryStream> {
        let counters = self.store.observe_top_filter_counters(limit).await?;
        Ok(counters.map(to_categories as fn(_) -> _))
    }

    /// Record one click on `category`
    ///
    /// Tries the in-place increment first; a category seen for the first time
    /// gets its counter created at 1. If another caller created it in between,
    /// the create step counts this click on top instead of overwriting.
    pub async fn increment_filter_click(&self, category: &str) -> Result<()> {
        if self.store.increment_click_count(category).await? == 0 {
            let count = self.store.insert_click_count(category).await?;
            tracing::debug!("First clicks on {} recorded (count {})", category, count);
        }
        Ok(())
    }

    pub async fn click_count(&self, category: &str) -> Result<Option<u64>> {
        self.store.get_click_count(category).await
    }
}

fn to_categories(counters: Result<Vec<FilterClickCounter>>) -> Result<Vec<String>> {
    counters.map(|counters| counters.into_iter().map(|c| c.category).collect())
}
