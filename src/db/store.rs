//! Local store for saved coupons and filter click counters.
//!
//! Every operation runs as a single redb transaction on the blocking pool.
//! Writes refresh the live queries of the table they touched once committed.

use std::sync::Arc;

use redb::{ReadTransaction, ReadableTable};

use crate::constants::ERR_CLICK_COUNT_DECREASE;
use crate::db::watch::{Listeners, Subscription, Table};
use crate::db::{tables, Db, BINCODE_CONFIG};
use crate::error::{AppError, Result};
use crate::models::favorite::sort_newest_first;
use crate::models::filter::top_by_clicks;
use crate::models::{FavoriteCoupon, FavoriteRecord, FilterClickCounter};

/// Handle to the local store, cheap to clone and share
#[derive(Clone)]
pub struct LocalStore {
    db: Db,
    listeners: Arc<Listeners>,
}

impl LocalStore {
    pub fn new(db: Db) -> Self {
        Self {
            db,
            listeners: Arc::new(Listeners::new()),
        }
    }

    /// Number of live queries currently watching `table`
    pub fn listener_count(&self, table: Table) -> usize {
        self.listeners.count(table)
    }

    // =========================================================================
    // Favorites
    // =========================================================================

    /// All favorites, newest first, re-emitted on every favorites change
    pub async fn observe_favorites(&self) -> Result<Subscription<Vec<FavoriteCoupon>>> {
        let db = self.db.clone();
        let listeners = self.listeners.clone();

        tokio::task::spawn_blocking(move || {
            listeners.register(&db, Table::Favorites, read_favorites)
        })
        .await?
    }

    /// Whether `id` is saved, re-emitted on every favorites change
    pub async fn is_favorite(&self, id: &str) -> Result<Subscription<bool>> {
        FavoriteCoupon::validate_id(id)?;

        let db = self.db.clone();
        let listeners = self.listeners.clone();
        let id = id.to_string();

        tokio::task::spawn_blocking(move || {
            listeners.register(&db, Table::Favorites, move |txn| favorite_exists(txn, &id))
        })
        .await?
    }

    /// Insert a favorite, replacing any existing row with the same id
    pub async fn upsert_favorite(&self, favorite: FavoriteCoupon) -> Result<()> {
        FavoriteCoupon::validate_id(&favorite.id)?;

        let db = self.db.clone();
        let listeners = self.listeners.clone();

        tokio::task::spawn_blocking(move || -> Result<()> {
            let (id, record) = favorite.into_parts();
            let bytes = bincode::serde::encode_to_vec(&record, BINCODE_CONFIG)?;

            let write_txn = db.begin_write()?;
            let replaced = {
                let mut favorites = write_txn.open_table(tables::FAVORITES)?;
                let previous = favorites.insert(id.as_str(), bytes.as_slice())?;
                previous.is_some()
            };
            write_txn.commit()?;

            tracing::debug!("Saved favorite {} (replaced: {})", id, replaced);
            listeners.notify(&db, Table::Favorites);

            Ok(())
        })
        .await?
    }

    /// Delete a favorite. Returns whether a row was removed; absent ids are not an error.
    pub async fn delete_favorite(&self, id: &str) -> Result<bool> {
        FavoriteCoupon::validate_id(id)?;

        let db = self.db.clone();
        let listeners = self.listeners.clone();
        let id = id.to_string();

        tokio::task::spawn_blocking(move || -> Result<bool> {
            let write_txn = db.begin_write()?;
            let removed = {
                let mut favorites = write_txn.open_table(tables::FAVORITES)?;
                let previous = favorites.remove(id.as_str())?;
                previous.is_some()
            };

            if !removed {
                write_txn.abort()?;
                tracing::debug!("Favorite {} not present, nothing to delete", id);
                return Ok(false);
            }

            write_txn.commit()?;
            tracing::debug!("Deleted favorite {}", id);
            listeners.notify(&db, Table::Favorites);

            Ok(true)
        })
        .await?
    }

    // =========================================================================
    // Filter click counters
    // =========================================================================

    /// The `limit` most-clicked categories, re-emitted on every counter change
    pub async fn observe_top_filter_counters(
        &self,
        limit: usize,
    ) -> Result<Subscription<Vec<FilterClickCounter>>> {
        let db = self.db.clone();
        let listeners = self.listeners.clone();

        tokio::task::spawn_blocking(move || {
            listeners.register(&db, Table::FilterClicks, move |txn| {
                Ok(top_by_clicks(read_counters(txn)?, limit))
            })
        })
        .await?
    }

    /// Click count for `category`, or `None` if it was never clicked
    pub async fn get_click_count(&self, category: &str) -> Result<Option<u64>> {
        FilterClickCounter::validate_category(category)?;

        let db = self.db.clone();
        let category = category.to_string();

        tokio::task::spawn_blocking(move || -> Result<Option<u64>> {
            let read_txn = db.begin_read()?;
            let counters = read_txn.open_table(tables::FILTER_CLICKS)?;
            let count = counters.get(category.as_str())?.map(|c| c.value());
            Ok(count)
        })
        .await?
    }

    /// Insert a counter, replacing any existing row for the same category
    ///
    /// Counts never go down: a count below the stored one is rejected with
    /// `InvalidInput` and the row is left untouched.
    pub async fn upsert_filter_counter(&self, counter: FilterClickCounter) -> Result<()> {
        FilterClickCounter::validate_category(&counter.category)?;

        let db = self.db.clone();
        let listeners = self.listeners.clone();

        tokio::task::spawn_blocking(move || -> Result<()> {
            let write_txn = db.begin_write()?;
            // Some(stored) when the new count would lower the stored one
            let rejected = {
                let mut counters = write_txn.open_table(tables::FILTER_CLICKS)?;
                let stored = counters.get(counter.category.as_str())?.map(|c| c.value());
                match stored {
                    Some(stored) if counter.click_count < stored => Some(stored),
                    _ => {
                        counters.insert(counter.category.as_str(), counter.click_count)?;
                        None
                    }
                }
            };

            if let Some(stored) = rejected {
                write_txn.abort()?;
                tracing::warn!(
                    "Refusing to lower click count for {} from {} to {}",
                    counter.category,
                    stored,
                    counter.click_count
                );
                return Err(AppError::InvalidInput(format!(
                    "{} ({} has {} clicks)",
                    ERR_CLICK_COUNT_DECREASE, counter.category, stored
                )));
            }

            write_txn.commit()?;

            tracing::debug!(
                "Set click count for {} to {}",
                counter.category,
                counter.click_count
            );
            listeners.notify(&db, Table::FilterClicks);

            Ok(())
        })
        .await?
    }

    /// Add one click to an existing counter
    ///
    /// Returns the number of rows updated: 1 on success, 0 when the category has
    /// no counter yet and the caller has to create one.
    pub async fn increment_click_count(&self, category: &str) -> Result<usize> {
        FilterClickCounter::validate_category(category)?;

        let db = self.db.clone();
        let listeners = self.listeners.clone();
        let category = category.to_string();

        tokio::task::spawn_blocking(move || -> Result<usize> {
            let write_txn = db.begin_write()?;
            let updated = {
                let mut counters = write_txn.open_table(tables::FILTER_CLICKS)?;
                let current = counters.get(category.as_str())?.map(|c| c.value());
                match current {
                    Some(count) => {
                        counters.insert(category.as_str(), count.saturating_add(1))?;
                        1
                    }
                    None => 0,
                }
            };

            if updated == 0 {
                write_txn.abort()?;
                return Ok(0);
            }

            write_txn.commit()?;
            tracing::debug!("Incremented click count for {}", category);
            listeners.notify(&db, Table::FilterClicks);

            Ok(updated)
        })
        .await?
    }

    /// Create a counter at 1, or add one click if another writer created it first
    ///
    /// Returns the resulting count. Used as the fallback after
    /// [`increment_click_count`](Self::increment_click_count) reports no row, so
    /// racing first clicks on a new category are all counted.
    pub async fn insert_click_count(&self, category: &str) -> Result<u64> {
        FilterClickCounter::validate_category(category)?;

        let db = self.db.clone();
        let listeners = self.listeners.clone();
        let category = category.to_string();

        tokio::task::spawn_blocking(move || -> Result<u64> {
            let write_txn = db.begin_write()?;
            let count = {
                let mut counters = write_txn.open_table(tables::FILTER_CLICKS)?;
                let current = counters.get(category.as_str())?.map(|c| c.value());
                let next = current.map_or(1, |count| count.saturating_add(1));
                counters.insert(category.as_str(), next)?;
                next
            };
            write_txn.commit()?;

            tracing::debug!("Click count for {} is now {}", category, count);
            listeners.notify(&db, Table::FilterClicks);

            Ok(count)
        })
        .await?
    }

    // =========================================================================
    // Maintenance
    // =========================================================================

    /// Drop and recreate both tables
    ///
    /// The store is a disposable cache, so this doubles as the schema migration path.
    pub async fn clear(&self) -> Result<()> {
        let db = self.db.clone();
        let listeners = self.listeners.clone();

        tokio::task::spawn_blocking(move || -> Result<()> {
            let write_txn = db.begin_write()?;
            write_txn.delete_table(tables::FAVORITES)?;
            write_txn.delete_table(tables::FILTER_CLICKS)?;
            // Recreated before commit so readers never see the tables missing
            {
                let _ = write_txn.open_table(tables::FAVORITES)?;
                let _ = write_txn.open_table(tables::FILTER_CLICKS)?;
            }
            write_txn.commit()?;

            tracing::info!("Local store cleared");
            listeners.notify(&db, Table::Favorites);
            listeners.notify(&db, Table::FilterClicks);

            Ok(())
        })
        .await?
    }
}

fn read_favorites(txn: &ReadTransaction) -> Result<Vec<FavoriteCoupon>> {
    let table = txn.open_table(tables::FAVORITES)?;

    let mut favorites = Vec::new();
    for entry in table.iter()? {
        let (id, bytes) = entry?;
        let (record, _): (FavoriteRecord, _) =
            bincode::serde::decode_from_slice(bytes.value(), BINCODE_CONFIG)?;
        favorites.push(FavoriteCoupon::from_parts(id.value(), record));
    }

    sort_newest_first(&mut favorites);
    Ok(favorites)
}

fn favorite_exists(txn: &ReadTransaction, id: &str) -> Result<bool> {
    let table = txn.open_table(tables::FAVORITES)?;
    let exists = table.get(id)?.is_some();
    Ok(exists)
}

fn read_counters(txn: &ReadTransaction) -> Result<Vec<FilterClickCounter>> {
    let table = txn.open_table(tables::FILTER_CLICKS)?;

    let mut counters = Vec::new();
    for entry in table.iter()? {
        let (category, count) = entry?;
        counters.push(FilterClickCounter::new(category.value(), count.value()));
    }
    Ok(counters)
}
