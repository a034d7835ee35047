//! Live query registry backing the store's observable reads.
//!
//! Each subscription registers a query against one logical table. After every
//! committed write to that table the query is re-run on a fresh read
//! transaction and its result handed to the subscriber. Only the newest result
//! is kept per subscriber, so an idle subscriber holds at most one snapshot.
//!
//! A failing query is delivered as `Err` and ends the subscription. Dropping
//! the [`Subscription`] removes the query from the registry.

use std::collections::HashMap;
use std::pin::Pin;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::task::{Context, Poll};

use futures_util::{Stream, StreamExt};
use parking_lot::Mutex;
use redb::{Database, ReadTransaction};
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;

use crate::error::{AppError, Result};

/// Logical table a live query depends on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Table {
    Favorites,
    FilterClicks,
}

/// Newest undelivered result of one live query
type Slot<T> = Arc<Mutex<Option<Result<T>>>>;

/// A registered live query, type-erased so one table can hold many result types
trait Refresh: Send {
    /// Re-run the query. Returns false once the listener should be dropped.
    fn refresh(&mut self, txn: &ReadTransaction) -> bool;

    /// Deliver a failure that prevented the query from running at all
    fn fail(&mut self, error: AppError);
}

struct Listener<T, Q> {
    id: u64,
    table: Table,
    query: Q,
    slot: Slot<T>,
    wake: mpsc::Sender<()>,
}

impl<T, Q> Listener<T, Q>
where
    T: Send,
{
    /// Overwrite the pending result and wake the subscriber. False if it's gone.
    fn publish(&self, value: Result<T>) -> bool {
        *self.slot.lock() = Some(value);
        match self.wake.try_send(()) {
            // A full channel means a wake-up is already pending
            Ok(()) | Err(TrySendError::Full(())) => true,
            Err(TrySendError::Closed(())) => false,
        }
    }
}

impl<T, Q> Refresh for Listener<T, Q>
where
    T: Send,
    Q: Fn(&ReadTransaction) -> Result<T> + Send,
{
    fn refresh(&mut self, txn: &ReadTransaction) -> bool {
        match (self.query)(txn) {
            Ok(value) => self.publish(Ok(value)),
            Err(e) => {
                tracing::warn!("Live query {} on {:?} failed: {}", self.id, self.table, e);
                self.publish(Err(e));
                false
            }
        }
    }

    fn fail(&mut self, error: AppError) {
        self.publish(Err(error));
    }
}

/// Active live queries, grouped by the table they watch
pub(crate) struct Listeners {
    next_id: AtomicU64,
    favorites: Mutex<HashMap<u64, Box<dyn Refresh>>>,
    filter_clicks: Mutex<HashMap<u64, Box<dyn Refresh>>>,
}

impl Listeners {
    pub(crate) fn new() -> Self {
        Self {
            next_id: AtomicU64::new(1),
            favorites: Mutex::new(HashMap::new()),
            filter_clicks: Mutex::new(HashMap::new()),
        }
    }

    fn slot(&self, table: Table) -> &Mutex<HashMap<u64, Box<dyn Refresh>>> {
        match table {
            Table::Favorites => &self.favorites,
            Table::FilterClicks => &self.filter_clicks,
        }
    }

    /// Register a live query and emit its current result
    ///
    /// Blocking: call from `spawn_blocking`.
    pub(crate) fn register<T, Q>(
        self: &Arc<Self>,
        db: &Database,
        table: Table,
        query: Q,
    ) -> Result<Subscription<T>>
    where
        T: Send + 'static,
        Q: Fn(&ReadTransaction) -> Result<T> + Send + 'static,
    {
        let (wake, wake_rx) = mpsc::channel(1);
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);

        // Hold the slot while taking the first snapshot so a concurrent
        // notification can't be delivered ahead of it.
        let mut listeners = self.slot(table).lock();
        let initial = query(&db.begin_read()?)?;

        let listener = Listener {
            id,
            table,
            query,
            slot: Arc::new(Mutex::new(None)),
            wake,
        };
        listener.publish(Ok(initial));
        let slot = listener.slot.clone();
        listeners.insert(id, Box::new(listener));
        drop(listeners);

        tracing::debug!("Registered live query {} on {:?}", id, table);

        Ok(Subscription {
            wake: wake_rx,
            slot,
            id,
            table,
            listeners: Arc::clone(self),
        })
    }

    /// Re-run every live query on `table` against the latest committed state
    ///
    /// Blocking: call from `spawn_blocking`, after the write has committed. If
    /// no read transaction can be opened, every subscriber on the table gets
    /// the error and is closed.
    pub(crate) fn notify(&self, db: &Database, table: Table) {
        let mut listeners = self.slot(table).lock();
        if listeners.is_empty() {
            return;
        }

        match db.begin_read() {
            Ok(txn) => {
                listeners.retain(|_, listener| listener.refresh(&txn));
                tracing::debug!("Refreshed {} live queries on {:?}", listeners.len(), table);
            }
            Err(e) => {
                tracing::error!("Could not refresh live queries on {:?}: {}", table, e);
                let message = e.to_string();
                for (_, mut listener) in listeners.drain() {
                    listener.fail(AppError::LiveQuery(message.clone()));
                }
            }
        }
    }

    fn remove(&self, table: Table, id: u64) {
        if self.slot(table).lock().remove(&id).is_some() {
            tracing::debug!("Released live query {} on {:?}", id, table);
        }
    }

    pub(crate) fn count(&self, table: Table) -> usize {
        self.slot(table).lock().len()
    }
}

/// Handle to a live query
///
/// Yields the current result first, then the newest result after changes to
/// the watched table; results the subscriber didn't pick up in time are
/// replaced by newer ones. A failed query yields one `Err` and then ends.
/// Dropping the handle releases the query.
pub struct Subscription<T> {
    wake: mpsc::Receiver<()>,
    slot: Slot<T>,
    id: u64,
    table: Table,
    listeners: Arc<Listeners>,
}

impl<T> Subscription<T> {
    /// Wait for the next emission
    pub async fn recv(&mut self) -> Option<Result<T>> {
        self.next().await
    }

    /// Take an emission that is already pending, without waiting
    pub fn try_recv(&mut self) -> Option<Result<T>> {
        match self.wake.try_recv() {
            Ok(()) => self.slot.lock().take(),
            Err(_) => None,
        }
    }
}

impl<T> Stream for Subscription<T> {
    type Item = Result<T>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Result<T>>> {
        loop {
            match self.wake.poll_recv(cx) {
                Poll::Ready(Some(())) => {
                    // Already taken alongside an earlier wake-up; wait for the next one
                    if let Some(value) = self.slot.lock().take() {
                        return Poll::Ready(Some(value));
                    }
                }
                Poll::Ready(None) => return Poll::Ready(self.slot.lock().take()),
                Poll::Pending => return Poll::Pending,
            }
        }
    }
}

impl<T> Drop for Subscription<T> {
    fn drop(&mut self) {
        self.listeners.remove(self.table, self.id);
    }
}

impl<T> std::fmt::Debug for Subscription<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("id", &self.id)
            .field("table", &self.table)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{create_tables, tables};
    use redb::backends::InMemoryBackend;
    use redb::ReadableTable;

    fn memory_db() -> Database {
        let db = Database::builder()
            .create_with_backend(InMemoryBackend::new())
            .unwrap();
        create_tables(&db).unwrap();
        db
    }

    fn click_total(txn: &ReadTransaction) -> Result<u64> {
        let table = txn.open_table(tables::FILTER_CLICKS)?;
        let mut total = 0;
        for entry in table.iter()? {
            let (_, count) = entry?;
            total += count.value();
        }
        Ok(total)
    }

    fn add_clicks(db: &Database, category: &str, count: u64) {
        let write_txn = db.begin_write().unwrap();
        {
            let mut table = write_txn.open_table(tables::FILTER_CLICKS).unwrap();
            table.insert(category, count).unwrap();
        }
        write_txn.commit().unwrap();
    }

    fn pending<T>(sub: &mut Subscription<T>) -> Option<T> {
        sub.try_recv().map(|r| r.unwrap())
    }

    #[test]
    fn test_register_emits_current_value() {
        let db = memory_db();
        add_clicks(&db, "Comida", 2);
        let listeners = Arc::new(Listeners::new());

        let mut sub = listeners
            .register(&db, Table::FilterClicks, click_total)
            .unwrap();

        assert_eq!(pending(&mut sub), Some(2));
        assert_eq!(pending(&mut sub), None);
    }

    #[test]
    fn test_notify_only_reaches_watched_table() {
        let db = memory_db();
        let listeners = Arc::new(Listeners::new());
        let mut sub = listeners
            .register(&db, Table::FilterClicks, click_total)
            .unwrap();
        assert_eq!(pending(&mut sub), Some(0));

        add_clicks(&db, "Salud", 5);
        listeners.notify(&db, Table::Favorites);
        assert_eq!(pending(&mut sub), None);

        listeners.notify(&db, Table::FilterClicks);
        assert_eq!(pending(&mut sub), Some(5));
    }

    #[test]
    fn test_drop_releases_listener() {
        let db = memory_db();
        let listeners = Arc::new(Listeners::new());

        let sub = listeners
            .register(&db, Table::Favorites, |_| Ok(()))
            .unwrap();
        assert_eq!(listeners.count(Table::Favorites), 1);

        drop(sub);
        assert_eq!(listeners.count(Table::Favorites), 0);
    }

    #[test]
    fn test_unread_results_collapse_to_newest() {
        let db = memory_db();
        let listeners = Arc::new(Listeners::new());
        let mut sub = listeners
            .register(&db, Table::FilterClicks, click_total)
            .unwrap();

        add_clicks(&db, "Comida", 1);
        listeners.notify(&db, Table::FilterClicks);
        add_clicks(&db, "Salud", 4);
        listeners.notify(&db, Table::FilterClicks);

        assert_eq!(pending(&mut sub), Some(5));
        assert_eq!(pending(&mut sub), None);
    }

    #[tokio::test]
    async fn test_failed_refresh_is_delivered_and_closes() {
        let db = memory_db();
        let listeners = Arc::new(Listeners::new());
        let mut sub = listeners
            .register(&db, Table::FilterClicks, |txn| {
                let total = click_total(txn)?;
                if total > 3 {
                    return Err(AppError::InvalidInput("too many".to_string()));
                }
                Ok(total)
            })
            .unwrap();
        assert_eq!(sub.recv().await.unwrap().unwrap(), 0);

        add_clicks(&db, "Comida", 9);
        listeners.notify(&db, Table::FilterClicks);

        assert!(matches!(sub.recv().await, Some(Err(AppError::InvalidInput(_)))));
        assert!(sub.recv().await.is_none());
        assert_eq!(listeners.count(Table::FilterClicks), 0);
    }

    #[tokio::test]
    async fn test_fail_reaches_subscriber() {
        let db = memory_db();
        let listeners = Arc::new(Listeners::new());
        let mut sub = listeners
            .register(&db, Table::Favorites, |_| Ok(1u8))
            .unwrap();
        assert_eq!(sub.recv().await.unwrap().unwrap(), 1);

        for (_, mut listener) in listeners.favorites.lock().drain() {
            listener.fail(AppError::LiveQuery("read failed".to_string()));
        }

        assert!(matches!(sub.recv().await, Some(Err(AppError::LiveQuery(_)))));
        assert!(sub.recv().await.is_none());
    }
}
