pub mod store;
pub mod tables;
pub mod watch;

use redb::Database;
use std::path::Path;
use std::sync::Arc;

use crate::error::Result;

pub use store::LocalStore;
pub use watch::{Subscription, Table};

/// Database handle type (Arc-wrapped for sharing across repositories)
pub type Db = Arc<Database>;

/// Encoding used for every serialized table value
pub(crate) const BINCODE_CONFIG: bincode::config::Configuration = bincode::config::standard();

/// Open or create the redb database at the given path
///
/// Creates all required tables on first run.
pub fn open_database(path: impl AsRef<Path>) -> Result<Db> {
    let path = path.as_ref();
    tracing::info!("Opening database at: {:?}", path);

    // Create parent directory if it doesn't exist
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            std::fs::create_dir_all(parent).map_err(|e| {
                tracing::error!("Failed to create database directory: {}", e);
                e
            })?;
        }
    }

    let db = Database::create(path)?;
    create_tables(&db)?;

    tracing::info!("Database initialized successfully");

    Ok(Arc::new(db))
}

/// Create tables if they don't exist by opening them
pub(crate) fn create_tables(db: &Database) -> Result<()> {
    let write_txn = db.begin_write()?;
    {
        let _ = write_txn.open_table(tables::FAVORITES)?;
        let _ = write_txn.open_table(tables::FILTER_CLICKS)?;
    }
    write_txn.commit()?;
    Ok(())
}
