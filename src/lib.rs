//! Coupon Store Library
//!
//! Local persistence for saved coupons and category filter analytics, with
//! live queries feeding presentation state holders.

pub mod config;
pub mod constants;
pub mod db;
pub mod error;
pub mod models;
pub mod repository;
pub mod viewmodel;

pub use config::Config;
pub use db::{open_database, Db, LocalStore, Subscription, Table};
pub use error::{AppError, Result};
pub use repository::{FavoritesRepository, FilterRepository};

/// Application state wired together at startup
///
/// One store is opened and shared by reference with every repository.
#[derive(Clone)]
pub struct AppState {
    pub store: LocalStore,
    pub favorites: FavoritesRepository,
    pub filters: FilterRepository,
    pub config: Config,
}

impl AppState {
    /// Create a new AppState with the given database and configuration
    pub fn new(db: Db, config: Config) -> Self {
        let store = LocalStore::new(db);
        Self {
            favorites: FavoritesRepository::new(store.clone()),
            filters: FilterRepository::new(store.clone()),
            store,
            config,
        }
    }

    /// Open the configured database and build the application state
    pub fn open(config: Config) -> Result<Self> {
        let db = open_database(&config.database_path)?;
        tracing::info!("Environment: {}", config.environment);
        Ok(Self::new(db, config))
    }
}
