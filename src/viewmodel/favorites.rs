use std::sync::Arc;

use futures_util::StreamExt;
use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::db::Subscription;
use crate::error::Result;
use crate::models::{merge_with_catalog, Coupon};
use crate::repository::FavoritesRepository;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FavoritesState {
    pub favorites: Vec<Coupon>,
    /// True until the first list arrives from the store
    pub loading: bool,
    pub error: Option<String>,
}

impl Default for FavoritesState {
    fn default() -> Self {
        Self {
            favorites: Vec::new(),
            loading: true,
            error: None,
        }
    }
}

pub struct FavoritesViewModel {
    repository: FavoritesRepository,
    state: Arc<watch::Sender<FavoritesState>>,
    catalog: watch::Sender<Vec<Coupon>>,
    observer: JoinHandle<()>,
}

impl FavoritesViewModel {
    /// Start observing favorites
    pub async fn new(repository: FavoritesRepository) -> Result<Self> {
        let (state, _) = watch::channel(FavoritesState::default());
        let state = Arc::new(state);

        let (catalog, mut catalog_rx) = watch::channel(Vec::<Coupon>::new());

        let mut favorites = repository.observe().await?;
        let publisher = state.clone();
        let observer = tokio::spawn(async move {
            let mut saved: Option<Vec<Coupon>> = None;
            loop {
                tokio::select! {
                    emission = favorites.next() => match emission {
                        Some(Ok(coupons)) => saved = Some(coupons),
                        Some(Err(e)) => {
                            tracing::warn!("Favorites stream failed: {}", e);
                            let message = e.to_string();
                            publisher.send_modify(|s| {
                                s.error = Some(message);
                                s.loading = false;
                            });
                            continue;
                        }
                        None => break,
                    },
                    changed = catalog_rx.changed() => {
                        if changed.is_err() {
                            break;
                        }
                    }
                }

                let Some(coupons) = saved.clone() else {
                    continue;
                };
                let merged = merge_with_catalog(coupons, &catalog_rx.borrow_and_update());
                publisher.send_modify(|s| {
                    s.favorites = merged;
                    s.loading = false;
                });
            }
        });

        Ok(Self {
            repository,
            state,
            catalog,
            observer,
        })
    }

    /// Replace the catalog used to fill in saved coupons
    ///
    /// Saved coupons found in the catalog are shown with their full entry;
    /// the rest keep their placeholder fields.
    pub fn set_catalog(&self, catalog: Vec<Coupon>) {
        self.catalog.send_replace(catalog);
    }

    pub fn state(&self) -> watch::Receiver<FavoritesState> {
        self.state.subscribe()
    }

    /// Snapshot of the current state
    pub fn current(&self) -> FavoritesState {
        self.state.borrow().clone()
    }

    pub async fn is_favorite(&self, id: &str) -> Result<Subscription<bool>> {
        self.repository.is_favorite_flow(id).await
    }

    pub async fn add(&self, coupon: &Coupon) -> Result<()> {
        let result = self.repository.add(coupon).await;
        self.record(result)
    }

    pub async fn remove(&self, id: &str) -> Result<()> {
        let result = self.repository.remove(id).await;
        self.record(result)
    }

    /// Save the coupon if it isn't saved, unsave it otherwise
    ///
    /// Returns whether the coupon is saved afterwards.
    pub async fn toggle_favorite(&self, coupon: &Coupon) -> Result<bool> {
        let result = self.toggle(coupon).await;
        self.record(result)
    }

    async fn toggle(&self, coupon: &Coupon) -> Result<bool> {
        let mut saved = self.repository.is_favorite_flow(&coupon.id).await?;
        if saved.recv().await.transpose()?.unwrap_or(false) {
            self.repository.remove(&coupon.id).await?;
            Ok(false)
        } else {
            self.repository.add(coupon).await?;
            Ok(true)
        }
    }

    fn record<T>(&self, result: Result<T>) -> Result<T> {
        match &result {
            Ok(_) => {
                self.state.send_if_modified(|s| s.error.take().is_some());
            }
            Err(e) => {
                tracing::warn!("Favorites action failed: {}", e);
                let message = e.to_string();
                self.state.send_modify(|s| s.error = Some(message));
            }
        }
        result
    }
}

impl Drop for FavoritesViewModel {
    fn drop(&mut self) {
        self.observer.abort();
    }
}
