use std::sync::Arc;

use futures_util::StreamExt;
use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::error::Result;
use crate::repository::FilterRepository;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterState {
    /// Most-clicked categories, highest first
    pub top_categories: Vec<String>,
    pub error: Option<String>,
}

pub struct FilterViewModel {
    repository: FilterRepository,
    state: Arc<watch::Sender<FilterState>>,
    observer: JoinHandle<()>,
}

impl FilterViewModel {
    /// Start observing the top categories
    pub async fn new(repository: FilterRepository) -> Result<Self> {
        let (state, _) = watch::channel(FilterState::default());
        let state = Arc::new(state);

        let mut top = repository.observe_top_three().await?;
        let publisher = state.clone();
        let observer = tokio::spawn(async move {
            while let Some(emission) = top.next().await {
                match emission {
                    Ok(categories) => publisher.send_modify(|s| s.top_categories = categories),
                    Err(e) => {
                        tracing::warn!("Top categories stream failed: {}", e);
                        let message = e.to_string();
                        publisher.send_modify(|s| s.error = Some(message));
                    }
                }
            }
        });

        Ok(Self {
            repository,
            state,
            observer,
        })
    }

    pub fn state(&self) -> watch::Receiver<FilterState> {
        self.state.subscribe()
    }

    pub fn current(&self) -> FilterState {
        self.state.borrow().clone()
    }

    pub async fn on_filter_click(&self, category: &str) -> Result<()> {
        let result = self.repository.increment_filter_click(category).await;
        match &result {
            Ok(()) => {
                self.state.send_if_modified(|s| s.error.take().is_some());
            }
            Err(e) => {
                tracing::warn!("Recording click on {} failed: {}", category, e);
                let message = e.to_string();
                self.state.send_modify(|s| s.error = Some(message));
            }
        }
        result
    }
}

impl Drop for FilterViewModel {
    fn drop(&mut self) {
        self.observer.abort();
    }
}
