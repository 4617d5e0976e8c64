//! Process-wide cache of open logical databases.
//!
//! Concurrent callers asking for the same database share one initialization: the first
//! caller opens it, the others wait on the same cell and reuse the result. A failed
//! open leaves the cell empty so the next caller retries.

use super::handle::DatabaseHandle;
use crate::config::MolarConfig;
use crate::error::Result;
use dashmap::DashMap;
use std::future::Future;
use std::sync::Arc;
use tokio::sync::OnceCell;
use tracing::{debug, info};

#[derive(Debug)]
pub struct DatabaseRegistry<H = DatabaseHandle> {
    entries: DashMap<String, Arc<OnceCell<Arc<H>>>>,
}

impl<H> Default for DatabaseRegistry<H> {
    fn default() -> Self {
        Self {
            entries: DashMap::new(),
        }
    }
}

impl<H: Send + Sync> DatabaseRegistry<H> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the cached value for `name`, running `open` if nobody has initialized it yet
    pub async fn get_or_open_with<F, Fut>(&self, name: &str, open: F) -> Result<Arc<H>>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<H>>,
    {
        // Clone the cell out so no map shard lock is held across the await
        let cell = self
            .entries
            .entry(name.to_string())
            .or_insert_with(|| Arc::new(OnceCell::new()))
            .clone();

        let handle = cell
            .get_or_try_init(|| async {
                debug!(database = name, "Opening database");
                open().await.map(Arc::new)
            })
            .await?;
        Ok(Arc::clone(handle))
    }

    /// The cached value for `name`, if one is initialized
    pub fn get(&self, name: &str) -> Option<Arc<H>> {
        self.entries
            .get(name)
            .and_then(|cell| cell.get().cloned())
    }

    /// Forget `name`, returning its value if it was initialized
    pub fn remove(&self, name: &str) -> Option<Arc<H>> {
        self.entries
            .remove(name)
            .and_then(|(_, cell)| cell.get().cloned())
    }

    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .entries
            .iter()
            .filter(|entry| entry.value().initialized())
            .map(|entry| entry.key().clone())
            .collect();
        names.sort();
        names
    }

    pub fn len(&self) -> usize {
        self.entries
            .iter()
            .filter(|entry| entry.value().initialized())
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl DatabaseRegistry<DatabaseHandle> {
    /// Open (or reuse) the handle for `name`
    pub async fn get_or_open(
        &self,
        config: &Arc<MolarConfig>,
        name: &str,
    ) -> Result<Arc<DatabaseHandle>> {
        let config = Arc::clone(config);
        self.get_or_open_with(name, || async move { DatabaseHandle::open(config, name).await })
            .await
    }

    /// Remove `name` and close its pool
    pub async fn close(&self, name: &str) -> bool {
        match self.remove(name) {
            Some(handle) => {
                handle.close().await;
                info!(database = name, "Closed database");
                true
            }
            None => false,
        }
    }
}
