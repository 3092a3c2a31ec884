//! Collection store: lazy loading, memoization, single-flight coalescing

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use futures::future::{BoxFuture, FutureExt, Shared};
use tokio::sync::Mutex;
use tracing::{info, warn};

use crate::domain::collection::{CollectionHandle, CollectionLoader, CollectionStatus};
use crate::domain::DomainError;

type SharedLoad = Shared<BoxFuture<'static, Result<Arc<CollectionHandle>, DomainError>>>;

enum Entry {
    Loaded(Arc<CollectionHandle>),
    Loading(SharedLoad),
}

/// Lazily loads and memoizes per-collection index handles.
///
/// Concurrent first-calls for the same name share one underlying load; all
/// callers receive the same handle or the same error. A failed load is not
/// memoized, so a later call may retry.
pub struct CollectionStore {
    loader: Arc<dyn CollectionLoader>,
    entries: Mutex<HashMap<String, Entry>>,
    statuses: std::sync::Mutex<BTreeMap<String, CollectionStatus>>,
}

impl std::fmt::Debug for CollectionStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CollectionStore")
            .field("loader", &self.loader)
            .finish()
    }
}

impl CollectionStore {
    pub fn new(loader: Arc<dyn CollectionLoader>) -> Self {
        Self {
            loader,
            entries: Mutex::new(HashMap::new()),
            statuses: std::sync::Mutex::new(BTreeMap::new()),
        }
    }

    /// Returns the memoized handle for `name`, loading it on first use.
    pub async fn get_or_load(&self, name: &str) -> Result<Arc<CollectionHandle>, DomainError> {
        let load = {
            let mut entries = self.entries.lock().await;

            match entries.get(name) {
                Some(Entry::Loaded(handle)) => return Ok(handle.clone()),
                Some(Entry::Loading(load)) => load.clone(),
                None => {
                    let loader = self.loader.clone();
                    let owned = name.to_string();
                    let load: SharedLoad = async move {
                        loader.load(&owned).await.map(Arc::new)
                    }
                    .boxed()
                    .shared();

                    entries.insert(name.to_string(), Entry::Loading(load.clone()));
                    load
                }
            }
        };

        let result = load.clone().await;
        self.publish(name, &load, &result).await;
        result
    }

    /// Records the outcome of a shared load. Success memoizes the handle;
    /// failure clears the slot so the next call retries, but only if the
    /// slot still holds the load we awaited.
    async fn publish(
        &self,
        name: &str,
        load: &SharedLoad,
        result: &Result<Arc<CollectionHandle>, DomainError>,
    ) {
        let mut entries = self.entries.lock().await;

        match result {
            Ok(handle) => {
                entries.insert(name.to_string(), Entry::Loaded(handle.clone()));
                self.set_status(name, CollectionStatus::Loaded);
                info!(collection = name, documents = handle.index.len(), "Collection loaded");
            }
            Err(e) => {
                if let Some(Entry::Loading(current)) = entries.get(name) {
                    if current.ptr_eq(load) {
                        entries.remove(name);
                    }
                }
                self.set_status(name, CollectionStatus::Failed);
                warn!(collection = name, error = %e, "Collection load failed");
            }
        }
    }

    fn set_status(&self, name: &str, status: CollectionStatus) {
        self.statuses
            .lock()
            .expect("status lock poisoned")
            .insert(name.to_string(), status);
    }

    /// Names of collections currently loaded
    pub async fn loaded_collections(&self) -> Vec<String> {
        let entries = self.entries.lock().await;
        let mut names: Vec<String> = entries
            .iter()
            .filter(|(_, entry)| matches!(entry, Entry::Loaded(_)))
            .map(|(name, _)| name.clone())
            .collect();
        names.sort();
        names
    }

    /// Per-collection load status, including past failures
    pub fn statuses(&self) -> BTreeMap<String, CollectionStatus> {
        self.statuses.lock().expect("status lock poisoned").clone()
    }
}
