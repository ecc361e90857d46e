//! Categories cache. Categories are public and rarely change, so they
//! survive logout.

use std::sync::Arc;

use bytes::Bytes;
use tokio::sync::watch;

use super::{CollectionGuard, DomainStore, fetch_collection};
use crate::domain::models::Category;
use crate::domain::operations::{CategoryRef, GetCategoryIcon, ListCategories};
use crate::{ApiError, Dispatcher};

/// Cached category list.
#[derive(Debug, Clone)]
pub struct CategoriesCache {
    dispatcher: Dispatcher,
    store: DomainStore<Category>,
    guard: CollectionGuard<Category>,
}

impl CategoriesCache {
    pub(crate) fn new(dispatcher: Dispatcher) -> Self {
        Self {
            dispatcher,
            store: DomainStore::new(),
            guard: CollectionGuard::new(),
        }
    }

    /// Every category, fetching on first use or when `force` is set.
    ///
    /// # Errors
    ///
    /// Returns the dispatcher's [`ApiError`].
    pub async fn fetch(&self, force: bool) -> Result<Arc<Vec<Category>>, ApiError> {
        fetch_collection::<ListCategories, _>(&self.dispatcher, &self.store, &self.guard, (), force)
            .await
    }

    /// Current snapshot without fetching.
    #[must_use]
    pub fn snapshot(&self) -> Arc<Vec<Category>> {
        self.store.snapshot()
    }

    /// Change notifications.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<Arc<Vec<Category>>> {
        self.store.subscribe()
    }

    /// Categories sorted by name, case-insensitively.
    #[must_use]
    pub fn alphabetical(&self) -> Vec<Category> {
        let mut categories = self.store.snapshot().as_ref().clone();
        categories.sort_by_key(|category| category.name.to_lowercase());
        categories
    }

    /// Raw bytes of a category icon.
    ///
    /// # Errors
    ///
    /// Returns the dispatcher's [`ApiError`].
    pub async fn icon(&self, category_id: &str) -> Result<Bytes, ApiError> {
        self.dispatcher
            .call::<GetCategoryIcon>(CategoryRef::new(category_id))
            .await
    }
}
