//! Reactive stores backing the domain caches.
//!
//! Each store wraps a `tokio::sync::watch` sender holding an immutable
//! snapshot. Readers clone the `Arc` or subscribe for change notifications;
//! only the owning cache module calls the `pub(crate)` mutators.
//!
//! Every store also carries an epoch that `reset` bumps. Writes that follow
//! a network call capture the epoch before the call and land only if no
//! reset happened meanwhile, so a response arriving after logout never
//! repopulates a cleared store.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use tokio::sync::watch;

use crate::domain::models::Entity;

/// Ordered collection of one entity type.
#[derive(Debug)]
pub struct DomainStore<T> {
    sender: Arc<watch::Sender<Arc<Vec<T>>>>,
    loaded: Arc<AtomicBool>,
    epoch: Arc<AtomicU64>,
}

impl<T> Clone for DomainStore<T> {
    fn clone(&self) -> Self {
        Self {
            sender: Arc::clone(&self.sender),
            loaded: Arc::clone(&self.loaded),
            epoch: Arc::clone(&self.epoch),
        }
    }
}

impl<T: Entity> Default for DomainStore<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Entity> DomainStore<T> {
    /// Empty, not-yet-loaded store.
    #[must_use]
    pub fn new() -> Self {
        let (sender, _) = watch::channel(Arc::new(Vec::new()));
        Self {
            sender: Arc::new(sender),
            loaded: Arc::new(AtomicBool::new(false)),
            epoch: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Current contents.
    #[must_use]
    pub fn snapshot(&self) -> Arc<Vec<T>> {
        Arc::clone(&self.sender.borrow())
    }

    /// Receiver notified after every change.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<Arc<Vec<T>>> {
        self.sender.subscribe()
    }

    /// Entity with identifier `id`.
    #[must_use]
    pub fn get(&self, id: &str) -> Option<T> {
        self.sender.borrow().iter().find(|item| item.id() == id).cloned()
    }

    /// Whether a full fetch has completed at least once.
    #[must_use]
    pub fn is_loaded(&self) -> bool {
        self.loaded.load(Ordering::Acquire)
    }

    pub(crate) fn epoch(&self) -> u64 {
        self.epoch.load(Ordering::Acquire)
    }

    /// Install the result of a fetch started at `epoch`.
    ///
    /// The fetched snapshot is returned whether or not it was stored.
    pub(crate) fn replace_at(&self, epoch: u64, items: Vec<T>) -> Arc<Vec<T>> {
        let snapshot = Arc::new(items);
        self.sender.send_if_modified(|current| {
            if self.epoch() != epoch {
                return false;
            }
            *current = Arc::clone(&snapshot);
            self.loaded.store(true, Ordering::Release);
            true
        });
        snapshot
    }

    /// Insert `item`, replacing any entity with the same identifier in place.
    pub(crate) fn upsert(&self, item: T) {
        self.sender
            .send_modify(|current| upsert_into(Arc::make_mut(current), item));
    }

    /// [`Self::upsert`] for a write started at `epoch`. Returns whether it
    /// landed.
    pub(crate) fn upsert_at(&self, epoch: u64, item: T) -> bool {
        self.sender.send_if_modified(|current| {
            if self.epoch() != epoch {
                return false;
            }
            upsert_into(Arc::make_mut(current), item);
            true
        })
    }

    /// Apply `change` to the entity with identifier `id`.
    pub(crate) fn update<F>(&self, id: &str, change: F) -> bool
    where
        F: FnOnce(&mut T),
    {
        self.sender.send_if_modified(|current| {
            let Some(position) = current.iter().position(|item| item.id() == id) else {
                return false;
            };
            let items = Arc::make_mut(current);
            if let Some(item) = items.get_mut(position) {
                change(item);
            }
            true
        })
    }

    pub(crate) fn remove(&self, id: &str) -> Option<T> {
        let mut removed = None;
        self.sender.send_if_modified(|current| {
            let Some(position) = current.iter().position(|item| item.id() == id) else {
                return false;
            };
            removed = Some(Arc::make_mut(current).remove(position));
            true
        });
        removed
    }

    pub(crate) fn reset(&self) {
        self.sender.send_modify(|current| {
            self.epoch.fetch_add(1, Ordering::AcqRel);
            self.loaded.store(false, Ordering::Release);
            *current = Arc::new(Vec::new());
        });
    }
}

fn upsert_into<T: Entity>(items: &mut Vec<T>, item: T) {
    match items.iter_mut().find(|existing| existing.id() == item.id()) {
        Some(existing) => *existing = item,
        None => items.push(item),
    }
}

/// Keyed mapping, e.g. profiles by username.
#[derive(Debug)]
pub struct KeyedStore<K, V> {
    sender: Arc<watch::Sender<Arc<BTreeMap<K, V>>>>,
    epoch: Arc<AtomicU64>,
}

impl<K, V> Clone for KeyedStore<K, V> {
    fn clone(&self) -> Self {
        Self {
            sender: Arc::clone(&self.sender),
            epoch: Arc::clone(&self.epoch),
        }
    }
}

impl<K: Ord + Clone, V: Clone> Default for KeyedStore<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: Ord + Clone, V: Clone> KeyedStore<K, V> {
    /// Empty store.
    #[must_use]
    pub fn new() -> Self {
        let (sender, _) = watch::channel(Arc::new(BTreeMap::new()));
        Self {
            sender: Arc::new(sender),
            epoch: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Current contents.
    #[must_use]
    pub fn snapshot(&self) -> Arc<BTreeMap<K, V>> {
        Arc::clone(&self.sender.borrow())
    }

    /// Receiver notified after every change.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<Arc<BTreeMap<K, V>>> {
        self.sender.subscribe()
    }

    /// Value stored under `key`.
    #[must_use]
    pub fn get<Q>(&self, key: &Q) -> Option<V>
    where
        K: std::borrow::Borrow<Q>,
        Q: Ord + ?Sized,
    {
        self.sender.borrow().get(key).cloned()
    }

    pub(crate) fn epoch(&self) -> u64 {
        self.epoch.load(Ordering::Acquire)
    }

    /// Store `value` for a write started at `epoch`. Returns whether it
    /// landed.
    pub(crate) fn insert_at(&self, epoch: u64, key: K, value: V) -> bool {
        self.sender.send_if_modified(|current| {
            if self.epoch() != epoch {
                return false;
            }
            Arc::make_mut(current).insert(key, value);
            true
        })
    }

    pub(crate) fn remove<Q>(&self, key: &Q) -> Option<V>
    where
        K: std::borrow::Borrow<Q>,
        Q: Ord + ?Sized,
    {
        let mut removed = None;
        self.sender.send_if_modified(|current| {
            if !current.contains_key(key) {
                return false;
            }
            removed = Arc::make_mut(current).remove(key);
            true
        });
        removed
    }

    pub(crate) fn reset(&self) {
        self.sender.send_modify(|current| {
            self.epoch.fetch_add(1, Ordering::AcqRel);
            *current = Arc::new(BTreeMap::new());
        });
    }
}
