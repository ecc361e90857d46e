//! Deduplicating request cache.
//!
//! Concurrent callers asking for the same key before the first call settles
//! share that call and its result. Each entry carries a generation id so the
//! settling call removes exactly its own entry, never a newer one started
//! after it.

use std::collections::HashMap;
use std::future::Future;
use std::hash::Hash;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use futures_util::FutureExt;
use futures_util::future::{BoxFuture, Shared};
use tokio::runtime::Handle;

use crate::ApiError;

type SharedCall<V> = Shared<BoxFuture<'static, Result<V, ApiError>>>;

struct Pending<V> {
    generation: u64,
    call: SharedCall<V>,
}

type Entries<K, V> = Arc<Mutex<HashMap<K, Pending<V>>>>;

/// Outstanding calls keyed by request key.
///
/// Instances are independent: two caches built separately never share
/// entries, which keeps tests isolated. Clone an instance to share it.
pub struct InFlight<K, V> {
    entries: Entries<K, V>,
    generations: Arc<AtomicU64>,
}

impl<K, V> Clone for InFlight<K, V> {
    fn clone(&self) -> Self {
        Self {
            entries: Arc::clone(&self.entries),
            generations: Arc::clone(&self.generations),
        }
    }
}

impl<K, V> Default for InFlight<K, V> {
    fn default() -> Self {
        Self {
            entries: Arc::new(Mutex::new(HashMap::new())),
            generations: Arc::new(AtomicU64::new(0)),
        }
    }
}

impl<K, V> std::fmt::Debug for InFlight<K, V> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InFlight")
            .field("pending", &lock(&self.entries).len())
            .finish()
    }
}

impl<K, V> InFlight<K, V>
where
    K: Eq + Hash + Clone + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
{
    /// Empty guard.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether a call for `key` is outstanding.
    #[must_use]
    pub fn is_pending(&self, key: &K) -> bool {
        lock(&self.entries).contains_key(key)
    }

    /// Number of outstanding calls.
    #[must_use]
    pub fn len(&self) -> usize {
        lock(&self.entries).len()
    }

    /// Whether nothing is outstanding.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Join the outstanding call for `key`, or start one with `start`.
    ///
    /// `start` runs only when nothing is outstanding. When a Tokio runtime is
    /// available the call is also driven by a spawned task, so it runs to
    /// completion and releases its entry even if every caller goes away.
    ///
    /// # Errors
    ///
    /// Returns the shared call's [`ApiError`].
    pub async fn run<F, Fut>(&self, key: K, start: F) -> Result<V, ApiError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<V, ApiError>> + Send + 'static,
    {
        let call = {
            let mut entries = lock(&self.entries);
            match entries.get(&key) {
                Some(pending) => pending.call.clone(),
                None => {
                    let generation = self.generations.fetch_add(1, Ordering::Relaxed);
                    let call = settle_then_release(
                        Arc::clone(&self.entries),
                        key.clone(),
                        generation,
                        start(),
                    );
                    entries.insert(
                        key,
                        Pending {
                            generation,
                            call: call.clone(),
                        },
                    );
                    if let Ok(runtime) = Handle::try_current() {
                        runtime.spawn(call.clone().map(drop));
                    }
                    call
                }
            }
        };
        call.await
    }

    /// Forget every outstanding call.
    ///
    /// Detached calls still run to completion and their existing callers
    /// still receive the result, but later callers start fresh calls.
    pub(crate) fn detach_all(&self) {
        lock(&self.entries).clear();
    }
}

fn settle_then_release<K, V, Fut>(
    entries: Entries<K, V>,
    key: K,
    generation: u64,
    work: Fut,
) -> SharedCall<V>
where
    K: Eq + Hash + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
    Fut: Future<Output = Result<V, ApiError>> + Send + 'static,
{
    async move {
        let outcome = work.await;
        let mut guard = lock(&entries);
        if guard
            .get(&key)
            .is_some_and(|pending| pending.generation == generation)
        {
            guard.remove(&key);
        }
        outcome
    }
    .boxed()
    .shared()
}

fn lock<K, V>(entries: &Entries<K, V>) -> MutexGuard<'_, HashMap<K, Pending<V>>> {
    entries.lock().unwrap_or_else(PoisonError::into_inner)
}
