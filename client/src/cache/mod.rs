//! Reactive, deduplicating caches built on the dispatcher.
//!
//! Each business domain owns one cache module. A module holds its primary
//! store, answers derived views by recomputing them from that store on every
//! read, and funnels network access through [`crate::Dispatcher`] behind an
//! [`InFlight`] guard. Cross-domain effects go through narrow handles
//! ([`AssignmentIntake`], [`ConversationEviction`]) rather than through the
//! sibling's store.

use std::sync::Arc;

use crate::domain::models::Entity;
use crate::domain::Operation;
use crate::{ApiError, Dispatcher};

mod applications;
mod assignments;
mod categories;
mod conversations;
mod in_flight;
mod jobs;
mod profiles;
mod store;
mod throttle;

pub use applications::ApplicationsCache;
pub use assignments::{AssignmentIntake, AssignmentsCache};
pub use categories::CategoriesCache;
pub use conversations::{ConversationEviction, ConversationsCache};
pub use in_flight::InFlight;
pub use jobs::JobsCache;
pub use profiles::ProfilesCache;
pub use store::{DomainStore, KeyedStore};
pub use throttle::RefreshThrottle;

/// Guard key for unparameterised collection fetches.
const COLLECTION_KEY: &str = "collection";

type CollectionGuard<T> = InFlight<&'static str, Arc<Vec<T>>>;

/// Serve `store` or refresh it through `O`, sharing any outstanding call.
///
/// The store is written inside the shared call so it is updated exactly once
/// per settled request, whoever is still waiting on it. A reset while the
/// call is outstanding discards its write.
async fn fetch_collection<O, T>(
    dispatcher: &Dispatcher,
    store: &DomainStore<T>,
    guard: &CollectionGuard<T>,
    input: O::Input,
    force: bool,
) -> Result<Arc<Vec<T>>, ApiError>
where
    O: Operation<Output = Vec<T>>,
    T: Entity,
{
    if !force && store.is_loaded() && !guard.is_pending(&COLLECTION_KEY) {
        return Ok(store.snapshot());
    }
    let dispatcher = dispatcher.clone();
    let store = store.clone();
    guard
        .run(COLLECTION_KEY, move || {
            let epoch = store.epoch();
            async move {
                let items = dispatcher.call::<O>(input).await?;
                Ok(store.replace_at(epoch, items))
            }
        })
        .await
}
