//! Assignments cache.

use std::sync::Arc;

use tokio::sync::watch;

use super::{CollectionGuard, DomainStore, fetch_collection};
use crate::domain::models::{Assignment, AssignmentStatus};
use crate::domain::operations::{AssignmentRef, CompleteAssignment, ListAssignments};
use crate::{ApiError, Dispatcher};

/// Narrow write access granted to sibling domains.
///
/// Accepting an application creates an assignment server-side; the
/// applications cache hands it over through this handle instead of
/// refetching the whole assignment list.
#[derive(Debug, Clone)]
pub struct AssignmentIntake {
    store: DomainStore<Assignment>,
}

impl AssignmentIntake {
    /// Insert or replace one assignment.
    pub fn insert_assignment(&self, assignment: Assignment) {
        self.store.upsert(assignment);
    }

    pub(crate) fn epoch(&self) -> u64 {
        self.store.epoch()
    }

    /// Insert an assignment returned by a call started at `epoch`.
    pub(crate) fn insert_assignment_at(&self, epoch: u64, assignment: Assignment) -> bool {
        self.store.upsert_at(epoch, assignment)
    }
}

/// Cached assignments with derived views.
#[derive(Debug, Clone)]
pub struct AssignmentsCache {
    dispatcher: Dispatcher,
    store: DomainStore<Assignment>,
    guard: CollectionGuard<Assignment>,
}

impl AssignmentsCache {
    pub(crate) fn new(dispatcher: Dispatcher) -> Self {
        Self {
            dispatcher,
            store: DomainStore::new(),
            guard: CollectionGuard::new(),
        }
    }

    /// Every assignment, fetching on first use or when `force` is set.
    ///
    /// # Errors
    ///
    /// Returns the dispatcher's [`ApiError`].
    pub async fn fetch(&self, force: bool) -> Result<Arc<Vec<Assignment>>, ApiError> {
        fetch_collection::<ListAssignments, _>(&self.dispatcher, &self.store, &self.guard, (), force)
            .await
    }

    /// Current snapshot without fetching.
    #[must_use]
    pub fn snapshot(&self) -> Arc<Vec<Assignment>> {
        self.store.snapshot()
    }

    /// Change notifications for the primary store.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<Arc<Vec<Assignment>>> {
        self.store.subscribe()
    }

    /// Assignments still in progress.
    #[must_use]
    pub fn active(&self) -> Vec<Assignment> {
        self.with_status(AssignmentStatus::Active)
    }

    /// Finished assignments.
    #[must_use]
    pub fn completed(&self) -> Vec<Assignment> {
        self.with_status(AssignmentStatus::Completed)
    }

    fn with_status(&self, status: AssignmentStatus) -> Vec<Assignment> {
        self.store
            .snapshot()
            .iter()
            .filter(|assignment| assignment.status == status)
            .cloned()
            .collect()
    }

    /// Mark an assignment done and store the server's copy.
    ///
    /// # Errors
    ///
    /// Returns the dispatcher's [`ApiError`].
    pub async fn complete(&self, assignment_id: &str) -> Result<Assignment, ApiError> {
        let epoch = self.store.epoch();
        let completed = self
            .dispatcher
            .call::<CompleteAssignment>(AssignmentRef::new(assignment_id))
            .await?;
        self.store.upsert_at(epoch, completed.clone());
        Ok(completed)
    }

    /// Insert or replace one assignment locally.
    pub fn insert_assignment(&self, assignment: Assignment) {
        self.store.upsert(assignment);
    }

    /// Drop an assignment locally.
    pub fn remove(&self, assignment_id: &str) -> Option<Assignment> {
        self.store.remove(assignment_id)
    }

    /// Handle sibling domains use to add assignments.
    #[must_use]
    pub fn intake(&self) -> AssignmentIntake {
        AssignmentIntake {
            store: self.store.clone(),
        }
    }

    pub(crate) fn reset(&self) {
        self.store.reset();
        self.guard.detach_all();
    }
}
