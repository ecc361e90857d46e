//! Applications cache.
//!
//! Accepting and rejecting applications have effects in sibling domains:
//! acceptance yields an assignment, rejection closes the applicant's
//! conversation. Both are applied through the sibling's narrow handle.

use std::sync::Arc;

use tokio::sync::watch;
use tracing::debug;

use super::{AssignmentIntake, CollectionGuard, ConversationEviction, DomainStore, fetch_collection};
use crate::domain::models::{
    AcceptanceOutcome, Application, ApplicationStatus, RejectionOutcome,
};
use crate::domain::operations::{
    AcceptApplication, ApplicationRef, JobRef, ListJobApplications, ListMyApplications,
    NewApplication, RejectApplication, SubmitApplication, WithdrawApplication,
};
use crate::{ApiError, Dispatcher};

/// Cached applications with derived views.
#[derive(Debug, Clone)]
pub struct ApplicationsCache {
    dispatcher: Dispatcher,
    store: DomainStore<Application>,
    guard: CollectionGuard<Application>,
    assignments: AssignmentIntake,
    conversations: ConversationEviction,
}

impl ApplicationsCache {
    pub(crate) fn new(
        dispatcher: Dispatcher,
        assignments: AssignmentIntake,
        conversations: ConversationEviction,
    ) -> Self {
        Self {
            dispatcher,
            store: DomainStore::new(),
            guard: CollectionGuard::new(),
            assignments,
            conversations,
        }
    }

    /// The signed-in user's applications, fetching on first use or when
    /// `force` is set.
    ///
    /// # Errors
    ///
    /// Returns the dispatcher's [`ApiError`].
    pub async fn fetch(&self, force: bool) -> Result<Arc<Vec<Application>>, ApiError> {
        fetch_collection::<ListMyApplications, _>(
            &self.dispatcher,
            &self.store,
            &self.guard,
            (),
            force,
        )
        .await
    }

    /// Applications received for one job, merged into the store.
    ///
    /// # Errors
    ///
    /// Returns the dispatcher's [`ApiError`].
    pub async fn fetch_for_job(&self, job_id: &str) -> Result<Vec<Application>, ApiError> {
        let epoch = self.store.epoch();
        let received = self
            .dispatcher
            .call::<ListJobApplications>(JobRef::new(job_id))
            .await?;
        for application in &received {
            if !self.store.upsert_at(epoch, application.clone()) {
                break;
            }
        }
        Ok(received)
    }

    /// Current snapshot without fetching.
    #[must_use]
    pub fn snapshot(&self) -> Arc<Vec<Application>> {
        self.store.snapshot()
    }

    /// Change notifications for the primary store.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<Arc<Vec<Application>>> {
        self.store.subscribe()
    }

    /// Applications awaiting a decision.
    #[must_use]
    pub fn pending(&self) -> Vec<Application> {
        self.store
            .snapshot()
            .iter()
            .filter(|application| application.status == ApplicationStatus::Pending)
            .cloned()
            .collect()
    }

    /// Cached applications for one job.
    #[must_use]
    pub fn for_job(&self, job_id: &str) -> Vec<Application> {
        self.store
            .snapshot()
            .iter()
            .filter(|application| application.job_id == job_id)
            .cloned()
            .collect()
    }

    /// Apply to a job and add the application to the store.
    ///
    /// # Errors
    ///
    /// Returns the dispatcher's [`ApiError`].
    pub async fn submit(&self, application: NewApplication) -> Result<Application, ApiError> {
        let epoch = self.store.epoch();
        let submitted = self.dispatcher.call::<SubmitApplication>(application).await?;
        self.store.upsert_at(epoch, submitted.clone());
        Ok(submitted)
    }

    /// Withdraw an application and drop it from the store.
    ///
    /// # Errors
    ///
    /// Returns the dispatcher's [`ApiError`].
    pub async fn withdraw(&self, application_id: &str) -> Result<(), ApiError> {
        self.dispatcher
            .call::<WithdrawApplication>(ApplicationRef::new(application_id))
            .await?;
        self.store.remove(application_id);
        Ok(())
    }

    /// Accept an application and hand the new assignment to the
    /// assignments cache.
    ///
    /// # Errors
    ///
    /// Returns the dispatcher's [`ApiError`].
    pub async fn accept(&self, application_id: &str) -> Result<AcceptanceOutcome, ApiError> {
        let epoch = self.store.epoch();
        let intake_epoch = self.assignments.epoch();
        let outcome = self
            .dispatcher
            .call::<AcceptApplication>(ApplicationRef::new(application_id))
            .await?;
        self.store.upsert_at(epoch, outcome.application.clone());
        if let Some(assignment) = outcome.assignment.clone() {
            self.assignments.insert_assignment_at(intake_epoch, assignment);
        }
        Ok(outcome)
    }

    /// Reject an application and evict the conversation it opened.
    ///
    /// # Errors
    ///
    /// Returns the dispatcher's [`ApiError`].
    pub async fn reject(&self, application_id: &str) -> Result<RejectionOutcome, ApiError> {
        let epoch = self.store.epoch();
        let outcome = self
            .dispatcher
            .call::<RejectApplication>(ApplicationRef::new(application_id))
            .await?;

        let tracked = self.store.get(application_id);
        match outcome.application.clone() {
            Some(application) => {
                self.store.upsert_at(epoch, application);
            }
            None => {
                self.store.update(application_id, |application| {
                    application.status = ApplicationStatus::Rejected;
                });
            }
        }

        let conversation_id = outcome.conversation_id.clone().or_else(|| {
            outcome
                .application
                .as_ref()
                .or(tracked.as_ref())
                .and_then(|application| application.conversation_id.clone())
        });
        if let Some(conversation_id) = conversation_id {
            let evicted = self.conversations.evict(&conversation_id);
            debug!(%conversation_id, evicted, "closed conversation for rejected application");
        }
        Ok(outcome)
    }

    /// Insert or replace an application locally.
    pub fn add(&self, application: Application) {
        self.store.upsert(application);
    }

    /// Patch a stored application in place. Returns whether it was present.
    pub fn update_local<F: FnOnce(&mut Application)>(&self, application_id: &str, change: F) -> bool {
        self.store.update(application_id, change)
    }

    /// Drop an application locally.
    pub fn remove(&self, application_id: &str) -> Option<Application> {
        self.store.remove(application_id)
    }

    pub(crate) fn reset(&self) {
        self.store.reset();
        self.guard.detach_all();
    }
}
