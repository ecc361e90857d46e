//! Jobs cache.

use std::sync::Arc;

use bytes::Bytes;
use tokio::sync::watch;
use tracing::debug;

use super::{CollectionGuard, DomainStore, RefreshThrottle, fetch_collection};
use crate::domain::models::{Job, JobStatus};
use crate::domain::operations::{
    CreateJob, DeleteJob, GetJob, GetJobImage, JobImageRef, JobQuery, JobRef, JobUpdate, ListJobs,
    NewJob, UpdateJob, UploadJobImages,
};
use crate::domain::{FilePart, Upload};
use crate::{ApiError, Dispatcher};

/// Cached job listing with derived views.
#[derive(Debug, Clone)]
pub struct JobsCache {
    dispatcher: Dispatcher,
    store: DomainStore<Job>,
    guard: CollectionGuard<Job>,
    focus: Arc<RefreshThrottle>,
}

impl JobsCache {
    pub(crate) fn new(dispatcher: Dispatcher, focus: Arc<RefreshThrottle>) -> Self {
        Self {
            dispatcher,
            store: DomainStore::new(),
            guard: CollectionGuard::new(),
            focus,
        }
    }

    /// Every job, fetching on first use or when `force` is set.
    ///
    /// # Errors
    ///
    /// Returns the dispatcher's [`ApiError`].
    pub async fn fetch(&self, force: bool) -> Result<Arc<Vec<Job>>, ApiError> {
        fetch_collection::<ListJobs, _>(
            &self.dispatcher,
            &self.store,
            &self.guard,
            JobQuery::default(),
            force,
        )
        .await
    }

    /// Refresh in response to a passive trigger, at most once per interval.
    ///
    /// Returns `Ok(None)` when the throttle suppressed the refresh.
    ///
    /// # Errors
    ///
    /// Returns the dispatcher's [`ApiError`].
    pub async fn refresh_on_focus(&self) -> Result<Option<Arc<Vec<Job>>>, ApiError> {
        if !self.focus.admit() {
            debug!("jobs focus refresh throttled");
            return Ok(None);
        }
        self.fetch(true).await.map(Some)
    }

    /// Current snapshot without fetching.
    #[must_use]
    pub fn snapshot(&self) -> Arc<Vec<Job>> {
        self.store.snapshot()
    }

    /// Change notifications for the primary store.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<Arc<Vec<Job>>> {
        self.store.subscribe()
    }

    /// Jobs still accepting applications.
    #[must_use]
    pub fn open_jobs(&self) -> Vec<Job> {
        self.store
            .snapshot()
            .iter()
            .filter(|job| job.status == JobStatus::Open)
            .cloned()
            .collect()
    }

    /// Jobs in one category.
    #[must_use]
    pub fn jobs_by_category(&self, category: &str) -> Vec<Job> {
        self.store
            .snapshot()
            .iter()
            .filter(|job| job.category.as_deref() == Some(category))
            .cloned()
            .collect()
    }

    /// Every job, newest first. Jobs without a timestamp sort last.
    #[must_use]
    pub fn newest_first(&self) -> Vec<Job> {
        let mut jobs = self.store.snapshot().as_ref().clone();
        jobs.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        jobs
    }

    /// One job, from the store when present, otherwise from the server.
    ///
    /// # Errors
    ///
    /// Returns the dispatcher's [`ApiError`].
    pub async fn get(&self, job_id: &str, force: bool) -> Result<Job, ApiError> {
        if let Some(job) = self.store.get(job_id).filter(|_| !force) {
            return Ok(job);
        }
        let epoch = self.store.epoch();
        let job = self.dispatcher.call::<GetJob>(JobRef::new(job_id)).await?;
        self.store.upsert_at(epoch, job.clone());
        Ok(job)
    }

    /// Post a job and add it to the store.
    ///
    /// # Errors
    ///
    /// Returns the dispatcher's [`ApiError`].
    pub async fn create(&self, job: NewJob) -> Result<Job, ApiError> {
        let epoch = self.store.epoch();
        let created = self.dispatcher.call::<CreateJob>(job).await?;
        self.store.upsert_at(epoch, created.clone());
        Ok(created)
    }

    /// Update a job and replace it in the store.
    ///
    /// # Errors
    ///
    /// Returns the dispatcher's [`ApiError`].
    pub async fn update(&self, changes: JobUpdate) -> Result<Job, ApiError> {
        let epoch = self.store.epoch();
        let updated = self.dispatcher.call::<UpdateJob>(changes).await?;
        self.store.upsert_at(epoch, updated.clone());
        Ok(updated)
    }

    /// Delete a job and drop it from the store.
    ///
    /// # Errors
    ///
    /// Returns the dispatcher's [`ApiError`].
    pub async fn delete(&self, job_id: &str) -> Result<(), ApiError> {
        self.dispatcher.call::<DeleteJob>(JobRef::new(job_id)).await?;
        self.store.remove(job_id);
        Ok(())
    }

    /// Attach images to a job and store the updated job.
    ///
    /// # Errors
    ///
    /// Returns the dispatcher's [`ApiError`].
    pub async fn upload_images(&self, job_id: &str, images: Vec<FilePart>) -> Result<Job, ApiError> {
        let epoch = self.store.epoch();
        let updated = self
            .dispatcher
            .call::<UploadJobImages>(Upload::new(JobRef::new(job_id), images))
            .await?;
        self.store.upsert_at(epoch, updated.clone());
        Ok(updated)
    }

    /// Raw bytes of one job image.
    ///
    /// # Errors
    ///
    /// Returns the dispatcher's [`ApiError`].
    pub async fn image(&self, job_id: &str, image_id: &str) -> Result<Bytes, ApiError> {
        self.dispatcher
            .call::<GetJobImage>(JobImageRef {
                job_id: job_id.to_owned(),
                image_id: image_id.to_owned(),
            })
            .await
    }

    /// Insert or replace a job locally, e.g. after a push notification.
    pub fn add(&self, job: Job) {
        self.store.upsert(job);
    }

    /// Patch a stored job in place. Returns whether it was present.
    pub fn update_local<F: FnOnce(&mut Job)>(&self, job_id: &str, change: F) -> bool {
        self.store.update(job_id, change)
    }

    /// Drop a job locally.
    pub fn remove(&self, job_id: &str) -> Option<Job> {
        self.store.remove(job_id)
    }

    pub(crate) fn reset(&self) {
        self.store.reset();
        self.guard.detach_all();
        self.focus.reset();
    }
}
