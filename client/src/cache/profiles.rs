//! Profiles cache, keyed by username.

use std::collections::BTreeMap;
use std::sync::Arc;

use bytes::Bytes;
use tokio::sync::watch;

use super::{InFlight, KeyedStore};
use crate::domain::models::Profile;
use crate::domain::operations::{
    GetCurrentUser, GetProfile, GetProfilePicture, ProfileRef, ProfileUpdate, UpdateProfile,
    UploadProfilePicture,
};
use crate::domain::{FilePart, Upload};
use crate::{ApiError, Dispatcher};

/// Guard key for the signed-in user's own profile. Usernames cannot contain
/// `@`, so it never collides with a real username.
const CURRENT_USER_KEY: &str = "@me";

/// Cached profiles with per-username deduplication.
#[derive(Debug, Clone)]
pub struct ProfilesCache {
    dispatcher: Dispatcher,
    store: KeyedStore<String, Profile>,
    guard: InFlight<String, Profile>,
}

impl ProfilesCache {
    pub(crate) fn new(dispatcher: Dispatcher) -> Self {
        Self {
            dispatcher,
            store: KeyedStore::new(),
            guard: InFlight::new(),
        }
    }

    /// Profile for `username`.
    ///
    /// Independent callers asking for the same username concurrently share
    /// one request.
    ///
    /// # Errors
    ///
    /// Returns the dispatcher's [`ApiError`].
    pub async fn get(&self, username: &str, force: bool) -> Result<Profile, ApiError> {
        let key = username.to_owned();
        let cached = self
            .store
            .get(&key)
            .filter(|_| !force && !self.guard.is_pending(&key));
        if let Some(profile) = cached {
            return Ok(profile);
        }
        let dispatcher = self.dispatcher.clone();
        let store = self.store.clone();
        self.guard
            .run(key.clone(), move || {
                let epoch = store.epoch();
                async move {
                    let profile = dispatcher.call::<GetProfile>(ProfileRef::new(key)).await?;
                    store.insert_at(epoch, profile.username.clone(), profile.clone());
                    Ok(profile)
                }
            })
            .await
    }

    /// The signed-in user's own profile.
    ///
    /// Also refreshes the session's profile-completeness flag.
    ///
    /// # Errors
    ///
    /// Returns the dispatcher's [`ApiError`].
    pub async fn current(&self, force: bool) -> Result<Profile, ApiError> {
        let own = self.dispatcher.session().username();
        let cached = own
            .as_deref()
            .and_then(|username| self.store.get(username))
            .filter(|_| !force && !self.guard.is_pending(&CURRENT_USER_KEY.to_owned()));
        if let Some(profile) = cached {
            return Ok(profile);
        }
        let dispatcher = self.dispatcher.clone();
        let store = self.store.clone();
        self.guard
            .run(CURRENT_USER_KEY.to_owned(), move || {
                let epoch = store.epoch();
                async move {
                    let profile = dispatcher.call::<GetCurrentUser>(()).await?;
                    store.insert_at(epoch, profile.username.clone(), profile.clone());
                    Ok(profile)
                }
            })
            .await
    }

    /// Update the signed-in user's profile.
    ///
    /// # Errors
    ///
    /// Returns the dispatcher's [`ApiError`].
    pub async fn update_mine(&self, changes: ProfileUpdate) -> Result<Profile, ApiError> {
        let epoch = self.store.epoch();
        let updated = self.dispatcher.call::<UpdateProfile>(changes).await?;
        self.store
            .insert_at(epoch, updated.username.clone(), updated.clone());
        Ok(updated)
    }

    /// Replace the signed-in user's picture.
    ///
    /// # Errors
    ///
    /// Returns the dispatcher's [`ApiError`].
    pub async fn upload_picture(&self, picture: FilePart) -> Result<Profile, ApiError> {
        let epoch = self.store.epoch();
        let updated = self
            .dispatcher
            .call::<UploadProfilePicture>(Upload::new((), vec![picture]))
            .await?;
        self.store
            .insert_at(epoch, updated.username.clone(), updated.clone());
        Ok(updated)
    }

    /// Raw bytes of a user's picture.
    ///
    /// # Errors
    ///
    /// Returns the dispatcher's [`ApiError`].
    pub async fn picture(&self, username: &str) -> Result<Bytes, ApiError> {
        self.dispatcher
            .call::<GetProfilePicture>(ProfileRef::new(username))
            .await
    }

    /// Cached profile for `username`, without fetching.
    #[must_use]
    pub fn cached(&self, username: &str) -> Option<Profile> {
        self.store.get(username)
    }

    /// Every cached profile by username.
    #[must_use]
    pub fn snapshot(&self) -> Arc<BTreeMap<String, Profile>> {
        self.store.snapshot()
    }

    /// Change notifications for the profile map.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<Arc<BTreeMap<String, Profile>>> {
        self.store.subscribe()
    }

    /// Drop a cached profile.
    pub fn remove(&self, username: &str) -> Option<Profile> {
        self.store.remove(username)
    }

    pub(crate) fn reset(&self) {
        self.store.reset();
        self.guard.detach_all();
    }
}
