//! Conversations cache, including per-thread message lists.

use std::sync::Arc;

use tokio::sync::watch;
use tracing::debug;

use super::{CollectionGuard, DomainStore, InFlight, KeyedStore, RefreshThrottle, fetch_collection};
use crate::domain::models::{Conversation, Message};
use crate::domain::operations::{
    ConversationRef, ListConversations, ListMessages, MarkConversationRead, NewMessage,
    SendAttachment, SendMessage,
};
use crate::domain::{FilePart, Upload};
use crate::{ApiError, Dispatcher};

type Thread = Arc<Vec<Message>>;

/// Narrow eviction access granted to sibling domains.
///
/// Removes one conversation and its messages without exposing the store.
#[derive(Debug, Clone)]
pub struct ConversationEviction {
    conversations: DomainStore<Conversation>,
    messages: KeyedStore<String, Thread>,
}

impl ConversationEviction {
    /// Remove conversation `conversation_id`. Returns whether it was cached.
    pub fn evict(&self, conversation_id: &str) -> bool {
        self.messages.remove(conversation_id);
        self.conversations.remove(conversation_id).is_some()
    }
}

/// Cached conversations and message threads.
#[derive(Debug, Clone)]
pub struct ConversationsCache {
    dispatcher: Dispatcher,
    store: DomainStore<Conversation>,
    guard: CollectionGuard<Conversation>,
    messages: KeyedStore<String, Thread>,
    message_guard: InFlight<String, Thread>,
    focus: Arc<RefreshThrottle>,
}

impl ConversationsCache {
    pub(crate) fn new(dispatcher: Dispatcher, focus: Arc<RefreshThrottle>) -> Self {
        Self {
            dispatcher,
            store: DomainStore::new(),
            guard: CollectionGuard::new(),
            messages: KeyedStore::new(),
            message_guard: InFlight::new(),
            focus,
        }
    }

    /// Every conversation, fetching on first use or when `force` is set.
    ///
    /// # Errors
    ///
    /// Returns the dispatcher's [`ApiError`].
    pub async fn fetch(&self, force: bool) -> Result<Arc<Vec<Conversation>>, ApiError> {
        fetch_collection::<ListConversations, _>(
            &self.dispatcher,
            &self.store,
            &self.guard,
            (),
            force,
        )
        .await
    }

    /// Refresh in response to a passive trigger, at most once per interval.
    ///
    /// # Errors
    ///
    /// Returns the dispatcher's [`ApiError`].
    pub async fn refresh_on_focus(&self) -> Result<Option<Arc<Vec<Conversation>>>, ApiError> {
        if !self.focus.admit() {
            debug!("conversations focus refresh throttled");
            return Ok(None);
        }
        self.fetch(true).await.map(Some)
    }

    /// Current snapshot without fetching.
    #[must_use]
    pub fn snapshot(&self) -> Arc<Vec<Conversation>> {
        self.store.snapshot()
    }

    /// Change notifications for the primary store.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<Arc<Vec<Conversation>>> {
        self.store.subscribe()
    }

    /// Conversations ordered by latest activity.
    #[must_use]
    pub fn most_recent_first(&self) -> Vec<Conversation> {
        let mut conversations = self.store.snapshot().as_ref().clone();
        conversations.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        conversations
    }

    /// Unread messages across every conversation.
    #[must_use]
    pub fn total_unread(&self) -> u32 {
        self.store
            .snapshot()
            .iter()
            .map(|conversation| conversation.unread_count)
            .fold(0_u32, u32::saturating_add)
    }

    /// Messages in one conversation, deduplicated per conversation id.
    ///
    /// # Errors
    ///
    /// Returns the dispatcher's [`ApiError`].
    pub async fn messages(&self, conversation_id: &str, force: bool) -> Result<Thread, ApiError> {
        let key = conversation_id.to_owned();
        let cached = self
            .messages
            .get(&key)
            .filter(|_| !force && !self.message_guard.is_pending(&key));
        if let Some(thread) = cached {
            return Ok(thread);
        }
        let dispatcher = self.dispatcher.clone();
        let messages = self.messages.clone();
        let input = ConversationRef::new(conversation_id);
        self.message_guard
            .run(key.clone(), move || {
                let epoch = messages.epoch();
                async move {
                    let thread: Thread = Arc::new(dispatcher.call::<ListMessages>(input).await?);
                    messages.insert_at(epoch, key, Arc::clone(&thread));
                    Ok(thread)
                }
            })
            .await
    }

    /// Send a text message and append it to the cached thread.
    ///
    /// # Errors
    ///
    /// Returns the dispatcher's [`ApiError`].
    pub async fn send_message(&self, conversation_id: &str, body: &str) -> Result<Message, ApiError> {
        let epoch = self.messages.epoch();
        let sent = self
            .dispatcher
            .call::<SendMessage>(NewMessage {
                conversation_id: conversation_id.to_owned(),
                body: body.to_owned(),
            })
            .await?;
        self.append(epoch, conversation_id, &sent);
        Ok(sent)
    }

    /// Send a file and append the resulting message to the cached thread.
    ///
    /// # Errors
    ///
    /// Returns the dispatcher's [`ApiError`].
    pub async fn send_attachment(
        &self,
        conversation_id: &str,
        file: FilePart,
    ) -> Result<Message, ApiError> {
        let epoch = self.messages.epoch();
        let sent = self
            .dispatcher
            .call::<SendAttachment>(Upload::new(
                ConversationRef::new(conversation_id),
                vec![file],
            ))
            .await?;
        self.append(epoch, conversation_id, &sent);
        Ok(sent)
    }

    /// Mark a conversation read and zero its unread counter locally.
    ///
    /// # Errors
    ///
    /// Returns the dispatcher's [`ApiError`].
    pub async fn mark_read(&self, conversation_id: &str) -> Result<(), ApiError> {
        self.dispatcher
            .call::<MarkConversationRead>(ConversationRef::new(conversation_id))
            .await?;
        self.store
            .update(conversation_id, |conversation| conversation.unread_count = 0);
        Ok(())
    }

    fn append(&self, epoch: u64, conversation_id: &str, message: &Message) {
        if let Some(thread) = self.messages.get(conversation_id) {
            let mut updated = thread.as_ref().clone();
            updated.push(message.clone());
            self.messages
                .insert_at(epoch, conversation_id.to_owned(), Arc::new(updated));
        }
        let preview = match message.body.trim() {
            "" => None,
            text => Some(text.to_owned()),
        };
        self.store.update(conversation_id, |conversation| {
            if preview.is_some() {
                conversation.last_message = preview;
            }
            if message.sent_at.is_some() {
                conversation.updated_at = message.sent_at;
            }
        });
    }

    /// Insert or replace a conversation locally.
    pub fn add(&self, conversation: Conversation) {
        self.store.upsert(conversation);
    }

    /// Remove a conversation and its messages locally.
    pub fn evict(&self, conversation_id: &str) -> bool {
        self.eviction().evict(conversation_id)
    }

    /// Handle sibling domains use to evict conversations.
    #[must_use]
    pub fn eviction(&self) -> ConversationEviction {
        ConversationEviction {
            conversations: self.store.clone(),
            messages: self.messages.clone(),
        }
    }

    pub(crate) fn reset(&self) {
        self.store.reset();
        self.messages.reset();
        self.guard.detach_all();
        self.message_guard.detach_all();
        self.focus.reset();
    }
}
