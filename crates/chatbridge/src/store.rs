//! The persistence collaborator.
//!
//! Conversation histories are stored per user *without* the system
//! message; the session prepends the system prompt on every turn. Model
//! catalogs are cached per vendor so `/models` does not hit the vendor
//! each time.

use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;

use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

use crate::chat::Message;
use crate::error::LlmError;

/// Boxed future returned by [`ConversationStore`] methods.
pub type StoreFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, LlmError>> + Send + 'a>>;

/// Per-user settings chosen through chat commands.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    /// Replaces the configured system prompt when set (`/system`).
    pub system_prompt: Option<String>,
    /// Replaces the configured model when set (`/models <n>`).
    pub model: Option<String>,
}

/// Storage for histories, user profiles and model catalogs.
///
/// Failures are reported as [`LlmError::Store`].
pub trait ConversationStore: Send + Sync {
    /// The user's history, oldest first. Unknown users have none.
    fn get_history(&self, user_id: i64) -> StoreFuture<'_, Vec<Message>>;

    /// Replaces the user's history.
    fn save_history(&self, user_id: i64, history: Vec<Message>) -> StoreFuture<'_, ()>;

    /// Cached model list for a vendor, if any.
    fn get_model_cache<'a>(&'a self, vendor: &'a str) -> StoreFuture<'a, Option<Vec<String>>>;

    /// Caches a vendor's model list.
    fn save_model_cache<'a>(&'a self, vendor: &'a str, models: Vec<String>) -> StoreFuture<'a, ()>;

    /// The user's profile. Unknown users get the default.
    fn get_profile(&self, user_id: i64) -> StoreFuture<'_, UserProfile>;

    /// Replaces the user's profile.
    fn save_profile(&self, user_id: i64, profile: UserProfile) -> StoreFuture<'_, ()>;
}

/// In-process [`ConversationStore`] over `RwLock`ed maps.
#[derive(Debug, Default)]
pub struct MemoryStore {
    histories: RwLock<HashMap<i64, Vec<Message>>>,
    profiles: RwLock<HashMap<i64, UserProfile>>,
    models: RwLock<HashMap<String, Vec<String>>>,
}

impl MemoryStore {
    /// An empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

impl ConversationStore for MemoryStore {
    fn get_history(&self, user_id: i64) -> StoreFuture<'_, Vec<Message>> {
        Box::pin(async move {
            Ok(self
                .histories
                .read()
                .await
                .get(&user_id)
                .cloned()
                .unwrap_or_default())
        })
    }

    fn save_history(&self, user_id: i64, history: Vec<Message>) -> StoreFuture<'_, ()> {
        Box::pin(async move {
            self.histories.write().await.insert(user_id, history);
            Ok(())
        })
    }

    fn get_model_cache<'a>(&'a self, vendor: &'a str) -> StoreFuture<'a, Option<Vec<String>>> {
        Box::pin(async move { Ok(self.models.read().await.get(vendor).cloned()) })
    }

    fn save_model_cache<'a>(&'a self, vendor: &'a str, models: Vec<String>) -> StoreFuture<'a, ()> {
        Box::pin(async move {
            self.models.write().await.insert(vendor.to_string(), models);
            Ok(())
        })
    }

    fn get_profile(&self, user_id: i64) -> StoreFuture<'_, UserProfile> {
        Box::pin(async move {
            Ok(self
                .profiles
                .read()
                .await
                .get(&user_id)
                .cloned()
                .unwrap_or_default())
        })
    }

    fn save_profile(&self, user_id: i64, profile: UserProfile) -> StoreFuture<'_, ()> {
        Box::pin(async move {
            self.profiles.write().await.insert(user_id, profile);
            Ok(())
        })
    }
}
