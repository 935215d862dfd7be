//! User and conversation state.
//!
//! A [`BotState`] scopes a shared [`Storage`] to either the user or the
//! conversation of an activity. Both scopes are always built over the same
//! backend instance.

use std::sync::Arc;

use genaibot_core::error::StorageError;
use genaibot_core::message::Activity;
use genaibot_core::storage::Storage;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

use crate::selector::StorageBackend;

/// Which part of an activity the state is keyed on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StateScope {
    User,
    Conversation,
}

impl StateScope {
    pub fn as_str(&self) -> &'static str {
        match self {
            StateScope::User => "user",
            StateScope::Conversation => "conversation",
        }
    }
}

/// Named properties stored as one JSON object per scope key.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StateBag(Map<String, Value>);

impl StateBag {
    /// Read a property. Missing or mistyped properties read as `None`.
    pub fn get<T: DeserializeOwned>(&self, name: &str) -> Option<T> {
        self.0
            .get(name)
            .and_then(|v| serde_json::from_value(v.clone()).ok())
    }

    pub fn set<T: Serialize>(&mut self, name: &str, value: &T) -> Result<(), serde_json::Error> {
        self.0.insert(name.to_string(), serde_json::to_value(value)?);
        Ok(())
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// State manager for one scope.
#[derive(Clone)]
pub struct BotState {
    storage: Arc<dyn Storage>,
    scope: StateScope,
}

impl BotState {
    pub fn new(storage: Arc<dyn Storage>, scope: StateScope) -> Self {
        Self { storage, scope }
    }

    /// User-scoped state over `storage`.
    pub fn user(storage: Arc<dyn Storage>) -> Self {
        Self::new(storage, StateScope::User)
    }

    /// Conversation-scoped state over `storage`.
    pub fn conversation(storage: Arc<dyn Storage>) -> Self {
        Self::new(storage, StateScope::Conversation)
    }

    pub fn scope(&self) -> StateScope {
        self.scope
    }

    /// The backend this state reads and writes through.
    pub fn storage(&self) -> &Arc<dyn Storage> {
        &self.storage
    }

    /// `{channel}/users/{user}` or `{channel}/conversations/{conversation}`.
    pub fn storage_key(&self, activity: &Activity) -> String {
        match self.scope {
            StateScope::User => format!("{}/users/{}", activity.channel_id, activity.user_id),
            StateScope::Conversation => format!(
                "{}/conversations/{}",
                activity.channel_id, activity.conversation_id
            ),
        }
    }

    pub async fn load(&self, activity: &Activity) -> Result<StateBag, StorageError> {
        let key = self.storage_key(activity);
        match self.storage.get(&key).await? {
            Some(Value::Object(map)) => Ok(StateBag(map)),
            Some(_) => Err(StorageError::Malformed {
                key,
                reason: "state is not a JSON object".into(),
            }),
            None => Ok(StateBag::default()),
        }
    }

    pub async fn save(&self, activity: &Activity, bag: &StateBag) -> Result<(), StorageError> {
        let key = self.storage_key(activity);
        self.storage.put(&key, Value::Object(bag.0.clone())).await
    }

    pub async fn clear(&self, activity: &Activity) -> Result<(), StorageError> {
        self.storage.delete(&self.storage_key(activity)).await
    }
}

/// User-scoped state over the selected backend.
pub fn build_user_state(backend: &StorageBackend) -> BotState {
    BotState::user(backend.storage())
}

/// Conversation-scoped state over the selected backend.
pub fn build_conversation_state(backend: &StorageBackend) -> BotState {
    BotState::conversation(backend.storage())
}

impl std::fmt::Debug for BotState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BotState")
            .field("scope", &self.scope)
            .field("storage", &self.storage.name())
            .finish()
    }
}
