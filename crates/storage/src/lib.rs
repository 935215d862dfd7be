//! State storage for GenAIBot.
//!
//! Backends implement `genaibot_core::Storage`; the selector picks one from
//! configuration and [`BotState`] layers user and conversation scopes on top.

pub mod cosmos;
pub mod memory;
pub mod selector;
pub mod state;

pub use cosmos::{CosmosDbPartitionedStorage, CosmosDbStorageOptions};
pub use memory::MemoryStorage;
pub use selector::{StorageBackend, StorageSelection};
pub use state::{BotState, StateBag, StateScope, build_conversation_state, build_user_state};
