//! # GenAIBot Core
//!
//! Domain types, traits, and error definitions for the GenAIBot host.
//! This crate has **no I/O dependencies** — it defines the capabilities the
//! composition root wires together.
//!
//! ## Design Philosophy
//!
//! Every swappable capability (storage, inference, engine) is a trait here.
//! Implementations live in their respective crates and are chosen from
//! configuration at startup.

pub mod augmentation;
pub mod bot;
pub mod engine;
pub mod error;
pub mod inference;
pub mod message;
pub mod storage;

// Re-export key types at crate root for ergonomics
pub use augmentation::{AugmentationSource, DataSourceAuthentication};
pub use bot::Bot;
pub use engine::EngineKind;
pub use error::{Error, ProviderError, Result, StartupError, StorageError};
pub use inference::{AssistantReply, AssistantRun, ChatRequest, ChatResponse, InferenceClient, Usage};
pub use message::{Activity, Message, Role};
pub use storage::Storage;
