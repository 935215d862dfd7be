//! GenAIBot startup composition root.
//!
//! Turns a [`Configuration`](genaibot_config::Configuration) into a sealed
//! [`ServiceRegistry`]: one shared credential, the inference clients, the
//! selected state storage with user and conversation state over it, an
//! optional search augmentation source, and exactly one engine.
//!
//! Every failure is a [`StartupError`](genaibot_core::StartupError) and is
//! fatal: the process refuses to start rather than falling back.

pub mod augmentation;
pub mod compose;
pub mod engine;
pub mod registry;

pub use augmentation::build_augmentation;
pub use compose::{build_credential, compose, compose_with_credential};
pub use engine::{EngineDependencies, build_engine, engine_settings, select_engine};
pub use registry::{Capability, RegistryBuilder, Service, ServiceRegistry};
