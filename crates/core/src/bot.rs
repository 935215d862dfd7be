//! Bot trait — what the request-handling layer invokes per incoming message.

use async_trait::async_trait;

use crate::engine::EngineKind;
use crate::error::Error;
use crate::message::Activity;

/// A conversational engine.
///
/// Exactly one implementation is constructed per process; it is shared by
/// every request, so implementations must not hold per-turn state in `self`.
#[async_trait]
pub trait Bot: Send + Sync {
    /// Which engine variant this is.
    fn kind(&self) -> EngineKind;

    /// Handle one message activity and return the reply text.
    async fn on_message(&self, activity: &Activity) -> Result<String, Error>;
}
