//! Conversational engines for GenAIBot.
//!
//! Each engine implements `genaibot_core::Bot`. Exactly one is built per
//! process, chosen by `GEN_AI_IMPLEMENTATION`:
//!
//! | Selector | Engine |
//! |---|---|
//! | `chat-completions` | [`ChatCompletionBot`] |
//! | `assistant` | [`AssistantBot`] |
//! | `semantic-kernel` | [`SemanticKernelBot`] |
//! | `phi` | [`PhiBot`] |
//!
//! All of them read and write through the shared user and conversation
//! state held in [`BotContext`].

pub mod assistant;
pub mod chat_completion;
pub mod phi;
pub mod semantic_kernel;
pub mod turn;

#[cfg(test)]
mod test_helpers;

pub use assistant::AssistantBot;
pub use chat_completion::ChatCompletionBot;
pub use phi::PhiBot;
pub use semantic_kernel::SemanticKernelBot;
pub use turn::BotContext;
