//! Shared test helpers for engine tests.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use genaibot_core::error::ProviderError;
use genaibot_core::inference::{
    AssistantReply, AssistantRun, ChatRequest, ChatResponse, InferenceClient,
};
use genaibot_core::message::{Activity, Message};
use genaibot_core::storage::Storage;
use genaibot_storage::{BotState, MemoryStorage};

use crate::turn::BotContext;

/// An inference client that replays scripted replies in order.
///
/// Panics if more calls are made than replies provided.
pub struct ScriptedClient {
    replies: Mutex<VecDeque<String>>,
    requests: Mutex<Vec<ChatRequest>>,
    runs: Mutex<Vec<AssistantRun>>,
}

impl ScriptedClient {
    pub fn new<'a>(replies: impl IntoIterator<Item = &'a str>) -> Self {
        Self {
            replies: Mutex::new(replies.into_iter().map(str::to_string).collect()),
            requests: Mutex::new(Vec::new()),
            runs: Mutex::new(Vec::new()),
        }
    }

    pub fn last_request(&self) -> Option<ChatRequest> {
        self.requests.lock().unwrap().last().cloned()
    }

    pub fn runs(&self) -> Vec<AssistantRun> {
        self.runs.lock().unwrap().clone()
    }

    fn next_reply(&self) -> String {
        self.replies
            .lock()
            .unwrap()
            .pop_front()
            .expect("ScriptedClient: no more replies")
    }
}

#[async_trait]
impl InferenceClient for ScriptedClient {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn complete(&self, request: ChatRequest) -> Result<ChatResponse, ProviderError> {
        self.requests.lock().unwrap().push(request);
        Ok(ChatResponse {
            message: Message::assistant(self.next_reply()),
            usage: None,
            model: "scripted".into(),
        })
    }

    async fn run_assistant(&self, run: AssistantRun) -> Result<AssistantReply, ProviderError> {
        let thread_id = run
            .thread_id
            .clone()
            .unwrap_or_else(|| format!("thread_{}", self.runs.lock().unwrap().len()));
        self.runs.lock().unwrap().push(run);
        Ok(AssistantReply {
            thread_id,
            text: self.next_reply(),
        })
    }
}

/// An inference client whose every call fails.
pub struct FailingClient;

#[async_trait]
impl InferenceClient for FailingClient {
    fn name(&self) -> &str {
        "failing"
    }

    async fn complete(&self, _request: ChatRequest) -> Result<ChatResponse, ProviderError> {
        Err(ProviderError::RateLimited { retry_after_secs: 1 })
    }
}

pub fn activity(text: &str) -> Activity {
    Activity::message("test", "conv-1", "user-1", text)
}

/// Both states over one fresh in-memory store.
pub fn context(instructions: Option<&str>) -> BotContext {
    let storage: Arc<dyn Storage> = Arc::new(MemoryStorage::new());
    BotContext::new(
        BotState::user(storage.clone()),
        BotState::conversation(storage),
        instructions.map(str::to_string),
    )
}
