//! Engine selection.
//!
//! The selector string is parsed into an [`EngineKind`] first; only a
//! successfully parsed kind is ever constructed.

use std::sync::Arc;

use genaibot_bots::{AssistantBot, BotContext, ChatCompletionBot, PhiBot, SemanticKernelBot};
use genaibot_config::{Configuration, keys};
use genaibot_core::augmentation::AugmentationSource;
use genaibot_core::bot::Bot;
use genaibot_core::engine::EngineKind;
use genaibot_core::error::StartupError;
use genaibot_core::inference::InferenceClient;
use genaibot_providers::{AzureOpenAiClient, PhiClient};
use genaibot_storage::BotState;
use tracing::info;

/// Shared collaborators injected into whichever engine is selected.
pub struct EngineDependencies<'a> {
    pub config: &'a Configuration,
    pub openai: Arc<AzureOpenAiClient>,
    pub phi: Option<Arc<PhiClient>>,
    pub augmentation: Option<Arc<AugmentationSource>>,
    pub user_state: BotState,
    pub conversation_state: BotState,
}

impl EngineDependencies<'_> {
    fn context(&self) -> BotContext {
        BotContext::new(
            self.user_state.clone(),
            self.conversation_state.clone(),
            self.config.get(keys::LLM_INSTRUCTIONS).map(str::to_string),
        )
    }

    fn setting(&self, key: &str) -> Option<String> {
        self.config.get_non_empty(key).map(str::to_string)
    }
}

/// Configuration keys each engine reads beyond the shared ones.
///
/// Only the Phi keys are checked while building. The deployment name and
/// assistant id may be unset; the first turn then fails with
/// `ProviderError::NotConfigured`.
pub fn engine_settings(kind: EngineKind) -> &'static [&'static str] {
    match kind {
        EngineKind::ChatCompletions | EngineKind::SemanticKernel => {
            &[keys::AZURE_OPENAI_DEPLOYMENT_NAME]
        }
        EngineKind::Assistant => &[keys::AZURE_OPENAI_ASSISTANT_ID],
        EngineKind::Phi => &[
            keys::AZURE_AI_PHI_DEPLOYMENT_ENDPOINT,
            keys::AZURE_AI_PHI_DEPLOYMENT_KEY,
        ],
    }
}

/// Parse `selector` and construct the matching engine.
pub fn select_engine(
    selector: Option<&str>,
    deps: &EngineDependencies<'_>,
) -> Result<Arc<dyn Bot>, StartupError> {
    let kind = EngineKind::parse_selector(selector)?;
    build_engine(kind, deps)
}

/// Construct the engine for an already-parsed kind.
pub fn build_engine(
    kind: EngineKind,
    deps: &EngineDependencies<'_>,
) -> Result<Arc<dyn Bot>, StartupError> {
    let openai = deps.openai.clone() as Arc<dyn InferenceClient>;

    let engine: Arc<dyn Bot> = match kind {
        EngineKind::ChatCompletions => {
            Arc::new(ChatCompletionBot::new(
                openai,
                deps.setting(keys::AZURE_OPENAI_DEPLOYMENT_NAME),
                deps.augmentation.clone(),
                deps.context(),
            ))
        }
        EngineKind::Assistant => {
            Arc::new(AssistantBot::new(
                openai,
                deps.setting(keys::AZURE_OPENAI_ASSISTANT_ID),
                deps.context(),
            ))
        }
        EngineKind::SemanticKernel => {
            Arc::new(SemanticKernelBot::new(
                openai,
                deps.setting(keys::AZURE_OPENAI_DEPLOYMENT_NAME),
                deps.context(),
            ))
        }
        EngineKind::Phi => {
            let phi = deps
                .phi
                .clone()
                .ok_or_else(|| StartupError::missing(keys::AZURE_AI_PHI_DEPLOYMENT_ENDPOINT))?;
            Arc::new(PhiBot::new(phi, deps.context()))
        }
    };

    info!(engine = %kind, "Conversational engine constructed");
    Ok(engine)
}

#[cfg(test)]
mod tests {
    use super::*;
    use genaibot_identity::StaticCredential;
    use genaibot_storage::MemoryStorage;

    fn deps(config: &Configuration, phi: bool) -> EngineDependencies<'_> {
        let storage = Arc::new(MemoryStorage::new());
        EngineDependencies {
            config,
            openai: Arc::new(
                AzureOpenAiClient::new(
                    "https://x.openai.azure.com",
                    None,
                    Arc::new(StaticCredential::new("t")),
                )
                .unwrap(),
            ),
            phi: phi.then(|| {
                Arc::new(PhiClient::new("https://phi.models.ai.azure.com", "k").unwrap())
            }),
            augmentation: None,
            user_state: BotState::user(storage.clone()),
            conversation_state: BotState::conversation(storage),
        }
    }

    fn full_config() -> Configuration {
        Configuration::from_pairs([
            (keys::AZURE_OPENAI_DEPLOYMENT_NAME, "gpt-4o"),
            (keys::AZURE_OPENAI_ASSISTANT_ID, "asst_1"),
        ])
    }

    #[test]
    fn each_selector_builds_its_own_engine() {
        let config = full_config();
        let deps = deps(&config, true);
        for kind in EngineKind::ALL {
            let engine = select_engine(Some(kind.as_str()), &deps).unwrap();
            assert_eq!(engine.kind(), kind);
        }
    }

    #[test]
    fn withdrawn_and_unknown_selectors_fail() {
        let config = full_config();
        let deps = deps(&config, true);
        assert!(matches!(
            select_engine(Some("langchain"), &deps),
            Err(StartupError::UnsupportedSelection { .. })
        ));
        assert!(matches!(
            select_engine(Some("Chat-Completions"), &deps),
            Err(StartupError::InvalidSelection { .. })
        ));
        assert!(matches!(
            select_engine(None, &deps),
            Err(StartupError::InvalidSelection { .. })
        ));
    }

    #[test]
    fn openai_engines_build_without_their_settings() {
        let config = Configuration::default();
        let deps = deps(&config, false);

        for kind in [
            EngineKind::ChatCompletions,
            EngineKind::SemanticKernel,
            EngineKind::Assistant,
        ] {
            assert_eq!(build_engine(kind, &deps).unwrap().kind(), kind);
        }
    }

    #[tokio::test]
    async fn unset_deployment_surfaces_on_first_turn() {
        use genaibot_core::error::{Error, ProviderError};
        use genaibot_core::message::Activity;

        let config = Configuration::default();
        let deps = deps(&config, false);
        let engine = build_engine(EngineKind::ChatCompletions, &deps).unwrap();

        let err = engine
            .on_message(&Activity::message("test", "c", "u", "hi"))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Provider(ProviderError::NotConfigured(_))));
    }

    #[test]
    fn phi_without_client_is_missing_configuration() {
        let config = Configuration::default();
        let deps = deps(&config, false);
        assert_eq!(
            build_engine(EngineKind::Phi, &deps).err(),
            Some(StartupError::missing(keys::AZURE_AI_PHI_DEPLOYMENT_ENDPOINT))
        );
        assert!(engine_settings(EngineKind::Phi).contains(&keys::AZURE_AI_PHI_DEPLOYMENT_ENDPOINT));
        assert!(engine_settings(EngineKind::Assistant).contains(&keys::AZURE_OPENAI_ASSISTANT_ID));
    }
}
