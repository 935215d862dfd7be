//! Startup composition.
//!
//! One ordered pass builds every singleton: credential, inference clients,
//! storage, state, augmentation, engine. The first failure aborts startup.
//! Nothing here performs network I/O.

use std::sync::Arc;

use genaibot_config::{Configuration, keys};
use genaibot_core::error::StartupError;
use genaibot_identity::{CredentialOptions, DefaultCredential, TokenCredential};
use genaibot_providers::{AzureOpenAiClient, PhiClient};
use genaibot_storage::{StorageBackend, build_conversation_state, build_user_state};
use tracing::info;

use crate::augmentation::build_augmentation;
use crate::engine::{EngineDependencies, select_engine};
use crate::registry::{RegistryBuilder, Service, ServiceRegistry};

/// Compose the service graph, building the process credential from
/// configuration.
pub fn compose(config: Configuration) -> Result<ServiceRegistry, StartupError> {
    let credential = build_credential(&config)?;
    compose_with_credential(config, credential)
}

/// Compose the service graph around an existing credential.
pub fn compose_with_credential(
    config: Configuration,
    credential: Arc<dyn TokenCredential>,
) -> Result<ServiceRegistry, StartupError> {
    let config = Arc::new(config);

    let (openai, phi) = build_clients(&config, credential.clone())?;

    let storage = StorageBackend::select(&config, credential.clone())?;
    info!(storage = storage.name(), "State storage selected");

    let user_state = build_user_state(&storage);
    let conversation_state = build_conversation_state(&storage);

    let augmentation = build_augmentation(&config)?.map(Arc::new);
    info!(
        augmentation = augmentation.is_some(),
        index = augmentation.as_ref().map(|a| a.index_name.as_str()).unwrap_or(""),
        "Augmentation source resolved"
    );

    let engine = select_engine(
        config.get(keys::GEN_AI_IMPLEMENTATION),
        &EngineDependencies {
            config: &config,
            openai: openai.clone(),
            phi: phi.clone(),
            augmentation: augmentation.clone(),
            user_state: user_state.clone(),
            conversation_state: conversation_state.clone(),
        },
    )?;

    let mut builder = RegistryBuilder::new();
    builder
        .register(Service::Configuration(config))?
        .register(Service::Credential(credential))?
        .register(Service::OpenAiClient(openai))?
        .register_optional(phi.map(Service::PhiClient))?
        .register(Service::Storage(storage))?
        .register(Service::UserState(user_state))?
        .register(Service::ConversationState(conversation_state))?
        .register_optional(augmentation.map(Service::Augmentation))?
        .register(Service::Engine(engine))?;

    let registry = builder.seal();
    info!(
        services = registry.capabilities().count(),
        "Service registry sealed"
    );
    Ok(registry)
}

/// Build the shared credential. `MicrosoftAppId` is the identity hint.
pub fn build_credential(config: &Configuration) -> Result<Arc<dyn TokenCredential>, StartupError> {
    let options = CredentialOptions::from_vars(config.get(keys::MICROSOFT_APP_ID), |name| {
        config.get(name).map(str::to_string)
    });
    let credential =
        DefaultCredential::new(options).map_err(|e| StartupError::ClientConstruction {
            client: "credential".into(),
            reason: e.to_string(),
        })?;
    info!(source = %credential.source(), "Credential constructed");
    Ok(Arc::new(credential))
}

type Clients = (Arc<AzureOpenAiClient>, Option<Arc<PhiClient>>);

/// Azure OpenAI is always built; Phi only when its endpoint is set.
fn build_clients(
    config: &Configuration,
    credential: Arc<dyn TokenCredential>,
) -> Result<Clients, StartupError> {
    let openai = AzureOpenAiClient::new(
        config.require(keys::AZURE_OPENAI_API_ENDPOINT)?,
        config.get_non_empty(keys::AZURE_OPENAI_API_VERSION),
        credential,
    )?;
    info!(
        endpoint = openai.endpoint(),
        api_version = openai.api_version(),
        "Azure OpenAI client constructed"
    );

    let phi = match config.get_non_empty(keys::AZURE_AI_PHI_DEPLOYMENT_ENDPOINT) {
        Some(endpoint) => {
            let client = PhiClient::new(
                endpoint,
                config.get_or_default(keys::AZURE_AI_PHI_DEPLOYMENT_KEY, ""),
            )?;
            info!(endpoint = client.endpoint(), "Phi client constructed");
            Some(Arc::new(client))
        }
        None => None,
    };

    Ok((Arc::new(openai), phi))
}

#[cfg(test)]
mod tests {
    use super::*;
    use genaibot_identity::CredentialSource;

    #[test]
    fn credential_reads_settings_from_configuration() {
        let config = Configuration::from_pairs([
            ("AZURE_TENANT_ID", "tenant"),
            ("AZURE_CLIENT_ID", "client"),
            ("AZURE_CLIENT_SECRET", "secret"),
        ]);
        assert!(build_credential(&config).is_ok());

        let options = CredentialOptions::from_vars(Some("app-id"), |name| {
            config.get(name).map(str::to_string)
        });
        assert_eq!(options.source(), CredentialSource::ClientSecret);
        assert_eq!(options.managed_identity_client_id.as_deref(), Some("app-id"));
    }

    #[test]
    fn phi_client_is_built_only_when_endpoint_set() {
        let credential: Arc<dyn TokenCredential> =
            Arc::new(genaibot_identity::StaticCredential::new("t"));

        let config = Configuration::from_pairs([
            (keys::AZURE_OPENAI_API_ENDPOINT, "https://x.openai.azure.com"),
            (keys::AZURE_AI_PHI_DEPLOYMENT_ENDPOINT, ""),
        ]);
        let (_, phi) = build_clients(&config, credential.clone()).unwrap();
        assert!(phi.is_none());

        let config = Configuration::from_pairs([
            (keys::AZURE_OPENAI_API_ENDPOINT, "https://x.openai.azure.com"),
            (keys::AZURE_AI_PHI_DEPLOYMENT_ENDPOINT, "https://phi.models.ai.azure.com"),
            (keys::AZURE_AI_PHI_DEPLOYMENT_KEY, "k"),
        ]);
        let (_, phi) = build_clients(&config, credential.clone()).unwrap();
        assert!(phi.is_some());
    }

    #[test]
    fn missing_openai_endpoint_fails_first() {
        let credential: Arc<dyn TokenCredential> =
            Arc::new(genaibot_identity::StaticCredential::new("t"));
        let err = build_clients(&Configuration::default(), credential).unwrap_err();
        assert_eq!(err, StartupError::missing(keys::AZURE_OPENAI_API_ENDPOINT));
    }
}
