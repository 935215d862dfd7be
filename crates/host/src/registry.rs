//! The service registry.
//!
//! Services are registered on a [`RegistryBuilder`] while the process
//! starts. Sealing it yields an immutable [`ServiceRegistry`], and only the
//! sealed registry can resolve anything.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use genaibot_config::Configuration;
use genaibot_core::augmentation::AugmentationSource;
use genaibot_core::bot::Bot;
use genaibot_core::error::StartupError;
use genaibot_identity::TokenCredential;
use genaibot_providers::{AzureOpenAiClient, PhiClient};
use genaibot_storage::{BotState, StorageBackend};
use tracing::debug;

/// Every capability the startup graph can provide.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Capability {
    Configuration,
    Credential,
    OpenAiClient,
    PhiClient,
    Storage,
    UserState,
    ConversationState,
    Augmentation,
    Engine,
}

impl Capability {
    pub const ALL: [Capability; 9] = [
        Capability::Configuration,
        Capability::Credential,
        Capability::OpenAiClient,
        Capability::PhiClient,
        Capability::Storage,
        Capability::UserState,
        Capability::ConversationState,
        Capability::Augmentation,
        Capability::Engine,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Capability::Configuration => "configuration",
            Capability::Credential => "credential",
            Capability::OpenAiClient => "openai_client",
            Capability::PhiClient => "phi_client",
            Capability::Storage => "storage",
            Capability::UserState => "user_state",
            Capability::ConversationState => "conversation_state",
            Capability::Augmentation => "augmentation",
            Capability::Engine => "engine",
        }
    }

    /// Capabilities that may legitimately be absent after startup.
    pub fn is_optional(&self) -> bool {
        matches!(self, Capability::PhiClient | Capability::Augmentation)
    }
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A registered singleton.
#[derive(Clone)]
pub enum Service {
    Configuration(Arc<Configuration>),
    Credential(Arc<dyn TokenCredential>),
    OpenAiClient(Arc<AzureOpenAiClient>),
    PhiClient(Arc<PhiClient>),
    Storage(StorageBackend),
    UserState(BotState),
    ConversationState(BotState),
    Augmentation(Arc<AugmentationSource>),
    Engine(Arc<dyn Bot>),
}

impl Service {
    pub fn capability(&self) -> Capability {
        match self {
            Service::Configuration(_) => Capability::Configuration,
            Service::Credential(_) => Capability::Credential,
            Service::OpenAiClient(_) => Capability::OpenAiClient,
            Service::PhiClient(_) => Capability::PhiClient,
            Service::Storage(_) => Capability::Storage,
            Service::UserState(_) => Capability::UserState,
            Service::ConversationState(_) => Capability::ConversationState,
            Service::Augmentation(_) => Capability::Augmentation,
            Service::Engine(_) => Capability::Engine,
        }
    }
}

impl fmt::Debug for Service {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Service::Storage(backend) => write!(f, "Service::Storage({})", backend.name()),
            Service::Engine(engine) => write!(f, "Service::Engine({})", engine.kind()),
            other => write!(f, "Service::{:?}", other.capability()),
        }
    }
}

/// Collects services during startup.
#[derive(Debug, Default)]
pub struct RegistryBuilder {
    services: BTreeMap<Capability, Service>,
}

impl RegistryBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a service. Each capability may be registered once.
    pub fn register(&mut self, service: Service) -> Result<&mut Self, StartupError> {
        let capability = service.capability();
        if self.services.contains_key(&capability) {
            return Err(StartupError::DuplicateRegistration {
                capability: capability.to_string(),
            });
        }
        debug!(capability = %capability, "Service registered");
        self.services.insert(capability, service);
        Ok(self)
    }

    /// Register a service when one was built.
    pub fn register_optional(
        &mut self,
        service: Option<Service>,
    ) -> Result<&mut Self, StartupError> {
        match service {
            Some(service) => self.register(service),
            None => Ok(self),
        }
    }

    pub fn is_registered(&self, capability: Capability) -> bool {
        self.services.contains_key(&capability)
    }

    /// Freeze the registry. Nothing can be registered afterwards.
    pub fn seal(self) -> ServiceRegistry {
        ServiceRegistry {
            services: self.services,
        }
    }
}

/// The immutable startup graph handed to request handling.
#[derive(Debug, Clone)]
pub struct ServiceRegistry {
    services: BTreeMap<Capability, Service>,
}

impl ServiceRegistry {
    /// Resolve a capability. Asking for one that was never registered is a
    /// startup ordering violation.
    pub fn resolve(&self, capability: Capability) -> Result<&Service, StartupError> {
        self.try_resolve(capability)
            .ok_or_else(|| StartupError::StartupOrderingViolation {
                capability: capability.to_string(),
            })
    }

    pub fn try_resolve(&self, capability: Capability) -> Option<&Service> {
        self.services.get(&capability)
    }

    /// Registered capabilities in declaration order.
    pub fn capabilities(&self) -> impl Iterator<Item = Capability> + '_ {
        self.services.keys().copied()
    }

    pub fn configuration(&self) -> Result<Arc<Configuration>, StartupError> {
        match self.resolve(Capability::Configuration)? {
            Service::Configuration(config) => Ok(config.clone()),
            other => Err(mismatch(other)),
        }
    }

    pub fn credential(&self) -> Result<Arc<dyn TokenCredential>, StartupError> {
        match self.resolve(Capability::Credential)? {
            Service::Credential(credential) => Ok(credential.clone()),
            other => Err(mismatch(other)),
        }
    }

    pub fn openai_client(&self) -> Result<Arc<AzureOpenAiClient>, StartupError> {
        match self.resolve(Capability::OpenAiClient)? {
            Service::OpenAiClient(client) => Ok(client.clone()),
            other => Err(mismatch(other)),
        }
    }

    pub fn phi_client(&self) -> Option<Arc<PhiClient>> {
        match self.try_resolve(Capability::PhiClient)? {
            Service::PhiClient(client) => Some(client.clone()),
            _ => None,
        }
    }

    pub fn storage(&self) -> Result<StorageBackend, StartupError> {
        match self.resolve(Capability::Storage)? {
            Service::Storage(backend) => Ok(backend.clone()),
            other => Err(mismatch(other)),
        }
    }

    pub fn user_state(&self) -> Result<BotState, StartupError> {
        match self.resolve(Capability::UserState)? {
            Service::UserState(state) => Ok(state.clone()),
            other => Err(mismatch(other)),
        }
    }

    pub fn conversation_state(&self) -> Result<BotState, StartupError> {
        match self.resolve(Capability::ConversationState)? {
            Service::ConversationState(state) => Ok(state.clone()),
            other => Err(mismatch(other)),
        }
    }

    pub fn augmentation(&self) -> Option<Arc<AugmentationSource>> {
        match self.try_resolve(Capability::Augmentation)? {
            Service::Augmentation(source) => Some(source.clone()),
            _ => None,
        }
    }

    pub fn engine(&self) -> Result<Arc<dyn Bot>, StartupError> {
        match self.resolve(Capability::Engine)? {
            Service::Engine(engine) => Ok(engine.clone()),
            other => Err(mismatch(other)),
        }
    }
}

// Unreachable while `register` keys services by their own capability.
fn mismatch(service: &Service) -> StartupError {
    StartupError::StartupOrderingViolation {
        capability: service.capability().to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use genaibot_storage::MemoryStorage;

    fn config_service() -> Service {
        Service::Configuration(Arc::new(Configuration::default()))
    }

    #[test]
    fn duplicate_registration_is_rejected() {
        let mut builder = RegistryBuilder::new();
        builder.register(config_service()).unwrap();
        let err = builder.register(config_service()).unwrap_err();
        assert_eq!(
            err,
            StartupError::DuplicateRegistration {
                capability: "configuration".into()
            }
        );
    }

    #[test]
    fn unregistered_capability_is_an_ordering_violation() {
        let registry = RegistryBuilder::new().seal();
        assert_eq!(
            registry.resolve(Capability::Engine).unwrap_err(),
            StartupError::StartupOrderingViolation {
                capability: "engine".into()
            }
        );
        assert!(registry.engine().is_err());
        assert!(registry.try_resolve(Capability::Engine).is_none());
    }

    #[test]
    fn optional_capabilities_read_as_none() {
        let mut builder = RegistryBuilder::new();
        builder.register_optional(None).unwrap();
        let registry = builder.seal();
        assert!(registry.phi_client().is_none());
        assert!(registry.augmentation().is_none());
    }

    #[test]
    fn only_phi_and_augmentation_are_optional() {
        let optional: Vec<_> = Capability::ALL
            .into_iter()
            .filter(Capability::is_optional)
            .collect();
        assert_eq!(optional, [Capability::PhiClient, Capability::Augmentation]);
    }

    #[test]
    fn typed_accessors_return_registered_instances() {
        let backend = StorageBackend::Memory(Arc::new(MemoryStorage::new()));
        let mut builder = RegistryBuilder::new();
        builder
            .register(config_service())
            .unwrap()
            .register(Service::Storage(backend.clone()))
            .unwrap()
            .register(Service::UserState(BotState::user(backend.storage())))
            .unwrap();
        assert!(builder.is_registered(Capability::UserState));

        let registry = builder.seal();
        assert_eq!(registry.storage().unwrap().name(), "memory");
        assert!(Arc::ptr_eq(
            registry.user_state().unwrap().storage(),
            &backend.storage()
        ));
        assert_eq!(
            registry.capabilities().collect::<Vec<_>>(),
            [Capability::Configuration, Capability::Storage, Capability::UserState]
        );
    }
}
