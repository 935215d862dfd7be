//! Identity for GenAIBot — one token credential shared by every outbound client.
//!
//! Provides:
//! - **TokenCredential**: the trait clients authenticate through
//! - **DefaultCredential**: environment client secret, else managed identity
//! - **StaticCredential**: a fixed token for local emulators and tests
//!
//! Construction never touches the network. Tokens are acquired on first use
//! and cached per scope.

pub mod credential;
pub mod token;

pub use credential::{
    AppServiceIdentity, ClientSecretSettings, CredentialOptions, CredentialSource,
    DefaultCredential, StaticCredential,
};
pub use token::{AccessToken, CredentialError, TokenCredential};
