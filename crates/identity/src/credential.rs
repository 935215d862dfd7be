//! The shared default credential.
//!
//! Source order mirrors the usual cloud default chain:
//! 1. client secret from `AZURE_TENANT_ID` / `AZURE_CLIENT_ID` / `AZURE_CLIENT_SECRET`
//! 2. App Service managed identity (`IDENTITY_ENDPOINT` + `IDENTITY_HEADER`)
//! 3. instance metadata service managed identity
//!
//! The first configured source is used; its failures are not masked by
//! falling through to the next one.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::Mutex;
use tracing::debug;

use crate::token::{AccessToken, CredentialError, TokenCredential, TokenResponse};

const DEFAULT_AUTHORITY_HOST: &str = "https://login.microsoftonline.com";
const IMDS_TOKEN_ENDPOINT: &str = "http://169.254.169.254/metadata/identity/oauth2/token";
const IMDS_API_VERSION: &str = "2018-02-01";
const APP_SERVICE_API_VERSION: &str = "2019-08-01";
const REQUEST_TIMEOUT_SECS: u64 = 30;

/// Service principal settings for the client-credentials grant.
#[derive(Clone, PartialEq, Eq)]
pub struct ClientSecretSettings {
    pub tenant_id: String,
    pub client_id: String,
    pub client_secret: String,
    pub authority_host: String,
}

impl std::fmt::Debug for ClientSecretSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientSecretSettings")
            .field("tenant_id", &self.tenant_id)
            .field("client_id", &self.client_id)
            .field("client_secret", &"[REDACTED]")
            .field("authority_host", &self.authority_host)
            .finish()
    }
}

/// App Service / Functions managed identity endpoint.
#[derive(Clone, PartialEq, Eq)]
pub struct AppServiceIdentity {
    pub endpoint: String,
    pub header: String,
}

impl std::fmt::Debug for AppServiceIdentity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppServiceIdentity")
            .field("endpoint", &self.endpoint)
            .field("header", &"[REDACTED]")
            .finish()
    }
}

/// Inputs to [`DefaultCredential`], captured once at construction.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CredentialOptions {
    /// Client id of a user-assigned managed identity.
    pub managed_identity_client_id: Option<String>,
    pub client_secret: Option<ClientSecretSettings>,
    pub app_service: Option<AppServiceIdentity>,
}

impl CredentialOptions {
    /// Capture credential settings through an arbitrary variable lookup.
    pub fn from_vars<F>(client_id_hint: Option<&str>, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str| lookup(name).filter(|v| !v.is_empty());

        let client_secret = match (
            var("AZURE_TENANT_ID"),
            var("AZURE_CLIENT_ID"),
            var("AZURE_CLIENT_SECRET"),
        ) {
            (Some(tenant_id), Some(client_id), Some(client_secret)) => Some(ClientSecretSettings {
                tenant_id,
                client_id,
                client_secret,
                authority_host: var("AZURE_AUTHORITY_HOST")
                    .unwrap_or_else(|| DEFAULT_AUTHORITY_HOST.into()),
            }),
            _ => None,
        };

        let app_service = match (var("IDENTITY_ENDPOINT"), var("IDENTITY_HEADER")) {
            (Some(endpoint), Some(header)) => Some(AppServiceIdentity { endpoint, header }),
            _ => None,
        };

        Self {
            managed_identity_client_id: client_id_hint
                .filter(|id| !id.is_empty())
                .map(str::to_string),
            client_secret,
            app_service,
        }
    }

    /// The source that will serve tokens.
    pub fn source(&self) -> CredentialSource {
        if self.client_secret.is_some() {
            CredentialSource::ClientSecret
        } else if self.app_service.is_some() {
            CredentialSource::AppServiceManagedIdentity
        } else {
            CredentialSource::InstanceMetadataManagedIdentity
        }
    }
}

/// Where tokens come from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CredentialSource {
    ClientSecret,
    AppServiceManagedIdentity,
    InstanceMetadataManagedIdentity,
}

impl std::fmt::Display for CredentialSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            CredentialSource::ClientSecret => "environment client secret",
            CredentialSource::AppServiceManagedIdentity => "app service managed identity",
            CredentialSource::InstanceMetadataManagedIdentity => "instance metadata managed identity",
        })
    }
}

/// The process-wide credential. Share it behind an `Arc`.
pub struct DefaultCredential {
    options: CredentialOptions,
    http: reqwest::Client,
    cache: Mutex<HashMap<String, AccessToken>>,
}

impl DefaultCredential {
    pub fn new(options: CredentialOptions) -> Result<Self, reqwest::Error> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()?;

        Ok(Self {
            options,
            http,
            cache: Mutex::new(HashMap::new()),
        })
    }

    pub fn options(&self) -> &CredentialOptions {
        &self.options
    }

    pub fn source(&self) -> CredentialSource {
        self.options.source()
    }

    async fn cached(&self, scope: &str) -> Option<AccessToken> {
        let cache = self.cache.lock().await;
        cache
            .get(scope)
            .filter(|token| !token.needs_refresh(Utc::now()))
            .cloned()
    }

    async fn fetch(&self, scope: &str) -> Result<AccessToken, CredentialError> {
        let request = match (&self.options.client_secret, &self.options.app_service) {
            (Some(settings), _) => {
                let url = format!(
                    "{}/{}/oauth2/v2.0/token",
                    settings.authority_host.trim_end_matches('/'),
                    settings.tenant_id
                );
                self.http.post(url).form(&[
                    ("grant_type", "client_credentials"),
                    ("client_id", settings.client_id.as_str()),
                    ("client_secret", settings.client_secret.as_str()),
                    ("scope", scope),
                ])
            }
            (None, Some(app_service)) => {
                let mut query = vec![
                    ("api-version", APP_SERVICE_API_VERSION.to_string()),
                    ("resource", resource_for_scope(scope)),
                ];
                if let Some(id) = &self.options.managed_identity_client_id {
                    query.push(("client_id", id.clone()));
                }
                self.http
                    .get(&app_service.endpoint)
                    .header("X-IDENTITY-HEADER", &app_service.header)
                    .query(&query)
            }
            (None, None) => {
                let mut query = vec![
                    ("api-version", IMDS_API_VERSION.to_string()),
                    ("resource", resource_for_scope(scope)),
                ];
                if let Some(id) = &self.options.managed_identity_client_id {
                    query.push(("client_id", id.clone()));
                }
                self.http
                    .get(IMDS_TOKEN_ENDPOINT)
                    .header("Metadata", "true")
                    .query(&query)
            }
        };

        debug!(source = %self.source(), scope, "Requesting access token");

        let response = request
            .send()
            .await
            .map_err(|e| CredentialError::Unreachable(e.to_string()))?;

        let status = response.status().as_u16();
        if status != 200 {
            let message = response.text().await.unwrap_or_default();
            return Err(CredentialError::Rejected { status, message });
        }

        let body: TokenResponse = response
            .json()
            .await
            .map_err(|e| CredentialError::MalformedResponse(e.to_string()))?;

        body.into_access_token(Utc::now())
    }
}

#[async_trait]
impl TokenCredential for DefaultCredential {
    async fn get_token(&self, scope: &str) -> Result<AccessToken, CredentialError> {
        if let Some(token) = self.cached(scope).await {
            return Ok(token);
        }

        // Never hold the cache lock across a fetch.
        let token = self.fetch(scope).await?;
        self.cache
            .lock()
            .await
            .insert(scope.to_string(), token.clone());
        Ok(token)
    }
}

impl std::fmt::Debug for DefaultCredential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DefaultCredential")
            .field("source", &self.source())
            .field(
                "managed_identity_client_id",
                &self.options.managed_identity_client_id,
            )
            .finish()
    }
}

/// A credential that always returns the same token.
#[derive(Clone)]
pub struct StaticCredential {
    token: AccessToken,
}

impl StaticCredential {
    /// A token valid for one day from now.
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: AccessToken::new(token, Utc::now() + chrono::Duration::days(1)),
        }
    }
}

#[async_trait]
impl TokenCredential for StaticCredential {
    async fn get_token(&self, _scope: &str) -> Result<AccessToken, CredentialError> {
        Ok(self.token.clone())
    }
}

/// Managed identity endpoints take a resource, not a `/.default` scope.
fn resource_for_scope(scope: &str) -> String {
    scope.strip_suffix("/.default").unwrap_or(scope).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn vars(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn no_variables_means_instance_metadata() {
        let options = CredentialOptions::from_vars(None, vars(&[]));
        assert_eq!(options.source(), CredentialSource::InstanceMetadataManagedIdentity);
        assert_eq!(options.managed_identity_client_id, None);
    }

    #[test]
    fn client_id_hint_is_kept_and_empty_hint_dropped() {
        let options = CredentialOptions::from_vars(Some("11111111-2222"), vars(&[]));
        assert_eq!(options.managed_identity_client_id.as_deref(), Some("11111111-2222"));

        let options = CredentialOptions::from_vars(Some(""), vars(&[]));
        assert_eq!(options.managed_identity_client_id, None);
    }

    #[test]
    fn complete_client_secret_wins_over_managed_identity() {
        let options = CredentialOptions::from_vars(
            None,
            vars(&[
                ("AZURE_TENANT_ID", "tenant"),
                ("AZURE_CLIENT_ID", "client"),
                ("AZURE_CLIENT_SECRET", "secret"),
                ("IDENTITY_ENDPOINT", "http://localhost:4141/msi/token"),
                ("IDENTITY_HEADER", "hdr"),
            ]),
        );
        assert_eq!(options.source(), CredentialSource::ClientSecret);
        let settings = options.client_secret.unwrap();
        assert_eq!(settings.authority_host, DEFAULT_AUTHORITY_HOST);
    }

    #[test]
    fn partial_client_secret_is_ignored() {
        let options = CredentialOptions::from_vars(
            None,
            vars(&[
                ("AZURE_TENANT_ID", "tenant"),
                ("AZURE_CLIENT_ID", "client"),
                ("IDENTITY_ENDPOINT", "http://localhost:4141/msi/token"),
                ("IDENTITY_HEADER", "hdr"),
            ]),
        );
        assert_eq!(options.source(), CredentialSource::AppServiceManagedIdentity);
    }

    #[test]
    fn scope_to_resource() {
        assert_eq!(
            resource_for_scope("https://cognitiveservices.azure.com/.default"),
            "https://cognitiveservices.azure.com"
        );
        assert_eq!(resource_for_scope("https://x"), "https://x");
    }

    #[test]
    fn debug_output_hides_secrets() {
        let options = CredentialOptions::from_vars(
            None,
            vars(&[
                ("AZURE_TENANT_ID", "tenant"),
                ("AZURE_CLIENT_ID", "client"),
                ("AZURE_CLIENT_SECRET", "hunter2"),
            ]),
        );
        assert!(!format!("{options:?}").contains("hunter2"));
    }

    #[tokio::test]
    async fn construction_does_not_contact_identity_endpoint() {
        let credential = DefaultCredential::new(CredentialOptions::default()).unwrap();
        assert_eq!(
            credential.source(),
            CredentialSource::InstanceMetadataManagedIdentity
        );
        assert!(credential.cache.lock().await.is_empty());
    }

    #[tokio::test]
    async fn cached_scope_is_served_while_another_scope_fetches() {
        // Accepts connections but never answers, so the fetch hangs.
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let authority_host = format!("http://{}", listener.local_addr().unwrap());

        let credential = Arc::new(
            DefaultCredential::new(CredentialOptions {
                client_secret: Some(ClientSecretSettings {
                    tenant_id: "tenant".into(),
                    client_id: "client".into(),
                    client_secret: "secret".into(),
                    authority_host,
                }),
                ..CredentialOptions::default()
            })
            .unwrap(),
        );
        let cached = AccessToken::new("cosmos-token", Utc::now() + chrono::Duration::hours(1));
        credential
            .cache
            .lock()
            .await
            .insert("https://cosmos.azure.com/.default".into(), cached);

        let pending = {
            let credential = credential.clone();
            tokio::spawn(async move {
                credential
                    .get_token("https://cognitiveservices.azure.com/.default")
                    .await
            })
        };
        tokio::time::sleep(Duration::from_millis(200)).await;

        let token = tokio::time::timeout(
            Duration::from_secs(2),
            credential.get_token("https://cosmos.azure.com/.default"),
        )
        .await
        .expect("cached scope blocked behind an in-flight fetch")
        .unwrap();
        assert_eq!(token.token, "cosmos-token");

        pending.abort();
        drop(listener);
    }

    #[tokio::test]
    async fn static_credential_returns_its_token() {
        let credential = StaticCredential::new("local-token");
        let token = credential.get_token("https://cosmos.azure.com/.default").await.unwrap();
        assert_eq!(token.token, "local-token");
        assert!(!token.needs_refresh(Utc::now()));
    }
}
