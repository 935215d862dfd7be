//! Access tokens and the credential trait.

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use serde::Deserialize;

/// Tokens this close to expiry are refreshed before use.
const REFRESH_MARGIN_SECS: i64 = 300;

/// A bearer token and its expiry.
#[derive(Clone, PartialEq, Eq)]
pub struct AccessToken {
    pub token: String,
    pub expires_on: DateTime<Utc>,
}

impl AccessToken {
    pub fn new(token: impl Into<String>, expires_on: DateTime<Utc>) -> Self {
        Self {
            token: token.into(),
            expires_on,
        }
    }

    /// Whether the token should be replaced before being used at `now`.
    pub fn needs_refresh(&self, now: DateTime<Utc>) -> bool {
        self.expires_on - now <= Duration::seconds(REFRESH_MARGIN_SECS)
    }
}

impl std::fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AccessToken")
            .field("token", &"[REDACTED]")
            .field("expires_on", &self.expires_on)
            .finish()
    }
}

/// Something that can hand out bearer tokens for a scope
/// (e.g. `https://cognitiveservices.azure.com/.default`).
#[async_trait]
pub trait TokenCredential: Send + Sync {
    async fn get_token(&self, scope: &str) -> Result<AccessToken, CredentialError>;
}

/// Credential errors. Raised on first use, never at construction.
#[derive(Debug, Clone, thiserror::Error)]
pub enum CredentialError {
    #[error("Identity endpoint unreachable: {0}")]
    Unreachable(String),

    #[error("Identity endpoint rejected the request (status {status}): {message}")]
    Rejected { status: u16, message: String },

    #[error("Malformed token response: {0}")]
    MalformedResponse(String),
}

/// The token payload shared by the Entra ID and managed identity endpoints.
///
/// `expires_in` (relative) and `expires_on` (epoch seconds) arrive either as
/// numbers or as strings depending on the endpoint.
#[derive(Debug, Deserialize)]
pub(crate) struct TokenResponse {
    pub access_token: String,
    #[serde(default)]
    pub expires_in: Option<serde_json::Value>,
    #[serde(default)]
    pub expires_on: Option<serde_json::Value>,
}

impl TokenResponse {
    pub(crate) fn into_access_token(self, now: DateTime<Utc>) -> Result<AccessToken, CredentialError> {
        let expires_on = if let Some(epoch) = self.expires_on.as_ref().and_then(as_i64) {
            DateTime::from_timestamp(epoch, 0).ok_or_else(|| {
                CredentialError::MalformedResponse(format!("expires_on out of range: {epoch}"))
            })?
        } else if let Some(secs) = self.expires_in.as_ref().and_then(as_i64) {
            now + Duration::seconds(secs)
        } else {
            return Err(CredentialError::MalformedResponse(
                "token response carries no expiry".into(),
            ));
        };

        Ok(AccessToken::new(self.access_token, expires_on))
    }
}

fn as_i64(value: &serde_json::Value) -> Option<i64> {
    match value {
        serde_json::Value::Number(n) => n.as_i64(),
        serde_json::Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}
