//! Cosmos DB partitioned storage backend.
//!
//! Implements [`Storage`] over the Cosmos DB SQL REST API:
//! - One document per key, partition key path `/id`
//! - Document layout `{ "id": <escaped key>, "realId": <key>, "document": <value> }`
//! - Entra ID bearer tokens from the shared credential
//!
//! # Setup
//!
//! The container must already exist and be partitioned on `/id`. The
//! host identity needs the "Cosmos DB Built-in Data Contributor" role.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use genaibot_core::error::{StartupError, StorageError};
use genaibot_core::storage::Storage;
use genaibot_identity::TokenCredential;
use reqwest::{StatusCode, Url};
use serde_json::{Value, json};
use sha2::{Digest, Sha256};
use tracing::debug;
use url::form_urlencoded;

/// Token scope for the Cosmos DB data plane.
pub const COSMOS_SCOPE: &str = "https://cosmos.azure.com/.default";

const API_VERSION: &str = "2018-12-31";
const MAX_KEY_LENGTH: usize = 255;
const KEY_ESCAPE_CHAR: char = '*';
const ILLEGAL_KEY_CHARS: &[char] = &['\\', '?', '/', '#', '\t', '\n', '\r', KEY_ESCAPE_CHAR];
const HASH_SUFFIX_LENGTH: usize = 16;
const REQUEST_TIMEOUT_SECS: u64 = 30;

/// Where the state container lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CosmosDbStorageOptions {
    pub endpoint: String,
    pub database_id: String,
    pub container_id: String,
}

impl CosmosDbStorageOptions {
    fn endpoint_url(&self) -> Result<Url, StartupError> {
        let url = Url::parse(&self.endpoint).map_err(|e| {
            StartupError::invalid(genaibot_config::keys::AZURE_COSMOSDB_ENDPOINT, e.to_string())
        })?;
        if url.cannot_be_a_base() {
            return Err(StartupError::invalid(
                genaibot_config::keys::AZURE_COSMOSDB_ENDPOINT,
                "endpoint must be an absolute URL",
            ));
        }
        Ok(url)
    }
}

/// Cosmos DB backed storage.
pub struct CosmosDbPartitionedStorage {
    endpoint: Url,
    database_id: String,
    container_id: String,
    credential: Arc<dyn TokenCredential>,
    http: reqwest::Client,
}

impl CosmosDbPartitionedStorage {
    /// Validate options and build the HTTP client. No request is sent.
    pub fn new(
        options: CosmosDbStorageOptions,
        credential: Arc<dyn TokenCredential>,
    ) -> Result<Self, StartupError> {
        let endpoint = options.endpoint_url()?;

        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .map_err(|e| StartupError::ClientConstruction {
                client: "cosmosdb".into(),
                reason: e.to_string(),
            })?;

        Ok(Self {
            endpoint,
            database_id: options.database_id,
            container_id: options.container_id,
            credential,
            http,
        })
    }

    pub fn database_id(&self) -> &str {
        &self.database_id
    }

    pub fn container_id(&self) -> &str {
        &self.container_id
    }

    /// `{endpoint}/dbs/{db}/colls/{container}/docs[/{id}]`
    fn docs_url(&self, document_id: Option<&str>) -> Result<Url, StorageError> {
        let mut url = self.endpoint.clone();
        {
            let mut segments = url
                .path_segments_mut()
                .map_err(|_| StorageError::Backend("endpoint cannot be a base URL".into()))?;
            segments
                .pop_if_empty()
                .extend([
                    "dbs",
                    self.database_id.as_str(),
                    "colls",
                    self.container_id.as_str(),
                    "docs",
                ]);
            if let Some(id) = document_id {
                segments.push(id);
            }
        }
        Ok(url)
    }

    async fn request(
        &self,
        method: reqwest::Method,
        url: Url,
        partition_key: &str,
    ) -> Result<reqwest::RequestBuilder, StorageError> {
        let token = self
            .credential
            .get_token(COSMOS_SCOPE)
            .await
            .map_err(|e| StorageError::Authentication(e.to_string()))?;

        let partition_header = serde_json::to_string(&[partition_key])
            .map_err(|e| StorageError::Backend(e.to_string()))?;

        Ok(self
            .http
            .request(method, url)
            .header("Authorization", aad_authorization(&token.token))
            .header("x-ms-version", API_VERSION)
            .header("x-ms-date", Utc::now().format("%a, %d %b %Y %H:%M:%S GMT").to_string())
            .header("x-ms-documentdb-partitionkey", partition_header))
    }
}

#[async_trait]
impl Storage for CosmosDbPartitionedStorage {
    fn name(&self) -> &str {
        "cosmosdb"
    }

    async fn put(&self, key: &str, value: Value) -> Result<(), StorageError> {
        let id = escape_key(key);
        let url = self.docs_url(None)?;
        let document = json!({ "id": id, "realId": key, "document": value });

        debug!(key, "Upserting state document");
        let response = self
            .request(reqwest::Method::POST, url, &id)
            .await?
            .header("x-ms-documentdb-is-upsert", "True")
            .json(&document)
            .send()
            .await
            .map_err(|e| StorageError::Backend(e.to_string()))?;

        match response.status() {
            StatusCode::OK | StatusCode::CREATED => Ok(()),
            status => Err(error_for(status, response).await),
        }
    }

    async fn get(&self, key: &str) -> Result<Option<Value>, StorageError> {
        let id = escape_key(key);
        let url = self.docs_url(Some(&id))?;

        let response = self
            .request(reqwest::Method::GET, url, &id)
            .await?
            .send()
            .await
            .map_err(|e| StorageError::Backend(e.to_string()))?;

        match response.status() {
            StatusCode::OK => {
                let body: Value = response
                    .json()
                    .await
                    .map_err(|e| StorageError::Malformed {
                        key: key.to_string(),
                        reason: e.to_string(),
                    })?;
                unwrap_document(key, body).map(Some)
            }
            StatusCode::NOT_FOUND => Ok(None),
            status => Err(error_for(status, response).await),
        }
    }

    async fn delete(&self, key: &str) -> Result<(), StorageError> {
        let id = escape_key(key);
        let url = self.docs_url(Some(&id))?;

        let response = self
            .request(reqwest::Method::DELETE, url, &id)
            .await?
            .send()
            .await
            .map_err(|e| StorageError::Backend(e.to_string()))?;

        match response.status() {
            StatusCode::NO_CONTENT | StatusCode::OK | StatusCode::NOT_FOUND => Ok(()),
            status => Err(error_for(status, response).await),
        }
    }
}

async fn error_for(status: StatusCode, response: reqwest::Response) -> StorageError {
    let message = response.text().await.unwrap_or_default();
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => StorageError::Authentication(message),
        _ => StorageError::Request {
            status_code: status.as_u16(),
            message,
        },
    }
}

fn unwrap_document(key: &str, mut body: Value) -> Result<Value, StorageError> {
    body.get_mut("document")
        .map(Value::take)
        .ok_or_else(|| StorageError::Malformed {
            key: key.to_string(),
            reason: "missing 'document' field".into(),
        })
}

/// Escape characters Cosmos DB does not accept in document ids, and keep
/// the result within the id length limit.
pub fn escape_key(key: &str) -> String {
    let mut escaped = String::with_capacity(key.len());
    for c in key.chars() {
        if ILLEGAL_KEY_CHARS.contains(&c) {
            let mut buf = [0u8; 4];
            escaped.push(KEY_ESCAPE_CHAR);
            escaped.push_str(&hex::encode(c.encode_utf8(&mut buf).as_bytes()));
        } else {
            escaped.push(c);
        }
    }

    if escaped.len() <= MAX_KEY_LENGTH {
        return escaped;
    }

    let hash = hex::encode(Sha256::digest(key.as_bytes()));

    let mut cut = MAX_KEY_LENGTH - HASH_SUFFIX_LENGTH;
    while !escaped.is_char_boundary(cut) {
        cut -= 1;
    }
    escaped.truncate(cut);
    escaped.push_str(&hash[..HASH_SUFFIX_LENGTH]);
    escaped
}

/// `type=aad&ver=1.0&sig=<token>`, percent-encoded as the header requires.
fn aad_authorization(token: &str) -> String {
    let raw = format!("type=aad&ver=1.0&sig={token}");
    form_urlencoded::byte_serialize(raw.as_bytes()).collect()
}
