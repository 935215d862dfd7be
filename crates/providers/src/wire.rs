//! Chat-completions wire format shared by the Azure OpenAI and Phi clients.

use genaibot_core::augmentation::{AugmentationSource, DataSourceAuthentication};
use genaibot_core::error::ProviderError;
use genaibot_core::inference::{ChatRequest, ChatResponse, Usage};
use genaibot_core::message::Message;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tracing::warn;

#[derive(Debug, Serialize)]
pub(crate) struct ApiMessage {
    pub role: &'static str,
    pub content: String,
}

pub(crate) fn to_api_messages(messages: &[Message]) -> Vec<ApiMessage> {
    messages
        .iter()
        .map(|m| ApiMessage {
            role: m.role.as_str(),
            content: m.content.clone(),
        })
        .collect()
}

/// `{"type": "azure_search", "parameters": {...}}`
pub(crate) fn to_data_source(source: &AugmentationSource) -> Value {
    let authentication = match source.authentication {
        DataSourceAuthentication::SystemAssignedManagedIdentity => {
            json!({ "type": "system_assigned_managed_identity" })
        }
    };

    let mut parameters = json!({
        "endpoint": source.endpoint,
        "index_name": source.index_name,
        "authentication": authentication,
    });
    if let Some(role) = &source.role_information {
        parameters["role_information"] = json!(role);
    }

    json!({ "type": "azure_search", "parameters": parameters })
}

/// Build the JSON body. `model` is only sent to endpoints that route by it.
pub(crate) fn chat_body(request: &ChatRequest, model: Option<&str>) -> Value {
    let mut body = json!({
        "messages": to_api_messages(&request.messages),
    });

    if let Some(model) = model {
        body["model"] = json!(model);
    }
    if let Some(temperature) = request.temperature {
        body["temperature"] = json!(temperature);
    }
    if let Some(max_tokens) = request.max_tokens {
        body["max_tokens"] = json!(max_tokens);
    }
    if let Some(source) = &request.augmentation {
        body["data_sources"] = json!([to_data_source(source)]);
    }

    body
}

#[derive(Debug, Deserialize)]
pub(crate) struct ApiResponse {
    #[serde(default)]
    pub model: String,
    pub choices: Vec<ApiChoice>,
    #[serde(default)]
    pub usage: Option<ApiUsage>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ApiChoice {
    pub message: ApiResponseMessage,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ApiResponseMessage {
    #[serde(default)]
    pub content: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ApiUsage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub total_tokens: u32,
}

impl ApiResponse {
    pub(crate) fn into_chat_response(self) -> Result<ChatResponse, ProviderError> {
        let choice = self
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| ProviderError::ApiError {
                status_code: 200,
                message: "No choices in response".into(),
            })?;

        Ok(ChatResponse {
            message: Message::assistant(choice.message.content.unwrap_or_default()),
            usage: self.usage.map(|u| Usage {
                prompt_tokens: u.prompt_tokens,
                completion_tokens: u.completion_tokens,
                total_tokens: u.total_tokens,
            }),
            model: self.model,
        })
    }
}

/// Map non-success statuses onto provider errors.
pub(crate) async fn check_status(
    client: &str,
    response: reqwest::Response,
) -> Result<reqwest::Response, ProviderError> {
    let status = response.status().as_u16();

    if status == 429 {
        let retry_after_secs = response
            .headers()
            .get("retry-after")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.parse().ok())
            .unwrap_or(5);
        return Err(ProviderError::RateLimited { retry_after_secs });
    }

    if status == 401 || status == 403 {
        return Err(ProviderError::AuthenticationFailed(format!(
            "{client} rejected the credential (status {status})"
        )));
    }

    if !(200..300).contains(&status) {
        let error_body = response.text().await.unwrap_or_default();
        warn!(client, status, body = %error_body, "Inference endpoint returned error");
        return Err(ProviderError::ApiError {
            status_code: status,
            message: error_body,
        });
    }

    Ok(response)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn source(role: Option<&str>) -> AugmentationSource {
        AugmentationSource {
            endpoint: "https://search.example.net".into(),
            index_name: "docs".into(),
            authentication: DataSourceAuthentication::SystemAssignedManagedIdentity,
            role_information: role.map(str::to_string),
        }
    }

    #[test]
    fn message_conversion() {
        let messages = vec![Message::system("You are helpful"), Message::user("Hello")];
        let api_messages = to_api_messages(&messages);
        assert_eq!(api_messages.len(), 2);
        assert_eq!(api_messages[0].role, "system");
        assert_eq!(api_messages[1].role, "user");
    }

    #[test]
    fn body_without_augmentation_has_no_data_sources() {
        let request = ChatRequest {
            messages: vec![Message::user("hi")],
            max_tokens: Some(256),
            ..ChatRequest::default()
        };
        let body = chat_body(&request, None);
        assert!(body.get("data_sources").is_none());
        assert!(body.get("model").is_none());
        assert_eq!(body["max_tokens"], 256);
    }

    #[test]
    fn augmentation_serializes_as_azure_search() {
        let request = ChatRequest {
            messages: vec![Message::user("hi")],
            augmentation: Some(source(Some("Answer from the handbook."))),
            ..ChatRequest::default()
        };
        let body = chat_body(&request, Some("phi-3"));
        let ds = &body["data_sources"][0];
        assert_eq!(ds["type"], "azure_search");
        assert_eq!(ds["parameters"]["index_name"], "docs");
        assert_eq!(
            ds["parameters"]["authentication"]["type"],
            "system_assigned_managed_identity"
        );
        assert_eq!(ds["parameters"]["role_information"], "Answer from the handbook.");
        assert_eq!(body["model"], "phi-3");
    }

    #[test]
    fn role_information_is_omitted_when_absent() {
        let ds = to_data_source(&source(None));
        assert!(ds["parameters"].get("role_information").is_none());
    }

    #[test]
    fn response_parsing() {
        let raw = r#"{"model":"gpt-4o","choices":[{"message":{"role":"assistant","content":"Hi!"}}],
                      "usage":{"prompt_tokens":5,"completion_tokens":2,"total_tokens":7}}"#;
        let parsed: ApiResponse = serde_json::from_str(raw).unwrap();
        let response = parsed.into_chat_response().unwrap();
        assert_eq!(response.message.content, "Hi!");
        assert_eq!(response.model, "gpt-4o");
        assert_eq!(response.usage.unwrap().total_tokens, 7);
    }

    #[test]
    fn empty_choices_is_an_error() {
        let parsed: ApiResponse = serde_json::from_str(r#"{"choices":[]}"#).unwrap();
        assert!(parsed.into_chat_response().is_err());
    }
}
