//! OpenAI-compatible chat-completions advisory client

use crate::{http_client, AdvisoryConfig};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use suitability_core::{AdvisoryError, AdvisoryProvider};
use tracing::debug;

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    kind: &'static str,
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    temperature: f32,
    max_tokens: u32,
    response_format: ResponseFormat,
    messages: Vec<ChatMessage<'a>>,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChatChoiceMessage {
    content: Option<String>,
}

impl ChatResponse {
    fn into_content(self) -> Result<String, AdvisoryError> {
        self.choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .map(|c| c.trim().to_string())
            .filter(|c| !c.is_empty())
            .ok_or(AdvisoryError::EmptyResponse)
    }
}

/// Advisory provider backed by a chat-completions endpoint
pub struct OpenAiAdvisory {
    config: AdvisoryConfig,
    client: reqwest::Client,
}

impl OpenAiAdvisory {
    pub fn new(config: AdvisoryConfig) -> Result<Self, AdvisoryError> {
        let client =
            http_client(config.timeout_sec).map_err(|e| AdvisoryError::RequestFailed(e.to_string()))?;
        Ok(Self { config, client })
    }

    pub fn model(&self) -> &str {
        &self.config.model
    }

    fn request<'a>(&'a self, system: &'a str, user: &'a str) -> ChatRequest<'a> {
        ChatRequest {
            model: &self.config.model,
            temperature: self.config.temperature,
            max_tokens: self.config.max_tokens,
            response_format: ResponseFormat {
                kind: "json_object",
            },
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: system,
                },
                ChatMessage {
                    role: "user",
                    content: user,
                },
            ],
        }
    }
}

#[async_trait]
impl AdvisoryProvider for OpenAiAdvisory {
    async fn complete_json(&self, system: &str, user: &str) -> Result<String, AdvisoryError> {
        let url = format!("{}/chat/completions", self.config.base_url);
        debug!("Requesting advisory from {} ({})", url, self.config.model);

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.config.api_key)
            .json(&self.request(system, user))
            .send()
            .await
            .map_err(|e| AdvisoryError::RequestFailed(e.to_string()))?;

        if !response.status().is_success() {
            return Err(AdvisoryError::ApiError(format!(
                "advisory service returned status: {}",
                response.status()
            )));
        }

        let body: ChatResponse = response
            .json()
            .await
            .map_err(|e| AdvisoryError::ApiError(e.to_string()))?;
        body.into_content()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_shape() {
        let advisory = OpenAiAdvisory::new(AdvisoryConfig::new("sk-test")).unwrap();
        let json = serde_json::to_value(advisory.request("be terse", "{\"candidates\":[]}")).unwrap();

        assert_eq!(json["model"], "gpt-4o-mini");
        assert_eq!(json["max_tokens"], 900);
        assert_eq!(json["response_format"]["type"], "json_object");
        assert_eq!(json["messages"][0]["role"], "system");
        assert_eq!(json["messages"][1]["content"], "{\"candidates\":[]}");
        assert!((json["temperature"].as_f64().unwrap() - 0.4).abs() < 1e-6);
    }

    #[test]
    fn test_content_extraction() {
        let ok: ChatResponse = serde_json::from_str(
            r#"{"choices": [{"message": {"role": "assistant", "content": "  {\"suggestions\": []} "}}]}"#,
        )
        .unwrap();
        assert_eq!(ok.into_content().unwrap(), "{\"suggestions\": []}");

        let empty: ChatResponse =
            serde_json::from_str(r#"{"choices": [{"message": {"content": ""}}]}"#).unwrap();
        assert!(matches!(empty.into_content(), Err(AdvisoryError::EmptyResponse)));

        let none: ChatResponse = serde_json::from_str(r#"{"choices": []}"#).unwrap();
        assert!(matches!(none.into_content(), Err(AdvisoryError::EmptyResponse)));
    }

    #[tokio::test]
    async fn test_unreachable_endpoint_errors() {
        let mut config = AdvisoryConfig::new("sk-test");
        config.base_url = "http://127.0.0.1:9/v1".to_string();
        config.timeout_sec = 1;
        let advisory = OpenAiAdvisory::new(config).unwrap();
        let err = advisory.complete_json("system", "{}").await;
        assert!(matches!(err, Err(AdvisoryError::RequestFailed(_))));
    }
}
