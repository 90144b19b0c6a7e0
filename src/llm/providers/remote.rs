use crate::config::LlmConfig;
use crate::llm::{LlmError, SqlGenerator};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::info;

/// OpenAI-compatible chat completions endpoint.
pub struct RemoteLlmProvider {
    client: reqwest::Client,
    api_url: String,
    api_key: String,
    model: String,
}

#[derive(Serialize)]
struct PromptRequest {
    model: String,
    messages: Vec<Message>,
    temperature: f32,
    max_tokens: usize,
}

#[derive(Serialize)]
struct Message {
    role: String,
    content: String,
}

#[derive(Deserialize)]
struct PromptResponse {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Deserialize)]
struct ResponseMessage {
    content: Option<String>,
}

impl RemoteLlmProvider {
    pub fn new(config: &LlmConfig) -> Result<Self, LlmError> {
        let api_url = config.api_url.clone().ok_or_else(|| {
            LlmError::ConfigError("API URL is required for remote LLM provider".to_string())
        })?;

        let api_key = config.api_key.clone().ok_or_else(|| {
            LlmError::ConfigError("API key is required for remote LLM provider".to_string())
        })?;

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| LlmError::ConnectionError(e.to_string()))?;

        Ok(Self {
            client,
            api_url,
            api_key,
            model: config.model.clone(),
        })
    }
}

#[async_trait]
impl SqlGenerator for RemoteLlmProvider {
    async fn generate(&self, question: &str, instructions: &str) -> Result<String, LlmError> {
        let request = PromptRequest {
            model: self.model.clone(),
            messages: vec![
                Message {
                    role: "system".to_string(),
                    content: instructions.to_string(),
                },
                Message {
                    role: "user".to_string(),
                    content: question.to_string(),
                },
            ],
            temperature: 0.1,
            max_tokens: 2000,
        };

        info!("Sending request to {} with model: {}", self.api_url, self.model);

        let response = self
            .client
            .post(&self.api_url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(&request)
            .send()
            .await
            .map_err(|e| LlmError::ConnectionError(e.to_string()))?;

        if !response.status().is_success() {
            return Err(LlmError::ResponseError(format!(
                "API responded with status code: {}",
                response.status()
            )));
        }

        let prompt_response: PromptResponse = response
            .json()
            .await
            .map_err(|e| LlmError::ResponseError(e.to_string()))?;

        let content = prompt_response
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| LlmError::ResponseError("No choices in response".to_string()))?
            .message
            .content
            .unwrap_or_default();

        if content.trim().is_empty() {
            return Err(LlmError::ResponseError("Model returned an empty response".to_string()));
        }

        Ok(content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AppConfig;
    use crate::llm::providers::testing::{spawn_fake_api, Captured};
    use axum::http::{HeaderMap, StatusCode};
    use axum::routing::post;
    use axum::{Json, Router};
    use serde_json::{json, Value};

    fn config_for(url: &str) -> LlmConfig {
        let mut config = AppConfig::default().llm;
        config.backend = "remote".into();
        config.model = "gpt-4o-mini".into();
        config.api_key = Some("sk-test".into());
        config.api_url = Some(format!("{}/v1/chat/completions", url));
        config
    }

    #[test]
    fn test_url_and_key_are_required() {
        let mut config = AppConfig::default().llm;
        config.api_key = Some("sk-test".into());
        assert!(matches!(RemoteLlmProvider::new(&config), Err(LlmError::ConfigError(_))));

        config.api_url = Some("http://localhost/v1/chat/completions".into());
        config.api_key = None;
        assert!(matches!(RemoteLlmProvider::new(&config), Err(LlmError::ConfigError(_))));
    }

    #[tokio::test]
    async fn test_instructions_go_in_system_message() {
        let captured = Captured::default();
        let sink = captured.clone();
        let router = Router::new().route(
            "/v1/chat/completions",
            post(move |headers: HeaderMap, Json(body): Json<Value>| {
                let sink = sink.clone();
                async move {
                    sink.record(headers, body);
                    Json(json!({
                        "choices": [{"message": {"role": "assistant", "content": "SELECT Club FROM top_scorers"}}]
                    }))
                }
            }),
        );
        let url = spawn_fake_api(router).await;

        let provider = RemoteLlmProvider::new(&config_for(&url)).unwrap();
        let text = provider.generate("Which clubs?", "INSTRUCTIONS").await.unwrap();

        assert_eq!(text, "SELECT Club FROM top_scorers");
        let (headers, body) = captured.take();
        assert_eq!(headers.get("authorization").unwrap(), "Bearer sk-test");
        assert_eq!(body["model"], "gpt-4o-mini");
        assert_eq!(body["messages"][0]["role"], "system");
        assert_eq!(body["messages"][0]["content"], "INSTRUCTIONS");
        assert_eq!(body["messages"][1]["role"], "user");
        assert_eq!(body["messages"][1]["content"], "Which clubs?");
    }

    #[tokio::test]
    async fn test_unauthorized_is_response_error() {
        let router = Router::new().route(
            "/v1/chat/completions",
            post(|| async { StatusCode::UNAUTHORIZED }),
        );
        let url = spawn_fake_api(router).await;

        let provider = RemoteLlmProvider::new(&config_for(&url)).unwrap();
        let err = provider.generate("q", "i").await.unwrap_err();
        assert!(err.to_string().contains("401"));
    }

    #[tokio::test]
    async fn test_empty_choices_is_response_error() {
        let router = Router::new().route(
            "/v1/chat/completions",
            post(|| async { Json(json!({"choices": []})) }),
        );
        let url = spawn_fake_api(router).await;

        let provider = RemoteLlmProvider::new(&config_for(&url)).unwrap();
        assert!(matches!(
            provider.generate("q", "i").await,
            Err(LlmError::ResponseError(_))
        ));
    }
}
