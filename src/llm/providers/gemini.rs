use crate::config::LlmConfig;
use crate::llm::{LlmError, SqlGenerator};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, error, info};

const DEFAULT_API_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Google Gemini `generateContent` client.
pub struct GeminiProvider {
    client: reqwest::Client,
    api_url: String,
    api_key: String,
    model: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest {
    contents: Vec<Content>,
    generation_config: GenerationConfig,
}

#[derive(Serialize, Deserialize)]
struct Content {
    #[serde(default)]
    role: Option<String>,
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Serialize, Deserialize)]
struct Part {
    #[serde(default)]
    text: String,
}

#[derive(Serialize)]
struct GenerationConfig {
    temperature: f32,
}

#[derive(Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
struct Candidate {
    content: Option<Content>,
}

impl GeminiProvider {
    pub fn new(config: &LlmConfig) -> Result<Self, LlmError> {
        let api_key = config.api_key.clone().ok_or_else(|| {
            LlmError::ConfigError(
                "API key is required for the Gemini provider (set GOOGLE_API_KEY)".to_string(),
            )
        })?;

        let api_url = config
            .api_url
            .clone()
            .unwrap_or_else(|| DEFAULT_API_URL.to_string());

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| LlmError::ConnectionError(e.to_string()))?;

        Ok(Self {
            client,
            api_url: api_url.trim_end_matches('/').to_string(),
            api_key,
            model: config.model.clone(),
        })
    }

    fn endpoint(&self) -> String {
        format!("{}/models/{}:generateContent", self.api_url, self.model)
    }
}

#[async_trait]
impl SqlGenerator for GeminiProvider {
    async fn generate(&self, question: &str, instructions: &str) -> Result<String, LlmError> {
        // Question first, instructions second, both in a single user turn
        let request = GenerateContentRequest {
            contents: vec![Content {
                role: Some("user".to_string()),
                parts: vec![
                    Part {
                        text: question.to_string(),
                    },
                    Part {
                        text: instructions.to_string(),
                    },
                ],
            }],
            generation_config: GenerationConfig { temperature: 0.1 },
        };

        info!("Sending request to Gemini with model: {}", self.model);
        debug!("API URL: {}", self.endpoint());

        let response = self
            .client
            .post(self.endpoint())
            .header("x-goog-api-key", &self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| LlmError::ConnectionError(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_body = match response.text().await {
                Ok(body) => format!(" - Response body: {}", body),
                Err(_) => String::new(),
            };

            error!("Gemini API responded with status code: {}{}", status, error_body);
            return Err(LlmError::ResponseError(format!(
                "Gemini API responded with status code: {}{}",
                status, error_body
            )));
        }

        let body: GenerateContentResponse = response
            .json()
            .await
            .map_err(|e| LlmError::ResponseError(e.to_string()))?;

        let text: String = body
            .candidates
            .into_iter()
            .next()
            .and_then(|candidate| candidate.content)
            .map(|content| content.parts.into_iter().map(|part| part.text).collect())
            .ok_or_else(|| LlmError::ResponseError("No candidates in response".to_string()))?;

        if text.trim().is_empty() {
            return Err(LlmError::ResponseError("Model returned an empty response".to_string()));
        }

        debug!("Raw response from Gemini: {}", text);
        Ok(text)
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
        config.api_key = Some("test-key".into());
        config.api_url = Some(url.to_string());
        config
    }

    #[test]
    fn test_api_key_is_required() {
        let config = AppConfig::default().llm;
        assert!(matches!(GeminiProvider::new(&config), Err(LlmError::ConfigError(_))));
    }

    #[tokio::test]
    async fn test_sends_question_and_instructions_and_returns_text_verbatim() {
        let captured = Captured::default();
        let sink = captured.clone();
        let router = Router::new().route(
            "/models/gemini-1.5-pro-exp-0801:generateContent",
            post(move |headers: HeaderMap, Json(body): Json<Value>| {
                let sink = sink.clone();
                async move {
                    sink.record(headers, body);
                    Json(json!({
                        "candidates": [{
                            "content": {
                                "role": "model",
                                "parts": [{"text": "```sql\nSELECT 1\n```"}]
                            }
                        }]
                    }))
                }
            }),
        );
        let url = spawn_fake_api(router).await;

        let provider = GeminiProvider::new(&config_for(&url)).unwrap();
        let text = provider.generate("Who scored most?", "INSTRUCTIONS").await.unwrap();

        assert_eq!(text, "```sql\nSELECT 1\n```");
        let (headers, body) = captured.take();
        assert_eq!(headers.get("x-goog-api-key").unwrap(), "test-key");
        assert_eq!(body["contents"][0]["parts"][0]["text"], "Who scored most?");
        assert_eq!(body["contents"][0]["parts"][1]["text"], "INSTRUCTIONS");
    }

    #[tokio::test]
    async fn test_error_status_becomes_response_error() {
        let router = Router::new().route(
            "/models/gemini-1.5-pro-exp-0801:generateContent",
            post(|| async { (StatusCode::TOO_MANY_REQUESTS, "quota exceeded") }),
        );
        let url = spawn_fake_api(router).await;

        let provider = GeminiProvider::new(&config_for(&url)).unwrap();
        let err = provider.generate("q", "i").await.unwrap_err();

        assert!(matches!(err, LlmError::ResponseError(_)));
        assert!(err.to_string().contains("429"));
        assert!(err.to_string().contains("quota exceeded"));
    }

    #[tokio::test]
    async fn test_missing_candidates_is_an_error() {
        let router = Router::new().route(
            "/models/gemini-1.5-pro-exp-0801:generateContent",
            post(|| async { Json(json!({"candidates": []})) }),
        );
        let url = spawn_fake_api(router).await;

        let provider = GeminiProvider::new(&config_for(&url)).unwrap();
        assert!(matches!(
            provider.generate("q", "i").await,
            Err(LlmError::ResponseError(_))
        ));
    }

    #[tokio::test]
    async fn test_unreachable_endpoint_is_a_connection_error() {
        let provider = GeminiProvider::new(&config_for("http://127.0.0.1:9")).unwrap();
        assert!(matches!(
            provider.generate("q", "i").await,
            Err(LlmError::ConnectionError(_))
        ));
    }
}
