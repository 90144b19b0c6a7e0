pub mod models;
pub mod prompt;
pub mod providers;
pub mod sanitize;

use crate::config::LlmConfig;
use async_trait::async_trait;
use models::Generation;
use std::error::Error;
use std::fmt;
use tracing::{debug, error, info};

#[derive(Debug)]
pub enum LlmError {
    ConnectionError(String),
    ResponseError(String),
    ConfigError(String),
}

impl fmt::Display for LlmError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LlmError::ConnectionError(msg) => write!(f, "LLM connection error: {}", msg),
            LlmError::ResponseError(msg) => write!(f, "LLM response error: {}", msg),
            LlmError::ConfigError(msg) => write!(f, "LLM configuration error: {}", msg),
        }
    }
}

impl Error for LlmError {}

/// A text-generation backend. Implementations return the model's text verbatim.
#[async_trait]
pub trait SqlGenerator: Send + Sync {
    async fn generate(&self, question: &str, instructions: &str) -> Result<String, LlmError>;
}

pub struct LlmManager {
    generator: Box<dyn SqlGenerator + Send + Sync>,
}

impl LlmManager {
    pub fn new(config: &LlmConfig) -> Result<Self, LlmError> {
        let generator: Box<dyn SqlGenerator + Send + Sync> = match config.backend.as_str() {
            "gemini" => Box::new(providers::gemini::GeminiProvider::new(config)?),
            "remote" => Box::new(providers::remote::RemoteLlmProvider::new(config)?),
            "ollama" => Box::new(providers::ollama::OllamaProvider::new(config)?),
            _ => {
                return Err(LlmError::ConfigError(format!(
                    "Unsupported LLM backend: {}",
                    config.backend
                )))
            }
        };

        Ok(Self { generator })
    }

    #[cfg(test)]
    pub fn with_generator(generator: Box<dyn SqlGenerator + Send + Sync>) -> Self {
        Self { generator }
    }

    /// Asks the model for a statement answering `question`.
    ///
    /// Never fails: a backend error is logged and turned into an empty
    /// statement carrying a user-facing notice.
    pub async fn generate(&self, question: &str, instructions: &str) -> Generation {
        debug!("Generating SQL for question: {}", question);

        match self.generator.generate(question, instructions).await {
            Ok(text) => {
                info!("Model returned {} characters", text.len());
                Generation::from_text(text)
            }
            Err(e) => {
                error!("Failed to generate response from model: {}", e);
                Generation::failed(format!("Failed to generate response from model: {}", e))
            }
        }
    }
}
