use async_trait::async_trait;
use rig::client::CompletionClient;
use rig::completion::Prompt;
use thiserror::Error;
use tracing::debug;

/// Default model used for both the base and the simulated tuned responses.
pub const DEFAULT_MODEL: &str = "gemini-2.5-flash";

/// Optional knobs for a single generation call.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct GenerationOptions {
    /// System instruction sent alongside the prompt.
    pub system_context: Option<String>,
    /// Sampling temperature; `None` keeps the provider default.
    pub temperature: Option<f64>,
}

#[derive(Debug, Error)]
pub enum GenerationError {
    #[error("API key not configured for the generation provider")]
    MissingApiKey,

    #[error("Failed to create provider client: {0}")]
    Client(String),

    #[error("Generation request failed: {0}")]
    Request(String),
}

pub type GenerationResult<T> = Result<T, GenerationError>;

/// External text-generation collaborator: prompt in, text out, or fail.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn generate(
        &self,
        prompt: &str,
        options: &GenerationOptions,
    ) -> GenerationResult<String>;

    /// Name shown in the playground header and in logs.
    fn model_name(&self) -> &str;
}

/// Gemini-backed generator built on rig.
///
/// The API key is captured once here. A missing key is not an error at
/// construction time; every `generate` call then fails with
/// [`GenerationError::MissingApiKey`].
#[derive(Clone)]
pub struct GeminiGenerator {
    api_key: Option<String>,
    model: String,
}

impl GeminiGenerator {
    pub fn new(api_key: Option<String>, model: impl Into<String>) -> Self {
        let api_key = api_key.filter(|key| !key.trim().is_empty());
        Self {
            api_key,
            model: model.into(),
        }
    }

    /// Read the key from `GEMINI_API_KEY`, falling back to `API_KEY`.
    pub fn from_env(model: impl Into<String>) -> Self {
        Self::from_lookup(|name| std::env::var(name).ok(), model)
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>, model: impl Into<String>) -> Self {
        let api_key = ["GEMINI_API_KEY", "API_KEY"]
            .into_iter()
            .find_map(|name| lookup(name).filter(|key| !key.trim().is_empty()));
        Self::new(api_key, model)
    }

    pub fn has_api_key(&self) -> bool {
        self.api_key.is_some()
    }
}

#[async_trait]
impl TextGenerator for GeminiGenerator {
    async fn generate(
        &self,
        prompt: &str,
        options: &GenerationOptions,
    ) -> GenerationResult<String> {
        let key = self.api_key.as_ref().ok_or(GenerationError::MissingApiKey)?;

        let client = rig::providers::gemini::Client::new(key)
            .map_err(|e| GenerationError::Client(e.to_string()))?;

        let mut builder = client.agent(&self.model);
        if let Some(context) = &options.system_context {
            builder = builder.preamble(context);
        }
        if let Some(temperature) = options.temperature {
            builder = builder.temperature(temperature);
        }
        let agent = builder.build();

        debug!(
            model = %self.model,
            prompt_len = prompt.len(),
            has_context = options.system_context.is_some(),
            temperature = ?options.temperature,
            "Calling generation provider"
        );

        let response = agent
            .prompt(prompt)
            .await
            .map_err(|e| GenerationError::Request(e.to_string()))?;

        debug!(response_len = response.len(), "Generation response received");

        Ok(response)
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_missing_key_fails_at_call_time() {
        let generator = GeminiGenerator::new(None, DEFAULT_MODEL);
        assert!(!generator.has_api_key());

        let result = generator
            .generate("hello", &GenerationOptions::default())
            .await;
        assert!(matches!(result, Err(GenerationError::MissingApiKey)));
    }

    #[tokio::test]
    async fn test_blank_key_treated_as_missing() {
        let generator = GeminiGenerator::new(Some("   ".to_string()), DEFAULT_MODEL);
        assert!(!generator.has_api_key());

        let result = generator
            .generate("hello", &GenerationOptions::default())
            .await;
        assert!(matches!(result, Err(GenerationError::MissingApiKey)));
    }

    #[test]
    fn test_env_lookup_falls_back_to_api_key() {
        let generator = GeminiGenerator::from_lookup(
            |name| match name {
                "GEMINI_API_KEY" => Some(" ".to_string()),
                "API_KEY" => Some("fallback".to_string()),
                _ => None,
            },
            DEFAULT_MODEL,
        );
        assert_eq!(generator.api_key.as_deref(), Some("fallback"));

        let generator = GeminiGenerator::from_lookup(|_| None, DEFAULT_MODEL);
        assert!(!generator.has_api_key());
    }

    #[test]
    fn test_model_name() {
        let generator = GeminiGenerator::new(Some("key".to_string()), "custom-model");
        assert_eq!(generator.model_name(), "custom-model");
    }
}
