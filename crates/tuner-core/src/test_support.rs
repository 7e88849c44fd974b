use async_trait::async_trait;
use parking_lot::Mutex;

use crate::services::generation::{
    GenerationError, GenerationOptions, GenerationResult, TextGenerator,
};

/// Test double for the generation collaborator. Records every call.
pub struct ScriptedGenerator {
    reply: Option<String>,
    calls: Mutex<Vec<(String, GenerationOptions)>>,
}

impl ScriptedGenerator {
    pub fn replying(text: &str) -> Self {
        Self {
            reply: Some(text.to_string()),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn failing() -> Self {
        Self {
            reply: None,
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> Vec<(String, GenerationOptions)> {
        self.calls.lock().clone()
    }
}

#[async_trait]
impl TextGenerator for ScriptedGenerator {
    async fn generate(
        &self,
        prompt: &str,
        options: &GenerationOptions,
    ) -> GenerationResult<String> {
        self.calls.lock().push((prompt.to_string(), options.clone()));
        self.reply
            .clone()
            .ok_or_else(|| GenerationError::Request("quota exceeded".to_string()))
    }

    fn model_name(&self) -> &str {
        "scripted"
    }
}
