use crate::models::{ModelSelection, TrainingExample};
use crate::services::generation::GenerationOptions;

/// Temperature used by the simulated tuned model to stay close to the examples.
pub const TUNED_TEMPERATURE: f64 = 0.3;

/// Separator placed between examples in the style-priming instruction.
pub const EXAMPLE_SEPARATOR: &str = "\n---\n";

/// Everything needed for one call to the generation collaborator.
#[derive(Clone, Debug, PartialEq)]
pub struct GenerationRequest {
    pub prompt: String,
    pub options: GenerationOptions,
}

/// Builds requests for one model selection and owns its user-facing strings.
pub trait PromptStrategy: Send + Sync {
    fn build_request(&self, user_text: &str, examples: &[TrainingExample]) -> GenerationRequest;

    /// Shown when the collaborator returns an empty response.
    fn empty_response_text(&self) -> &'static str;

    /// Shown when the collaborator fails.
    fn error_text(&self) -> &'static str;
}

/// Forwards the user's text verbatim with no extra context.
pub struct BaseStrategy;

impl PromptStrategy for BaseStrategy {
    fn build_request(&self, user_text: &str, _examples: &[TrainingExample]) -> GenerationRequest {
        GenerationRequest {
            prompt: user_text.to_string(),
            options: GenerationOptions::default(),
        }
    }

    fn empty_response_text(&self) -> &'static str {
        "No response from the model."
    }

    fn error_text(&self) -> &'static str {
        "An error occurred while calling the Gemini API. Please check your API key."
    }
}

/// Imitates a fine-tuned model by priming the call with every example.
pub struct TunedSimulationStrategy;

impl TunedSimulationStrategy {
    pub fn system_instruction(examples: &[TrainingExample]) -> String {
        let training_data = examples
            .iter()
            .map(|e| format!("Input: {}\nOutput: {}", e.input, e.output))
            .collect::<Vec<_>>()
            .join(EXAMPLE_SEPARATOR);

        format!(
            "You are a Gemini model that has been fine-tuned on the sample data below.\n\
            Imitate the style, tone and format of the Output examples for their corresponding Input.\n\n\
            Training data:\n\
            {training_data}\n\n\
            Answer the user's Input in exactly the style above."
        )
    }
}

impl PromptStrategy for TunedSimulationStrategy {
    fn build_request(&self, user_text: &str, examples: &[TrainingExample]) -> GenerationRequest {
        GenerationRequest {
            prompt: user_text.to_string(),
            options: GenerationOptions {
                system_context: Some(Self::system_instruction(examples)),
                temperature: Some(TUNED_TEMPERATURE),
            },
        }
    }

    fn empty_response_text(&self) -> &'static str {
        "No response from the simulated model."
    }

    fn error_text(&self) -> &'static str {
        "An error occurred while calling the simulated tuned model."
    }
}

impl ModelSelection {
    pub fn strategy(self) -> &'static dyn PromptStrategy {
        match self {
            ModelSelection::Base => &BaseStrategy,
            ModelSelection::Tuned => &TunedSimulationStrategy,
        }
    }
}
