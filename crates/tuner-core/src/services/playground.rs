use tracing::{debug, error};

use crate::models::{ChatMessage, ModelSelection, TrainingExample};
use crate::services::generation::{GenerationResult, TextGenerator};
use crate::services::prompt_strategy::GenerationRequest;

pub const WELCOME_MESSAGE: &str = "Hello! I am a Gemini model. Switch between the Base model and \
the Fine-tuned model to see the difference. Try typing a sentence and I will classify its sentiment!";

/// A request that has been admitted by [`PlaygroundSession::begin_send`].
#[derive(Clone, Debug, PartialEq)]
pub struct PendingSend {
    pub id: u64,
    pub request: GenerationRequest,
}

/// Chat transcript plus the base/tuned switch and an in-flight guard.
///
/// Sending is split in two halves so a frontend can run the generation call
/// in the background: `begin_send` is synchronous and optimistic,
/// `finish_send` consumes the outcome and always clears `busy`.
#[derive(Clone, Debug)]
pub struct PlaygroundSession {
    messages: Vec<ChatMessage>,
    selection: ModelSelection,
    busy: bool,
    // Id and strategy of the in-flight request. A mid-flight switch does not
    // change which error string the reply uses.
    in_flight: Option<(u64, ModelSelection)>,
    request_seq: u64,
}

impl PlaygroundSession {
    pub fn new() -> Self {
        Self {
            messages: vec![ChatMessage::model(WELCOME_MESSAGE)],
            selection: ModelSelection::default(),
            busy: false,
            in_flight: None,
            request_seq: 0,
        }
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    pub fn selection(&self) -> ModelSelection {
        self.selection
    }

    /// Change which strategy the next send uses. History is kept.
    pub fn set_selection(&mut self, selection: ModelSelection) {
        if self.selection != selection {
            debug!(?selection, "Playground model selection changed");
        }
        self.selection = selection;
    }

    pub fn is_busy(&self) -> bool {
        self.busy
    }

    /// Validate, record the user message and build the request.
    ///
    /// Returns `None` (and changes nothing) for blank text or while a
    /// request is already in flight.
    pub fn begin_send(
        &mut self,
        user_text: &str,
        examples: &[TrainingExample],
    ) -> Option<PendingSend> {
        if user_text.trim().is_empty() || self.busy {
            return None;
        }

        self.messages.push(ChatMessage::user(user_text));
        self.busy = true;
        self.request_seq += 1;
        self.in_flight = Some((self.request_seq, self.selection));

        let request = self.selection.strategy().build_request(user_text, examples);
        debug!(
            selection = ?self.selection,
            examples = examples.len(),
            "Playground request admitted"
        );

        Some(PendingSend {
            id: self.request_seq,
            request,
        })
    }

    /// Record the collaborator's outcome. Errors become a fixed message.
    ///
    /// Results for a request that is no longer in flight (for example one
    /// started before a reset) are dropped.
    pub fn finish_send(&mut self, request_id: u64, result: GenerationResult<String>) {
        let selection = match self.in_flight {
            Some((id, selection)) if id == request_id => selection,
            _ => {
                debug!(request_id, "Ignoring generation result with no matching request");
                return;
            }
        };
        self.in_flight = None;

        let strategy = selection.strategy();
        let message = match result {
            Ok(text) if text.trim().is_empty() => ChatMessage::model(strategy.empty_response_text()),
            Ok(text) => ChatMessage::model(text),
            Err(e) => {
                error!(error = %e, "Playground generation failed");
                ChatMessage::model_error(strategy.error_text())
            }
        };

        self.messages.push(message);
        self.busy = false;
    }

    /// Full round trip: admit, call the collaborator once, record the outcome.
    /// Returns whether the text was admitted.
    pub async fn send(
        &mut self,
        user_text: &str,
        examples: &[TrainingExample],
        generator: &dyn TextGenerator,
    ) -> bool {
        let Some(pending) = self.begin_send(user_text, examples) else {
            return false;
        };

        let result = generator
            .generate(&pending.request.prompt, &pending.request.options)
            .await;
        self.finish_send(pending.id, result);
        true
    }

    /// Back to a fresh transcript. The model selection resets with it; the
    /// request counter does not, so stale results stay distinguishable.
    pub fn reset(&mut self) {
        let request_seq = self.request_seq;
        *self = Self::new();
        self.request_seq = request_seq;
    }
}

impl Default for PlaygroundSession {
    fn default() -> Self {
        Self::new()
    }
}
