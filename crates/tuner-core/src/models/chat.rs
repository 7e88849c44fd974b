use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    User,
    Model,
}

/// One entry in the playground transcript.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub text: String,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub is_error: bool,
}

impl ChatMessage {
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            text: text.into(),
            is_error: false,
        }
    }

    pub fn model(text: impl Into<String>) -> Self {
        Self {
            role: Role::Model,
            text: text.into(),
            is_error: false,
        }
    }

    pub fn model_error(text: impl Into<String>) -> Self {
        Self {
            role: Role::Model,
            text: text.into(),
            is_error: true,
        }
    }
}

/// Which generation strategy the next send uses. Session-scoped.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ModelSelection {
    Base,
    #[default]
    Tuned,
}

impl ModelSelection {
    pub fn display_name(self) -> &'static str {
        match self {
            ModelSelection::Base => "Base model",
            ModelSelection::Tuned => "Tuned model (simulated)",
        }
    }

    pub fn toggled(self) -> Self {
        match self {
            ModelSelection::Base => ModelSelection::Tuned,
            ModelSelection::Tuned => ModelSelection::Base,
        }
    }
}
