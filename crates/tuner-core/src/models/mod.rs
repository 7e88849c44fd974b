pub mod chat;
pub mod example_set;
pub mod hyperparameters;
pub mod wizard;

pub use chat::{ChatMessage, ModelSelection, Role};
pub use example_set::{ExampleSet, MIN_EXAMPLES, TrainingExample, default_examples};
pub use hyperparameters::{BatchSize, HyperparameterField, Hyperparameters};
pub use wizard::{Wizard, WizardStep};
