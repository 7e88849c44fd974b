pub mod diagnostics;
pub mod generation;
pub mod playground;
pub mod prompt_strategy;
pub mod training_simulator;
pub mod training_timer;

pub use diagnostics::{DiagnosticEntry, DiagnosticLevel, Diagnostics, DiagnosticsLayer};
pub use generation::{
    DEFAULT_MODEL, GeminiGenerator, GenerationError, GenerationOptions, GenerationResult,
    TextGenerator,
};
pub use playground::{PendingSend, PlaygroundSession};
pub use prompt_strategy::{BaseStrategy, GenerationRequest, PromptStrategy, TunedSimulationStrategy};
pub use training_simulator::{TrainingCurve, TrainingLogEntry, TrainingSimulator};
pub use training_timer::{DEFAULT_TICK_INTERVAL, TrainingTick, TrainingTimer};
