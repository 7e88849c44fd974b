pub const MIN_EPOCHS: u32 = 1;
pub const MAX_EPOCHS: u32 = 20;
pub const MIN_LEARNING_RATE: f64 = 0.0001;
pub const MAX_LEARNING_RATE: f64 = 0.01;
/// Granularity of the learning-rate control.
pub const LEARNING_RATE_STEP: f64 = 0.0001;

/// Allowed batch sizes. There is no custom entry.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum BatchSize {
    #[default]
    Four,
    Eight,
    Sixteen,
    ThirtyTwo,
}

impl BatchSize {
    pub const ALL: [BatchSize; 4] = [
        BatchSize::Four,
        BatchSize::Eight,
        BatchSize::Sixteen,
        BatchSize::ThirtyTwo,
    ];

    pub fn value(self) -> u32 {
        match self {
            BatchSize::Four => 4,
            BatchSize::Eight => 8,
            BatchSize::Sixteen => 16,
            BatchSize::ThirtyTwo => 32,
        }
    }

    /// Next larger size, saturating at 32.
    pub fn larger(self) -> Self {
        match self {
            BatchSize::Four => BatchSize::Eight,
            BatchSize::Eight => BatchSize::Sixteen,
            BatchSize::Sixteen | BatchSize::ThirtyTwo => BatchSize::ThirtyTwo,
        }
    }

    /// Next smaller size, saturating at 4.
    pub fn smaller(self) -> Self {
        match self {
            BatchSize::Four | BatchSize::Eight => BatchSize::Four,
            BatchSize::Sixteen => BatchSize::Eight,
            BatchSize::ThirtyTwo => BatchSize::Sixteen,
        }
    }
}

impl TryFrom<u32> for BatchSize {
    type Error = String;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        BatchSize::ALL
            .into_iter()
            .find(|size| size.value() == value)
            .ok_or_else(|| format!("unsupported batch size {value}, expected 4, 8, 16 or 32"))
    }
}

impl From<BatchSize> for u32 {
    fn from(size: BatchSize) -> Self {
        size.value()
    }
}

/// Identifies one hyperparameter control, with the help text shown next to it.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HyperparameterField {
    Epochs,
    BatchSize,
    LearningRate,
}

impl HyperparameterField {
    pub const ALL: [HyperparameterField; 3] = [
        HyperparameterField::Epochs,
        HyperparameterField::BatchSize,
        HyperparameterField::LearningRate,
    ];

    pub fn label(self) -> &'static str {
        match self {
            HyperparameterField::Epochs => "Epochs",
            HyperparameterField::BatchSize => "Batch size",
            HyperparameterField::LearningRate => "Learning rate",
        }
    }

    pub fn help(self) -> &'static str {
        match self {
            HyperparameterField::Epochs => {
                "How many times the model passes over the whole dataset. Too many epochs can cause overfitting."
            }
            HyperparameterField::BatchSize => {
                "How many examples are processed together before the model is updated."
            }
            HyperparameterField::LearningRate => {
                "How much the model changes after each step. Too high: unstable learning. Too low: very slow learning."
            }
        }
    }

    pub fn next(self) -> Self {
        match self {
            HyperparameterField::Epochs => HyperparameterField::BatchSize,
            HyperparameterField::BatchSize => HyperparameterField::LearningRate,
            HyperparameterField::LearningRate => HyperparameterField::Epochs,
        }
    }

    pub fn previous(self) -> Self {
        match self {
            HyperparameterField::Epochs => HyperparameterField::LearningRate,
            HyperparameterField::BatchSize => HyperparameterField::Epochs,
            HyperparameterField::LearningRate => HyperparameterField::BatchSize,
        }
    }
}

/// Training configuration. Always fully populated and always within range:
/// every constructor and setter clamps, so an invalid bag cannot be built.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Hyperparameters {
    epochs: u32,
    batch_size: BatchSize,
    learning_rate: f64,
}

impl Hyperparameters {
    pub fn new(epochs: u32, batch_size: BatchSize, learning_rate: f64) -> Self {
        Self::default()
            .with_epochs(epochs)
            .with_batch_size(batch_size)
            .with_learning_rate(learning_rate)
    }

    pub fn epochs(&self) -> u32 {
        self.epochs
    }

    pub fn batch_size(&self) -> BatchSize {
        self.batch_size
    }

    pub fn learning_rate(&self) -> f64 {
        self.learning_rate
    }

    pub fn with_epochs(mut self, epochs: u32) -> Self {
        self.epochs = epochs.clamp(MIN_EPOCHS, MAX_EPOCHS);
        self
    }

    pub fn with_batch_size(mut self, batch_size: BatchSize) -> Self {
        self.batch_size = batch_size;
        self
    }

    /// Clamp to the allowed range and snap to the control's step.
    pub fn with_learning_rate(mut self, learning_rate: f64) -> Self {
        let clamped = if learning_rate.is_finite() {
            learning_rate.clamp(MIN_LEARNING_RATE, MAX_LEARNING_RATE)
        } else {
            MIN_LEARNING_RATE
        };
        let steps = (clamped / LEARNING_RATE_STEP).round();
        self.learning_rate = (steps * LEARNING_RATE_STEP).clamp(MIN_LEARNING_RATE, MAX_LEARNING_RATE);
        self
    }

    /// Move one control position up (`delta > 0`) or down (`delta < 0`).
    pub fn step(self, field: HyperparameterField, delta: i32) -> Self {
        match field {
            HyperparameterField::Epochs => {
                let epochs = self.epochs as i64 + delta as i64;
                self.with_epochs(epochs.clamp(MIN_EPOCHS as i64, MAX_EPOCHS as i64) as u32)
            }
            HyperparameterField::BatchSize => {
                let mut size = self.batch_size;
                for _ in 0..delta.unsigned_abs() {
                    size = if delta > 0 { size.larger() } else { size.smaller() };
                }
                self.with_batch_size(size)
            }
            HyperparameterField::LearningRate => {
                self.with_learning_rate(self.learning_rate + delta as f64 * LEARNING_RATE_STEP)
            }
        }
    }
}

impl Default for Hyperparameters {
    fn default() -> Self {
        Self {
            epochs: 5,
            batch_size: BatchSize::Four,
            learning_rate: 0.001,
        }
    }
}
