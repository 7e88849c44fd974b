use rand::Rng;
use tracing::{debug, info};

use crate::models::Hyperparameters;

/// Metrics recorded for one simulated epoch.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TrainingLogEntry {
    pub epoch: u32,
    pub loss: f64,
    pub accuracy: f64,
}

/// Synthetic learning curve: `2.0 * exp(-0.3 * epoch)` plus uniform noise.
///
/// The shape depends only on the epoch number. Batch size and learning rate
/// are deliberately not inputs.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TrainingCurve {
    pub initial_loss: f64,
    pub decay_rate: f64,
    pub noise_amplitude: f64,
    pub loss_floor: f64,
    pub accuracy_ceiling: f64,
}

impl Default for TrainingCurve {
    fn default() -> Self {
        Self {
            initial_loss: 2.0,
            decay_rate: 0.3,
            noise_amplitude: 0.05,
            loss_floor: 0.1,
            accuracy_ceiling: 0.99,
        }
    }
}

impl TrainingCurve {
    /// Noise-free loss for `epoch`.
    pub fn base_loss(&self, epoch: u32) -> f64 {
        self.initial_loss * (-self.decay_rate * epoch as f64).exp()
    }

    /// Produce the log entry for `epoch`, drawing noise from `rng`.
    pub fn sample<R: Rng>(&self, epoch: u32, rng: &mut R) -> TrainingLogEntry {
        let base_loss = self.base_loss(epoch);
        let noise = if self.noise_amplitude > 0.0 {
            rng.random_range(-self.noise_amplitude..=self.noise_amplitude)
        } else {
            0.0
        };

        // Accuracy tracks the noise-free curve so it stays monotonic.
        let accuracy = (1.0 - base_loss / 3.0).clamp(0.0, self.accuracy_ceiling);

        TrainingLogEntry {
            epoch,
            loss: (base_loss + noise).max(self.loss_floor),
            accuracy,
        }
    }
}

/// State of one simulated training run.
///
/// Each [`TrainingSimulator::tick`] appends exactly one entry until the
/// configured number of epochs is reached; after that the run is finished
/// and further ticks do nothing.
#[derive(Clone, Debug)]
pub struct TrainingSimulator {
    curve: TrainingCurve,
    total_epochs: u32,
    epoch: u32,
    log: Vec<TrainingLogEntry>,
    finished: bool,
}

impl TrainingSimulator {
    pub fn new(params: &Hyperparameters) -> Self {
        Self::with_curve(params, TrainingCurve::default())
    }

    pub fn with_curve(params: &Hyperparameters, curve: TrainingCurve) -> Self {
        info!(
            epochs = params.epochs(),
            batch_size = params.batch_size().value(),
            learning_rate = params.learning_rate(),
            "Simulated training run created"
        );

        Self {
            curve,
            total_epochs: params.epochs(),
            epoch: 0,
            log: Vec::with_capacity(params.epochs() as usize),
            finished: false,
        }
    }

    /// Advance one epoch. Returns the new entry, or `None` if already finished.
    pub fn tick<R: Rng>(&mut self, rng: &mut R) -> Option<TrainingLogEntry> {
        if self.finished {
            return None;
        }

        self.epoch += 1;
        let entry = self.curve.sample(self.epoch, rng);
        self.log.push(entry);
        debug!(
            epoch = entry.epoch,
            loss = entry.loss,
            accuracy = entry.accuracy,
            "Simulated epoch"
        );

        if self.epoch >= self.total_epochs {
            self.finished = true;
            info!(epochs = self.epoch, "Simulated training run finished");
        }

        Some(entry)
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    pub fn current_epoch(&self) -> u32 {
        self.epoch
    }

    pub fn total_epochs(&self) -> u32 {
        self.total_epochs
    }

    pub fn log(&self) -> &[TrainingLogEntry] {
        &self.log
    }

    pub fn latest(&self) -> Option<&TrainingLogEntry> {
        self.log.last()
    }

    /// Fraction of epochs completed, in `[0, 1]`.
    pub fn progress(&self) -> f64 {
        if self.total_epochs == 0 {
            return 1.0;
        }
        (self.epoch as f64 / self.total_epochs as f64).min(1.0)
    }

    pub fn best_loss(&self) -> Option<f64> {
        self.log.iter().map(|e| e.loss).reduce(f64::min)
    }
}
