use std::time::Duration;

use tokio::sync::mpsc::UnboundedSender;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior, interval_at};
use tracing::debug;

/// Default pacing of the simulated run.
pub const DEFAULT_TICK_INTERVAL: Duration = Duration::from_millis(800);

/// One timer firing, tagged with the run that started the timer.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TrainingTick {
    pub run_id: u64,
}

/// Repeating timer driving one simulated training run.
///
/// The spawned task is aborted on [`TrainingTimer::stop`] and on drop, so a
/// timer never outlives the run that owns it. Ticks already sitting in the
/// channel are tagged with `run_id` and must be filtered by the receiver.
pub struct TrainingTimer {
    run_id: u64,
    task: Option<JoinHandle<()>>,
}

impl TrainingTimer {
    /// Spawn the timer on the current tokio runtime. The first tick fires
    /// one full `period` after start.
    pub fn start(run_id: u64, period: Duration, ticks: UnboundedSender<TrainingTick>) -> Self {
        let task = tokio::spawn(async move {
            let mut interval = interval_at(Instant::now() + period, period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                interval.tick().await;
                if ticks.send(TrainingTick { run_id }).is_err() {
                    debug!(run_id, "Tick receiver dropped, stopping training timer");
                    break;
                }
            }
        });

        debug!(run_id, period_ms = period.as_millis() as u64, "Training timer started");

        Self {
            run_id,
            task: Some(task),
        }
    }

    pub fn is_running(&self) -> bool {
        self.task.as_ref().is_some_and(|task| !task.is_finished())
    }

    pub fn stop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
            debug!(run_id = self.run_id, "Training timer cancelled");
        }
    }
}

impl Drop for TrainingTimer {
    fn drop(&mut self) {
        self.stop();
    }
}
