use std::time::Duration;

use rand::Rng;
use tokio::sync::mpsc::UnboundedSender;
use tracing::{debug, info};

use crate::models::{ExampleSet, Hyperparameters, ModelSelection, Wizard, WizardStep};
use crate::services::generation::GenerationResult;
use crate::services::playground::{PendingSend, PlaygroundSession};
use crate::services::training_simulator::{TrainingLogEntry, TrainingSimulator};
use crate::services::training_timer::{DEFAULT_TICK_INTERVAL, TrainingTick, TrainingTimer};

/// One simulated run, alive only while the Training step is on screen.
pub struct TrainingRun {
    id: u64,
    simulator: TrainingSimulator,
    // Dropping the run drops the timer, which aborts its task.
    timer: Option<TrainingTimer>,
}

impl TrainingRun {
    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn simulator(&self) -> &TrainingSimulator {
        &self.simulator
    }
}

/// Top-level coordinator for the walkthrough.
///
/// Owns the state threaded through every step (example set, hyperparameters,
/// wizard position) and the per-step state (the active training run and the
/// playground session). Forward transitions always use the wizard's
/// transition table.
pub struct TunerApp {
    wizard: Wizard,
    examples: ExampleSet,
    hyperparameters: Hyperparameters,
    training: Option<TrainingRun>,
    playground: PlaygroundSession,
    ticks: Option<UnboundedSender<TrainingTick>>,
    tick_interval: Duration,
    run_seq: u64,
}

impl TunerApp {
    /// Coordinator without a timer: ticks must be fed in by the caller.
    pub fn new() -> Self {
        Self {
            wizard: Wizard::new(),
            examples: ExampleSet::default(),
            hyperparameters: Hyperparameters::default(),
            training: None,
            playground: PlaygroundSession::new(),
            ticks: None,
            tick_interval: DEFAULT_TICK_INTERVAL,
            run_seq: 0,
        }
    }

    /// Coordinator whose training runs spawn a repeating timer that sends
    /// ticks to `ticks`. Must be used from within a tokio runtime.
    pub fn with_timer(ticks: UnboundedSender<TrainingTick>, tick_interval: Duration) -> Self {
        Self {
            ticks: Some(ticks),
            tick_interval,
            ..Self::new()
        }
    }

    pub fn wizard(&self) -> &Wizard {
        &self.wizard
    }

    pub fn current_step(&self) -> WizardStep {
        self.wizard.current()
    }

    pub fn examples(&self) -> &ExampleSet {
        &self.examples
    }

    pub fn examples_mut(&mut self) -> &mut ExampleSet {
        &mut self.examples
    }

    pub fn hyperparameters(&self) -> Hyperparameters {
        self.hyperparameters
    }

    /// Replace the whole hyperparameter bag.
    pub fn set_hyperparameters(&mut self, hyperparameters: Hyperparameters) {
        self.hyperparameters = hyperparameters;
    }

    pub fn training(&self) -> Option<&TrainingRun> {
        self.training.as_ref()
    }

    pub fn playground(&self) -> &PlaygroundSession {
        &self.playground
    }

    pub fn set_model_selection(&mut self, selection: ModelSelection) {
        self.playground.set_selection(selection);
    }

    /// Introduction -> Dataset.
    pub fn start(&mut self) {
        if self.current_step() == WizardStep::Introduction {
            self.advance();
        }
    }

    /// Dataset -> Parameters, only once the example set is large enough.
    pub fn finish_dataset(&mut self) -> bool {
        if self.current_step() != WizardStep::Dataset || !self.examples.meets_minimum() {
            return false;
        }
        self.advance();
        true
    }

    /// Parameters -> Training. Starts a fresh run.
    pub fn finish_parameters(&mut self) -> bool {
        if self.current_step() != WizardStep::Parameters {
            return false;
        }
        self.advance();
        true
    }

    /// Training -> Playground, only once the run has finished.
    pub fn finish_training(&mut self) -> bool {
        let finished = self
            .training
            .as_ref()
            .is_some_and(|run| run.simulator.is_finished());
        if self.current_step() != WizardStep::Training || !finished {
            return false;
        }
        self.advance();
        true
    }

    /// Back button on the Parameters screen.
    pub fn back_to_dataset(&mut self) -> bool {
        self.navigate_to(WizardStep::Dataset)
    }

    /// Guarded navigation among completed steps plus the current one.
    pub fn navigate_to(&mut self, step: WizardStep) -> bool {
        let previous = self.current_step();
        if !self.wizard.navigate_to(step) {
            return false;
        }
        self.on_step_changed(previous);
        true
    }

    /// Back to the introduction. Examples and hyperparameters are kept;
    /// the training run and chat history are not.
    pub fn restart(&mut self) {
        let previous = self.current_step();
        self.wizard.restart();
        self.on_step_changed(previous);
        self.playground.reset();
        info!("Walkthrough restarted");
    }

    /// Apply a timer tick using the thread-local RNG.
    pub fn on_training_tick(&mut self, tick: TrainingTick) -> Option<TrainingLogEntry> {
        self.apply_training_tick(tick, &mut rand::rng())
    }

    /// Apply a timer tick. Ticks from a run that is no longer active are
    /// dropped, so a torn-down run can never be mutated.
    pub fn apply_training_tick<R: Rng>(
        &mut self,
        tick: TrainingTick,
        rng: &mut R,
    ) -> Option<TrainingLogEntry> {
        let run = match self.training.as_mut() {
            Some(run) if run.id == tick.run_id => run,
            _ => {
                debug!(run_id = tick.run_id, "Dropping tick for inactive training run");
                return None;
            }
        };

        let entry = run.simulator.tick(rng);
        if run.simulator.is_finished()
            && let Some(mut timer) = run.timer.take()
        {
            timer.stop();
        }
        entry
    }

    /// Admit a playground message. Only active on the Playground step.
    pub fn begin_send(&mut self, user_text: &str) -> Option<PendingSend> {
        if self.current_step() != WizardStep::Playground {
            return None;
        }
        self.playground.begin_send(user_text, self.examples.examples())
    }

    pub fn finish_send(&mut self, request_id: u64, result: GenerationResult<String>) {
        self.playground.finish_send(request_id, result);
    }

    fn advance(&mut self) {
        let previous = self.current_step();
        if self.wizard.complete_current().is_some() {
            self.on_step_changed(previous);
        }
    }

    fn on_step_changed(&mut self, previous: WizardStep) {
        let current = self.current_step();
        if previous == current {
            return;
        }

        if previous == WizardStep::Training {
            self.stop_training();
        }
        if current == WizardStep::Training {
            self.start_training();
        }
    }

    fn start_training(&mut self) {
        self.stop_training();

        self.run_seq += 1;
        let id = self.run_seq;
        let timer = self
            .ticks
            .as_ref()
            .map(|ticks| TrainingTimer::start(id, self.tick_interval, ticks.clone()));

        self.training = Some(TrainingRun {
            id,
            simulator: TrainingSimulator::new(&self.hyperparameters),
            timer,
        });
        info!(run_id = id, epochs = self.hyperparameters.epochs(), "Training run started");
    }

    fn stop_training(&mut self) {
        if let Some(run) = self.training.take() {
            debug!(
                run_id = run.id,
                epochs_done = run.simulator.current_epoch(),
                "Training run torn down"
            );
        }
    }
}

impl Default for TunerApp {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn app_on_training() -> TunerApp {
        let mut app = TunerApp::new();
        app.start();
        assert!(app.finish_dataset());
        assert!(app.finish_parameters());
        app
    }

    fn tick_current(app: &mut TunerApp, rng: &mut StdRng) -> Option<TrainingLogEntry> {
        let run_id = app.training().map(|run| run.id())?;
        app.apply_training_tick(TrainingTick { run_id }, rng)
    }

    #[test]
    fn test_dataset_gate() {
        let mut app = TunerApp::new();
        app.start();
        app.examples_mut().replace_all(Vec::new());

        for _ in 0..4 {
            app.examples_mut().add("in", "out");
            assert!(!app.finish_dataset());
            assert_eq!(app.current_step(), WizardStep::Dataset);
        }

        app.examples_mut().add("in", "out");
        assert!(app.finish_dataset());
        assert_eq!(app.current_step(), WizardStep::Parameters);
    }

    #[test]
    fn test_run_uses_configured_epochs() {
        let mut app = TunerApp::new();
        app.set_hyperparameters(Hyperparameters::default().with_epochs(3));
        app.start();
        app.finish_dataset();
        app.finish_parameters();

        let mut rng = StdRng::seed_from_u64(5);
        while tick_current(&mut app, &mut rng).is_some() {}

        let run = app.training().expect("run active");
        assert_eq!(run.simulator().log().len(), 3);
        assert!(run.simulator().is_finished());
    }

    #[test]
    fn test_finish_training_requires_completed_run() {
        let mut app = app_on_training();
        let mut rng = StdRng::seed_from_u64(1);

        assert!(!app.finish_training());
        tick_current(&mut app, &mut rng);
        assert!(!app.finish_training());

        while tick_current(&mut app, &mut rng).is_some() {}
        assert!(app.finish_training());
        assert_eq!(app.current_step(), WizardStep::Playground);
        assert!(app.training().is_none(), "leaving training tears the run down");
    }

    #[test]
    fn test_stale_tick_is_dropped() {
        let mut app = app_on_training();
        let stale = app.training().map(|run| run.id()).expect("run active");

        // Leave and come back: a new run replaces the old one.
        assert!(app.navigate_to(WizardStep::Dataset));
        assert!(app.training().is_none());
        assert!(app.finish_dataset());
        assert!(app.finish_parameters());

        let mut rng = StdRng::seed_from_u64(2);
        assert!(app.apply_training_tick(TrainingTick { run_id: stale }, &mut rng).is_none());
        assert_eq!(app.training().map(|run| run.simulator().log().len()), Some(0));
    }

    #[test]
    fn test_tick_outside_training_is_dropped() {
        let mut app = TunerApp::new();
        let mut rng = StdRng::seed_from_u64(3);
        assert!(app.apply_training_tick(TrainingTick { run_id: 1 }, &mut rng).is_none());
    }

    #[test]
    fn test_restart_keeps_configuration() {
        let mut app = app_on_training();
        let mut rng = StdRng::seed_from_u64(4);
        while tick_current(&mut app, &mut rng).is_some() {}
        app.finish_training();

        app.examples_mut().add("extra", "pair");
        app.set_hyperparameters(app.hyperparameters().with_epochs(9));
        let examples = app.examples().clone();
        let params = app.hyperparameters();

        app.restart();

        assert_eq!(app.current_step(), WizardStep::Introduction);
        assert!(app.wizard().completed().is_empty());
        assert_eq!(app.examples(), &examples);
        assert_eq!(app.hyperparameters(), params);
        assert_eq!(app.playground().messages().len(), 1);
    }

    #[test]
    fn test_send_only_on_playground() {
        let mut app = TunerApp::new();
        assert!(app.begin_send("hello").is_none());
        assert_eq!(app.playground().messages().len(), 1);
    }

    #[test]
    fn test_locked_navigation_is_noop() {
        let mut app = TunerApp::new();
        app.start();
        assert!(!app.navigate_to(WizardStep::Training));
        assert!(app.training().is_none());
        assert_eq!(app.current_step(), WizardStep::Dataset);
    }

    #[test]
    fn test_back_to_dataset_from_parameters() {
        let mut app = TunerApp::new();
        app.start();
        app.finish_dataset();

        assert!(app.back_to_dataset());
        assert_eq!(app.current_step(), WizardStep::Dataset);
        assert!(app.finish_dataset());
        assert_eq!(app.current_step(), WizardStep::Parameters);
    }

    #[tokio::test(start_paused = true)]
    async fn test_timer_drives_run_and_stops_when_done() {
        let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
        let mut app = TunerApp::with_timer(tx, Duration::from_millis(800));
        app.set_hyperparameters(Hyperparameters::default().with_epochs(2));
        app.start();
        app.finish_dataset();
        app.finish_parameters();

        while let Some(tick) = rx.recv().await {
            app.on_training_tick(tick);
            if app.training().is_some_and(|run| run.simulator().is_finished()) {
                break;
            }
        }

        let run = app.training().expect("run active");
        assert_eq!(run.simulator().log().len(), 2);

        // The finished run's timer is stopped; no further ticks arrive.
        tokio::time::sleep(Duration::from_secs(5)).await;
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn test_leaving_training_cancels_timer() {
        let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
        let mut app = TunerApp::with_timer(tx, Duration::from_millis(800));
        app.start();
        app.finish_dataset();
        app.finish_parameters();

        let tick = rx.recv().await.expect("first tick");
        app.on_training_tick(tick);
        assert!(app.navigate_to(WizardStep::Parameters));
        assert!(app.training().is_none());

        tokio::time::sleep(Duration::from_secs(10)).await;
        while let Ok(tick) = rx.try_recv() {
            assert!(app.on_training_tick(tick).is_none());
        }
    }
}
