use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use crossterm::event::{Event, EventStream, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use futures::StreamExt;
use ratatui::DefaultTerminal;
use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender};
use tracing::{debug, info, warn};
use tuner_core::TunerApp;
use tuner_core::exporters::write_jsonl;
use tuner_core::models::{HyperparameterField, WizardStep};
use tuner_core::services::{Diagnostics, GenerationResult, TextGenerator, TrainingTick};

use crate::ui;

/// Results of background work, delivered back to the event loop.
pub enum AppEvent {
    Generation {
        request_id: u64,
        result: GenerationResult<String>,
    },
    Exported(Result<PathBuf, String>),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DatasetFocus {
    Input,
    Output,
    List,
}

/// Entry buffers and selection for the dataset screen.
pub struct DatasetForm {
    pub input: String,
    pub output: String,
    pub focus: DatasetFocus,
    pub selected: usize,
}

impl DatasetForm {
    fn new() -> Self {
        Self {
            input: String::new(),
            output: String::new(),
            focus: DatasetFocus::Input,
            selected: 0,
        }
    }

    fn focused_buffer(&mut self) -> Option<&mut String> {
        match self.focus {
            DatasetFocus::Input => Some(&mut self.input),
            DatasetFocus::Output => Some(&mut self.output),
            DatasetFocus::List => None,
        }
    }
}

/// Terminal-side state wrapped around the core coordinator.
pub struct TuiApp {
    pub core: TunerApp,
    pub generator: Arc<dyn TextGenerator>,
    pub diagnostics: Diagnostics,
    pub dataset_form: DatasetForm,
    pub param_focus: HyperparameterField,
    pub chat_input: String,
    pub status: Option<String>,
    pub export_path: PathBuf,
    pub has_api_key: bool,
    pub frame_count: usize,
    should_quit: bool,
    events: UnboundedSender<AppEvent>,
}

impl TuiApp {
    pub fn new(
        core: TunerApp,
        generator: Arc<dyn TextGenerator>,
        diagnostics: Diagnostics,
        export_path: PathBuf,
        has_api_key: bool,
        events: UnboundedSender<AppEvent>,
    ) -> Self {
        Self {
            core,
            generator,
            diagnostics,
            dataset_form: DatasetForm::new(),
            param_focus: HyperparameterField::Epochs,
            chat_input: String::new(),
            status: None,
            export_path,
            has_api_key,
            frame_count: 0,
            should_quit: false,
            events,
        }
    }

    pub fn handle_key(&mut self, key: KeyEvent) {
        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);

        match key.code {
            KeyCode::Char('c') | KeyCode::Char('q') if ctrl => {
                self.should_quit = true;
                return;
            }
            KeyCode::F(n @ 1..=5) => {
                if let Some(step) = WizardStep::from_index(n as usize - 1)
                    && !self.core.navigate_to(step)
                {
                    self.status = Some(format!("{} is locked until you get there", step.label()));
                }
                return;
            }
            _ => {}
        }

        match self.core.current_step() {
            WizardStep::Introduction => self.handle_introduction_key(key),
            WizardStep::Dataset => self.handle_dataset_key(key, ctrl),
            WizardStep::Parameters => self.handle_parameters_key(key),
            WizardStep::Training => self.handle_training_key(key),
            WizardStep::Playground => self.handle_playground_key(key, ctrl),
        }
    }

    pub fn handle_event(&mut self, event: AppEvent) {
        match event {
            AppEvent::Generation { request_id, result } => {
                self.core.finish_send(request_id, result);
            }
            AppEvent::Exported(Ok(path)) => {
                self.status = Some(format!("Dataset exported to {}", path.display()));
            }
            AppEvent::Exported(Err(message)) => {
                self.status = Some(format!("Export failed: {message}"));
            }
        }
    }

    pub fn on_training_tick(&mut self, tick: TrainingTick) {
        self.core.on_training_tick(tick);
    }

    fn handle_introduction_key(&mut self, key: KeyEvent) {
        if key.code == KeyCode::Enter {
            self.core.start();
        }
    }

    fn handle_dataset_key(&mut self, key: KeyEvent, ctrl: bool) {
        if ctrl {
            match key.code {
                KeyCode::Char('n') => {
                    if !self.core.finish_dataset() {
                        self.status = Some(format!(
                            "Add {} more example(s) to continue",
                            self.core.examples().remaining_required()
                        ));
                    }
                }
                KeyCode::Char('r') => {
                    self.core.examples_mut().reset_to_default();
                    self.dataset_form.selected = 0;
                }
                KeyCode::Char('e') => self.export_dataset(),
                _ => {}
            }
            return;
        }

        let form = &mut self.dataset_form;
        match key.code {
            KeyCode::Tab => {
                form.focus = match form.focus {
                    DatasetFocus::Input => DatasetFocus::Output,
                    DatasetFocus::Output => DatasetFocus::List,
                    DatasetFocus::List => DatasetFocus::Input,
                };
            }
            KeyCode::Enter if form.focus != DatasetFocus::List => {
                if self.core.examples_mut().add(&form.input, &form.output) {
                    form.input.clear();
                    form.output.clear();
                    form.focus = DatasetFocus::Input;
                } else if form.focus == DatasetFocus::Input {
                    form.focus = DatasetFocus::Output;
                }
            }
            KeyCode::Up if form.focus == DatasetFocus::List => {
                form.selected = form.selected.saturating_sub(1);
            }
            KeyCode::Down if form.focus == DatasetFocus::List => {
                let last = self.core.examples().len().saturating_sub(1);
                form.selected = (form.selected + 1).min(last);
            }
            KeyCode::Delete | KeyCode::Char('d') if form.focus == DatasetFocus::List => {
                self.core.examples_mut().remove_at(form.selected);
                let last = self.core.examples().len().saturating_sub(1);
                form.selected = form.selected.min(last);
            }
            KeyCode::Backspace => {
                if let Some(buffer) = form.focused_buffer() {
                    buffer.pop();
                }
            }
            KeyCode::Char(c) => {
                if let Some(buffer) = form.focused_buffer() {
                    buffer.push(c);
                }
            }
            _ => {}
        }
    }

    fn handle_parameters_key(&mut self, key: KeyEvent) {
        let params = self.core.hyperparameters();
        match key.code {
            KeyCode::Up => self.param_focus = self.param_focus.previous(),
            KeyCode::Down | KeyCode::Tab => self.param_focus = self.param_focus.next(),
            KeyCode::Left => self.core.set_hyperparameters(params.step(self.param_focus, -1)),
            KeyCode::Right => self.core.set_hyperparameters(params.step(self.param_focus, 1)),
            KeyCode::PageDown => self.core.set_hyperparameters(params.step(self.param_focus, -10)),
            KeyCode::PageUp => self.core.set_hyperparameters(params.step(self.param_focus, 10)),
            KeyCode::Enter => {
                self.core.finish_parameters();
            }
            KeyCode::Esc | KeyCode::Backspace => {
                self.core.back_to_dataset();
            }
            _ => {}
        }
    }

    fn handle_training_key(&mut self, key: KeyEvent) {
        if key.code == KeyCode::Enter && !self.core.finish_training() {
            self.status = Some("Training is still running".to_string());
        }
    }

    fn handle_playground_key(&mut self, key: KeyEvent, ctrl: bool) {
        if ctrl {
            if key.code == KeyCode::Char('r') {
                self.chat_input.clear();
                self.core.restart();
            }
            return;
        }

        match key.code {
            KeyCode::Tab => {
                let selection = self.core.playground().selection().toggled();
                self.core.set_model_selection(selection);
            }
            KeyCode::Enter => self.send_chat(),
            KeyCode::Backspace => {
                self.chat_input.pop();
            }
            KeyCode::Char(c) => self.chat_input.push(c),
            _ => {}
        }
    }

    fn send_chat(&mut self) {
        let Some(pending) = self.core.begin_send(&self.chat_input) else {
            return;
        };
        self.chat_input.clear();

        let generator = Arc::clone(&self.generator);
        let events = self.events.clone();
        tokio::spawn(async move {
            let result = generator
                .generate(&pending.request.prompt, &pending.request.options)
                .await;
            if events
                .send(AppEvent::Generation {
                    request_id: pending.id,
                    result,
                })
                .is_err()
            {
                debug!("Event loop gone before generation finished");
            }
        });
    }

    fn export_dataset(&mut self) {
        let path = self.export_path.clone();
        let examples = self.core.examples().examples().to_vec();
        let events = self.events.clone();

        tokio::spawn(async move {
            let outcome = match write_jsonl(&path, &examples).await {
                Ok(()) => Ok(path),
                Err(e) => {
                    warn!(error = %e, path = %path.display(), "Dataset export failed");
                    Err(e.to_string())
                }
            };
            if events.send(AppEvent::Exported(outcome)).is_err() {
                debug!("Event loop gone before export finished");
            }
        });
    }
}

/// Main loop: redraw, then wait for a key press, a training tick, a
/// background result or the spinner interval.
pub async fn run(
    terminal: &mut DefaultTerminal,
    app: &mut TuiApp,
    mut ticks: UnboundedReceiver<TrainingTick>,
    mut events: UnboundedReceiver<AppEvent>,
) -> Result<()> {
    let mut terminal_events = EventStream::new();
    let mut redraw = tokio::time::interval(Duration::from_millis(250));

    info!("Event loop started");

    while !app.should_quit {
        terminal.draw(|frame| ui::render(frame, app))?;

        tokio::select! {
            maybe_event = terminal_events.next() => match maybe_event {
                Some(Ok(Event::Key(key))) if key.kind == KeyEventKind::Press => {
                    app.status = None;
                    app.handle_key(key);
                }
                Some(Ok(_)) => {}
                Some(Err(e)) => return Err(e.into()),
                None => break,
            },
            Some(tick) = ticks.recv() => app.on_training_tick(tick),
            Some(event) = events.recv() => app.handle_event(event),
            _ = redraw.tick() => app.frame_count = app.frame_count.wrapping_add(1),
        }
    }

    info!("Event loop finished");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use tokio::sync::mpsc;
    use tuner_core::models::Role;
    use tuner_core::services::GenerationOptions;

    struct Echo;

    #[async_trait]
    impl TextGenerator for Echo {
        async fn generate(
            &self,
            prompt: &str,
            _options: &GenerationOptions,
        ) -> GenerationResult<String> {
            Ok(format!("echo: {prompt}"))
        }

        fn model_name(&self) -> &str {
            "echo"
        }
    }

    fn test_app() -> (TuiApp, UnboundedReceiver<AppEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let app = TuiApp::new(
            TunerApp::new(),
            Arc::new(Echo),
            Diagnostics::new(8),
            PathBuf::from("dataset.jsonl"),
            true,
            tx,
        );
        (app, rx)
    }

    fn press(app: &mut TuiApp, code: KeyCode) {
        app.handle_key(KeyEvent::new(code, KeyModifiers::NONE));
    }

    fn press_ctrl(app: &mut TuiApp, c: char) {
        app.handle_key(KeyEvent::new(KeyCode::Char(c), KeyModifiers::CONTROL));
    }

    fn type_text(app: &mut TuiApp, text: &str) {
        for c in text.chars() {
            press(app, KeyCode::Char(c));
        }
    }

    fn finish_run(app: &mut TuiApp) {
        while let Some(run) = app.core.training() {
            if run.simulator().is_finished() {
                break;
            }
            let run_id = run.id();
            app.on_training_tick(TrainingTick { run_id });
        }
    }

    #[test]
    fn test_enter_starts_walkthrough() {
        let (mut app, _rx) = test_app();
        press(&mut app, KeyCode::Enter);
        assert_eq!(app.core.current_step(), WizardStep::Dataset);
    }

    #[test]
    fn test_adding_example_clears_form() {
        let (mut app, _rx) = test_app();
        press(&mut app, KeyCode::Enter);

        type_text(&mut app, "Great");
        press(&mut app, KeyCode::Tab);
        type_text(&mut app, "Positive");
        press(&mut app, KeyCode::Enter);

        assert_eq!(app.core.examples().len(), 6);
        assert!(app.dataset_form.input.is_empty());
        assert!(app.dataset_form.output.is_empty());
        assert_eq!(app.dataset_form.focus, DatasetFocus::Input);
    }

    #[test]
    fn test_enter_with_missing_output_moves_focus() {
        let (mut app, _rx) = test_app();
        press(&mut app, KeyCode::Enter);

        type_text(&mut app, "Only input");
        press(&mut app, KeyCode::Enter);

        assert_eq!(app.core.examples().len(), 5);
        assert_eq!(app.dataset_form.focus, DatasetFocus::Output);
        assert_eq!(app.dataset_form.input, "Only input");
    }

    #[test]
    fn test_cannot_leave_dataset_below_minimum() {
        let (mut app, _rx) = test_app();
        press(&mut app, KeyCode::Enter);

        press(&mut app, KeyCode::Tab);
        press(&mut app, KeyCode::Tab);
        press(&mut app, KeyCode::Char('d'));
        assert_eq!(app.core.examples().len(), 4);

        press_ctrl(&mut app, 'n');
        assert_eq!(app.core.current_step(), WizardStep::Dataset);
        assert!(app.status.as_deref().is_some_and(|s| s.contains("1 more")));

        press_ctrl(&mut app, 'r');
        press_ctrl(&mut app, 'n');
        assert_eq!(app.core.current_step(), WizardStep::Parameters);
    }

    #[test]
    fn test_parameter_keys_adjust_focused_field() {
        let (mut app, _rx) = test_app();
        press(&mut app, KeyCode::Enter);
        press_ctrl(&mut app, 'n');

        press(&mut app, KeyCode::Right);
        assert_eq!(app.core.hyperparameters().epochs(), 6);

        press(&mut app, KeyCode::Down);
        press(&mut app, KeyCode::Right);
        assert_eq!(app.core.hyperparameters().batch_size().value(), 8);

        press(&mut app, KeyCode::Esc);
        assert_eq!(app.core.current_step(), WizardStep::Dataset);
    }

    #[test]
    fn test_locked_step_sets_status() {
        let (mut app, _rx) = test_app();
        press(&mut app, KeyCode::F(4));
        assert_eq!(app.core.current_step(), WizardStep::Introduction);
        assert!(app.status.is_some());
    }

    #[test]
    fn test_ctrl_q_quits() {
        let (mut app, _rx) = test_app();
        press_ctrl(&mut app, 'q');
        assert!(app.should_quit);
    }

    #[tokio::test]
    async fn test_export_reports_back_to_event_loop() {
        let dir = tempfile::tempdir().expect("tempdir");
        let (mut app, mut rx) = test_app();
        app.export_path = dir.path().join("dataset.jsonl");
        press(&mut app, KeyCode::Enter);

        press_ctrl(&mut app, 'e');
        let event = rx.recv().await.expect("export result");
        app.handle_event(event);

        assert!(app.status.as_deref().is_some_and(|s| s.starts_with("Dataset exported")));
        assert!(app.export_path.exists());
    }

    #[tokio::test]
    async fn test_export_survives_closed_event_loop() {
        let dir = tempfile::tempdir().expect("tempdir");
        let (mut app, rx) = test_app();
        app.export_path = dir.path().join("dataset.jsonl");
        press(&mut app, KeyCode::Enter);
        drop(rx);

        press_ctrl(&mut app, 'e');
        for _ in 0..50 {
            if app.export_path.exists() {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        assert!(app.export_path.exists());
    }

    #[tokio::test]
    async fn test_playground_round_trip() {
        let (mut app, mut rx) = test_app();
        press(&mut app, KeyCode::Enter);
        press_ctrl(&mut app, 'n');
        press(&mut app, KeyCode::Enter);
        assert_eq!(app.core.current_step(), WizardStep::Training);

        press(&mut app, KeyCode::Enter);
        assert_eq!(app.core.current_step(), WizardStep::Training);

        finish_run(&mut app);
        press(&mut app, KeyCode::Enter);
        assert_eq!(app.core.current_step(), WizardStep::Playground);

        type_text(&mut app, "hi");
        press(&mut app, KeyCode::Enter);
        assert!(app.core.playground().is_busy());
        assert!(app.chat_input.is_empty());

        let event = rx.recv().await.expect("generation result");
        app.handle_event(event);

        let playground = app.core.playground();
        assert!(!playground.is_busy());
        let last = playground.messages().last().expect("reply appended");
        assert_eq!(last.role, Role::Model);
        assert_eq!(last.text, "echo: hi");
    }
}
