use ratatui::Frame;
use ratatui::layout::{Constraint, Layout, Rect};
use ratatui::style::{Color, Modifier, Style, Stylize};
use ratatui::symbols;
use ratatui::text::{Line, Span, Text};
use ratatui::widgets::{
    Axis, Block, Chart, Dataset, Gauge, GraphType, List, ListItem, ListState, Paragraph, Tabs, Wrap,
};
use tuner_core::models::hyperparameters::{
    MAX_EPOCHS, MAX_LEARNING_RATE, MIN_EPOCHS, MIN_LEARNING_RATE,
};
use tuner_core::models::{HyperparameterField, MIN_EXAMPLES, ModelSelection, Role, WizardStep};

use crate::app::{DatasetFocus, TuiApp};

const ACCENT: Color = Color::Cyan;
const SPINNER: [&str; 4] = ["|", "/", "-", "\\"];
const PLAYGROUND_PREVIEW: usize = 3;

pub fn render(frame: &mut Frame, app: &TuiApp) {
    let [header, body, footer] = Layout::vertical([
        Constraint::Length(3),
        Constraint::Min(0),
        Constraint::Length(2),
    ])
    .areas(frame.area());

    render_steps(frame, header, app);

    match app.core.current_step() {
        WizardStep::Introduction => render_introduction(frame, body),
        WizardStep::Dataset => render_dataset(frame, body, app),
        WizardStep::Parameters => render_parameters(frame, body, app),
        WizardStep::Training => render_training(frame, body, app),
        WizardStep::Playground => render_playground(frame, body, app),
    }

    render_footer(frame, footer, app);
}

fn render_steps(frame: &mut Frame, area: Rect, app: &TuiApp) {
    let wizard = app.core.wizard();
    let titles = WizardStep::ALL.iter().map(|&step| {
        let marker = if wizard.is_completed(step) { "✓" } else { " " };
        let label = format!("F{} {} {}", step.index() + 1, marker, step.label());
        if wizard.is_unlocked(step) {
            Line::from(label)
        } else {
            Line::from(label).dark_gray()
        }
    });

    let tabs = Tabs::new(titles)
        .block(Block::bordered().title(" Tuner Lab "))
        .select(app.core.current_step().index())
        .highlight_style(Style::default().fg(ACCENT).add_modifier(Modifier::BOLD))
        .divider(symbols::line::VERTICAL);

    frame.render_widget(tabs, area);
}

fn render_introduction(frame: &mut Frame, area: Rect) {
    let text = Text::from(vec![
        Line::from("What is fine-tuning?").bold(),
        Line::from(""),
        Line::from(
            "A general-purpose model knows a little about everything. Fine-tuning \
             continues its training on a small set of examples so it gets good at one task.",
        ),
        Line::from(""),
        Line::from("In this walkthrough you will:"),
        Line::from("  1. Build a dataset of input/output examples"),
        Line::from("  2. Choose the hyperparameters for the run"),
        Line::from("  3. Watch a simulated training run"),
        Line::from("  4. Compare the base model with the tuned one"),
        Line::from(""),
        Line::from(vec![
            Span::raw("Press "),
            Span::styled("Enter", Style::default().fg(ACCENT).add_modifier(Modifier::BOLD)),
            Span::raw(" to start."),
        ]),
    ]);

    frame.render_widget(
        Paragraph::new(text)
            .wrap(Wrap { trim: false })
            .block(Block::bordered().title(" Introduction ")),
        area,
    );
}

fn render_dataset(frame: &mut Frame, area: Rect, app: &TuiApp) {
    let [form_area, list_area] =
        Layout::horizontal([Constraint::Percentage(40), Constraint::Percentage(60)]).areas(area);
    let [input_area, output_area, hint_area] = Layout::vertical([
        Constraint::Length(3),
        Constraint::Length(3),
        Constraint::Min(0),
    ])
    .areas(form_area);

    let form = &app.dataset_form;
    frame.render_widget(
        text_field(" Input ", &form.input, form.focus == DatasetFocus::Input),
        input_area,
    );
    frame.render_widget(
        text_field(" Output ", &form.output, form.focus == DatasetFocus::Output),
        output_area,
    );

    let examples = app.core.examples();
    let progress = if examples.meets_minimum() {
        Line::from(format!("{} examples, ready to continue", examples.len())).green()
    } else {
        Line::from(format!(
            "{} / {} examples, add {} more",
            examples.len(),
            MIN_EXAMPLES,
            examples.remaining_required()
        ))
        .yellow()
    };
    let hints = Text::from(vec![
        progress,
        Line::from(""),
        Line::from("Enter  add example"),
        Line::from("Tab    switch field / list"),
        Line::from("d      remove selected (list)"),
        Line::from("^R     restore sample set"),
        Line::from(format!("^E     export to {}", app.export_path.display())),
        Line::from("^N     next step"),
    ]);
    frame.render_widget(Paragraph::new(hints).wrap(Wrap { trim: false }), hint_area);

    let items: Vec<ListItem> = examples
        .examples()
        .iter()
        .map(|example| {
            ListItem::new(vec![
                Line::from(vec![Span::raw("in:  ").dark_gray(), Span::raw(example.input.clone())]),
                Line::from(vec![
                    Span::raw("out: ").dark_gray(),
                    Span::raw(example.output.clone()).fg(ACCENT),
                ]),
            ])
        })
        .collect();

    let list_focused = form.focus == DatasetFocus::List;
    let mut state = ListState::default();
    if list_focused && !examples.is_empty() {
        state.select(Some(form.selected));
    }
    let list = List::new(items)
        .block(focus_block(format!(" Examples ({}) ", examples.len()), list_focused))
        .highlight_style(Style::default().add_modifier(Modifier::REVERSED))
        .highlight_symbol("> ");
    frame.render_stateful_widget(list, list_area, &mut state);
}

fn render_parameters(frame: &mut Frame, area: Rect, app: &TuiApp) {
    let params = app.core.hyperparameters();
    let mut lines = Vec::new();

    for field in HyperparameterField::ALL {
        let (value, range) = match field {
            HyperparameterField::Epochs => (
                params.epochs().to_string(),
                format!("{MIN_EPOCHS}-{MAX_EPOCHS}"),
            ),
            HyperparameterField::BatchSize => (
                params.batch_size().value().to_string(),
                "4, 8, 16 or 32".to_string(),
            ),
            HyperparameterField::LearningRate => (
                format!("{:.4}", params.learning_rate()),
                format!("{MIN_LEARNING_RATE}-{MAX_LEARNING_RATE}"),
            ),
        };

        let selected = field == app.param_focus;
        let marker = if selected { "> " } else { "  " };
        let label = format!("{marker}{:<15}", field.label());
        let value = format!("< {value} >");
        let mut line = Line::from(vec![
            Span::raw(label),
            Span::raw(value).bold(),
            Span::raw(format!("   ({range})")).dark_gray(),
        ]);
        if selected {
            line = line.fg(ACCENT);
        }
        lines.push(line);
        lines.push(Line::from(format!("    {}", field.help())).dark_gray());
        lines.push(Line::from(""));
    }

    lines.push(Line::from(
        "Up/Down select   Left/Right adjust   PgUp/PgDn x10   Enter start training   Esc back",
    ));

    frame.render_widget(
        Paragraph::new(lines)
            .wrap(Wrap { trim: false })
            .block(Block::bordered().title(" Hyperparameters ")),
        area,
    );
}

fn render_training(frame: &mut Frame, area: Rect, app: &TuiApp) {
    let Some(run) = app.core.training() else {
        frame.render_widget(
            Paragraph::new("Waiting for the run to start...").block(Block::bordered()),
            area,
        );
        return;
    };
    let simulator = run.simulator();

    let [gauge_area, chart_area, stats_area] = Layout::vertical([
        Constraint::Length(3),
        Constraint::Min(8),
        Constraint::Length(5),
    ])
    .areas(area);

    let label = format!(
        "Epoch {}/{}",
        simulator.current_epoch(),
        simulator.total_epochs()
    );
    let gauge = Gauge::default()
        .block(Block::bordered().title(" Progress "))
        .gauge_style(Style::default().fg(ACCENT))
        .ratio(simulator.progress().clamp(0.0, 1.0))
        .label(label);
    frame.render_widget(gauge, gauge_area);

    let loss: Vec<(f64, f64)> = simulator
        .log()
        .iter()
        .map(|entry| (entry.epoch as f64, entry.loss))
        .collect();
    let accuracy: Vec<(f64, f64)> = simulator
        .log()
        .iter()
        .map(|entry| (entry.epoch as f64, entry.accuracy))
        .collect();

    let max_x = simulator.total_epochs().max(1) as f64;
    let max_y = loss
        .iter()
        .map(|&(_, y)| y)
        .fold(1.0_f64, f64::max)
        .ceil();

    let datasets = vec![
        Dataset::default()
            .name("loss")
            .marker(symbols::Marker::Braille)
            .graph_type(GraphType::Line)
            .style(Style::default().fg(Color::Red))
            .data(&loss),
        Dataset::default()
            .name("accuracy")
            .marker(symbols::Marker::Braille)
            .graph_type(GraphType::Line)
            .style(Style::default().fg(Color::Green))
            .data(&accuracy),
    ];
    let chart = Chart::new(datasets)
        .block(Block::bordered().title(" Loss / accuracy "))
        .x_axis(
            Axis::default()
                .title("epoch")
                .bounds([1.0, max_x])
                .labels(["1".to_string(), format!("{}", max_x as u32)]),
        )
        .y_axis(
            Axis::default()
                .bounds([0.0, max_y])
                .labels(["0".to_string(), format!("{max_y:.1}")]),
        );
    frame.render_widget(chart, chart_area);

    let params = app.core.hyperparameters();
    let (loss_text, accuracy_text) = match simulator.latest() {
        Some(entry) => (
            format!("{:.4}", entry.loss),
            format!("{:.1}%", entry.accuracy * 100.0),
        ),
        None => ("-".to_string(), "-".to_string()),
    };
    let best = simulator
        .best_loss()
        .map_or_else(|| "-".to_string(), |loss| format!("{loss:.4}"));

    let status = if simulator.is_finished() {
        Line::from("Training complete. Press Enter to open the playground.").green()
    } else {
        let spinner = SPINNER[app.frame_count % SPINNER.len()];
        Line::from(format!("{spinner} Training...")).yellow()
    };

    let stats = Text::from(vec![
        Line::from(format!(
            "Loss {loss_text}   Best {best}   Accuracy {accuracy_text}"
        )),
        Line::from(format!(
            "Batch size {}   Learning rate {:.4}",
            params.batch_size().value(),
            params.learning_rate()
        ))
        .dark_gray(),
        status,
    ]);
    frame.render_widget(
        Paragraph::new(stats).block(Block::bordered().title(" Run ")),
        stats_area,
    );
}

fn render_playground(frame: &mut Frame, area: Rect, app: &TuiApp) {
    let [sidebar, main] =
        Layout::horizontal([Constraint::Length(34), Constraint::Min(0)]).areas(area);
    let [chat_area, input_area] =
        Layout::vertical([Constraint::Min(0), Constraint::Length(3)]).areas(main);

    let playground = app.core.playground();
    let selection = playground.selection();

    let mut side = vec![Line::from("Model").bold()];
    for option in [ModelSelection::Base, ModelSelection::Tuned] {
        let marker = if option == selection { "(*)" } else { "( )" };
        let line = Line::from(format!("{marker} {}", option.display_name()));
        side.push(if option == selection {
            line.fg(ACCENT)
        } else {
            line
        });
    }
    side.push(Line::from(format!("    {}", app.generator.model_name())).dark_gray());
    if !app.has_api_key {
        side.push(Line::from("No API key configured").red());
    }
    side.push(Line::from(""));
    side.push(Line::from("Tuned on").bold());
    for example in app.core.examples().preview(PLAYGROUND_PREVIEW) {
        side.push(Line::from(format!("• {}", example.input)));
        side.push(Line::from(format!("  → {}", example.output)).fg(ACCENT));
    }
    let hidden = app
        .core
        .examples()
        .len()
        .saturating_sub(PLAYGROUND_PREVIEW);
    if hidden > 0 {
        side.push(Line::from(format!("  and {hidden} more")).dark_gray());
    }
    side.push(Line::from(""));
    side.push(Line::from("Tab switch model").dark_gray());
    side.push(Line::from("^R  restart").dark_gray());

    frame.render_widget(
        Paragraph::new(side)
            .wrap(Wrap { trim: false })
            .block(Block::bordered().title(" Playground ")),
        sidebar,
    );

    let mut transcript: Vec<Line> = Vec::new();
    for message in playground.messages() {
        let (who, style) = match message.role {
            Role::User => ("You", Style::default().fg(Color::Yellow)),
            Role::Model if message.is_error => ("Model", Style::default().fg(Color::Red)),
            Role::Model => ("Model", Style::default().fg(ACCENT)),
        };
        transcript.push(Line::from(Span::styled(format!("{who}:"), style.add_modifier(Modifier::BOLD))));
        for text_line in message.text.lines() {
            transcript.push(Line::from(text_line.to_string()));
        }
        transcript.push(Line::from(""));
    }
    if playground.is_busy() {
        transcript.push(Line::from("Model is thinking...").italic().dark_gray());
    }

    // Keep the newest messages visible.
    let visible = chat_area.height.saturating_sub(2) as usize;
    let scroll = transcript.len().saturating_sub(visible) as u16;
    frame.render_widget(
        Paragraph::new(transcript)
            .wrap(Wrap { trim: false })
            .scroll((scroll, 0))
            .block(Block::bordered().title(format!(" Chat: {} ", selection.display_name()))),
        chat_area,
    );

    let prompt_title = if playground.is_busy() {
        " Waiting for reply "
    } else {
        " Message (Enter to send) "
    };
    frame.render_widget(
        text_field(prompt_title, &app.chat_input, !playground.is_busy()),
        input_area,
    );
}

fn render_footer(frame: &mut Frame, area: Rect, app: &TuiApp) {
    let errors = app.diagnostics.error_count();
    let warnings = app.diagnostics.warning_count();

    let mut spans = vec![Span::raw(" F1-F5 steps   ^Q quit ").dark_gray()];
    if errors > 0 || warnings > 0 {
        spans.push(Span::raw(format!(" {errors} errors, {warnings} warnings ")).red());
    }

    let status = match (&app.status, app.diagnostics.latest()) {
        (Some(status), _) => Line::from(status.clone()).yellow(),
        (None, Some(entry)) => Line::from(format!(" last: {}", entry.message)).dark_gray(),
        (None, None) => Line::from(""),
    };

    frame.render_widget(Paragraph::new(vec![Line::from(spans), status]), area);
}

fn focus_block<'a>(title: impl Into<Line<'a>>, focused: bool) -> Block<'a> {
    let block = Block::bordered().title(title);
    if focused {
        block.border_style(Style::default().fg(ACCENT))
    } else {
        block
    }
}

fn text_field<'a>(title: &'a str, value: &'a str, focused: bool) -> Paragraph<'a> {
    let content = if focused {
        format!("{value}▏")
    } else {
        value.to_string()
    };
    Paragraph::new(content).block(focus_block(title, focused))
}
