use std::fs::{self, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, mpsc};
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use chrono::Utc;
use crossterm::event::{
    self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEvent, KeyEventKind,
};
use crossterm::execute;
use crossterm::terminal::{
    EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
};
use ratatui::layout::{Constraint, Direction, Layout};
use ratatui::prelude::*;
use ratatui::style::{Color, Modifier, Style};
use ratatui::widgets::{Bar, BarChart, BarGroup, Block, Borders, Clear, Paragraph, Wrap};

use goal2goal::config::AppConfig;
use goal2goal::payload::MatchFile;
use goal2goal::simulator::EventKind;
use goal2goal::state::{AppState, Delta, Screen, WorkerCommand, apply_delta};
use goal2goal::store::DEFAULT_HISTORY_LIMIT;
use goal2goal::trace::StepTone;
use goal2goal::worker;

struct App {
    state: AppState,
    should_quit: bool,
    cmd_tx: Option<mpsc::Sender<WorkerCommand>>,
    config: AppConfig,
    last_reveal: Instant,
}

impl App {
    fn new(
        state: AppState,
        config: AppConfig,
        cmd_tx: Option<mpsc::Sender<WorkerCommand>>,
    ) -> Self {
        Self {
            state,
            should_quit: false,
            cmd_tx,
            config,
            last_reveal: Instant::now(),
        }
    }

    fn on_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Char('q') => self.should_quit = true,
            KeyCode::Char('1') => self.state.set_screen(Screen::Prediction),
            KeyCode::Char('2') => self.state.set_screen(Screen::Simulation),
            KeyCode::Char('3') => self.state.set_screen(Screen::MonteCarlo),
            KeyCode::Char('4') => self.state.set_screen(Screen::History),
            KeyCode::Char('p') => {
                self.state.predict();
                self.last_reveal = Instant::now();
            }
            KeyCode::Char('s') => self.state.simulate(),
            KeyCode::Char('m') => self.request_monte_carlo(),
            KeyCode::Char('w') => self.request_save(),
            KeyCode::Char('e') => self.request_export(),
            KeyCode::Char('h') => self.request_history(),
            KeyCode::Char('f') => self.state.toggle_speed(),
            KeyCode::Enter if self.state.screen == Screen::History => self.request_restore(),
            KeyCode::Char('j') | KeyCode::Down if self.state.screen == Screen::History => {
                self.state.select_next_history()
            }
            KeyCode::Char('k') | KeyCode::Up if self.state.screen == Screen::History => {
                self.state.select_prev_history()
            }
            KeyCode::Char(' ') | KeyCode::Enter => self.state.reveal_all(),
            KeyCode::Char('j') | KeyCode::Down => self.state.scroll_down(),
            KeyCode::Char('k') | KeyCode::Up => self.state.scroll_up(),
            KeyCode::Char('?') => self.state.help_overlay = !self.state.help_overlay,
            _ => {}
        }
    }

    fn send(&mut self, cmd: WorkerCommand, what: &str) -> bool {
        let Some(tx) = &self.cmd_tx else {
            self.state.push_log(format!("[INFO] {what} unavailable"));
            return false;
        };
        if tx.send(cmd).is_err() {
            self.state.push_log(format!("[WARN] {what} request failed"));
            return false;
        }
        true
    }

    fn request_monte_carlo(&mut self) {
        if self.state.monte_carlo_running {
            self.state.push_log("[INFO] Monte Carlo already running");
            return;
        }
        let seed = self.config.mc_seed.unwrap_or_else(rand::random);
        let Some(cmd) = self
            .state
            .monte_carlo_command(self.config.mc_simulations, seed)
        else {
            self.state.push_log("[INFO] Run a prediction first (p)");
            return;
        };
        if self.send(cmd, "Monte Carlo") {
            self.state.monte_carlo_running = true;
            self.state.set_screen(Screen::MonteCarlo);
            self.state.push_log(format!(
                "[INFO] Monte Carlo started ({} runs)",
                self.config.mc_simulations
            ));
        }
    }

    fn request_save(&mut self) {
        let Some(prediction) = self.state.prediction().cloned() else {
            self.state.push_log("[INFO] Nothing to save yet");
            return;
        };
        self.send(WorkerCommand::Save(prediction), "Save");
    }

    fn request_export(&mut self) {
        let Some(prediction) = self.state.prediction().cloned() else {
            self.state.push_log("[INFO] Nothing to export yet");
            return;
        };
        let file = format!("goal2goal_{}.xlsx", Utc::now().format("%Y%m%d_%H%M%S"));
        let cmd = WorkerCommand::Export {
            path: self.config.export_dir.join(file),
            prediction,
            simulation: self.state.simulation.clone(),
            monte_carlo: self.state.monte_carlo.clone(),
        };
        if self.send(cmd, "Export") {
            self.state.push_log("[INFO] Export request sent");
        }
    }

    fn request_history(&mut self) {
        let cmd = WorkerCommand::LoadHistory {
            limit: DEFAULT_HISTORY_LIMIT,
        };
        if self.send(cmd, "History") {
            self.state.set_screen(Screen::History);
        }
    }

    fn request_restore(&mut self) {
        let Some(id) = self.state.selected_history().map(|row| row.id) else {
            self.state.push_log("[INFO] No saved prediction selected");
            return;
        };
        if self.send(WorkerCommand::LoadPrediction { id }, "Restore") {
            self.last_reveal = Instant::now();
        }
    }

    fn maybe_reveal(&mut self) {
        if self.state.trace_complete() {
            return;
        }
        let interval = self.state.reveal_interval(self.config.reveal_delay);
        if self.last_reveal.elapsed() >= interval {
            self.state.reveal_next();
            self.last_reveal = Instant::now();
        }
    }
}

fn main() -> Result<()> {
    let _ = dotenvy::from_filename(".env.local");
    let _ = dotenvy::from_filename(".env");
    let config = AppConfig::from_env();
    init_file_logging(&config.log_file);

    let mut state = match parse_match_arg() {
        Some(path) => {
            let input = load_match_file(&path)?;
            AppState::new(input, path.display().to_string(), config.sim_seed)
        }
        None => AppState::demo(config.sim_seed),
    };
    if config.explanation_key_present {
        state.push_log("[INFO] Explanation service key configured");
    }
    state.push_log("[INFO] Press p to predict, ? for help");

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = ratatui::backend::CrosstermBackend::new(stdout);
    let mut terminal = ratatui::Terminal::new(backend)?;

    let (tx, rx) = mpsc::channel();
    let (cmd_tx, cmd_rx) = mpsc::channel();
    worker::spawn_worker(tx, cmd_rx, config.db_path.clone());

    let mut app = App::new(state, config, Some(cmd_tx));
    let res = run_app(&mut terminal, &mut app, rx);

    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    if let Err(err) = res {
        eprintln!("error: {err}");
    }
    Ok(())
}

fn init_file_logging(path: &Path) {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).ok();
    }
    let Ok(file) = OpenOptions::new().create(true).append(true).open(path) else {
        return;
    };
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .try_init();
}

fn parse_match_arg() -> Option<PathBuf> {
    let mut args = std::env::args().skip(1);
    while let Some(arg) = args.next() {
        if let Some(value) = arg.strip_prefix("--match=") {
            return Some(PathBuf::from(value));
        }
        if arg == "--match" {
            return args.next().map(PathBuf::from);
        }
    }
    None
}

fn load_match_file(path: &Path) -> Result<MatchFile> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("read match file {}", path.display()))?;
    serde_json::from_str(&raw).with_context(|| format!("parse match file {}", path.display()))
}

fn run_app<B: Backend>(
    terminal: &mut Terminal<B>,
    app: &mut App,
    rx: mpsc::Receiver<Delta>,
) -> io::Result<()> {
    let tick_rate = Duration::from_millis(250);
    let mut last_tick = Instant::now();

    loop {
        while let Ok(delta) = rx.try_recv() {
            apply_delta(&mut app.state, delta);
        }

        app.maybe_reveal();

        terminal.draw(|f| ui(f, app))?;

        let mut timeout = tick_rate
            .checked_sub(last_tick.elapsed())
            .unwrap_or(Duration::ZERO);
        if !app.state.trace_complete() {
            timeout = timeout.min(app.state.reveal_interval(app.config.reveal_delay));
        }
        if event::poll(timeout)? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    app.on_key(key);
                }
            }
        }

        if last_tick.elapsed() >= tick_rate {
            last_tick = Instant::now();
        }

        if app.should_quit {
            return Ok(());
        }
    }
}

fn ui(frame: &mut Frame, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(1),
            Constraint::Length(5),
            Constraint::Length(1),
        ])
        .split(frame.size());

    let header = Paragraph::new(header_text(&app.state))
        .block(Block::default().borders(Borders::BOTTOM));
    frame.render_widget(header, chunks[0]);

    match app.state.screen {
        Screen::Prediction => render_prediction(frame, chunks[1], &app.state),
        Screen::Simulation => render_simulation(frame, chunks[1], &app.state),
        Screen::MonteCarlo => render_monte_carlo(frame, chunks[1], &app.state),
        Screen::History => render_history(frame, chunks[1], &app.state),
    }

    let console = Paragraph::new(console_text(&app.state))
        .block(Block::default().title("Console").borders(Borders::ALL));
    frame.render_widget(console, chunks[2]);

    let footer = Paragraph::new(footer_text());
    frame.render_widget(footer, chunks[3]);

    if app.state.help_overlay {
        render_help_overlay(frame, frame.size());
    }
}

fn header_text(state: &AppState) -> String {
    let matchup = format!(
        "{} vs {}",
        display_name(&state.input.team1.name, "Team 1"),
        display_name(&state.input.team2.name, "Team 2")
    );
    let speed = if state.fast_reveal { "x2" } else { "x1" };
    let line1 = format!(
        "  (o)  GOAL2GOAL | {} | {matchup} | source: {}",
        state.screen.label(),
        state.source
    );
    let line2 = format!("  /|\\  BTTS terminal | reveal {speed}");
    format!("{line1}\n{line2}")
}

fn display_name<'a>(name: &'a str, fallback: &'a str) -> &'a str {
    if name.trim().is_empty() { fallback } else { name }
}

fn footer_text() -> String {
    "p Predict | s Simulate | m Monte Carlo | w Save | e Export | h History | f Speed | 1-4 Screens | ? Help | q Quit".to_string()
}

fn tone_style(tone: StepTone) -> Style {
    match tone {
        StepTone::Heading => Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
        StepTone::Info => Style::default(),
        StepTone::Positive => Style::default().fg(Color::Green),
        StepTone::Negative => Style::default().fg(Color::Red),
        StepTone::Result => Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
    }
}

fn render_prediction(frame: &mut Frame, area: Rect, state: &AppState) {
    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(65), Constraint::Percentage(35)])
        .split(area);

    let lines: Vec<Line> = if state.trace.is_empty() {
        vec![Line::from("No prediction yet. Press p to run both models.")]
    } else {
        state
            .visible_trace()
            .iter()
            .map(|step| Line::styled(step.to_string(), tone_style(step.tone())))
            .collect()
    };
    let title = if state.trace_complete() {
        "Computation"
    } else {
        "Computation (Space to skip)"
    };
    let trace = Paragraph::new(lines)
        .scroll((state.scroll, 0))
        .block(Block::default().title(title).borders(Borders::ALL));
    frame.render_widget(trace, columns[0]);

    let right = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(7), Constraint::Min(1)])
        .split(columns[1]);

    let block = Block::default().title("BTTS %").borders(Borders::ALL);
    match state.prediction() {
        Some(prediction) if state.trace_complete() => {
            let btts = &prediction.btts;
            let chart = btts_bar_chart(
                btts.poisson_probability,
                btts.logistic_probability,
                btts.final_probability,
            )
            .block(block);
            frame.render_widget(chart, right[0]);
        }
        _ => frame.render_widget(Paragraph::new("...").block(block), right[0]),
    }

    let summary = Paragraph::new(verdict_text(state))
        .wrap(Wrap { trim: true })
        .block(Block::default().title("Verdict").borders(Borders::ALL));
    frame.render_widget(summary, right[1]);
}

fn btts_bar_chart(poisson: f64, logistic: f64, final_probability: f64) -> BarChart<'static> {
    let bar = |label: &'static str, value: f64, color: Color| {
        Bar::default()
            .label(label.into())
            .value(value.round() as u64)
            .text_value(format!("{value:.1}%"))
            .style(Style::default().fg(color))
    };
    BarChart::default()
        .data(BarGroup::default().bars(&[
            bar("Poisson", poisson, Color::Cyan),
            bar("Logistic", logistic, Color::Magenta),
            bar("Final", final_probability, Color::Green),
        ]))
        .direction(Direction::Horizontal)
        .bar_width(1)
        .bar_gap(1)
        .max(100)
}

fn verdict_text(state: &AppState) -> String {
    let Some(prediction) = state.prediction() else {
        return "Waiting for a prediction".to_string();
    };
    if !state.trace_complete() {
        return "Computing...".to_string();
    }
    let btts = &prediction.btts;
    format!(
        "Both teams score: {:.2}%\nModel: {}\nConfidence: {}\n{}\n\n{} scores: {:.1}%\n{} scores: {:.1}%",
        btts.final_probability,
        btts.recommended_model.label(),
        btts.confidence.label(),
        btts.note_band().message(),
        prediction.team1.name,
        prediction.team1.prob_scores,
        prediction.team2.name,
        prediction.team2.prob_scores
    )
}

fn render_simulation(frame: &mut Frame, area: Rect, state: &AppState) {
    let Some(result) = &state.simulation else {
        let text = if state.prediction().is_some() {
            "Press s to simulate the match"
        } else {
            "Run a prediction first (p), then simulate (s)"
        };
        let empty =
            Paragraph::new(text).block(Block::default().title("Match").borders(Borders::ALL));
        frame.render_widget(empty, area);
        return;
    };

    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(60), Constraint::Percentage(40)])
        .split(area);

    let lines: Vec<Line> = result
        .timeline
        .iter()
        .map(|event| {
            let style = match event.kind {
                EventKind::Goal => Style::default().fg(Color::Green).add_modifier(Modifier::BOLD),
                EventKind::ChanceMissed => Style::default().fg(Color::Yellow),
                EventKind::Card => Style::default().fg(Color::LightYellow),
                EventKind::RedCard => Style::default().fg(Color::Red),
                EventKind::Info => Style::default().fg(Color::Cyan),
            };
            let xg = event
                .xg
                .map(|xg| format!(" (xG {xg:.2})"))
                .unwrap_or_default();
            Line::styled(
                format!(
                    "{:>3}' {:<8} {} {}{xg}",
                    event.minute,
                    event_kind_label(event.kind),
                    event.team,
                    event.description
                ),
                style,
            )
        })
        .collect();
    let timeline = Paragraph::new(lines)
        .scroll((state.scroll, 0))
        .block(Block::default().title("Timeline").borders(Borders::ALL));
    frame.render_widget(timeline, columns[0]);

    let mut rows = vec![
        format!(
            "{}  {} - {}  {}",
            result.team1, result.final_score.home, result.final_score.away, result.team2
        ),
        format!("Full time after {} minutes", result.duration),
        String::new(),
    ];
    for (label, home, away) in result.box_score.rows() {
        rows.push(format!("{home:>6}  {label:^22}  {away:<6}"));
    }
    let box_score = Paragraph::new(rows.join("\n"))
        .block(Block::default().title("Box score").borders(Borders::ALL));
    frame.render_widget(box_score, columns[1]);
}

fn event_kind_label(kind: EventKind) -> &'static str {
    match kind {
        EventKind::Goal => "GOAL",
        EventKind::ChanceMissed => "CHANCE",
        EventKind::Card => "CARD",
        EventKind::RedCard => "RED",
        EventKind::Info => "INFO",
    }
}

fn render_monte_carlo(frame: &mut Frame, area: Rect, state: &AppState) {
    let block = Block::default().title("Monte Carlo").borders(Borders::ALL);
    let Some(report) = &state.monte_carlo else {
        let text = if state.monte_carlo_running {
            "Simulating..."
        } else {
            "Press m to run the Monte Carlo simulation"
        };
        frame.render_widget(Paragraph::new(text).block(block), area);
        return;
    };

    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(area);

    let mut lines = vec![
        format!("Simulations: {}", report.simulations),
        format!(
            "BTTS: {:.2}% (95% CI {:.2} - {:.2})",
            report.btts.probability,
            report.btts.confidence_interval.lower,
            report.btts.confidence_interval.upper
        ),
        format!("Analytic BTTS: {:.2}%", report.reference_btts),
        String::new(),
        format!(
            "Home {:.1}% | Draw {:.1}% | Away {:.1}%",
            report.results.team1_win, report.results.draw, report.results.team2_win
        ),
        format!(
            "Goals: {:.2} ± {:.2} vs {:.2} ± {:.2} (total {:.2})",
            report.goals.team1_avg,
            report.goals.team1_std,
            report.goals.team2_avg,
            report.goals.team2_std,
            report.goals.total_avg
        ),
        format!(
            "Over 2.5: {:.1}% | Under 2.5: {:.1}%",
            report.over_under.over_2_5, report.over_under.under_2_5
        ),
        format!(
            "{} {} (sd {:.2}, cv {:.2})",
            report.volatility.icon,
            report.volatility.label,
            report.volatility.value,
            report.volatility.coefficient
        ),
        String::new(),
        "Top scorelines:".to_string(),
    ];
    for line in &report.top_scorelines {
        lines.push(format!("  {:<6} {:.2}%", line.score, line.probability));
    }
    frame.render_widget(Paragraph::new(lines.join("\n")).block(block), columns[0]);

    let bars: Vec<Bar> = report
        .total_goals_distribution
        .iter()
        .take(10)
        .map(|bucket| {
            Bar::default()
                .label(Line::from(bucket.goals.to_string()))
                .value(bucket.probability.round() as u64)
                .text_value(format!("{:.0}", bucket.probability))
        })
        .collect();
    let chart = BarChart::default()
        .data(BarGroup::default().bars(&bars))
        .bar_width(3)
        .bar_gap(1)
        .bar_style(Style::default().fg(Color::Green))
        .block(Block::default().title("Total goals %").borders(Borders::ALL));
    frame.render_widget(chart, columns[1]);
}

fn render_history(frame: &mut Frame, area: Rect, state: &AppState) {
    let lines: Vec<Line> = if state.history.is_empty() {
        vec![Line::from("No saved predictions (w saves, h reloads)")]
    } else {
        state
            .history
            .iter()
            .enumerate()
            .map(|(idx, row)| {
                let text = format!(
                    "#{:<4} {:<16} {} vs {}  BTTS {:.2}% ({}, {})",
                    row.id,
                    row.created_at.get(..16).unwrap_or(&row.created_at),
                    row.team1_name,
                    row.team2_name,
                    row.final_btts,
                    row.recommended_model,
                    row.confidence
                );
                if idx == state.history_selected {
                    Line::styled(
                        format!("> {text}"),
                        Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
                    )
                } else {
                    Line::from(format!("  {text}"))
                }
            })
            .collect()
    };
    let scroll = u16::try_from(state.history_selected).unwrap_or(u16::MAX);
    let history = Paragraph::new(lines)
        .scroll((scroll.saturating_sub(area.height.saturating_sub(3)), 0))
        .block(
            Block::default()
                .title("Saved predictions (Enter restores)")
                .borders(Borders::ALL),
        );
    frame.render_widget(history, area);
}

fn console_text(state: &AppState) -> String {
    if state.logs.is_empty() {
        return "No alerts yet".to_string();
    }
    state
        .logs
        .iter()
        .rev()
        .take(3)
        .cloned()
        .collect::<Vec<_>>()
        .into_iter()
        .rev()
        .collect::<Vec<_>>()
        .join("\n")
}

fn render_help_overlay(frame: &mut Frame, area: Rect) {
    let popup_area = centered_rect(60, 60, area);
    frame.render_widget(Clear, popup_area);

    let text = [
        "Goal2Goal - Help",
        "",
        "Actions:",
        "  p            Predict BTTS",
        "  s            Simulate the match",
        "  m            Monte Carlo simulation",
        "  w            Save prediction",
        "  e            Export workbook",
        "  h            Load history",
        "  Enter        Restore selected history row",
        "  f            Toggle reveal speed",
        "  Space/Enter  Show the full computation",
        "",
        "Screens:",
        "  1-4          Prediction / Match / Monte Carlo / History",
        "  j/k or ↑/↓   Scroll or pick a history row",
        "  ?            Toggle help",
        "  q            Quit",
    ]
    .join("\n");

    let help = Paragraph::new(text)
        .block(Block::default().title("Help").borders(Borders::ALL))
        .style(Style::default());
    frame.render_widget(help, popup_area);
}

fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(area);

    let horizontal = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(vertical[1]);

    horizontal[1]
}
