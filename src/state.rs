use std::collections::VecDeque;
use std::path::PathBuf;
use std::time::Duration;

use crate::btts::Prediction;
use crate::monte_carlo::{MonteCarloReport, MonteCarloRequest};
use crate::payload::MatchFile;
use crate::session::Session;
use crate::simulator::MatchResult;
use crate::stats::{RawTeamInput, TeamInput};
use crate::store::SavedPrediction;
use crate::trace::TraceStep;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    Prediction,
    Simulation,
    MonteCarlo,
    History,
}

impl Screen {
    pub fn label(self) -> &'static str {
        match self {
            Screen::Prediction => "PREDICTION",
            Screen::Simulation => "MATCH",
            Screen::MonteCarlo => "MONTE CARLO",
            Screen::History => "HISTORY",
        }
    }
}

/// Work handed to the background thread so the UI keeps drawing.
#[derive(Debug, Clone)]
pub enum WorkerCommand {
    MonteCarlo {
        request: MonteCarloRequest,
        seed: u64,
        generation: u64,
    },
    Save(Prediction),
    LoadHistory {
        limit: usize,
    },
    LoadPrediction {
        id: i64,
    },
    Export {
        path: PathBuf,
        prediction: Prediction,
        simulation: Option<MatchResult>,
        monte_carlo: Option<MonteCarloReport>,
    },
}

#[derive(Debug, Clone)]
pub enum Delta {
    /// `generation` echoes the prediction the run was started for.
    MonteCarloDone {
        generation: u64,
        report: MonteCarloReport,
    },
    MonteCarloFailed {
        generation: u64,
        error: String,
    },
    Saved { id: i64 },
    HistoryLoaded(Vec<SavedPrediction>),
    PredictionLoaded { id: i64, prediction: Prediction },
    Exported { path: String, rows: usize },
    Log(String),
}

pub struct AppState {
    pub screen: Screen,
    pub source: String,
    pub input: MatchFile,
    pub session: Session,
    pub trace: Vec<TraceStep>,
    pub revealed: usize,
    pub fast_reveal: bool,
    pub simulation: Option<MatchResult>,
    pub monte_carlo: Option<MonteCarloReport>,
    pub monte_carlo_running: bool,
    /// Bumped whenever the active prediction changes.
    pub prediction_generation: u64,
    pub history: Vec<SavedPrediction>,
    pub history_selected: usize,
    pub scroll: u16,
    pub logs: VecDeque<String>,
    pub help_overlay: bool,
}

impl AppState {
    pub fn new(input: MatchFile, source: impl Into<String>, seed: Option<u64>) -> Self {
        let mut state = Self {
            screen: Screen::Prediction,
            source: source.into(),
            input,
            session: Session::with_seed(seed),
            trace: Vec::new(),
            revealed: 0,
            fast_reveal: false,
            simulation: None,
            monte_carlo: None,
            monte_carlo_running: false,
            prediction_generation: 0,
            history: Vec::new(),
            history_selected: 0,
            scroll: 0,
            logs: VecDeque::new(),
            help_overlay: false,
        };
        if let Some(config) = state.input.config.clone() {
            if let Err(err) = state.session.set_config(config) {
                state.push_log(format!("[WARN] Simulation config ignored: {err}"));
            }
        }
        state
    }

    /// Starts from the built-in showcase fixture.
    pub fn demo(seed: Option<u64>) -> Self {
        let (home, away) = TeamInput::demo_pair();
        let input = MatchFile {
            team1: RawTeamInput::from(&home),
            team2: RawTeamInput::from(&away),
            config: None,
        };
        Self::new(input, "demo", seed)
    }

    pub fn push_log(&mut self, msg: impl Into<String>) {
        const MAX_LOGS: usize = 200;
        self.logs.push_back(msg.into());
        while self.logs.len() > MAX_LOGS {
            self.logs.pop_front();
        }
    }

    pub fn prediction(&self) -> Option<&Prediction> {
        self.session.prediction()
    }

    /// Runs both models on the loaded inputs and restarts the trace reveal.
    pub fn predict(&mut self) {
        let team1 = self.input.team1.clone();
        let team2 = self.input.team2.clone();
        match self.session.predict(&team1, &team2) {
            Ok(prediction) => {
                let trace: Vec<TraceStep> = prediction.steps().collect();
                let line = format!(
                    "[INFO] BTTS {:.2}% ({})",
                    prediction.btts.final_probability,
                    prediction.btts.recommended_model.label()
                );
                self.reset_for(trace);
                self.push_log(line);
            }
            Err(err) => self.push_log(format!("[WARN] {err}")),
        }
    }

    /// Makes a saved prediction the active one, inputs included.
    pub fn restore(&mut self, id: i64, prediction: Prediction) {
        let (team1, team2) = prediction.team_inputs();
        self.input = MatchFile {
            team1: RawTeamInput::from(&team1),
            team2: RawTeamInput::from(&team2),
            config: self.input.config.clone(),
        };
        self.source = format!("history #{id}");
        let trace = prediction.steps().collect();
        let line = format!(
            "[INFO] Restored #{id}: {} vs {}, BTTS {:.2}%",
            prediction.team1.name, prediction.team2.name, prediction.btts.final_probability
        );
        self.session.set_prediction(prediction);
        self.reset_for(trace);
        self.push_log(line);
    }

    fn reset_for(&mut self, trace: Vec<TraceStep>) {
        self.prediction_generation += 1;
        self.trace = trace;
        self.revealed = 0;
        self.simulation = None;
        self.monte_carlo = None;
        self.screen = Screen::Prediction;
        self.scroll = 0;
    }

    /// Request for the active prediction, tagged with its generation.
    pub fn monte_carlo_command(&self, simulations: u64, seed: u64) -> Option<WorkerCommand> {
        let (team1, team2) = self.prediction()?.team_inputs();
        Some(WorkerCommand::MonteCarlo {
            request: MonteCarloRequest {
                team1,
                team2,
                simulations,
            },
            seed,
            generation: self.prediction_generation,
        })
    }

    pub fn simulate(&mut self) {
        match self.session.simulate() {
            Ok(result) => {
                self.push_log(format!("[INFO] Full time: {}", result.score_line()));
                self.simulation = Some(result);
                self.screen = Screen::Simulation;
                self.scroll = 0;
            }
            Err(err) => self.push_log(format!("[WARN] {err}")),
        }
    }

    /// Reveals one more trace line. Returns false once everything is shown.
    pub fn reveal_next(&mut self) -> bool {
        if self.revealed >= self.trace.len() {
            return false;
        }
        self.revealed += 1;
        true
    }

    pub fn reveal_all(&mut self) {
        self.revealed = self.trace.len();
    }

    pub fn trace_complete(&self) -> bool {
        self.revealed >= self.trace.len()
    }

    pub fn visible_trace(&self) -> &[TraceStep] {
        &self.trace[..self.revealed.min(self.trace.len())]
    }

    pub fn toggle_speed(&mut self) {
        self.fast_reveal = !self.fast_reveal;
        let label = if self.fast_reveal { "x2" } else { "x1" };
        self.push_log(format!("[INFO] Reveal speed {label}"));
    }

    pub fn reveal_interval(&self, base: Duration) -> Duration {
        if self.fast_reveal { base / 2 } else { base }
    }

    pub fn scroll_down(&mut self) {
        self.scroll = self.scroll.saturating_add(1);
    }

    pub fn scroll_up(&mut self) {
        self.scroll = self.scroll.saturating_sub(1);
    }

    pub fn selected_history(&self) -> Option<&SavedPrediction> {
        self.history.get(self.history_selected)
    }

    pub fn select_next_history(&mut self) {
        if self.history_selected + 1 < self.history.len() {
            self.history_selected += 1;
        }
    }

    pub fn select_prev_history(&mut self) {
        self.history_selected = self.history_selected.saturating_sub(1);
    }

    pub fn set_screen(&mut self, screen: Screen) {
        if self.screen != screen {
            self.screen = screen;
            self.scroll = 0;
        }
    }
}

pub fn apply_delta(state: &mut AppState, delta: Delta) {
    match delta {
        Delta::MonteCarloDone { generation, report } => {
            state.monte_carlo_running = false;
            if generation != state.prediction_generation {
                state.push_log("[INFO] Discarded stale Monte Carlo result");
                return;
            }
            state.push_log(format!(
                "[INFO] Monte Carlo BTTS {:.2}% over {} runs",
                report.btts.probability, report.simulations
            ));
            state.monte_carlo = Some(report);
        }
        Delta::MonteCarloFailed { generation, error } => {
            state.monte_carlo_running = false;
            if generation == state.prediction_generation {
                state.push_log(format!("[WARN] Monte Carlo failed: {error}"));
            }
        }
        Delta::Saved { id } => state.push_log(format!("[INFO] Prediction saved as #{id}")),
        Delta::HistoryLoaded(rows) => {
            state.push_log(format!("[INFO] Loaded {} saved predictions", rows.len()));
            state.history = rows;
            state.history_selected = 0;
        }
        Delta::PredictionLoaded { id, prediction } => state.restore(id, prediction),
        Delta::Exported { path, rows } => {
            state.push_log(format!("[INFO] Exported {rows} rows to {path}"));
        }
        Delta::Log(msg) => state.push_log(msg),
    }
}
