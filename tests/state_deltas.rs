use std::time::Duration;

use goal2goal::btts::Prediction;
use goal2goal::monte_carlo::{self, MonteCarloRequest};
use goal2goal::payload::MatchFile;
use goal2goal::state::{AppState, Delta, Screen, WorkerCommand, apply_delta};
use goal2goal::stats::{RawTeamInput, TeamInput};
use goal2goal::store::SavedPrediction;
use goal2goal::trace::TraceStep;

fn saved_row(id: i64) -> SavedPrediction {
    SavedPrediction {
        id,
        team1_name: "HOME".to_string(),
        team2_name: "AWAY".to_string(),
        poisson_btts: 61.0,
        logistic_btts: 58.0,
        final_btts: 59.5,
        recommended_model: "Consensus".to_string(),
        confidence: "High".to_string(),
        created_at: "2026-06-11T18:00:00+00:00".to_string(),
    }
}

#[test]
fn predict_builds_trace_and_reveals_progressively() {
    let mut state = AppState::demo(Some(7));
    assert!(state.prediction().is_none());
    state.predict();

    assert!(state.prediction().is_some());
    assert!(!state.trace.is_empty());
    assert_eq!(state.revealed, 0);
    assert!(state.visible_trace().is_empty());

    assert!(state.reveal_next());
    assert_eq!(state.visible_trace().len(), 1);
    state.reveal_all();
    assert!(state.trace_complete());
    assert!(!state.reveal_next());
    assert!(matches!(
        state.visible_trace().last(),
        Some(TraceStep::Verdict { .. })
    ));
}

#[test]
fn invalid_input_logs_warning_and_keeps_previous_prediction() {
    let mut state = AppState::demo(None);
    state.predict();
    let before = state.prediction().cloned();

    state.input.team1.stats.passing_accuracy = Some("lots".into());
    state.predict();
    assert_eq!(state.prediction().cloned(), before);
    assert!(state.logs.back().unwrap().starts_with("[WARN]"));
}

#[test]
fn simulate_requires_prediction_then_switches_screen() {
    let mut state = AppState::demo(Some(11));
    state.simulate();
    assert!(state.simulation.is_none());
    assert!(state.logs.back().unwrap().starts_with("[WARN]"));

    state.predict();
    state.simulate();
    let first = state.simulation.clone().unwrap();
    assert_eq!(state.screen, Screen::Simulation);

    state.simulate();
    assert_eq!(state.simulation.as_ref(), Some(&first));
}

#[test]
fn new_prediction_clears_stale_results() {
    let mut state = AppState::demo(Some(3));
    state.predict();
    state.simulate();
    state.reveal_all();
    state.predict();
    assert!(state.simulation.is_none());
    assert!(state.monte_carlo.is_none());
    assert_eq!(state.revealed, 0);
    assert_eq!(state.screen, Screen::Prediction);
}

#[test]
fn invalid_config_from_file_is_ignored_with_warning() {
    let (home, away) = TeamInput::demo_pair();
    let json = serde_json::json!({
        "team1": RawTeamInput::from(&home),
        "team2": RawTeamInput::from(&away),
        "config": {
            "team1": { "style": "tiki-taka", "weaknesses": [] },
            "team2": { "style": "balanced", "weaknesses": ["slow-start"] }
        }
    });
    let input: MatchFile = serde_json::from_value(json).unwrap();
    let state = AppState::new(input, "fixture.json", None);
    assert!(state.session.sim_config().is_none());
    assert!(state.logs.back().unwrap().contains("config ignored"));
}

fn demo_report(simulations: u64) -> monte_carlo::MonteCarloReport {
    let (team1, team2) = TeamInput::demo_pair();
    let request = MonteCarloRequest {
        team1,
        team2,
        simulations,
    };
    monte_carlo::run(&request, 1).unwrap()
}

#[test]
fn monte_carlo_deltas_update_state() {
    let mut state = AppState::demo(None);
    state.predict();
    let generation = state.prediction_generation;
    state.monte_carlo_running = true;
    apply_delta(
        &mut state,
        Delta::MonteCarloFailed {
            generation,
            error: "boom".to_string(),
        },
    );
    assert!(!state.monte_carlo_running);
    assert!(state.logs.back().unwrap().contains("boom"));

    let report = demo_report(2_000);
    state.monte_carlo_running = true;
    apply_delta(
        &mut state,
        Delta::MonteCarloDone {
            generation,
            report: report.clone(),
        },
    );
    assert!(!state.monte_carlo_running);
    assert_eq!(state.monte_carlo, Some(report));
}

#[test]
fn monte_carlo_result_for_replaced_prediction_is_dropped() {
    let mut state = AppState::demo(Some(4));
    state.predict();
    let Some(WorkerCommand::MonteCarlo { generation, .. }) = state.monte_carlo_command(2_000, 9)
    else {
        panic!("expected a Monte Carlo command");
    };
    state.monte_carlo_running = true;

    state.input.team1.stats.goals_scored = Some(0.4f64.into());
    state.predict();
    assert_ne!(state.prediction_generation, generation);

    apply_delta(
        &mut state,
        Delta::MonteCarloDone {
            generation,
            report: demo_report(2_000),
        },
    );
    assert!(state.monte_carlo.is_none());
    assert!(!state.monte_carlo_running);
    assert!(state.logs.back().unwrap().contains("stale"));
}

#[test]
fn monte_carlo_command_needs_a_prediction() {
    let mut state = AppState::demo(None);
    assert!(state.monte_carlo_command(1_000, 1).is_none());
    state.predict();
    match state.monte_carlo_command(1_000, 1) {
        Some(WorkerCommand::MonteCarlo {
            request,
            seed,
            generation,
        }) => {
            assert_eq!(request.simulations, 1_000);
            assert_eq!(seed, 1);
            assert_eq!(generation, state.prediction_generation);
            assert_eq!(request.team1.name, state.prediction().unwrap().team1.name);
        }
        other => panic!("unexpected command {other:?}"),
    }
}

#[test]
fn loaded_prediction_replaces_inputs_and_results() {
    let mut state = AppState::demo(Some(2));
    state.predict();
    state.simulate();
    let before = state.prediction_generation;

    let (mut home, away) = TeamInput::demo_pair();
    home.name = "Porto".to_string();
    home.stats.goals_scored = 0.9;
    let saved = Prediction::build(&home, &away);
    apply_delta(
        &mut state,
        Delta::PredictionLoaded {
            id: 12,
            prediction: saved.clone(),
        },
    );

    assert_eq!(state.prediction(), Some(&saved));
    assert_eq!(state.input.team1, RawTeamInput::from(&home));
    assert_eq!(state.source, "history #12");
    assert!(state.simulation.is_none());
    assert!(state.monte_carlo.is_none());
    assert_eq!(state.screen, Screen::Prediction);
    assert_eq!(state.revealed, 0);
    assert_eq!(state.trace.len(), saved.steps().count());
    assert!(state.prediction_generation > before);
    assert!(state.logs.back().unwrap().contains("#12"));
}

#[test]
fn history_selection_stays_in_range() {
    let mut state = AppState::demo(None);
    assert!(state.selected_history().is_none());
    apply_delta(
        &mut state,
        Delta::HistoryLoaded(vec![saved_row(3), saved_row(2), saved_row(1)]),
    );
    state.select_prev_history();
    assert_eq!(state.selected_history().map(|row| row.id), Some(3));
    for _ in 0..5 {
        state.select_next_history();
    }
    assert_eq!(state.selected_history().map(|row| row.id), Some(1));

    apply_delta(&mut state, Delta::HistoryLoaded(vec![saved_row(9)]));
    assert_eq!(state.selected_history().map(|row| row.id), Some(9));
}

#[test]
fn history_and_log_deltas() {
    let mut state = AppState::demo(None);
    apply_delta(&mut state, Delta::HistoryLoaded(vec![saved_row(2), saved_row(1)]));
    assert_eq!(state.history.len(), 2);
    assert_eq!(state.history[0].id, 2);

    apply_delta(&mut state, Delta::Saved { id: 5 });
    assert!(state.logs.back().unwrap().contains("#5"));

    apply_delta(
        &mut state,
        Delta::Exported {
            path: "out.xlsx".to_string(),
            rows: 18,
        },
    );
    assert!(state.logs.back().unwrap().contains("out.xlsx"));

    apply_delta(&mut state, Delta::Log("[INFO] hello".to_string()));
    assert_eq!(state.logs.back().map(String::as_str), Some("[INFO] hello"));
}

#[test]
fn log_buffer_is_bounded() {
    let mut state = AppState::demo(None);
    for idx in 0..250 {
        state.push_log(format!("line {idx}"));
    }
    assert_eq!(state.logs.len(), 200);
    assert_eq!(state.logs.front().map(String::as_str), Some("line 50"));
}

#[test]
fn screen_changes_reset_scroll_and_speed_halves_interval() {
    let mut state = AppState::demo(None);
    state.scroll_down();
    state.scroll_down();
    state.set_screen(Screen::Prediction);
    assert_eq!(state.scroll, 2);
    state.set_screen(Screen::History);
    assert_eq!(state.scroll, 0);
    state.scroll_up();
    assert_eq!(state.scroll, 0);

    let base = Duration::from_millis(400);
    assert_eq!(state.reveal_interval(base), base);
    state.toggle_speed();
    assert_eq!(state.reveal_interval(base), Duration::from_millis(200));
}
