use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use goal2goal::btts::Prediction;
use goal2goal::sim_config::{
    Mentality, SimulationConfig, Strength, Style, TeamSetup, Weakness,
};
use goal2goal::simulator::{EventKind, MatchResult, MatchSimulator};
use goal2goal::stats::{StatSet, TeamInput, TeamSlot};

fn demo_simulator() -> MatchSimulator {
    let (home, away) = TeamInput::demo_pair();
    MatchSimulator::from_prediction(&Prediction::build(&home, &away))
}

fn mirror_simulator() -> MatchSimulator {
    let stats = StatSet {
        goals_scored: 1.5,
        goals_conceded: 1.2,
        possession: 50.0,
        shots_on_target: 4.5,
        passing_accuracy: 80.0,
        fouls: 12.0,
        corners: 5.0,
        yellow_cards: 2.0,
        red_cards: 0.1,
    };
    let home = TeamInput {
        name: "North".to_string(),
        stats,
    };
    let away = TeamInput {
        name: "South".to_string(),
        stats,
    };
    MatchSimulator::from_prediction(&Prediction::build(&home, &away))
}

fn setup(style: Style, weaknesses: Vec<Weakness>) -> TeamSetup {
    TeamSetup {
        style,
        strengths: Vec::new(),
        weaknesses,
        mentality: Mentality::SeekVictory,
    }
}

fn assert_box_score_bounds(result: &MatchResult) {
    let bs = &result.box_score;
    assert_eq!(bs.possession.home + bs.possession.away, 100);
    for side in [TeamSlot::Team1, TeamSlot::Team2] {
        assert!((30..=70).contains(&bs.possession.get(side)));
        assert!((60..=95).contains(&bs.passing_accuracy.get(side)));
        assert!((5..=20).contains(&bs.fouls.get(side)));
        assert!(bs.corners.get(side) <= 12);
        assert!(bs.shots_on_target.get(side) <= bs.shots.get(side));
        assert!(bs.shots.get(side) >= bs.possession.get(side) / 10);
        assert!(bs.xg.get(side) >= 0.0);
    }
}

#[test]
fn same_seed_replays_the_same_match() {
    let sim = demo_simulator();
    let first = sim.run_seeded(42);
    let second = sim.run_seeded(42);
    assert_eq!(first, second);
}

#[test]
fn duration_includes_at_most_five_minutes_of_stoppage() {
    let sim = demo_simulator();
    for seed in 0..50 {
        let result = sim.run_seeded(seed);
        assert!((90..=95).contains(&result.duration), "{}", result.duration);
        assert!(
            result
                .timeline
                .iter()
                .all(|event| event.minute <= result.duration)
        );
    }
}

#[test]
fn timeline_is_ordered_and_every_goal_is_logged() {
    let sim = demo_simulator();
    for seed in 0..50 {
        let result = sim.run_seeded(seed);
        assert_eq!(result.timeline.first().map(|e| e.kind), Some(EventKind::Info));
        assert!(result.timeline.windows(2).all(|w| w[0].minute <= w[1].minute));

        for side in [TeamSlot::Team1, TeamSlot::Team2] {
            let logged = result
                .timeline
                .iter()
                .filter(|e| e.kind == EventKind::Goal && e.side == Some(side))
                .count() as u32;
            assert_eq!(logged, result.final_score.get(side));
        }
        assert_eq!(
            result.both_scored(),
            result.final_score.home > 0 && result.final_score.away > 0
        );
    }
}

#[test]
fn chance_xg_stays_inside_bounds_without_config() {
    let sim = demo_simulator();
    for seed in 0..100 {
        let result = sim.run_seeded(seed);
        for event in &result.timeline {
            match event.kind {
                EventKind::Goal | EventKind::ChanceMissed => {
                    let xg = event.xg.unwrap();
                    assert!((0.01..=0.95).contains(&xg), "xg {xg}");
                    assert!(event.occasion.is_some());
                }
                _ => assert!(event.xg.is_none()),
            }
        }
    }
}

#[test]
fn box_score_respects_display_clamps() {
    let sim = demo_simulator();
    for seed in 0..100 {
        assert_box_score_bounds(&sim.run_seeded(seed));
    }
}

#[test]
fn stepping_reports_new_events_only() {
    let sim = demo_simulator();
    let mut run = sim.kick_off(ChaCha8Rng::seed_from_u64(9));
    let mut collected = run.timeline().to_vec();
    let mut minutes = 0;
    while let Some(events) = run.step() {
        minutes += 1;
        collected.extend_from_slice(events);
    }
    assert!(run.is_finished());
    assert_eq!(minutes, run.duration());
    assert_eq!(run.state().minute, run.duration());

    let result = run.finish();
    assert_eq!(collected, result.timeline);
    assert_eq!(result, sim.run_seeded(9));
}

#[test]
fn mirrored_sides_generate_similar_xg() {
    let sim = mirror_simulator();
    let runs = 2_000;
    let (mut home, mut away) = (0.0, 0.0);
    for seed in 0..runs {
        let result = sim.run_seeded(seed);
        home += result.box_score.xg.home;
        away += result.box_score.xg.away;
    }
    let home = home / runs as f64;
    let away = away / runs as f64;
    assert!(home > 0.0 && away > 0.0);
    let gap = (home - away).abs() / home.max(away);
    assert!(gap < 0.15, "home {home:.3} away {away:.3}");
}

#[test]
fn configured_tactics_shift_the_kick_off_profile() {
    let config = SimulationConfig {
        team1: TeamSetup {
            strengths: vec![Strength::PaceUpFront],
            ..setup(Style::CounterAttack, vec![Weakness::SlowStart])
        },
        team2: TeamSetup {
            mentality: Mentality::WinAtAllCosts,
            ..setup(Style::Gegenpressing, vec![Weakness::ShakyKeeper])
        },
    };
    config.validate().unwrap();

    let plain = demo_simulator();
    let tuned = demo_simulator().with_config(Some(config));

    let before = plain.tactic(TeamSlot::Team1);
    let after = tuned.tactic(TeamSlot::Team1);
    assert!(after.counter_attack > before.counter_attack);
    assert!(after.defensive > before.defensive);
    assert_eq!(after.tactic, before.tactic);

    let before = plain.tactic(TeamSlot::Team2);
    let after = tuned.tactic(TeamSlot::Team2);
    assert!(after.offensive > before.offensive);
    assert!(after.defensive < before.defensive);
}

#[test]
fn configured_match_is_still_deterministic_and_bounded() {
    let config = SimulationConfig {
        team1: setup(Style::TikiTaka, vec![Weakness::Indiscipline]),
        team2: setup(Style::Catenaccio, vec![Weakness::LowStamina]),
    };
    let sim = demo_simulator().with_config(Some(config));
    for seed in 0..30 {
        let result = sim.run_seeded(seed);
        assert_eq!(result, sim.run_seeded(seed));
        assert_box_score_bounds(&result);
    }
}

#[test]
fn config_needs_at_least_one_weakness() {
    let config = SimulationConfig {
        team1: setup(Style::Balanced, Vec::new()),
        team2: setup(Style::Balanced, vec![Weakness::PoorFinishing]),
    };
    assert!(config.validate().is_err());

    let too_many = SimulationConfig {
        team1: setup(
            Style::Balanced,
            vec![
                Weakness::PoorFinishing,
                Weakness::ShakyKeeper,
                Weakness::SlowStart,
            ],
        ),
        team2: setup(Style::Balanced, vec![Weakness::PoorFinishing]),
    };
    assert!(too_many.validate().is_err());
}
