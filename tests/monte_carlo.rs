use goal2goal::btts::correlation_rho;
use goal2goal::error::EstimateError;
use goal2goal::lambda::lambda_only;
use goal2goal::monte_carlo::{self, MAX_SIMULATIONS, MonteCarloRequest, VolatilityLevel};
use goal2goal::stats::TeamInput;

fn demo_request(simulations: u64) -> MonteCarloRequest {
    let (team1, team2) = TeamInput::demo_pair();
    MonteCarloRequest {
        team1,
        team2,
        simulations,
    }
}

#[test]
fn same_seed_gives_identical_reports() {
    let request = demo_request(25_000);
    let first = monte_carlo::run(&request, 1234).unwrap();
    let second = monte_carlo::run(&request, 1234).unwrap();
    assert_eq!(first, second);
    assert_eq!(first.simulations, 25_000);
}

#[test]
fn partial_last_chunk_still_counts_every_trial() {
    let report = monte_carlo::run(&demo_request(12_345), 5).unwrap();
    assert_eq!(report.simulations, 12_345);
    let covered: f64 = report
        .total_goals_distribution
        .iter()
        .map(|bucket| bucket.probability)
        .sum();
    assert!((covered - 100.0).abs() < 1e-9);
}

#[test]
fn outcome_shares_are_complementary() {
    let report = monte_carlo::run(&demo_request(50_000), 77).unwrap();
    let results = report.results;
    assert!((results.team1_win + results.draw + results.team2_win - 100.0).abs() < 1e-9);
    let ou = report.over_under;
    assert!((ou.over_2_5 + ou.under_2_5 - 100.0).abs() < 1e-9);
    assert!(results.team1_win > results.team2_win);
}

#[test]
fn simulated_btts_tracks_the_analytic_figure() {
    let report = monte_carlo::run(&demo_request(50_000), 2024).unwrap();
    assert!((report.reference_btts - 79.81).abs() < 0.01);
    // The shared shock also lifts each side's scoring chance, so the sampled rate sits a little above.
    let gap = report.btts.probability - report.reference_btts;
    assert!((-1.0..4.0).contains(&gap), "gap {gap}");

    let ci = report.btts.confidence_interval;
    assert!(ci.lower < report.btts.probability && report.btts.probability < ci.upper);
    assert!(ci.upper - ci.lower < 2.0);
}

#[test]
fn scorelines_and_distribution_are_ordered() {
    let report = monte_carlo::run(&demo_request(30_000), 8).unwrap();
    assert_eq!(report.top_scorelines.len(), 5);
    assert!(
        report
            .top_scorelines
            .windows(2)
            .all(|w| w[0].probability >= w[1].probability)
    );
    assert!(report.top_scorelines.iter().all(|s| s.score.contains('-')));
    assert!(
        report
            .total_goals_distribution
            .windows(2)
            .all(|w| w[0].goals < w[1].goals)
    );
}

#[test]
fn goal_averages_follow_lambdas() {
    let report = monte_carlo::run(&demo_request(50_000), 99).unwrap();
    let goals = report.goals;
    assert!(goals.team1_avg > goals.team2_avg);
    assert!((goals.team1_avg + goals.team2_avg - goals.total_avg).abs() < 1e-9);
    assert!(goals.team1_std > 0.0 && goals.team2_std > 0.0);

    let volatility = &report.volatility;
    let level = VolatilityLevel::from_coefficient(volatility.coefficient);
    assert_eq!(volatility.label, level.label());
    assert!((volatility.coefficient * goals.total_avg - volatility.value).abs() < 1e-9);
}

#[test]
fn simulation_count_outside_bounds_is_rejected() {
    let err = monte_carlo::run(&demo_request(0), 1).unwrap_err();
    assert!(matches!(err, EstimateError::SimulationCount(0)));

    let err = monte_carlo::run(&demo_request(MAX_SIMULATIONS + 1), 1).unwrap_err();
    assert!(matches!(err, EstimateError::SimulationCount(n) if n == MAX_SIMULATIONS + 1));
}

#[test]
fn high_scoring_inputs_keep_goal_averages_on_lambda() {
    let mut request = demo_request(20_000);
    request.team1.stats.goals_scored = 1_500.0;
    let expected = lambda_only(&request.team1.stats, &request.team2.stats)
        + correlation_rho(&request.team1.stats, &request.team2.stats);
    assert!(expected > 1_000.0);

    let report = monte_carlo::run(&request, 17).unwrap();
    let avg = report.goals.team1_avg;
    assert!((avg - expected).abs() < expected * 0.01, "avg {avg} expected {expected}");
    assert!(report.goals.team1_std > 30.0);
    assert!(report.results.team1_win > 99.0);
}

#[test]
fn neighbouring_seeds_give_different_reports() {
    let request = demo_request(30_000);
    for seed in [0u64, 6, 1_000] {
        let a = monte_carlo::run(&request, seed).unwrap();
        let b = monte_carlo::run(&request, seed ^ 1).unwrap();
        assert_ne!(a.top_scorelines, b.top_scorelines, "seed {seed}");
    }
}

#[test]
fn report_serializes_with_nested_sections() {
    let report = monte_carlo::run(&demo_request(10_000), 3).unwrap();
    let json = serde_json::to_value(&report).unwrap();
    assert!(json.get("btts").is_some());
    assert!(json.get("volatility").is_some());
    assert_eq!(json["top_scorelines"].as_array().map(Vec::len), Some(5));
    assert!(json["btts"]["confidence_interval"]["lower"].is_number());
}
