use serde::{Deserialize, Serialize};

use crate::stats::{StatField, StatSet};

pub const LAMBDA_FLOOR: f64 = 0.1;

/// Adjustment factors in application order. Goals scored is the base, not a factor.
const LAMBDA_FACTORS: [(StatField, f64); 8] = [
    (StatField::GoalsConceded, -0.6),
    (StatField::Possession, 0.3),
    (StatField::ShotsOnTarget, 0.5),
    (StatField::PassingAccuracy, 0.4),
    (StatField::Fouls, -0.2),
    (StatField::Corners, 0.2),
    (StatField::YellowCards, -0.15),
    (StatField::RedCards, -0.4),
];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LambdaStep {
    /// `None` marks the base row.
    pub stat: Option<String>,
    pub raw_value: f64,
    /// Opponent value the raw value was compared against, when relevant.
    pub compared_to: Option<f64>,
    pub factor: Option<f64>,
    pub adjustment: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LambdaEstimate {
    pub team_name: String,
    pub lambda: f64,
    pub breakdown: Vec<LambdaStep>,
}

pub fn estimate_lambda(team_name: &str, team: &StatSet, opponent: &StatSet) -> LambdaEstimate {
    let base = team.goals_scored;
    let mut lambda = base;
    let mut breakdown = Vec::with_capacity(LAMBDA_FACTORS.len() + 1);
    breakdown.push(LambdaStep {
        stat: None,
        raw_value: base,
        compared_to: None,
        factor: None,
        adjustment: base,
    });

    for (field, factor) in LAMBDA_FACTORS {
        let (adjustment, compared_to) = adjustment_for(field, factor, team, opponent);
        lambda += adjustment;
        breakdown.push(LambdaStep {
            stat: Some(field.key().to_string()),
            raw_value: team.get(field),
            compared_to,
            factor: Some(factor),
            adjustment,
        });
    }

    let lambda = lambda.max(LAMBDA_FLOOR);
    tracing::debug!(team = team_name, lambda, "lambda estimated");
    LambdaEstimate {
        team_name: team_name.to_string(),
        lambda,
        breakdown,
    }
}

/// The rate alone, for hot loops that do not need the breakdown.
pub fn lambda_only(team: &StatSet, opponent: &StatSet) -> f64 {
    let mut lambda = team.goals_scored;
    for (field, factor) in LAMBDA_FACTORS {
        lambda += adjustment_for(field, factor, team, opponent).0;
    }
    lambda.max(LAMBDA_FLOOR)
}

fn adjustment_for(
    field: StatField,
    factor: f64,
    team: &StatSet,
    opponent: &StatSet,
) -> (f64, Option<f64>) {
    match field {
        StatField::Possession | StatField::PassingAccuracy => {
            let diff = (team.get(field) - opponent.get(field)) / 100.0;
            (diff * factor, Some(opponent.get(field)))
        }
        StatField::GoalsConceded => {
            let diff = (opponent.goals_scored - team.goals_conceded) / 2.0;
            (diff * factor, Some(opponent.goals_scored))
        }
        _ => ((team.get(field) / 10.0) * factor, None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stats::TeamInput;

    #[test]
    fn breakdown_starts_with_base_and_follows_factor_order() {
        let (home, away) = TeamInput::demo_pair();
        let est = estimate_lambda(&home.name, &home.stats, &away.stats);
        assert_eq!(est.breakdown.len(), 9);
        assert!(est.breakdown[0].stat.is_none());
        assert_eq!(est.breakdown[0].adjustment, 2.6);
        let keys: Vec<_> = est.breakdown[1..]
            .iter()
            .map(|s| s.stat.clone().unwrap())
            .collect();
        assert_eq!(
            keys,
            [
                "goalsConceded",
                "possession",
                "shotsOnTarget",
                "passingAccuracy",
                "fouls",
                "corners",
                "yellowCards",
                "redCards"
            ]
        );
    }

    #[test]
    fn demo_lambdas_match_hand_computation() {
        let (home, away) = TeamInput::demo_pair();
        let l1 = estimate_lambda(&home.name, &home.stats, &away.stats).lambda;
        let l2 = estimate_lambda(&away.name, &away.stats, &home.stats).lambda;
        assert!((l1 - 2.4243).abs() < 1e-9, "l1={l1}");
        assert!((l2 - 2.0912).abs() < 1e-9, "l2={l2}");
        assert_eq!(l1, lambda_only(&home.stats, &away.stats));
    }

    #[test]
    fn goals_conceded_adjustment_uses_opponent_attack() {
        let (home, away) = TeamInput::demo_pair();
        let est = estimate_lambda(&home.name, &home.stats, &away.stats);
        let step = &est.breakdown[1];
        assert_eq!(step.compared_to, Some(2.4));
        assert!((step.adjustment - (-0.45)).abs() < 1e-12);
    }

    #[test]
    fn floors_at_minimum_rate() {
        let (mut home, away) = TeamInput::demo_pair();
        home.stats.goals_scored = 0.0;
        home.stats.goals_conceded = 0.0;
        home.stats.fouls = 40.0;
        home.stats.red_cards = 5.0;
        let est = estimate_lambda(&home.name, &home.stats, &away.stats);
        assert_eq!(est.lambda, LAMBDA_FLOOR);
    }
}
