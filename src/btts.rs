use serde::{Deserialize, Serialize};

use crate::error::EstimateResult;
use crate::lambda::{LambdaEstimate, estimate_lambda, lambda_only};
use crate::stats::{RawTeamInput, StatSet, TeamInput, TeamSlot};

const CONSENSUS_THRESHOLD: f64 = 10.0;
const NOTE_AGREEMENT: f64 = 5.0;
const NOTE_MODERATE: f64 = 15.0;

const RHO_BASE: f64 = 0.05;
const RHO_CAP: f64 = 0.20;

// Logistic weights.
const W_INTERCEPT: f64 = -0.8;
const W_GOALS_SCORED: f64 = 0.45;
const W_GOALS_CONCEDED: f64 = 0.35;
const W_SHOTS_ON_TARGET: f64 = 0.08;
const W_AVG_GOALS: f64 = 0.25;
const W_OFFENSIVE_STRENGTH: f64 = 0.15;
const FEATURE_CAP: f64 = 1.5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RecommendedModel {
    Consensus,
    Poisson,
    Logistic,
}

impl RecommendedModel {
    pub fn label(self) -> &'static str {
        match self {
            RecommendedModel::Consensus => "Consensus",
            RecommendedModel::Poisson => "Bivariate Poisson",
            RecommendedModel::Logistic => "Logistic Regression",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Confidence {
    High,
    Medium,
}

impl Confidence {
    pub fn label(self) -> &'static str {
        match self {
            Confidence::High => "High",
            Confidence::Medium => "Medium",
        }
    }
}

/// Display band for the model comparison note. Independent of the consensus rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NoteBand {
    Agreement,
    Moderate,
    Divergent,
}

impl NoteBand {
    pub fn from_difference(diff: f64) -> Self {
        if diff < NOTE_AGREEMENT {
            NoteBand::Agreement
        } else if diff < NOTE_MODERATE {
            NoteBand::Moderate
        } else {
            NoteBand::Divergent
        }
    }

    pub fn message(self) -> &'static str {
        match self {
            NoteBand::Agreement => "Both models agree closely; the prediction is highly reliable.",
            NoteBand::Moderate => {
                "The models differ moderately; treat the prediction with some caution."
            }
            NoteBand::Divergent => {
                "The models diverge significantly; weigh additional factors before deciding."
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BttsEstimate {
    pub poisson_probability: f64,
    pub logistic_probability: f64,
    pub final_probability: f64,
    pub recommended_model: RecommendedModel,
    pub confidence: Confidence,
    pub model_difference: f64,
}

impl BttsEstimate {
    pub fn note_band(&self) -> NoteBand {
        NoteBand::from_difference(self.model_difference)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PoissonBreakdown {
    pub rho: f64,
    pub team1_zero: f64,
    pub team2_zero: f64,
    pub both_zero: f64,
    pub probability: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogisticBreakdown {
    pub goals_scored1: f64,
    pub goals_scored2: f64,
    pub goals_conceded1: f64,
    pub goals_conceded2: f64,
    pub shots_on_target1: f64,
    pub shots_on_target2: f64,
    /// Raw mean goals before normalisation.
    pub avg_goals: f64,
    pub avg_goals_norm: f64,
    /// Raw combined offence ratio before normalisation.
    pub offensive_strength: f64,
    pub offensive_strength_norm: f64,
    pub z: f64,
    pub probability: f64,
}

/// `P(X = k)` for a Poisson variable with rate `lambda`.
pub fn poisson_probability(lambda: f64, k: u32) -> f64 {
    let factorial: f64 = (1..=k).map(f64::from).product();
    (-lambda).exp() * lambda.powi(k as i32) / factorial
}

pub fn correlation_rho(team1: &StatSet, team2: &StatSet) -> f64 {
    let avg_conceded = (team1.goals_conceded + team2.goals_conceded) / 2.0;
    (RHO_BASE + avg_conceded / 50.0).min(RHO_CAP)
}

pub fn bivariate_poisson(
    lambda1: f64,
    lambda2: f64,
    team1: &StatSet,
    team2: &StatSet,
) -> PoissonBreakdown {
    let rho = correlation_rho(team1, team2);
    let both_zero = (-lambda1 - lambda2 - rho).exp();
    let team1_zero = poisson_probability(lambda1, 0);
    let team2_zero = poisson_probability(lambda2, 0);
    // Near the lambda floor the correlation term can push this slightly below zero.
    let probability = ((1.0 - team1_zero - team2_zero + both_zero) * 100.0).clamp(0.0, 100.0);
    PoissonBreakdown {
        rho,
        team1_zero,
        team2_zero,
        both_zero,
        probability,
    }
}

fn sigmoid(z: f64) -> f64 {
    1.0 / (1.0 + (-z).exp())
}

fn capped(value: f64, scale: f64) -> f64 {
    (value / scale).min(FEATURE_CAP)
}

pub fn logistic_btts(team1: &StatSet, team2: &StatSet) -> LogisticBreakdown {
    let goals_scored1 = capped(team1.goals_scored, 3.0);
    let goals_scored2 = capped(team2.goals_scored, 3.0);
    // Each side's chance grows with how much the other side concedes.
    let goals_conceded1 = capped(team2.goals_conceded, 2.5);
    let goals_conceded2 = capped(team1.goals_conceded, 2.5);
    let shots_on_target1 = capped(team1.shots_on_target, 8.0);
    let shots_on_target2 = capped(team2.shots_on_target, 8.0);

    let avg_goals = (team1.goals_scored + team2.goals_scored) / 2.0;
    let avg_goals_norm = capped(avg_goals, 2.5);
    let offensive_strength = (team1.goals_scored + team2.goals_scored)
        / (team1.goals_conceded + team2.goals_conceded + 0.5);
    let offensive_strength_norm = capped(offensive_strength, 2.0);

    let mut z = W_INTERCEPT;
    z += W_GOALS_SCORED * goals_scored1;
    z += W_GOALS_SCORED * goals_scored2;
    z += W_GOALS_CONCEDED * goals_conceded1;
    z += W_GOALS_CONCEDED * goals_conceded2;
    z += W_SHOTS_ON_TARGET * shots_on_target1;
    z += W_SHOTS_ON_TARGET * shots_on_target2;
    z += W_AVG_GOALS * avg_goals_norm;
    z += W_OFFENSIVE_STRENGTH * offensive_strength_norm;

    LogisticBreakdown {
        goals_scored1,
        goals_scored2,
        goals_conceded1,
        goals_conceded2,
        shots_on_target1,
        shots_on_target2,
        avg_goals,
        avg_goals_norm,
        offensive_strength,
        offensive_strength_norm,
        z,
        probability: sigmoid(z) * 100.0,
    }
}

pub fn reconcile(poisson: f64, logistic: f64) -> BttsEstimate {
    let model_difference = (poisson - logistic).abs();
    let (final_probability, recommended_model, confidence) =
        if model_difference < CONSENSUS_THRESHOLD {
            (
                (poisson + logistic) / 2.0,
                RecommendedModel::Consensus,
                Confidence::High,
            )
        } else if poisson > logistic {
            (poisson, RecommendedModel::Poisson, Confidence::Medium)
        } else {
            (logistic, RecommendedModel::Logistic, Confidence::Medium)
        };
    BttsEstimate {
        poisson_probability: poisson,
        logistic_probability: logistic,
        final_probability,
        recommended_model,
        confidence,
        model_difference,
    }
}

/// Pure estimate for already-validated stats. Cheap enough for tight loops.
pub fn estimate(team1: &StatSet, team2: &StatSet) -> BttsEstimate {
    let lambda1 = lambda_only(team1, team2);
    let lambda2 = lambda_only(team2, team1);
    let poisson = bivariate_poisson(lambda1, lambda2, team1, team2);
    let logistic = logistic_btts(team1, team2);
    reconcile(poisson.probability, logistic.probability)
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TeamPrediction {
    pub name: String,
    pub stats: StatSet,
    pub lambda: LambdaEstimate,
    /// Chance of scoring at least once, in percent.
    pub prob_scores: f64,
}

/// Everything a single prediction produced, kept for display, saving and simulation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Prediction {
    pub team1: TeamPrediction,
    pub team2: TeamPrediction,
    pub poisson: PoissonBreakdown,
    pub logistic: LogisticBreakdown,
    pub btts: BttsEstimate,
}

impl Prediction {
    pub fn build(team1: &TeamInput, team2: &TeamInput) -> Prediction {
        let lambda1 = estimate_lambda(&team1.name, &team1.stats, &team2.stats);
        let lambda2 = estimate_lambda(&team2.name, &team2.stats, &team1.stats);
        let poisson = bivariate_poisson(lambda1.lambda, lambda2.lambda, &team1.stats, &team2.stats);
        let logistic = logistic_btts(&team1.stats, &team2.stats);
        let btts = reconcile(poisson.probability, logistic.probability);

        tracing::debug!(
            team1 = %team1.name,
            team2 = %team2.name,
            poisson = btts.poisson_probability,
            logistic = btts.logistic_probability,
            model = btts.recommended_model.label(),
            "btts prediction"
        );

        Prediction {
            team1: TeamPrediction {
                name: team1.name.clone(),
                stats: team1.stats,
                prob_scores: (1.0 - poisson.team1_zero) * 100.0,
                lambda: lambda1,
            },
            team2: TeamPrediction {
                name: team2.name.clone(),
                stats: team2.stats,
                prob_scores: (1.0 - poisson.team2_zero) * 100.0,
                lambda: lambda2,
            },
            poisson,
            logistic,
            btts,
        }
    }

    pub fn team_inputs(&self) -> (TeamInput, TeamInput) {
        (
            TeamInput {
                name: self.team1.name.clone(),
                stats: self.team1.stats,
            },
            TeamInput {
                name: self.team2.name.clone(),
                stats: self.team2.stats,
            },
        )
    }
}

/// Validates both sides before any model runs, then predicts.
pub fn predict(team1: &RawTeamInput, team2: &RawTeamInput) -> EstimateResult<Prediction> {
    let team1 = team1.validate(TeamSlot::Team1).inspect_err(|err| {
        tracing::warn!(%err, "rejected prediction input");
    })?;
    let team2 = team2.validate(TeamSlot::Team2).inspect_err(|err| {
        tracing::warn!(%err, "rejected prediction input");
    })?;
    Ok(Prediction::build(&team1, &team2))
}
