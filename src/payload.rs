use serde::{Deserialize, Serialize};

use crate::btts::{Prediction, TeamPrediction};
use crate::sim_config::SimulationConfig;
use crate::stats::{RawTeamInput, StatSet};

pub const PREDICTION_TYPE: &str = "BTTS";

/// Rounds to two decimals, the precision the explanation service receives.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExplanationTeam {
    pub name: String,
    pub stats: StatSet,
    pub lambda: f64,
    pub prob_scores: f64,
}

impl From<&TeamPrediction> for ExplanationTeam {
    fn from(team: &TeamPrediction) -> Self {
        Self {
            name: team.name.clone(),
            stats: team.stats,
            lambda: round2(team.lambda.lambda),
            prob_scores: round2(team.prob_scores),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExplanationBtts {
    pub poisson: f64,
    pub logistic: f64,
    #[serde(rename = "final")]
    pub final_probability: f64,
    pub recommended_model: String,
    pub confidence: String,
    pub diff_models: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExplanationRequest {
    pub team1: ExplanationTeam,
    pub team2: ExplanationTeam,
    pub btts: ExplanationBtts,
    pub prediction_type: String,
}

impl ExplanationRequest {
    pub fn from_prediction(prediction: &Prediction) -> Self {
        let btts = &prediction.btts;
        Self {
            team1: ExplanationTeam::from(&prediction.team1),
            team2: ExplanationTeam::from(&prediction.team2),
            btts: ExplanationBtts {
                poisson: round2(btts.poisson_probability),
                logistic: round2(btts.logistic_probability),
                final_probability: round2(btts.final_probability),
                recommended_model: btts.recommended_model.label().to_string(),
                confidence: btts.confidence.label().to_string(),
                diff_models: round2(btts.model_difference),
            },
            prediction_type: PREDICTION_TYPE.to_string(),
        }
    }

    /// Analyst brief sent to the explanation service.
    pub fn prompt(&self) -> String {
        let team_block = |label: &str, team: &ExplanationTeam| {
            format!(
                "{label} - {name}:\n\
                 - Goals scored per match: {gs}\n\
                 - Goals conceded per match: {gc}\n\
                 - Possession: {poss}%\n\
                 - Shots on target per match: {sot}\n\
                 - Passing accuracy: {pa}%\n\
                 - Lambda (expected goal rate): {lambda}\n\
                 - Probability of scoring at least once: {scores}%\n",
                name = team.name,
                gs = team.stats.goals_scored,
                gc = team.stats.goals_conceded,
                poss = team.stats.possession,
                sot = team.stats.shots_on_target,
                pa = team.stats.passing_accuracy,
                lambda = team.lambda,
                scores = team.prob_scores,
            )
        };
        format!(
            "MATCH: {} vs {}\n\n{}\n{}\n\
             MODEL RESULTS:\n\
             - Bivariate Poisson: {}% BTTS\n\
             - Logistic regression: {}% BTTS\n\
             - Difference between models: {}%\n\n\
             FINAL PREDICTION:\n\
             - Both teams to score: {}%\n\
             - Recommended model: {}\n\
             - Confidence: {}\n\n\
             Explain the attacking and defensive outlook of both sides and why the models \
             reach these numbers.\n",
            self.team1.name,
            self.team2.name,
            team_block("Home", &self.team1),
            team_block("Away", &self.team2),
            self.btts.poisson,
            self.btts.logistic,
            self.btts.diff_models,
            self.btts.final_probability,
            self.btts.recommended_model,
            self.btts.confidence,
        )
    }
}

/// Match file accepted by the command-line tools and the terminal UI.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchFile {
    pub team1: RawTeamInput,
    pub team2: RawTeamInput,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub config: Option<SimulationConfig>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stats::TeamInput;

    #[test]
    fn explanation_uses_camel_case_and_two_decimals() {
        let (home, away) = TeamInput::demo_pair();
        let prediction = Prediction::build(&home, &away);
        let request = ExplanationRequest::from_prediction(&prediction);
        assert_eq!(request.team1.lambda, 2.42);

        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["predictionType"], "BTTS");
        assert!(json["btts"]["final"].is_number());
        assert!(json["btts"]["recommendedModel"].is_string());
        assert!(json["team1"]["probScores"].is_number());
        assert!(json["team2"]["stats"]["goalsScored"].is_number());
        assert!(request.prompt().contains("FC Barcelona vs Real Madrid"));
    }

    #[test]
    fn match_file_accepts_string_numbers_and_no_config() {
        let text = r#"{
            "team1": {"name": "A", "stats": {"goalsScored": "1.5", "goalsConceded": 1.2,
                "possession": 50, "shotsOnTarget": 4, "passingAccuracy": 80, "fouls": 12,
                "corners": 5, "yellowCards": 2, "redCards": 0}},
            "team2": {"name": "B", "stats": {}}
        }"#;
        let file: MatchFile = serde_json::from_str(text).unwrap();
        assert!(file.config.is_none());
        assert!(file.team1.validate(crate::stats::TeamSlot::Team1).is_ok());
        assert!(file.team2.validate(crate::stats::TeamSlot::Team2).is_err());
    }
}
