use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use crate::btts::{Prediction, predict};
use crate::error::{EstimateError, EstimateResult};
use crate::monte_carlo::{self, MonteCarloReport, MonteCarloRequest};
use crate::sim_config::SimulationConfig;
use crate::simulator::{MatchResult, MatchSimulator};
use crate::stats::RawTeamInput;

/// Per-user context: the last prediction and the optional simulation setup.
#[derive(Debug, Clone, Default)]
pub struct Session {
    prediction: Option<Prediction>,
    sim_config: Option<SimulationConfig>,
    seed: Option<u64>,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_seed(seed: Option<u64>) -> Self {
        Self {
            seed,
            ..Self::default()
        }
    }

    pub fn prediction(&self) -> Option<&Prediction> {
        self.prediction.as_ref()
    }

    pub fn sim_config(&self) -> Option<&SimulationConfig> {
        self.sim_config.as_ref()
    }

    /// Replaces the stored prediction only when both inputs validate.
    pub fn predict(
        &mut self,
        team1: &RawTeamInput,
        team2: &RawTeamInput,
    ) -> EstimateResult<&Prediction> {
        let prediction = predict(team1, team2)?;
        Ok(self.prediction.insert(prediction))
    }

    /// Swaps in a prediction restored from history.
    pub fn set_prediction(&mut self, prediction: Prediction) {
        self.prediction = Some(prediction);
    }

    pub fn set_config(&mut self, config: SimulationConfig) -> EstimateResult<()> {
        config.validate()?;
        self.sim_config = Some(config);
        Ok(())
    }

    pub fn simulate(&self) -> EstimateResult<MatchResult> {
        let prediction = self.prediction.as_ref().ok_or(EstimateError::NoPrediction)?;
        let simulator =
            MatchSimulator::from_prediction(prediction).with_config(self.sim_config.clone());
        let result = match self.seed {
            Some(seed) => simulator.run_seeded(seed),
            None => simulator.run(&mut ChaCha8Rng::from_entropy()),
        };
        Ok(result)
    }

    pub fn monte_carlo(&self, simulations: u64) -> EstimateResult<MonteCarloReport> {
        let prediction = self.prediction.as_ref().ok_or(EstimateError::NoPrediction)?;
        let (team1, team2) = prediction.team_inputs();
        let request = MonteCarloRequest {
            team1,
            team2,
            simulations,
        };
        let seed = self.seed.unwrap_or_else(rand::random);
        monte_carlo::run(&request, seed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stats::TeamInput;

    #[test]
    fn simulate_requires_prediction() {
        let session = Session::new();
        assert!(matches!(session.simulate(), Err(EstimateError::NoPrediction)));
        assert!(matches!(
            session.monte_carlo(1_000),
            Err(EstimateError::NoPrediction)
        ));
    }

    #[test]
    fn failed_predict_keeps_previous_prediction() {
        let (home, away) = TeamInput::demo_pair();
        let mut session = Session::with_seed(Some(5));
        session
            .predict(&RawTeamInput::from(&home), &RawTeamInput::from(&away))
            .unwrap();

        let mut broken = RawTeamInput::from(&away);
        broken.stats.possession = Some("abc".into());
        assert!(session.predict(&RawTeamInput::from(&home), &broken).is_err());
        assert_eq!(session.prediction().unwrap().team2.name, "Real Madrid");
    }
}
