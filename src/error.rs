use thiserror::Error;

use crate::monte_carlo::MAX_SIMULATIONS;
use crate::stats::TeamSlot;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum InputProblem {
    #[error("value is missing")]
    Missing,
    #[error("'{0}' is not a number")]
    NotNumeric(String),
    #[error("{0} is negative")]
    Negative(f64),
    #[error("{0} is outside 0-100")]
    OutOfRange(f64),
}

#[derive(Error, Debug)]
pub enum EstimateError {
    #[error("invalid input for {team} {field}: {problem}")]
    InvalidInput {
        team: TeamSlot,
        field: &'static str,
        problem: InputProblem,
    },

    #[error("invalid simulation config for {team}: {reason}")]
    InvalidConfig { team: TeamSlot, reason: String },

    #[error("simulation count {0} must be between 1 and {max}", max = MAX_SIMULATIONS)]
    SimulationCount(u64),

    #[error("goal rate {0} cannot be sampled")]
    UnsampleableRate(f64),

    #[error("no prediction available; run a prediction before simulating")]
    NoPrediction,
}

pub type EstimateResult<T> = Result<T, EstimateError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_name_the_problem() {
        assert_eq!(InputProblem::Missing.to_string(), "value is missing");
        assert_eq!(
            InputProblem::NotNumeric("lots".into()).to_string(),
            "'lots' is not a number"
        );
        assert_eq!(InputProblem::Negative(-2.0).to_string(), "-2 is negative");
        assert_eq!(InputProblem::OutOfRange(140.0).to_string(), "140 is outside 0-100");

        let err = EstimateError::InvalidInput {
            team: TeamSlot::Team2,
            field: "passing_accuracy",
            problem: InputProblem::OutOfRange(140.0),
        };
        assert!(err.to_string().ends_with("passing_accuracy: 140 is outside 0-100"));
        assert_eq!(
            EstimateError::SimulationCount(0).to_string(),
            "simulation count 0 must be between 1 and 5000000"
        );
    }
}
