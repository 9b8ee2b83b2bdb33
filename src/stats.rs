use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{EstimateError, EstimateResult, InputProblem};

/// Which side of the fixture a value belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TeamSlot {
    Team1,
    Team2,
}

impl TeamSlot {
    pub fn other(self) -> TeamSlot {
        match self {
            TeamSlot::Team1 => TeamSlot::Team2,
            TeamSlot::Team2 => TeamSlot::Team1,
        }
    }
}

impl fmt::Display for TeamSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TeamSlot::Team1 => write!(f, "team 1"),
            TeamSlot::Team2 => write!(f, "team 2"),
        }
    }
}

/// Per-match season averages for one team. Percentages live in `[0, 100]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatSet {
    pub goals_scored: f64,
    pub goals_conceded: f64,
    pub possession: f64,
    pub shots_on_target: f64,
    pub passing_accuracy: f64,
    pub fouls: f64,
    pub corners: f64,
    pub yellow_cards: f64,
    pub red_cards: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatField {
    GoalsScored,
    GoalsConceded,
    Possession,
    ShotsOnTarget,
    PassingAccuracy,
    Fouls,
    Corners,
    YellowCards,
    RedCards,
}

impl StatField {
    pub const ALL: [StatField; 9] = [
        StatField::GoalsScored,
        StatField::GoalsConceded,
        StatField::Possession,
        StatField::ShotsOnTarget,
        StatField::PassingAccuracy,
        StatField::Fouls,
        StatField::Corners,
        StatField::YellowCards,
        StatField::RedCards,
    ];

    pub fn key(self) -> &'static str {
        match self {
            StatField::GoalsScored => "goalsScored",
            StatField::GoalsConceded => "goalsConceded",
            StatField::Possession => "possession",
            StatField::ShotsOnTarget => "shotsOnTarget",
            StatField::PassingAccuracy => "passingAccuracy",
            StatField::Fouls => "fouls",
            StatField::Corners => "corners",
            StatField::YellowCards => "yellowCards",
            StatField::RedCards => "redCards",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            StatField::GoalsScored => "Goals scored",
            StatField::GoalsConceded => "Goals conceded",
            StatField::Possession => "Possession",
            StatField::ShotsOnTarget => "Shots on target",
            StatField::PassingAccuracy => "Passing accuracy",
            StatField::Fouls => "Fouls",
            StatField::Corners => "Corners",
            StatField::YellowCards => "Yellow cards",
            StatField::RedCards => "Red cards",
        }
    }

    pub fn is_percentage(self) -> bool {
        matches!(self, StatField::Possession | StatField::PassingAccuracy)
    }
}

impl StatSet {
    pub fn get(&self, field: StatField) -> f64 {
        match field {
            StatField::GoalsScored => self.goals_scored,
            StatField::GoalsConceded => self.goals_conceded,
            StatField::Possession => self.possession,
            StatField::ShotsOnTarget => self.shots_on_target,
            StatField::PassingAccuracy => self.passing_accuracy,
            StatField::Fouls => self.fouls,
            StatField::Corners => self.corners,
            StatField::YellowCards => self.yellow_cards,
            StatField::RedCards => self.red_cards,
        }
    }

    /// Checks an already-typed set against the same rules as form input.
    pub fn validate(&self, team: TeamSlot) -> EstimateResult<()> {
        for field in StatField::ALL {
            check_value(team, field, self.get(field))?;
        }
        Ok(())
    }
}

/// A form value: forms submit strings, JSON clients submit numbers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawNumber {
    Number(f64),
    Text(String),
}

impl From<f64> for RawNumber {
    fn from(value: f64) -> Self {
        RawNumber::Number(value)
    }
}

impl From<&str> for RawNumber {
    fn from(value: &str) -> Self {
        RawNumber::Text(value.to_string())
    }
}

/// Unvalidated statistics as they arrive from a form or request body.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawStatSet {
    #[serde(default)]
    pub goals_scored: Option<RawNumber>,
    #[serde(default)]
    pub goals_conceded: Option<RawNumber>,
    #[serde(default)]
    pub possession: Option<RawNumber>,
    #[serde(default)]
    pub shots_on_target: Option<RawNumber>,
    #[serde(default)]
    pub passing_accuracy: Option<RawNumber>,
    #[serde(default)]
    pub fouls: Option<RawNumber>,
    #[serde(default)]
    pub corners: Option<RawNumber>,
    #[serde(default)]
    pub yellow_cards: Option<RawNumber>,
    #[serde(default)]
    pub red_cards: Option<RawNumber>,
}

impl RawStatSet {
    fn raw(&self, field: StatField) -> Option<&RawNumber> {
        match field {
            StatField::GoalsScored => self.goals_scored.as_ref(),
            StatField::GoalsConceded => self.goals_conceded.as_ref(),
            StatField::Possession => self.possession.as_ref(),
            StatField::ShotsOnTarget => self.shots_on_target.as_ref(),
            StatField::PassingAccuracy => self.passing_accuracy.as_ref(),
            StatField::Fouls => self.fouls.as_ref(),
            StatField::Corners => self.corners.as_ref(),
            StatField::YellowCards => self.yellow_cards.as_ref(),
            StatField::RedCards => self.red_cards.as_ref(),
        }
    }

    pub fn validate(&self, team: TeamSlot) -> EstimateResult<StatSet> {
        let mut values = [0.0f64; 9];
        for (slot, field) in values.iter_mut().zip(StatField::ALL) {
            *slot = parse_field(team, field, self.raw(field))?;
        }
        let [
            goals_scored,
            goals_conceded,
            possession,
            shots_on_target,
            passing_accuracy,
            fouls,
            corners,
            yellow_cards,
            red_cards,
        ] = values;
        Ok(StatSet {
            goals_scored,
            goals_conceded,
            possession,
            shots_on_target,
            passing_accuracy,
            fouls,
            corners,
            yellow_cards,
            red_cards,
        })
    }
}

impl From<StatSet> for RawStatSet {
    fn from(stats: StatSet) -> Self {
        RawStatSet {
            goals_scored: Some(stats.goals_scored.into()),
            goals_conceded: Some(stats.goals_conceded.into()),
            possession: Some(stats.possession.into()),
            shots_on_target: Some(stats.shots_on_target.into()),
            passing_accuracy: Some(stats.passing_accuracy.into()),
            fouls: Some(stats.fouls.into()),
            corners: Some(stats.corners.into()),
            yellow_cards: Some(stats.yellow_cards.into()),
            red_cards: Some(stats.red_cards.into()),
        }
    }
}

fn parse_field(team: TeamSlot, field: StatField, raw: Option<&RawNumber>) -> EstimateResult<f64> {
    let invalid = |problem| EstimateError::InvalidInput {
        team,
        field: field.key(),
        problem,
    };
    let value = match raw {
        None => return Err(invalid(InputProblem::Missing)),
        Some(RawNumber::Number(v)) => *v,
        Some(RawNumber::Text(text)) => {
            let trimmed = text.trim();
            if trimmed.is_empty() {
                return Err(invalid(InputProblem::Missing));
            }
            trimmed
                .parse::<f64>()
                .map_err(|_| invalid(InputProblem::NotNumeric(trimmed.to_string())))?
        }
    };
    check_value(team, field, value)?;
    Ok(value)
}

fn check_value(team: TeamSlot, field: StatField, value: f64) -> EstimateResult<()> {
    let invalid = |problem| EstimateError::InvalidInput {
        team,
        field: field.key(),
        problem,
    };
    if !value.is_finite() {
        return Err(invalid(InputProblem::NotNumeric(value.to_string())));
    }
    if value < 0.0 {
        return Err(invalid(InputProblem::Negative(value)));
    }
    if field.is_percentage() && value > 100.0 {
        return Err(invalid(InputProblem::OutOfRange(value)));
    }
    Ok(())
}

/// A named team with validated statistics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TeamInput {
    pub name: String,
    pub stats: StatSet,
}

/// Request-side team: name plus raw form values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawTeamInput {
    #[serde(default)]
    pub name: String,
    pub stats: RawStatSet,
}

impl RawTeamInput {
    pub fn validate(&self, team: TeamSlot) -> EstimateResult<TeamInput> {
        let stats = self.stats.validate(team)?;
        let name = match self.name.trim() {
            "" => match team {
                TeamSlot::Team1 => "Team 1".to_string(),
                TeamSlot::Team2 => "Team 2".to_string(),
            },
            trimmed => trimmed.to_string(),
        };
        Ok(TeamInput { name, stats })
    }
}

impl From<&TeamInput> for RawTeamInput {
    fn from(team: &TeamInput) -> Self {
        Self {
            name: team.name.clone(),
            stats: RawStatSet::from(team.stats),
        }
    }
}

impl TeamInput {
    /// The showcase fixture used by the "load demo" action.
    pub fn demo_pair() -> (TeamInput, TeamInput) {
        (
            TeamInput {
                name: "FC Barcelona".to_string(),
                stats: StatSet {
                    goals_scored: 2.6,
                    goals_conceded: 0.9,
                    possession: 65.4,
                    shots_on_target: 7.2,
                    passing_accuracy: 89.3,
                    fouls: 10.8,
                    corners: 6.5,
                    yellow_cards: 1.8,
                    red_cards: 0.1,
                },
            },
            TeamInput {
                name: "Real Madrid".to_string(),
                stats: StatSet {
                    goals_scored: 2.4,
                    goals_conceded: 1.1,
                    possession: 58.7,
                    shots_on_target: 6.8,
                    passing_accuracy: 86.5,
                    fouls: 12.3,
                    corners: 5.9,
                    yellow_cards: 2.1,
                    red_cards: 0.2,
                },
            },
        )
    }
}
