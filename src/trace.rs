//! Step-by-step record of a prediction, for layers that want to reveal the
//! computation gradually. Steps are produced lazily from a finished [`Prediction`].

use std::fmt;
use std::iter;

use crate::btts::{Confidence, NoteBand, Prediction, RecommendedModel, TeamPrediction};

#[derive(Debug, Clone, PartialEq)]
pub enum TraceStep {
    Section(&'static str),
    LambdaBase {
        team: String,
        base: f64,
    },
    LambdaAdjustment {
        stat: String,
        raw: f64,
        compared_to: Option<f64>,
        adjustment: f64,
    },
    LambdaFinal {
        team: String,
        lambda: f64,
    },
    ScoringChance {
        team: String,
        percent: f64,
    },
    Rho(f64),
    BothZero(f64),
    LogisticFeature {
        name: &'static str,
        value: f64,
    },
    LogisticZ(f64),
    ModelResult {
        model: RecommendedModel,
        percent: f64,
    },
    Comparison {
        difference: f64,
        band: NoteBand,
    },
    Verdict {
        percent: f64,
        model: RecommendedModel,
        confidence: Confidence,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepTone {
    Heading,
    Info,
    Positive,
    Negative,
    Result,
}

impl TraceStep {
    pub fn tone(&self) -> StepTone {
        match self {
            TraceStep::Section(_) => StepTone::Heading,
            TraceStep::LambdaAdjustment { adjustment, .. } if *adjustment > 0.0 => {
                StepTone::Positive
            }
            TraceStep::LambdaAdjustment { adjustment, .. } if *adjustment < 0.0 => {
                StepTone::Negative
            }
            TraceStep::LambdaFinal { .. }
            | TraceStep::ModelResult { .. }
            | TraceStep::Verdict { .. } => StepTone::Result,
            _ => StepTone::Info,
        }
    }
}

impl fmt::Display for TraceStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TraceStep::Section(title) => write!(f, "$ {title}"),
            TraceStep::LambdaBase { team, base } => {
                write!(f, "{team}: base lambda (avg goals) {base:.2}")
            }
            TraceStep::LambdaAdjustment {
                stat,
                raw,
                compared_to,
                adjustment,
            } => match compared_to {
                Some(other) => write!(f, "  {stat}: {raw} vs {other} -> {adjustment:+.3}"),
                None => write!(f, "  {stat}: {raw} -> {adjustment:+.3}"),
            },
            TraceStep::LambdaFinal { team, lambda } => {
                write!(f, "{team}: final lambda {lambda:.3}")
            }
            TraceStep::ScoringChance { team, percent } => {
                write!(f, "P({team} scores >= 1) = {percent:.2}%")
            }
            TraceStep::Rho(rho) => write!(f, "Correlation (rho) = {rho:.3}"),
            TraceStep::BothZero(p) => {
                write!(f, "P(both score 0, correlated) = {:.2}%", p * 100.0)
            }
            TraceStep::LogisticFeature { name, value } => write!(f, "  {name}: {value:.3}"),
            TraceStep::LogisticZ(z) => write!(f, "Linear score z = {z:.3}"),
            TraceStep::ModelResult { model, percent } => {
                write!(f, "BTTS ({}) = {percent:.2}%", model.label())
            }
            TraceStep::Comparison { difference, band } => {
                write!(f, "Model difference {difference:.2} pts. {}", band.message())
            }
            TraceStep::Verdict {
                percent,
                model,
                confidence,
            } => write!(
                f,
                "FINAL BTTS {percent:.2}% | model: {} | confidence: {}",
                model.label(),
                confidence.label()
            ),
        }
    }
}

fn lambda_steps(team: &TeamPrediction) -> impl Iterator<Item = TraceStep> + '_ {
    let base = team
        .lambda
        .breakdown
        .iter()
        .filter(|step| step.stat.is_none())
        .map(move |step| TraceStep::LambdaBase {
            team: team.name.clone(),
            base: step.raw_value,
        });
    let adjustments = team.lambda.breakdown.iter().filter_map(move |step| {
        step.stat.as_ref().map(|stat| TraceStep::LambdaAdjustment {
            stat: stat.clone(),
            raw: step.raw_value,
            compared_to: step.compared_to,
            adjustment: step.adjustment,
        })
    });
    base.chain(adjustments).chain(iter::once_with(move || TraceStep::LambdaFinal {
        team: team.name.clone(),
        lambda: team.lambda.lambda,
    }))
}

impl Prediction {
    /// Lazily walks the computation in presentation order.
    pub fn steps(&self) -> impl Iterator<Item = TraceStep> + '_ {
        let logistic = self.logistic;
        let features = [
            ("goals scored 1", logistic.goals_scored1),
            ("goals scored 2", logistic.goals_scored2),
            ("conceded pressure 1", logistic.goals_conceded1),
            ("conceded pressure 2", logistic.goals_conceded2),
            ("shots on target 1", logistic.shots_on_target1),
            ("shots on target 2", logistic.shots_on_target2),
            ("avg goals per match", logistic.avg_goals_norm),
            ("offensive strength", logistic.offensive_strength_norm),
        ];

        iter::once(TraceStep::Section("MODEL 1: BIVARIATE POISSON"))
            .chain(lambda_steps(&self.team1))
            .chain(lambda_steps(&self.team2))
            .chain([
                TraceStep::ScoringChance {
                    team: self.team1.name.clone(),
                    percent: self.team1.prob_scores,
                },
                TraceStep::ScoringChance {
                    team: self.team2.name.clone(),
                    percent: self.team2.prob_scores,
                },
                TraceStep::Rho(self.poisson.rho),
                TraceStep::BothZero(self.poisson.both_zero),
                TraceStep::ModelResult {
                    model: RecommendedModel::Poisson,
                    percent: self.poisson.probability,
                },
                TraceStep::Section("MODEL 2: LOGISTIC REGRESSION"),
            ])
            .chain(
                features
                    .into_iter()
                    .map(|(name, value)| TraceStep::LogisticFeature { name, value }),
            )
            .chain([
                TraceStep::LogisticZ(logistic.z),
                TraceStep::ModelResult {
                    model: RecommendedModel::Logistic,
                    percent: logistic.probability,
                },
                TraceStep::Section("COMPARISON"),
                TraceStep::Comparison {
                    difference: self.btts.model_difference,
                    band: self.btts.note_band(),
                },
                TraceStep::Verdict {
                    percent: self.btts.final_probability,
                    model: self.btts.recommended_model,
                    confidence: self.btts.confidence,
                },
            ])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stats::TeamInput;

    #[test]
    fn steps_cover_both_lambdas_and_end_with_verdict() {
        let (home, away) = TeamInput::demo_pair();
        let pred = Prediction::build(&home, &away);
        let steps: Vec<_> = pred.steps().collect();

        let adjustments = steps
            .iter()
            .filter(|s| matches!(s, TraceStep::LambdaAdjustment { .. }))
            .count();
        assert_eq!(adjustments, 16);
        assert!(matches!(steps.first(), Some(TraceStep::Section(_))));
        assert!(matches!(steps.last(), Some(TraceStep::Verdict { .. })));
    }

    #[test]
    fn adjustment_tone_follows_sign() {
        let up = TraceStep::LambdaAdjustment {
            stat: "corners".to_string(),
            raw: 6.5,
            compared_to: None,
            adjustment: 0.13,
        };
        let down = TraceStep::LambdaAdjustment {
            stat: "fouls".to_string(),
            raw: 10.8,
            compared_to: None,
            adjustment: -0.216,
        };
        assert_eq!(up.tone(), StepTone::Positive);
        assert_eq!(down.tone(), StepTone::Negative);
        assert_eq!(down.to_string(), "  fouls: 10.8 -> -0.216");
    }
}
