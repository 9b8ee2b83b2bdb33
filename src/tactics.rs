use serde::{Deserialize, Serialize};

use crate::stats::StatSet;

const DEFAULT_POSSESSION: f64 = 50.0;
const DEFAULT_SHOTS_ON_TARGET: f64 = 4.0;
const DEFAULT_PASSING_ACCURACY: f64 = 75.0;
const DEFAULT_FOULS: f64 = 12.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Tactic {
    Possession,
    CounterAttack,
    PhysicalPress,
    Control,
    Balanced,
}

impl Tactic {
    pub fn label(self) -> &'static str {
        match self {
            Tactic::Possession => "POSSESSION",
            Tactic::CounterAttack => "COUNTER-ATTACK",
            Tactic::PhysicalPress => "PHYSICAL/PRESS",
            Tactic::Control => "CONTROL",
            Tactic::Balanced => "BALANCED",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            Tactic::Possession => "Ball dominance",
            Tactic::CounterAttack => "Direct play",
            Tactic::PhysicalPress => "High intensity",
            Tactic::Control => "Conservative play",
            Tactic::Balanced => "Balanced play",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TacticProfile {
    pub tactic: Tactic,
    pub defensive: f64,
    pub offensive: f64,
    pub counter_attack: f64,
}

impl TacticProfile {
    fn new(tactic: Tactic, defensive: f64, offensive: f64, counter_attack: f64) -> Self {
        Self {
            tactic,
            defensive,
            offensive,
            counter_attack,
        }
    }
}

// Zero counts as "not provided", same as an empty form field.
fn or_default(value: f64, default: f64) -> f64 {
    if value == 0.0 || !value.is_finite() {
        default
    } else {
        value
    }
}

/// First matching rule wins.
pub fn infer_tactic(stats: &StatSet) -> TacticProfile {
    let possession = or_default(stats.possession, DEFAULT_POSSESSION);
    let shots = or_default(stats.shots_on_target, DEFAULT_SHOTS_ON_TARGET);
    let passing = or_default(stats.passing_accuracy, DEFAULT_PASSING_ACCURACY);
    let fouls = or_default(stats.fouls, DEFAULT_FOULS);

    if possession > 56.0 && passing > 82.0 {
        TacticProfile::new(Tactic::Possession, 0.88, 1.12, 0.55)
    } else if possession < 44.0 && shots > 4.5 {
        TacticProfile::new(Tactic::CounterAttack, 1.05, 0.92, 1.85)
    } else if fouls > 14.0 {
        TacticProfile::new(Tactic::PhysicalPress, 1.08, 0.95, 1.25)
    } else if possession > 50.0 && shots < 4.0 {
        TacticProfile::new(Tactic::Control, 0.95, 0.98, 0.80)
    } else {
        TacticProfile::new(Tactic::Balanced, 1.0, 1.0, 1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stats::TeamInput;

    fn base() -> StatSet {
        StatSet {
            goals_scored: 1.2,
            goals_conceded: 1.2,
            possession: 50.0,
            shots_on_target: 4.5,
            passing_accuracy: 78.0,
            fouls: 12.0,
            corners: 5.0,
            yellow_cards: 2.0,
            red_cards: 0.1,
        }
    }

    #[test]
    fn demo_sides_are_possession_teams() {
        let (home, away) = TeamInput::demo_pair();
        assert_eq!(infer_tactic(&home.stats).tactic, Tactic::Possession);
        assert_eq!(infer_tactic(&away.stats).tactic, Tactic::Possession);
    }

    #[test]
    fn rules_apply_in_order() {
        let mut s = base();
        s.possession = 40.0;
        s.shots_on_target = 5.0;
        s.fouls = 18.0;
        // Counter-attack beats physical when both match.
        let p = infer_tactic(&s);
        assert_eq!(p.tactic, Tactic::CounterAttack);
        assert_eq!(p.counter_attack, 1.85);

        s.shots_on_target = 3.0;
        assert_eq!(infer_tactic(&s).tactic, Tactic::PhysicalPress);

        let mut s = base();
        s.possession = 53.0;
        s.shots_on_target = 3.5;
        assert_eq!(infer_tactic(&s).tactic, Tactic::Control);

        assert_eq!(infer_tactic(&base()).tactic, Tactic::Balanced);
    }

    #[test]
    fn zero_fields_fall_back_to_defaults() {
        let mut s = base();
        s.possession = 0.0;
        s.shots_on_target = 0.0;
        // Defaults 50 possession and 4 shots do not satisfy the control rule.
        assert_eq!(infer_tactic(&s).tactic, Tactic::Balanced);
    }
}
