//! Per-team simulation setup: playing style, strengths, weaknesses and mentality,
//! folded into a set of multiplicative modifiers.

use serde::{Deserialize, Serialize};

use crate::error::{EstimateError, EstimateResult};
use crate::occasion::OccasionKind;
use crate::stats::TeamSlot;

pub const MAX_STRENGTHS: usize = 2;
pub const MAX_WEAKNESSES: usize = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Style {
    TikiTaka,
    Gegenpressing,
    Catenaccio,
    DirectPlay,
    TotalFootball,
    CounterAttack,
    #[default]
    Balanced,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Strength {
    SetPieces,
    LethalStriker,
    WorldClassKeeper,
    SolidDefence,
    CreativeMidfield,
    PaceUpFront,
    PhysicalDominance,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Weakness {
    VulnerableDefence,
    PoorFinishing,
    ShakyKeeper,
    Indiscipline,
    LowStamina,
    SlowStart,
    PanicUnderPressure,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Mentality {
    WinAtAllCosts,
    #[default]
    SeekVictory,
    AvoidDefeat,
    ManageResult,
}

impl Style {
    pub fn label(self) -> &'static str {
        match self {
            Style::TikiTaka => "Tiki-taka",
            Style::Gegenpressing => "Gegenpressing",
            Style::Catenaccio => "Catenaccio",
            Style::DirectPlay => "Direct play",
            Style::TotalFootball => "Total football",
            Style::CounterAttack => "Counter-attack",
            Style::Balanced => "Balanced",
        }
    }
}

impl Strength {
    pub fn label(self) -> &'static str {
        match self {
            Strength::SetPieces => "Set pieces",
            Strength::LethalStriker => "Lethal striker",
            Strength::WorldClassKeeper => "World-class keeper",
            Strength::SolidDefence => "Solid defence",
            Strength::CreativeMidfield => "Creative midfield",
            Strength::PaceUpFront => "Pace up front",
            Strength::PhysicalDominance => "Physical dominance",
        }
    }
}

impl Weakness {
    pub fn label(self) -> &'static str {
        match self {
            Weakness::VulnerableDefence => "Vulnerable defence",
            Weakness::PoorFinishing => "Poor finishing",
            Weakness::ShakyKeeper => "Shaky keeper",
            Weakness::Indiscipline => "Indiscipline",
            Weakness::LowStamina => "Low stamina",
            Weakness::SlowStart => "Slow start",
            Weakness::PanicUnderPressure => "Panic under pressure",
        }
    }
}

impl Mentality {
    pub fn label(self) -> &'static str {
        match self {
            Mentality::WinAtAllCosts => "Win at all costs",
            Mentality::SeekVictory => "Seek victory",
            Mentality::AvoidDefeat => "Avoid defeat",
            Mentality::ManageResult => "Manage the result",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TeamSetup {
    #[serde(default)]
    pub style: Style,
    #[serde(default)]
    pub strengths: Vec<Strength>,
    #[serde(default)]
    pub weaknesses: Vec<Weakness>,
    #[serde(default)]
    pub mentality: Mentality,
}

impl TeamSetup {
    pub fn validate(&self, team: TeamSlot) -> EstimateResult<()> {
        let invalid = |reason: String| EstimateError::InvalidConfig { team, reason };
        if self.strengths.len() > MAX_STRENGTHS {
            return Err(invalid(format!(
                "at most {MAX_STRENGTHS} strengths allowed, got {}",
                self.strengths.len()
            )));
        }
        if self.weaknesses.is_empty() || self.weaknesses.len() > MAX_WEAKNESSES {
            return Err(invalid(format!(
                "select between 1 and {MAX_WEAKNESSES} weaknesses, got {}",
                self.weaknesses.len()
            )));
        }
        Ok(())
    }

    pub fn has_weakness(&self, weakness: Weakness) -> bool {
        self.weaknesses.contains(&weakness)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationConfig {
    pub team1: TeamSetup,
    pub team2: TeamSetup,
}

impl SimulationConfig {
    pub fn validate(&self) -> EstimateResult<()> {
        self.team1.validate(TeamSlot::Team1)?;
        self.team2.validate(TeamSlot::Team2)
    }

    pub fn setup(&self, side: TeamSlot) -> &TeamSetup {
        match side {
            TeamSlot::Team1 => &self.team1,
            TeamSlot::Team2 => &self.team2,
        }
    }
}

/// Multipliers produced for one team at one point in the match.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Modifiers {
    pub pressure: f64,
    pub xg: f64,
    pub fatigue: f64,
    pub possession: f64,
    pub counter: f64,
    pub defensive: f64,
    pub offensive: f64,
}

impl Default for Modifiers {
    fn default() -> Self {
        Self {
            pressure: 1.0,
            xg: 1.0,
            fatigue: 1.0,
            possession: 1.0,
            counter: 1.0,
            defensive: 1.0,
            offensive: 1.0,
        }
    }
}

/// Match context a modifier may depend on.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ModifierContext {
    pub occasion: Option<OccasionKind>,
    pub minute: u32,
    /// Own goals minus opponent goals.
    pub goal_diff: i32,
}

impl ModifierContext {
    pub fn kick_off() -> Self {
        Self {
            occasion: None,
            minute: 1,
            goal_diff: 0,
        }
    }
}

fn style_base(style: Style) -> Modifiers {
    let m = Modifiers::default();
    // Style values replace the neutral defaults rather than multiplying them.
    match style {
        Style::TikiTaka => Modifiers {
            possession: 1.30,
            counter: 0.50,
            offensive: 1.15,
            fatigue: 0.95,
            ..m
        },
        Style::Gegenpressing => Modifiers {
            pressure: 1.35,
            fatigue: 1.30,
            offensive: 1.25,
            xg: 1.10,
            ..m
        },
        Style::Catenaccio => Modifiers {
            defensive: 1.40,
            counter: 1.30,
            possession: 0.70,
            offensive: 0.75,
            ..m
        },
        Style::DirectPlay => Modifiers {
            counter: 1.40,
            xg: 0.90,
            pressure: 1.15,
            possession: 0.85,
            ..m
        },
        Style::TotalFootball => Modifiers {
            offensive: 1.20,
            pressure: 1.20,
            possession: 1.15,
            fatigue: 1.20,
            ..m
        },
        Style::CounterAttack => Modifiers {
            counter: 1.50,
            defensive: 1.25,
            pressure: 0.70,
            possession: 0.75,
            ..m
        },
        Style::Balanced => m,
    }
}

/// Folds style, strengths, weaknesses and mentality, in that order.
pub fn apply_modifiers(setup: &TeamSetup, ctx: ModifierContext) -> Modifiers {
    let mut m = style_base(setup.style);
    let occasion = ctx.occasion;
    let is = |kind: OccasionKind| occasion == Some(kind);

    for strength in &setup.strengths {
        match strength {
            Strength::SetPieces => {
                if occasion.is_some_and(OccasionKind::is_set_piece) {
                    m.xg *= 1.35;
                }
            }
            Strength::LethalStriker => {
                if is(OccasionKind::InsideBox)
                    || is(OccasionKind::OneOnOne)
                    || is(OccasionKind::Header)
                {
                    m.xg *= 1.30;
                }
            }
            Strength::WorldClassKeeper => m.defensive *= 1.35,
            Strength::SolidDefence => {
                m.defensive *= 1.25;
                if is(OccasionKind::CounterAttack) {
                    m.xg *= 0.70;
                }
            }
            Strength::CreativeMidfield => {
                m.possession *= 1.20;
                m.pressure *= 1.15;
            }
            Strength::PaceUpFront => {
                if is(OccasionKind::CounterAttack) {
                    m.xg *= 1.40;
                }
                m.counter *= 1.30;
            }
            Strength::PhysicalDominance => {
                m.fatigue *= 0.80;
                if is(OccasionKind::Header) {
                    m.xg *= 1.25;
                }
            }
        }
    }

    for weakness in &setup.weaknesses {
        match weakness {
            Weakness::VulnerableDefence => {
                if is(OccasionKind::CounterAttack) {
                    m.xg *= 1.35;
                }
                m.defensive *= 0.75;
            }
            Weakness::PoorFinishing => {
                if is(OccasionKind::InsideBox)
                    || is(OccasionKind::EdgeOfBox)
                    || is(OccasionKind::LongRange)
                {
                    m.xg *= 0.70;
                }
            }
            Weakness::ShakyKeeper => {
                m.xg *= 1.25;
                m.defensive *= 0.80;
            }
            Weakness::Indiscipline => {
                if ctx.minute > 70 {
                    m.pressure *= 0.85;
                }
            }
            Weakness::LowStamina => {
                if ctx.minute > 60 {
                    m.fatigue *= 1.40;
                    m.pressure *= 0.80;
                }
            }
            Weakness::SlowStart => {
                if ctx.minute <= 20 {
                    m.pressure *= 0.70;
                    m.xg *= 0.85;
                }
            }
            Weakness::PanicUnderPressure => {
                if ctx.goal_diff < -1 {
                    m.xg *= 0.75;
                    m.pressure *= 0.85;
                }
            }
        }
    }

    match setup.mentality {
        Mentality::WinAtAllCosts => {
            m.pressure *= 1.30;
            m.offensive *= 1.25;
            m.defensive *= 0.80;
            m.fatigue *= 1.15;
        }
        Mentality::SeekVictory => {
            m.pressure *= 1.15;
            m.offensive *= 1.10;
        }
        Mentality::AvoidDefeat => {
            m.defensive *= 1.20;
            m.pressure *= 0.85;
            m.counter *= 1.15;
        }
        Mentality::ManageResult => {
            if ctx.goal_diff > 0 {
                m.defensive *= 1.25;
                m.pressure *= 0.75;
            }
        }
    }

    m
}

#[cfg(test)]
mod tests {
    use super::*;

    fn setup(style: Style) -> TeamSetup {
        TeamSetup {
            style,
            strengths: Vec::new(),
            weaknesses: vec![Weakness::SlowStart],
            mentality: Mentality::AvoidDefeat,
        }
    }

    fn ctx(occasion: Option<OccasionKind>, minute: u32, goal_diff: i32) -> ModifierContext {
        ModifierContext {
            occasion,
            minute,
            goal_diff,
        }
    }

    #[test]
    fn style_values_replace_defaults() {
        let mut s = setup(Style::Gegenpressing);
        s.weaknesses = vec![Weakness::ShakyKeeper];
        s.mentality = Mentality::ManageResult;
        let m = apply_modifiers(&s, ctx(None, 30, 0));
        assert_eq!(m.pressure, 1.35);
        assert!((m.xg - 1.10 * 1.25).abs() < 1e-12);
        assert_eq!(m.possession, 1.0);
    }

    #[test]
    fn occasion_specific_strengths_only_fire_for_their_kind() {
        let mut s = setup(Style::Balanced);
        s.strengths = vec![Strength::SetPieces, Strength::PaceUpFront];
        s.weaknesses = vec![Weakness::PoorFinishing];
        let corner = apply_modifiers(&s, ctx(Some(OccasionKind::Corner), 30, 0));
        assert!((corner.xg - 1.35).abs() < 1e-12);
        let counter = apply_modifiers(&s, ctx(Some(OccasionKind::CounterAttack), 30, 0));
        assert!((counter.xg - 1.40).abs() < 1e-12);
        let inside = apply_modifiers(&s, ctx(Some(OccasionKind::InsideBox), 30, 0));
        assert!((inside.xg - 0.70).abs() < 1e-12);
        // Pace raises counter threat regardless of occasion, on top of avoid-defeat.
        assert!((inside.counter - 1.30 * 1.15).abs() < 1e-12);
    }

    #[test]
    fn time_and_score_conditions() {
        let mut s = setup(Style::Balanced);
        s.weaknesses = vec![Weakness::SlowStart, Weakness::PanicUnderPressure];
        s.mentality = Mentality::ManageResult;

        let early = apply_modifiers(&s, ctx(None, 10, 0));
        assert!((early.pressure - 0.70).abs() < 1e-12);
        let late_trailing = apply_modifiers(&s, ctx(None, 80, -2));
        assert!((late_trailing.pressure - 0.85).abs() < 1e-12);
        assert!((late_trailing.xg - 0.75).abs() < 1e-12);
        let leading = apply_modifiers(&s, ctx(None, 80, 1));
        assert!((leading.pressure - 0.75).abs() < 1e-12);
        assert!((leading.defensive - 1.25).abs() < 1e-12);
    }

    #[test]
    fn validation_limits() {
        let mut s = setup(Style::Balanced);
        assert!(s.validate(TeamSlot::Team1).is_ok());
        s.weaknesses.clear();
        assert!(matches!(
            s.validate(TeamSlot::Team1),
            Err(EstimateError::InvalidConfig { .. })
        ));
        s.weaknesses = vec![Weakness::LowStamina];
        s.strengths = vec![
            Strength::SetPieces,
            Strength::PaceUpFront,
            Strength::LethalStriker,
        ];
        assert!(s.validate(TeamSlot::Team2).is_err());
    }

    #[test]
    fn config_json_uses_kebab_case() {
        let json = r#"{
            "team1": {"style": "tiki-taka", "strengths": ["set-pieces"], "weaknesses": ["slow-start"], "mentality": "win-at-all-costs"},
            "team2": {"weaknesses": ["shaky-keeper"]}
        }"#;
        let cfg: SimulationConfig = serde_json::from_str(json).unwrap();
        assert_eq!(cfg.team1.style, Style::TikiTaka);
        assert_eq!(cfg.team2.style, Style::Balanced);
        assert_eq!(cfg.team2.mentality, Mentality::SeekVictory);
        assert!(cfg.validate().is_ok());
    }
}
