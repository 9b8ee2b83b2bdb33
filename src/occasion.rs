use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::fatigue::FatigueFactor;

pub const XG_MIN: f64 = 0.01;
pub const XG_MAX: f64 = 0.95;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OccasionKind {
    Penalty,
    OneOnOne,
    InsideBox,
    EdgeOfBox,
    LongRange,
    Corner,
    FreeKick,
    CounterAttack,
    Rebound,
    Header,
}

/// Cumulative thresholds for open-play occasions; anything above is a header.
const OPEN_PLAY: [(f64, OccasionKind); 8] = [
    (0.02, OccasionKind::Penalty),
    (0.15, OccasionKind::OneOnOne),
    (0.35, OccasionKind::InsideBox),
    (0.50, OccasionKind::EdgeOfBox),
    (0.65, OccasionKind::LongRange),
    (0.75, OccasionKind::Corner),
    (0.82, OccasionKind::FreeKick),
    (0.90, OccasionKind::Rebound),
];

impl OccasionKind {
    pub const ALL: [OccasionKind; 10] = [
        OccasionKind::Penalty,
        OccasionKind::OneOnOne,
        OccasionKind::InsideBox,
        OccasionKind::EdgeOfBox,
        OccasionKind::LongRange,
        OccasionKind::Corner,
        OccasionKind::FreeKick,
        OccasionKind::CounterAttack,
        OccasionKind::Rebound,
        OccasionKind::Header,
    ];

    pub fn base_xg(self) -> f64 {
        match self {
            OccasionKind::Penalty => 0.79,
            OccasionKind::OneOnOne => 0.38,
            OccasionKind::InsideBox => 0.19,
            OccasionKind::EdgeOfBox => 0.08,
            OccasionKind::LongRange => 0.04,
            OccasionKind::Corner => 0.03,
            OccasionKind::FreeKick => 0.06,
            OccasionKind::CounterAttack => 0.24,
            OccasionKind::Rebound => 0.12,
            OccasionKind::Header => 0.09,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            OccasionKind::Penalty => "penalty",
            OccasionKind::OneOnOne => "one-on-one",
            OccasionKind::InsideBox => "inside the box",
            OccasionKind::EdgeOfBox => "edge of the box",
            OccasionKind::LongRange => "long range",
            OccasionKind::Corner => "corner",
            OccasionKind::FreeKick => "free kick",
            OccasionKind::CounterAttack => "counter-attack",
            OccasionKind::Rebound => "rebound",
            OccasionKind::Header => "header",
        }
    }

    pub fn is_set_piece(self) -> bool {
        matches!(
            self,
            OccasionKind::Corner | OccasionKind::FreeKick | OccasionKind::Penalty
        )
    }
}

/// Draws the kind of chance. The first uniform is consumed even for counter-attacks.
pub fn pick_occasion(rng: &mut impl Rng, counter_attack: bool) -> OccasionKind {
    let roll = rng.gen_range(0.0..1.0);
    if counter_attack {
        return if rng.gen_bool(0.7) {
            OccasionKind::CounterAttack
        } else {
            OccasionKind::OneOnOne
        };
    }
    OPEN_PLAY
        .iter()
        .find(|(threshold, _)| roll < *threshold)
        .map(|(_, kind)| *kind)
        .unwrap_or(OccasionKind::Header)
}

/// Attack quality: mean of shots on target and goals scored.
pub fn offensive_quality(shots_on_target: f64, goals_scored: f64) -> f64 {
    (shots_on_target + goals_scored) / 2.0
}

/// Defence quality: five minus goals conceded.
pub fn defensive_quality(goals_conceded: f64) -> f64 {
    5.0 - goals_conceded
}

/// xG for one chance with an explicit variability draw in `[0.7, 1.3)`.
pub fn xg_with_variability(
    kind: OccasionKind,
    offensive_quality: f64,
    defensive_quality: f64,
    fatigue: &FatigueFactor,
    variability: f64,
) -> f64 {
    let offence = offensive_quality / 5.0;
    let defence = (1.5 - defensive_quality / 5.0).max(0.5);
    let xg = kind.base_xg() * offence * defence * fatigue.precision * variability;
    xg.clamp(XG_MIN, XG_MAX)
}

pub fn calc_xg(
    kind: OccasionKind,
    offensive_quality: f64,
    defensive_quality: f64,
    fatigue: &FatigueFactor,
    rng: &mut impl Rng,
) -> f64 {
    let variability = rng.gen_range(0.7..1.3);
    xg_with_variability(kind, offensive_quality, defensive_quality, fatigue, variability)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    #[test]
    fn thresholds_cover_open_play_kinds() {
        let kinds: Vec<_> = OPEN_PLAY.iter().map(|(_, k)| *k).collect();
        assert!(!kinds.contains(&OccasionKind::CounterAttack));
        assert!(!kinds.contains(&OccasionKind::Header));
        assert!(OPEN_PLAY.windows(2).all(|w| w[0].0 < w[1].0));
    }

    #[test]
    fn counter_flag_only_yields_counter_or_one_on_one() {
        let mut rng = ChaCha8Rng::seed_from_u64(7);
        for _ in 0..500 {
            let kind = pick_occasion(&mut rng, true);
            assert!(matches!(
                kind,
                OccasionKind::CounterAttack | OccasionKind::OneOnOne
            ));
        }
    }

    #[test]
    fn xg_formula_and_clamps() {
        let fresh = FatigueFactor::from_fatigue(0.0);
        // base .19 * (5/5) * max(.5, 1.5 - 2.5/5) * 1 * 1
        let xg = xg_with_variability(OccasionKind::InsideBox, 5.0, 2.5, &fresh, 1.0);
        assert!((xg - 0.19).abs() < 1e-12);

        let high = xg_with_variability(OccasionKind::Penalty, 10.0, -5.0, &fresh, 1.3);
        assert_eq!(high, XG_MAX);
        let low = xg_with_variability(OccasionKind::Corner, 0.1, 5.0, &fresh, 0.7);
        assert_eq!(low, XG_MIN);
    }

    #[test]
    fn quality_helpers() {
        assert!((offensive_quality(7.2, 2.6) - 4.9).abs() < 1e-12);
        assert!((defensive_quality(0.9) - 4.1).abs() < 1e-12);
    }
}
