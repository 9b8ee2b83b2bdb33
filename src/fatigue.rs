use serde::{Deserialize, Serialize};

use crate::stats::TeamSlot;
use crate::tactics::Tactic;

const PRESS_STYLE_MULTIPLIER: f64 = 1.3;
const RED_CARD_MULTIPLIER: f64 = 0.2;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FatigueFactor {
    pub defensive: f64,
    /// Tired legs leave more space, so attacking output rises slightly.
    pub offensive: f64,
    pub precision: f64,
}

impl FatigueFactor {
    pub fn from_fatigue(fatigue: f64) -> Self {
        Self {
            defensive: 1.0 - fatigue * 0.3,
            offensive: 1.0 + fatigue * 0.20,
            precision: 1.0 - fatigue * 0.15,
        }
    }
}

pub fn fatigue_level(minute: u32, tactic: Tactic, red_cards: u32) -> f64 {
    let base = (f64::from(minute) / 90.0).powf(1.5);
    let style = if tactic == Tactic::PhysicalPress {
        PRESS_STYLE_MULTIPLIER
    } else {
        1.0
    };
    let reds = 1.0 + f64::from(red_cards) * RED_CARD_MULTIPLIER;
    (base * style * reds).min(1.0)
}

#[derive(Debug, Clone, Copy, Default)]
pub struct FatigueModel {
    team1: f64,
    team2: f64,
}

impl FatigueModel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn update(&mut self, minute: u32, tactics: (Tactic, Tactic), red_cards: (u32, u32)) {
        self.team1 = fatigue_level(minute, tactics.0, red_cards.0);
        self.team2 = fatigue_level(minute, tactics.1, red_cards.1);
    }

    pub fn level(&self, side: TeamSlot) -> f64 {
        match side {
            TeamSlot::Team1 => self.team1,
            TeamSlot::Team2 => self.team2,
        }
    }

    pub fn factor(&self, side: TeamSlot) -> FatigueFactor {
        FatigueFactor::from_fatigue(self.level(side))
    }
}
