use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

use crate::stats::TeamSlot;

const MAX_EVENTS: usize = 15;
const MIN_DECAY: f64 = 0.3;
const DECAY_MINUTES: f64 = 10.0;

pub const GOAL_IMPACT: f64 = 0.6;
pub const CLEAR_CHANCE_IMPACT: f64 = 0.15;
pub const RED_CARD_IMPACT: f64 = 0.8;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MomentumKind {
    Goal,
    ClearChance,
    RedCard,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MomentumEvent {
    pub kind: MomentumKind,
    pub team: TeamSlot,
    /// Positive favours team 1.
    pub impact: f64,
    pub minute: u32,
}

impl MomentumEvent {
    /// Builds an event with the conventional signed impact for `kind`.
    pub fn for_team(kind: MomentumKind, team: TeamSlot, minute: u32) -> Self {
        let magnitude = match kind {
            MomentumKind::Goal => GOAL_IMPACT,
            MomentumKind::ClearChance => CLEAR_CHANCE_IMPACT,
            // A red card hurts the side that received it.
            MomentumKind::RedCard => -RED_CARD_IMPACT,
        };
        let impact = match team {
            TeamSlot::Team1 => magnitude,
            TeamSlot::Team2 => -magnitude,
        };
        Self {
            kind,
            team,
            impact,
            minute,
        }
    }
}

/// Decaying memory of the most recent match events.
#[derive(Debug, Clone, Default)]
pub struct MomentumEngine {
    events: VecDeque<MomentumEvent>,
    momentum: f64,
}

impl MomentumEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, event: MomentumEvent) {
        self.events.push_back(event);
        while self.events.len() > MAX_EVENTS {
            self.events.pop_front();
        }
        self.recompute(event.minute);
    }

    pub fn recompute(&mut self, minute: u32) {
        let total = self.events.len() as f64;
        let sum: f64 = self
            .events
            .iter()
            .enumerate()
            .map(|(idx, event)| {
                let recency = (idx as f64 + 1.0) / total;
                let age = f64::from(minute) - f64::from(event.minute);
                let decay = (-age / DECAY_MINUTES).exp().max(MIN_DECAY);
                event.impact * recency * decay
            })
            .sum();
        self.momentum = (sum / 3.0).clamp(-1.0, 1.0);
    }

    /// Always recomputes for `minute` before answering.
    pub fn momentum_at(&mut self, minute: u32) -> f64 {
        self.recompute(minute);
        self.momentum
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_engine_is_neutral() {
        let mut engine = MomentumEngine::new();
        assert_eq!(engine.momentum_at(30), 0.0);
    }

    #[test]
    fn single_goal_is_a_fifth() {
        let mut engine = MomentumEngine::new();
        engine.add(MomentumEvent::for_team(MomentumKind::Goal, TeamSlot::Team1, 10));
        assert!((engine.momentum_at(10) - 0.2).abs() < 1e-12);
        // Ten minutes later decay is e^-1.
        let later = engine.momentum_at(20);
        assert!((later - 0.2 * (-1.0f64).exp()).abs() < 1e-12);
        // Very old events keep the decay floor.
        assert!((engine.momentum_at(90) - 0.2 * MIN_DECAY).abs() < 1e-12);
    }

    #[test]
    fn red_card_swings_against_receiving_side() {
        let home = MomentumEvent::for_team(MomentumKind::RedCard, TeamSlot::Team1, 50);
        let away = MomentumEvent::for_team(MomentumKind::RedCard, TeamSlot::Team2, 50);
        assert_eq!(home.impact, -RED_CARD_IMPACT);
        assert_eq!(away.impact, RED_CARD_IMPACT);
    }

    #[test]
    fn buffer_keeps_last_fifteen_and_clamps() {
        let mut engine = MomentumEngine::new();
        for minute in 0..40 {
            engine.add(MomentumEvent::for_team(MomentumKind::Goal, TeamSlot::Team1, minute));
        }
        assert_eq!(engine.len(), MAX_EVENTS);
        assert_eq!(engine.momentum_at(39), 1.0);
    }
}
