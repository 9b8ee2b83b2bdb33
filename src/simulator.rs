use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

use crate::btts::Prediction;
use crate::commentary;
use crate::fatigue::{FatigueFactor, FatigueModel};
use crate::momentum::{MomentumEngine, MomentumEvent, MomentumKind};
use crate::occasion::{self, OccasionKind};
use crate::sim_config::{ModifierContext, SimulationConfig, Weakness, apply_modifiers};
use crate::stats::{StatSet, TeamInput, TeamSlot};
use crate::tactics::{Tactic, TacticProfile, infer_tactic};

const REGULATION_MINUTES: u32 = 90;
const MAX_STOPPAGE: u32 = 5;
const MAX_OCCASION_PROBABILITY: f64 = 0.42;
const OCCASION_SCALE: f64 = 170.0;
const CLEAR_CHANCE_XG: f64 = 0.20;
const MISSED_CHANCE_LOG_PROBABILITY: f64 = 0.4;
const MINOR_EVENT_PROBABILITY: f64 = 0.12;
const YELLOW_LOG_PROBABILITY: f64 = 0.25;
const INDISCIPLINE_SHARE: f64 = 0.6;
const KEY_MINUTES: [u32; 4] = [44, 45, 89, 90];

/// Occasion-rate multiplier for the phase of the match.
pub fn minute_multiplier(minute: u32) -> f64 {
    match minute {
        0..=15 => 0.75,
        16..=30 => 1.05,
        31..=45 => 1.35,
        46..=50 => 0.65,
        51..=60 => 0.95,
        61..=75 => 1.10,
        76..=90 => 1.45,
        _ => 1.70,
    }
}

fn score_multiplier(goal_diff: i32) -> f64 {
    match goal_diff {
        d if d < -2 => 1.85,
        -2 => 1.65,
        -1 => 1.35,
        d if d > 2 => 0.55,
        2 => 0.70,
        1 => 0.82,
        _ => 1.0,
    }
}

/// Inputs to one side's attacking pressure for one minute.
#[derive(Debug, Clone, Copy)]
pub struct PressureInput {
    pub lambda: f64,
    pub shots_on_target: f64,
    pub possession: f64,
    pub minute: u32,
    /// Own goals minus opponent goals.
    pub goal_diff: i32,
    /// Momentum from this side's point of view.
    pub momentum: f64,
    pub tactic_offensive: f64,
    pub fatigue_offensive: f64,
}

/// Pressure with an explicit day-form factor in `[0.75, 1.25)`.
pub fn offensive_pressure(input: &PressureInput, form: f64) -> f64 {
    let mut pressure = input.lambda * 2.2;

    let shots = (input.shots_on_target / 4.5).clamp(0.6, 2.0);
    let possession = input.possession / 50.0;
    pressure *= shots * 0.6 + possession * 0.4;

    pressure *= score_multiplier(input.goal_diff);
    pressure *= 1.0 + input.momentum * 0.45;
    pressure *= input.tactic_offensive;
    pressure *= input.fatigue_offensive;
    pressure *= form;

    if input.minute > 75 && input.goal_diff < 0 {
        pressure *= 1.0 + (f64::from(input.minute - 75) / 15.0) * 0.8;
    }
    if KEY_MINUTES.contains(&input.minute) {
        pressure *= 1.25;
    }

    pressure.max(0.1)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EventKind {
    Goal,
    ChanceMissed,
    Card,
    RedCard,
    Info,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchEvent {
    pub minute: u32,
    /// `None` for match-level information.
    pub side: Option<TeamSlot>,
    pub team: String,
    pub kind: EventKind,
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub xg: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub occasion: Option<OccasionKind>,
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Pair<T> {
    pub home: T,
    pub away: T,
}

impl<T: Copy> Pair<T> {
    pub fn new(home: T, away: T) -> Self {
        Self { home, away }
    }

    pub fn get(&self, side: TeamSlot) -> T {
        match side {
            TeamSlot::Team1 => self.home,
            TeamSlot::Team2 => self.away,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoxScore {
    pub possession: Pair<u32>,
    pub shots_on_target: Pair<u32>,
    pub shots: Pair<u32>,
    pub passing_accuracy: Pair<u32>,
    pub fouls: Pair<u32>,
    pub corners: Pair<u32>,
    pub yellow_cards: Pair<u32>,
    pub red_cards: Pair<u32>,
    pub xg: Pair<f64>,
}

impl BoxScore {
    /// Display rows: label, home value, away value.
    pub fn rows(&self) -> Vec<(&'static str, String, String)> {
        let count = |label, pair: Pair<u32>| (label, pair.home.to_string(), pair.away.to_string());
        vec![
            (
                "Possession",
                format!("{}%", self.possession.home),
                format!("{}%", self.possession.away),
            ),
            count("Shots on target", self.shots_on_target),
            count("Total shots", self.shots),
            (
                "Passing accuracy",
                format!("{}%", self.passing_accuracy.home),
                format!("{}%", self.passing_accuracy.away),
            ),
            count("Fouls", self.fouls),
            count("Corners", self.corners),
            count("Yellow cards", self.yellow_cards),
            count("Red cards", self.red_cards),
            (
                "xG (expected goals)",
                format!("{:.2}", self.xg.home),
                format!("{:.2}", self.xg.away),
            ),
        ]
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchResult {
    pub team1: String,
    pub team2: String,
    pub final_score: Pair<u32>,
    pub duration: u32,
    pub timeline: Vec<MatchEvent>,
    pub box_score: BoxScore,
}

impl MatchResult {
    pub fn both_scored(&self) -> bool {
        self.final_score.home > 0 && self.final_score.away > 0
    }

    pub fn score_line(&self) -> String {
        format!(
            "{} {} - {} {}",
            self.team1, self.final_score.home, self.final_score.away, self.team2
        )
    }
}

/// Running totals for one side.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SideTally {
    pub goals: u32,
    pub shots: u32,
    pub shots_on_target: u32,
    pub corners: u32,
    pub fouls: u32,
    pub yellow_cards: u32,
    pub red_cards: u32,
    pub xg: f64,
}

/// Mutable state of a match in progress. Owned by a single run.
#[derive(Debug, Clone, Default)]
pub struct MatchState {
    pub minute: u32,
    pub team1: SideTally,
    pub team2: SideTally,
    pub momentum: MomentumEngine,
    pub fatigue: FatigueModel,
}

impl MatchState {
    pub fn tally(&self, side: TeamSlot) -> &SideTally {
        match side {
            TeamSlot::Team1 => &self.team1,
            TeamSlot::Team2 => &self.team2,
        }
    }

    fn tally_mut(&mut self, side: TeamSlot) -> &mut SideTally {
        match side {
            TeamSlot::Team1 => &mut self.team1,
            TeamSlot::Team2 => &mut self.team2,
        }
    }

    /// Goal difference from team 1's point of view.
    pub fn goal_diff(&self) -> i32 {
        self.team1.goals as i32 - self.team2.goals as i32
    }
}

#[derive(Debug, Clone)]
pub struct MatchSimulator {
    team1: TeamInput,
    team2: TeamInput,
    lambda1: f64,
    lambda2: f64,
    config: Option<SimulationConfig>,
}

impl MatchSimulator {
    pub fn new(team1: TeamInput, team2: TeamInput, lambda1: f64, lambda2: f64) -> Self {
        Self {
            team1,
            team2,
            lambda1,
            lambda2,
            config: None,
        }
    }

    pub fn from_prediction(prediction: &Prediction) -> Self {
        let (team1, team2) = prediction.team_inputs();
        Self::new(
            team1,
            team2,
            prediction.team1.lambda.lambda,
            prediction.team2.lambda.lambda,
        )
    }

    pub fn with_config(mut self, config: Option<SimulationConfig>) -> Self {
        self.config = config;
        self
    }

    fn team(&self, side: TeamSlot) -> &TeamInput {
        match side {
            TeamSlot::Team1 => &self.team1,
            TeamSlot::Team2 => &self.team2,
        }
    }

    fn lambda(&self, side: TeamSlot) -> f64 {
        match side {
            TeamSlot::Team1 => self.lambda1,
            TeamSlot::Team2 => self.lambda2,
        }
    }

    /// Tactic profile after kick-off configuration modifiers.
    pub fn tactic(&self, side: TeamSlot) -> TacticProfile {
        let mut profile = infer_tactic(&self.team(side).stats);
        if let Some(config) = &self.config {
            let m = apply_modifiers(config.setup(side), ModifierContext::kick_off());
            profile.defensive *= m.defensive;
            profile.offensive *= m.offensive;
            profile.counter_attack *= m.counter;
        }
        profile
    }

    /// Starts a match that can be advanced minute by minute.
    pub fn kick_off<R: Rng>(&self, mut rng: R) -> MatchRun<'_, R> {
        let duration = REGULATION_MINUTES + rng.gen_range(0..=MAX_STOPPAGE);
        let tactics = Pair::new(self.tactic(TeamSlot::Team1), self.tactic(TeamSlot::Team2));
        let timeline = vec![MatchEvent {
            minute: 0,
            side: None,
            team: "INFO".to_string(),
            kind: EventKind::Info,
            description: commentary::kick_off_description(
                &self.team1.name,
                &tactics.home,
                &self.team2.name,
                &tactics.away,
            ),
            xg: None,
            occasion: None,
        }];
        MatchRun {
            sim: self,
            rng,
            duration,
            tactics,
            state: MatchState::default(),
            timeline,
        }
    }

    pub fn run(&self, rng: &mut impl Rng) -> MatchResult {
        let mut run = self.kick_off(rng);
        while run.step().is_some() {}
        run.finish()
    }

    pub fn run_seeded(&self, seed: u64) -> MatchResult {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        self.run(&mut rng)
    }
}

/// A match in progress.
pub struct MatchRun<'a, R: Rng> {
    sim: &'a MatchSimulator,
    rng: R,
    duration: u32,
    tactics: Pair<TacticProfile>,
    state: MatchState,
    timeline: Vec<MatchEvent>,
}

impl<R: Rng> MatchRun<'_, R> {
    pub fn state(&self) -> &MatchState {
        &self.state
    }

    pub fn duration(&self) -> u32 {
        self.duration
    }

    pub fn timeline(&self) -> &[MatchEvent] {
        &self.timeline
    }

    pub fn is_finished(&self) -> bool {
        self.state.minute >= self.duration
    }

    /// Plays the next minute. Returns the events it produced, or `None` once full time is reached.
    pub fn step(&mut self) -> Option<&[MatchEvent]> {
        if self.is_finished() {
            return None;
        }
        let minute = self.state.minute + 1;
        self.state.minute = minute;
        let logged_before = self.timeline.len();

        let diff = self.state.goal_diff();
        self.state.fatigue.update(
            minute,
            (self.tactics.home.tactic, self.tactics.away.tactic),
            (self.state.team1.red_cards, self.state.team2.red_cards),
        );
        let fatigue = Pair::new(
            self.state.fatigue.factor(TeamSlot::Team1),
            self.state.fatigue.factor(TeamSlot::Team2),
        );
        let momentum = self.state.momentum.momentum_at(minute);
        let phase = minute_multiplier(minute);

        let mut pressure1 = self.side_pressure(TeamSlot::Team1, minute, diff, momentum, &fatigue);
        let mut pressure2 = self.side_pressure(TeamSlot::Team2, minute, -diff, -momentum, &fatigue);
        if let Some(config) = &self.sim.config {
            pressure1 *= apply_modifiers(&config.team1, context(None, minute, diff)).pressure;
            pressure2 *= apply_modifiers(&config.team2, context(None, minute, -diff)).pressure;
        }

        let total = (pressure1 + pressure2) * phase;
        let occasion_probability = (total / OCCASION_SCALE).min(MAX_OCCASION_PROBABILITY);
        if self.roll() < occasion_probability {
            let attacker = if self.roll() < pressure1 / (pressure1 + pressure2) {
                TeamSlot::Team1
            } else {
                TeamSlot::Team2
            };
            let attacker_diff = match attacker {
                TeamSlot::Team1 => diff,
                TeamSlot::Team2 => -diff,
            };
            self.play_occasion(attacker, minute, attacker_diff, fatigue.get(attacker));
        }

        if self.roll() < MINOR_EVENT_PROBABILITY {
            self.minor_event(minute);
        }

        Some(&self.timeline[logged_before..])
    }

    fn roll(&mut self) -> f64 {
        self.rng.gen_range(0.0..1.0)
    }

    fn side_pressure(
        &mut self,
        side: TeamSlot,
        minute: u32,
        goal_diff: i32,
        momentum: f64,
        fatigue: &Pair<FatigueFactor>,
    ) -> f64 {
        let stats = &self.sim.team(side).stats;
        let input = PressureInput {
            lambda: self.sim.lambda(side),
            shots_on_target: stats.shots_on_target,
            possession: stats.possession,
            minute,
            goal_diff,
            momentum,
            tactic_offensive: self.tactics.get(side).offensive,
            fatigue_offensive: fatigue.get(side).offensive,
        };
        let form = self.rng.gen_range(0.75..1.25);
        offensive_pressure(&input, form)
    }

    fn play_occasion(
        &mut self,
        attacker: TeamSlot,
        minute: u32,
        goal_diff: i32,
        fatigue: FatigueFactor,
    ) {
        let tactic = self.tactics.get(attacker);
        let counter = tactic.tactic == Tactic::CounterAttack
            && self.roll() < tactic.counter_attack / 2.0;
        let kind = occasion::pick_occasion(&mut self.rng, counter);

        let sim = self.sim;
        let attack = &sim.team(attacker).stats;
        let defence = &sim.team(attacker.other()).stats;
        let mut xg = occasion::calc_xg(
            kind,
            occasion::offensive_quality(attack.shots_on_target, attack.goals_scored),
            occasion::defensive_quality(defence.goals_conceded),
            &fatigue,
            &mut self.rng,
        );
        if let Some(config) = &sim.config {
            xg *= apply_modifiers(
                config.setup(attacker),
                context(Some(kind), minute, goal_diff),
            )
            .xg;
        }

        let tally = self.state.tally_mut(attacker);
        tally.xg += xg;
        tally.shots += 1;

        let team_name = sim.team(attacker).name.clone();
        if self.roll() < xg {
            let tally = self.state.tally_mut(attacker);
            tally.goals += 1;
            tally.shots_on_target += 1;
            self.state
                .momentum
                .add(MomentumEvent::for_team(MomentumKind::Goal, attacker, minute));
            let description = commentary::goal_description(kind, &mut self.rng);
            self.timeline.push(MatchEvent {
                minute,
                side: Some(attacker),
                team: team_name,
                kind: EventKind::Goal,
                description: description.to_string(),
                xg: Some(xg),
                occasion: Some(kind),
            });
        } else if xg > CLEAR_CHANCE_XG {
            self.state.tally_mut(attacker).shots_on_target += 1;
            self.state.momentum.add(MomentumEvent::for_team(
                MomentumKind::ClearChance,
                attacker,
                minute,
            ));
            if self.roll() < MISSED_CHANCE_LOG_PROBABILITY {
                let description = commentary::missed_chance_description(kind, &mut self.rng);
                self.timeline.push(MatchEvent {
                    minute,
                    side: Some(attacker),
                    team: team_name,
                    kind: EventKind::ChanceMissed,
                    description: description.to_string(),
                    xg: Some(xg),
                    occasion: Some(kind),
                });
            }
        }
    }

    /// Chance that a minor event belongs to team 1. Indiscipline tilts it.
    fn team1_share(&self) -> f64 {
        let Some(config) = &self.sim.config else {
            return 0.5;
        };
        let home = config.team1.has_weakness(Weakness::Indiscipline);
        let away = config.team2.has_weakness(Weakness::Indiscipline);
        match (home, away) {
            (true, false) => INDISCIPLINE_SHARE,
            (false, true) => 1.0 - INDISCIPLINE_SHARE,
            _ => 0.5,
        }
    }

    fn minor_event(&mut self, minute: u32) {
        let kind_roll = self.roll();
        let share = self.team1_share();
        let side = if self.roll() < share {
            TeamSlot::Team1
        } else {
            TeamSlot::Team2
        };
        let team_name = self.sim.team(side).name.clone();

        if kind_roll < 0.45 {
            self.state.tally_mut(side).corners += 1;
        } else if kind_roll < 0.85 {
            self.state.tally_mut(side).fouls += 1;
        } else if kind_roll < 0.97 {
            self.state.tally_mut(side).yellow_cards += 1;
            if self.roll() < YELLOW_LOG_PROBABILITY {
                self.timeline.push(MatchEvent {
                    minute,
                    side: Some(side),
                    team: team_name,
                    kind: EventKind::Card,
                    description: commentary::YELLOW_CARD.to_string(),
                    xg: None,
                    occasion: None,
                });
            }
        } else {
            self.state.tally_mut(side).red_cards += 1;
            self.state
                .momentum
                .add(MomentumEvent::for_team(MomentumKind::RedCard, side, minute));
            self.timeline.push(MatchEvent {
                minute,
                side: Some(side),
                team: team_name,
                kind: EventKind::RedCard,
                description: commentary::RED_CARD.to_string(),
                xg: None,
                occasion: None,
            });
        }
    }

    /// Plays any remaining minutes and builds the final result.
    pub fn finish(mut self) -> MatchResult {
        while self.step().is_some() {}

        let final_momentum = self.state.momentum.momentum_at(self.duration);
        let sim = self.sim;
        let stats1 = &sim.team1.stats;
        let stats2 = &sim.team2.stats;
        let base1 = nonzero_or(stats1.possession, 50.0);
        let base2 = nonzero_or(stats2.possession, 50.0);
        let possession1 = (base1 / (base1 + base2) * 100.0 + final_momentum * 5.0)
            .round()
            .clamp(30.0, 70.0) as u32;
        let possession2 = 100 - possession1;

        let t1 = self.state.team1;
        let t2 = self.state.team2;
        let shots1 = t1.shots.max(round_u32(f64::from(possession1) / 10.0));
        let shots2 = t2.shots.max(round_u32(f64::from(possession2) / 10.0));
        let on_target1 = t1.shots_on_target.max(round_u32(f64::from(shots1) * 0.4));
        let on_target2 = t2.shots_on_target.max(round_u32(f64::from(shots2) * 0.4));
        let passing1 = self.passing(stats1);
        let passing2 = self.passing(stats2);

        let box_score = BoxScore {
            possession: Pair::new(possession1, possession2),
            shots_on_target: Pair::new(on_target1, on_target2),
            shots: Pair::new(shots1, shots2),
            passing_accuracy: Pair::new(passing1, passing2),
            fouls: Pair::new(t1.fouls.clamp(5, 20), t2.fouls.clamp(5, 20)),
            corners: Pair::new(t1.corners.min(12), t2.corners.min(12)),
            yellow_cards: Pair::new(t1.yellow_cards, t2.yellow_cards),
            red_cards: Pair::new(t1.red_cards, t2.red_cards),
            xg: Pair::new(t1.xg, t2.xg),
        };

        let result = MatchResult {
            team1: sim.team1.name.clone(),
            team2: sim.team2.name.clone(),
            final_score: Pair::new(t1.goals, t2.goals),
            duration: self.duration,
            timeline: self.timeline,
            box_score,
        };
        tracing::info!(
            score = %result.score_line(),
            minutes = result.duration,
            xg_home = t1.xg,
            xg_away = t2.xg,
            "match simulated"
        );
        result
    }

    fn passing(&mut self, stats: &StatSet) -> u32 {
        let jitter = (self.roll() - 0.5) * 6.0;
        (stats.passing_accuracy + jitter).round().clamp(60.0, 95.0) as u32
    }
}

fn context(occasion: Option<OccasionKind>, minute: u32, goal_diff: i32) -> ModifierContext {
    ModifierContext {
        occasion,
        minute,
        goal_diff,
    }
}

fn nonzero_or(value: f64, default: f64) -> f64 {
    if value == 0.0 { default } else { value }
}

fn round_u32(value: f64) -> u32 {
    value.round().max(0.0) as u32
}
