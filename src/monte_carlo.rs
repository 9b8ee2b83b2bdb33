use std::collections::BTreeMap;

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use rand_distr::{Distribution, Poisson};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::btts::bivariate_poisson;
use crate::error::{EstimateError, EstimateResult};
use crate::lambda::lambda_only;
use crate::stats::{TeamInput, TeamSlot};

pub const CHUNK_SIZE: u64 = 10_000;
pub const DEFAULT_SIMULATIONS: u64 = 1_000_000;
pub const MIN_SIMULATIONS: u64 = 1_000;
pub const MAX_SIMULATIONS: u64 = 5_000_000;
const TOP_SCORELINES: usize = 5;
const Z_95: f64 = 1.96;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonteCarloRequest {
    pub team1: TeamInput,
    pub team2: TeamInput,
    #[serde(default = "default_simulations")]
    pub simulations: u64,
}

fn default_simulations() -> u64 {
    DEFAULT_SIMULATIONS
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ConfidenceInterval {
    pub lower: f64,
    pub upper: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BttsSummary {
    pub probability: f64,
    pub confidence_interval: ConfidenceInterval,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Outcomes {
    pub team1_win: f64,
    pub draw: f64,
    pub team2_win: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GoalStats {
    pub team1_avg: f64,
    pub team1_std: f64,
    pub team2_avg: f64,
    pub team2_std: f64,
    pub total_avg: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OverUnder {
    pub over_2_5: f64,
    pub under_2_5: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scoreline {
    pub score: String,
    pub probability: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GoalsBucket {
    pub goals: u64,
    pub probability: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VolatilityLevel {
    Low,
    Medium,
    High,
}

impl VolatilityLevel {
    pub fn from_coefficient(cv: f64) -> Self {
        if cv < 0.45 {
            VolatilityLevel::Low
        } else if cv < 0.65 {
            VolatilityLevel::Medium
        } else {
            VolatilityLevel::High
        }
    }

    pub fn icon(self) -> &'static str {
        match self {
            VolatilityLevel::Low => "🟢",
            VolatilityLevel::Medium => "🟡",
            VolatilityLevel::High => "🔴",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            VolatilityLevel::Low => "Low volatility",
            VolatilityLevel::Medium => "Medium volatility",
            VolatilityLevel::High => "High volatility",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            VolatilityLevel::Low => "Goal totals cluster tightly around the average",
            VolatilityLevel::Medium => "Goal totals vary moderately from match to match",
            VolatilityLevel::High => "Goal totals swing widely, expect surprises",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Volatility {
    pub icon: String,
    pub label: String,
    pub description: String,
    /// Standard deviation of total goals.
    pub value: f64,
    /// Standard deviation over mean of total goals.
    pub coefficient: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonteCarloReport {
    pub simulations: u64,
    /// Analytic bivariate Poisson BTTS for comparison.
    pub reference_btts: f64,
    pub btts: BttsSummary,
    pub results: Outcomes,
    pub goals: GoalStats,
    pub over_under: OverUnder,
    pub top_scorelines: Vec<Scoreline>,
    pub total_goals_distribution: Vec<GoalsBucket>,
    pub volatility: Volatility,
}

/// Integer accumulators so merging chunks is exact and order independent.
#[derive(Debug, Clone, Default)]
struct Tally {
    trials: u64,
    btts: u64,
    team1_wins: u64,
    draws: u64,
    team2_wins: u64,
    over_2_5: u64,
    goals1: u64,
    goals1_sq: u128,
    goals2: u64,
    goals2_sq: u128,
    total_sq: u128,
    scorelines: BTreeMap<(u32, u32), u64>,
}

impl Tally {
    fn record(&mut self, home: u32, away: u32) {
        let (h, a) = (u64::from(home), u64::from(away));
        self.trials += 1;
        if home > 0 && away > 0 {
            self.btts += 1;
        }
        match home.cmp(&away) {
            std::cmp::Ordering::Greater => self.team1_wins += 1,
            std::cmp::Ordering::Equal => self.draws += 1,
            std::cmp::Ordering::Less => self.team2_wins += 1,
        }
        if h + a > 2 {
            self.over_2_5 += 1;
        }
        let (hw, aw) = (u128::from(h), u128::from(a));
        self.goals1 += h;
        self.goals1_sq += hw * hw;
        self.goals2 += a;
        self.goals2_sq += aw * aw;
        self.total_sq += (hw + aw) * (hw + aw);
        *self.scorelines.entry((home, away)).or_insert(0) += 1;
    }

    fn merge(mut self, other: Tally) -> Tally {
        self.trials += other.trials;
        self.btts += other.btts;
        self.team1_wins += other.team1_wins;
        self.draws += other.draws;
        self.team2_wins += other.team2_wins;
        self.over_2_5 += other.over_2_5;
        self.goals1 += other.goals1;
        self.goals1_sq += other.goals1_sq;
        self.goals2 += other.goals2;
        self.goals2_sq += other.goals2_sq;
        self.total_sq += other.total_sq;
        for (score, count) in other.scorelines {
            *self.scorelines.entry(score).or_insert(0) += count;
        }
        self
    }
}

/// Goal-count distributions for one request.
#[derive(Debug, Clone, Copy)]
struct Rates {
    team1: Poisson<f64>,
    team2: Poisson<f64>,
    shared: Poisson<f64>,
}

impl Rates {
    fn new(lambda1: f64, lambda2: f64, rho: f64) -> EstimateResult<Self> {
        let dist =
            |rate: f64| Poisson::new(rate).map_err(|_| EstimateError::UnsampleableRate(rate));
        Ok(Self {
            team1: dist(lambda1)?,
            team2: dist(lambda2)?,
            shared: dist(rho)?,
        })
    }
}

/// One Poisson draw as a goal count. Counts beyond `u32::MAX` saturate.
fn draw(dist: &Poisson<f64>, rng: &mut ChaCha8Rng) -> u32 {
    dist.sample(rng) as u32
}

/// Every chunk reads its own ChaCha stream of the same seed, so chunks never overlap
/// and neighbouring seeds do not share streams.
fn run_chunk(rates: Rates, seed: u64, index: u64, trials: u64) -> Tally {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    rng.set_stream(index);
    let mut tally = Tally::default();
    for _ in 0..trials {
        let shared = draw(&rates.shared, &mut rng);
        let home = draw(&rates.team1, &mut rng).saturating_add(shared);
        let away = draw(&rates.team2, &mut rng).saturating_add(shared);
        tally.record(home, away);
    }
    tally
}

fn percent(count: u64, total: u64) -> f64 {
    count as f64 / total as f64 * 100.0
}

fn mean_std(sum: u64, sum_sq: u128, n: u64) -> (f64, f64) {
    let n = n as f64;
    let mean = sum as f64 / n;
    let variance = (sum_sq as f64 / n - mean * mean).max(0.0);
    (mean, variance.sqrt())
}

/// Runs `request.simulations` trials. Results depend only on the inputs and `seed`,
/// not on the number of worker threads.
pub fn run(request: &MonteCarloRequest, seed: u64) -> EstimateResult<MonteCarloReport> {
    if request.simulations == 0 || request.simulations > MAX_SIMULATIONS {
        return Err(EstimateError::SimulationCount(request.simulations));
    }
    request.team1.stats.validate(TeamSlot::Team1)?;
    request.team2.stats.validate(TeamSlot::Team2)?;

    let s1 = &request.team1.stats;
    let s2 = &request.team2.stats;
    let lambda1 = lambda_only(s1, s2);
    let lambda2 = lambda_only(s2, s1);
    let reference = bivariate_poisson(lambda1, lambda2, s1, s2);
    let rates = Rates::new(lambda1, lambda2, reference.rho)?;

    let total = request.simulations;
    let chunks = total.div_ceil(CHUNK_SIZE);
    let tallies: Vec<Tally> = (0..chunks)
        .into_par_iter()
        .map(|index| {
            let start = index * CHUNK_SIZE;
            let trials = CHUNK_SIZE.min(total - start);
            run_chunk(rates, seed, index, trials)
        })
        .collect();
    let tally = tallies
        .into_iter()
        .fold(Tally::default(), Tally::merge);

    let report = summarize(&tally, reference.probability);
    tracing::info!(
        team1 = %request.team1.name,
        team2 = %request.team2.name,
        simulations = total,
        chunks,
        btts = report.btts.probability,
        "monte carlo finished"
    );
    Ok(report)
}

fn summarize(tally: &Tally, reference_btts: f64) -> MonteCarloReport {
    let n = tally.trials;
    let btts = percent(tally.btts, n);
    let share = tally.btts as f64 / n as f64;
    let margin = Z_95 * (share * (1.0 - share) / n as f64).sqrt() * 100.0;

    let (team1_avg, team1_std) = mean_std(tally.goals1, tally.goals1_sq, n);
    let (team2_avg, team2_std) = mean_std(tally.goals2, tally.goals2_sq, n);
    let (total_avg, total_std) = mean_std(tally.goals1 + tally.goals2, tally.total_sq, n);

    let mut ranked: Vec<(&(u32, u32), &u64)> = tally.scorelines.iter().collect();
    ranked.sort_by(|a, b| {
        b.1.cmp(a.1)
            .then_with(|| score_text(a.0).cmp(&score_text(b.0)))
    });
    let top_scorelines = ranked
        .into_iter()
        .take(TOP_SCORELINES)
        .map(|(score, count)| Scoreline {
            score: score_text(score),
            probability: percent(*count, n),
        })
        .collect();

    let mut totals: BTreeMap<u64, u64> = BTreeMap::new();
    for ((home, away), count) in &tally.scorelines {
        *totals.entry(u64::from(*home) + u64::from(*away)).or_insert(0) += count;
    }
    let total_goals_distribution = totals
        .into_iter()
        .map(|(goals, count)| GoalsBucket {
            goals,
            probability: percent(count, n),
        })
        .collect();

    let coefficient = if total_avg > 0.0 {
        total_std / total_avg
    } else {
        0.0
    };
    let level = VolatilityLevel::from_coefficient(coefficient);

    MonteCarloReport {
        simulations: n,
        reference_btts,
        btts: BttsSummary {
            probability: btts,
            confidence_interval: ConfidenceInterval {
                lower: (btts - margin).clamp(0.0, 100.0),
                upper: (btts + margin).clamp(0.0, 100.0),
            },
        },
        results: Outcomes {
            team1_win: percent(tally.team1_wins, n),
            draw: percent(tally.draws, n),
            team2_win: percent(tally.team2_wins, n),
        },
        goals: GoalStats {
            team1_avg,
            team1_std,
            team2_avg,
            team2_std,
            total_avg,
        },
        over_under: OverUnder {
            over_2_5: percent(tally.over_2_5, n),
            under_2_5: percent(n - tally.over_2_5, n),
        },
        top_scorelines,
        total_goals_distribution,
        volatility: Volatility {
            icon: level.icon().to_string(),
            label: level.label().to_string(),
            description: level.description().to_string(),
            value: total_std,
            coefficient,
        },
    }
}

fn score_text(score: &(u32, u32)) -> String {
    format!("{}-{}", score.0, score.1)
}
