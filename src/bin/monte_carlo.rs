use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use goal2goal::config::AppConfig;
use goal2goal::monte_carlo::{self, MAX_SIMULATIONS, MIN_SIMULATIONS, MonteCarloRequest};
use goal2goal::payload::MatchFile;
use goal2goal::stats::{TeamInput, TeamSlot};

fn main() -> Result<()> {
    let _ = dotenvy::from_filename(".env.local");
    let _ = dotenvy::from_filename(".env");
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();
    let config = AppConfig::from_env();

    let (team1, team2) = match parse_match_arg() {
        Some(path) => {
            let input = load_match_file(&path)?;
            (
                input.team1.validate(TeamSlot::Team1)?,
                input.team2.validate(TeamSlot::Team2)?,
            )
        }
        None => TeamInput::demo_pair(),
    };
    let simulations = parse_u64_arg("--simulations")
        .map(|n| n.clamp(MIN_SIMULATIONS, MAX_SIMULATIONS))
        .unwrap_or(config.mc_simulations);
    let seed = parse_u64_arg("--seed")
        .or(config.mc_seed)
        .unwrap_or_else(rand::random);

    let request = MonteCarloRequest {
        team1,
        team2,
        simulations,
    };
    let report = monte_carlo::run(&request, seed)?;

    println!(
        "{}",
        serde_json::to_string_pretty(&report).context("serialize report")?
    );
    eprintln!(
        "{} vs {}: BTTS {:.2}% over {} runs (seed {seed}, analytic {:.2}%)",
        request.team1.name,
        request.team2.name,
        report.btts.probability,
        report.simulations,
        report.reference_btts
    );
    Ok(())
}

fn load_match_file(path: &Path) -> Result<MatchFile> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("read match file {}", path.display()))?;
    serde_json::from_str(&raw).with_context(|| format!("parse match file {}", path.display()))
}

fn parse_match_arg() -> Option<PathBuf> {
    let args = std::env::args().skip(1).collect::<Vec<_>>();
    for (idx, arg) in args.iter().enumerate() {
        if let Some(path) = arg.strip_prefix("--match=") {
            let trimmed = path.trim();
            if !trimmed.is_empty() {
                return Some(PathBuf::from(trimmed));
            }
        }
        if arg == "--match" {
            let Some(next) = args.get(idx + 1) else {
                continue;
            };
            if !next.trim().is_empty() {
                return Some(PathBuf::from(next));
            }
        }
    }
    None
}

fn parse_u64_arg(name: &str) -> Option<u64> {
    let args = std::env::args().skip(1).collect::<Vec<_>>();
    let prefix = format!("{name}=");
    for (idx, arg) in args.iter().enumerate() {
        if let Some(value) = arg.strip_prefix(&prefix) {
            return value.trim().replace('_', "").parse().ok();
        }
        if arg == name {
            return args
                .get(idx + 1)
                .and_then(|v| v.trim().replace('_', "").parse().ok());
        }
    }
    None
}
