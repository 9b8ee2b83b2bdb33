use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde_json::{Map, Value};

use goal2goal::config::AppConfig;
use goal2goal::payload::{ExplanationRequest, MatchFile};
use goal2goal::session::Session;
use goal2goal::stats::{RawTeamInput, TeamInput};

fn main() -> Result<()> {
    let _ = dotenvy::from_filename(".env.local");
    let _ = dotenvy::from_filename(".env");
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();
    let config = AppConfig::from_env();

    let input = match parse_match_arg() {
        Some(path) => load_match_file(&path)?,
        None => demo_match(),
    };
    let seed = parse_u64_arg("--seed").or(config.sim_seed);

    let mut session = Session::with_seed(seed);
    if let Some(sim_config) = input.config.clone() {
        session
            .set_config(sim_config)
            .context("invalid simulation config")?;
    }
    let prediction = session
        .predict(&input.team1, &input.team2)
        .context("prediction rejected")?
        .clone();

    if has_flag("--trace") {
        for step in prediction.steps() {
            eprintln!("{step}");
        }
    }

    let simulation = if has_flag("--simulate") {
        Some(session.simulate()?)
    } else {
        None
    };

    let mut output = Map::new();
    output.insert(
        "prediction".to_string(),
        serde_json::to_value(&prediction).context("serialize prediction")?,
    );
    if let Some(result) = &simulation {
        output.insert(
            "simulation".to_string(),
            serde_json::to_value(result).context("serialize simulation")?,
        );
    }
    if has_flag("--explain") {
        let request = ExplanationRequest::from_prediction(&prediction);
        output.insert(
            "explanation_request".to_string(),
            serde_json::to_value(&request).context("serialize explanation request")?,
        );
        if !config.explanation_key_present {
            eprintln!("EXPLANATION_API_KEY not set; request printed only");
        }
        eprintln!("{}", request.prompt());
    }

    println!(
        "{}",
        serde_json::to_string_pretty(&Value::Object(output)).context("serialize output")?
    );
    eprintln!(
        "{} vs {}: BTTS {:.2}% ({}, {} confidence)",
        prediction.team1.name,
        prediction.team2.name,
        prediction.btts.final_probability,
        prediction.btts.recommended_model.label(),
        prediction.btts.confidence.label()
    );
    if let Some(result) = &simulation {
        eprintln!("Simulated: {}", result.score_line());
    }
    Ok(())
}

fn demo_match() -> MatchFile {
    let (home, away) = TeamInput::demo_pair();
    MatchFile {
        team1: RawTeamInput::from(&home),
        team2: RawTeamInput::from(&away),
        config: None,
    }
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
            return value.trim().parse().ok();
        }
        if arg == name {
            return args.get(idx + 1).and_then(|v| v.trim().parse().ok());
        }
    }
    None
}

fn has_flag(name: &str) -> bool {
    std::env::args().skip(1).any(|arg| arg == name)
}
