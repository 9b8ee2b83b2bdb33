use std::env;
use std::path::PathBuf;
use std::time::Duration;

use crate::monte_carlo::{DEFAULT_SIMULATIONS, MAX_SIMULATIONS, MIN_SIMULATIONS};

const CACHE_DIR: &str = "goal2goal";
const DB_FILE: &str = "predictions.sqlite";
const LOG_FILE: &str = "goal2goal.log";

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub sim_seed: Option<u64>,
    pub mc_simulations: u64,
    pub mc_seed: Option<u64>,
    pub db_path: PathBuf,
    pub export_dir: PathBuf,
    pub reveal_delay: Duration,
    pub log_file: PathBuf,
    pub explanation_key_present: bool,
}

impl AppConfig {
    /// Reads the process environment. Call after loading `.env` files.
    pub fn from_env() -> Self {
        let sim_seed = opt_env("SIM_SEED").and_then(|val| val.parse::<u64>().ok());
        let mc_simulations = env::var("MC_SIMULATIONS")
            .ok()
            .and_then(|val| val.replace('_', "").parse::<u64>().ok())
            .unwrap_or(DEFAULT_SIMULATIONS)
            .clamp(MIN_SIMULATIONS, MAX_SIMULATIONS);
        let mc_seed = opt_env("MC_SEED").and_then(|val| val.parse::<u64>().ok());
        let db_path = opt_env("PREDICTIONS_DB_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(default_db_path);
        let export_dir = opt_env("EXPORT_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("."));
        let reveal_delay = Duration::from_millis(
            env::var("REVEAL_MS")
                .ok()
                .and_then(|val| val.parse::<u64>().ok())
                .unwrap_or(120)
                .clamp(10, 2000),
        );
        let log_file = opt_env("LOG_FILE")
            .map(PathBuf::from)
            .unwrap_or_else(default_log_path);
        let explanation_key_present = opt_env("EXPLANATION_API_KEY").is_some();

        Self {
            sim_seed,
            mc_simulations,
            mc_seed,
            db_path,
            export_dir,
            reveal_delay,
            log_file,
            explanation_key_present,
        }
    }
}

fn opt_env(key: &str) -> Option<String> {
    env::var(key)
        .ok()
        .and_then(|val| if val.trim().is_empty() { None } else { Some(val) })
}

/// `$XDG_CACHE_HOME/goal2goal`, else `~/.cache/goal2goal`.
pub fn cache_dir() -> Option<PathBuf> {
    if let Ok(base) = env::var("XDG_CACHE_HOME") {
        if !base.trim().is_empty() {
            return Some(PathBuf::from(base).join(CACHE_DIR));
        }
    }
    let home = env::var("HOME").ok()?;
    if home.trim().is_empty() {
        return None;
    }
    Some(PathBuf::from(home).join(".cache").join(CACHE_DIR))
}

fn default_db_path() -> PathBuf {
    cache_dir()
        .map(|dir| dir.join(DB_FILE))
        .unwrap_or_else(|| PathBuf::from(DB_FILE))
}

fn default_log_path() -> PathBuf {
    cache_dir()
        .map(|dir| dir.join(LOG_FILE))
        .unwrap_or_else(|| PathBuf::from(LOG_FILE))
}
