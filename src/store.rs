use std::path::Path;

use anyhow::{Context, Result};
use chrono::Utc;
use rusqlite::{Connection, OptionalExtension, params};

use crate::btts::Prediction;

/// Number of rows the history view shows.
pub const DEFAULT_HISTORY_LIMIT: usize = 10;

/// One row of the prediction history.
#[derive(Debug, Clone, PartialEq)]
pub struct SavedPrediction {
    pub id: i64,
    pub team1_name: String,
    pub team2_name: String,
    pub poisson_btts: f64,
    pub logistic_btts: f64,
    pub final_btts: f64,
    pub recommended_model: String,
    pub confidence: String,
    pub created_at: String,
}

pub fn open_db(path: &Path) -> Result<Connection> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).ok();
    }
    let conn =
        Connection::open(path).with_context(|| format!("open sqlite db {}", path.display()))?;
    init_schema(&conn)?;
    Ok(conn)
}

pub fn init_schema(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        r#"
        PRAGMA journal_mode = WAL;
        CREATE TABLE IF NOT EXISTS predictions (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            team1_name TEXT NOT NULL,
            team2_name TEXT NOT NULL,
            team1_goals_scored REAL NOT NULL,
            team1_goals_conceded REAL NOT NULL,
            team1_possession REAL NOT NULL,
            team1_shots_on_target REAL NOT NULL,
            team1_passing_accuracy REAL NOT NULL,
            team2_goals_scored REAL NOT NULL,
            team2_goals_conceded REAL NOT NULL,
            team2_possession REAL NOT NULL,
            team2_shots_on_target REAL NOT NULL,
            team2_passing_accuracy REAL NOT NULL,
            team1_lambda REAL NOT NULL,
            team2_lambda REAL NOT NULL,
            poisson_btts REAL NOT NULL,
            logistic_btts REAL NOT NULL,
            final_btts REAL NOT NULL,
            recommended_model TEXT NOT NULL,
            confidence TEXT NOT NULL,
            payload_json TEXT NOT NULL,
            created_at TEXT NOT NULL
        );
        CREATE INDEX IF NOT EXISTS idx_predictions_created_at ON predictions(created_at);
        "#,
    )
    .context("init predictions schema")?;
    Ok(())
}

/// Stores the prediction with its full JSON payload and returns the new row id.
pub fn save_prediction(conn: &Connection, prediction: &Prediction) -> Result<i64> {
    let payload = serde_json::to_string(prediction).context("serialize prediction")?;
    let s1 = &prediction.team1.stats;
    let s2 = &prediction.team2.stats;
    let btts = &prediction.btts;
    conn.execute(
        r#"
        INSERT INTO predictions (
            team1_name, team2_name,
            team1_goals_scored, team1_goals_conceded, team1_possession,
            team1_shots_on_target, team1_passing_accuracy,
            team2_goals_scored, team2_goals_conceded, team2_possession,
            team2_shots_on_target, team2_passing_accuracy,
            team1_lambda, team2_lambda,
            poisson_btts, logistic_btts, final_btts,
            recommended_model, confidence, payload_json, created_at
        ) VALUES (
            ?1, ?2,
            ?3, ?4, ?5,
            ?6, ?7,
            ?8, ?9, ?10,
            ?11, ?12,
            ?13, ?14,
            ?15, ?16, ?17,
            ?18, ?19, ?20, ?21
        )
        "#,
        params![
            prediction.team1.name,
            prediction.team2.name,
            s1.goals_scored,
            s1.goals_conceded,
            s1.possession,
            s1.shots_on_target,
            s1.passing_accuracy,
            s2.goals_scored,
            s2.goals_conceded,
            s2.possession,
            s2.shots_on_target,
            s2.passing_accuracy,
            prediction.team1.lambda.lambda,
            prediction.team2.lambda.lambda,
            btts.poisson_probability,
            btts.logistic_probability,
            btts.final_probability,
            btts.recommended_model.label(),
            btts.confidence.label(),
            payload,
            Utc::now().to_rfc3339(),
        ],
    )
    .context("insert prediction")?;
    let id = conn.last_insert_rowid();
    tracing::info!(
        id,
        team1 = %prediction.team1.name,
        team2 = %prediction.team2.name,
        "prediction saved"
    );
    Ok(id)
}

/// Newest first.
pub fn load_recent(conn: &Connection, limit: usize) -> Result<Vec<SavedPrediction>> {
    let mut stmt = conn
        .prepare(
            r#"
            SELECT id, team1_name, team2_name, poisson_btts, logistic_btts, final_btts,
                   recommended_model, confidence, created_at
            FROM predictions
            ORDER BY id DESC
            LIMIT ?1
            "#,
        )
        .context("prepare recent predictions query")?;
    let rows = stmt
        .query_map(params![limit as i64], |row| {
            Ok(SavedPrediction {
                id: row.get(0)?,
                team1_name: row.get(1)?,
                team2_name: row.get(2)?,
                poisson_btts: row.get(3)?,
                logistic_btts: row.get(4)?,
                final_btts: row.get(5)?,
                recommended_model: row.get(6)?,
                confidence: row.get(7)?,
                created_at: row.get(8)?,
            })
        })
        .context("query recent predictions")?;

    let mut out = Vec::new();
    for row in rows {
        out.push(row.context("decode prediction row")?);
    }
    Ok(out)
}

/// Full prediction from its stored payload, if the id exists.
pub fn load_prediction(conn: &Connection, id: i64) -> Result<Option<Prediction>> {
    let payload: Option<String> = conn
        .query_row(
            "SELECT payload_json FROM predictions WHERE id = ?1",
            params![id],
            |row| row.get(0),
        )
        .optional()
        .with_context(|| format!("load prediction {id}"))?;
    payload
        .map(|text| {
            serde_json::from_str(&text).with_context(|| format!("decode prediction {id} payload"))
        })
        .transpose()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stats::TeamInput;

    #[test]
    fn save_and_reload_round_trips_payload() {
        let conn = Connection::open_in_memory().unwrap();
        init_schema(&conn).unwrap();
        let (home, away) = TeamInput::demo_pair();
        let prediction = Prediction::build(&home, &away);
        let id = save_prediction(&conn, &prediction).unwrap();
        assert_eq!(load_prediction(&conn, id).unwrap(), Some(prediction));
        assert_eq!(load_prediction(&conn, id + 1).unwrap(), None);
    }
}
