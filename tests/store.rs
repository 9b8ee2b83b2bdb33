use rusqlite::Connection;

use goal2goal::btts::Prediction;
use goal2goal::stats::{StatSet, TeamInput};
use goal2goal::store::{init_schema, load_prediction, load_recent, open_db, save_prediction};

fn memory_db() -> Connection {
    let conn = Connection::open_in_memory().unwrap();
    init_schema(&conn).unwrap();
    conn
}

fn fixture(name1: &str, name2: &str, goals: f64) -> Prediction {
    let (mut home, mut away) = TeamInput::demo_pair();
    home.name = name1.to_string();
    away.name = name2.to_string();
    home.stats = StatSet {
        goals_scored: goals,
        ..home.stats
    };
    Prediction::build(&home, &away)
}

#[test]
fn recent_history_is_newest_first_and_limited() {
    let conn = memory_db();
    let mut ids = Vec::new();
    for (idx, name) in ["Ajax", "Benfica", "Celtic", "Dortmund"].iter().enumerate() {
        let prediction = fixture(name, "Rivals", 1.0 + idx as f64 * 0.5);
        ids.push(save_prediction(&conn, &prediction).unwrap());
    }
    assert!(ids.windows(2).all(|w| w[0] < w[1]));

    let rows = load_recent(&conn, 3).unwrap();
    assert_eq!(rows.len(), 3);
    let names: Vec<&str> = rows.iter().map(|r| r.team1_name.as_str()).collect();
    assert_eq!(names, vec!["Dortmund", "Celtic", "Benfica"]);
    assert_eq!(rows[0].id, ids[3]);

    assert_eq!(load_recent(&conn, 10).unwrap().len(), 4);
}

#[test]
fn history_rows_carry_model_summary() {
    let conn = memory_db();
    let prediction = fixture("Porto", "Lyon", 2.6);
    save_prediction(&conn, &prediction).unwrap();

    let row = load_recent(&conn, 1).unwrap().remove(0);
    assert_eq!(row.team2_name, "Lyon");
    assert_eq!(row.final_btts, prediction.btts.final_probability);
    assert_eq!(row.poisson_btts, prediction.btts.poisson_probability);
    assert_eq!(
        row.recommended_model,
        prediction.btts.recommended_model.label()
    );
    assert_eq!(row.confidence, prediction.btts.confidence.label());
    assert!(chrono::DateTime::parse_from_rfc3339(&row.created_at).is_ok());
}

#[test]
fn stored_payload_restores_the_whole_prediction() {
    let conn = memory_db();
    let prediction = fixture("Roma", "Sevilla", 1.8);
    let id = save_prediction(&conn, &prediction).unwrap();
    assert_eq!(load_prediction(&conn, id).unwrap(), Some(prediction));
    assert_eq!(load_prediction(&conn, id + 100).unwrap(), None);
}

#[test]
fn empty_database_has_no_history() {
    let conn = memory_db();
    assert!(load_recent(&conn, 5).unwrap().is_empty());
}

#[test]
fn open_db_creates_missing_directories() {
    let dir = std::env::temp_dir().join(format!("goal2goal-store-{}", std::process::id()));
    let path = dir.join("nested").join("predictions.sqlite");
    let conn = open_db(&path).unwrap();
    save_prediction(&conn, &fixture("Napoli", "Inter", 2.0)).unwrap();
    drop(conn);

    let reopened = open_db(&path).unwrap();
    assert_eq!(load_recent(&reopened, 10).unwrap().len(), 1);
    drop(reopened);
    let _ = std::fs::remove_dir_all(&dir);
}
