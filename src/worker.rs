use std::path::{Path, PathBuf};
use std::sync::mpsc::{Receiver, Sender};
use std::thread;

use rusqlite::Connection;

use crate::export;
use crate::monte_carlo;
use crate::state::{Delta, WorkerCommand};
use crate::store;

pub fn spawn_worker(tx: Sender<Delta>, cmd_rx: Receiver<WorkerCommand>, db_path: PathBuf) {
    thread::spawn(move || {
        let mut conn: Option<Connection> = None;

        for cmd in cmd_rx {
            match cmd {
                WorkerCommand::MonteCarlo {
                    request,
                    seed,
                    generation,
                } => {
                    let delta = match monte_carlo::run(&request, seed) {
                        Ok(report) => Delta::MonteCarloDone { generation, report },
                        Err(err) => Delta::MonteCarloFailed {
                            generation,
                            error: err.to_string(),
                        },
                    };
                    let _ = tx.send(delta);
                }
                WorkerCommand::Save(prediction) => {
                    let saved = connection(&mut conn, &db_path)
                        .and_then(|conn| store::save_prediction(conn, &prediction));
                    match saved {
                        Ok(id) => {
                            let _ = tx.send(Delta::Saved { id });
                        }
                        Err(err) => {
                            tracing::error!(error = %err, "save prediction failed");
                            let _ = tx.send(Delta::Log(format!("[WARN] Save failed: {err:#}")));
                        }
                    }
                }
                WorkerCommand::LoadHistory { limit } => {
                    let loaded = connection(&mut conn, &db_path)
                        .and_then(|conn| store::load_recent(conn, limit));
                    match loaded {
                        Ok(rows) => {
                            let _ = tx.send(Delta::HistoryLoaded(rows));
                        }
                        Err(err) => {
                            tracing::error!(error = %err, "load history failed");
                            let _ =
                                tx.send(Delta::Log(format!("[WARN] History failed: {err:#}")));
                        }
                    }
                }
                WorkerCommand::LoadPrediction { id } => {
                    let loaded = connection(&mut conn, &db_path)
                        .and_then(|conn| store::load_prediction(conn, id));
                    let delta = match loaded {
                        Ok(Some(prediction)) => Delta::PredictionLoaded { id, prediction },
                        Ok(None) => Delta::Log(format!("[WARN] Saved prediction #{id} not found")),
                        Err(err) => {
                            tracing::error!(error = %err, id, "load prediction failed");
                            Delta::Log(format!("[WARN] Restore failed: {err:#}"))
                        }
                    };
                    let _ = tx.send(delta);
                }
                WorkerCommand::Export {
                    path,
                    prediction,
                    simulation,
                    monte_carlo,
                } => {
                    let exported = export::export_report(
                        &path,
                        &prediction,
                        simulation.as_ref(),
                        monte_carlo.as_ref(),
                    );
                    match exported {
                        Ok(report) => {
                            let rows = report.prediction_rows
                                + report.lambda_rows
                                + report.timeline_rows
                                + report.box_score_rows
                                + report.monte_carlo_rows;
                            let _ = tx.send(Delta::Exported {
                                path: path.display().to_string(),
                                rows,
                            });
                        }
                        Err(err) => {
                            tracing::error!(error = %err, "export failed");
                            let _ = tx.send(Delta::Log(format!("[WARN] Export failed: {err:#}")));
                        }
                    }
                }
            }
        }
    });
}

/// Opens the database on first use and keeps it for later commands.
fn connection<'a>(
    conn: &'a mut Option<Connection>,
    path: &Path,
) -> anyhow::Result<&'a Connection> {
    if conn.is_none() {
        *conn = Some(store::open_db(path)?);
    }
    conn.as_ref()
        .ok_or_else(|| anyhow::anyhow!("database unavailable"))
}
