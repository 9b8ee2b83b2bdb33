use std::path::Path;

use anyhow::{Context, Result};
use rust_xlsxwriter::{Workbook, Worksheet};

use crate::btts::Prediction;
use crate::monte_carlo::MonteCarloReport;
use crate::simulator::MatchResult;
use crate::stats::StatField;

pub struct ExportReport {
    pub prediction_rows: usize,
    pub lambda_rows: usize,
    pub timeline_rows: usize,
    pub box_score_rows: usize,
    pub monte_carlo_rows: usize,
}

fn header(cols: &[&str]) -> Vec<String> {
    cols.iter().map(|c| c.to_string()).collect()
}

fn fmt2(value: f64) -> String {
    format!("{value:.2}")
}

pub fn export_report(
    path: &Path,
    prediction: &Prediction,
    simulation: Option<&MatchResult>,
    monte_carlo: Option<&MonteCarloReport>,
) -> Result<ExportReport> {
    let prediction_rows = prediction_rows(prediction);
    let lambda_rows = lambda_rows(prediction);

    let mut timeline_rows = vec![header(&["Minute", "Team", "Event", "Description", "xG"])];
    let mut box_rows = vec![header(&["Stat", "Home", "Away"])];
    if let Some(result) = simulation {
        box_rows.push(vec![
            "Final score".to_string(),
            result.final_score.home.to_string(),
            result.final_score.away.to_string(),
        ]);
        for event in &result.timeline {
            timeline_rows.push(vec![
                event.minute.to_string(),
                event.team.clone(),
                format!("{:?}", event.kind),
                event.description.clone(),
                event.xg.map(fmt2).unwrap_or_default(),
            ]);
        }
        for (label, home, away) in result.box_score.rows() {
            box_rows.push(vec![label.to_string(), home, away]);
        }
    }

    let mut mc_rows = vec![header(&["Metric", "Value"])];
    if let Some(report) = monte_carlo {
        mc_rows.extend(monte_carlo_rows(report));
    }

    let mut workbook = Workbook::new();
    {
        let sheet = workbook.add_worksheet();
        sheet.set_name("Prediction")?;
        write_rows(sheet, &prediction_rows)?;
    }
    {
        let sheet = workbook.add_worksheet();
        sheet.set_name("Lambda")?;
        write_rows(sheet, &lambda_rows)?;
    }
    {
        let sheet = workbook.add_worksheet();
        sheet.set_name("Timeline")?;
        write_rows(sheet, &timeline_rows)?;
    }
    {
        let sheet = workbook.add_worksheet();
        sheet.set_name("BoxScore")?;
        write_rows(sheet, &box_rows)?;
    }
    {
        let sheet = workbook.add_worksheet();
        sheet.set_name("MonteCarlo")?;
        write_rows(sheet, &mc_rows)?;
    }

    workbook
        .save(path)
        .with_context(|| format!("failed writing workbook to {}", path.display()))?;
    tracing::info!(path = %path.display(), "report exported");

    Ok(ExportReport {
        prediction_rows: prediction_rows.len().saturating_sub(1),
        lambda_rows: lambda_rows.len().saturating_sub(1),
        timeline_rows: timeline_rows.len().saturating_sub(1),
        box_score_rows: box_rows.len().saturating_sub(1),
        monte_carlo_rows: mc_rows.len().saturating_sub(1),
    })
}

fn prediction_rows(prediction: &Prediction) -> Vec<Vec<String>> {
    let t1 = &prediction.team1;
    let t2 = &prediction.team2;
    let btts = &prediction.btts;
    let mut rows = vec![header(&["Field", t1.name.as_str(), t2.name.as_str()])];
    for field in StatField::ALL {
        rows.push(vec![
            field.label().to_string(),
            fmt2(t1.stats.get(field)),
            fmt2(t2.stats.get(field)),
        ]);
    }
    rows.push(vec![
        "Lambda".to_string(),
        format!("{:.4}", t1.lambda.lambda),
        format!("{:.4}", t2.lambda.lambda),
    ]);
    rows.push(vec![
        "P(scores >= 1) %".to_string(),
        fmt2(t1.prob_scores),
        fmt2(t2.prob_scores),
    ]);
    let match_row = |label: &str, value: String| vec![label.to_string(), value, String::new()];
    rows.push(match_row("Poisson BTTS %", fmt2(btts.poisson_probability)));
    rows.push(match_row("Logistic BTTS %", fmt2(btts.logistic_probability)));
    rows.push(match_row("Model difference", fmt2(btts.model_difference)));
    rows.push(match_row("Final BTTS %", fmt2(btts.final_probability)));
    rows.push(match_row(
        "Recommended model",
        btts.recommended_model.label().to_string(),
    ));
    rows.push(match_row("Confidence", btts.confidence.label().to_string()));
    rows
}

fn lambda_rows(prediction: &Prediction) -> Vec<Vec<String>> {
    let mut rows = vec![header(&[
        "Team",
        "Stat",
        "Value",
        "Compared to",
        "Factor",
        "Adjustment",
    ])];
    for team in [&prediction.team1, &prediction.team2] {
        for step in &team.lambda.breakdown {
            rows.push(vec![
                team.name.clone(),
                step.stat.clone().unwrap_or_else(|| "base".to_string()),
                format!("{:.4}", step.raw_value),
                step.compared_to.map(fmt2).unwrap_or_default(),
                step.factor.map(|f| f.to_string()).unwrap_or_default(),
                format!("{:.4}", step.adjustment),
            ]);
        }
    }
    rows
}

fn monte_carlo_rows(report: &MonteCarloReport) -> Vec<Vec<String>> {
    let metric = |label: &str, value: String| vec![label.to_string(), value];
    let mut rows = vec![
        metric("Simulations", report.simulations.to_string()),
        metric("BTTS %", fmt2(report.btts.probability)),
        metric(
            "BTTS 95% interval",
            format!(
                "{} - {}",
                fmt2(report.btts.confidence_interval.lower),
                fmt2(report.btts.confidence_interval.upper)
            ),
        ),
        metric("Analytic BTTS %", fmt2(report.reference_btts)),
        metric("Team 1 win %", fmt2(report.results.team1_win)),
        metric("Draw %", fmt2(report.results.draw)),
        metric("Team 2 win %", fmt2(report.results.team2_win)),
        metric("Team 1 goals avg", fmt2(report.goals.team1_avg)),
        metric("Team 2 goals avg", fmt2(report.goals.team2_avg)),
        metric("Total goals avg", fmt2(report.goals.total_avg)),
        metric("Over 2.5 %", fmt2(report.over_under.over_2_5)),
        metric("Under 2.5 %", fmt2(report.over_under.under_2_5)),
        metric("Volatility", report.volatility.label.clone()),
    ];
    for line in &report.top_scorelines {
        rows.push(metric(&format!("Score {}", line.score), fmt2(line.probability)));
    }
    for bucket in &report.total_goals_distribution {
        rows.push(metric(
            &format!("{} total goals", bucket.goals),
            fmt2(bucket.probability),
        ));
    }
    rows
}

fn write_rows(worksheet: &mut Worksheet, rows: &[Vec<String>]) -> Result<()> {
    for (row_idx, row) in rows.iter().enumerate() {
        for (col_idx, value) in row.iter().enumerate() {
            worksheet
                .write_string(row_idx as u32, col_idx as u16, value)
                .with_context(|| format!("write cell ({row_idx},{col_idx})"))?;
        }
    }
    Ok(())
}
