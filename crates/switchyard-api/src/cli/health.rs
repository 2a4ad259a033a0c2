//! `syard health`: probe provider endpoints.

use std::time::Duration;

use anyhow::Result;
use comfy_table::{presets, Cell, Color, ContentArrangement, Table};
use console::style;
use indicatif::{ProgressBar, ProgressStyle};

use switchyard_types::gateway::HealthReport;

use crate::state::AppState;

/// Check one provider or all of them and print the reports.
pub async fn health(state: &AppState, provider_id: Option<&str>, json: bool) -> Result<()> {
    let spinner = if json {
        None
    } else {
        let spinner = ProgressBar::new_spinner();
        spinner.set_style(
            ProgressStyle::default_spinner()
                .template("  {spinner:.cyan} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner()),
        );
        spinner.set_message("probing providers...");
        spinner.enable_steady_tick(Duration::from_millis(80));
        Some(spinner)
    };

    let reports = match provider_id {
        Some(id) => vec![state.gateway.health_check(id).await],
        None => state.gateway.health_check_all().await,
    };

    if let Some(spinner) = spinner {
        spinner.finish_and_clear();
    }

    if json {
        println!("{}", serde_json::to_string_pretty(&reports)?);
        return Ok(());
    }

    let mut table = Table::new();
    table.load_preset(presets::UTF8_FULL_CONDENSED);
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec![
        Cell::new("").fg(Color::White),
        Cell::new("Provider").fg(Color::White),
        Cell::new("Active").fg(Color::White),
        Cell::new("Reachable").fg(Color::White),
        Cell::new("Detail").fg(Color::White),
    ]);

    for report in &reports {
        let mark = if report.is_healthy {
            Cell::new("✓").fg(Color::Green)
        } else {
            Cell::new("✗").fg(Color::Red)
        };
        table.add_row(vec![
            mark,
            Cell::new(&report.provider_id).fg(Color::Cyan),
            flag_cell(report, "is_active"),
            flag_cell(report, "can_connect"),
            Cell::new(detail(report)).fg(Color::DarkGrey),
        ]);
    }

    let healthy = reports.iter().filter(|r| r.is_healthy).count();
    println!();
    println!("{table}");
    println!();
    println!(
        "  {}/{} healthy",
        style(healthy).bold(),
        style(reports.len()).bold()
    );
    println!();

    Ok(())
}

fn flag_cell(report: &HealthReport, key: &str) -> Cell {
    match report.details.get(key).and_then(|v| v.as_bool()) {
        Some(true) => Cell::new("yes").fg(Color::Green),
        Some(false) => Cell::new("no").fg(Color::Yellow),
        None => Cell::new("-").fg(Color::DarkGrey),
    }
}

/// Error text for failed checks, truncated for the table.
fn detail(report: &HealthReport) -> String {
    let text = report
        .details
        .get("error")
        .and_then(|v| v.as_str())
        .unwrap_or("");
    if text.chars().count() > 60 {
        let cut: String = text.chars().take(57).collect();
        format!("{cut}...")
    } else {
        text.to_string()
    }
}
