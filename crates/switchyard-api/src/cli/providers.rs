//! `syard providers`: the provider catalog with live rate-limit budgets.

use anyhow::Result;
use comfy_table::{presets, Cell, Color, ContentArrangement, Table};
use console::style;
use serde::Serialize;

use switchyard_types::gateway::RateLimitInfo;
use switchyard_types::provider::{Provider, RateLimitPolicy};

use crate::state::AppState;

#[derive(Serialize)]
struct ProviderRow {
    #[serde(flatten)]
    provider: Provider,
    rate_limit_info: Option<RateLimitInfo>,
}

/// Print the catalog as a table, or as JSON with `--json`.
pub fn list_providers(state: &AppState, active_only: bool, json: bool) -> Result<()> {
    let registry = state.gateway.registry();
    let providers = if active_only {
        registry.list_active()
    } else {
        registry.list_all()
    };

    let rows: Vec<ProviderRow> = providers
        .into_iter()
        .map(|provider| -> Result<ProviderRow> {
            let rate_limit_info = state.gateway.rate_limit_info(&provider.id)?;
            Ok(ProviderRow {
                provider,
                rate_limit_info,
            })
        })
        .collect::<Result<_>>()?;

    if json {
        println!("{}", serde_json::to_string_pretty(&rows)?);
        return Ok(());
    }

    if rows.is_empty() {
        println!();
        println!(
            "  {} No providers configured. Add [[providers]] to {}.",
            style("i").blue().bold(),
            style(state.config_path.display()).cyan()
        );
        println!();
        return Ok(());
    }

    let mut table = Table::new();
    table.load_preset(presets::UTF8_FULL_CONDENSED);
    table.set_content_arrangement(ContentArrangement::Dynamic);

    table.set_header(vec![
        Cell::new("Provider").fg(Color::White),
        Cell::new("Name").fg(Color::White),
        Cell::new("Tier").fg(Color::White),
        Cell::new("Status").fg(Color::White),
        Cell::new("Models").fg(Color::White),
        Cell::new("Rate Limit").fg(Color::White),
        Cell::new("Remaining").fg(Color::White),
    ]);

    for row in &rows {
        let provider = &row.provider;
        let status_cell = if provider.is_active {
            Cell::new("active").fg(Color::Green)
        } else {
            Cell::new("inactive").fg(Color::DarkGrey)
        };

        let models = provider
            .models
            .iter()
            .map(|m| m.id.as_str())
            .collect::<Vec<_>>()
            .join(", ");

        let remaining_cell = match &row.rate_limit_info {
            Some(info) if info.remaining == 0 => Cell::new("0").fg(Color::Red),
            Some(info) => Cell::new(info.remaining).fg(Color::Green),
            None => Cell::new("-").fg(Color::DarkGrey),
        };

        table.add_row(vec![
            Cell::new(&provider.id).fg(Color::Cyan),
            Cell::new(&provider.name).fg(Color::White),
            Cell::new(provider.tier.to_string()).fg(Color::DarkGrey),
            status_cell,
            Cell::new(models).fg(Color::DarkGrey),
            Cell::new(format_policy(provider.rate_limit.as_ref())).fg(Color::White),
            remaining_cell,
        ]);
    }

    println!();
    println!("{table}");
    println!();
    println!(
        "  {} provider{}",
        style(rows.len()).bold(),
        if rows.len() == 1 { "" } else { "s" }
    );
    println!();

    Ok(())
}

/// `30/60s`, `100/500ms`, or `-` without a policy.
fn format_policy(policy: Option<&RateLimitPolicy>) -> String {
    match policy {
        Some(p) => format!("{}/{}", p.max_requests, format_window(p.window_ms)),
        None => "-".to_string(),
    }
}

fn format_window(window_ms: u64) -> String {
    if window_ms >= 1_000 && window_ms % 1_000 == 0 {
        format!("{}s", window_ms / 1_000)
    } else {
        format!("{window_ms}ms")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_policy() {
        assert_eq!(
            format_policy(Some(&RateLimitPolicy::new(30, 60_000))),
            "30/60s"
        );
        assert_eq!(format_policy(Some(&RateLimitPolicy::new(5, 1_500))), "5/1500ms");
        assert_eq!(format_policy(Some(&RateLimitPolicy::new(1, 0))), "1/0ms");
        assert_eq!(format_policy(None), "-");
    }
}
