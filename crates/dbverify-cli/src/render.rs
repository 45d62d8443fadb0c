//! Terminal and JSON rendering of suite reports and artifact metadata

use comfy_table::{Cell, Color, Table, presets::UTF8_FULL};
use dbverify_checks::{CheckStatus, GeneratorMetadata, SuiteReport};

/// Values longer than this are cut in the metadata listing
pub const MAX_VALUE_CHARS: usize = 80;

/// Per-check table followed by a summary line
pub fn report_text(report: &SuiteReport) -> String {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_header(vec!["Check", "Status", "Details", "ms"]);

    for outcome in &report.outcomes {
        table.add_row(vec![
            Cell::new(&outcome.name),
            Cell::new(outcome.status).fg(status_color(outcome.status)),
            Cell::new(&outcome.message),
            Cell::new(outcome.duration_ms),
        ]);
    }

    let mut out = String::new();
    if let Some(database) = &report.database {
        out.push_str(&format!("Database: {}\n", database));
    }
    out.push_str(&format!(
        "Started:  {}\n",
        report.started_at.format("%Y-%m-%d %H:%M:%S UTC")
    ));
    out.push_str(&table.to_string());
    out.push('\n');
    out.push_str(&summary_line(report));
    out.push('\n');
    out
}

pub fn report_json(report: &SuiteReport) -> anyhow::Result<String> {
    Ok(serde_json::to_string_pretty(report)?)
}

/// `N checks: a passed, b failed, c errored, d skipped (t ms)`
pub fn summary_line(report: &SuiteReport) -> String {
    format!(
        "{} checks: {} passed, {} failed, {} errored, {} skipped ({} ms)",
        report.outcomes.len(),
        report.passed(),
        report.failed(),
        report.errored(),
        report.skipped(),
        report.duration_ms
    )
}

fn status_color(status: CheckStatus) -> Color {
    match status {
        CheckStatus::Passed => Color::Green,
        CheckStatus::Failed => Color::Red,
        CheckStatus::Errored => Color::Magenta,
        CheckStatus::Skipped => Color::DarkGrey,
    }
}

/// Key/value listing of the marker table
pub fn metadata_text(metadata: &GeneratorMetadata) -> String {
    if metadata.is_empty() {
        return "No generator metadata recorded\n".to_string();
    }

    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_header(vec!["Key", "Value"]);
    for (key, value) in metadata.iter() {
        let shown = value.map(|v| truncate(v, MAX_VALUE_CHARS));
        table.add_row(vec![key.to_string(), shown.unwrap_or_else(|| "NULL".to_string())]);
    }

    let mut out = table.to_string();
    out.push('\n');
    if let Some(created) = metadata.created_at() {
        out.push_str(&format!("Created {}\n", created.to_rfc3339()));
    }
    out
}

/// Schema overview: one row per schema with its table and view counts
pub fn schema_overview_text(rows: &[(String, usize, usize)]) -> String {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_header(vec!["Schema", "Tables", "Views"]);
    for (schema, tables, views) in rows {
        table.add_row(vec![
            Cell::new(schema),
            Cell::new(tables),
            Cell::new(views),
        ]);
    }
    let mut out = table.to_string();
    out.push('\n');
    out
}

/// Cut `value` to at most `max` characters, marking the cut with an ellipsis
pub fn truncate(value: &str, max: usize) -> String {
    let single_line = value.replace(['\r', '\n'], " ");
    if single_line.chars().count() <= max {
        return single_line;
    }
    let kept: String = single_line.chars().take(max.saturating_sub(1)).collect();
    format!("{}…", kept)
}
