//! Output formatting utilities for markdown and JSON.

use crate::types::DashboardSummary;
use anyhow::Result;

/// Output format for command-line reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum OutputFormat {
    #[default]
    Json,
    #[value(alias = "md")]
    Markdown,
}

/// Render the dashboard summary in the requested format.
pub fn format_summary(summary: &DashboardSummary, format: OutputFormat) -> Result<String> {
    match format {
        OutputFormat::Json => Ok(serde_json::to_string_pretty(summary)?),
        OutputFormat::Markdown => Ok(format_summary_markdown(summary)),
    }
}

/// Format the dashboard summary as markdown.
pub fn format_summary_markdown(summary: &DashboardSummary) -> String {
    let mut md = String::new();
    let overall = &summary.overall;

    md.push_str("# Task Completion\n\n");
    md.push_str(&format!("- **total**: {}\n", overall.total_tasks));
    md.push_str(&format!("- **completed**: {}\n", overall.completed_tasks));
    md.push_str(&format!("- **rate**: {:.2}%\n", overall.completion_rate));

    if summary.employees.is_empty() {
        return md;
    }

    md.push_str(&format!("\n## Employees ({})\n\n", summary.employees.len()));
    md.push_str("| Name | Position | Completed | Total | Rate |\n");
    md.push_str("|------|----------|-----------|-------|------|\n");
    for employee in &summary.employees {
        md.push_str(&format!(
            "| {} | {} | {} | {} | {:.2}% |\n",
            employee.name,
            employee.position,
            employee.completed_tasks,
            employee.total_tasks,
            employee.completion_rate,
        ));
    }

    md
}
