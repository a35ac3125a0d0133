//! CLI output formatting

use crate::engine::{AgentEvaluation, ValidationReport};
use console::Emoji;

// Re-export style
pub use console::style;

// Emojis for output
pub static CHECK: Emoji<'_, '_> = Emoji("✅ ", "✓ ");
pub static CROSS: Emoji<'_, '_> = Emoji("❌ ", "✗ ");
pub static INFO: Emoji<'_, '_> = Emoji("ℹ️  ", "i ");
pub static WARN: Emoji<'_, '_> = Emoji("⚠️  ", "!");

/// Format a validation report, one issue per line
pub fn format_report(report: &ValidationReport) -> String {
    if report.is_valid() {
        return format!(
            "{} Project {} is valid",
            CHECK,
            style(report.project()).bold()
        );
    }

    let mut lines = vec![format!(
        "{} Project {} has {} issue(s):",
        CROSS,
        style(report.project()).bold(),
        style(report.len()).red()
    )];
    for issue in report.issues() {
        lines.push(format!(
            "  {} {}",
            style(&issue.location).cyan(),
            style(&issue.error).dim()
        ));
    }
    lines.join("\n")
}

/// Format one agent verdict
pub fn format_agent(evaluation: &AgentEvaluation) -> String {
    if evaluation.outcome.eligible {
        return format!("{} {}", CHECK, style(&evaluation.agent_id).green());
    }

    let failed = evaluation
        .outcome
        .failed
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ");
    format!(
        "{} {} (failed: {})",
        CROSS,
        style(&evaluation.agent_id).red(),
        style(failed).dim()
    )
}

/// Format a trigger decision for one pipeline
pub fn format_trigger(pipeline_id: &str, triggered: bool) -> String {
    if triggered {
        format!("{} {}", CHECK, style(pipeline_id).green())
    } else {
        format!("{} {}", style("-").dim(), style(pipeline_id).dim())
    }
}
