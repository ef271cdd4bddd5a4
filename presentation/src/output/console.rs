//! Console output formatter for script results

use crate::output::formatter::OutputFormatter;
use crate::script::{ScriptSummary, StepOutcome, StepResult};
use collab_domain::{ConfigIssue, Severity};
use colored::Colorize;

/// Formats script results for console display
pub struct ConsoleFormatter;

impl ConsoleFormatter {
    pub fn format_step(step: &StepResult) -> String {
        let location = format!("L{:<3}", step.line).dimmed();
        match &step.outcome {
            StepOutcome::Success(result) => {
                let body = serde_json::to_string_pretty(result).unwrap_or_default();
                format!(
                    "{} {} {}\n{}",
                    "ok".green().bold(),
                    location,
                    step.op.unwrap_or("?").cyan(),
                    Self::indent(&body, "    ")
                )
            }
            StepOutcome::Failed(failure) => format!(
                "{} {} {}: {}",
                failure.error.red().bold(),
                location,
                step.op.unwrap_or("?").cyan(),
                failure.message
            ),
            StepOutcome::Invalid(invalid) => format!(
                "{} {} {}",
                "invalid".yellow().bold(),
                location,
                invalid
            ),
        }
    }

    pub fn format_summary(summary: &ScriptSummary) -> String {
        let line = "-".repeat(40);
        format!(
            "{}\n{} {} succeeded, {} failed, {} invalid",
            line.dimmed(),
            "Summary:".cyan().bold(),
            summary.succeeded.to_string().green(),
            summary.failed.to_string().red(),
            summary.invalid.to_string().yellow()
        )
    }

    /// Format configuration issues, errors first
    pub fn format_issues(issues: &[ConfigIssue]) -> String {
        let mut sorted: Vec<&ConfigIssue> = issues.iter().collect();
        sorted.sort_by_key(|i| i.severity != Severity::Error);
        sorted
            .iter()
            .map(|issue| match issue.severity {
                Severity::Error => format!("{} {}", "error:".red().bold(), issue.message),
                Severity::Warning => format!("{} {}", "warning:".yellow().bold(), issue.message),
            })
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Indent a multi-line string
    pub fn indent(text: &str, prefix: &str) -> String {
        text.lines()
            .map(|line| format!("{}{}", prefix, line))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

impl OutputFormatter for ConsoleFormatter {
    fn format_step(&self, step: &StepResult) -> String {
        Self::format_step(step)
    }

    fn format_summary(&self, summary: &ScriptSummary) -> String {
        Self::format_summary(summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use collab_domain::CollabError;
    use serde_json::json;

    fn plain() {
        colored::control::set_override(false);
    }

    #[test]
    fn test_success_includes_op_and_body() {
        plain();
        let step = StepResult {
            line: 3,
            op: Some("create_workspace"),
            outcome: StepOutcome::Success(json!({ "name": "Research" })),
        };
        let text = ConsoleFormatter::format_step(&step);
        assert!(text.starts_with("ok L3"));
        assert!(text.contains("create_workspace"));
        assert!(text.contains("    \"name\": \"Research\""));
    }

    #[test]
    fn test_failure_shows_code_and_message() {
        plain();
        let step = StepResult {
            line: 5,
            op: Some("add_workspace_member"),
            outcome: StepOutcome::Failed(
                CollabError::CapacityExceeded("workspace is full".into()).to_failure(),
            ),
        };
        let text = ConsoleFormatter::format_step(&step);
        assert!(text.starts_with("capacity_exceeded"));
        assert!(text.ends_with("add_workspace_member: workspace is full"));
    }

    #[test]
    fn test_issues_errors_first() {
        plain();
        let issues = vec![
            ConfigIssue::invalid_enum("workspace.default_visibility", "x", &["private"], "private"),
            ConfigIssue::zero_value("proposals.approve_threshold"),
        ];
        let text = ConsoleFormatter::format_issues(&issues);
        assert!(text.lines().next().unwrap().starts_with("error:"));
        assert!(text.lines().nth(1).unwrap().starts_with("warning:"));
    }

    #[test]
    fn test_indent() {
        assert_eq!(ConsoleFormatter::indent("a\nb", "> "), "> a\n> b");
    }
}
