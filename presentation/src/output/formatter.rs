//! Output formatter trait

use crate::script::{ScriptSummary, StepResult};
use collab_domain::OutputFormat;

/// Trait for formatting script results
pub trait OutputFormatter {
    /// Format one executed line
    fn format_step(&self, step: &StepResult) -> String;

    /// Format the end-of-run totals
    fn format_summary(&self, summary: &ScriptSummary) -> String;
}

/// Formatter for the chosen output format
pub fn formatter_for(format: OutputFormat) -> Box<dyn OutputFormatter> {
    match format {
        OutputFormat::Text => Box::new(super::console::ConsoleFormatter),
        OutputFormat::Json => Box::new(super::json::JsonFormatter),
    }
}
