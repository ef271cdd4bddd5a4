//! JSON-lines output: one object per step

use crate::output::formatter::OutputFormatter;
use crate::script::{ScriptSummary, StepOutcome, StepResult};
use serde_json::json;

pub struct JsonFormatter;

impl OutputFormatter for JsonFormatter {
    fn format_step(&self, step: &StepResult) -> String {
        let record = match &step.outcome {
            StepOutcome::Success(result) => json!({
                "line": step.line,
                "op": step.op,
                "ok": true,
                "result": result,
            }),
            StepOutcome::Failed(failure) => json!({
                "line": step.line,
                "op": step.op,
                "ok": false,
                "error": failure.error,
                "message": failure.message,
            }),
            StepOutcome::Invalid(invalid) => json!({
                "line": step.line,
                "ok": false,
                "error": "invalid_command",
                "message": invalid.to_string(),
            }),
        };
        record.to_string()
    }

    fn format_summary(&self, summary: &ScriptSummary) -> String {
        json!({ "summary": summary }).to_string()
    }
}
