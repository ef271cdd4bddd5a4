//! Presentation layer for dtu-collab
//!
//! This crate contains CLI definitions, the JSON-lines script runner,
//! and output formatters.

pub mod cli;
pub mod output;
pub mod script;

// Re-export commonly used types
pub use cli::commands::{Cli, Command, DtuSeed, OutputFormat};
pub use output::console::ConsoleFormatter;
pub use output::formatter::{OutputFormatter, formatter_for};
pub use output::json::JsonFormatter;
pub use script::{ScriptCommand, ScriptError, ScriptRunner, ScriptSummary, StepOutcome, StepResult};
