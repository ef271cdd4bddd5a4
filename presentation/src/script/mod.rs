//! JSON-lines command scripts

pub mod command;
pub mod runner;

pub use command::ScriptCommand;
pub use runner::{
    InvalidLine, ScriptError, ScriptRunner, ScriptSummary, StepOutcome, StepResult,
};
