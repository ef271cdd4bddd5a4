//! Output formatting for script results

pub mod console;
pub mod formatter;
pub mod json;
