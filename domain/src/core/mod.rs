//! Core domain concepts shared across all subdomains.
//!
//! - [`error::CollabError`]: the error taxonomy every operation reports
//! - [`ids`]: identifier value objects

pub mod error;
pub mod ids;
