//! Infrastructure layer for dtu-collab
//!
//! This crate contains adapters that implement the ports defined
//! in the application layer, including configuration file loading.

pub mod config;
pub mod dtu;
pub mod logging;

// Re-export commonly used types
pub use config::{
    ConfigLoader, FileCommentsConfig, FileConfig, FileOutputConfig, FileProposalsConfig,
    FileWorkspaceConfig,
};
pub use dtu::InMemoryDtuStore;
pub use logging::JsonlAuditLogger;
