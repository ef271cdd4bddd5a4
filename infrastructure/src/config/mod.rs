//! Configuration file loading for dtu-collab
//!
//! This module handles file I/O and merging of configuration from multiple sources.
//! The priority order (highest to lowest):
//!
//! 1. `DTU_COLLAB_*` environment variables
//! 2. `--config <path>` specified file
//! 3. Project root: `./dtu-collab.toml` or `./.dtu-collab.toml`
//! 4. XDG config: `$XDG_CONFIG_HOME/dtu-collab/config.toml`
//! 5. Default values

mod file_config;
mod loader;

pub use file_config::{
    FileCommentsConfig, FileConfig, FileOutputConfig, FileProposalsConfig, FileWorkspaceConfig,
};
pub use loader::ConfigLoader;
