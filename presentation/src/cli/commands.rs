//! CLI command definitions

use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand, ValueEnum};
use collab_domain::{Dtu, DtuId};
use std::path::PathBuf;
use std::str::FromStr;

/// Output format for script results
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Colored, human-readable lines
    Text,
    /// One JSON object per line
    Json,
}

impl From<OutputFormat> for collab_domain::OutputFormat {
    fn from(format: OutputFormat) -> Self {
        match format {
            OutputFormat::Text => collab_domain::OutputFormat::Text,
            OutputFormat::Json => collab_domain::OutputFormat::Json,
        }
    }
}

/// A DTU to pre-load into the in-memory store, written `id:title`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DtuSeed {
    pub id: DtuId,
    pub title: String,
}

impl DtuSeed {
    pub fn into_dtu(self, now: DateTime<Utc>) -> Dtu {
        Dtu::new(self.id, self.title, now)
    }
}

impl FromStr for DtuSeed {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (id, title) = s.split_once(':').unwrap_or((s, ""));
        let id = id.trim();
        if id.is_empty() {
            return Err(format!("invalid DTU seed '{}': expected id:title", s));
        }
        Ok(Self {
            id: DtuId::new(id),
            title: title.trim().to_string(),
        })
    }
}

/// CLI arguments for dtu-collab
#[derive(Parser, Debug)]
#[command(name = "dtu-collab")]
#[command(author, version, about = "Collaborative revision and concurrent-editing engine")]
#[command(long_about = r#"
dtu-collab runs collaboration scripts against an in-memory engine:
workspaces with bounded rosters, threaded comments, vote-resolved revision
proposals and live edit sessions on DTUs.

Configuration files are loaded from (in priority order):
1. DTU_COLLAB_* environment variables (e.g. DTU_COLLAB_PROPOSALS__APPROVE_THRESHOLD=2)
2. --config <path>          Explicit config file
3. ./dtu-collab.toml        Project-level config
4. ~/.config/dtu-collab/config.toml   Global config

Example:
  dtu-collab run review.jsonl --seed-dtu dtu-1:"Heat pumps"
  dtu-collab --output json run review.jsonl
  dtu-collab show-config
"#)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Output format (overrides [output] format)
    #[arg(short, long, value_enum, global = true)]
    pub output: Option<OutputFormat>,

    /// Verbosity level (-v = info, -vv = debug, -vvv = trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Path to configuration file
    #[arg(long, value_name = "PATH", global = true)]
    pub config: Option<PathBuf>,

    /// Disable loading of configuration files
    #[arg(long, global = true)]
    pub no_config: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Write diagnostic logs to this file instead of stderr
    #[arg(long, value_name = "PATH", global = true)]
    pub log_file: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Execute a JSON-lines command script
    Run {
        /// Script file, one command object per line
        script: PathBuf,

        /// Pre-load a DTU into the store (can be specified multiple times)
        #[arg(long = "seed-dtu", value_name = "ID:TITLE")]
        seed_dtu: Vec<DtuSeed>,

        /// Append an audit record for every successful mutation
        #[arg(long, value_name = "PATH")]
        audit_log: Option<PathBuf>,

        /// Stop at the first failed or invalid line
        #[arg(long)]
        stop_on_error: bool,
    },

    /// Show configuration sources and the resolved configuration
    ShowConfig,
}
