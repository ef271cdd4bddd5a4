//! Script result rendering from TOML (`[output]` section)

use collab_domain::OutputFormat;
use serde::{Deserialize, Serialize};

/// How `dtu-collab run` prints step results and the closing summary
///
/// ```toml
/// [output]
/// format = "json"   # "text" (default) or "json", one object per step
/// color = false     # plain text even on a terminal
/// ```
///
/// `--output` and `--no-color` on the command line take precedence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileOutputConfig {
    /// Unset means "text" unless `--output` says otherwise
    pub format: Option<OutputFormat>,
    pub color: bool,
}

impl Default for FileOutputConfig {
    fn default() -> Self {
        Self {
            format: None,
            color: true,
        }
    }
}

impl FileOutputConfig {
    /// Format for step results: the CLI flag, then this section, then text.
    pub fn resolve_format(&self, flag: Option<OutputFormat>) -> OutputFormat {
        flag.or(self.format).unwrap_or_default()
    }

    /// Whether text output may be colored.
    pub fn use_color(&self, no_color_flag: bool) -> bool {
        self.color && !no_color_flag
    }
}
