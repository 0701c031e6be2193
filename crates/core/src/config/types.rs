use serde::{Deserialize, Serialize};

use crate::converter::{AudioFormat, ConversionParams, ConverterConfig, OverwritePolicy};

/// Root configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub export: ExportConfig,
    /// Encoder settings. Unset fields fall back to the target format's defaults.
    #[serde(default)]
    pub conversion: ConversionParams,
    #[serde(default)]
    pub converter: ConverterConfig,
}

/// Tree export configuration
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct ExportConfig {
    /// Target format for media files.
    #[serde(default)]
    pub format: AudioFormat,
    /// Copy files that are not media, like artwork and booklets.
    #[serde(default = "default_copy_unknown")]
    pub copy_unknown: bool,
    /// Policy for output files that already exist.
    #[serde(default)]
    pub overwrite: OverwritePolicy,
    /// Maximum concurrent tasks. 0 uses the CPU count.
    #[serde(default)]
    pub max_jobs: usize,
    /// Maximum queued tasks. 0 uses max(max_jobs, 100).
    #[serde(default)]
    pub max_queue: usize,
    /// Replacement for reserved characters in output paths. Unset or empty
    /// leaves output paths as they are.
    #[serde(default)]
    pub clean_paths: Option<String>,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            format: AudioFormat::default(),
            copy_unknown: default_copy_unknown(),
            overwrite: OverwritePolicy::default(),
            max_jobs: 0,
            max_queue: 0,
            clean_paths: None,
        }
    }
}

fn default_copy_unknown() -> bool {
    true
}

impl Config {
    /// Encoder settings for the export format, with its defaults filled in.
    pub fn effective_params(&self) -> ConversionParams {
        self.conversion
            .clone()
            .with_defaults(&self.export.format.default_params())
    }
}
