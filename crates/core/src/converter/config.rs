//! Configuration for the converter module.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Configuration for the FFmpeg-based converter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConverterConfig {
    /// Path to ffmpeg binary.
    #[serde(default = "default_ffmpeg_path")]
    pub ffmpeg_path: PathBuf,

    /// Timeout for a single run in seconds. 0 disables the timeout.
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,

    /// FFmpeg log level (quiet, panic, fatal, error, warning, info, verbose, debug, trace).
    #[serde(default = "default_log_level")]
    pub ffmpeg_log_level: String,

    /// Additional ffmpeg arguments, placed before the output file.
    #[serde(default)]
    pub extra_ffmpeg_args: Vec<String>,

    /// Run ffmpeg on the caller's terminal instead of capturing its output.
    #[serde(default)]
    pub attach_stdio: bool,
}

fn default_ffmpeg_path() -> PathBuf {
    PathBuf::from("ffmpeg")
}

fn default_timeout() -> u64 {
    3600 // 1 hour
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for ConverterConfig {
    fn default() -> Self {
        Self {
            ffmpeg_path: default_ffmpeg_path(),
            timeout_secs: default_timeout(),
            ffmpeg_log_level: default_log_level(),
            extra_ffmpeg_args: Vec::new(),
            attach_stdio: false,
        }
    }
}

impl ConverterConfig {
    /// Creates a new config with a custom ffmpeg path.
    pub fn with_ffmpeg_path(ffmpeg_path: impl Into<PathBuf>) -> Self {
        Self {
            ffmpeg_path: ffmpeg_path.into(),
            ..Default::default()
        }
    }

    /// Sets the timeout in seconds.
    pub fn with_timeout(mut self, timeout_secs: u64) -> Self {
        self.timeout_secs = timeout_secs;
        self
    }

    /// Attaches ffmpeg to the caller's standard streams.
    pub fn with_attached_stdio(mut self, attach: bool) -> Self {
        self.attach_stdio = attach;
        self
    }

    /// The run timeout, if enabled.
    pub fn timeout(&self) -> Option<Duration> {
        (self.timeout_secs > 0).then(|| Duration::from_secs(self.timeout_secs))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ConverterConfig::default();
        assert_eq!(config.ffmpeg_path, PathBuf::from("ffmpeg"));
        assert_eq!(config.timeout_secs, 3600);
        assert_eq!(config.timeout(), Some(Duration::from_secs(3600)));
        assert!(!config.attach_stdio);
    }

    #[test]
    fn test_config_builder() {
        let config = ConverterConfig::with_ffmpeg_path("/opt/ffmpeg/bin/ffmpeg")
            .with_timeout(0)
            .with_attached_stdio(true);

        assert_eq!(config.ffmpeg_path, PathBuf::from("/opt/ffmpeg/bin/ffmpeg"));
        assert_eq!(config.timeout(), None);
        assert!(config.attach_stdio);
    }

    #[test]
    fn test_config_deserialize_defaults() {
        let parsed: ConverterConfig = serde_json::from_str(r#"{"timeout_secs": 60}"#).unwrap();
        assert_eq!(parsed.timeout_secs, 60);
        assert_eq!(parsed.ffmpeg_log_level, "info");
        assert!(parsed.extra_ffmpeg_args.is_empty());
    }
}
