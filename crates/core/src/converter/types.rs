//! Types for the converter module.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use super::error::ConverterError;

/// Extensions recognized as convertible media, without the dot.
pub const INPUT_EXTENSIONS: &[&str] = &["flac", "m4a", "m4r", "mp3", "wav"];

/// Sample rate applied when none is configured.
pub const DEFAULT_SAMPLE_RATE_HZ: u32 = 44_100;

/// Lowercased extension of `path`, without the dot.
pub fn extension_of(path: &Path) -> Option<String> {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_ascii_lowercase())
}

/// Output audio formats.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AudioFormat {
    /// FLAC lossless.
    Flac,
    /// AAC in an MP4 container.
    #[default]
    M4a,
    /// AAC in an MP4 container, ringtone flavor.
    M4r,
    /// MPEG-1 Layer III.
    Mp3,
}

impl AudioFormat {
    /// Every supported format.
    pub const ALL: [AudioFormat; 4] = [Self::Flac, Self::M4a, Self::M4r, Self::Mp3];

    /// File extension without the dot.
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Flac => "flac",
            Self::M4a => "m4a",
            Self::M4r => "m4r",
            Self::Mp3 => "mp3",
        }
    }

    /// Whether `path` already carries this format's extension, ignoring case.
    pub fn matches(&self, path: &Path) -> bool {
        extension_of(path).is_some_and(|ext| ext == self.extension())
    }

    /// Encoder settings used when the user sets none.
    pub fn default_params(&self) -> ConversionParams {
        let (codec, bitrate) = match self {
            Self::Flac => ("flac", None),
            Self::M4a | Self::M4r => ("aac", Some("256k")),
            Self::Mp3 => ("libmp3lame", Some("320k")),
        };
        ConversionParams {
            codec: Some(codec.to_string()),
            bitrate: bitrate.map(str::to_string),
            sample_rate_hz: Some(DEFAULT_SAMPLE_RATE_HZ),
            channels: None,
            cover_art: CoverArt::Copy,
        }
    }
}

impl fmt::Display for AudioFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

impl FromStr for AudioFormat {
    type Err = ConverterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().trim_start_matches('.').to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|format| format.extension() == wanted)
            .ok_or_else(|| ConverterError::UnsupportedFormat {
                format: s.to_string(),
            })
    }
}

/// What happens to embedded cover art during conversion.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CoverArt {
    /// Copy the picture stream unchanged.
    #[default]
    Copy,
    /// Leave pictures out of the output.
    Drop,
}

/// How to treat an output file that already exists.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OverwritePolicy {
    /// Leave the decision to the transcoder, which may prompt.
    #[default]
    Ask,
    /// Always overwrite.
    Overwrite,
    /// Never overwrite.
    Never,
}

impl OverwritePolicy {
    /// Resolves the `-n` / `-y` flag pair. No-clobber wins.
    pub fn from_flags(no_clobber: bool, overwrite: bool) -> Self {
        if no_clobber {
            Self::Never
        } else if overwrite {
            Self::Overwrite
        } else {
            Self::Ask
        }
    }

    /// The ffmpeg flag expressing this policy, if any.
    pub fn ffmpeg_flag(&self) -> Option<&'static str> {
        match self {
            Self::Ask => None,
            Self::Overwrite => Some("-y"),
            Self::Never => Some("-n"),
        }
    }

    /// Whether existing files must be kept.
    pub fn is_no_clobber(&self) -> bool {
        *self == Self::Never
    }
}

/// Encoder settings. Unset fields are left to the transcoder.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversionParams {
    /// Audio codec name, e.g. `aac`.
    #[serde(default)]
    pub codec: Option<String>,

    /// Audio bitrate, e.g. `256k`.
    #[serde(default)]
    pub bitrate: Option<String>,

    /// Output sample rate.
    #[serde(default)]
    pub sample_rate_hz: Option<u32>,

    /// Output channel count.
    #[serde(default)]
    pub channels: Option<u8>,

    /// Cover art handling.
    #[serde(default)]
    pub cover_art: CoverArt,
}

impl ConversionParams {
    /// Fills every unset field from `defaults`. Fields already set win.
    ///
    /// `cover_art` has no unset state and is kept as is.
    pub fn with_defaults(self, defaults: &ConversionParams) -> Self {
        Self {
            codec: self.codec.or_else(|| defaults.codec.clone()),
            bitrate: self.bitrate.or_else(|| defaults.bitrate.clone()),
            sample_rate_hz: self.sample_rate_hz.or(defaults.sample_rate_hz),
            channels: self.channels.or(defaults.channels),
            cover_art: self.cover_art,
        }
    }
}

/// A single-file conversion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversionJob {
    /// Absolute path of the source file.
    pub input_path: PathBuf,
    /// Absolute path of the file to produce.
    pub output_path: PathBuf,
    /// Encoder settings.
    pub params: ConversionParams,
    /// Policy for an existing output file.
    pub overwrite: OverwritePolicy,
}

/// Extraction of embedded cover art into an image file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoverArtJob {
    /// Media file holding the picture.
    pub input_path: PathBuf,
    /// Image file to produce.
    pub output_path: PathBuf,
    /// Image codec, e.g. `png`.
    pub codec: Option<String>,
    /// Target size as `WIDTHxHEIGHT`.
    pub scale: Option<String>,
    /// Policy for an existing output file.
    pub overwrite: OverwritePolicy,
}

/// Result of a finished transcoder run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversionResult {
    /// File that was produced.
    pub output_path: PathBuf,
    /// Captured standard output followed by standard error.
    pub output: String,
    /// Wall time of the run in milliseconds.
    pub duration_ms: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_parsing() {
        assert_eq!("mp3".parse::<AudioFormat>().unwrap(), AudioFormat::Mp3);
        assert_eq!("FLAC".parse::<AudioFormat>().unwrap(), AudioFormat::Flac);
        assert_eq!(".m4r".parse::<AudioFormat>().unwrap(), AudioFormat::M4r);
        assert!(matches!(
            "ogg".parse::<AudioFormat>(),
            Err(ConverterError::UnsupportedFormat { .. })
        ));
        assert_eq!(AudioFormat::default(), AudioFormat::M4a);
        assert_eq!(AudioFormat::Mp3.to_string(), "mp3");
    }

    #[test]
    fn test_format_matches_extension() {
        assert!(AudioFormat::Mp3.matches(Path::new("a/b.MP3")));
        assert!(!AudioFormat::M4a.matches(Path::new("a/b.m4r")));
        assert!(!AudioFormat::Flac.matches(Path::new("flac")));
    }

    #[test]
    fn test_default_params() {
        let flac = AudioFormat::Flac.default_params();
        assert_eq!(flac.codec.as_deref(), Some("flac"));
        assert_eq!(flac.bitrate, None);

        for format in [AudioFormat::M4a, AudioFormat::M4r] {
            let aac = format.default_params();
            assert_eq!(aac.codec.as_deref(), Some("aac"));
            assert_eq!(aac.bitrate.as_deref(), Some("256k"));
        }

        let mp3 = AudioFormat::Mp3.default_params();
        assert_eq!(mp3.codec.as_deref(), Some("libmp3lame"));
        assert_eq!(mp3.bitrate.as_deref(), Some("320k"));
        assert_eq!(mp3.sample_rate_hz, Some(DEFAULT_SAMPLE_RATE_HZ));
    }

    #[test]
    fn test_with_defaults_prefers_set_fields() {
        let params = ConversionParams {
            bitrate: Some("128k".to_string()),
            channels: Some(1),
            ..Default::default()
        }
        .with_defaults(&AudioFormat::Mp3.default_params());

        assert_eq!(params.codec.as_deref(), Some("libmp3lame"));
        assert_eq!(params.bitrate.as_deref(), Some("128k"));
        assert_eq!(params.sample_rate_hz, Some(44_100));
        assert_eq!(params.channels, Some(1));
    }

    #[test]
    fn test_overwrite_policy_flags() {
        assert_eq!(OverwritePolicy::from_flags(false, false), OverwritePolicy::Ask);
        assert_eq!(
            OverwritePolicy::from_flags(false, true),
            OverwritePolicy::Overwrite
        );
        assert_eq!(OverwritePolicy::from_flags(true, true), OverwritePolicy::Never);
        assert_eq!(OverwritePolicy::Never.ffmpeg_flag(), Some("-n"));
        assert_eq!(OverwritePolicy::Overwrite.ffmpeg_flag(), Some("-y"));
        assert_eq!(OverwritePolicy::Ask.ffmpeg_flag(), None);
        assert!(OverwritePolicy::Never.is_no_clobber());
    }

    #[test]
    fn test_params_deserialize_partial() {
        let params: ConversionParams =
            serde_json::from_str(r#"{"bitrate": "192k", "cover_art": "drop"}"#).unwrap();
        assert_eq!(params.bitrate.as_deref(), Some("192k"));
        assert_eq!(params.codec, None);
        assert_eq!(params.cover_art, CoverArt::Drop);
    }
}
