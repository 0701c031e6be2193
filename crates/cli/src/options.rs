//! Command-line arguments shared by the tools.

use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use anyhow::{bail, Result};
use clap::{Args, Command, CommandFactory, FromArgMatches, Parser};
use regex_lite::Regex;

use audiotree_core::config::CONFIG_PATH_ENV;
use audiotree_core::{AudioFormat, Config, ConversionParams, OverwritePolicy};

/// Matches a `WIDTHxHEIGHT` image scale.
static SCALE_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[0-9]+x[0-9]+$").expect("Invalid scale regex")
});

/// Logging flags.
#[derive(Args, Debug, Clone, Default)]
pub struct LogArgs {
    /// Display verbose output
    #[arg(short = 'v', long)]
    pub verbose: bool,

    /// Also log to FILE at debug level. Use '-' for stdout
    #[arg(long = "log-file", value_name = "FILE")]
    pub log_file: Option<PathBuf>,
}

/// The `-n` / `-y` pair.
#[derive(Args, Debug, Clone, Default)]
pub struct OverwriteArgs {
    /// Set the no clobber flag: don't overwrite files
    #[arg(short = 'n', long = "no-clobber")]
    pub no_clobber: bool,

    /// Overwrite files without prompting
    #[arg(short = 'y', long = "overwrite")]
    pub overwrite: bool,
}

impl OverwriteArgs {
    /// The policy, or `None` when neither flag was given.
    pub fn policy(&self) -> Option<OverwritePolicy> {
        (self.no_clobber || self.overwrite)
            .then(|| OverwritePolicy::from_flags(self.no_clobber, self.overwrite))
    }
}

/// Encoder flags. Unset flags keep the configured or default value.
#[derive(Args, Debug, Clone, Default)]
pub struct ConversionArgs {
    /// Sets the output bitrate, e.g. 256k
    #[arg(short = 'b', long, value_name = "BITRATE")]
    pub bitrate: Option<String>,

    /// Sets the ffmpeg audio codec
    #[arg(short = 'c', long, value_name = "CODEC")]
    pub codec: Option<String>,

    /// Sets the sample rate in Hz
    #[arg(short = 'r', long = "sample-rate", value_name = "HZ")]
    pub sample_rate: Option<u32>,

    /// Sets 2.0/stereo mode
    #[arg(short = 's', long, conflicts_with = "mono")]
    pub stereo: bool,

    /// Sets 1.0/mono mode
    #[arg(short = 'm', long)]
    pub mono: bool,
}

impl ConversionArgs {
    /// Overwrites the fields of `params` named on the command line.
    pub fn apply(&self, params: &mut ConversionParams) {
        if let Some(ref bitrate) = self.bitrate {
            params.bitrate = Some(bitrate.clone());
        }
        if let Some(ref codec) = self.codec {
            params.codec = Some(codec.clone());
        }
        if let Some(rate) = self.sample_rate {
            params.sample_rate_hz = Some(rate);
        }
        if self.stereo {
            params.channels = Some(2);
        } else if self.mono {
            params.channels = Some(1);
        }
    }
}

/// Export a tree of audio files into another format
#[derive(Parser, Debug, Clone)]
#[command(
    name = "export_audio_tree",
    version,
    about = "Export a tree of audio files into another format",
    long_about = "Given a tree of source files {indir}, export them to {outdir} retaining the \
                  same structure. If {indir} holds Artists/Album/Song.flac then {outdir} ends up \
                  with Artists/Album/Song.m4a.\n\n\
                  Copies and conversions run concurrently. Set max jobs to lower CPU usage, \
                  the default is one per core."
)]
pub struct ExportArgs {
    /// Set the output format (flac, m4a, m4r, mp3)
    #[arg(short = 'f', long, value_name = "FORMAT")]
    pub format: Option<AudioFormat>,

    /// Copy unknown files, like album art and booklets (default)
    #[arg(short = 'C', long = "copy-unknown", conflicts_with = "no_copy_unknown")]
    pub copy_unknown: bool,

    /// Do not copy unknown files
    #[arg(short = 'N', long = "no-copy-unknown")]
    pub no_copy_unknown: bool,

    /// Sets the maximum queue depth
    #[arg(short = 'q', long = "max-queue", value_name = "NUM")]
    pub max_queue: Option<usize>,

    /// Sets the maximum number of concurrent jobs
    #[arg(short = 'j', long = "max-jobs", value_name = "NUM")]
    pub max_jobs: Option<usize>,

    /// Replace reserved characters with TEXT in output file names. '_' makes a good choice
    #[arg(long = "cleanpaths", value_name = "TEXT")]
    pub clean_paths: Option<String>,

    /// Configuration file
    #[arg(long, value_name = "FILE", env = CONFIG_PATH_ENV)]
    pub config: Option<PathBuf>,

    #[command(flatten)]
    pub conversion: ConversionArgs,

    #[command(flatten)]
    pub overwrite: OverwriteArgs,

    #[command(flatten)]
    pub log: LogArgs,

    /// Root of the tree to export
    #[arg(value_name = "INDIR")]
    pub input: PathBuf,

    /// Existing directory receiving the exported tree
    #[arg(value_name = "OUTDIR")]
    pub output: PathBuf,
}

impl ExportArgs {
    /// Overwrites the configuration fields named on the command line.
    pub fn apply(&self, config: &mut Config) {
        let export = &mut config.export;
        if let Some(format) = self.format {
            export.format = format;
        }
        if self.copy_unknown {
            export.copy_unknown = true;
        } else if self.no_copy_unknown {
            export.copy_unknown = false;
        }
        if let Some(max_queue) = self.max_queue {
            export.max_queue = max_queue;
        }
        if let Some(max_jobs) = self.max_jobs {
            export.max_jobs = max_jobs;
        }
        if let Some(ref text) = self.clean_paths {
            export.clean_paths = Some(text.clone());
        }
        if let Some(policy) = self.overwrite.policy() {
            export.overwrite = policy;
        }
        self.conversion.apply(&mut config.conversion);
    }
}

/// Convert one audio file with ffmpeg
#[derive(Parser, Debug, Clone)]
#[command(version)]
pub struct ConvertArgs {
    #[command(flatten)]
    pub conversion: ConversionArgs,

    #[command(flatten)]
    pub overwrite: OverwriteArgs,

    #[command(flatten)]
    pub log: LogArgs,

    /// Configuration file
    #[arg(long, value_name = "FILE", env = CONFIG_PATH_ENV)]
    pub config: Option<PathBuf>,

    /// File to convert
    #[arg(value_name = "INPUT")]
    pub input: PathBuf,

    /// File to write, with the target format's extension
    #[arg(value_name = "OUTPUT")]
    pub output: PathBuf,
}

/// Extract cover art from an audio file
#[derive(Parser, Debug, Clone)]
#[command(
    name = "extract_coverart",
    version,
    about = "Extract cover art from an audio file",
    long_about = "Extracts cover art from {input} into {output} using ffmpeg. The image format \
                  follows the extension of {output}. For best compatibility, consider scaling \
                  to 500x500 as a jpg."
)]
pub struct ExtractArgs {
    /// Scale image to WIDTHxHEIGHT, e.g. 500x500
    #[arg(short = 's', long, value_name = "SCALE", value_parser = parse_scale)]
    pub scale: Option<String>,

    /// Sets the ffmpeg image codec
    #[arg(short = 'c', long, value_name = "CODEC")]
    pub codec: Option<String>,

    #[command(flatten)]
    pub overwrite: OverwriteArgs,

    #[command(flatten)]
    pub log: LogArgs,

    /// Configuration file
    #[arg(long, value_name = "FILE", env = CONFIG_PATH_ENV)]
    pub config: Option<PathBuf>,

    /// File holding the cover art
    #[arg(value_name = "INPUT")]
    pub input: PathBuf,

    /// Image file to write
    #[arg(value_name = "OUTPUT")]
    pub output: PathBuf,
}

impl ConvertArgs {
    /// The command of the `to_<format>` tool, named after it.
    pub fn command_for(format: AudioFormat) -> Command {
        Self::command()
            .name(tool_name(format))
            .about(format!("Convert one audio file to {} with ffmpeg", format))
            .after_help(format!(
                "Be sure to include a .{} extension in OUTPUT.",
                format.extension()
            ))
    }

    /// Parses the process arguments for the `to_<format>` tool. Exits on
    /// usage errors, `--help` and `--version`.
    pub fn parse_for(format: AudioFormat) -> Self {
        let matches = Self::command_for(format).get_matches();
        Self::from_arg_matches(&matches).unwrap_or_else(|e| e.exit())
    }
}

fn tool_name(format: AudioFormat) -> &'static str {
    match format {
        AudioFormat::Flac => "to_flac",
        AudioFormat::M4a => "to_m4a",
        AudioFormat::M4r => "to_m4r",
        AudioFormat::Mp3 => "to_mp3",
    }
}

fn parse_scale(value: &str) -> Result<String, String> {
    if SCALE_REGEX.is_match(value) {
        Ok(value.to_string())
    } else {
        Err(format!("bad scale format {:?}, expected WIDTHxHEIGHT", value))
    }
}

/// Rejects converting a file onto itself.
pub fn ensure_distinct(input: &Path, output: &Path) -> Result<()> {
    if input == output {
        bail!("cowardly refusing to convert {:?} into itself", input);
    }
    Ok(())
}
