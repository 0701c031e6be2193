pub mod config;
pub mod converter;
pub mod exporter;
pub mod filesystem;
pub mod pool;
pub mod testing;

pub use config::{
    load_config, load_config_from_str, validate_config, validate_roots, Config, ConfigError,
    ExportConfig,
};
pub use converter::{
    AudioFormat, ConversionJob, ConversionParams, ConversionResult, Converter, ConverterConfig,
    ConverterError, CoverArt, CoverArtJob, FfmpegConverter, OverwritePolicy,
};
pub use exporter::{ExportError, ExportJob, ExportSummary, Exporter, TaskClassifier};
pub use filesystem::{FsError, PathCleaner, RootedFs};
pub use pool::{PoolError, Task, WorkPool};
