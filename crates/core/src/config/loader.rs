use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use std::path::Path;

use super::{types::Config, ConfigError};

/// Prefix of environment overrides. Nested keys are separated by `__`,
/// e.g. `AUDIOTREE_EXPORT__MAX_JOBS=4`.
pub const ENV_PREFIX: &str = "AUDIOTREE_";

/// Environment variable naming a configuration file.
pub const CONFIG_PATH_ENV: &str = "AUDIOTREE_CONFIG";

/// Load configuration from defaults, an optional file, and the environment.
///
/// A file that is named but missing is an error.
pub fn load_config(path: Option<&Path>) -> Result<Config, ConfigError> {
    let mut figment = Figment::from(Serialized::defaults(Config::default()));

    if let Some(path) = path {
        if !path.exists() {
            return Err(ConfigError::FileNotFound(path.display().to_string()));
        }
        figment = figment.merge(Toml::file(path));
    }

    figment
        .merge(Env::prefixed(ENV_PREFIX).split("__"))
        .extract()
        .map_err(|e| ConfigError::ParseError(e.to_string()))
}

/// Load configuration from TOML string (useful for testing)
pub fn load_config_from_str(toml_str: &str) -> Result<Config, ConfigError> {
    toml::from_str(toml_str).map_err(|e| ConfigError::ParseError(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::converter::{AudioFormat, OverwritePolicy};
    use figment::Jail;

    #[test]
    fn test_load_config_from_str_valid() {
        let toml = r#"
[export]
format = "flac"
max_jobs = 2
"#;
        let config = load_config_from_str(toml).unwrap();
        assert_eq!(config.export.format, AudioFormat::Flac);
        assert_eq!(config.export.max_jobs, 2);
    }

    #[test]
    fn test_load_config_from_str_invalid() {
        let result = load_config_from_str("[export]\nmax_jobs = \"many\"\n");
        assert!(matches!(result, Err(ConfigError::ParseError(_))));
    }

    #[test]
    fn test_load_config_file_not_found() {
        let result = load_config(Some(Path::new("/nonexistent/config.toml")));
        assert!(matches!(result, Err(ConfigError::FileNotFound(_))));
    }

    #[test]
    fn test_load_config_defaults_without_file() {
        Jail::expect_with(|_jail| {
            let config = load_config(None).map_err(|e| e.to_string())?;
            assert_eq!(config, Config::default());
            Ok(())
        });
    }

    #[test]
    fn test_load_config_layers() {
        Jail::expect_with(|jail| {
            jail.create_file(
                "audiotree.toml",
                r#"
[export]
format = "mp3"
max_jobs = 8
overwrite = "overwrite"
"#,
            )?;
            jail.set_env("AUDIOTREE_EXPORT__MAX_JOBS", "4");
            jail.set_env("AUDIOTREE_CONVERSION__BITRATE", "128k");

            let config =
                load_config(Some(Path::new("audiotree.toml"))).map_err(|e| e.to_string())?;
            assert_eq!(config.export.format, AudioFormat::Mp3);
            assert_eq!(config.export.max_jobs, 4);
            assert_eq!(config.export.overwrite, OverwritePolicy::Overwrite);
            assert_eq!(config.conversion.bitrate.as_deref(), Some("128k"));
            assert!(config.export.copy_unknown);
            Ok(())
        });
    }
}
