use std::path::{Path, PathBuf};

use super::{types::Config, ConfigError};
use crate::filesystem::is_reserved;

/// Validate configuration
/// Currently validates:
/// - The clean paths replacement contains no reserved character
/// - Channel count is 1 or 2
/// - Sample rate is not 0
pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    if let Some(ref replacement) = config.export.clean_paths {
        if let Some(c) = replacement.chars().find(|c| is_reserved(*c)) {
            return Err(ConfigError::ValidationError(format!(
                "export.clean_paths cannot include reserved character {:?}",
                c
            )));
        }
    }

    if let Some(channels) = config.conversion.channels {
        if !(1..=2).contains(&channels) {
            return Err(ConfigError::ValidationError(format!(
                "conversion.channels must be 1 or 2, got {}",
                channels
            )));
        }
    }

    if config.conversion.sample_rate_hz == Some(0) {
        return Err(ConfigError::ValidationError(
            "conversion.sample_rate_hz cannot be 0".to_string(),
        ));
    }

    Ok(())
}

/// Checks a pair of export roots and returns their canonical forms.
///
/// Both must be existing directories, distinct, and the output must not lie
/// inside the input.
pub fn validate_roots(input: &Path, output: &Path) -> Result<(PathBuf, PathBuf), ConfigError> {
    let input = canonical_dir("input", input)?;
    let output = canonical_dir("output", output)?;

    if input == output {
        return Err(ConfigError::InvalidRoots(format!(
            "cowardly refusing to export {} into itself",
            input.display()
        )));
    }
    if output.starts_with(&input) {
        return Err(ConfigError::InvalidRoots(
            "output directory cannot be nested within input directory".to_string(),
        ));
    }

    Ok((input, output))
}

fn canonical_dir(role: &str, path: &Path) -> Result<PathBuf, ConfigError> {
    if path.as_os_str().is_empty() {
        return Err(ConfigError::InvalidRoots(format!(
            "must specify {} directory",
            role
        )));
    }
    let canonical = path.canonicalize().map_err(|e| {
        ConfigError::InvalidRoots(format!("{} directory {}: {}", role, path.display(), e))
    })?;
    if !canonical.is_dir() {
        return Err(ConfigError::InvalidRoots(format!(
            "{} {} is not a directory",
            role,
            path.display()
        )));
    }
    Ok(canonical)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_validate_valid_config() {
        assert!(validate_config(&Config::default()).is_ok());
    }

    #[test]
    fn test_validate_reserved_clean_paths_fails() {
        let mut config = Config::default();
        config.export.clean_paths = Some("a:b".to_string());
        let err = validate_config(&config).unwrap_err();
        assert!(matches!(err, ConfigError::ValidationError(_)));

        config.export.clean_paths = Some("_".to_string());
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn test_validate_channels_and_sample_rate() {
        let mut config = Config::default();
        config.conversion.channels = Some(6);
        assert!(validate_config(&config).is_err());

        config.conversion.channels = Some(1);
        config.conversion.sample_rate_hz = Some(0);
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_validate_roots() {
        let base = TempDir::new().unwrap();
        let input = base.path().join("library");
        let output = base.path().join("export");
        std::fs::create_dir(&input).unwrap();
        std::fs::create_dir(&output).unwrap();

        let (canonical_input, canonical_output) = validate_roots(&input, &output).unwrap();
        assert!(canonical_input.is_absolute());
        assert_eq!(canonical_output, output.canonicalize().unwrap());
    }

    #[test]
    fn test_validate_roots_rejects_bad_pairs() {
        let base = TempDir::new().unwrap();
        let input = base.path().join("library");
        let nested = input.join("export");
        std::fs::create_dir_all(&nested).unwrap();
        std::fs::write(base.path().join("file.txt"), b"x").unwrap();

        assert!(validate_roots(&input, &input).is_err());
        assert!(validate_roots(&input, &nested).is_err());
        assert!(validate_roots(&input, &base.path().join("missing")).is_err());
        assert!(validate_roots(&input, &base.path().join("file.txt")).is_err());
        assert!(validate_roots(Path::new(""), &nested).is_err());
    }

    #[test]
    fn test_validate_roots_sibling_with_shared_prefix() {
        let base = TempDir::new().unwrap();
        let input = base.path().join("music");
        let output = base.path().join("music-export");
        std::fs::create_dir(&input).unwrap();
        std::fs::create_dir(&output).unwrap();

        assert!(validate_roots(&input, &output).is_ok());
    }
}
