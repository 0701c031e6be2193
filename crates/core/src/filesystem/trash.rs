//! Detection of platform metadata files.

use std::path::Path;

/// Finder metadata file name.
const FINDER_INFO: &str = ".DS_Store";

/// Prefix of AppleDouble resource fork files.
const APPLE_DOUBLE_PREFIX: &str = "._";

/// Whether `path` names platform metadata that is neither media nor content.
///
/// Plain dot files are not trash.
pub fn is_trash_file(path: &Path) -> bool {
    let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
        return false;
    };
    name == FINDER_INFO || name.starts_with(APPLE_DOUBLE_PREFIX)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_finder_info_is_trash() {
        assert!(is_trash_file(Path::new(".DS_Store")));
        assert!(is_trash_file(Path::new("foo/bar/.DS_Store")));
    }

    #[test]
    fn test_apple_double_is_trash() {
        assert!(is_trash_file(Path::new("._DS_Store")));
        assert!(is_trash_file(Path::new("foo/bar/._track.flac")));
    }

    #[test]
    fn test_hidden_file_is_not_trash() {
        assert!(!is_trash_file(Path::new(".hidden")));
        assert!(!is_trash_file(Path::new("album/track.flac")));
        assert!(!is_trash_file(Path::new("")));
    }
}
