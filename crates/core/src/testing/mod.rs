//! Testing utilities and mock implementations.
//!
//! # Example
//!
//! ```rust,ignore
//! use audiotree_core::testing::{fixtures, MockConverter};
//!
//! let converter = MockConverter::new();
//! converter.fail_on("Album/broken.flac", "Invalid data found").await;
//!
//! fixtures::write_tree(input.path(), &["Album/01.flac", "Album/broken.flac"]);
//! ```

mod mock_converter;

pub use mock_converter::{MockConverter, RecordedConversion};

/// Test fixtures and helper functions.
pub mod fixtures {
    use std::path::{Path, PathBuf};

    /// Creates each relative file under `root`, with its parents. A path
    /// ending in `/` creates a directory. Files contain their own path.
    pub fn write_tree(root: &Path, entries: &[&str]) {
        for entry in entries {
            let path = root.join(entry);
            if entry.ends_with('/') {
                std::fs::create_dir_all(&path).expect("create fixture directory");
                continue;
            }
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent).expect("create fixture parent");
            }
            std::fs::write(&path, entry.as_bytes()).expect("write fixture file");
        }
    }

    /// Every entry under `root` as sorted relative paths, directories
    /// suffixed with `/`.
    pub fn list_tree(root: &Path) -> Vec<String> {
        let mut entries: Vec<String> = walkdir::WalkDir::new(root)
            .min_depth(1)
            .into_iter()
            .filter_map(Result::ok)
            .map(|entry| {
                let rel = entry
                    .path()
                    .strip_prefix(root)
                    .map(Path::to_path_buf)
                    .unwrap_or_else(|_| PathBuf::from(entry.path()));
                let mut rel = rel.to_string_lossy().into_owned();
                if entry.file_type().is_dir() {
                    rel.push('/');
                }
                rel
            })
            .collect();
        entries.sort();
        entries
    }
}
