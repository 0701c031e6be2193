//! Replacement of characters that common filesystems reject.

use std::ffi::{OsStr, OsString};
use std::path::{Component, Path, PathBuf};

/// Characters reserved by at least one common platform, besides ASCII
/// control characters.
const RESERVED: &[char] = &['/', ':', '<', '>', '"', '\\', '|', '?', '*'];

/// Whether `c` is rejected by at least one common filesystem.
pub fn is_reserved(c: char) -> bool {
    (c as u32) < 32 || RESERVED.contains(&c)
}

/// Rewrites path components so they are portable across filesystems.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathCleaner {
    replacement: String,
}

impl PathCleaner {
    /// Creates a cleaner substituting `replacement` for each reserved character.
    pub fn new(replacement: impl Into<String>) -> Self {
        Self {
            replacement: replacement.into(),
        }
    }

    /// Cleans a single file or directory name.
    pub fn clean_name(&self, name: &str) -> String {
        let mut cleaned = String::with_capacity(name.len());
        for c in name.chars() {
            if is_reserved(c) {
                cleaned.push_str(&self.replacement);
            } else {
                cleaned.push(c);
            }
        }
        cleaned
    }

    /// Cleans every normal component of `path`, keeping its shape.
    pub fn clean_path(&self, path: &Path) -> PathBuf {
        path.components()
            .map(|component| match component {
                Component::Normal(name) => PathBuf::from(self.clean_os_name(name)),
                other => PathBuf::from(other.as_os_str()),
            })
            .collect()
    }

    /// Cleans a name byte by byte. Reserved characters are all ASCII, so
    /// bytes of other encodings pass through unchanged.
    #[cfg(unix)]
    fn clean_os_name(&self, name: &OsStr) -> OsString {
        use std::os::unix::ffi::{OsStrExt, OsStringExt};

        let mut cleaned = Vec::with_capacity(name.len());
        for &byte in name.as_bytes() {
            if byte.is_ascii() && is_reserved(byte as char) {
                cleaned.extend_from_slice(self.replacement.as_bytes());
            } else {
                cleaned.push(byte);
            }
        }
        OsString::from_vec(cleaned)
    }

    /// Names that are not valid Unicode are kept as they are.
    #[cfg(not(unix))]
    fn clean_os_name(&self, name: &OsStr) -> OsString {
        match name.to_str() {
            Some(name) => OsString::from(self.clean_name(name)),
            None => name.to_os_string(),
        }
    }
}
