//! Per-entry export decisions.

use std::path::Path;

use super::types::EntryKind;
use crate::converter::{extension_of, INPUT_EXTENSIONS};
use crate::filesystem::is_trash_file;

/// Decides what the export does with each input entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskClassifier {
    media_extensions: Vec<String>,
}

impl Default for TaskClassifier {
    fn default() -> Self {
        Self::new(INPUT_EXTENSIONS)
    }
}

impl TaskClassifier {
    /// Creates a classifier treating `media_extensions` (without dots, any
    /// case) as media.
    pub fn new<S: AsRef<str>>(media_extensions: &[S]) -> Self {
        Self {
            media_extensions: media_extensions
                .iter()
                .map(|ext| ext.as_ref().trim_start_matches('.').to_ascii_lowercase())
                .collect(),
        }
    }

    /// Classifies a root-relative entry.
    ///
    /// Directories win over trash names, and trash names over media
    /// extensions.
    pub fn classify(&self, path: &Path, is_dir: bool) -> EntryKind {
        if is_dir {
            EntryKind::Directory
        } else if is_trash_file(path) {
            EntryKind::Trash
        } else if self.is_media(path) {
            EntryKind::Media
        } else {
            EntryKind::Other
        }
    }

    fn is_media(&self, path: &Path) -> bool {
        extension_of(path).is_some_and(|ext| self.media_extensions.contains(&ext))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify() {
        let classifier = TaskClassifier::default();
        let cases = [
            ("Artist/Album", true, EntryKind::Directory),
            ("Artist/Album/01.flac", false, EntryKind::Media),
            ("Artist/Album/02.WAV", false, EntryKind::Media),
            ("Artist/Album/03.m4r", false, EntryKind::Media),
            ("Artist/Album/cover.jpg", false, EntryKind::Other),
            ("Artist/Album/booklet", false, EntryKind::Other),
            ("Artist/.DS_Store", false, EntryKind::Trash),
            ("Artist/Album/._01.flac", false, EntryKind::Trash),
            ("Artist/.hidden.mp3", false, EntryKind::Media),
        ];
        for (path, is_dir, expected) in cases {
            assert_eq!(classifier.classify(Path::new(path), is_dir), expected, "{}", path);
        }
    }

    #[test]
    fn test_directory_with_trash_name_is_directory() {
        let classifier = TaskClassifier::default();
        assert_eq!(
            classifier.classify(Path::new("._resources"), true),
            EntryKind::Directory
        );
        assert_eq!(
            classifier.classify(Path::new("album.flac"), true),
            EntryKind::Directory
        );
    }

    #[test]
    fn test_custom_extensions() {
        let classifier = TaskClassifier::new(&[".OGG"]);
        assert_eq!(classifier.classify(Path::new("a.ogg"), false), EntryKind::Media);
        assert_eq!(classifier.classify(Path::new("a.flac"), false), EntryKind::Other);
    }
}
