//! Filesystem access confined to a root directory.

use std::fs::Metadata;
use std::path::{Component, Path, PathBuf};
use tokio::fs::{DirBuilder, File};
use tokio::io::{AsyncWriteExt, BufReader, BufWriter};
use tokio::sync::mpsc;
use tracing::trace;
use walkdir::WalkDir;

use super::error::FsError;

/// Default copy buffer size (64 KiB).
const DEFAULT_BUFFER_SIZE: usize = 64 * 1024;

/// Entries buffered between the walking thread and its consumer.
const WALK_BUFFER: usize = 256;

/// Permission bits used when the platform has none to report.
#[cfg(not(unix))]
const FALLBACK_MODE: u32 = 0o755;

/// One entry produced by [`RootedFs::walk`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WalkEntry {
    /// Path relative to the walked root.
    pub path: PathBuf,
    /// Whether the entry is a directory. Symlinks are not followed.
    pub is_dir: bool,
}

/// A directory tree addressed through root-relative paths.
#[derive(Debug, Clone)]
pub struct RootedFs {
    root: PathBuf,
    buffer_size: usize,
}

impl RootedFs {
    /// Creates a filesystem rooted at an absolute directory.
    pub fn new(root: impl Into<PathBuf>) -> Result<Self, FsError> {
        let root = root.into();
        if !root.is_absolute() {
            return Err(FsError::invalid_path(root, "root must be absolute"));
        }
        Ok(Self {
            root,
            buffer_size: DEFAULT_BUFFER_SIZE,
        })
    }

    /// Sets the buffer size used when copying out of this tree.
    pub fn with_buffer_size(mut self, buffer_size: usize) -> Self {
        self.buffer_size = buffer_size.max(1);
        self
    }

    /// The absolute root directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Resolves a root-relative path to an absolute one.
    ///
    /// An empty path resolves to the root itself.
    pub fn resolve(&self, rel: &Path) -> Result<PathBuf, FsError> {
        for component in rel.components() {
            match component {
                Component::Normal(_) | Component::CurDir => {}
                Component::ParentDir => {
                    return Err(FsError::invalid_path(rel, "parent components are not allowed"))
                }
                Component::RootDir | Component::Prefix(_) => {
                    return Err(FsError::invalid_path(rel, "path must be relative"))
                }
            }
        }
        Ok(self.root.join(rel))
    }

    /// Reads metadata, following symlinks.
    pub async fn stat(&self, rel: &Path) -> Result<Metadata, FsError> {
        let path = self.resolve(rel)?;
        tokio::fs::metadata(&path)
            .await
            .map_err(|e| FsError::stat(path, e))
    }

    /// Whether `rel` exists.
    ///
    /// Errors other than not-found are returned rather than read as absence.
    pub async fn exists(&self, rel: &Path) -> Result<bool, FsError> {
        match self.stat(rel).await {
            Ok(_) => Ok(true),
            Err(e) if e.is_not_found() => Ok(false),
            Err(e) => Err(e),
        }
    }

    /// Permission bits of `rel`.
    pub async fn mode(&self, rel: &Path) -> Result<u32, FsError> {
        let meta = self.stat(rel).await?;
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            Ok(meta.permissions().mode() & 0o7777)
        }
        #[cfg(not(unix))]
        {
            let _ = meta;
            Ok(FALLBACK_MODE)
        }
    }

    /// Lists the entries of a directory as root-relative paths, sorted.
    pub async fn read_dir(&self, rel: &Path) -> Result<Vec<WalkEntry>, FsError> {
        let path = self.resolve(rel)?;
        let mut entries = tokio::fs::read_dir(&path)
            .await
            .map_err(|e| FsError::stat(path.clone(), e))?;

        let mut listed = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            let is_dir = entry.file_type().await?.is_dir();
            listed.push(WalkEntry {
                path: rel.join(entry.file_name()),
                is_dir,
            });
        }
        listed.sort_by(|a, b| a.path.cmp(&b.path));
        Ok(listed)
    }

    /// Creates `rel` and any missing ancestors with the given permission bits.
    ///
    /// Existing directories are left untouched. The process umask applies.
    pub async fn create_dir_all(&self, rel: &Path, mode: u32) -> Result<(), FsError> {
        let path = self.resolve(rel)?;
        let mut builder = DirBuilder::new();
        builder.recursive(true);
        #[cfg(unix)]
        builder.mode(mode);
        #[cfg(not(unix))]
        let _ = mode;

        builder
            .create(&path)
            .await
            .map_err(|source| FsError::DirectoryCreationFailed { path, source })
    }

    /// Opens `rel` for reading.
    pub async fn open(&self, rel: &Path) -> Result<File, FsError> {
        let path = self.resolve(rel)?;
        File::open(&path).await.map_err(|source| {
            if source.kind() == std::io::ErrorKind::NotFound {
                FsError::NotFound { path }
            } else {
                FsError::OpenFailed { path, source }
            }
        })
    }

    /// Creates or truncates `rel` for writing.
    pub async fn create(&self, rel: &Path) -> Result<File, FsError> {
        let path = self.resolve(rel)?;
        File::create(&path)
            .await
            .map_err(|source| FsError::CreateFailed { path, source })
    }

    /// Walks the tree depth-first in file name order, excluding the root.
    ///
    /// The traversal runs on a blocking thread and stops after the first
    /// error, which is delivered as the last item. Dropping the receiver
    /// ends the walk. Must be called from within a tokio runtime.
    pub fn walk(&self) -> mpsc::Receiver<Result<WalkEntry, FsError>> {
        let (tx, rx) = mpsc::channel(WALK_BUFFER);
        let root = self.root.clone();

        tokio::task::spawn_blocking(move || {
            for entry in WalkDir::new(&root).min_depth(1).sort_by_file_name() {
                let item = entry
                    .map_err(|source| FsError::WalkFailed {
                        path: root.clone(),
                        source,
                    })
                    .and_then(|entry| {
                        let path = entry
                            .path()
                            .strip_prefix(&root)
                            .map_err(|_| FsError::invalid_path(entry.path(), "outside walk root"))?
                            .to_path_buf();
                        Ok(WalkEntry {
                            path,
                            is_dir: entry.file_type().is_dir(),
                        })
                    });

                let failed = item.is_err();
                if tx.blocking_send(item).is_err() || failed {
                    break;
                }
            }
            trace!(root = %root.display(), "Walk finished");
        });

        rx
    }
}

/// Streams `src` from one tree into `dst` in another, returning bytes copied.
///
/// The destination is created or truncated and flushed before returning.
pub async fn copy_file(
    src_fs: &RootedFs,
    src: &Path,
    dst_fs: &RootedFs,
    dst: &Path,
) -> Result<u64, FsError> {
    let source = src_fs.open(src).await?;
    let destination = dst_fs.create(dst).await?;
    let failed = |e| FsError::copy_failed(src_fs.root.join(src), dst_fs.root.join(dst), e);

    let mut reader = BufReader::with_capacity(src_fs.buffer_size, source);
    let mut writer = BufWriter::with_capacity(src_fs.buffer_size, destination);

    let total_bytes = tokio::io::copy_buf(&mut reader, &mut writer)
        .await
        .map_err(failed)?;
    writer.flush().await.map_err(failed)?;

    Ok(total_bytes)
}
