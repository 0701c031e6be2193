//! Rooted filesystem access for export jobs.
//!
//! An export touches two trees: the input tree it reads from and the output
//! tree it writes to. Each is wrapped in a [`RootedFs`] so that every path the
//! exporter handles is relative to its root and can never escape it.
//!
//! # Example
//!
//! ```ignore
//! use audiotree_core::filesystem::{copy_file, RootedFs};
//!
//! let input = RootedFs::new("/music/library")?;
//! let output = RootedFs::new("/media/player")?;
//!
//! output.create_dir_all(Path::new("Artist/Album"), 0o755).await?;
//! let bytes = copy_file(
//!     &input,
//!     Path::new("Artist/Album/cover.jpg"),
//!     &output,
//!     Path::new("Artist/Album/cover.jpg"),
//! )
//! .await?;
//! ```

mod cleaner;
mod error;
mod rooted;
mod trash;

pub use cleaner::{is_reserved, PathCleaner};
pub use error::FsError;
pub use rooted::{copy_file, RootedFs, WalkEntry};
pub use trash::is_trash_file;
