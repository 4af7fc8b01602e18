//! Error types for `rsfm-core`.
//!
//! All fallible operations in the core library return [`CoreResult<T>`],
//! which is an alias for `Result<T, CoreError>`.
//!
//! Predicate failures (`SameFile`, `FileDoesExist`, `DirDoesExist`,
//! `DestinationInSource`) are raised before any filesystem mutation takes
//! place. OS-level failures that have no more specific variant propagate
//! through [`CoreError::Io`] unmodified.

use std::path::PathBuf;

/// Unified error type for all core operations.
///
/// Each variant captures just enough context for the caller to display
/// a meaningful message or branch on *which* conflict occurred.
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    /// Source and destination resolve to the identical canonical path.
    #[error("source and destination are the same file: {src}")]
    SameFile {
        /// The source path as given.
        src: PathBuf,
        /// The destination path as given.
        dest: PathBuf,
    },

    /// A file already occupies the destination name.
    #[error("file already exists: {0}")]
    FileDoesExist(PathBuf),

    /// A directory already occupies the destination name.
    #[error("directory already exists: {0}")]
    DirDoesExist(PathBuf),

    /// The destination is the source or one of its descendants, so a
    /// recursive copy would never terminate.
    #[error("destination {dest} is inside source {src}")]
    DestinationInSource {
        /// The source directory.
        src: PathBuf,
        /// The offending destination.
        dest: PathBuf,
    },

    /// The operation was invoked with unsupported inputs, e.g. a
    /// rename-to-one-name applied to several sources at once.
    #[error("invalid operation: {0}")]
    InvalidOperation(String),

    /// A file or directory name is invalid (empty, contains path separators, etc.).
    #[error("invalid name: {0}")]
    InvalidName(String),

    /// The target path does not exist.
    #[error("path not found: {0}")]
    NotFound(PathBuf),

    /// A directory was expected but the path points to a file.
    #[error("not a directory: {0}")]
    NotADirectory(PathBuf),

    /// The process lacks permission to access the path.
    #[error("permission denied: {0}")]
    PermissionDenied(PathBuf),

    /// Failed to parse a TOML configuration file.
    #[error("config parse error: {0}")]
    ConfigParse(String),

    /// The user aborted at the conflict-resolution prompt.
    #[error("operation cancelled")]
    Cancelled,

    /// An I/O error that doesn't fit a more specific variant.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl CoreError {
    /// Returns `true` for destination collisions that the conflict
    /// resolution prompt can recover from.
    pub fn is_collision(&self) -> bool {
        matches!(
            self,
            CoreError::FileDoesExist(_) | CoreError::DirDoesExist(_)
        )
    }
}

/// Convenience alias used throughout `rsfm-core`.
pub type CoreResult<T> = Result<T, CoreError>;
