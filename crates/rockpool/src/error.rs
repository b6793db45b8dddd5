//! Error types shared by every rockpool operation.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur during a sandboxed filesystem operation.
///
/// Single-target operations fail with the first error encountered and
/// leave the filesystem unchanged; only [`read_multiple_files`] captures
/// errors per item instead of propagating them.
///
/// [`read_multiple_files`]: crate::ops::read_multiple_files
#[derive(Debug, Error)]
pub enum OpError {
    /// The path resolves outside every allowed root directory.
    #[error("access denied - path outside allowed directories: {0}")]
    OutOfBounds(PathBuf),
    /// The path does not exist where existence is required.
    #[error("{0} does not exist")]
    NotFound(PathBuf),
    /// The path exists but is the wrong kind of entry (e.g. a directory
    /// where a regular file was expected).
    #[error("{path} is not a {expected}")]
    InvalidType {
        /// The offending path.
        path: PathBuf,
        /// What the operation required there, e.g. `"file"` or `"directory"`.
        expected: &'static str,
    },
    /// The destination of a move already exists.
    #[error("{0} already exists")]
    AlreadyExists(PathBuf),
    /// The target location cannot accept the operation: a write whose
    /// parent directory is missing, or a mkdir over a non-directory entry.
    #[error("invalid target: {0}")]
    InvalidTarget(String),
    /// An edit's oldText was not found in the file's current content.
    #[error("could not find exact match for edit: {0}")]
    EditConflict(String),
    /// The file's bytes could not be decoded as UTF-8 text.
    #[error("invalid utf-8 in file: {0}")]
    ReadFailure(PathBuf),
    /// Generic underlying filesystem error (permissions, device errors, ...).
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result alias used throughout the crate.
pub type OpResult<T> = std::result::Result<T, OpError>;
