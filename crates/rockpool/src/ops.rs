//! Filesystem operations: list, stat, read, batch read, write, mkdir, move.
//!
//! Every operation validates each path argument through the sandbox guard
//! before reading or mutating anything, then performs a single blocking
//! filesystem action. Nothing is cached between calls; results always
//! reflect the filesystem at call time.

use std::fs;
use std::io::{self, Write as _};
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};

use crate::error::{OpError, OpResult};
use crate::roots::AllowedRoots;

/// The kind of a directory entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryKind {
    /// A regular file (or anything that is not a directory).
    File,
    /// A directory.
    Directory,
}

/// One entry from a directory listing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DirEntry {
    /// The entry's name within its parent directory.
    pub name: String,
    /// Whether the entry is a file or a directory.
    pub kind: EntryKind,
}

/// Metadata for a file or directory, read fresh on every call.
///
/// Timestamps are seconds since the Unix epoch as `f64`; platforms that
/// cannot report a creation time report `0.0`. Permissions are the low
/// nine mode bits rendered as a three-digit octal string.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileMetadata {
    /// Size in bytes.
    pub size: u64,
    /// Creation time, seconds since the Unix epoch.
    pub created: f64,
    /// Last modification time, seconds since the Unix epoch.
    pub modified: f64,
    /// Last access time, seconds since the Unix epoch.
    pub accessed: f64,
    /// True if the path is a directory.
    pub is_directory: bool,
    /// True if the path is a regular file.
    pub is_file: bool,
    /// Octal permission string, e.g. `"644"`.
    pub permissions: String,
}

/// Per-item outcome of a batch read: the originating path plus either the
/// file's content or a rendered error message.
#[derive(Debug, Clone)]
pub struct ReadOutcome {
    /// The path as supplied by the caller, for correlation.
    pub path: PathBuf,
    /// The file's text, or the error message for this item.
    pub result: Result<String, String>,
}

/// List the entries of a directory.
///
/// Entries come back in the platform's native `read_dir` enumeration
/// order; no sorting is applied. Symlinked entries are classified by
/// their resolved target's type; a broken symlink is reported as a file.
///
/// # Errors
///
/// [`OpError::OutOfBounds`], [`OpError::NotFound`] if the directory does
/// not exist, [`OpError::InvalidType`] if the path is not a directory.
pub fn list_directory(roots: &AllowedRoots, path: &Path) -> OpResult<Vec<DirEntry>> {
    let resolved = roots.validate(path)?;
    let meta = metadata_of(&resolved, path)?;
    if !meta.is_dir() {
        return Err(OpError::InvalidType {
            path: path.to_path_buf(),
            expected: "directory",
        });
    }

    let mut entries = Vec::new();
    for entry in fs::read_dir(&resolved)? {
        let entry = entry?;
        let kind = match fs::metadata(entry.path()) {
            Ok(m) if m.is_dir() => EntryKind::Directory,
            // Regular files, special files, and broken symlinks.
            _ => EntryKind::File,
        };
        entries.push(DirEntry {
            name: entry.file_name().to_string_lossy().into_owned(),
            kind,
        });
    }
    Ok(entries)
}

/// Read metadata for a file or directory.
///
/// # Errors
///
/// [`OpError::OutOfBounds`], [`OpError::NotFound`] if the path does not
/// exist.
pub fn get_file_info(roots: &AllowedRoots, path: &Path) -> OpResult<FileMetadata> {
    let resolved = roots.validate(path)?;
    let meta = metadata_of(&resolved, path)?;
    Ok(FileMetadata {
        size: meta.len(),
        created: timestamp(meta.created()),
        modified: timestamp(meta.modified()),
        accessed: timestamp(meta.accessed()),
        is_directory: meta.is_dir(),
        is_file: meta.is_file(),
        permissions: permission_bits(&meta),
    })
}

/// Read the complete content of a regular file as UTF-8 text.
///
/// # Errors
///
/// [`OpError::OutOfBounds`], [`OpError::NotFound`],
/// [`OpError::InvalidType`] if the path is a directory,
/// [`OpError::ReadFailure`] if the bytes are not valid UTF-8.
pub fn read_file(roots: &AllowedRoots, path: &Path) -> OpResult<String> {
    let resolved = roots.validate(path)?;
    read_text(&resolved, path)
}

/// Read several files in one call, best-effort.
///
/// Each path is validated and read independently; one item's failure is
/// captured as its error message and never aborts the rest. The output
/// order matches the input order.
pub fn read_multiple_files(roots: &AllowedRoots, paths: &[PathBuf]) -> Vec<ReadOutcome> {
    paths
        .iter()
        .map(|path| ReadOutcome {
            path: path.clone(),
            result: read_file(roots, path).map_err(|e| e.to_string()),
        })
        .collect()
}

/// Create a file with the given content, or completely overwrite it if it
/// already exists. No merge, no backup.
///
/// The parent directory must already exist; this operation never creates
/// intermediate directories. The content is written to a temporary file
/// in the parent directory and renamed over the target, so a mid-write
/// failure leaves any previous content intact. An overwritten file keeps
/// its permission bits; a new file is created with mode `0o644` on unix.
///
/// # Errors
///
/// [`OpError::OutOfBounds`], [`OpError::InvalidTarget`] if the parent
/// directory does not exist, [`OpError::InvalidType`] if the path is an
/// existing directory.
pub fn write_file(roots: &AllowedRoots, path: &Path, content: &str) -> OpResult<()> {
    let resolved = roots.validate(path)?;
    let parent = resolved
        .parent()
        .filter(|p| p.is_dir())
        .ok_or_else(|| {
            OpError::InvalidTarget(format!("directory for {} does not exist", path.display()))
        })?
        .to_path_buf();
    if resolved.is_dir() {
        return Err(OpError::InvalidType {
            path: path.to_path_buf(),
            expected: "file",
        });
    }
    write_atomic(&resolved, &parent, content)?;
    tracing::debug!(path = %resolved.display(), bytes = content.len(), "wrote file");
    Ok(())
}

/// Create a directory, including any missing intermediate directories.
///
/// Succeeds silently if the directory already exists.
///
/// # Errors
///
/// [`OpError::OutOfBounds`], [`OpError::InvalidTarget`] if a
/// non-directory entry already occupies the path.
pub fn create_directory(roots: &AllowedRoots, path: &Path) -> OpResult<()> {
    let resolved = roots.validate(path)?;
    if let Ok(meta) = fs::symlink_metadata(&resolved) {
        if meta.is_dir() {
            return Ok(());
        }
        return Err(OpError::InvalidTarget(format!(
            "{} exists and is not a directory",
            path.display()
        )));
    }
    fs::create_dir_all(&resolved)?;
    tracing::debug!(path = %resolved.display(), "created directory");
    Ok(())
}

/// Move or rename a file or directory.
///
/// The destination must not already exist; there is no implicit
/// overwrite. Uses the OS `rename`, which is atomic on a single
/// filesystem; a cross-device move is not emulated and surfaces the OS
/// error.
///
/// Both endpoints are canonicalized before the rename, so naming a
/// symlink as the source relocates the link's resolved target and leaves
/// the link itself behind, dangling.
///
/// # Errors
///
/// [`OpError::OutOfBounds`] for either endpoint, [`OpError::NotFound`] if
/// the source does not exist, [`OpError::AlreadyExists`] if the
/// destination does.
pub fn move_file(roots: &AllowedRoots, source: &Path, destination: &Path) -> OpResult<()> {
    let resolved_source = roots.validate(source)?;
    let resolved_dest = roots.validate(destination)?;

    if fs::symlink_metadata(&resolved_source).is_err() {
        return Err(OpError::NotFound(source.to_path_buf()));
    }
    if fs::symlink_metadata(&resolved_dest).is_ok() {
        return Err(OpError::AlreadyExists(destination.to_path_buf()));
    }

    fs::rename(&resolved_source, &resolved_dest)?;
    tracing::debug!(
        source = %resolved_source.display(),
        destination = %resolved_dest.display(),
        "moved path"
    );
    Ok(())
}

/// Stat a validated path, mapping a missing entry to [`OpError::NotFound`]
/// carrying the caller's original path.
fn metadata_of(resolved: &Path, original: &Path) -> OpResult<fs::Metadata> {
    fs::metadata(resolved).map_err(|e| {
        if e.kind() == io::ErrorKind::NotFound {
            OpError::NotFound(original.to_path_buf())
        } else {
            OpError::Io(e)
        }
    })
}

/// Read a validated path as UTF-8 text, requiring a regular file.
pub(crate) fn read_text(resolved: &Path, original: &Path) -> OpResult<String> {
    let meta = metadata_of(resolved, original)?;
    if !meta.is_file() {
        return Err(OpError::InvalidType {
            path: original.to_path_buf(),
            expected: "file",
        });
    }
    fs::read_to_string(resolved).map_err(|e| {
        if e.kind() == io::ErrorKind::InvalidData {
            OpError::ReadFailure(original.to_path_buf())
        } else {
            OpError::Io(e)
        }
    })
}

/// Write `content` to `resolved` via a temp file in `parent` plus rename,
/// so the destination is never observed truncated.
///
/// Temp files are created with a private mode, so the target's mode is
/// carried over before the rename on overwrite; a freshly created file
/// gets `0o644` on unix.
pub(crate) fn write_atomic(resolved: &Path, parent: &Path, content: &str) -> OpResult<()> {
    let existing_perms = fs::metadata(resolved).ok().map(|m| m.permissions());
    let mut tmp = tempfile::Builder::new()
        .prefix(".rockpool-")
        .tempfile_in(parent)?;
    tmp.write_all(content.as_bytes())?;
    tmp.as_file().sync_all()?;
    if let Some(perms) = existing_perms {
        tmp.as_file().set_permissions(perms)?;
    } else {
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            tmp.as_file()
                .set_permissions(fs::Permissions::from_mode(0o644))?;
        }
    }
    tmp.persist(resolved).map_err(|e| OpError::Io(e.error))?;
    Ok(())
}

fn timestamp(time: io::Result<SystemTime>) -> f64 {
    time.ok()
        .and_then(|t| t.duration_since(UNIX_EPOCH).ok())
        .map_or(0.0, |d| d.as_secs_f64())
}

#[cfg(unix)]
fn permission_bits(meta: &fs::Metadata) -> String {
    use std::os::unix::fs::PermissionsExt;
    format!("{:03o}", meta.permissions().mode() & 0o777)
}

#[cfg(not(unix))]
fn permission_bits(meta: &fs::Metadata) -> String {
    if meta.permissions().readonly() {
        "444".to_string()
    } else {
        "666".to_string()
    }
}
