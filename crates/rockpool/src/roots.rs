//! The allowed-roots registry.
//!
//! [`AllowedRoots`] is built once at startup from the configured root
//! directories and is immutable afterwards. Every operation borrows it
//! and asks it to validate each path argument before touching the
//! filesystem (see [`AllowedRoots::validate`]).

use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{OpError, OpResult};

/// The set of canonicalized directories the sandbox may operate within.
///
/// Construction refuses any root that does not exist or is not a
/// directory, so a misconfigured process fails at startup rather than at
/// first use. The registry never changes after construction; share it
/// with `Arc` if multiple callers need it.
#[derive(Debug, Clone)]
pub struct AllowedRoots {
    roots: Vec<PathBuf>,
}

impl AllowedRoots {
    /// Build the registry from one or more root directory paths.
    ///
    /// Each path is canonicalized (symlinks and relative segments fully
    /// resolved) and must name an existing directory.
    ///
    /// # Errors
    ///
    /// - [`OpError::InvalidTarget`] if `paths` is empty
    /// - [`OpError::NotFound`] if a root does not exist
    /// - [`OpError::InvalidType`] if a root is not a directory
    pub fn new(paths: impl IntoIterator<Item = impl AsRef<Path>>) -> OpResult<Self> {
        let mut roots = Vec::new();
        for path in paths {
            let path = path.as_ref();
            let canonical = fs::canonicalize(path).map_err(|e| {
                if e.kind() == std::io::ErrorKind::NotFound {
                    OpError::NotFound(path.to_path_buf())
                } else {
                    OpError::Io(e)
                }
            })?;
            if !canonical.is_dir() {
                return Err(OpError::InvalidType {
                    path: path.to_path_buf(),
                    expected: "directory",
                });
            }
            roots.push(canonical);
        }
        if roots.is_empty() {
            return Err(OpError::InvalidTarget(
                "at least one allowed root directory is required".to_string(),
            ));
        }
        Ok(Self { roots })
    }

    /// The canonicalized roots, in configuration order.
    pub fn iter(&self) -> impl Iterator<Item = &Path> {
        self.roots.iter().map(PathBuf::as_path)
    }

    pub(crate) fn contains(&self, resolved: &Path) -> bool {
        // Component-wise prefix check; `/allowed-2` is not inside `/allowed`.
        self.roots.iter().any(|root| resolved.starts_with(root))
    }
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn rejects_empty_registry() {
        let err = AllowedRoots::new(Vec::<PathBuf>::new()).unwrap_err();
        assert!(matches!(err, OpError::InvalidTarget(_)));
    }

    #[test]
    fn rejects_missing_root() {
        let dir = tempfile::tempdir().expect("tempdir");
        let missing = dir.path().join("nope");
        let err = AllowedRoots::new([&missing]).unwrap_err();
        assert!(matches!(err, OpError::NotFound(_)));
    }

    #[test]
    fn rejects_file_root() {
        let dir = tempfile::tempdir().expect("tempdir");
        let file = dir.path().join("root.txt");
        std::fs::write(&file, "x").expect("write");
        let err = AllowedRoots::new([&file]).unwrap_err();
        assert!(matches!(err, OpError::InvalidType { .. }));
    }

    #[test]
    fn canonicalizes_roots() {
        let dir = tempfile::tempdir().expect("tempdir");
        let sub = dir.path().join("a");
        std::fs::create_dir(&sub).expect("mkdir");
        let dotted = dir.path().join("a").join(".");
        let roots = AllowedRoots::new([&dotted]).expect("registry");
        let listed: Vec<_> = roots.iter().collect();
        assert_eq!(listed.len(), 1);
        assert!(listed[0].ends_with("a"));
    }
}
