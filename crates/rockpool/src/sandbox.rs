//! The sandbox guard: path canonicalization and containment checking.
//!
//! Every operation funnels its path arguments through
//! [`AllowedRoots::validate`] before any filesystem read or mutation.
//! Containment is decided on the canonical form of the path, never the
//! raw string, so `..` traversal, symlinks pointing outside a root, and
//! absolute-path substitution all resolve to their real target before the
//! check runs.
//!
//! Paths that do not exist yet (a file about to be written, a directory
//! about to be created) are resolved by canonicalizing their deepest
//! existing ancestor and splicing the remaining segments on lexically.
//! The remaining segments cannot contain symlinks, because nothing exists
//! there yet.

use std::fs;
use std::io;
use std::path::{Component, Path, PathBuf};

use crate::error::{OpError, OpResult};
use crate::roots::AllowedRoots;

impl AllowedRoots {
    /// Resolve `path` to its canonical absolute form and check that it is
    /// equal to, or a descendant of, one of the allowed roots.
    ///
    /// Returns the canonical path for the operation to act on.
    ///
    /// # Errors
    ///
    /// [`OpError::OutOfBounds`] if the resolved path is not contained in
    /// any root; [`OpError::Io`] if resolution itself fails.
    pub fn validate(&self, path: &Path) -> OpResult<PathBuf> {
        let resolved = resolve(path)?;
        if self.contains(&resolved) {
            Ok(resolved)
        } else {
            Err(OpError::OutOfBounds(path.to_path_buf()))
        }
    }
}

fn resolve(path: &Path) -> OpResult<PathBuf> {
    let absolute = std::path::absolute(path)?;
    match fs::canonicalize(&absolute) {
        Ok(canonical) => Ok(canonical),
        Err(e) if e.kind() == io::ErrorKind::NotFound => resolve_nonexistent(&absolute),
        Err(e) => Err(e.into()),
    }
}

/// Canonicalize the deepest existing ancestor of `absolute`, then apply
/// the remaining segments lexically (`.` dropped, `..` popped) on top of
/// it. The popped form is what the OS would create, so containment is
/// checked against the path that would actually materialize.
fn resolve_nonexistent(absolute: &Path) -> OpResult<PathBuf> {
    for ancestor in absolute.ancestors() {
        let Ok(mut resolved) = fs::canonicalize(ancestor) else {
            continue;
        };
        // `ancestors` yields lexical prefixes, so this strip cannot fail.
        let remainder = absolute.strip_prefix(ancestor).unwrap_or(absolute);
        for component in remainder.components() {
            match component {
                Component::Normal(segment) => resolved.push(segment),
                Component::ParentDir => {
                    resolved.pop();
                }
                Component::CurDir => {}
                // Prefix/RootDir cannot appear in a stripped remainder.
                Component::Prefix(_) | Component::RootDir => {}
            }
        }
        return Ok(resolved);
    }
    // Unreachable for absolute paths (the filesystem root always
    // canonicalizes), but surface a typed error rather than panicking.
    Err(OpError::NotFound(absolute.to_path_buf()))
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use std::fs;

    use tempfile::TempDir;

    use super::*;

    fn sandbox() -> (TempDir, AllowedRoots) {
        let dir = tempfile::tempdir().expect("tempdir");
        // macOS puts tempdirs behind /var -> /private/var symlinks;
        // canonicalize so test expectations compare like with like.
        let root = fs::canonicalize(dir.path()).expect("canonicalize");
        let roots = AllowedRoots::new([&root]).expect("registry");
        (dir, roots)
    }

    #[test]
    fn accepts_path_inside_root() {
        let (dir, roots) = sandbox();
        let file = dir.path().join("a.txt");
        fs::write(&file, "hi").expect("write");
        let resolved = roots.validate(&file).expect("validate");
        assert!(resolved.ends_with("a.txt"));
    }

    #[test]
    fn accepts_root_itself() {
        let (dir, roots) = sandbox();
        roots.validate(dir.path()).expect("root should validate");
    }

    #[test]
    fn accepts_nonexistent_file_with_existing_parent() {
        let (dir, roots) = sandbox();
        let resolved = roots
            .validate(&dir.path().join("new-file.txt"))
            .expect("validate");
        assert!(resolved.ends_with("new-file.txt"));
    }

    #[test]
    fn rejects_dotdot_traversal() {
        let (dir, roots) = sandbox();
        let escape = dir.path().join("..").join("outside.txt");
        let err = roots.validate(&escape).unwrap_err();
        assert!(matches!(err, OpError::OutOfBounds(_)));
    }

    #[test]
    fn rejects_traversal_through_nonexistent_segment() {
        let (dir, roots) = sandbox();
        let escape = dir
            .path()
            .join("missing")
            .join("..")
            .join("..")
            .join("etc")
            .join("passwd");
        let err = roots.validate(&escape).unwrap_err();
        assert!(matches!(err, OpError::OutOfBounds(_)));
    }

    #[test]
    fn rejects_absolute_path_outside_roots() {
        let (_dir, roots) = sandbox();
        let err = roots.validate(Path::new("/etc/passwd")).unwrap_err();
        assert!(matches!(err, OpError::OutOfBounds(_)));
    }

    #[test]
    fn rejects_sibling_directory_sharing_prefix() {
        let dir = tempfile::tempdir().expect("tempdir");
        let allowed = dir.path().join("allowed");
        let sibling = dir.path().join("allowed-2");
        fs::create_dir(&allowed).expect("mkdir");
        fs::create_dir(&sibling).expect("mkdir");
        let roots = AllowedRoots::new([&allowed]).expect("registry");
        let err = roots.validate(&sibling.join("x.txt")).unwrap_err();
        assert!(matches!(err, OpError::OutOfBounds(_)));
    }

    #[cfg(unix)]
    #[test]
    fn rejects_symlink_escaping_root() {
        let outer = tempfile::tempdir().expect("tempdir");
        let secret = outer.path().join("secret.txt");
        fs::write(&secret, "top secret").expect("write");

        let (dir, roots) = sandbox();
        let link = dir.path().join("sneaky");
        std::os::unix::fs::symlink(&secret, &link).expect("symlink");

        let err = roots.validate(&link).unwrap_err();
        assert!(matches!(err, OpError::OutOfBounds(_)));
    }

    #[cfg(unix)]
    #[test]
    fn accepts_symlink_resolving_inside_root() {
        let (dir, roots) = sandbox();
        let target = dir.path().join("real.txt");
        fs::write(&target, "data").expect("write");
        let link = dir.path().join("alias");
        std::os::unix::fs::symlink(&target, &link).expect("symlink");

        let resolved = roots.validate(&link).expect("validate");
        assert!(resolved.ends_with("real.txt"));
    }

    #[test]
    fn validates_against_any_of_multiple_roots() {
        let a = tempfile::tempdir().expect("tempdir");
        let b = tempfile::tempdir().expect("tempdir");
        let roots = AllowedRoots::new([a.path(), b.path()]).expect("registry");
        roots.validate(&a.path().join("x")).expect("root a");
        roots.validate(&b.path().join("y")).expect("root b");
    }
}
