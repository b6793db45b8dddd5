//! The text patch engine: exact-match edits with unified-diff output.

use std::path::Path;

use serde::{Deserialize, Serialize};
use similar::TextDiff;

use crate::error::{OpError, OpResult};
use crate::ops::{read_text, write_atomic};
use crate::roots::AllowedRoots;

/// One textual edit: replace an exact occurrence of `old_text` with
/// `new_text`.
///
/// `old_text` is a literal substring, not a pattern. When it occurs more
/// than once, only the first occurrence is replaced; this keeps repeated
/// substrings deterministic and is a deliberate policy choice.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Edit {
    /// The exact text to find in the file's current content.
    #[serde(rename = "oldText")]
    pub old_text: String,
    /// The replacement text.
    #[serde(rename = "newText")]
    pub new_text: String,
}

/// Apply an ordered batch of edits to a file and return a unified diff of
/// the change.
///
/// Each edit operates on the content as already modified by the edits
/// before it. If any edit's `old_text` is absent from the working buffer,
/// the whole batch fails and the on-disk file is left byte-for-byte
/// unchanged. With `dry_run` the diff of the would-be change is returned
/// and the filesystem is never touched.
///
/// On a real (non-dry-run) apply, the new content is written via a temp
/// file plus rename, the same crash-safe path as
/// [`write_file`](crate::ops::write_file).
///
/// # Errors
///
/// [`OpError::OutOfBounds`], [`OpError::NotFound`],
/// [`OpError::InvalidType`] if the path is not a regular file,
/// [`OpError::ReadFailure`] on non-UTF-8 content, and
/// [`OpError::EditConflict`] naming the first unmatched `old_text`.
pub fn edit_file(
    roots: &AllowedRoots,
    path: &Path,
    edits: &[Edit],
    dry_run: bool,
) -> OpResult<String> {
    let resolved = roots.validate(path)?;
    let original = read_text(&resolved, path)?;

    let mut working = original.clone();
    for edit in edits {
        if !working.contains(&edit.old_text) {
            return Err(OpError::EditConflict(edit.old_text.clone()));
        }
        working = working.replacen(&edit.old_text, &edit.new_text, 1);
    }

    let diff = TextDiff::from_lines(&original, &working)
        .unified_diff()
        .context_radius(3)
        .header(
            &format!("{} (original)", path.display()),
            &format!("{} (modified)", path.display()),
        )
        .to_string();

    if !dry_run && working != original {
        let parent = resolved.parent().ok_or_else(|| {
            OpError::InvalidTarget(format!("directory for {} does not exist", path.display()))
        })?;
        write_atomic(&resolved, parent, &working)?;
        tracing::debug!(path = %resolved.display(), edits = edits.len(), "applied edits");
    }

    Ok(diff)
}
