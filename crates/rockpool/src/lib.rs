//! Rockpool: sandboxed filesystem operations.
//!
//! Rockpool exposes a fixed set of file and directory operations (list,
//! read, write, batch read, text patching, mkdir, move, stat) while
//! confining every one of them to a configured set of allowed root
//! directories. Paths are canonicalized before the containment check, so
//! `..` traversal, symlinks pointing outside a root, and absolute-path
//! substitution cannot escape the sandbox.
//!
//! The library is transport-agnostic and fully synchronous: each
//! operation is one blocking filesystem action that either returns its
//! payload or a typed [`OpError`]. The `rockpool-mcp` crate wraps it in
//! an MCP server for use by AI agents.
//!
//! # Example
//!
//! ```no_run
//! use rockpool::{AllowedRoots, ops};
//!
//! # fn main() -> rockpool::OpResult<()> {
//! let roots = AllowedRoots::new(["/sandbox"])?;
//! ops::write_file(&roots, "/sandbox/a.txt".as_ref(), "hello\n")?;
//! let content = ops::read_file(&roots, "/sandbox/a.txt".as_ref())?;
//! assert_eq!(content, "hello\n");
//! # Ok(())
//! # }
//! ```

mod edit;
mod error;
mod roots;
mod sandbox;

pub mod ops;

pub use edit::{Edit, edit_file};
pub use error::{OpError, OpResult};
pub use ops::{DirEntry, EntryKind, FileMetadata, ReadOutcome};
pub use roots::AllowedRoots;
