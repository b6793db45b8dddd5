//! End-to-end exercise of the operation surface against a real tempdir
//! sandbox: write, edit with diff, batch read with a failing item, and
//! containment of every operation.

use std::fs;
use std::path::PathBuf;

use rockpool::{AllowedRoots, Edit, OpError, edit_file, ops};

#[allow(clippy::expect_used, clippy::unwrap_used)]
fn sandbox() -> (tempfile::TempDir, AllowedRoots) {
    let dir = tempfile::tempdir().expect("tempdir");
    let roots = AllowedRoots::new([dir.path()]).expect("registry");
    (dir, roots)
}

#[test]
#[allow(clippy::expect_used, clippy::unwrap_used)]
fn write_edit_and_batch_read_flow() {
    let (dir, roots) = sandbox();
    let file = dir.path().join("a.txt");

    ops::write_file(&roots, &file, "hello\nworld\n").expect("write");

    let diff = edit_file(
        &roots,
        &file,
        &[Edit {
            old_text: "world".to_string(),
            new_text: "earth".to_string(),
        }],
        false,
    )
    .expect("edit");
    assert!(diff.contains("-world"), "diff: {diff}");
    assert!(diff.contains("+earth"), "diff: {diff}");
    assert_eq!(
        ops::read_file(&roots, &file).expect("read"),
        "hello\nearth\n"
    );

    let missing = dir.path().join("missing.txt");
    let outcomes = ops::read_multiple_files(&roots, &[file.clone(), missing.clone()]);
    assert_eq!(outcomes.len(), 2);
    assert_eq!(outcomes[0].path, file);
    assert_eq!(outcomes[0].result.as_deref(), Ok("hello\nearth\n"));
    assert_eq!(outcomes[1].path, missing);
    let message = outcomes[1].result.clone().expect_err("second item fails");
    assert!(message.contains("does not exist"), "message: {message}");
}

#[test]
#[allow(clippy::expect_used, clippy::unwrap_used)]
fn every_operation_rejects_out_of_bounds_paths() {
    let (_dir, roots) = sandbox();
    let outside = tempfile::tempdir().expect("tempdir");
    let p = outside.path().join("victim.txt");
    fs::write(&p, "untouchable").expect("write fixture");

    let oob = |r: Result<(), OpError>| assert!(matches!(r.unwrap_err(), OpError::OutOfBounds(_)));

    oob(ops::write_file(&roots, &p, "x"));
    oob(ops::create_directory(&roots, &outside.path().join("d")));
    oob(ops::move_file(&roots, &p, &outside.path().join("moved")));
    oob(ops::read_file(&roots, &p).map(drop));
    oob(ops::list_directory(&roots, outside.path()).map(drop));
    oob(ops::get_file_info(&roots, &p).map(drop));
    oob(edit_file(&roots, &p, &[], false).map(drop));

    // Batch read captures the violation per item instead of erroring.
    let outcomes = ops::read_multiple_files(&roots, std::slice::from_ref(&p));
    assert!(outcomes[0].result.is_err());

    // Nothing was mutated.
    assert_eq!(fs::read_to_string(&p).expect("read"), "untouchable");
}

#[test]
#[allow(clippy::expect_used, clippy::unwrap_used)]
fn move_works_across_two_allowed_roots() {
    let a = tempfile::tempdir().expect("tempdir");
    let b = tempfile::tempdir().expect("tempdir");
    let roots = AllowedRoots::new([a.path(), b.path()]).expect("registry");

    let src = a.path().join("file.txt");
    let dst = b.path().join("file.txt");
    ops::write_file(&roots, &src, "payload").expect("write");

    // Tempdirs normally share a filesystem; if this environment splits
    // them across devices the rename legitimately fails with an IO error.
    match ops::move_file(&roots, &src, &dst) {
        Ok(()) => {
            assert!(!src.exists());
            assert_eq!(ops::read_file(&roots, &dst).expect("read"), "payload");
        }
        Err(OpError::Io(_)) => {}
        Err(other) => panic!("unexpected error: {other:?}"),
    }
}

#[test]
#[allow(clippy::expect_used, clippy::unwrap_used)]
fn list_allowed_directories_reflects_configuration_order() {
    let a = tempfile::tempdir().expect("tempdir");
    let b = tempfile::tempdir().expect("tempdir");
    let roots = AllowedRoots::new([a.path(), b.path()]).expect("registry");

    let listed: Vec<PathBuf> = roots.iter().map(Into::into).collect();
    assert_eq!(listed.len(), 2);
    assert_eq!(listed[0], fs::canonicalize(a.path()).expect("canon"));
    assert_eq!(listed[1], fs::canonicalize(b.path()).expect("canon"));
}
