use filesweeper::actions::{RelocateError, Relocator};
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::tempdir;
use walkdir::WalkDir;

fn write(path: &Path, content: &[u8]) {
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, content).unwrap();
}

/// Relative path, kind and content of everything under `root`.
fn snapshot(root: &Path) -> Vec<(PathBuf, bool, Vec<u8>)> {
    WalkDir::new(root)
        .sort_by_file_name()
        .into_iter()
        .map(|entry| {
            let entry = entry.unwrap();
            let relative = entry.path().strip_prefix(root).unwrap().to_path_buf();
            let is_dir = entry.file_type().is_dir();
            let content = if is_dir {
                Vec::new()
            } else {
                fs::read(entry.path()).unwrap()
            };
            (relative, is_dir, content)
        })
        .collect()
}

#[test]
fn test_move_preserves_relative_structure() {
    let dir = tempdir().unwrap();
    let s = dir.path().join("S");
    let t = dir.path().join("T");
    let dup = s.join("sub/dir/file.txt");
    write(&dup, b"payload");
    fs::create_dir_all(&t).unwrap();

    let quarantine = t.join("_duplicates");
    let report = Relocator::new(false)
        .relocate(&[dup.clone()], &s, &quarantine)
        .unwrap();

    assert_eq!(report.moved.len(), 1);
    assert_eq!(report.moved[0].to, quarantine.join("sub/dir/file.txt"));
    assert_eq!(fs::read(quarantine.join("sub/dir/file.txt")).unwrap(), b"payload");
    assert!(!dup.exists());
}

#[test]
fn test_outside_root_is_fatal_and_untouched() {
    let dir = tempdir().unwrap();
    let s = dir.path().join("S");
    let other = dir.path().join("other/file.txt");
    let inside = s.join("a.txt");
    write(&inside, b"a");
    write(&other, b"b");
    let before = snapshot(dir.path());

    let result = Relocator::new(false).relocate(&[inside, other], &s, &s.join("_duplicates"));

    match result {
        Err(RelocateError::OutsideSourceRoot { path, root }) => {
            assert_eq!(path, dir.path().join("other/file.txt"));
            assert_eq!(root, s);
        }
        other => panic!("expected a structural error, got {other:?}"),
    }
    assert_eq!(snapshot(dir.path()), before);
}

#[test]
fn test_dry_run_purity() {
    let build = |root: &Path| {
        write(&root.join("a/one.txt"), b"1");
        write(&root.join("a/b/two.txt"), b"2");
        write(&root.join("c/three.txt"), b"3");
    };
    let paths = |root: &Path| {
        vec![
            root.join("a/b/two.txt"),
            root.join("a/one.txt"),
            root.join("c/three.txt"),
        ]
    };

    let dry = tempdir().unwrap();
    build(dry.path());
    let before = snapshot(dry.path());
    let dry_report = Relocator::new(true)
        .relocate(&paths(dry.path()), dry.path(), &dry.path().join("_duplicates"))
        .unwrap();
    assert_eq!(snapshot(dry.path()), before);

    let real = tempdir().unwrap();
    build(real.path());
    let real_report = Relocator::new(false)
        .relocate(&paths(real.path()), real.path(), &real.path().join("_duplicates"))
        .unwrap();

    let relative = |records: &[filesweeper::actions::MoveRecord], base: &Path| {
        records
            .iter()
            .map(|r| {
                (
                    r.from.strip_prefix(base).unwrap().to_path_buf(),
                    r.to.strip_prefix(base).unwrap().to_path_buf(),
                )
            })
            .collect::<Vec<_>>()
    };
    assert_eq!(
        relative(&dry_report.moved, dry.path()),
        relative(&real_report.moved, real.path())
    );
    assert!(dry_report.failed.is_empty() && real_report.failed.is_empty());
}

#[test]
fn test_batch_continues_after_failure() {
    let dir = tempdir().unwrap();
    let root = dir.path();
    write(&root.join("a.txt"), b"a");
    write(&root.join("b.txt"), b"b");
    write(&root.join("c.txt"), b"c");
    write(&root.join("_duplicates/b.txt"), b"already here");

    let report = Relocator::new(false)
        .relocate(
            &[root.join("a.txt"), root.join("b.txt"), root.join("c.txt")],
            root,
            &root.join("_duplicates"),
        )
        .unwrap();

    assert_eq!(report.moved.len(), 2);
    assert_eq!(report.failed.len(), 1);
    assert_eq!(report.failed[0].record.from, root.join("b.txt"));
    assert!(root.join("b.txt").exists());
    assert!(root.join("_duplicates/c.txt").exists());
}
