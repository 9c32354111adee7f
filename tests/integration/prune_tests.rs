use filesweeper::actions::{DeleteRecord, PruneConfig, Pruner};
use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::tempdir;
use walkdir::WalkDir;

fn write(path: &Path) {
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, b"x").unwrap();
}

fn pruner(dry_run: bool) -> Pruner {
    Pruner::new(PruneConfig {
        deletable_names: [".DS_Store", "Thumbs.db", "desktop.ini"]
            .into_iter()
            .map(OsString::from)
            .collect(),
        dry_run,
        ..Default::default()
    })
}

fn listing(root: &Path) -> Vec<PathBuf> {
    WalkDir::new(root)
        .sort_by_file_name()
        .into_iter()
        .map(|e| e.unwrap().path().strip_prefix(root).unwrap().to_path_buf())
        .collect()
}

#[test]
fn test_junk_only_folder_fully_removed() {
    let dir = tempdir().unwrap();
    let root = dir.path();
    write(&root.join("album/Thumbs.db"));
    write(&root.join("album/desktop.ini"));
    fs::create_dir_all(root.join("album/empty/deeper")).unwrap();

    let report = pruner(false).prune(root);

    assert!(report.failed.is_empty());
    assert_eq!(report.file_count(), 2);
    assert_eq!(report.folder_count(), 3);
    assert_eq!(
        report.deleted.last(),
        Some(&DeleteRecord::Folder(root.join("album")))
    );
    assert_eq!(listing(root), vec![PathBuf::new()]);
}

#[test]
fn test_real_file_blocks_removal() {
    let dir = tempdir().unwrap();
    let root = dir.path();
    write(&root.join("album/photo.jpg"));
    write(&root.join("album/.DS_Store"));

    let report = pruner(false).prune(root);

    assert_eq!(
        report.deleted,
        vec![DeleteRecord::File(root.join("album/.DS_Store"))]
    );
    assert!(root.join("album/photo.jpg").exists());
}

#[test]
fn test_dry_run_purity() {
    let build = |root: &Path| {
        write(&root.join("a/Thumbs.db"));
        write(&root.join("a/b/.DS_Store"));
        write(&root.join("c/keep.txt"));
        fs::create_dir_all(root.join("d/e")).unwrap();
        write(&root.join("_duplicates/a/x.txt"));
    };

    let dry = tempdir().unwrap();
    build(dry.path());
    let before = listing(dry.path());
    let dry_report = pruner(true).prune(dry.path());
    assert_eq!(listing(dry.path()), before);

    let real = tempdir().unwrap();
    build(real.path());
    let real_report = pruner(false).prune(real.path());

    let relative = |records: &[DeleteRecord], base: &Path| -> Vec<String> {
        records
            .iter()
            .map(|r| format!("{:?}", r.path().strip_prefix(base).unwrap()))
            .collect()
    };
    assert_eq!(
        relative(&dry_report.deleted, dry.path()),
        relative(&real_report.deleted, real.path())
    );
    assert!(real.path().join("_duplicates/a/x.txt").exists());
    assert!(real.path().join("c/keep.txt").exists());
    assert!(!real.path().join("a").exists());
    assert!(!real.path().join("d").exists());
}

#[cfg(unix)]
#[test]
fn test_unreadable_folder_is_recorded_and_siblings_pruned() {
    use std::os::unix::fs::PermissionsExt;

    let dir = tempdir().unwrap();
    let root = dir.path();
    let locked = root.join("locked");
    write(&locked.join("inner.txt"));
    fs::create_dir_all(root.join("empty")).unwrap();
    fs::set_permissions(&locked, fs::Permissions::from_mode(0o000)).unwrap();

    // Root ignores permission bits; nothing to observe then.
    if fs::read_dir(&locked).is_ok() {
        fs::set_permissions(&locked, fs::Permissions::from_mode(0o755)).unwrap();
        return;
    }

    let report = pruner(false).prune(root);
    fs::set_permissions(&locked, fs::Permissions::from_mode(0o755)).unwrap();

    assert_eq!(report.failed.len(), 1);
    assert_eq!(report.failed[0].path(), locked.as_path());
    assert_eq!(report.deleted, vec![DeleteRecord::Folder(root.join("empty"))]);
    assert!(locked.join("inner.txt").exists());
}
