use filesweeper::scanner::{Inventory, ScanConfig, Scanner};
use std::collections::{BTreeSet, HashMap};
use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::tempdir;

fn write(path: &Path, len: usize) {
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, vec![b'x'; len]).unwrap();
}

fn file_paths(inventory: &Inventory) -> BTreeSet<PathBuf> {
    inventory
        .files
        .iter()
        .map(|f| inventory.path_of(f).unwrap())
        .collect()
}

#[test]
fn test_scan_empty_directory() {
    let dir = tempdir().unwrap();
    let inventory = Scanner::new(ScanConfig::default()).scan(dir.path()).unwrap();

    assert!(inventory.files.is_empty());
    assert_eq!(inventory.folder_count(), 1);
    assert_eq!(inventory.folders[0], dir.path());
}

#[test]
fn test_scan_twice_is_idempotent() {
    let dir = tempdir().unwrap();
    write(&dir.path().join("a.txt"), 10);
    write(&dir.path().join("x/b.txt"), 10);
    write(&dir.path().join("x/y/c.txt"), 10);
    write(&dir.path().join("z/a.txt"), 10);

    let scanner = Scanner::new(ScanConfig::default());
    let first = scanner.scan(dir.path()).unwrap();
    let second = scanner.scan(dir.path()).unwrap();

    assert_eq!(file_paths(&first), file_paths(&second));
    assert_eq!(first.folders, second.folders);
    // Ids restart at 1 for each scan.
    assert_eq!(first.files, second.files);
}

#[test]
fn test_parent_ids_exceed_descendant_ids() {
    let dir = tempdir().unwrap();
    for rel in ["a/b/c/f.txt", "a/d/f.txt", "e/f.txt", "f.txt"] {
        write(&dir.path().join(rel), 1);
    }

    let inventory = Scanner::new(ScanConfig::default()).scan(dir.path()).unwrap();
    let ids: HashMap<&Path, u32> = inventory
        .folders()
        .map(|(id, path)| (path, id.get()))
        .collect();

    for (path, id) in &ids {
        if let Some(parent) = path.parent() {
            if let Some(parent_id) = ids.get(parent) {
                assert!(parent_id > id, "{} numbered before its child", parent.display());
            }
        }
    }
    assert_eq!(ids[dir.path()], inventory.folder_count() as u32);
}

#[test]
fn test_min_size_boundary() {
    let dir = tempdir().unwrap();
    write(&dir.path().join("small.bin"), 4 * 1024 - 1);
    write(&dir.path().join("exact.bin"), 4 * 1024);

    let config = ScanConfig {
        min_size_kb: 4,
        ..Default::default()
    };
    let inventory = Scanner::new(config).scan(dir.path()).unwrap();

    let names: Vec<_> = inventory.files.iter().map(|f| f.name.clone()).collect();
    assert_eq!(names, vec![OsString::from("exact.bin")]);
}

#[test]
fn test_ignored_and_quarantine_folders_not_visited() {
    let dir = tempdir().unwrap();
    write(&dir.path().join(".git/objects/blob"), 1);
    write(&dir.path().join("_duplicates/old/a.txt"), 1);
    write(&dir.path().join("src/a.txt"), 1);

    let config = ScanConfig::new(0, [".git"], "_duplicates");
    let inventory = Scanner::new(config).scan(dir.path()).unwrap();

    assert_eq!(
        file_paths(&inventory),
        BTreeSet::from([dir.path().join("src/a.txt")])
    );
    assert!(inventory
        .folders
        .iter()
        .all(|p| !p.starts_with(dir.path().join(".git"))
            && !p.starts_with(dir.path().join("_duplicates"))));
}

#[test]
fn test_scan_file_root_fails() {
    let dir = tempdir().unwrap();
    let file = dir.path().join("file.txt");
    write(&file, 1);

    assert!(Scanner::new(ScanConfig::default()).scan(&file).is_err());
}
