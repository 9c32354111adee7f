use filesweeper::duplicates::{resolve, Criterion, MetadataComparator};
use filesweeper::scanner::{ScanConfig, Scanner};
use filetime::{set_file_mtime, FileTime};
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::tempdir;

fn write(path: &Path, content: &[u8]) {
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, content).unwrap();
}

fn find(source: &Path, target: Option<&Path>, criteria: &[Criterion]) -> Vec<PathBuf> {
    let scanner = Scanner::new(ScanConfig::default());
    let source = scanner.scan(source).unwrap();
    let target = target.map(|t| scanner.scan(t).unwrap());
    let mut comparator = MetadataComparator::new(criteria.iter().copied());
    resolve(&source, target.as_ref(), &mut comparator)
}

#[test]
fn test_single_tree_end_to_end() {
    let dir = tempdir().unwrap();
    let src = dir.path().join("src");
    write(&src.join("a.txt"), &[1; 100]);
    write(&src.join("sub/a.txt"), &[1; 100]);

    let duplicates = find(&src, None, &[Criterion::Size, Criterion::Hash]);

    assert_eq!(duplicates, vec![src.join("sub/a.txt")]);
}

#[test]
fn test_two_tree_reports_target_side() {
    let dir = tempdir().unwrap();
    let s = dir.path().join("S");
    let t = dir.path().join("T");
    write(&s.join("x.txt"), b"identical");
    write(&t.join("x.txt"), b"identical");

    let duplicates = find(&s, Some(&t), &[Criterion::Size, Criterion::Hash]);

    assert_eq!(duplicates, vec![t.join("x.txt")]);
}

#[test]
fn test_two_tree_never_reports_source_copies() {
    let dir = tempdir().unwrap();
    let s = dir.path().join("S");
    let t = dir.path().join("T");
    write(&s.join("a/x.txt"), b"same");
    write(&s.join("b/x.txt"), b"same");
    write(&t.join("x.txt"), b"same");

    let duplicates = find(&s, Some(&t), &[Criterion::Size, Criterion::Hash]);

    assert_eq!(duplicates, vec![t.join("x.txt")]);
}

#[test]
fn test_different_sizes_never_duplicates() {
    let dir = tempdir().unwrap();
    write(&dir.path().join("a/x.txt"), b"short");
    write(&dir.path().join("b/x.txt"), b"a bit longer");

    assert!(find(dir.path(), None, &[Criterion::Size]).is_empty());
}

#[test]
fn test_equal_content_different_names_not_matched() {
    let dir = tempdir().unwrap();
    write(&dir.path().join("one.txt"), b"same");
    write(&dir.path().join("two.txt"), b"same");

    assert!(find(dir.path(), None, &Criterion::ALL).is_empty());
}

#[test]
fn test_mtime_criterion() {
    let dir = tempdir().unwrap();
    let a = dir.path().join("a/x.txt");
    let b = dir.path().join("b/x.txt");
    let c = dir.path().join("c/x.txt");
    for path in [&a, &b, &c] {
        write(path, b"same");
    }
    set_file_mtime(&a, FileTime::from_unix_time(1_600_000_000, 0)).unwrap();
    set_file_mtime(&b, FileTime::from_unix_time(1_600_000_000, 0)).unwrap();
    set_file_mtime(&c, FileTime::from_unix_time(1_700_000_000, 0)).unwrap();

    let duplicates = find(dir.path(), None, &Criterion::ALL);

    assert_eq!(duplicates, vec![b]);
}

#[test]
fn test_output_is_name_ascending() {
    let dir = tempdir().unwrap();
    for name in ["zeta.txt", "alpha.txt", "mid.txt"] {
        write(&dir.path().join("one").join(name), name.as_bytes());
        write(&dir.path().join("two").join(name), name.as_bytes());
    }

    let duplicates = find(dir.path(), None, &[Criterion::Hash]);
    let names: Vec<_> = duplicates
        .iter()
        .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
        .collect();

    assert_eq!(names, vec!["alpha.txt", "mid.txt", "zeta.txt"]);
    assert!(duplicates.iter().all(|p| p.starts_with(dir.path().join("two"))));
}
