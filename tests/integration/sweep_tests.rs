use clap::Parser;
use filesweeper::cli::{Cli, UsageError};
use filesweeper::config::ENV_PREFIX;
use filesweeper::error::ExitCode;
use filesweeper::run_app;
use std::fs;
use std::path::Path;
use tempfile::tempdir;

use crate::ENV_MUTEX;

fn write(path: &Path, content: &[u8]) {
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, content).unwrap();
}

fn run(args: &[&str]) -> anyhow::Result<ExitCode> {
    let _lock = ENV_MUTEX.lock().unwrap();
    for (key, _) in std::env::vars() {
        if key.starts_with(ENV_PREFIX) {
            std::env::remove_var(key);
        }
    }
    let cli = Cli::try_parse_from(std::iter::once("filesweeper").chain(args.iter().copied()))
        .unwrap();
    run_app(cli)
}

fn config_file(dir: &Path, body: &str) -> String {
    let path = dir.join("filesweeper.toml");
    fs::write(&path, body).unwrap();
    path.to_string_lossy().into_owned()
}

#[test]
fn test_move_two_trees_end_to_end() {
    let dir = tempdir().unwrap();
    let s = dir.path().join("S");
    let t = dir.path().join("T");
    write(&s.join("photos/img.jpg"), &[9; 2048]);
    write(&t.join("old/photos/img.jpg"), &[9; 2048]);
    write(&t.join("old/photos/Thumbs.db"), b"cache");
    write(&t.join("notes.txt"), b"unique");
    let config = config_file(dir.path(), "delete = [\"Thumbs.db\"]\n");

    let code = run(&[
        "-q",
        "-m",
        "-c",
        &config,
        s.to_str().unwrap(),
        t.to_str().unwrap(),
    ])
    .unwrap();

    assert_eq!(code, ExitCode::Success);
    assert!(t.join("_duplicates/old/photos/img.jpg").exists());
    assert!(!t.join("old").exists());
    assert!(t.join("notes.txt").exists());
    assert!(s.join("photos/img.jpg").exists());
}

#[test]
fn test_debug_move_changes_nothing() {
    let dir = tempdir().unwrap();
    let src = dir.path().join("src");
    write(&src.join("a.txt"), &[1; 100]);
    write(&src.join("sub/a.txt"), &[1; 100]);
    let config = config_file(dir.path(), "");

    let code = run(&["-q", "-d", "-m", "-c", &config, src.to_str().unwrap()]).unwrap();

    assert_eq!(code, ExitCode::Success);
    assert!(src.join("sub/a.txt").exists());
    assert!(!src.join("_duplicates").exists());
}

#[test]
fn test_same_root_is_usage_error() {
    let dir = tempdir().unwrap();
    let path = dir.path().to_str().unwrap();

    let err = run(&["-q", path, path]).unwrap_err();

    assert_eq!(ExitCode::for_error(&err), ExitCode::UsageError);
    assert!(matches!(
        err.downcast_ref::<UsageError>(),
        Some(UsageError::SameRoot(_))
    ));
}

#[test]
fn test_invalid_config_is_usage_error() {
    let dir = tempdir().unwrap();
    let src = dir.path().join("src");
    fs::create_dir_all(&src).unwrap();
    let config = config_file(dir.path(), "move_to_folder = \"..\"\n");

    let err = run(&["-q", "-c", &config, src.to_str().unwrap()]).unwrap_err();

    assert_eq!(ExitCode::for_error(&err), ExitCode::UsageError);
}

#[test]
fn test_failed_move_gives_partial_success() {
    let dir = tempdir().unwrap();
    let src = dir.path().join("src");
    write(&src.join("a.txt"), b"same");
    write(&src.join("sub/a.txt"), b"same");
    write(&src.join("_duplicates/sub/a.txt"), b"taken");
    let config = config_file(dir.path(), "");

    let code = run(&["-q", "-m", "-c", &config, src.to_str().unwrap()]).unwrap();

    assert_eq!(code, ExitCode::PartialSuccess);
    assert_eq!(ExitCode::PartialSuccess.as_i32(), 3);
    assert!(src.join("sub/a.txt").exists());
}
