use clap::Parser;
use filesweeper::cli::Cli;
use filesweeper::config::{Config, ConfigError, ENV_PREFIX};
use filesweeper::duplicates::Criterion;
use std::fs;
use tempfile::tempdir;

use crate::ENV_MUTEX;

fn clear_env() {
    for (key, _) in std::env::vars() {
        if key.starts_with(ENV_PREFIX) {
            std::env::remove_var(key);
        }
    }
}

#[test]
fn test_config_load_from_toml() {
    let _lock = ENV_MUTEX.lock().unwrap();
    clear_env();
    let dir = tempdir().unwrap();
    let path = dir.path().join("config.toml");
    fs::write(
        &path,
        r#"
min_size = 4
ignore = [".git"]
delete = ["Thumbs.db", ".DS_Store"]
params = ["size", "last_modified"]
move_to_folder = "/_dupes"
"#,
    )
    .unwrap();

    let config = Config::load_from_path(&path).unwrap();

    assert_eq!(config.min_size, 4);
    assert_eq!(config.ignore, vec![".git"]);
    assert_eq!(config.delete, vec!["Thumbs.db", ".DS_Store"]);
    assert_eq!(config.params, vec![Criterion::Size, Criterion::LastModified]);
    assert_eq!(config.move_to_folder, "_dupes");
}

#[test]
fn test_hierarchy_defaults_file_env_cli() {
    let _lock = ENV_MUTEX.lock().unwrap();
    clear_env();
    let dir = tempdir().unwrap();
    let path = dir.path().join("config.toml");
    fs::write(&path, "min_size = 8\nmove_to_folder = \"_from_file\"\n").unwrap();

    // File over defaults
    let config = Config::load_from_path(&path).unwrap();
    assert_eq!(config.min_size, 8);
    assert_eq!(config.params, Config::default().params);

    // Environment over file
    std::env::set_var("FILESWEEPER_MIN_SIZE", "16");
    let config = Config::load_from_path(&path).unwrap();
    assert_eq!(config.min_size, 16);
    assert_eq!(config.move_to_folder, "_from_file");

    // Command line over environment
    let cli = Cli::try_parse_from([
        "filesweeper",
        "/src",
        "--min-size",
        "32",
        "--criteria",
        "hash",
        "--move-to",
        "_from_cli",
    ])
    .unwrap();
    let config = config.merge_cli(&cli).unwrap();
    assert_eq!(config.min_size, 32);
    assert_eq!(config.params, vec![Criterion::Hash]);
    assert_eq!(config.move_to_folder, "_from_cli");

    clear_env();
}

#[test]
fn test_explicit_missing_file_is_error() {
    let _lock = ENV_MUTEX.lock().unwrap();
    let dir = tempdir().unwrap();
    let result = Config::load(Some(&dir.path().join("nope.toml")));
    assert!(matches!(result, Err(ConfigError::NotFound(_))));
}

#[test]
fn test_bad_criterion_is_error() {
    let _lock = ENV_MUTEX.lock().unwrap();
    clear_env();
    let dir = tempdir().unwrap();
    let path = dir.path().join("config.toml");
    fs::write(&path, "params = [\"size\", \"md5\"]\n").unwrap();

    assert!(matches!(
        Config::load_from_path(&path),
        Err(ConfigError::Invalid(_))
    ));
}

#[test]
fn test_bad_quarantine_name_is_error() {
    let _lock = ENV_MUTEX.lock().unwrap();
    clear_env();
    let dir = tempdir().unwrap();
    let path = dir.path().join("config.toml");
    fs::write(&path, "move_to_folder = \"a/b\"\n").unwrap();

    assert!(matches!(
        Config::load_from_path(&path),
        Err(ConfigError::QuarantineFolder(_))
    ));
}

#[test]
fn test_unknown_key_still_loads() {
    let _lock = ENV_MUTEX.lock().unwrap();
    clear_env();
    let dir = tempdir().unwrap();
    let path = dir.path().join("config.toml");
    // 'delet' is a typo for 'delete'
    fs::write(&path, "delet = [\"Thumbs.db\"]\nmin_size = 2\n").unwrap();

    let config = Config::load_from_path(&path).unwrap();
    assert!(config.delete.is_empty());
    assert_eq!(config.min_size, 2);
}
