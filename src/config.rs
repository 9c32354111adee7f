//! Layered configuration.
//!
//! Settings are resolved in this order, later sources overriding earlier ones:
//!
//! 1. built-in defaults
//! 2. a TOML file (`--config PATH`, else `./filesweeper.toml`, else the
//!    platform config directory's `config.toml`)
//! 3. `FILESWEEPER_*` environment variables
//! 4. command-line flags
//!
//! ```toml
//! min_size = 4                      # KB
//! ignore = [".git", "node_modules"]
//! delete = [".DS_Store", "Thumbs.db", "desktop.ini"]
//! params = ["size", "last_modified", "hash"]
//! move_to_folder = "_duplicates"
//! ```

use std::collections::HashSet;
use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};

use directories::ProjectDirs;
use figment::providers::{Env, Format, Serialized, Toml};
use figment::Figment;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::actions::PruneConfig;
use crate::cli::Cli;
use crate::duplicates::Criterion;
use crate::scanner::{ScanConfig, DEFAULT_QUARANTINE_FOLDER};

/// Config file looked up in the working directory.
pub const CONFIG_FILE_NAME: &str = "filesweeper.toml";

/// Prefix of environment variables overriding file settings.
pub const ENV_PREFIX: &str = "FILESWEEPER_";

const KNOWN_KEYS: [&str; 5] = ["min_size", "ignore", "delete", "params", "move_to_folder"];

/// Errors raised while building the configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// An explicitly requested config file does not exist.
    #[error("config file {0} not found")]
    NotFound(PathBuf),

    /// A config file exists but could not be read.
    #[error("cannot read config file {path}: {source}")]
    Read {
        /// Config file path
        path: PathBuf,
        /// The underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// A source held a value of the wrong shape.
    #[error("invalid configuration: {0}")]
    Invalid(#[from] Box<figment::Error>),

    /// The quarantine folder name is not a single plain folder name.
    #[error("invalid move_to_folder {0:?}: expected a single folder name")]
    QuarantineFolder(String),
}

/// Sweep settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Minimum file size in whole kilobytes.
    pub min_size: u64,
    /// Names never scanned.
    pub ignore: Vec<String>,
    /// Junk file names removed while pruning.
    pub delete: Vec<String>,
    /// Comparison criteria.
    pub params: Vec<Criterion>,
    /// Quarantine folder name, created under the swept root.
    pub move_to_folder: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            min_size: 0,
            ignore: Vec::new(),
            delete: Vec::new(),
            params: vec![Criterion::Size, Criterion::Hash],
            move_to_folder: DEFAULT_QUARANTINE_FOLDER.to_string(),
        }
    }
}

impl Config {
    /// Load the configuration, discovering the config file if `explicit` is `None`.
    ///
    /// # Errors
    ///
    /// Fails if `explicit` does not exist, a source cannot be parsed, or the
    /// resulting settings are invalid.
    pub fn load(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        let file = Self::discover(explicit)?;
        match file {
            Some(path) => Self::load_from_path(&path),
            None => Self::from_figment(Self::figment(None)),
        }
    }

    /// Load defaults, the TOML file at `path` and the environment.
    ///
    /// # Errors
    ///
    /// See [`Config::load`].
    pub fn load_from_path(path: &Path) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        for warning in unknown_key_warnings(&text) {
            log::warn!("{}: {}", path.display(), warning);
        }
        log::debug!("Loading configuration from {}", path.display());
        Self::from_figment(Self::figment(Some(path)))
    }

    /// Provider chain without command-line overrides.
    #[must_use]
    pub fn figment(file: Option<&Path>) -> Figment {
        let mut figment = Figment::from(Serialized::defaults(Config::default()));
        if let Some(path) = file {
            figment = figment.merge(Toml::file(path));
        }
        figment.merge(Env::prefixed(ENV_PREFIX))
    }

    fn from_figment(figment: Figment) -> Result<Self, ConfigError> {
        let config: Config = figment.extract().map_err(Box::new)?;
        config.validated()
    }

    /// Locate the config file to read.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::NotFound`] if `explicit` is given but missing.
    pub fn discover(explicit: Option<&Path>) -> Result<Option<PathBuf>, ConfigError> {
        if let Some(path) = explicit {
            return if path.is_file() {
                Ok(Some(path.to_path_buf()))
            } else {
                Err(ConfigError::NotFound(path.to_path_buf()))
            };
        }

        let local = PathBuf::from(CONFIG_FILE_NAME);
        if local.is_file() {
            return Ok(Some(local));
        }

        Ok(Self::default_path().filter(|p| p.is_file()))
    }

    /// Platform-specific config file location.
    #[must_use]
    pub fn default_path() -> Option<PathBuf> {
        ProjectDirs::from("", "", "filesweeper").map(|dirs| dirs.config_dir().join("config.toml"))
    }

    /// Apply command-line overrides and re-validate.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::QuarantineFolder`] if `--move-to` is invalid.
    pub fn merge_cli(mut self, cli: &Cli) -> Result<Self, ConfigError> {
        if let Some(min_size) = cli.min_size {
            self.min_size = min_size;
        }
        if let Some(criteria) = &cli.criteria {
            self.params = criteria.clone();
        }
        if let Some(folder) = &cli.move_to {
            self.move_to_folder = folder.clone();
        }
        self.validated()
    }

    /// Normalise and check settings.
    ///
    /// A leading `/` on the quarantine folder is dropped. The result must be
    /// a single path component, not `.` or `..`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::QuarantineFolder`] for anything else.
    pub fn validated(mut self) -> Result<Self, ConfigError> {
        let trimmed = self.move_to_folder.trim_start_matches('/');
        let valid = !trimmed.is_empty()
            && trimmed != "."
            && trimmed != ".."
            && !trimmed.contains(['/', '\\']);
        if !valid {
            return Err(ConfigError::QuarantineFolder(self.move_to_folder));
        }
        self.move_to_folder = trimmed.to_string();

        self.params.sort();
        self.params.dedup();
        Ok(self)
    }

    /// Scanner settings. Deletable names are skipped as well as ignored ones.
    #[must_use]
    pub fn scan_config(&self) -> ScanConfig {
        ScanConfig::new(
            self.min_size,
            self.ignore.iter().chain(&self.delete).map(OsString::from),
            &self.move_to_folder,
        )
    }

    /// Pruner settings.
    #[must_use]
    pub fn prune_config(&self, dry_run: bool) -> PruneConfig {
        PruneConfig {
            deletable_names: self.delete.iter().map(OsString::from).collect::<HashSet<_>>(),
            quarantine_folder: OsString::from(&self.move_to_folder),
            dry_run,
        }
    }
}

/// Warnings for top-level keys that are not settings, with the nearest known key.
#[must_use]
pub fn unknown_key_warnings(toml_text: &str) -> Vec<String> {
    let Ok(table) = toml_text.parse::<toml::Table>() else {
        // Syntax errors are reported by figment with better context.
        return Vec::new();
    };

    table
        .keys()
        .filter(|key| !KNOWN_KEYS.contains(&key.as_str()))
        .map(|key| match suggest_key(key) {
            Some(known) => format!("unknown setting '{key}', did you mean '{known}'?"),
            None => format!("unknown setting '{key}'"),
        })
        .collect()
}

/// Closest known setting name, if any is reasonably similar.
#[must_use]
pub fn suggest_key(unknown: &str) -> Option<&'static str> {
    KNOWN_KEYS
        .iter()
        .map(|known| (*known, strsim::jaro_winkler(unknown, known)))
        .filter(|(_, score)| *score > 0.8)
        .max_by(|a, b| a.1.total_cmp(&b.1))
        .map(|(known, _)| known)
}
