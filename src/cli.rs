//! Command-line interface definitions for filesweeper.
//!
//! # Example
//!
//! ```bash
//! # List duplicates inside one tree
//! filesweeper ~/Pictures
//!
//! # List files in the backup that already exist in the originals
//! filesweeper ~/Pictures /mnt/backup/Pictures
//!
//! # Show what a move would do, without touching anything
//! filesweeper -d -m ~/Pictures /mnt/backup/Pictures
//!
//! # Move them to /mnt/backup/Pictures/_duplicates and prune empty folders
//! filesweeper -m ~/Pictures /mnt/backup/Pictures
//! ```

use std::io;
use std::path::{Path, PathBuf};

use clap::{Parser, ValueEnum};
use thiserror::Error;

use crate::config::ConfigError;
use crate::duplicates::Criterion;

/// Find duplicate files and sweep them into a quarantine folder.
///
/// With one folder, files sharing a name and matching on the configured
/// criteria are duplicates of the first one found. With two folders, files
/// in TARGET that already exist in SOURCE are duplicates.
#[derive(Debug, Parser)]
#[command(name = "filesweeper")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Folder to deduplicate, or the reference folder when TARGET is given
    #[arg(value_name = "SOURCE")]
    pub source: PathBuf,

    /// Folder whose copies of SOURCE files are duplicates
    #[arg(value_name = "TARGET")]
    pub target: Option<PathBuf>,

    /// Simulate: change nothing, print the planned moves and deletions
    #[arg(short, long)]
    pub debug: bool,

    /// Move duplicates to the quarantine folder, then prune empty folders
    #[arg(short = 'm', long = "move")]
    pub move_files: bool,

    /// Increase verbosity level (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Only log errors and hide progress
    #[arg(short, long, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Disable colored output
    #[arg(long, env = "NO_COLOR")]
    pub no_color: bool,

    /// Config file (default: ./filesweeper.toml, then the user config directory)
    #[arg(short, long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Skip files smaller than this many kilobytes
    #[arg(long, value_name = "KB")]
    pub min_size: Option<u64>,

    /// Comparison criteria, comma separated
    #[arg(long, value_name = "LIST", value_enum, value_delimiter = ',')]
    pub criteria: Option<Vec<Criterion>>,

    /// Name of the quarantine folder
    #[arg(long, value_name = "NAME")]
    pub move_to: Option<String>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "text")]
    pub output: OutputFormat,

    /// Print fatal errors as JSON on stderr
    #[arg(long)]
    pub json_errors: bool,
}

/// Output format for the run report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human readable lists
    Text,
    /// A single JSON object
    Json,
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutputFormat::Text => write!(f, "text"),
            OutputFormat::Json => write!(f, "json"),
        }
    }
}

/// Problems with the invocation itself. Nothing has been scanned yet.
#[derive(Debug, Error)]
pub enum UsageError {
    /// A root does not exist.
    #[error("folder {0} does not exist")]
    Missing(PathBuf),

    /// A root could not be resolved.
    #[error("cannot access {path}: {source}")]
    Inaccessible {
        /// Root as given
        path: PathBuf,
        /// The underlying I/O error
        #[source]
        source: io::Error,
    },

    /// A root is not a directory.
    #[error("{0} is not a folder")]
    NotADirectory(PathBuf),

    /// Source and target resolve to the same folder.
    #[error("source and target are the same folder: {0}")]
    SameRoot(PathBuf),

    /// One root lies inside the other.
    #[error("{inner} is inside {outer}; source and target must be separate trees")]
    NestedRoots {
        /// Enclosing root
        outer: PathBuf,
        /// Nested root
        inner: PathBuf,
    },

    /// The configuration could not be built.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Several of the above at once.
    #[error("{}", join_lines(.0))]
    Multiple(Vec<UsageError>),
}

fn join_lines(errors: &[UsageError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("\n")
}

/// Canonical, validated roots.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Roots {
    /// Source root
    pub source: PathBuf,
    /// Target root, for two-tree mode
    pub target: Option<PathBuf>,
}

impl Roots {
    /// Whether two trees are compared.
    #[must_use]
    pub fn is_two_tree(&self) -> bool {
        self.target.is_some()
    }
}

impl Cli {
    /// Resolve and check the SOURCE and TARGET arguments.
    ///
    /// Every root problem is reported, not only the first.
    ///
    /// # Errors
    ///
    /// Returns a [`UsageError`] if a root is missing or not a folder, or if
    /// the roots are equal or nested.
    pub fn roots(&self) -> Result<Roots, UsageError> {
        let source = canonical_dir(&self.source);
        let target = self.target.as_deref().map(canonical_dir).transpose();

        let (source, target) = match (source, target) {
            (Ok(source), Ok(target)) => (source, target),
            (Err(a), Err(b)) => return Err(UsageError::Multiple(vec![a, b])),
            (Err(e), _) | (_, Err(e)) => return Err(e),
        };

        if let Some(target) = &target {
            if *target == source {
                return Err(UsageError::SameRoot(source));
            }
            if target.starts_with(&source) {
                return Err(UsageError::NestedRoots {
                    outer: source,
                    inner: target.clone(),
                });
            }
            if source.starts_with(target) {
                return Err(UsageError::NestedRoots {
                    outer: target.clone(),
                    inner: source,
                });
            }
        }

        Ok(Roots { source, target })
    }
}

fn canonical_dir(path: &Path) -> Result<PathBuf, UsageError> {
    let canonical = path.canonicalize().map_err(|source| match source.kind() {
        io::ErrorKind::NotFound => UsageError::Missing(path.to_path_buf()),
        _ => UsageError::Inaccessible {
            path: path.to_path_buf(),
            source,
        },
    })?;
    if canonical.is_dir() {
        Ok(canonical)
    } else {
        Err(UsageError::NotADirectory(path.to_path_buf()))
    }
}
