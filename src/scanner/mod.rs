//! Scanner module for directory inventory and file hashing.
//!
//! This module provides functionality for:
//! - Recursive, post-order directory walking into an [`Inventory`]
//! - Content hashing with BLAKE3
//!
//! # Architecture
//!
//! The scanner is divided into submodules:
//! - [`walker`]: Directory traversal and file discovery
//! - [`hasher`]: BLAKE3 file hashing (streaming)
//!
//! # Folder numbering
//!
//! Every visited folder receives a [`FolderId`]. Ids start at 1 and are
//! handed out in post-order: a folder is numbered only after all of its
//! subfolders have been numbered, so a parent's id is always greater than
//! the ids of its descendants. A file's absolute path is rebuilt as
//! `folders[id] / name`.
//!
//! # Example
//!
//! ```no_run
//! use filesweeper::scanner::{ScanConfig, Scanner};
//! use std::path::Path;
//!
//! let config = ScanConfig {
//!     min_size_kb: 1, // Skip files under 1KB
//!     ..Default::default()
//! };
//!
//! let inventory = Scanner::new(config).scan(Path::new("/data")).unwrap();
//! for record in &inventory.files {
//!     println!("{}", inventory.path_of(record).unwrap().display());
//! }
//! ```

pub mod hasher;
pub mod walker;

use std::collections::HashSet;
use std::ffi::{OsStr, OsString};
use std::path::{Path, PathBuf};

// Re-export main types
pub use hasher::{hash_to_hex, Hash, Hasher};
pub use walker::Scanner;

/// Name of the quarantine folder used when none is configured.
pub const DEFAULT_QUARANTINE_FOLDER: &str = "_duplicates";

/// Identifier of a folder within one scan session.
///
/// Ids are assigned sequentially from 1 in post-order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct FolderId(u32);

impl FolderId {
    /// The first id handed out by a scan session.
    pub const FIRST: FolderId = FolderId(1);

    /// Wrap a raw id. Ids start at 1.
    #[must_use]
    pub const fn new(raw: u32) -> Self {
        assert!(raw > 0, "folder ids start at 1");
        Self(raw)
    }

    /// Raw numeric value of the id.
    #[must_use]
    pub fn get(self) -> u32 {
        self.0
    }

    fn index(self) -> usize {
        (self.0 - 1) as usize
    }
}

impl std::fmt::Display for FolderId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A file discovered while scanning.
///
/// Only the bare file name and the id of its parent folder are kept; the
/// absolute path is recovered through [`Inventory::path_of`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FileRecord {
    /// File name (last path component)
    pub name: OsString,
    /// Id of the folder containing the file
    pub folder: FolderId,
}

impl FileRecord {
    /// Create a new FileRecord.
    #[must_use]
    pub fn new(name: impl Into<OsString>, folder: FolderId) -> Self {
        Self {
            name: name.into(),
            folder,
        }
    }
}

/// The complete set of file and folder records produced by scanning one tree.
#[derive(Debug, Default)]
pub struct Inventory {
    /// Root the inventory was built from
    pub root: PathBuf,
    /// Recorded files, in folder-completion order
    pub files: Vec<FileRecord>,
    /// Folder paths; entry `n` holds the folder with id `n + 1`
    pub folders: Vec<PathBuf>,
    /// Non-fatal errors met while walking (unreadable entries)
    pub errors: Vec<ScanError>,
}

impl Inventory {
    /// Absolute path of a folder, if the id belongs to this inventory.
    #[must_use]
    pub fn folder(&self, id: FolderId) -> Option<&Path> {
        self.folders.get(id.index()).map(PathBuf::as_path)
    }

    /// Absolute path of a recorded file.
    #[must_use]
    pub fn path_of(&self, record: &FileRecord) -> Option<PathBuf> {
        self.folder(record.folder).map(|dir| dir.join(&record.name))
    }

    /// Iterate over `(id, path)` for every visited folder.
    pub fn folders(&self) -> impl Iterator<Item = (FolderId, &Path)> {
        self.folders
            .iter()
            .enumerate()
            .map(|(i, p)| (FolderId(i as u32 + 1), p.as_path()))
    }

    /// Number of visited folders.
    #[must_use]
    pub fn folder_count(&self) -> usize {
        self.folders.len()
    }
}

/// Configuration for directory scanning.
#[derive(Debug, Clone)]
pub struct ScanConfig {
    /// Files whose size in whole kilobytes is below this are skipped.
    pub min_size_kb: u64,

    /// Entry names skipped entirely (neither recorded nor descended into).
    pub ignore_names: HashSet<OsString>,

    /// Name of the quarantine folder, always skipped.
    pub quarantine_folder: OsString,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            min_size_kb: 0,
            ignore_names: HashSet::new(),
            quarantine_folder: OsString::from(DEFAULT_QUARANTINE_FOLDER),
        }
    }
}

impl ScanConfig {
    /// Create a new scan configuration.
    ///
    /// # Arguments
    ///
    /// * `min_size_kb` - Minimum file size in whole kilobytes
    /// * `ignore_names` - Names to skip while walking
    /// * `quarantine_folder` - Quarantine folder name (always skipped)
    #[must_use]
    pub fn new<I, S>(min_size_kb: u64, ignore_names: I, quarantine_folder: &str) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<OsString>,
    {
        Self {
            min_size_kb,
            ignore_names: ignore_names.into_iter().map(Into::into).collect(),
            quarantine_folder: OsString::from(quarantine_folder),
        }
    }

    /// Whether an entry with this name is skipped during scanning.
    #[must_use]
    pub fn is_ignored(&self, name: &OsStr) -> bool {
        name == "."
            || name == ".."
            || name == self.quarantine_folder
            || self.ignore_names.contains(name)
    }

    /// Whether a file of `size` bytes is large enough to be recorded.
    #[must_use]
    pub fn passes_size_filter(&self, size: u64) -> bool {
        size / 1024 >= self.min_size_kb
    }
}

/// Errors that can occur during directory scanning.
#[derive(thiserror::Error, Debug)]
pub enum ScanError {
    /// Permission was denied when accessing a file or directory.
    #[error("Permission denied: {0}")]
    PermissionDenied(PathBuf),

    /// The specified path was not found.
    #[error("Path not found: {0}")]
    NotFound(PathBuf),

    /// The specified path is not a directory.
    #[error("Not a directory: {0}")]
    NotADirectory(PathBuf),

    /// An I/O error occurred while accessing a file.
    #[error("I/O error for {path}: {source}")]
    Io {
        /// Path where the error occurred
        path: PathBuf,
        /// The underlying I/O error
        #[source]
        source: std::io::Error,
    },
}

impl ScanError {
    /// Classify an I/O error raised for `path`.
    pub(crate) fn from_io(path: &Path, error: std::io::Error) -> Self {
        match error.kind() {
            std::io::ErrorKind::PermissionDenied => Self::PermissionDenied(path.to_path_buf()),
            std::io::ErrorKind::NotFound => Self::NotFound(path.to_path_buf()),
            _ => Self::Io {
                path: path.to_path_buf(),
                source: error,
            },
        }
    }
}

/// Errors that can occur during file hashing.
#[derive(thiserror::Error, Debug)]
pub enum HashError {
    /// The specified file was not found.
    #[error("File not found: {0}")]
    NotFound(PathBuf),

    /// Permission was denied when reading the file.
    #[error("Permission denied: {0}")]
    PermissionDenied(PathBuf),

    /// An I/O error occurred while reading the file.
    #[error("I/O error for {path}: {source}")]
    Io {
        /// Path where the error occurred
        path: PathBuf,
        /// The underlying I/O error
        #[source]
        source: std::io::Error,
    },
}
