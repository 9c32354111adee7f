//! Moving duplicates into a quarantine folder.
//!
//! # Overview
//!
//! The [`Relocator`] moves every duplicate from under a source root to the
//! same relative location under a destination root:
//!
//! ```text
//! /S/sub/dir/file.txt  =>  /T/_duplicates/sub/dir/file.txt
//! ```
//!
//! Every path is checked to lie under the source root before anything is
//! touched. A path outside it means the caller scanned a different tree
//! than it asked to relocate from, and the whole batch is refused with
//! [`RelocateError::OutsideSourceRoot`]. Failures on individual files
//! (creating a folder, moving, an occupied destination) are recorded in the
//! [`MoveReport`] and the batch continues.
//!
//! In dry-run mode nothing is created or moved, but the report lists the
//! same moves a real run would perform.
//!
//! # Example
//!
//! ```no_run
//! use filesweeper::actions::Relocator;
//! use std::path::{Path, PathBuf};
//!
//! let duplicates = vec![PathBuf::from("/backup/photos/2019/img_001.jpg")];
//! let report = Relocator::new(false)
//!     .relocate(
//!         &duplicates,
//!         Path::new("/backup"),
//!         Path::new("/backup/_duplicates"),
//!     )
//!     .unwrap();
//!
//! for record in &report.moved {
//!     println!("{record}");
//! }
//! ```

use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use filetime::FileTime;
use serde::Serialize;
use thiserror::Error;

/// Fatal error refusing a whole relocation batch.
#[derive(Debug, Error)]
pub enum RelocateError {
    /// A duplicate does not lie under the source root it is relocated from.
    #[error("wrong source folder specified when moving duplicates: {path} is not under {root}")]
    OutsideSourceRoot {
        /// Offending duplicate path
        path: PathBuf,
        /// Source root the batch was relocated from
        root: PathBuf,
    },
}

/// Why a single file could not be moved.
#[derive(Debug, Error)]
pub enum MoveError {
    /// The destination folder could not be created.
    #[error("could not create {folder}: {source}")]
    CreateFolder {
        /// Folder that could not be created
        folder: PathBuf,
        /// The underlying I/O error
        #[source]
        source: io::Error,
    },

    /// Something already exists at the destination path.
    #[error("destination {0} already exists")]
    DestinationExists(PathBuf),

    /// The move itself failed.
    #[error("could not move {path}: {source}")]
    Move {
        /// File that could not be moved
        path: PathBuf,
        /// The underlying I/O error
        #[source]
        source: io::Error,
    },
}

/// One planned or performed move.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MoveRecord {
    /// Original location
    pub from: PathBuf,
    /// Location inside the destination root
    pub to: PathBuf,
}

impl fmt::Display for MoveRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} => {}", self.from.display(), self.to.display())
    }
}

/// A move that was attempted and failed.
#[derive(Debug)]
pub struct MoveFailure {
    /// The attempted move
    pub record: MoveRecord,
    /// What went wrong
    pub error: MoveError,
}

impl fmt::Display for MoveFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Error: {}", self.error)
    }
}

/// Outcome of a relocation batch.
#[derive(Debug, Default)]
pub struct MoveReport {
    /// Moves that succeeded (or would succeed, in dry-run mode)
    pub moved: Vec<MoveRecord>,
    /// Moves that failed
    pub failed: Vec<MoveFailure>,
}

impl MoveReport {
    /// Check if every move succeeded.
    #[must_use]
    pub fn all_succeeded(&self) -> bool {
        self.failed.is_empty()
    }

    /// Total number of attempted moves.
    #[must_use]
    pub fn total_count(&self) -> usize {
        self.moved.len() + self.failed.len()
    }

    /// Original paths of the files that are still in place after a failure.
    pub fn failed_sources(&self) -> impl Iterator<Item = &Path> {
        self.failed.iter().map(|f| f.record.from.as_path())
    }
}

/// Moves duplicates under a destination root, preserving relative paths.
#[derive(Debug, Clone, Copy, Default)]
pub struct Relocator {
    dry_run: bool,
}

impl Relocator {
    /// Create a relocator; with `dry_run` nothing on disk is changed.
    #[must_use]
    pub fn new(dry_run: bool) -> Self {
        Self { dry_run }
    }

    /// Compute where `path` lands when moved from `source_root` to `destination_root`.
    ///
    /// # Errors
    ///
    /// Returns [`RelocateError::OutsideSourceRoot`] if `path` is not strictly
    /// below `source_root`.
    pub fn destination_for(
        path: &Path,
        source_root: &Path,
        destination_root: &Path,
    ) -> Result<PathBuf, RelocateError> {
        match path.strip_prefix(source_root) {
            Ok(relative) if !relative.as_os_str().is_empty() => Ok(destination_root.join(relative)),
            _ => Err(RelocateError::OutsideSourceRoot {
                path: path.to_path_buf(),
                root: source_root.to_path_buf(),
            }),
        }
    }

    /// Move every path in `duplicates` from `source_root` to `destination_root`.
    ///
    /// # Errors
    ///
    /// Returns [`RelocateError`] without touching the filesystem if any path
    /// lies outside `source_root`. Per-file failures are reported in the
    /// returned [`MoveReport`] instead.
    pub fn relocate(
        &self,
        duplicates: &[PathBuf],
        source_root: &Path,
        destination_root: &Path,
    ) -> Result<MoveReport, RelocateError> {
        let planned = duplicates
            .iter()
            .map(|path| {
                Self::destination_for(path, source_root, destination_root).map(|to| MoveRecord {
                    from: path.clone(),
                    to,
                })
            })
            .collect::<Result<Vec<_>, _>>()
            .inspect_err(|e| log::error!("Refusing to move duplicates: {e}"))?;

        let mut report = MoveReport::default();
        for record in planned {
            match self.apply(&record) {
                Ok(()) => {
                    log::debug!(
                        "{} {}",
                        if self.dry_run { "Would move" } else { "Moved" },
                        record
                    );
                    report.moved.push(record);
                }
                Err(error) => {
                    log::warn!("Failed to move {}: {}", record.from.display(), error);
                    report.failed.push(MoveFailure { record, error });
                }
            }
        }

        log::info!(
            "{} {} file(s) to {}, {} failed",
            if self.dry_run { "Would move" } else { "Moved" },
            report.moved.len(),
            destination_root.display(),
            report.failed.len()
        );

        Ok(report)
    }

    fn apply(&self, record: &MoveRecord) -> Result<(), MoveError> {
        if record.to.symlink_metadata().is_ok() {
            return Err(MoveError::DestinationExists(record.to.clone()));
        }
        if self.dry_run {
            if let Some(folder) = record.to.parent() {
                check_creatable(folder).map_err(|source| MoveError::CreateFolder {
                    folder: folder.to_path_buf(),
                    source,
                })?;
            }
            return record
                .from
                .symlink_metadata()
                .map(|_| ())
                .map_err(|source| MoveError::Move {
                    path: record.from.clone(),
                    source,
                });
        }

        if let Some(folder) = record.to.parent() {
            if !folder.is_dir() {
                create_folder(folder, &record.from).map_err(|source| MoveError::CreateFolder {
                    folder: folder.to_path_buf(),
                    source,
                })?;
            }
        }

        move_file(&record.from, &record.to).map_err(|source| MoveError::Move {
            path: record.from.clone(),
            source,
        })
    }
}

/// Check that `folder` exists or could be created: its nearest existing
/// ancestor must be a directory.
fn check_creatable(folder: &Path) -> io::Result<()> {
    for ancestor in folder.ancestors() {
        match fs::metadata(ancestor) {
            Ok(meta) if meta.is_dir() => return Ok(()),
            Ok(_) => {
                return Err(io::Error::new(
                    io::ErrorKind::NotADirectory,
                    format!("{} is not a folder", ancestor.display()),
                ))
            }
            Err(err) if err.kind() == io::ErrorKind::NotFound => {}
            Err(err) => return Err(err),
        }
    }
    Ok(())
}

/// Create `folder` and its missing parents with the permission bits of `like`.
///
/// Owner read/write/search is always granted so the new chain stays usable.
#[cfg(unix)]
fn create_folder(folder: &Path, like: &Path) -> io::Result<()> {
    use std::os::unix::fs::{DirBuilderExt, PermissionsExt};

    let mode = (fs::metadata(like)?.permissions().mode() & 0o777) | 0o700;
    fs::DirBuilder::new().recursive(true).mode(mode).create(folder)
}

#[cfg(not(unix))]
fn create_folder(folder: &Path, _like: &Path) -> io::Result<()> {
    fs::create_dir_all(folder)
}

/// Rename `from` to `to`, copying across filesystems when needed.
fn move_file(from: &Path, to: &Path) -> io::Result<()> {
    match fs::rename(from, to) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == io::ErrorKind::CrossesDevices => {
            log::debug!("Cross-device move, copying {}", from.display());
            let metadata = fs::metadata(from)?;
            fs::copy(from, to)?;
            let mtime = FileTime::from_last_modification_time(&metadata);
            if let Err(e) = filetime::set_file_mtime(to, mtime) {
                log::warn!("Could not keep modification time of {}: {}", to.display(), e);
            }
            if let Err(e) = fs::remove_file(from) {
                // Leave exactly one copy behind.
                let _ = fs::remove_file(to);
                return Err(e);
            }
            Ok(())
        }
        Err(e) => Err(e),
    }
}
