//! Removal of junk files and empty folders.
//!
//! After duplicates have been moved away, a tree is usually left with
//! folders holding nothing but thumbnail caches and desktop metadata. The
//! [`Pruner`] walks the tree post-order and:
//!
//! 1. deletes regular files whose name is on the deletable list,
//! 2. removes every folder that ends up empty.
//!
//! The quarantine folder is never entered and always counts as content, so
//! its parent is never removed. The root itself is never removed. Symlinks
//! are not followed and count as content.
//!
//! Folders listed as protected (ancestors of files that could not be moved)
//! keep their deletable files and are never removed.
//!
//! A dry run after a simulated move is told which files the move would have
//! taken away, so it plans the same removals as the real run.

use std::collections::HashSet;
use std::ffi::OsString;
use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::Serialize;
use thiserror::Error;
use walkdir::WalkDir;

use crate::scanner::DEFAULT_QUARANTINE_FOLDER;

/// Errors recorded while pruning. None of them stops the walk elsewhere.
#[derive(Debug, Error)]
pub enum PruneError {
    /// A folder could not be listed.
    #[error("could not read folder {path}: {source}")]
    ListFolder {
        /// Folder that could not be listed
        path: PathBuf,
        /// The underlying I/O error
        #[source]
        source: io::Error,
    },

    /// A deletable file could not be removed.
    #[error("could not delete file {path}: {source}")]
    DeleteFile {
        /// File that could not be removed
        path: PathBuf,
        /// The underlying I/O error
        #[source]
        source: io::Error,
    },

    /// An empty folder could not be removed.
    #[error("could not delete folder {path}: {source}")]
    DeleteFolder {
        /// Folder that could not be removed
        path: PathBuf,
        /// The underlying I/O error
        #[source]
        source: io::Error,
    },
}

/// A deleted (or, in dry-run mode, deletable) entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "path", rename_all = "lowercase")]
pub enum DeleteRecord {
    /// A junk file
    File(PathBuf),
    /// An empty folder
    Folder(PathBuf),
}

impl DeleteRecord {
    /// Path of the deleted entry.
    #[must_use]
    pub fn path(&self) -> &Path {
        match self {
            DeleteRecord::File(path) | DeleteRecord::Folder(path) => path,
        }
    }
}

impl fmt::Display for DeleteRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeleteRecord::File(path) => write!(f, "File {}", path.display()),
            DeleteRecord::Folder(path) => write!(f, "Folder {}", path.display()),
        }
    }
}

/// Outcome of a prune pass.
#[derive(Debug, Default)]
pub struct PruneReport {
    /// Entries removed, children before parents
    pub deleted: Vec<DeleteRecord>,
    /// Failures, in the order they were met
    pub failed: Vec<PruneError>,
}

impl PruneReport {
    /// Number of junk files removed.
    #[must_use]
    pub fn file_count(&self) -> usize {
        self.deleted
            .iter()
            .filter(|r| matches!(r, DeleteRecord::File(_)))
            .count()
    }

    /// Number of folders removed.
    #[must_use]
    pub fn folder_count(&self) -> usize {
        self.deleted.len() - self.file_count()
    }

    /// Get a summary string.
    #[must_use]
    pub fn summary(&self) -> String {
        format!(
            "Deleted {} file(s) and {} folder(s), {} error(s)",
            self.file_count(),
            self.folder_count(),
            self.failed.len()
        )
    }
}

/// Configuration for a [`Pruner`].
#[derive(Debug, Clone)]
pub struct PruneConfig {
    /// File names removed wherever they are found.
    pub deletable_names: HashSet<OsString>,
    /// Name of the quarantine folder, never entered.
    pub quarantine_folder: OsString,
    /// Report what would be removed without touching the disk.
    pub dry_run: bool,
}

impl Default for PruneConfig {
    fn default() -> Self {
        Self {
            deletable_names: HashSet::new(),
            quarantine_folder: OsString::from(DEFAULT_QUARANTINE_FOLDER),
            dry_run: false,
        }
    }
}

/// A folder whose subtree is still being walked.
#[derive(Debug)]
struct Frame {
    path: PathBuf,
    depth: usize,
    /// Entries that keep the folder from being empty
    remaining: usize,
    /// Deletable files found directly inside
    junk: Vec<PathBuf>,
    protected: bool,
}

/// Post-order junk and empty-folder remover.
#[derive(Debug, Clone, Default)]
pub struct Pruner {
    config: PruneConfig,
    protected: Vec<PathBuf>,
    pending_moves: HashSet<PathBuf>,
}

impl Pruner {
    /// Create a pruner.
    #[must_use]
    pub fn new(config: PruneConfig) -> Self {
        Self {
            config,
            protected: Vec::new(),
            pending_moves: HashSet::new(),
        }
    }

    /// Keep every folder that contains one of `paths` (at any depth) intact.
    #[must_use]
    pub fn with_protected(mut self, paths: impl IntoIterator<Item = PathBuf>) -> Self {
        self.protected.extend(paths);
        self
    }

    /// Treat `paths` as already moved away. Only honoured in dry-run mode.
    #[must_use]
    pub fn with_pending_moves(mut self, paths: impl IntoIterator<Item = PathBuf>) -> Self {
        self.pending_moves.extend(paths);
        self
    }

    /// Prune the tree under `root`. The root itself is kept.
    #[must_use]
    pub fn prune(&self, root: &Path) -> PruneReport {
        let mut report = PruneReport::default();
        let mut open: Vec<Frame> = Vec::new();

        let mut walker = WalkDir::new(root).sort_by_file_name().into_iter();
        while let Some(result) = walker.next() {
            let entry = match result {
                Ok(entry) => entry,
                Err(err) => {
                    self.record_walk_error(root, err, &mut open, &mut report);
                    continue;
                }
            };

            let depth = entry.depth();
            self.close_to(depth, &mut open, &mut report);
            if depth == 0 {
                open.push(self.frame(entry.into_path(), 0));
                continue;
            }

            let Some(parent) = open.last_mut() else {
                continue;
            };
            let file_type = entry.file_type();

            if entry.file_name() == self.config.quarantine_folder.as_os_str() {
                parent.remaining += 1;
                if file_type.is_dir() {
                    walker.skip_current_dir();
                }
                continue;
            }
            if self.config.dry_run && self.pending_moves.contains(entry.path()) {
                continue;
            }

            parent.remaining += 1;
            if file_type.is_dir() {
                let frame = self.frame(entry.into_path(), depth);
                open.push(frame);
            } else if file_type.is_file() {
                if !parent.protected && self.config.deletable_names.contains(entry.file_name()) {
                    parent.junk.push(entry.into_path());
                }
            } else {
                log::trace!("Keeping special entry {}", entry.path().display());
            }
        }
        self.close_to(0, &mut open, &mut report);

        log::info!(
            "{}{}",
            if self.config.dry_run { "[dry run] " } else { "" },
            report.summary()
        );
        report
    }

    fn is_protected(&self, dir: &Path) -> bool {
        self.protected
            .iter()
            .any(|p| p != dir && p.starts_with(dir))
    }

    fn frame(&self, path: PathBuf, depth: usize) -> Frame {
        Frame {
            protected: self.is_protected(&path),
            path,
            depth,
            remaining: 0,
            junk: Vec::new(),
        }
    }

    /// Finish every open folder at `depth` or deeper.
    fn close_to(&self, depth: usize, open: &mut Vec<Frame>, report: &mut PruneReport) {
        while open.last().is_some_and(|f| f.depth >= depth) {
            self.close_top(open, report);
        }
    }

    fn close_top(&self, open: &mut Vec<Frame>, report: &mut PruneReport) {
        let Some(frame) = open.pop() else {
            return;
        };
        if self.finish_folder(frame, report) {
            if let Some(parent) = open.last_mut() {
                parent.remaining = parent.remaining.saturating_sub(1);
            }
        }
    }

    /// An unreadable entry counts as content of the folder it was met in.
    fn record_walk_error(
        &self,
        root: &Path,
        err: walkdir::Error,
        open: &mut Vec<Frame>,
        report: &mut PruneReport,
    ) {
        let path = err.path().map_or_else(|| root.to_path_buf(), Path::to_path_buf);
        let depth = err.depth();
        while open
            .last()
            .is_some_and(|f| f.depth >= depth && f.path != path)
        {
            self.close_top(open, report);
        }
        if let Some(folder) = open.last_mut() {
            folder.remaining += 1;
        }

        let source = io::Error::from(err);
        log::warn!("Cannot list {}: {}", path.display(), source);
        report.failed.push(PruneError::ListFolder { path, source });
    }

    /// Delete the folder's junk, then the folder if nothing is left.
    ///
    /// Returns true if the folder was removed (or would be, in dry-run mode).
    fn finish_folder(&self, frame: Frame, report: &mut PruneReport) -> bool {
        let Frame {
            path: dir,
            depth,
            mut remaining,
            junk,
            protected,
        } = frame;

        if protected {
            log::debug!("Keeping {} (holds files that were not moved)", dir.display());
            return false;
        }

        for path in junk {
            if !self.config.dry_run {
                if let Err(source) = fs::remove_file(&path) {
                    log::warn!("Cannot delete {}: {}", path.display(), source);
                    report.failed.push(PruneError::DeleteFile { path, source });
                    return false;
                }
            }
            log::debug!("Deleted file {}", path.display());
            report.deleted.push(DeleteRecord::File(path));
            remaining -= 1;
        }

        if depth == 0 || remaining > 0 {
            return false;
        }

        if !self.config.dry_run {
            if let Err(source) = fs::remove_dir(&dir) {
                log::warn!("Cannot delete folder {}: {}", dir.display(), source);
                report.failed.push(PruneError::DeleteFolder { path: dir, source });
                return false;
            }
        }
        log::debug!("Deleted folder {}", dir.display());
        report.deleted.push(DeleteRecord::Folder(dir));
        true
    }
}
