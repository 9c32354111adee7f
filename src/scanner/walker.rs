//! Recursive directory scanner producing an [`Inventory`].
//!
//! # Overview
//!
//! The [`Scanner`] walks a directory tree depth first with [`walkdir`],
//! entries sorted by file name, symlinks followed. Ignored names are pruned
//! before they are descended into. Folder ids are handed out in post-order
//! (see the parent module for the numbering rules): a folder stays open
//! while its subtree is walked, and it is numbered and its own files are
//! recorded only once the walk has left it. Repeated scans of an unchanged
//! tree produce identical inventories.
//!
//! All per-walk state lives in a [`ScanSession`] owned by a single
//! [`Scanner::scan`] call; nothing carries over between scans.
//!
//! # Example
//!
//! ```no_run
//! use filesweeper::scanner::{ScanConfig, Scanner};
//! use std::path::Path;
//!
//! let scanner = Scanner::new(ScanConfig::default());
//! let inventory = scanner.scan(Path::new("/home/user/Pictures")).unwrap();
//! println!(
//!     "{} files in {} folders",
//!     inventory.files.len(),
//!     inventory.folder_count()
//! );
//! ```

use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use walkdir::{DirEntry, WalkDir};

use super::{FileRecord, FolderId, Inventory, ScanConfig, ScanError};
use crate::progress::ProgressCallback;

/// Phase name reported to progress callbacks.
pub const SCAN_PHASE: &str = "scan";

/// Directory scanner.
pub struct Scanner {
    config: ScanConfig,
    progress: Option<Arc<dyn ProgressCallback>>,
}

impl std::fmt::Debug for Scanner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Scanner")
            .field("config", &self.config)
            .field("progress", &self.progress.as_ref().map(|_| "<callback>"))
            .finish()
    }
}

/// A folder whose subtree is still being walked.
#[derive(Debug)]
struct OpenFolder {
    path: PathBuf,
    depth: usize,
    /// Files that passed the size filter, in name order
    files: Vec<OsString>,
}

/// Mutable state of one scan: id counter, open folders and the inventory.
#[derive(Debug)]
struct ScanSession {
    next_id: u32,
    open: Vec<OpenFolder>,
    inventory: Inventory,
}

impl ScanSession {
    fn new(root: &Path) -> Self {
        Self {
            next_id: FolderId::FIRST.get(),
            open: Vec::new(),
            inventory: Inventory {
                root: root.to_path_buf(),
                ..Inventory::default()
            },
        }
    }

    /// Start a folder found at `depth`.
    fn open_folder(&mut self, path: PathBuf, depth: usize) {
        self.open.push(OpenFolder {
            path,
            depth,
            files: Vec::new(),
        });
    }

    /// Add a file to the innermost open folder.
    fn add_file(&mut self, name: OsString) {
        if let Some(folder) = self.open.last_mut() {
            folder.files.push(name);
        }
    }

    /// Number and record every open folder at `depth` or deeper.
    ///
    /// Returns the completed folders, innermost first.
    fn close_to(&mut self, depth: usize) -> Vec<(FolderId, PathBuf)> {
        let mut closed = Vec::new();
        while self.open.last().is_some_and(|f| f.depth >= depth) {
            if let Some(folder) = self.open.pop() {
                let id = FolderId(self.next_id);
                self.next_id += 1;
                self.inventory
                    .files
                    .extend(folder.files.into_iter().map(|name| FileRecord::new(name, id)));
                self.inventory.folders.push(folder.path.clone());
                closed.push((id, folder.path));
            }
        }
        closed
    }

    fn finish(mut self) -> (Inventory, Vec<(FolderId, PathBuf)>) {
        let closed = self.close_to(0);
        (self.inventory, closed)
    }
}

impl Scanner {
    /// Create a new scanner.
    #[must_use]
    pub fn new(config: ScanConfig) -> Self {
        Self {
            config,
            progress: None,
        }
    }

    /// Report each completed folder to `callback`.
    #[must_use]
    pub fn with_progress(mut self, callback: Arc<dyn ProgressCallback>) -> Self {
        self.progress = Some(callback);
        self
    }

    /// Scan `root` recursively.
    ///
    /// Unreadable entries below the root do not abort the scan; they are
    /// collected in [`Inventory::errors`].
    ///
    /// # Errors
    ///
    /// Returns [`ScanError::NotADirectory`] if `root` is not a directory, or
    /// another [`ScanError`] if its metadata cannot be read.
    pub fn scan(&self, root: &Path) -> Result<Inventory, ScanError> {
        let metadata = fs::metadata(root).map_err(|e| ScanError::from_io(root, e))?;
        if !metadata.is_dir() {
            return Err(ScanError::NotADirectory(root.to_path_buf()));
        }

        if let Some(cb) = &self.progress {
            cb.on_phase_start(SCAN_PHASE, 0);
        }

        let mut session = ScanSession::new(root);
        let walker = WalkDir::new(root)
            .follow_links(true)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|entry| entry.depth() == 0 || !self.is_ignored(entry));

        for result in walker {
            match result {
                Ok(entry) => {
                    let closed = session.close_to(entry.depth());
                    self.report_closed(&closed);
                    self.visit(entry, &mut session);
                }
                Err(err) => self.handle_walk_error(root, err, &mut session),
            }
        }

        let (inventory, closed) = session.finish();
        self.report_closed(&closed);

        if let Some(cb) = &self.progress {
            cb.on_phase_end(SCAN_PHASE);
        }

        log::info!(
            "Scanned {}: {} file(s) in {} folder(s), {} error(s)",
            root.display(),
            inventory.files.len(),
            inventory.folder_count(),
            inventory.errors.len()
        );

        Ok(inventory)
    }

    fn is_ignored(&self, entry: &DirEntry) -> bool {
        let ignored = self.config.is_ignored(entry.file_name());
        if ignored {
            log::trace!("Ignoring: {}", entry.path().display());
        }
        ignored
    }

    fn visit(&self, entry: DirEntry, session: &mut ScanSession) {
        let depth = entry.depth();
        let file_type = entry.file_type();

        if file_type.is_dir() {
            session.open_folder(entry.into_path(), depth);
            return;
        }
        if !file_type.is_file() {
            log::trace!("Skipping special file: {}", entry.path().display());
            return;
        }

        let size = match entry.metadata() {
            Ok(m) => m.len(),
            Err(err) => {
                let path = entry.path().to_path_buf();
                log::warn!("Cannot stat {}: {}", path.display(), err);
                session
                    .inventory
                    .errors
                    .push(ScanError::from_io(&path, err.into()));
                return;
            }
        };

        if !self.config.passes_size_filter(size) {
            log::trace!(
                "Skipping file below {} KB ({} bytes): {}",
                self.config.min_size_kb,
                size,
                entry.path().display()
            );
            return;
        }
        session.add_file(entry.file_name().to_os_string());
    }

    /// Record a walk error. Dangling symlinks and symlink loops are skipped.
    fn handle_walk_error(&self, root: &Path, err: walkdir::Error, session: &mut ScanSession) {
        let path = err.path().map_or_else(|| root.to_path_buf(), Path::to_path_buf);

        if let Some(ancestor) = err.loop_ancestor() {
            log::warn!(
                "Skipping symlink loop: {} points back to {}",
                path.display(),
                ancestor.display()
            );
            return;
        }

        let io_error = std::io::Error::from(err);
        if io_error.kind() == std::io::ErrorKind::NotFound {
            log::debug!("Skipping dangling entry: {}", path.display());
            return;
        }

        log::warn!("Cannot read {}: {}", path.display(), io_error);
        session.inventory.errors.push(ScanError::from_io(&path, io_error));
    }

    fn report_closed(&self, closed: &[(FolderId, PathBuf)]) {
        if let Some(cb) = &self.progress {
            for (id, path) in closed {
                cb.on_progress(id.get() as usize, &path.to_string_lossy());
            }
        }
    }
}
