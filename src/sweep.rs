//! Phase sequencing: scan, resolve, relocate, prune.
//!
//! In single-tree mode duplicates are moved from the source root into
//! `SOURCE/<quarantine>`, then the source root is pruned. In two-tree mode
//! the duplicates lie in the target tree; they are moved into
//! `TARGET/<quarantine>` and the target root is pruned.
//!
//! A file that could not be moved stays where it is, and none of its
//! ancestor folders is cleaned up.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use thiserror::Error;

use crate::actions::{MoveReport, PruneReport, Pruner, RelocateError, Relocator};
use crate::cli::Roots;
use crate::config::Config;
use crate::duplicates::{MetadataComparator, Resolver};
use crate::error::ExitCode;
use crate::progress::ProgressCallback;
use crate::scanner::{Inventory, ScanError, Scanner};

/// Errors that stop a sweep.
#[derive(Debug, Error)]
pub enum SweepError {
    /// A root could not be scanned at all.
    #[error("cannot scan {root}")]
    Scan {
        /// Root being scanned
        root: PathBuf,
        /// Why the scan failed
        #[source]
        source: ScanError,
    },

    /// The duplicate list does not match the tree being swept.
    #[error(transparent)]
    Relocate(#[from] RelocateError),
}

/// What to do with the duplicates once found.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SweepMode {
    /// Move duplicates to quarantine and prune afterwards.
    pub move_files: bool,
    /// Simulate every mutating step.
    pub dry_run: bool,
}

/// Duplicates found in one or two trees.
#[derive(Debug, Default)]
pub struct Findings {
    /// Redundant copies, name ascending
    pub duplicates: Vec<PathBuf>,
    /// Entries that could not be read while scanning
    pub scan_errors: Vec<ScanError>,
    /// Number of same-name pairs handed to the comparator
    pub comparisons: usize,
}

/// Everything a sweep did (or would do).
#[derive(Debug, Default)]
pub struct SweepReport {
    /// Duplicates and scan problems
    pub findings: Findings,
    /// Quarantine folder, when moving
    pub quarantine: Option<PathBuf>,
    /// Move outcome, when moving
    pub moves: Option<MoveReport>,
    /// Prune outcome, when moving
    pub prune: Option<PruneReport>,
    /// Whether nothing was changed on disk
    pub dry_run: bool,
}

impl SweepReport {
    /// Number of recoverable errors across every phase.
    #[must_use]
    pub fn error_count(&self) -> usize {
        self.findings.scan_errors.len()
            + self.moves.as_ref().map_or(0, |m| m.failed.len())
            + self.prune.as_ref().map_or(0, |p| p.failed.len())
    }

    /// Process exit code for a completed sweep.
    #[must_use]
    pub fn exit_code(&self) -> ExitCode {
        if self.error_count() == 0 {
            ExitCode::Success
        } else {
            ExitCode::PartialSuccess
        }
    }
}

/// Runs the sweep phases with one configuration.
pub struct Sweeper<'a> {
    config: &'a Config,
    progress: Option<Arc<dyn ProgressCallback>>,
}

impl std::fmt::Debug for Sweeper<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Sweeper")
            .field("config", &self.config)
            .field("has_progress", &self.progress.is_some())
            .finish()
    }
}

impl<'a> Sweeper<'a> {
    /// Create a sweeper.
    #[must_use]
    pub fn new(config: &'a Config) -> Self {
        Self {
            config,
            progress: None,
        }
    }

    /// Report scan and compare progress to `callback`.
    #[must_use]
    pub fn with_progress(mut self, callback: Arc<dyn ProgressCallback>) -> Self {
        self.progress = Some(callback);
        self
    }

    /// Tree whose duplicates are moved and which is pruned.
    #[must_use]
    pub fn sweep_root(roots: &Roots) -> &Path {
        roots.target.as_deref().unwrap_or(&roots.source)
    }

    /// Quarantine folder for `roots`.
    #[must_use]
    pub fn quarantine_dir(&self, roots: &Roots) -> PathBuf {
        Self::sweep_root(roots).join(&self.config.move_to_folder)
    }

    fn scan(&self, scanner: &Scanner, root: &Path) -> Result<Inventory, SweepError> {
        scanner.scan(root).map_err(|source| SweepError::Scan {
            root: root.to_path_buf(),
            source,
        })
    }

    /// Scan the roots and resolve duplicates.
    ///
    /// # Errors
    ///
    /// Returns [`SweepError::Scan`] if a root cannot be scanned at all.
    pub fn find_duplicates(&self, roots: &Roots) -> Result<Findings, SweepError> {
        log::debug!(
            "Finding duplicates in {} mode",
            if roots.is_two_tree() { "two-tree" } else { "single-tree" }
        );
        let mut scanner = Scanner::new(self.config.scan_config());
        let mut resolver = Resolver::new();
        if let Some(progress) = &self.progress {
            scanner = scanner.with_progress(Arc::clone(progress));
            resolver = resolver.with_progress(Arc::clone(progress));
        }

        let mut source = self.scan(&scanner, &roots.source)?;
        let mut target = roots
            .target
            .as_deref()
            .map(|root| self.scan(&scanner, root))
            .transpose()?;

        let mut comparator = MetadataComparator::new(self.config.params.iter().copied());
        let duplicates = resolver.resolve(&source, target.as_ref(), &mut comparator);

        let mut scan_errors = std::mem::take(&mut source.errors);
        if let Some(target) = target.as_mut() {
            scan_errors.append(&mut target.errors);
        }

        Ok(Findings {
            duplicates,
            scan_errors,
            comparisons: comparator.comparisons(),
        })
    }

    /// Move `duplicates` into the quarantine folder of `roots`.
    ///
    /// # Errors
    ///
    /// Returns [`SweepError::Relocate`] if a duplicate is outside the swept tree.
    pub fn relocate(
        &self,
        duplicates: &[PathBuf],
        roots: &Roots,
        dry_run: bool,
    ) -> Result<MoveReport, SweepError> {
        let report = Relocator::new(dry_run).relocate(
            duplicates,
            Self::sweep_root(roots),
            &self.quarantine_dir(roots),
        )?;
        Ok(report)
    }

    /// Remove junk files and empty folders left behind by `moves`.
    #[must_use]
    pub fn prune(&self, roots: &Roots, moves: &MoveReport, dry_run: bool) -> PruneReport {
        let stuck: Vec<PathBuf> = moves.failed_sources().map(Path::to_path_buf).collect();
        if !stuck.is_empty() {
            log::warn!(
                "{} file(s) could not be moved; their folders are left as they are",
                stuck.len()
            );
        }

        Pruner::new(self.config.prune_config(dry_run))
            .with_protected(stuck)
            .with_pending_moves(moves.moved.iter().map(|m| m.from.clone()))
            .prune(Self::sweep_root(roots))
    }

    /// Run every phase `mode` asks for.
    ///
    /// # Errors
    ///
    /// Returns a [`SweepError`] on a scan or relocation failure that stops
    /// the run. Per-file problems are in the report instead.
    pub fn run(&self, roots: &Roots, mode: SweepMode) -> Result<SweepReport, SweepError> {
        let findings = self.find_duplicates(roots)?;
        let mut report = SweepReport {
            dry_run: mode.dry_run || !mode.move_files,
            ..Default::default()
        };

        if mode.move_files {
            let moves = self.relocate(&findings.duplicates, roots, mode.dry_run)?;
            let prune = self.prune(roots, &moves, mode.dry_run);
            report.quarantine = Some(self.quarantine_dir(roots));
            report.moves = Some(moves);
            report.prune = Some(prune);
        }

        report.findings = findings;
        Ok(report)
    }
}
