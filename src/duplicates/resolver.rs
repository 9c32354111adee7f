//! Duplicate resolution across one or two inventories.
//!
//! # Overview
//!
//! Files are matched by name first and only same-named files are handed to
//! a [`FileComparator`]. The resolver:
//!
//! 1. tags every record of the first inventory [`RootTag::Source`] and every
//!    record of the optional second one [`RootTag::Target`];
//! 2. sorts all tagged records by `(name, tag, folder path)`, so within a
//!    name group source records come first and the order is total;
//! 3. walks the sorted records keeping a *baseline*: the first eligible
//!    record of the current name group. Each later record of the group is
//!    compared against that baseline and reported when it is a duplicate.
//!    The baseline never moves inside a group, whether the comparison
//!    matched or not.
//!
//! In two-tree mode only source records can become a baseline and source
//! records are never reported, so every reported path lies in the target
//! tree. In single-tree mode the first record of each name group (by folder
//! path) is kept and the later ones are reported.
//!
//! # Example
//!
//! ```no_run
//! use filesweeper::duplicates::{Criterion, MetadataComparator, Resolver};
//! use filesweeper::scanner::{ScanConfig, Scanner};
//! use std::path::Path;
//!
//! let scanner = Scanner::new(ScanConfig::default());
//! let source = scanner.scan(Path::new("/photos")).unwrap();
//! let target = scanner.scan(Path::new("/backup/photos")).unwrap();
//!
//! let mut comparator = MetadataComparator::new([Criterion::Size, Criterion::Hash]);
//! let duplicates = Resolver::new().resolve(&source, Some(&target), &mut comparator);
//! for path in duplicates {
//!     println!("{}", path.display());
//! }
//! ```

use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::Serialize;

use super::FileComparator;
use crate::progress::ProgressCallback;
use crate::scanner::Inventory;

/// Phase name reported to progress callbacks.
pub const COMPARE_PHASE: &str = "compare";

/// Which tree a record was scanned from.
///
/// `Source` sorts before `Target`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RootTag {
    /// The first (reference) tree
    Source,
    /// The second tree, whose copies are reported
    Target,
}

/// A file record joined with its tag and folder path.
#[derive(Debug, Clone, Copy)]
struct Candidate<'a> {
    name: &'a OsStr,
    tag: RootTag,
    folder: &'a Path,
}

impl Candidate<'_> {
    fn path(&self) -> PathBuf {
        self.folder.join(self.name)
    }
}

/// Finds duplicate files by sorting and scanning tagged records.
#[derive(Default)]
pub struct Resolver {
    progress: Option<Arc<dyn ProgressCallback>>,
}

impl std::fmt::Debug for Resolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Resolver")
            .field("progress", &self.progress.as_ref().map(|_| "<callback>"))
            .finish()
    }
}

impl Resolver {
    /// Create a resolver without progress reporting.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Report every examined record to `callback`.
    #[must_use]
    pub fn with_progress(mut self, callback: Arc<dyn ProgressCallback>) -> Self {
        self.progress = Some(callback);
        self
    }

    /// Resolve duplicates in `source` alone, or of `target` against `source`.
    ///
    /// Returns absolute paths of the redundant copies in sorted scan order
    /// (name ascending). Identical inputs always give identical output.
    pub fn resolve<C: FileComparator>(
        &self,
        source: &Inventory,
        target: Option<&Inventory>,
        comparator: &mut C,
    ) -> Vec<PathBuf> {
        let two_tree = target.is_some();

        let mut candidates = tag(source, RootTag::Source);
        if let Some(target) = target {
            candidates.extend(tag(target, RootTag::Target));
        }
        candidates.sort_by(|a, b| {
            a.name
                .cmp(b.name)
                .then(a.tag.cmp(&b.tag))
                .then_with(|| a.folder.cmp(b.folder))
        });

        if let Some(cb) = &self.progress {
            cb.on_phase_start(COMPARE_PHASE, candidates.len());
        }

        let mut duplicates = Vec::new();
        let mut baseline: Option<&Candidate<'_>> = None;

        for (index, candidate) in candidates.iter().enumerate() {
            if let Some(cb) = &self.progress {
                cb.on_progress(index + 1, &candidate.name.to_string_lossy());
            }

            match baseline {
                Some(base) if base.name == candidate.name => {
                    // Two source files sharing a name are never compared.
                    if two_tree && candidate.tag == RootTag::Source {
                        continue;
                    }
                    let candidate_path = candidate.path();
                    if comparator.is_duplicate(&base.path(), &candidate_path) {
                        duplicates.push(candidate_path);
                    }
                }
                _ => {
                    if !two_tree || candidate.tag == RootTag::Source {
                        baseline = Some(candidate);
                    }
                }
            }
        }

        if let Some(cb) = &self.progress {
            cb.on_phase_end(COMPARE_PHASE);
        }

        log::info!(
            "Resolved {} candidate file(s): {} duplicate(s) ({} mode)",
            candidates.len(),
            duplicates.len(),
            if two_tree { "two-tree" } else { "single-tree" }
        );

        duplicates
    }
}

/// Resolve duplicates with a default [`Resolver`].
pub fn resolve<C: FileComparator>(
    source: &Inventory,
    target: Option<&Inventory>,
    comparator: &mut C,
) -> Vec<PathBuf> {
    Resolver::new().resolve(source, target, comparator)
}

fn tag(inventory: &Inventory, tag: RootTag) -> Vec<Candidate<'_>> {
    inventory
        .files
        .iter()
        .filter_map(|record| match inventory.folder(record.folder) {
            Some(folder) => Some(Candidate {
                name: &record.name,
                tag,
                folder,
            }),
            None => {
                log::warn!(
                    "Dropping {:?}: folder {} is not in the inventory of {}",
                    record.name,
                    record.folder,
                    inventory.root.display()
                );
                None
            }
        })
        .collect()
}
