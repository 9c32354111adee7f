//! Pairwise file comparison.
//!
//! A [`MetadataComparator`] decides whether two same-named files are
//! duplicates by checking every enabled [`Criterion`]. Checks run cheapest
//! first (size, then modification time, then content hash) and stop at the
//! first mismatch. With no criterion enabled every pair is equal.

use std::collections::{BTreeSet, HashMap};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use filetime::FileTime;
use serde::{Deserialize, Serialize};

use crate::scanner::{hash_to_hex, Hash, Hasher};

/// One equality check applied to a candidate pair.
///
/// Declaration order is evaluation order.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "snake_case")]
pub enum Criterion {
    /// Byte-exact size equality
    Size,
    /// Modification time equality, whole seconds
    #[value(name = "last_modified", alias = "mtime")]
    #[serde(alias = "mtime")]
    LastModified,
    /// Whole-file content digest equality
    Hash,
}

impl Criterion {
    /// All criteria, in evaluation order.
    pub const ALL: [Criterion; 3] = [Criterion::Size, Criterion::LastModified, Criterion::Hash];

    /// Configuration name of the criterion.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Criterion::Size => "size",
            Criterion::LastModified => "last_modified",
            Criterion::Hash => "hash",
        }
    }
}

impl fmt::Display for Criterion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Criterion {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "size" => Ok(Criterion::Size),
            "last_modified" | "mtime" => Ok(Criterion::LastModified),
            "hash" => Ok(Criterion::Hash),
            other => Err(format!(
                "unknown comparison criterion '{other}' (expected size, last_modified or hash)"
            )),
        }
    }
}

/// Decides whether a candidate file duplicates a baseline file.
///
/// The resolver only ever calls this for files sharing a name.
pub trait FileComparator {
    /// Return true if `candidate` is a duplicate of `baseline`.
    fn is_duplicate(&mut self, baseline: &Path, candidate: &Path) -> bool;
}

/// Comparator over file metadata and content.
///
/// Content digests are memoised per path, so a baseline compared against
/// many candidates is read once.
#[derive(Debug)]
pub struct MetadataComparator {
    criteria: BTreeSet<Criterion>,
    hasher: Hasher,
    digests: HashMap<PathBuf, Hash>,
    comparisons: usize,
}

/// Facts about one file gathered lazily during a comparison.
#[derive(Debug, Clone, Copy)]
struct Stat {
    size: u64,
    mtime: i64,
}

impl MetadataComparator {
    /// Create a comparator applying `criteria`.
    #[must_use]
    pub fn new(criteria: impl IntoIterator<Item = Criterion>) -> Self {
        Self {
            criteria: criteria.into_iter().collect(),
            hasher: Hasher::new(),
            digests: HashMap::new(),
            comparisons: 0,
        }
    }

    /// Enabled criteria, in evaluation order.
    pub fn criteria(&self) -> impl Iterator<Item = Criterion> + '_ {
        self.criteria.iter().copied()
    }

    /// Number of pairs compared so far.
    #[must_use]
    pub fn comparisons(&self) -> usize {
        self.comparisons
    }

    fn stat(path: &Path) -> Option<Stat> {
        match fs::metadata(path) {
            Ok(m) => Some(Stat {
                size: m.len(),
                mtime: FileTime::from_last_modification_time(&m).unix_seconds(),
            }),
            Err(e) => {
                log::warn!("Cannot read metadata of {}: {}", path.display(), e);
                None
            }
        }
    }

    fn digest(&mut self, path: &Path) -> Option<Hash> {
        if let Some(hash) = self.digests.get(path) {
            return Some(*hash);
        }
        match self.hasher.full_hash(path) {
            Ok(hash) => {
                log::trace!("{} blake3:{}", path.display(), hash_to_hex(&hash));
                self.digests.insert(path.to_path_buf(), hash);
                Some(hash)
            }
            Err(e) => {
                log::warn!("Cannot hash {}: {}", path.display(), e);
                None
            }
        }
    }

    fn check(
        &mut self,
        criterion: Criterion,
        a: &Path,
        b: &Path,
        stats: &mut Option<(Stat, Stat)>,
    ) -> bool {
        match criterion {
            Criterion::Size | Criterion::LastModified => {
                if stats.is_none() {
                    *stats = Self::stat(a).zip(Self::stat(b));
                }
                match stats {
                    Some((sa, sb)) if criterion == Criterion::Size => sa.size == sb.size,
                    Some((sa, sb)) => sa.mtime == sb.mtime,
                    None => false,
                }
            }
            Criterion::Hash => match (self.digest(a), self.digest(b)) {
                (Some(ha), Some(hb)) => ha == hb,
                _ => false,
            },
        }
    }
}

impl FileComparator for MetadataComparator {
    fn is_duplicate(&mut self, baseline: &Path, candidate: &Path) -> bool {
        self.comparisons += 1;

        let criteria: Vec<Criterion> = self.criteria.iter().copied().collect();
        let mut stats = None;
        for criterion in criteria {
            if !self.check(criterion, baseline, candidate, &mut stats) {
                log::debug!(
                    "Not a duplicate ({} differs): {} vs {}",
                    criterion,
                    baseline.display(),
                    candidate.display()
                );
                return false;
            }
        }

        log::debug!(
            "Duplicate: {} matches {}",
            candidate.display(),
            baseline.display()
        );
        true
    }
}
