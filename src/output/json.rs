//! JSON output for scripting.
//!
//! # Output Schema
//!
//! ```json
//! {
//!   "source": "/photos",
//!   "target": "/backup/photos",
//!   "dry_run": false,
//!   "duplicates": ["/backup/photos/2019/img_001.jpg"],
//!   "comparisons": 12,
//!   "scan_errors": [],
//!   "quarantine": "/backup/photos/_duplicates",
//!   "moves": [
//!     { "from": "/backup/photos/2019/img_001.jpg",
//!       "to": "/backup/photos/_duplicates/2019/img_001.jpg" }
//!   ],
//!   "move_errors": [],
//!   "deletions": [{ "kind": "folder", "path": "/backup/photos/2019" }],
//!   "delete_errors": [],
//!   "exit_code": 0,
//!   "exit_code_name": "FS000"
//! }
//! ```
//!
//! The move and delete fields are absent unless files were moved.

use std::io::Write;
use std::path::PathBuf;

use serde::Serialize;

use crate::actions::{DeleteRecord, MoveRecord};
use crate::cli::Roots;
use crate::sweep::SweepReport;

/// Complete JSON report of one run.
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    /// Source root
    pub source: PathBuf,
    /// Target root, in two-tree mode
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target: Option<PathBuf>,
    /// Whether the disk was left untouched
    pub dry_run: bool,
    /// Redundant copies, name ascending
    pub duplicates: Vec<PathBuf>,
    /// Number of same-name pairs compared
    pub comparisons: usize,
    /// Entries that could not be read while scanning
    pub scan_errors: Vec<String>,
    /// Quarantine folder
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quarantine: Option<PathBuf>,
    /// Performed (or planned) moves
    #[serde(skip_serializing_if = "Option::is_none")]
    pub moves: Option<Vec<MoveRecord>>,
    /// Moves that failed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub move_errors: Option<Vec<String>>,
    /// Removed (or removable) junk files and folders
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deletions: Option<Vec<DeleteRecord>>,
    /// Removals that failed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub delete_errors: Option<Vec<String>>,
    /// The exit code number
    pub exit_code: i32,
    /// The machine-readable exit code name (e.g., "FS000")
    pub exit_code_name: String,
}

impl RunReport {
    /// Build the JSON view of a sweep.
    #[must_use]
    pub fn new(roots: &Roots, report: &SweepReport) -> Self {
        let exit_code = report.exit_code();
        Self {
            source: roots.source.clone(),
            target: roots.target.clone(),
            dry_run: report.dry_run,
            duplicates: report.findings.duplicates.clone(),
            comparisons: report.findings.comparisons,
            scan_errors: to_strings(&report.findings.scan_errors),
            quarantine: report.quarantine.clone(),
            moves: report.moves.as_ref().map(|m| m.moved.clone()),
            move_errors: report.moves.as_ref().map(|m| to_strings(&m.failed)),
            deletions: report.prune.as_ref().map(|p| p.deleted.clone()),
            delete_errors: report.prune.as_ref().map(|p| to_strings(&p.failed)),
            exit_code: exit_code.as_i32(),
            exit_code_name: exit_code.code_prefix().to_string(),
        }
    }

    /// Serialize to pretty-printed JSON string.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails (unlikely for valid data).
    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Write pretty-printed JSON followed by a newline.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or writing fails.
    pub fn write_to<W: Write>(&self, writer: &mut W) -> Result<(), OutputError> {
        let json = self.to_json_pretty()?;
        writer.write_all(json.as_bytes())?;
        writer.write_all(b"\n")?;
        Ok(())
    }
}

fn to_strings<T: ToString>(items: &[T]) -> Vec<String> {
    items.iter().map(ToString::to_string).collect()
}

/// Errors that can occur while writing a report.
#[derive(thiserror::Error, Debug)]
pub enum OutputError {
    /// JSON serialization error
    #[error("JSON serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// I/O error during writing
    #[error("I/O error while writing output: {0}")]
    Io(#[from] std::io::Error),
}
