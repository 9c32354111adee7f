//! File actions module.
//!
//! This module provides functionality for:
//! - Moving duplicates into a quarantine folder ([`relocate`])
//! - Removing junk files and the folders left empty ([`prune`])
//!
//! Both actions take a dry-run switch. A dry run walks the same code path
//! and produces the same report as a real run, without changing the disk.
//!
//! ```no_run
//! use filesweeper::actions::{PruneConfig, Pruner};
//! use std::path::Path;
//!
//! let config = PruneConfig {
//!     deletable_names: [".DS_Store".into(), "Thumbs.db".into()].into(),
//!     dry_run: true,
//!     ..Default::default()
//! };
//! let report = Pruner::new(config).prune(Path::new("/backup"));
//! for record in &report.deleted {
//!     println!("Would delete {record}");
//! }
//! ```

pub mod prune;
pub mod relocate;

// Re-export commonly used types
pub use prune::{DeleteRecord, PruneConfig, PruneError, PruneReport, Pruner};
pub use relocate::{MoveError, MoveFailure, MoveRecord, MoveReport, RelocateError, Relocator};
