//! Output formatters for sweep results.
//!
//! - [`text`]: the human readable lists (default)
//! - [`json`]: one JSON object for automation and scripting

pub mod json;
pub mod text;

use std::io::Write;

use crate::cli::{OutputFormat, Roots};
use crate::sweep::{SweepMode, SweepReport};

// Re-export main types
pub use json::{OutputError, RunReport};
pub use text::TextOutput;

/// Write `report` to `out` in `format`.
///
/// # Errors
///
/// Returns an error if serialization or writing fails.
pub fn write_report<W: Write>(
    out: &mut W,
    format: OutputFormat,
    roots: &Roots,
    report: &SweepReport,
    mode: SweepMode,
) -> Result<(), OutputError> {
    match format {
        OutputFormat::Text => TextOutput::new(report, mode).write_to(out)?,
        OutputFormat::Json => RunReport::new(roots, report).write_to(out)?,
    }
    Ok(())
}
