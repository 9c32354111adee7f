//! Line-oriented console output.
//!
//! Every list is printed one item per line, optionally after a header line.
//! Headers are bold and error lines red unless colors are disabled with
//! [`yansi::disable`].

use std::fmt::Display;
use std::io::{self, Write};

use yansi::Paint;

use crate::sweep::{SweepMode, SweepReport};

/// Writes sweep results as plain text.
#[derive(Debug)]
pub struct TextOutput<'a> {
    report: &'a SweepReport,
    mode: SweepMode,
}

impl<'a> TextOutput<'a> {
    /// Create a text view of `report`.
    #[must_use]
    pub fn new(report: &'a SweepReport, mode: SweepMode) -> Self {
        Self { report, mode }
    }

    /// Write the report.
    ///
    /// # Errors
    ///
    /// Returns an error if writing fails.
    pub fn write_to<W: Write>(&self, out: &mut W) -> io::Result<()> {
        let report = self.report;
        let debug = self.mode.dry_run;

        if !self.mode.move_files || debug {
            let duplicates: Vec<_> = report
                .findings
                .duplicates
                .iter()
                .map(|p| p.display())
                .collect();
            write_list(out, &duplicates, Some("Duplicate files:"))?;
        }
        if !report.findings.scan_errors.is_empty() {
            write_errors(out, &report.findings.scan_errors)?;
        }

        let (Some(moves), Some(prune)) = (&report.moves, &report.prune) else {
            return Ok(());
        };

        write_errors(out, &moves.failed)?;
        let count = moves.moved.len();
        if debug {
            writeln!(out)?;
            let header = format!("The following {count} files will be moved:");
            write_list(out, &moves.moved, Some(&header))?;
            writeln!(out)?;
        } else if let Some(quarantine) = &report.quarantine {
            writeln!(
                out,
                "{count} duplicate file(s) moved to {}",
                quarantine.display()
            )?;
        }

        writeln!(out, "Clearing up folders...")?;
        write_errors(out, &prune.failed)?;
        if debug {
            writeln!(out)?;
            let header = format!("The following {} items will be deleted:", prune.deleted.len());
            write_list(out, &prune.deleted, Some(&header))?;
            writeln!(out)?;
        }

        writeln!(out, "Done!")
    }
}

/// Write `items` one per line under an optional bold header.
///
/// # Errors
///
/// Returns an error if writing fails.
pub fn write_list<W: Write, T: Display>(
    out: &mut W,
    items: &[T],
    header: Option<&str>,
) -> io::Result<()> {
    if let Some(header) = header {
        writeln!(out, "{}", header.bold())?;
    }
    for item in items {
        writeln!(out, "{item}")?;
    }
    Ok(())
}

fn write_errors<W: Write, T: Display>(out: &mut W, errors: &[T]) -> io::Result<()> {
    for error in errors {
        writeln!(out, "{}", error.to_string().red())?;
    }
    Ok(())
}
