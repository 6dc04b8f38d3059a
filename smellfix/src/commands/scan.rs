//! Scan command: report smells, propose nothing.

use super::utils::{AnalysisRun, ReadFailure};
use crate::diagnostic::Diagnostic;
use crate::output;

use anyhow::Result;
use serde::Serialize;
use std::io::Write;

/// Options for the scan command
#[derive(Debug, Default, Clone)]
pub struct ScanCommandOptions {
    /// Emit JSON instead of tables
    pub json: bool,
    /// Exit with code 1 when any smell is found
    pub fail_on_smells: bool,
}

#[derive(Serialize)]
struct ScanJson<'a> {
    files: usize,
    diagnostics: Vec<&'a Diagnostic>,
    read_errors: &'a [ReadFailure],
}

/// Prints the diagnostics of an analysis run.
///
/// Returns the process exit code.
///
/// # Errors
///
/// Returns an error if writing the output fails.
pub fn run_scan<W: Write>(
    run: &AnalysisRun,
    options: &ScanCommandOptions,
    mut writer: W,
) -> Result<i32> {
    if options.json {
        let payload = ScanJson {
            files: run.files,
            diagnostics: run.reports.iter().flat_map(|r| &r.diagnostics).collect(),
            read_errors: &run.read_errors,
        };
        writeln!(writer, "{}", serde_json::to_string_pretty(&payload)?)?;
    } else {
        output::print_header(&mut writer, "Code Smell Report")?;
        output::print_diagnostics(&mut writer, &run.reports)?;
        output::print_read_errors(&mut writer, &run.read_errors)?;
        output::print_summary(&mut writer, run.files, &run.reports)?;
    }

    if options.fail_on_smells && run.diagnostic_count() > 0 {
        return Ok(1);
    }
    Ok(0)
}
