//! Fix command: propose, persist or apply mutable-default patches.

use super::utils::{AnalysisRun, ReadFailure};
use crate::constants::PATCH_EXTENSION;
use crate::diff::apply_unified_diff;
use crate::output;
use crate::pipeline::Patch;
use crate::utils::normalize_display_path;

use anyhow::{Context, Result};
use colored::Colorize;
use rustc_hash::FxHashSet;
use serde::Serialize;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

/// Options for the fix command
#[derive(Debug, Default, Clone)]
pub struct FixOptions {
    /// Write each patch to its file instead of only showing it
    pub apply: bool,
    /// Directory receiving `<file name>.patch` files
    pub patch_out: Option<PathBuf>,
    /// Emit JSON instead of colored diffs
    pub json: bool,
    /// Exit with code 1 when any smell is found
    pub fail_on_smells: bool,
}

/// Outcome of the fix command
#[derive(Debug, Default, Serialize)]
pub struct FixSummary {
    /// Patches produced
    pub proposed: usize,
    /// Patches written back to their files
    pub applied: usize,
    /// Patch files written under `patch_out`
    pub patch_files: Vec<PathBuf>,
    /// Files whose patch could not be applied
    pub failed: Vec<ReadFailure>,
}

#[derive(Serialize)]
struct FixJson<'a> {
    patches: Vec<&'a Patch>,
    synthesis_errors: Vec<String>,
    read_errors: &'a [ReadFailure],
    summary: &'a FixSummary,
}

/// Handles the patches of an analysis run.
///
/// Returns the process exit code: 1 when a patch could not be applied, or
/// when `fail_on_smells` is set and any smell was found.
///
/// # Errors
///
/// Returns an error if writing the output or a patch file fails.
pub fn run_fix<W: Write>(run: &AnalysisRun, options: &FixOptions, mut writer: W) -> Result<i32> {
    let patches: Vec<&Patch> = run.patched().filter_map(|r| r.patch.as_ref()).collect();
    let mut summary = FixSummary {
        proposed: patches.len(),
        ..FixSummary::default()
    };

    if let Some(dir) = &options.patch_out {
        let mut seen = FxHashSet::default();
        for patch in &patches {
            let written = write_patch(dir, patch)?;
            if !seen.insert(written.clone()) {
                tracing::warn!("{} overwritten by a later patch", written.display());
            }
            summary.patch_files.push(written);
        }
    }

    if options.apply {
        for patch in &patches {
            match apply_patch(patch) {
                Ok(()) => summary.applied += 1,
                Err(e) => {
                    tracing::warn!(path = %patch.path.display(), "patch not applied: {e:#}");
                    summary.failed.push(ReadFailure {
                        path: patch.path.clone(),
                        error: format!("{e:#}"),
                    });
                }
            }
        }
    }

    if options.json {
        let payload = FixJson {
            patches,
            synthesis_errors: run
                .reports
                .iter()
                .filter_map(|r| r.synthesis_error.as_ref().map(ToString::to_string))
                .collect(),
            read_errors: &run.read_errors,
            summary: &summary,
        };
        writeln!(writer, "{}", serde_json::to_string_pretty(&payload)?)?;
    } else {
        print_fix_report(&mut writer, run, &patches, &summary, options)?;
    }

    if !summary.failed.is_empty() || (options.fail_on_smells && run.diagnostic_count() > 0) {
        return Ok(1);
    }
    Ok(0)
}

fn print_fix_report<W: Write>(
    writer: &mut W,
    run: &AnalysisRun,
    patches: &[&Patch],
    summary: &FixSummary,
    options: &FixOptions,
) -> Result<()> {
    output::print_diagnostics(writer, &run.reports)?;
    output::print_read_errors(writer, &run.read_errors)?;

    if !patches.is_empty() {
        writeln!(writer)?;
    }
    for patch in patches {
        output::print_patch(writer, patch)?;
    }
    output::print_synthesis_errors(writer, &run.reports)?;

    for written in &summary.patch_files {
        writeln!(
            writer,
            "  {} {}",
            "Patch:".cyan(),
            normalize_display_path(written)
        )?;
    }
    for failure in &summary.failed {
        writeln!(
            writer,
            "  {} {}: {}",
            "Not applied:".red(),
            normalize_display_path(&failure.path),
            failure.error
        )?;
    }

    let line = if options.apply {
        format!("{} patch(es) applied.", summary.applied)
    } else {
        format!("{} patch(es) proposed.", summary.proposed)
    };
    writeln!(writer, "\n{}", line.bold())?;
    Ok(())
}

/// Writes `patch` to `<out_dir>/<file name>.patch`, creating the directory.
///
/// # Errors
///
/// Returns an error if the directory or file cannot be written.
pub fn write_patch(out_dir: &Path, patch: &Patch) -> Result<PathBuf> {
    fs::create_dir_all(out_dir)
        .with_context(|| format!("cannot create {}", out_dir.display()))?;
    let name = patch
        .path
        .file_name()
        .map_or_else(|| "patch".into(), |n| n.to_string_lossy().into_owned());
    let target = out_dir.join(format!("{name}.{PATCH_EXTENSION}"));
    fs::write(&target, &patch.diff)
        .with_context(|| format!("cannot write {}", target.display()))?;
    tracing::debug!(path = %target.display(), "patch written");
    Ok(target)
}

/// Applies `patch` to the file it names, strictly.
///
/// # Errors
///
/// Returns an error if the file cannot be read or written, or no longer
/// matches the diff context.
pub fn apply_patch(patch: &Patch) -> Result<()> {
    let current = fs::read_to_string(&patch.path)
        .with_context(|| format!("cannot read {}", patch.path.display()))?;
    let fixed = apply_unified_diff(&current, &patch.diff)?;
    fs::write(&patch.path, fixed)
        .with_context(|| format!("cannot write {}", patch.path.display()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::analyze_files;
    use crate::rules::ScanOptions;
    use tempfile::TempDir;

    const SMELLY: &str = "def f(items=[]):\n    items.append(1)\n    return items\n";
    const FIXED: &str = "def f(items=None):\n    if items is None:\n        items = []\n    items.append(1)\n    return items\n";

    #[test]
    fn test_preview_leaves_files_untouched() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("mod.py");
        fs::write(&file, SMELLY).unwrap();

        let run = analyze_files(&[file.clone()], &ScanOptions::default(), false);
        let mut buffer = Vec::new();
        let code = run_fix(&run, &FixOptions::default(), &mut buffer).unwrap();
        assert_eq!(code, 0);

        let text = String::from_utf8(buffer).unwrap();
        assert!(text.contains("1 patch(es) proposed."));
        assert!(text.contains("+def f(items=None):"));
        assert_eq!(fs::read_to_string(&file).unwrap(), SMELLY);
    }

    #[test]
    fn test_apply_rewrites_files() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("mod.py");
        fs::write(&file, SMELLY).unwrap();

        let run = analyze_files(&[file.clone()], &ScanOptions::default(), false);
        let options = FixOptions {
            apply: true,
            ..FixOptions::default()
        };
        let mut buffer = Vec::new();
        assert_eq!(run_fix(&run, &options, &mut buffer).unwrap(), 0);
        assert!(String::from_utf8(buffer).unwrap().contains("1 patch(es) applied."));
        assert_eq!(fs::read_to_string(&file).unwrap(), FIXED);
    }

    #[test]
    fn test_apply_reports_stale_files() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("mod.py");
        fs::write(&file, SMELLY).unwrap();

        let run = analyze_files(&[file.clone()], &ScanOptions::default(), false);
        fs::write(&file, "def f(items=[]):\n    return None\n").unwrap();

        let options = FixOptions {
            apply: true,
            ..FixOptions::default()
        };
        assert_eq!(run_fix(&run, &options, Vec::new()).unwrap(), 1);
    }

    #[test]
    fn test_patch_out_writes_named_patch_files() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("mod.py");
        fs::write(&file, SMELLY).unwrap();
        let out = dir.path().join("patches");

        let run = analyze_files(&[file.clone()], &ScanOptions::default(), false);
        let options = FixOptions {
            patch_out: Some(out.clone()),
            json: true,
            ..FixOptions::default()
        };
        let mut buffer = Vec::new();
        run_fix(&run, &options, &mut buffer).unwrap();

        let patch = fs::read_to_string(out.join("mod.py.patch")).unwrap();
        assert_eq!(apply_unified_diff(SMELLY, &patch).unwrap(), FIXED);

        let value: serde_json::Value = serde_json::from_slice(&buffer).unwrap();
        assert_eq!(value["summary"]["proposed"], 1);
        assert_eq!(value["patches"][0]["fixes"][0]["param"], "items");
    }
}
