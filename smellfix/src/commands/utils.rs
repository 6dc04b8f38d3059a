//! Shared utilities for command implementations.

use crate::pipeline::{analyze_source, FileReport};
use crate::rules::ScanOptions;
use crate::utils::{collect_python_files, FileFilter};
use rayon::prelude::*;
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};

/// A discovered file that could not be read.
#[derive(Debug, Clone, Serialize)]
pub struct ReadFailure {
    /// File that failed.
    pub path: PathBuf,
    /// I/O error message.
    pub error: String,
}

/// Reports for every readable file, plus the files that could not be read.
/// Both lists are sorted by path.
#[derive(Debug, Default)]
pub struct AnalysisRun {
    /// Number of files considered.
    pub files: usize,
    /// One report per readable file.
    pub reports: Vec<FileReport>,
    /// Files that could not be read.
    pub read_errors: Vec<ReadFailure>,
}

impl AnalysisRun {
    /// Total diagnostics across all reports.
    #[must_use]
    pub fn diagnostic_count(&self) -> usize {
        self.reports.iter().map(|r| r.diagnostics.len()).sum()
    }

    /// Reports that carry a patch.
    pub fn patched(&self) -> impl Iterator<Item = &FileReport> {
        self.reports.iter().filter(|r| r.patch.is_some())
    }
}

/// Finds all Python files under the given roots.
/// Respects .gitignore files in addition to the default folder exclusions.
#[must_use]
pub fn find_python_files(roots: &[PathBuf], exclude: &[String], filter: &FileFilter) -> Vec<PathBuf> {
    let files = collect_python_files(roots, exclude, filter);
    tracing::debug!(count = files.len(), "discovered python files");
    files
}

/// Runs the per-file pipeline over `files` in parallel.
///
/// Units share no state; results are re-sorted by path so output does not
/// depend on scheduling.
#[must_use]
pub fn analyze_files(files: &[PathBuf], options: &ScanOptions, show_progress: bool) -> AnalysisRun {
    let progress = crate::output::create_progress_bar(files.len() as u64, show_progress);

    let outcomes: Vec<Result<FileReport, ReadFailure>> = files
        .par_iter()
        .map(|path| {
            let outcome = analyze_file(path, options);
            progress.inc(1);
            outcome
        })
        .collect();
    progress.finish_and_clear();

    let mut run = AnalysisRun {
        files: files.len(),
        ..AnalysisRun::default()
    };
    for outcome in outcomes {
        match outcome {
            Ok(report) => run.reports.push(report),
            Err(failure) => run.read_errors.push(failure),
        }
    }
    run.reports.sort_by(|a, b| a.path.cmp(&b.path));
    run.read_errors.sort_by(|a, b| a.path.cmp(&b.path));
    run
}

fn analyze_file(path: &Path, options: &ScanOptions) -> Result<FileReport, ReadFailure> {
    let source = fs::read_to_string(path).map_err(|e| {
        tracing::warn!(path = %path.display(), "cannot read file: {e}");
        ReadFailure {
            path: path.to_path_buf(),
            error: e.to_string(),
        }
    })?;
    let report = analyze_source(path, &source, options);
    tracing::debug!(
        path = %path.display(),
        diagnostics = report.diagnostics.len(),
        patched = report.patch.is_some(),
        "analyzed"
    );
    Ok(report)
}
