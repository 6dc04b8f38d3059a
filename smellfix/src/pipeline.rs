//! Per-file analysis: parse, scan, plan, rewrite, diff.

use crate::diagnostic::Diagnostic;
use crate::diff::unified_diff;
use crate::fix::{rewrite, AppliedFix, FixPlan, SynthesisError};
use crate::parser::parse_source;
use crate::rules::ScanOptions;
use crate::scanner::scan;
use serde::{Serialize, Serializer};
use std::path::{Path, PathBuf};

/// A unified diff for one file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Patch {
    /// File the diff applies to.
    pub path: PathBuf,
    /// Unified diff text.
    pub diff: String,
    /// Parameters the diff rewrites.
    pub fixes: Vec<AppliedFix>,
}

/// Everything found for one source unit.
#[derive(Debug, Clone, Serialize)]
pub struct FileReport {
    /// Analyzed file.
    pub path: PathBuf,
    /// Diagnostics in document order.
    pub diagnostics: Vec<Diagnostic>,
    /// Proposed fix, when the rewrite changed the text.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub patch: Option<Patch>,
    /// Why a planned fix could not be produced.
    #[serde(
        skip_serializing_if = "Option::is_none",
        serialize_with = "serialize_error"
    )]
    pub synthesis_error: Option<SynthesisError>,
}

#[allow(clippy::ref_option)]
fn serialize_error<S: Serializer>(
    error: &Option<SynthesisError>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    match error {
        Some(error) => serializer.collect_str(error),
        None => serializer.serialize_none(),
    }
}

impl FileReport {
    fn new(path: &Path, diagnostics: Vec<Diagnostic>) -> Self {
        Self {
            path: path.to_path_buf(),
            diagnostics,
            patch: None,
            synthesis_error: None,
        }
    }

    /// Whether any smell (syntax errors included) was reported.
    #[must_use]
    pub fn has_smells(&self) -> bool {
        !self.diagnostics.is_empty()
    }
}

/// Runs the full pipeline on one unit.
///
/// A parse failure yields the single syntax-error diagnostic and no patch.
/// Only mutable-default diagnostics feed the fix plan. A failed rewrite keeps
/// the diagnostics and records the error instead of a patch.
#[must_use]
pub fn analyze_source(path: &Path, source: &str, options: &ScanOptions) -> FileReport {
    let tree = match parse_source(path, source) {
        Ok(tree) => tree,
        Err(diagnostic) => return FileReport::new(path, vec![diagnostic]),
    };

    let diagnostics = scan(&tree, options);
    let plan = FixPlan::from_diagnostics(&diagnostics);
    let mut report = FileReport::new(path, diagnostics);

    match rewrite(&tree, &plan) {
        Ok(Some(rewritten)) => {
            report.patch = unified_diff(path, source, rewritten.source()).map(|diff| Patch {
                path: path.to_path_buf(),
                diff,
                fixes: rewritten.fixes,
            });
        }
        Ok(None) => {}
        Err(error) => {
            tracing::warn!("{error}");
            report.synthesis_error = Some(error);
        }
    }
    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostic::SmellKind;

    #[test]
    fn test_parse_failure_yields_only_syntax_error() {
        let report = analyze_source(Path::new("bad.py"), "def f(:\n", &ScanOptions::default());
        assert_eq!(report.diagnostics.len(), 1);
        assert_eq!(report.diagnostics[0].kind, SmellKind::SyntaxError);
        assert!(report.patch.is_none());
        assert!(report.synthesis_error.is_none());
    }

    #[test]
    fn test_clean_source_has_no_patch() {
        let report = analyze_source(Path::new("ok.py"), "def g(x=5): return x\n", &ScanOptions::default());
        assert!(!report.has_smells());
        assert!(report.patch.is_none());
    }

    #[test]
    fn test_patch_carries_applied_fixes() {
        let report = analyze_source(
            Path::new("a.py"),
            "def f(items=[]): items.append(1)\n",
            &ScanOptions::default(),
        );
        let patch = report.patch.unwrap();
        assert_eq!(patch.path, Path::new("a.py"));
        assert!(patch.diff.starts_with("--- a.py\n+++ a.py\n"));
        assert_eq!(patch.fixes.len(), 1);
        assert_eq!(patch.fixes[0].param, "items");
    }

    #[test]
    fn test_disabled_mutable_default_rule_means_no_patch() {
        let options = ScanOptions::default().with_rules(&[SmellKind::LongMethod]);
        let report = analyze_source(Path::new("a.py"), "def f(a=[]):\n    pass\n", &options);
        assert!(report.diagnostics.is_empty());
        assert!(report.patch.is_none());
    }

    #[test]
    fn test_report_json_shape() {
        let report = analyze_source(Path::new("a.py"), "def f(a=[]):\n    pass\n", &ScanOptions::default());
        let value = serde_json::to_value(&report).unwrap();
        assert_eq!(value["path"], "a.py");
        assert_eq!(value["diagnostics"][0]["kind"], "mutable-default");
        assert!(value["patch"]["diff"].as_str().unwrap().contains("+def f(a=None):"));
        assert!(value.get("synthesis_error").is_none());
    }
}
