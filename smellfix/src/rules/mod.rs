use crate::constants::DEFAULT_LONG_METHOD_THRESHOLD;
use crate::diagnostic::{Diagnostic, SmellKind};
use crate::tree::FunctionNode;
use std::path::PathBuf;

#[derive(Debug, Clone)]
/// Context passed to rules during a scan.
pub struct Context {
    /// Path to the file being analyzed.
    pub filename: PathBuf,
}

#[derive(Debug, Clone, PartialEq, Eq)]
/// Which detectors run, and with what thresholds.
pub struct ScanOptions {
    /// Span (in lines) at which a function is reported as long.
    pub long_method_threshold: usize,
    /// Enabled detectors, in the order they run per function.
    pub rules: Vec<SmellKind>,
}

impl Default for ScanOptions {
    fn default() -> Self {
        Self {
            long_method_threshold: DEFAULT_LONG_METHOD_THRESHOLD,
            rules: vec![SmellKind::MutableDefault, SmellKind::LongMethod],
        }
    }
}

impl ScanOptions {
    /// Overrides the long-method threshold.
    #[must_use]
    pub fn with_threshold(mut self, threshold: usize) -> Self {
        self.long_method_threshold = threshold;
        self
    }

    /// Restricts the scan to `rules`. Detector order stays fixed
    /// (mutable-default before long-method) whatever order is given.
    #[must_use]
    pub fn with_rules(mut self, rules: &[SmellKind]) -> Self {
        self.rules = [SmellKind::MutableDefault, SmellKind::LongMethod]
            .into_iter()
            .filter(|kind| rules.contains(kind))
            .collect();
        self
    }

    /// Whether the detector for `kind` runs.
    #[must_use]
    pub fn is_enabled(&self, kind: SmellKind) -> bool {
        self.rules.contains(&kind)
    }
}

/// Trait defining a smell detector.
///
/// Detectors are independent: each one sees every function node and may
/// report any number of diagnostics for it.
pub trait Rule: Send + Sync {
    /// Returns the descriptive name of the rule.
    fn name(&self) -> &'static str;
    /// Returns the smell class this rule reports.
    fn kind(&self) -> SmellKind;
    /// Called once per function node, in document order.
    fn check_function(&self, func: &FunctionNode<'_>, context: &Context) -> Option<Vec<Diagnostic>>;
}

/// Module containing the long-method detector.
pub mod long_method;
/// Module containing the mutable-default detector.
pub mod mutable_default;

/// Returns the enabled detectors, in run order.
#[must_use]
pub fn get_smell_rules(options: &ScanOptions) -> Vec<Box<dyn Rule>> {
    options
        .rules
        .iter()
        .filter_map(|kind| -> Option<Box<dyn Rule>> {
            match kind {
                SmellKind::MutableDefault => Some(Box::new(mutable_default::MutableDefaultRule)),
                SmellKind::LongMethod => Some(Box::new(long_method::LongMethodRule::new(
                    options.long_method_threshold,
                ))),
                SmellKind::SyntaxError => None,
            }
        })
        .collect()
}
