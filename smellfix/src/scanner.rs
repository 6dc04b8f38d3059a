use crate::diagnostic::Diagnostic;
use crate::rules::{get_smell_rules, Context, Rule, ScanOptions};
use crate::tree::{FunctionNode, SyntaxTree};
use std::path::PathBuf;

/// Visitor that applies smell rules to every function node of a tree.
pub struct SmellScanner {
    rules: Vec<Box<dyn Rule>>,
    context: Context,
    /// Diagnostics collected so far, in document order.
    pub diagnostics: Vec<Diagnostic>,
}

impl SmellScanner {
    /// Creates a new `SmellScanner` with the given rules.
    #[must_use]
    pub fn new(rules: Vec<Box<dyn Rule>>, filename: PathBuf) -> Self {
        Self {
            rules,
            context: Context { filename },
            diagnostics: Vec::new(),
        }
    }

    /// Runs every rule on one function node.
    pub fn visit_function(&mut self, func: &FunctionNode<'_>) {
        for rule in &self.rules {
            if let Some(mut found) = rule.check_function(func, &self.context) {
                tracing::trace!(
                    rule = rule.name(),
                    function = func.name(),
                    count = found.len(),
                    "rule matched"
                );
                self.diagnostics.append(&mut found);
            }
        }
    }

    /// Visits all function nodes of `tree` in document order.
    pub fn visit_tree(&mut self, tree: &SyntaxTree) {
        for func in tree.functions() {
            self.visit_function(&func);
        }
    }
}

/// Scans a tree with the detectors selected by `options`.
///
/// Diagnostics come out outer-to-inner, top-to-bottom; per function the
/// mutable-default diagnostics (in parameter order) precede the long-method one.
#[must_use]
pub fn scan(tree: &SyntaxTree, options: &ScanOptions) -> Vec<Diagnostic> {
    let mut scanner = SmellScanner::new(get_smell_rules(options), tree.path().to_path_buf());
    scanner.visit_tree(tree);
    tracing::debug!(
        path = %tree.path().display(),
        count = scanner.diagnostics.len(),
        "scan complete"
    );
    scanner.diagnostics
}
