use crate::diagnostic::{Diagnostic, Location, SmellKind};
use crate::rules::{Context, Rule};
use crate::tree::FunctionNode;

/// Flags functions whose span, `def` line through last body line, reaches
/// the threshold.
pub struct LongMethodRule {
    threshold: usize,
}

impl LongMethodRule {
    /// Creates the rule with the given threshold (in lines).
    #[must_use]
    pub fn new(threshold: usize) -> Self {
        Self { threshold }
    }
}

impl Rule for LongMethodRule {
    fn name(&self) -> &'static str {
        "LongMethodRule"
    }
    fn kind(&self) -> SmellKind {
        SmellKind::LongMethod
    }
    fn check_function(&self, func: &FunctionNode<'_>, context: &Context) -> Option<Vec<Diagnostic>> {
        let length = func.length();
        if length < self.threshold {
            return None;
        }
        Some(vec![Diagnostic::long_method(
            Location::span(&context.filename, func.start_line, func.end_line),
            func.name(),
            length,
            self.threshold,
        )])
    }
}
