use crate::diagnostic::{Diagnostic, Location, SmellKind};
use crate::rules::{Context, Rule};
use crate::tree::FunctionNode;

/// Flags parameters whose default is a list, dict or set display.
///
/// Such a default is built once, when the `def` executes, and every call that
/// omits the argument shares (and may mutate) the same object. Call
/// expressions are deliberately not flagged.
pub struct MutableDefaultRule;

impl Rule for MutableDefaultRule {
    fn name(&self) -> &'static str {
        "MutableDefaultRule"
    }
    fn kind(&self) -> SmellKind {
        SmellKind::MutableDefault
    }
    fn check_function(&self, func: &FunctionNode<'_>, context: &Context) -> Option<Vec<Diagnostic>> {
        let findings: Vec<Diagnostic> = func
            .parameters()
            .iter()
            .filter_map(|param| {
                let kind = param.default_kind()?;
                Some(Diagnostic::mutable_default(
                    Location::line(&context.filename, func.start_line),
                    func.name(),
                    param.name(),
                    kind,
                ))
            })
            .collect();
        if findings.is_empty() {
            None
        } else {
            Some(findings)
        }
    }
}
