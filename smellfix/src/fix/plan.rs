use crate::diagnostic::{ContainerKind, Diagnostic};
use rustc_hash::FxHashMap;

/// A parameter scheduled for the mutable-default rewrite.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedParam {
    /// Parameter name.
    pub name: String,
    /// Container kind seen when the smell was reported.
    pub container: ContainerKind,
}

/// Function name to parameters needing the mutable-default rewrite.
///
/// Only built from `mutable-default` diagnostics, so every planned pair was
/// reported for that exact function.
#[derive(Debug, Clone, Default)]
pub struct FixPlan {
    entries: FxHashMap<String, Vec<PlannedParam>>,
}

impl FixPlan {
    /// Builds a plan from scan output, ignoring every non-fixable diagnostic.
    #[must_use]
    pub fn from_diagnostics(diagnostics: &[Diagnostic]) -> Self {
        let mut plan = Self::default();
        for diag in diagnostics {
            if !diag.kind.is_fixable() {
                continue;
            }
            if let (Some(function), Some(param), Some(container)) =
                (&diag.function, &diag.param, diag.container)
            {
                plan.insert(function, param, container);
            }
        }
        plan
    }

    /// Adds one pair; a pair already present is kept as-is.
    pub fn insert(&mut self, function: &str, param: &str, container: ContainerKind) {
        let params = self.entries.entry(function.to_owned()).or_default();
        if params.iter().any(|p| p.name == param) {
            return;
        }
        params.push(PlannedParam {
            name: param.to_owned(),
            container,
        });
    }

    /// Planned parameters of `function`, in the order they were reported.
    #[must_use]
    pub fn params_for(&self, function: &str) -> Option<&[PlannedParam]> {
        self.entries.get(function).map(Vec::as_slice)
    }

    /// Whether `param` of `function` is planned.
    #[must_use]
    pub fn contains(&self, function: &str, param: &str) -> bool {
        self.params_for(function)
            .is_some_and(|params| params.iter().any(|p| p.name == param))
    }

    /// Number of planned (function, parameter) pairs.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.values().map(Vec::len).sum()
    }

    /// True when nothing is planned.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostic::Location;
    use std::path::Path;

    fn loc() -> Location {
        Location::line(Path::new("p.py"), 1)
    }

    #[test]
    fn test_plan_only_takes_mutable_defaults() {
        let diags = vec![
            Diagnostic::mutable_default(loc(), "f", "items", ContainerKind::Sequence),
            Diagnostic::long_method(Location::span(Path::new("p.py"), 1, 30), "f", 30, 25),
            Diagnostic::mutable_default(loc(), "f", "opts", ContainerKind::Mapping),
            Diagnostic::mutable_default(loc(), "g", "seen", ContainerKind::Set),
        ];
        let plan = FixPlan::from_diagnostics(&diags);
        assert_eq!(plan.len(), 3);
        assert!(plan.contains("f", "items"));
        assert!(plan.contains("f", "opts"));
        assert!(plan.contains("g", "seen"));
        assert!(!plan.contains("g", "items"));

        let names: Vec<_> = plan
            .params_for("f")
            .unwrap()
            .iter()
            .map(|p| p.name.as_str())
            .collect();
        assert_eq!(names, vec!["items", "opts"]);
    }

    #[test]
    fn test_unfixable_kinds_never_enter_the_plan() {
        let diags = vec![
            Diagnostic::syntax_error(loc(), "invalid syntax"),
            Diagnostic::long_method(Location::span(Path::new("p.py"), 1, 40), "big", 40, 25),
        ];
        assert!(FixPlan::from_diagnostics(&diags).is_empty());
    }

    #[test]
    fn test_duplicate_pairs_collapse() {
        let mut plan = FixPlan::default();
        plan.insert("f", "x", ContainerKind::Sequence);
        plan.insert("f", "x", ContainerKind::Sequence);
        assert_eq!(plan.len(), 1);
    }

    #[test]
    fn test_empty_plan() {
        let plan = FixPlan::from_diagnostics(&[Diagnostic::syntax_error(loc(), "bad")]);
        assert!(plan.is_empty());
        assert!(plan.params_for("f").is_none());
    }
}
