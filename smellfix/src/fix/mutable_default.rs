//! Mutable-default rewrite.
//!
//! Every planned default becomes the `None` sentinel, and the function body
//! gains one guard per parameter that rebuilds a fresh empty container when
//! the argument was omitted:
//!
//! ```text
//! def f(items=[]):            def f(items=None):
//!     items.append(1)   ->        if items is None:
//!                                     items = []
//!                                 items.append(1)
//! ```

use super::{ByteRangeRewriter, Edit, FixPlan, SynthesisError};
use crate::constants::{ABSENCE_SENTINEL, DEFAULT_INDENT};
use crate::diagnostic::ContainerKind;
use crate::tree::{FunctionNode, SyntaxTree};
use crate::utils::{detect_line_ending, line_indentation, LineIndex};
use ruff_python_ast::{Expr, Stmt};
use ruff_text_size::Ranged;
use serde::Serialize;

/// One parameter that was rewritten.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AppliedFix {
    /// Function owning the parameter.
    pub function: String,
    /// Parameter whose default was replaced.
    pub param: String,
    /// Container the guard constructs.
    pub container: ContainerKind,
}

/// Outcome of a rewrite that changed something.
#[derive(Debug, Clone)]
pub struct Rewritten {
    /// The re-parsed rewritten unit.
    pub tree: SyntaxTree,
    /// Rewritten parameters, in document order.
    pub fixes: Vec<AppliedFix>,
}

impl Rewritten {
    /// Rewritten source text.
    #[must_use]
    pub fn source(&self) -> &str {
        self.tree.source()
    }
}

/// Applies the mutable-default rewrite for every planned parameter.
///
/// Returns `Ok(None)` when nothing changes: an empty plan, a plan naming no
/// function in the tree, or planned parameters whose live default is no
/// longer a container literal (already rewritten).
///
/// # Errors
///
/// Returns [`SynthesisError`] when the edits conflict or the rewritten text
/// fails to parse. No partial rewrite is ever returned.
pub fn rewrite(tree: &SyntaxTree, plan: &FixPlan) -> Result<Option<Rewritten>, SynthesisError> {
    if plan.is_empty() {
        return Ok(None);
    }

    let mut rewriter = ByteRangeRewriter::new(tree.source());
    let mut fixes = Vec::new();

    for func in tree.functions() {
        if plan.params_for(func.name()).is_none() {
            continue;
        }
        let targets = live_targets(&func, plan);
        if targets.is_empty() {
            continue;
        }
        for (range, fix) in &targets {
            rewriter.push(
                Edit::replace(range.0, range.1, ABSENCE_SENTINEL).labeled(format!(
                    "{}: default of '{}' -> {ABSENCE_SENTINEL}",
                    fix.function, fix.param
                )),
            );
        }
        let guards: Vec<AppliedFix> = targets.into_iter().map(|(_, fix)| fix).collect();
        rewriter.extend(guard_edits(tree, &func, &guards));
        fixes.extend(guards);
    }

    if rewriter.is_empty() {
        return Ok(None);
    }

    tracing::debug!(
        path = %tree.path().display(),
        params = fixes.len(),
        edits = rewriter.len(),
        "applying mutable-default rewrite"
    );

    let rewritten = rewriter
        .apply_and_parse(tree.path())
        .map_err(|source| SynthesisError {
            path: tree.path().to_path_buf(),
            source,
        })?;

    Ok(Some(Rewritten {
        tree: rewritten,
        fixes,
    }))
}

/// Planned parameters of `func` whose default is still a container literal,
/// with the byte range of that default. Declaration order.
fn live_targets(func: &FunctionNode<'_>, plan: &FixPlan) -> Vec<((usize, usize), AppliedFix)> {
    func.parameters()
        .into_iter()
        .filter(|param| plan.contains(func.name(), param.name()))
        .filter_map(|param| {
            let default = param.default()?;
            let container = param.default_kind()?;
            let range = default.range();
            Some((
                (range.start().to_usize(), range.end().to_usize()),
                AppliedFix {
                    function: func.name().to_owned(),
                    param: param.name().to_owned(),
                    container,
                },
            ))
        })
        .collect()
}

fn render_guards(fixes: &[AppliedFix], indent: &str, unit: &str, nl: &str) -> String {
    fixes
        .iter()
        .map(|fix| {
            format!(
                "{indent}if {p} is {ABSENCE_SENTINEL}:{nl}{indent}{unit}{p} = {lit}{nl}",
                p = fix.param,
                lit = fix.container.empty_literal(),
            )
        })
        .collect()
}

fn is_docstring(stmt: &Stmt) -> bool {
    matches!(stmt, Stmt::Expr(expr) if matches!(&*expr.value, Expr::StringLiteral(_)))
}

/// Edits inserting the guard block at the top of `func`'s body.
fn guard_edits(tree: &SyntaxTree, func: &FunctionNode<'_>, fixes: &[AppliedFix]) -> Vec<Edit> {
    let source = tree.source();
    let index = tree.line_index();
    let nl = detect_line_ending(source);
    let description = format!("guards for {}", func.name());

    let Some(first) = func.body().first() else {
        return Vec::new();
    };
    let def_indent = line_indentation(source, index, func.def.name.start());
    let first_start = first.start().to_usize();
    let first_line_start = index.line_start(first.start());
    let lead = &source[first_line_start..first_start];

    // `def f(x=[]): stmt` - the suite moves to its own line first.
    if !lead.trim().is_empty() {
        let unit = if def_indent.contains('\t') {
            "\t"
        } else {
            DEFAULT_INDENT
        };
        let indent = format!("{def_indent}{unit}");
        let guards = render_guards(fixes, &indent, unit, nl);
        let after_colon = first_line_start + lead.trim_end().len();

        if is_docstring(first) {
            return vec![
                Edit::replace(after_colon, first_start, format!("{nl}{indent}")),
                after_docstring(source, index, func.body(), &guards, &indent, nl, description),
            ];
        }
        return vec![
            Edit::replace(after_colon, first_start, format!("{nl}{guards}{indent}"))
                .labeled(description),
        ];
    }

    let indent = line_indentation(source, index, first.start());
    let unit = indent
        .strip_prefix(def_indent)
        .filter(|unit| !unit.is_empty())
        .unwrap_or(DEFAULT_INDENT);
    let guards = render_guards(fixes, indent, unit, nl);

    if is_docstring(first) {
        return vec![after_docstring(
            source,
            index,
            func.body(),
            &guards,
            indent,
            nl,
            description,
        )];
    }
    vec![Edit::insert(first_line_start, guards).labeled(description)]
}

/// Places `guards` right after a leading docstring so it stays the docstring.
fn after_docstring(
    source: &str,
    index: &LineIndex,
    body: &[Stmt],
    guards: &str,
    indent: &str,
    nl: &str,
    description: String,
) -> Edit {
    let doc = &body[0];
    let doc_end = doc.end().to_usize();
    let (start, end, text) = match body.get(1) {
        // `"""doc"""; stmt` on one line: split at the semicolon.
        Some(next) if index.line_index(next.start()) == index.line_index(doc.end()) => (
            doc_end,
            next.start().to_usize(),
            format!("{nl}{guards}{indent}"),
        ),
        Some(next) => {
            let at = index.line_start(next.start());
            (at, at, guards.to_owned())
        }
        None => match index.next_line_start(doc.end()) {
            Some(at) => (at, at, guards.to_owned()),
            None => (
                source.len(),
                source.len(),
                format!("{nl}{}", guards.strip_suffix(nl).unwrap_or(guards)),
            ),
        },
    };
    Edit::replace(start, end, text).labeled(description)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_source;
    use crate::rules::ScanOptions;
    use crate::scanner::scan;
    use std::path::Path;

    fn fix(source: &str) -> Option<String> {
        let tree = parse_source(Path::new("t.py"), source).unwrap();
        let plan = FixPlan::from_diagnostics(&scan(&tree, &ScanOptions::default()));
        rewrite(&tree, &plan)
            .unwrap()
            .map(|rewritten| rewritten.source().to_owned())
    }

    #[test]
    fn test_inline_suite_is_expanded() {
        let fixed = fix("def f(items=[]): items.append(1)\n").unwrap();
        assert_eq!(
            fixed,
            "def f(items=None):\n    if items is None:\n        items = []\n    items.append(1)\n"
        );
    }

    #[test]
    fn test_guards_follow_parameter_order_after_docstring() {
        let source = "def g(items=[], opts={}):\n    \"\"\"Doc.\"\"\"\n    items.append(opts)\n    return items\n";
        let expected = "def g(items=None, opts=None):\n    \"\"\"Doc.\"\"\"\n    if items is None:\n        items = []\n    if opts is None:\n        opts = {}\n    items.append(opts)\n    return items\n";
        assert_eq!(fix(source).unwrap(), expected);
    }

    #[test]
    fn test_method_with_set_default() {
        let source = "class K:\n    def add(self, x, seen={1, 2}):\n        seen.add(x)\n        return seen\n";
        let expected = "class K:\n    def add(self, x, seen=None):\n        if seen is None:\n            seen = set()\n        seen.add(x)\n        return seen\n";
        assert_eq!(fix(source).unwrap(), expected);
    }

    #[test]
    fn test_nested_functions_are_fixed_independently() {
        let source = "def outer(a=[]):\n    def inner(b={}):\n        return b\n    return inner(a)\n";
        let expected = "def outer(a=None):\n    if a is None:\n        a = []\n    def inner(b=None):\n        if b is None:\n            b = {}\n        return b\n    return inner(a)\n";
        assert_eq!(fix(source).unwrap(), expected);
    }

    #[test]
    fn test_comments_and_tabs_survive() {
        let source = "def f(a=[]):  # keep\n\t# leading comment\n\treturn a\n";
        let expected =
            "def f(a=None):  # keep\n\t# leading comment\n\tif a is None:\n\t\ta = []\n\treturn a\n";
        assert_eq!(fix(source).unwrap(), expected);
    }

    #[test]
    fn test_crlf_line_endings_are_kept() {
        let source = "def f(a=[]):\r\n    return a\r\n";
        let expected = "def f(a=None):\r\n    if a is None:\r\n        a = []\r\n    return a\r\n";
        assert_eq!(fix(source).unwrap(), expected);
    }

    #[test]
    fn test_carriage_return_only_source() {
        let source = "def f(a=[]):\r    \"\"\"Doc.\"\"\"\r\rx = 1\r";
        let expected =
            "def f(a=None):\r    \"\"\"Doc.\"\"\"\r    if a is None:\r        a = []\r\rx = 1\r";
        assert_eq!(fix(source).unwrap(), expected);
    }

    #[test]
    fn test_docstring_only_body_at_end_of_file() {
        let source = "def f(a=[]):\n    \"\"\"Doc.\"\"\"";
        let expected = "def f(a=None):\n    \"\"\"Doc.\"\"\"\n    if a is None:\n        a = []";
        assert_eq!(fix(source).unwrap(), expected);
    }

    #[test]
    fn test_inline_docstring_stays_first() {
        let source = "def f(a=[]): \"doc\"; a.append(1)\n";
        let expected =
            "def f(a=None):\n    \"doc\"\n    if a is None:\n        a = []\n    a.append(1)\n";
        assert_eq!(fix(source).unwrap(), expected);
    }

    #[test]
    fn test_keyword_only_and_async() {
        let source = "async def f(*, opts={}):\n    return opts\n";
        let expected =
            "async def f(*, opts=None):\n    if opts is None:\n        opts = {}\n    return opts\n";
        assert_eq!(fix(source).unwrap(), expected);
    }

    #[test]
    fn test_rewrite_is_idempotent() {
        let once = fix("def f(a=[], b={}):\n    return a, b\n").unwrap();
        assert_eq!(fix(&once), None);
    }

    #[test]
    fn test_unplanned_parameters_are_untouched() {
        let tree = parse_source(Path::new("t.py"), "def f(a=[], b=[]):\n    pass\n").unwrap();
        let mut plan = FixPlan::default();
        plan.insert("f", "a", ContainerKind::Sequence);
        let rewritten = rewrite(&tree, &plan).unwrap().unwrap();
        assert_eq!(
            rewritten.source(),
            "def f(a=None, b=[]):\n    if a is None:\n        a = []\n    pass\n"
        );
        assert_eq!(rewritten.fixes.len(), 1);
        assert_eq!(rewritten.fixes[0].param, "a");
    }

    #[test]
    fn test_live_container_kind_wins() {
        let tree = parse_source(Path::new("t.py"), "def f(a={}):\n    pass\n").unwrap();
        let mut plan = FixPlan::default();
        plan.insert("f", "a", ContainerKind::Sequence);
        let rewritten = rewrite(&tree, &plan).unwrap().unwrap();
        assert!(rewritten.source().contains("a = {}"));
        assert_eq!(rewritten.fixes[0].container, ContainerKind::Mapping);
    }

    #[test]
    fn test_empty_or_unmatched_plan_is_identity() {
        let tree = parse_source(Path::new("t.py"), "def f(a=[]):\n    pass\n").unwrap();
        assert!(rewrite(&tree, &FixPlan::default()).unwrap().is_none());

        let mut plan = FixPlan::default();
        plan.insert("missing", "a", ContainerKind::Sequence);
        assert!(rewrite(&tree, &plan).unwrap().is_none());
    }
}
