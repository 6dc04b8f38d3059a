//! Syntax tree for one source unit and the function-node view the detectors
//! and the rewriter work on.

use crate::constants::MAX_RECURSION_DEPTH;
use crate::diagnostic::ContainerKind;
use crate::utils::LineIndex;
use ruff_python_ast::{self as ast, Expr, ModModule, Stmt};
use ruff_text_size::Ranged;
use std::path::{Path, PathBuf};

/// A parsed source unit: the module AST together with the text it was
/// parsed from and a line index over that text.
///
/// Node ranges index into `source`, so the three always travel together.
#[derive(Debug, Clone)]
pub struct SyntaxTree {
    path: PathBuf,
    source: String,
    module: ModModule,
    line_index: LineIndex,
}

impl SyntaxTree {
    pub(crate) fn new(path: &Path, source: &str, module: ModModule) -> Self {
        Self {
            path: path.to_path_buf(),
            source: source.to_owned(),
            line_index: LineIndex::new(source),
            module,
        }
    }

    /// Path the unit was read from.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Source text the tree was parsed from.
    #[must_use]
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Module-level statements.
    #[must_use]
    pub fn body(&self) -> &[Stmt] {
        &self.module.body
    }

    /// Line index over [`Self::source`].
    #[must_use]
    pub fn line_index(&self) -> &LineIndex {
        &self.line_index
    }

    /// All function definitions in document order (pre-order: a function
    /// comes before the functions nested inside it).
    #[must_use]
    pub fn functions(&self) -> Vec<FunctionNode<'_>> {
        let mut out = Vec::new();
        collect_functions(&self.module.body, &self.line_index, 0, &mut out);
        out
    }
}

fn collect_functions<'a>(
    body: &'a [Stmt],
    line_index: &LineIndex,
    depth: usize,
    out: &mut Vec<FunctionNode<'a>>,
) {
    if depth > MAX_RECURSION_DEPTH {
        return;
    }
    for stmt in body {
        match stmt {
            Stmt::FunctionDef(node) => {
                out.push(FunctionNode::new(node, line_index));
                collect_functions(&node.body, line_index, depth + 1, out);
            }
            Stmt::ClassDef(node) => collect_functions(&node.body, line_index, depth + 1, out),
            Stmt::If(node) => {
                collect_functions(&node.body, line_index, depth + 1, out);
                for clause in &node.elif_else_clauses {
                    collect_functions(&clause.body, line_index, depth + 1, out);
                }
            }
            Stmt::For(node) => {
                collect_functions(&node.body, line_index, depth + 1, out);
                collect_functions(&node.orelse, line_index, depth + 1, out);
            }
            Stmt::While(node) => {
                collect_functions(&node.body, line_index, depth + 1, out);
                collect_functions(&node.orelse, line_index, depth + 1, out);
            }
            Stmt::Try(node) => {
                collect_functions(&node.body, line_index, depth + 1, out);
                for handler in &node.handlers {
                    let ast::ExceptHandler::ExceptHandler(h) = handler;
                    collect_functions(&h.body, line_index, depth + 1, out);
                }
                collect_functions(&node.orelse, line_index, depth + 1, out);
                collect_functions(&node.finalbody, line_index, depth + 1, out);
            }
            Stmt::With(node) => collect_functions(&node.body, line_index, depth + 1, out),
            Stmt::Match(node) => {
                for case in &node.cases {
                    collect_functions(&case.body, line_index, depth + 1, out);
                }
            }
            _ => {}
        }
    }
}

/// One `def` or `async def` in the tree.
#[derive(Debug, Clone, Copy)]
pub struct FunctionNode<'a> {
    /// The underlying AST node.
    pub def: &'a ast::StmtFunctionDef,
    /// Line of the `def` keyword (decorators excluded).
    pub start_line: usize,
    /// Line on which the last body statement ends.
    pub end_line: usize,
}

impl<'a> FunctionNode<'a> {
    fn new(def: &'a ast::StmtFunctionDef, line_index: &LineIndex) -> Self {
        Self {
            def,
            start_line: line_index.line_index(def.name.range().start()),
            end_line: line_index.line_index(def.range().end()),
        }
    }

    /// Function name.
    #[must_use]
    pub fn name(&self) -> &'a str {
        self.def.name.as_str()
    }

    /// Inclusive line span, `end_line - start_line + 1`.
    #[must_use]
    pub fn length(&self) -> usize {
        self.end_line - self.start_line + 1
    }

    /// Body statements in source order.
    #[must_use]
    pub fn body(&self) -> &'a [Stmt] {
        &self.def.body
    }

    /// Parameters that may carry a default, in declaration order:
    /// positional-only, then positional-or-keyword, then keyword-only.
    /// `*args` and `**kwargs` never have defaults and are not listed.
    #[must_use]
    pub fn parameters(&self) -> Vec<Param<'a>> {
        let parameters = &self.def.parameters;
        parameters
            .posonlyargs
            .iter()
            .chain(&parameters.args)
            .chain(&parameters.kwonlyargs)
            .map(Param::new)
            .collect()
    }
}

/// A parameter together with its default value, if any.
#[derive(Debug, Clone, Copy)]
pub struct Param<'a> {
    /// The underlying AST node.
    pub node: &'a ast::ParameterWithDefault,
}

impl<'a> Param<'a> {
    fn new(node: &'a ast::ParameterWithDefault) -> Self {
        Self { node }
    }

    /// Parameter name.
    #[must_use]
    pub fn name(&self) -> &'a str {
        self.node.parameter.name.as_str()
    }

    /// Default value expression.
    #[must_use]
    pub fn default(&self) -> Option<&'a Expr> {
        self.node.default.as_deref()
    }

    /// Whether a default is present.
    #[must_use]
    pub fn has_default(&self) -> bool {
        self.node.default.is_some()
    }

    /// Container kind of the default when it is a literal list, dict or set.
    #[must_use]
    pub fn default_kind(&self) -> Option<ContainerKind> {
        self.default().and_then(ContainerKind::from_expr)
    }
}
