//! Diagnostic data model shared by the parser, the scanner and the pipeline.

use ruff_python_ast::Expr;
use serde::{Serialize, Serializer};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Class of a detected smell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum SmellKind {
    /// A parameter default that is a list, dict or set display.
    MutableDefault,
    /// A function whose span reaches the long-method threshold.
    LongMethod,
    /// The source unit could not be parsed.
    SyntaxError,
}

impl SmellKind {
    /// Stable name used in reports and configuration.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::MutableDefault => "mutable-default",
            Self::LongMethod => "long-method",
            Self::SyntaxError => "syntax-error",
        }
    }

    /// Only mutable defaults have a mechanical fix.
    #[must_use]
    pub const fn is_fixable(self) -> bool {
        matches!(self, Self::MutableDefault)
    }
}

impl fmt::Display for SmellKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when a rule name is not recognized.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown rule '{0}' (expected 'mutable-default' or 'long-method')")]
pub struct UnknownRule(pub String);

impl FromStr for SmellKind {
    type Err = UnknownRule;

    /// Parses a selectable rule name. `syntax-error` is not selectable.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "mutable-default" | "mutable-defaults" => Ok(Self::MutableDefault),
            "long-method" | "long-methods" => Ok(Self::LongMethod),
            other => Err(UnknownRule(other.to_owned())),
        }
    }
}

/// Shape of the container a mutable default constructs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ContainerKind {
    /// `[...]`
    Sequence,
    /// `{k: v, ...}`
    Mapping,
    /// `{a, b, ...}`
    Set,
}

impl ContainerKind {
    /// Infers the container kind from the syntactic shape of a default value.
    ///
    /// Only literal displays count. Calls such as `list()` or `Foo()` return
    /// `None`: whether they build a shared mutable value cannot be decided
    /// syntactically.
    #[must_use]
    pub fn from_expr(expr: &Expr) -> Option<Self> {
        match expr {
            Expr::List(_) => Some(Self::Sequence),
            Expr::Dict(_) => Some(Self::Mapping),
            Expr::Set(_) => Some(Self::Set),
            _ => None,
        }
    }

    /// Source text constructing a fresh empty container of this kind.
    #[must_use]
    pub const fn empty_literal(self) -> &'static str {
        match self {
            Self::Sequence => "[]",
            Self::Mapping => "{}",
            Self::Set => "set()",
        }
    }

    /// Lowercase name used in notes and JSON.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Sequence => "sequence",
            Self::Mapping => "mapping",
            Self::Set => "set",
        }
    }
}

impl fmt::Display for ContainerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// File plus line (or inclusive line span) a diagnostic refers to.
///
/// Renders as `path:line` or `path:start-end`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Location {
    /// File the diagnostic belongs to.
    pub file: PathBuf,
    /// First line (1-indexed).
    pub start_line: usize,
    /// Last line (1-indexed, inclusive).
    pub end_line: usize,
}

impl Location {
    /// A single-line location.
    #[must_use]
    pub fn line(file: &Path, line: usize) -> Self {
        Self {
            file: file.to_path_buf(),
            start_line: line,
            end_line: line,
        }
    }

    /// A multi-line location.
    #[must_use]
    pub fn span(file: &Path, start_line: usize, end_line: usize) -> Self {
        Self {
            file: file.to_path_buf(),
            start_line,
            end_line,
        }
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let file = crate::utils::normalize_display_path(&self.file);
        if self.start_line == self.end_line {
            write!(f, "{file}:{}", self.start_line)
        } else {
            write!(f, "{file}:{}-{}", self.start_line, self.end_line)
        }
    }
}

impl Serialize for Location {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// A single smell reported for a source unit.
///
/// Constructed only through the kind-specific constructors, which keep the
/// field invariants: `mutable-default` carries a function, a parameter and a
/// container kind; `long-method` carries a function; `syntax-error` carries
/// none of them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Diagnostic {
    /// Smell class.
    pub kind: SmellKind,
    /// Where the smell was found.
    pub location: Location,
    /// Human-readable description.
    pub note: String,
    /// Owning function, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub function: Option<String>,
    /// Offending parameter, for mutable defaults.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub param: Option<String>,
    /// Container kind inferred at scan time, for mutable defaults.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub container: Option<ContainerKind>,
}

impl Diagnostic {
    /// A mutable default on `param` of `function`.
    #[must_use]
    pub fn mutable_default(
        location: Location,
        function: &str,
        param: &str,
        container: ContainerKind,
    ) -> Self {
        Self {
            kind: SmellKind::MutableDefault,
            location,
            note: format!("Parameter '{param}' has a mutable default"),
            function: Some(function.to_owned()),
            param: Some(param.to_owned()),
            container: Some(container),
        }
    }

    /// A function spanning `length` lines, at or above `threshold`.
    #[must_use]
    pub fn long_method(location: Location, function: &str, length: usize, threshold: usize) -> Self {
        Self {
            kind: SmellKind::LongMethod,
            location,
            note: format!("Function '{function}' spans {length} lines (>={threshold})"),
            function: Some(function.to_owned()),
            param: None,
            container: None,
        }
    }

    /// A parse failure.
    #[must_use]
    pub fn syntax_error(location: Location, message: impl Into<String>) -> Self {
        Self {
            kind: SmellKind::SyntaxError,
            location,
            note: message.into(),
            function: None,
            param: None,
            container: None,
        }
    }
}
