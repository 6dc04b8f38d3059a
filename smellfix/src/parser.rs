//! Source text to [`SyntaxTree`].

use crate::diagnostic::{Diagnostic, Location};
use crate::tree::SyntaxTree;
use crate::utils::LineIndex;
use ruff_python_parser::parse_module;
use std::path::Path;

/// Parses `source` into a complete syntax tree.
///
/// On failure the error is a single `syntax-error` diagnostic located at the
/// line where the parser's error range starts. No partial tree is returned.
pub fn parse_source(path: &Path, source: &str) -> Result<SyntaxTree, Diagnostic> {
    match parse_module(source) {
        Ok(parsed) => Ok(SyntaxTree::new(path, source, parsed.into_syntax())),
        Err(e) => {
            let line = LineIndex::new(source).line_index(e.location.start());
            tracing::debug!(path = %path.display(), line, "parse failed: {}", e.error);
            Err(Diagnostic::syntax_error(
                Location::line(path, line),
                e.error.to_string(),
            ))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostic::SmellKind;

    #[test]
    fn test_parse_valid_source() {
        let tree = parse_source(Path::new("ok.py"), "x = 1\n").unwrap();
        assert_eq!(tree.body().len(), 1);
        assert_eq!(tree.source(), "x = 1\n");
    }

    #[test]
    fn test_parse_error_reports_line() {
        let source = "x = 1\ny = 2\ndef broken(:\n    pass\n";
        let diag = parse_source(Path::new("bad.py"), source).unwrap_err();
        assert_eq!(diag.kind, SmellKind::SyntaxError);
        assert_eq!(diag.location.start_line, 3);
        assert!(diag.function.is_none());
        assert!(diag.param.is_none());
        assert!(!diag.note.is_empty());
    }
}
