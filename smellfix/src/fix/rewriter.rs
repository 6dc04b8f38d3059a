//! Byte-range rewriter for one source unit.
//!
//! Edits are anchored on byte offsets taken from syntax-tree ranges. Text
//! outside the edited ranges (comments, blank lines, quoting style) is copied
//! through untouched.
//!
//! ```
//! use smellfix::fix::{ByteRangeRewriter, Edit};
//!
//! let source = "def f(x=[]): pass";
//! let mut rewriter = ByteRangeRewriter::new(source);
//! rewriter.push(Edit::replace(8, 10, "None"));
//! assert_eq!(rewriter.apply().unwrap(), "def f(x=None): pass");
//! ```

use crate::parser::parse_source;
use crate::tree::SyntaxTree;
use std::path::Path;

/// Replacement of `start..end` (bytes) with `text`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Edit {
    /// First replaced byte.
    pub start: usize,
    /// One past the last replaced byte. Equal to `start` for insertions.
    pub end: usize,
    /// New text.
    pub text: String,
    /// Shown in trace logs.
    pub label: Option<String>,
}

impl Edit {
    /// Replaces `start..end` with `text`.
    #[must_use]
    pub fn replace(start: usize, end: usize, text: impl Into<String>) -> Self {
        Self {
            start,
            end,
            text: text.into(),
            label: None,
        }
    }

    /// Inserts `text` before byte `at`.
    #[must_use]
    pub fn insert(at: usize, text: impl Into<String>) -> Self {
        Self::replace(at, at, text)
    }

    /// Attaches a label for trace logging.
    #[must_use]
    pub fn labeled(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }
}

/// Why a set of edits could not be applied.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RewriteError {
    /// Two edits replace overlapping ranges.
    #[error("edits {first} and {second} overlap")]
    Overlap {
        /// Index of the earlier edit.
        first: usize,
        /// Index of the later edit.
        second: usize,
    },
    /// An edit reaches past the end of the source, or is reversed.
    #[error("edit {index} ({start}..{end}) is outside the source ({len} bytes)")]
    OutOfBounds {
        /// Index of the edit.
        index: usize,
        /// Its start offset.
        start: usize,
        /// Its end offset.
        end: usize,
        /// Source length.
        len: usize,
    },
    /// An edit boundary falls inside a multi-byte character.
    #[error("edit {index} splits a character at byte {offset}")]
    SplitsChar {
        /// Index of the edit.
        index: usize,
        /// Offending offset.
        offset: usize,
    },
    /// The rewritten source no longer parses.
    #[error("rewritten source does not parse (line {line}): {message}")]
    Unparsable {
        /// Line reported by the parser.
        line: usize,
        /// Parser message.
        message: String,
    },
}

/// Collects edits against a borrowed source and applies them in one pass.
///
/// Edits may be pushed in any order. Insertions at the same offset keep the
/// order they were pushed in, and an insertion at the start of a replaced
/// range lands before the replacement.
#[derive(Debug, Clone)]
pub struct ByteRangeRewriter<'src> {
    source: &'src str,
    edits: Vec<Edit>,
}

impl<'src> ByteRangeRewriter<'src> {
    /// A rewriter with no pending edits.
    #[must_use]
    pub fn new(source: &'src str) -> Self {
        Self {
            source,
            edits: Vec::new(),
        }
    }

    /// Queues one edit.
    pub fn push(&mut self, edit: Edit) {
        self.edits.push(edit);
    }

    /// Number of queued edits.
    #[must_use]
    pub fn len(&self) -> usize {
        self.edits.len()
    }

    /// Whether no edit is queued.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.edits.is_empty()
    }

    /// Indices of the queued edits in application order, after checking
    /// bounds, character boundaries and overlaps.
    fn ordered(&self) -> Result<Vec<usize>, RewriteError> {
        let len = self.source.len();
        for (index, edit) in self.edits.iter().enumerate() {
            if edit.start > edit.end || edit.end > len {
                return Err(RewriteError::OutOfBounds {
                    index,
                    start: edit.start,
                    end: edit.end,
                    len,
                });
            }
            if let Some(&offset) = [edit.start, edit.end]
                .iter()
                .find(|&&offset| !self.source.is_char_boundary(offset))
            {
                return Err(RewriteError::SplitsChar { index, offset });
            }
        }

        let mut order: Vec<usize> = (0..self.edits.len()).collect();
        order.sort_by_key(|&i| (self.edits[i].start, self.edits[i].end));

        // Widest reach so far, and which edit it belongs to.
        let mut reach: Option<(usize, usize)> = None;
        for &i in &order {
            let edit = &self.edits[i];
            if let Some((end, owner)) = reach {
                if edit.start < end {
                    return Err(RewriteError::Overlap {
                        first: owner.min(i),
                        second: owner.max(i),
                    });
                }
            }
            if reach.is_none_or(|(end, _)| edit.end >= end) {
                reach = Some((edit.end, i));
            }
        }
        Ok(order)
    }

    /// Applies every queued edit and returns the new text.
    ///
    /// # Errors
    ///
    /// Returns an error if an edit is out of bounds, splits a character or
    /// overlaps another edit. Nothing is applied in that case.
    pub fn apply(self) -> Result<String, RewriteError> {
        let order = self.ordered()?;
        let added: usize = self.edits.iter().map(|e| e.text.len()).sum();
        let mut out = String::with_capacity(self.source.len() + added);
        let mut cursor = 0;
        for i in order {
            let edit = &self.edits[i];
            if let Some(label) = &edit.label {
                tracing::trace!(start = edit.start, end = edit.end, "{label}");
            }
            out.push_str(&self.source[cursor..edit.start]);
            out.push_str(&edit.text);
            cursor = edit.end;
        }
        out.push_str(&self.source[cursor..]);
        Ok(out)
    }

    /// Applies the edits and parses the result into a new tree for `path`.
    ///
    /// # Errors
    ///
    /// Returns an error if the edits cannot be applied or the rewritten text
    /// is not valid Python.
    pub fn apply_and_parse(self, path: &Path) -> Result<SyntaxTree, RewriteError> {
        let text = self.apply()?;
        parse_source(path, &text).map_err(|diag| RewriteError::Unparsable {
            line: diag.location.start_line,
            message: diag.note,
        })
    }
}

impl Extend<Edit> for ByteRangeRewriter<'_> {
    fn extend<I: IntoIterator<Item = Edit>>(&mut self, edits: I) {
        self.edits.extend(edits);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn apply(source: &str, edits: Vec<Edit>) -> Result<String, RewriteError> {
        let mut rewriter = ByteRangeRewriter::new(source);
        rewriter.extend(edits);
        rewriter.apply()
    }

    #[test]
    fn test_edits_apply_in_offset_order() {
        let source = "def f(a=[], b={}): pass";
        let a = source.find("[]").unwrap();
        let b = source.find("{}").unwrap();
        let result = apply(
            source,
            vec![Edit::replace(b, b + 2, "None"), Edit::replace(a, a + 2, "None")],
        )
        .unwrap();
        assert_eq!(result, "def f(a=None, b=None): pass");
    }

    #[test]
    fn test_overlap_is_rejected() {
        let result = apply(
            "hello world",
            vec![Edit::replace(0, 8, "hi"), Edit::replace(5, 10, "there")],
        );
        assert_eq!(result, Err(RewriteError::Overlap { first: 0, second: 1 }));
    }

    #[test]
    fn test_nested_overlap_is_rejected() {
        let result = apply(
            "abcdefghij",
            vec![
                Edit::replace(0, 9, "x"),
                Edit::replace(2, 3, "y"),
                Edit::insert(5, "z"),
            ],
        );
        assert!(matches!(result, Err(RewriteError::Overlap { first: 0, .. })));
    }

    #[test]
    fn test_touching_ranges_do_not_overlap() {
        let result = apply(
            "abcd",
            vec![
                Edit::replace(2, 4, "CD"),
                Edit::replace(0, 2, "AB"),
                Edit::insert(2, "-"),
            ],
        )
        .unwrap();
        assert_eq!(result, "AB-CD");
    }

    #[test]
    fn test_out_of_bounds_and_char_boundaries() {
        assert!(matches!(
            apply("short", vec![Edit::replace(0, 100, "long")]),
            Err(RewriteError::OutOfBounds { index: 0, .. })
        ));
        assert!(matches!(
            apply("short", vec![Edit::replace(3, 1, "")]),
            Err(RewriteError::OutOfBounds { .. })
        ));

        let source = "x = 'é'";
        let inside = source.find('é').unwrap() + 1;
        assert_eq!(
            apply(source, vec![Edit::insert(inside, "!")]),
            Err(RewriteError::SplitsChar {
                index: 0,
                offset: inside
            })
        );
    }

    #[test]
    fn test_insertions_at_same_offset_keep_push_order() {
        let result = apply(
            "body",
            vec![Edit::insert(0, "first "), Edit::insert(0, "second ")],
        )
        .unwrap();
        assert_eq!(result, "first second body");
    }

    #[test]
    fn test_untouched_text_is_preserved() {
        let source = "def foo():\n    # important comment\n    return 42\n";
        let pos = source.find("42").unwrap();
        let result = apply(source, vec![Edit::replace(pos, pos + 2, "100").labeled("bump")]).unwrap();
        assert_eq!(result, "def foo():\n    # important comment\n    return 100\n");
    }

    #[test]
    fn test_no_edits_is_identity() {
        let rewriter = ByteRangeRewriter::new("hello world");
        assert!(rewriter.is_empty());
        assert_eq!(rewriter.apply().unwrap(), "hello world");
    }

    #[test]
    fn test_unparsable_output_is_rejected() {
        let source = "def f():\n    return 1\n";
        let mut rewriter = ByteRangeRewriter::new(source);
        rewriter.push(Edit::insert(source.len(), "def (:\n"));
        assert!(matches!(
            rewriter.apply_and_parse(Path::new("f.py")),
            Err(RewriteError::Unparsable { line: 3, .. })
        ));
    }

    #[test]
    fn test_parsed_output_is_a_new_tree() {
        let source = "def f(x=[]):\n    return x\n";
        let start = source.find("[]").unwrap();
        let mut rewriter = ByteRangeRewriter::new(source);
        rewriter.push(Edit::replace(start, start + 2, "None"));
        assert_eq!(rewriter.len(), 1);

        let tree = rewriter.apply_and_parse(Path::new("f.py")).unwrap();
        assert_eq!(tree.source(), "def f(x=None):\n    return x\n");
        assert_eq!(tree.functions().len(), 1);
    }
}
