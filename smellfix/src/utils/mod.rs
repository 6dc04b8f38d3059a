//! Utilities module for smellfix.
//!
//! Offset/line bookkeeping shared by the scanner and the rewriter, plus the
//! path helpers used by the commands.

mod paths;

pub use paths::{collect_python_files, is_excluded, normalize_display_path, FileFilter};

use ruff_text_size::TextSize;

/// A utility struct to convert byte offsets to line numbers.
///
/// The parser works with byte offsets, but diagnostics are reported with
/// line numbers and guards are inserted at line starts.
#[derive(Debug, Clone)]
pub struct LineIndex {
    /// Stores the byte index of the start of each line.
    line_starts: Vec<usize>,
}

impl LineIndex {
    /// Creates a new `LineIndex` by scanning the source code for newlines.
    ///
    /// `\n`, `\r\n` and a lone `\r` each end a line, as in Python's tokenizer.
    #[must_use]
    pub fn new(source: &str) -> Self {
        let bytes = source.as_bytes();
        let mut line_starts = vec![0];
        for (i, byte) in bytes.iter().enumerate() {
            match byte {
                b'\n' => line_starts.push(i + 1),
                b'\r' if bytes.get(i + 1) != Some(&b'\n') => line_starts.push(i + 1),
                _ => {}
            }
        }
        Self { line_starts }
    }

    /// Converts a `TextSize` (byte offset) to a 1-indexed line number.
    #[must_use]
    pub fn line_index(&self, offset: TextSize) -> usize {
        let offset = offset.to_usize();
        match self.line_starts.binary_search(&offset) {
            Ok(line) => line + 1,
            Err(line) => line,
        }
    }

    /// Byte offset of the first character of the line containing `offset`.
    #[must_use]
    pub fn line_start(&self, offset: TextSize) -> usize {
        let line = self.line_index(offset);
        self.line_starts[line.saturating_sub(1)]
    }

    /// Byte offset where the line after the one containing `offset` starts,
    /// or `None` on the last line.
    #[must_use]
    pub fn next_line_start(&self, offset: TextSize) -> Option<usize> {
        self.line_starts.get(self.line_index(offset)).copied()
    }

    /// Number of lines in the indexed source.
    #[must_use]
    pub fn line_count(&self) -> usize {
        self.line_starts.len()
    }
}

/// Returns the leading whitespace of the line that contains `offset`.
#[must_use]
pub fn line_indentation<'a>(source: &'a str, line_index: &LineIndex, offset: TextSize) -> &'a str {
    let start = line_index.line_start(offset);
    let line = &source[start..];
    let width = line
        .find(|c: char| c != ' ' && c != '\t')
        .unwrap_or(line.len());
    &line[..width]
}

/// Line terminator of the first line: `"\r\n"`, a lone `"\r"`, or `"\n"`
/// (also the answer for single-line sources).
#[must_use]
pub fn detect_line_ending(source: &str) -> &'static str {
    match source.find(['\r', '\n']) {
        Some(pos) if source[pos..].starts_with("\r\n") => "\r\n",
        Some(pos) if source[pos..].starts_with('\r') => "\r",
        _ => "\n",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_line_index_maps_offsets_to_lines() {
        let source = "a = 1\nb = 2\n\nc = 3";
        let index = LineIndex::new(source);
        assert_eq!(index.line_index(TextSize::from(0)), 1);
        assert_eq!(index.line_index(TextSize::from(4)), 1);
        assert_eq!(index.line_index(TextSize::from(6)), 2);
        assert_eq!(index.line_index(TextSize::from(12)), 3);
        assert_eq!(index.line_index(TextSize::from(13)), 4);
        assert_eq!(index.line_count(), 4);
    }

    #[test]
    fn test_line_start_and_indentation() {
        let source = "def f():\n    \treturn 1\n";
        let index = LineIndex::new(source);
        let offset = TextSize::try_from(source.find("return").unwrap()).unwrap();
        assert_eq!(index.line_start(offset), 9);
        assert_eq!(line_indentation(source, &index, offset), "    \t");
    }

    #[test]
    fn test_detect_line_ending() {
        assert_eq!(detect_line_ending("a\r\nb\r\n"), "\r\n");
        assert_eq!(detect_line_ending("a\nb\n"), "\n");
        assert_eq!(detect_line_ending("single line"), "\n");
        assert_eq!(detect_line_ending("\nleading"), "\n");
        assert_eq!(detect_line_ending("a\rb\r"), "\r");
    }

    #[test]
    fn test_lone_carriage_returns_end_lines() {
        let source = "a = 1\rb = 2\r\nc = 3\nd = 4";
        let index = LineIndex::new(source);
        assert_eq!(index.line_count(), 4);
        let c = TextSize::try_from(source.find('c').unwrap()).unwrap();
        let d = TextSize::try_from(source.find('d').unwrap()).unwrap();
        assert_eq!(index.line_index(c), 3);
        assert_eq!(index.line_index(d), 4);
        assert_eq!(index.next_line_start(TextSize::from(0)), Some(6));
        assert_eq!(index.next_line_start(d), None);
    }
}
