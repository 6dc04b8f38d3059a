//! Unified diff generation and application.
//!
//! Lines unique to both texts anchor the alignment and the gaps between them
//! are aligned with `difference` changesets; hunks are grouped with
//! [`DIFF_CONTEXT_LINES`] lines of context and ranges are written the way
//! `diff -u` writes them, so the output can be fed to `patch -p0`.

use crate::constants::DIFF_CONTEXT_LINES;
use crate::utils::normalize_display_path;
use difference::{Changeset, Difference};
use rustc_hash::FxHashMap;
use std::path::Path;

const NO_NEWLINE_MARKER: &str = "\\ No newline at end of file";

/// Largest gap, in line pairs, aligned with a full LCS table (32 MiB of
/// `usize` cells).
const MAX_CHANGESET_CELLS: usize = 1 << 22;

/// Anchoring recursion stops here; deeper gaps go straight to a changeset.
const MAX_ANCHOR_DEPTH: usize = 8;

/// Error applying a unified diff.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DiffError {
    /// A `@@` line that is not a valid hunk header
    #[error("malformed hunk header at diff line {line}: {text}")]
    MalformedHunkHeader {
        /// 1-indexed line in the diff
        line: usize,
        /// The offending header
        text: String,
    },
    /// A hunk body line without a valid prefix, or more lines than announced
    #[error("malformed hunk body at diff line {line}")]
    MalformedLine {
        /// 1-indexed line in the diff
        line: usize,
    },
    /// The diff ended before a hunk had all its lines
    #[error("hunk starting at diff line {line} is truncated")]
    TruncatedHunk {
        /// 1-indexed line of the hunk header
        line: usize,
    },
    /// A hunk that starts before the previous one ended, or past the end
    #[error("hunk starting at diff line {line} is out of order or out of range")]
    HunkOutOfRange {
        /// 1-indexed line of the hunk header
        line: usize,
    },
    /// Context or removed line does not match the original text
    #[error("context mismatch at line {line}: expected {expected:?}, found {found:?}")]
    ContextMismatch {
        /// 1-indexed line in the original text
        line: usize,
        /// Line the diff expects
        expected: String,
        /// Line actually present
        found: String,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Tag {
    Equal,
    Delete,
    Insert,
}

/// Half-open line ranges `a[i1..i2]` and `b[j1..j2]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Opcode {
    tag: Tag,
    i1: usize,
    i2: usize,
    j1: usize,
    j2: usize,
}

/// Produces a unified diff turning `original` into `rewritten`.
///
/// Both headers name `path`. Returns `None` when the texts are identical.
#[must_use]
pub fn unified_diff(path: &Path, original: &str, rewritten: &str) -> Option<String> {
    if original == rewritten {
        return None;
    }

    let a: Vec<&str> = original.split_inclusive('\n').collect();
    let b: Vec<&str> = rewritten.split_inclusive('\n').collect();
    let groups = group_opcodes(opcodes(&a, &b), DIFF_CONTEXT_LINES);
    if groups.is_empty() {
        return None;
    }

    let name = normalize_display_path(path);
    let mut out = format!("--- {name}\n+++ {name}\n");
    for group in groups {
        let (first, last) = (group[0], group[group.len() - 1]);
        out.push_str(&format!(
            "@@ -{} +{} @@\n",
            format_range(first.i1, last.i2),
            format_range(first.j1, last.j2)
        ));
        for code in &group {
            match code.tag {
                Tag::Equal => push_lines(&mut out, ' ', &a[code.i1..code.i2]),
                Tag::Delete => push_lines(&mut out, '-', &a[code.i1..code.i2]),
                Tag::Insert => push_lines(&mut out, '+', &b[code.j1..code.j2]),
            }
        }
    }
    Some(out)
}

fn push_lines(out: &mut String, prefix: char, lines: &[&str]) {
    for line in lines {
        out.push(prefix);
        out.push_str(line);
        if !line.ends_with('\n') {
            out.push('\n');
            out.push_str(NO_NEWLINE_MARKER);
            out.push('\n');
        }
    }
}

/// `start,length` with 1-indexed start; a single line is written as `start`
/// and an empty range points at the line before it.
fn format_range(start: usize, stop: usize) -> String {
    match stop - start {
        0 => format!("{start},0"),
        1 => format!("{}", start + 1),
        length => format!("{},{length}", start + 1),
    }
}

/// One token per line. The marker keeps blank lines non-empty and tells a
/// final line without newline apart from the same text with one.
fn tokens(lines: &[&str]) -> String {
    lines
        .iter()
        .map(|line| match line.strip_suffix('\n') {
            Some(body) => format!("|{body}"),
            None => format!("!{line}"),
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn opcodes(a: &[&str], b: &[&str]) -> Vec<Opcode> {
    let mut codes = Vec::new();
    align(a, b, (0, 0), 0, &mut codes);
    codes
}

/// Aligns `a` against `b`, whose first lines sit at `origin` in the full
/// texts.
///
/// Common prefix and suffix are trimmed, then lines occurring exactly once
/// on both sides anchor the alignment and only the gaps between anchors go
/// through a changeset. Two edits at opposite ends of a large module thus
/// never share one LCS table.
fn align(a: &[&str], b: &[&str], (i0, j0): (usize, usize), depth: usize, codes: &mut Vec<Opcode>) {
    let prefix = a.iter().zip(b).take_while(|(x, y)| x == y).count();
    let suffix = a[prefix..]
        .iter()
        .rev()
        .zip(b[prefix..].iter().rev())
        .take_while(|(x, y)| x == y)
        .count();
    let (a_mid, b_mid) = (&a[prefix..a.len() - suffix], &b[prefix..b.len() - suffix]);
    let (i, j) = (i0 + prefix, j0 + prefix);

    push_code(codes, Tag::Equal, (i0, i), (j0, j));

    let anchors = if a_mid.is_empty() || b_mid.is_empty() || depth >= MAX_ANCHOR_DEPTH {
        Vec::new()
    } else {
        unique_anchors(a_mid, b_mid)
    };
    if anchors.is_empty() {
        changeset(a_mid, b_mid, (i, j), codes);
    } else {
        let (mut x0, mut y0) = (0, 0);
        for (x, y) in anchors {
            align(&a_mid[x0..x], &b_mid[y0..y], (i + x0, j + y0), depth + 1, codes);
            push_code(codes, Tag::Equal, (i + x, i + x + 1), (j + y, j + y + 1));
            (x0, y0) = (x + 1, y + 1);
        }
        align(&a_mid[x0..], &b_mid[y0..], (i + x0, j + y0), depth + 1, codes);
    }

    let (i, j) = (i + a_mid.len(), j + b_mid.len());
    push_code(codes, Tag::Equal, (i, i + suffix), (j, j + suffix));
}

/// Pairs `(x, y)` with `a[x] == b[y]` for lines unique on both sides, reduced
/// to the longest run increasing in both coordinates.
fn unique_anchors(a: &[&str], b: &[&str]) -> Vec<(usize, usize)> {
    // line -> (count in a, position in a, count in b, position in b)
    let mut seen: FxHashMap<&str, (usize, usize, usize, usize)> = FxHashMap::default();
    for (x, line) in a.iter().enumerate() {
        let entry = seen.entry(*line).or_default();
        entry.0 += 1;
        entry.1 = x;
    }
    for (y, line) in b.iter().enumerate() {
        if let Some(entry) = seen.get_mut(line) {
            entry.2 += 1;
            entry.3 = y;
        }
    }
    let mut pairs: Vec<(usize, usize)> = seen
        .into_values()
        .filter(|&(in_a, _, in_b, _)| in_a == 1 && in_b == 1)
        .map(|(_, x, _, y)| (x, y))
        .collect();
    pairs.sort_unstable();
    longest_increasing(&pairs)
}

/// Longest subsequence of `pairs` (sorted by `x`) whose `y` also increases.
fn longest_increasing(pairs: &[(usize, usize)]) -> Vec<(usize, usize)> {
    let mut tails: Vec<usize> = Vec::new();
    let mut prev: Vec<Option<usize>> = vec![None; pairs.len()];
    for (idx, &(_, y)) in pairs.iter().enumerate() {
        let k = tails.partition_point(|&t| pairs[t].1 < y);
        if k > 0 {
            prev[idx] = Some(tails[k - 1]);
        }
        if k == tails.len() {
            tails.push(idx);
        } else {
            tails[k] = idx;
        }
    }

    let mut out = Vec::with_capacity(tails.len());
    let mut cursor = tails.last().copied();
    while let Some(idx) = cursor {
        out.push(pairs[idx]);
        cursor = prev[idx];
    }
    out.reverse();
    out
}

/// Line changeset for one gap. A gap too large for a full LCS table is
/// emitted as a plain replacement, which is still a valid diff.
fn changeset(a: &[&str], b: &[&str], (i, j): (usize, usize), codes: &mut Vec<Opcode>) {
    if a.is_empty() || b.is_empty() || a.len().saturating_mul(b.len()) > MAX_CHANGESET_CELLS {
        if !a.is_empty() && !b.is_empty() {
            tracing::debug!(old = a.len(), new = b.len(), "gap too large to align, replacing");
        }
        push_code(codes, Tag::Delete, (i, i + a.len()), (j, j));
        push_code(codes, Tag::Insert, (i + a.len(), i + a.len()), (j, j + b.len()));
        return;
    }

    let changeset = Changeset::new(&tokens(a), &tokens(b), "\n");
    let (mut i, mut j) = (i, j);
    for diff in &changeset.diffs {
        match diff {
            Difference::Same(chunk) => {
                let n = chunk.split('\n').count();
                push_code(codes, Tag::Equal, (i, i + n), (j, j + n));
                i += n;
                j += n;
            }
            Difference::Rem(chunk) => {
                let n = chunk.split('\n').count();
                push_code(codes, Tag::Delete, (i, i + n), (j, j));
                i += n;
            }
            Difference::Add(chunk) => {
                let n = chunk.split('\n').count();
                push_code(codes, Tag::Insert, (i, i), (j, j + n));
                j += n;
            }
        }
    }
}

/// Appends an opcode, merging it into the previous one when the tags match.
fn push_code(codes: &mut Vec<Opcode>, tag: Tag, (i1, i2): (usize, usize), (j1, j2): (usize, usize)) {
    if i1 == i2 && j1 == j2 {
        return;
    }
    if let Some(last) = codes.last_mut() {
        if last.tag == tag {
            last.i2 = i2;
            last.j2 = j2;
            return;
        }
    }
    codes.push(Opcode { tag, i1, i2, j1, j2 });
}

/// Splits opcodes into hunks with at most `n` lines of context on each side.
fn group_opcodes(mut codes: Vec<Opcode>, n: usize) -> Vec<Vec<Opcode>> {
    if codes.iter().all(|code| code.tag == Tag::Equal) {
        return Vec::new();
    }
    if let Some(first) = codes.first_mut() {
        if first.tag == Tag::Equal {
            first.i1 = first.i1.max(first.i2.saturating_sub(n));
            first.j1 = first.j1.max(first.j2.saturating_sub(n));
        }
    }
    if let Some(last) = codes.last_mut() {
        if last.tag == Tag::Equal {
            last.i2 = last.i2.min(last.i1 + n);
            last.j2 = last.j2.min(last.j1 + n);
        }
    }

    let mut groups = Vec::new();
    let mut group = Vec::new();
    for mut code in codes {
        if code.tag == Tag::Equal && code.i2 - code.i1 > 2 * n {
            group.push(Opcode {
                i2: code.i2.min(code.i1 + n),
                j2: code.j2.min(code.j1 + n),
                ..code
            });
            groups.push(std::mem::take(&mut group));
            code.i1 = code.i1.max(code.i2 - n);
            code.j1 = code.j1.max(code.j2 - n);
        }
        group.push(code);
    }
    if !(group.is_empty() || (group.len() == 1 && group[0].tag == Tag::Equal)) {
        groups.push(group);
    }
    groups
}

struct HunkHeader {
    old_start: usize,
    old_len: usize,
    new_len: usize,
}

impl HunkHeader {
    fn parse(line: &str) -> Option<Self> {
        let rest = line.strip_prefix("@@ -")?;
        let (ranges, _) = rest.split_once(" @@")?;
        let (old, new) = ranges.split_once(" +")?;
        let (old_start, old_len) = parse_range(old)?;
        let (_, new_len) = parse_range(new)?;
        Some(Self {
            old_start,
            old_len,
            new_len,
        })
    }

    /// 0-indexed position in the original where the hunk begins.
    fn first_line(&self) -> Option<usize> {
        if self.old_len == 0 {
            Some(self.old_start)
        } else {
            self.old_start.checked_sub(1)
        }
    }
}

fn parse_range(text: &str) -> Option<(usize, usize)> {
    match text.split_once(',') {
        Some((start, len)) => Some((start.parse().ok()?, len.parse().ok()?)),
        None => Some((text.parse().ok()?, 1)),
    }
}

/// Applies a unified diff produced by [`unified_diff`] to `original`.
///
/// Context and removed lines must match exactly; there is no fuzz.
///
/// # Errors
///
/// Returns [`DiffError`] when the diff is malformed or does not match
/// `original`.
pub fn apply_unified_diff(original: &str, diff: &str) -> Result<String, DiffError> {
    let source: Vec<&str> = original.split_inclusive('\n').collect();
    let lines: Vec<&str> = diff.split_inclusive('\n').collect();
    let mut out = String::with_capacity(original.len() + diff.len());
    let mut cursor = 0;
    let mut idx = 0;

    while idx < lines.len() {
        let line = lines[idx];
        idx += 1;
        if !line.starts_with("@@") {
            continue;
        }
        let header_line = idx;
        let header = HunkHeader::parse(line).ok_or_else(|| DiffError::MalformedHunkHeader {
            line: header_line,
            text: line.trim_end().to_owned(),
        })?;
        let body = read_hunk_body(&lines, &mut idx, &header, header_line)?;

        let start = header
            .first_line()
            .filter(|start| *start >= cursor && *start <= source.len())
            .ok_or(DiffError::HunkOutOfRange { line: header_line })?;
        for kept in &source[cursor..start] {
            out.push_str(kept);
        }
        cursor = start;

        for (kind, text) in body {
            if kind == '+' {
                out.push_str(&text);
                continue;
            }
            let found = source.get(cursor).copied();
            if found != Some(text.as_str()) {
                return Err(DiffError::ContextMismatch {
                    line: cursor + 1,
                    expected: text,
                    found: found.unwrap_or("<end of file>").to_owned(),
                });
            }
            cursor += 1;
            if kind == ' ' {
                out.push_str(&text);
            }
        }
    }

    for kept in &source[cursor..] {
        out.push_str(kept);
    }
    Ok(out)
}

fn read_hunk_body(
    lines: &[&str],
    idx: &mut usize,
    header: &HunkHeader,
    header_line: usize,
) -> Result<Vec<(char, String)>, DiffError> {
    let mut old_left = header.old_len;
    let mut new_left = header.new_len;
    let mut body: Vec<(char, String)> = Vec::new();

    while old_left > 0 || new_left > 0 {
        let line = lines
            .get(*idx)
            .ok_or(DiffError::TruncatedHunk { line: header_line })?;
        *idx += 1;
        let malformed = DiffError::MalformedLine { line: *idx };

        let kind = line.chars().next().ok_or_else(|| malformed.clone())?;
        match kind {
            '\\' => {
                strip_newline(&mut body);
                continue;
            }
            ' ' => {
                old_left = old_left.checked_sub(1).ok_or_else(|| malformed.clone())?;
                new_left = new_left.checked_sub(1).ok_or_else(|| malformed.clone())?;
            }
            '-' => old_left = old_left.checked_sub(1).ok_or_else(|| malformed.clone())?,
            '+' => new_left = new_left.checked_sub(1).ok_or_else(|| malformed.clone())?,
            _ => return Err(malformed),
        }
        body.push((kind, line[1..].to_owned()));
    }

    if lines.get(*idx).is_some_and(|line| line.starts_with('\\')) {
        strip_newline(&mut body);
        *idx += 1;
    }
    Ok(body)
}

/// The line before a `\ No newline at end of file` marker has no newline.
fn strip_newline(body: &mut [(char, String)]) {
    if let Some((_, text)) = body.last_mut() {
        if text.ends_with('\n') {
            text.pop();
        }
    }
}
