//! Path utilities for smellfix.
//!
//! This module consolidates all path-related logic for:
//! - Cross-platform path normalization
//! - Include/exclude glob filtering
//! - Python file discovery with gitignore support

use crate::constants::get_default_exclude_folders;
use globset::{Glob, GlobBuilder, GlobMatcher};
use std::path::{Path, PathBuf};

/// Normalizes a path for CLI display.
///
/// - Converts backslashes to forward slashes (for cross-platform consistency)
/// - Strips leading "./" or ".\" prefix (for cleaner output)
///
/// # Examples
/// ```
/// use std::path::Path;
/// use smellfix::utils::normalize_display_path;
///
/// assert_eq!(normalize_display_path(Path::new(".\\pkg\\mod.py")), "pkg/mod.py");
/// assert_eq!(normalize_display_path(Path::new("./src/main.py")), "src/main.py");
/// ```
#[must_use]
pub fn normalize_display_path(path: &Path) -> String {
    let s = path.to_string_lossy();
    // Strip Windows extended path prefix if present
    let clean = s.trim_start_matches(r"\\?\");
    let normalized = clean.replace('\\', "/");
    normalized
        .strip_prefix("./")
        .unwrap_or(&normalized)
        .to_owned()
}

/// Checks if a name matches any exclusion pattern.
/// Supports exact matching and wildcard patterns starting with `*.`.
#[must_use]
pub fn is_excluded(name: &str, excludes: &[String]) -> bool {
    for exclude in excludes {
        if exclude.starts_with("*.") {
            if name.ends_with(&exclude[1..]) {
                return true;
            }
        } else if name == exclude {
            return true;
        }
    }
    false
}

/// Include/exclude glob pair applied to discovered files.
///
/// A pattern without a `/` is matched against the file name as well as the
/// whole path, so `test_*.py` behaves the way users expect.
#[derive(Debug, Clone, Default)]
pub struct FileFilter {
    include: Option<PatternMatcher>,
    exclude: Option<PatternMatcher>,
}

#[derive(Debug, Clone)]
struct PatternMatcher {
    matcher: GlobMatcher,
    name_only: bool,
}

impl PatternMatcher {
    fn new(pattern: &str) -> Result<Self, globset::Error> {
        let glob: Glob = GlobBuilder::new(pattern).literal_separator(false).build()?;
        Ok(Self {
            matcher: glob.compile_matcher(),
            name_only: !pattern.contains('/'),
        })
    }

    fn is_match(&self, path: &Path) -> bool {
        let display = normalize_display_path(path);
        if self.matcher.is_match(&display) {
            return true;
        }
        self.name_only
            && path
                .file_name()
                .is_some_and(|name| self.matcher.is_match(Path::new(name)))
    }
}

impl FileFilter {
    /// Builds a filter from optional include/exclude globs.
    ///
    /// # Errors
    ///
    /// Returns an error if either pattern is not a valid glob.
    pub fn new(include: Option<&str>, exclude: Option<&str>) -> Result<Self, globset::Error> {
        Ok(Self {
            include: include.map(PatternMatcher::new).transpose()?,
            exclude: exclude.map(PatternMatcher::new).transpose()?,
        })
    }

    /// Returns `true` when `path` passes both globs.
    #[must_use]
    pub fn accepts(&self, path: &Path) -> bool {
        if let Some(include) = &self.include {
            if !include.is_match(path) {
                return false;
            }
        }
        if let Some(exclude) = &self.exclude {
            if exclude.is_match(path) {
                return false;
            }
        }
        true
    }
}

/// Collects Python files from the given roots with gitignore support.
///
/// A root that is a file is taken as-is (whatever its extension); directories
/// are walked with the `ignore` crate, which respects .gitignore,
/// .git/info/exclude and the global gitignore in addition to the default
/// folder exclusions. The result is sorted and deduplicated.
#[must_use]
pub fn collect_python_files(
    roots: &[PathBuf],
    exclude_folders: &[String],
    filter: &FileFilter,
) -> Vec<PathBuf> {
    use ignore::WalkBuilder;

    let mut all_excludes: Vec<String> = get_default_exclude_folders()
        .iter()
        .map(|&s| s.to_owned())
        .collect();
    all_excludes.extend(exclude_folders.iter().cloned());

    let mut files = Vec::new();
    for root in roots {
        if root.is_file() {
            if filter.accepts(root) {
                files.push(root.clone());
            }
            continue;
        }

        let excludes_for_filter = all_excludes.clone();
        let root_for_filter = root.clone();
        let walker = WalkBuilder::new(root)
            .hidden(false)
            .git_ignore(true)
            .git_global(true)
            .git_exclude(true)
            .filter_entry(move |entry| {
                if entry.path() == root_for_filter {
                    return true;
                }
                if !entry.file_type().is_some_and(|ft| ft.is_dir()) {
                    return true;
                }
                entry
                    .file_name()
                    .to_str()
                    .is_none_or(|name| !is_excluded(name, &excludes_for_filter))
            })
            .build();

        for result in walker {
            match result {
                Ok(entry) => {
                    let path = entry.path();
                    if entry.file_type().is_some_and(|ft| ft.is_dir()) {
                        continue;
                    }
                    if path.extension().is_some_and(|ext| ext == "py") && filter.accepts(path) {
                        files.push(path.to_path_buf());
                    }
                }
                Err(e) => tracing::debug!("walk error: {e}"),
            }
        }
    }

    files.sort();
    files.dedup();
    files
}
