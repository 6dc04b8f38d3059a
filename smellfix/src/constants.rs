use rustc_hash::FxHashSet;
use std::sync::OnceLock;

/// Project-local configuration file name.
pub const CONFIG_FILENAME: &str = ".smellfix.toml";

/// Python project file consulted for a `[tool.smellfix]` table.
pub const PYPROJECT_FILENAME: &str = "pyproject.toml";

/// Minimum span (in lines, `def` line included) at which a function is reported as long.
pub const DEFAULT_LONG_METHOD_THRESHOLD: usize = 25;

/// Value written in place of a mutable default.
pub const ABSENCE_SENTINEL: &str = "None";

/// Indentation unit used when the original source gives no hint.
pub const DEFAULT_INDENT: &str = "    ";

/// Lines of unchanged context around each hunk of a synthesized diff.
pub const DIFF_CONTEXT_LINES: usize = 3;

/// Extension appended to a source file name when a patch is persisted.
pub const PATCH_EXTENSION: &str = "patch";

/// Statement nesting beyond which the function walker stops descending.
pub const MAX_RECURSION_DEPTH: usize = 400;

/// Environment variable holding the `tracing` filter directive.
pub const LOG_ENV_VAR: &str = "SMELLFIX_LOG";

/// Folders that are never descended into during file discovery.
pub fn get_default_exclude_folders() -> &'static FxHashSet<&'static str> {
    static SET: OnceLock<FxHashSet<&'static str>> = OnceLock::new();
    SET.get_or_init(|| {
        let mut s = FxHashSet::default();
        s.insert("__pycache__");
        s.insert(".git");
        s.insert(".pytest_cache");
        s.insert(".mypy_cache");
        s.insert(".ruff_cache");
        s.insert(".tox");
        s.insert("build");
        s.insert("dist");
        s.insert("*.egg-info");
        s.insert("venv");
        s.insert(".venv");
        s
    })
}
