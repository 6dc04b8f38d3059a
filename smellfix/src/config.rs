use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

use crate::constants::{CONFIG_FILENAME, PYPROJECT_FILENAME};
use crate::diagnostic::SmellKind;
use crate::rules::ScanOptions;

#[derive(Debug, Deserialize, Default, Clone)]
/// Top-level configuration struct.
pub struct Config {
    #[serde(default)]
    /// The main configuration section for smellfix.
    pub smellfix: SmellfixConfig,
    /// The path to the configuration file this was loaded from.
    /// Set during `load_from_path`, `None` if using defaults or programmatic config.
    #[serde(skip)]
    pub config_file_path: Option<PathBuf>,
}

#[derive(Debug, Deserialize, Default, Clone)]
/// Configuration options for smellfix.
pub struct SmellfixConfig {
    /// Span (in lines) at which a function is reported as long.
    pub long_method_threshold: Option<usize>,
    /// Detectors to run (`mutable-default`, `long-method`).
    pub rules: Option<Vec<String>>,
    /// Only analyze files matching this glob.
    pub include: Option<String>,
    /// Skip files matching this glob.
    pub exclude: Option<String>,
    /// Extra folder names to skip during discovery.
    pub exclude_folders: Option<Vec<String>>,
    /// Directory that receives `<name>.patch` files.
    pub patch_out: Option<PathBuf>,
}

impl SmellfixConfig {
    /// Resolves the configured rule names; unknown names are logged and dropped.
    #[must_use]
    pub fn rule_kinds(&self) -> Option<Vec<SmellKind>> {
        let names = self.rules.as_ref()?;
        Some(
            names
                .iter()
                .filter_map(|name| match name.parse::<SmellKind>() {
                    Ok(kind) => Some(kind),
                    Err(e) => {
                        tracing::warn!("ignoring configured rule: {e}");
                        None
                    }
                })
                .collect(),
        )
    }

    /// Scan options described by this section, defaults filled in.
    #[must_use]
    pub fn scan_options(&self) -> ScanOptions {
        let mut options = ScanOptions::default();
        if let Some(threshold) = self.long_method_threshold {
            options = options.with_threshold(threshold);
        }
        if let Some(kinds) = self.rule_kinds() {
            options = options.with_rules(&kinds);
        }
        options
    }
}

#[derive(Debug, Deserialize, Clone)]
struct PyProject {
    tool: ToolConfig,
}

#[derive(Debug, Deserialize, Clone)]
struct ToolConfig {
    smellfix: SmellfixConfig,
}

impl Config {
    /// Loads configuration starting from a specific path and traversing up.
    ///
    /// In each directory `.smellfix.toml` wins over a `[tool.smellfix]` table
    /// in `pyproject.toml`. A file that cannot be read or parsed is skipped
    /// with a warning.
    #[must_use]
    pub fn load_from_path(path: &Path) -> Self {
        // Relative paths such as "." must still see their parents.
        let mut current = fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf());
        if current.is_file() {
            current.pop();
        }

        loop {
            let smellfix_toml = current.join(CONFIG_FILENAME);
            if smellfix_toml.exists() {
                match read_config(&smellfix_toml) {
                    Ok(mut config) => {
                        config.config_file_path = Some(smellfix_toml);
                        return config;
                    }
                    Err(e) => tracing::warn!("skipping {}: {e}", smellfix_toml.display()),
                }
            }

            let pyproject_toml = current.join(PYPROJECT_FILENAME);
            if let Some(section) = read_pyproject_section(&pyproject_toml) {
                tracing::debug!(path = %pyproject_toml.display(), "using [tool.smellfix]");
                return Config {
                    smellfix: section,
                    config_file_path: Some(pyproject_toml),
                };
            }

            if !current.pop() {
                break;
            }
        }

        Config::default()
    }
}

fn read_config(path: &Path) -> anyhow::Result<Config> {
    let content = fs::read_to_string(path)?;
    Ok(toml::from_str::<Config>(&content)?)
}

/// The `[tool.smellfix]` table of a pyproject file, if it has a valid one.
fn read_pyproject_section(path: &Path) -> Option<SmellfixConfig> {
    let content = fs::read_to_string(path).ok()?;
    let value = toml::from_str::<toml::Value>(&content).ok()?;
    value.get("tool")?.get("smellfix")?;
    match toml::from_str::<PyProject>(&content) {
        Ok(pyproject) => Some(pyproject.tool.smellfix),
        Err(e) => {
            tracing::warn!("skipping [tool.smellfix] in {}: {e}", path.display());
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::TempDir;

    #[test]
    fn test_load_from_path_no_config() {
        let dir = TempDir::new().unwrap();
        let config = Config::load_from_path(dir.path());
        assert!(config.config_file_path.is_none());
        assert_eq!(config.smellfix.scan_options(), ScanOptions::default());
    }

    #[test]
    fn test_load_from_path_smellfix_toml() {
        let dir = TempDir::new().unwrap();
        let mut file = std::fs::File::create(dir.path().join(".smellfix.toml")).unwrap();
        writeln!(
            file,
            r#"[smellfix]
long_method_threshold = 40
rules = ["long-method"]
exclude = "test_*.py"
"#
        )
        .unwrap();

        let config = Config::load_from_path(dir.path());
        assert_eq!(config.smellfix.long_method_threshold, Some(40));
        assert_eq!(config.smellfix.exclude.as_deref(), Some("test_*.py"));
        let options = config.smellfix.scan_options();
        assert_eq!(options.long_method_threshold, 40);
        assert_eq!(options.rules, vec![SmellKind::LongMethod]);
    }

    #[test]
    fn test_load_from_path_pyproject_toml() {
        let dir = TempDir::new().unwrap();
        let mut file = std::fs::File::create(dir.path().join("pyproject.toml")).unwrap();
        writeln!(
            file,
            r#"[project]
name = "demo"

[tool.smellfix]
long_method_threshold = 30
patch_out = "patches"
"#
        )
        .unwrap();

        let config = Config::load_from_path(dir.path());
        assert_eq!(config.smellfix.long_method_threshold, Some(30));
        assert_eq!(config.smellfix.patch_out, Some(PathBuf::from("patches")));
        let loaded = config.config_file_path.unwrap();
        assert_eq!(loaded.file_name().unwrap(), "pyproject.toml");
    }

    #[test]
    fn test_smellfix_toml_wins_over_pyproject() {
        let dir = TempDir::new().unwrap();
        std::fs::write(
            dir.path().join("pyproject.toml"),
            "[tool.smellfix]\nlong_method_threshold = 30\n",
        )
        .unwrap();
        std::fs::write(
            dir.path().join(".smellfix.toml"),
            "[smellfix]\nlong_method_threshold = 50\n",
        )
        .unwrap();

        let config = Config::load_from_path(dir.path());
        assert_eq!(config.smellfix.long_method_threshold, Some(50));
    }

    #[test]
    fn test_pyproject_without_section_keeps_walking() {
        let dir = TempDir::new().unwrap();
        let nested = dir.path().join("pkg");
        std::fs::create_dir_all(&nested).unwrap();
        std::fs::write(nested.join("pyproject.toml"), "[project]\nname = \"x\"\n").unwrap();
        std::fs::write(
            dir.path().join(".smellfix.toml"),
            "[smellfix]\nlong_method_threshold = 12\n",
        )
        .unwrap();

        let config = Config::load_from_path(&nested);
        assert_eq!(config.smellfix.long_method_threshold, Some(12));
    }

    #[test]
    fn test_load_from_path_traverses_up() {
        let dir = TempDir::new().unwrap();
        let nested = dir.path().join("src").join("lib");
        std::fs::create_dir_all(&nested).unwrap();

        let mut file = std::fs::File::create(dir.path().join(".smellfix.toml")).unwrap();
        writeln!(
            file,
            r"[smellfix]
long_method_threshold = 90
"
        )
        .unwrap();

        let config = Config::load_from_path(&nested);
        assert_eq!(config.smellfix.long_method_threshold, Some(90));
    }

    #[test]
    fn test_load_from_file_path() {
        let dir = TempDir::new().unwrap();
        std::fs::write(
            dir.path().join(".smellfix.toml"),
            "[smellfix]\nexclude_folders = [\"legacy\"]\n",
        )
        .unwrap();

        let py_file = dir.path().join("test.py");
        std::fs::write(&py_file, "x = 1").unwrap();

        // A file path starts the lookup in its directory.
        let config = Config::load_from_path(&py_file);
        assert_eq!(
            config.smellfix.exclude_folders,
            Some(vec!["legacy".to_owned()])
        );
    }

    #[test]
    fn test_unknown_rules_are_dropped() {
        let section = SmellfixConfig {
            rules: Some(vec![
                "magic-numbers".to_owned(),
                "mutable-defaults".to_owned(),
            ]),
            ..SmellfixConfig::default()
        };
        assert_eq!(
            section.scan_options().rules,
            vec![SmellKind::MutableDefault]
        );
    }

    #[test]
    fn test_malformed_config_is_skipped() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join(".smellfix.toml"), "[smellfix\n").unwrap();
        let config = Config::load_from_path(dir.path());
        assert!(config.config_file_path.is_none());
    }
}
