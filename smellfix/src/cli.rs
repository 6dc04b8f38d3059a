use crate::diagnostic::SmellKind;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// Help text for configuration file options, shown at the bottom of --help.
const CONFIG_HELP: &str = "\
CONFIGURATION FILE (.smellfix.toml, or [tool.smellfix] in pyproject.toml):
  Looked up from the first path upwards. Command-line flags win.

  [smellfix]
  long_method_threshold = 25             # Span (lines) reported as long
  rules = [\"mutable-default\", \"long-method\"]
  include = \"src/**/*.py\"                # Only analyze matching files
  exclude = \"test_*.py\"                  # Skip matching files
  exclude_folders = [\"build\", \".venv\"]
  patch_out = \"patches\"                  # Where `fix` writes <name>.patch

ENVIRONMENT:
  SMELLFIX_LOG   tracing filter directive (e.g. `smellfix=debug`)
";

/// Options shared by every analysis subcommand.
#[derive(Args, Debug, Default, Clone)]
pub struct AnalysisArgs {
    /// Paths to analyze (files or directories).
    /// When no paths are provided, defaults to the current directory.
    pub paths: Vec<PathBuf>,

    /// Span (in lines) at which a function is reported as long.
    #[arg(long, short = 't')]
    pub threshold: Option<usize>,

    /// Detectors to run, comma separated (mutable-default, long-method).
    #[arg(long, short = 'r', value_delimiter = ',')]
    pub rules: Vec<SmellKind>,

    /// Only analyze files matching this glob.
    #[arg(long)]
    pub include: Option<String>,

    /// Skip files matching this glob.
    #[arg(long)]
    pub exclude: Option<String>,

    /// Folders to exclude from discovery.
    #[arg(long, alias = "exclude-folder")]
    pub exclude_folders: Vec<String>,

    /// Output raw JSON.
    #[arg(long)]
    pub json: bool,

    /// Exit with code 1 if any smell is found.
    #[arg(long)]
    pub fail_on_smells: bool,
}

/// Command line interface configuration using `clap`.
/// This struct defines the arguments and flags accepted by the program.
#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "smellfix - structural smell detection and mutable-default fixes for Python",
    long_about = None,
    after_help = CONFIG_HELP
)]
pub struct Cli {
    #[command(subcommand)]
    /// The subcommand to execute.
    pub command: Commands,

    /// Enable verbose output for debugging (debug-level logs on stderr).
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Disable colored output.
    #[arg(long, global = true)]
    pub no_color: bool,
}

#[derive(Subcommand, Debug)]
/// Available subcommands.
pub enum Commands {
    /// Report mutable defaults, long methods and syntax errors
    Scan {
        /// Common analysis options.
        #[command(flatten)]
        common: AnalysisArgs,
    },
    /// Report smells and propose unified-diff fixes for mutable defaults
    Fix {
        /// Common analysis options.
        #[command(flatten)]
        common: AnalysisArgs,

        /// Apply the patches to the files.
        /// Without this flag, only a preview of the diffs is shown.
        #[arg(short = 'a', long)]
        apply: bool,

        /// Write each patch to `<DIR>/<file name>.patch`.
        #[arg(long, value_name = "DIR")]
        patch_out: Option<PathBuf>,
    },
}
