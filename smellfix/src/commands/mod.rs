//! Commands module - CLI subcommand implementations.

mod fix;
mod scan;
mod utils;

pub use fix::{apply_patch, run_fix, write_patch, FixOptions, FixSummary};
pub use scan::{run_scan, ScanCommandOptions};
pub use utils::{analyze_files, find_python_files, AnalysisRun, ReadFailure};
