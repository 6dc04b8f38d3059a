use crate::cli::{AnalysisArgs, Cli, Commands};
use crate::commands::{analyze_files, find_python_files, AnalysisRun};
use crate::config::Config;
use crate::constants::LOG_ENV_VAR;
use crate::rules::ScanOptions;
use crate::utils::FileFilter;
use anyhow::{Context, Result};
use clap::Parser;
use std::path::{Path, PathBuf};

/// Runs smellfix with the given arguments.
///
/// # Errors
///
/// Returns an error if the command execution fails.
pub fn run_with_args(args: Vec<String>) -> Result<i32> {
    run_with_args_to(args, &mut std::io::stdout())
}

/// Run smellfix with the given arguments, writing output to the specified writer.
///
/// This is the testable version of `run_with_args` that allows output capture.
/// Logs and progress go to stderr.
///
/// # Errors
///
/// Returns an error if the command execution fails.
pub fn run_with_args_to<W: std::io::Write>(args: Vec<String>, writer: &mut W) -> Result<i32> {
    let mut program_args = vec!["smellfix".to_owned()];
    program_args.extend(args);
    let cli_var = match Cli::try_parse_from(program_args) {
        Ok(c) => c,
        Err(e) => {
            match e.kind() {
                clap::error::ErrorKind::DisplayHelp | clap::error::ErrorKind::DisplayVersion => {
                    write!(writer, "{e}")?;
                    writer.flush()?;
                    return Ok(0);
                }
                _ => {
                    eprint!("{e}");
                    return Ok(1);
                }
            }
        }
    };

    init_tracing(cli_var.verbose);
    if cli_var.no_color {
        colored::control::set_override(false);
    }

    match cli_var.command {
        Commands::Scan { common } => {
            let Some(prepared) = prepare(&common, cli_var.verbose)? else {
                return Ok(1);
            };
            let run = analyze_files(&prepared.files, &prepared.scan, !common.json);
            crate::commands::run_scan(
                &run,
                &crate::commands::ScanCommandOptions {
                    json: common.json,
                    fail_on_smells: common.fail_on_smells,
                },
                writer,
            )
        }
        Commands::Fix {
            common,
            apply,
            patch_out,
        } => {
            let Some(prepared) = prepare(&common, cli_var.verbose)? else {
                return Ok(1);
            };
            let run: AnalysisRun = analyze_files(&prepared.files, &prepared.scan, !common.json);
            crate::commands::run_fix(
                &run,
                &crate::commands::FixOptions {
                    apply,
                    patch_out: patch_out.or(prepared.patch_out),
                    json: common.json,
                    fail_on_smells: common.fail_on_smells,
                },
                writer,
            )
        }
    }
}

/// Installs the stderr `tracing` subscriber once per process.
///
/// `SMELLFIX_LOG` takes precedence; otherwise `--verbose` selects `debug` and
/// the default is `warn`.
fn init_tracing(verbose: bool) {
    use tracing_subscriber::EnvFilter;

    let default_level = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_env(LOG_ENV_VAR)
        .unwrap_or_else(|_| EnvFilter::new(default_level));

    // A second call (tests running several commands) keeps the first subscriber.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}

/// Inputs of one analysis run after merging CLI flags over configuration.
struct Prepared {
    files: Vec<PathBuf>,
    scan: ScanOptions,
    patch_out: Option<PathBuf>,
}

/// Validates paths, loads configuration and discovers files.
///
/// Returns `Ok(None)` when a path does not exist (already reported).
fn prepare(common: &AnalysisArgs, verbose: bool) -> Result<Option<Prepared>> {
    let roots = if common.paths.is_empty() {
        vec![PathBuf::from(".")]
    } else {
        common.paths.clone()
    };
    for path in &roots {
        if !path.exists() {
            eprintln!(
                "Error: The file or directory '{}' does not exist.",
                path.display()
            );
            return Ok(None);
        }
    }

    // Load config from the first path
    let config = Config::load_from_path(roots.first().map_or(Path::new("."), PathBuf::as_path));
    if let Some(path) = &config.config_file_path {
        tracing::debug!(path = %path.display(), "loaded configuration");
    }
    let section = &config.smellfix;

    let mut scan = section.scan_options();
    if let Some(threshold) = common.threshold {
        scan = scan.with_threshold(threshold);
    }
    if !common.rules.is_empty() {
        scan = scan.with_rules(&common.rules);
    }

    let include = common.include.as_deref().or(section.include.as_deref());
    let exclude = common.exclude.as_deref().or(section.exclude.as_deref());
    let filter = FileFilter::new(include, exclude).context("invalid --include/--exclude glob")?;

    let mut exclude_folders = section.exclude_folders.clone().unwrap_or_default();
    exclude_folders.extend(common.exclude_folders.iter().cloned());

    if verbose && !common.json {
        eprintln!("[VERBOSE] smellfix v{}", env!("CARGO_PKG_VERSION"));
        eprintln!("[VERBOSE] Using {} threads", rayon::current_num_threads());
        eprintln!(
            "[VERBOSE] Threshold: {}, rules: {:?}",
            scan.long_method_threshold, scan.rules
        );
        crate::output::print_exclusion_list(&mut std::io::stderr(), &exclude_folders)?;
    }

    let files = find_python_files(&roots, &exclude_folders, &filter);
    Ok(Some(Prepared {
        files,
        scan,
        patch_out: section.patch_out.clone(),
    }))
}
