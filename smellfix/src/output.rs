use crate::diagnostic::{Diagnostic, SmellKind};
use crate::pipeline::{FileReport, Patch};
use crate::utils::normalize_display_path;
use colored::Colorize;
use comfy_table::presets::UTF8_FULL;
use comfy_table::{Attribute, Cell, Color, ContentArrangement, Table};
use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};
use std::io::Write;
use std::time::Duration;

/// Print the exclusion list in styled format.
///
/// # Errors
///
/// Returns an error if writing to the output fails.
pub fn print_exclusion_list(writer: &mut impl Write, folders: &[String]) -> std::io::Result<()> {
    if folders.is_empty() {
        let defaults = crate::constants::get_default_exclude_folders();
        let mut sorted_defaults: Vec<&str> = defaults.iter().copied().collect();
        sorted_defaults.sort_unstable();
        let list = sorted_defaults.join(", ");
        writeln!(
            writer,
            "{} {}",
            "[OK] Using default exclusions only:".green(),
            list.dimmed()
        )?;
    } else {
        writeln!(writer, "{} {}", "Excluding:".yellow().bold(), folders.join(", "))?;
    }
    Ok(())
}

/// Create a progress bar with file count.
///
/// In test mode, or when `visible` is false, returns a hidden progress bar to
/// avoid polluting the output.
#[must_use]
pub fn create_progress_bar(total_files: u64, visible: bool) -> ProgressBar {
    if cfg!(test) || !visible {
        return ProgressBar::hidden();
    }

    let pb =
        ProgressBar::with_draw_target(Some(total_files), ProgressDrawTarget::stderr_with_hz(20));
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.cyan} [{bar:40.cyan/blue}] {pos}/{len} files ({percent}%) {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("█▓░"),
    );
    pb.set_message("scanning...");
    pb.enable_steady_tick(Duration::from_millis(100));
    pb
}

/// Print the main header with box-drawing characters.
///
/// # Errors
///
/// Returns an error if writing to the output fails.
pub fn print_header(writer: &mut impl Write, title: &str) -> std::io::Result<()> {
    writeln!(writer)?;
    writeln!(
        writer,
        "{}",
        "╔════════════════════════════════════════╗".cyan()
    )?;
    writeln!(writer, "{}", format!("║  {title:<38}║").cyan().bold())?;
    writeln!(
        writer,
        "{}",
        "╚════════════════════════════════════════╝".cyan()
    )?;
    writeln!(writer)?;
    Ok(())
}

/// Helper to create a styled table
fn create_table(headers: Vec<&str>) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(headers);
    table
}

/// Helper to map a smell kind to a Comfy Table Color
fn get_kind_color(kind: SmellKind) -> Color {
    match kind {
        SmellKind::SyntaxError => Color::Red,
        SmellKind::MutableDefault => Color::Yellow,
        SmellKind::LongMethod => Color::Blue,
    }
}

/// Print every diagnostic of `reports` as one table.
///
/// # Errors
///
/// Returns an error if writing to the output fails.
pub fn print_diagnostics(writer: &mut impl Write, reports: &[FileReport]) -> std::io::Result<()> {
    let diagnostics: Vec<&Diagnostic> = reports.iter().flat_map(|r| &r.diagnostics).collect();
    if diagnostics.is_empty() {
        writeln!(writer, "{}", "[OK] No smells found.".green())?;
        return Ok(());
    }

    writeln!(writer, "{}", "Smells".bold().underline())?;

    let mut table = create_table(vec!["Kind", "Location", "Note"]);
    for diag in diagnostics {
        table.add_row(vec![
            Cell::new(diag.kind.as_str()).fg(get_kind_color(diag.kind)),
            Cell::new(diag.location.to_string()).add_attribute(Attribute::Bold),
            Cell::new(&diag.note),
        ]);
    }

    writeln!(writer, "{table}")?;
    Ok(())
}

/// Print files that could not be read.
///
/// # Errors
///
/// Returns an error if writing to the output fails.
pub fn print_read_errors(
    writer: &mut impl Write,
    errors: &[crate::commands::ReadFailure],
) -> std::io::Result<()> {
    if errors.is_empty() {
        return Ok(());
    }

    writeln!(writer, "\n{}", "Unreadable Files".bold().underline().red())?;

    let mut table = create_table(vec!["File", "Error"]);
    for e in errors {
        table.add_row(vec![
            Cell::new(normalize_display_path(&e.path)).add_attribute(Attribute::Bold),
            Cell::new(&e.error).fg(Color::Red),
        ]);
    }

    writeln!(writer, "{table}")?;
    Ok(())
}

/// Print a patch with `+`/`-` lines colored.
///
/// # Errors
///
/// Returns an error if writing to the output fails.
pub fn print_patch(writer: &mut impl Write, patch: &Patch) -> std::io::Result<()> {
    for line in patch.diff.lines() {
        if line.starts_with("---") || line.starts_with("+++") {
            writeln!(writer, "{}", line.bold())?;
        } else if line.starts_with("@@") {
            writeln!(writer, "{}", line.cyan())?;
        } else if line.starts_with('+') {
            writeln!(writer, "{}", line.green())?;
        } else if line.starts_with('-') {
            writeln!(writer, "{}", line.red())?;
        } else {
            writeln!(writer, "{line}")?;
        }
    }
    Ok(())
}

/// Print fixes that were planned but could not be synthesized.
///
/// # Errors
///
/// Returns an error if writing to the output fails.
pub fn print_synthesis_errors(writer: &mut impl Write, reports: &[FileReport]) -> std::io::Result<()> {
    for report in reports {
        if let Some(error) = &report.synthesis_error {
            writeln!(writer, "  {} {error}", "Fix failed:".red().bold())?;
        }
    }
    Ok(())
}

/// Print the one-line summary with colored counts.
///
/// # Errors
///
/// Returns an error if writing to the output fails.
pub fn print_summary(
    writer: &mut impl Write,
    files: usize,
    reports: &[FileReport],
) -> std::io::Result<()> {
    fn pill(label: &str, count: usize) -> String {
        if count == 0 {
            format!("{}: {}", label, count.to_string().green())
        } else {
            format!("{}: {}", label, count.to_string().red().bold())
        }
    }

    let count = |kind: SmellKind| {
        reports
            .iter()
            .flat_map(|r| &r.diagnostics)
            .filter(|d| d.kind == kind)
            .count()
    };

    writeln!(
        writer,
        "\n{}  {}  {}  {}",
        format!("Files: {files}").bold(),
        pill("Mutable defaults", count(SmellKind::MutableDefault)),
        pill("Long methods", count(SmellKind::LongMethod)),
        pill("Syntax errors", count(SmellKind::SyntaxError)),
    )?;
    Ok(())
}
