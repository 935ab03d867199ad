//! dbgzip - Summarize Rhino.Inside.Revit debug packages
//!
//! This tool reads the debug ZIP packages submitted with support tickets and
//! prints a sanitized markdown summary of host info, journal, console log and
//! third-party add-ons.

use anyhow::{bail, Context, Result};
use clap::{Args, Parser};
use dbgzip_core::archive::layout;
use dbgzip_core::{process_package, ConflictTable, DebugArchive, ReportConfig};
use std::fs;
use std::io::Write;
use std::path::{Component, Path, PathBuf};
use tracing::{debug, info, trace, warn, Level};
use tracing_subscriber::EnvFilter;
use walkdir::WalkDir;

/// Summarize Rhino.Inside.Revit debug packages
#[derive(Parser, Debug)]
#[command(name = "dbgzip")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    #[command(flatten)]
    input: InputMode,

    /// Support ticket URL, adds a title and ticket link to the report
    #[arg(short, long)]
    ticket: Option<String>,

    /// Write the report to this file (a directory with --directory)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Overwrite existing report files without prompting
    #[arg(long)]
    force: bool,

    /// Maximum journal lines to include after the Rhino.Inside.Revit command
    #[arg(long, default_value_t = dbgzip_core::report::MAX_JOURNAL_LINES)]
    max_journal_lines: usize,

    /// File listing known conflicting add-ons, one `name[,version]` per line
    #[arg(long)]
    conflicts: Option<PathBuf>,

    /// Extract crash dumps from the package into this directory
    #[arg(long)]
    extract_dumps: Option<PathBuf>,

    /// Verbosity level (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[derive(Args, Debug)]
#[group(required = true, multiple = false)]
struct InputMode {
    /// Path to a debug package (RhinoInside-Revit-Report-<timestamp>.zip)
    package: Option<PathBuf>,

    /// Path to a directory of debug packages to process
    #[arg(short, long)]
    directory: Option<PathBuf>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize tracing
    let level = match cli.verbose {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(level.into()))
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    let config = build_config(&cli)?;

    // Dispatch based on input mode
    if let Some(ref package) = cli.input.package {
        process_single_package(&cli, &config, package)
    } else if let Some(ref directory) = cli.input.directory {
        process_directory(&cli, &config, directory)
    } else {
        bail!("Either a package or --directory must be specified")
    }
}

/// Build the extraction config from command line options
fn build_config(cli: &Cli) -> Result<ReportConfig> {
    let mut config = ReportConfig::new().max_journal_lines(cli.max_journal_lines);

    if let Some(ref path) = cli.conflicts {
        let table = ConflictTable::load(path)
            .with_context(|| format!("Failed to load conflict list: {}", path.display()))?;
        debug!("Loaded {} conflict entries from {}", table.entries().len(), path.display());
        config = config.conflicts(table);
    }

    Ok(config)
}

/// Process a single debug package
fn process_single_package(cli: &Cli, config: &ReportConfig, package: &Path) -> Result<()> {
    if !package.exists() {
        bail!("Package does not exist: {}", package.display());
    }
    if !package.is_file() {
        bail!("Package path is not a file: {}", package.display());
    }

    let report = process_package(package, cli.ticket.as_deref(), config)
        .with_context(|| format!("Failed to process package: {}", package.display()))?;

    if let Some(ref dir) = cli.extract_dumps {
        extract_dumps(package, dir)?;
    }

    match cli.output {
        Some(ref output) => {
            write_report(output, &report, cli.force)?;
            info!("Wrote {}", output.display());
        }
        None => println!("{}", report),
    }

    Ok(())
}

/// Process every debug package in a directory recursively
fn process_directory(cli: &Cli, config: &ReportConfig, directory: &Path) -> Result<()> {
    if !directory.exists() {
        bail!("Directory does not exist: {}", directory.display());
    }
    if !directory.is_dir() {
        bail!("Path is not a directory: {}", directory.display());
    }

    info!("Scanning directory: {}", directory.display());

    let mut processed = 0;
    let mut failed = 0;

    for entry in WalkDir::new(directory)
        .follow_links(false)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|e| e.ok())
    {
        let path = entry.path();
        if !path.is_file() || !is_debug_package(path) {
            trace!("Skipping: {}", path.display());
            continue;
        }

        debug!("Processing package: {}", path.display());
        let report = match process_package(path, cli.ticket.as_deref(), config) {
            Ok(report) => report,
            Err(e) => {
                // Log error but continue with other packages
                warn!("Error processing {}: {}", path.display(), e);
                failed += 1;
                continue;
            }
        };

        if let Some(ref dir) = cli.extract_dumps {
            let stem = path.file_stem().unwrap_or_default();
            if let Err(e) = extract_dumps(path, &dir.join(stem)) {
                warn!("Error extracting dumps from {}: {:#}", path.display(), e);
            }
        }

        match cli.output {
            Some(ref output_dir) => {
                let target = report_path(output_dir, path);
                match write_report(&target, &report, cli.force) {
                    Ok(()) => println!("Wrote {}", target.display()),
                    Err(e) => warn!("Failed to write {}: {:#}", target.display(), e),
                }
            }
            None => println!("{}", report),
        }
        processed += 1;
    }

    info!("Summary: {} packages processed, {} failed", processed, failed);
    Ok(())
}

/// Returns true if the file name follows the debug package convention
fn is_debug_package(path: &Path) -> bool {
    path.extension().and_then(|e| e.to_str()) == Some("zip")
        && layout::extract_timestamp(path).is_ok()
}

/// Report file for a package inside an output directory
fn report_path(output_dir: &Path, package: &Path) -> PathBuf {
    let stem = package
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("report");
    output_dir.join(format!("{}.md", stem))
}

/// Local path for a dump entry, keeping its folders under `dir`
///
/// Only plain path components are accepted, so the result never leaves `dir`.
fn dump_destination(dir: &Path, entry: &str) -> Result<PathBuf> {
    let mut relative = PathBuf::new();
    for component in Path::new(entry).components() {
        match component {
            Component::Normal(part) => relative.push(part),
            _ => return Err(dbgzip_core::Error::path_traversal(entry).into()),
        }
    }
    if relative.as_os_str().is_empty() {
        return Err(dbgzip_core::Error::path_traversal(entry).into());
    }
    Ok(dir.join(relative))
}

/// Copy every crash dump in a package to `dir`
fn extract_dumps(package: &Path, dir: &Path) -> Result<usize> {
    let mut archive = DebugArchive::open(package)
        .with_context(|| format!("Failed to open package: {}", package.display()))?;

    let dumps = archive.crash_dumps();
    if dumps.is_empty() {
        debug!("No crash dumps in {}", package.display());
        return Ok(0);
    }

    fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create directory: {}", dir.display()))?;

    for dump in &dumps {
        let target = dump_destination(dir, dump)?;
        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
        }
        let bytes = archive
            .extract_binary(dump, &target)
            .with_context(|| format!("Failed to extract {}", dump))?;
        info!("Extracted {} ({} bytes) to {}", dump, bytes, target.display());
    }

    Ok(dumps.len())
}

/// Write a report to disk
fn write_report(output_path: &Path, content: &str, force: bool) -> Result<()> {
    // Create parent directories
    if let Some(parent) = output_path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
    }

    // Check if file exists
    if output_path.exists() && !force {
        bail!(
            "File already exists: {} (use --force to overwrite)",
            output_path.display()
        );
    }

    let mut file = fs::File::create(output_path)
        .with_context(|| format!("Failed to create file: {}", output_path.display()))?;

    file.write_all(content.as_bytes())
        .with_context(|| format!("Failed to write file: {}", output_path.display()))?;

    Ok(())
}
