//! Command implementations for the XDI processor CLI
//!
//! This module contains the command execution logic and report output for
//! the `inspect`, `validate` and `rewrite` subcommands.

use crate::cli::args::{Args, Commands, InspectArgs, OutputFormat, RewriteArgs, ValidateArgs};
use crate::config::XdiConfig;
use crate::error::{Advisory, XdiError};
use crate::models::Document;
use crate::parser::XdiReader;
use crate::validator::{
    MetadataCheck, RecommendedFlags, RequiredFlags, recommended_metadata, required_metadata,
    validate_document, validate_item,
};
use crate::writer::{format_significant, write_document};
use anyhow::{Context, Result, bail};
use colored::*;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};
use walkdir::WalkDir;

/// Digits used for data previews in reports
const PREVIEW_DIGITS: usize = 8;

/// Main command runner for the `xdi` binary
pub fn run(args: Args) -> Result<()> {
    setup_logging(&args)?;
    debug!("Command line arguments: {:?}", args);

    let config = args.to_config();
    debug!("Configuration: {:?}", config);

    match &args.command {
        Commands::Inspect(inspect) => run_inspect(inspect, &config),
        Commands::Validate(validate) => run_validate(validate, &config),
        Commands::Rewrite(rewrite) => run_rewrite(rewrite, &config),
    }
}

/// Set up structured logging based on CLI arguments
fn setup_logging(args: &Args) -> Result<()> {
    use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

    let log_level = args.get_log_level();

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("xdi_processor={}", log_level)));

    if args.quiet {
        tracing_subscriber::registry()
            .with(filter)
            .with(
                fmt::layer()
                    .with_target(false)
                    .with_level(true)
                    .with_writer(std::io::stderr)
                    .compact(),
            )
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(
                fmt::layer()
                    .with_target(false)
                    .with_level(true)
                    .with_timer(fmt::time::uptime())
                    .with_writer(std::io::stderr),
            )
            .init();
    }

    debug!("Logging initialized at level: {}", log_level);
    Ok(())
}

// =============================================================================
// inspect
// =============================================================================

fn run_inspect(args: &InspectArgs, config: &XdiConfig) -> Result<()> {
    let reader = XdiReader::new(config.reader.clone());
    let doc = reader
        .read(&args.file)
        .with_context(|| format!("Failed to read {}", args.file.display()))?;

    match args.format {
        OutputFormat::Human => print_inspect_human(&doc, args.rows),
        OutputFormat::Json => print_inspect_json(&doc, args.rows)?,
    }
    Ok(())
}

fn print_inspect_human(doc: &Document, rows: usize) {
    println!("{} {}", "XDI file:".bright_green().bold(), doc.filename.bright_cyan());
    println!(
        "   • XDI version: {}{}",
        doc.xdi_version,
        doc.extra_version
            .as_deref()
            .map(|extra| format!(" (extensions: {extra})"))
            .unwrap_or_default()
    );
    println!("   • Library version: {}", doc.library_version);
    println!(
        "   • Element: {}   Edge: {}   d-spacing: {}",
        doc.element.as_deref().unwrap_or("-"),
        doc.edge.as_deref().unwrap_or("-"),
        doc.dspacing
            .map(|d| format_significant(d, PREVIEW_DIGITS))
            .unwrap_or_else(|| "-".to_string())
    );
    println!(
        "   • Arrays: {}   Points: {}   Outer segments: {}",
        doc.narrays(),
        doc.npts,
        doc.nouter()
    );

    if !doc.comments.is_empty() {
        println!("\n{}", "Comments:".bright_green().bold());
        for line in doc.comments.lines() {
            println!("   {}", line);
        }
    }

    println!("\n{}", "Metadata:".bright_green().bold());
    for entry in &doc.metadata {
        let line = format!("   {}.{}: {}", entry.family, entry.key, entry.value);
        match validate_item(doc, &entry.family, &entry.key, &entry.value) {
            Ok(()) => println!("{}", line),
            Err(advisory) => println!("{}  {}", line, format!("<- {}", advisory).yellow()),
        }
    }

    print_check_human("Required metadata", &required_metadata(doc), RequiredFlags::bits);
    print_check_human(
        "Recommended metadata",
        &recommended_metadata(doc),
        RecommendedFlags::bits,
    );

    println!("\n{}", "Arrays:".bright_green().bold());
    for column in &doc.columns {
        let preview: Vec<String> = column
            .values
            .iter()
            .take(rows)
            .map(|v| format_significant(*v, PREVIEW_DIGITS))
            .collect();
        let unit = column
            .unit
            .as_deref()
            .map(|u| format!(" ({u})"))
            .unwrap_or_default();
        println!(
            "   • {}{}: {}{}",
            column.label.bright_cyan(),
            unit,
            preview.join(", "),
            if column.values.len() > rows { ", ..." } else { "" }
        );
    }

    if doc.outer.is_2d() {
        println!(
            "\n{} {}",
            "Outer scan:".bright_green().bold(),
            doc.outer.label.as_deref().unwrap_or("(unnamed)")
        );
        for (breakpoint, segment) in doc.outer.breakpoints.iter().zip(doc.outer_segments()) {
            println!(
                "   • {} -> rows {}..{}",
                format_significant(breakpoint.value, PREVIEW_DIGITS),
                segment.start,
                segment.end
            );
        }
    }

    print_advisories_human(&doc.advisories);
    println!();
}

fn print_check_human<F>(title: &str, check: &MetadataCheck<F>, bits: impl Fn(&F) -> u8) {
    if check.is_ok() {
        println!("\n{} {}", format!("{title}:").bright_green().bold(), "OK".green());
        return;
    }
    println!(
        "\n{} {}",
        format!("{title}:").bright_green().bold(),
        format!("flags {}", bits(&check.flags)).yellow()
    );
    for message in &check.messages {
        println!("   • {}", message);
    }
}

fn print_advisories_human(advisories: &[Advisory]) {
    if advisories.is_empty() {
        return;
    }
    println!("\n{}", "Advisories:".yellow().bold());
    for advisory in advisories {
        match advisory.line_number {
            Some(line) => println!("   ⚠ line {}: {}", line, advisory),
            None => println!("   ⚠ {}", advisory),
        }
    }
}

fn print_inspect_json(doc: &Document, rows: usize) -> Result<()> {
    let required = required_metadata(doc);
    let recommended = recommended_metadata(doc);

    let report = serde_json::json!({
        "filename": doc.filename,
        "xdi_version": doc.xdi_version,
        "extra_version": doc.extra_version,
        "library_version": doc.library_version,
        "element": doc.element,
        "edge": doc.edge,
        "dspacing": doc.dspacing,
        "comments": doc.comments,
        "narrays": doc.narrays(),
        "npts": doc.npts,
        "nouter": doc.nouter(),
        "metadata": doc.metadata.iter().map(|entry| {
            serde_json::json!({
                "family": entry.family,
                "key": entry.key,
                "value": entry.value,
                "advisory": validate_item(doc, &entry.family, &entry.key, &entry.value).err(),
            })
        }).collect::<Vec<_>>(),
        "required": {
            "flags": required.flags.bits(),
            "messages": required.messages,
        },
        "recommended": {
            "flags": recommended.flags.bits(),
            "messages": recommended.messages,
        },
        "arrays": doc.columns.iter().map(|column| {
            serde_json::json!({
                "label": column.label,
                "unit": column.unit,
                "address": column.address,
                "preview": column.values.iter().take(rows).collect::<Vec<_>>(),
            })
        }).collect::<Vec<_>>(),
        "outer": doc.outer,
        "advisories": doc.advisories,
        "advisory_code": doc.advisory_code(),
    });

    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

// =============================================================================
// validate
// =============================================================================

/// Outcome of validating one file
#[derive(Debug)]
struct FileReport {
    path: PathBuf,
    fatal: Option<XdiError>,
    /// Advisories raised while reading
    read_advisories: Vec<Advisory>,
    /// Advisories from per-item metadata rules
    metadata_advisories: Vec<Advisory>,
    required: Option<MetadataCheck<RequiredFlags>>,
}

impl FileReport {
    fn failed(&self, strict: bool) -> bool {
        self.fatal.is_some() || (strict && self.required.as_ref().is_some_and(|r| !r.is_ok()))
    }
}

fn run_validate(args: &ValidateArgs, config: &XdiConfig) -> Result<()> {
    let files = collect_xdi_files(&args.paths)?;
    if files.is_empty() {
        bail!("No XDI files found in the given paths");
    }
    info!("Validating {} files", files.len());

    let reader = XdiReader::new(config.reader.clone());
    let reports: Vec<FileReport> = files
        .into_iter()
        .map(|path| validate_file(&reader, path))
        .collect();

    match args.format {
        OutputFormat::Human => print_validate_human(&reports, args.strict),
        OutputFormat::Json => print_validate_json(&reports, args.strict)?,
    }

    let failed = reports.iter().filter(|r| r.failed(args.strict)).count();
    if failed > 0 {
        bail!("{} of {} files failed validation", failed, reports.len());
    }
    Ok(())
}

fn validate_file(reader: &XdiReader, path: PathBuf) -> FileReport {
    match reader.read(&path) {
        Ok(doc) => FileReport {
            metadata_advisories: validate_document(&doc),
            required: Some(required_metadata(&doc)),
            read_advisories: doc.advisories,
            fatal: None,
            path,
        },
        Err(error) => {
            warn!("{}: {}", path.display(), error);
            FileReport {
                path,
                fatal: Some(error),
                read_advisories: Vec::new(),
                metadata_advisories: Vec::new(),
                required: None,
            }
        }
    }
}

/// Expand directories into the `*.xdi` files below them, sorted
fn collect_xdi_files(paths: &[PathBuf]) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();

    for path in paths {
        if path.is_dir() {
            for entry in WalkDir::new(path) {
                let entry = entry.context("Failed to walk directory")?;
                if entry.file_type().is_file() && is_xdi_file(entry.path()) {
                    files.push(entry.into_path());
                }
            }
        } else {
            files.push(path.clone());
        }
    }

    files.sort();
    files.dedup();
    debug!("Found {} XDI files", files.len());
    Ok(files)
}

fn is_xdi_file(path: &Path) -> bool {
    path.extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("xdi"))
}

fn print_validate_human(reports: &[FileReport], strict: bool) {
    for report in reports {
        let name = report.path.display().to_string();
        if let Some(error) = &report.fatal {
            println!("{} {}", "✗".red().bold(), name.bright_cyan());
            let line = error
                .line_number()
                .map(|n| format!(" (line {n})"))
                .unwrap_or_default();
            println!("   {} [{}]{}: {}", "error".red(), error.code(), line, error);
            if let Some(text) = error.line_text().filter(|t| !t.is_empty()) {
                println!("   {}", format!("> {text}").bright_black());
            }
            continue;
        }

        let mark = if report.failed(strict) {
            "✗".red().bold()
        } else {
            "✓".green().bold()
        };
        println!("{} {}", mark, name.bright_cyan());
        for advisory in report.read_advisories.iter().chain(&report.metadata_advisories) {
            println!("   {} {}", "warning:".yellow(), advisory);
        }
        if let Some(required) = report.required.as_ref().filter(|r| !r.is_ok()) {
            for message in &required.messages {
                println!("   {} {}", "required:".yellow(), message);
            }
        }
    }

    let failed = reports.iter().filter(|r| r.failed(strict)).count();
    println!();
    println!(
        "{} files checked, {} passed, {} failed",
        reports.len(),
        (reports.len() - failed).to_string().green(),
        if failed > 0 {
            failed.to_string().red()
        } else {
            failed.to_string().normal()
        }
    );
}

fn print_validate_json(reports: &[FileReport], strict: bool) -> Result<()> {
    let files: Vec<serde_json::Value> = reports
        .iter()
        .map(|report| {
            serde_json::json!({
                "path": report.path.display().to_string(),
                "passed": !report.failed(strict),
                "fatal": report.fatal.as_ref().map(|error| serde_json::json!({
                    "code": error.code(),
                    "message": error.to_string(),
                    "line_number": error.line_number(),
                    "line": error.line_text(),
                })),
                "advisories": report.read_advisories,
                "metadata_advisories": report.metadata_advisories,
                "required": report.required.as_ref().map(|r| serde_json::json!({
                    "flags": r.flags.bits(),
                    "messages": r.messages,
                })),
            })
        })
        .collect();

    let failed = reports.iter().filter(|r| r.failed(strict)).count();
    let summary = serde_json::json!({
        "files_checked": reports.len(),
        "files_failed": failed,
        "strict": strict,
        "files": files,
    });

    println!("{}", serde_json::to_string_pretty(&summary)?);
    Ok(())
}

// =============================================================================
// rewrite
// =============================================================================

fn run_rewrite(args: &RewriteArgs, config: &XdiConfig) -> Result<()> {
    let reader = XdiReader::new(config.reader.clone());
    let doc = reader
        .read(&args.input)
        .with_context(|| format!("Failed to read {}", args.input.display()))?;

    for advisory in &doc.advisories {
        warn!("{}: {}", args.input.display(), advisory);
    }

    write_document(&doc, &args.output, &config.writer)
        .with_context(|| format!("Failed to write {}", args.output.display()))?;

    println!(
        "{} {} -> {} ({} arrays, {} points)",
        "Rewrote".green().bold(),
        args.input.display(),
        args.output.display().to_string().bright_cyan(),
        doc.narrays(),
        doc.npts
    );
    Ok(())
}
