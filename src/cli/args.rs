//! Command-line argument definitions for the XDI processor
//!
//! This module defines the complete CLI interface using the clap derive API.

use crate::config::{ReaderConfig, WriterConfig, XdiConfig};
use crate::constants::{
    DEFAULT_MAX_COLUMNS, DEFAULT_MAX_LINE_LENGTH, DEFAULT_MAX_LINES, DEFAULT_SIGNIFICANT_DIGITS,
};
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// CLI arguments for the XDI file processor
///
/// Reads, validates and rewrites XDI files of X-ray absorption spectroscopy
/// data.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "xdi",
    version,
    about = "Inspect, validate and rewrite XDI X-ray absorption spectroscopy files",
    long_about = "Reads XDI files (a metadata header followed by a numeric data table), \
                  reports fatal format errors and metadata advisories, checks required \
                  and recommended metadata, and rewrites files in canonical form."
)]
pub struct Args {
    #[command(subcommand)]
    pub command: Commands,

    /// Logging verbosity level
    #[arg(
        short = 'v',
        long = "verbose",
        action = clap::ArgAction::Count,
        global = true,
        help = "Increase logging verbosity (-v: info, -vv: debug, -vvv: trace)"
    )]
    pub verbose: u8,

    /// Suppress output (quiet mode)
    ///
    /// Only show errors. Overrides verbose settings.
    #[arg(
        short = 'q',
        long = "quiet",
        global = true,
        help = "Suppress log output except errors",
        conflicts_with = "verbose"
    )]
    pub quiet: bool,

    #[command(flatten)]
    pub limits: LimitArgs,
}

/// Available subcommands
#[derive(Debug, Clone, Subcommand)]
pub enum Commands {
    /// Print the contents of an XDI file with metadata reports
    Inspect(InspectArgs),
    /// Check XDI files or directories of XDI files
    Validate(ValidateArgs),
    /// Re-serialise an XDI file in canonical form
    Rewrite(RewriteArgs),
}

/// Arguments for the inspect command
#[derive(Debug, Clone, Parser)]
pub struct InspectArgs {
    /// XDI file to read
    #[arg(value_name = "FILE")]
    pub file: PathBuf,

    /// Output format
    #[arg(long = "format", value_enum, default_value = "human")]
    pub format: OutputFormat,

    /// Number of leading data rows to show for each array
    #[arg(long = "rows", value_name = "N", default_value_t = 3)]
    pub rows: usize,
}

/// Arguments for the validate command
#[derive(Debug, Clone, Parser)]
pub struct ValidateArgs {
    /// XDI files or directories to search for `*.xdi` files
    #[arg(value_name = "PATH", required = true)]
    pub paths: Vec<PathBuf>,

    /// Output format
    #[arg(long = "format", value_enum, default_value = "human")]
    pub format: OutputFormat,

    /// Treat missing or invalid required metadata as a failure
    #[arg(long = "strict")]
    pub strict: bool,
}

/// Arguments for the rewrite command
#[derive(Debug, Clone, Parser)]
pub struct RewriteArgs {
    /// XDI file to read
    #[arg(value_name = "INPUT")]
    pub input: PathBuf,

    /// Destination file; replaced if it exists
    #[arg(value_name = "OUTPUT")]
    pub output: PathBuf,

    /// Significant digits for data values
    #[arg(long = "digits", value_name = "N", default_value_t = DEFAULT_SIGNIFICANT_DIGITS)]
    pub digits: usize,

    /// Do not write `outer.value` markers inside the data table
    #[arg(long = "flatten")]
    pub flatten: bool,
}

/// Resource ceilings applied while reading
#[derive(Debug, Clone, clap::Args)]
pub struct LimitArgs {
    /// Maximum number of lines in a file
    #[arg(long = "max-lines", value_name = "N", global = true, default_value_t = DEFAULT_MAX_LINES)]
    pub max_lines: usize,

    /// Maximum length of one line, in bytes
    #[arg(
        long = "max-line-length",
        value_name = "BYTES",
        global = true,
        default_value_t = DEFAULT_MAX_LINE_LENGTH
    )]
    pub max_line_length: usize,

    /// Maximum number of data columns
    #[arg(
        long = "max-columns",
        value_name = "N",
        global = true,
        default_value_t = DEFAULT_MAX_COLUMNS
    )]
    pub max_columns: usize,
}

/// Output format options
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable output
    Human,
    /// JSON format for scripting
    Json,
}

impl Args {
    /// Determine the appropriate log level based on verbosity flags
    pub fn get_log_level(&self) -> &'static str {
        if self.quiet {
            "error"
        } else {
            match self.verbose {
                0 => "warn",
                1 => "info",
                2 => "debug",
                _ => "trace",
            }
        }
    }

    /// Build the library configuration from the command line
    pub fn to_config(&self) -> XdiConfig {
        let reader = ReaderConfig::default()
            .with_max_lines(self.limits.max_lines)
            .with_max_line_length(self.limits.max_line_length)
            .with_max_columns(self.limits.max_columns);

        let mut writer = WriterConfig::default();
        if let Commands::Rewrite(rewrite) = &self.command {
            writer = writer.with_significant_digits(rewrite.digits);
            if rewrite.flatten {
                writer = writer.without_outer_breakpoints();
            }
        }

        XdiConfig::default().with_reader(reader).with_writer(writer)
    }
}
