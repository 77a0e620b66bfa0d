//! Command-line argument definitions for the `ipums-ddi` binary

use crate::config::{DataFormat, ReaderConfig};
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Inspect IPUMS DDI codebooks and read the microdata they describe
#[derive(Debug, Clone, Parser)]
#[command(
    name = "ipums-ddi",
    version,
    about = "Inspect IPUMS DDI codebooks and read the microdata they describe",
    long_about = "Extracts file and variable metadata from IPUMS DDI 2.5 codebooks and uses \
                  the column layout they declare to read fixed-width or comma-separated \
                  extract files, optionally gzip-compressed."
)]
pub struct Args {
    #[command(subcommand)]
    pub command: Commands,

    /// Logging verbosity level
    #[arg(
        short = 'v',
        long = "verbose",
        global = true,
        action = clap::ArgAction::Count,
        help = "Increase logging verbosity (-v: info, -vv: debug, -vvv: trace)"
    )]
    pub verbose: u8,

    /// Only show errors. Overrides verbose settings.
    #[arg(short = 'q', long = "quiet", global = true, conflicts_with = "verbose")]
    pub quiet: bool,
}

#[derive(Debug, Clone, Subcommand)]
pub enum Commands {
    /// Show the metadata extracted from a codebook
    Inspect(InspectArgs),
    /// Read a data file using the layout from its codebook
    Read(ReadArgs),
    /// List codebooks and their data files in a directory
    Discover(DiscoverArgs),
}

#[derive(Debug, Clone, Parser)]
pub struct InspectArgs {
    /// Path to the DDI codebook (.xml)
    #[arg(value_name = "CODEBOOK")]
    pub codebook: PathBuf,

    /// Show a single variable in detail
    #[arg(long, value_name = "NAME")]
    pub variable: Option<String>,

    /// Print JSON instead of a human-readable summary
    #[arg(long)]
    pub json: bool,
}

#[derive(Debug, Clone, Parser)]
pub struct ReadArgs {
    /// Path to the DDI codebook (.xml)
    #[arg(value_name = "CODEBOOK")]
    pub codebook: PathBuf,

    /// Path to the data file (.dat, .csv, optionally .gz)
    #[arg(value_name = "DATA")]
    pub data: PathBuf,

    /// Maximum number of rows to read
    #[arg(short = 'n', long = "n-max", value_name = "N")]
    pub n_max: Option<usize>,

    /// Comma-separated variables to read
    #[arg(long, value_name = "LIST", value_delimiter = ',')]
    pub columns: Vec<String>,

    /// Comma-separated variables to add category label columns for
    #[arg(long, value_name = "LIST", value_delimiter = ',')]
    pub labels: Vec<String>,

    /// Turn values that do not match their column type into nulls
    #[arg(long = "ignore-errors")]
    pub ignore_errors: bool,

    /// Data file layout; detected from the file name when omitted
    #[arg(long, value_enum)]
    pub format: Option<FormatArg>,
}

#[derive(Debug, Clone, Parser)]
pub struct DiscoverArgs {
    /// Directory to search; defaults to the download directory
    #[arg(value_name = "DIR")]
    pub dir: Option<PathBuf>,

    /// Search subdirectories too
    #[arg(short, long)]
    pub recursive: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum FormatArg {
    FixedWidth,
    Delimited,
}

impl From<FormatArg> for DataFormat {
    fn from(format: FormatArg) -> Self {
        match format {
            FormatArg::FixedWidth => DataFormat::FixedWidth,
            FormatArg::Delimited => DataFormat::Delimited,
        }
    }
}

impl Args {
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

    /// Check if we should show progress spinners (not in quiet mode)
    pub fn show_progress(&self) -> bool {
        !self.quiet
    }
}

impl ReadArgs {
    pub fn to_reader_config(&self) -> ReaderConfig {
        let mut config = ReaderConfig::default();
        if let Some(n_max) = self.n_max {
            config = config.with_n_max(n_max);
        }
        if let Some(format) = self.format {
            config = config.with_format(format.into());
        }
        if !self.columns.is_empty() {
            config = config.with_columns(self.columns.iter().cloned());
        }
        if self.ignore_errors {
            config = config.with_ignore_errors();
        }
        config
    }
}
