//! CLI argument parsing for stackprobe

use clap::{Parser, ValueEnum};

/// Output format for probe results
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// One `0x<hex>` line per sample (default)
    Text,
    /// JSON format for machine parsing
    Json,
}

#[derive(Parser, Debug)]
#[command(name = "stackprobe")]
#[command(version)]
#[command(about = "Print the current stack pointer register", long_about = None)]
pub struct Cli {
    /// Output format (text or json)
    #[arg(long = "format", value_enum, default_value = "text")]
    pub format: OutputFormat,

    /// Number of stack pointer samples to take, each from a fresh call frame
    #[arg(short = 'n', long = "samples", value_name = "N", default_value = "1")]
    pub samples: usize,

    /// Fail unless every sample lies inside the thread's stack region
    #[arg(long = "check")]
    pub check: bool,

    /// Enable debug diagnostics on stderr
    #[arg(long = "debug")]
    pub debug: bool,
}
