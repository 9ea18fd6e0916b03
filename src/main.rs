use anyhow::{Context, Result};
use clap::Parser;
use stackprobe::cli::{Cli, OutputFormat};
use stackprobe::report::ProbeReport;
use std::io::Write;
use tracing_subscriber::EnvFilter;

/// Initialize tracing subscriber for debug output
fn init_tracing(debug: bool) {
    if debug {
        tracing_subscriber::fmt()
            .with_env_filter(
                EnvFilter::from_default_env().add_directive(tracing::Level::TRACE.into()),
            )
            .with_writer(std::io::stderr)
            .init();
    }
}

/// Print the report, then fail if a requested region check did not hold
fn emit(report: &ProbeReport, format: OutputFormat, check: bool) -> Result<()> {
    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    match format {
        OutputFormat::Text => report
            .write_text(&mut out)
            .context("Failed to write stack pointer")?,
        OutputFormat::Json => report
            .write_json(&mut out)
            .context("Failed to write JSON report")?,
    }
    out.flush().context("Failed to flush stdout")?;

    if check {
        report.verify().context("Stack pointer check failed")?;
    }
    Ok(())
}

fn main() -> Result<()> {
    let args = Cli::parse();

    if args.samples == 0 {
        anyhow::bail!("Invalid value for --samples: 0 (must be >= 1)");
    }

    init_tracing(args.debug);

    let report = ProbeReport::collect(args.samples, args.check)
        .context("Failed to resolve thread stack region")?;

    emit(&report, args.format, args.check)
}
