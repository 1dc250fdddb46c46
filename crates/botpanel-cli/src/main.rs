mod summary;

use anyhow::Context;
use botpanel_core::StatusReport;
use botpanel_parse::{dispatch_with, DispatchOptions};
use clap::{Parser, ValueEnum};
use std::io::Read;
use std::path::{Path, PathBuf};

#[derive(Parser, Debug)]
#[command(
    name = "botpanel",
    version,
    about = "Normalize a bot status report into a structured view"
)]
struct Cli {
    /// Report file to read (omit or `-` for stdin)
    input: Option<PathBuf>,
    /// Output format
    #[arg(long, value_enum, default_value_t = Format::Pretty)]
    format: Format,
    /// Classify instructions for this action instead of the reported one
    #[arg(long)]
    action: Option<String>,
    /// Read the report as free text even if it embeds a JSON payload
    #[arg(long)]
    text_only: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum Format {
    /// Compact JSON on one line
    Json,
    /// Indented JSON
    Pretty,
    /// Plain-text overview
    Summary,
}

fn log_filter() -> tracing_subscriber::EnvFilter {
    let level = std::env::var("BOTPANEL_LOG")
        .or_else(|_| std::env::var("RUST_LOG"))
        .unwrap_or_else(|_| "warn".to_string());
    tracing_subscriber::EnvFilter::try_new(level)
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn"))
}

fn read_input(input: Option<&Path>) -> anyhow::Result<String> {
    match input {
        Some(path) if path != Path::new("-") => std::fs::read_to_string(path)
            .with_context(|| format!("failed to read report from {}", path.display())),
        _ => {
            let mut buf = String::new();
            std::io::stdin()
                .read_to_string(&mut buf)
                .context("failed to read report from stdin")?;
            Ok(buf)
        }
    }
}

fn render(report: &StatusReport, format: Format) -> anyhow::Result<String> {
    match format {
        Format::Json => serde_json::to_string(report).context("failed to serialize report"),
        Format::Pretty => {
            serde_json::to_string_pretty(report).context("failed to serialize report")
        }
        Format::Summary => Ok(summary::render(report)),
    }
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(log_filter())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let raw = read_input(cli.input.as_deref())?;
    let options = DispatchOptions {
        action: cli.action,
        text_only: cli.text_only,
    };
    let report = dispatch_with(&raw, &options);
    if report.is_empty() {
        tracing::info!("nothing recognized in the input");
    }
    println!("{}", render(&report, cli.format)?);
    Ok(())
}
