use std::io::Write;
use std::path::PathBuf;
use std::process::ExitCode;
use std::str::FromStr;

use anyhow::{Context, Result, anyhow};
use clap::{Args, Parser, Subcommand, ValueEnum};
use gatepass_to_csv::{
    ExtractOptions, ExtractionReport, HeaderMatch, PageSelection, extract_rows_from_bytes,
    rows_to_json_string, write_csv_to_string,
};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(
    name = "gatepass2csv",
    version,
    about = "Extract crop, bag and quantity rows from gatepass PDFs"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Extract gatepass rows and write them as CSV or JSON.
    Extract(ExtractArgs),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Csv,
    Json,
}

#[derive(Debug, Args)]
struct ExtractArgs {
    /// Input PDF path.
    #[arg(short, long)]
    input: PathBuf,

    /// Output path; stdout when omitted.
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Page selection like 1-3,5.
    #[arg(long)]
    pages: Option<String>,

    /// Output format.
    #[arg(long, value_enum, default_value_t = OutputFormat::Csv)]
    format: OutputFormat,

    /// CSV delimiter character.
    #[arg(long, default_value = ",")]
    delimiter: char,

    /// Only accept tables whose headers carry the exact gatepass column titles.
    #[arg(long)]
    strict_headers: bool,

    /// Label that introduces the customer name.
    #[arg(long, default_value = "To:")]
    customer_label: String,

    /// Accept the customer label anywhere in a line.
    #[arg(long)]
    label_anywhere: bool,

    /// Do not read the customer from the line after an empty label.
    #[arg(long)]
    no_next_line_customer: bool,

    /// Customer name to look for when no label is present. Repeatable.
    #[arg(long = "known-customer")]
    known_customers: Vec<String>,

    /// Customer value used when none is found.
    #[arg(long, default_value = "Unknown")]
    placeholder: String,

    /// Do not parse rows from plain page text when no table matches.
    #[arg(long)]
    no_text_fallback: bool,

    /// Enable verbose warning output.
    #[arg(short, long)]
    verbose: bool,
}

fn parse_options(args: &ExtractArgs) -> Result<ExtractOptions> {
    let pages = args
        .pages
        .as_deref()
        .map(PageSelection::from_str)
        .transpose()
        .map_err(|error| anyhow!("invalid page selection: {error}"))
        .context("failed to parse --pages")?;

    if !args.delimiter.is_ascii() {
        anyhow::bail!("delimiter must be a single ASCII character");
    }

    let header_match = if args.strict_headers {
        HeaderMatch::Exact
    } else {
        HeaderMatch::Keyword
    };

    Ok(ExtractOptions {
        pages,
        header_match,
        customer_label: args.customer_label.clone(),
        customer_label_anywhere: args.label_anywhere,
        customer_next_line: !args.no_next_line_customer,
        known_customers: args.known_customers.clone(),
        customer_placeholder: args.placeholder.clone(),
        text_fallback: !args.no_text_fallback,
        delimiter: args.delimiter as u8,
    })
}

fn log_report(report: &ExtractionReport, verbose: bool) {
    if report.warnings.is_empty() {
        return;
    }

    eprintln!("warning: {} issue(s) detected", report.warnings.len());
    if verbose {
        for warning in &report.warnings {
            eprintln!(
                "  - {:?} page={:?}: {}",
                warning.code, warning.page, warning.message
            );
        }
    }
}

fn run_extract(args: &ExtractArgs) -> Result<ExtractionReport> {
    let options = parse_options(args)?;
    let bytes = std::fs::read(&args.input)
        .with_context(|| format!("failed to read '{}'", args.input.display()))?;
    let extraction = extract_rows_from_bytes(&bytes, &options)
        .with_context(|| format!("failed to extract gatepass from '{}'", args.input.display()))?;

    let rendered = match args.format {
        OutputFormat::Csv => write_csv_to_string(&extraction.table, options.delimiter)?,
        OutputFormat::Json => rows_to_json_string(&extraction.table)?,
    };

    match &args.output {
        Some(path) => std::fs::write(path, rendered)
            .with_context(|| format!("failed to write '{}'", path.display()))?,
        None => std::io::stdout()
            .lock()
            .write_all(rendered.as_bytes())
            .context("failed to write to stdout")?,
    }

    Ok(extraction.report)
}

fn main() -> ExitCode {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("gatepass_to_csv=warn"));
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .without_time()
        .init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Extract(args) => match run_extract(&args) {
            Ok(report) => {
                log_report(&report, args.verbose);
                if report.row_count > 0 {
                    ExitCode::SUCCESS
                } else {
                    eprintln!("no gatepass rows found in '{}'", args.input.display());
                    ExitCode::from(2)
                }
            }
            Err(error) => {
                eprintln!("error: {error:#}");
                ExitCode::from(1)
            }
        },
    }
}
