//! onenote-md - Convert OneNote section dumps to Markdown

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use log::LevelFilter;

use onenote_md::{
    BatchReport, ExportConfig, JsonGraphParser, Layout, Outcome, Pipeline, PipelineConfig,
    discover_sections,
};

#[derive(Parser)]
#[command(name = "onenote-md")]
#[command(version, about = "Convert OneNote sections to Markdown", long_about = None)]
#[command(after_help = "EXAMPLES:
    onenote-md -i backup -o notes          Nested notebook/section/page tree
    onenote-md -i backup -o notes --flat   All pages in one directory
    onenote-md -i backup -o notes --json   Print a JSON report

EXIT STATUS:
    0  all sections converted
    1  bad arguments, missing input or no section files
    2  every section failed
    3  some sections failed")]
struct Cli {
    /// Directory searched recursively for section files
    #[arg(short, long, value_name = "DIR")]
    input: PathBuf,

    /// Directory that receives the Markdown tree
    #[arg(short, long, value_name = "DIR", default_value = "output")]
    output: PathBuf,

    /// Log each file written
    #[arg(short, long)]
    verbose: bool,

    /// Log extraction details
    #[arg(long)]
    debug: bool,

    /// Write every page directly into the output directory
    #[arg(long)]
    flat: bool,

    /// Extension of the section files to read
    #[arg(long, value_name = "EXT", default_value = "one.json")]
    extension: String,

    /// Print the batch report as JSON on stdout
    #[arg(long)]
    json: bool,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(&cli);

    match run(&cli) {
        Ok(report) => {
            if cli.json {
                if let Err(e) = print_json(&report) {
                    eprintln!("error: {e}");
                    return ExitCode::FAILURE;
                }
            } else {
                print_summary(&report);
            }
            exit_code(report.outcome())
        }
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn init_logging(cli: &Cli) {
    let level = if cli.debug {
        LevelFilter::Debug
    } else if cli.verbose {
        LevelFilter::Info
    } else {
        LevelFilter::Warn
    };

    env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .format_timestamp(None)
        .init();
}

fn run(cli: &Cli) -> onenote_md::Result<BatchReport> {
    let files = discover_sections(&cli.input, &cli.extension)?;
    if files.is_empty() {
        return Err(onenote_md::Error::NoInput);
    }

    let layout = if cli.flat { Layout::Flat } else { Layout::Nested };
    let config = PipelineConfig::default()
        .with_export(ExportConfig::new(&cli.output).with_layout(layout));

    Pipeline::new(JsonGraphParser::new(), config).run(&files)
}

fn print_json(report: &BatchReport) -> onenote_md::Result<()> {
    println!("{}", serde_json::to_string_pretty(report)?);
    Ok(())
}

fn print_summary(report: &BatchReport) {
    for failure in &report.failures {
        eprintln!("failed: {failure}");
    }
    println!(
        "{} section(s), {} page(s) written to disk",
        report.sections.len(),
        report.pages_written()
    );
    if report.superseded > 0 {
        println!("{} older section version(s) skipped", report.superseded);
    }
    if report.warning_count() > 0 {
        println!("{} warning(s); rerun with -v for details", report.warning_count());
    }
}

fn exit_code(outcome: Outcome) -> ExitCode {
    match outcome {
        Outcome::Success => ExitCode::SUCCESS,
        Outcome::TotalFailure => ExitCode::from(2),
        Outcome::PartialFailure => ExitCode::from(3),
    }
}
