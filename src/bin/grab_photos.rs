use std::process::ExitCode;

use clap::Parser;
use miette::IntoDiagnostic;
use tracing_subscriber::EnvFilter;

use photo_grab::app::{App, RunOptions};
use photo_grab::config::{ConfigLoader, ConfigOverrides};
use photo_grab::error::GrabError;
use photo_grab::fetch::HttpFetcher;
use photo_grab::output::{ConsoleOutput, JsonOutput, OutputMode};

#[derive(Parser)]
#[command(name = "grab-photos")]
#[command(about = "Download photos listed in a CSV and rename them <participant>_<yyyymmdd_HHMMSS>.jpg")]
#[command(version, author)]
struct Cli {
    #[arg(long, help = "JSON config file (default: grab-photos.json if present)")]
    config: Option<String>,

    #[arg(long, help = "CSV file listing the photos")]
    source: Option<String>,

    #[arg(long, help = "Directory that receives the photos")]
    output_dir: Option<String>,

    #[arg(long, help = "Per-request timeout in seconds")]
    timeout: Option<u64>,

    #[arg(long, help = "Bytes read per chunk while streaming")]
    chunk_size: Option<usize>,

    #[arg(long, help = "Build filenames without downloading anything")]
    dry_run: bool,

    #[arg(long, help = "Print a JSON summary instead of one line per row")]
    json: bool,
}

fn main() -> ExitCode {
    if let Err(report) = run() {
        eprintln!("{report:?}");
        if let Some(err) = report.downcast_ref::<GrabError>() {
            return ExitCode::from(map_exit_code(err));
        }
        return ExitCode::from(1);
    }
    ExitCode::SUCCESS
}

fn map_exit_code(error: &GrabError) -> u8 {
    match error {
        GrabError::DatasetRead { .. } | GrabError::DatasetParse(_) | GrabError::MissingColumn(_) => 2,
        GrabError::ConfigRead(_) | GrabError::ConfigParse(_) | GrabError::InvalidConfig(_) => 2,
        _ => 1,
    }
}

fn run() -> miette::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let output_mode = if cli.json {
        OutputMode::Json
    } else {
        OutputMode::Console
    };

    let overrides = ConfigOverrides {
        source_csv: cli.source,
        output_dir: cli.output_dir,
        chunk_size: cli.chunk_size,
        timeout_secs: cli.timeout,
    };
    let config = ConfigLoader::resolve(cli.config.as_deref(), overrides)?;
    let fetcher = HttpFetcher::new(config.timeout, config.chunk_size)?;
    let app = App::new(config, fetcher);
    let options = RunOptions {
        dry_run: cli.dry_run,
    };

    match output_mode {
        OutputMode::Console => {
            let summary = app.run(options, &ConsoleOutput)?;
            ConsoleOutput::print_summary(&summary);
        }
        OutputMode::Json => {
            let summary = app.run(options, &JsonOutput)?;
            JsonOutput::print_summary(&summary).into_diagnostic()?;
        }
    }

    // Row failures are reported per line; the exit status stays 0.
    Ok(())
}
