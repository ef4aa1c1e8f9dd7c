mod batch;
mod cli;
mod settings;

use std::str::FromStr;

use indicatif::{ProgressBar, ProgressStyle};
use thiserror::Error;

use batch::BatchRunner;
use reverb_depth_sink::{ReportError, ResultSink, render_console_table};
use reverb_depth_source::{Backend, Configuration, SourceError};
use settings::ConfigError;

#[derive(Debug, Error)]
enum AppError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Source(#[from] SourceError),

    #[error(transparent)]
    Report(#[from] ReportError),

    #[error("failed to list inputs: {0}")]
    Inputs(std::io::Error),
}

#[tokio::main(flavor = "multi_thread")]
async fn main() -> Result<(), AppError> {
    let (args, cli_sources) = cli::parse_cli();

    if args.list_backends {
        println!("available backends:");
        for backend in Configuration::available_backends() {
            println!("  {backend}");
        }
        return Ok(());
    }

    let settings = settings::resolve_settings(&args, &cli_sources)?;

    let Some(input) = args.input.as_deref() else {
        eprintln!("no input given; pass a directory of phantom images or a single image file");
        eprintln!("usage: reverb-depth [OPTIONS] <INPUT>");
        std::process::exit(2);
    };

    let mut source_config = Configuration::from_env()?;
    if let Some(backend) = settings.backend.as_deref() {
        source_config.backend = Backend::from_str(backend)?;
    }
    if let Some(scale) = settings.scale_cm_per_px {
        source_config.default_scale_cm_per_px = scale;
    }
    let source = source_config.create_source()?;

    let files = batch::enumerate_inputs(input).map_err(AppError::Inputs)?;
    if files.is_empty() {
        eprintln!("no image files found under {}", input.display());
        std::process::exit(2);
    }

    let progress = ProgressBar::new(files.len() as u64);
    progress.set_style(
        ProgressStyle::with_template("{bar:40.green/black} {pos}/{len} {msg}").unwrap(),
    );
    progress.set_message("analyzing");

    let runner = BatchRunner::new(source, settings.detection, settings.max_concurrency);
    let records = runner.run(files, &progress).await;
    progress.finish_with_message("done");

    print!("{}", render_console_table(&records));

    let sink = ResultSink::new(settings.output);
    sink.write_csv(&records).await?;
    println!("report written to {}", sink.csv_path().display());

    Ok(())
}
