use std::path::PathBuf;

use clap::parser::ValueSource;
use clap::{ArgMatches, CommandFactory, FromArgMatches, Parser};

/// Tracks which values actually came from the command line, so the settings
/// merge can let the configuration file fill in everything else.
#[derive(Debug, Default)]
pub struct CliSources {
    pub output_from_cli: bool,
    pub scale_from_cli: bool,
    pub max_concurrency_from_cli: bool,
    pub smoothing_sigma_from_cli: bool,
    pub peak_threshold_rel_from_cli: bool,
    pub band_halfwidth_from_cli: bool,
    pub gap_fraction_from_cli: bool,
    pub gap_threshold_from_cli: bool,
    pub min_peak_separation_from_cli: bool,
}

impl CliSources {
    pub(crate) fn from_matches(matches: &ArgMatches) -> Self {
        Self {
            output_from_cli: value_from_cli(matches, "output"),
            scale_from_cli: value_from_cli(matches, "scale_cm_per_px"),
            max_concurrency_from_cli: value_from_cli(matches, "max_concurrency"),
            smoothing_sigma_from_cli: value_from_cli(matches, "smoothing_sigma"),
            peak_threshold_rel_from_cli: value_from_cli(matches, "peak_threshold_rel"),
            band_halfwidth_from_cli: value_from_cli(matches, "band_halfwidth"),
            gap_fraction_from_cli: value_from_cli(matches, "gap_fraction"),
            gap_threshold_from_cli: value_from_cli(matches, "gap_threshold"),
            min_peak_separation_from_cli: value_from_cli(matches, "min_peak_separation"),
        }
    }
}

fn value_from_cli(matches: &ArgMatches, id: &str) -> bool {
    matches
        .value_source(id)
        .is_some_and(|source| matches!(source, ValueSource::CommandLine))
}

pub fn parse_cli() -> (CliArgs, CliSources) {
    let command = CliArgs::command();
    let matches = command.get_matches();
    let args = match CliArgs::from_arg_matches(&matches) {
        Ok(args) => args,
        Err(err) => err.exit(),
    };
    let sources = CliSources::from_matches(&matches);
    (args, sources)
}

#[derive(Debug, Parser)]
#[command(
    name = "reverb-depth",
    about = "Measure the depth of the last unbroken reverberation line in phantom images",
    disable_help_subcommand = true
)]
pub struct CliArgs {
    /// Lock loading to a specific image source backend
    #[arg(short = 'b', long = "backend")]
    pub backend: Option<String>,

    /// Override the configuration file path
    #[arg(long = "config")]
    pub config: Option<PathBuf>,

    /// Destination for the CSV report
    #[arg(long = "output", id = "output", default_value = "line_heights.csv")]
    pub output: PathBuf,

    /// Print the list of available image source backends
    #[arg(long = "list-backends")]
    pub list_backends: bool,

    /// Fallback cm-per-pixel-row scale for inputs without sidecar metadata
    #[arg(long = "scale-cm-per-px", id = "scale_cm_per_px")]
    pub scale_cm_per_px: Option<f64>,

    /// Number of images analyzed concurrently
    #[arg(
        long = "max-concurrency",
        id = "max_concurrency",
        default_value_t = 4,
        value_parser = clap::value_parser!(usize)
    )]
    pub max_concurrency: usize,

    /// Gaussian smoothing standard deviation
    #[arg(long = "smoothing-sigma", id = "smoothing_sigma")]
    pub smoothing_sigma: Option<f32>,

    /// Peaks must exceed this fraction of the profile maximum (0-1)
    #[arg(long = "peak-threshold-rel", id = "peak_threshold_rel")]
    pub peak_threshold_rel: Option<f32>,

    /// Half-height in rows of the continuity band around each line
    #[arg(long = "band-halfwidth", id = "band_halfwidth")]
    pub band_halfwidth: Option<usize>,

    /// Columns at or below this fraction of the band mean count as gaps (0-1)
    #[arg(long = "gap-fraction", id = "gap_fraction")]
    pub gap_fraction: Option<f32>,

    /// Gap-column count at which a line is considered broken
    #[arg(long = "gap-threshold", id = "gap_threshold")]
    pub gap_threshold: Option<usize>,

    /// Minimum row distance between two reported peaks
    #[arg(long = "min-peak-separation", id = "min_peak_separation")]
    pub min_peak_separation: Option<usize>,

    /// Input directory of phantom images, or a single image file
    pub input: Option<PathBuf>,
}
