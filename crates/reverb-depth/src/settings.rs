use std::env;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use directories::ProjectDirs;
use serde::Deserialize;

use crate::cli::{CliArgs, CliSources};
use reverb_depth_analyzer::LineDetectionConfig;

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct FileConfig {
    backend: Option<String>,
    output: Option<String>,
    scale_cm_per_px: Option<f64>,
    max_concurrency: Option<usize>,
    detection: Option<DetectionFileConfig>,
}

#[derive(Debug, Default, Deserialize, Clone)]
#[serde(default)]
struct DetectionFileConfig {
    smoothing_sigma: Option<f32>,
    peak_threshold_rel: Option<f32>,
    min_peak_separation: Option<usize>,
    band_halfwidth: Option<usize>,
    gap_fraction: Option<f32>,
    gap_threshold: Option<usize>,
}

#[derive(Debug)]
pub struct EffectiveSettings {
    pub backend: Option<String>,
    pub output: PathBuf,
    pub scale_cm_per_px: Option<f64>,
    pub max_concurrency: usize,
    pub detection: LineDetectionConfig,
}

#[derive(Debug)]
pub enum ConfigError {
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
    InvalidValue {
        path: Option<PathBuf>,
        field: &'static str,
        value: String,
    },
    NotFound {
        path: PathBuf,
    },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Io { path, source } => {
                write!(
                    f,
                    "failed to read config file {}: {}",
                    path.display(),
                    source
                )
            }
            ConfigError::Parse { path, source } => {
                write!(
                    f,
                    "failed to parse config file {}: {}",
                    path.display(),
                    source
                )
            }
            ConfigError::InvalidValue { path, field, value } => {
                if let Some(path) = path {
                    write!(
                        f,
                        "invalid value '{}' for '{}' in {}",
                        value,
                        field,
                        path.display()
                    )
                } else {
                    write!(f, "invalid value '{}' for '{}'", value, field)
                }
            }
            ConfigError::NotFound { path } => {
                write!(f, "config file {} does not exist", path.display())
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::Io { source, .. } => Some(source),
            ConfigError::Parse { source, .. } => Some(source),
            ConfigError::InvalidValue { .. } => None,
            ConfigError::NotFound { .. } => None,
        }
    }
}

pub fn resolve_settings(
    cli: &CliArgs,
    sources: &CliSources,
) -> Result<EffectiveSettings, ConfigError> {
    let (file, config_path) = load_config(cli.config.as_deref())?;
    merge(cli, sources, file, config_path)
}

fn load_config(path_override: Option<&Path>) -> Result<(FileConfig, Option<PathBuf>), ConfigError> {
    if let Some(path) = path_override {
        let path = path.to_path_buf();
        if !path.exists() {
            return Err(ConfigError::NotFound { path });
        }
        let config = read_config(&path)?;
        return Ok((config, Some(path)));
    }

    if let Some(project_path) = project_config_path() {
        if project_path.exists() {
            let config = read_config(&project_path)?;
            return Ok((config, Some(project_path)));
        }
    }

    let Some(default_path) = default_config_path() else {
        return Ok((FileConfig::default(), None));
    };
    if !default_path.exists() {
        return Ok((FileConfig::default(), None));
    }
    let config = read_config(&default_path)?;
    Ok((config, Some(default_path)))
}

fn read_config(path: &Path) -> Result<FileConfig, ConfigError> {
    let contents = fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    toml::from_str(&contents).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

fn merge(
    cli: &CliArgs,
    sources: &CliSources,
    file: FileConfig,
    config_path: Option<PathBuf>,
) -> Result<EffectiveSettings, ConfigError> {
    let FileConfig {
        backend: file_backend,
        output: file_output,
        scale_cm_per_px: file_scale,
        max_concurrency: file_max_concurrency,
        detection: file_detection,
    } = file;

    let mut backend = normalize_string(cli.backend.clone());
    if backend.is_none() {
        backend = normalize_string(file_backend);
    }

    let mut output = cli.output.clone();
    if !sources.output_from_cli {
        if let Some(value) = normalize_string(file_output) {
            output = PathBuf::from(value);
        }
    }

    let mut scale_cm_per_px = cli.scale_cm_per_px;
    if !sources.scale_from_cli {
        if let Some(value) = file_scale {
            scale_cm_per_px = Some(value);
        }
    }
    if let Some(value) = scale_cm_per_px {
        if !value.is_finite() || value <= 0.0 {
            return Err(ConfigError::InvalidValue {
                path: config_path,
                field: "scale_cm_per_px",
                value: value.to_string(),
            });
        }
    }

    let mut max_concurrency = cli.max_concurrency;
    if !sources.max_concurrency_from_cli {
        if let Some(value) = file_max_concurrency {
            max_concurrency = value;
        }
    }
    if max_concurrency == 0 {
        return Err(ConfigError::InvalidValue {
            path: config_path,
            field: "max_concurrency",
            value: "0".to_string(),
        });
    }

    let detection = merge_detection(cli, sources, file_detection, config_path.as_ref())?;

    Ok(EffectiveSettings {
        backend,
        output,
        scale_cm_per_px,
        max_concurrency,
        detection,
    })
}

fn merge_detection(
    cli: &CliArgs,
    sources: &CliSources,
    file: Option<DetectionFileConfig>,
    config_path: Option<&PathBuf>,
) -> Result<LineDetectionConfig, ConfigError> {
    let file = file.unwrap_or_default();
    let mut detection = LineDetectionConfig::default();

    if let Some(value) = file.smoothing_sigma {
        detection.smoothing_sigma = value;
    }
    if let Some(value) = file.peak_threshold_rel {
        detection.peak_threshold_rel = value;
    }
    if let Some(value) = file.min_peak_separation {
        detection.min_peak_separation = value;
    }
    if let Some(value) = file.band_halfwidth {
        detection.band_halfwidth = value;
    }
    if let Some(value) = file.gap_fraction {
        detection.gap_fraction = value;
    }
    if let Some(value) = file.gap_threshold {
        detection.gap_threshold = value;
    }

    if sources.smoothing_sigma_from_cli {
        if let Some(value) = cli.smoothing_sigma {
            detection.smoothing_sigma = value;
        }
    }
    if sources.peak_threshold_rel_from_cli {
        if let Some(value) = cli.peak_threshold_rel {
            detection.peak_threshold_rel = value;
        }
    }
    if sources.min_peak_separation_from_cli {
        if let Some(value) = cli.min_peak_separation {
            detection.min_peak_separation = value;
        }
    }
    if sources.band_halfwidth_from_cli {
        if let Some(value) = cli.band_halfwidth {
            detection.band_halfwidth = value;
        }
    }
    if sources.gap_fraction_from_cli {
        if let Some(value) = cli.gap_fraction {
            detection.gap_fraction = value;
        }
    }
    if sources.gap_threshold_from_cli {
        if let Some(value) = cli.gap_threshold {
            detection.gap_threshold = value;
        }
    }

    if !detection.smoothing_sigma.is_finite() || detection.smoothing_sigma <= 0.0 {
        return Err(invalid(
            config_path,
            "smoothing_sigma",
            detection.smoothing_sigma.to_string(),
        ));
    }
    if !detection.peak_threshold_rel.is_finite()
        || detection.peak_threshold_rel <= 0.0
        || detection.peak_threshold_rel >= 1.0
    {
        return Err(invalid(
            config_path,
            "peak_threshold_rel",
            detection.peak_threshold_rel.to_string(),
        ));
    }
    if !detection.gap_fraction.is_finite()
        || detection.gap_fraction <= 0.0
        || detection.gap_fraction >= 1.0
    {
        return Err(invalid(
            config_path,
            "gap_fraction",
            detection.gap_fraction.to_string(),
        ));
    }
    if detection.band_halfwidth == 0 {
        return Err(invalid(config_path, "band_halfwidth", "0".to_string()));
    }
    if detection.gap_threshold == 0 {
        return Err(invalid(config_path, "gap_threshold", "0".to_string()));
    }

    Ok(detection)
}

fn invalid(path: Option<&PathBuf>, field: &'static str, value: String) -> ConfigError {
    ConfigError::InvalidValue {
        path: path.cloned(),
        field,
        value,
    }
}

fn default_config_path() -> Option<PathBuf> {
    ProjectDirs::from("rs", "reverb-depth", "reverb-depth")
        .map(|dirs| dirs.config_dir().join("config.toml"))
}

fn project_config_path() -> Option<PathBuf> {
    env::current_dir().ok().map(|dir| dir.join("config.toml"))
}

fn normalize_string(value: Option<String>) -> Option<String> {
    value.and_then(|v| {
        let trimmed = v.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(trimmed.to_string())
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::{CommandFactory, FromArgMatches};

    fn args(argv: &[&str]) -> (CliArgs, CliSources) {
        let mut full = vec!["reverb-depth"];
        full.extend_from_slice(argv);
        let matches = CliArgs::command().get_matches_from(full);
        let cli = CliArgs::from_arg_matches(&matches).unwrap();
        let sources = CliSources::from_matches(&matches);
        (cli, sources)
    }

    #[test]
    fn defaults_apply_without_file_or_flags() {
        let (cli, sources) = args(&["inputs"]);
        let settings = merge(&cli, &sources, FileConfig::default(), None).unwrap();
        assert_eq!(settings.output, PathBuf::from("line_heights.csv"));
        assert_eq!(settings.max_concurrency, 4);
        assert_eq!(settings.detection.gap_threshold, 10);
    }

    #[test]
    fn file_values_override_defaults() {
        let (cli, sources) = args(&["inputs"]);
        let file: FileConfig = toml::from_str(
            r#"
            output = "custom.csv"
            max_concurrency = 8

            [detection]
            gap_threshold = 14
            "#,
        )
        .unwrap();
        let settings = merge(&cli, &sources, file, None).unwrap();
        assert_eq!(settings.output, PathBuf::from("custom.csv"));
        assert_eq!(settings.max_concurrency, 8);
        assert_eq!(settings.detection.gap_threshold, 14);
        // untouched knobs keep their defaults
        assert_eq!(settings.detection.band_halfwidth, 3);
    }

    #[test]
    fn cli_flags_beat_file_values() {
        let (cli, sources) = args(&["--gap-threshold", "20", "--output", "cli.csv", "inputs"]);
        let file: FileConfig = toml::from_str(
            r#"
            output = "file.csv"

            [detection]
            gap_threshold = 14
            "#,
        )
        .unwrap();
        let settings = merge(&cli, &sources, file, None).unwrap();
        assert_eq!(settings.output, PathBuf::from("cli.csv"));
        assert_eq!(settings.detection.gap_threshold, 20);
    }

    #[test]
    fn non_positive_sigma_is_rejected() {
        let (cli, sources) = args(&["inputs"]);
        let file: FileConfig = toml::from_str("[detection]\nsmoothing_sigma = 0.0\n").unwrap();
        let err = merge(&cli, &sources, file, None).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::InvalidValue {
                field: "smoothing_sigma",
                ..
            }
        ));
    }

    #[test]
    fn zero_concurrency_is_rejected() {
        let (cli, sources) = args(&["inputs"]);
        let file: FileConfig = toml::from_str("max_concurrency = 0\n").unwrap();
        let err = merge(&cli, &sources, file, None).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::InvalidValue {
                field: "max_concurrency",
                ..
            }
        ));
    }

    #[test]
    fn explicit_config_path_must_exist() {
        let err = load_config(Some(Path::new("/definitely/not/here.toml"))).unwrap_err();
        assert!(matches!(err, ConfigError::NotFound { .. }));
    }
}
