use std::env;
use std::fmt;
use std::str::FromStr;

use crate::backends;
use crate::{DynImageSource, SourceError, SourceResult};

/// Default cm-per-pixel-row when neither sidecar metadata nor configuration
/// supplies one.
pub const DEFAULT_SCALE_CM_PER_PX: f64 = 0.005;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backend {
    Mock,
    Image,
}

impl FromStr for Backend {
    type Err = SourceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "mock" => Ok(Backend::Mock),
            "image" => Ok(Backend::Image),
            other => Err(SourceError::configuration(format!(
                "unknown backend '{other}'"
            ))),
        }
    }
}

impl Backend {
    pub fn as_str(&self) -> &'static str {
        match self {
            Backend::Mock => "mock",
            Backend::Image => "image",
        }
    }
}

impl fmt::Display for Backend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone)]
pub struct Configuration {
    pub backend: Backend,
    /// Scale applied when an input carries no sidecar metadata.
    pub default_scale_cm_per_px: f64,
}

impl Default for Configuration {
    fn default() -> Self {
        Self {
            backend: Backend::Image,
            default_scale_cm_per_px: DEFAULT_SCALE_CM_PER_PX,
        }
    }
}

impl Configuration {
    pub fn from_env() -> SourceResult<Self> {
        let mut config = Configuration::default();
        if let Ok(backend) = env::var("REVERB_BACKEND") {
            config.backend = Backend::from_str(&backend)?;
        }
        if let Ok(scale) = env::var("REVERB_SCALE_CM_PER_PX") {
            let parsed: f64 = scale.parse().map_err(|_| {
                SourceError::configuration(format!(
                    "failed to parse REVERB_SCALE_CM_PER_PX='{scale}' as a number"
                ))
            })?;
            if !parsed.is_finite() || parsed <= 0.0 {
                return Err(SourceError::configuration(
                    "REVERB_SCALE_CM_PER_PX must be a positive number",
                ));
            }
            config.default_scale_cm_per_px = parsed;
        }
        Ok(config)
    }

    pub fn available_backends() -> Vec<Backend> {
        vec![Backend::Image, Backend::Mock]
    }

    pub fn create_source(&self) -> SourceResult<DynImageSource> {
        match self.backend {
            Backend::Mock => Ok(backends::mock::shared_mock(self.default_scale_cm_per_px)),
            Backend::Image => Ok(backends::image::shared_image_source(
                self.default_scale_cm_per_px,
            )),
        }
    }
}
