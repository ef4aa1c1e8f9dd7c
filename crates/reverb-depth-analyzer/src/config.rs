use serde::Deserialize;

pub const DEFAULT_SMOOTHING_SIGMA: f32 = 1.5;
pub const DEFAULT_PEAK_THRESHOLD_REL: f32 = 0.2;
pub const DEFAULT_BAND_HALFWIDTH: usize = 3;
pub const DEFAULT_MIN_PEAK_SEPARATION: usize = DEFAULT_BAND_HALFWIDTH;
pub const DEFAULT_GAP_FRACTION: f32 = 0.2;
pub const DEFAULT_GAP_THRESHOLD: usize = 10;

/// Tuning knobs for the line detection pipeline. Every heuristic constant is
/// named here so the algorithm stays testable across tuning regimes.
#[derive(Clone, Copy, Debug, Deserialize)]
#[serde(default)]
pub struct LineDetectionConfig {
    /// Standard deviation of the Gaussian blur applied before profiling.
    pub smoothing_sigma: f32,
    /// Candidate lines must exceed this fraction of the profile maximum.
    pub peak_threshold_rel: f32,
    /// Minimum row distance between two reported peaks.
    pub min_peak_separation: usize,
    /// Half-height of the band extracted around each candidate line.
    pub band_halfwidth: usize,
    /// A column counts as a gap when its band mean falls at or below this
    /// fraction of the whole band's mean.
    pub gap_fraction: f32,
    /// Gap-column count at which a line is classified broken.
    pub gap_threshold: usize,
}

impl Default for LineDetectionConfig {
    fn default() -> Self {
        Self {
            smoothing_sigma: DEFAULT_SMOOTHING_SIGMA,
            peak_threshold_rel: DEFAULT_PEAK_THRESHOLD_REL,
            min_peak_separation: DEFAULT_MIN_PEAK_SEPARATION,
            band_halfwidth: DEFAULT_BAND_HALFWIDTH,
            gap_fraction: DEFAULT_GAP_FRACTION,
            gap_threshold: DEFAULT_GAP_THRESHOLD,
        }
    }
}
