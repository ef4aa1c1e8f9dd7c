//! Reverberation-line depth analysis.
//!
//! Turns a cropped phantom image into the depth of the last visually
//! unbroken reverberation line: Gaussian smoothing, a vertical intensity
//! profile, peak detection, a per-line continuity check with a scan-and-stop
//! selection rule, and conversion of the selected row into centimeters.

pub mod config;
pub mod line_detection;

pub use config::LineDetectionConfig;
pub use line_detection::{
    AnalysisError, ContinuityVerdict, DepthMeasurement, measure_depth,
};
