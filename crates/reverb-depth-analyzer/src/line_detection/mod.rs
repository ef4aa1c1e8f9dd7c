use serde::Serialize;
use thiserror::Error;

use reverb_depth_types::{ImageMetadata, PhantomImage};

use crate::config::LineDetectionConfig;

mod continuity;
mod depth;
mod peaks;
mod profile;
mod smoothing;

pub use continuity::ContinuityVerdict;

#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error("invalid image: {reason}")]
    InvalidImage { reason: String },

    #[error("no reverberation lines rise above the detection threshold")]
    NoLinesDetected,

    #[error("the shallowest detected line is already broken")]
    NoUnbrokenLine,

    #[error("scale factor {value} is not a positive finite cm-per-pixel value")]
    InvalidScale { value: f64 },
}

/// Outcome of one pipeline run over a single image.
#[derive(Debug, Clone, Serialize)]
pub struct DepthMeasurement {
    /// Row of the selected (last unbroken) line.
    pub row: usize,
    /// Depth from the image top to the selected line, in cm.
    pub depth_cm: f64,
    /// Verdicts for the peaks evaluated before the scan stopped, in
    /// shallow-to-deep order.
    pub verdicts: Vec<ContinuityVerdict>,
}

/// Runs the full per-image pipeline: smooth, profile, find candidate lines,
/// pick the last unbroken one, convert its row to a depth.
///
/// Pure and stateless; identical inputs always produce identical output.
pub fn measure_depth(
    image: &PhantomImage,
    metadata: &ImageMetadata,
    config: &LineDetectionConfig,
) -> Result<DepthMeasurement, AnalysisError> {
    if image.is_empty() {
        return Err(AnalysisError::InvalidImage {
            reason: format!("image has {} rows and {} columns", image.rows(), image.cols()),
        });
    }

    let smoothed = smoothing::smooth_image(image, config.smoothing_sigma);
    let profile = profile::row_profile(&smoothed);
    let candidates = peaks::find_peaks(
        &profile,
        config.peak_threshold_rel,
        config.min_peak_separation,
    );
    if candidates.is_empty() {
        return Err(AnalysisError::NoLinesDetected);
    }

    let (row, verdicts) = continuity::select_last_unbroken(&smoothed, &candidates, config)?;
    let depth_cm = depth::depth_cm(row, metadata.scale_cm_per_px)?;

    Ok(DepthMeasurement {
        row,
        depth_cm,
        verdicts,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const ROWS: usize = 120;
    const COLS: usize = 100;
    const BACKGROUND: u8 = 10;
    const LINE_VALUE: u8 = 220;

    /// Synthetic phantom: three-row-thick bright lines centered on the given
    /// rows, with optional dark gaps `(line_row, start_col, width)`.
    fn phantom(line_rows: &[usize], gaps: &[(usize, usize, usize)]) -> PhantomImage {
        let mut data = vec![BACKGROUND; ROWS * COLS];
        for &row in line_rows {
            for r in row - 1..=row + 1 {
                data[r * COLS..(r + 1) * COLS].fill(LINE_VALUE);
            }
        }
        for &(row, start, width) in gaps {
            for r in row - 1..=row + 1 {
                data[r * COLS + start..r * COLS + start + width].fill(BACKGROUND);
            }
        }
        PhantomImage::from_owned(ROWS, COLS, data).unwrap()
    }

    fn metadata() -> ImageMetadata {
        ImageMetadata::new(0.005)
    }

    #[test]
    fn unbroken_phantom_reports_the_deepest_line() {
        let image = phantom(&[10, 40, 70, 100], &[]);
        let config = LineDetectionConfig::default();
        let result = measure_depth(&image, &metadata(), &config).unwrap();
        assert_eq!(result.row, 100);
        assert!((result.depth_cm - 100.0 * 0.005).abs() < 1e-12);
        assert_eq!(result.verdicts.len(), 4);
    }

    #[test]
    fn break_midway_selects_the_line_above_it() {
        // 24 dark columns survive the blur as well over ten gap columns.
        let image = phantom(&[10, 40, 70, 100], &[(70, 40, 24)]);
        let config = LineDetectionConfig::default();
        let result = measure_depth(&image, &metadata(), &config).unwrap();
        assert_eq!(result.row, 40);
        // Scan stopped: the deepest line was never classified.
        assert_eq!(result.verdicts.len(), 3);
    }

    #[test]
    fn broken_shallowest_line_reports_no_unbroken_line() {
        let image = phantom(&[10, 40], &[(10, 40, 24)]);
        let config = LineDetectionConfig::default();
        let err = measure_depth(&image, &metadata(), &config).unwrap_err();
        assert!(matches!(err, AnalysisError::NoUnbrokenLine));
    }

    #[test]
    fn flat_image_reports_no_lines() {
        let data = vec![BACKGROUND; ROWS * COLS];
        let image = PhantomImage::from_owned(ROWS, COLS, data).unwrap();
        let err = measure_depth(&image, &metadata(), &LineDetectionConfig::default()).unwrap_err();
        assert!(matches!(err, AnalysisError::NoLinesDetected));
    }

    #[test]
    fn empty_image_is_invalid() {
        let image = PhantomImage::from_owned(0, COLS, Vec::new()).unwrap();
        let err = measure_depth(&image, &metadata(), &LineDetectionConfig::default()).unwrap_err();
        assert!(matches!(err, AnalysisError::InvalidImage { .. }));
    }

    #[test]
    fn non_positive_scale_is_rejected() {
        let image = phantom(&[10, 40], &[]);
        let bad = ImageMetadata::new(0.0);
        let err = measure_depth(&image, &bad, &LineDetectionConfig::default()).unwrap_err();
        assert!(matches!(err, AnalysisError::InvalidScale { .. }));
    }

    #[test]
    fn pipeline_is_idempotent() {
        let image = phantom(&[10, 40, 70], &[]);
        let config = LineDetectionConfig::default();
        let first = measure_depth(&image, &metadata(), &config).unwrap();
        let second = measure_depth(&image, &metadata(), &config).unwrap();
        assert_eq!(first.row, second.row);
        assert_eq!(first.depth_cm.to_bits(), second.depth_cm.to_bits());
    }

    #[test]
    fn depth_tracks_the_scale_factor_linearly() {
        let image = phantom(&[10, 40, 70], &[]);
        let config = LineDetectionConfig::default();
        let narrow = measure_depth(&image, &ImageMetadata::new(0.004), &config).unwrap();
        let wide = measure_depth(&image, &ImageMetadata::new(0.008), &config).unwrap();
        assert_eq!(narrow.row, wide.row);
        assert!((wide.depth_cm - 2.0 * narrow.depth_cm).abs() < 1e-12);
    }
}
