use serde::Serialize;

use super::AnalysisError;
use super::smoothing::SmoothedImage;
use crate::config::LineDetectionConfig;

/// Continuity classification of one candidate line.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct ContinuityVerdict {
    /// Image row of the candidate peak.
    pub row: usize,
    /// Columns whose band mean fell at or below the gap fraction.
    pub gap_columns: usize,
    pub broken: bool,
}

/// Classifies the band around `row`: extract `[row - halfwidth,
/// row + halfwidth)` clipped to the image, compress it to one mean per
/// column, and count the columns at or below `gap_fraction` of the band
/// mean.
pub(crate) fn classify_line(
    image: &SmoothedImage,
    row: usize,
    config: &LineDetectionConfig,
) -> ContinuityVerdict {
    let start = row.saturating_sub(config.band_halfwidth);
    let end = (row + config.band_halfwidth).min(image.rows).max(start + 1);
    let band_rows = (end - start) as f32;

    let mut horizontal = vec![0.0f32; image.cols];
    for r in start..end {
        for (c, value) in image.row(r).iter().enumerate() {
            horizontal[c] += value;
        }
    }
    for value in &mut horizontal {
        *value /= band_rows;
    }

    let band_mean = horizontal.iter().sum::<f32>() / image.cols.max(1) as f32;
    let gap_floor = config.gap_fraction * band_mean;
    let gap_columns = horizontal.iter().filter(|&&v| v <= gap_floor).count();

    ContinuityVerdict {
        row,
        gap_columns,
        broken: gap_columns >= config.gap_threshold,
    }
}

/// Scan-and-stop selection: walk the peaks shallow-to-deep and stop at the
/// first broken line, reporting the line above it. Peaks below the first
/// break are never classified; once continuity fails, deeper lines are
/// considered unreliable regardless of their own appearance.
pub(crate) fn select_last_unbroken(
    image: &SmoothedImage,
    peaks: &[usize],
    config: &LineDetectionConfig,
) -> Result<(usize, Vec<ContinuityVerdict>), AnalysisError> {
    let mut verdicts = Vec::with_capacity(peaks.len());
    for (i, &row) in peaks.iter().enumerate() {
        let verdict = classify_line(image, row, config);
        verdicts.push(verdict);
        if verdict.broken {
            return match i.checked_sub(1) {
                Some(prev) => Ok((peaks[prev], verdicts)),
                None => Err(AnalysisError::NoUnbrokenLine),
            };
        }
    }
    match peaks.last() {
        Some(&row) => Ok((row, verdicts)),
        None => Err(AnalysisError::NoLinesDetected),
    }
}
