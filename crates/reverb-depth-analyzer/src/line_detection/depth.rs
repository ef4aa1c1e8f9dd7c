use super::AnalysisError;

/// Converts the selected row index into a physical depth. The scale factor
/// comes straight from acquisition metadata, so it is validated here rather
/// than at the source boundary.
pub(crate) fn depth_cm(row: usize, scale_cm_per_px: f64) -> Result<f64, AnalysisError> {
    if !scale_cm_per_px.is_finite() || scale_cm_per_px <= 0.0 {
        return Err(AnalysisError::InvalidScale {
            value: scale_cm_per_px,
        });
    }
    Ok(row as f64 * scale_cm_per_px)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn depth_scales_linearly_with_the_scale_factor() {
        let base = depth_cm(100, 0.005).unwrap();
        let doubled = depth_cm(100, 0.010).unwrap();
        assert!((base - 0.5).abs() < 1e-12);
        assert!((doubled - 2.0 * base).abs() < 1e-12);
    }

    #[test]
    fn zero_and_negative_scales_are_rejected() {
        assert!(matches!(
            depth_cm(10, 0.0),
            Err(AnalysisError::InvalidScale { .. })
        ));
        assert!(matches!(
            depth_cm(10, -0.1),
            Err(AnalysisError::InvalidScale { .. })
        ));
        assert!(matches!(
            depth_cm(10, f64::NAN),
            Err(AnalysisError::InvalidScale { .. })
        ));
    }
}
