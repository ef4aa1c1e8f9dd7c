use super::smoothing::SmoothedImage;

/// Compresses the smoothed image into one mean intensity per row. The row
/// index of each entry matches the image row it came from.
pub(crate) fn row_profile(image: &SmoothedImage) -> Vec<f32> {
    let width = image.cols.max(1) as f32;
    (0..image.rows)
        .map(|r| image.row(r).iter().sum::<f32>() / width)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn profile_has_one_entry_per_row() {
        let image = SmoothedImage::from_rows(&[&[1.0, 2.0, 3.0], &[4.0, 4.0, 4.0]]);
        let profile = row_profile(&image);
        assert_eq!(profile.len(), 2);
        assert!((profile[0] - 2.0).abs() < 1e-6);
        assert!((profile[1] - 4.0).abs() < 1e-6);
    }
}
