/// Finds candidate line rows: local maxima of the vertical profile that rise
/// above `threshold_rel * max(profile)`, in ascending row order.
///
/// Two maxima closer than `min_separation` rows collapse to the stronger
/// one, so a noisy ridge cannot report the same line twice.
pub(crate) fn find_peaks(profile: &[f32], threshold_rel: f32, min_separation: usize) -> Vec<usize> {
    let Some(max) = profile
        .iter()
        .copied()
        .fold(None::<f32>, |acc, v| Some(acc.map_or(v, |m| m.max(v))))
    else {
        return Vec::new();
    };
    let floor = threshold_rel * max;

    let mut peaks: Vec<usize> = Vec::new();
    for i in 1..profile.len().saturating_sub(1) {
        let value = profile[i];
        if value <= floor {
            continue;
        }
        // `>=` on the left admits the right edge of a flat plateau exactly
        // once; the strict `>` on the right rejects the rest of it.
        if value >= profile[i - 1] && value > profile[i + 1] {
            match peaks.last().copied() {
                Some(prev) if i - prev < min_separation.max(1) => {
                    if value > profile[prev] {
                        *peaks.last_mut().unwrap() = i;
                    }
                }
                _ => peaks.push(i),
            }
        }
    }
    peaks
}
