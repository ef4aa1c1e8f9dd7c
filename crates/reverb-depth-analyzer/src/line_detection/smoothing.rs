use reverb_depth_types::PhantomImage;

/// Floating-point image produced by the blur pass. The continuity analyzer
/// reads bands out of this representation rather than the raw bytes.
#[derive(Clone, Debug)]
pub(crate) struct SmoothedImage {
    pub rows: usize,
    pub cols: usize,
    pub data: Vec<f32>,
}

impl SmoothedImage {
    pub fn row(&self, r: usize) -> &[f32] {
        let offset = r * self.cols;
        &self.data[offset..offset + self.cols]
    }

    #[cfg(test)]
    pub fn from_rows(rows: &[&[f32]]) -> Self {
        let cols = rows.first().map(|r| r.len()).unwrap_or(0);
        let mut data = Vec::with_capacity(rows.len() * cols);
        for row in rows {
            assert_eq!(row.len(), cols);
            data.extend_from_slice(row);
        }
        Self {
            rows: rows.len(),
            cols,
            data,
        }
    }
}

/// Normalized 1-D Gaussian kernel with `radius = ceil(3*sigma)`, minimum 1.
struct GaussianKernel {
    radius: usize,
    weights: Vec<f32>,
}

impl GaussianKernel {
    fn new(sigma: f32) -> Self {
        assert!(
            sigma.is_finite() && sigma > 0.0,
            "sigma must be > 0 and finite"
        );

        let radius = ((3.0 * sigma).ceil() as usize).max(1);
        let len = 2 * radius + 1;
        let sigma2 = sigma * sigma;

        let mut weights = vec![0.0f32; len];
        for (i, w) in weights.iter_mut().enumerate() {
            let x = i as isize - radius as isize;
            let xf = x as f32;
            *w = (-(xf * xf) / (2.0 * sigma2)).exp();
        }
        let sum: f32 = weights.iter().sum();
        for w in &mut weights {
            *w /= sum;
        }

        Self { radius, weights }
    }
}

/// Separable Gaussian blur with clamped borders, applied horizontally then
/// vertically.
pub(crate) fn smooth_image(image: &PhantomImage, sigma: f32) -> SmoothedImage {
    let rows = image.rows();
    let cols = image.cols();
    let kernel = GaussianKernel::new(sigma);

    let mut horizontal = vec![0.0f32; rows * cols];
    let mut line = vec![0.0f32; cols];
    for r in 0..rows {
        for (c, value) in image.row(r).iter().enumerate() {
            line[c] = *value as f32;
        }
        convolve_clamp(&line, &kernel, &mut horizontal[r * cols..(r + 1) * cols]);
    }

    let mut data = vec![0.0f32; rows * cols];
    let mut column = vec![0.0f32; rows];
    let mut blurred = vec![0.0f32; rows];
    for c in 0..cols {
        for r in 0..rows {
            column[r] = horizontal[r * cols + c];
        }
        convolve_clamp(&column, &kernel, &mut blurred);
        for r in 0..rows {
            data[r * cols + c] = blurred[r];
        }
    }

    SmoothedImage { rows, cols, data }
}

fn convolve_clamp(signal: &[f32], kernel: &GaussianKernel, out: &mut [f32]) {
    debug_assert_eq!(signal.len(), out.len());
    let n = signal.len() as isize;
    let radius = kernel.radius as isize;
    for (i, out_i) in out.iter_mut().enumerate() {
        let mut acc = 0.0f32;
        for (k, &w) in kernel.weights.iter().enumerate() {
            let idx = (i as isize + k as isize - radius).clamp(0, n - 1);
            acc += signal[idx as usize] * w;
        }
        *out_i = acc;
    }
}
