use std::path::Path;
use std::sync::Arc;

use crate::{DynImageSource, ImageMetadata, ImageSource, PhantomImage, SourceResult};
use reverb_depth_types::SourceError;

const MOCK_ROWS: usize = 120;
const MOCK_COLS: usize = 100;
const MOCK_BACKGROUND: u8 = 12;
const MOCK_LINE_VALUE: u8 = 220;
const MOCK_LINE_ROWS: [usize; 4] = [10, 40, 70, 100];

/// A dark stretch punched into one synthetic line: `(line_row, start_col,
/// width)`.
#[derive(Debug, Clone, Copy)]
pub struct InducedGap {
    pub line_row: usize,
    pub start_col: usize,
    pub width: usize,
}

/// Synthetic phantom source for tests and CI. Every `load` produces the same
/// image for the same configuration, regardless of the path contents.
pub struct MockSource {
    scale_cm_per_px: f64,
    line_rows: Vec<usize>,
    gaps: Vec<InducedGap>,
    /// Paths whose file name contains this marker fail with a decode error,
    /// for exercising batch skip behavior.
    fail_marker: Option<String>,
}

impl MockSource {
    pub fn new(scale_cm_per_px: f64) -> Self {
        Self {
            scale_cm_per_px,
            line_rows: MOCK_LINE_ROWS.to_vec(),
            gaps: Vec::new(),
            fail_marker: None,
        }
    }

    pub fn with_line_rows(mut self, rows: Vec<usize>) -> Self {
        self.line_rows = rows;
        self
    }

    pub fn with_gap(mut self, gap: InducedGap) -> Self {
        self.gaps.push(gap);
        self
    }

    pub fn with_fail_marker(mut self, marker: impl Into<String>) -> Self {
        self.fail_marker = Some(marker.into());
        self
    }

    fn render(&self) -> SourceResult<PhantomImage> {
        let mut data = vec![MOCK_BACKGROUND; MOCK_ROWS * MOCK_COLS];
        for &row in &self.line_rows {
            let top = row.saturating_sub(1);
            let bottom = (row + 2).min(MOCK_ROWS);
            for r in top..bottom {
                data[r * MOCK_COLS..(r + 1) * MOCK_COLS].fill(MOCK_LINE_VALUE);
            }
        }
        for gap in &self.gaps {
            let top = gap.line_row.saturating_sub(1);
            let bottom = (gap.line_row + 2).min(MOCK_ROWS);
            let start = gap.start_col.min(MOCK_COLS);
            let end = (gap.start_col + gap.width).min(MOCK_COLS);
            for r in top..bottom {
                data[r * MOCK_COLS + start..r * MOCK_COLS + end].fill(MOCK_BACKGROUND);
            }
        }
        PhantomImage::from_owned(MOCK_ROWS, MOCK_COLS, data)
    }
}

impl ImageSource for MockSource {
    fn load(&self, path: &Path) -> SourceResult<(PhantomImage, ImageMetadata)> {
        if let Some(marker) = self.fail_marker.as_deref() {
            let name = path.file_name().and_then(|n| n.to_str()).unwrap_or("");
            if name.contains(marker) {
                return Err(SourceError::decode(format!(
                    "mock source configured to fail for '{name}'"
                )));
            }
        }
        let image = self.render()?;
        Ok((image, ImageMetadata::new(self.scale_cm_per_px)))
    }
}

pub fn shared_mock(scale_cm_per_px: f64) -> DynImageSource {
    Arc::new(MockSource::new(scale_cm_per_px))
}
