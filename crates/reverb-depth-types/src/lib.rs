//! Shared domain models for the reverb-depth workspace.
//!
//! This crate centralizes lightweight data structures used across the image
//! source, analyzer, sink, and CLI crates. Keep it backend-agnostic and avoid
//! heavy dependencies so all crates can depend on it freely.

use std::fmt;
use std::sync::Arc;

use serde::Serialize;
use thiserror::Error;

pub type SourceResult<T> = Result<T, SourceError>;

/// A single-channel phantom image, already cropped to the active ultrasound
/// region by the image source. Row-major, one byte per pixel.
#[derive(Clone)]
pub struct PhantomImage {
    rows: usize,
    cols: usize,
    data: Arc<[u8]>,
}

impl fmt::Debug for PhantomImage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PhantomImage")
            .field("rows", &self.rows)
            .field("cols", &self.cols)
            .field("bytes", &self.data.len())
            .finish()
    }
}

impl PhantomImage {
    pub fn from_owned(rows: usize, cols: usize, data: Vec<u8>) -> SourceResult<Self> {
        let required = rows
            .checked_mul(cols)
            .ok_or_else(|| SourceError::InvalidImage {
                reason: "calculated pixel count overflowed".into(),
            })?;
        if data.len() < required {
            return Err(SourceError::InvalidImage {
                reason: format!(
                    "insufficient pixel bytes: got {} expected at least {}",
                    data.len(),
                    required
                ),
            });
        }
        Ok(Self {
            rows,
            cols,
            data: Arc::from(data.into_boxed_slice()),
        })
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Pixels of one image row.
    pub fn row(&self, r: usize) -> &[u8] {
        let offset = r * self.cols;
        &self.data[offset..offset + self.cols]
    }

    pub fn is_empty(&self) -> bool {
        self.rows == 0 || self.cols == 0
    }
}

/// Per-image acquisition metadata supplied by the image source alongside the
/// pixel data.
#[derive(Debug, Clone, Copy)]
pub struct ImageMetadata {
    /// Physical distance represented by one pixel row, in cm. Validated where
    /// it is consumed, so a bad value fails only the image that carries it.
    pub scale_cm_per_px: f64,
}

impl ImageMetadata {
    pub fn new(scale_cm_per_px: f64) -> Self {
        Self { scale_cm_per_px }
    }
}

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("backend {backend} is not supported in this build")]
    Unsupported { backend: &'static str },

    #[error("configuration error: {message}")]
    Configuration { message: String },

    #[error("failed to decode image: {message}")]
    Decode { message: String },

    #[error("invalid image: {reason}")]
    InvalidImage { reason: String },

    #[error("invalid sidecar metadata: {message}")]
    Metadata { message: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl SourceError {
    pub fn unsupported(backend: &'static str) -> Self {
        Self::Unsupported { backend }
    }

    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    pub fn decode(message: impl Into<String>) -> Self {
        Self::Decode {
            message: message.into(),
        }
    }

    pub fn metadata(message: impl Into<String>) -> Self {
        Self::Metadata {
            message: message.into(),
        }
    }
}

/// One row of the batch report: either a measured depth or the reason the
/// image was skipped. Failed inputs stay in the report so the run output
/// always covers the whole batch.
#[derive(Debug, Clone, Serialize)]
pub struct DepthRecord {
    pub file: String,
    pub depth_cm: Option<f64>,
    pub error: Option<String>,
}

impl DepthRecord {
    pub fn success(file: impl Into<String>, depth_cm: f64) -> Self {
        Self {
            file: file.into(),
            depth_cm: Some(depth_cm),
            error: None,
        }
    }

    pub fn failure(file: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            file: file.into(),
            depth_cm: None,
            error: Some(error.into()),
        }
    }

    pub fn is_success(&self) -> bool {
        self.depth_cm.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn image_accessors_work() {
        let image = PhantomImage::from_owned(2, 3, vec![1, 2, 3, 4, 5, 6]).unwrap();
        assert_eq!(image.rows(), 2);
        assert_eq!(image.cols(), 3);
        assert_eq!(image.row(1), &[4, 5, 6]);
        assert!(!image.is_empty());
    }

    #[test]
    fn image_rejects_short_buffer() {
        let err = PhantomImage::from_owned(4, 4, vec![0; 15]).unwrap_err();
        assert!(matches!(err, SourceError::InvalidImage { .. }));
    }

    #[test]
    fn zero_sized_image_is_representable_but_empty() {
        let image = PhantomImage::from_owned(0, 10, Vec::new()).unwrap();
        assert!(image.is_empty());
    }

    #[test]
    fn record_constructors_tag_outcome() {
        assert!(DepthRecord::success("a.png", 0.5).is_success());
        assert!(!DepthRecord::failure("b.png", "no lines").is_success());
    }
}
