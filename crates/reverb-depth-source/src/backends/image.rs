use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use image::ImageError;
use serde::Deserialize;

use crate::{DynImageSource, ImageMetadata, ImageSource, PhantomImage, SourceResult};
use reverb_depth_types::SourceError;

/// Fixed horizontal insets trimming the ruler markings that sit just inside
/// the reported ultrasound region.
const REGION_INSET_LEFT: usize = 56;
const REGION_INSET_RIGHT: usize = 54;

const SIDECAR_SUFFIX: &str = ".meta.json";

/// Ultrasound region rectangle as carried in the acquisition header,
/// half-open on neither side: `min..=max` pixel coordinates.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct UltrasoundRegion {
    pub min_x0: usize,
    pub max_x1: usize,
    pub min_y0: usize,
    pub max_y1: usize,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct SidecarMetadata {
    region: Option<UltrasoundRegion>,
    physical_delta_y: Option<f64>,
}

/// Decodes ordinary grayscale image files (PNG, PGM, JPEG). An optional
/// `<file>.meta.json` sidecar supplies the ultrasound region and the
/// cm-per-pixel scale the proprietary container would normally carry.
pub struct ImageFileSource {
    default_scale_cm_per_px: f64,
}

impl ImageFileSource {
    pub fn new(default_scale_cm_per_px: f64) -> Self {
        Self {
            default_scale_cm_per_px,
        }
    }

    fn load_sidecar(&self, path: &Path) -> SourceResult<SidecarMetadata> {
        let sidecar = sidecar_path(path);
        if !sidecar.exists() {
            return Ok(SidecarMetadata::default());
        }
        let contents = fs::read_to_string(&sidecar)?;
        serde_json::from_str(&contents).map_err(|err| {
            SourceError::metadata(format!("{}: {err}", sidecar.display()))
        })
    }
}

impl ImageSource for ImageFileSource {
    fn load(&self, path: &Path) -> SourceResult<(PhantomImage, ImageMetadata)> {
        let decoded = image::open(path).map_err(map_image_error)?;
        // The acquisition stores grayscale replicated across RGB; collapse
        // back with a per-pixel channel mean.
        let rgb = decoded.to_rgb8();
        let (width, height) = (rgb.width() as usize, rgb.height() as usize);
        let mut gray = Vec::with_capacity(width * height);
        for pixel in rgb.pixels() {
            let sum = pixel.0[0] as u16 + pixel.0[1] as u16 + pixel.0[2] as u16;
            gray.push((sum / 3) as u8);
        }

        let sidecar = self.load_sidecar(path)?;
        let crop = crop_window(width, height, sidecar.region.as_ref())?;
        let image = crop_image(&gray, width, crop)?;

        let scale = sidecar
            .physical_delta_y
            .unwrap_or(self.default_scale_cm_per_px);
        Ok((image, ImageMetadata::new(scale)))
    }
}

pub fn shared_image_source(default_scale_cm_per_px: f64) -> DynImageSource {
    Arc::new(ImageFileSource::new(default_scale_cm_per_px))
}

#[derive(Debug, Clone, Copy)]
struct CropWindow {
    x0: usize,
    x1: usize,
    y0: usize,
    y1: usize,
}

fn crop_window(
    width: usize,
    height: usize,
    region: Option<&UltrasoundRegion>,
) -> SourceResult<CropWindow> {
    let (x0, x1, y0, y1) = match region {
        Some(region) => (
            region.min_x0 + REGION_INSET_LEFT,
            region.max_x1.saturating_sub(REGION_INSET_RIGHT),
            region.min_y0,
            region.max_y1,
        ),
        // Without a region header, trim only the fixed insets when the
        // image is wide enough to spare them.
        None if width > REGION_INSET_LEFT + REGION_INSET_RIGHT => (
            REGION_INSET_LEFT,
            width - REGION_INSET_RIGHT,
            0,
            height,
        ),
        None => (0, width, 0, height),
    };

    let x0 = x0.min(width);
    let x1 = x1.min(width);
    let y0 = y0.min(height);
    let y1 = y1.min(height);
    if x0 >= x1 || y0 >= y1 {
        return Err(SourceError::metadata(format!(
            "region crop [{x0}..{x1}) x [{y0}..{y1}) is empty for a {width}x{height} image"
        )));
    }
    Ok(CropWindow { x0, x1, y0, y1 })
}

fn crop_image(gray: &[u8], width: usize, crop: CropWindow) -> SourceResult<PhantomImage> {
    let rows = crop.y1 - crop.y0;
    let cols = crop.x1 - crop.x0;
    let mut data = Vec::with_capacity(rows * cols);
    for r in crop.y0..crop.y1 {
        let offset = r * width;
        data.extend_from_slice(&gray[offset + crop.x0..offset + crop.x1]);
    }
    PhantomImage::from_owned(rows, cols, data)
}

fn sidecar_path(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_os_string();
    name.push(SIDECAR_SUFFIX);
    PathBuf::from(name)
}

fn map_image_error(err: ImageError) -> SourceError {
    match err {
        ImageError::IoError(err) => SourceError::Io(err),
        other => SourceError::decode(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::GrayImage;

    fn write_gradient(dir: &Path, name: &str, width: u32, height: u32) -> PathBuf {
        let image = GrayImage::from_fn(width, height, |_, y| image::Luma([(y % 256) as u8]));
        let path = dir.join(name);
        image.save(&path).unwrap();
        path
    }

    #[test]
    fn narrow_images_load_without_cropping() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_gradient(dir.path(), "narrow.png", 40, 30);
        let source = ImageFileSource::new(0.005);
        let (image, meta) = source.load(&path).unwrap();
        assert_eq!((image.rows(), image.cols()), (30, 40));
        assert_eq!(meta.scale_cm_per_px, 0.005);
    }

    #[test]
    fn wide_images_lose_the_fixed_insets() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_gradient(dir.path(), "wide.png", 400, 30);
        let source = ImageFileSource::new(0.005);
        let (image, _) = source.load(&path).unwrap();
        assert_eq!(image.cols(), 400 - REGION_INSET_LEFT - REGION_INSET_RIGHT);
        assert_eq!(image.rows(), 30);
    }

    #[test]
    fn sidecar_region_and_scale_are_honored() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_gradient(dir.path(), "phantom.png", 400, 300);
        fs::write(
            sidecar_path(&path),
            r#"{
                "region": { "min_x0": 10, "max_x1": 390, "min_y0": 20, "max_y1": 280 },
                "physical_delta_y": 0.0042
            }"#,
        )
        .unwrap();
        let source = ImageFileSource::new(0.005);
        let (image, meta) = source.load(&path).unwrap();
        assert_eq!(image.rows(), 260);
        assert_eq!(image.cols(), (390 - REGION_INSET_RIGHT) - (10 + REGION_INSET_LEFT));
        assert_eq!(meta.scale_cm_per_px, 0.0042);
        // First cropped row comes from source row 20.
        assert!(image.row(0).iter().all(|&v| v == 20));
    }

    #[test]
    fn empty_crop_is_a_metadata_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_gradient(dir.path(), "tiny.png", 400, 300);
        fs::write(
            sidecar_path(&path),
            r#"{ "region": { "min_x0": 300, "max_x1": 320, "min_y0": 0, "max_y1": 300 } }"#,
        )
        .unwrap();
        let source = ImageFileSource::new(0.005);
        let err = source.load(&path).unwrap_err();
        assert!(matches!(err, SourceError::Metadata { .. }));
    }

    #[test]
    fn missing_files_surface_io_errors() {
        let source = ImageFileSource::new(0.005);
        let err = source.load(Path::new("/nonexistent/file.png")).unwrap_err();
        assert!(matches!(err, SourceError::Io(_)));
    }
}
