//! Image acquisition for the reverb-depth pipeline.
//!
//! The analyzer only ever sees the [`ImageSource`] contract: a file
//! identifier goes in, a cropped single-channel [`PhantomImage`] plus its
//! acquisition metadata come out. Container formats, region-of-interest
//! cropping, and scale-factor extraction all live behind this boundary.

pub mod backends;
pub mod config;

use std::path::Path;
use std::sync::Arc;

pub use config::{Backend, Configuration};
pub use reverb_depth_types::{ImageMetadata, PhantomImage, SourceError, SourceResult};

pub type DynImageSource = Arc<dyn ImageSource>;

pub trait ImageSource: Send + Sync {
    /// Loads one input file, returning the cropped intensity image and the
    /// metadata needed to convert rows to physical units.
    fn load(&self, path: &Path) -> SourceResult<(PhantomImage, ImageMetadata)>;
}
