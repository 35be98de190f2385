use crate::traits::Processor;
use crate::types::{ArtifactPayload, Result};
use image::{DynamicImage, ImageFormat};
use std::io::Cursor;
use std::path::Path;
use tracing::{debug, info};

/// Maximum image dimension (width or height) sent to vision models
const MAX_DIMENSION: u32 = 1600;

const SHARPEN_SIGMA: f32 = 1.0;
const SHARPEN_THRESHOLD: i32 = 2;
// Roughly a 1.3x contrast factor.
const CONTRAST_BOOST: f32 = 14.0;

/// Prepares images for vision models: RGB, bounded size, optional
/// sharpening and contrast boost for scans, re-encoded as PNG.
pub struct ImageProcessor {
    enhance: bool,
}

impl ImageProcessor {
    pub const EXTENSIONS: &'static [&'static str] =
        &["jpg", "jpeg", "png", "gif", "webp", "bmp", "tiff", "tif"];

    pub fn new(enhance: bool) -> Self {
        Self { enhance }
    }

    pub fn prepare(&self, image_data: &[u8]) -> Result<Vec<u8>> {
        let img = image::load_from_memory(image_data)?;
        debug!("Loaded image {}x{}", img.width(), img.height());

        let mut img = resize_if_needed(DynamicImage::ImageRgb8(img.to_rgb8()));
        if self.enhance {
            img = img
                .unsharpen(SHARPEN_SIGMA, SHARPEN_THRESHOLD)
                .adjust_contrast(CONTRAST_BOOST);
        }

        let mut buffer = Vec::new();
        img.write_to(&mut Cursor::new(&mut buffer), ImageFormat::Png)?;
        Ok(buffer)
    }
}

impl Default for ImageProcessor {
    fn default() -> Self {
        Self::new(true)
    }
}

/// Resize image if it exceeds maximum dimensions
fn resize_if_needed(img: DynamicImage) -> DynamicImage {
    let (width, height) = (img.width(), img.height());

    if width <= MAX_DIMENSION && height <= MAX_DIMENSION {
        return img;
    }

    let scale = MAX_DIMENSION as f32 / width.max(height) as f32;
    let new_width = ((width as f32 * scale) as u32).max(1);
    let new_height = ((height as f32 * scale) as u32).max(1);

    img.resize(new_width, new_height, image::imageops::FilterType::Lanczos3)
}

impl Processor for ImageProcessor {
    fn processor_name(&self) -> &'static str {
        "ImageProcessor"
    }

    fn extract(&self, path: &Path) -> Result<ArtifactPayload> {
        let bytes = std::fs::read(path)?;
        let png = self.prepare(&bytes)?;
        info!(
            "Converted {} to PNG ({} KB)",
            path.display(),
            png.len() / 1024
        );
        Ok(ArtifactPayload::Image(png))
    }
}
