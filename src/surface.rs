//! Rasterized snapshots of the dashboard and the capability that produces them.

use std::fmt;

use image::{DynamicImage, ImageBuffer, Rgb, RgbImage};

use crate::content::ReportContent;
use crate::layout::GridLayout;

/// An opaque pixel snapshot of the rendered dashboard.
///
/// Surfaces are produced once per export and never mutated afterwards.
#[derive(Clone, Debug, PartialEq)]
pub struct RenderedSurface {
    image: RgbImage,
}

impl RenderedSurface {
    /// Wraps an RGB buffer.
    pub fn new(image: RgbImage) -> Self {
        Self { image }
    }

    /// Converts any decoded image into an opaque surface, compositing
    /// translucent pixels onto white.
    pub fn from_dynamic_image(image: &DynamicImage) -> Self {
        let rgba = image.to_rgba8();
        let (width, height) = rgba.dimensions();
        let flattened = ImageBuffer::from_fn(width, height, |x, y| {
            let pixel = rgba.get_pixel(x, y);
            let alpha = f32::from(pixel[3]) / 255.0;
            let mut channels = [0u8; 3];
            for (index, channel) in channels.iter_mut().enumerate() {
                let value = f32::from(pixel[index]) * alpha + 255.0 * (1.0 - alpha);
                *channel = value.round().clamp(0.0, 255.0) as u8;
            }
            Rgb(channels)
        });
        Self::new(flattened)
    }

    /// Decodes an encoded snapshot (PNG, JPEG, ...) handed over by an external
    /// renderer.
    pub fn from_encoded_bytes(bytes: impl AsRef<[u8]>) -> Result<Self, RasterizeError> {
        let image = image::load_from_memory(bytes.as_ref()).map_err(RasterizeError::Decode)?;
        Ok(Self::from_dynamic_image(&image))
    }

    /// Pixel width.
    pub fn width(&self) -> u32 {
        self.image.width()
    }

    /// Pixel height.
    pub fn height(&self) -> u32 {
        self.image.height()
    }

    /// Returns `(width, height)` in pixels.
    pub fn dimensions(&self) -> (u32, u32) {
        self.image.dimensions()
    }

    /// Whether the surface has no pixels at all.
    pub fn is_empty(&self) -> bool {
        self.width() == 0 || self.height() == 0
    }

    /// Borrows the pixel buffer.
    pub fn pixels(&self) -> &RgbImage {
        &self.image
    }

    /// Returns the surface as a `DynamicImage` for encoders and PDF embedding.
    pub fn to_dynamic_image(&self) -> DynamicImage {
        DynamicImage::ImageRgb8(self.image.clone())
    }
}

impl From<RgbImage> for RenderedSurface {
    fn from(image: RgbImage) -> Self {
        Self::new(image)
    }
}

/// Failure to turn the current view into a bitmap.
#[derive(Debug)]
pub enum RasterizeError {
    /// The view had no area to capture.
    EmptyView,
    /// A snapshot supplied by an external renderer could not be decoded.
    Decode(image::ImageError),
    /// The external renderer failed for a reason of its own.
    Renderer(String),
}

impl fmt::Display for RasterizeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyView => write!(f, "The dashboard view has no visible area to capture"),
            Self::Decode(err) => write!(f, "Failed to decode captured view: {err}"),
            Self::Renderer(message) => write!(f, "View renderer failed: {message}"),
        }
    }
}

impl std::error::Error for RasterizeError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Decode(err) => Some(err),
            Self::EmptyView | Self::Renderer(_) => None,
        }
    }
}

/// Renders the current dashboard view into a bitmap.
///
/// Implementations may be in-process (see [`crate::raster::DashboardRasterizer`])
/// or wrap a headless browser that returns an encoded snapshot.
pub trait Rasterizer {
    fn rasterize(
        &self,
        layout: &GridLayout,
        content: &ReportContent,
    ) -> Result<RenderedSurface, RasterizeError>;
}

impl<F> Rasterizer for F
where
    F: Fn(&GridLayout, &ReportContent) -> Result<RenderedSurface, RasterizeError>,
{
    fn rasterize(
        &self,
        layout: &GridLayout,
        content: &ReportContent,
    ) -> Result<RenderedSurface, RasterizeError> {
        self(layout, content)
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use image::{ImageOutputFormat, Rgba, RgbaImage};

    use super::*;

    #[test]
    fn translucent_pixels_are_flattened_onto_white() {
        let mut rgba = RgbaImage::new(2, 1);
        rgba.put_pixel(0, 0, Rgba([0, 0, 0, 0]));
        rgba.put_pixel(1, 0, Rgba([10, 20, 30, 255]));

        let surface = RenderedSurface::from_dynamic_image(&DynamicImage::ImageRgba8(rgba));
        assert_eq!(surface.pixels().get_pixel(0, 0), &Rgb([255, 255, 255]));
        assert_eq!(surface.pixels().get_pixel(1, 0), &Rgb([10, 20, 30]));
    }

    #[test]
    fn decodes_png_snapshots() {
        let mut bytes = Vec::new();
        DynamicImage::ImageRgb8(RgbImage::new(3, 5))
            .write_to(&mut Cursor::new(&mut bytes), ImageOutputFormat::Png)
            .expect("encode png");

        let surface = RenderedSurface::from_encoded_bytes(&bytes).expect("decode");
        assert_eq!(surface.dimensions(), (3, 5));
    }

    #[test]
    fn garbage_snapshot_is_a_decode_error() {
        let err = RenderedSurface::from_encoded_bytes(b"not an image").unwrap_err();
        assert!(matches!(err, RasterizeError::Decode(_)));
    }
}
