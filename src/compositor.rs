// src/compositor.rs
//! Strip compositing: every screenshot is downsampled to a virtual 40 DPI and
//! the results are laid side by side on one canvas, then JPEG encoded.

use anyhow::{Context, Result};
use image::codecs::jpeg::JpegEncoder;
use image::imageops::{self, FilterType};
use image::{DynamicImage, Rgba, RgbaImage};
use std::io::Cursor;

use crate::app_log;
use crate::data_uri::DataUri;

/// Assumed screen density of the uploaded screenshots.
pub const SOURCE_DPI: f64 = 96.0;
/// Density the strip is downsampled to.
pub const TARGET_DPI: f64 = 40.0;
pub const JPEG_QUALITY: u8 = 70;
/// Largest strip canvas, in pixels, the compositor will allocate (RGBA, 4 bytes each).
pub const MAX_CANVAS_PIXELS: u64 = 40_000_000;

const BACKGROUND: Rgba<u8> = Rgba([255, 255, 255, 255]);

#[derive(Debug, Clone)]
pub struct ScaledImage {
    pub image: RgbaImage,
}

impl ScaledImage {
    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }
}

/// Encoded strip ready to hand to the page or the analyzer.
#[derive(Debug, Clone)]
pub struct StripImage {
    pub width: u32,
    pub height: u32,
    pub count: usize,
    pub jpeg: Vec<u8>,
}

impl StripImage {
    pub fn to_data_uri(&self) -> String {
        DataUri::encode("image/jpeg", &self.jpeg)
    }
}

#[derive(Debug, Clone, Copy)]
pub struct Compositor {
    scale_factor: f64,
    quality: u8,
    max_canvas_pixels: u64,
}

impl Default for Compositor {
    fn default() -> Self {
        Self::new()
    }
}

impl Compositor {
    pub fn new() -> Self {
        Self {
            scale_factor: TARGET_DPI / SOURCE_DPI,
            quality: JPEG_QUALITY,
            max_canvas_pixels: MAX_CANVAS_PIXELS,
        }
    }

    pub fn with_scale(mut self, target_dpi: f64, source_dpi: f64) -> Self {
        self.scale_factor = target_dpi / source_dpi;
        self
    }

    pub fn with_quality(mut self, quality: u8) -> Self {
        self.quality = quality.clamp(1, 100);
        self
    }

    pub fn with_max_canvas_pixels(mut self, max_canvas_pixels: u64) -> Self {
        self.max_canvas_pixels = max_canvas_pixels;
        self
    }

    /// Strip size for the scaled images, refused when the canvas would exceed the pixel budget
    pub fn canvas_dimensions(&self, images: &[ScaledImage]) -> Result<(u32, u32)> {
        let width: u64 = images.iter().map(|i| u64::from(i.width())).sum();
        let height = images.iter().map(|i| u64::from(i.height())).max().unwrap_or(1);

        let pixels = width.checked_mul(height).unwrap_or(u64::MAX);
        if pixels > self.max_canvas_pixels {
            anyhow::bail!(
                "Strip too large: {}x{} exceeds the {} pixel limit",
                width,
                height,
                self.max_canvas_pixels
            );
        }

        let width = u32::try_from(width).context("Strip width out of range")?;
        let height = u32::try_from(height).context("Strip height out of range")?;
        Ok((width, height))
    }

    /// Scaled size of a `width` x `height` source, rounded to the nearest pixel
    pub fn scaled_dimensions(&self, width: u32, height: u32) -> (u32, u32) {
        let scale = |v: u32| ((v as f64 * self.scale_factor).round() as u32).max(1);
        (scale(width), scale(height))
    }

    /// Decode one upload and resize it to its scaled dimensions
    pub fn scale(&self, bytes: &[u8]) -> Result<ScaledImage> {
        let decoded = image::load_from_memory(bytes).context("Failed to decode image")?;
        Ok(self.scale_decoded(&decoded))
    }

    fn scale_decoded(&self, decoded: &DynamicImage) -> ScaledImage {
        let (width, height) = self.scaled_dimensions(decoded.width(), decoded.height());
        let resized = decoded.resize_exact(width, height, FilterType::Triangle);
        ScaledImage {
            image: resized.to_rgba8(),
        }
    }

    /// Lay the scaled images left to right, top aligned, and encode the strip
    pub fn compose(&self, images: &[ScaledImage]) -> Result<StripImage> {
        if images.is_empty() {
            anyhow::bail!("No images to compose");
        }

        let (width, height) = self.canvas_dimensions(images)?;

        let mut canvas = RgbaImage::from_pixel(width, height, BACKGROUND);
        let mut x: i64 = 0;
        for scaled in images {
            imageops::overlay(&mut canvas, &scaled.image, x, 0);
            x += scaled.width() as i64;
        }

        let jpeg = self.encode_jpeg(canvas)?;
        app_log!(
            debug,
            "Composed strip of {} images: {}x{} ({} bytes)",
            images.len(),
            width,
            height,
            jpeg.len()
        );

        Ok(StripImage {
            width,
            height,
            count: images.len(),
            jpeg,
        })
    }

    /// Scale every upload then compose. Any undecodable upload fails the whole strip.
    pub fn process<B: AsRef<[u8]>>(&self, uploads: &[B]) -> Result<StripImage> {
        if uploads.is_empty() {
            anyhow::bail!("No images to compose");
        }

        let scaled = uploads
            .iter()
            .enumerate()
            .map(|(index, bytes)| {
                self.scale(bytes.as_ref())
                    .with_context(|| format!("Image {} could not be processed", index + 1))
            })
            .collect::<Result<Vec<_>>>()?;

        self.compose(&scaled)
    }

    fn encode_jpeg(&self, canvas: RgbaImage) -> Result<Vec<u8>> {
        let rgb = DynamicImage::ImageRgba8(canvas).to_rgb8();
        let mut buffer = Cursor::new(Vec::new());
        let encoder = JpegEncoder::new_with_quality(&mut buffer, self.quality);
        DynamicImage::ImageRgb8(rgb)
            .write_with_encoder(encoder)
            .context("Failed to encode strip as JPEG")?;
        Ok(buffer.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageFormat, Rgb, RgbImage};

    fn png_bytes(width: u32, height: u32, color: [u8; 3]) -> Vec<u8> {
        let img = RgbImage::from_pixel(width, height, Rgb(color));
        let mut buffer = Cursor::new(Vec::new());
        DynamicImage::ImageRgb8(img)
            .write_to(&mut buffer, ImageFormat::Png)
            .unwrap();
        buffer.into_inner()
    }

    #[test]
    fn test_scaled_dimensions_round_to_nearest() {
        let compositor = Compositor::new();
        // 1080 * 40 / 96 = 450, 2340 * 40 / 96 = 975
        assert_eq!(compositor.scaled_dimensions(1080, 2340), (450, 975));
        // 100 * 40 / 96 = 41.67 -> 42, 30 * 40 / 96 = 12.5 -> 13
        assert_eq!(compositor.scaled_dimensions(100, 30), (42, 13));
        assert_eq!(compositor.scaled_dimensions(1, 1), (1, 1));
    }

    #[test]
    fn test_strip_geometry_is_sum_of_widths_and_max_height() {
        let compositor = Compositor::new();
        let uploads = vec![
            png_bytes(240, 480, [200, 10, 10]),
            png_bytes(96, 192, [10, 200, 10]),
            png_bytes(480, 240, [10, 10, 200]),
        ];

        let strip = compositor.process(&uploads).unwrap();

        assert_eq!(strip.width, 100 + 40 + 200);
        assert_eq!(strip.height, 200);
        assert_eq!(strip.count, 3);

        let decoded = image::load_from_memory(&strip.jpeg).unwrap();
        assert_eq!(decoded.width(), strip.width);
        assert_eq!(decoded.height(), strip.height);
    }

    #[test]
    fn test_images_are_placed_left_to_right() {
        let compositor = Compositor::new();
        let uploads = vec![
            png_bytes(96, 96, [255, 0, 0]),
            png_bytes(96, 96, [0, 0, 255]),
        ];

        let strip = compositor.process(&uploads).unwrap();
        let decoded = image::load_from_memory(&strip.jpeg).unwrap().to_rgb8();

        let left = decoded.get_pixel(20, 20);
        let right = decoded.get_pixel(60, 20);
        assert!(left[0] > 180 && left[2] < 80, "left pixel {:?}", left);
        assert!(right[2] > 180 && right[0] < 80, "right pixel {:?}", right);
    }

    #[test]
    fn test_shorter_images_leave_white_background() {
        let compositor = Compositor::new();
        let uploads = vec![
            png_bytes(96, 480, [0, 0, 0]),
            png_bytes(96, 96, [0, 0, 0]),
        ];

        let strip = compositor.process(&uploads).unwrap();
        let decoded = image::load_from_memory(&strip.jpeg).unwrap().to_rgb8();

        let below_second = decoded.get_pixel(60, 150);
        assert!(below_second.0.iter().all(|c| *c > 200), "{:?}", below_second);
    }

    #[test]
    fn test_output_is_deterministic() {
        let compositor = Compositor::new();
        let uploads = vec![png_bytes(300, 200, [12, 34, 56]), png_bytes(150, 400, [200, 100, 0])];

        let first = compositor.process(&uploads).unwrap();
        let second = compositor.process(&uploads).unwrap();
        assert_eq!(first.jpeg, second.jpeg);
    }

    #[test]
    fn test_no_images_is_an_error() {
        let uploads: Vec<Vec<u8>> = Vec::new();
        assert!(Compositor::new().process(&uploads).is_err());
        assert!(Compositor::new().compose(&[]).is_err());
    }

    #[test]
    fn test_undecodable_image_fails_whole_strip() {
        let uploads = vec![png_bytes(96, 96, [0, 0, 0]), b"not an image".to_vec()];
        let err = Compositor::new().process(&uploads).unwrap_err();
        assert!(format!("{:#}", err).contains("Image 2"));
    }

    #[test]
    fn test_wide_and_tall_images_exceed_canvas_budget() {
        // Scales to 50000x3 and 3x50000, a 50003x50000 canvas
        let uploads = vec![png_bytes(120_000, 8, [0, 0, 0]), png_bytes(8, 120_000, [0, 0, 0])];
        let err = Compositor::new().process(&uploads).unwrap_err();
        assert!(format!("{:#}", err).contains("Strip too large"), "{:#}", err);
    }

    #[test]
    fn test_canvas_budget_is_inclusive() {
        let scaled = |w, h| ScaledImage {
            image: RgbaImage::new(w, h),
        };
        let compositor = Compositor::new().with_max_canvas_pixels(200);

        assert_eq!(
            compositor.canvas_dimensions(&[scaled(10, 20), scaled(0, 5)]).unwrap(),
            (10, 20)
        );
        assert!(compositor.canvas_dimensions(&[scaled(10, 20), scaled(1, 1)]).is_err());
    }

    #[test]
    fn test_data_uri_prefix() {
        let strip = Compositor::new()
            .process(&[png_bytes(96, 96, [1, 2, 3])])
            .unwrap();
        assert!(strip.to_data_uri().starts_with("data:image/jpeg;base64,/9j/"));
    }

    #[test]
    fn test_custom_scale() {
        let compositor = Compositor::new().with_scale(96.0, 96.0).with_quality(90);
        assert_eq!(compositor.scaled_dimensions(123, 45), (123, 45));
    }
}
