//! Shared test utilities: synthetic images and encoded fixtures.
//!
//! Everything is generated in memory and deterministic, so tests never depend
//! on binary fixture files and two runs always see the same bytes.

use image::codecs::jpeg::JpegEncoder;
use image::{DynamicImage, ImageFormat, Rgb, RgbImage};
use std::io::Cursor;

/// Low-detail image: smooth gradients compress very well.
pub fn smooth_rgb(width: u32, height: u32) -> DynamicImage {
    DynamicImage::ImageRgb8(RgbImage::from_fn(width, height, |x, y| {
        Rgb([
            (x * 255 / width.max(1)) as u8,
            (y * 255 / height.max(1)) as u8,
            128,
        ])
    }))
}

/// High-entropy image: per-pixel pseudo-random noise from a seeded LCG.
pub fn noise_rgb(width: u32, height: u32, seed: u32) -> DynamicImage {
    let mut state = seed.wrapping_mul(2_654_435_761).wrapping_add(1);
    DynamicImage::ImageRgb8(RgbImage::from_fn(width, height, |_, _| {
        let mut next = || {
            state = state.wrapping_mul(1_664_525).wrapping_add(1_013_904_223);
            (state >> 24) as u8
        };
        Rgb([next(), next(), next()])
    }))
}

/// Encode with the format's default settings.
pub fn encode_fixture(img: &DynamicImage, format: ImageFormat) -> Vec<u8> {
    let mut buf = Vec::new();
    img.write_to(&mut Cursor::new(&mut buf), format).unwrap();
    buf
}

/// Encode as JPEG at an explicit quality.
pub fn jpeg_fixture(img: &DynamicImage, quality: u8) -> Vec<u8> {
    let mut buf = Vec::new();
    let encoder = JpegEncoder::new_with_quality(&mut buf, quality);
    img.write_with_encoder(encoder).unwrap();
    buf
}

#[test]
fn noise_is_deterministic() {
    assert_eq!(noise_rgb(8, 8, 1).as_bytes(), noise_rgb(8, 8, 1).as_bytes());
    assert_ne!(noise_rgb(8, 8, 1).as_bytes(), noise_rgb(8, 8, 2).as_bytes());
}
