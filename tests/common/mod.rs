//! Fixtures for integration tests, generated in memory.
//!
//! The generic fixtures are the crate's own unit-test helpers, compiled in
//! here so both suites share one definition.

#![allow(dead_code)]

#[path = "../../src/test_helpers.rs"]
mod helpers;

pub use helpers::{encode_fixture, jpeg_fixture, noise_rgb, smooth_rgb};

use image::{DynamicImage, Rgb, RgbImage, Rgba, RgbaImage};

/// Gradient with a few soft bands: photo-like, compresses well.
pub fn photo_like(width: u32, height: u32) -> DynamicImage {
    DynamicImage::ImageRgb8(RgbImage::from_fn(width, height, |x, y| {
        let band = ((x / 64 + y / 48) % 2) as u8 * 24;
        Rgb([
            (x * 200 / width) as u8 + band,
            (y * 200 / height) as u8 + band,
            96 + band,
        ])
    }))
}

/// [`photo_like`] with per-pixel grain on top: what a camera sensor hands
/// over. Large versions of this are expensive to store as-is.
pub fn detailed_photo(width: u32, height: u32, seed: u32) -> DynamicImage {
    let base = photo_like(width, height).into_rgb8();
    let grain = noise_rgb(width, height, seed).into_rgb8();
    DynamicImage::ImageRgb8(RgbImage::from_fn(width, height, |x, y| {
        let b = base.get_pixel(x, y).0;
        let g = grain.get_pixel(x, y).0;
        Rgb(std::array::from_fn(|c| {
            (i16::from(b[c]) + i16::from(g[c] >> 2) - 32).clamp(0, 255) as u8
        }))
    }))
}

/// Four flat opaque colours, no alpha.
pub fn flat_banner(width: u32, height: u32) -> DynamicImage {
    DynamicImage::ImageRgb8(RgbImage::from_fn(width, height, |x, y| {
        match (x < width / 2, y < height / 2) {
            (true, true) => Rgb([200, 60, 40]),
            (false, true) => Rgb([40, 160, 60]),
            (true, false) => Rgb([30, 60, 190]),
            (false, false) => Rgb([230, 230, 220]),
        }
    }))
}

/// Four flat colours with a transparent quadrant.
pub fn flat_logo(width: u32, height: u32) -> DynamicImage {
    DynamicImage::ImageRgba8(RgbaImage::from_fn(width, height, |x, y| {
        match (x < width / 2, y < height / 2) {
            (true, true) => Rgba([220, 40, 40, 255]),
            (false, true) => Rgba([40, 220, 40, 255]),
            (true, false) => Rgba([40, 40, 220, 255]),
            (false, false) => Rgba([0, 0, 0, 0]),
        }
    }))
}
