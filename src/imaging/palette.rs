//! PNG output with maximum compression effort and palette quantization.
//!
//! Every PNG encode produces two candidates and keeps the smaller:
//!
//! 1. **Truecolour**: `CompressionType::Best` + adaptive filtering.
//! 2. **Indexed**: an 8-bit palette PNG. Images with ≤ 256 distinct RGBA
//!    colours get an exact (lossless) palette; anything richer is quantized
//!    to 256 colours with NeuQuant.
//!
//! Quality plays no part here: the same pixels always yield the same bytes.

use super::codec::CodecError;
use color_quant::NeuQuant;
use image::codecs::png::{CompressionType, FilterType, PngEncoder};
use image::{DynamicImage, RgbaImage};
use std::collections::HashMap;

const MAX_PALETTE: usize = 256;

/// NeuQuant sampling factor: 1 is slowest/best, 30 fastest. 10 is the
/// reference implementation's default.
const NEUQUANT_SAMPLE: i32 = 10;

/// An 8-bit palette plus one index per pixel.
struct Indexed {
    /// RGBA entries, at most 256.
    palette: Vec<[u8; 4]>,
    indices: Vec<u8>,
}

/// Encode as the smaller of a truecolour and an indexed PNG.
pub(crate) fn encode_png(pixels: &DynamicImage) -> Result<Vec<u8>, CodecError> {
    let truecolor = encode_truecolor(pixels)?;

    let rgba = pixels.to_rgba8();
    let indexed = exact_palette(&rgba).unwrap_or_else(|| quantized_palette(&rgba));
    let paletted = write_indexed(rgba.width(), rgba.height(), &indexed)?;

    tracing::trace!(
        truecolor = truecolor.len(),
        paletted = paletted.len(),
        colors = indexed.palette.len(),
        "png candidates"
    );

    Ok(if paletted.len() < truecolor.len() {
        paletted
    } else {
        truecolor
    })
}

fn encode_truecolor(pixels: &DynamicImage) -> Result<Vec<u8>, CodecError> {
    // PNG has no float channels; 8-bit keeps the encoder happy for every input.
    let normalized = if pixels.color().has_alpha() {
        DynamicImage::ImageRgba8(pixels.to_rgba8())
    } else {
        DynamicImage::ImageRgb8(pixels.to_rgb8())
    };

    let mut out = Vec::new();
    let encoder =
        PngEncoder::new_with_quality(&mut out, CompressionType::Best, FilterType::Adaptive);
    normalized
        .write_with_encoder(encoder)
        .map_err(|e| CodecError::Encode(format!("PNG encode failed: {e}")))?;
    Ok(out)
}

/// Lossless palette, or `None` when the image has more than 256 colours.
fn exact_palette(rgba: &RgbaImage) -> Option<Indexed> {
    let mut lookup: HashMap<[u8; 4], u8> = HashMap::new();
    let mut palette: Vec<[u8; 4]> = Vec::new();
    let mut indices = Vec::with_capacity((rgba.width() * rgba.height()) as usize);

    for px in rgba.pixels() {
        let idx = match lookup.get(&px.0) {
            Some(&idx) => idx,
            None => {
                if palette.len() >= MAX_PALETTE {
                    return None;
                }
                let next = palette.len() as u8;
                palette.push(px.0);
                lookup.insert(px.0, next);
                next
            }
        };
        indices.push(idx);
    }

    Some(Indexed { palette, indices })
}

/// Lossy 256-colour palette via NeuQuant.
fn quantized_palette(rgba: &RgbaImage) -> Indexed {
    let quant = NeuQuant::new(NEUQUANT_SAMPLE, MAX_PALETTE, rgba.as_raw());
    let palette = quant
        .color_map_rgba()
        .chunks_exact(4)
        .map(|c| [c[0], c[1], c[2], c[3]])
        .collect();
    let indices = rgba
        .as_raw()
        .chunks_exact(4)
        .map(|px| quant.index_of(px) as u8)
        .collect();
    Indexed { palette, indices }
}

fn write_indexed(width: u32, height: u32, indexed: &Indexed) -> Result<Vec<u8>, CodecError> {
    let map_err = |e: png::EncodingError| CodecError::Encode(format!("PNG encode failed: {e}"));

    let mut rgb = Vec::with_capacity(indexed.palette.len() * 3);
    let mut trns = Vec::with_capacity(indexed.palette.len());
    let mut last_non_opaque = None;
    for (i, color) in indexed.palette.iter().enumerate() {
        rgb.extend_from_slice(&color[..3]);
        trns.push(color[3]);
        if color[3] != u8::MAX {
            last_non_opaque = Some(i);
        }
    }

    let mut out = Vec::new();
    {
        let mut encoder = png::Encoder::new(&mut out, width, height);
        encoder.set_color(png::ColorType::Indexed);
        encoder.set_depth(png::BitDepth::Eight);
        encoder.set_compression(png::Compression::Best);
        encoder.set_filter(png::FilterType::NoFilter);
        encoder.set_palette(rgb);
        // tRNS only needs entries up to the last translucent one
        if let Some(last) = last_non_opaque {
            trns.truncate(last + 1);
            encoder.set_trns(trns);
        }

        let mut writer = encoder.write_header().map_err(map_err)?;
        writer.write_image_data(&indexed.indices).map_err(map_err)?;
        writer.finish().map_err(map_err)?;
    }
    Ok(out)
}
