//! Thin wrapper around the `image` crate: decode to row-major float buffers
//! in `[0, 1]`, encode back to 8-bit.
//!
//! Grounded on `io.rs`'s `load_image_sync`/`encode_and_write`: format is
//! always inferred from the output path's extension, and every operation
//! returns a typed [`ImageIoError`] instead of a bare `String`. Unlike the
//! teacher, there's no project-file format or animation support here — the
//! separator pipeline only ever reads/writes single still frames.

use std::path::Path;

use image::{DynamicImage, ImageBuffer, Luma, Rgb as ImageRgb};

use crate::error::ImageIoError;
use crate::pixelmath::Rgb;

/// Decodes any `image`-supported format into row-major RGB in `[0, 1]`.
/// Alpha, if present, is dropped — this system has no notion of transparency.
pub fn read_rgb_f32(path: &Path) -> Result<(Vec<Rgb>, u32, u32), ImageIoError> {
    let img = image::open(path)?;
    let width = img.width();
    let height = img.height();
    if width == 0 || height == 0 {
        return Err(ImageIoError::EmptyImage);
    }
    let rgb8 = img.to_rgb8();
    let pixels = rgb8
        .pixels()
        .map(|p| [p[0] as f32 / 255.0, p[1] as f32 / 255.0, p[2] as f32 / 255.0])
        .collect();
    Ok((pixels, width, height))
}

/// Decodes into a single-channel grayscale buffer in `[0, 1]`, for reading
/// back a shading map as input to [`crate::normals`].
pub fn read_gray_f32(path: &Path) -> Result<(Vec<f32>, u32, u32), ImageIoError> {
    let img = image::open(path)?;
    let width = img.width();
    let height = img.height();
    if width == 0 || height == 0 {
        return Err(ImageIoError::EmptyImage);
    }
    let gray8 = img.to_luma8();
    let pixels = gray8.pixels().map(|p| p[0] as f32 / 255.0).collect();
    Ok((pixels, width, height))
}

/// Quantizes `[0, 1]` RGB pixels to 8-bit and writes them, inferring the
/// codec from `path`'s extension (defaults to PNG for an unrecognized one,
/// same as `io.rs`'s `parse_format`).
pub fn write_rgb_f32(pixels: &[Rgb], width: u32, height: u32, path: &Path) -> Result<(), ImageIoError> {
    let mut buf: ImageBuffer<ImageRgb<u8>, Vec<u8>> = ImageBuffer::new(width, height);
    for (dst, &src) in buf.pixels_mut().zip(pixels.iter()) {
        *dst = ImageRgb([
            quantize(src[0]),
            quantize(src[1]),
            quantize(src[2]),
        ]);
    }
    DynamicImage::ImageRgb8(buf).save(path)?;
    Ok(())
}

/// Quantizes a `[0, 1]` scalar field to 8-bit grayscale and writes it.
pub fn write_gray_f32(pixels: &[f32], width: u32, height: u32, path: &Path) -> Result<(), ImageIoError> {
    let mut buf: ImageBuffer<Luma<u8>, Vec<u8>> = ImageBuffer::new(width, height);
    for (dst, &src) in buf.pixels_mut().zip(pixels.iter()) {
        *dst = Luma([quantize(src)]);
    }
    DynamicImage::ImageLuma8(buf).save(path)?;
    Ok(())
}

fn quantize(v: f32) -> u8 {
    (v.clamp(0.0, 1.0) * 255.0).round() as u8
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quantize_clamps_out_of_range() {
        assert_eq!(quantize(-1.0), 0);
        assert_eq!(quantize(2.0), 255);
    }

    #[test]
    fn quantize_rounds_midpoints() {
        assert_eq!(quantize(0.0), 0);
        assert_eq!(quantize(1.0), 255);
        assert_eq!(quantize(0.5), 128);
    }

    #[test]
    fn roundtrip_rgb_through_tempfile() {
        let dir = std::env::temp_dir();
        let path = dir.join("shading_separator_test_rgb.png");
        let pixels = vec![[0.0, 0.5, 1.0], [1.0, 0.0, 0.5]];
        write_rgb_f32(&pixels, 2, 1, &path).unwrap();
        let (read_back, w, h) = read_rgb_f32(&path).unwrap();
        assert_eq!((w, h), (2, 1));
        assert_eq!(read_back.len(), 2);
        assert!((read_back[0][1] - 0.5).abs() < 0.01);
        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn empty_image_path_errors_without_touching_disk() {
        let result = read_rgb_f32(Path::new("/nonexistent/path/does_not_exist.png"));
        assert!(result.is_err());
    }
}
