//! Crate-level error types, one per fallible subsystem boundary.
//!
//! Plain enums with hand-written `Display`/`Error` impls, matching the
//! teacher's `io::PfeError` — no `thiserror`. Internal numeric
//! preconditions (e.g. intensity > 0 after clamp) are `debug_assert!`s, not
//! values of these types: violating them is a programming error, not an
//! input error (spec.md §7).

use std::fmt;

/// Errors from decoding or encoding an image file.
#[derive(Debug)]
pub enum ImageIoError {
    Io(std::io::Error),
    Decode(image::ImageError),
    EmptyImage,
}

impl fmt::Display for ImageIoError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ImageIoError::Io(e) => write!(f, "I/O error: {e}"),
            ImageIoError::Decode(e) => write!(f, "image decode/encode error: {e}"),
            ImageIoError::EmptyImage => write!(f, "image has zero width or height"),
        }
    }
}

impl std::error::Error for ImageIoError {}

impl From<std::io::Error> for ImageIoError {
    fn from(e: std::io::Error) -> Self {
        ImageIoError::Io(e)
    }
}

impl From<image::ImageError> for ImageIoError {
    fn from(e: image::ImageError) -> Self {
        ImageIoError::Decode(e)
    }
}

/// Errors from the separator's top-level entry point.
#[derive(Debug)]
pub enum SeparatorError {
    /// Image is narrower or shorter than the configured region scale.
    ImageSmallerThanRegion { width: u32, height: u32, region: u32 },
}

impl fmt::Display for SeparatorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SeparatorError::ImageSmallerThanRegion { width, height, region } => write!(
                f,
                "image ({width}x{height}) is smaller than the region scale ({region})"
            ),
        }
    }
}

impl std::error::Error for SeparatorError {}
