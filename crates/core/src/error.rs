//! Error types for framebuffer and palette operations

use thiserror::Error;

/// Errors surfaced by the indexed framebuffer stack.
///
/// Drawing itself never fails: out-of-range writes are clipped. These cover
/// resource interchange and the renderer seam.
#[derive(Debug, Error)]
pub enum RasterError {
    /// A palette table row could not be parsed
    #[error("palette line {line}: {reason}")]
    PaletteParse { line: usize, reason: String },

    /// Pixel data length does not match the declared image size
    #[error("image data has {actual} pixels, expected {expected} ({width}x{height})")]
    ImageSize {
        width: u32,
        height: u32,
        expected: usize,
        actual: usize,
    },

    /// The renderer rejected an index-plane or palette upload
    #[error("upload failed: {0}")]
    Upload(String),

    /// The renderer failed to present a surface
    #[error("render failed: {0}")]
    Render(String),
}

/// Result type for framebuffer operations
pub type Result<T> = std::result::Result<T, RasterError>;
