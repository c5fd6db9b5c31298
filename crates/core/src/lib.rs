//! Indexed framebuffer core - pure, deterministic, and testable
//!
//! This crate owns the pixel side of the rasterizer. It has **no dependency**
//! on a windowing system or GPU API; renderers plug in through the traits in
//! [`render`].
//!
//! # Module Structure
//!
//! - [`framebuffer`]: width x height plane of palette indices with drawing primitives
//! - [`palette`]: 256-entry palette resource, built-ins and the text interchange format
//! - [`quantize`]: median-cut palette fitting and nearest-color lookup
//! - [`image`]: pre-decoded RGBA images handed over by asset loaders
//! - [`render`]: renderer seams (`TextureUploader`, `RenderContext`, `Attachable`) and `Layer`
//!
//! # Dirty Tracking
//!
//! A framebuffer keeps two independent flags:
//!
//! - **pixels dirty**: set by every successful pixel write, cleared by an index-plane upload
//! - **palette dirty**: set by every palette mutation, cleared by a palette upload
//!
//! Palette-only effects therefore re-upload 256 colors instead of the full plane.
//!
//! # Example
//!
//! ```
//! use indexed_raster_core::IndexedFramebuffer;
//! use indexed_raster_core::types::Color;
//!
//! let mut fb = IndexedFramebuffer::new(8, 8);
//! fb.clear(0);
//! fb.draw_line(0, 0, 4, 0, 5);
//! fb.set_palette_entry(5, Color::rgb(255, 0, 0));
//!
//! assert_eq!(fb.get_pixel(4, 0), 5);
//! assert_eq!(fb.get_pixel(5, 0), 0);
//! assert!(fb.pixels_dirty() && fb.palette_dirty());
//! ```

pub mod error;
pub mod framebuffer;
pub mod image;
pub mod palette;
pub mod quantize;
pub mod render;

pub use indexed_raster_types as types;

pub use error::{RasterError, Result};
pub use framebuffer::{BufferId, IndexedFramebuffer, PaletteFit};
pub use image::PixelImage;
pub use palette::Palette;
pub use quantize::{median_cut, nearest_index, Quantized};
pub use render::{Attachable, AttachableRef, Layer, RenderContext, TextureUploader, UploadReport};
