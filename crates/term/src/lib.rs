//! Terminal backend for indexed framebuffers.
//!
//! There is no GPU here: a [`Compositor`] plays the renderer's part. It keeps
//! one texture (index plane + palette) per presented framebuffer, re-uploads
//! only the planes a buffer marked dirty, and blends resolved colors onto an
//! RGB canvas. [`TerminalRenderer`] folds that canvas into half-block cells
//! (two pixels per cell) and emits only the cells that changed.

pub mod compositor;
pub mod fb;
pub mod renderer;

pub use indexed_raster_core as core;
pub use indexed_raster_types as types;

pub use compositor::{Compositor, Texture, UploadCounters};
pub use fb::{Cell, CellStyle, FrameBuffer, Rgb};
pub use renderer::{encode_frame, FlushStats, TerminalRenderer};
