//! Indexed-color raster toolkit (workspace facade crate).
//!
//! Re-exports the member crates under short names so callers can write
//! `indexed_raster::core::IndexedFramebuffer` or `indexed_raster::mesh::Mesh`.
//! The demo binary's configuration lives in [`config`].

pub mod config;

pub use indexed_raster_core as core;
pub use indexed_raster_mesh as mesh;
pub use indexed_raster_term as term;
pub use indexed_raster_types as types;
