//! 3D mesh pipeline on top of the indexed framebuffer.
//!
//! # Module Structure
//!
//! - [`mesh`]: vertices, normals and colored polygons, plus cube / pyramid / sphere factories
//! - [`transform`]: Euler rotation and perspective projection, FOV <-> focal length
//! - [`lighting`]: intensity bands and the base-color band table
//! - [`anchor`]: weak links from a mesh to a sprite-like target
//! - [`renderable`]: [`MeshRenderable`], the per-frame transform / cull / shade / raster pass
//!
//! # Example
//!
//! ```
//! use indexed_raster_mesh::{Mesh, MeshRenderable};
//! use indexed_raster_mesh::core::IndexedFramebuffer;
//! use indexed_raster_mesh::types::{Vec2, Vec3};
//!
//! let mut cube = MeshRenderable::new(Mesh::cube(40.0))
//!     .with_position(Vec2::new(80.0, 60.0))
//!     .with_rotation(Vec3::new(0.5, 0.6, 0.0));
//!
//! let mut fb = IndexedFramebuffer::new(160, 120);
//! let stats = cube.render_to_buffer(&mut fb);
//! assert_eq!(stats.drawn, 3);
//! ```

pub mod anchor;
pub mod error;
pub mod lighting;
pub mod mesh;
pub mod renderable;
pub mod transform;

pub use indexed_raster_core as core;
pub use indexed_raster_types as types;

pub use anchor::{AnchorMode, AnchorResolution, AnchorTarget, MeshAnchor, SpriteFrame};
pub use error::{MeshError, Result};
pub use lighting::{Band, BandTable, ShadeBands};
pub use mesh::{Mesh, Polygon};
pub use renderable::{Extent, MeshRenderable, RenderMode, RenderStats};
pub use transform::{focal_length_for_fov, fov_for_focal_length, EulerRotation, Projection};
