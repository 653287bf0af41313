//! Core types and geometry for the teravox streaming cache.
//!
//! This crate provides the vocabulary shared by every other crate:
//! - Cache and block geometry descriptors
//! - Content-addressed block keys
//! - Voxel formats and content states
//! - Half-space / convex-polytope math for exact overlap testing

pub mod error;
pub mod key;
pub mod polytope;
pub mod spec;
pub mod types;

pub use error::{Error, Result};
pub use key::{BlockKey, ImageId};
pub use polytope::{ConvexPolytope, HalfSpace};
pub use spec::CacheSpec;
pub use types::{ContentState, LevelInfo, VoxelFormat};
