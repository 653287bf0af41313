//! View-dependent queries over block pyramids: which blocks does the current
//! view require, and at which resolution level.

pub mod lod;
pub mod visibility;

pub use lod::LodSelector;
pub use visibility::{required_blocks, required_blocks_for_screen, RequiredBlocks};
