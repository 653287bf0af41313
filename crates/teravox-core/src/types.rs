//! Voxel formats, block content state, and resolution-level metadata.

use glam::{DMat4, DVec3, UVec3};
use serde::{Deserialize, Serialize};

/// Texel format of one voxel inside a cache tile.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum VoxelFormat {
    /// Unsigned 8-bit intensity
    U8,
    /// Unsigned 16-bit intensity (the common case for microscopy volumes)
    #[default]
    U16,
    /// 32-bit float intensity
    F32,
}

impl VoxelFormat {
    /// Size of one voxel in bytes.
    #[inline]
    pub const fn bytes_per_voxel(self) -> usize {
        match self {
            Self::U8 => 1,
            Self::U16 => 2,
            Self::F32 => 4,
        }
    }
}

/// Whether a block's data fully represents its source (`Complete`) or was only
/// partially available when it was filled (`Incomplete`).
///
/// Incomplete blocks are not errors; they are re-requested on a later pass.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum ContentState {
    /// Some source data was missing when the block was filled
    #[default]
    Incomplete,
    /// The block holds everything its source has for it
    Complete,
}

impl ContentState {
    /// Returns true if the state is [`ContentState::Complete`].
    #[inline]
    pub const fn is_complete(self) -> bool {
        matches!(self, Self::Complete)
    }
}

/// Geometry of one resolution level of an image pyramid.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct LevelInfo {
    /// Image size in voxels at this level
    pub dims: UVec3,
    /// Per-axis subsampling factors relative to full resolution
    pub factors: DVec3,
    /// Maps this level's voxel coordinates into full-resolution voxel coordinates
    pub transform: DMat4,
}

impl LevelInfo {
    /// Full-resolution level: identity transform, unit factors.
    pub fn full_resolution(dims: UVec3) -> Self {
        Self {
            dims,
            factors: DVec3::ONE,
            transform: DMat4::IDENTITY,
        }
    }

    /// Level subsampled by `factors`, with the transform that maps a level
    /// voxel's centre onto the centre of the full-resolution region it covers.
    pub fn subsampled(dims: UVec3, factors: DVec3) -> Self {
        let transform = DMat4::from_translation((factors - DVec3::ONE) * 0.5)
            * DMat4::from_scale(factors);
        Self {
            dims,
            factors,
            transform,
        }
    }

    /// Number of blocks per axis needed to tile this level.
    #[inline]
    pub fn grid_dims(&self, block_size: UVec3) -> UVec3 {
        UVec3::new(
            self.dims.x.div_ceil(block_size.x),
            self.dims.y.div_ceil(block_size.y),
            self.dims.z.div_ceil(block_size.z),
        )
    }
}
