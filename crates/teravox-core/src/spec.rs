//! Immutable geometry/format descriptor shared by every cache component.

use glam::{IVec3, UVec3};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::types::VoxelFormat;

/// Block and tile geometry of one cache: block size, padded block size, pad
/// offset, and voxel format.
///
/// Validated once at construction and never mutated; every component that
/// needs the geometry holds its own copy.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheSpec {
    block_size: UVec3,
    padded_block_size: UVec3,
    pad_offset: IVec3,
    format: VoxelFormat,
}

impl CacheSpec {
    /// Create a spec with explicit padding geometry.
    ///
    /// Fails if any block axis is zero or if the padded size is smaller than
    /// the block size on any axis.
    pub fn new(
        block_size: UVec3,
        padded_block_size: UVec3,
        pad_offset: IVec3,
        format: VoxelFormat,
    ) -> Result<Self> {
        if block_size.min_element() == 0 {
            return Err(Error::InvalidSpec(format!(
                "block size must be positive on every axis, got {block_size}"
            )));
        }
        if padded_block_size.x < block_size.x
            || padded_block_size.y < block_size.y
            || padded_block_size.z < block_size.z
        {
            return Err(Error::InvalidSpec(format!(
                "padded block size {padded_block_size} smaller than block size {block_size}"
            )));
        }
        Ok(Self {
            block_size,
            padded_block_size,
            pad_offset,
            format,
        })
    }

    /// The usual interpolation padding: one voxel of border on every side.
    pub fn with_interpolation_padding(block_size: UVec3, format: VoxelFormat) -> Result<Self> {
        Self::new(
            block_size,
            block_size + UVec3::splat(2),
            IVec3::ONE,
            format,
        )
    }

    /// Core voxels of one block, per axis.
    #[inline]
    pub const fn block_size(&self) -> UVec3 {
        self.block_size
    }

    /// Stored voxels of one block including the interpolation border, per axis.
    #[inline]
    pub const fn padded_block_size(&self) -> UVec3 {
        self.padded_block_size
    }

    /// Offset of the block origin inside its padded extent.
    #[inline]
    pub const fn pad_offset(&self) -> IVec3 {
        self.pad_offset
    }

    /// Voxel format stored in the tiles.
    #[inline]
    pub const fn format(&self) -> VoxelFormat {
        self.format
    }

    /// Voxels in one padded block.
    #[inline]
    pub fn voxels_per_tile(&self) -> usize {
        self.padded_block_size.x as usize
            * self.padded_block_size.y as usize
            * self.padded_block_size.z as usize
    }

    /// Bytes occupied by one padded block.
    #[inline]
    pub fn tile_bytes(&self) -> usize {
        self.voxels_per_tile() * self.format.bytes_per_voxel()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn interpolation_padding_adds_one_voxel_border() {
        let spec =
            CacheSpec::with_interpolation_padding(UVec3::splat(32), VoxelFormat::U16).unwrap();
        assert_eq!(spec.block_size(), UVec3::splat(32));
        assert_eq!(spec.padded_block_size(), UVec3::splat(34));
        assert_eq!(spec.pad_offset(), IVec3::ONE);
    }

    #[test]
    fn tile_bytes_counts_padding() {
        let spec =
            CacheSpec::with_interpolation_padding(UVec3::splat(16), VoxelFormat::U16).unwrap();
        assert_eq!(spec.voxels_per_tile(), 18 * 18 * 18);
        assert_eq!(spec.tile_bytes(), 18 * 18 * 18 * 2);
    }

    #[test]
    fn padded_size_must_cover_block() {
        let result = CacheSpec::new(
            UVec3::splat(32),
            UVec3::new(34, 31, 34),
            IVec3::ONE,
            VoxelFormat::U8,
        );
        assert!(result.is_err());
    }

    #[test]
    fn zero_block_axis_rejected() {
        let result = CacheSpec::new(
            UVec3::new(32, 0, 32),
            UVec3::splat(34),
            IVec3::ONE,
            VoxelFormat::U8,
        );
        assert!(result.is_err());
    }

    #[test]
    fn unpadded_spec_is_allowed() {
        let spec = CacheSpec::new(
            UVec3::splat(8),
            UVec3::splat(8),
            IVec3::ZERO,
            VoxelFormat::F32,
        )
        .unwrap();
        assert_eq!(spec.tile_bytes(), 8 * 8 * 8 * 4);
    }
}
