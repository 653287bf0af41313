//! The interface a resolution pyramid offers to the streaming cache.

use glam::IVec3;
use teravox_core::{CacheSpec, ContentState, LevelInfo, VoxelFormat};

/// A multi-resolution volumetric image that can copy out padded blocks.
///
/// Implementations must be callable from the parallel fill pool, hence the
/// `Send + Sync` bound. A fill that cannot deliver every voxel yet (data still
/// on disk, still inflight) writes what it has and returns
/// [`ContentState::Incomplete`]; the block is requested again on a later pass.
pub trait PyramidSource: Send + Sync {
    /// Voxel format delivered by [`Self::fill_block`].
    fn format(&self) -> VoxelFormat;

    /// Number of resolution levels; level 0 is full resolution.
    fn num_levels(&self) -> usize;

    /// Geometry of one resolution level.
    fn level(&self, level: usize) -> LevelInfo;

    /// Copy the padded block at grid position `block_pos` of `level` into
    /// `dst`, whose length must be `spec.tile_bytes()`. Voxels outside the
    /// image are clamped to the nearest edge voxel.
    fn fill_block(
        &self,
        level: usize,
        block_pos: IVec3,
        spec: &CacheSpec,
        dst: &mut [u8],
    ) -> ContentState;

    /// All level geometries, finest first.
    fn levels(&self) -> Vec<LevelInfo> {
        (0..self.num_levels()).map(|l| self.level(l)).collect()
    }
}
