//! Exact enumeration of the grid blocks a clip region touches.
//!
//! The clip region is a [`ConvexPolytope`] in level voxel coordinates. Every
//! block whose voxel extent overlaps the region is reported; a block that
//! merely grazes a bounding plane (zero-volume contact) is not. Enumeration
//! walks the full block grid, which keeps the result exact for arbitrarily
//! oblique regions at the cost of O(grid volume) plane tests.

use glam::{DMat4, DVec2, DVec3, IVec3, UVec3};
use teravox_core::ConvexPolytope;

/// Block positions collected by one visibility query.
///
/// Tracks the bounding box of the inserted positions incrementally so callers
/// can size follow-up work without a second pass.
#[derive(Clone, Debug)]
pub struct RequiredBlocks {
    positions: Vec<IVec3>,
    min: IVec3,
    max: IVec3,
}

impl RequiredBlocks {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            positions: Vec::new(),
            min: IVec3::MAX,
            max: IVec3::MIN,
        }
    }

    pub fn insert(&mut self, pos: IVec3) {
        self.min = self.min.min(pos);
        self.max = self.max.max(pos);
        self.positions.push(pos);
    }

    #[must_use]
    pub fn positions(&self) -> &[IVec3] {
        &self.positions
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.positions.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    /// Componentwise bounds of the collected positions, or `None` when empty.
    #[must_use]
    pub fn bounds(&self) -> Option<(IVec3, IVec3)> {
        if self.positions.is_empty() {
            None
        } else {
            Some((self.min, self.max))
        }
    }
}

impl Default for RequiredBlocks {
    fn default() -> Self {
        Self::new()
    }
}

/// Enumerates every block of a `grid_dims` block grid whose extent overlaps
/// `clip`.
///
/// `clip` is given in level voxel coordinates, where voxel centres sit on
/// integer positions. A block at grid position `b` covers the voxel-space box
/// `[b * block_size - 0.5, (b + 1) * block_size - 0.5]`. Overlap is decided
/// exactly by dilating every bounding plane of `clip` by the extremal block
/// corner and testing block origins against the dilated region in grid units.
#[must_use]
#[allow(clippy::cast_possible_wrap)]
pub fn required_blocks(
    clip: &ConvexPolytope,
    block_size: UVec3,
    grid_dims: UVec3,
) -> RequiredBlocks {
    let extent = block_size.as_dvec3();
    let grid_clip = clip
        .dilated(DVec3::splat(-0.5), extent - 0.5)
        .rescaled(extent);

    let mut required = RequiredBlocks::new();
    for z in 0..grid_dims.z {
        for y in 0..grid_dims.y {
            for x in 0..grid_dims.x {
                let origin = DVec3::new(f64::from(x), f64::from(y), f64::from(z));
                if grid_clip.strictly_contains(origin) {
                    required.insert(IVec3::new(x as i32, y as i32, z as i32));
                }
            }
        }
    }
    required
}

/// Enumerates the blocks visible inside a screen box of `screen_size` pixels
/// and `depth_range` depth units.
///
/// `source_to_screen` maps level voxel coordinates to screen coordinates; it
/// is pulled back onto the source so the enumeration itself runs in voxel
/// space. Valid for transforms that keep the source on the positive side of
/// the projection.
#[must_use]
pub fn required_blocks_for_screen(
    source_to_screen: &DMat4,
    screen_size: DVec2,
    depth_range: f64,
    block_size: UVec3,
    grid_dims: UVec3,
) -> RequiredBlocks {
    let screen_box = ConvexPolytope::aabb(
        DVec3::ZERO,
        DVec3::new(screen_size.x, screen_size.y, depth_range),
    );
    required_blocks(&screen_box.preimage(source_to_screen), block_size, grid_dims)
}
