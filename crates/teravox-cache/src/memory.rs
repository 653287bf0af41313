//! In-memory backend: a plain byte array standing in for the GPU texture.
//!
//! Used by the headless driver and the tests; transfers are bookkept so tests
//! can check how many commands a batch produced.

use glam::UVec3;
use teravox_core::CacheSpec;

use crate::backend::{StagingBuffer, TileTexture};

/// Heap-backed staging buffer with explicit map/unmap bookkeeping.
#[derive(Debug)]
pub struct MemoryStaging {
    data: Vec<u8>,
    mapped: bool,
}

impl MemoryStaging {
    pub fn new(len: usize) -> Self {
        Self {
            data: vec![0; len],
            mapped: false,
        }
    }
}

impl StagingBuffer for MemoryStaging {
    fn len(&self) -> usize {
        self.data.len()
    }

    fn is_mapped(&self) -> bool {
        self.mapped
    }

    fn map(&mut self) -> &mut [u8] {
        assert!(!self.mapped, "staging buffer is already mapped");
        self.mapped = true;
        &mut self.data
    }

    fn unmap(&mut self) {
        assert!(self.mapped, "staging buffer is not mapped");
        self.mapped = false;
    }

    fn bytes(&self) -> &[u8] {
        &self.data
    }
}

/// Tile texture stored as one linear voxel array, x fastest, then y, then z.
#[derive(Debug)]
pub struct MemoryTileTexture {
    padded: UVec3,
    tile_grid: UVec3,
    dims: UVec3,
    tile_bytes: usize,
    bytes_per_voxel: usize,
    texels: Vec<u8>,
    transfers: u64,
    tiles_received: u64,
}

impl MemoryTileTexture {
    pub fn new(spec: &CacheSpec, tile_grid: UVec3) -> Self {
        let padded = spec.padded_block_size();
        let dims = tile_grid * padded;
        let bytes_per_voxel = spec.format().bytes_per_voxel();
        let len = dims.x as usize * dims.y as usize * dims.z as usize * bytes_per_voxel;
        Self {
            padded,
            tile_grid,
            dims,
            tile_bytes: spec.tile_bytes(),
            bytes_per_voxel,
            texels: vec![0; len],
            transfers: 0,
            tiles_received: 0,
        }
    }

    /// Transfer commands issued so far.
    #[inline]
    pub const fn transfer_count(&self) -> u64 {
        self.transfers
    }

    /// Tiles written so far, across all transfers.
    #[inline]
    pub const fn tiles_received(&self) -> u64 {
        self.tiles_received
    }

    fn voxel_offset(&self, v: UVec3) -> usize {
        ((v.z as usize * self.dims.y as usize + v.y as usize) * self.dims.x as usize
            + v.x as usize)
            * self.bytes_per_voxel
    }

    fn copy_tile(&mut self, src: &[u8], tile: UVec3) {
        let origin = tile * self.padded;
        let row = self.padded.x as usize * self.bytes_per_voxel;
        for z in 0..self.padded.z {
            for y in 0..self.padded.y {
                let src_at = (z as usize * self.padded.y as usize + y as usize) * row;
                let dst_at = self.voxel_offset(origin + UVec3::new(0, y, z));
                self.texels[dst_at..dst_at + row].copy_from_slice(&src[src_at..src_at + row]);
            }
        }
    }

    /// Reads back one tile's padded block, in the staging byte layout.
    pub fn read_tile(&self, tile: UVec3) -> Vec<u8> {
        assert!(
            tile.x < self.tile_grid.x && tile.y < self.tile_grid.y && tile.z < self.tile_grid.z,
            "tile {tile} outside the grid {}",
            self.tile_grid
        );
        let origin = tile * self.padded;
        let row = self.padded.x as usize * self.bytes_per_voxel;
        let mut out = vec![0; self.tile_bytes];
        for z in 0..self.padded.z {
            for y in 0..self.padded.y {
                let dst_at = (z as usize * self.padded.y as usize + y as usize) * row;
                let src_at = self.voxel_offset(origin + UVec3::new(0, y, z));
                out[dst_at..dst_at + row].copy_from_slice(&self.texels[src_at..src_at + row]);
            }
        }
        out
    }
}

impl TileTexture for MemoryTileTexture {
    type Staging = MemoryStaging;

    fn dims(&self) -> UVec3 {
        self.dims
    }

    fn create_staging(&self, len: usize) -> MemoryStaging {
        MemoryStaging::new(len)
    }

    fn upload_tiles(
        &mut self,
        staging: &MemoryStaging,
        byte_offset: usize,
        first_tile: UVec3,
        tile_count: u32,
    ) {
        assert!(!staging.is_mapped(), "staging buffer must be unmapped before upload");
        assert!(
            first_tile.x + tile_count <= self.tile_grid.x
                && first_tile.y < self.tile_grid.y
                && first_tile.z < self.tile_grid.z,
            "tile run {first_tile}+{tile_count} leaves the grid {}",
            self.tile_grid
        );
        let end = byte_offset + tile_count as usize * self.tile_bytes;
        assert!(end <= staging.len(), "tile run reads past the staging buffer");

        for t in 0..tile_count {
            let at = byte_offset + t as usize * self.tile_bytes;
            let src = &staging.bytes()[at..at + self.tile_bytes];
            self.copy_tile(src, first_tile + UVec3::new(t, 0, 0));
        }
        self.transfers += 1;
        self.tiles_received += u64::from(tile_count);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::IVec3;
    use teravox_core::VoxelFormat;

    fn spec() -> CacheSpec {
        CacheSpec::new(
            UVec3::splat(2),
            UVec3::splat(4),
            IVec3::ONE,
            VoxelFormat::U8,
        )
        .expect("valid spec")
    }

    #[test]
    fn read_back_matches_upload() {
        let spec = spec();
        let mut texture = MemoryTileTexture::new(&spec, UVec3::new(2, 2, 1));
        let mut staging = texture.create_staging(spec.tile_bytes());

        let pattern: Vec<u8> = (0..spec.tile_bytes()).map(|i| i as u8).collect();
        staging.map().copy_from_slice(&pattern);
        staging.unmap();

        texture.upload_tiles(&staging, 0, UVec3::new(1, 1, 0), 1);
        assert_eq!(texture.read_tile(UVec3::new(1, 1, 0)), pattern);
        assert_eq!(texture.read_tile(UVec3::new(0, 0, 0)), vec![0; spec.tile_bytes()]);
        assert_eq!(texture.transfer_count(), 1);
        assert_eq!(texture.tiles_received(), 1);
    }

    #[test]
    fn batched_upload_lands_tiles_along_x() {
        let spec = spec();
        let mut texture = MemoryTileTexture::new(&spec, UVec3::new(3, 1, 1));
        let mut staging = texture.create_staging(2 * spec.tile_bytes());

        {
            let bytes = staging.map();
            bytes[..spec.tile_bytes()].fill(0xaa);
            bytes[spec.tile_bytes()..].fill(0xbb);
        }
        staging.unmap();

        texture.upload_tiles(&staging, 0, UVec3::new(1, 0, 0), 2);
        assert_eq!(texture.read_tile(UVec3::new(1, 0, 0)), vec![0xaa; spec.tile_bytes()]);
        assert_eq!(texture.read_tile(UVec3::new(2, 0, 0)), vec![0xbb; spec.tile_bytes()]);
        assert_eq!(texture.transfer_count(), 1);
        assert_eq!(texture.tiles_received(), 2);
    }

    #[test]
    #[should_panic(expected = "must be unmapped")]
    fn upload_requires_an_unmapped_buffer() {
        let spec = spec();
        let mut texture = MemoryTileTexture::new(&spec, UVec3::new(2, 1, 1));
        let mut staging = texture.create_staging(spec.tile_bytes());
        let _ = staging.map();
        texture.upload_tiles(&staging, 0, UVec3::new(1, 0, 0), 1);
    }

    #[test]
    #[should_panic(expected = "already mapped")]
    fn mapping_twice_panics() {
        let mut staging = MemoryStaging::new(16);
        let _ = staging.map();
        let _ = staging.map();
    }
}
