//! Graphics backend seams: staging memory and the tile texture.
//!
//! The cache core stays below any particular graphics API. It drives two
//! traits: [`StagingBuffer`] for pinned memory the CPU fills, and
//! [`TileTexture`] for the texture the tiles live in. Texture lifetime
//! (creation, storage allocation, deletion) belongs to the implementor;
//! the pipeline only writes staging bytes and issues tile transfers, always
//! from the thread that owns the graphics context.

use glam::UVec3;

/// Pinned staging memory, filled by the CPU and consumed by tile transfers.
///
/// The map/unmap cycle is strict: fills happen while mapped, transfers
/// require the buffer unmapped. Violations are programming errors and
/// implementations should panic on them.
pub trait StagingBuffer: Send {
    /// Byte length of the buffer.
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whether the buffer is currently mapped for CPU writes.
    fn is_mapped(&self) -> bool;

    /// Maps the buffer and returns its writable bytes.
    fn map(&mut self) -> &mut [u8];

    /// Releases the CPU mapping, handing the bytes to the transfer engine.
    fn unmap(&mut self);

    /// Base address of the backing store, as the transfer engine sees it.
    fn bytes(&self) -> &[u8];
}

/// The 3D texture holding the cache's tile grid.
pub trait TileTexture {
    type Staging: StagingBuffer;

    /// Texture dimensions, in voxels.
    fn dims(&self) -> UVec3;

    /// Allocates one staging buffer of `len` bytes for this texture.
    fn create_staging(&self, len: usize) -> Self::Staging;

    /// One transfer command: `tile_count` consecutive tile-sized chunks of
    /// `staging`, starting at `byte_offset`, land at the tile grid positions
    /// `first_tile + (i, 0, 0)`.
    ///
    /// The run never wraps a grid row; the caller only batches tiles adjacent
    /// along x. `staging` must be unmapped.
    fn upload_tiles(
        &mut self,
        staging: &Self::Staging,
        byte_offset: usize,
        first_tile: UVec3,
        tile_count: u32,
    );
}
