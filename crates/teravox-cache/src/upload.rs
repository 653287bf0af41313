//! Staged upload pipeline: fills bounded staging buffers from fill tasks and
//! commits them to the tile texture.
//!
//! One [`UploadPipeline::process`] call is one frame's worth of streaming:
//! stage the requested keys, fill staging slots for everything not already
//! resident and complete, and transfer the filled slots into the texture,
//! merging tiles adjacent along the grid's x axis into single transfers.
//! Fills may run sequentially or fanned out over the worker pool; transfers
//! always stay on the calling thread, which must own the graphics context.

use std::fmt;

use hashbrown::HashMap;
use rayon::iter::{IndexedParallelIterator, IntoParallelIterator, ParallelIterator};
use teravox_core::{BlockKey, CacheSpec, ContentState};

use crate::backend::{StagingBuffer, TileTexture};
use crate::cache::TileCache;
use crate::error::{CacheError, Result};
use crate::tile::TileIndex;

type FillFn<'a> = Box<dyn FnOnce(&mut [u8]) -> ContentState + Send + 'a>;

/// A request to populate one block: the key plus the function that writes its
/// padded voxel data into a staging slot.
///
/// The fill function reports whether the source had all the data
/// ([`ContentState::Complete`]) or only part of it; partial blocks are
/// uploaded as-is and re-requested on a later frame.
pub struct FillTask<'a> {
    key: BlockKey,
    fill: FillFn<'a>,
}

impl<'a> FillTask<'a> {
    pub fn new(
        key: BlockKey,
        fill: impl FnOnce(&mut [u8]) -> ContentState + Send + 'a,
    ) -> Self {
        Self {
            key,
            fill: Box::new(fill),
        }
    }

    #[inline]
    pub const fn key(&self) -> BlockKey {
        self.key
    }
}

impl fmt::Debug for FillTask<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FillTask")
            .field("key", &self.key)
            .finish_non_exhaustive()
    }
}

/// How fill functions are executed within one staging batch.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum FillMode {
    /// One fill after another on the calling thread.
    #[default]
    Sequential,
    /// Fills fan out over the rayon pool; the batch joins before any commit.
    Parallel,
}

/// Pipeline sizing and execution mode.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct UploadConfig {
    /// Staging buffers cycled in rotation.
    pub staging_buffers: usize,
    /// Tile slots per staging buffer; bounds one batch.
    pub slots_per_buffer: usize,
    pub mode: FillMode,
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            staging_buffers: 3,
            slots_per_buffer: 16,
            mode: FillMode::Sequential,
        }
    }
}

/// Counters for one `process` call.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct UploadStats {
    /// Tasks handed in, duplicates included.
    pub requested: usize,
    /// Keys already resident and complete; their fills never ran.
    pub already_complete: usize,
    /// Resident but partial blocks re-filled in place.
    pub updated: usize,
    /// Blocks loaded into freshly reclaimed tiles.
    pub loaded: usize,
    /// Fills that reported complete data.
    pub completed: usize,
    /// Fills that reported partial data; retried on a later frame.
    pub incomplete: usize,
    /// Transfer commands issued to the texture.
    pub transfers: usize,
}

/// Feeds the tile cache through a bounded ring of staging buffers.
///
/// Owns the staging memory; the cache and texture are borrowed per call so
/// one pipeline can serve them without holding them hostage between frames.
pub struct UploadPipeline<T: TileTexture> {
    config: UploadConfig,
    tile_bytes: usize,
    buffers: Vec<T::Staging>,
    next_buffer: usize,
}

impl<T: TileTexture> UploadPipeline<T> {
    /// Creates the pipeline and allocates its staging ring for `spec`-sized
    /// tiles.
    pub fn new(config: UploadConfig, spec: &CacheSpec, texture: &T) -> Result<Self> {
        if config.staging_buffers == 0 {
            return Err(CacheError::InvalidConfig(
                "at least one staging buffer is required".into(),
            ));
        }
        if config.slots_per_buffer == 0 {
            return Err(CacheError::InvalidConfig(
                "staging buffers need at least one tile slot".into(),
            ));
        }
        let tile_bytes = spec.tile_bytes();
        let buffers = (0..config.staging_buffers)
            .map(|_| texture.create_staging(tile_bytes * config.slots_per_buffer))
            .collect();
        Ok(Self {
            config,
            tile_bytes,
            buffers,
            next_buffer: 0,
        })
    }

    #[inline]
    pub const fn config(&self) -> &UploadConfig {
        &self.config
    }

    /// Runs one batch of fill tasks to completion: stage, fill, upload,
    /// assign.
    ///
    /// Tasks whose key is already resident and complete are dropped unfilled.
    /// Duplicate keys fill once. Blocks whose fill reports partial data are
    /// still uploaded and assigned, but as [`ContentState::Incomplete`], so
    /// the next round re-fills them in place.
    ///
    /// Fails fast with [`CacheError::CapacityExceeded`] when the distinct new
    /// keys outnumber the tiles the cache can reclaim.
    pub fn process(
        &mut self,
        cache: &mut TileCache,
        texture: &mut T,
        tasks: Vec<FillTask<'_>>,
    ) -> Result<UploadStats> {
        debug_assert_eq!(
            texture.dims(),
            cache.texture_dims(),
            "texture was not allocated for this cache"
        );
        debug_assert_eq!(self.tile_bytes, cache.spec().tile_bytes());

        let mut stats = UploadStats {
            requested: tasks.len(),
            ..UploadStats::default()
        };
        if tasks.is_empty() {
            return Ok(stats);
        }

        let keys: Vec<BlockKey> = tasks.iter().map(FillTask::key).collect();
        let staged = cache.stage(&keys)?;
        stats.already_complete = staged.already_complete.len();
        stats.updated = staged.needs_update.len();
        stats.loaded = staged.needs_load.len();

        // Pair every staged slot with its task's fill function; the first
        // task wins for a duplicated key.
        let mut slots: HashMap<BlockKey, TileIndex> =
            staged.pending().map(|block| (block.key, block.tile)).collect();
        let mut pending: Vec<(TileIndex, BlockKey, FillFn<'_>)> = tasks
            .into_iter()
            .filter_map(|task| {
                slots
                    .remove(&task.key)
                    .map(|tile| (tile, task.key, task.fill))
            })
            .collect();

        // Tile-index order makes runs of grid-adjacent tiles land in adjacent
        // staging slots, which is what lets the commit merge them.
        pending.sort_by_key(|(tile, _, _)| *tile);

        let mut pending = pending.into_iter().peekable();
        while pending.peek().is_some() {
            let batch: Vec<_> = pending
                .by_ref()
                .take(self.config.slots_per_buffer)
                .collect();
            self.commit_batch(cache, texture, batch, &mut stats);
        }

        tracing::debug!(
            "upload round: {} requested, {} resident, {} filled ({} incomplete), {} transfers",
            stats.requested,
            stats.already_complete,
            stats.updated + stats.loaded,
            stats.incomplete,
            stats.transfers
        );
        Ok(stats)
    }

    /// Fills one staging buffer and issues its transfers and assignments.
    fn commit_batch(
        &mut self,
        cache: &mut TileCache,
        texture: &mut T,
        batch: Vec<(TileIndex, BlockKey, FillFn<'_>)>,
        stats: &mut UploadStats,
    ) {
        let buffer = self.next_buffer;
        self.next_buffer = (self.next_buffer + 1) % self.buffers.len();

        let mut blocks = Vec::with_capacity(batch.len());
        let mut fills = Vec::with_capacity(batch.len());
        for (tile, key, fill) in batch {
            blocks.push((tile, key));
            fills.push(fill);
        }

        let states: Vec<ContentState> = {
            let staging = &mut self.buffers[buffer];
            let bytes = staging.map();
            let chunks = bytes.chunks_mut(self.tile_bytes).take(fills.len());
            match self.config.mode {
                FillMode::Sequential => fills
                    .into_iter()
                    .zip(chunks)
                    .map(|(fill, dst)| fill(dst))
                    .collect(),
                // collect() joins every worker before the buffer is unmapped,
                // so the commit below never races a fill.
                FillMode::Parallel => fills
                    .into_par_iter()
                    .zip(chunks.collect::<Vec<_>>())
                    .map(|(fill, dst)| fill(dst))
                    .collect(),
            }
        };
        self.buffers[buffer].unmap();

        // One transfer per run of tiles adjacent along the grid's x axis.
        let grid_x = cache.tile_grid_dims().x;
        let staging = &self.buffers[buffer];
        let mut run_start = 0;
        for i in 1..=blocks.len() {
            let extends_run = i < blocks.len() && {
                let previous = blocks[i - 1].0;
                let current = blocks[i].0;
                current.0 == previous.0 + 1 && current.0 % grid_x != 0
            };
            if !extends_run {
                let first = blocks[run_start].0;
                texture.upload_tiles(
                    staging,
                    run_start * self.tile_bytes,
                    cache.tile(first).pos(),
                    (i - run_start) as u32,
                );
                stats.transfers += 1;
                run_start = i;
            }
        }

        for ((tile, key), state) in blocks.into_iter().zip(states) {
            cache.assign(tile, key, state);
            if state.is_complete() {
                stats.completed += 1;
            } else {
                stats.incomplete += 1;
            }
        }
    }
}
