//! LRU mapping from block keys to GPU tile slots.

use glam::UVec3;
use hashbrown::{HashMap, HashSet};
use teravox_core::{BlockKey, CacheSpec, ContentState};

use crate::error::{CacheError, Result};
use crate::tile::{Tile, TileIndex};

/// One staged block: a key and the tile slot that holds (or will hold) it.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct StagedBlock {
    pub key: BlockKey,
    pub tile: TileIndex,
}

/// Classification of one [`TileCache::stage`] round.
#[derive(Clone, Debug, Default)]
pub struct StageResult {
    /// Resident with complete data; no work.
    pub already_complete: Vec<StagedBlock>,
    /// Resident with partial data; re-fill into the same tile.
    pub needs_update: Vec<StagedBlock>,
    /// Absent; fill into the reclaimed tile.
    pub needs_load: Vec<StagedBlock>,
}

impl StageResult {
    /// The blocks that need a fill this round, updates first.
    pub fn pending(&self) -> impl Iterator<Item = StagedBlock> + '_ {
        self.needs_update
            .iter()
            .chain(self.needs_load.iter())
            .copied()
    }
}

/// Fixed-capacity cache of GPU tile slots, evicting by least-recent use.
///
/// Tiles live in a dense 3D grid inside one texture; index 0 is the reserved
/// out-of-bounds sentinel. All mutation goes through [`Self::stage`] and
/// [`Self::assign`], which the owner must call from a single thread or behind
/// its own lock; the cache itself takes `&mut self` and nothing more.
#[derive(Debug)]
pub struct TileCache {
    spec: CacheSpec,
    tile_grid: UVec3,
    tiles: Vec<Tile>,
    lookup: HashMap<BlockKey, TileIndex>,
    timestamp: u64,
}

impl TileCache {
    /// Creates a cache whose tiles fill a `tile_grid` grid of padded blocks.
    ///
    /// The grid needs at least two tiles: the sentinel plus one usable slot.
    #[allow(clippy::cast_possible_truncation)]
    pub fn new(spec: CacheSpec, tile_grid: UVec3) -> Result<Self> {
        if tile_grid.min_element() == 0 {
            return Err(CacheError::InvalidGrid(format!(
                "tile grid must be positive on every axis, got {tile_grid}"
            )));
        }
        let capacity =
            u64::from(tile_grid.x) * u64::from(tile_grid.y) * u64::from(tile_grid.z);
        if capacity < 2 {
            return Err(CacheError::InvalidGrid(
                "tile grid needs a usable tile besides the sentinel".into(),
            ));
        }
        if capacity > u64::from(u32::MAX) {
            return Err(CacheError::InvalidGrid(format!(
                "tile grid {tile_grid} exceeds the addressable tile count"
            )));
        }

        let tiles = (0..capacity as u32)
            .map(|i| {
                let pos = UVec3::new(
                    i % tile_grid.x,
                    (i / tile_grid.x) % tile_grid.y,
                    i / (tile_grid.x * tile_grid.y),
                );
                Tile::empty(pos)
            })
            .collect();

        Ok(Self {
            spec,
            tile_grid,
            tiles,
            lookup: HashMap::new(),
            timestamp: 0,
        })
    }

    /// The geometry this cache was built for.
    #[inline]
    pub const fn spec(&self) -> &CacheSpec {
        &self.spec
    }

    /// Tile grid dimensions, in tiles.
    #[inline]
    pub const fn tile_grid_dims(&self) -> UVec3 {
        self.tile_grid
    }

    /// Dimensions of the backing texture, in voxels.
    #[inline]
    pub fn texture_dims(&self) -> UVec3 {
        self.tile_grid * self.spec.padded_block_size()
    }

    /// Total tile count, sentinel included.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.tiles.len()
    }

    /// Number of keys currently bound to a tile.
    #[inline]
    pub fn resident_blocks(&self) -> usize {
        self.lookup.len()
    }

    /// The tile at `index`. Panics on an out-of-range index.
    #[inline]
    pub fn tile(&self, index: TileIndex) -> &Tile {
        &self.tiles[index.0 as usize]
    }

    /// O(1) residency lookup. Does not touch the LRU order; only
    /// [`Self::stage`] and [`Self::assign`] move timestamps.
    #[inline]
    pub fn get(&self, key: &BlockKey) -> Option<TileIndex> {
        self.lookup.get(key).copied()
    }

    /// Opens a staging round: classifies `keys` into resident-complete,
    /// resident-incomplete, and missing, and reclaims one tile per missing
    /// key from the least-recently-touched slots.
    ///
    /// Every resident key and every reclaimed tile gets its `lru` bumped to
    /// this round's timestamp, so nothing staged here can be reclaimed again
    /// within the round. Reclaimed tiles keep their old binding until
    /// [`Self::assign`] rebinds them after the upload. Duplicate keys are
    /// staged once.
    ///
    /// Fails with [`CacheError::CapacityExceeded`] when more keys are missing
    /// than tiles predate this round: the working set cannot fit, which no
    /// amount of retrying fixes.
    #[allow(clippy::cast_possible_truncation)]
    pub fn stage(&mut self, keys: &[BlockKey]) -> Result<StageResult> {
        self.timestamp += 1;
        let now = self.timestamp;

        let mut result = StageResult::default();
        let mut missing = Vec::new();
        let mut seen = HashSet::with_capacity(keys.len());

        for &key in keys {
            if !seen.insert(key) {
                continue;
            }
            match self.lookup.get(&key) {
                Some(&index) => {
                    let tile = &mut self.tiles[index.0 as usize];
                    debug_assert_eq!(tile.content, Some(key), "lookup points at a foreign tile");
                    tile.lru = now;
                    let staged = StagedBlock { key, tile: index };
                    if tile.state.is_complete() {
                        result.already_complete.push(staged);
                    } else {
                        result.needs_update.push(staged);
                    }
                }
                None => missing.push(key),
            }
        }

        if missing.is_empty() {
            return Ok(result);
        }

        // Reclaim candidates: every non-sentinel tile not touched this round,
        // oldest first, ties in ascending grid order.
        let mut candidates: Vec<TileIndex> = self
            .tiles
            .iter()
            .enumerate()
            .skip(1)
            .filter(|(_, tile)| tile.lru < now)
            .map(|(i, _)| TileIndex(i as u32))
            .collect();
        if missing.len() > candidates.len() {
            tracing::error!(
                requested = missing.len(),
                evictable = candidates.len(),
                "working set exceeds tile cache capacity"
            );
            return Err(CacheError::CapacityExceeded {
                requested: missing.len(),
                evictable: candidates.len(),
            });
        }
        candidates.sort_unstable_by_key(|&index| {
            let tile = &self.tiles[index.0 as usize];
            (tile.lru, tile.pos.x, tile.pos.y, tile.pos.z)
        });

        for (key, index) in missing.into_iter().zip(candidates) {
            self.tiles[index.0 as usize].lru = now;
            result.needs_load.push(StagedBlock { key, tile: index });
        }
        Ok(result)
    }

    /// Rebinds `index` to `key` with the given content state and stamps the
    /// tile with the current round.
    ///
    /// If the tile held a different key whose lookup entry still points here,
    /// that entry is removed first, so `lookup[key].content == key` holds for
    /// every mapped key afterwards.
    ///
    /// Panics when `index` is the sentinel: real content never lands there.
    pub fn assign(&mut self, index: TileIndex, key: BlockKey, state: ContentState) {
        assert!(
            !index.is_sentinel(),
            "cannot assign content to the sentinel tile"
        );
        let tile = &mut self.tiles[index.0 as usize];
        if let Some(old) = tile.content {
            if old != key && self.lookup.get(&old) == Some(&index) {
                self.lookup.remove(&old);
            }
        }
        tile.content = Some(key);
        tile.state = state;
        tile.lru = self.timestamp;
        let previous = self.lookup.insert(key, index);
        debug_assert!(
            previous.is_none_or(|p| p == index),
            "key was bound to two tiles at once"
        );
    }
}
