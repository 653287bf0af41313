//! Tiles: the fixed GPU texture slots the cache hands out.

use glam::UVec3;
use teravox_core::{BlockKey, ContentState};

/// Index of one tile slot in the cache's tile grid.
///
/// Tile 0 sits at grid position `(0, 0, 0)` and is reserved as the
/// out-of-bounds sentinel; it is never evicted and never bound to content.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(transparent)]
pub struct TileIndex(pub u32);

impl TileIndex {
    /// The reserved out-of-bounds sentinel slot.
    pub const SENTINEL: Self = Self(0);

    /// Whether this is the reserved sentinel slot.
    #[inline]
    pub const fn is_sentinel(self) -> bool {
        self.0 == Self::SENTINEL.0
    }
}

/// One tile slot: a permanent grid position whose content is rebound over the
/// cache's lifetime.
///
/// Owned exclusively by the cache; everything outside reads tiles through the
/// accessors and mutates them only via `stage`/`assign` on the cache.
#[derive(Clone, Debug)]
pub struct Tile {
    pub(crate) pos: UVec3,
    pub(crate) content: Option<BlockKey>,
    pub(crate) state: ContentState,
    pub(crate) lru: u64,
}

impl Tile {
    pub(crate) const fn empty(pos: UVec3) -> Self {
        Self {
            pos,
            content: None,
            state: ContentState::Incomplete,
            lru: 0,
        }
    }

    /// Position of this tile in the cache's tile grid.
    #[inline]
    pub const fn pos(&self) -> UVec3 {
        self.pos
    }

    /// The block currently bound to this tile, if any.
    #[inline]
    pub const fn content(&self) -> Option<BlockKey> {
        self.content
    }

    /// Whether the tile's data fully represents its bound block.
    #[inline]
    pub const fn state(&self) -> ContentState {
        self.state
    }

    /// Timestamp of the staging round that last touched this tile.
    #[inline]
    pub const fn lru(&self) -> u64 {
        self.lru
    }
}
