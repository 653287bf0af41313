//! Per-source cached metadata and explicit invalidation.

use glam::IVec3;
use teravox_core::{BlockKey, ImageId, LevelInfo, VoxelFormat};

use crate::pyramid::PyramidSource;

/// Whether a source exposes a single resolution level or a full pyramid.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StackKind {
    /// One level only; LOD selection degenerates to level 0
    Simple,
    /// A proper pyramid with two or more levels
    MultiResolution,
}

/// A source plus everything derived from it: its kind, its level geometries,
/// and a generation counter.
///
/// The stack is owned by whichever component constructed the source wrapper;
/// there is no global registry. Derived metadata is read once at construction
/// and only re-read by an explicit [`SourceStack::invalidate`] call, which
/// also bumps the generation. Because [`ImageId`]s embed the generation,
/// blocks fetched before an invalidation stop matching any new request and
/// their tiles age out of the LRU cache without an explicit sweep.
pub struct SourceStack<S> {
    source: S,
    id: u16,
    generation: u32,
    kind: StackKind,
    levels: Vec<LevelInfo>,
}

impl<S: PyramidSource> SourceStack<S> {
    /// Wrap `source` under the caller-chosen stack id.
    pub fn new(id: u16, source: S) -> Self {
        let levels = source.levels();
        let kind = if levels.len() > 1 {
            StackKind::MultiResolution
        } else {
            StackKind::Simple
        };
        Self {
            source,
            id,
            generation: 0,
            kind,
            levels,
        }
    }

    /// The wrapped source.
    #[inline]
    pub fn source(&self) -> &S {
        &self.source
    }

    /// Caller-chosen stack id.
    #[inline]
    pub const fn id(&self) -> u16 {
        self.id
    }

    /// Simple or multi-resolution, decided at construction.
    #[inline]
    pub const fn kind(&self) -> StackKind {
        self.kind
    }

    /// Current generation; starts at 0.
    #[inline]
    pub const fn generation(&self) -> u32 {
        self.generation
    }

    /// Cached level geometries, finest first.
    #[inline]
    pub fn levels(&self) -> &[LevelInfo] {
        &self.levels
    }

    /// Voxel format of the wrapped source.
    #[inline]
    pub fn format(&self) -> VoxelFormat {
        self.source.format()
    }

    /// Bump the generation and re-derive the cached metadata.
    ///
    /// Call after the underlying source changed (new timepoint, updated
    /// dataset). Previously cached tiles are not touched; their keys simply
    /// never match again.
    pub fn invalidate(&mut self) {
        self.generation += 1;
        self.levels = self.source.levels();
        self.kind = if self.levels.len() > 1 {
            StackKind::MultiResolution
        } else {
            StackKind::Simple
        };
    }

    /// Image identity of one level at the current generation.
    ///
    /// Unique across stacks and generations as long as levels stay below 256
    /// (debug-asserted).
    #[inline]
    pub fn image_id(&self, level: usize) -> ImageId {
        debug_assert!(level < self.levels.len() && level < 256);
        #[allow(clippy::cast_possible_truncation)]
        ImageId((u64::from(self.id) << 40) | (u64::from(self.generation) << 8) | level as u64)
    }

    /// Content key for the block of `level` at grid position `pos`.
    #[inline]
    pub fn block_key(&self, level: usize, pos: IVec3) -> BlockKey {
        BlockKey::new(self.image_id(level), pos)
    }
}
