//! Source wrapper that simulates slowly arriving data.

use glam::IVec3;
use hashbrown::HashMap;
use parking_lot::Mutex;
use teravox_core::{CacheSpec, ContentState, LevelInfo, VoxelFormat};

use crate::pyramid::PyramidSource;

/// Wraps a source and reports [`ContentState::Incomplete`] for each block's
/// first `delay` fill attempts, writing zeros instead of data.
///
/// This mimics a backing store whose blocks are still being fetched: the
/// pipeline uploads the placeholder, keeps the tile INCOMPLETE, and the block
/// is re-requested on later passes until the data "arrives".
pub struct ThrottledSource<S> {
    inner: S,
    delay: u32,
    attempts: Mutex<HashMap<(usize, IVec3), u32>>,
}

impl<S: PyramidSource> ThrottledSource<S> {
    /// Wrap `inner`, delaying every block by `delay` fill attempts.
    pub fn new(inner: S, delay: u32) -> Self {
        Self {
            inner,
            delay,
            attempts: Mutex::new(HashMap::new()),
        }
    }

    /// The wrapped source.
    pub fn inner(&self) -> &S {
        &self.inner
    }

    /// Fill attempts recorded for one block so far.
    pub fn attempts(&self, level: usize, block_pos: IVec3) -> u32 {
        self.attempts
            .lock()
            .get(&(level, block_pos))
            .copied()
            .unwrap_or(0)
    }
}

impl<S: PyramidSource> PyramidSource for ThrottledSource<S> {
    fn format(&self) -> VoxelFormat {
        self.inner.format()
    }

    fn num_levels(&self) -> usize {
        self.inner.num_levels()
    }

    fn level(&self, level: usize) -> LevelInfo {
        self.inner.level(level)
    }

    fn fill_block(
        &self,
        level: usize,
        block_pos: IVec3,
        spec: &CacheSpec,
        dst: &mut [u8],
    ) -> ContentState {
        let arrived = {
            let mut attempts = self.attempts.lock();
            let n = attempts.entry((level, block_pos)).or_insert(0);
            *n += 1;
            *n > self.delay
        };

        if arrived {
            self.inner.fill_block(level, block_pos, spec, dst)
        } else {
            dst.fill(0);
            ContentState::Incomplete
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::synthetic::SyntheticPyramid;
    use glam::UVec3;

    #[test]
    fn blocks_arrive_after_the_configured_delay() {
        let source = ThrottledSource::new(SyntheticPyramid::with_seed(3), 2);
        let spec = CacheSpec::with_interpolation_padding(UVec3::splat(8), VoxelFormat::U16).unwrap();
        let mut throttled = vec![0xff_u8; spec.tile_bytes()];
        let pos = IVec3::new(1, 1, 1);

        assert_eq!(
            source.fill_block(0, pos, &spec, &mut throttled),
            ContentState::Incomplete
        );
        assert!(throttled.iter().all(|&b| b == 0), "placeholder must be zeroed");
        assert_eq!(
            source.fill_block(0, pos, &spec, &mut throttled),
            ContentState::Incomplete
        );
        assert_eq!(
            source.fill_block(0, pos, &spec, &mut throttled),
            ContentState::Complete
        );
        assert_eq!(source.attempts(0, pos), 3);

        let mut direct = vec![0_u8; spec.tile_bytes()];
        source.inner().fill_block(0, pos, &spec, &mut direct);
        assert_eq!(throttled, direct);
    }

    #[test]
    fn delays_are_tracked_per_block() {
        let source = ThrottledSource::new(SyntheticPyramid::with_seed(3), 1);
        let spec = CacheSpec::with_interpolation_padding(UVec3::splat(8), VoxelFormat::U16).unwrap();
        let mut dst = vec![0_u8; spec.tile_bytes()];

        assert_eq!(
            source.fill_block(0, IVec3::ZERO, &spec, &mut dst),
            ContentState::Incomplete
        );
        assert_eq!(
            source.fill_block(0, IVec3::ZERO, &spec, &mut dst),
            ContentState::Complete
        );
        // A different block starts its own countdown.
        assert_eq!(
            source.fill_block(0, IVec3::ONE, &spec, &mut dst),
            ContentState::Incomplete
        );
    }
}
