//! Deterministic procedural volume for tests, benches, and the demo driver.

use glam::{DVec3, IVec3, UVec3};
use noise::{Fbm, MultiFractal, NoiseFn, Perlin};
use teravox_core::{CacheSpec, ContentState, LevelInfo, VoxelFormat};

use crate::pyramid::PyramidSource;

/// Synthetic volume configuration.
#[derive(Debug, Clone)]
pub struct SyntheticConfig {
    /// Seed for noise generation.
    pub seed: u32,
    /// Full-resolution image size in voxels.
    pub dims: UVec3,
    /// Number of pyramid levels (each subsampled 2x per axis).
    pub num_levels: usize,
    /// Spatial scale of the noise features, in full-resolution voxels.
    pub feature_scale: f64,
    /// Number of noise octaves for detail.
    pub octaves: usize,
}

impl Default for SyntheticConfig {
    fn default() -> Self {
        Self {
            seed: 0,
            dims: UVec3::splat(256),
            num_levels: 4,
            feature_scale: 48.0,
            octaves: 4,
        }
    }
}

/// A fractal-noise image pyramid with 16-bit voxels.
///
/// The continuous field is smooth, so coarser levels resample it at their
/// voxel centres (via the level transform) instead of averaging children;
/// every level of one seed is consistent with every other.
pub struct SyntheticPyramid {
    config: SyntheticConfig,
    field: Fbm<Perlin>,
    levels: Vec<LevelInfo>,
}

impl SyntheticPyramid {
    /// Create a pyramid with the given configuration.
    pub fn new(config: SyntheticConfig) -> Self {
        let field = Fbm::<Perlin>::new(config.seed).set_octaves(config.octaves);
        let levels = (0..config.num_levels.max(1))
            .map(|l| {
                let dims = UVec3::new(
                    (config.dims.x >> l).max(1),
                    (config.dims.y >> l).max(1),
                    (config.dims.z >> l).max(1),
                );
                if l == 0 {
                    LevelInfo::full_resolution(dims)
                } else {
                    LevelInfo::subsampled(dims, DVec3::splat(f64::from(1u32 << l)))
                }
            })
            .collect();

        Self {
            config,
            field,
            levels,
        }
    }

    /// Create a pyramid with default configuration and the given seed.
    pub fn with_seed(seed: u32) -> Self {
        Self::new(SyntheticConfig {
            seed,
            ..Default::default()
        })
    }

    /// Get the volume configuration.
    pub fn config(&self) -> &SyntheticConfig {
        &self.config
    }

    /// Intensity of the voxel at `pos` on `level`, clamped to the image.
    pub fn voxel(&self, level: usize, pos: IVec3) -> u16 {
        let info = &self.levels[level];
        let clamped = pos.clamp(IVec3::ZERO, info.dims.as_ivec3() - IVec3::ONE);
        let p = info.transform.transform_point3(clamped.as_dvec3()) / self.config.feature_scale;

        // Noise returns [-1, 1], map to the full 16-bit range.
        let n = self.field.get([p.x, p.y, p.z]).clamp(-1.0, 1.0);
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        {
            ((n + 1.0) * 0.5 * f64::from(u16::MAX)) as u16
        }
    }
}

impl PyramidSource for SyntheticPyramid {
    fn format(&self) -> VoxelFormat {
        VoxelFormat::U16
    }

    fn num_levels(&self) -> usize {
        self.levels.len()
    }

    fn level(&self, level: usize) -> LevelInfo {
        self.levels[level]
    }

    fn fill_block(
        &self,
        level: usize,
        block_pos: IVec3,
        spec: &CacheSpec,
        dst: &mut [u8],
    ) -> ContentState {
        debug_assert_eq!(spec.format(), self.format());
        debug_assert_eq!(dst.len(), spec.tile_bytes());

        let padded = spec.padded_block_size().as_ivec3();
        let origin = block_pos * spec.block_size().as_ivec3() - spec.pad_offset();

        let mut texels = Vec::with_capacity(spec.voxels_per_tile());
        for z in 0..padded.z {
            for y in 0..padded.y {
                for x in 0..padded.x {
                    texels.push(self.voxel(level, origin + IVec3::new(x, y, z)));
                }
            }
        }
        dst.copy_from_slice(bytemuck::cast_slice(&texels));
        ContentState::Complete
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn texel(dst: &[u8], spec: &CacheSpec, pos: IVec3) -> u16 {
        let padded = spec.padded_block_size().as_ivec3();
        let i = 2 * ((pos.z * padded.y + pos.y) * padded.x + pos.x) as usize;
        bytemuck::pod_read_unaligned(&dst[i..i + 2])
    }

    #[test]
    fn same_seed_same_volume() {
        let a = SyntheticPyramid::with_seed(12345);
        let b = SyntheticPyramid::with_seed(12345);
        for p in [IVec3::ZERO, IVec3::new(17, 80, 3), IVec3::new(255, 255, 255)] {
            assert_eq!(a.voxel(0, p), b.voxel(0, p));
        }
    }

    #[test]
    fn different_seeds_different_volume() {
        let a = SyntheticPyramid::with_seed(12345);
        let b = SyntheticPyramid::with_seed(54321);
        let mut differences = 0;
        for x in 0..10 {
            for y in 0..10 {
                if a.voxel(0, IVec3::new(x * 20, y * 20, 100)) != b.voxel(0, IVec3::new(x * 20, y * 20, 100)) {
                    differences += 1;
                }
            }
        }
        assert!(differences > 50, "seeds should produce different volumes");
    }

    #[test]
    fn level_dims_halve() {
        let pyramid = SyntheticPyramid::with_seed(7);
        assert_eq!(pyramid.level(0).dims, UVec3::splat(256));
        assert_eq!(pyramid.level(1).dims, UVec3::splat(128));
        assert_eq!(pyramid.level(3).dims, UVec3::splat(32));
        assert_eq!(pyramid.level(2).factors, DVec3::splat(4.0));
    }

    #[test]
    fn fill_block_matches_point_samples() {
        let pyramid = SyntheticPyramid::with_seed(42);
        let spec = CacheSpec::with_interpolation_padding(UVec3::splat(8), VoxelFormat::U16).unwrap();
        let mut dst = vec![0_u8; spec.tile_bytes()];
        let block_pos = IVec3::new(2, 1, 3);

        let state = pyramid.fill_block(1, block_pos, &spec, &mut dst);
        assert!(state.is_complete());

        for offset in [IVec3::new(1, 1, 1), IVec3::new(5, 0, 9), IVec3::new(9, 9, 9)] {
            let source_pos = block_pos * 8 - IVec3::ONE + offset;
            assert_eq!(texel(&dst, &spec, offset), pyramid.voxel(1, source_pos));
        }
    }

    #[test]
    fn border_block_clamps_padding_to_edge() {
        let pyramid = SyntheticPyramid::with_seed(9);
        let spec = CacheSpec::with_interpolation_padding(UVec3::splat(8), VoxelFormat::U16).unwrap();
        let mut dst = vec![0_u8; spec.tile_bytes()];
        pyramid.fill_block(0, IVec3::ZERO, &spec, &mut dst);

        // The pad voxel before the image start repeats the edge voxel.
        assert_eq!(
            texel(&dst, &spec, IVec3::ZERO),
            texel(&dst, &spec, IVec3::ONE)
        );
    }
}
