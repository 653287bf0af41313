//! Resolution level selection from the current view transform.
//!
//! Per frame, [`LodSelector::init`] finds the closest visible point of the
//! source volume (a linear program over the clipped region in normalized
//! device coordinates), measures the world-space footprint of one pixel at
//! that point on the near and the far plane, and derives one screen-weighted
//! sample spacing per pyramid level. [`LodSelector::best_level`] then maps a
//! normalized depth to the level whose spacing best matches the pixel
//! footprint at that depth.

use glam::{DMat4, DVec3};
use teravox_core::{ConvexPolytope, LevelInfo};

const SQRT_3: f64 = 1.732_050_807_568_877_2;

/// Per-frame level selection state.
///
/// Built once per frame from the source-to-NDC transform; [`Self::best_level`]
/// is then a cheap per-sample lookup. When [`Self::is_visible`] is `false` the
/// volume does not intersect the view frustum and the other queries are not
/// meaningful.
#[derive(Clone, Debug)]
pub struct LodSelector {
    visible: bool,
    closest_depth: f64,
    near_pixel_size: f64,
    far_pixel_size: f64,
    spacings: Vec<f64>,
}

impl LodSelector {
    /// Builds the selector for one frame.
    ///
    /// `source_to_ndc` maps full-resolution voxel coordinates into GL-style
    /// normalized device coordinates (the `[-1, 1]^3` cube, near plane at
    /// `z = -1`) and must be invertible. `levels` describes the pyramid,
    /// finest level first.
    #[must_use]
    pub fn init(source_to_ndc: &DMat4, viewport_width: u32, levels: &[LevelInfo]) -> Self {
        assert!(viewport_width > 0, "viewport width must be positive");
        assert!(!levels.is_empty(), "pyramid needs at least one level");

        // Screen footprint of a one-voxel step along each source axis,
        // rescaled so an isotropic view weighs all axes at 1.
        let footprint = DVec3::new(
            source_to_ndc.transform_vector3(DVec3::X).length(),
            source_to_ndc.transform_vector3(DVec3::Y).length(),
            source_to_ndc.transform_vector3(DVec3::Z).length(),
        );
        let weights = footprint * (SQRT_3 / footprint.length());
        let spacings = levels
            .iter()
            .map(|level| (level.factors * weights).length() / SQRT_3)
            .collect();

        // Clip the projected source bounds against the NDC cube and find the
        // point closest to the camera. Intersecting with the cube first keeps
        // the pulled-back bound planes inside their valid projective range.
        let dims = levels[0].dims.as_dvec3();
        let inverse = source_to_ndc.inverse();
        let mut region = ConvexPolytope::aabb(DVec3::splat(-1.0), DVec3::splat(1.0));
        for plane in ConvexPolytope::aabb(DVec3::splat(-0.5), dims - 0.5)
            .preimage(&inverse)
            .half_spaces()
        {
            region.push(*plane);
        }

        let Some(closest) = region.minimize(DVec3::Z) else {
            return Self {
                visible: false,
                closest_depth: 1.0,
                near_pixel_size: 0.0,
                far_pixel_size: 0.0,
                spacings,
            };
        };

        // One-pixel step in NDC, back-projected onto the near and far plane
        // through the closest point's screen position.
        let pixel = 2.0 / f64::from(viewport_width);
        let near_a = inverse.project_point3(DVec3::new(closest.x, closest.y, -1.0));
        let near_b = inverse.project_point3(DVec3::new(closest.x + pixel, closest.y, -1.0));
        let far_a = inverse.project_point3(DVec3::new(closest.x, closest.y, 1.0));
        let far_b = inverse.project_point3(DVec3::new(closest.x + pixel, closest.y, 1.0));

        Self {
            visible: true,
            closest_depth: ((closest.z + 1.0) * 0.5).clamp(0.0, 1.0),
            near_pixel_size: near_a.distance(near_b),
            far_pixel_size: far_a.distance(far_b),
            spacings,
        }
    }

    #[cfg(test)]
    fn with_parameters(near_pixel_size: f64, far_pixel_size: f64, spacings: Vec<f64>) -> Self {
        Self {
            visible: true,
            closest_depth: 0.0,
            near_pixel_size,
            far_pixel_size,
            spacings,
        }
    }

    /// Whether any part of the volume is inside the view frustum.
    #[must_use]
    pub const fn is_visible(&self) -> bool {
        self.visible
    }

    /// Normalized depth of the closest visible point, in `[0, 1]`.
    #[must_use]
    pub const fn closest_depth(&self) -> f64 {
        self.closest_depth
    }

    /// Source-space extent of one pixel on the near plane.
    #[must_use]
    pub const fn near_pixel_size(&self) -> f64 {
        self.near_pixel_size
    }

    /// Source-space extent of one pixel on the far plane.
    #[must_use]
    pub const fn far_pixel_size(&self) -> f64 {
        self.far_pixel_size
    }

    #[must_use]
    pub fn num_levels(&self) -> usize {
        self.spacings.len()
    }

    /// Screen-weighted sample spacing of `level`, in full-resolution voxels.
    #[must_use]
    pub fn sample_spacing(&self, level: usize) -> f64 {
        self.spacings[level]
    }

    /// Picks the level whose sample spacing best matches the pixel footprint
    /// at normalized depth `depth` (clamped to `[0, 1]`).
    ///
    /// The footprint interpolates linearly between the near and far pixel
    /// size. The coarsest level whose spacing still reaches the footprint is
    /// chosen, except that the next finer level wins when the footprint sits
    /// closer to (or exactly between) the two spacings.
    #[must_use]
    pub fn best_level(&self, depth: f64) -> usize {
        let depth = depth.clamp(0.0, 1.0);
        let footprint = (1.0 - depth) * self.near_pixel_size + depth * self.far_pixel_size;
        for (level, &spacing) in self.spacings.iter().enumerate() {
            if spacing >= footprint {
                let finer_is_closer = level > 0
                    && footprint - self.spacings[level - 1] <= spacing - footprint;
                return if finer_is_closer { level - 1 } else { level };
            }
        }
        self.spacings.len() - 1
    }

    /// Level for the closest visible point; the finest level worth residency
    /// this frame.
    #[must_use]
    pub fn base_level(&self) -> usize {
        self.best_level(self.closest_depth)
    }
}
