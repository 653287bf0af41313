//! Half-spaces and convex polytopes for exact block-overlap testing.
//!
//! A polytope is an ordered set of half-spaces whose normals point into the
//! feasible region. Three derived forms drive the visibility engine:
//! - [`ConvexPolytope::dilated`] offsets every plane so a single-point test
//!   stands in for a box-overlap test,
//! - [`ConvexPolytope::rescaled`] re-expresses the planes in grid-index units,
//! - [`ConvexPolytope::preimage`] pulls a polytope through a (possibly
//!   projective) transform, e.g. a screen rectangle into source coordinates.

use glam::{DMat3, DMat4, DVec3, DVec4};

/// One half-space `dot(normal, p) >= distance`, normal pointing inside.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct HalfSpace {
    /// Inward-facing plane normal
    pub normal: DVec3,
    /// Plane offset along the normal
    pub distance: f64,
}

impl HalfSpace {
    /// Create a half-space from an inward normal and plane offset.
    #[inline]
    pub const fn new(normal: DVec3, distance: f64) -> Self {
        Self { normal, distance }
    }

    /// Build from homogeneous plane coefficients `c` with feasibility
    /// `dot(c, (p, 1)) >= 0`.
    #[inline]
    pub fn from_coefficients(c: DVec4) -> Self {
        Self {
            normal: c.truncate(),
            distance: -c.w,
        }
    }

    /// Homogeneous plane coefficients, inverse of [`Self::from_coefficients`].
    #[inline]
    pub fn coefficients(&self) -> DVec4 {
        self.normal.extend(-self.distance)
    }

    /// Distance of `p` from the plane, positive inside the feasible region.
    ///
    /// Only a true Euclidean distance if the normal has unit length.
    #[inline]
    pub fn signed_distance(&self, p: DVec3) -> f64 {
        self.normal.dot(p) - self.distance
    }

    /// Closed feasibility test: boundary points count as inside.
    #[inline]
    pub fn contains(&self, p: DVec3) -> bool {
        self.signed_distance(p) >= 0.0
    }

    /// Same half-space with a unit-length normal.
    #[inline]
    pub fn normalized(&self) -> Self {
        let len = self.normal.length();
        Self {
            normal: self.normal / len,
            distance: self.distance / len,
        }
    }

    /// Offset the plane outward by the extremal corner of the box `[lo, hi]`,
    /// choosing per axis the corner bound that maximizes `dot(normal, corner)`.
    ///
    /// A point `p` satisfies the result exactly when some point of
    /// `p + [lo, hi]` satisfies `self`.
    pub fn dilated(&self, lo: DVec3, hi: DVec3) -> Self {
        let corner = DVec3::new(
            if self.normal.x >= 0.0 { hi.x } else { lo.x },
            if self.normal.y >= 0.0 { hi.y } else { lo.y },
            if self.normal.z >= 0.0 { hi.z } else { lo.z },
        );
        Self {
            normal: self.normal,
            distance: self.distance - self.normal.dot(corner),
        }
    }

    /// Re-express the half-space in a coordinate system whose unit cell is
    /// `cell`: a point `g` of the result corresponds to `g * cell` here. The
    /// result is renormalized.
    pub fn rescaled(&self, cell: DVec3) -> Self {
        Self {
            normal: self.normal * cell,
            distance: self.distance,
        }
        .normalized()
    }
}

/// Intersection of half-spaces; represents view frusta and clip regions.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ConvexPolytope {
    half_spaces: Vec<HalfSpace>,
}

impl ConvexPolytope {
    /// Create a polytope from the given half-spaces, kept in order.
    #[inline]
    pub fn new(half_spaces: Vec<HalfSpace>) -> Self {
        Self { half_spaces }
    }

    /// Axis-aligned box `[min, max]` as six inward-facing half-spaces.
    pub fn aabb(min: DVec3, max: DVec3) -> Self {
        Self::new(vec![
            HalfSpace::new(DVec3::X, min.x),
            HalfSpace::new(DVec3::NEG_X, -max.x),
            HalfSpace::new(DVec3::Y, min.y),
            HalfSpace::new(DVec3::NEG_Y, -max.y),
            HalfSpace::new(DVec3::Z, min.z),
            HalfSpace::new(DVec3::NEG_Z, -max.z),
        ])
    }

    /// The half-spaces in construction order.
    #[inline]
    pub fn half_spaces(&self) -> &[HalfSpace] {
        &self.half_spaces
    }

    /// Add one half-space.
    #[inline]
    pub fn push(&mut self, half_space: HalfSpace) {
        self.half_spaces.push(half_space);
    }

    /// Closed feasibility test against every half-space.
    #[inline]
    pub fn contains(&self, p: DVec3) -> bool {
        self.half_spaces.iter().all(|h| h.contains(p))
    }

    /// Strict feasibility test: points on any plane count as outside.
    ///
    /// Block enumeration uses this so a block that merely grazes the clip
    /// region (zero-volume contact) is not reported as required.
    #[inline]
    pub fn strictly_contains(&self, p: DVec3) -> bool {
        self.half_spaces.iter().all(|h| h.signed_distance(p) > 0.0)
    }

    /// Apply [`HalfSpace::dilated`] to every half-space.
    pub fn dilated(&self, lo: DVec3, hi: DVec3) -> Self {
        Self::new(self.half_spaces.iter().map(|h| h.dilated(lo, hi)).collect())
    }

    /// Apply [`HalfSpace::rescaled`] to every half-space.
    pub fn rescaled(&self, cell: DVec3) -> Self {
        Self::new(self.half_spaces.iter().map(|h| h.rescaled(cell)).collect())
    }

    /// The preimage of this polytope under `m`: given the half-spaces over the
    /// codomain of `m`, return the same set expressed over its domain.
    ///
    /// Valid for projective `m` on the side of the hyperplane at infinity
    /// where transformed points keep `w > 0` (always the case for points
    /// between the near and far planes of a view transform).
    pub fn preimage(&self, m: &DMat4) -> Self {
        let mt = m.transpose();
        Self::new(
            self.half_spaces
                .iter()
                .map(|h| HalfSpace::from_coefficients(mt * h.coefficients()).normalized())
                .collect(),
        )
    }

    /// A feasible point minimizing `dot(objective, p)`, or `None` if the
    /// feasible region is empty.
    ///
    /// Solved by enumerating all vertices (intersections of plane triples) and
    /// keeping the feasible one with the smallest objective; the feasible
    /// region must therefore be bounded, which holds whenever the polytope
    /// includes a bounding box. With the dozen planes a frustum-and-bounds
    /// query carries this is a few hundred 3x3 solves.
    pub fn minimize(&self, objective: DVec3) -> Option<DVec3> {
        let planes: Vec<HalfSpace> = self.half_spaces.iter().map(HalfSpace::normalized).collect();
        let mut best: Option<(f64, DVec3)> = None;
        for i in 0..planes.len() {
            for j in (i + 1)..planes.len() {
                for k in (j + 1)..planes.len() {
                    let m = DMat3::from_cols(planes[i].normal, planes[j].normal, planes[k].normal)
                        .transpose();
                    if m.determinant().abs() < 1e-12 {
                        continue;
                    }
                    let p = m.inverse()
                        * DVec3::new(planes[i].distance, planes[j].distance, planes[k].distance);
                    // Tolerance absorbs the 3x3 solve's rounding so genuine
                    // vertices are not rejected by their own defining planes.
                    let tol = 1e-7 * p.length().max(1.0);
                    if planes.iter().all(|h| h.signed_distance(p) >= -tol) {
                        let score = objective.dot(p);
                        if best.is_none_or(|(s, _)| score < s) {
                            best = Some((score, p));
                        }
                    }
                }
            }
        }
        best.map(|(_, p)| p)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn half_space_feasibility() {
        let h = HalfSpace::new(DVec3::X, 1.5);
        assert!(h.contains(DVec3::new(2.0, -3.0, 7.0)));
        assert!(h.contains(DVec3::new(1.5, 0.0, 0.0)));
        assert!(!h.contains(DVec3::new(1.0, 0.0, 0.0)));
        assert_relative_eq!(h.signed_distance(DVec3::new(4.0, 0.0, 0.0)), 2.5);
    }

    #[test]
    fn coefficients_round_trip() {
        let h = HalfSpace::new(DVec3::new(0.0, -2.0, 1.0), 3.0);
        let back = HalfSpace::from_coefficients(h.coefficients());
        assert_eq!(h, back);
    }

    #[test]
    fn aabb_polytope_matches_box() {
        let b = ConvexPolytope::aabb(DVec3::ZERO, DVec3::splat(2.0));
        assert!(b.contains(DVec3::splat(1.0)));
        assert!(b.contains(DVec3::ZERO));
        assert!(!b.contains(DVec3::new(1.0, 2.1, 1.0)));
        assert!(!b.strictly_contains(DVec3::ZERO));
        assert!(b.strictly_contains(DVec3::splat(0.1)));
    }

    #[test]
    fn dilation_admits_points_whose_box_overlaps() {
        // Feasible x >= 1.0; boxes are p + [-0.5, 0.5].
        let h = HalfSpace::new(DVec3::X, 1.0).dilated(DVec3::splat(-0.5), DVec3::splat(0.5));
        // Box [0.5, 1.5] around p = 1.0 reaches past the plane.
        assert!(h.signed_distance(DVec3::new(1.0, 0.0, 0.0)) > 0.0);
        // Box [-0.5, 0.5] around the origin ends short of it.
        assert!(h.signed_distance(DVec3::ZERO) < 0.0);
    }

    #[test]
    fn dilation_uses_extremal_corner_per_axis() {
        let h = HalfSpace::new(DVec3::new(-1.0, 0.0, 0.0), -4.0); // x <= 4
        let d = h.dilated(DVec3::splat(-0.5), DVec3::splat(1.5));
        // Extremal corner along -x is the lower bound -0.5.
        assert_relative_eq!(d.distance, -4.0 - 0.5);
    }

    #[test]
    fn rescale_changes_units_not_feasibility() {
        // x >= 3.0 in voxel units, cells two voxels wide: g feasible iff 2g >= 3.
        let h = HalfSpace::new(DVec3::X, 3.0).rescaled(DVec3::new(2.0, 1.0, 1.0));
        assert!(h.contains(DVec3::new(2.0, 0.0, 0.0)));
        assert!(!h.contains(DVec3::new(1.0, 0.0, 0.0)));
        assert_relative_eq!(h.normal.length(), 1.0);
    }

    #[test]
    fn preimage_of_translation() {
        let screen = ConvexPolytope::aabb(DVec3::ZERO, DVec3::splat(1.0));
        let m = DMat4::from_translation(DVec3::new(10.0, 0.0, 0.0));
        let source = screen.preimage(&m);
        // m maps source -10 to screen 0.
        assert!(source.contains(DVec3::new(-10.0, 0.5, 0.5)));
        assert!(source.contains(DVec3::new(-9.0, 0.5, 0.5)));
        assert!(!source.contains(DVec3::new(-8.9, 0.5, 0.5)));
    }

    #[test]
    fn preimage_through_perspective_matches_pointwise_projection() {
        let ndc = ConvexPolytope::aabb(DVec3::splat(-1.0), DVec3::splat(1.0));
        let proj = DMat4::perspective_rh_gl(std::f64::consts::FRAC_PI_3, 1.0, 0.1, 100.0);
        let view = DMat4::from_translation(DVec3::new(0.0, 0.0, -5.0));
        let m = proj * view;
        let frustum = ndc.preimage(&m);

        for p in [
            DVec3::new(0.0, 0.0, 0.0),
            DVec3::new(0.4, -0.3, 1.0),
            DVec3::new(3.0, 3.0, 0.0),
            DVec3::new(0.0, 0.0, 4.95),
            DVec3::new(0.0, 0.0, -90.0),
            DVec3::new(0.0, 40.0, -90.0),
        ] {
            let q = m.project_point3(p);
            assert_eq!(
                frustum.contains(p),
                ndc.contains(q),
                "disagreement at {p:?} (ndc {q:?})"
            );
        }
    }

    #[test]
    fn minimize_finds_box_corner() {
        let b = ConvexPolytope::aabb(DVec3::new(1.0, 2.0, 3.0), DVec3::new(4.0, 5.0, 6.0));
        let p = b.minimize(DVec3::ONE).unwrap();
        assert_relative_eq!(p.x, 1.0, epsilon = 1e-9);
        assert_relative_eq!(p.y, 2.0, epsilon = 1e-9);
        assert_relative_eq!(p.z, 3.0, epsilon = 1e-9);
    }

    #[test]
    fn minimize_along_single_axis() {
        let b = ConvexPolytope::aabb(DVec3::ZERO, DVec3::splat(2.0));
        let p = b.minimize(DVec3::NEG_X).unwrap();
        // Maximizing x; any vertex of the x = 2 face qualifies.
        assert_relative_eq!(p.x, 2.0, epsilon = 1e-9);
    }

    #[test]
    fn minimize_reports_empty_region() {
        let mut b = ConvexPolytope::aabb(DVec3::ZERO, DVec3::splat(1.0));
        b.push(HalfSpace::new(DVec3::X, 2.0)); // x >= 2 contradicts x <= 1
        assert!(b.minimize(DVec3::ONE).is_none());
    }

    #[test]
    fn minimize_with_oblique_planes() {
        let mut b = ConvexPolytope::aabb(DVec3::splat(-4.0), DVec3::splat(4.0));
        // x + y + z >= 3 cuts the lower corner off.
        b.push(HalfSpace::new(DVec3::ONE.normalize(), 3.0 / 3.0_f64.sqrt()));
        let p = b.minimize(DVec3::ONE).unwrap();
        assert_relative_eq!(p.x + p.y + p.z, 3.0, epsilon = 1e-7);
    }
}
