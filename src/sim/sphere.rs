//! Sphere-surface geometry
//!
//! Pure functions keeping entities glued to the playable surface:
//! - project an arbitrary point back onto the sphere
//! - great-circle tangent from one surface point toward another
//! - surface "up" orientation
//! - uniform random directions and direction slerp for wander targets

use glam::Vec3;
use rand::Rng;

/// Project a point onto the sphere surface: `center + normalize(point - center) * radius`.
///
/// Undefined when `point == center`; callers must guard.
#[inline]
pub fn project_onto_sphere(point: Vec3, center: Vec3, radius: f32) -> Vec3 {
    let direction = (point - center).normalize_or_zero();
    center + direction * radius
}

/// Great-circle tangent at `current` pointing toward `target`.
///
/// Returns `Vec3::ZERO` when the two surface points are radially aligned
/// (already at the target, or antipodal); callers treat that as "arrived".
pub fn tangent_direction(current: Vec3, target: Vec3, center: Vec3) -> Vec3 {
    let current_dir = (current - center).normalize_or_zero();
    let target_dir = (target - center).normalize_or_zero();
    current_dir
        .cross(target_dir)
        .cross(current_dir)
        .normalize_or_zero()
}

/// Outward surface normal at a position: the "up" orientation for anything
/// standing on the sphere.
#[inline]
pub fn surface_up(position: Vec3, center: Vec3) -> Vec3 {
    (position - center).normalize_or_zero()
}

/// Uniformly distributed direction on the unit sphere.
///
/// Samples z uniformly in [-1, 1] and the azimuth uniformly in [0, tau);
/// no rejection loop, so the RNG advances a fixed amount per call.
pub fn random_unit_vector(rng: &mut impl Rng) -> Vec3 {
    let z: f32 = rng.random_range(-1.0..=1.0);
    let theta: f32 = rng.random_range(0.0..std::f32::consts::TAU);
    let planar = (1.0 - z * z).max(0.0).sqrt();
    Vec3::new(planar * theta.cos(), planar * theta.sin(), z)
}

/// Spherical interpolation between two unit directions.
///
/// Near-parallel inputs fall back to a normalized lerp; antipodal inputs
/// rotate around an arbitrary perpendicular axis so the result is always a
/// unit vector.
pub fn slerp_direction(from: Vec3, to: Vec3, t: f32) -> Vec3 {
    let from = from.normalize_or_zero();
    let to = to.normalize_or_zero();
    if from == Vec3::ZERO || to == Vec3::ZERO {
        return from;
    }

    let dot = from.dot(to).clamp(-1.0, 1.0);
    if dot > 1.0 - 1e-6 {
        return from.lerp(to, t).normalize_or_zero();
    }
    if dot < -1.0 + 1e-6 {
        // Antipodal: rotate around any axis perpendicular to `from`
        let axis = pick_perpendicular(from);
        let angle = std::f32::consts::PI * t;
        return glam::Quat::from_axis_angle(axis, angle) * from;
    }

    let theta = dot.acos();
    let sin_theta = theta.sin();
    let a = ((1.0 - t) * theta).sin() / sin_theta;
    let b = (t * theta).sin() / sin_theta;
    (from * a + to * b).normalize_or_zero()
}

/// Any unit vector perpendicular to `v` (assumed non-zero).
fn pick_perpendicular(v: Vec3) -> Vec3 {
    let candidate = if v.x.abs() < 0.9 { Vec3::X } else { Vec3::Y };
    v.cross(candidate).normalize_or_zero()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consts::SURFACE_TOLERANCE;
    use proptest::prelude::*;
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    #[test]
    fn test_project_axis_point_exact() {
        let projected = project_onto_sphere(Vec3::new(100.0, 0.0, 0.0), Vec3::ZERO, 15.0);
        assert_eq!(projected, Vec3::new(15.0, 0.0, 0.0));
    }

    #[test]
    fn test_project_respects_offset_center() {
        let center = Vec3::new(3.0, -2.0, 1.0);
        let projected = project_onto_sphere(Vec3::new(40.0, 8.0, -12.0), center, 15.0);
        assert!((projected.distance(center) - 15.0).abs() < SURFACE_TOLERANCE);
    }

    #[test]
    fn test_tangent_is_perpendicular_to_normal() {
        let center = Vec3::ZERO;
        let current = Vec3::new(15.0, 0.0, 0.0);
        let target = Vec3::new(0.0, 15.0, 0.0);
        let tangent = tangent_direction(current, target, center);

        assert!((tangent.length() - 1.0).abs() < 1e-5);
        assert!(tangent.dot(surface_up(current, center)).abs() < 1e-5);
        // Points toward the target along the surface
        assert!(tangent.dot((target - current).normalize()) > 0.0);
    }

    #[test]
    fn test_tangent_zero_when_aligned() {
        let current = Vec3::new(15.0, 0.0, 0.0);
        let tangent = tangent_direction(current, current, Vec3::ZERO);
        assert_eq!(tangent, Vec3::ZERO);
    }

    #[test]
    fn test_random_unit_vectors_cover_both_hemispheres() {
        let mut rng = Pcg32::seed_from_u64(7);
        let mut above = 0;
        let mut below = 0;
        for _ in 0..200 {
            let v = random_unit_vector(&mut rng);
            assert!((v.length() - 1.0).abs() < 1e-5);
            if v.z > 0.0 {
                above += 1;
            } else {
                below += 1;
            }
        }
        assert!(above > 50 && below > 50);
    }

    #[test]
    fn test_slerp_endpoints_and_midpoint() {
        let from = Vec3::X;
        let to = Vec3::Y;
        assert!(slerp_direction(from, to, 0.0).distance(from) < 1e-5);
        assert!(slerp_direction(from, to, 1.0).distance(to) < 1e-5);

        let mid = slerp_direction(from, to, 0.5);
        assert!((mid.length() - 1.0).abs() < 1e-5);
        assert!((mid.dot(from) - mid.dot(to)).abs() < 1e-5);
    }

    #[test]
    fn test_slerp_antipodal_stays_unit_length() {
        let result = slerp_direction(Vec3::X, -Vec3::X, 0.5);
        assert!((result.length() - 1.0).abs() < 1e-5);
    }

    proptest! {
        #[test]
        fn prop_projection_lands_on_surface(
            x in -500.0f32..500.0,
            y in -500.0f32..500.0,
            z in -500.0f32..500.0,
        ) {
            let point = Vec3::new(x, y, z);
            prop_assume!(point.length() > 1e-3);
            let projected = project_onto_sphere(point, Vec3::ZERO, 15.0);
            prop_assert!((projected.length() - 15.0).abs() < SURFACE_TOLERANCE);
        }

        #[test]
        fn prop_slerp_preserves_unit_length(
            ax in -1.0f32..1.0, ay in -1.0f32..1.0, az in -1.0f32..1.0,
            bx in -1.0f32..1.0, by in -1.0f32..1.0, bz in -1.0f32..1.0,
            t in 0.0f32..1.0,
        ) {
            let a = Vec3::new(ax, ay, az);
            let b = Vec3::new(bx, by, bz);
            prop_assume!(a.length() > 1e-3 && b.length() > 1e-3);
            let result = slerp_direction(a, b, t);
            prop_assert!((result.length() - 1.0).abs() < 1e-4);
        }
    }
}
