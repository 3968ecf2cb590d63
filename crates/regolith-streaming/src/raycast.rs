//! Ray/triangle intersection (Möller–Trumbore).

use glam::Vec3;
use regolith_mesh::TerrainMesh;

const DET_EPSILON: f32 = 1e-10;
const T_EPSILON: f32 = 1e-6;

/// A ray `origin + t · direction`, `t ≥ 0`.
///
/// `direction` need not be normalized; hit distances are measured in
/// multiples of it.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Ray {
    pub origin: Vec3,
    pub direction: Vec3,
}

impl Ray {
    pub fn new(origin: Vec3, direction: Vec3) -> Self {
        Self { origin, direction }
    }

    /// Ray from `origin` through `target`; `t = 1` lands on the target.
    pub fn through(origin: Vec3, target: Vec3) -> Self {
        Self::new(origin, target - origin)
    }

    pub fn at(&self, t: f32) -> Vec3 {
        self.origin + self.direction * t
    }
}

/// Parametric distance to the triangle `[a, b, c]`, hitting either face.
pub fn intersect_triangle(ray: &Ray, [a, b, c]: [Vec3; 3]) -> Option<f32> {
    let e1 = b - a;
    let e2 = c - a;
    let p = ray.direction.cross(e2);
    let det = e1.dot(p);
    if det.abs() < DET_EPSILON {
        return None;
    }
    let inv_det = 1.0 / det;

    let s = ray.origin - a;
    let u = s.dot(p) * inv_det;
    if !(0.0..=1.0).contains(&u) {
        return None;
    }
    let q = s.cross(e1);
    let v = ray.direction.dot(q) * inv_det;
    if v < 0.0 || u + v > 1.0 {
        return None;
    }
    let t = e2.dot(q) * inv_det;
    (t > T_EPSILON).then_some(t)
}

/// Nearest hit against any triangle of `mesh`.
pub fn intersect_mesh(ray: &Ray, mesh: &TerrainMesh) -> Option<f32> {
    mesh.triangles()
        .filter_map(|triangle| intersect_triangle(ray, triangle))
        .min_by(f32::total_cmp)
}

#[cfg(test)]
mod tests {
    use regolith_mesh::IndexBuffer;

    use super::*;

    const TRI: [Vec3; 3] = [
        Vec3::new(0.0, 0.0, 0.0),
        Vec3::new(0.0, 0.0, 1.0),
        Vec3::new(1.0, 0.0, 0.0),
    ];

    #[test]
    fn test_hit_from_above_and_below() {
        let down = Ray::new(Vec3::new(0.25, 2.0, 0.25), Vec3::NEG_Y);
        assert!((intersect_triangle(&down, TRI).unwrap() - 2.0).abs() < 1e-6);
        let up = Ray::new(Vec3::new(0.25, -3.0, 0.25), Vec3::Y);
        assert!((intersect_triangle(&up, TRI).unwrap() - 3.0).abs() < 1e-6);
    }

    #[test]
    fn test_miss_outside_and_behind() {
        let outside = Ray::new(Vec3::new(0.9, 2.0, 0.9), Vec3::NEG_Y);
        assert!(intersect_triangle(&outside, TRI).is_none());
        let behind = Ray::new(Vec3::new(0.25, 2.0, 0.25), Vec3::Y);
        assert!(intersect_triangle(&behind, TRI).is_none());
        let parallel = Ray::new(Vec3::new(-1.0, 0.0, 0.25), Vec3::X);
        assert!(intersect_triangle(&parallel, TRI).is_none());
    }

    #[test]
    fn test_through_scales_distance_to_target() {
        let ray = Ray::through(Vec3::new(0.25, 4.0, 0.25), Vec3::new(0.25, 2.0, 0.25));
        assert!((intersect_triangle(&ray, TRI).unwrap() - 2.0).abs() < 1e-6);
        assert_eq!(ray.at(1.0), Vec3::new(0.25, 2.0, 0.25));
    }

    #[test]
    fn test_mesh_reports_nearest() {
        let mesh = TerrainMesh {
            positions: vec![
                [0.0, 0.0, 0.0],
                [0.0, 0.0, 1.0],
                [1.0, 0.0, 0.0],
                [0.0, 1.0, 0.0],
                [0.0, 1.0, 1.0],
                [1.0, 1.0, 0.0],
            ],
            indices: IndexBuffer::U16(vec![0, 1, 2, 3, 4, 5]),
        };
        let ray = Ray::new(Vec3::new(0.2, 5.0, 0.2), Vec3::NEG_Y);
        assert!((intersect_mesh(&ray, &mesh).unwrap() - 4.0).abs() < 1e-5);
        assert!(intersect_mesh(&ray, &TerrainMesh::empty()).is_none());
    }
}
