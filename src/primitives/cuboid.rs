use crate::{
    bvh::{Axis, GetAxis},
    material::Material,
    primitives::{Intersect, AABB},
    ray::{Hit, Ray},
    rng::RandomGenerator,
};
use glam::Vec3;
use std::sync::Arc;

/// An axis aligned box, the usual container for a fog volume
#[derive(Clone, Debug)]
pub struct Cuboid {
    extent: AABB,
    material: Option<Arc<dyn Material>>,
}

impl Cuboid {
    pub fn new(min: Vec3, max: Vec3) -> Self {
        Self {
            extent: AABB::new(min, max),
            material: None,
        }
    }

    pub fn with_material(mut self, material: Arc<dyn Material>) -> Self {
        self.material = Some(material);
        self
    }

    // Normal of the face the point lies on
    fn outward_normal(&self, point: Vec3) -> Vec3 {
        let center = self.extent.center();
        let half = 0.5 * (self.extent.max - self.extent.min);
        let local = point - center;

        let axis = [Axis::X, Axis::Y, Axis::Z]
            .iter()
            .copied()
            .max_by(|&a, &b| {
                let da = (local.axis(a) / half.axis(a)).abs();
                let db = (local.axis(b) / half.axis(b)).abs();
                da.partial_cmp(&db).unwrap_or(std::cmp::Ordering::Equal)
            })
            .unwrap_or(Axis::X);

        let sign = local.axis(axis).signum();
        match axis {
            Axis::X => Vec3::unit_x() * sign,
            Axis::Y => Vec3::unit_y() * sign,
            Axis::Z => Vec3::unit_z() * sign,
        }
    }
}

impl Intersect for Cuboid {
    fn intersection(
        &self,
        _rng: &mut dyn RandomGenerator,
        ray: Ray,
        t_min: f32,
        t_max: f32,
    ) -> Option<Hit> {
        let (near, far) = self.extent.slab(&ray)?;

        // Either face may be the nearest one inside the interval
        for &t in &[near, far] {
            if t_min < t && t < t_max {
                let point = ray.point_at_parameter(t);
                let outward_normal = self.outward_normal(point);

                let mut hit = Hit {
                    t,
                    point,
                    normal: outward_normal,
                    front_face: true,
                    u: 0.0,
                    v: 0.0,
                    material: self.material.clone(),
                };
                hit.set_face_normal(&ray, outward_normal);

                return Some(hit);
            }
        }

        None
    }

    fn bounds(&self, _t0: f32, _t1: f32) -> Option<AABB> {
        Some(self.extent)
    }

    fn clone_node(&self) -> Arc<dyn Intersect> {
        Arc::new(self.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rng::seeded;
    use glam::vec3;

    fn cube() -> Cuboid {
        Cuboid::new(vec3(-1.0, -1.0, -1.0), vec3(1.0, 1.0, 1.0))
    }

    #[test]
    fn finds_entry_then_exit() {
        let mut rng = seeded(0);
        let ray = Ray::new(vec3(0.0, 0.0, -4.0), vec3(0.0, 0.0, 2.0));

        let entry = cube()
            .intersection(&mut rng, ray, -f32::MAX, f32::MAX)
            .unwrap();
        assert!((entry.t - 1.5).abs() < 1e-5);
        assert!(entry.front_face);
        assert!((entry.normal - vec3(0.0, 0.0, -1.0)).length() < 1e-5);

        let exit = cube()
            .intersection(&mut rng, ray, entry.t + 0.0001, f32::MAX)
            .unwrap();
        assert!((exit.t - 2.5).abs() < 1e-5);
        assert!(!exit.front_face);
    }

    #[test]
    fn origin_inside_reports_far_face() {
        let mut rng = seeded(0);
        let ray = Ray::new(Vec3::zero(), vec3(0.0, 1.0, 0.0));
        let hit = cube().intersection(&mut rng, ray, 0.0001, f32::MAX).unwrap();

        assert!((hit.t - 1.0).abs() < 1e-5);
        assert!((hit.point - vec3(0.0, 1.0, 0.0)).length() < 1e-5);
    }

    #[test]
    fn misses_outside_slabs() {
        let mut rng = seeded(0);
        let ray = Ray::new(vec3(3.0, 3.0, -4.0), vec3(0.0, 0.0, 1.0));
        assert!(cube()
            .intersection(&mut rng, ray, -f32::MAX, f32::MAX)
            .is_none());
    }
}
