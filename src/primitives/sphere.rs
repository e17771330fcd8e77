use crate::{
    material::Material,
    primitives::{Intersect, AABB},
    ray::{Hit, Ray},
    rng::RandomGenerator,
};
use glam::{vec3, Vec3};
use std::{f32::consts::PI, sync::Arc};

#[derive(Clone, Debug)]
pub struct Sphere {
    center: Vec3,
    radius: f32,
    material: Option<Arc<dyn Material>>,
}

impl Sphere {
    pub fn new(center: Vec3, radius: f32) -> Self {
        Self {
            center,
            radius,
            material: None,
        }
    }

    pub fn with_material(mut self, material: Arc<dyn Material>) -> Self {
        self.material = Some(material);
        self
    }

    // Texture coordinates of a point on the unit sphere
    fn uv(p: Vec3) -> (f32, f32) {
        let theta = f32::acos(-p.y);
        let phi = f32::atan2(-p.z, p.x) + PI;

        (phi / (2.0 * PI), theta / PI)
    }
}

impl Intersect for Sphere {
    fn intersection(
        &self,
        _rng: &mut dyn RandomGenerator,
        ray: Ray,
        t_min: f32,
        t_max: f32,
    ) -> Option<Hit> {
        let oc = ray.origin - self.center;
        let a = ray.direction.dot(ray.direction);
        let b = oc.dot(ray.direction);
        let c = oc.dot(oc) - self.radius * self.radius;
        let discriminant = b * b - a * c;

        if discriminant > 0.0 {
            let root = f32::sqrt(discriminant);
            let t_1 = (-b - root) / a;
            let t_2 = (-b + root) / a;

            for &t in &[t_1, t_2] {
                if t_min < t && t < t_max {
                    let point = ray.point_at_parameter(t);
                    let outward_normal = (point - self.center) / self.radius;
                    let (u, v) = Self::uv(outward_normal);

                    let mut hit = Hit {
                        t,
                        point,
                        normal: outward_normal,
                        front_face: true,
                        u,
                        v,
                        material: self.material.clone(),
                    };
                    hit.set_face_normal(&ray, outward_normal);

                    return Some(hit);
                }
            }
        }

        None
    }

    fn bounds(&self, _t0: f32, _t1: f32) -> Option<AABB> {
        Some(AABB::new(
            self.center - vec3(self.radius, self.radius, self.radius),
            self.center + vec3(self.radius, self.radius, self.radius),
        ))
    }

    fn clone_node(&self) -> Arc<dyn Intersect> {
        Arc::new(self.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rng::seeded;

    fn unit_sphere() -> Sphere {
        Sphere::new(Vec3::zero(), 1.0)
    }

    #[test]
    fn ray_through_center_hits_near_side() {
        let mut rng = seeded(0);
        let ray = Ray::new(vec3(-2.0, 0.0, 0.0), vec3(1.0, 0.0, 0.0));
        let hit = unit_sphere()
            .intersection(&mut rng, ray, 0.0001, f32::MAX)
            .unwrap();

        assert!((hit.t - 1.0).abs() < 1e-5);
        assert!(hit.front_face);
        assert!((hit.normal - vec3(-1.0, 0.0, 0.0)).length() < 1e-5);
    }

    #[test]
    fn interval_past_entry_finds_exit() {
        let mut rng = seeded(0);
        let ray = Ray::new(vec3(-2.0, 0.0, 0.0), vec3(1.0, 0.0, 0.0));
        let hit = unit_sphere()
            .intersection(&mut rng, ray, 1.0001, f32::MAX)
            .unwrap();

        assert!((hit.t - 3.0).abs() < 1e-5);
        assert!(!hit.front_face);
        assert!((hit.normal - vec3(-1.0, 0.0, 0.0)).length() < 1e-5);
    }

    #[test]
    fn unbounded_search_finds_crossings_behind_origin() {
        let mut rng = seeded(0);
        let ray = Ray::new(Vec3::zero(), vec3(0.0, 0.0, 1.0));
        let hit = unit_sphere()
            .intersection(&mut rng, ray, -f32::MAX, f32::MAX)
            .unwrap();

        assert!((hit.t + 1.0).abs() < 1e-5);
    }

    #[test]
    fn ray_beside_sphere_misses() {
        let mut rng = seeded(0);
        let ray = Ray::new(vec3(-2.0, 1.5, 0.0), vec3(1.0, 0.0, 0.0));
        assert!(unit_sphere()
            .intersection(&mut rng, ray, -f32::MAX, f32::MAX)
            .is_none());
    }

    #[test]
    fn hit_carries_material() {
        let material: Arc<dyn Material> =
            Arc::new(crate::material::Lambertian::from_color(Vec3::one()));
        let sphere = unit_sphere().with_material(material.clone());
        let ray = Ray::new(vec3(-2.0, 0.0, 0.0), vec3(1.0, 0.0, 0.0));
        let hit = sphere
            .intersection(&mut seeded(0), ray, 0.0, f32::MAX)
            .unwrap();

        assert!(Arc::ptr_eq(hit.material.as_ref().unwrap(), &material));
    }

    #[test]
    fn uv_covers_poles() {
        let (_, v) = Sphere::uv(vec3(0.0, -1.0, 0.0));
        assert!(v.abs() < 1e-5);
        let (_, v) = Sphere::uv(vec3(0.0, 1.0, 0.0));
        assert!((v - 1.0).abs() < 1e-5);
    }

    #[test]
    fn shapes_are_not_light_sampling_targets() {
        let mut rng = seeded(0);
        let sphere = Sphere::new(vec3(0.0, 0.0, -5.0), 1.0);

        assert_eq!(sphere.pdf_value(&mut rng, Vec3::zero(), -Vec3::unit_z()), 0.0);
        assert_eq!(sphere.random(&mut rng, Vec3::zero()), Vec3::unit_x());
    }
}
