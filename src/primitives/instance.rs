use crate::{
    material::Material,
    primitives::{Intersect, AABB},
    ray::{Hit, Ray},
    rng::RandomGenerator,
};
use glam::Vec3;
use std::sync::Arc;

/// A translated view of a shared node.
///
/// The material, when set, replaces whatever material the node reports.
#[derive(Clone, Debug)]
pub struct Instance {
    primitive: Arc<dyn Intersect>,
    material: Option<Arc<dyn Material>>,
    translation: Vec3,
}

impl Instance {
    pub fn new(primitive: Arc<dyn Intersect>, translation: Vec3) -> Self {
        Self {
            primitive,
            material: None,
            translation,
        }
    }

    pub fn with_material(mut self, material: Arc<dyn Material>) -> Self {
        self.material = Some(material);
        self
    }
}

impl Intersect for Instance {
    fn intersection(
        &self,
        rng: &mut dyn RandomGenerator,
        ray: Ray,
        t_min: f32,
        t_max: f32,
    ) -> Option<Hit> {
        let ray = Ray::new(ray.origin - self.translation, ray.direction);

        self.primitive
            .intersection(rng, ray, t_min, t_max)
            .map(|mut hit| {
                hit.point += self.translation;
                if let Some(material) = &self.material {
                    hit.material = Some(material.clone());
                }
                hit
            })
    }

    fn bounds(&self, t0: f32, t1: f32) -> Option<AABB> {
        self.primitive.bounds(t0, t1).map(|mut b| {
            b.min += self.translation;
            b.max += self.translation;

            b
        })
    }

    fn clone_node(&self) -> Arc<dyn Intersect> {
        Arc::new(self.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{material::Lambertian, primitives::Sphere, rng::seeded};
    use glam::vec3;

    #[test]
    fn translates_hits_and_bounds() {
        let sphere: Arc<dyn Intersect> = Arc::new(Sphere::new(Vec3::zero(), 1.0));
        let instance = Instance::new(sphere, vec3(0.0, 5.0, 0.0));
        let ray = Ray::new(vec3(-3.0, 5.0, 0.0), vec3(1.0, 0.0, 0.0));

        let hit = instance
            .intersection(&mut seeded(0), ray, 0.0, f32::MAX)
            .unwrap();
        assert!((hit.point - vec3(-1.0, 5.0, 0.0)).length() < 1e-5);

        let bounds = instance.bounds(0.0, 1.0).unwrap();
        assert_eq!(bounds.min, vec3(-1.0, 4.0, -1.0));
        assert_eq!(bounds.max, vec3(1.0, 6.0, 1.0));
    }

    #[test]
    fn material_overrides_only_when_set() {
        let inner: Arc<dyn Material> = Arc::new(Lambertian::from_color(Vec3::one()));
        let outer: Arc<dyn Material> = Arc::new(Lambertian::from_color(Vec3::zero()));
        let sphere: Arc<dyn Intersect> =
            Arc::new(Sphere::new(Vec3::zero(), 1.0).with_material(inner.clone()));
        let ray = Ray::new(vec3(-3.0, 0.0, 0.0), vec3(1.0, 0.0, 0.0));

        let plain = Instance::new(sphere.clone(), Vec3::zero());
        let hit = plain.intersection(&mut seeded(0), ray, 0.0, f32::MAX).unwrap();
        assert!(Arc::ptr_eq(hit.material.as_ref().unwrap(), &inner));

        let painted = Instance::new(sphere, Vec3::zero()).with_material(outer.clone());
        let hit = painted
            .intersection(&mut seeded(0), ray, 0.0, f32::MAX)
            .unwrap();
        assert!(Arc::ptr_eq(hit.material.as_ref().unwrap(), &outer));
    }
}
