//! Homogeneous participating media such as fog and smoke.

use crate::{
    error::{Error, Result},
    material::{Isotropic, Material},
    primitives::{Intersect, AABB},
    ray::{Hit, Ray},
    rng::RandomGenerator,
    textures::Texture,
};
use glam::Vec3;
use log::debug;
use std::sync::Arc;

/// Lower end of the boundary search, far before anything in the scene.
pub const FAR_BEFORE: f32 = -f32::MAX;
/// Upper end of the boundary search, far past anything in the scene.
pub const FAR_AFTER: f32 = f32::MAX;
/// Keeps the exit query from finding the entry crossing a second time.
pub const EXIT_SEARCH_OFFSET: f32 = 0.0001;

/// A volume of constant density enclosed by a closed boundary shape.
///
/// A ray travelling a distance `d` through the volume passes it without scattering
/// with probability `exp(-density * d)`. No transmittance is ever applied: the
/// attenuation shows up only in how often [`intersection`](Intersect::intersection)
/// reports a scattering event.
///
/// Only the geometry of the boundary is used. Every hit carries the isotropic phase
/// material of the medium, never the material of the boundary.
#[derive(Clone, Debug)]
pub struct ConstantMedium {
    boundary: Arc<dyn Intersect>,
    phase_material: Arc<dyn Material>,
    neg_inv_density: f32,
}

impl ConstantMedium {
    /// A medium whose scattering albedo is sampled from `texture`.
    pub fn with_texture(
        boundary: Arc<dyn Intersect>,
        density: f32,
        texture: Arc<dyn Texture>,
    ) -> Result<Self> {
        Self::new(boundary, density, Arc::new(Isotropic::new(texture)))
    }

    /// A medium with a uniform scattering albedo.
    pub fn with_color(boundary: Arc<dyn Intersect>, density: f32, color: Vec3) -> Result<Self> {
        Self::new(boundary, density, Arc::new(Isotropic::from_color(color)))
    }

    fn new(
        boundary: Arc<dyn Intersect>,
        density: f32,
        phase_material: Arc<dyn Material>,
    ) -> Result<Self> {
        if density.is_nan() || density <= 0.0 {
            return Err(Error::NonPositiveDensity(density));
        }

        Ok(Self {
            boundary,
            phase_material,
            neg_inv_density: -1.0 / density,
        })
    }

    pub fn density(&self) -> f32 {
        -1.0 / self.neg_inv_density
    }

    pub fn boundary(&self) -> &Arc<dyn Intersect> {
        &self.boundary
    }

    pub fn phase_material(&self) -> &Arc<dyn Material> {
        &self.phase_material
    }
}

impl Intersect for ConstantMedium {
    fn intersection(
        &self,
        rng: &mut dyn RandomGenerator,
        ray: Ray,
        t_min: f32,
        t_max: f32,
    ) -> Option<Hit> {
        let ray_length = ray.direction.length();
        if ray_length == 0.0 || !ray_length.is_finite() {
            debug!("Degenerate ray direction {:?} passed to a medium", ray.direction);
            return None;
        }

        // The boundary reports its nearest crossing inside the queried interval whether
        // the ray enters or leaves there, so searching the whole line finds the entry and
        // searching past it finds the exit.
        let entry = self.boundary.intersection(rng, ray, FAR_BEFORE, FAR_AFTER)?;
        let exit = self
            .boundary
            .intersection(rng, ray, entry.t + EXIT_SEARCH_OFFSET, FAR_AFTER)?;

        let t_entry = entry.t.max(t_min);
        let t_exit = exit.t.min(t_max);
        if t_entry >= t_exit {
            return None;
        }

        // Nothing scatters behind the ray origin
        let t_entry = t_entry.max(0.0);

        let segment_length = (t_exit - t_entry) * ray_length;
        let free_path = self.neg_inv_density * rng.next_uniform().ln();
        if free_path > segment_length {
            return None;
        }

        let t = t_entry + free_path / ray_length;

        Some(Hit {
            t,
            point: ray.point_at_parameter(t),
            // Both are meaningless inside a volume
            normal: Vec3::unit_x(),
            front_face: true,
            u: 0.0,
            v: 0.0,
            material: Some(self.phase_material.clone()),
        })
    }

    fn bounds(&self, t0: f32, t1: f32) -> Option<AABB> {
        self.boundary.bounds(t0, t1)
    }

    fn clone_node(&self) -> Arc<dyn Intersect> {
        Arc::new(self.clone())
    }

    // Media can't be importance sampled as emitters. Integrators that need that have to
    // special case them.
    fn pdf_value(&self, _rng: &mut dyn RandomGenerator, _origin: Vec3, _direction: Vec3) -> f32 {
        0.0
    }

    fn random(&self, _rng: &mut dyn RandomGenerator, _origin: Vec3) -> Vec3 {
        Vec3::unit_x()
    }
}
