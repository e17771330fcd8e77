use crate::{
    ray::{Hit, Ray},
    rng::RandomGenerator,
    textures::{Texture, UniformTexture},
};
use glam::{vec3, Vec3};
use rand::Rng;
use rand_distr::{Distribution, UnitSphere};
use std::{fmt::Debug, sync::Arc};

// Samples a random point on the unit sphere
pub fn sample_unit_sphere(rng: &mut dyn RandomGenerator) -> Vec3 {
    let [x, y, z]: [f32; 3] = UnitSphere.sample(rng);
    vec3(x, y, z)
}

// Reflect vector v around normal n
pub fn reflect(v: Vec3, n: Vec3) -> Vec3 {
    v - 2.0 * v.dot(n) * n
}

// Refract unit vector uv through normal n and return only if successfull
pub fn refract(uv: Vec3, n: Vec3, ni_over_nt: f32) -> Option<Vec3> {
    let dt = uv.dot(n);
    let discriminant = 1.0 - ni_over_nt * ni_over_nt * (1.0 - dt * dt);

    if discriminant > 0.0 {
        let refracted = ni_over_nt * (uv - n * dt) - n * f32::sqrt(discriminant);
        Some(refracted)
    } else {
        None
    }
}

// An approximation for reflectivity
pub fn schlick(cosine: f32, reflection_index: f32) -> f32 {
    let r_0 = (1.0 - reflection_index) / (1.0 + reflection_index);
    let r_0 = r_0 * r_0;

    r_0 + (1.0 - r_0) * f32::powf(1.0 - cosine, 5.0)
}

pub struct ScatterResult {
    pub scattered: Ray,
    pub attenuation: Vec3,
}

pub trait Material: Debug + Send + Sync {
    fn scatter(&self, ray: Ray, hit: &Hit, rng: &mut dyn RandomGenerator)
        -> Option<ScatterResult>;

    /// Light given off at the hit, black for everything but lights
    fn emitted(&self, _u: f32, _v: f32, _point: Vec3) -> Vec3 {
        Vec3::zero()
    }
}

#[derive(Debug)]
pub struct Lambertian {
    pub albedo: Arc<dyn Texture>,
}

impl Lambertian {
    pub fn new(albedo: Arc<dyn Texture>) -> Self {
        Self { albedo }
    }

    pub fn from_color(albedo: Vec3) -> Self {
        Self::new(Arc::new(UniformTexture::new(albedo)))
    }
}

impl Material for Lambertian {
    fn scatter(
        &self,
        _ray: Ray,
        hit: &Hit,
        rng: &mut dyn RandomGenerator,
    ) -> Option<ScatterResult> {
        let direction = hit.normal + sample_unit_sphere(rng);
        // Catch the sample landing opposite the normal
        let direction = if direction.dot(direction) < 1e-8 {
            hit.normal
        } else {
            direction
        };

        Some(ScatterResult {
            scattered: Ray::new(hit.point, direction),
            attenuation: self.albedo.value(hit.u, hit.v, hit.point),
        })
    }
}

#[derive(Debug)]
pub struct Metal {
    pub albedo: Vec3,
    pub fuzz: f32,
}

impl Metal {
    pub fn new(albedo: Vec3, fuzz: f32) -> Self {
        Self {
            albedo,
            fuzz: fuzz.min(1.0),
        }
    }
}

impl Material for Metal {
    fn scatter(&self, ray: Ray, hit: &Hit, rng: &mut dyn RandomGenerator) -> Option<ScatterResult> {
        let reflected = reflect(ray.direction.normalize(), hit.normal);
        let scattered = Ray::new(hit.point, reflected + self.fuzz * sample_unit_sphere(rng));

        if scattered.direction.dot(hit.normal) > 0.0 {
            Some(ScatterResult {
                scattered,
                attenuation: self.albedo,
            })
        } else {
            None
        }
    }
}

#[derive(Debug)]
pub struct Dielectric {
    reflection_index: f32,
}

impl Dielectric {
    pub fn new(reflection_index: f32) -> Self {
        Self { reflection_index }
    }
}

impl Material for Dielectric {
    fn scatter(&self, ray: Ray, hit: &Hit, rng: &mut dyn RandomGenerator) -> Option<ScatterResult> {
        let ni_over_nt = if hit.front_face {
            1.0 / self.reflection_index
        } else {
            self.reflection_index
        };

        let unit_direction = ray.direction.normalize();
        let cosine = (-unit_direction.dot(hit.normal)).max(0.0).min(1.0);
        let refracted = refract(unit_direction, hit.normal, ni_over_nt);

        // Probability decides if we reflect or refract
        let direction = match refracted {
            Some(refracted) if !rng.gen_bool(schlick(cosine, self.reflection_index).into()) => {
                refracted
            }
            _ => reflect(unit_direction, hit.normal),
        };

        Some(ScatterResult {
            scattered: Ray::new(hit.point, direction),
            attenuation: Vec3::one(),
        })
    }
}

/// An emitter, it never scatters
#[derive(Debug)]
pub struct DiffuseLight {
    emit: Arc<dyn Texture>,
}

impl DiffuseLight {
    pub fn new(emit: Arc<dyn Texture>) -> Self {
        Self { emit }
    }

    pub fn from_color(color: Vec3) -> Self {
        Self::new(Arc::new(UniformTexture::new(color)))
    }
}

impl Material for DiffuseLight {
    fn scatter(
        &self,
        _ray: Ray,
        _hit: &Hit,
        _rng: &mut dyn RandomGenerator,
    ) -> Option<ScatterResult> {
        None
    }

    fn emitted(&self, u: f32, v: f32, point: Vec3) -> Vec3 {
        self.emit.value(u, v, point)
    }
}

/// Phase function of a participating medium, scatters equally in every direction.
#[derive(Debug)]
pub struct Isotropic {
    albedo: Arc<dyn Texture>,
}

impl Isotropic {
    pub fn new(albedo: Arc<dyn Texture>) -> Self {
        Self { albedo }
    }

    pub fn from_color(color: Vec3) -> Self {
        Self::new(Arc::new(UniformTexture::new(color)))
    }
}

impl Material for Isotropic {
    fn scatter(
        &self,
        _ray: Ray,
        hit: &Hit,
        rng: &mut dyn RandomGenerator,
    ) -> Option<ScatterResult> {
        Some(ScatterResult {
            scattered: Ray::new(hit.point, sample_unit_sphere(rng)),
            attenuation: self.albedo.value(hit.u, hit.v, hit.point),
        })
    }
}
