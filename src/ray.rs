use crate::{
    error::{Error, Result},
    material::Material,
};
use glam::{vec3, Vec3};
use std::sync::Arc;

/// The ray data type
#[derive(Clone, Copy, Debug, Default)]
pub struct Ray {
    pub origin: Vec3,
    pub direction: Vec3,
    pub inv_direction: Vec3,
}

impl Ray {
    pub fn new(origin: Vec3, direction: Vec3) -> Self {
        let inv_direction = vec3(
            1.0 / direction.x,
            1.0 / direction.y,
            1.0 / direction.z,
        );

        Self {
            origin,
            direction,
            inv_direction,
        }
    }

    /// Same as `new`, but rejects directions that can't parameterise a ray.
    pub fn try_new(origin: Vec3, direction: Vec3) -> Result<Self> {
        let length = direction.length();
        if length > 0.0 && length.is_finite() {
            Ok(Self::new(origin, direction))
        } else {
            Err(Error::DegenerateRay(direction))
        }
    }

    pub fn point_at_parameter(&self, t: f32) -> Vec3 {
        self.origin + t * self.direction
    }
}

/// Contains data to be used in the generation of a new ray as a result of an intersection.
#[derive(Clone, Debug)]
pub struct Hit {
    pub t: f32,
    pub point: Vec3,
    pub normal: Vec3,
    /// Whether the ray arrived from the side the outward normal points to
    pub front_face: bool,
    pub u: f32,
    pub v: f32,
    pub material: Option<Arc<dyn Material>>,
}

impl Hit {
    /// Stores the normal facing against the ray.
    pub fn set_face_normal(&mut self, ray: &Ray, outward_normal: Vec3) {
        self.front_face = ray.direction.dot(outward_normal) < 0.0;
        self.normal = if self.front_face {
            outward_normal
        } else {
            -outward_normal
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn point_at_parameter_walks_along_direction() {
        let ray = Ray::new(vec3(1.0, 0.0, 0.0), vec3(0.0, 2.0, 0.0));
        assert_eq!(ray.point_at_parameter(1.5), vec3(1.0, 3.0, 0.0));
    }

    #[test]
    fn zero_direction_is_rejected() {
        assert!(matches!(
            Ray::try_new(Vec3::zero(), Vec3::zero()),
            Err(Error::DegenerateRay(_))
        ));
        assert!(Ray::try_new(Vec3::zero(), vec3(f32::NAN, 0.0, 0.0)).is_err());
        assert!(Ray::try_new(Vec3::zero(), Vec3::unit_z()).is_ok());
    }

    #[test]
    fn face_normal_points_against_ray() {
        let ray = Ray::new(Vec3::zero(), Vec3::unit_x());
        let mut hit = Hit {
            t: 1.0,
            point: Vec3::unit_x(),
            normal: Vec3::zero(),
            front_face: false,
            u: 0.0,
            v: 0.0,
            material: None,
        };

        hit.set_face_normal(&ray, -Vec3::unit_x());
        assert!(hit.front_face);
        assert_eq!(hit.normal, -Vec3::unit_x());

        hit.set_face_normal(&ray, Vec3::unit_x());
        assert!(!hit.front_face);
        assert_eq!(hit.normal, -Vec3::unit_x());
    }
}
