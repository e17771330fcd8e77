use crate::{
    bvh::{Axis, GetAxis},
    ray::Ray,
};
use glam::{vec3, Vec3};

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct AABB {
    pub min: Vec3,
    pub max: Vec3,
}

impl AABB {
    pub fn new(min: Vec3, max: Vec3) -> Self {
        Self { min, max }
    }

    /// An AABB around a single point
    pub fn point(point: Vec3) -> Self {
        Self::new(point, point)
    }

    // Create a union AABB of two AABBs that surrounds both of them
    pub fn union(self, other: AABB) -> Self {
        let min = vec3(
            self.min.x.min(other.min.x),
            self.min.y.min(other.min.y),
            self.min.z.min(other.min.z),
        );
        let max = vec3(
            self.max.x.max(other.max.x),
            self.max.y.max(other.max.y),
            self.max.z.max(other.max.z),
        );

        AABB::new(min, max)
    }

    pub fn point_union(self, other: Vec3) -> Self {
        self.union(AABB::point(other))
    }

    pub fn center(&self) -> Vec3 {
        0.5 * (self.min + self.max)
    }

    // Returns the axis which has greatest extent
    pub fn max_extent(&self) -> Axis {
        let extent = self.max - self.min;

        if extent.x > extent.y && extent.x > extent.z {
            Axis::X
        } else if extent.y > extent.z {
            Axis::Y
        } else {
            Axis::Z
        }
    }

    pub fn extent(&self, axis: Axis) -> f32 {
        self.max.axis(axis) - self.min.axis(axis)
    }

    pub fn surface_area(&self) -> f32 {
        let d = self.max - self.min;
        2.0 * (d.x * d.y + d.x * d.z + d.y * d.z)
    }

    /// The parametric interval the ray spends inside the box, if any.
    pub fn slab(&self, ray: &Ray) -> Option<(f32, f32)> {
        let t1 = (self.min - ray.origin) * ray.inv_direction;
        let t2 = (self.max - ray.origin) * ray.inv_direction;

        // X
        let tmin = f32::min(t1.x, t2.x);
        let tmax = f32::max(t2.x, t1.x);

        // Y
        let tmin = f32::max(tmin, f32::min(t1.y, t2.y));
        let tmax = f32::min(tmax, f32::max(t1.y, t2.y));

        // Z
        let tmin = f32::max(tmin, f32::min(t1.z, t2.z));
        let tmax = f32::min(tmax, f32::max(t1.z, t2.z));

        if tmin <= tmax {
            Some((tmin, tmax))
        } else {
            None
        }
    }

    // Taken from tavianator.com
    pub fn hit(&self, ray: &Ray, t_min: f32, t_max: f32) -> bool {
        match self.slab(ray) {
            Some((near, far)) => near.max(t_min) <= far.min(t_max),
            None => false,
        }
    }
}
