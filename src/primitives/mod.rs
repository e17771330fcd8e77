//! This module is full of scene nodes that all impl Intersect

mod aabb;
mod cuboid;
mod instance;
mod medium;
mod sphere;

pub use aabb::*;
pub use cuboid::*;
pub use instance::*;
pub use medium::*;
pub use sphere::*;

use crate::{
    ray::{Hit, Ray},
    rng::RandomGenerator,
};
use glam::Vec3;
use std::{fmt::Debug, sync::Arc};

/// Computes whether a ray intersects a scene node.
///
/// Nodes are shared through `Arc` and only ever refer to nodes built before them, so
/// the scene graph is acyclic and nothing here walks it looking for cycles.
pub trait Intersect: Debug + Send + Sync {
    /// Computes the nearest intersection with the node strictly inside `(t_min, t_max)`.
    ///
    /// Stochastic nodes draw their samples from `rng`.
    fn intersection(
        &self,
        rng: &mut dyn RandomGenerator,
        ray: Ray,
        t_min: f32,
        t_max: f32,
    ) -> Option<Hit>;

    /// Generate a bounds for the node over the time interval `[t0, t1]`
    fn bounds(&self, t0: f32, t1: f32) -> Option<AABB>;

    /// A new node with its own identity that shares its children with `self`.
    fn clone_node(&self) -> Arc<dyn Intersect>;

    /// Density of `random` with respect to solid angle, as seen from `origin`.
    fn pdf_value(&self, _rng: &mut dyn RandomGenerator, _origin: Vec3, _direction: Vec3) -> f32 {
        0.0
    }

    /// A direction from `origin` towards the node.
    fn random(&self, _rng: &mut dyn RandomGenerator, _origin: Vec3) -> Vec3 {
        Vec3::unit_x()
    }
}
