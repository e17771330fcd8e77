//! A small path tracer built around homogeneous participating media (fog, smoke).
//!
//! Scene nodes implement [`Intersect`] and are shared as `Arc`s in an acyclic graph.
//! [`primitives::ConstantMedium`] is the volumetric node: it samples a scattering
//! distance inside a boundary shape following the Beer-Lambert law.

pub mod bvh;
pub mod camera;
pub mod error;
pub mod material;
pub mod primitives;
pub mod ray;
pub mod render;
pub mod rng;
pub mod scene;
pub mod textures;

pub use crate::{
    error::{Error, Result},
    primitives::Intersect,
    ray::{Hit, Ray},
    rng::{DefaultRng, RandomGenerator},
};
