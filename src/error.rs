use glam::Vec3;
use thiserror::Error;

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("medium density must be strictly positive, got {0}")]
    NonPositiveDensity(f32),

    #[error("ray direction must be finite and non-zero, got {0:?}")]
    DegenerateRay(Vec3),

    #[error("medium boundary `{0}` is not declared before the medium")]
    MissingBoundary(String),

    #[error("unknown object `{0}`")]
    UnknownObject(String),

    #[error("unknown material `{0}`")]
    UnknownMaterial(String),

    #[error("unknown texture `{0}`")]
    UnknownTexture(String),

    #[error("node {0} has no bounding box and cannot be placed in a BVH")]
    Unbounded(usize),

    #[error("the scene has no visible objects")]
    EmptyScene,

    #[error("failed to load image texture")]
    Image(#[from] image::ImageError),
}
