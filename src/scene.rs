//! Scene descriptions loaded from TOML.
//!
//! Objects are built in file order and may only refer to objects declared before them,
//! which keeps the scene graph acyclic.

use crate::{
    bvh::BVH,
    camera::Camera,
    error::{Error, Result},
    material::{Dielectric, DiffuseLight, Isotropic, Lambertian, Material, Metal},
    primitives::{ConstantMedium, Cuboid, Instance, Intersect, Sphere},
    textures::{ImageTexture, Texture, UniformTexture},
};
use anyhow::Context;
use glam::Vec3;
use log::{info, warn};
use serde::Deserialize;
use std::{
    collections::{HashMap, HashSet},
    fs,
    path::{Path, PathBuf},
    sync::Arc,
};

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SceneFile {
    #[serde(default)]
    pub render: RenderSettings,
    pub camera: CameraSettings,
    #[serde(default)]
    pub textures: HashMap<String, TextureDesc>,
    #[serde(default)]
    pub materials: HashMap<String, MaterialDesc>,
    #[serde(default)]
    pub objects: Vec<ObjectDesc>,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RenderSettings {
    pub width: u32,
    pub height: u32,
    pub samples: u32,
    pub max_bounces: u32,
    pub gamma: f32,
    /// Radiance of rays that escape the scene
    pub background: [f32; 3],
    pub output: PathBuf,
    /// Seeds every row's generator, renders are reproducible when set
    pub seed: Option<u64>,
}

impl Default for RenderSettings {
    fn default() -> Self {
        Self {
            width: 400,
            height: 400,
            samples: 64,
            max_bounces: 50,
            gamma: 2.2,
            background: [0.0, 0.0, 0.0],
            output: PathBuf::from("output.png"),
            seed: None,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CameraSettings {
    pub origin: [f32; 3],
    pub target: [f32; 3],
    #[serde(default = "CameraSettings::default_up")]
    pub up: [f32; 3],
    #[serde(default = "CameraSettings::default_vfov")]
    pub vfov: f32,
    #[serde(default)]
    pub aperture: f32,
}

impl CameraSettings {
    fn default_up() -> [f32; 3] {
        [0.0, 1.0, 0.0]
    }

    fn default_vfov() -> f32 {
        40.0
    }
}

#[derive(Debug, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TextureDesc {
    Uniform { color: [f32; 3] },
    Image { path: PathBuf },
}

/// Either a named texture or an inline color
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum Albedo {
    Texture(String),
    Color([f32; 3]),
}

#[derive(Debug, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum MaterialDesc {
    Lambertian { albedo: Albedo },
    Metal { albedo: [f32; 3], fuzz: f32 },
    Dielectric { index: f32 },
    Light { color: Albedo },
    Isotropic { albedo: Albedo },
}

#[derive(Debug, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ShapeDesc {
    Sphere {
        center: [f32; 3],
        radius: f32,
    },
    Cuboid {
        min: [f32; 3],
        max: [f32; 3],
    },
    /// A fog volume filling a previously declared object
    Medium {
        boundary: String,
        density: f32,
        albedo: Albedo,
    },
    /// A shallow copy of a previously declared object
    #[serde(rename = "copy")]
    CopyOf {
        of: String,
    },
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ObjectDesc {
    pub name: Option<String>,
    pub shape: ShapeDesc,
    pub material: Option<String>,
    pub translate: Option<[f32; 3]>,
    /// Boundary-only shapes are declared with `visible = false`
    #[serde(default = "ObjectDesc::default_visible")]
    pub visible: bool,
}

impl ObjectDesc {
    fn default_visible() -> bool {
        true
    }
}

/// A scene ready to be rendered
#[derive(Debug)]
pub struct Scene {
    pub settings: RenderSettings,
    pub camera: Camera,
    pub world: BVH,
}

impl Scene {
    pub fn from_file(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path)
            .with_context(|| format!("Failed to read scene {}", path.display()))?;
        let base_dir = path.parent().unwrap_or_else(|| Path::new("."));

        Self::from_toml(&text, base_dir)
            .with_context(|| format!("Failed to load scene {}", path.display()))
    }

    /// Parses a scene, relative texture paths are resolved against `base_dir`.
    pub fn from_toml(text: &str, base_dir: &Path) -> anyhow::Result<Self> {
        let file: SceneFile = toml::from_str(text).context("Invalid scene description")?;
        Ok(Self::build(file, base_dir)?)
    }

    pub fn build(file: SceneFile, base_dir: &Path) -> Result<Self> {
        let mut builder = Builder::new(base_dir);

        for (name, desc) in &file.textures {
            let texture = builder.texture(desc)?;
            builder.textures.insert(name.clone(), texture);
        }
        for (name, desc) in &file.materials {
            let material = builder.material(desc)?;
            builder.materials.insert(name.clone(), material);
        }

        let mut visible = Vec::new();
        for desc in &file.objects {
            let object = builder.object(desc)?;
            if let Some(name) = &desc.name {
                if builder.is_medium(&desc.shape) {
                    builder.media.insert(name.clone());
                } else {
                    builder.media.remove(name);
                }
                if builder.objects.insert(name.clone(), object.clone()).is_some() {
                    warn!("Object `{}` is declared twice, later uses see the last one", name);
                }
            }
            if desc.visible {
                visible.push(object);
            }
        }

        info!(
            "Scene has {} textures, {} materials and {} visible objects",
            builder.textures.len(),
            builder.materials.len(),
            visible.len()
        );

        let settings = file.render;
        let camera = Camera::new(
            Vec3::from(file.camera.origin),
            Vec3::from(file.camera.target),
            Vec3::from(file.camera.up),
            file.camera.vfov,
            settings.width as f32 / settings.height.max(1) as f32,
            file.camera.aperture,
        );
        let world = BVH::new(visible, 0.0, 1.0)?;

        Ok(Self {
            settings,
            camera,
            world,
        })
    }
}

/// Named things resolved so far
struct Builder<'a> {
    base_dir: &'a Path,
    textures: HashMap<String, Arc<dyn Texture>>,
    materials: HashMap<String, Arc<dyn Material>>,
    objects: HashMap<String, Arc<dyn Intersect>>,
    /// Objects that scatter with a phase material, including copies of them
    media: HashSet<String>,
}

impl<'a> Builder<'a> {
    fn new(base_dir: &'a Path) -> Self {
        Self {
            base_dir,
            textures: HashMap::new(),
            materials: HashMap::new(),
            objects: HashMap::new(),
            media: HashSet::new(),
        }
    }

    fn is_medium(&self, shape: &ShapeDesc) -> bool {
        match shape {
            ShapeDesc::Medium { .. } => true,
            ShapeDesc::CopyOf { of } => self.media.contains(of),
            ShapeDesc::Sphere { .. } | ShapeDesc::Cuboid { .. } => false,
        }
    }

    fn texture(&self, desc: &TextureDesc) -> Result<Arc<dyn Texture>> {
        let texture: Arc<dyn Texture> = match desc {
            TextureDesc::Uniform { color } => Arc::new(UniformTexture::new(Vec3::from(*color))),
            TextureDesc::Image { path } => Arc::new(ImageTexture::open(self.base_dir.join(path))?),
        };

        Ok(texture)
    }

    fn albedo(&self, albedo: &Albedo) -> Result<Arc<dyn Texture>> {
        match albedo {
            Albedo::Texture(name) => self
                .textures
                .get(name)
                .cloned()
                .ok_or_else(|| Error::UnknownTexture(name.clone())),
            Albedo::Color(color) => {
                let texture: Arc<dyn Texture> = Arc::new(UniformTexture::new(Vec3::from(*color)));
                Ok(texture)
            }
        }
    }

    fn material(&self, desc: &MaterialDesc) -> Result<Arc<dyn Material>> {
        let material: Arc<dyn Material> = match desc {
            MaterialDesc::Lambertian { albedo } => Arc::new(Lambertian::new(self.albedo(albedo)?)),
            MaterialDesc::Metal { albedo, fuzz } => {
                Arc::new(Metal::new(Vec3::from(*albedo), *fuzz))
            }
            MaterialDesc::Dielectric { index } => Arc::new(Dielectric::new(*index)),
            MaterialDesc::Light { color } => Arc::new(DiffuseLight::new(self.albedo(color)?)),
            MaterialDesc::Isotropic { albedo } => Arc::new(Isotropic::new(self.albedo(albedo)?)),
        };

        Ok(material)
    }

    fn named_material(&self, name: &str) -> Result<Arc<dyn Material>> {
        self.materials
            .get(name)
            .cloned()
            .ok_or_else(|| Error::UnknownMaterial(name.to_string()))
    }

    fn object(&self, desc: &ObjectDesc) -> Result<Arc<dyn Intersect>> {
        let material = desc
            .material
            .as_deref()
            .map(|name| self.named_material(name))
            .transpose()?;

        let mut node: Arc<dyn Intersect> = match &desc.shape {
            ShapeDesc::Sphere { center, radius } => {
                let mut sphere = Sphere::new(Vec3::from(*center), *radius);
                if let Some(material) = material {
                    sphere = sphere.with_material(material);
                }
                Arc::new(sphere)
            }
            ShapeDesc::Cuboid { min, max } => {
                let mut cuboid = Cuboid::new(Vec3::from(*min), Vec3::from(*max));
                if let Some(material) = material {
                    cuboid = cuboid.with_material(material);
                }
                Arc::new(cuboid)
            }
            ShapeDesc::Medium {
                boundary,
                density,
                albedo,
            } => {
                if material.is_some() {
                    warn!("Media scatter with their own phase material, `material` is ignored");
                }
                let boundary = self
                    .objects
                    .get(boundary)
                    .cloned()
                    .ok_or_else(|| Error::MissingBoundary(boundary.clone()))?;
                Arc::new(ConstantMedium::with_texture(
                    boundary,
                    *density,
                    self.albedo(albedo)?,
                )?)
            }
            ShapeDesc::CopyOf { of } => {
                let original = self
                    .objects
                    .get(of)
                    .ok_or_else(|| Error::UnknownObject(of.clone()))?;
                let copy = original.clone_node();
                match material {
                    Some(_) if self.media.contains(of) => {
                        warn!("Media scatter with their own phase material, `material` is ignored");
                        copy
                    }
                    Some(material) => {
                        let painted: Arc<dyn Intersect> =
                            Arc::new(Instance::new(copy, Vec3::zero()).with_material(material));
                        painted
                    }
                    None => copy,
                }
            }
        };

        if let Some(translation) = desc.translate {
            node = Arc::new(Instance::new(node, Vec3::from(translation)));
        }

        Ok(node)
    }
}
