use crate::{
    primitives::Intersect,
    ray::Ray,
    rng::{from_entropy, seeded, RandomGenerator},
    scene::Scene,
};
use glam::{vec3, Vec3};
use image::RgbImage;
use log::info;
use rand::Rng;
use rayon::prelude::*;
use std::{
    sync::atomic::{AtomicU64, Ordering},
    time::Instant,
};

/// Closest hits nearer than this are self intersections
const T_MIN: f32 = 0.0001;
const T_MAX: f32 = 10_000_000.0;

const COLOR_CHANNELS: usize = 3;

// Computes the color of a sample based on a ray, counting every traced ray
pub fn color(
    ray: Ray,
    bounces: &mut u32,
    scene: &Scene,
    rng: &mut dyn RandomGenerator,
) -> Vec3 {
    // Max bounces
    if *bounces > scene.settings.max_bounces {
        return Vec3::zero();
    }

    // Else draw the background
    let hit = match scene.world.intersection(rng, ray, T_MIN, T_MAX) {
        Some(hit) => hit,
        None => return Vec3::from(scene.settings.background),
    };

    let material = match hit.material.clone() {
        Some(material) => material,
        // Geometry without a material absorbs everything
        None => return Vec3::zero(),
    };

    // The material of the object we hit decides how the ray scatters
    let emitted = material.emitted(hit.u, hit.v, hit.point);
    match material.scatter(ray, &hit, rng) {
        Some(scatter) => {
            *bounces += 1;
            emitted + scatter.attenuation * color(scatter.scattered, bounces, scene, rng)
        }
        None => emitted,
    }
}

/// Renders the scene, one row per rayon task with a generator of its own.
pub fn render(scene: &Scene) -> RgbImage {
    let settings = &scene.settings;
    let (width, height) = (settings.width, settings.height);
    let mut image = RgbImage::new(width, height);

    let global_ray_count = AtomicU64::new(0);
    let start = Instant::now();

    let buffer: &mut [u8] = &mut image;
    buffer
        .par_chunks_mut(width as usize * COLOR_CHANNELS)
        .rev()
        .enumerate()
        .for_each(|(y, row)| {
            let mut rng = match settings.seed {
                Some(seed) => seeded(seed.wrapping_add(y as u64)),
                None => from_entropy(),
            };
            let mut row_ray_count = 0;

            row.chunks_mut(COLOR_CHANNELS)
                .enumerate()
                .for_each(|(i, pixel)| {
                    let mut out = Vec3::zero();

                    // Antialiasing via multisampling
                    for _ in 0..settings.samples {
                        let u = (rng.gen::<f32>() + i as f32) / width as f32;
                        let v = (rng.gen::<f32>() + y as f32) / height as f32;

                        let ray = scene.camera.ray(u, v, &mut rng);

                        let mut bounces = 0;
                        out += color(ray, &mut bounces, scene, &mut rng);
                        row_ray_count += u64::from(bounces) + 1;
                    }

                    let [r, g, b] = to_rgb8(out / settings.samples.max(1) as f32, settings.gamma);

                    // Write output color to buffer
                    pixel[0] = r;
                    pixel[1] = g;
                    pixel[2] = b;
                });

            global_ray_count.fetch_add(row_ray_count, Ordering::Relaxed);
        });

    let duration = start.elapsed();
    let global_ray_count = global_ray_count.load(Ordering::Relaxed) as f64 / 1_000_000.0;
    let rays_per_second = global_ray_count / duration.as_secs_f64().max(f64::EPSILON);
    info!(
        "Time elapsed: {:.2?}, Total Rays: {:.2}M, Rays per second: {:.2}M",
        duration, global_ray_count, rays_per_second
    );

    image
}

// Gamma correct and convert from [0, 1] to [0, 255]
fn to_rgb8(color: Vec3, gamma: f32) -> [u8; 3] {
    let channel = |c: f32| {
        // Stray NaNs from degenerate samples render black
        let c = if c.is_nan() { 0.0 } else { c.max(0.0).min(1.0) };
        (255.99 * c.powf(1.0 / gamma)) as u8
    };

    [channel(color.x), channel(color.y), channel(color.z)]
}

/// Linear color of a pixel for debugging single samples
pub fn trace_pixel(scene: &Scene, x: u32, y: u32, samples: u32, seed: u64) -> Vec3 {
    let mut rng = seeded(seed);
    let mut out = vec3(0.0, 0.0, 0.0);

    for _ in 0..samples {
        let u = (rng.gen::<f32>() + x as f32) / scene.settings.width as f32;
        let v = (rng.gen::<f32>() + y as f32) / scene.settings.height as f32;
        let ray = scene.camera.ray(u, v, &mut rng);
        out += color(ray, &mut 0, scene, &mut rng);
    }

    out / samples.max(1) as f32
}
