use anyhow::{bail, Context};
use fogtracer::{
    render::{render, trace_pixel},
    scene::Scene,
};
use log::info;
use std::{env, path::PathBuf};

const USAGE: &str = "Usage: fogtracer <scene.toml> [output.png] [--pixel X Y]";

#[derive(Debug, PartialEq)]
struct Args {
    scene: PathBuf,
    output: Option<PathBuf>,
    pixel: Option<(u32, u32)>,
}

fn parse_args(args: &[String]) -> anyhow::Result<Args> {
    let scene = args.first().context(USAGE)?;

    let mut output = None;
    let mut pixel = None;
    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--pixel" => {
                let coordinate = |index: usize| -> anyhow::Result<u32> {
                    args.get(index)
                        .context(USAGE)?
                        .parse()
                        .with_context(|| format!("Invalid pixel coordinate {:?}", args[index]))
                };
                pixel = Some((coordinate(i + 1)?, coordinate(i + 2)?));
                i += 2;
            }
            flag if flag.starts_with("--") => bail!("Unknown option {:?}\n{}", flag, USAGE),
            path if output.is_none() => output = Some(PathBuf::from(path)),
            other => bail!("Unexpected argument {:?}\n{}", other, USAGE),
        }
        i += 1;
    }

    Ok(Args {
        scene: PathBuf::from(scene),
        output,
        pixel,
    })
}

fn main() -> anyhow::Result<()> {
    env_logger::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args: Vec<String> = env::args().skip(1).collect();
    let args = parse_args(&args)?;

    let scene = Scene::from_file(&args.scene)?;

    if let Some((x, y)) = args.pixel {
        let seed = scene.settings.seed.unwrap_or(0);
        let color = trace_pixel(&scene, x, y, scene.settings.samples, seed);
        println!("{} {} {}", color.x, color.y, color.z);
        return Ok(());
    }

    let output = args.output.unwrap_or_else(|| scene.settings.output.clone());
    let image = render(&scene);

    info!("Saving rendered image to {}", output.display());
    image
        .save(&output)
        .with_context(|| format!("Failed to write {}", output.display()))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(tokens: &[&str]) -> Vec<String> {
        tokens.iter().map(|token| token.to_string()).collect()
    }

    #[test]
    fn output_and_pixel_are_optional() {
        let parsed = parse_args(&args(&["smoke.toml"])).unwrap();
        assert_eq!(parsed.scene, PathBuf::from("smoke.toml"));
        assert_eq!(parsed.output, None);
        assert_eq!(parsed.pixel, None);

        let parsed = parse_args(&args(&["smoke.toml", "out.png", "--pixel", "3", "4"])).unwrap();
        assert_eq!(parsed.output, Some(PathBuf::from("out.png")));
        assert_eq!(parsed.pixel, Some((3, 4)));
    }

    #[test]
    fn mistyped_flags_are_not_output_paths() {
        assert!(parse_args(&args(&["smoke.toml", "--pxel", "3", "4"])).is_err());
        assert!(parse_args(&args(&["smoke.toml", "out.png", "--quiet"])).is_err());
    }

    #[test]
    fn bad_arguments_are_rejected() {
        assert!(parse_args(&[]).is_err());
        assert!(parse_args(&args(&["smoke.toml", "--pixel", "3"])).is_err());
        assert!(parse_args(&args(&["smoke.toml", "--pixel", "x", "4"])).is_err());
        assert!(parse_args(&args(&["smoke.toml", "a.png", "b.png"])).is_err());
    }
}
