use glam::{Quat, Vec3};
use s3d_scene::diagnostics::Diagnostics;
use s3d_scene::mesh::HalfedgeMesh;
use s3d_scene::scene::*;
use s3d_scene::spectrum::Spectrum;
use s3d_scene::{Animator, Scene};

use crate::CommonArgs;
use crate::prelude::*;
use crate::util::save_document;

#[derive(clap::Args, Debug)]
pub struct CubeArgs {
    /// Edge length of the cube
    #[arg(short, long, default_value_t = 1.0)]
    size: f32,
    /// Seconds for one full turn
    #[arg(short, long, default_value_t = 4.0)]
    period: f32,
    #[command(flatten)]
    oarg: crate::OutputArgs,
    #[command(flatten)]
    outpath: crate::OutputPath,
}

pub fn run(
    _args_common: &CommonArgs,
    args_cmd: &CubeArgs,
) -> AnyResult<()> {
    if !(args_cmd.size > 0.0) || !(args_cmd.period > 0.0) {
        bail!("Size and period must be positive.");
    }
    let (scene, animator) = build(args_cmd.size, args_cmd.period)?;
    let mut diagnostics = Diagnostics::new();
    save_document(
        &args_cmd.outpath.out_file,
        &scene,
        &animator,
        args_cmd.oarg.overwrite,
        &mut diagnostics,
    )
}

fn build(size: f32, period: f32) -> AnyResult<(Scene, Animator)> {
    let mut scene = Scene::new();

    let albedo = scene.textures.insert(
        "cube albedo",
        Texture::Constant {
            color: Spectrum::new(0.8, 0.3, 0.2),
            scale: 1.0,
        },
    )?;
    let material = scene
        .materials
        .insert("cube material", Material::Lambertian { albedo: Some(albedo) })?;
    let mesh = scene.meshes.insert("cube", HalfedgeMesh::cube(size * 0.5))?;
    let spin = scene.transforms.insert("cube transform", Transform::default())?;
    scene.instances.meshes.insert(
        "cube instance",
        MeshInstance {
            transform: Some(spin),
            item: Some(mesh),
            material: Some(material),
            ..Default::default()
        },
    )?;

    let camera = scene.cameras.insert("camera", Camera::default())?;
    let eye = scene.transforms.insert(
        "camera transform",
        Transform {
            translation: Vec3::new(0.0, size, size * 4.0),
            rotation: Quat::from_rotation_x(-0.25),
            ..Default::default()
        },
    )?;
    scene.instances.cameras.insert(
        "camera instance",
        CameraInstance {
            transform: Some(eye),
            camera: Some(camera),
        },
    )?;
    let sky = scene
        .env_lights
        .insert("sky", EnvironmentLight::default())?;
    scene.instances.env_lights.insert(
        "sky instance",
        EnvironmentLightInstance {
            light: Some(sky),
            ..Default::default()
        },
    )?;

    // Four quarter turns so interpolation never takes the short way round.
    let mut animator = Animator::new();
    for step in 0..=4 {
        let angle = std::f32::consts::FRAC_PI_2 * step as f32;
        scene.transforms[spin].rotation = Quat::from_rotation_y(angle);
        animator.set_all(&scene, "cube transform", period * step as f32 / 4.0);
    }
    scene.transforms[spin].rotation = Quat::IDENTITY;

    Ok((scene, animator))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cube_scene_is_keyed() {
        let (scene, animator) = build(2.0, 4.0).unwrap();
        assert_eq!(scene.instances.meshes.len(), 1);
        assert_eq!(animator.keys("cube transform"), [0.0, 1.0, 2.0, 3.0, 4.0]);
    }
}
