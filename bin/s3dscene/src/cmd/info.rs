use s3d_scene::diagnostics::Diagnostics;
use s3d_scene::mesh::FaceId;
use s3d_scene::read::ReadSettings;

use crate::CommonArgs;
use crate::prelude::*;
use crate::util::load_document;

#[derive(clap::Args, Debug)]
pub struct InfoArgs {
    #[command(flatten)]
    rarg: crate::ReadArgs,
    #[command(flatten)]
    inpath: crate::InputPath,
}

pub fn run(
    _args_common: &CommonArgs,
    args_cmd: &InfoArgs,
) -> AnyResult<()> {
    let mut diagnostics = Diagnostics::new();
    let (scene, animator) = load_document(
        &args_cmd.inpath.in_file,
        &ReadSettings::from(&args_cmd.rarg),
        &mut diagnostics,
    )?;

    let instances = &scene.instances;
    let rows = [
        ("Textures", scene.textures.len()),
        ("Materials", scene.materials.len()),
        ("Transforms", scene.transforms.len()),
        ("Cameras", scene.cameras.len()),
        ("Halfedge meshes", scene.meshes.len()),
        ("Skinned meshes", scene.skinned_meshes.len()),
        ("Shapes", scene.shapes.len()),
        ("Particle systems", scene.particles.len()),
        ("Delta lights", scene.delta_lights.len()),
        ("Environment lights", scene.env_lights.len()),
        ("Camera instances", instances.cameras.len()),
        ("Mesh instances", instances.meshes.len()),
        ("Skinned mesh instances", instances.skinned_meshes.len()),
        ("Shape instances", instances.shapes.len()),
        ("Particles instances", instances.particles.len()),
        ("Delta light instances", instances.delta_lights.len()),
        ("Environment light instances", instances.env_lights.len()),
    ];
    for (label, count) in rows {
        println!("{:<28} {}", label, count);
    }
    for (_, name, mesh) in scene.meshes.iter() {
        let triangles: usize = mesh
            .faces
            .iter()
            .enumerate()
            .filter(|(_, f)| !f.boundary)
            .map(|(i, _)| mesh.face_halfedges(FaceId(i as u32)).count().saturating_sub(2))
            .sum();
        println!(
            "  mesh '{}': {} vertices, {} faces, {} triangles",
            name,
            mesh.vertices.len(),
            mesh.interior_face_count(),
            triangles
        );
    }
    println!();
    println!("{:<28} {}", "Animated channels", animator.len());
    println!("{:<28} {}", "Animated resources", animator.keys_by_resource().len());
    let keys = animator.all_keys();
    match (keys.first(), keys.last()) {
        (Some(first), Some(last)) => println!(
            "{:<28} {} ({}s to {}s)",
            "Distinct key times",
            keys.len(),
            first,
            last
        ),
        _ => println!("{:<28} 0", "Distinct key times"),
    }
    for d in diagnostics.iter() {
        println!("{}", d);
    }

    Ok(())
}
