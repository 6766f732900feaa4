#![allow(dead_code)]

use s3d_scene::chunk::ChunkWriter;
use s3d_scene::header::Tag;
use s3d_scene::records::tags;

/// Sub-chunks of a scene container, in file order.
pub const SCENE_ORDER: [Tag; 31] = [
    tags::STRINGS,
    tags::TEXTURE_DATA,
    tags::TEXTURES,
    tags::MATERIALS,
    tags::TRANSFORMS,
    tags::CAMERAS,
    tags::HALFEDGES,
    tags::VERTICES,
    tags::EDGES,
    tags::FACES,
    tags::MESHES,
    tags::HALFEDGES,
    tags::WEIGHTS,
    tags::SKINNED_VERTICES,
    tags::EDGES,
    tags::FACES,
    tags::BONES,
    tags::HANDLES,
    tags::SKINNED_MESHES,
    tags::SHAPES,
    tags::PARTICLES,
    tags::PARTICLE_SYSTEMS,
    tags::DELTA_LIGHTS,
    tags::ENVIRONMENT_LIGHTS,
    tags::CAMERA_INSTANCES,
    tags::MESH_INSTANCES,
    tags::SKINNED_MESH_INSTANCES,
    tags::SHAPE_INSTANCES,
    tags::PARTICLES_INSTANCES,
    tags::DELTA_LIGHT_INSTANCES,
    tags::ENVIRONMENT_LIGHT_INSTANCES,
];

/// Hand-assembled scene container. `payload` is asked for the contents of
/// each sub-chunk by position; anything it returns `None` for is empty.
pub fn scene_with(mut payload: impl FnMut(usize) -> Option<Vec<u8>>) -> Vec<u8> {
    let mut out = Vec::new();
    ChunkWriter::new(&mut out)
        .write_container_with(tags::SCENE, |w| {
            for (i, tag) in SCENE_ORDER.into_iter().enumerate() {
                w.write_bytes(tag, &payload(i).unwrap_or_default())?;
            }
            Ok(())
        })
        .unwrap();
    out
}

pub fn empty_animator() -> Vec<u8> {
    let mut out = Vec::new();
    ChunkWriter::new(&mut out)
        .write_container_with(tags::ANIMATOR, |w| {
            w.write_bytes(tags::STRINGS, &[])?;
            w.write_bytes(tags::SPLINE_DATA, &[])?;
            w.write_bytes(tags::SPLINES, &[])
        })
        .unwrap();
    out
}

pub fn position(tag: Tag) -> usize {
    SCENE_ORDER.iter().position(|&t| t == tag).unwrap()
}

pub fn bytes_of<T: bytemuck::Pod>(records: &[T]) -> Vec<u8> {
    bytemuck::cast_slice(records).to_vec()
}
