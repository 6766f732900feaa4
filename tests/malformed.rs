mod common;

use common::*;
use s3d_scene::diagnostics::Diagnostics;
use s3d_scene::mesh::{self, Element, FlatMesh, HalfedgeMesh, MeshError};
use s3d_scene::read::{ReadError, ReadErrorKind, ReadSettings, read_document};
use s3d_scene::records::{self, NONE, tags};
use s3d_scene::scene::{Material, ResourceKind, Scene};
use s3d_scene::animator::{Animator, Path};
use s3d_scene::chunk::ChunkWriter;

fn load(bytes: &[u8]) -> Result<(Scene, Animator), ReadError> {
    load_with(bytes, &ReadSettings::default(), &mut Diagnostics::new())
}

fn load_with(
    bytes: &[u8],
    settings: &ReadSettings,
    diagnostics: &mut Diagnostics,
) -> Result<(Scene, Animator), ReadError> {
    read_document(&mut &bytes[..], settings, diagnostics)
}

fn document(scene: Vec<u8>) -> Vec<u8> {
    let mut bytes = scene;
    bytes.extend(empty_animator());
    bytes
}

fn constant_texture() -> Vec<u8> {
    bytes_of(&[records::ConstantTextureData {
        color: [0.5; 3],
        scale: 1.0,
    }])
}

fn textured_material(albedo: u32) -> Vec<u8> {
    document(scene_with(|i| match i {
        0 => Some(b"tm".to_vec()),
        1 => Some(constant_texture()),
        2 => Some(bytes_of(&[records::Texture {
            name_begin: 0,
            name_end: 1,
            data_begin: 0,
            data_end: 16,
            kind: records::Texture::CONSTANT,
        }])),
        3 => Some(bytes_of(&[records::Material {
            name_begin: 1,
            name_end: 2,
            albedo,
            reflectance: NONE,
            transmittance: NONE,
            emissive: NONE,
            ior: 1.0,
            kind: records::Material::LAMBERTIAN,
        }])),
        _ => None,
    }))
}

#[test]
fn empty_document_loads() {
    let (scene, animator) = load(&document(scene_with(|_| None))).unwrap();
    assert_eq!(scene, Scene::new());
    assert!(animator.is_empty());
}

#[test]
fn albedo_sentinel_and_one_past_end() {
    let (scene, _) = load(&textured_material(NONE)).unwrap();
    let m = scene.materials.find("m").unwrap();
    assert_eq!(scene.materials[m], Material::Lambertian { albedo: None });

    let (scene, _) = load(&textured_material(0)).unwrap();
    assert_eq!(
        scene.materials[m],
        Material::Lambertian { albedo: scene.textures.find("t") }
    );

    let err = load(&textured_material(1)).unwrap_err();
    assert!(matches!(
        err.kind,
        ReadErrorKind::BadIndex { field: "albedo", index: 1, len: 1, .. }
    ));
}

#[test]
fn duplicate_names_are_fatal() {
    let texture = records::Texture {
        name_begin: 0,
        name_end: 4,
        data_begin: 0,
        data_end: 16,
        kind: records::Texture::CONSTANT,
    };
    let bytes = document(scene_with(|i| match i {
        0 => Some(b"rock".to_vec()),
        1 => Some(constant_texture()),
        2 => Some(bytes_of(&[texture, texture])),
        _ => None,
    }));
    let err = load(&bytes).unwrap_err();
    match err.kind {
        ReadErrorKind::DuplicateName { kind, name } => {
            assert_eq!(kind, ResourceKind::Texture);
            assert_eq!(name, "rock");
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn constant_texture_needs_sixteen_bytes() {
    let bytes = document(scene_with(|i| match i {
        0 => Some(b"t".to_vec()),
        1 => Some(vec![0; 12]),
        2 => Some(bytes_of(&[records::Texture {
            name_begin: 0,
            name_end: 1,
            data_begin: 0,
            data_end: 12,
            kind: records::Texture::CONSTANT,
        }])),
        _ => None,
    }));
    let err = load(&bytes).unwrap_err();
    assert!(matches!(err.kind, ReadErrorKind::BadTextureData { bytes: 12, .. }));
}

/// A scene holding one cube mesh named "cube", with its pools passed
/// through `tamper` first.
fn cube_scene(tamper: impl FnOnce(&mut FlatMesh<records::Vertex>)) -> Vec<u8> {
    let mut flat = FlatMesh::default();
    let ranges = mesh::flatten(&HalfedgeMesh::cube(1.0), &mut flat, |v, halfedge| {
        Ok(records::Vertex {
            halfedge,
            position: v.position.to_array(),
        })
    })
    .unwrap();
    tamper(&mut flat);

    let hem = records::HalfedgeMesh {
        name_begin: 0,
        name_end: 4,
        halfedges_begin: ranges.halfedges.start,
        halfedges_end: ranges.halfedges.end,
        vertices_begin: ranges.vertices.start,
        vertices_end: ranges.vertices.end,
        edges_begin: ranges.edges.start,
        edges_end: ranges.edges.end,
        faces_begin: ranges.faces.start,
        faces_end: ranges.faces.end,
    };
    document(scene_with(|i| match i {
        0 => Some(b"cube".to_vec()),
        6 => Some(bytes_of(&flat.halfedges)),
        7 => Some(bytes_of(&flat.vertices)),
        8 => Some(bytes_of(&flat.edges)),
        9 => Some(bytes_of(&flat.faces)),
        10 => Some(bytes_of(&[hem])),
        _ => None,
    }))
}

fn cube_error(bytes: &[u8]) -> MeshError {
    match load(bytes).unwrap_err().kind {
        ReadErrorKind::Mesh { name, source, .. } => {
            assert_eq!(name, "cube");
            source
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn duplicated_next_is_rejected() {
    let mut stolen = 0;
    let bytes = cube_scene(|flat| {
        stolen = flat.halfedges[0].next;
        flat.halfedges[2].next = stolen;
    });
    assert_eq!(cube_error(&bytes), MeshError::DuplicateNext { next: stolen });
}

#[test]
fn two_vertices_on_one_halfedge() {
    let bytes = cube_scene(|flat| flat.vertices[1].halfedge = flat.vertices[0].halfedge);
    assert!(matches!(
        cube_error(&bytes),
        MeshError::DoubleClaim { element: Element::Vertex, .. }
    ));
}

#[test]
fn two_edges_on_one_halfedge() {
    let bytes = cube_scene(|flat| flat.edges[1].halfedge = flat.edges[0].halfedge);
    assert!(matches!(
        cube_error(&bytes),
        MeshError::DoubleClaim { element: Element::Edge, .. }
    ));
}

fn transform(name: u32, parent: u32) -> records::Transform {
    records::Transform {
        name_begin: name,
        name_end: name + 1,
        parent,
        translation: [0.0; 3],
        rotation: [0.0, 0.0, 0.0, 1.0],
        scale: [1.0; 3],
    }
}

#[test]
fn transform_parent_must_come_first() {
    let ok = document(scene_with(|i| match i {
        0 => Some(b"ab".to_vec()),
        4 => Some(bytes_of(&[transform(0, NONE), transform(1, 0)])),
        _ => None,
    }));
    let (scene, _) = load(&ok).unwrap();
    let b = scene.transforms.find("b").unwrap();
    assert_eq!(scene.transforms[b].parent, scene.transforms.find("a"));

    let backwards = document(scene_with(|i| match i {
        0 => Some(b"ab".to_vec()),
        4 => Some(bytes_of(&[transform(0, 1), transform(1, NONE)])),
        _ => None,
    }));
    let err = load(&backwards).unwrap_err();
    assert!(matches!(
        err.kind,
        ReadErrorKind::NotTopological { what: "Transform", index: 0, parent: 1 }
    ));

    let own_parent = document(scene_with(|i| match i {
        0 => Some(b"a".to_vec()),
        4 => Some(bytes_of(&[transform(0, 0)])),
        _ => None,
    }));
    assert!(matches!(
        load(&own_parent).unwrap_err().kind,
        ReadErrorKind::NotTopological { index: 0, parent: 0, .. }
    ));
}

fn bone(parent: u32) -> records::Bone {
    records::Bone {
        parent,
        radius: 0.25,
        pose: [0.0; 3],
        extent: [0.0, 1.0, 0.0],
    }
}

/// One skinned cube named "skin" whose skeleton is bones `[1, 3)` of a
/// three bone table; bone 0 belongs to nobody. Every vertex carries one
/// weight on global bone `weight_bone`.
fn skinned_scene(bones: [records::Bone; 3], handle_bone: u32, weight_bone: u32) -> Vec<u8> {
    let mut flat = FlatMesh::default();
    let ranges = mesh::flatten(&HalfedgeMesh::cube(1.0), &mut flat, |v, halfedge| {
        Ok(records::SkinnedVertex {
            halfedge,
            position: v.position.to_array(),
            weights_begin: 0,
            weights_end: 1,
        })
    })
    .unwrap();
    let weights = [records::Weight {
        bone: weight_bone,
        weight: 1.0,
    }];
    let handles = [records::Handle {
        bone: handle_bone,
        target: [0.0, 2.0, 0.0],
        enabled: 1,
    }];
    let shm = records::SkinnedMesh {
        name_begin: 0,
        name_end: 4,
        halfedges_begin: ranges.halfedges.start,
        halfedges_end: ranges.halfedges.end,
        vertices_begin: ranges.vertices.start,
        vertices_end: ranges.vertices.end,
        edges_begin: ranges.edges.start,
        edges_end: ranges.edges.end,
        faces_begin: ranges.faces.start,
        faces_end: ranges.faces.end,
        bones_begin: 1,
        bones_end: 3,
        handles_begin: 0,
        handles_end: 1,
        base: [0.0; 3],
    };
    document(scene_with(|i| match i {
        0 => Some(b"skin".to_vec()),
        11 => Some(bytes_of(&flat.halfedges)),
        12 => Some(bytes_of(&weights)),
        13 => Some(bytes_of(&flat.vertices)),
        14 => Some(bytes_of(&flat.edges)),
        15 => Some(bytes_of(&flat.faces)),
        16 => Some(bytes_of(&bones)),
        17 => Some(bytes_of(&handles)),
        18 => Some(bytes_of(&[shm])),
        _ => None,
    }))
}

#[test]
fn skinned_mesh_indices_become_local() {
    let bytes = skinned_scene([bone(NONE), bone(NONE), bone(1)], 2, 2);
    let (scene, _) = load(&bytes).unwrap();
    let skin = &scene.skinned_meshes[scene.skinned_meshes.find("skin").unwrap()];
    assert_eq!(skin.skeleton.bones.len(), 2);
    assert_eq!(skin.skeleton.bones[1].parent, Some(0));
    assert_eq!(skin.skeleton.handles[0].bone, 1);
    assert!(skin.mesh.vertices.iter().all(|v| v.bone_weights[0].bone == 1));
}

#[test]
fn bone_parent_outside_its_skeleton() {
    let bytes = skinned_scene([bone(NONE), bone(NONE), bone(0)], 2, 2);
    assert!(matches!(
        load(&bytes).unwrap_err().kind,
        ReadErrorKind::BadIndex { what: "Bone", field: "parent", index: 0, len: 3 }
    ));
}

#[test]
fn bone_parent_after_bone() {
    let bytes = skinned_scene([bone(NONE), bone(2), bone(NONE)], 2, 2);
    assert!(matches!(
        load(&bytes).unwrap_err().kind,
        ReadErrorKind::NotTopological { what: "Bone", index: 1, parent: 2 }
    ));
}

#[test]
fn handle_bone_outside_its_skeleton() {
    for handle_bone in [0, 3] {
        let bytes = skinned_scene([bone(NONE), bone(NONE), bone(1)], handle_bone, 2);
        let err = load(&bytes).unwrap_err();
        assert!(
            matches!(
                err.kind,
                ReadErrorKind::BadIndex { what: "IK handle", field: "bone", .. }
            ),
            "handle bone {handle_bone}: {err}"
        );
    }
}

#[test]
fn weight_on_another_skeletons_bone() {
    // Bone 0 exists in the table but not in this mesh's skeleton.
    let bytes = skinned_scene([bone(NONE), bone(NONE), bone(1)], 2, 0);
    match load(&bytes).unwrap_err().kind {
        ReadErrorKind::Mesh { name, source, .. } => {
            assert_eq!(name, "skin");
            assert_eq!(source, MeshError::WeightBone { bone: 0, bones: 2 });
        }
        other => panic!("unexpected error: {other}"),
    }
}

fn assert_unknown_type(bytes: &[u8], expected: &str) {
    match load(bytes).unwrap_err().kind {
        ReadErrorKind::UnknownEnumerant { what, field, value } => {
            assert_eq!(what, expected);
            assert_eq!(field, "type");
            assert_eq!(value, b'?');
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn unknown_resource_types_are_fatal() {
    let texture = document(scene_with(|i| match i {
        0 => Some(b"t".to_vec()),
        1 => Some(constant_texture()),
        2 => Some(bytes_of(&[records::Texture {
            name_begin: 0,
            name_end: 1,
            data_begin: 0,
            data_end: 16,
            kind: b'?',
        }])),
        _ => None,
    }));
    assert_unknown_type(&texture, "Texture");

    let material = document(scene_with(|i| match i {
        0 => Some(b"m".to_vec()),
        3 => Some(bytes_of(&[records::Material {
            name_begin: 0,
            name_end: 1,
            albedo: NONE,
            reflectance: NONE,
            transmittance: NONE,
            emissive: NONE,
            ior: 1.5,
            kind: b'?',
        }])),
        _ => None,
    }));
    assert_unknown_type(&material, "Material");

    let shape = document(scene_with(|i| match i {
        0 => Some(b"s".to_vec()),
        _ if i == position(tags::SHAPES) => Some(bytes_of(&[records::Shape {
            name_begin: 0,
            name_end: 1,
            radius: 1.0,
            kind: b'?',
        }])),
        _ => None,
    }));
    assert_unknown_type(&shape, "Shape");

    let delta = document(scene_with(|i| match i {
        0 => Some(b"l".to_vec()),
        _ if i == position(tags::DELTA_LIGHTS) => Some(bytes_of(&[records::DeltaLight {
            name_begin: 0,
            name_end: 1,
            color: [1.0; 3],
            intensity: 1.0,
            inner_angle: 30.0,
            outer_angle: 45.0,
            kind: b'?',
        }])),
        _ => None,
    }));
    assert_unknown_type(&delta, "Delta light");

    let env = document(scene_with(|i| match i {
        0 => Some(b"e".to_vec()),
        _ if i == position(tags::ENVIRONMENT_LIGHTS) => {
            Some(bytes_of(&[records::EnvironmentLight {
                name_begin: 0,
                name_end: 1,
                radiance: NONE,
                intensity: 1.0,
                kind: b'?',
            }]))
        }
        _ => None,
    }));
    assert_unknown_type(&env, "Environment light");
}

#[test]
fn unknown_blend_style_is_fatal() {
    let instance = records::GeometryInstance {
        name_begin: 0,
        name_end: 1,
        transform: NONE,
        item: NONE,
        material: NONE,
        flags: 0x01 | 0x30,
    };
    let bytes = document(scene_with(|i| match i {
        0 => Some(b"i".to_vec()),
        _ if i == position(tags::MESH_INSTANCES) => Some(bytes_of(&[instance])),
        _ => None,
    }));
    let err = load(&bytes).unwrap_err();
    assert!(matches!(
        err.kind,
        ReadErrorKind::UnknownFlags { field: "blend style", bits: 0x30, .. }
    ));
}

#[test]
fn scene_length_mismatch_is_a_warning() {
    let mut scene = scene_with(|_| None);
    let declared = u32::from_le_bytes(scene[4..8].try_into().unwrap());
    scene[4..8].copy_from_slice(&(declared + 3).to_le_bytes());
    let bytes = document(scene);

    let mut diagnostics = Diagnostics::new();
    load_with(&bytes, &ReadSettings::default(), &mut diagnostics).unwrap();
    assert_eq!(diagnostics.warnings().count(), 1);

    let strict = ReadSettings { strict_length: true };
    let err = load_with(&bytes, &strict, &mut Diagnostics::new()).unwrap_err();
    assert!(matches!(err.kind, ReadErrorKind::LengthMismatch { .. }));
    assert_eq!(err.offset, 0);
}

#[test]
fn animator_length_mismatch_is_fatal() {
    let scene = scene_with(|_| None);
    let scene_len = scene.len();
    let mut animator = empty_animator();
    animator[4..8].copy_from_slice(&1u32.to_le_bytes());
    let mut bytes = scene;
    bytes.extend(animator);

    let err = load(&bytes).unwrap_err();
    assert!(matches!(err.kind, ReadErrorKind::LengthMismatch { .. }));
    assert_eq!(err.offset, scene_len as u64);
}

#[test]
fn newer_versions_are_rejected() {
    let mut bytes = document(scene_with(|_| None));
    bytes[8..12].copy_from_slice(&1u32.to_le_bytes());
    let err = load(&bytes).unwrap_err();
    assert!(matches!(err.kind, ReadErrorKind::UnsupportedVersion { version: 1, .. }));
}

#[test]
fn truncated_documents_fail() {
    let bytes = document(scene_with(|_| None));
    for cut in [0, 5, 12, 20, bytes.len() - 1] {
        assert!(load(&bytes[..cut]).is_err(), "cut at {cut}");
    }
}

#[test]
fn missing_animator_fails() {
    let err = load(&scene_with(|_| None)).unwrap_err();
    assert!(matches!(err.kind, ReadErrorKind::TruncatedHeader { .. }));
}

/// Animator container with one float spline of `knots` per path, all
/// sharing the string and data chunks.
fn animator_with(paths: &[(&str, &str)], knots: &[records::FloatKnot]) -> Vec<u8> {
    let mut strings = Vec::new();
    let data = bytes_of(knots);
    let mut splines = Vec::new();
    for (resource, channel) in paths {
        let name_begin = strings.len() as u32;
        strings.extend_from_slice(resource.as_bytes());
        let path_begin = strings.len() as u32;
        strings.extend_from_slice(channel.as_bytes());
        splines.push(records::Spline {
            name_begin,
            path_begin,
            path_end: strings.len() as u32,
            data_begin: 0,
            data_end: data.len() as u32,
            kind: records::Spline::FLOAT,
        });
    }
    let mut out = Vec::new();
    ChunkWriter::new(&mut out)
        .write_container_with(tags::ANIMATOR, |w| {
            w.write_bytes(tags::STRINGS, &strings)?;
            w.write_bytes(tags::SPLINE_DATA, &data)?;
            w.write_records(tags::SPLINES, &splines)
        })
        .unwrap();
    out
}

fn with_animator(animator: Vec<u8>) -> Vec<u8> {
    let mut bytes = scene_with(|_| None);
    bytes.extend(animator);
    bytes
}

#[test]
fn duplicate_channel_paths_are_fatal() {
    let knot = records::FloatKnot {
        time: 0.0,
        value: 1.0,
    };
    let (_, animator) =
        load(&with_animator(animator_with(&[("cam", "fov"), ("cam", "near")], &[knot]))).unwrap();
    assert_eq!(animator.len(), 2);

    let bytes = with_animator(animator_with(&[("cam", "fov"), ("cam", "fov")], &[knot]));
    match load(&bytes).unwrap_err().kind {
        ReadErrorKind::DuplicatePath { path } => assert_eq!(path, Path::new("cam", "fov")),
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn empty_splines_still_count_as_duplicates() {
    let (_, animator) = load(&with_animator(animator_with(&[("cam", "fov")], &[]))).unwrap();
    assert!(animator.is_empty());

    let bytes = with_animator(animator_with(&[("cam", "fov"), ("cam", "fov")], &[]));
    assert!(matches!(
        load(&bytes).unwrap_err().kind,
        ReadErrorKind::DuplicatePath { .. }
    ));
}

#[test]
fn particle_wireframe_reads_under_the_draw_mask() {
    let instance = |name_begin, flags| records::ParticlesInstance {
        name_begin,
        name_end: name_begin + 1,
        transform: NONE,
        mesh: NONE,
        material: NONE,
        particles: NONE,
        flags,
    };
    let bytes = document(scene_with(|i| match i {
        0 => Some(b"pq".to_vec()),
        _ if i == position(tags::PARTICLES_INSTANCES) => {
            Some(bytes_of(&[instance(0, 0x02 | 0x04), instance(1, 0x0a | 0x01)]))
        }
        _ => None,
    }));
    let (scene, _) = load(&bytes).unwrap();
    let table = &scene.instances.particles;
    let p = &table[table.find("p").unwrap()].settings;
    assert!(p.wireframe && p.simulate_here && !p.visible);
    let q = &table[table.find("q").unwrap()].settings;
    assert!(!q.wireframe && q.visible && !q.simulate_here);
}
