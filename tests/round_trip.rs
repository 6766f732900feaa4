use glam::{Mat4, Quat, Vec2, Vec3};
use s3d_scene::animator::{Animator, Path};
use s3d_scene::diagnostics::Diagnostics;
use s3d_scene::mesh::{BoneWeight, HalfedgeMesh};
use s3d_scene::read::{ReadSettings, read_document};
use s3d_scene::scene::*;
use s3d_scene::spectrum::Spectrum;
use s3d_scene::write::write_document;

fn rich_scene() -> anyhow::Result<Scene> {
    let mut scene = Scene::new();

    let checker = scene.textures.insert(
        "checker",
        Texture::Image {
            sampler: Sampler::Bilinear,
            data: b"\x89PNG not really".to_vec(),
        },
    )?;
    let grey = scene.textures.insert("grey", Texture::default())?;
    let lambert = scene
        .materials
        .insert("clay", Material::Lambertian { albedo: Some(checker) })?;
    scene.materials.insert(
        "window",
        Material::Glass {
            reflectance: Some(grey),
            transmittance: None,
            ior: 1.5,
        },
    )?;
    scene
        .materials
        .insert("lamp", Material::Emissive { emissive: Some(grey) })?;

    let root = scene.transforms.insert("root", Transform::default())?;
    let arm = scene.transforms.insert(
        "arm",
        Transform {
            parent: Some(root),
            translation: Vec3::new(1.0, 2.0, 3.0),
            rotation: Quat::from_rotation_z(0.5),
            scale: Vec3::splat(2.0),
        },
    )?;

    let camera = scene.cameras.insert("camera", Camera::default())?;
    let cube = scene.meshes.insert("cube", HalfedgeMesh::cube(0.5))?;

    let mut skinned = SkinnedMesh {
        mesh: HalfedgeMesh::cube(1.0),
        ..Default::default()
    };
    let shoulder = skinned.skeleton.add_bone(None, Vec3::Y);
    let elbow = skinned.skeleton.add_bone(Some(shoulder), Vec3::new(0.0, 0.5, 0.0));
    skinned.skeleton.add_handle(elbow, Vec3::new(0.0, 1.5, 0.5));
    skinned.skeleton.base = Vec3::new(0.0, -1.0, 0.0);
    for (i, vertex) in skinned.mesh.vertices.iter_mut().enumerate() {
        vertex.bone_weights = vec![
            BoneWeight { bone: shoulder, weight: 1.0 - i as f32 / 8.0 },
            BoneWeight { bone: elbow, weight: i as f32 / 8.0 },
        ];
    }
    let body = scene.skinned_meshes.insert("body", skinned)?;
    let ball = scene.shapes.insert("ball", Shape::Sphere { radius: 0.25 })?;

    let sparks = scene.particles.insert(
        "sparks",
        Particles {
            particles: vec![Particle {
                position: Vec3::X,
                velocity: Vec3::Y,
                age: 0.5,
            }],
            ..Default::default()
        },
    )?;
    let spot = scene.delta_lights.insert("spot", DeltaLight::spot())?;
    let sky = scene.env_lights.insert(
        "sky",
        EnvironmentLight::Sphere {
            radiance: Some(checker),
            intensity: 2.0,
        },
    )?;

    let i = &mut scene.instances;
    i.cameras.insert(
        "camera instance",
        CameraInstance {
            transform: Some(root),
            camera: Some(camera),
        },
    )?;
    i.meshes.insert(
        "cube instance",
        MeshInstance {
            transform: Some(arm),
            item: Some(cube),
            material: Some(lambert),
            settings: GeometrySettings {
                visible: false,
                draw_style: DrawStyle::Wireframe,
                blend_style: BlendStyle::Add,
                depth_style: DepthStyle::Always,
            },
        },
    )?;
    i.skinned_meshes.insert(
        "body instance",
        SkinnedMeshInstance {
            item: Some(body),
            ..Default::default()
        },
    )?;
    i.shapes.insert(
        "ball instance",
        ShapeInstance {
            transform: Some(arm),
            item: Some(ball),
            ..Default::default()
        },
    )?;
    i.particles.insert(
        "sparks instance",
        ParticlesInstance {
            transform: None,
            mesh: Some(cube),
            material: Some(lambert),
            particles: Some(sparks),
            settings: SimulateSettings {
                visible: true,
                wireframe: true,
                simulate_here: false,
            },
        },
    )?;
    i.delta_lights.insert(
        "spot instance",
        DeltaLightInstance {
            transform: Some(root),
            light: Some(spot),
            settings: LightSettings { visible: false },
        },
    )?;
    i.env_lights.insert(
        "sky instance",
        EnvironmentLightInstance {
            light: Some(sky),
            ..Default::default()
        },
    )?;
    Ok(scene)
}

fn rich_animator() -> Animator {
    let mut animator = Animator::new();
    animator.set(Path::new("arm", "translation"), 0.0, Vec3::ZERO);
    animator.set(Path::new("arm", "translation"), 1.0, Vec3::ONE);
    animator.set(Path::new("arm", "rotation"), 0.5, Quat::from_rotation_x(1.0));
    animator.set(Path::new("camera", "vertical_fov"), 2.0, 45.0f32);
    animator.set(Path::new("spot instance", "visible"), 3.0, true);
    animator.set(Path::new("grey", "color"), 0.0, Spectrum::new(0.1, 0.2, 0.3));
    animator.set(Path::new("sparks", "offset"), 0.0, Vec2::new(1.0, 2.0));
    animator.set(
        Path::new("rig", "matrix"),
        1.0,
        Mat4::from_scale_rotation_translation(
            Vec3::splat(2.0),
            Quat::from_rotation_y(0.3),
            Vec3::new(4.0, 5.0, 6.0),
        ),
    );
    animator
}

#[test]
fn document_survives_a_round_trip() -> anyhow::Result<()> {
    let scene = rich_scene()?;
    let animator = rich_animator();

    let mut diagnostics = Diagnostics::new();
    let mut bytes = Vec::new();
    write_document(&mut bytes, &scene, &animator, &mut diagnostics)?;
    assert!(diagnostics.is_empty());
    assert_eq!(&bytes[..4], b"s3ds");

    let mut input = &bytes[..];
    let (read_scene, read_animator) =
        read_document(&mut input, &ReadSettings::default(), &mut diagnostics)?;
    assert!(input.is_empty());
    assert!(diagnostics.is_empty());
    assert_eq!(read_scene, scene);
    assert_eq!(read_animator, animator);

    // Encoding is deterministic.
    let mut again = Vec::new();
    write_document(&mut again, &read_scene, &read_animator, &mut diagnostics)?;
    assert_eq!(again, bytes);
    Ok(())
}

#[test]
fn children_may_precede_parents_in_memory() -> anyhow::Result<()> {
    let mut scene = Scene::new();
    let child = scene.transforms.insert("child", Transform::default())?;
    let parent = scene.transforms.insert(
        "parent",
        Transform {
            translation: Vec3::X,
            ..Default::default()
        },
    )?;
    scene.transforms[child].parent = Some(parent);

    let mut bytes = Vec::new();
    let mut diagnostics = Diagnostics::new();
    write_document(&mut bytes, &scene, &Animator::new(), &mut diagnostics)?;
    let (read, _) = read_document(&mut &bytes[..], &ReadSettings::default(), &mut diagnostics)?;

    let names: Vec<_> = read.transforms.iter().map(|(_, n, _)| n).collect();
    assert_eq!(names, ["parent", "child"]);
    let child = read.transforms.find("child").unwrap();
    assert_eq!(read.transforms[child].parent, read.transforms.find("parent"));
    assert_eq!(read.transforms[read.transforms.find("parent").unwrap()].translation, Vec3::X);
    Ok(())
}

#[test]
fn channel_ids_become_positions() -> anyhow::Result<()> {
    let mut scene = Scene::new();
    let mut skinned = SkinnedMesh::default();
    skinned.skeleton.add_bone(None, Vec3::Y);
    skinned.skeleton.add_bone(Some(0), Vec3::Y);
    skinned.skeleton.bones[1].channel_id = 7;
    scene.skinned_meshes.insert("rig", skinned)?;

    let mut bytes = Vec::new();
    let mut diagnostics = Diagnostics::new();
    write_document(&mut bytes, &scene, &Animator::new(), &mut diagnostics)?;
    assert_eq!(diagnostics.len(), 1);

    let (read, _) = read_document(&mut &bytes[..], &ReadSettings::default(), &mut diagnostics)?;
    let rig = &read.skinned_meshes[read.skinned_meshes.find("rig").unwrap()];
    assert_eq!(rig.skeleton.bones[1].channel_id, 1);
    assert!(rig.skeleton.has_positional_channel_ids());
    Ok(())
}

#[test]
fn orphan_channels_can_be_pruned_and_restored() -> anyhow::Result<()> {
    let mut scene = Scene::new();
    scene.transforms.insert("rock", Transform::default())?;
    let mut animator = Animator::new();
    animator.set(Path::new("rock", "translation"), 0.0, Vec3::ZERO);
    animator.set(Path::new("rock", "transform.does_not_exist"), 0.0, 1.0f32);

    let mut diagnostics = Diagnostics::new();
    let removed = animator.remove_unused_channels(&scene, &mut diagnostics);
    assert_eq!(removed.len(), 1);
    assert_eq!(removed[0].0, Path::new("rock", "transform.does_not_exist"));
    assert_eq!(animator.len(), 1);

    animator.insert_channels(removed);
    assert_eq!(animator.get::<f32>(&Path::new("rock", "transform.does_not_exist"), 0.0), Some(1.0));
    Ok(())
}
