use glam::{Quat, Vec3};

use super::{
    AtOffset, ReadError, ReadErrorKind, ReadSettings, Strings, check_length, checked_range,
    insert, reference,
};
use crate::chunk::ChunkReader;
use crate::diagnostics::Diagnostics;
use crate::header::ChunkHeader;
use crate::mesh::{self, BoneWeight, HalfedgeMesh, MeshError, MeshRanges, Pool, Pools};
use crate::records::{self, NONE, Named, flags, tags};
use crate::scene::*;
use crate::skeleton::{Bone, IkHandle, Skeleton};
use crate::spectrum::Spectrum;

fn name<'s>(
    strings: &'s Strings,
    what: &'static str,
    rec: &impl Named,
) -> Result<&'s str, ReadErrorKind> {
    let (begin, end) = rec.name_range();
    strings.get(what, begin, end)
}

fn unknown(what: &'static str, field: &'static str, value: u8) -> ReadErrorKind {
    ReadErrorKind::UnknownEnumerant { what, field, value }
}

fn load_textures(
    textures: &mut Table<Texture>,
    strings: &Strings,
    data: &[u8],
    recs: &[records::Texture],
) -> Result<(), ReadErrorKind> {
    for rec in recs {
        let name = name(strings, "Texture", rec)?;
        let (begin, end, kind) = (rec.data_begin, rec.data_end, rec.kind);
        checked_range("Texture", "data", begin, end, data.len())?;
        let bytes = &data[begin as usize..end as usize];
        let texture = match kind {
            records::Texture::CONSTANT => {
                let Ok(constant) =
                    bytemuck::try_pod_read_unaligned::<records::ConstantTextureData>(bytes)
                else {
                    return Err(ReadErrorKind::BadTextureData {
                        what: "Constant",
                        bytes: end - begin,
                        expected: "exactly 16",
                    });
                };
                Texture::Constant {
                    color: Spectrum::from_array(constant.color),
                    scale: constant.scale,
                }
            }
            records::Texture::IMAGE => {
                let Some((&sampler, image)) = bytes.split_first() else {
                    return Err(ReadErrorKind::BadTextureData {
                        what: "Image",
                        bytes: 0,
                        expected: "at least 1",
                    });
                };
                let sampler = match sampler {
                    records::SAMPLER_NEAREST => Sampler::Nearest,
                    records::SAMPLER_BILINEAR => Sampler::Bilinear,
                    records::SAMPLER_TRILINEAR => Sampler::Trilinear,
                    other => return Err(unknown("Texture", "sampler", other)),
                };
                Texture::Image {
                    sampler,
                    data: image.to_vec(),
                }
            }
            other => return Err(unknown("Texture", "type", other)),
        };
        insert(textures, ResourceKind::Texture, name, texture)?;
    }
    Ok(())
}

fn load_materials(
    materials: &mut Table<Material>,
    textures: &Table<Texture>,
    strings: &Strings,
    recs: &[records::Material],
) -> Result<(), ReadErrorKind> {
    let texture = |field, index| reference(textures, "Material", field, index);
    for rec in recs {
        let name = name(strings, "Material", rec)?;
        let (albedo, reflectance, transmittance, emissive) =
            (rec.albedo, rec.reflectance, rec.transmittance, rec.emissive);
        let ior = rec.ior;
        let material = match rec.kind {
            records::Material::LAMBERTIAN => Material::Lambertian {
                albedo: texture("albedo", albedo)?,
            },
            records::Material::MIRROR => Material::Mirror {
                reflectance: texture("reflectance", reflectance)?,
            },
            records::Material::REFRACT => Material::Refract {
                transmittance: texture("transmittance", transmittance)?,
                ior,
            },
            records::Material::GLASS => Material::Glass {
                reflectance: texture("reflectance", reflectance)?,
                transmittance: texture("transmittance", transmittance)?,
                ior,
            },
            records::Material::EMISSIVE => Material::Emissive {
                emissive: texture("emissive", emissive)?,
            },
            other => return Err(unknown("Material", "type", other)),
        };
        insert(materials, ResourceKind::Material, name, material)?;
    }
    Ok(())
}

fn load_transforms(
    transforms: &mut Table<Transform>,
    strings: &Strings,
    recs: &[records::Transform],
) -> Result<(), ReadErrorKind> {
    for (index, rec) in recs.iter().enumerate() {
        let name = name(strings, "Transform", rec)?;
        let index = index as u32;
        let parent = rec.parent;
        let parent = match parent {
            NONE => None,
            parent if parent >= index => {
                return Err(ReadErrorKind::NotTopological {
                    what: "Transform",
                    index,
                    parent,
                });
            }
            parent => Some(Id::from_index(parent)),
        };
        let transform = Transform {
            parent,
            translation: Vec3::from_array(rec.translation),
            rotation: Quat::from_array(rec.rotation),
            scale: Vec3::from_array(rec.scale),
        };
        insert(transforms, ResourceKind::Transform, name, transform)?;
    }
    Ok(())
}

fn load_cameras(
    cameras: &mut Table<Camera>,
    strings: &Strings,
    recs: &[records::Camera],
) -> Result<(), ReadErrorKind> {
    for rec in recs {
        let name = name(strings, "Camera", rec)?;
        let camera = Camera {
            vertical_fov: rec.vertical_fov,
            aspect_ratio: rec.aspect_ratio,
            near_plane: rec.near_plane,
            film: Film {
                width: rec.film_width,
                height: rec.film_height,
                samples: rec.film_samples,
                max_ray_depth: rec.film_max_ray_depth,
                sample_pattern: rec.film_sample_pattern,
            },
        };
        insert(cameras, ResourceKind::Camera, name, camera)?;
    }
    Ok(())
}

fn load_meshes(
    meshes: &mut Table<HalfedgeMesh>,
    strings: &Strings,
    pools: &Pools<'_, records::Vertex>,
    recs: &[records::HalfedgeMesh],
) -> Result<(), ReadErrorKind> {
    for rec in recs {
        let name = name(strings, "Halfedge mesh", rec)?;
        let ranges = MeshRanges {
            halfedges: rec.halfedges_begin..rec.halfedges_end,
            vertices: rec.vertices_begin..rec.vertices_end,
            edges: rec.edges_begin..rec.edges_end,
            faces: rec.faces_begin..rec.faces_end,
        };
        let mesh = mesh::link(pools, &ranges, |_| Ok(Vec::new())).map_err(|source| {
            ReadErrorKind::Mesh {
                what: "Halfedge mesh",
                name: name.to_owned(),
                source,
            }
        })?;
        insert(meshes, ResourceKind::HalfedgeMesh, name, mesh)?;
    }
    Ok(())
}

/// The pools shared by all skinned meshes of a file.
struct SkinnedPools {
    halfedges: Vec<records::Halfedge>,
    weights: Vec<records::Weight>,
    vertices: Vec<records::SkinnedVertex>,
    edges: Vec<records::Edge>,
    faces: Vec<records::Face>,
    bones: Vec<records::Bone>,
    handles: Vec<records::Handle>,
}

/// Weights of one vertex, with bones made relative to the skeleton at
/// `bones`.
fn vertex_weights(
    weights: &[records::Weight],
    vertex: &records::SkinnedVertex,
    bones: &std::ops::Range<u32>,
) -> Result<Vec<BoneWeight>, MeshError> {
    let (begin, end) = (vertex.weights_begin, vertex.weights_end);
    if begin > end || end as usize > weights.len() {
        return Err(MeshError::BadRange {
            pool: Pool::Weights,
            begin,
            end,
            len: weights.len(),
        });
    }
    weights[begin as usize..end as usize]
        .iter()
        .map(|w| {
            let bone = w.bone;
            if !bones.contains(&bone) {
                return Err(MeshError::WeightBone {
                    bone,
                    bones: bones.end - bones.start,
                });
            }
            Ok(BoneWeight {
                bone: bone - bones.start,
                weight: w.weight,
            })
        })
        .collect()
}

fn load_skeleton(pools: &SkinnedPools, rec: &records::SkinnedMesh) -> Result<Skeleton, ReadErrorKind> {
    let (bones_begin, bones_end) = (rec.bones_begin, rec.bones_end);
    let (handles_begin, handles_end) = (rec.handles_begin, rec.handles_end);
    checked_range("Skinned mesh", "bone", bones_begin, bones_end, pools.bones.len())?;
    checked_range(
        "Skinned mesh",
        "handle",
        handles_begin,
        handles_end,
        pools.handles.len(),
    )?;
    let count = (bones_end - bones_begin) as usize;

    let mut bones = Vec::with_capacity(count);
    for (i, b) in pools.bones[bones_begin as usize..bones_end as usize]
        .iter()
        .enumerate()
    {
        let index = i as u32;
        let parent = b.parent;
        let parent = match parent {
            NONE => None,
            parent if parent < bones_begin || parent >= bones_end => {
                return Err(ReadErrorKind::BadIndex {
                    what: "Bone",
                    field: "parent",
                    index: parent,
                    len: pools.bones.len(),
                });
            }
            parent if parent - bones_begin >= index => {
                return Err(ReadErrorKind::NotTopological {
                    what: "Bone",
                    index: bones_begin + index,
                    parent,
                });
            }
            parent => Some(parent - bones_begin),
        };
        bones.push(Bone {
            parent,
            extent: Vec3::from_array(b.extent),
            pose: Vec3::from_array(b.pose),
            radius: b.radius,
            // Not stored; files always use table position.
            channel_id: index,
        });
    }

    let mut handles = Vec::new();
    for (i, h) in pools.handles[handles_begin as usize..handles_end as usize]
        .iter()
        .enumerate()
    {
        let bone = h.bone;
        if bone < bones_begin || bone >= bones_end {
            return Err(ReadErrorKind::BadIndex {
                what: "IK handle",
                field: "bone",
                index: bone,
                len: pools.bones.len(),
            });
        }
        handles.push(IkHandle {
            bone: bone - bones_begin,
            target: Vec3::from_array(h.target),
            enabled: h.enabled != 0,
            channel_id: i as u32,
        });
    }

    Ok(Skeleton {
        base: Vec3::from_array(rec.base),
        base_offset: Vec3::ZERO,
        bones,
        handles,
    })
}

fn load_skinned_meshes(
    skinned_meshes: &mut Table<SkinnedMesh>,
    strings: &Strings,
    pools: &SkinnedPools,
    recs: &[records::SkinnedMesh],
) -> Result<(), ReadErrorKind> {
    let mesh_pools = Pools {
        halfedges: &pools.halfedges,
        vertices: &pools.vertices,
        edges: &pools.edges,
        faces: &pools.faces,
    };
    for rec in recs {
        let name = name(strings, "Skinned mesh", rec)?;
        let skeleton = load_skeleton(pools, rec)?;
        let ranges = MeshRanges {
            halfedges: rec.halfedges_begin..rec.halfedges_end,
            vertices: rec.vertices_begin..rec.vertices_end,
            edges: rec.edges_begin..rec.edges_end,
            faces: rec.faces_begin..rec.faces_end,
        };
        let bones = rec.bones_begin..rec.bones_end;
        let mesh = mesh::link(&mesh_pools, &ranges, |v| {
            vertex_weights(&pools.weights, v, &bones)
        })
        .map_err(|source| ReadErrorKind::Mesh {
            what: "Skinned mesh",
            name: name.to_owned(),
            source,
        })?;
        insert(
            skinned_meshes,
            ResourceKind::SkinnedMesh,
            name,
            SkinnedMesh { mesh, skeleton },
        )?;
    }
    Ok(())
}

fn load_shapes(
    shapes: &mut Table<Shape>,
    strings: &Strings,
    recs: &[records::Shape],
) -> Result<(), ReadErrorKind> {
    for rec in recs {
        let name = name(strings, "Shape", rec)?;
        let shape = match rec.kind {
            records::Shape::SPHERE => Shape::Sphere { radius: rec.radius },
            other => return Err(unknown("Shape", "type", other)),
        };
        insert(shapes, ResourceKind::Shape, name, shape)?;
    }
    Ok(())
}

fn load_particles(
    systems: &mut Table<Particles>,
    strings: &Strings,
    particles: &[records::Particle],
    recs: &[records::ParticleSystem],
) -> Result<(), ReadErrorKind> {
    for rec in recs {
        let name = name(strings, "Particle system", rec)?;
        let (begin, end) = (rec.particles_begin, rec.particles_end);
        checked_range("Particle system", "particle", begin, end, particles.len())?;
        let system = Particles {
            particles: particles[begin as usize..end as usize]
                .iter()
                .map(|p| Particle {
                    position: Vec3::from_array(p.position),
                    velocity: Vec3::from_array(p.velocity),
                    age: p.age,
                })
                .collect(),
            gravity: rec.gravity,
            radius: rec.radius,
            initial_velocity: rec.initial_velocity,
            spread_angle: rec.spread_angle,
            lifetime: rec.lifetime,
            rate: rec.rate,
            step_size: rec.step_size,
        };
        insert(systems, ResourceKind::Particles, name, system)?;
    }
    Ok(())
}

fn load_delta_lights(
    lights: &mut Table<DeltaLight>,
    strings: &Strings,
    recs: &[records::DeltaLight],
) -> Result<(), ReadErrorKind> {
    for rec in recs {
        let name = name(strings, "Delta light", rec)?;
        let color = Spectrum::from_array(rec.color);
        let intensity = rec.intensity;
        let light = match rec.kind {
            records::DeltaLight::POINT => DeltaLight::Point { color, intensity },
            records::DeltaLight::DIRECTIONAL => DeltaLight::Directional { color, intensity },
            records::DeltaLight::SPOT => DeltaLight::Spot {
                color,
                intensity,
                inner_angle: rec.inner_angle,
                outer_angle: rec.outer_angle,
            },
            other => return Err(unknown("Delta light", "type", other)),
        };
        insert(lights, ResourceKind::DeltaLight, name, light)?;
    }
    Ok(())
}

fn load_env_lights(
    lights: &mut Table<EnvironmentLight>,
    textures: &Table<Texture>,
    strings: &Strings,
    recs: &[records::EnvironmentLight],
) -> Result<(), ReadErrorKind> {
    for rec in recs {
        let name = name(strings, "Environment light", rec)?;
        let radiance = reference(textures, "Environment light", "radiance", rec.radiance)?;
        let intensity = rec.intensity;
        let light = match rec.kind {
            records::EnvironmentLight::HEMISPHERE => {
                EnvironmentLight::Hemisphere { radiance, intensity }
            }
            records::EnvironmentLight::SPHERE => EnvironmentLight::Sphere { radiance, intensity },
            other => return Err(unknown("Environment light", "type", other)),
        };
        insert(lights, ResourceKind::EnvironmentLight, name, light)?;
    }
    Ok(())
}

fn geometry_settings(what: &'static str, bits: u32) -> Result<GeometrySettings, ReadErrorKind> {
    let draw_style = match bits & flags::DRAW_STYLE_MASK {
        flags::DRAW_WIREFRAME => DrawStyle::Wireframe,
        flags::DRAW_FLAT => DrawStyle::Flat,
        flags::DRAW_SMOOTH => DrawStyle::Smooth,
        _ => DrawStyle::Correct,
    };
    let blend_style = match bits & flags::BLEND_MASK {
        flags::BLEND_REPLACE => BlendStyle::Replace,
        flags::BLEND_ADD => BlendStyle::Add,
        flags::BLEND_OVER => BlendStyle::Over,
        other => {
            return Err(ReadErrorKind::UnknownFlags {
                what,
                field: "blend style",
                bits: other,
            });
        }
    };
    let depth_style = match bits & flags::DEPTH_MASK {
        flags::DEPTH_LESS => DepthStyle::Less,
        flags::DEPTH_ALWAYS => DepthStyle::Always,
        flags::DEPTH_NEVER => DepthStyle::Never,
        other => {
            return Err(ReadErrorKind::UnknownFlags {
                what,
                field: "depth style",
                bits: other,
            });
        }
    };
    Ok(GeometrySettings {
        visible: bits & flags::VISIBLE != 0,
        draw_style,
        blend_style,
        depth_style,
    })
}

/// Resources instances may refer to.
struct Targets<'a> {
    transforms: &'a Table<Transform>,
    materials: &'a Table<Material>,
}

fn load_geometry_instances<T>(
    instances: &mut Table<GeometryInstance<T>>,
    kind: ResourceKind,
    what: &'static str,
    items: &Table<T>,
    targets: &Targets<'_>,
    strings: &Strings,
    recs: &[records::GeometryInstance],
) -> Result<(), ReadErrorKind> {
    for rec in recs {
        let name = name(strings, what, rec)?;
        let instance = GeometryInstance {
            transform: reference(targets.transforms, what, "transform", rec.transform)?,
            item: reference(items, what, "item", rec.item)?,
            material: reference(targets.materials, what, "material", rec.material)?,
            settings: geometry_settings(what, rec.flags)?,
        };
        insert(instances, kind, name, instance)?;
    }
    Ok(())
}

fn load_camera_instances(
    instances: &mut Table<CameraInstance>,
    cameras: &Table<Camera>,
    transforms: &Table<Transform>,
    strings: &Strings,
    recs: &[records::CameraInstance],
) -> Result<(), ReadErrorKind> {
    let what = "Camera instance";
    for rec in recs {
        let name = name(strings, what, rec)?;
        let instance = CameraInstance {
            transform: reference(transforms, what, "transform", rec.transform)?,
            camera: reference(cameras, what, "camera", rec.camera)?,
        };
        insert(instances, ResourceKind::CameraInstance, name, instance)?;
    }
    Ok(())
}

fn load_particles_instances(
    instances: &mut Table<ParticlesInstance>,
    meshes: &Table<HalfedgeMesh>,
    particles: &Table<Particles>,
    targets: &Targets<'_>,
    strings: &Strings,
    recs: &[records::ParticlesInstance],
) -> Result<(), ReadErrorKind> {
    let what = "Particles instance";
    for rec in recs {
        let name = name(strings, what, rec)?;
        let bits = rec.flags;
        let instance = ParticlesInstance {
            transform: reference(targets.transforms, what, "transform", rec.transform)?,
            mesh: reference(meshes, what, "mesh", rec.mesh)?,
            material: reference(targets.materials, what, "material", rec.material)?,
            particles: reference(particles, what, "particles", rec.particles)?,
            settings: SimulateSettings {
                visible: bits & flags::PARTICLES_VISIBLE != 0,
                wireframe: bits & flags::PARTICLES_DRAW_MASK == flags::PARTICLES_WIREFRAME,
                simulate_here: bits & flags::PARTICLES_SIMULATE_HERE != 0,
            },
        };
        insert(instances, ResourceKind::ParticlesInstance, name, instance)?;
    }
    Ok(())
}

fn load_light_instances<T>(
    instances: &mut Table<LightInstance<T>>,
    kind: ResourceKind,
    what: &'static str,
    lights: &Table<T>,
    transforms: &Table<Transform>,
    strings: &Strings,
    recs: &[records::LightInstance],
) -> Result<(), ReadErrorKind> {
    for rec in recs {
        let name = name(strings, what, rec)?;
        let instance = LightInstance {
            transform: reference(transforms, what, "transform", rec.transform)?,
            light: reference(lights, what, "light", rec.light)?,
            settings: LightSettings {
                visible: rec.flags & flags::LIGHT_VISIBLE != 0,
            },
        };
        insert(instances, kind, name, instance)?;
    }
    Ok(())
}

fn load_instances(
    scene: &mut Scene,
    strings: &Strings,
    r: &mut ChunkReader<'_>,
) -> Result<(), ReadError> {
    let Scene {
        transforms,
        materials,
        cameras,
        meshes,
        skinned_meshes,
        shapes,
        particles,
        delta_lights,
        env_lights,
        instances,
        ..
    } = scene;
    let (transforms, materials) = (&*transforms, &*materials);
    let targets = Targets {
        transforms,
        materials,
    };

    let at = r.offset();
    let recs: Vec<records::CameraInstance> = r.read_records(tags::CAMERA_INSTANCES)?;
    load_camera_instances(&mut instances.cameras, cameras, transforms, strings, &recs).at(at)?;

    let at = r.offset();
    let recs: Vec<records::GeometryInstance> = r.read_records(tags::MESH_INSTANCES)?;
    load_geometry_instances(
        &mut instances.meshes,
        ResourceKind::MeshInstance,
        "Mesh instance",
        meshes,
        &targets,
        strings,
        &recs,
    )
    .at(at)?;

    let at = r.offset();
    let recs: Vec<records::GeometryInstance> = r.read_records(tags::SKINNED_MESH_INSTANCES)?;
    load_geometry_instances(
        &mut instances.skinned_meshes,
        ResourceKind::SkinnedMeshInstance,
        "Skinned mesh instance",
        skinned_meshes,
        &targets,
        strings,
        &recs,
    )
    .at(at)?;

    let at = r.offset();
    let recs: Vec<records::GeometryInstance> = r.read_records(tags::SHAPE_INSTANCES)?;
    load_geometry_instances(
        &mut instances.shapes,
        ResourceKind::ShapeInstance,
        "Shape instance",
        shapes,
        &targets,
        strings,
        &recs,
    )
    .at(at)?;

    let at = r.offset();
    let recs: Vec<records::ParticlesInstance> = r.read_records(tags::PARTICLES_INSTANCES)?;
    load_particles_instances(
        &mut instances.particles,
        meshes,
        particles,
        &targets,
        strings,
        &recs,
    )
    .at(at)?;

    let at = r.offset();
    let recs: Vec<records::LightInstance> = r.read_records(tags::DELTA_LIGHT_INSTANCES)?;
    load_light_instances(
        &mut instances.delta_lights,
        ResourceKind::DeltaLightInstance,
        "Delta light instance",
        delta_lights,
        transforms,
        strings,
        &recs,
    )
    .at(at)?;

    let at = r.offset();
    let recs: Vec<records::LightInstance> = r.read_records(tags::ENVIRONMENT_LIGHT_INSTANCES)?;
    load_light_instances(
        &mut instances.env_lights,
        ResourceKind::EnvironmentLightInstance,
        "Environment light instance",
        env_lights,
        transforms,
        strings,
        &recs,
    )
    .at(at)?;

    Ok(())
}

/// Read the scene container, leaving `r` just past it.
pub fn read_scene(
    r: &mut ChunkReader<'_>,
    settings: &ReadSettings,
    diagnostics: &mut Diagnostics,
) -> Result<Scene, ReadError> {
    let start = r.offset();
    let header = r.read_container(tags::SCENE)?;
    let declared = header.bytes;
    let mut scene = Scene::new();

    let strings = Strings(r.read_bytes(tags::STRINGS)?);

    let at = r.offset();
    let texture_data = r.read_bytes(tags::TEXTURE_DATA)?;
    let recs: Vec<records::Texture> = r.read_records(tags::TEXTURES)?;
    load_textures(&mut scene.textures, &strings, &texture_data, &recs).at(at)?;

    let at = r.offset();
    let recs: Vec<records::Material> = r.read_records(tags::MATERIALS)?;
    load_materials(&mut scene.materials, &scene.textures, &strings, &recs).at(at)?;

    let at = r.offset();
    let recs: Vec<records::Transform> = r.read_records(tags::TRANSFORMS)?;
    load_transforms(&mut scene.transforms, &strings, &recs).at(at)?;

    let at = r.offset();
    let recs: Vec<records::Camera> = r.read_records(tags::CAMERAS)?;
    load_cameras(&mut scene.cameras, &strings, &recs).at(at)?;

    let at = r.offset();
    let halfedges: Vec<records::Halfedge> = r.read_records(tags::HALFEDGES)?;
    let vertices: Vec<records::Vertex> = r.read_records(tags::VERTICES)?;
    let edges: Vec<records::Edge> = r.read_records(tags::EDGES)?;
    let faces: Vec<records::Face> = r.read_records(tags::FACES)?;
    let recs: Vec<records::HalfedgeMesh> = r.read_records(tags::MESHES)?;
    let pools = Pools {
        halfedges: &halfedges,
        vertices: &vertices,
        edges: &edges,
        faces: &faces,
    };
    load_meshes(&mut scene.meshes, &strings, &pools, &recs).at(at)?;

    let at = r.offset();
    let pools = SkinnedPools {
        halfedges: r.read_records(tags::HALFEDGES)?,
        weights: r.read_records(tags::WEIGHTS)?,
        vertices: r.read_records(tags::SKINNED_VERTICES)?,
        edges: r.read_records(tags::EDGES)?,
        faces: r.read_records(tags::FACES)?,
        bones: r.read_records(tags::BONES)?,
        handles: r.read_records(tags::HANDLES)?,
    };
    let recs: Vec<records::SkinnedMesh> = r.read_records(tags::SKINNED_MESHES)?;
    load_skinned_meshes(&mut scene.skinned_meshes, &strings, &pools, &recs).at(at)?;

    let at = r.offset();
    let recs: Vec<records::Shape> = r.read_records(tags::SHAPES)?;
    load_shapes(&mut scene.shapes, &strings, &recs).at(at)?;

    let at = r.offset();
    let particles: Vec<records::Particle> = r.read_records(tags::PARTICLES)?;
    let recs: Vec<records::ParticleSystem> = r.read_records(tags::PARTICLE_SYSTEMS)?;
    load_particles(&mut scene.particles, &strings, &particles, &recs).at(at)?;

    let at = r.offset();
    let recs: Vec<records::DeltaLight> = r.read_records(tags::DELTA_LIGHTS)?;
    load_delta_lights(&mut scene.delta_lights, &strings, &recs).at(at)?;

    let at = r.offset();
    let recs: Vec<records::EnvironmentLight> = r.read_records(tags::ENVIRONMENT_LIGHTS)?;
    load_env_lights(&mut scene.env_lights, &scene.textures, &strings, &recs).at(at)?;

    load_instances(&mut scene, &strings, r)?;

    let actual = r.offset() - start - ChunkHeader::encoded_len() as u64;
    if let Err(kind) = check_length(tags::SCENE, declared, actual) {
        let err = ReadError::new(start, kind);
        if settings.strict_length {
            return Err(err);
        }
        diagnostics.warn(err.to_string());
    }

    log::debug!(
        "Read {} resources and {} instances",
        scene.resource_count(),
        scene.instance_count()
    );
    Ok(scene)
}
