use bytemuck::Zeroable;

use super::{StringTable, WriteError, index_of, offset};
use crate::chunk::ChunkWriter;
use crate::diagnostics::Diagnostics;
use crate::mesh::{self, BoneWeight, FlatMesh, MeshError};
use crate::records::{self, NONE, flags, tags};
use crate::scene::*;

/// Every chunk of the scene container, built before anything is written.
#[derive(Default)]
struct SceneChunks {
    strings: StringTable,
    texture_data: Vec<u8>,
    textures: Vec<records::Texture>,
    materials: Vec<records::Material>,
    transforms: Vec<records::Transform>,
    cameras: Vec<records::Camera>,
    mesh_pools: FlatMesh<records::Vertex>,
    meshes: Vec<records::HalfedgeMesh>,
    skinned_pools: FlatMesh<records::SkinnedVertex>,
    weights: Vec<records::Weight>,
    bones: Vec<records::Bone>,
    handles: Vec<records::Handle>,
    skinned_meshes: Vec<records::SkinnedMesh>,
    shapes: Vec<records::Shape>,
    particles: Vec<records::Particle>,
    particle_systems: Vec<records::ParticleSystem>,
    delta_lights: Vec<records::DeltaLight>,
    env_lights: Vec<records::EnvironmentLight>,
    camera_instances: Vec<records::CameraInstance>,
    mesh_instances: Vec<records::GeometryInstance>,
    skinned_mesh_instances: Vec<records::GeometryInstance>,
    shape_instances: Vec<records::GeometryInstance>,
    particles_instances: Vec<records::ParticlesInstance>,
    delta_light_instances: Vec<records::LightInstance>,
    env_light_instances: Vec<records::LightInstance>,
}

/// File position of every transform, parents first.
fn transform_order(transforms: &Table<Transform>) -> Result<Vec<u32>, WriteError> {
    let mut order = vec![NONE; transforms.len()];
    let mut placed = 0u32;
    for (id, name, _) in transforms.iter() {
        // Walk up to the first ancestor that already has a position.
        let mut chain = Vec::new();
        let mut current = Some((id, name));
        while let Some((id, name)) = current {
            if order[id.index()] != NONE {
                break;
            }
            if chain.contains(&id) {
                return Err(WriteError::TransformCycle {
                    name: name.to_owned(),
                });
            }
            chain.push(id);
            current = match transforms[id].parent {
                None => None,
                Some(parent) => match transforms.name(parent) {
                    Some(parent_name) => Some((parent, parent_name)),
                    None => {
                        return Err(WriteError::MissingReference {
                            what: "Transform",
                            name: name.to_owned(),
                            field: "parent",
                        });
                    }
                },
            };
        }
        for id in chain.into_iter().rev() {
            order[id.index()] = placed;
            placed += 1;
        }
    }
    Ok(order)
}

fn transform_index(
    order: &[u32],
    id: Option<Id<Transform>>,
    what: &'static str,
    name: &str,
) -> Result<u32, WriteError> {
    match id {
        None => Ok(NONE),
        Some(id) => order
            .get(id.index())
            .copied()
            .ok_or_else(|| WriteError::MissingReference {
                what,
                name: name.to_owned(),
                field: "transform",
            }),
    }
}

fn geometry_flags(settings: &GeometrySettings) -> u32 {
    let mut bits = 0;
    if settings.visible {
        bits |= flags::VISIBLE;
    }
    bits |= match settings.draw_style {
        DrawStyle::Wireframe => flags::DRAW_WIREFRAME,
        DrawStyle::Flat => flags::DRAW_FLAT,
        DrawStyle::Smooth => flags::DRAW_SMOOTH,
        DrawStyle::Correct => flags::DRAW_CORRECT,
    };
    bits |= match settings.blend_style {
        BlendStyle::Replace => flags::BLEND_REPLACE,
        BlendStyle::Add => flags::BLEND_ADD,
        BlendStyle::Over => flags::BLEND_OVER,
    };
    bits |= match settings.depth_style {
        DepthStyle::Less => flags::DEPTH_LESS,
        DepthStyle::Always => flags::DEPTH_ALWAYS,
        DepthStyle::Never => flags::DEPTH_NEVER,
    };
    bits
}

fn mesh_error<'a>(
    what: &'static str,
    name: &'a str,
) -> impl FnOnce(MeshError) -> WriteError + 'a {
    move |source| WriteError::Mesh {
        what,
        name: name.to_owned(),
        source,
    }
}

impl SceneChunks {
    fn add_textures(&mut self, scene: &Scene) -> Result<(), WriteError> {
        for (_, name, texture) in scene.textures.iter() {
            let (name_begin, name_end) = self.strings.push(name)?;
            let data_begin = offset(tags::TEXTURE_DATA, self.texture_data.len())?;
            let kind = match texture {
                Texture::Constant { color, scale } => {
                    let constant = records::ConstantTextureData {
                        color: color.to_array(),
                        scale: *scale,
                    };
                    self.texture_data
                        .extend_from_slice(bytemuck::bytes_of(&constant));
                    records::Texture::CONSTANT
                }
                Texture::Image { sampler, data } => {
                    self.texture_data.push(match sampler {
                        Sampler::Nearest => records::SAMPLER_NEAREST,
                        Sampler::Bilinear => records::SAMPLER_BILINEAR,
                        Sampler::Trilinear => records::SAMPLER_TRILINEAR,
                    });
                    self.texture_data.extend_from_slice(data);
                    records::Texture::IMAGE
                }
            };
            self.textures.push(records::Texture {
                name_begin,
                name_end,
                data_begin,
                data_end: offset(tags::TEXTURE_DATA, self.texture_data.len())?,
                kind,
            });
        }
        Ok(())
    }

    fn add_materials(&mut self, scene: &Scene) -> Result<(), WriteError> {
        for (_, name, material) in scene.materials.iter() {
            let (name_begin, name_end) = self.strings.push(name)?;
            let texture = |id, field| index_of(&scene.textures, id, "Material", name, field);
            let mut rec = records::Material {
                name_begin,
                name_end,
                albedo: NONE,
                reflectance: NONE,
                transmittance: NONE,
                emissive: NONE,
                ior: 1.0,
                kind: 0,
            };
            match *material {
                Material::Lambertian { albedo } => {
                    rec.albedo = texture(albedo, "albedo")?;
                    rec.kind = records::Material::LAMBERTIAN;
                }
                Material::Mirror { reflectance } => {
                    rec.reflectance = texture(reflectance, "reflectance")?;
                    rec.kind = records::Material::MIRROR;
                }
                Material::Refract { transmittance, ior } => {
                    rec.transmittance = texture(transmittance, "transmittance")?;
                    rec.ior = ior;
                    rec.kind = records::Material::REFRACT;
                }
                Material::Glass {
                    reflectance,
                    transmittance,
                    ior,
                } => {
                    rec.reflectance = texture(reflectance, "reflectance")?;
                    rec.transmittance = texture(transmittance, "transmittance")?;
                    rec.ior = ior;
                    rec.kind = records::Material::GLASS;
                }
                Material::Emissive { emissive } => {
                    rec.emissive = texture(emissive, "emissive")?;
                    rec.kind = records::Material::EMISSIVE;
                }
            }
            self.materials.push(rec);
        }
        Ok(())
    }

    fn add_transforms(&mut self, scene: &Scene, order: &[u32]) -> Result<(), WriteError> {
        let mut recs = vec![records::Transform::zeroed(); order.len()];
        for (id, name, transform) in scene.transforms.iter() {
            let (name_begin, name_end) = self.strings.push(name)?;
            recs[order[id.index()] as usize] = records::Transform {
                name_begin,
                name_end,
                parent: transform_index(order, transform.parent, "Transform", name)?,
                translation: transform.translation.to_array(),
                rotation: transform.rotation.to_array(),
                scale: transform.scale.to_array(),
            };
        }
        self.transforms = recs;
        Ok(())
    }

    fn add_cameras(&mut self, scene: &Scene) -> Result<(), WriteError> {
        for (_, name, camera) in scene.cameras.iter() {
            let (name_begin, name_end) = self.strings.push(name)?;
            let film = camera.film;
            self.cameras.push(records::Camera {
                name_begin,
                name_end,
                vertical_fov: camera.vertical_fov,
                aspect_ratio: camera.aspect_ratio,
                near_plane: camera.near_plane,
                film_width: film.width,
                film_height: film.height,
                film_samples: film.samples,
                film_max_ray_depth: film.max_ray_depth,
                film_sample_pattern: film.sample_pattern,
            });
        }
        Ok(())
    }

    fn add_meshes(&mut self, scene: &Scene) -> Result<(), WriteError> {
        for (_, name, mesh) in scene.meshes.iter() {
            let (name_begin, name_end) = self.strings.push(name)?;
            let ranges = mesh::flatten(mesh, &mut self.mesh_pools, |v, halfedge| {
                Ok(records::Vertex {
                    halfedge,
                    position: v.position.to_array(),
                })
            })
            .map_err(mesh_error("Halfedge mesh", name))?;
            self.meshes.push(records::HalfedgeMesh {
                name_begin,
                name_end,
                halfedges_begin: ranges.halfedges.start,
                halfedges_end: ranges.halfedges.end,
                vertices_begin: ranges.vertices.start,
                vertices_end: ranges.vertices.end,
                edges_begin: ranges.edges.start,
                edges_end: ranges.edges.end,
                faces_begin: ranges.faces.start,
                faces_end: ranges.faces.end,
            });
        }
        Ok(())
    }

    fn add_skinned_meshes(
        &mut self,
        scene: &Scene,
        diagnostics: &mut Diagnostics,
    ) -> Result<(), WriteError> {
        for (_, name, skinned) in scene.skinned_meshes.iter() {
            let (name_begin, name_end) = self.strings.push(name)?;
            let skeleton = &skinned.skeleton;
            if let Some(bone) = skeleton.first_unordered_bone() {
                return Err(WriteError::BoneOrder {
                    name: name.to_owned(),
                    bone,
                });
            }
            if !skeleton.has_positional_channel_ids() {
                diagnostics.info(format!(
                    "Skinned mesh '{}' has bone or handle channel ids that will become table positions on load",
                    name
                ));
            }

            let bones_begin = offset(tags::BONES, self.bones.len())?;
            let bone_count = skeleton.bones.len();
            for bone in &skeleton.bones {
                self.bones.push(records::Bone {
                    parent: bone.parent.map_or(NONE, |p| bones_begin + p),
                    radius: bone.radius,
                    pose: bone.pose.to_array(),
                    extent: bone.extent.to_array(),
                });
            }
            let bones_end = offset(tags::BONES, self.bones.len())?;

            let handles_begin = offset(tags::HANDLES, self.handles.len())?;
            for handle in &skeleton.handles {
                if handle.bone as usize >= bone_count {
                    return Err(WriteError::HandleBone {
                        name: name.to_owned(),
                        bone: handle.bone,
                        bones: bone_count,
                    });
                }
                self.handles.push(records::Handle {
                    bone: bones_begin + handle.bone,
                    target: handle.target.to_array(),
                    enabled: handle.enabled as u8,
                });
            }
            let handles_end = offset(tags::HANDLES, self.handles.len())?;

            let weights = &mut self.weights;
            let ranges = mesh::flatten(&skinned.mesh, &mut self.skinned_pools, |v, halfedge| {
                let weights_begin = index(weights.len())?;
                for &BoneWeight { bone, weight } in &v.bone_weights {
                    if bone as usize >= bone_count {
                        return Err(MeshError::WeightBone {
                            bone,
                            bones: bone_count as u32,
                        });
                    }
                    weights.push(records::Weight {
                        bone: bones_begin + bone,
                        weight,
                    });
                }
                Ok(records::SkinnedVertex {
                    halfedge,
                    position: v.position.to_array(),
                    weights_begin,
                    weights_end: index(weights.len())?,
                })
            })
            .map_err(mesh_error("Skinned mesh", name))?;

            self.skinned_meshes.push(records::SkinnedMesh {
                name_begin,
                name_end,
                halfedges_begin: ranges.halfedges.start,
                halfedges_end: ranges.halfedges.end,
                vertices_begin: ranges.vertices.start,
                vertices_end: ranges.vertices.end,
                edges_begin: ranges.edges.start,
                edges_end: ranges.edges.end,
                faces_begin: ranges.faces.start,
                faces_end: ranges.faces.end,
                bones_begin,
                bones_end,
                handles_begin,
                handles_end,
                base: skeleton.base.to_array(),
            });
        }
        Ok(())
    }

    fn add_shapes(&mut self, scene: &Scene) -> Result<(), WriteError> {
        for (_, name, shape) in scene.shapes.iter() {
            let (name_begin, name_end) = self.strings.push(name)?;
            let Shape::Sphere { radius } = *shape;
            self.shapes.push(records::Shape {
                name_begin,
                name_end,
                radius,
                kind: records::Shape::SPHERE,
            });
        }
        Ok(())
    }

    fn add_particles(&mut self, scene: &Scene) -> Result<(), WriteError> {
        for (_, name, system) in scene.particles.iter() {
            let (name_begin, name_end) = self.strings.push(name)?;
            let particles_begin = offset(tags::PARTICLES, self.particles.len())?;
            self.particles
                .extend(system.particles.iter().map(|p| records::Particle {
                    position: p.position.to_array(),
                    velocity: p.velocity.to_array(),
                    age: p.age,
                }));
            self.particle_systems.push(records::ParticleSystem {
                name_begin,
                name_end,
                particles_begin,
                particles_end: offset(tags::PARTICLES, self.particles.len())?,
                gravity: system.gravity,
                radius: system.radius,
                initial_velocity: system.initial_velocity,
                spread_angle: system.spread_angle,
                lifetime: system.lifetime,
                rate: system.rate,
                step_size: system.step_size,
            });
        }
        Ok(())
    }

    fn add_lights(&mut self, scene: &Scene) -> Result<(), WriteError> {
        for (_, name, light) in scene.delta_lights.iter() {
            let (name_begin, name_end) = self.strings.push(name)?;
            let (color, intensity, inner_angle, outer_angle, kind) = match *light {
                DeltaLight::Point { color, intensity } => {
                    (color, intensity, 0.0, 0.0, records::DeltaLight::POINT)
                }
                DeltaLight::Directional { color, intensity } => {
                    (color, intensity, 0.0, 0.0, records::DeltaLight::DIRECTIONAL)
                }
                DeltaLight::Spot {
                    color,
                    intensity,
                    inner_angle,
                    outer_angle,
                } => (color, intensity, inner_angle, outer_angle, records::DeltaLight::SPOT),
            };
            self.delta_lights.push(records::DeltaLight {
                name_begin,
                name_end,
                color: color.to_array(),
                intensity,
                inner_angle,
                outer_angle,
                kind,
            });
        }
        for (_, name, light) in scene.env_lights.iter() {
            let (name_begin, name_end) = self.strings.push(name)?;
            let (intensity, kind) = match *light {
                EnvironmentLight::Hemisphere { intensity, .. } => {
                    (intensity, records::EnvironmentLight::HEMISPHERE)
                }
                EnvironmentLight::Sphere { intensity, .. } => {
                    (intensity, records::EnvironmentLight::SPHERE)
                }
            };
            self.env_lights.push(records::EnvironmentLight {
                name_begin,
                name_end,
                radiance: index_of(
                    &scene.textures,
                    light.radiance(),
                    "Environment light",
                    name,
                    "radiance",
                )?,
                intensity,
                kind,
            });
        }
        Ok(())
    }

    fn geometry_instances<T>(
        &mut self,
        scene: &Scene,
        order: &[u32],
        what: &'static str,
        instances: &Table<GeometryInstance<T>>,
        items: &Table<T>,
    ) -> Result<Vec<records::GeometryInstance>, WriteError> {
        let mut recs = Vec::with_capacity(instances.len());
        for (_, name, instance) in instances.iter() {
            let (name_begin, name_end) = self.strings.push(name)?;
            recs.push(records::GeometryInstance {
                name_begin,
                name_end,
                transform: transform_index(order, instance.transform, what, name)?,
                item: index_of(items, instance.item, what, name, "item")?,
                material: index_of(&scene.materials, instance.material, what, name, "material")?,
                flags: geometry_flags(&instance.settings),
            });
        }
        Ok(recs)
    }

    fn light_instances<T>(
        &mut self,
        order: &[u32],
        what: &'static str,
        instances: &Table<LightInstance<T>>,
        lights: &Table<T>,
    ) -> Result<Vec<records::LightInstance>, WriteError> {
        let mut recs = Vec::with_capacity(instances.len());
        for (_, name, instance) in instances.iter() {
            let (name_begin, name_end) = self.strings.push(name)?;
            let mut bits = 0;
            if instance.settings.visible {
                bits |= flags::LIGHT_VISIBLE;
            }
            recs.push(records::LightInstance {
                name_begin,
                name_end,
                transform: transform_index(order, instance.transform, what, name)?,
                light: index_of(lights, instance.light, what, name, "light")?,
                flags: bits,
            });
        }
        Ok(recs)
    }

    fn add_instances(&mut self, scene: &Scene, order: &[u32]) -> Result<(), WriteError> {
        let instances = &scene.instances;

        for (_, name, instance) in instances.cameras.iter() {
            let what = "Camera instance";
            let (name_begin, name_end) = self.strings.push(name)?;
            self.camera_instances.push(records::CameraInstance {
                name_begin,
                name_end,
                transform: transform_index(order, instance.transform, what, name)?,
                camera: index_of(&scene.cameras, instance.camera, what, name, "camera")?,
            });
        }

        self.mesh_instances = self.geometry_instances(
            scene,
            order,
            "Mesh instance",
            &instances.meshes,
            &scene.meshes,
        )?;
        self.skinned_mesh_instances = self.geometry_instances(
            scene,
            order,
            "Skinned mesh instance",
            &instances.skinned_meshes,
            &scene.skinned_meshes,
        )?;
        self.shape_instances = self.geometry_instances(
            scene,
            order,
            "Shape instance",
            &instances.shapes,
            &scene.shapes,
        )?;

        for (_, name, instance) in instances.particles.iter() {
            let what = "Particles instance";
            let (name_begin, name_end) = self.strings.push(name)?;
            let settings = instance.settings;
            let mut bits = 0;
            if settings.visible {
                bits |= flags::PARTICLES_VISIBLE;
            }
            if settings.wireframe {
                bits |= flags::PARTICLES_WIREFRAME;
            }
            if settings.simulate_here {
                bits |= flags::PARTICLES_SIMULATE_HERE;
            }
            self.particles_instances.push(records::ParticlesInstance {
                name_begin,
                name_end,
                transform: transform_index(order, instance.transform, what, name)?,
                mesh: index_of(&scene.meshes, instance.mesh, what, name, "mesh")?,
                material: index_of(&scene.materials, instance.material, what, name, "material")?,
                particles: index_of(&scene.particles, instance.particles, what, name, "particles")?,
                flags: bits,
            });
        }

        self.delta_light_instances = self.light_instances(
            order,
            "Delta light instance",
            &instances.delta_lights,
            &scene.delta_lights,
        )?;
        self.env_light_instances = self.light_instances(
            order,
            "Environment light instance",
            &instances.env_lights,
            &scene.env_lights,
        )?;
        Ok(())
    }

    fn write(&self, w: &mut ChunkWriter<'_>) -> Result<(), WriteError> {
        w.write_bytes(tags::STRINGS, &self.strings.bytes)?;
        w.write_bytes(tags::TEXTURE_DATA, &self.texture_data)?;
        w.write_records(tags::TEXTURES, &self.textures)?;
        w.write_records(tags::MATERIALS, &self.materials)?;
        w.write_records(tags::TRANSFORMS, &self.transforms)?;
        w.write_records(tags::CAMERAS, &self.cameras)?;

        w.write_records(tags::HALFEDGES, &self.mesh_pools.halfedges)?;
        w.write_records(tags::VERTICES, &self.mesh_pools.vertices)?;
        w.write_records(tags::EDGES, &self.mesh_pools.edges)?;
        w.write_records(tags::FACES, &self.mesh_pools.faces)?;
        w.write_records(tags::MESHES, &self.meshes)?;

        w.write_records(tags::HALFEDGES, &self.skinned_pools.halfedges)?;
        w.write_records(tags::WEIGHTS, &self.weights)?;
        w.write_records(tags::SKINNED_VERTICES, &self.skinned_pools.vertices)?;
        w.write_records(tags::EDGES, &self.skinned_pools.edges)?;
        w.write_records(tags::FACES, &self.skinned_pools.faces)?;
        w.write_records(tags::BONES, &self.bones)?;
        w.write_records(tags::HANDLES, &self.handles)?;
        w.write_records(tags::SKINNED_MESHES, &self.skinned_meshes)?;

        w.write_records(tags::SHAPES, &self.shapes)?;
        w.write_records(tags::PARTICLES, &self.particles)?;
        w.write_records(tags::PARTICLE_SYSTEMS, &self.particle_systems)?;
        w.write_records(tags::DELTA_LIGHTS, &self.delta_lights)?;
        w.write_records(tags::ENVIRONMENT_LIGHTS, &self.env_lights)?;

        w.write_records(tags::CAMERA_INSTANCES, &self.camera_instances)?;
        w.write_records(tags::MESH_INSTANCES, &self.mesh_instances)?;
        w.write_records(tags::SKINNED_MESH_INSTANCES, &self.skinned_mesh_instances)?;
        w.write_records(tags::SHAPE_INSTANCES, &self.shape_instances)?;
        w.write_records(tags::PARTICLES_INSTANCES, &self.particles_instances)?;
        w.write_records(tags::DELTA_LIGHT_INSTANCES, &self.delta_light_instances)?;
        w.write_records(tags::ENVIRONMENT_LIGHT_INSTANCES, &self.env_light_instances)
    }
}

fn index(len: usize) -> Result<u32, MeshError> {
    u32::try_from(len).map_err(|_| MeshError::TooLarge)
}

/// Write the scene container.
///
/// Everything is validated and encoded before the first byte goes out, so
/// a scene that cannot be saved leaves `w` untouched.
pub fn write_scene(
    w: &mut ChunkWriter<'_>,
    scene: &Scene,
    diagnostics: &mut Diagnostics,
) -> Result<(), WriteError> {
    let order = transform_order(&scene.transforms)?;
    let mut chunks = SceneChunks::default();
    chunks.add_textures(scene)?;
    chunks.add_materials(scene)?;
    chunks.add_transforms(scene, &order)?;
    chunks.add_cameras(scene)?;
    chunks.add_meshes(scene)?;
    chunks.add_skinned_meshes(scene, diagnostics)?;
    chunks.add_shapes(scene)?;
    chunks.add_particles(scene)?;
    chunks.add_lights(scene)?;
    chunks.add_instances(scene, &order)?;
    w.write_container_with(tags::SCENE, |w| chunks.write(w))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parents_are_placed_first() {
        let mut transforms = Table::new();
        let child = transforms.insert("child", Transform::default()).unwrap();
        let parent = transforms.insert("parent", Transform::default()).unwrap();
        let root = transforms.insert("root", Transform::default()).unwrap();
        transforms[child].parent = Some(parent);
        transforms[parent].parent = Some(root);
        let order = transform_order(&transforms).unwrap();
        assert_eq!(order, [2, 1, 0]);
    }

    #[test]
    fn cycles_are_rejected() {
        let mut transforms = Table::new();
        let a = transforms.insert("a", Transform::default()).unwrap();
        let b = transforms.insert("b", Transform::default()).unwrap();
        transforms[a].parent = Some(b);
        transforms[b].parent = Some(a);
        assert!(matches!(
            transform_order(&transforms),
            Err(WriteError::TransformCycle { .. })
        ));
    }

    #[test]
    fn flags_use_separate_masks() {
        let settings = GeometrySettings {
            visible: true,
            draw_style: DrawStyle::Smooth,
            blend_style: BlendStyle::Over,
            depth_style: DepthStyle::Never,
        };
        assert_eq!(geometry_flags(&settings), 0x01 | 0x0a | 0x20 | 0x80);
        assert_eq!(geometry_flags(&GeometrySettings::default()), 0x01);
    }

    #[test]
    fn unordered_bones_fail_before_writing() {
        let mut scene = Scene::new();
        let mut skinned = SkinnedMesh::default();
        skinned.skeleton.add_bone(Some(1), glam::Vec3::Y);
        skinned.skeleton.add_bone(None, glam::Vec3::Y);
        scene.skinned_meshes.insert("arm", skinned).unwrap();
        let mut out = Vec::new();
        let mut diag = Diagnostics::new();
        let err = write_scene(&mut ChunkWriter::new(&mut out), &scene, &mut diag).unwrap_err();
        assert!(matches!(err, WriteError::BoneOrder { bone: 0, .. }));
        assert!(out.is_empty());
    }
}
