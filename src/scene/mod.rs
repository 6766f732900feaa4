//! In-memory scene: named resources and the instances that place them.

use std::fmt;

mod instance;
mod resources;
mod table;

pub use instance::*;
pub use resources::*;
pub use table::{DuplicateName, Id, Table};

use crate::mesh::HalfedgeMesh;
use crate::reflect::Animate;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ResourceKind {
    Texture,
    Material,
    Transform,
    Camera,
    HalfedgeMesh,
    SkinnedMesh,
    Shape,
    Particles,
    DeltaLight,
    EnvironmentLight,
    CameraInstance,
    MeshInstance,
    SkinnedMeshInstance,
    ShapeInstance,
    ParticlesInstance,
    DeltaLightInstance,
    EnvironmentLightInstance,
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ResourceKind::Texture => "texture",
            ResourceKind::Material => "material",
            ResourceKind::Transform => "transform",
            ResourceKind::Camera => "camera",
            ResourceKind::HalfedgeMesh => "halfedge mesh",
            ResourceKind::SkinnedMesh => "skinned mesh",
            ResourceKind::Shape => "shape",
            ResourceKind::Particles => "particle system",
            ResourceKind::DeltaLight => "delta light",
            ResourceKind::EnvironmentLight => "environment light",
            ResourceKind::CameraInstance => "camera instance",
            ResourceKind::MeshInstance => "mesh instance",
            ResourceKind::SkinnedMeshInstance => "skinned mesh instance",
            ResourceKind::ShapeInstance => "shape instance",
            ResourceKind::ParticlesInstance => "particles instance",
            ResourceKind::DeltaLightInstance => "delta light instance",
            ResourceKind::EnvironmentLightInstance => "environment light instance",
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Instances {
    pub cameras: Table<CameraInstance>,
    pub meshes: Table<MeshInstance>,
    pub skinned_meshes: Table<SkinnedMeshInstance>,
    pub shapes: Table<ShapeInstance>,
    pub particles: Table<ParticlesInstance>,
    pub delta_lights: Table<DeltaLightInstance>,
    pub env_lights: Table<EnvironmentLightInstance>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Scene {
    pub textures: Table<Texture>,
    pub materials: Table<Material>,
    pub transforms: Table<Transform>,
    pub cameras: Table<Camera>,
    pub meshes: Table<HalfedgeMesh>,
    pub skinned_meshes: Table<SkinnedMesh>,
    pub shapes: Table<Shape>,
    pub particles: Table<Particles>,
    pub delta_lights: Table<DeltaLight>,
    pub env_lights: Table<EnvironmentLight>,
    pub instances: Instances,
}

fn visit<T: Animate>(
    kind: ResourceKind,
    table: &Table<T>,
    f: &mut dyn FnMut(ResourceKind, &str, &dyn Animate),
) {
    for (_, name, value) in table.iter() {
        f(kind, name, value);
    }
}

fn visit_mut<T: Animate>(
    kind: ResourceKind,
    table: &mut Table<T>,
    f: &mut dyn FnMut(ResourceKind, &str, &mut dyn Animate),
) {
    for (_, name, value) in table.iter_mut() {
        f(kind, name, value);
    }
}

impl Scene {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of resources, not counting instances.
    pub fn resource_count(&self) -> usize {
        self.textures.len()
            + self.materials.len()
            + self.transforms.len()
            + self.cameras.len()
            + self.meshes.len()
            + self.skinned_meshes.len()
            + self.shapes.len()
            + self.particles.len()
            + self.delta_lights.len()
            + self.env_lights.len()
    }

    pub fn instance_count(&self) -> usize {
        let i = &self.instances;
        i.cameras.len()
            + i.meshes.len()
            + i.skinned_meshes.len()
            + i.shapes.len()
            + i.particles.len()
            + i.delta_lights.len()
            + i.env_lights.len()
    }

    /// Visit every resource and instance that can expose channels.
    pub fn for_each_animated(&self, f: &mut dyn FnMut(ResourceKind, &str, &dyn Animate)) {
        use ResourceKind as K;
        visit(K::Texture, &self.textures, f);
        visit(K::Material, &self.materials, f);
        visit(K::Transform, &self.transforms, f);
        visit(K::Camera, &self.cameras, f);
        visit(K::HalfedgeMesh, &self.meshes, f);
        visit(K::SkinnedMesh, &self.skinned_meshes, f);
        visit(K::Shape, &self.shapes, f);
        visit(K::Particles, &self.particles, f);
        visit(K::DeltaLight, &self.delta_lights, f);
        visit(K::EnvironmentLight, &self.env_lights, f);
        let i = &self.instances;
        visit(K::CameraInstance, &i.cameras, f);
        visit(K::MeshInstance, &i.meshes, f);
        visit(K::SkinnedMeshInstance, &i.skinned_meshes, f);
        visit(K::ShapeInstance, &i.shapes, f);
        visit(K::ParticlesInstance, &i.particles, f);
        visit(K::DeltaLightInstance, &i.delta_lights, f);
        visit(K::EnvironmentLightInstance, &i.env_lights, f);
    }

    pub fn for_each_animated_mut(
        &mut self,
        f: &mut dyn FnMut(ResourceKind, &str, &mut dyn Animate),
    ) {
        use ResourceKind as K;
        visit_mut(K::Texture, &mut self.textures, f);
        visit_mut(K::Material, &mut self.materials, f);
        visit_mut(K::Transform, &mut self.transforms, f);
        visit_mut(K::Camera, &mut self.cameras, f);
        visit_mut(K::HalfedgeMesh, &mut self.meshes, f);
        visit_mut(K::SkinnedMesh, &mut self.skinned_meshes, f);
        visit_mut(K::Shape, &mut self.shapes, f);
        visit_mut(K::Particles, &mut self.particles, f);
        visit_mut(K::DeltaLight, &mut self.delta_lights, f);
        visit_mut(K::EnvironmentLight, &mut self.env_lights, f);
        let i = &mut self.instances;
        visit_mut(K::CameraInstance, &mut i.cameras, f);
        visit_mut(K::MeshInstance, &mut i.meshes, f);
        visit_mut(K::SkinnedMeshInstance, &mut i.skinned_meshes, f);
        visit_mut(K::ShapeInstance, &mut i.shapes, f);
        visit_mut(K::ParticlesInstance, &mut i.particles, f);
        visit_mut(K::DeltaLightInstance, &mut i.delta_lights, f);
        visit_mut(K::EnvironmentLightInstance, &mut i.env_lights, f);
    }

    /// Resources named `name`, plus everything an instance with that name
    /// refers to: its transform, the placed item, its material and the
    /// material's textures.
    pub fn related(&self, name: &str) -> Vec<(ResourceKind, String)> {
        use ResourceKind as K;
        let mut out = Vec::new();
        self.for_each_animated(&mut |kind, n, _| {
            if n == name {
                out.push((kind, n.to_owned()));
            }
        });

        let mut refs: Vec<(ResourceKind, Option<&str>)> = Vec::new();
        let mut material = None;
        let i = &self.instances;
        let transform_name = |t: Option<Id<Transform>>| t.and_then(|t| self.transforms.name(t));
        if let Some(inst) = i.cameras.find(name).map(|id| &i.cameras[id]) {
            refs.push((K::Transform, transform_name(inst.transform)));
            refs.push((K::Camera, inst.camera.and_then(|c| self.cameras.name(c))));
        }
        if let Some(inst) = i.meshes.find(name).map(|id| &i.meshes[id]) {
            refs.push((K::Transform, transform_name(inst.transform)));
            refs.push((K::HalfedgeMesh, inst.item.and_then(|m| self.meshes.name(m))));
            material = material.or(inst.material);
        }
        if let Some(inst) = i.skinned_meshes.find(name).map(|id| &i.skinned_meshes[id]) {
            refs.push((K::Transform, transform_name(inst.transform)));
            refs.push((K::SkinnedMesh, inst.item.and_then(|m| self.skinned_meshes.name(m))));
            material = material.or(inst.material);
        }
        if let Some(inst) = i.shapes.find(name).map(|id| &i.shapes[id]) {
            refs.push((K::Transform, transform_name(inst.transform)));
            refs.push((K::Shape, inst.item.and_then(|s| self.shapes.name(s))));
            material = material.or(inst.material);
        }
        if let Some(inst) = i.particles.find(name).map(|id| &i.particles[id]) {
            refs.push((K::Transform, transform_name(inst.transform)));
            refs.push((K::HalfedgeMesh, inst.mesh.and_then(|m| self.meshes.name(m))));
            refs.push((K::Particles, inst.particles.and_then(|p| self.particles.name(p))));
            material = material.or(inst.material);
        }
        if let Some(inst) = i.delta_lights.find(name).map(|id| &i.delta_lights[id]) {
            refs.push((K::Transform, transform_name(inst.transform)));
            refs.push((K::DeltaLight, inst.light.and_then(|l| self.delta_lights.name(l))));
        }
        if let Some(inst) = i.env_lights.find(name).map(|id| &i.env_lights[id]) {
            refs.push((K::Transform, transform_name(inst.transform)));
            let light = inst.light.and_then(|l| self.env_lights.get(l).map(|e| (l, e)));
            if let Some((id, env)) = light {
                refs.push((K::EnvironmentLight, self.env_lights.name(id)));
                refs.push((K::Texture, env.radiance().and_then(|t| self.textures.name(t))));
            }
        }
        if let Some(id) = material {
            refs.push((K::Material, self.materials.name(id)));
            if let Some(mat) = self.materials.get(id) {
                for (_, texture) in mat.textures() {
                    refs.push((K::Texture, texture.and_then(|t| self.textures.name(t))));
                }
            }
        }

        for (kind, n) in refs {
            if let Some(n) = n {
                if !out.iter().any(|(k, o)| *k == kind && o == n) {
                    out.push((kind, n.to_owned()));
                }
            }
        }
        out
    }
}
