use super::Id;
use super::resources::*;
use crate::mesh::HalfedgeMesh;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum DrawStyle {
    Wireframe,
    Flat,
    Smooth,
    #[default]
    Correct,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum BlendStyle {
    #[default]
    Replace,
    Add,
    Over,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum DepthStyle {
    #[default]
    Less,
    Always,
    Never,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct GeometrySettings {
    pub visible: bool,
    pub draw_style: DrawStyle,
    pub blend_style: BlendStyle,
    pub depth_style: DepthStyle,
}

impl Default for GeometrySettings {
    fn default() -> Self {
        Self {
            visible: true,
            draw_style: DrawStyle::default(),
            blend_style: BlendStyle::default(),
            depth_style: DepthStyle::default(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SimulateSettings {
    pub visible: bool,
    pub wireframe: bool,
    pub simulate_here: bool,
}

impl Default for SimulateSettings {
    fn default() -> Self {
        Self {
            visible: true,
            wireframe: false,
            simulate_here: true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LightSettings {
    pub visible: bool,
}

impl Default for LightSettings {
    fn default() -> Self {
        Self { visible: true }
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct CameraInstance {
    pub transform: Option<Id<Transform>>,
    pub camera: Option<Id<Camera>>,
}

/// A mesh, skinned mesh or shape placed in the scene.
#[derive(Debug, Clone, PartialEq)]
pub struct GeometryInstance<T> {
    pub transform: Option<Id<Transform>>,
    pub item: Option<Id<T>>,
    pub material: Option<Id<Material>>,
    pub settings: GeometrySettings,
}

impl<T> Default for GeometryInstance<T> {
    fn default() -> Self {
        Self {
            transform: None,
            item: None,
            material: None,
            settings: GeometrySettings::default(),
        }
    }
}

pub type MeshInstance = GeometryInstance<HalfedgeMesh>;
pub type SkinnedMeshInstance = GeometryInstance<SkinnedMesh>;
pub type ShapeInstance = GeometryInstance<Shape>;

#[derive(Debug, Clone, PartialEq, Default)]
pub struct ParticlesInstance {
    pub transform: Option<Id<Transform>>,
    /// Drawn for each particle.
    pub mesh: Option<Id<HalfedgeMesh>>,
    pub material: Option<Id<Material>>,
    pub particles: Option<Id<Particles>>,
    pub settings: SimulateSettings,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LightInstance<T> {
    pub transform: Option<Id<Transform>>,
    pub light: Option<Id<T>>,
    pub settings: LightSettings,
}

impl<T> Default for LightInstance<T> {
    fn default() -> Self {
        Self {
            transform: None,
            light: None,
            settings: LightSettings::default(),
        }
    }
}

pub type DeltaLightInstance = LightInstance<DeltaLight>;
pub type EnvironmentLightInstance = LightInstance<EnvironmentLight>;
