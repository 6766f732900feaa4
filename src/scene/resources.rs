use glam::{Quat, Vec3};

use super::Id;
use crate::mesh::HalfedgeMesh;
use crate::skeleton::Skeleton;
use crate::spectrum::Spectrum;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Sampler {
    Nearest,
    Bilinear,
    Trilinear,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Texture {
    Constant { color: Spectrum, scale: f32 },
    /// `data` holds the encoded image file as-is.
    Image { sampler: Sampler, data: Vec<u8> },
}

impl Default for Texture {
    fn default() -> Self {
        Texture::Constant {
            color: Spectrum::splat(0.75),
            scale: 1.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Material {
    Lambertian {
        albedo: Option<Id<Texture>>,
    },
    Mirror {
        reflectance: Option<Id<Texture>>,
    },
    Refract {
        transmittance: Option<Id<Texture>>,
        ior: f32,
    },
    Glass {
        reflectance: Option<Id<Texture>>,
        transmittance: Option<Id<Texture>>,
        ior: f32,
    },
    Emissive {
        emissive: Option<Id<Texture>>,
    },
}

impl Material {
    /// Every texture slot, with its field name.
    pub fn textures(&self) -> Vec<(&'static str, Option<Id<Texture>>)> {
        match *self {
            Material::Lambertian { albedo } => vec![("albedo", albedo)],
            Material::Mirror { reflectance } => vec![("reflectance", reflectance)],
            Material::Refract { transmittance, .. } => vec![("transmittance", transmittance)],
            Material::Glass { reflectance, transmittance, .. } => {
                vec![("reflectance", reflectance), ("transmittance", transmittance)]
            }
            Material::Emissive { emissive } => vec![("emissive", emissive)],
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Transform {
    /// Parents must be inserted before their children.
    pub parent: Option<Id<Transform>>,
    pub translation: Vec3,
    pub rotation: Quat,
    pub scale: Vec3,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            parent: None,
            translation: Vec3::ZERO,
            rotation: Quat::IDENTITY,
            scale: Vec3::ONE,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Film {
    pub width: u32,
    pub height: u32,
    pub samples: u32,
    pub max_ray_depth: u32,
    pub sample_pattern: u32,
}

impl Default for Film {
    fn default() -> Self {
        Self {
            width: 1280,
            height: 720,
            samples: 256,
            max_ray_depth: 8,
            sample_pattern: 1,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Camera {
    /// Degrees.
    pub vertical_fov: f32,
    pub aspect_ratio: f32,
    pub near_plane: f32,
    pub film: Film,
}

impl Default for Camera {
    fn default() -> Self {
        Self {
            vertical_fov: 60.0,
            aspect_ratio: 1.77778,
            near_plane: 0.1,
            film: Film::default(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SkinnedMesh {
    pub mesh: HalfedgeMesh,
    pub skeleton: Skeleton,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Shape {
    Sphere { radius: f32 },
}

impl Default for Shape {
    fn default() -> Self {
        Shape::Sphere { radius: 1.0 }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Particle {
    pub position: Vec3,
    pub velocity: Vec3,
    pub age: f32,
}

/// Emitter settings and the current particle state.
#[derive(Debug, Clone, PartialEq)]
pub struct Particles {
    pub particles: Vec<Particle>,
    /// Downward acceleration along -y.
    pub gravity: f32,
    pub radius: f32,
    pub initial_velocity: f32,
    /// Degrees.
    pub spread_angle: f32,
    pub lifetime: f32,
    /// Particles emitted per second.
    pub rate: f32,
    pub step_size: f32,
}

impl Default for Particles {
    fn default() -> Self {
        Self {
            particles: Vec::new(),
            gravity: 9.8,
            radius: 0.1,
            initial_velocity: 5.0,
            spread_angle: 0.0,
            lifetime: 2.5,
            rate: 10.0,
            step_size: 0.01,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum DeltaLight {
    Point {
        color: Spectrum,
        intensity: f32,
    },
    Directional {
        color: Spectrum,
        intensity: f32,
    },
    Spot {
        color: Spectrum,
        intensity: f32,
        /// Degrees.
        inner_angle: f32,
        outer_angle: f32,
    },
}

impl DeltaLight {
    pub fn spot() -> Self {
        DeltaLight::Spot {
            color: Spectrum::WHITE,
            intensity: 1.0,
            inner_angle: 30.0,
            outer_angle: 45.0,
        }
    }
}

impl Default for DeltaLight {
    fn default() -> Self {
        DeltaLight::Point {
            color: Spectrum::WHITE,
            intensity: 1.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum EnvironmentLight {
    Hemisphere {
        radiance: Option<Id<Texture>>,
        intensity: f32,
    },
    Sphere {
        radiance: Option<Id<Texture>>,
        intensity: f32,
    },
}

impl EnvironmentLight {
    pub fn radiance(&self) -> Option<Id<Texture>> {
        match *self {
            EnvironmentLight::Hemisphere { radiance, .. }
            | EnvironmentLight::Sphere { radiance, .. } => radiance,
        }
    }
}

impl Default for EnvironmentLight {
    fn default() -> Self {
        EnvironmentLight::Hemisphere {
            radiance: None,
            intensity: 1.0,
        }
    }
}
