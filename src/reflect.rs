//! Per resource kind lists of animatable fields.
//!
//! The animator only ever sees resources through [`Animate`]: a name and a
//! value (or a writable slot) for each channel, in a fixed order.

use crate::channel::{ChannelMut, ChannelType, ChannelValue};
use crate::mesh::HalfedgeMesh;
use crate::scene::*;
use crate::skeleton::Skeleton;

pub trait Animate {
    fn channels(&self, f: &mut dyn FnMut(&str, ChannelValue));
    fn channels_mut(&mut self, f: &mut dyn FnMut(&str, ChannelMut<'_>));

    fn channel_names(&self) -> Vec<String> {
        let mut names = Vec::new();
        self.channels(&mut |name, _| names.push(name.to_owned()));
        names
    }
}

impl Animate for Camera {
    fn channels(&self, f: &mut dyn FnMut(&str, ChannelValue)) {
        f("vertical_fov", self.vertical_fov.value());
        f("aspect_ratio", self.aspect_ratio.value());
        f("near_plane", self.near_plane.value());
    }

    fn channels_mut(&mut self, f: &mut dyn FnMut(&str, ChannelMut<'_>)) {
        f("vertical_fov", ChannelMut::Float(&mut self.vertical_fov));
        f("aspect_ratio", ChannelMut::Float(&mut self.aspect_ratio));
        f("near_plane", ChannelMut::Float(&mut self.near_plane));
    }
}

impl Animate for Transform {
    fn channels(&self, f: &mut dyn FnMut(&str, ChannelValue)) {
        f("translation", self.translation.value());
        f("rotation", self.rotation.value());
        f("scale", self.scale.value());
    }

    fn channels_mut(&mut self, f: &mut dyn FnMut(&str, ChannelMut<'_>)) {
        f("translation", ChannelMut::Vec3(&mut self.translation));
        f("rotation", ChannelMut::Quat(&mut self.rotation));
        f("scale", ChannelMut::Vec3(&mut self.scale));
    }
}

impl Animate for Texture {
    fn channels(&self, f: &mut dyn FnMut(&str, ChannelValue)) {
        if let Texture::Constant { color, scale } = self {
            f("color", color.value());
            f("scale", scale.value());
        }
    }

    fn channels_mut(&mut self, f: &mut dyn FnMut(&str, ChannelMut<'_>)) {
        if let Texture::Constant { color, scale } = self {
            f("color", ChannelMut::Spectrum(color));
            f("scale", ChannelMut::Float(scale));
        }
    }
}

impl Animate for Material {
    fn channels(&self, f: &mut dyn FnMut(&str, ChannelValue)) {
        match self {
            Material::Refract { ior, .. } | Material::Glass { ior, .. } => f("ior", ior.value()),
            _ => {}
        }
    }

    fn channels_mut(&mut self, f: &mut dyn FnMut(&str, ChannelMut<'_>)) {
        match self {
            Material::Refract { ior, .. } | Material::Glass { ior, .. } => {
                f("ior", ChannelMut::Float(ior))
            }
            _ => {}
        }
    }
}

impl Animate for Shape {
    fn channels(&self, f: &mut dyn FnMut(&str, ChannelValue)) {
        let Shape::Sphere { radius } = self;
        f("radius", radius.value());
    }

    fn channels_mut(&mut self, f: &mut dyn FnMut(&str, ChannelMut<'_>)) {
        let Shape::Sphere { radius } = self;
        f("radius", ChannelMut::Float(radius));
    }
}

impl Animate for Particles {
    fn channels(&self, f: &mut dyn FnMut(&str, ChannelValue)) {
        f("gravity", self.gravity.value());
        f("radius", self.radius.value());
        f("initial_velocity", self.initial_velocity.value());
        f("spread_angle", self.spread_angle.value());
        f("lifetime", self.lifetime.value());
        f("rate", self.rate.value());
    }

    fn channels_mut(&mut self, f: &mut dyn FnMut(&str, ChannelMut<'_>)) {
        f("gravity", ChannelMut::Float(&mut self.gravity));
        f("radius", ChannelMut::Float(&mut self.radius));
        f("initial_velocity", ChannelMut::Float(&mut self.initial_velocity));
        f("spread_angle", ChannelMut::Float(&mut self.spread_angle));
        f("lifetime", ChannelMut::Float(&mut self.lifetime));
        f("rate", ChannelMut::Float(&mut self.rate));
    }
}

impl Animate for DeltaLight {
    fn channels(&self, f: &mut dyn FnMut(&str, ChannelValue)) {
        match self {
            DeltaLight::Point { color, intensity }
            | DeltaLight::Directional { color, intensity } => {
                f("color", color.value());
                f("intensity", intensity.value());
            }
            DeltaLight::Spot {
                color,
                intensity,
                inner_angle,
                outer_angle,
            } => {
                f("color", color.value());
                f("intensity", intensity.value());
                f("inner_angle", inner_angle.value());
                f("outer_angle", outer_angle.value());
            }
        }
    }

    fn channels_mut(&mut self, f: &mut dyn FnMut(&str, ChannelMut<'_>)) {
        match self {
            DeltaLight::Point { color, intensity }
            | DeltaLight::Directional { color, intensity } => {
                f("color", ChannelMut::Spectrum(color));
                f("intensity", ChannelMut::Float(intensity));
            }
            DeltaLight::Spot {
                color,
                intensity,
                inner_angle,
                outer_angle,
            } => {
                f("color", ChannelMut::Spectrum(color));
                f("intensity", ChannelMut::Float(intensity));
                f("inner_angle", ChannelMut::Float(inner_angle));
                f("outer_angle", ChannelMut::Float(outer_angle));
            }
        }
    }
}

impl Animate for EnvironmentLight {
    fn channels(&self, f: &mut dyn FnMut(&str, ChannelValue)) {
        match self {
            EnvironmentLight::Hemisphere { intensity, .. }
            | EnvironmentLight::Sphere { intensity, .. } => f("intensity", intensity.value()),
        }
    }

    fn channels_mut(&mut self, f: &mut dyn FnMut(&str, ChannelMut<'_>)) {
        match self {
            EnvironmentLight::Hemisphere { intensity, .. }
            | EnvironmentLight::Sphere { intensity, .. } => {
                f("intensity", ChannelMut::Float(intensity))
            }
        }
    }
}

impl Animate for HalfedgeMesh {
    fn channels(&self, _: &mut dyn FnMut(&str, ChannelValue)) {}
    fn channels_mut(&mut self, _: &mut dyn FnMut(&str, ChannelMut<'_>)) {}
}

pub fn bone_pose_channel(channel_id: u32) -> String {
    format!("bone.{}.pose", channel_id)
}

pub fn handle_target_channel(channel_id: u32) -> String {
    format!("handle.{}.target", channel_id)
}

pub fn handle_enabled_channel(channel_id: u32) -> String {
    format!("handle.{}.enabled", channel_id)
}

impl Animate for Skeleton {
    fn channels(&self, f: &mut dyn FnMut(&str, ChannelValue)) {
        f("base_offset", self.base_offset.value());
        for bone in &self.bones {
            f(&bone_pose_channel(bone.channel_id), bone.pose.value());
        }
        for handle in &self.handles {
            f(&handle_target_channel(handle.channel_id), handle.target.value());
            f(&handle_enabled_channel(handle.channel_id), handle.enabled.value());
        }
    }

    fn channels_mut(&mut self, f: &mut dyn FnMut(&str, ChannelMut<'_>)) {
        f("base_offset", ChannelMut::Vec3(&mut self.base_offset));
        for bone in &mut self.bones {
            f(&bone_pose_channel(bone.channel_id), ChannelMut::Vec3(&mut bone.pose));
        }
        for handle in &mut self.handles {
            f(
                &handle_target_channel(handle.channel_id),
                ChannelMut::Vec3(&mut handle.target),
            );
            f(
                &handle_enabled_channel(handle.channel_id),
                ChannelMut::Bool(&mut handle.enabled),
            );
        }
    }
}

impl Animate for SkinnedMesh {
    fn channels(&self, f: &mut dyn FnMut(&str, ChannelValue)) {
        self.mesh.channels(f);
        self.skeleton.channels(f);
    }

    fn channels_mut(&mut self, f: &mut dyn FnMut(&str, ChannelMut<'_>)) {
        self.mesh.channels_mut(f);
        self.skeleton.channels_mut(f);
    }
}

impl Animate for CameraInstance {
    fn channels(&self, _: &mut dyn FnMut(&str, ChannelValue)) {}
    fn channels_mut(&mut self, _: &mut dyn FnMut(&str, ChannelMut<'_>)) {}
}

impl<T> Animate for GeometryInstance<T> {
    fn channels(&self, f: &mut dyn FnMut(&str, ChannelValue)) {
        f("visible", self.settings.visible.value());
    }

    fn channels_mut(&mut self, f: &mut dyn FnMut(&str, ChannelMut<'_>)) {
        f("visible", ChannelMut::Bool(&mut self.settings.visible));
    }
}

impl Animate for ParticlesInstance {
    fn channels(&self, f: &mut dyn FnMut(&str, ChannelValue)) {
        f("visible", self.settings.visible.value());
        f("wireframe", self.settings.wireframe.value());
        f("simulate_here", self.settings.simulate_here.value());
    }

    fn channels_mut(&mut self, f: &mut dyn FnMut(&str, ChannelMut<'_>)) {
        f("visible", ChannelMut::Bool(&mut self.settings.visible));
        f("wireframe", ChannelMut::Bool(&mut self.settings.wireframe));
        f("simulate_here", ChannelMut::Bool(&mut self.settings.simulate_here));
    }
}

impl<T> Animate for LightInstance<T> {
    fn channels(&self, f: &mut dyn FnMut(&str, ChannelValue)) {
        f("visible", self.settings.visible.value());
    }

    fn channels_mut(&mut self, f: &mut dyn FnMut(&str, ChannelMut<'_>)) {
        f("visible", ChannelMut::Bool(&mut self.settings.visible));
    }
}
