//! Fixed layout records stored in the chunks of both containers.
//!
//! Every record is packed and little-endian. Names are `[begin, end)` byte
//! ranges into the container's string chunk, and [`NONE`] stands for a
//! missing reference.

use std::mem::size_of;

#[cfg(target_endian = "big")]
compile_error!("record layouts are read in place and assume a little-endian target");

/// Sentinel index for "no reference".
pub const NONE: u32 = u32::MAX;

pub mod tags {
    use crate::header::Tag;

    pub const SCENE: Tag = Tag::new(b"s3ds");
    pub const STRINGS: Tag = Tag::new(b"str0");
    pub const TEXTURE_DATA: Tag = Tag::new(b"txd0");
    pub const TEXTURES: Tag = Tag::new(b"tex0");
    pub const MATERIALS: Tag = Tag::new(b"mat0");
    pub const TRANSFORMS: Tag = Tag::new(b"xfm0");
    pub const CAMERAS: Tag = Tag::new(b"cam0");
    pub const HALFEDGES: Tag = Tag::new(b"12e0");
    pub const VERTICES: Tag = Tag::new(b"vtx0");
    pub const EDGES: Tag = Tag::new(b"edg0");
    pub const FACES: Tag = Tag::new(b"fce0");
    pub const MESHES: Tag = Tag::new(b"hem0");
    pub const WEIGHTS: Tag = Tag::new(b"jwt0");
    pub const SKINNED_VERTICES: Tag = Tag::new(b"Svx0");
    pub const BONES: Tag = Tag::new(b"Jnt0");
    pub const HANDLES: Tag = Tag::new(b"Hdl0");
    pub const SKINNED_MESHES: Tag = Tag::new(b"Shm0");
    pub const SHAPES: Tag = Tag::new(b"shp0");
    pub const PARTICLES: Tag = Tag::new(b"prt0");
    pub const PARTICLE_SYSTEMS: Tag = Tag::new(b"prs0");
    pub const DELTA_LIGHTS: Tag = Tag::new(b"lit0");
    pub const ENVIRONMENT_LIGHTS: Tag = Tag::new(b"env0");
    pub const CAMERA_INSTANCES: Tag = Tag::new(b"Icm0");
    pub const MESH_INSTANCES: Tag = Tag::new(b"Ime0");
    pub const SKINNED_MESH_INSTANCES: Tag = Tag::new(b"Isk0");
    pub const SHAPE_INSTANCES: Tag = Tag::new(b"Ish0");
    pub const PARTICLES_INSTANCES: Tag = Tag::new(b"Ipa0");
    pub const DELTA_LIGHT_INSTANCES: Tag = Tag::new(b"Ili0");
    pub const ENVIRONMENT_LIGHT_INSTANCES: Tag = Tag::new(b"Ien0");

    pub const ANIMATOR: Tag = Tag::new(b"s3da");
    pub const SPLINE_DATA: Tag = Tag::new(b"spd0");
    pub const SPLINES: Tag = Tag::new(b"spl0");
}

macro_rules! record {
    ($(#[$meta:meta])* $name:ident, $size:expr, { $($field:ident: $ty:ty),* $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq)]
        #[derive(bytemuck::Pod, bytemuck::Zeroable)]
        #[repr(C, packed)]
        pub struct $name {
            $(pub $field: $ty,)*
        }

        const _: () = assert!(size_of::<$name>() == $size);
    };
}

record!(Texture, 17, {
    name_begin: u32, name_end: u32,
    data_begin: u32, data_end: u32,
    kind: u8,
});

impl Texture {
    pub const CONSTANT: u8 = b'c';
    pub const IMAGE: u8 = b'i';
}

record!(
    /// Payload of a constant texture in the texture data chunk.
    ConstantTextureData, 16, {
    color: [f32; 3],
    scale: f32,
});

pub const SAMPLER_NEAREST: u8 = 0;
pub const SAMPLER_BILINEAR: u8 = 1;
pub const SAMPLER_TRILINEAR: u8 = 2;

record!(Material, 29, {
    name_begin: u32, name_end: u32,
    albedo: u32,
    reflectance: u32,
    transmittance: u32,
    emissive: u32,
    ior: f32,
    kind: u8,
});

impl Material {
    pub const LAMBERTIAN: u8 = b'l';
    pub const MIRROR: u8 = b'm';
    pub const REFRACT: u8 = b'r';
    pub const GLASS: u8 = b'g';
    pub const EMISSIVE: u8 = b'e';
}

record!(
    /// Rotation is stored as `x, y, z, w`.
    Transform, 52, {
    name_begin: u32, name_end: u32,
    parent: u32,
    translation: [f32; 3],
    rotation: [f32; 4],
    scale: [f32; 3],
});

record!(Camera, 40, {
    name_begin: u32, name_end: u32,
    vertical_fov: f32,
    aspect_ratio: f32,
    near_plane: f32,
    film_width: u32,
    film_height: u32,
    film_samples: u32,
    film_max_ray_depth: u32,
    film_sample_pattern: u32,
});

record!(Halfedge, 24, {
    next: u32,
    corner_uv: [f32; 2],
    corner_normal: [f32; 3],
});

record!(Vertex, 16, {
    halfedge: u32,
    position: [f32; 3],
});

record!(Edge, 5, {
    halfedge: u32,
    sharp: u8,
});

impl Edge {
    pub const SMOOTH: u8 = 0;
    pub const SHARP: u8 = 1;
}

record!(Face, 5, {
    halfedge: u32,
    boundary: u8,
});

/// Any flag value other than `BOUNDARY` reads as a surface face.
impl Face {
    pub const SURFACE: u8 = 0;
    pub const BOUNDARY: u8 = 1;
}

record!(HalfedgeMesh, 40, {
    name_begin: u32, name_end: u32,
    halfedges_begin: u32, halfedges_end: u32,
    vertices_begin: u32, vertices_end: u32,
    edges_begin: u32, edges_end: u32,
    faces_begin: u32, faces_end: u32,
});

record!(Weight, 8, {
    bone: u32,
    weight: f32,
});

record!(SkinnedVertex, 24, {
    halfedge: u32,
    position: [f32; 3],
    weights_begin: u32,
    weights_end: u32,
});

record!(Bone, 32, {
    parent: u32,
    radius: f32,
    pose: [f32; 3],
    extent: [f32; 3],
});

record!(Handle, 17, {
    bone: u32,
    target: [f32; 3],
    enabled: u8,
});

record!(SkinnedMesh, 68, {
    name_begin: u32, name_end: u32,
    halfedges_begin: u32, halfedges_end: u32,
    vertices_begin: u32, vertices_end: u32,
    edges_begin: u32, edges_end: u32,
    faces_begin: u32, faces_end: u32,
    bones_begin: u32, bones_end: u32,
    handles_begin: u32, handles_end: u32,
    base: [f32; 3],
});

record!(Shape, 13, {
    name_begin: u32, name_end: u32,
    radius: f32,
    kind: u8,
});

impl Shape {
    pub const SPHERE: u8 = b's';
}

record!(Particle, 28, {
    position: [f32; 3],
    velocity: [f32; 3],
    age: f32,
});

record!(ParticleSystem, 44, {
    name_begin: u32, name_end: u32,
    particles_begin: u32, particles_end: u32,
    gravity: f32,
    radius: f32,
    initial_velocity: f32,
    spread_angle: f32,
    lifetime: f32,
    rate: f32,
    step_size: f32,
});

record!(DeltaLight, 33, {
    name_begin: u32, name_end: u32,
    color: [f32; 3],
    intensity: f32,
    inner_angle: f32,
    outer_angle: f32,
    kind: u8,
});

impl DeltaLight {
    pub const POINT: u8 = b'p';
    pub const DIRECTIONAL: u8 = b'd';
    pub const SPOT: u8 = b's';
}

record!(EnvironmentLight, 17, {
    name_begin: u32, name_end: u32,
    radiance: u32,
    intensity: f32,
    kind: u8,
});

impl EnvironmentLight {
    pub const HEMISPHERE: u8 = b'h';
    pub const SPHERE: u8 = b'o';
}

record!(CameraInstance, 16, {
    name_begin: u32, name_end: u32,
    transform: u32,
    camera: u32,
});

record!(
    /// Shared by mesh, skinned mesh and shape instances.
    GeometryInstance, 24, {
    name_begin: u32, name_end: u32,
    transform: u32,
    item: u32,
    material: u32,
    flags: u32,
});

record!(ParticlesInstance, 25, {
    name_begin: u32, name_end: u32,
    transform: u32,
    mesh: u32,
    material: u32,
    particles: u32,
    flags: u8,
});

record!(
    /// Shared by delta and environment light instances.
    LightInstance, 17, {
    name_begin: u32, name_end: u32,
    transform: u32,
    light: u32,
    flags: u8,
});

/// Bits of the instance `flags` fields.
pub mod flags {
    pub const VISIBLE: u32 = 0x01;
    pub const SIMULATE_HERE: u32 = 0x04;

    pub const DRAW_STYLE_MASK: u32 = 0x0a;
    pub const DRAW_WIREFRAME: u32 = 0x02;
    pub const DRAW_FLAT: u32 = 0x08;
    pub const DRAW_SMOOTH: u32 = 0x0a;
    pub const DRAW_CORRECT: u32 = 0x00;

    // Blend and depth get bits of their own. Older writers packed both into
    // the draw style bits 0x0a, so their blend and depth choices read back
    // as the defaults here, and the bits below mean nothing to those readers.
    pub const BLEND_MASK: u32 = 0x30;
    pub const BLEND_REPLACE: u32 = 0x00;
    pub const BLEND_ADD: u32 = 0x10;
    pub const BLEND_OVER: u32 = 0x20;

    pub const DEPTH_MASK: u32 = 0xc0;
    pub const DEPTH_LESS: u32 = 0x00;
    pub const DEPTH_ALWAYS: u32 = 0x40;
    pub const DEPTH_NEVER: u32 = 0x80;

    const _: () = assert!(DRAW_STYLE_MASK & (BLEND_MASK | DEPTH_MASK) == 0);

    pub const PARTICLES_VISIBLE: u8 = 0x01;
    /// Particles share the geometry draw style bits but only know
    /// wireframe, so 0x0a under this mask is not wireframe.
    pub const PARTICLES_DRAW_MASK: u8 = 0x0a;
    pub const PARTICLES_WIREFRAME: u8 = 0x02;
    pub const PARTICLES_SIMULATE_HERE: u8 = 0x04;

    pub const LIGHT_VISIBLE: u8 = 0x01;
}

record!(
    /// The resource name is `[name_begin, path_begin)` and the channel name
    /// is `[path_begin, path_end)`.
    Spline, 21, {
    name_begin: u32,
    path_begin: u32,
    path_end: u32,
    data_begin: u32,
    data_end: u32,
    kind: u8,
});

impl Spline {
    pub const BOOL: u8 = b'b';
    pub const FLOAT: u8 = b'f';
    pub const VEC2: u8 = b'2';
    pub const VEC3: u8 = b'3';
    pub const VEC4: u8 = b'4';
    pub const QUAT: u8 = b'q';
    pub const SPECTRUM: u8 = b's';
    pub const MAT4: u8 = b'm';
}

record!(BoolKnot, 5, { time: f32, value: u8 });
record!(FloatKnot, 8, { time: f32, value: f32 });
record!(Vec2Knot, 12, { time: f32, value: [f32; 2] });
record!(Vec3Knot, 16, { time: f32, value: [f32; 3] });
record!(Vec4Knot, 20, { time: f32, value: [f32; 4] });
record!(
    /// Stored as `x, y, z, w`.
    QuatKnot, 20, { time: f32, value: [f32; 4] });
record!(SpectrumKnot, 16, { time: f32, value: [f32; 3] });
record!(
    /// Matrix entries in row-major order.
    Mat4Knot, 68, { time: f32, value: [f32; 16] });

/// A record that carries its own `[begin, end)` name range.
pub trait Named {
    fn name_range(&self) -> (u32, u32);
}

macro_rules! named {
    ($($name:ident),* $(,)?) => {
        $(
            impl Named for $name {
                fn name_range(&self) -> (u32, u32) {
                    (self.name_begin, self.name_end)
                }
            }
        )*
    };
}

named!(
    Texture, Material, Transform, Camera, HalfedgeMesh, SkinnedMesh, Shape,
    ParticleSystem, DeltaLight, EnvironmentLight, CameraInstance,
    GeometryInstance, ParticlesInstance, LightInstance,
);
