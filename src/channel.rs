//! The closed set of animatable value types.

use std::fmt;

use glam::{Mat4, Quat, Vec2, Vec3, Vec4};

use crate::spectrum::Spectrum;
use crate::spline::{Interpolate, Spline};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChannelKind {
    Bool,
    Float,
    Vec2,
    Vec3,
    Vec4,
    Quat,
    Spectrum,
    Mat4,
}

impl fmt::Display for ChannelKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ChannelKind::Bool => "bool",
            ChannelKind::Float => "float",
            ChannelKind::Vec2 => "vec2",
            ChannelKind::Vec3 => "vec3",
            ChannelKind::Vec4 => "vec4",
            ChannelKind::Quat => "quat",
            ChannelKind::Spectrum => "spectrum",
            ChannelKind::Mat4 => "mat4",
        })
    }
}

/// One value of any animatable type.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ChannelValue {
    Bool(bool),
    Float(f32),
    Vec2(Vec2),
    Vec3(Vec3),
    Vec4(Vec4),
    Quat(Quat),
    Spectrum(Spectrum),
    Mat4(Mat4),
}

/// Write access to a live field of a scene resource.
#[derive(Debug)]
pub enum ChannelMut<'a> {
    Bool(&'a mut bool),
    Float(&'a mut f32),
    Vec2(&'a mut Vec2),
    Vec3(&'a mut Vec3),
    Vec4(&'a mut Vec4),
    Quat(&'a mut Quat),
    Spectrum(&'a mut Spectrum),
    Mat4(&'a mut Mat4),
}

/// A spline of any animatable type.
#[derive(Debug, Clone, PartialEq)]
pub enum ChannelSpline {
    Bool(Spline<bool>),
    Float(Spline<f32>),
    Vec2(Spline<Vec2>),
    Vec3(Spline<Vec3>),
    Vec4(Spline<Vec4>),
    Quat(Spline<Quat>),
    Spectrum(Spline<Spectrum>),
    Mat4(Spline<Mat4>),
}

macro_rules! each_kind {
    ($ty:ident, $value:expr, $s:ident => $body:expr) => {
        match $value {
            $ty::Bool($s) => $body,
            $ty::Float($s) => $body,
            $ty::Vec2($s) => $body,
            $ty::Vec3($s) => $body,
            $ty::Vec4($s) => $body,
            $ty::Quat($s) => $body,
            $ty::Spectrum($s) => $body,
            $ty::Mat4($s) => $body,
        }
    };
}

impl ChannelValue {
    pub fn kind(&self) -> ChannelKind {
        each_kind!(ChannelValue, self, v => v.kind())
    }
}

impl ChannelMut<'_> {
    pub fn kind(&self) -> ChannelKind {
        each_kind!(ChannelMut, self, v => (**v).kind())
    }

    pub fn get(&self) -> ChannelValue {
        each_kind!(ChannelMut, self, v => (**v).value())
    }

    /// Overwrite the field. Returns `false`, leaving the field untouched,
    /// if `value` is of another kind.
    pub fn set(self, value: ChannelValue) -> bool {
        each_kind!(ChannelMut, self, v => match ChannelType::from_value(value) {
            Some(value) => {
                *v = value;
                true
            }
            None => false,
        })
    }
}

impl ChannelSpline {
    pub fn new(kind: ChannelKind) -> Self {
        match kind {
            ChannelKind::Bool => ChannelSpline::Bool(Spline::new()),
            ChannelKind::Float => ChannelSpline::Float(Spline::new()),
            ChannelKind::Vec2 => ChannelSpline::Vec2(Spline::new()),
            ChannelKind::Vec3 => ChannelSpline::Vec3(Spline::new()),
            ChannelKind::Vec4 => ChannelSpline::Vec4(Spline::new()),
            ChannelKind::Quat => ChannelSpline::Quat(Spline::new()),
            ChannelKind::Spectrum => ChannelSpline::Spectrum(Spline::new()),
            ChannelKind::Mat4 => ChannelSpline::Mat4(Spline::new()),
        }
    }

    pub fn kind(&self) -> ChannelKind {
        match self {
            ChannelSpline::Bool(_) => ChannelKind::Bool,
            ChannelSpline::Float(_) => ChannelKind::Float,
            ChannelSpline::Vec2(_) => ChannelKind::Vec2,
            ChannelSpline::Vec3(_) => ChannelKind::Vec3,
            ChannelSpline::Vec4(_) => ChannelKind::Vec4,
            ChannelSpline::Quat(_) => ChannelKind::Quat,
            ChannelSpline::Spectrum(_) => ChannelKind::Spectrum,
            ChannelSpline::Mat4(_) => ChannelKind::Mat4,
        }
    }

    pub fn any(&self) -> bool {
        each_kind!(ChannelSpline, self, s => s.any())
    }

    pub fn len(&self) -> usize {
        each_kind!(ChannelSpline, self, s => s.len())
    }

    pub fn is_empty(&self) -> bool {
        !self.any()
    }

    pub fn has(&self, time: f32) -> bool {
        each_kind!(ChannelSpline, self, s => s.has(time))
    }

    pub fn keys(&self) -> Vec<f32> {
        each_kind!(ChannelSpline, self, s => s.keys())
    }

    pub fn last_key(&self) -> Option<f32> {
        each_kind!(ChannelSpline, self, s => s.last_key())
    }

    pub fn erase(&mut self, time: f32) -> bool {
        each_kind!(ChannelSpline, self, s => s.erase(time))
    }

    pub fn crop(&mut self, time: f32) {
        each_kind!(ChannelSpline, self, s => s.crop(time))
    }

    pub fn clear(&mut self) {
        each_kind!(ChannelSpline, self, s => s.clear())
    }

    pub fn at(&self, time: f32) -> ChannelValue {
        each_kind!(ChannelSpline, self, s => s.at(time).value())
    }

    /// Insert a knot. Returns `false` if `value` is of another kind.
    pub fn set_value(&mut self, time: f32, value: ChannelValue) -> bool {
        each_kind!(ChannelSpline, self, s => match ChannelType::from_value(value) {
            Some(value) => {
                s.set(time, value);
                true
            }
            None => false,
        })
    }
}

/// Rust types that can be stored in an animator.
pub trait ChannelType: Interpolate {
    const KIND: ChannelKind;

    fn spline(spline: &ChannelSpline) -> Option<&Spline<Self>>;
    fn spline_mut(spline: &mut ChannelSpline) -> Option<&mut Spline<Self>>;
    fn wrap(spline: Spline<Self>) -> ChannelSpline;
    fn value(self) -> ChannelValue;
    fn from_value(value: ChannelValue) -> Option<Self>;

    fn kind(&self) -> ChannelKind {
        Self::KIND
    }
}

macro_rules! channel_type {
    ($($ty:ty => $variant:ident),* $(,)?) => {
        $(
            impl ChannelType for $ty {
                const KIND: ChannelKind = ChannelKind::$variant;

                fn spline(spline: &ChannelSpline) -> Option<&Spline<Self>> {
                    match spline {
                        ChannelSpline::$variant(s) => Some(s),
                        _ => None,
                    }
                }

                fn spline_mut(spline: &mut ChannelSpline) -> Option<&mut Spline<Self>> {
                    match spline {
                        ChannelSpline::$variant(s) => Some(s),
                        _ => None,
                    }
                }

                fn wrap(spline: Spline<Self>) -> ChannelSpline {
                    ChannelSpline::$variant(spline)
                }

                fn value(self) -> ChannelValue {
                    ChannelValue::$variant(self)
                }

                fn from_value(value: ChannelValue) -> Option<Self> {
                    match value {
                        ChannelValue::$variant(v) => Some(v),
                        _ => None,
                    }
                }
            }
        )*
    };
}

channel_type! {
    bool => Bool,
    f32 => Float,
    Vec2 => Vec2,
    Vec3 => Vec3,
    Vec4 => Vec4,
    Quat => Quat,
    Spectrum => Spectrum,
    Mat4 => Mat4,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn live_fields_accept_only_their_kind() {
        let mut fov = 60.0f32;
        assert_eq!(ChannelMut::Float(&mut fov).kind(), ChannelKind::Float);
        assert!(!ChannelMut::Float(&mut fov).set(ChannelValue::Bool(true)));
        assert_eq!(fov, 60.0);
        assert!(ChannelMut::Float(&mut fov).set(ChannelValue::Float(45.0)));
        assert_eq!(ChannelMut::Float(&mut fov).get(), ChannelValue::Float(45.0));
    }

    #[test]
    fn dynamic_spline_access() {
        let mut spline = ChannelSpline::new(ChannelKind::Vec3);
        assert!(!spline.any());
        assert!(spline.set_value(0.0, ChannelValue::Vec3(Vec3::X)));
        assert!(!spline.set_value(1.0, ChannelValue::Float(1.0)));
        assert_eq!(spline.len(), 1);
        assert_eq!(spline.at(3.0), ChannelValue::Vec3(Vec3::X));
        assert!(<Vec3 as ChannelType>::spline(&spline).is_some());
        assert!(<Quat as ChannelType>::spline(&spline).is_none());
    }
}
