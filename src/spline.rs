//! Keyframed curves.
//!
//! A [`Spline`] maps times to values of one type. Vector-like values are
//! evaluated as a Catmull-Rom curve through the knots, quaternions are
//! slerped between neighbouring knots and booleans hold the last value.

use std::cmp::Ordering;
use std::ops::{Add, Mul, Sub};

use glam::{Mat4, Quat, Vec2, Vec3, Vec4};

use crate::spectrum::Spectrum;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Knot<T> {
    pub time: f32,
    pub value: T,
}

/// How a value type is evaluated between two knots.
pub trait Interpolate: Copy + Default + PartialEq {
    /// Evaluate at `time`, strictly between `knots[upper - 1]` and
    /// `knots[upper]`.
    fn interpolate(knots: &[Knot<Self>], upper: usize, time: f32) -> Self;
}

/// Hermite cubic on the unit interval.
pub fn cubic_unit_spline<T>(time: f32, position0: T, position1: T, tangent0: T, tangent1: T) -> T
where
    T: Copy + Add<Output = T> + Mul<f32, Output = T>,
{
    let t2 = time * time;
    let t3 = t2 * time;
    let h00 = 2.0 * t3 - 3.0 * t2 + 1.0;
    let h10 = t3 - 2.0 * t2 + time;
    let h01 = -2.0 * t3 + 3.0 * t2;
    let h11 = t3 - t2;
    position0 * h00 + tangent0 * h10 + position1 * h01 + tangent1 * h11
}

/// Catmull-Rom segment between `knots[upper - 1]` and `knots[upper]`.
///
/// At either end of the sequence the missing neighbour is mirrored through
/// the segment, which makes that tangent the one-sided difference.
pub fn catmull_rom<T>(knots: &[Knot<T>], upper: usize, time: f32) -> T
where
    T: Copy + Add<Output = T> + Sub<Output = T> + Mul<f32, Output = T>,
{
    let k1 = knots[upper - 1];
    let k2 = knots[upper];
    let (t1, p1) = (k1.time, k1.value);
    let (t2, p2) = (k2.time, k2.value);

    let (t0, p0) = match upper.checked_sub(2).map(|i| knots[i]) {
        Some(k) => (k.time, k.value),
        None => (t1 - (t2 - t1), p1 - (p2 - p1)),
    };
    let (t3, p3) = match knots.get(upper + 1) {
        Some(k) => (k.time, k.value),
        None => (t2 + (t2 - t1), p2 + (p2 - p1)),
    };

    let span = t2 - t1;
    let m1 = (p2 - p0) * (1.0 / (t2 - t0));
    let m2 = (p3 - p1) * (1.0 / (t3 - t1));
    cubic_unit_spline((time - t1) / span, p1, p2, m1 * span, m2 * span)
}

macro_rules! interpolate_catmull_rom {
    ($($ty:ty),*) => {
        $(
            impl Interpolate for $ty {
                fn interpolate(knots: &[Knot<Self>], upper: usize, time: f32) -> Self {
                    catmull_rom(knots, upper, time)
                }
            }
        )*
    };
}

interpolate_catmull_rom!(f32, Vec2, Vec3, Vec4, Mat4, Spectrum);

impl Interpolate for Quat {
    fn interpolate(knots: &[Knot<Self>], upper: usize, time: f32) -> Self {
        let k1 = knots[upper - 1];
        let k2 = knots[upper];
        let u = (time - k1.time) / (k2.time - k1.time);
        k1.value.slerp(k2.value, u)
    }
}

impl Interpolate for bool {
    fn interpolate(knots: &[Knot<Self>], upper: usize, _time: f32) -> Self {
        knots[upper - 1].value
    }
}

fn cmp_time(a: f32, b: f32) -> Ordering {
    a.partial_cmp(&b).unwrap_or(Ordering::Less)
}

/// Knots sorted by ascending time, at most one per time.
#[derive(Debug, Clone, PartialEq)]
pub struct Spline<T> {
    knots: Vec<Knot<T>>,
}

impl<T> Default for Spline<T> {
    fn default() -> Self {
        Self { knots: Vec::new() }
    }
}

impl<T: Interpolate> Spline<T> {
    pub fn new() -> Self {
        Self::default()
    }

    fn search(&self, time: f32) -> Result<usize, usize> {
        self.knots.binary_search_by(|k| cmp_time(k.time, time))
    }

    /// Insert a knot, replacing any knot at exactly the same time.
    ///
    /// NaN times are ignored.
    pub fn set(&mut self, time: f32, value: T) {
        if time.is_nan() {
            return;
        }
        match self.search(time) {
            Ok(i) => self.knots[i].value = value,
            Err(i) => self.knots.insert(i, Knot { time, value }),
        }
    }

    /// Remove the knot at exactly `time`. Returns whether one was removed.
    pub fn erase(&mut self, time: f32) -> bool {
        match self.search(time) {
            Ok(i) => {
                self.knots.remove(i);
                true
            }
            Err(_) => false,
        }
    }

    pub fn has(&self, time: f32) -> bool {
        self.search(time).is_ok()
    }

    pub fn get(&self, time: f32) -> Option<T> {
        self.search(time).ok().map(|i| self.knots[i].value)
    }

    pub fn any(&self) -> bool {
        !self.knots.is_empty()
    }

    pub fn len(&self) -> usize {
        self.knots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.knots.is_empty()
    }

    pub fn keys(&self) -> Vec<f32> {
        self.knots.iter().map(|k| k.time).collect()
    }

    pub fn knots(&self) -> &[Knot<T>] {
        &self.knots
    }

    pub fn last_key(&self) -> Option<f32> {
        self.knots.last().map(|k| k.time)
    }

    /// Remove every knot at or after `time`.
    pub fn crop(&mut self, time: f32) {
        let keep = self.knots.partition_point(|k| k.time < time);
        self.knots.truncate(keep);
    }

    pub fn clear(&mut self) {
        self.knots.clear();
    }

    /// Evaluate the curve. An empty spline yields `T::default()`.
    pub fn at(&self, time: f32) -> T {
        let (Some(first), Some(last)) = (self.knots.first(), self.knots.last()) else {
            return T::default();
        };
        if !(time > first.time) {
            return first.value;
        }
        if time >= last.time {
            return last.value;
        }
        let upper = self.knots.partition_point(|k| k.time <= time);
        let lower = &self.knots[upper - 1];
        if lower.time == time {
            return lower.value;
        }
        T::interpolate(&self.knots, upper, time)
    }
}

impl<T: Interpolate> FromIterator<(f32, T)> for Spline<T> {
    fn from_iter<I: IntoIterator<Item = (f32, T)>>(iter: I) -> Self {
        let mut spline = Spline::new();
        for (time, value) in iter {
            spline.set(time, value);
        }
        spline
    }
}

/// Several independently typed splines keyed together.
///
/// `S` is a tuple of [`Spline`]s; values go in and come out as the matching
/// tuple of plain values.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Splines<S>(pub S);

/// Translation, rotation and scale.
pub type PoseSplines = Splines<(Spline<Vec3>, Spline<Quat>, Spline<Vec3>)>;

/// Gravity, radius, initial velocity, spread angle, lifetime, rate and
/// whether the emitter simulates.
pub type EmitterSplines = Splines<(
    Spline<f32>,
    Spline<f32>,
    Spline<f32>,
    Spline<f32>,
    Spline<f32>,
    Spline<f32>,
    Spline<bool>,
)>;

fn union_keys(mut keys: Vec<f32>) -> Vec<f32> {
    keys.sort_by(|a, b| a.total_cmp(b));
    keys.dedup();
    keys
}

macro_rules! splines_tuple {
    ($($T:ident $idx:tt),+) => {
        impl<$($T: Interpolate),+> Splines<($(Spline<$T>,)+)> {
            pub fn set(&mut self, time: f32, value: ($($T,)+)) {
                $(self.0.$idx.set(time, value.$idx);)+
            }

            pub fn at(&self, time: f32) -> ($($T,)+) {
                ($(self.0.$idx.at(time),)+)
            }

            pub fn erase(&mut self, time: f32) {
                $(self.0.$idx.erase(time);)+
            }

            /// True when any member has a knot at `time`.
            pub fn has(&self, time: f32) -> bool {
                $(self.0.$idx.has(time))||+
            }

            pub fn any(&self) -> bool {
                $(self.0.$idx.any())||+
            }

            pub fn keys(&self) -> Vec<f32> {
                let mut keys = Vec::new();
                $(keys.extend(self.0.$idx.knots().iter().map(|k| k.time));)+
                union_keys(keys)
            }

            pub fn crop(&mut self, time: f32) {
                $(self.0.$idx.crop(time);)+
            }

            pub fn clear(&mut self) {
                $(self.0.$idx.clear();)+
            }
        }
    };
}

splines_tuple!(A 0);
splines_tuple!(A 0, B 1);
splines_tuple!(A 0, B 1, C 2);
splines_tuple!(A 0, B 1, C 2, D 3);
splines_tuple!(A 0, B 1, C 2, D 3, E 4);
splines_tuple!(A 0, B 1, C 2, D 3, E 4, F 5);
splines_tuple!(A 0, B 1, C 2, D 3, E 4, F 5, G 6);
splines_tuple!(A 0, B 1, C 2, D 3, E 4, F 5, G 6, H 7);

#[cfg(test)]
mod tests {
    use super::*;

    fn linear() -> Spline<Vec3> {
        (1..=5).map(|t| (t as f32, Vec3::new(t as f32, 0.0, 0.0))).collect()
    }

    #[test]
    fn colinear_knots_stay_linear() {
        let spline = linear();
        assert!(spline.at(1.5).abs_diff_eq(Vec3::new(1.5, 0.0, 0.0), 1e-5));
        assert!(spline.at(2.5).abs_diff_eq(Vec3::new(2.5, 0.0, 0.0), 1e-5));
        assert!(spline.at(4.75).abs_diff_eq(Vec3::new(4.75, 0.0, 0.0), 1e-5));
    }

    #[test]
    fn unit_kernel() {
        let p0 = Vec3::ZERO;
        let p1 = Vec3::X;
        let m0 = Vec3::X;
        let m1 = -Vec3::X;
        let at = |t| cubic_unit_spline(t, p0, p1, m0, m1);
        assert!(at(0.1).abs_diff_eq(Vec3::new(0.118, 0.0, 0.0), 1e-4));
        assert!(at(0.5).abs_diff_eq(Vec3::new(0.75, 0.0, 0.0), 1e-4));
        assert!(at(0.9).abs_diff_eq(Vec3::new(1.062, 0.0, 0.0), 1e-4));
    }

    #[test]
    fn clamps_outside_and_hits_knots_exactly() {
        let spline: Spline<f32> = [(0.0, 1.0), (1.0, 5.0), (3.0, -2.0), (4.0, 0.25)]
            .into_iter()
            .collect();
        assert_eq!(spline.at(-10.0), 1.0);
        assert_eq!(spline.at(0.0), 1.0);
        assert_eq!(spline.at(4.0), 0.25);
        assert_eq!(spline.at(100.0), 0.25);
        for k in spline.knots() {
            assert_eq!(spline.at(k.time), k.value);
        }
        assert_eq!(spline.at(f32::NAN), 1.0);
    }

    #[test]
    fn single_knot_is_constant() {
        let mut spline = Spline::new();
        spline.set(2.0, Vec2::new(1.0, 2.0));
        assert_eq!(spline.at(-1.0), Vec2::new(1.0, 2.0));
        assert_eq!(spline.at(7.0), Vec2::new(1.0, 2.0));
    }

    #[test]
    fn empty_evaluates_to_default() {
        let spline = Spline::<Quat>::new();
        assert!(!spline.any());
        assert_eq!(spline.at(1.0), Quat::IDENTITY);
    }

    #[test]
    fn set_overwrites_and_erase_is_exact() {
        let mut spline = Spline::new();
        spline.set(1.0, 1.0f32);
        spline.set(0.5, 2.0);
        spline.set(1.0, 3.0);
        assert_eq!(spline.keys(), [0.5, 1.0]);
        assert_eq!(spline.get(1.0), Some(3.0));
        assert!(!spline.erase(0.75));
        assert!(spline.erase(0.5));
        assert_eq!(spline.keys(), [1.0]);
        spline.set(f32::NAN, 9.0);
        assert_eq!(spline.len(), 1);
    }

    #[test]
    fn crop_drops_knots_at_and_after() {
        let mut spline = linear();
        spline.crop(3.0);
        assert_eq!(spline.keys(), [1.0, 2.0]);
        spline.crop(-1.0);
        assert!(!spline.any());
    }

    #[test]
    fn bool_steps() {
        let spline: Spline<bool> = [(0.0, false), (1.0, true), (2.0, false)]
            .into_iter()
            .collect();
        assert!(!spline.at(0.99));
        assert!(spline.at(1.0));
        assert!(spline.at(1.99));
        assert!(!spline.at(2.5));
    }

    #[test]
    fn quat_slerps_between_neighbours() {
        let a = Quat::IDENTITY;
        let b = Quat::from_rotation_y(std::f32::consts::FRAC_PI_2);
        let spline: Spline<Quat> = [(0.0, a), (2.0, b)].into_iter().collect();
        let mid = spline.at(1.0);
        let expected = Quat::from_rotation_y(std::f32::consts::FRAC_PI_4);
        assert!(mid.abs_diff_eq(expected, 1e-5));
        assert!(mid.is_normalized());
    }

    #[test]
    fn tuple_adapter() {
        let mut pose = PoseSplines::default();
        assert!(!pose.any());
        pose.set(0.0, (Vec3::ZERO, Quat::IDENTITY, Vec3::ONE));
        pose.set(2.0, (Vec3::X, Quat::IDENTITY, Vec3::splat(2.0)));
        pose.0.1.set(1.0, Quat::IDENTITY);
        assert!(pose.has(1.0));
        assert_eq!(pose.keys(), [0.0, 1.0, 2.0]);
        let (t, r, s) = pose.at(2.0);
        assert_eq!((t, r, s), (Vec3::X, Quat::IDENTITY, Vec3::splat(2.0)));

        pose.erase(0.0);
        assert_eq!(pose.keys(), [1.0, 2.0]);
        pose.crop(1.5);
        assert_eq!(pose.keys(), [1.0]);
        pose.clear();
        assert!(!pose.any());
    }

    #[test]
    fn emitter_preset() {
        let mut emitter = EmitterSplines::default();
        emitter.set(0.0, (9.8, 0.1, 5.0, 0.0, 2.5, 10.0, true));
        emitter.set(1.0, (9.8, 0.1, 5.0, 0.0, 2.5, 20.0, false));
        let values = emitter.at(0.5);
        assert_eq!(values.5, 15.0);
        assert!(values.6);
    }
}
