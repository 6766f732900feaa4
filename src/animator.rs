//! Keyframe animation addressed by `(resource, channel)` paths.

use std::fmt;

use crate::HashMap;
use crate::HashSet;
use crate::channel::{ChannelSpline, ChannelType, ChannelValue};
use crate::diagnostics::Diagnostics;
use crate::scene::Scene;
use crate::spline::Spline;

pub const DEFAULT_FRAME_RATE: f32 = 24.0;

/// Names one animated field: a resource name and one of its channels.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Path {
    pub resource: String,
    pub channel: String,
}

impl Path {
    pub fn new(resource: impl Into<String>, channel: impl Into<String>) -> Self {
        Self {
            resource: resource.into(),
            channel: channel.into(),
        }
    }
}

impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.resource, self.channel)
    }
}

fn sorted_keys(mut keys: Vec<f32>) -> Vec<f32> {
    keys.sort_by(|a, b| a.total_cmp(b));
    keys.dedup();
    keys
}

/// Splines for every animated path.
///
/// Knot times are in frames. A path never maps to an empty spline.
#[derive(Debug, Clone, PartialEq)]
pub struct Animator {
    splines: HashMap<Path, ChannelSpline>,
    pub frame_rate: f32,
}

impl Default for Animator {
    fn default() -> Self {
        Self {
            splines: HashMap::default(),
            frame_rate: DEFAULT_FRAME_RATE,
        }
    }
}

impl Animator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.splines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.splines.is_empty()
    }

    pub fn clear(&mut self) {
        self.splines.clear();
    }

    pub fn contains(&self, path: &Path) -> bool {
        self.splines.contains_key(path)
    }

    pub fn spline(&self, path: &Path) -> Option<&ChannelSpline> {
        self.splines.get(path)
    }

    /// All paths and splines, sorted by path.
    pub fn splines(&self) -> Vec<(&Path, &ChannelSpline)> {
        let mut all: Vec<_> = self.splines.iter().collect();
        all.sort_by(|a, b| a.0.cmp(b.0));
        all
    }

    /// Store a whole spline, replacing whatever was at `path`. Empty
    /// splines are dropped instead.
    pub fn insert_spline(&mut self, path: Path, spline: ChannelSpline) -> Option<ChannelSpline> {
        if spline.any() {
            self.splines.insert(path, spline)
        } else {
            self.splines.remove(&path)
        }
    }

    pub fn seconds(&self, frame: f32) -> f32 {
        frame / self.frame_rate
    }

    pub fn frame(&self, seconds: f32) -> f32 {
        seconds * self.frame_rate
    }

    /// Evaluate the spline at `path`.
    ///
    /// # Panics
    ///
    /// If the spline at `path` holds values of another type than `T`.
    pub fn get<T: ChannelType>(&self, path: &Path, time: f32) -> Option<T> {
        let spline = self.splines.get(path)?;
        let Some(typed) = T::spline(spline) else {
            panic!(
                "channel '{}' holds {} values, not {}",
                path,
                spline.kind(),
                T::KIND
            );
        };
        typed.any().then(|| typed.at(time))
    }

    /// Set a knot, creating the spline for `path` if needed.
    ///
    /// # Panics
    ///
    /// If the spline at `path` holds values of another type than `T`.
    pub fn set<T: ChannelType>(&mut self, path: Path, time: f32, value: T) {
        let spline = self
            .splines
            .entry(path)
            .or_insert_with(|| T::wrap(Spline::new()));
        let kind = spline.kind();
        match T::spline_mut(spline) {
            Some(typed) => typed.set(time, value),
            None => panic!("cannot store {} values in a {} channel", T::KIND, kind),
        }
    }

    /// Set a knot from a dynamically typed value. Returns `false` if the
    /// existing spline holds another kind of value.
    pub fn set_value(&mut self, path: Path, time: f32, value: ChannelValue) -> bool {
        self.splines
            .entry(path)
            .or_insert_with(|| ChannelSpline::new(value.kind()))
            .set_value(time, value)
    }

    /// Remove the knot at `time`, dropping the path once it has no knots.
    pub fn erase(&mut self, path: &Path, time: f32) -> bool {
        let Some(spline) = self.splines.get_mut(path) else {
            return false;
        };
        let erased = spline.erase(time);
        if !spline.any() {
            self.splines.remove(path);
        }
        erased
    }

    /// Overwrite every animated field of `scene` with its value at `time`.
    ///
    /// Returns how many fields were written.
    pub fn drive(&self, scene: &mut Scene, time: f32) -> usize {
        let mut driven = 0;
        scene.for_each_animated_mut(&mut |_, resource, item| {
            item.channels_mut(&mut |channel, slot| {
                let path = Path::new(resource, channel);
                let Some(spline) = self.splines.get(&path) else {
                    return;
                };
                let kind = slot.kind();
                if slot.set(spline.at(time)) {
                    driven += 1;
                } else {
                    log::warn!(
                        "Channel '{}' is {} but its spline holds {} values",
                        path,
                        kind,
                        spline.kind()
                    );
                }
            });
        });
        driven
    }

    /// Every path `scene` currently exposes.
    fn exposed(scene: &Scene, diagnostics: &mut Diagnostics) -> HashSet<Path> {
        let mut exposed = HashSet::default();
        scene.for_each_animated(&mut |_, resource, item| {
            item.channels(&mut |channel, _| {
                let path = Path::new(resource, channel);
                if exposed.contains(&path) {
                    diagnostics.warn(format!(
                        "Channel '{}' appears more than once in the scene",
                        path
                    ));
                } else {
                    exposed.insert(path);
                }
            });
        });
        exposed
    }

    /// Drop every path `scene` does not expose and return what was removed,
    /// sorted by path, so it can be restored with [`Self::insert_channels`].
    pub fn remove_unused_channels(
        &mut self,
        scene: &Scene,
        diagnostics: &mut Diagnostics,
    ) -> Vec<(Path, ChannelSpline)> {
        let exposed = Self::exposed(scene, diagnostics);
        let unused: Vec<Path> = self
            .splines
            .keys()
            .filter(|p| !exposed.contains(*p))
            .cloned()
            .collect();
        let mut removed: Vec<_> = unused
            .into_iter()
            .filter_map(|p| self.splines.remove_entry(&p))
            .collect();
        removed.sort_by(|a, b| a.0.cmp(&b.0));
        if !removed.is_empty() {
            diagnostics.info(format!("Removed {} unused channels.", removed.len()));
        }
        removed
    }

    /// Put back entries, overwriting any path already present.
    pub fn insert_channels(&mut self, entries: impl IntoIterator<Item = (Path, ChannelSpline)>) {
        for (path, spline) in entries {
            self.insert_spline(path, spline);
        }
    }

    /// Move every spline of `other` in, replacing paths present in both.
    pub fn merge(&mut self, other: Animator) {
        self.insert_channels(other.splines);
    }

    /// Point every path of resource `old` at resource `new`.
    pub fn rename(&mut self, old: &str, new: &str) {
        if old == new {
            return;
        }
        let moved: Vec<Path> = self
            .splines
            .keys()
            .filter(|p| p.resource == old)
            .cloned()
            .collect();
        for path in moved {
            if let Some(spline) = self.splines.remove(&path) {
                self.splines.insert(Path::new(new, path.channel), spline);
            }
        }
    }

    /// Whether any channel `scene` exposes for `name` is animated.
    pub fn has_channels(&self, scene: &Scene, name: &str) -> bool {
        let mut found = false;
        scene.for_each_animated(&mut |_, resource, item| {
            if found || resource != name {
                return;
            }
            item.channels(&mut |channel, _| {
                found |= self.splines.contains_key(&Path::new(resource, channel));
            });
        });
        found
    }

    /// Keyframe every channel of `name` and everything it refers to, using
    /// the current live values.
    pub fn set_all(&mut self, scene: &Scene, name: &str, time: f32) {
        let related = scene.related(name);
        let mut values = Vec::new();
        scene.for_each_animated(&mut |kind, resource, item| {
            if !related.iter().any(|(k, n)| *k == kind && n == resource) {
                return;
            }
            item.channels(&mut |channel, value| {
                values.push((Path::new(resource, channel), value));
            });
        });
        for (path, value) in values {
            let kind = value.kind();
            if !self.set_value(path.clone(), time, value) {
                log::warn!("Not keying '{}': it is {} but its spline is not", path, kind);
            }
        }
    }

    /// Remove the knots at `time` from every channel of `name` and
    /// everything it refers to.
    pub fn erase_all(&mut self, scene: &Scene, name: &str, time: f32) {
        let related = scene.related(name);
        let mut paths = Vec::new();
        scene.for_each_animated(&mut |kind, resource, item| {
            if !related.iter().any(|(k, n)| *k == kind && n == resource) {
                return;
            }
            item.channels(&mut |channel, _| paths.push(Path::new(resource, channel)));
        });
        for path in paths {
            self.erase(&path, time);
        }
    }

    /// Union of knot times of every spline of resource `name`.
    pub fn keys(&self, name: &str) -> Vec<f32> {
        sorted_keys(
            self.splines
                .iter()
                .filter(|(p, _)| p.resource == name)
                .flat_map(|(_, s)| s.keys())
                .collect(),
        )
    }

    pub fn all_keys(&self) -> Vec<f32> {
        sorted_keys(self.splines.values().flat_map(|s| s.keys()).collect())
    }

    /// Knot times grouped by resource. Resources without splines are absent.
    pub fn keys_by_resource(&self) -> HashMap<String, Vec<f32>> {
        let mut grouped: HashMap<String, Vec<f32>> = HashMap::default();
        for (path, spline) in &self.splines {
            grouped
                .entry(path.resource.clone())
                .or_default()
                .extend(spline.keys());
        }
        grouped
            .into_iter()
            .map(|(resource, keys)| (resource, sorted_keys(keys)))
            .collect()
    }

    /// Latest knot time of any spline, or zero.
    pub fn max_key(&self) -> f32 {
        self.splines
            .values()
            .filter_map(|s| s.last_key())
            .fold(0.0, f32::max)
    }

    /// Remove every knot at or after `time`.
    pub fn crop(&mut self, time: f32) {
        for spline in self.splines.values_mut() {
            spline.crop(time);
        }
        self.splines.retain(|_, s| s.any());
    }
}
