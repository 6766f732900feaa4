use glam::Vec3;

/// One joint of a skeleton.
#[derive(Debug, Clone, PartialEq)]
pub struct Bone {
    /// Index of the parent bone, which always precedes this one.
    pub parent: Option<u32>,
    /// Bone direction and length in the parent's frame.
    pub extent: Vec3,
    /// Euler angles in degrees.
    pub pose: Vec3,
    pub radius: f32,
    /// Used to name this bone's animation channels.
    pub channel_id: u32,
}

impl Default for Bone {
    fn default() -> Self {
        Self {
            parent: None,
            extent: Vec3::ZERO,
            pose: Vec3::ZERO,
            radius: 0.5,
            channel_id: 0,
        }
    }
}

/// Inverse kinematics target attached to the tip of a bone.
#[derive(Debug, Clone, PartialEq)]
pub struct IkHandle {
    pub bone: u32,
    pub target: Vec3,
    pub enabled: bool,
    pub channel_id: u32,
}

impl Default for IkHandle {
    fn default() -> Self {
        Self {
            bone: 0,
            target: Vec3::ZERO,
            enabled: false,
            channel_id: 0,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Skeleton {
    pub base: Vec3,
    /// Animated offset applied to `base`. Not stored in files.
    pub base_offset: Vec3,
    /// Bones in topological order.
    pub bones: Vec<Bone>,
    pub handles: Vec<IkHandle>,
}

impl Skeleton {
    /// Append a bone, assigning it the next free channel id.
    pub fn add_bone(&mut self, parent: Option<u32>, extent: Vec3) -> u32 {
        let index = self.bones.len() as u32;
        let channel_id = self.next_bone_channel_id();
        self.bones.push(Bone {
            parent,
            extent,
            channel_id,
            ..Default::default()
        });
        index
    }

    pub fn add_handle(&mut self, bone: u32, target: Vec3) -> u32 {
        let index = self.handles.len() as u32;
        let channel_id = self
            .handles
            .iter()
            .map(|h| h.channel_id + 1)
            .max()
            .unwrap_or(0);
        self.handles.push(IkHandle {
            bone,
            target,
            channel_id,
            ..Default::default()
        });
        index
    }

    fn next_bone_channel_id(&self) -> u32 {
        self.bones
            .iter()
            .map(|b| b.channel_id + 1)
            .max()
            .unwrap_or(0)
    }

    /// The first bone whose parent does not precede it, if any.
    pub fn first_unordered_bone(&self) -> Option<usize> {
        self.bones
            .iter()
            .enumerate()
            .position(|(i, b)| b.parent.is_some_and(|p| p as usize >= i))
    }

    /// Whether channel ids are exactly the table positions, which is what
    /// loading from a file produces.
    pub fn has_positional_channel_ids(&self) -> bool {
        self.bones
            .iter()
            .enumerate()
            .all(|(i, b)| b.channel_id as usize == i)
            && self
                .handles
                .iter()
                .enumerate()
                .all(|(i, h)| h.channel_id as usize == i)
    }

    /// Reset channel ids to table positions.
    pub fn renumber_channel_ids(&mut self) {
        for (i, bone) in self.bones.iter_mut().enumerate() {
            bone.channel_id = i as u32;
        }
        for (i, handle) in self.handles.iter_mut().enumerate() {
            handle.channel_id = i as u32;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_and_order() {
        let mut skeleton = Skeleton::default();
        let root = skeleton.add_bone(None, Vec3::Y);
        let child = skeleton.add_bone(Some(root), Vec3::X);
        skeleton.add_handle(child, Vec3::ONE);
        assert_eq!(skeleton.first_unordered_bone(), None);
        assert!(skeleton.has_positional_channel_ids());

        skeleton.bones[0].channel_id = 7;
        assert!(!skeleton.has_positional_channel_ids());
        assert_eq!(skeleton.add_bone(Some(1), Vec3::Z), 2);
        assert_eq!(skeleton.bones[2].channel_id, 8);
        skeleton.renumber_channel_ids();
        assert!(skeleton.has_positional_channel_ids());

        skeleton.bones[0].parent = Some(2);
        assert_eq!(skeleton.first_unordered_bone(), Some(0));
    }
}
