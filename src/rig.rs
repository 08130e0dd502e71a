/*!
The boundary between the animation engine and whatever owns the model.

The engine never creates or destroys bones or meshes. It only reads and writes
bone rotations, the hip position and blend shape weights through [Rig].
*/

use std::collections::{BTreeSet, HashMap};

use godot::prelude::Vector3;

/// Index of a bone inside a [Rig].
pub type BoneId = usize;
/// Index of a mesh surface inside a [Rig].
pub type SurfaceId = usize;

/// A mesh surface and the blend shapes it exposes, in blend shape index order.
#[derive(Debug, Clone, Default)]
pub struct MorphSurface {
    pub id: SurfaceId,
    pub names: Vec<String>,
}

/// A skinned model that can be animated.
///
/// Rotations are local Euler angles in radians, in whatever order the host uses.
/// The engine only ever offsets one angle at a time.
pub trait Rig {
    /// Every `(name, bone)` pair exposed by the skinned surfaces of the model.
    /// Duplicate names are allowed, the first one wins during resolution.
    fn bones(&self) -> Vec<(String, BoneId)>;

    fn bone_rotation(&self, bone: BoneId) -> Vector3;

    fn set_bone_rotation(&mut self, bone: BoneId, rotation: Vector3);

    fn bone_position(&self, bone: BoneId) -> Vector3;

    fn set_bone_position(&mut self, bone: BoneId, position: Vector3);

    /// Roll of the node that holds the whole model.
    fn root_roll(&self) -> f32;

    fn set_root_roll(&mut self, roll: f32);

    fn morph_surfaces(&self) -> Vec<MorphSurface>;

    fn morph_weight(&self, surface: SurfaceId, index: usize) -> f32;

    fn set_morph_weight(&mut self, surface: SurfaceId, index: usize, weight: f32);

    /// `false` once the host has freed the model behind this rig.
    fn is_alive(&self) -> bool {
        true
    }
}

/// Linear interpolation, used for every per-frame approach toward a target.
pub fn lerp(from: f32, to: f32, weight: f32) -> f32 {
    from + (to - from) * weight
}

/// Logical blend shape store. A name maps to every surface slot carrying it, so
/// a single write fans out to all of them.
#[derive(Debug, Default, Clone)]
pub struct MorphTargets {
    slots: HashMap<String, Vec<(SurfaceId, usize)>>,
    /// Every known name, sorted so that per-frame iteration is stable.
    names: BTreeSet<String>,
}

impl MorphTargets {
    pub fn from_rig(rig: &dyn Rig) -> Self {
        let mut r = Self::default();

        for surface in rig.morph_surfaces() {
            for (idx, name) in surface.names.iter().enumerate() {
                r.slots
                    .entry(name.clone())
                    .or_default()
                    .push((surface.id, idx));
                r.names.insert(name.clone());
            }
        }

        r
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.names.iter().map(String::as_str)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.slots.contains_key(name)
    }

    /// The weight of the first surface carrying `name`.
    pub fn weight(&self, rig: &dyn Rig, name: &str) -> Option<f32> {
        self.slots
            .get(name)
            .and_then(|v| v.first())
            .map(|(surface, idx)| rig.morph_weight(*surface, *idx))
    }

    /// Move every copy of `name` toward `target` by `rate`. Unknown names are a no-op.
    pub fn approach(&self, rig: &mut dyn Rig, name: &str, target: f32, rate: f32) {
        let Some(slots) = self.slots.get(name) else {
            return;
        };

        for (surface, idx) in slots {
            let current = rig.morph_weight(*surface, *idx);
            rig.set_morph_weight(*surface, *idx, lerp(current, target, rate));
        }
    }
}


#[cfg(test)]
mod tests {
    use super::{testing::MockRig, *};

    #[test]
    fn fan_out_writes_every_surface() {
        let mut rig = MockRig::humanoid();
        let morphs = MorphTargets::from_rig(&rig);

        morphs.approach(&mut rig, "jawOpen", 1.0, 0.5);

        assert_eq!(rig.weight_on(0, "jawOpen"), Some(0.5));
        assert_eq!(rig.weight_on(1, "jawOpen"), Some(0.5));
    }

    #[test]
    fn missing_name_is_noop() {
        let mut rig = MockRig::humanoid();
        let morphs = MorphTargets::from_rig(&rig);

        morphs.approach(&mut rig, "doesNotExist", 1.0, 1.0);

        assert!(rig
            .surfaces
            .iter()
            .flatten()
            .all(|(_, weight)| *weight == 0.0));
        assert!(morphs.weight(&rig, "doesNotExist").is_none());
    }

    #[test]
    fn surface_without_name_untouched() {
        let mut rig = MockRig::humanoid();
        let morphs = MorphTargets::from_rig(&rig);

        morphs.approach(&mut rig, "eyeBlinkLeft", 1.0, 1.0);

        assert_eq!(rig.weight_on(0, "eyeBlinkLeft"), Some(1.0));
        assert_eq!(rig.weight_on(1, "eyeBlinkLeft"), None);
    }

    #[test]
    fn names_are_deduplicated() {
        let rig = MockRig::humanoid();
        let morphs = MorphTargets::from_rig(&rig);

        assert_eq!(morphs.names().filter(|v| *v == "jawOpen").count(), 1);
        assert!(morphs.contains("viseme_TH"));
    }

    #[test]
    fn lerp_halfway() {
        assert_eq!(lerp(0.0, 2.0, 0.5), 1.0);
        assert_eq!(lerp(1.0, 1.0, 0.3), 1.0);
    }
}
