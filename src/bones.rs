/*!
Resolution of rig-specific bone names to semantic joints.

Exporters disagree on bone names (Ready Player Me, Mixamo, Blender rigify...),
so every [Role] carries an ordered list of known spellings. Resolution happens
once per skeleton, the frame path only ever sees [BoneId]s.
*/

use std::collections::HashMap;

use log::debug;
use paste::paste;

use crate::rig::{BoneId, Rig};

/// Aliases for the root-like joint whose position carries the hip bob.
const HIPS_ALIASES: &[&str] = &["Hips", "mixamorigHips", "hips", "pelvis"];

/// Generates [Role], its alias table and one accessor per role on [JointMap].
macro_rules! roles {
    ($( $name:ident => [$($alias:literal),+ $(,)?] ),+ $(,)?) => {
        paste! {
            /// A semantic joint the engine knows how to animate.
            #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
            pub enum Role {
                $( [<$name:camel>], )+
            }

            impl Role {
                pub const ALL: &'static [Role] = &[$( Role::[<$name:camel>], )+];

                /// Known bone names for this role, most common first.
                pub fn aliases(self) -> &'static [&'static str] {
                    match self {
                        $( Role::[<$name:camel>] => &[$($alias),+], )+
                    }
                }
            }

            impl JointMap {
                $(
                    pub fn $name(&self) -> Option<BoneId> {
                        self.get(Role::[<$name:camel>])
                    }
                )+
            }
        }
    };
}

roles! {
    left_shoulder => ["LeftShoulder", "mixamorigLeftShoulder", "shoulder_L", "UpperArmRoot_L"],
    right_shoulder => ["RightShoulder", "mixamorigRightShoulder", "shoulder_R", "UpperArmRoot_R"],
    left_upper_arm => [
        "LeftArm",
        "mixamorigLeftArm",
        "upper_arm.L",
        "UpperArm_L",
        "LeftUpperArm",
    ],
    right_upper_arm => [
        "RightArm",
        "mixamorigRightArm",
        "upper_arm.R",
        "UpperArm_R",
        "RightUpperArm",
    ],
    left_forearm => [
        "LeftForeArm",
        "mixamorigLeftForeArm",
        "lower_arm.L",
        "ForeArm_L",
        "LeftLowerArm",
    ],
    right_forearm => [
        "RightForeArm",
        "mixamorigRightForeArm",
        "lower_arm.R",
        "ForeArm_R",
        "RightLowerArm",
    ],
    left_hand => ["LeftHand", "mixamorigLeftHand", "hand.L", "Hand_L"],
    right_hand => ["RightHand", "mixamorigRightHand", "hand.R", "Hand_R"],
    spine => ["Spine", "spine", "mixamorigSpine"],
    chest => ["Spine1", "Spine2", "chest", "mixamorigSpine1", "mixamorigSpine2"],
    neck => ["Neck", "mixamorigNeck"],
    head => ["Head", "mixamorigHead"],
}

impl Role {
    fn index(self) -> usize {
        self as usize
    }
}

/// Semantic joints resolved against one skeleton. Unresolved roles are `None`
/// and every consumer treats them as a no-op.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct JointMap {
    joints: [Option<BoneId>; Role::ALL.len()],
    hips: Option<BoneId>,
}

impl JointMap {
    /// Resolve every role against the bones of `rig`. Safe to call again after
    /// the skeleton has been swapped.
    pub fn resolve(rig: &dyn Rig) -> Self {
        let mut index = HashMap::new();
        for (name, bone) in rig.bones() {
            index.entry(name).or_insert(bone);
        }

        let find = |aliases: &[&str]| aliases.iter().find_map(|a| index.get(*a).copied());

        let mut r = Self::default();
        for role in Role::ALL {
            r.joints[role.index()] = find(role.aliases());
            if r.joints[role.index()].is_none() {
                debug!("No bone found for {role:?}, its motion will be skipped");
            }
        }
        r.hips = find(HIPS_ALIASES);

        r
    }

    pub fn get(&self, role: Role) -> Option<BoneId> {
        self.joints[role.index()]
    }

    pub fn hips(&self) -> Option<BoneId> {
        self.hips
    }

    /// Resolved roles and their bones.
    pub fn iter(&self) -> impl Iterator<Item = (Role, BoneId)> + '_ {
        Role::ALL
            .iter()
            .filter_map(|role| self.get(*role).map(|bone| (*role, bone)))
    }

    pub fn resolved_count(&self) -> usize {
        self.joints.iter().flatten().count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rig::testing::MockRig;

    #[test]
    fn resolves_ready_player_me_names() {
        let rig = MockRig::humanoid();
        let joints = JointMap::resolve(&rig);

        assert_eq!(joints.resolved_count(), Role::ALL.len());
        assert_eq!(joints.head(), rig.find("Head"));
        assert_eq!(joints.left_forearm(), rig.find("LeftForeArm"));
        // Spine1 comes before Spine2 in the alias list
        assert_eq!(joints.chest(), rig.find("Spine1"));
        assert_eq!(joints.hips(), rig.find("Hips"));
    }

    #[test]
    fn resolves_mixamo_names() {
        let rig = MockRig::new(&[
            "mixamorigHips",
            "mixamorigSpine",
            "mixamorigSpine2",
            "mixamorigLeftArm",
            "mixamorigRightHand",
        ]);
        let joints = JointMap::resolve(&rig);

        assert_eq!(joints.spine(), Some(1));
        assert_eq!(joints.chest(), Some(2));
        assert_eq!(joints.left_upper_arm(), Some(3));
        assert_eq!(joints.right_hand(), Some(4));
        assert_eq!(joints.hips(), Some(0));
        assert!(joints.head().is_none());
    }

    #[test]
    fn first_duplicate_wins() {
        let rig = MockRig::new(&["Head", "Neck", "Head"]);
        let joints = JointMap::resolve(&rig);

        assert_eq!(joints.head(), Some(0));
    }

    #[test]
    fn idempotent() {
        let rig = MockRig::humanoid();

        assert_eq!(JointMap::resolve(&rig), JointMap::resolve(&rig));
    }

    #[test]
    fn unresolved_roles_are_absent() {
        let rig = MockRig::new(&["Root", "Something"]);
        let joints = JointMap::resolve(&rig);

        assert_eq!(joints.resolved_count(), 0);
        assert_eq!(joints.iter().count(), 0);
        assert!(Role::ALL.iter().all(|role| joints.get(*role).is_none()));
    }

    #[test]
    fn every_role_has_aliases() {
        for role in Role::ALL {
            assert!(!role.aliases().is_empty(), "{role:?}");
        }
    }
}
