/*!
Reference poses that procedural motion is layered onto.
*/

use godot::prelude::Vector3;

use crate::{
    bones::{JointMap, Role},
    model::{AdductionAxis, StanceConfig},
    rig::Rig,
};

/// Rotations of every resolved joint at one point in time, plus the hip height
/// and the roll of the model root.
///
/// Values are copied out of the rig, later writes to the rig never show up here.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PoseSnapshot {
    pub root_roll: f32,
    pub hips_height: f32,
    rotations: [Option<Vector3>; Role::ALL.len()],
}

impl PoseSnapshot {
    pub fn capture(rig: &dyn Rig, joints: &JointMap) -> Self {
        let mut r = Self {
            root_roll: rig.root_roll(),
            hips_height: joints
                .hips()
                .map(|bone| rig.bone_position(bone).y)
                .unwrap_or_default(),
            ..Default::default()
        };

        for (role, bone) in joints.iter() {
            r.rotations[role as usize] = Some(rig.bone_rotation(bone));
        }

        r
    }

    pub fn rotation(&self, role: Role) -> Option<Vector3> {
        self.rotations[role as usize]
    }
}

/// A single Euler angle of a joint rotation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    X,
    Y,
    Z,
}

impl Axis {
    pub fn of(self, v: Vector3) -> f32 {
        match self {
            Self::X => v.x,
            Self::Y => v.y,
            Self::Z => v.z,
        }
    }

    pub fn set(self, v: &mut Vector3, value: f32) {
        match self {
            Self::X => v.x = value,
            Self::Y => v.y = value,
            Self::Z => v.z = value,
        }
    }
}

/// Move the arms out of the T/A import pose into a relaxed standing pose.
///
/// Offsets are applied relative to `base`, which must have been captured from
/// the same rig. Unresolved joints are left alone.
pub fn relax(rig: &mut dyn Rig, joints: &JointMap, base: &PoseSnapshot, stance: &StanceConfig) {
    let shoulder_forward = stance.shoulder_forward_deg.to_radians();
    let shoulder_in = stance.shoulder_in_deg.to_radians();
    let arm_in = stance.arm_in_deg.to_radians();
    let arm_forward = stance.arm_forward_deg.to_radians();
    let elbow = stance.elbow_base_deg.to_radians();

    // (role, inward sign)
    for (role, side) in [(Role::LeftShoulder, -1.0), (Role::RightShoulder, 1.0)] {
        set_from_base(rig, joints, base, role, |r| {
            r.x += shoulder_forward;
            r.z += side * shoulder_in;
        });
    }

    for (role, side) in [(Role::LeftUpperArm, -1.0), (Role::RightUpperArm, 1.0)] {
        set_from_base(rig, joints, base, role, |r| {
            let axis = match stance.adduction_axis {
                AdductionAxis::Y => Axis::Y,
                AdductionAxis::Z => Axis::Z,
            };
            axis.set(r, axis.of(*r) + side * arm_in);
            r.x += arm_forward;
        });
    }

    for role in [Role::LeftForearm, Role::RightForearm] {
        set_from_base(rig, joints, base, role, |r| r.x += elbow);
    }
}

fn set_from_base(
    rig: &mut dyn Rig,
    joints: &JointMap,
    base: &PoseSnapshot,
    role: Role,
    adjust: impl FnOnce(&mut Vector3),
) {
    let (Some(bone), Some(mut rotation)) = (joints.get(role), base.rotation(role)) else {
        return;
    };

    adjust(&mut rotation);
    rig.set_bone_rotation(bone, rotation);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rig::testing::MockRig;

    const EPSILON: f32 = 1e-5;

    fn setup() -> (MockRig, JointMap) {
        let mut rig = MockRig::humanoid();
        let joints = JointMap::resolve(&rig);

        rig.rotations[joints.head().unwrap()] = Vector3::new(0.1, 0.2, 0.3);
        rig.roll = 0.05;

        (rig, joints)
    }

    #[test]
    fn capture_reads_current_values() {
        let (rig, joints) = setup();
        let snapshot = PoseSnapshot::capture(&rig, &joints);

        assert_eq!(
            snapshot.rotation(Role::Head),
            Some(Vector3::new(0.1, 0.2, 0.3))
        );
        assert_eq!(snapshot.root_roll, 0.05);
        assert_eq!(snapshot.hips_height, 1.0);
    }

    #[test]
    fn snapshot_is_not_aliased() {
        let (mut rig, joints) = setup();
        let snapshot = PoseSnapshot::capture(&rig, &joints);

        let head = joints.head().unwrap();
        rig.set_bone_rotation(head, Vector3::new(9.0, 9.0, 9.0));
        rig.set_root_roll(2.0);

        assert_eq!(
            snapshot.rotation(Role::Head),
            Some(Vector3::new(0.1, 0.2, 0.3))
        );
        assert_eq!(snapshot.root_roll, 0.05);
    }

    #[test]
    fn missing_roles_are_none() {
        let rig = MockRig::new(&["Head"]);
        let joints = JointMap::resolve(&rig);
        let snapshot = PoseSnapshot::capture(&rig, &joints);

        assert!(snapshot.rotation(Role::Head).is_some());
        assert!(snapshot.rotation(Role::LeftHand).is_none());
        assert_eq!(snapshot.hips_height, 0.0);
    }

    #[test]
    fn relax_on_y_axis() {
        let (mut rig, joints) = setup();
        let base = PoseSnapshot::capture(&rig, &joints);
        let stance = StanceConfig::default();

        relax(&mut rig, &joints, &base, &stance);

        let left_arm = rig.rotation_of("LeftArm");
        let right_arm = rig.rotation_of("RightArm");
        assert!((left_arm.y + 10f32.to_radians()).abs() < EPSILON);
        assert!((right_arm.y - 10f32.to_radians()).abs() < EPSILON);
        assert!((left_arm.x - 7f32.to_radians()).abs() < EPSILON);
        assert_eq!(left_arm.z, 0.0);

        let left_shoulder = rig.rotation_of("LeftShoulder");
        assert!((left_shoulder.x - 3f32.to_radians()).abs() < EPSILON);
        assert!((left_shoulder.z + 4f32.to_radians()).abs() < EPSILON);
        assert!((rig.rotation_of("RightShoulder").z - 4f32.to_radians()).abs() < EPSILON);

        assert!((rig.rotation_of("RightForeArm").x - 10f32.to_radians()).abs() < EPSILON);
    }

    #[test]
    fn relax_on_z_axis() {
        let (mut rig, joints) = setup();
        let base = PoseSnapshot::capture(&rig, &joints);
        let stance = StanceConfig {
            adduction_axis: AdductionAxis::Z,
            ..Default::default()
        };

        relax(&mut rig, &joints, &base, &stance);

        let left_arm = rig.rotation_of("LeftArm");
        assert_eq!(left_arm.y, 0.0);
        assert!((left_arm.z + 10f32.to_radians()).abs() < EPSILON);
    }

    #[test]
    fn relax_without_arms() {
        let mut rig = MockRig::new(&["Hips", "Head"]);
        let joints = JointMap::resolve(&rig);
        let base = PoseSnapshot::capture(&rig, &joints);

        relax(&mut rig, &joints, &base, &StanceConfig::default());

        assert!(rig.written_bones.is_empty());
    }
}
