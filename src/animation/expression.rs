/*!
Facial expression presets and eye blinks.
*/

use std::collections::HashMap;

use once_cell::sync::Lazy;

use crate::rig::{MorphTargets, Rig};

pub const EYE_BLINK_LEFT: &str = "eyeBlinkLeft";
pub const EYE_BLINK_RIGHT: &str = "eyeBlinkRight";

pub const DEFAULT_EXPRESSION: &str = "default";

const EXPRESSION_RATE: f32 = 0.1;
const BLINK_RATE: f32 = 0.5;
/// How much loud speech softens a blink.
const BLINK_SPEECH_DAMPING: f32 = 0.8;
const BLINK_MIN_ATTENUATION: f32 = 0.15;

type Preset = HashMap<&'static str, f32>;

/// Blend shape weights per named expression. Shapes missing from a preset are 0.
static PRESETS: Lazy<HashMap<&'static str, Preset>> = Lazy::new(|| {
    let mut r = HashMap::new();

    r.insert(DEFAULT_EXPRESSION, Preset::new());
    r.insert(
        "smile",
        Preset::from([
            ("browInnerUp", 0.17),
            ("eyeSquintLeft", 0.4),
            ("eyeSquintRight", 0.44),
            ("noseSneerLeft", 0.17),
            ("noseSneerRight", 0.14),
            ("mouthPressLeft", 0.61),
            ("mouthPressRight", 0.41),
        ]),
    );
    r.insert(
        "funnyFace",
        Preset::from([
            ("jawLeft", 0.63),
            ("mouthPucker", 0.53),
            ("noseSneerLeft", 1.0),
            ("noseSneerRight", 0.39),
            ("mouthLeft", 1.0),
            ("eyeLookUpLeft", 1.0),
            ("eyeLookUpRight", 1.0),
            ("cheekPuff", 1.0),
            ("mouthDimpleLeft", 0.4147),
            ("mouthRollLower", 0.32),
            ("mouthSmileLeft", 0.355),
            ("mouthSmileRight", 0.355),
        ]),
    );
    r.insert(
        "sad",
        Preset::from([
            ("mouthFrownLeft", 1.0),
            ("mouthFrownRight", 1.0),
            ("mouthShrugLower", 0.78341),
            ("browInnerUp", 0.452),
            ("eyeSquintLeft", 0.72),
            ("eyeSquintRight", 0.75),
            ("eyeLookDownLeft", 0.5),
            ("eyeLookDownRight", 0.5),
            ("jawForward", 1.0),
        ]),
    );
    r.insert(
        "surprised",
        Preset::from([
            ("eyeWideLeft", 0.5),
            ("eyeWideRight", 0.5),
            ("jawOpen", 0.351),
            ("mouthFunnel", 1.0),
            ("browInnerUp", 1.0),
        ]),
    );
    r.insert(
        "angry",
        Preset::from([
            ("browDownLeft", 1.0),
            ("browDownRight", 1.0),
            ("eyeSquintLeft", 1.0),
            ("eyeSquintRight", 1.0),
            ("jawForward", 1.0),
            ("jawLeft", 1.0),
            ("mouthShrugLower", 1.0),
            ("noseSneerLeft", 1.0),
            ("noseSneerRight", 0.42),
            ("eyeLookDownLeft", 0.16),
            ("eyeLookDownRight", 0.16),
            ("cheekSquintLeft", 1.0),
            ("cheekSquintRight", 1.0),
            ("mouthClose", 0.23),
            ("mouthFunnel", 0.63),
            ("mouthDimpleRight", 1.0),
        ]),
    );

    r
});

pub fn is_known_expression(name: &str) -> bool {
    PRESETS.contains_key(name)
}

/// Names of every available preset.
pub fn expression_names() -> Vec<&'static str> {
    let mut r = PRESETS.keys().copied().collect::<Vec<_>>();
    r.sort_unstable();

    r
}

/// Desired weight of `morph` under `expression`. Unknown expressions behave like
/// the default one.
pub fn preset_weight(expression: &str, morph: &str) -> f32 {
    PRESETS
        .get(expression)
        .and_then(|v| v.get(morph))
        .copied()
        .unwrap_or_default()
}

/// Move every face blend shape except the blinks toward `expression`.
pub fn apply_expression(rig: &mut dyn Rig, morphs: &MorphTargets, expression: &str) {
    for name in morphs.names() {
        if name == EYE_BLINK_LEFT || name == EYE_BLINK_RIGHT {
            continue;
        }

        morphs.approach(rig, name, preset_weight(expression, name), EXPRESSION_RATE);
    }
}

/// Blinks soften during loud speech instead of looking like eye flutter.
pub fn blink_attenuation(energy: f32) -> f32 {
    (1.0 - energy * BLINK_SPEECH_DAMPING).clamp(BLINK_MIN_ATTENUATION, 1.0)
}

/// Blink weight targets for (left, right).
pub fn blink_targets(blinking: bool, wink_left: bool, wink_right: bool, energy: f32) -> (f32, f32) {
    let attenuation = blink_attenuation(energy);
    let target = |closed: bool| if closed { attenuation } else { 0.0 };

    (
        target(blinking || wink_left),
        target(blinking || wink_right),
    )
}

pub fn apply_blink(
    rig: &mut dyn Rig,
    morphs: &MorphTargets,
    blinking: bool,
    wink_left: bool,
    wink_right: bool,
    energy: f32,
) {
    let (left, right) = blink_targets(blinking, wink_left, wink_right, energy);

    morphs.approach(rig, EYE_BLINK_LEFT, left, BLINK_RATE);
    morphs.approach(rig, EYE_BLINK_RIGHT, right, BLINK_RATE);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rig::testing::MockRig;

    #[test]
    fn presets() {
        assert_eq!(preset_weight("smile", "mouthPressLeft"), 0.61);
        assert_eq!(preset_weight("smile", "jawOpen"), 0.0);
        assert_eq!(preset_weight("surprised", "jawOpen"), 0.351);
        assert_eq!(preset_weight("not a preset", "browInnerUp"), 0.0);
        assert!(is_known_expression("angry"));
        assert!(!is_known_expression("bored"));
        assert_eq!(expression_names().len(), 6);
    }

    #[test]
    fn expression_approaches_preset() {
        let mut rig = MockRig::humanoid();
        let morphs = MorphTargets::from_rig(&rig);

        apply_expression(&mut rig, &morphs, "smile");

        let squint = rig.weight_on(0, "eyeSquintLeft").unwrap();
        assert!((squint - 0.4 * EXPRESSION_RATE).abs() < 1e-6);
        assert_eq!(rig.weight_on(0, "mouthSmileLeft"), Some(0.0));
    }

    #[test]
    fn expression_skips_blinks() {
        let mut rig = MockRig::humanoid();
        let morphs = MorphTargets::from_rig(&rig);

        morphs.approach(&mut rig, EYE_BLINK_LEFT, 1.0, 1.0);
        apply_expression(&mut rig, &morphs, DEFAULT_EXPRESSION);

        assert_eq!(rig.weight_on(0, EYE_BLINK_LEFT), Some(1.0));
    }

    #[test]
    fn expression_releases_to_neutral() {
        let mut rig = MockRig::humanoid();
        let morphs = MorphTargets::from_rig(&rig);

        for _ in 0..200 {
            apply_expression(&mut rig, &morphs, "smile");
        }
        for _ in 0..200 {
            apply_expression(&mut rig, &morphs, DEFAULT_EXPRESSION);
        }

        assert!(rig.weight_on(0, "eyeSquintLeft").unwrap() < 1e-3);
    }

    #[test]
    fn blink_attenuated_by_speech() {
        assert_eq!(blink_targets(true, false, false, 0.0), (1.0, 1.0));

        let (left, right) = blink_targets(true, false, false, 1.0);
        assert!((left - 0.2).abs() < 1e-6);
        assert!((right - 0.2).abs() < 1e-6);

        assert_eq!(blink_attenuation(5.0), BLINK_MIN_ATTENUATION);
    }

    #[test]
    fn winks() {
        assert_eq!(blink_targets(false, true, false, 0.0), (1.0, 0.0));
        assert_eq!(blink_targets(false, false, true, 0.0), (0.0, 1.0));
        assert_eq!(blink_targets(false, false, false, 0.0), (0.0, 0.0));
    }

    #[test]
    fn blink_writes() {
        let mut rig = MockRig::humanoid();
        let morphs = MorphTargets::from_rig(&rig);

        apply_blink(&mut rig, &morphs, true, false, false, 0.0);

        assert_eq!(rig.weight_on(0, EYE_BLINK_LEFT), Some(BLINK_RATE));
        assert_eq!(rig.weight_on(0, EYE_BLINK_RIGHT), Some(BLINK_RATE));
    }
}
