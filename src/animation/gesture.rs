/*!
Talking gestures for the forearms and hands.

Driven by the clip clock instead of wall-clock time, so the same utterance
always gestures the same way and seeking keeps the gestures in place.
*/

use std::f32::consts::PI;

const BASE_AMPLITUDE: f32 = 0.18;
const ENERGY_GAIN: f32 = 0.35;

pub const FOREARM_RATE: f32 = 0.18;
pub const HAND_RATE: f32 = 0.18;
pub const UPPER_ARM_RATE: f32 = 0.12;

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct GestureOffsets {
    pub amplitude: f32,
    /// Forearm roll.
    pub left_forearm: f32,
    pub right_forearm: f32,
    /// Hand yaw.
    pub left_hand: f32,
    pub right_hand: f32,
    /// Forward lean of the upper arms.
    pub left_upper_arm: f32,
    pub right_upper_arm: f32,
}

impl GestureOffsets {
    /// Offsets at `clip_time` seconds into the clip. All zero while no speech
    /// audio plays, which pulls the arms back onto the base pose.
    pub fn at(clip_time: f64, energy: f32, playing: bool) -> Self {
        if !playing {
            return Self::default();
        }

        let amplitude = BASE_AMPLITUDE + energy * ENERGY_GAIN;
        let ta = clip_time as f32;

        let left_z = (ta * 2.2).sin() * amplitude;
        let left_y = (ta * 1.6 + 0.6).sin() * amplitude;
        let right_z = (ta * 2.0 + PI * 0.35).sin() * amplitude;
        let right_y = (ta * 1.7 + 1.1).sin() * amplitude;

        Self {
            amplitude,
            left_forearm: left_z,
            right_forearm: -right_z,
            left_hand: left_y,
            right_hand: -right_y,
            left_upper_arm: 0.04 * amplitude,
            right_upper_arm: 0.03 * amplitude,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn silent_is_zero() {
        assert_eq!(GestureOffsets::at(1.5, 1.0, false), GestureOffsets::default());
    }

    #[test]
    fn louder_is_wider() {
        let quiet = GestureOffsets::at(0.7, 0.0, true);
        let loud = GestureOffsets::at(0.7, 1.0, true);

        assert_eq!(quiet.amplitude, BASE_AMPLITUDE);
        assert!((loud.amplitude - (BASE_AMPLITUDE + ENERGY_GAIN)).abs() < 1e-6);
        assert!(loud.left_forearm.abs() > quiet.left_forearm.abs());
        assert!(loud.left_upper_arm > quiet.left_upper_arm);
    }

    #[test]
    fn deterministic_per_clip_time() {
        assert_eq!(
            GestureOffsets::at(2.25, 0.4, true),
            GestureOffsets::at(2.25, 0.4, true)
        );
    }

    #[test]
    fn sides_are_not_mirrored() {
        let mirrored = (0..100)
            .map(|i| GestureOffsets::at(i as f64 * 0.05, 0.5, true))
            .filter(|v| (v.left_forearm + v.right_forearm).abs() < 1e-4)
            .count();

        assert!(mirrored < 10);
    }
}
