/*!
Idle motion. Every offset is a sine of wall-clock time with its own frequency,
so the torso, head and hands never line up.
*/

/// Idle motion recedes to this fraction while speaking.
pub const SPEAKING_DAMPING: f32 = 0.35;
/// Additional damping of hand sway while speaking, gestures take over.
const SPEAKING_HAND_DAMPING: f32 = 0.3;

/// Per-frame smoothing rates.
pub const TORSO_RATE: f32 = 0.12;
pub const HEAD_RATE: f32 = 0.12;
pub const ROOT_RATE: f32 = 0.10;
pub const HAND_RATE: f32 = 0.10;
pub const SHOULDER_RATE: f32 = 0.12;
pub const ELBOW_RATE: f32 = 0.14;

/// How much of the blink pulse is lost each frame.
pub const PULSE_DECAY: f32 = 0.14;
/// Shoulder and elbow twitch, in degrees, at the peak of a blink pulse.
const PULSE_SHOULDER_DEG: f32 = 2.0;
const PULSE_ELBOW_DEG: f32 = 3.0;

/// Offsets, in radians (hips in scene units), to add to the base pose.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct IdleOffsets {
    pub breathe: f32,
    pub head_yaw: f32,
    pub head_pitch: f32,
    pub sway: f32,
    pub left_hand: f32,
    pub right_hand: f32,
    pub hips: f32,
}

impl IdleOffsets {
    pub fn at(t: f64, speaking: bool) -> Self {
        let t = t as f32;
        let k = if speaking { SPEAKING_DAMPING } else { 1.0 };
        let hands = if speaking { SPEAKING_HAND_DAMPING } else { 1.0 };

        Self {
            breathe: (t * 1.1).sin() * 0.012 * k,
            head_yaw: (t * 0.8).sin() * 0.018 * k,
            head_pitch: (t * 1.3).sin() * 0.018 * 0.6 * k,
            sway: (t * 0.6).sin() * 0.008 * k,
            left_hand: (t * 1.7).sin() * 0.04 * hands * k,
            right_hand: (t * 1.9 + 0.8).sin() * 0.04 * hands * k,
            hips: (t * 1.2).sin() * 0.01,
        }
    }

    /// Roll offset of the shoulders. The right shoulder uses the negation.
    pub fn shoulder_roll(&self, pulse: f32) -> f32 {
        self.breathe * 0.45 + self.sway * 0.4 + PULSE_SHOULDER_DEG.to_radians() * pulse
    }
}

/// Extra elbow bend while a blink pulse is decaying.
pub fn elbow_pulse(pulse: f32) -> f32 {
    PULSE_ELBOW_DEG.to_radians() * pulse
}
