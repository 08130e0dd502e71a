/*!
Mouth shapes and jaw.

Everything here is driven by the clip clock, never by wall-clock time, so lips
stay locked to the audio through pauses and seeks.
*/

use crate::{
    model::{LipSyncConfig, LipSyncTrack, Phoneme},
    rig::{MorphTargets, Rig},
};

/// Blend shape driven by audio energy.
pub const JAW_OPEN: &str = "jawOpen";

const VISEME_RATE: f32 = 0.28;
const DECAY_RATE: f32 = 0.22;
const CLOSURE_RATE: f32 = 0.5;
const JAW_RATE: f32 = 0.25;
/// Remaining cue time, in seconds, below which the lips start closing.
const CLOSURE_THRESHOLD: f64 = 0.045;
/// Jaw chatter frequency in rad/s of clip time.
const WOBBLE_FREQUENCY: f64 = 18.0;
const WOBBLE_AMPLITUDE: f32 = 0.03;

/// Oculus viseme blend shapes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Viseme {
    PP,
    Kk,
    I,
    AA,
    O,
    U,
    FF,
    TH,
}

impl Viseme {
    pub const ALL: [Viseme; 8] = [
        Self::PP,
        Self::Kk,
        Self::I,
        Self::AA,
        Self::O,
        Self::U,
        Self::FF,
        Self::TH,
    ];

    /// The closed-lip shape, used for rests, unknown phonemes and cue closure.
    pub const CLOSED: Viseme = Self::PP;

    pub fn morph_name(self) -> &'static str {
        match self {
            Self::PP => "viseme_PP",
            Self::Kk => "viseme_kk",
            Self::I => "viseme_I",
            Self::AA => "viseme_AA",
            Self::O => "viseme_O",
            Self::U => "viseme_U",
            Self::FF => "viseme_FF",
            Self::TH => "viseme_TH",
        }
    }

    pub fn from_phoneme(phoneme: Option<Phoneme>) -> Self {
        match phoneme {
            Some(Phoneme::A) => Self::PP,
            Some(Phoneme::B) => Self::Kk,
            Some(Phoneme::C) => Self::I,
            Some(Phoneme::D) => Self::AA,
            Some(Phoneme::E) => Self::O,
            Some(Phoneme::F) => Self::U,
            Some(Phoneme::G) => Self::FF,
            Some(Phoneme::H) => Self::TH,
            Some(Phoneme::X) | None => Self::CLOSED,
        }
    }
}

/// What the mouth is doing this frame.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct MouthState {
    pub active: Option<Viseme>,
    pub closing: bool,
}

/// Pick the mouth shape for `clip_time`.
pub fn mouth_state(track: Option<&LipSyncTrack>, clip_time: Option<f64>) -> MouthState {
    let (Some(track), Some(time)) = (track, clip_time) else {
        return MouthState::default();
    };

    match track.cue_at(time) {
        Some(cue) => MouthState {
            active: Some(Viseme::from_phoneme(cue.value)),
            closing: cue.end - time < CLOSURE_THRESHOLD,
        },
        None => MouthState::default(),
    }
}

/// Jaw weight to aim for. `clip_time` is `None` when no speech audio is playing.
pub fn jaw_target(clip_time: Option<f64>, energy: f32, config: &LipSyncConfig) -> f32 {
    let Some(time) = clip_time else {
        return 0.0;
    };

    let wobble = (time * WOBBLE_FREQUENCY).sin() as f32 * WOBBLE_AMPLITUDE;

    (config.jaw_min + energy * config.jaw_gain + wobble).clamp(0.0, 1.0)
}

/// Write the mouth shapes and the jaw for this frame.
///
/// `clip_time` must be `Some` only while speech audio is playing.
pub fn apply(
    rig: &mut dyn Rig,
    morphs: &MorphTargets,
    track: Option<&LipSyncTrack>,
    clip_time: Option<f64>,
    energy: f32,
    config: &LipSyncConfig,
) -> MouthState {
    let state = mouth_state(track, clip_time);

    if let Some(viseme) = state.active {
        morphs.approach(
            rig,
            viseme.morph_name(),
            config.viseme_intensity.clamp(0.0, 1.0),
            VISEME_RATE,
        );
    }
    if state.closing {
        morphs.approach(
            rig,
            Viseme::CLOSED.morph_name(),
            config.word_closure,
            CLOSURE_RATE,
        );
    }
    for viseme in Viseme::ALL {
        if Some(viseme) != state.active {
            morphs.approach(rig, viseme.morph_name(), 0.0, DECAY_RATE);
        }
    }

    morphs.approach(
        rig,
        JAW_OPEN,
        jaw_target(clip_time, energy, config),
        JAW_RATE,
    );

    state
}
