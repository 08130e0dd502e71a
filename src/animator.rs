/*!
The per-frame pose compositor.

[Animator] is the only thing that writes bone rotations and blend shape weights.
Once per rendered frame it runs, in this order:

1. expression blend shapes
2. audio energy and the clip clock, sampled once and shared by everything below
3. idle breathing, head sway, root roll, hand sway and hip bob
4. shoulder and elbow micro motion
5. talking gestures
6. forearm clamp
7. blinks and winks
8. visemes and jaw
*/

use log::{debug, info, warn};

use crate::{
    animation::{
        expression::{self, DEFAULT_EXPRESSION},
        gesture, idle, visemes, BlinkTimer, GestureOffsets, IdleOffsets, MouthState,
    },
    bones::{JointMap, Role},
    model::{EngineConfig, LipSyncTrack, SpeechMessage},
    pose::{self, Axis, PoseSnapshot},
    receivers::{audio_tap, AudioTap},
    rig::{lerp, MorphTargets, Rig},
};

/// Clip to fall back to when a message does not name one.
pub const IDLE_CLIP: &str = "Idle";
pub const CLIP_FADE_IN: f32 = 0.3;
pub const CLIP_FADE_OUT: f32 = 0.2;

/// Anatomical range of the elbow bend, in degrees.
const FOREARM_MIN_DEG: f32 = -5.0;
const FOREARM_MAX_DEG: f32 = 80.0;

/// A request for the host to cross-fade to a pre-authored clip.
#[derive(Debug, Clone, PartialEq)]
pub struct ClipRequest {
    pub name: String,
    pub fade_in: f32,
    pub fade_out: f32,
}

impl ClipRequest {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            fade_in: CLIP_FADE_IN,
            fade_out: CLIP_FADE_OUT,
        }
    }
}

/// Prefer `Idle`, then whatever the model ships first.
pub fn choose_default_clip(clips: &[String]) -> Option<String> {
    clips
        .iter()
        .find(|v| v.as_str() == IDLE_CLIP)
        .or_else(|| clips.first())
        .cloned()
}

/// State set by the message lifecycle and read every frame.
#[derive(Debug, Clone)]
pub struct Session {
    pub speaking: bool,
    pub expression: String,
    pub lipsync: Option<LipSyncTrack>,
    pub wink_left: bool,
    pub wink_right: bool,
    /// Wall-clock seconds since the rig was loaded.
    pub elapsed: f64,
}

impl Default for Session {
    fn default() -> Self {
        Self {
            speaking: false,
            expression: DEFAULT_EXPRESSION.to_string(),
            lipsync: None,
            wink_left: false,
            wink_right: false,
            elapsed: 0.0,
        }
    }
}

/// What happened during one frame.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct FrameReport {
    pub energy: f32,
    /// Clip clock used by every consumer this frame, `None` when no clip plays.
    pub clip_time: Option<f64>,
    pub mouth: MouthState,
    pub blinking: bool,
}

#[derive(Debug)]
pub struct Animator {
    config: EngineConfig,
    joints: JointMap,
    morphs: MorphTargets,
    /// Pose straight from the import, kept for diagnostics.
    initial: Option<PoseSnapshot>,
    /// Relaxed pose that all motion is relative to.
    base: Option<PoseSnapshot>,
    session: Session,
    audio: AudioTap,
    blink: BlinkTimer,
    blink_pulse: f32,
    default_clip: Option<String>,
}

impl Animator {
    pub fn new(config: EngineConfig) -> Self {
        let blink = BlinkTimer::new(config.blink.clone());

        Self::with_blink_timer(config, blink)
    }

    pub fn with_blink_timer(config: EngineConfig, blink: BlinkTimer) -> Self {
        Self {
            config,
            joints: JointMap::default(),
            morphs: MorphTargets::default(),
            initial: None,
            base: None,
            session: Session::default(),
            audio: AudioTap::new(),
            blink,
            blink_pulse: 0.0,
            default_clip: None,
        }
    }

    /// Bind to a rig: resolve joints, relax the stance and capture the base pose.
    ///
    /// Anything bound to a previous rig is torn down first, so this is also how a
    /// skeleton swap is handled.
    pub fn load(&mut self, rig: &mut dyn Rig) {
        self.teardown();

        self.joints = JointMap::resolve(rig);
        self.morphs = MorphTargets::from_rig(rig);

        let initial = PoseSnapshot::capture(rig, &self.joints);
        pose::relax(rig, &self.joints, &initial, &self.config.stance);
        self.base = Some(PoseSnapshot::capture(rig, &self.joints));
        self.initial = Some(initial);

        self.session.elapsed = 0.0;
        self.blink.start();

        info!(
            "Rig loaded with {}/{} joints resolved",
            self.joints.resolved_count(),
            Role::ALL.len()
        );
    }

    /// Stop the blink timer, detach the audio tap and forget the rig.
    pub fn teardown(&mut self) {
        if self.base.is_some() {
            debug!("Tearing down animator");
        }

        self.blink.stop();
        self.audio.stop();
        self.blink_pulse = 0.0;
        self.session.speaking = false;
        self.joints = JointMap::default();
        self.morphs = MorphTargets::default();
        self.initial = None;
        self.base = None;
    }

    pub fn is_loaded(&self) -> bool {
        self.base.is_some()
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn joints(&self) -> &JointMap {
        &self.joints
    }

    pub fn initial_pose(&self) -> Option<&PoseSnapshot> {
        self.initial.as_ref()
    }

    pub fn base_pose(&self) -> Option<&PoseSnapshot> {
        self.base.as_ref()
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn set_available_clips(&mut self, clips: &[String]) {
        self.default_clip = choose_default_clip(clips);
    }

    pub fn default_clip(&self) -> Option<&str> {
        self.default_clip.as_deref()
    }

    /// Start speaking `message`. Returns the clip the host should play.
    pub fn begin_message(&mut self, message: SpeechMessage) -> ClipRequest {
        let speaking = message.has_audio();
        let expression = message
            .facial_expression
            .filter(|v| !v.is_empty())
            .unwrap_or_else(|| DEFAULT_EXPRESSION.to_string());
        if !expression::is_known_expression(&expression) {
            debug!("Unknown expression {expression}, using neutral weights");
        }

        self.audio.stop();
        self.session.speaking = speaking;
        self.session.expression = expression;
        self.session.lipsync = message.lipsync;

        debug!(
            "Message started, speaking: {}, cues: {}",
            self.session.speaking,
            self.session
                .lipsync
                .as_ref()
                .map_or(0, |v| v.mouth_cues.len())
        );

        ClipRequest::new(
            message
                .animation
                .filter(|v| !v.is_empty())
                .unwrap_or_else(|| IDLE_CLIP.to_string()),
        )
    }

    /// The message audio finished. Returns the default clip to go back to, if any.
    pub fn end_message(&mut self) -> Option<ClipRequest> {
        self.session.speaking = false;
        self.audio.stop();

        self.default_clip.as_ref().map(ClipRequest::new)
    }

    /// Publish the clip clock and the latest sample window.
    pub fn publish_audio(&mut self, time: f64, samples: &[f32]) {
        self.audio.publish(time, samples);
    }

    pub fn publish_audio_bytes(&mut self, time: f64, bytes: &[u8]) {
        self.audio.publish_bytes(time, bytes);
    }

    /// The audio tap went away, e.g. playback was blocked.
    pub fn stop_audio(&mut self) {
        self.audio.stop();
    }

    pub fn set_expression(&mut self, name: &str) {
        self.session.expression = name.to_string();
    }

    pub fn set_wink(&mut self, left: bool, right: bool) {
        self.session.wink_left = left;
        self.session.wink_right = right;
    }

    /// Advance by `delta` seconds and write the frame into `rig`. A no-op until
    /// [Animator::load] has been called, and again once the rig has been freed.
    pub fn update(&mut self, rig: &mut dyn Rig, delta: f64) -> FrameReport {
        if self.base.is_some() && !rig.is_alive() {
            warn!("Rig was freed without a reload, tearing down");
            self.teardown();
        }

        let Self {
            config,
            joints,
            morphs,
            base,
            session,
            audio,
            blink,
            blink_pulse,
            ..
        } = self;

        let Some(base) = base.as_ref() else {
            return FrameReport::default();
        };
        let (config, joints, morphs) = (&*config, &*joints, &*morphs);

        let delta = if delta.is_finite() { delta.max(0.0) } else { 0.0 };
        session.elapsed += delta;
        if blink.advance(delta) {
            *blink_pulse = 1.0;
        }

        expression::apply_expression(rig, morphs, &session.expression);

        // The clock is sampled exactly once, gestures, jaw and visemes all share it
        // Speech motion needs audio actually playing, a message alone is not enough
        let frame = if session.speaking { audio.frame() } else { None };
        let playing = frame.is_some();
        let clip_time = frame.map(|v| v.time);
        let energy = audio_tap::frame_energy(frame.as_ref(), &config.energy);

        let idle = IdleOffsets::at(session.elapsed, playing);

        if let Some(hips) = joints.hips() {
            let mut position = rig.bone_position(hips);
            position.y = base.hips_height + idle.hips;
            rig.set_bone_position(hips, position);
        }
        rig.set_root_roll(lerp(
            rig.root_roll(),
            base.root_roll + idle.sway,
            idle::ROOT_RATE,
        ));

        let toward = |rig: &mut dyn Rig, role: Role, axis: Axis, offset: f32, rate: f32| {
            approach(rig, joints, base, role, axis, offset, rate)
        };

        toward(rig, Role::Chest, Axis::X, idle.breathe, idle::TORSO_RATE);
        toward(rig, Role::Spine, Axis::X, idle.breathe * 0.6, idle::TORSO_RATE);
        toward(rig, Role::Head, Axis::Y, idle.head_yaw, idle::HEAD_RATE);
        toward(rig, Role::Head, Axis::X, idle.head_pitch, idle::HEAD_RATE);
        toward(rig, Role::LeftHand, Axis::Y, idle.left_hand, idle::HAND_RATE);
        toward(rig, Role::RightHand, Axis::Y, -idle.right_hand, idle::HAND_RATE);

        *blink_pulse = (*blink_pulse - idle::PULSE_DECAY).max(0.0);
        let shoulder_roll = idle.shoulder_roll(*blink_pulse);
        let shoulder_forward = config.stance.shoulder_forward_deg.to_radians();
        let elbow = config.stance.elbow_base_deg.to_radians() + idle::elbow_pulse(*blink_pulse);

        toward(rig, Role::LeftShoulder, Axis::Z, shoulder_roll, idle::SHOULDER_RATE);
        toward(rig, Role::RightShoulder, Axis::Z, -shoulder_roll, idle::SHOULDER_RATE);
        toward(rig, Role::LeftShoulder, Axis::X, shoulder_forward, idle::SHOULDER_RATE);
        toward(rig, Role::RightShoulder, Axis::X, shoulder_forward, idle::SHOULDER_RATE);
        toward(rig, Role::LeftForearm, Axis::X, elbow, idle::ELBOW_RATE);
        toward(rig, Role::RightForearm, Axis::X, elbow, idle::ELBOW_RATE);

        let gestures = GestureOffsets::at(clip_time.unwrap_or(0.0), energy, playing);

        toward(rig, Role::LeftForearm, Axis::Z, gestures.left_forearm, gesture::FOREARM_RATE);
        toward(rig, Role::RightForearm, Axis::Z, gestures.right_forearm, gesture::FOREARM_RATE);
        toward(rig, Role::LeftHand, Axis::Y, gestures.left_hand, gesture::HAND_RATE);
        toward(rig, Role::RightHand, Axis::Y, gestures.right_hand, gesture::HAND_RATE);
        toward(
            rig,
            Role::LeftUpperArm,
            Axis::X,
            gestures.left_upper_arm,
            gesture::UPPER_ARM_RATE,
        );
        toward(
            rig,
            Role::RightUpperArm,
            Axis::X,
            gestures.right_upper_arm,
            gesture::UPPER_ARM_RATE,
        );

        for role in [Role::LeftForearm, Role::RightForearm] {
            clamp_axis(
                rig,
                joints,
                role,
                Axis::X,
                FOREARM_MIN_DEG.to_radians(),
                FOREARM_MAX_DEG.to_radians(),
            );
        }

        expression::apply_blink(
            rig,
            morphs,
            blink.is_blinking(),
            session.wink_left,
            session.wink_right,
            energy,
        );

        let mouth = if config.bypass_lip_sync {
            MouthState::default()
        } else {
            let track = clip_time.and(session.lipsync.as_ref());
            visemes::apply(rig, morphs, track, clip_time, energy, &config.lip_sync)
        };

        FrameReport {
            energy,
            clip_time,
            mouth,
            blinking: blink.is_blinking(),
        }
    }
}

/// Move one angle of `role` toward its base value plus `offset`.
fn approach(
    rig: &mut dyn Rig,
    joints: &JointMap,
    base: &PoseSnapshot,
    role: Role,
    axis: Axis,
    offset: f32,
    rate: f32,
) {
    let (Some(bone), Some(reference)) = (joints.get(role), base.rotation(role)) else {
        return;
    };

    let mut rotation = rig.bone_rotation(bone);
    axis.set(
        &mut rotation,
        lerp(axis.of(rotation), axis.of(reference) + offset, rate),
    );
    rig.set_bone_rotation(bone, rotation);
}

fn clamp_axis(rig: &mut dyn Rig, joints: &JointMap, role: Role, axis: Axis, min: f32, max: f32) {
    let Some(bone) = joints.get(role) else {
        return;
    };

    let mut rotation = rig.bone_rotation(bone);
    let value = axis.of(rotation);
    let clamped = if value.is_finite() {
        value.clamp(min, max)
    } else {
        0.0
    };

    if clamped != value {
        axis.set(&mut rotation, clamped);
        rig.set_bone_rotation(bone, rotation);
    }
}
