use godot::{
    engine::{global::Error, AnimationPlayer, ArrayMesh, MeshInstance3D, Os, Skeleton3D},
    prelude::*,
};

use crate::{
    animator::{Animator, ClipRequest},
    cli::Args,
    gstring, logger,
    model::{EngineConfig, SpeechMessage},
    rig::{BoneId, MorphSurface, Rig, SurfaceId},
    Logger,
};

use super::Puppet;

/// The default skeleton name for finding the skeleton node.
const SKELETON_NODE_NAME: &str = "*Skeleton*";
const ANIM_PLAYER: &str = "AnimationPlayer";
const MESH_INST_3D: &str = "MeshInstance3D";

/// One mesh and the names of its blend shapes, in blend shape index order.
#[derive(Debug)]
struct MorphMesh {
    mesh: Gd<MeshInstance3D>,
    names: Vec<String>,
}

/// A loaded model as seen by the [Animator]. Only lives for the duration of one call.
struct GodotRig<'a> {
    skeleton: &'a mut Gd<Skeleton3D>,
    root: Option<&'a mut Gd<Node3D>>,
    meshes: &'a mut [MorphMesh],
}

impl Rig for GodotRig<'_> {
    fn bones(&self) -> Vec<(String, BoneId)> {
        (0..self.skeleton.get_bone_count())
            .map(|i| (self.skeleton.get_bone_name(i).to_string(), i as BoneId))
            .collect()
    }

    fn bone_rotation(&self, bone: BoneId) -> Vector3 {
        // Quaternion::from_euler is YXZ as well
        let rotation = self.skeleton.get_bone_pose_rotation(bone as i32);

        Basis::from_quat(rotation).to_euler(EulerOrder::YXZ)
    }

    fn set_bone_rotation(&mut self, bone: BoneId, rotation: Vector3) {
        self.skeleton
            .set_bone_pose_rotation(bone as i32, Quaternion::from_euler(rotation));
    }

    fn bone_position(&self, bone: BoneId) -> Vector3 {
        self.skeleton.get_bone_pose_position(bone as i32)
    }

    fn set_bone_position(&mut self, bone: BoneId, position: Vector3) {
        self.skeleton.set_bone_pose_position(bone as i32, position);
    }

    fn root_roll(&self) -> f32 {
        self.root.as_ref().map_or(0.0, |v| v.get_rotation().z)
    }

    fn set_root_roll(&mut self, roll: f32) {
        if let Some(root) = self.root.as_mut() {
            let mut rotation = root.get_rotation();
            rotation.z = roll;
            root.set_rotation(rotation);
        }
    }

    fn morph_surfaces(&self) -> Vec<MorphSurface> {
        self.meshes
            .iter()
            .enumerate()
            .map(|(id, v)| MorphSurface {
                id,
                names: v.names.clone(),
            })
            .collect()
    }

    fn morph_weight(&self, surface: SurfaceId, index: usize) -> f32 {
        self.meshes
            .get(surface)
            .map_or(0.0, |v| v.mesh.get_blend_shape_value(index as i32))
    }

    fn set_morph_weight(&mut self, surface: SurfaceId, index: usize, weight: f32) {
        if let Some(v) = self.meshes.get_mut(surface) {
            v.mesh.set_blend_shape_value(index as i32, weight);
        }
    }

    fn is_alive(&self) -> bool {
        self.skeleton.is_instance_valid()
            && self.root.as_ref().map_or(true, |v| v.is_instance_valid())
            && self.meshes.iter().all(|v| v.mesh.is_instance_valid())
    }
}

/// A talking avatar. Wraps a loaded `glb` model and animates it every frame.
///
/// The model must be the first child of this node.
#[derive(Debug, GodotClass)]
#[class(base = Node3D)]
pub struct TalkingPuppet {
    #[var]
    pub logger: Gd<Logger>,

    #[base]
    base: Base<Node3D>,

    #[var]
    pub skeleton: Option<Gd<Skeleton3D>>,
    #[var]
    pub animation_player: Option<Gd<AnimationPlayer>>,

    root: Option<Gd<Node3D>>,
    meshes: Vec<MorphMesh>,
    animator: Animator,
}

#[godot_api]
impl Node3DVirtual for TalkingPuppet {
    fn init(base: godot::obj::Base<Self::Base>) -> Self {
        Self {
            logger: Logger::create(gstring!("TalkingPuppet")),

            base,

            skeleton: None,
            animation_player: None,

            root: None,
            meshes: vec![],
            animator: Animator::new(EngineConfig::default()),
        }
    }

    fn ready(&mut self) {
        let logger = self.logger();

        let user_args = Os::singleton()
            .get_cmdline_user_args()
            .as_slice()
            .iter()
            .map(|v| v.to_string())
            .collect::<Vec<_>>();
        let user_args = user_args.iter().map(String::as_str).collect::<Vec<_>>();

        let config = match Args::parse(&user_args) {
            Ok(args) => {
                logger::install(args.log_level());
                args.engine_config().unwrap_or_else(|e| {
                    logger.error(format!("{e}, using the default config"));
                    EngineConfig::default()
                })
            }
            Err(e) => {
                logger::install(log::LevelFilter::Info);
                logger.error(format!("Unable to parse user args: {e}"));
                EngineConfig::default()
            }
        };
        self.animator = Animator::new(config);

        logger.debug("Starting ready!");

        self.reload_rig();
    }

    fn process(&mut self, delta: f64) {
        let loaded = self.drive(|animator, rig| {
            animator.update(rig, delta);
            animator.is_loaded()
        });

        // The animator let go of a freed model, drop the stale handles too
        if loaded == Some(false) {
            self.teardown();
        }
    }
}

#[godot_api]
impl TalkingPuppet {
    /// Start speaking a JSON message `{ audio, facialExpression, lipsync, animation }`.
    #[func]
    pub fn speak(&mut self, message: GodotString) -> Error {
        let message = match SpeechMessage::from_json(&message.to_string()) {
            Ok(v) => v,
            Err(e) => {
                self.logger().error(format!("Unable to parse message: {e}"));
                return Error::ERR_PARSE_ERROR;
            }
        };

        let request = self.animator.begin_message(message);
        self.play(&request, request.fade_in)
    }

    /// The message audio finished playing.
    #[func]
    pub fn finish_speaking(&mut self) -> Error {
        match self.animator.end_message() {
            Some(request) => self.play(&request, request.fade_out),
            None => Error::OK,
        }
    }

    /// Publish the playback position of the message audio and its latest sample window.
    #[func]
    pub fn push_audio(&mut self, playback_time: f64, samples: PackedFloat32Array) {
        self.animator.publish_audio(playback_time, samples.as_slice());
    }

    /// Like [TalkingPuppet::push_audio] but for unsigned 8-bit analyser data.
    #[func]
    pub fn push_audio_bytes(&mut self, playback_time: f64, samples: PackedByteArray) {
        self.animator
            .publish_audio_bytes(playback_time, samples.as_slice());
    }

    #[func]
    pub fn stop_audio(&mut self) {
        self.animator.stop_audio();
    }

    #[func]
    pub fn set_expression(&mut self, name: GodotString) {
        self.animator.set_expression(&name.to_string());
    }

    #[func]
    pub fn set_wink(&mut self, left: bool, right: bool) {
        self.animator.set_wink(left, right);
    }

    #[func]
    pub fn is_speaking(&self) -> bool {
        self.animator.session().speaking
    }

    /// Find the skeleton, blend shapes and clips again. Call after swapping the model.
    #[func]
    pub fn reload_rig(&mut self) {
        let logger = self.logger();

        self.teardown();

        let skeleton = match self.find_skeleton() {
            Some(v) => v,
            None => {
                logger.error("Unable to find Skeleton3D, bailing out early!");
                return;
            }
        };

        self.meshes = find_morph_meshes(&skeleton, &logger);
        self.root = self.managed_node();
        if self.root.is_none() {
            logger.warn("No managed Node3D found, body sway is disabled");
        }

        self.animation_player = self.find_animation_player();
        let clips = match &self.animation_player {
            Some(v) => v
                .get_animation_list()
                .as_slice()
                .iter()
                .map(|v| v.to_string())
                .collect::<Vec<_>>(),
            None => {
                logger.debug("No AnimationPlayer found, clips are disabled");
                vec![]
            }
        };
        self.animator.set_available_clips(&clips);

        self.skeleton = Some(skeleton);
        self.drive(|animator, rig| animator.load(rig));

        if let Some(request) = self.animator.default_clip().map(ClipRequest::new) {
            self.play(&request, request.fade_in);
        }
    }

    /// Stop everything bound to the current model.
    #[func]
    pub fn teardown(&mut self) {
        self.animator.teardown();

        self.skeleton = None;
        self.animation_player = None;
        self.root = None;
        self.meshes.clear();
    }
}

impl Puppet for TalkingPuppet {
    fn logger(&self) -> Logger {
        self.logger.bind().clone()
    }

    fn managed_node(&self) -> Option<Gd<Node3D>> {
        self.base.get_child(0)?.try_cast::<Node3D>()
    }
}

impl TalkingPuppet {
    /// Run `f` against the current model. Does nothing without a skeleton.
    fn drive<T>(&mut self, f: impl FnOnce(&mut Animator, &mut dyn Rig) -> T) -> Option<T> {
        let skeleton = self.skeleton.as_mut()?;
        let mut rig = GodotRig {
            skeleton,
            root: self.root.as_mut(),
            meshes: &mut self.meshes,
        };
        let rig: &mut dyn Rig = &mut rig;

        Some(f(&mut self.animator, rig))
    }

    fn find_skeleton(&self) -> Option<Gd<Skeleton3D>> {
        self.base
            .find_child_ex(gstring!(SKELETON_NODE_NAME))
            .owned(false)
            .done()?
            .try_cast::<Skeleton3D>()
    }

    fn find_animation_player(&self) -> Option<Gd<AnimationPlayer>> {
        self.base
            .find_child_ex(gstring!(ANIM_PLAYER))
            .owned(false)
            .done()?
            .try_cast::<AnimationPlayer>()
    }

    /// Cross-fade to the requested clip. Missing clips are reported, never fatal.
    fn play(&mut self, request: &ClipRequest, fade: f32) -> Error {
        let logger = self.logger();

        let Some(player) = self.animation_player.as_mut() else {
            logger.debug(format!("No AnimationPlayer, not playing {}", request.name));
            return Error::ERR_UNCONFIGURED;
        };

        let name = StringName::from(request.name.as_str());
        if !player.has_animation(name.clone()) {
            logger.error(format!("Clip {} does not exist", request.name));
            return Error::ERR_DOES_NOT_EXIST;
        }

        player
            .play_ex()
            .name(name)
            .custom_blend(f64::from(fade))
            .done();

        Error::OK
    }
}

/// Collect the blend shapes of every mesh directly under the skeleton.
fn find_morph_meshes(skeleton: &Gd<Skeleton3D>, logger: &Logger) -> Vec<MorphMesh> {
    let mut r = vec![];

    // Pre-allocate the name here and then clone it in the loop
    let mesh_instance_3d_name = gstring!(MESH_INST_3D);

    for child in skeleton.get_children().iter_shared() {
        // Used for debugging only
        let child_name = child.get_name();

        if !child.is_class(mesh_instance_3d_name.clone()) {
            logger.debug(format!(
                "Child {child_name} was not a MeshInstance3D, skipping"
            ));
            continue;
        }

        let child = match child.try_cast::<MeshInstance3D>() {
            Some(v) => v,
            None => {
                logger.error(format!(
                    "Skeleton child {child_name} is a MeshInstance3D but could not be cast"
                ));
                continue;
            }
        };
        let mesh = match child.get_mesh() {
            Some(v) => v,
            None => {
                logger.error(format!(
                    "Unable to get mesh from MeshInstance3D {child_name}, skipping"
                ));
                continue;
            }
        };
        let mesh = match mesh.try_cast::<ArrayMesh>() {
            Some(v) => v,
            None => {
                logger.error(format!(
                    "Unable to convert mesh from {child_name} into ArrayMesh, skipping"
                ));
                continue;
            }
        };

        let names = (0..mesh.get_blend_shape_count())
            .map(|i| mesh.get_blend_shape_name(i).to_string())
            .collect::<Vec<_>>();
        if names.is_empty() {
            continue;
        }

        logger.debug(format!("{child_name} has {} blend shapes", names.len()));

        r.push(MorphMesh {
            mesh: child,
            names,
        });
    }

    r
}
