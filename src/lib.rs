/*!
Procedural animation for talking avatars.

Given a rigged humanoid, [animator::Animator] keeps it alive every frame with
idle motion, talking gestures, blinks, facial expressions and lip sync driven by
the playing speech audio. The engine only sees the model through [rig::Rig],
[puppets::TalkingPuppet] binds it to a Godot scene.
*/

pub mod animation;
pub mod animator;
pub mod bones;
pub mod cli;
mod logger;
pub mod model;
pub mod pose;
pub mod puppets;
pub mod receivers;
pub mod rig;

pub use logger::Logger;

use godot::prelude::*;

/// Easy [GodotString] creation. :lenny:
macro_rules! gstring {
    ($string:expr) => {
        GodotString::from($string)
    };
}
pub(crate) use gstring;

/// Helper struct for information about the libvtalk library.
#[derive(Debug, Default, GodotClass)]
struct LibVtalk;

#[godot_api]
impl RefCountedVirtual for LibVtalk {
    fn init(_base: godot::obj::Base<Self::Base>) -> Self {
        Self
    }
}

#[godot_api]
impl LibVtalk {
    /// A mapping of various libvtalk metadata.
    #[func]
    fn metadata() -> Dictionary {
        let mut mapping = Dictionary::new();

        let is_debug = cfg!(debug_assertions);
        mapping.insert("DEBUG", is_debug);
        mapping.insert("RELEASE", !is_debug);

        mapping.insert("VERSION", env!("CARGO_PKG_VERSION"));
        mapping.insert("VERSION_MAJOR", env!("CARGO_PKG_VERSION_MAJOR"));
        mapping.insert("VERSION_MINOR", env!("CARGO_PKG_VERSION_MINOR"));
        mapping.insert("VERSION_PATCH", env!("CARGO_PKG_VERSION_PATCH"));

        mapping.insert("LIBVTALK_AUTHORS", env!("CARGO_PKG_AUTHORS"));

        let mut expressions = PackedStringArray::new();
        for name in animation::expression::expression_names() {
            expressions.push(GodotString::from(name));
        }
        mapping.insert("EXPRESSIONS", expressions);

        mapping
    }
}

struct GodotExtension;

#[gdextension]
unsafe impl ExtensionLibrary for GodotExtension {}
