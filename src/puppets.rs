pub mod talking_puppet;

use godot::prelude::*;

use crate::Logger;

pub use talking_puppet::TalkingPuppet;

/// Behavior shared by nodes that wrap a loaded model.
pub(crate) trait Puppet {
    fn logger(&self) -> Logger;

    /// The root of the loaded model. Its roll carries the body sway.
    fn managed_node(&self) -> Option<Gd<Node3D>>;
}
