/*!
Procedural motion sources. Each one is a function of time, energy and session
state. None of them own the rig, [crate::animator::Animator] decides when and
where their output is written.
*/

pub mod blink;
pub mod expression;
pub mod gesture;
pub mod idle;
pub mod visemes;

pub use blink::BlinkTimer;
pub use gesture::GestureOffsets;
pub use idle::IdleOffsets;
pub use visemes::{MouthState, Viseme};
