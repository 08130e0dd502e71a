/*!
Sources of data that are published outside of the frame loop and read by it.
*/

pub mod audio_tap;

pub use audio_tap::{AudioTap, ClipFrame};
