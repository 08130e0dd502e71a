pub mod config;
pub mod lip_sync;
pub mod message;

pub use config::*;
pub use lip_sync::{LipSyncError, LipSyncTrack, MouthCue, Phoneme};
pub use message::SpeechMessage;
