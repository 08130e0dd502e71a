use serde::{Deserialize, Serialize};

use super::lip_sync::LipSyncTrack;

/// A chat reply that the puppet should speak.
///
/// Every field is optional. A message without audio is never spoken, a message
/// without a timing track is spoken with the jaw only.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SpeechMessage {
    pub text: Option<String>,
    /// Encoded audio. Decoding and playback are up to the host, only its
    /// presence matters here.
    pub audio: Option<String>,
    pub facial_expression: Option<String>,
    pub lipsync: Option<LipSyncTrack>,
    /// Name of a clip to play while speaking.
    pub animation: Option<String>,
}

impl SpeechMessage {
    pub fn from_json(data: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(data)
    }

    pub fn has_audio(&self) -> bool {
        self.audio.as_ref().map_or(false, |v| !v.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::lip_sync::Phoneme;

    #[test]
    fn full_message() {
        let message = SpeechMessage::from_json(
            r#"{
                "text": "Hi!",
                "audio": "SUQzBAAAAAAAI1RTU0UAAAAPAAADTGF2ZjU4Ljc2LjEwMAAAAAAAAAAAAAAA",
                "facialExpression": "smile",
                "animation": "Talking_1",
                "lipsync": { "mouthCues": [{ "start": 0.0, "end": 0.2, "value": "X" }] }
            }"#,
        )
        .unwrap();

        assert!(message.has_audio());
        assert_eq!(message.facial_expression.as_deref(), Some("smile"));
        assert_eq!(message.animation.as_deref(), Some("Talking_1"));
        assert_eq!(
            message.lipsync.unwrap().mouth_cues[0].value,
            Some(Phoneme::X)
        );
    }

    #[test]
    fn empty_message() {
        let message = SpeechMessage::from_json("{}").unwrap();

        assert!(!message.has_audio());
        assert!(message.lipsync.is_none());
        assert!(message.facial_expression.is_none());
    }

    #[test]
    fn empty_audio_is_silent() {
        let message = SpeechMessage::from_json(r#"{ "audio": "" }"#).unwrap();

        assert!(!message.has_audio());
    }

    #[test]
    fn broken_lipsync_does_not_reject_message() {
        let message =
            SpeechMessage::from_json(r#"{ "audio": "AAAA", "lipsync": "not a track" }"#).unwrap();

        assert!(message.has_audio());
        assert!(message.lipsync.unwrap().is_empty());
    }
}
