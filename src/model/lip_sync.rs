/*!
Phoneme timing tracks, as produced by Rhubarb Lip Sync:

```json
{
    "metadata": { "soundFile": "message_0.wav", "duration": 1.2 },
    "mouthCues": [
        { "start": 0.0, "end": 0.3, "value": "A" },
        { "start": 0.3, "end": 0.6, "value": "D" }
    ]
}
```

Tracks come from an external service, so parsing never fails on a bad cue.
Malformed cues are dropped and the rest of the track is kept.
*/

use std::{fmt::Display, str::FromStr};

use log::{debug, warn};
use serde::{Deserialize, Deserializer, Serialize};

#[derive(Debug)]
pub enum LipSyncError {
    Parse(serde_json::Error),
}

impl Display for LipSyncError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Parse(e) => write!(f, "Invalid lip sync track: {e}"),
        }
    }
}

impl std::error::Error for LipSyncError {}

/// Rhubarb mouth shape classes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Phoneme {
    /// Closed mouth, P B M.
    A,
    /// Slightly open, clenched teeth. Most consonants.
    B,
    /// Open mouth, EH AE.
    C,
    /// Wide open, AA.
    D,
    /// Slightly rounded, AO ER.
    E,
    /// Puckered, UW OW W.
    F,
    /// Teeth on lower lip, F V.
    G,
    /// Long L.
    H,
    /// Idle / rest.
    X,
}

impl FromStr for Phoneme {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "A" => Ok(Self::A),
            "B" => Ok(Self::B),
            "C" => Ok(Self::C),
            "D" => Ok(Self::D),
            "E" => Ok(Self::E),
            "F" => Ok(Self::F),
            "G" => Ok(Self::G),
            "H" => Ok(Self::H),
            "X" => Ok(Self::X),
            _ => Err(()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MouthCue {
    pub start: f64,
    pub end: f64,
    /// `None` when the class was not recognized. Such cues still hold the mouth
    /// in the default closed shape for their duration.
    pub value: Option<Phoneme>,
}

impl MouthCue {
    pub fn new(start: f64, end: f64, value: Phoneme) -> Self {
        Self {
            start,
            end,
            value: Some(value),
        }
    }

    pub fn contains(&self, time: f64) -> bool {
        time >= self.start && time <= self.end
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackMetadata {
    #[serde(default)]
    pub sound_file: Option<String>,
    #[serde(default)]
    pub duration: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct LipSyncTrack {
    pub metadata: Option<TrackMetadata>,
    #[serde(rename = "mouthCues")]
    pub mouth_cues: Vec<MouthCue>,
}

/// Wire shape of a cue before validation.
#[derive(Debug, Deserialize)]
struct RawCue {
    start: f64,
    end: f64,
    value: String,
}

impl LipSyncTrack {
    pub fn new(mouth_cues: Vec<MouthCue>) -> Self {
        Self {
            metadata: None,
            mouth_cues,
        }
    }

    pub fn from_json(data: &str) -> Result<Self, LipSyncError> {
        let value = serde_json::from_str::<serde_json::Value>(data).map_err(LipSyncError::Parse)?;

        Ok(Self::from_value(value))
    }

    /// Build a track from arbitrary JSON, keeping only well-formed cues.
    pub fn from_value(value: serde_json::Value) -> Self {
        let serde_json::Value::Object(mut map) = value else {
            warn!("Lip sync track was not an object, ignoring it");
            return Self::default();
        };

        let metadata = map
            .remove("metadata")
            .and_then(|v| serde_json::from_value::<TrackMetadata>(v).ok());

        let raw_cues = match map.remove("mouthCues") {
            Some(serde_json::Value::Array(v)) => v,
            Some(_) => {
                warn!("mouthCues was not an array, ignoring it");
                vec![]
            }
            None => vec![],
        };

        let mut mouth_cues = Vec::with_capacity(raw_cues.len());
        for (idx, raw) in raw_cues.into_iter().enumerate() {
            let cue = match serde_json::from_value::<RawCue>(raw) {
                Ok(v) => v,
                Err(e) => {
                    warn!("Skipping malformed mouth cue {idx}: {e}");
                    continue;
                }
            };

            let finite = cue.start.is_finite() && cue.end.is_finite();
            if !finite || cue.start < 0.0 || cue.end < cue.start {
                warn!(
                    "Skipping mouth cue {idx} with invalid range {}..{}",
                    cue.start, cue.end
                );
                continue;
            }

            let value = cue.value.parse::<Phoneme>().ok();
            if value.is_none() {
                debug!("Unknown mouth shape {} in cue {idx}", cue.value);
            }

            mouth_cues.push(MouthCue {
                start: cue.start,
                end: cue.end,
                value,
            });
        }

        Self {
            metadata,
            mouth_cues,
        }
    }

    /// The first cue whose interval contains `time`.
    pub fn cue_at(&self, time: f64) -> Option<&MouthCue> {
        self.mouth_cues.iter().find(|cue| cue.contains(time))
    }

    pub fn is_empty(&self) -> bool {
        self.mouth_cues.is_empty()
    }
}

impl<'de> Deserialize<'de> for LipSyncTrack {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = serde_json::Value::deserialize(deserializer)?;

        Ok(Self::from_value(value))
    }
}
