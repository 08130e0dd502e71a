use std::{fmt::Display, path::Path, str::FromStr};

use serde::{Deserialize, Serialize};

#[derive(Debug)]
pub enum ConfigError {
    Io {
        path: String,
        error: std::io::Error,
    },
    Parse(serde_json::Error),
    UnknownAxis {
        input: String,
    },
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io { path, error } => write!(f, "Unable to read config {path}: {error}"),
            Self::Parse(e) => write!(f, "Invalid config: {e}"),
            Self::UnknownAxis { input } => write!(f, "Unknown adduction axis: {input}"),
        }
    }
}

impl std::error::Error for ConfigError {}

/// The local axis that brings the upper arms toward the body.
///
/// Mixamo and Ready Player Me rigs adduct on `Y`, most Blender exports on `Z`.
/// There is no reliable way to tell from the skeleton, so this is a single switch.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AdductionAxis {
    #[default]
    Y,
    Z,
}

impl FromStr for AdductionAxis {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "y" => Ok(Self::Y),
            "z" => Ok(Self::Z),
            _ => Err(ConfigError::UnknownAxis {
                input: s.to_string(),
            }),
        }
    }
}

/// Offsets, in degrees, applied once at load to relax the import pose.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StanceConfig {
    pub adduction_axis: AdductionAxis,
    /// Upper arms toward the body.
    pub arm_in_deg: f32,
    /// Forward pitch of the upper arms.
    pub arm_forward_deg: f32,
    /// Resting elbow bend.
    pub elbow_base_deg: f32,
    /// Inward shoulder roll.
    pub shoulder_in_deg: f32,
    /// Forward shoulder pitch.
    pub shoulder_forward_deg: f32,
}

impl Default for StanceConfig {
    fn default() -> Self {
        Self {
            adduction_axis: AdductionAxis::Y,
            arm_in_deg: 10.0,
            arm_forward_deg: 7.0,
            elbow_base_deg: 10.0,
            shoulder_in_deg: 4.0,
            shoulder_forward_deg: 3.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LipSyncConfig {
    /// Target weight for the active viseme, clamped to 1.
    pub viseme_intensity: f32,
    pub jaw_gain: f32,
    /// Jaw opening while speech audio plays, even when silent.
    pub jaw_min: f32,
    /// Weight of the closed-lip shape blended in at the end of a cue.
    pub word_closure: f32,
}

impl Default for LipSyncConfig {
    fn default() -> Self {
        Self {
            viseme_intensity: 1.25,
            jaw_gain: 1.35,
            jaw_min: 0.02,
            word_closure: 0.07,
        }
    }
}

/// Response curve applied to the RMS of the audio window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EnergyConfig {
    pub gain: f32,
    pub exponent: f32,
}

impl Default for EnergyConfig {
    fn default() -> Self {
        Self {
            gain: 1.8,
            exponent: 1.3,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BlinkConfig {
    pub min_interval_ms: u64,
    pub max_interval_ms: u64,
    pub hold_ms: u64,
}

impl Default for BlinkConfig {
    fn default() -> Self {
        Self {
            min_interval_ms: 1000,
            max_interval_ms: 5000,
            hold_ms: 200,
        }
    }
}

#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub stance: StanceConfig,
    pub lip_sync: LipSyncConfig,
    pub energy: EnergyConfig,
    pub blink: BlinkConfig,
    /// Debug only. Skips viseme and jaw synthesis entirely so blend shapes can be
    /// inspected by hand.
    pub bypass_lip_sync: bool,
}

impl EngineConfig {
    pub fn from_json(data: &str) -> Result<Self, ConfigError> {
        serde_json::from_str(data).map_err(ConfigError::Parse)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let data = std::fs::read_to_string(path).map_err(|error| ConfigError::Io {
            path: path.display().to_string(),
            error,
        })?;

        Self::from_json(&data)
    }
}
