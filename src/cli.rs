use std::fmt::Display;

use argh::FromArgs;
use log::LevelFilter;

use crate::model::{AdductionAxis, ConfigError, EngineConfig};

#[derive(Debug)]
pub enum CliError {
    ParseFailure(argh::EarlyExit),
    Config(ConfigError),
}

impl Display for CliError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ParseFailure(e) => write!(f, "{}", e.output),
            Self::Config(e) => write!(f, "{e}"),
        }
    }
}

impl std::error::Error for CliError {}

/// libvtalk command line interface
#[derive(Debug, FromArgs)]
pub struct Args {
    /// enable verbose logging, overridden by "quiet" if passed
    #[argh(switch, short = 'v', long = "verbose")]
    verbose: bool,
    /// disable all logging, overrides verbose
    #[argh(switch, short = 'q', long = "quiet")]
    quiet: bool,
    /// path to an engine config json file
    #[argh(option)]
    config: Option<String>,
    /// axis that brings the upper arms toward the body, y or z
    #[argh(option)]
    adduction_axis: Option<AdductionAxis>,
    /// skip viseme and jaw synthesis, for inspecting blend shapes by hand
    #[argh(switch)]
    bypass_lip_sync: bool,
}

impl Args {
    /// Parse some `args`. Args are expected to come from Godot user args.
    pub fn parse(args: &[&str]) -> Result<Self, CliError> {
        Self::from_args(&[env!("CARGO_PKG_NAME")], args).map_err(CliError::ParseFailure)
    }

    pub fn log_level(&self) -> LevelFilter {
        if self.quiet {
            LevelFilter::Off
        } else if self.verbose {
            LevelFilter::Debug
        } else {
            LevelFilter::Info
        }
    }

    /// Load the config file, if one was passed, and apply the overrides on top.
    pub fn engine_config(&self) -> Result<EngineConfig, CliError> {
        let mut r = match &self.config {
            Some(path) => EngineConfig::load(path).map_err(CliError::Config)?,
            None => EngineConfig::default(),
        };
        self.apply(&mut r);

        Ok(r)
    }

    pub fn apply(&self, config: &mut EngineConfig) {
        if let Some(axis) = self.adduction_axis {
            config.stance.adduction_axis = axis;
        }
        if self.bypass_lip_sync {
            config.bypass_lip_sync = true;
        }
    }
}
