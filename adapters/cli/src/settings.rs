//! Loading and overriding the layered session configuration.

use std::{fs, path::Path};

use anyhow::{Context, Result};
use rampart_core::PlannerConfig;
use rampart_world::{WaveTuning, WorldConfig};
use serde::Deserialize;

use crate::args::Cli;

/// Every table a session file may carry; missing tables fall back to defaults.
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub(crate) struct Settings {
    pub(crate) planner: PlannerConfig,
    pub(crate) world: WorldConfig,
    pub(crate) waves: WaveTuning,
}

impl Settings {
    /// Reads settings from `path`, or returns the defaults when no file is given.
    pub(crate) fn load(path: Option<&Path>) -> Result<Self> {
        let Some(path) = path else {
            return Ok(Self::default());
        };
        let text = fs::read_to_string(path)
            .with_context(|| format!("failed to read config file {}", path.display()))?;
        Self::parse(&text).with_context(|| format!("failed to parse config file {}", path.display()))
    }

    pub(crate) fn parse(text: &str) -> Result<Self> {
        Ok(toml::from_str(text)?)
    }

    /// Applies command-line flags on top of the file values.
    pub(crate) fn apply_overrides(&mut self, cli: &Cli) {
        if let Some(profile) = cli.profile {
            self.planner.profile = profile.into();
        }
        if let Some(interval) = cli.interval_ms {
            self.planner.decision_interval_ms = interval;
        }
    }

    pub(crate) fn validate(&self) -> Result<()> {
        self.planner
            .validate()
            .context("invalid planner configuration")?;
        self.world.validate().context("invalid world configuration")?;
        Ok(())
    }
}
