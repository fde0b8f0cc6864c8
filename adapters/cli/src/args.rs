//! Command-line arguments.

use std::path::PathBuf;

use clap::{Parser, ValueEnum};
use rampart_core::Profile;

/// Runs the decision engine against seeded hostile waves in the sandbox world.
#[derive(Debug, Parser)]
#[command(name = "rampart", version, about)]
pub(crate) struct Cli {
    /// TOML file with `planner`, `world` and `waves` tables
    #[arg(short, long, value_name = "FILE")]
    pub(crate) config: Option<PathBuf>,

    /// Personality profile overriding the configured one
    #[arg(short, long, value_enum)]
    pub(crate) profile: Option<ProfileArg>,

    /// Seed of the wave generator
    #[arg(short, long, default_value_t = 0x5eed)]
    pub(crate) seed: u64,

    /// Number of waves to play
    #[arg(short, long, default_value_t = 5)]
    pub(crate) waves: u32,

    /// Simulation ticks allowed per wave before moving on
    #[arg(short, long, default_value_t = 1_200)]
    pub(crate) ticks: u32,

    /// Minimum milliseconds between two decisions, overriding the configured interval
    #[arg(long, value_name = "MS")]
    pub(crate) interval_ms: Option<u64>,

    /// Simulated milliseconds per tick
    #[arg(long, value_name = "MS", default_value_t = 100)]
    pub(crate) step_ms: u64,
}

/// Profiles selectable on the command line.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub(crate) enum ProfileArg {
    /// Neutral weighting
    Balanced,
    /// Builds outward and spends eagerly
    Aggressive,
    /// Hugs the goal
    Defensive,
    /// Prefers upgrades
    Economic,
}

impl From<ProfileArg> for Profile {
    fn from(value: ProfileArg) -> Self {
        match value {
            ProfileArg::Balanced => Profile::Balanced,
            ProfileArg::Aggressive => Profile::Aggressive,
            ProfileArg::Defensive => Profile::Defensive,
            ProfileArg::Economic => Profile::Economic,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{Cli, ProfileArg};
    use clap::{CommandFactory, Parser};

    #[test]
    fn arguments_are_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn flags_override_defaults() {
        let cli = Cli::parse_from([
            "rampart",
            "--profile",
            "defensive",
            "--seed",
            "9",
            "--waves",
            "2",
            "--interval-ms",
            "250",
        ]);
        assert_eq!(cli.profile, Some(ProfileArg::Defensive));
        assert_eq!(cli.seed, 9);
        assert_eq!(cli.waves, 2);
        assert_eq!(cli.ticks, 1_200);
        assert_eq!(cli.interval_ms, Some(250));
        assert!(cli.config.is_none());
    }
}
