//! Drives the decision engine and the sandbox world wave by wave.

use std::{fmt, time::Duration};

use anyhow::{Context, Result};
use rampart_core::SessionState;
use rampart_system_navigation::Grid;
use rampart_system_planner::DecisionEngine;
use rampart_world::{apply, query, Command, Event, WaveSpawner, World};

use crate::{args::Cli, settings::Settings};

/// Length and seeding of a session.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct RunOptions {
    pub(crate) seed: u64,
    pub(crate) waves: u32,
    pub(crate) ticks_per_wave: u32,
    pub(crate) step: Duration,
}

impl From<&Cli> for RunOptions {
    fn from(cli: &Cli) -> Self {
        Self {
            seed: cli.seed,
            waves: cli.waves,
            ticks_per_wave: cli.ticks,
            step: Duration::from_millis(cli.step_ms.max(1)),
        }
    }
}

/// How the session ended.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub(crate) enum Outcome {
    #[default]
    Held,
    Overrun,
}

/// Tallies of the events a session produced.
#[derive(Clone, Debug, Default, PartialEq)]
pub(crate) struct Summary {
    pub(crate) waves_played: u32,
    pub(crate) waves_cleared: u32,
    pub(crate) built: u32,
    pub(crate) upgraded: u32,
    pub(crate) liquidated: u32,
    pub(crate) rejected: u32,
    pub(crate) defeated: u32,
    pub(crate) arrived: u32,
    pub(crate) resources: u32,
    pub(crate) goal_health: f32,
    pub(crate) outcome: Outcome,
}

impl Summary {
    fn record(&mut self, event: &Event) {
        match event {
            Event::WaveCleared { .. } => self.waves_cleared += 1,
            Event::PlacementBuilt { .. } => self.built += 1,
            Event::PlacementUpgraded { .. } => self.upgraded += 1,
            Event::PlacementLiquidated { .. } => self.liquidated += 1,
            Event::ActionRejected { .. } => self.rejected += 1,
            Event::HostileDefeated { .. } => self.defeated += 1,
            Event::GoalDamaged { .. } => self.arrived += 1,
            _ => {}
        }
    }
}

impl fmt::Display for Summary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let outcome = match self.outcome {
            Outcome::Held => "goal held",
            Outcome::Overrun => "goal destroyed",
        };
        writeln!(f, "outcome: {outcome}")?;
        writeln!(
            f,
            "waves: {} played, {} cleared",
            self.waves_played, self.waves_cleared
        )?;
        writeln!(
            f,
            "defenses: {} built, {} upgraded, {} liquidated, {} rejected",
            self.built, self.upgraded, self.liquidated, self.rejected
        )?;
        writeln!(
            f,
            "hostiles: {} defeated, {} reached the goal",
            self.defeated, self.arrived
        )?;
        write!(
            f,
            "goal health: {:.0}%, resources: {}",
            self.goal_health * 100.0,
            self.resources
        )
    }
}

/// Plays up to `options.waves` waves, stopping early when the goal falls.
pub(crate) fn run(settings: &Settings, options: &RunOptions) -> Result<Summary> {
    let mut world = World::new(settings.world.clone()).context("failed to build the world")?;
    let bounds = settings.world.bounds();
    let grid = Grid::new(bounds, settings.world.cell_size).context("failed to build the grid")?;
    let mut engine = DecisionEngine::new(
        settings.planner.clone(),
        grid,
        settings.world.goal,
        query::rules(&world).clone(),
    )
    .context("failed to build the decision engine")?;
    for obstacle in query::obstacles(&world) {
        engine.apply_obstacle(obstacle);
    }
    let mut spawner = WaveSpawner::new(options.seed, bounds, settings.waves.clone());

    let mut summary = Summary::default();
    let mut events = Vec::new();
    for wave in 1..=options.waves {
        apply(&mut world, Command::StartWave, &mut events);
        let spawns = spawner.compose(wave);
        tracing::info!(wave, hostiles = spawns.len(), "wave started");
        for spawn in spawns {
            apply(&mut world, Command::SpawnHostile { spawn }, &mut events);
        }
        summary.waves_played = wave;

        for _ in 0..options.ticks_per_wave {
            let snapshot = query::snapshot(&world);
            if let Some(action) = engine.tick(query::elapsed(&world), &snapshot) {
                tracing::info!(
                    kind = ?action.kind(),
                    bucket = ?action.bucket,
                    reason = ?action.reason,
                    cost = action.cost,
                    priority = action.priority,
                    "executing decision"
                );
                apply(&mut world, Command::Execute { action }, &mut events);
            }
            apply(&mut world, Command::Tick { dt: options.step }, &mut events);

            let mut cleared = false;
            for event in events.drain(..) {
                summary.record(&event);
                match event {
                    Event::ActionRejected { kind, rejection } => {
                        tracing::warn!(?kind, %rejection, "world refused a decision");
                        engine.acknowledge_rejection(rejection);
                    }
                    Event::WaveCleared { wave } => {
                        tracing::info!(wave, resources = query::resources(&world), "wave cleared");
                        cleared = true;
                    }
                    _ => {}
                }
            }
            if cleared || query::session(&world) == SessionState::Ended {
                break;
            }
        }

        if query::session(&world) == SessionState::Ended {
            tracing::warn!(wave, "goal destroyed");
            summary.outcome = Outcome::Overrun;
            break;
        }
    }

    summary.resources = query::resources(&world);
    summary.goal_health = query::snapshot(&world).goal_health;
    Ok(summary)
}
