#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Authoritative sandbox battlefield for the Rampart decision engine.
//!
//! The world owns hostiles, defenses, resources and goal health. It is
//! mutated exclusively through [`apply`], which consumes one [`Command`] and
//! reports what happened as [`Event`]s. Read access goes through [`query`],
//! which also freezes the state into the snapshot the engine consumes.

mod placements;
mod rules;
mod waves;

pub use rules::{RulesConfig, StandardRules};
pub use waves::{WaveSpawner, WaveTuning};

use std::time::Duration;

use rampart_core::{
    ActionKind, ActionParams, Bounds, CandidateAction, ConfigError, FactionId, HostileId,
    HostileSnapshot, LegalityAuthority, MovementBehavior, Obstacle, PlacementId, Rank, Rejection,
    SessionState, Vec2, WavePhase,
};
use rampart_system_navigation::{FlowOptions, Grid, Navigator};
use serde::{Deserialize, Serialize};

use crate::placements::PlacementRegistry;

/// Lateral swing of weaving hostiles relative to their heading.
const WEAVE_AMPLITUDE: f32 = 0.8;
/// Angular frequency of the weave in radians per second.
const WEAVE_FREQUENCY: f32 = 2.5;
/// Share of the heading kept by orbiting hostiles; the rest circles the goal.
const ORBIT_CLOSING: f32 = 0.35;
/// Lateral offset of swarming hostiles.
const SWARM_SPREAD: f32 = 0.3;

/// Layout and economy of the sandbox battlefield.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorldConfig {
    /// Width of the play area in world units.
    pub width: f32,
    /// Height of the play area in world units.
    pub height: f32,
    /// Side length of a navigation cell.
    pub cell_size: f32,
    /// Point the hostiles converge on.
    pub goal: Vec2,
    /// Hit points of the goal.
    pub goal_health: f32,
    /// Resources available before the first wave.
    pub starting_resources: u32,
    /// Resources granted per defeated regular hostile.
    pub bounty: u32,
    /// Distance from the goal at which a hostile strikes it.
    pub arrival_radius: f32,
    /// Goal hit points removed by an arriving regular hostile.
    pub arrival_damage: f32,
    /// Obstacles stamped onto the field before play starts.
    pub obstacles: Vec<Obstacle>,
    /// Pricing and construction rules.
    pub rules: RulesConfig,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            width: 40.0,
            height: 40.0,
            cell_size: 1.0,
            goal: Vec2::new(20.0, 20.0),
            goal_health: 100.0,
            starting_resources: 300,
            bounty: 15,
            arrival_radius: 0.75,
            arrival_damage: 10.0,
            obstacles: Vec::new(),
            rules: RulesConfig::default(),
        }
    }
}

impl WorldConfig {
    /// Play area spanned by the configuration.
    #[must_use]
    pub fn bounds(&self) -> Bounds {
        Bounds::from_size(self.width, self.height)
    }

    /// Validates the configuration, reporting the first violation.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let bounds = self.bounds();
        if !bounds.is_valid() {
            return Err(ConfigError::EmptyBounds);
        }
        if !bounds.contains(self.goal) {
            return Err(ConfigError::OutOfRange {
                field: "goal.x",
                value: self.goal.x,
                min: 0.0,
                max: self.width,
            });
        }
        for (field, value) in [
            ("goal_health", self.goal_health),
            ("arrival_damage", self.arrival_damage),
        ] {
            if !(value.is_finite() && value > 0.0) {
                return Err(ConfigError::OutOfRange {
                    field,
                    value,
                    min: f32::MIN_POSITIVE,
                    max: f32::MAX,
                });
            }
        }
        if !(self.arrival_radius.is_finite() && self.arrival_radius > 0.0) {
            return Err(ConfigError::InvalidRadius(self.arrival_radius));
        }
        self.rules.validate()
    }
}

/// Hostile to be added to the battlefield.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct HostileSpawn {
    /// Entry position.
    pub position: Vec2,
    /// Travel speed in world units per second.
    pub speed: f32,
    /// Hit points.
    pub health: f32,
    /// Movement pattern.
    pub behavior: MovementBehavior,
    /// Faction the hostile belongs to.
    pub faction: FactionId,
    /// Regular, elite or boss rank.
    pub rank: Rank,
}

/// Requests that mutate the world.
#[derive(Clone, Debug, PartialEq)]
pub enum Command {
    /// Advances the wave counter and opens the next wave.
    StartWave,
    /// Adds a hostile to the battlefield.
    SpawnHostile {
        /// Description of the hostile.
        spawn: HostileSpawn,
    },
    /// Advances the simulation clock.
    Tick {
        /// Simulated time that elapsed.
        dt: Duration,
    },
    /// Re-validates and applies an action chosen by the engine.
    Execute {
        /// Action to apply.
        action: CandidateAction,
    },
    /// Pauses, resumes or ends the session.
    SetSession {
        /// Requested session state.
        state: SessionState,
    },
}

/// Observable outcomes of applying a [`Command`].
#[derive(Clone, Debug, PartialEq)]
pub enum Event {
    /// Simulation time advanced.
    TimeAdvanced {
        /// Simulated time that elapsed.
        dt: Duration,
    },
    /// A new wave opened.
    WaveStarted {
        /// One-based wave counter.
        wave: u32,
    },
    /// Every hostile of the wave was defeated or arrived.
    WaveCleared {
        /// One-based wave counter.
        wave: u32,
    },
    /// A hostile entered the battlefield.
    HostileSpawned {
        /// Identifier of the new hostile.
        hostile: HostileId,
    },
    /// A hostile ran out of hit points.
    HostileDefeated {
        /// Identifier of the defeated hostile.
        hostile: HostileId,
        /// Resources granted.
        bounty: u32,
    },
    /// A hostile reached the goal.
    GoalDamaged {
        /// Identifier of the hostile, now removed.
        hostile: HostileId,
        /// Hit points removed from the goal.
        damage: f32,
        /// Goal hit points left.
        remaining: f32,
    },
    /// A defense was constructed.
    PlacementBuilt {
        /// Identifier of the new defense.
        placement: PlacementId,
        /// Position of the new defense.
        position: Vec2,
        /// Resources spent.
        cost: u32,
    },
    /// A defense gained a level.
    PlacementUpgraded {
        /// Identifier of the defense.
        placement: PlacementId,
        /// Level after the upgrade.
        level: u8,
        /// Resources spent.
        cost: u32,
    },
    /// A defense was sold.
    PlacementLiquidated {
        /// Identifier of the removed defense.
        placement: PlacementId,
        /// Resources returned.
        refund: u32,
    },
    /// An action failed re-validation and was not applied.
    ActionRejected {
        /// Kind of the refused action.
        kind: ActionKind,
        /// Reason reported by the rules.
        rejection: Rejection,
    },
    /// The session changed state.
    SessionChanged {
        /// New session state.
        state: SessionState,
    },
}

/// Represents the authoritative Rampart sandbox state.
#[derive(Debug)]
pub struct World {
    config: WorldConfig,
    rules: StandardRules,
    navigator: Navigator,
    hostiles: Vec<Hostile>,
    placements: PlacementRegistry,
    next_hostile_id: HostileId,
    resources: u32,
    goal_health: f32,
    wave: u32,
    phase: WavePhase,
    session: SessionState,
    elapsed: Duration,
}

impl World {
    /// Creates a world ready for the first wave.
    pub fn new(config: WorldConfig) -> Result<Self, ConfigError> {
        config.validate()?;

        let bounds = config.bounds();
        let mut grid = Grid::new(bounds, config.cell_size)?;
        for obstacle in &config.obstacles {
            let _ = grid.apply_obstacle(obstacle);
        }
        let mut navigator = Navigator::new(grid, config.goal, FlowOptions::default());
        let _ = navigator.refresh();

        let rules = StandardRules::new(
            config.rules.clone(),
            bounds,
            config.goal,
            config.obstacles.clone(),
        );

        Ok(Self {
            rules,
            navigator,
            hostiles: Vec::new(),
            placements: PlacementRegistry::new(),
            next_hostile_id: HostileId::new(0),
            resources: config.starting_resources,
            goal_health: config.goal_health,
            wave: 0,
            phase: WavePhase::Preparing,
            session: SessionState::Running,
            elapsed: Duration::ZERO,
            config,
        })
    }

    fn set_session(&mut self, state: SessionState, out_events: &mut Vec<Event>) {
        if self.session != state {
            self.session = state;
            out_events.push(Event::SessionChanged { state });
        }
    }

    fn advance(&mut self, dt: Duration, out_events: &mut Vec<Event>) {
        self.elapsed = self.elapsed.saturating_add(dt);
        out_events.push(Event::TimeAdvanced { dt });

        let seconds = dt.as_secs_f32();
        let goal = self.config.goal;
        let bounds = self.config.bounds();
        for hostile in &mut self.hostiles {
            hostile.steer(&self.navigator, goal, bounds, seconds);
        }

        self.resolve_arrivals(out_events);
        self.resolve_fire(seconds, out_events);

        if self.phase == WavePhase::Active && self.hostiles.is_empty() {
            self.phase = WavePhase::Preparing;
            out_events.push(Event::WaveCleared { wave: self.wave });
        }
        if self.goal_health <= 0.0 {
            self.set_session(SessionState::Ended, out_events);
        }
    }

    fn resolve_arrivals(&mut self, out_events: &mut Vec<Event>) {
        let goal = self.config.goal;
        let radius = self.config.arrival_radius;
        let damage = self.config.arrival_damage;
        let mut remaining = self.goal_health;

        self.hostiles.retain(|hostile| {
            if hostile.position.distance(goal) > radius {
                return true;
            }
            let dealt = damage * rank_factor(hostile.rank);
            remaining = (remaining - dealt).max(0.0);
            out_events.push(Event::GoalDamaged {
                hostile: hostile.id,
                damage: dealt,
                remaining,
            });
            false
        });
        self.goal_health = remaining;
    }

    fn resolve_fire(&mut self, seconds: f32, out_events: &mut Vec<Event>) {
        if self.hostiles.is_empty() {
            return;
        }

        let goal = self.config.goal;
        let mut damage = vec![0.0_f32; self.hostiles.len()];
        for placement in self.placements.iter() {
            let defense = placement.snapshot(self.rules.config());
            let target = self
                .hostiles
                .iter()
                .enumerate()
                .filter(|(_, hostile)| hostile.position.distance(defense.position) <= defense.range)
                .min_by(|(_, a), (_, b)| {
                    a.position
                        .distance(goal)
                        .total_cmp(&b.position.distance(goal))
                        .then_with(|| a.id.cmp(&b.id))
                });
            if let Some((index, _)) = target {
                damage[index] += defense.damage_per_second * seconds;
            }
        }

        for (hostile, dealt) in self.hostiles.iter_mut().zip(&damage) {
            hostile.health -= dealt;
        }

        let bounty = self.config.bounty;
        let mut earned = 0_u32;
        self.hostiles.retain(|hostile| {
            if hostile.health > 0.0 {
                return true;
            }
            let reward = (bounty as f32 * rank_factor(hostile.rank)) as u32;
            earned = earned.saturating_add(reward);
            out_events.push(Event::HostileDefeated {
                hostile: hostile.id,
                bounty: reward,
            });
            false
        });
        self.resources = self.resources.saturating_add(earned);
    }

    fn execute(&mut self, action: CandidateAction, out_events: &mut Vec<Event>) {
        let snapshot = query::snapshot(self);
        if let Err(rejection) = self.rules.validate(&action, &snapshot) {
            tracing::debug!(kind = ?action.kind(), %rejection, "action rejected by the world");
            out_events.push(Event::ActionRejected {
                kind: action.kind(),
                rejection,
            });
            return;
        }

        match action.params {
            ActionParams::Place { position } => {
                let cost = self.rules.placement_cost(&snapshot);
                self.resources = self.resources.saturating_sub(cost);
                let placement = self.placements.insert(position);
                out_events.push(Event::PlacementBuilt {
                    placement,
                    position,
                    cost,
                });
            }
            ActionParams::Upgrade { placement } => {
                let cost = snapshot
                    .placements
                    .get(placement)
                    .and_then(|current| self.rules.upgrade_cost(current));
                if let (Some(cost), Some(state)) = (cost, self.placements.get_mut(placement)) {
                    self.resources = self.resources.saturating_sub(cost);
                    state.level = state.level.saturating_add(1);
                    out_events.push(Event::PlacementUpgraded {
                        placement,
                        level: state.level,
                        cost,
                    });
                }
            }
            ActionParams::Liquidate { placement } => {
                let refund = snapshot
                    .placements
                    .get(placement)
                    .map_or(0, |current| self.rules.liquidation_refund(current));
                if self.placements.remove(placement).is_some() {
                    self.resources = self.resources.saturating_add(refund);
                    out_events.push(Event::PlacementLiquidated { placement, refund });
                }
            }
        }
    }
}

/// Applies the provided command to the world, mutating state deterministically.
pub fn apply(world: &mut World, command: Command, out_events: &mut Vec<Event>) {
    match command {
        Command::StartWave => {
            world.wave = world.wave.saturating_add(1);
            world.phase = WavePhase::Active;
            out_events.push(Event::WaveStarted { wave: world.wave });
        }
        Command::SpawnHostile { spawn } => {
            let id = world.next_hostile_id;
            world.next_hostile_id = HostileId::new(id.get().saturating_add(1));
            world.hostiles.push(Hostile::from_spawn(id, spawn));
            out_events.push(Event::HostileSpawned { hostile: id });
        }
        Command::Tick { dt } => {
            if world.session == SessionState::Running {
                world.advance(dt, out_events);
            }
        }
        Command::Execute { action } => world.execute(action, out_events),
        Command::SetSession { state } => world.set_session(state, out_events),
    }
}

/// Query functions that provide read-only access to the world state.
pub mod query {
    use std::time::Duration;

    use super::{StandardRules, World, WorldConfig};
    use rampart_core::{
        BattlefieldSnapshot, HostileSnapshot, HostileView, Obstacle, PlacementSnapshot,
        PlacementView, SessionState, Vec2, WavePhase,
    };

    /// Freezes the state into the snapshot consumed by the decision engine.
    #[must_use]
    pub fn snapshot(world: &World) -> BattlefieldSnapshot {
        BattlefieldSnapshot {
            hostiles: hostile_view(world),
            placements: placement_view(world),
            resources: world.resources,
            goal_health: goal_health(world),
            wave: world.wave.max(1),
            phase: world.phase,
            session: world.session,
        }
    }

    /// Captures a read-only view of the hostiles on the battlefield.
    #[must_use]
    pub fn hostile_view(world: &World) -> HostileView {
        let snapshots: Vec<HostileSnapshot> =
            world.hostiles.iter().map(|hostile| hostile.snapshot()).collect();
        HostileView::from_snapshots(snapshots)
    }

    /// Captures a read-only view of the standing defenses.
    #[must_use]
    pub fn placement_view(world: &World) -> PlacementView {
        let snapshots: Vec<PlacementSnapshot> = world
            .placements
            .iter()
            .map(|placement| placement.snapshot(world.rules.config()))
            .collect();
        PlacementView::from_snapshots(snapshots)
    }

    /// Configuration the world was built from.
    #[must_use]
    pub fn config(world: &World) -> &WorldConfig {
        &world.config
    }

    /// Reference legality authority guarding the world.
    #[must_use]
    pub fn rules(world: &World) -> &StandardRules {
        &world.rules
    }

    /// Point the hostiles converge on.
    #[must_use]
    pub fn goal(world: &World) -> Vec2 {
        world.config.goal
    }

    /// Remaining goal health as a fraction in `[0, 1]`.
    #[must_use]
    pub fn goal_health(world: &World) -> f32 {
        (world.goal_health / world.config.goal_health).clamp(0.0, 1.0)
    }

    /// Current resource balance.
    #[must_use]
    pub fn resources(world: &World) -> u32 {
        world.resources
    }

    /// Wave counter; zero before the first wave.
    #[must_use]
    pub fn wave(world: &World) -> u32 {
        world.wave
    }

    /// Lifecycle phase of the current wave.
    #[must_use]
    pub fn phase(world: &World) -> WavePhase {
        world.phase
    }

    /// Session state.
    #[must_use]
    pub fn session(world: &World) -> SessionState {
        world.session
    }

    /// Simulated time since the world was created; paused ticks do not count.
    #[must_use]
    pub fn elapsed(world: &World) -> Duration {
        world.elapsed
    }

    /// Obstacles stamped onto the field.
    #[must_use]
    pub fn obstacles(world: &World) -> &[Obstacle] {
        &world.config.obstacles
    }
}

#[derive(Clone, Debug)]
struct Hostile {
    id: HostileId,
    position: Vec2,
    velocity: Vec2,
    speed: f32,
    health: f32,
    max_health: f32,
    behavior: MovementBehavior,
    faction: FactionId,
    rank: Rank,
    age: f32,
}

impl Hostile {
    fn from_spawn(id: HostileId, spawn: HostileSpawn) -> Self {
        let health = spawn.health.max(f32::MIN_POSITIVE);
        Self {
            id,
            position: spawn.position,
            velocity: Vec2::ZERO,
            speed: spawn.speed.max(0.0),
            health,
            max_health: health,
            behavior: spawn.behavior,
            faction: spawn.faction,
            rank: spawn.rank,
            age: 0.0,
        }
    }

    fn snapshot(&self) -> HostileSnapshot {
        HostileSnapshot {
            id: self.id,
            position: self.position,
            velocity: self.velocity,
            health: (self.health / self.max_health).clamp(0.0, 1.0),
            behavior: self.behavior,
            faction: self.faction,
            rank: self.rank,
        }
    }

    fn steer(&mut self, navigator: &Navigator, goal: Vec2, bounds: Bounds, dt: f32) {
        self.age += dt;
        let to_goal = goal - self.position;
        let direct = to_goal.normalize_or_zero();
        let guided = navigator.direction_at(self.position);
        let heading = if guided == Vec2::ZERO { direct } else { guided };
        let side = heading.perp();

        let desired = match self.behavior {
            MovementBehavior::Direct => heading,
            MovementBehavior::Hunter => direct,
            MovementBehavior::Weaving => {
                heading + side * (WEAVE_AMPLITUDE * (WEAVE_FREQUENCY * self.age).sin())
            }
            MovementBehavior::Orbiting => heading * ORBIT_CLOSING + side,
            MovementBehavior::Swarming => {
                let lane = if self.id.get() % 2 == 0 { 1.0 } else { -1.0 };
                heading + side * (SWARM_SPREAD * lane)
            }
        };

        self.velocity = desired.normalize_or_zero() * self.speed;
        let step = self.velocity * dt;
        self.position = if step.length() >= to_goal.length() {
            goal
        } else {
            bounds.clamp(self.position + step)
        };
    }
}

fn rank_factor(rank: Rank) -> f32 {
    match rank {
        Rank::Regular => 1.0,
        Rank::Elite => 2.0,
        Rank::Boss => 5.0,
    }
}
