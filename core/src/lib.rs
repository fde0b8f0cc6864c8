#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Core contracts shared across the Rampart decision engine.
//!
//! This crate defines the vocabulary that connects the external simulation,
//! the pure analysis systems, and the planner. The simulation hands the
//! planner a frozen [`BattlefieldSnapshot`] once per decision interval, the
//! systems derive fields and rankings from it without mutating anything, and
//! the planner answers with at most one [`CandidateAction`]. Legality and
//! pricing are owned by an external [`LegalityAuthority`] that both the
//! planner and the executor consult.

mod config;

pub use config::{
    BucketBias, CurveTuning, FactionMultiplier, InertiaTuning, InterceptionTuning, PlannerConfig,
    Profile, ThreatTuning,
};
pub use glam::Vec2;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Traversal cost marking a cell that can never be entered.
pub const IMPASSABLE: u8 = u8::MAX;

/// Traversal cost assigned to open ground.
pub const OPEN_GROUND: u8 = 1;

/// Axis-aligned play area expressed in world units.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    min: Vec2,
    max: Vec2,
}

impl Bounds {
    /// Creates bounds spanning the two provided corners.
    ///
    /// The corners may be supplied in any order; the stored rectangle is
    /// always normalised so that `min <= max` component-wise.
    #[must_use]
    pub fn new(a: Vec2, b: Vec2) -> Self {
        Self {
            min: a.min(b),
            max: a.max(b),
        }
    }

    /// Creates bounds anchored at the origin with the provided extent.
    #[must_use]
    pub fn from_size(width: f32, height: f32) -> Self {
        Self::new(Vec2::ZERO, Vec2::new(width, height))
    }

    /// Lower-left corner of the play area.
    #[must_use]
    pub const fn min(&self) -> Vec2 {
        self.min
    }

    /// Upper-right corner of the play area.
    #[must_use]
    pub const fn max(&self) -> Vec2 {
        self.max
    }

    /// Horizontal extent measured in world units.
    #[must_use]
    pub fn width(&self) -> f32 {
        self.max.x - self.min.x
    }

    /// Vertical extent measured in world units.
    #[must_use]
    pub fn height(&self) -> f32 {
        self.max.y - self.min.y
    }

    /// Geometric centre of the play area.
    #[must_use]
    pub fn center(&self) -> Vec2 {
        (self.min + self.max) * 0.5
    }

    /// Reports whether the rectangle encloses a non-zero, finite area.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.min.is_finite() && self.max.is_finite() && self.width() > 0.0 && self.height() > 0.0
    }

    /// Reports whether the point lies inside the play area (edges inclusive).
    #[must_use]
    pub fn contains(&self, point: Vec2) -> bool {
        point.x >= self.min.x
            && point.y >= self.min.y
            && point.x <= self.max.x
            && point.y <= self.max.y
    }

    /// Clamps the point into the play area.
    #[must_use]
    pub fn clamp(&self, point: Vec2) -> Vec2 {
        point.clamp(self.min, self.max)
    }
}

/// Location of a single grid cell expressed as column and row coordinates.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CellCoord {
    column: u32,
    row: u32,
}

impl CellCoord {
    /// Creates a new grid cell coordinate.
    #[must_use]
    pub const fn new(column: u32, row: u32) -> Self {
        Self { column, row }
    }

    /// Zero-based column index of the cell.
    #[must_use]
    pub const fn column(&self) -> u32 {
        self.column
    }

    /// Zero-based row index of the cell.
    #[must_use]
    pub const fn row(&self) -> u32 {
        self.row
    }

    /// Computes the Manhattan distance between two cell coordinates.
    #[must_use]
    pub fn manhattan_distance(self, other: CellCoord) -> u32 {
        self.column().abs_diff(other.column()) + self.row().abs_diff(other.row())
    }

    /// Computes the Chebyshev (king-move) distance between two cells.
    #[must_use]
    pub fn chebyshev_distance(self, other: CellCoord) -> u32 {
        self.column()
            .abs_diff(other.column())
            .max(self.row().abs_diff(other.row()))
    }
}

/// Unique identifier assigned to a hostile unit by the simulation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct HostileId(u32);

impl HostileId {
    /// Creates a new hostile identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Unique identifier assigned to a placed defense by the simulation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PlacementId(u32);

impl PlacementId {
    /// Creates a new placement identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Opaque faction identifier used to look up threat multipliers.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct FactionId(u16);

impl FactionId {
    /// Creates a new faction identifier.
    #[must_use]
    pub const fn new(value: u16) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u16 {
        self.0
    }
}

/// Movement pattern a hostile follows, used to extrapolate its trajectory.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MovementBehavior {
    /// Travels along its current velocity without deviation.
    #[default]
    Direct,
    /// Zig-zags around its heading, trading forward progress for evasion.
    Weaving,
    /// Circles the goal while slowly tightening its radius.
    Orbiting,
    /// Drifts with its pack, partially steering toward the goal.
    Swarming,
    /// Ignores its current heading and charges the goal.
    Hunter,
}

/// Rank of a hostile unit.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Rank {
    /// Ordinary wave fodder.
    #[default]
    Regular,
    /// Reinforced unit with a threat premium.
    Elite,
    /// Wave boss.
    Boss,
}

/// Immutable per-tick projection of a single hostile.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct HostileSnapshot {
    /// Identifier assigned by the simulation.
    pub id: HostileId,
    /// Current position in world units.
    pub position: Vec2,
    /// Current velocity in world units per second.
    pub velocity: Vec2,
    /// Remaining health as a fraction of maximum health, in `[0, 1]`.
    pub health: f32,
    /// Movement pattern used for trajectory prediction.
    pub behavior: MovementBehavior,
    /// Faction the hostile belongs to.
    pub faction: FactionId,
    /// Regular, elite or boss rank.
    pub rank: Rank,
}

impl HostileSnapshot {
    /// Scalar speed in world units per second.
    #[must_use]
    pub fn speed(&self) -> f32 {
        self.velocity.length()
    }
}

/// Read-only snapshot of every live hostile, ordered by identifier.
#[derive(Clone, Debug, Default)]
pub struct HostileView {
    snapshots: Vec<HostileSnapshot>,
}

impl HostileView {
    /// Creates a new hostile view from the provided snapshots.
    #[must_use]
    pub fn from_snapshots(mut snapshots: Vec<HostileSnapshot>) -> Self {
        snapshots.sort_by_key(|snapshot| snapshot.id);
        Self { snapshots }
    }

    /// Iterator over the captured snapshots in deterministic order.
    pub fn iter(&self) -> impl Iterator<Item = &HostileSnapshot> {
        self.snapshots.iter()
    }

    /// Number of hostiles captured by the view.
    #[must_use]
    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    /// Reports whether the view contains no hostiles.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }
}

/// Immutable per-tick projection of a placed defense.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PlacementSnapshot {
    /// Identifier assigned by the simulation.
    pub id: PlacementId,
    /// Centre of the defense in world units.
    pub position: Vec2,
    /// Engagement radius in world units.
    pub range: f32,
    /// Sustained damage output per second.
    pub damage_per_second: f32,
    /// Current upgrade level, starting at zero.
    pub level: u8,
}

/// Read-only snapshot of every placed defense, ordered by identifier.
#[derive(Clone, Debug, Default)]
pub struct PlacementView {
    snapshots: Vec<PlacementSnapshot>,
}

impl PlacementView {
    /// Creates a new placement view from the provided snapshots.
    #[must_use]
    pub fn from_snapshots(mut snapshots: Vec<PlacementSnapshot>) -> Self {
        snapshots.sort_by_key(|snapshot| snapshot.id);
        Self { snapshots }
    }

    /// Iterator over the captured snapshots in deterministic order.
    pub fn iter(&self) -> impl Iterator<Item = &PlacementSnapshot> {
        self.snapshots.iter()
    }

    /// Looks up a placement by identifier.
    #[must_use]
    pub fn get(&self, id: PlacementId) -> Option<&PlacementSnapshot> {
        self.snapshots
            .binary_search_by_key(&id, |snapshot| snapshot.id)
            .ok()
            .map(|index| &self.snapshots[index])
    }

    /// Number of placements captured by the view.
    #[must_use]
    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    /// Reports whether the view contains no placements.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }
}

/// Threat assessment derived from a single [`HostileSnapshot`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ThreatVector {
    /// Hostile the assessment belongs to.
    pub hostile: HostileId,
    /// Position at the time of the snapshot.
    pub position: Vec2,
    /// Velocity at the time of the snapshot.
    pub velocity: Vec2,
    /// Position extrapolated to the prediction horizon.
    pub predicted_position: Vec2,
    /// Straight-line distance to the goal.
    pub distance_to_goal: f32,
    /// Composite threat score; larger is more dangerous.
    pub score: f32,
    /// Seconds until the hostile reaches the goal, when it is closing in.
    pub impact_time: Option<f32>,
}

/// Candidate placement location proposed by the interception search.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct InterceptionPoint {
    /// Proposed centre of the placement.
    pub position: Vec2,
    /// Composite score; larger is better.
    pub score: f32,
    /// Estimated seconds a passing hostile stays within range.
    pub dwell_time: f32,
    /// Number of predicted trajectories passing within range.
    pub intercepted_paths: u32,
    /// `|flow · radial|`; one when the local flow crosses the defensive ring head-on.
    pub perpendicularity: f32,
}

/// Discriminant of a [`CandidateAction`], used for inertia bookkeeping.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub enum ActionKind {
    /// Construct a new defense.
    Place,
    /// Upgrade an existing defense.
    Upgrade,
    /// Sell an existing defense for resources.
    Liquidate,
}

/// Kind-specific parameters of an action.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub enum ActionParams {
    /// Construct a defense centred at `position`.
    Place {
        /// Requested centre of the new defense.
        position: Vec2,
    },
    /// Upgrade the referenced defense by one level.
    Upgrade {
        /// Defense to upgrade.
        placement: PlacementId,
    },
    /// Sell the referenced defense.
    Liquidate {
        /// Defense to sell.
        placement: PlacementId,
    },
}

impl ActionParams {
    /// Discriminant of the parameters.
    #[must_use]
    pub const fn kind(&self) -> ActionKind {
        match self {
            Self::Place { .. } => ActionKind::Place,
            Self::Upgrade { .. } => ActionKind::Upgrade,
            Self::Liquidate { .. } => ActionKind::Liquidate,
        }
    }
}

/// Priority category that gates fine-grained action scoring.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub enum Bucket {
    /// Keep the goal alive at any cost.
    Survival,
    /// Hold the approaches close to the goal.
    Defense,
    /// Grow the value of what is already built.
    Economy,
    /// Claim ground far from the goal.
    Expansion,
}

impl Bucket {
    /// Every bucket in precedence order; earlier buckets win weight ties.
    pub const ALL: [Bucket; 4] = [
        Bucket::Survival,
        Bucket::Defense,
        Bucket::Economy,
        Bucket::Expansion,
    ];

    /// Position of the bucket inside [`Bucket::ALL`].
    #[must_use]
    pub const fn index(self) -> usize {
        match self {
            Self::Survival => 0,
            Self::Defense => 1,
            Self::Economy => 2,
            Self::Expansion => 3,
        }
    }
}

/// Origin of a candidate, recorded for diagnostics and logging.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ActionReason {
    /// Placement proposed by the interception search.
    Interception,
    /// Placement at a high-traffic choke point before threats appear.
    ChokePoint,
    /// Placement filling the weakest coverage sector.
    WeakestSector,
    /// Upgrade of a defense with high exposure.
    Reinforce,
    /// Liquidation to fund an emergency placement.
    EmergencyFunds,
}

/// Fully-specified action proposed by the planner.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct CandidateAction {
    /// Kind-specific parameters.
    pub params: ActionParams,
    /// Utility used to rank candidates inside their bucket.
    pub priority: f32,
    /// Resources spent when the action executes; zero for liquidations.
    pub cost: u32,
    /// Estimated defensive value gained by the action.
    pub expected_value: f32,
    /// Bucket the candidate was classified into.
    pub bucket: Bucket,
    /// Why the candidate was generated.
    pub reason: ActionReason,
}

impl CandidateAction {
    /// Discriminant of the action parameters.
    #[must_use]
    pub const fn kind(&self) -> ActionKind {
        self.params.kind()
    }
}

/// Whether the external session is accepting decisions.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SessionState {
    /// Simulation is running and planning is allowed.
    #[default]
    Running,
    /// Simulation is paused; no planning happens.
    Paused,
    /// Session has ended; no planning happens.
    Ended,
}

/// Coarse wave lifecycle phase reported by the simulation.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WavePhase {
    /// Between waves; nothing is attacking yet.
    #[default]
    Preparing,
    /// A wave is in progress.
    Active,
}

/// Frozen battlefield state handed to the planner once per decision interval.
#[derive(Clone, Debug)]
pub struct BattlefieldSnapshot {
    /// Live hostiles.
    pub hostiles: HostileView,
    /// Placed defenses.
    pub placements: PlacementView,
    /// Current resource balance.
    pub resources: u32,
    /// Remaining goal health as a fraction in `[0, 1]`.
    pub goal_health: f32,
    /// One-based wave counter.
    pub wave: u32,
    /// Lifecycle phase of the current wave.
    pub phase: WavePhase,
    /// Whether the session accepts decisions.
    pub session: SessionState,
}

impl Default for BattlefieldSnapshot {
    fn default() -> Self {
        Self {
            hostiles: HostileView::default(),
            placements: PlacementView::default(),
            resources: 0,
            goal_health: 1.0,
            wave: 1,
            phase: WavePhase::Preparing,
            session: SessionState::Running,
        }
    }
}

impl BattlefieldSnapshot {
    /// Reports whether the planner may act on this snapshot.
    #[must_use]
    pub fn accepts_decisions(&self) -> bool {
        self.session == SessionState::Running
    }
}

/// Circular region stamped onto the navigation grid with a traversal cost.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Obstacle {
    /// Centre of the obstacle in world units.
    pub center: Vec2,
    /// Radius of the obstacle in world units.
    pub radius: f32,
    /// Cost applied to covered cells; [`IMPASSABLE`] blocks them.
    pub cost: u8,
}

impl Obstacle {
    /// Creates an obstacle that blocks every covered cell.
    #[must_use]
    pub const fn blocking(center: Vec2, radius: f32) -> Self {
        Self {
            center,
            radius,
            cost: IMPASSABLE,
        }
    }
}

/// Reasons the legality authority may refuse an action.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, Error)]
pub enum Rejection {
    /// The requested position lies outside the play area.
    #[error("position lies outside the play area")]
    OutOfBounds,
    /// The requested position violates the minimum spacing to another defense.
    #[error("position is too close to an existing defense")]
    TooClose,
    /// The requested position is covered by an obstacle or the goal.
    #[error("position is blocked")]
    Blocked,
    /// The action costs more than the available balance.
    #[error("insufficient resources")]
    Unaffordable,
    /// The defense already reached its maximum level.
    #[error("defense is already at its upgrade ceiling")]
    UpgradeCeiling,
    /// The referenced defense does not exist.
    #[error("defense does not exist")]
    MissingPlacement,
}

/// External authority that owns pricing and legality of actions.
///
/// The planner consults the authority while generating candidates and
/// re-checks the single chosen candidate before emitting it. Executors are
/// expected to validate through the same authority again before applying.
pub trait LegalityAuthority {
    /// Price of constructing a new defense on the provided battlefield.
    fn placement_cost(&self, snapshot: &BattlefieldSnapshot) -> u32;

    /// Price of upgrading the defense, or `None` when it is at its ceiling.
    fn upgrade_cost(&self, placement: &PlacementSnapshot) -> Option<u32>;

    /// Resources returned when the defense is sold.
    fn liquidation_refund(&self, placement: &PlacementSnapshot) -> u32;

    /// Validates the action against the provided battlefield.
    fn validate(
        &self,
        action: &CandidateAction,
        snapshot: &BattlefieldSnapshot,
    ) -> Result<(), Rejection>;
}

impl<T: LegalityAuthority + ?Sized> LegalityAuthority for &T {
    fn placement_cost(&self, snapshot: &BattlefieldSnapshot) -> u32 {
        (**self).placement_cost(snapshot)
    }

    fn upgrade_cost(&self, placement: &PlacementSnapshot) -> Option<u32> {
        (**self).upgrade_cost(placement)
    }

    fn liquidation_refund(&self, placement: &PlacementSnapshot) -> u32 {
        (**self).liquidation_refund(placement)
    }

    fn validate(
        &self,
        action: &CandidateAction,
        snapshot: &BattlefieldSnapshot,
    ) -> Result<(), Rejection> {
        (**self).validate(action, snapshot)
    }
}

/// Programming errors detected while configuring the engine or its fields.
#[derive(Clone, Debug, PartialEq, Error)]
pub enum ConfigError {
    /// A cell size was zero, negative or not finite.
    #[error("cell size must be positive and finite, got {0}")]
    InvalidCellSize(f32),
    /// The play-area bounds enclose no area.
    #[error("bounds must enclose a positive, finite area")]
    EmptyBounds,
    /// An influence radius was zero, negative or not finite.
    #[error("influence radius must be positive and finite, got {0}")]
    InvalidRadius(f32),
    /// An influence strength was negative or not finite.
    #[error("influence strength must be non-negative and finite, got {0}")]
    InvalidStrength(f32),
    /// A scalar option fell outside its admissible range.
    #[error("`{field}` must be within [{min}, {max}], got {value}")]
    OutOfRange {
        /// Name of the offending option.
        field: &'static str,
        /// Supplied value.
        value: f32,
        /// Smallest admissible value.
        min: f32,
        /// Largest admissible value.
        max: f32,
    },
    /// A lower bound exceeded its matching upper bound.
    #[error("`{lower}` ({lower_value}) must not exceed `{upper}` ({upper_value})")]
    InvertedRange {
        /// Name of the lower-bound option.
        lower: &'static str,
        /// Supplied lower bound.
        lower_value: f32,
        /// Name of the upper-bound option.
        upper: &'static str,
        /// Supplied upper bound.
        upper_value: f32,
    },
    /// A count option was zero where at least one is required.
    #[error("`{0}` must be at least one")]
    ZeroCount(&'static str),
}

#[cfg(test)]
mod tests {
    use super::{
        ActionKind, ActionParams, ActionReason, Bounds, Bucket, CandidateAction, CellCoord,
        HostileId, HostileSnapshot, HostileView, MovementBehavior, PlacementId,
        PlacementSnapshot, PlacementView, Rank, Vec2,
    };

    fn hostile(id: u32, velocity: Vec2) -> HostileSnapshot {
        HostileSnapshot {
            id: HostileId::new(id),
            position: Vec2::ZERO,
            velocity,
            health: 1.0,
            behavior: MovementBehavior::Direct,
            faction: Default::default(),
            rank: Rank::Regular,
        }
    }

    #[test]
    fn manhattan_and_chebyshev_distances_match_expectation() {
        let origin = CellCoord::new(1, 1);
        let destination = CellCoord::new(4, 3);
        assert_eq!(origin.manhattan_distance(destination), 5);
        assert_eq!(origin.chebyshev_distance(destination), 3);
    }

    #[test]
    fn bounds_normalise_corners() {
        let bounds = Bounds::new(Vec2::new(10.0, 2.0), Vec2::new(0.0, 8.0));
        assert_eq!(bounds.min(), Vec2::new(0.0, 2.0));
        assert_eq!(bounds.max(), Vec2::new(10.0, 8.0));
        assert!(bounds.contains(Vec2::new(10.0, 8.0)));
        assert!(!bounds.contains(Vec2::new(10.1, 8.0)));
        assert!(bounds.is_valid());
        assert!(!Bounds::from_size(0.0, 5.0).is_valid());
    }

    #[test]
    fn hostile_view_orders_by_identifier() {
        let view = HostileView::from_snapshots(vec![
            hostile(9, Vec2::new(3.0, 4.0)),
            hostile(2, Vec2::new(1.0, 0.0)),
        ]);
        let ids: Vec<u32> = view.iter().map(|snapshot| snapshot.id.get()).collect();
        assert_eq!(ids, vec![2, 9]);
        assert_eq!(view.iter().next().map(HostileSnapshot::speed), Some(1.0));
        assert!(HostileView::default().is_empty());
    }

    #[test]
    fn placement_view_looks_up_by_identifier() {
        let make = |id: u32| PlacementSnapshot {
            id: PlacementId::new(id),
            position: Vec2::splat(id as f32),
            range: 3.0,
            damage_per_second: 10.0,
            level: 0,
        };
        let view = PlacementView::from_snapshots(vec![make(5), make(1), make(3)]);
        assert_eq!(view.get(PlacementId::new(3)).map(|p| p.position), Some(Vec2::splat(3.0)));
        assert!(view.get(PlacementId::new(4)).is_none());
    }

    #[test]
    fn bucket_indices_follow_precedence_order() {
        for (expected, bucket) in Bucket::ALL.iter().enumerate() {
            assert_eq!(bucket.index(), expected);
        }
    }

    #[test]
    fn candidate_action_round_trips_through_bincode() {
        let action = CandidateAction {
            params: ActionParams::Upgrade {
                placement: PlacementId::new(4),
            },
            priority: 0.75,
            cost: 120,
            expected_value: 3.5,
            bucket: Bucket::Economy,
            reason: ActionReason::Reinforce,
        };

        let bytes = bincode::serialize(&action).expect("serialize");
        let restored: CandidateAction = bincode::deserialize(&bytes).expect("deserialize");
        assert_eq!(restored, action);
        assert_eq!(restored.kind(), ActionKind::Upgrade);
    }
}
