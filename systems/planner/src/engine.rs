//! Tick-driven decision engine.

use std::{cmp::Ordering, f32::consts::TAU, time::Duration};

use rampart_core::{
    ActionParams, ActionReason, BattlefieldSnapshot, Bucket, CandidateAction, ConfigError,
    LegalityAuthority, Obstacle, PlacementSnapshot, PlacementView, PlannerConfig, Rejection,
    ThreatVector, Vec2,
};
use rampart_system_analysis::{CoverageAnalyzer, CoverageReport, ThreatAnalyzer};
use rampart_system_influence::{CoverageMap, ThreatMap, TrafficMap};
use rampart_system_interception::{
    find_choke_points, find_interception_points, placement_admissible, placement_clear,
};
use rampart_system_navigation::{FlowOptions, Grid, Navigator};

use crate::{
    buckets::{classify, distance_preference, BucketWeights, DecisionContext},
    inertia::InertiaTracker,
};

/// Goal health below which liquidations may fund an unaffordable placement.
const CRITICAL_HEALTH: f32 = 0.3;
/// Choke points below this normalised traffic are ignored.
const CHOKE_CONVERGENCE: f32 = 0.1;
/// Share of a placement's priority decided by its distance from the goal.
const DISTANCE_WEIGHT: f32 = 0.3;
/// Liquidation candidates offered per tick.
const LIQUIDATION_LIMIT: usize = 2;
/// Rings searched around a sector centre for a free site.
const SECTOR_SEARCH_RINGS: u32 = 3;
const SECTOR_SITES_PER_RING: u32 = 8;

/// Position of the engine in its per-tick state machine.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum EngineState {
    /// Waiting for the next decision tick.
    #[default]
    Idle,
    /// Analysing the snapshot and ranking candidates.
    Planning,
    /// The chosen action passed the final legality check and was emitted.
    Executed,
    /// The chosen action failed the final legality check and was dropped.
    Rejected,
}

impl EngineState {
    /// Reports whether the machine may move from `self` to `next`.
    #[must_use]
    pub const fn can_transition_to(self, next: EngineState) -> bool {
        matches!(
            (self, next),
            (Self::Idle, Self::Planning)
                | (Self::Planning, Self::Executed)
                | (Self::Planning, Self::Rejected)
                | (Self::Planning, Self::Idle)
                | (Self::Executed, Self::Idle)
                | (Self::Rejected, Self::Idle)
        )
    }
}

/// Why a tick ended without planning.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SkipReason {
    /// The session is paused or has ended.
    SessionInactive,
    /// Less than the decision interval elapsed since the last decision.
    Throttled,
}

/// Diagnostics describing the most recent tick.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct TickReport {
    /// Simulation time the tick ran at.
    pub at: Duration,
    /// Set when the tick ended before planning.
    pub skipped: Option<SkipReason>,
    /// States visited during the tick, in order.
    pub transitions: Vec<EngineState>,
    /// Bucket weights derived from the snapshot.
    pub weights: BucketWeights,
    /// Affordable candidates generated per bucket, indexed by [`Bucket::index`].
    pub candidate_counts: [usize; 4],
    /// Bucket the chosen candidate came from.
    pub chosen_bucket: Option<Bucket>,
    /// Overall threat level in `[0, 100]`.
    pub threat_level: f32,
    /// Fraction of sectors reached by any placement.
    pub coverage: f32,
    /// Emitted action.
    pub action: Option<CandidateAction>,
    /// Why the chosen candidate was refused by the final legality check.
    pub rejection: Option<Rejection>,
}

/// Autonomous commander turning battlefield snapshots into at most one action per tick.
///
/// The engine is constructed and owned by the caller; it holds no global
/// state. Legality and pricing are delegated to the injected authority.
#[derive(Debug)]
pub struct DecisionEngine<A: LegalityAuthority> {
    config: PlannerConfig,
    authority: A,
    navigator: Navigator,
    traffic: TrafficMap,
    threat_map: ThreatMap,
    coverage_map: CoverageMap,
    threat_analyzer: ThreatAnalyzer,
    coverage_analyzer: CoverageAnalyzer,
    inertia: InertiaTracker,
    state: EngineState,
    last_decision: Option<Duration>,
    report: TickReport,
}

impl<A: LegalityAuthority> DecisionEngine<A> {
    /// Creates an engine guiding hostiles on `grid` toward `goal`.
    ///
    /// Fails when the configuration does not validate, when the influence
    /// cells are finer than the navigation cells, or when the grid's bounds
    /// cannot host the configured influence and sector grids.
    pub fn new(
        config: PlannerConfig,
        grid: Grid,
        goal: Vec2,
        authority: A,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        if config.influence_cell_size < grid.cell_size() {
            return Err(ConfigError::InvertedRange {
                lower: "grid cell size",
                lower_value: grid.cell_size(),
                upper: "influence_cell_size",
                upper_value: config.influence_cell_size,
            });
        }

        let bounds = grid.bounds();
        let cell_size = config.influence_cell_size;
        let traffic = TrafficMap::new(bounds, cell_size, config.traffic_boundary_stride)?;
        let threat_map = ThreatMap::new(bounds, cell_size)?;
        let coverage_map = CoverageMap::new(bounds, cell_size)?;
        let coverage_analyzer =
            CoverageAnalyzer::new(bounds, config.sector_rows, config.sector_cols)?;
        let threat_analyzer =
            ThreatAnalyzer::new(config.threat.clone(), config.prediction_horizon_secs);
        let navigator = Navigator::new(grid, goal, FlowOptions::default());
        let inertia = InertiaTracker::new(config.inertia);

        Ok(Self {
            config,
            authority,
            navigator,
            traffic,
            threat_map,
            coverage_map,
            threat_analyzer,
            coverage_analyzer,
            inertia,
            state: EngineState::Idle,
            last_decision: None,
            report: TickReport::default(),
        })
    }

    /// Configuration the engine was built with.
    #[must_use]
    pub const fn config(&self) -> &PlannerConfig {
        &self.config
    }

    /// Injected legality authority.
    #[must_use]
    pub const fn authority(&self) -> &A {
        &self.authority
    }

    /// Current state-machine position; `Idle` between ticks.
    #[must_use]
    pub const fn state(&self) -> EngineState {
        self.state
    }

    /// Navigator owning the cost grid and flow field.
    #[must_use]
    pub const fn navigator(&self) -> &Navigator {
        &self.navigator
    }

    /// Traffic layer as of the last planning tick.
    #[must_use]
    pub const fn traffic_map(&self) -> &TrafficMap {
        &self.traffic
    }

    /// Threat layer as of the last planning tick.
    #[must_use]
    pub const fn threat_map(&self) -> &ThreatMap {
        &self.threat_map
    }

    /// Coverage layer as of the last planning tick.
    #[must_use]
    pub const fn coverage_map(&self) -> &CoverageMap {
        &self.coverage_map
    }

    /// Decision inertia memory.
    #[must_use]
    pub const fn inertia(&self) -> &InertiaTracker {
        &self.inertia
    }

    /// Diagnostics of the most recent tick.
    #[must_use]
    pub const fn last_report(&self) -> &TickReport {
        &self.report
    }

    /// Moves the defended goal; the flow field is re-solved on the next planning tick.
    pub fn set_goal(&mut self, goal: Vec2) {
        self.navigator.set_goal(goal);
    }

    /// Stamps an obstacle onto the navigation grid.
    pub fn apply_obstacle(&mut self, obstacle: &Obstacle) {
        self.navigator.apply_obstacle(obstacle);
    }

    /// Clears inertia after the executor refused an emitted action.
    pub fn acknowledge_rejection(&mut self, rejection: Rejection) {
        tracing::debug!(%rejection, "executor refused the last action");
        self.inertia.clear();
    }

    /// Restarts the session: forgets the last decision, inertia and diagnostics.
    pub fn reset(&mut self) {
        self.state = EngineState::Idle;
        self.last_decision = None;
        self.inertia.clear();
        self.report = TickReport::default();
    }

    /// Runs one decision tick at simulation time `now`.
    ///
    /// Returns the single action to execute, or `None` when the session is
    /// inactive, the decision interval has not elapsed, nothing useful is
    /// affordable, or the chosen action failed the final legality check.
    pub fn tick(&mut self, now: Duration, snapshot: &BattlefieldSnapshot) -> Option<CandidateAction> {
        let mut report = TickReport {
            at: now,
            ..TickReport::default()
        };

        if !snapshot.accepts_decisions() {
            report.skipped = Some(SkipReason::SessionInactive);
            self.report = report;
            return None;
        }
        if let Some(last) = self.last_decision {
            if now.saturating_sub(last) < self.config.decision_interval() {
                report.skipped = Some(SkipReason::Throttled);
                self.report = report;
                return None;
            }
        }
        self.last_decision = Some(now);
        self.transition(&mut report, EngineState::Planning);

        let _ = self.navigator.refresh();
        let _ = self.traffic.rebuild(&self.navigator);

        let goal = self.navigator.goal();
        let threats = self.threat_analyzer.analyze_threats(&snapshot.hostiles, goal);
        self.threat_map.rebuild(&threats, &self.config.threat);
        self.coverage_map.rebuild(&snapshot.placements);
        let coverage =
            self.coverage_analyzer
                .analyze(&snapshot.placements, &snapshot.hostiles, &threats);
        let threat_level = self.threat_analyzer.overall_threat_level(&threats);

        let context = DecisionContext {
            health: snapshot.goal_health,
            threat: threat_level / 100.0,
            coverage: coverage.coverage(),
            wave: snapshot.wave,
        };
        let weights = BucketWeights::from_context(&context, &self.config.curves, self.config.profile);
        report.weights = weights;
        report.threat_level = threat_level;
        report.coverage = coverage.coverage();

        let candidates = self.generate(snapshot, &threats, &coverage);
        for candidate in &candidates {
            report.candidate_counts[candidate.bucket.index()] += 1;
        }

        let mut leaders: Vec<(Bucket, CandidateAction)> = Vec::new();
        for bucket in weights.ranked() {
            let pool: Vec<CandidateAction> = candidates
                .iter()
                .filter(|candidate| candidate.bucket == bucket)
                .copied()
                .collect();
            if let Some(index) = self.inertia.select(now, &pool) {
                leaders.push((bucket, pool[index]));
            }
        }

        // Buckets compete on weight; the bucket producing the held kind keeps its bonus.
        let contenders: Vec<CandidateAction> = leaders
            .iter()
            .map(|(bucket, leader)| CandidateAction {
                priority: weights.get(*bucket),
                ..*leader
            })
            .collect();
        let chosen = self
            .inertia
            .select(now, &contenders)
            .map(|index| leaders[index]);

        let Some((bucket, action)) = chosen else {
            tracing::trace!(candidates = candidates.len(), "no feasible candidate");
            self.transition(&mut report, EngineState::Idle);
            self.report = report;
            return None;
        };

        report.chosen_bucket = Some(bucket);
        let emitted = match self.authority.validate(&action, snapshot) {
            Ok(()) => {
                tracing::debug!(
                    kind = ?action.kind(),
                    bucket = ?action.bucket,
                    reason = ?action.reason,
                    cost = action.cost,
                    priority = action.priority,
                    "decision emitted"
                );
                self.inertia.record(action.kind(), now);
                self.transition(&mut report, EngineState::Executed);
                report.action = Some(action);
                Some(action)
            }
            Err(rejection) => {
                tracing::debug!(
                    kind = ?action.kind(),
                    %rejection,
                    "chosen action rejected by legality check"
                );
                self.inertia.clear();
                self.transition(&mut report, EngineState::Rejected);
                report.rejection = Some(rejection);
                None
            }
        };

        self.transition(&mut report, EngineState::Idle);
        self.report = report;
        emitted
    }

    fn transition(&mut self, report: &mut TickReport, next: EngineState) {
        debug_assert!(
            self.state.can_transition_to(next),
            "illegal transition {:?} -> {next:?}",
            self.state
        );
        self.state = next;
        report.transitions.push(next);
    }

    fn generate(
        &self,
        snapshot: &BattlefieldSnapshot,
        threats: &[ThreatVector],
        coverage: &CoverageReport,
    ) -> Vec<CandidateAction> {
        let full_budget = snapshot.resources;
        let discretionary = full_budget.saturating_sub(self.config.emergency_reserve);
        let budget = |bucket: Bucket| match bucket {
            Bucket::Survival | Bucket::Defense => full_budget,
            Bucket::Economy | Bucket::Expansion => discretionary,
        };

        let placement_cost = self.authority.placement_cost(snapshot);
        let placements = self.placement_candidates(snapshot, threats, coverage, placement_cost);

        let mut candidates: Vec<CandidateAction> = Vec::new();
        let mut needed_placement = false;
        for candidate in placements {
            if candidate.cost <= budget(candidate.bucket) {
                candidates.push(candidate);
            } else if matches!(candidate.bucket, Bucket::Survival | Bucket::Defense) {
                needed_placement = true;
            }
        }

        for candidate in self.upgrade_candidates(snapshot) {
            if candidate.cost <= budget(candidate.bucket) {
                candidates.push(candidate);
            }
        }

        if needed_placement && snapshot.goal_health < CRITICAL_HEALTH {
            candidates.extend(self.liquidation_candidates(snapshot, placement_cost));
        }

        candidates
    }

    fn placement_candidates(
        &self,
        snapshot: &BattlefieldSnapshot,
        threats: &[ThreatVector],
        coverage: &CoverageReport,
        cost: u32,
    ) -> Vec<CandidateAction> {
        let config = &self.config;
        let goal = self.navigator.goal();
        let existing = &snapshot.placements;
        let place = |position: Vec2, score: f32, expected_value: f32, reason: ActionReason| {
            let params = ActionParams::Place { position };
            let bucket = classify(&params, goal, config.defense_radius);
            let preference = distance_preference(
                bucket,
                position.distance(goal),
                config.min_distance_from_goal,
                config.max_distance_from_goal,
            );
            CandidateAction {
                params,
                priority: score * (1.0 - DISTANCE_WEIGHT + DISTANCE_WEIGHT * preference),
                cost,
                expected_value,
                bucket,
                reason,
            }
        };

        let mut candidates: Vec<CandidateAction> = if threats.is_empty() {
            let limit = self.traffic.map().cells().len();
            find_choke_points(&self.traffic, CHOKE_CONVERGENCE, limit)
                .into_iter()
                .filter(|choke| {
                    placement_admissible(config, &self.navigator, existing, goal, choke.position)
                })
                .take(config.interception.max_results as usize)
                .map(|choke| {
                    place(
                        choke.position,
                        choke.convergence,
                        choke.convergence,
                        ActionReason::ChokePoint,
                    )
                })
                .collect()
        } else {
            find_interception_points(
                config,
                threats,
                existing,
                &self.traffic,
                &self.navigator,
                goal,
            )
            .into_iter()
            .map(|point| {
                place(
                    point.position,
                    point.score,
                    point.score * point.dwell_time,
                    ActionReason::Interception,
                )
            })
            .collect()
        };

        if candidates.is_empty() {
            if let Some((position, gap)) = self.sector_site(coverage, existing, goal) {
                candidates.push(place(position, gap, gap, ActionReason::WeakestSector));
            }
        }

        candidates
    }

    /// First free site near the weakest sector, trying progressively stronger sectors.
    fn sector_site(
        &self,
        coverage: &CoverageReport,
        existing: &PlacementView,
        goal: Vec2,
    ) -> Option<(Vec2, f32)> {
        let mut sectors: Vec<_> = coverage.sectors().iter().collect();
        sectors.sort_by(|a, b| {
            a.strength()
                .partial_cmp(&b.strength())
                .unwrap_or(Ordering::Equal)
                .then_with(|| a.index.cmp(&b.index))
        });

        let strongest = sectors
            .last()
            .map_or(0.0, |sector| sector.strength())
            .max(f32::EPSILON);
        let step = self.config.min_spacing.max(1.0);

        for sector in sectors {
            let sites = std::iter::once(sector.center).chain((1..=SECTOR_SEARCH_RINGS).flat_map(
                move |ring| {
                    (0..SECTOR_SITES_PER_RING).map(move |index| {
                        let angle = TAU * index as f32 / SECTOR_SITES_PER_RING as f32;
                        sector.center + Vec2::from_angle(angle) * step * ring as f32
                    })
                },
            ));

            for site in sites {
                if placement_clear(&self.config, &self.navigator, existing, goal, site) {
                    let gap = 1.0 - (sector.strength() / strongest).clamp(0.0, 1.0);
                    return Some((site, gap.max(f32::EPSILON)));
                }
            }
        }

        None
    }

    fn exposure(&self, placement: &PlacementSnapshot) -> f32 {
        let threat_peak = self.threat_map.map().max_value();
        let threat = if threat_peak > 0.0 {
            self.threat_map.map().value_interpolated(placement.position) / threat_peak
        } else {
            0.0
        };
        0.5 * self.traffic.density(placement.position) + 0.5 * threat.clamp(0.0, 1.0)
    }

    fn upgrade_candidates(&self, snapshot: &BattlefieldSnapshot) -> Vec<CandidateAction> {
        let goal = self.navigator.goal();
        snapshot
            .placements
            .iter()
            .filter_map(|placement| {
                let cost = self.authority.upgrade_cost(placement)?;
                let exposure = self.exposure(placement);
                let params = ActionParams::Upgrade {
                    placement: placement.id,
                };
                Some(CandidateAction {
                    params,
                    priority: 0.8 * exposure + 0.2 / (1.0 + f32::from(placement.level)),
                    cost,
                    expected_value: exposure * placement.damage_per_second,
                    bucket: classify(&params, goal, self.config.defense_radius),
                    reason: ActionReason::Reinforce,
                })
            })
            .collect()
    }

    fn liquidation_candidates(
        &self,
        snapshot: &BattlefieldSnapshot,
        placement_cost: u32,
    ) -> Vec<CandidateAction> {
        let goal = self.navigator.goal();
        let shortfall = placement_cost.saturating_sub(snapshot.resources).max(1);
        let urgency = 1.0 - snapshot.goal_health.clamp(0.0, 1.0);

        let mut idle: Vec<(f32, &PlacementSnapshot)> = snapshot
            .placements
            .iter()
            .map(|placement| (self.exposure(placement), placement))
            .collect();
        idle.sort_by(|a, b| {
            a.0.partial_cmp(&b.0)
                .unwrap_or(Ordering::Equal)
                .then_with(|| a.1.id.cmp(&b.1.id))
        });

        idle.into_iter()
            .filter_map(|(exposure, placement)| {
                let refund = self.authority.liquidation_refund(placement);
                if refund == 0 {
                    return None;
                }
                let params = ActionParams::Liquidate {
                    placement: placement.id,
                };
                let funding = (refund as f32 / shortfall as f32).min(1.0);
                Some(CandidateAction {
                    params,
                    priority: urgency * funding * (1.0 - exposure),
                    cost: 0,
                    expected_value: refund as f32,
                    bucket: classify(&params, goal, self.config.defense_radius),
                    reason: ActionReason::EmergencyFunds,
                })
            })
            .take(LIQUIDATION_LIMIT)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::EngineState;

    #[test]
    fn state_machine_only_allows_documented_edges() {
        use EngineState::{Executed, Idle, Planning, Rejected};
        assert!(Idle.can_transition_to(Planning));
        assert!(Planning.can_transition_to(Executed));
        assert!(Planning.can_transition_to(Rejected));
        assert!(Executed.can_transition_to(Idle));
        assert!(Rejected.can_transition_to(Idle));
        assert!(!Idle.can_transition_to(Executed));
        assert!(!Executed.can_transition_to(Rejected));
        assert!(!Rejected.can_transition_to(Planning));
    }
}
