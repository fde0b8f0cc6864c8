use std::{cell::Cell, f32::consts::TAU, time::Duration};

use rampart_core::{
    ActionKind, ActionParams, ActionReason, BattlefieldSnapshot, Bounds, Bucket, CandidateAction,
    ConfigError, FactionId, HostileId, HostileSnapshot, HostileView, InertiaTuning,
    LegalityAuthority, MovementBehavior, PlacementId, PlacementSnapshot, PlacementView,
    PlannerConfig, Rank, Rejection, SessionState, Vec2, WavePhase,
};
use rampart_system_planner::{DecisionEngine, EngineState, SkipReason};
use rampart_system_navigation::Grid;

const GOAL: Vec2 = Vec2::new(20.0, 20.0);
const PLACEMENT_COST: u32 = 100;
const UPGRADE_COST: u32 = 50;
const REFUND: u32 = 40;

struct TestAuthority {
    bounds: Bounds,
    min_spacing: f32,
    upgrades: bool,
    reject: Cell<bool>,
}

impl TestAuthority {
    fn new(config: &PlannerConfig) -> Self {
        Self {
            bounds: bounds(),
            min_spacing: config.min_spacing,
            upgrades: true,
            reject: Cell::new(false),
        }
    }
}

impl LegalityAuthority for TestAuthority {
    fn placement_cost(&self, _snapshot: &BattlefieldSnapshot) -> u32 {
        PLACEMENT_COST
    }

    fn upgrade_cost(&self, placement: &PlacementSnapshot) -> Option<u32> {
        (self.upgrades && placement.level < 3).then_some(UPGRADE_COST)
    }

    fn liquidation_refund(&self, _placement: &PlacementSnapshot) -> u32 {
        REFUND
    }

    fn validate(
        &self,
        action: &CandidateAction,
        snapshot: &BattlefieldSnapshot,
    ) -> Result<(), Rejection> {
        if self.reject.get() {
            return Err(Rejection::Blocked);
        }
        if action.cost > snapshot.resources {
            return Err(Rejection::Unaffordable);
        }
        match action.params {
            ActionParams::Place { position } => {
                if !self.bounds.contains(position) {
                    return Err(Rejection::OutOfBounds);
                }
                if snapshot
                    .placements
                    .iter()
                    .any(|placement| placement.position.distance(position) < self.min_spacing)
                {
                    return Err(Rejection::TooClose);
                }
                Ok(())
            }
            ActionParams::Upgrade { placement } | ActionParams::Liquidate { placement } => {
                snapshot
                    .placements
                    .get(placement)
                    .map(|_| ())
                    .ok_or(Rejection::MissingPlacement)
            }
        }
    }
}

fn bounds() -> Bounds {
    Bounds::from_size(40.0, 40.0)
}

fn grid() -> Grid {
    Grid::new(bounds(), 1.0).expect("valid grid")
}

fn sector_config() -> PlannerConfig {
    PlannerConfig {
        sector_rows: 5,
        sector_cols: 5,
        ..PlannerConfig::default()
    }
}

fn placement(id: u32, position: Vec2, range: f32) -> PlacementSnapshot {
    PlacementSnapshot {
        id: PlacementId::new(id),
        position,
        range,
        damage_per_second: 10.0,
        level: 0,
    }
}

/// One short-ranged defense on every 5×5 sector centre except the goal sector and the corners.
fn eighty_percent_coverage() -> PlacementView {
    let mut placements = Vec::new();
    for row in 0..5u32 {
        for column in 0..5u32 {
            let corner = (row == 0 || row == 4) && (column == 0 || column == 4);
            let centre = row == 2 && column == 2;
            if corner || centre {
                continue;
            }
            let position = Vec2::new(4.0 + 8.0 * column as f32, 4.0 + 8.0 * row as f32);
            placements.push(placement(placements.len() as u32, position, 1.0));
        }
    }
    PlacementView::from_snapshots(placements)
}

fn fast_wounded_raider() -> HostileSnapshot {
    HostileSnapshot {
        id: HostileId::new(1),
        position: Vec2::new(26.0, 20.0),
        velocity: Vec2::new(-4.0, 0.0),
        health: 0.1,
        behavior: MovementBehavior::Direct,
        faction: FactionId::new(0),
        rank: Rank::Regular,
    }
}

fn snapshot(hostiles: Vec<HostileSnapshot>, placements: PlacementView) -> BattlefieldSnapshot {
    BattlefieldSnapshot {
        hostiles: HostileView::from_snapshots(hostiles),
        placements,
        resources: 500,
        goal_health: 1.0,
        wave: 1,
        phase: WavePhase::Active,
        session: SessionState::Running,
    }
}

#[test]
fn fast_raider_makes_defense_outweigh_economy() {
    let config = sector_config();
    let authority = TestAuthority::new(&config);
    let mut engine = DecisionEngine::new(config, grid(), GOAL, &authority).expect("valid engine");
    let battlefield = snapshot(vec![fast_wounded_raider()], eighty_percent_coverage());

    let action = engine.tick(Duration::ZERO, &battlefield);
    let report = engine.last_report();

    assert!((report.coverage - 0.8).abs() < 1e-6);
    let weights = report.weights;
    let pressing = weights
        .get(Bucket::Survival)
        .max(weights.get(Bucket::Defense));
    assert!(pressing > weights.get(Bucket::Economy));
    assert_eq!(weights.get(Bucket::Expansion), 0.0);

    let action = action.expect("an affordable action exists");
    assert_ne!(action.bucket, Bucket::Expansion);
    assert!(action.cost <= battlefield.resources);
}

#[test]
fn failing_goal_wakes_survival() {
    let config = sector_config();
    let authority = TestAuthority::new(&config);
    let mut engine = DecisionEngine::new(config, grid(), GOAL, &authority).expect("valid engine");
    let battlefield = BattlefieldSnapshot {
        goal_health: 0.1,
        ..snapshot(vec![fast_wounded_raider()], eighty_percent_coverage())
    };

    let action = engine.tick(Duration::ZERO, &battlefield);
    let weights = engine.last_report().weights;

    assert!(weights.get(Bucket::Survival) > weights.get(Bucket::Economy));
    assert!(weights.get(Bucket::Survival) > weights.get(Bucket::Defense));
    let action = action.expect("placement is affordable");
    assert_ne!(action.bucket, Bucket::Expansion);
}

#[test]
fn quiet_field_prefers_economy() {
    let config = sector_config();
    let authority = TestAuthority::new(&config);
    let mut engine = DecisionEngine::new(config, grid(), GOAL, &authority).expect("valid engine");
    let battlefield = BattlefieldSnapshot {
        resources: 1_000,
        wave: 2,
        phase: WavePhase::Preparing,
        ..snapshot(Vec::new(), eighty_percent_coverage())
    };

    let action = engine.tick(Duration::ZERO, &battlefield).expect("upgrades are affordable");
    let report = engine.last_report();

    assert_eq!(report.threat_level, 0.0);
    assert!(engine.traffic_map().map().max_value() > 0.0);
    assert_eq!(engine.threat_map().map().max_value(), 0.0);
    assert!(report.weights.get(Bucket::Economy) > report.weights.get(Bucket::Defense));
    assert_eq!(report.chosen_bucket, Some(Bucket::Economy));
    assert_eq!(action.kind(), ActionKind::Upgrade);
    assert_eq!(action.reason, ActionReason::Reinforce);
}

#[test]
fn saturated_ring_falls_back_to_the_weakest_sector() {
    let config = PlannerConfig {
        min_spacing: 5.0,
        min_distance_from_goal: 3.0,
        max_distance_from_goal: 5.0,
        defense_radius: 40.0,
        ..PlannerConfig::default()
    };
    let authority = TestAuthority {
        upgrades: false,
        ..TestAuthority::new(&config)
    };
    let ring = PlacementView::from_snapshots(
        (0..5)
            .map(|index| {
                let angle = TAU * index as f32 / 5.0;
                placement(index, GOAL + Vec2::from_angle(angle) * 4.0, 4.0)
            })
            .collect(),
    );
    let raider = HostileSnapshot {
        position: Vec2::new(30.0, 20.0),
        velocity: Vec2::new(-2.0, 0.0),
        health: 1.0,
        ..fast_wounded_raider()
    };
    let battlefield = snapshot(vec![raider], ring.clone());

    let mut engine = DecisionEngine::new(config.clone(), grid(), GOAL, &authority)
        .expect("valid engine");
    let action = engine
        .tick(Duration::ZERO, &battlefield)
        .expect("a sector site exists");

    assert_eq!(action.reason, ActionReason::WeakestSector);
    assert!(engine.coverage_map().map().max_value() > 0.0);
    assert_eq!(action.bucket, Bucket::Defense);
    let ActionParams::Place { position } = action.params else {
        panic!("expected a placement, got {action:?}");
    };
    assert!(position.distance(GOAL) > config.max_distance_from_goal);
    assert!(ring
        .iter()
        .all(|existing| existing.position.distance(position) >= config.min_spacing));
    assert_eq!(
        engine.last_report().candidate_counts[Bucket::Defense.index()],
        1,
        "only the sector fallback should be offered"
    );
}

#[test]
fn emitted_actions_never_exceed_the_balance() {
    let config = sector_config();
    let authority = TestAuthority::new(&config);
    let mut engine = DecisionEngine::new(config, grid(), GOAL, &authority).expect("valid engine");
    let interval = engine.config().decision_interval();

    for (step, resources) in [0, 30, 60, 120, 500].into_iter().enumerate() {
        let battlefield = BattlefieldSnapshot {
            resources,
            ..snapshot(vec![fast_wounded_raider()], eighty_percent_coverage())
        };
        let now = interval * step as u32;
        match engine.tick(now, &battlefield) {
            Some(action) => assert!(action.cost <= resources, "{action:?} over {resources}"),
            None => assert!(resources < PLACEMENT_COST, "nothing emitted with {resources}"),
        }
    }
}

#[test]
fn critical_goal_liquidates_to_fund_defense() {
    let config = sector_config();
    let authority = TestAuthority::new(&config);
    let mut engine = DecisionEngine::new(config, grid(), GOAL, &authority).expect("valid engine");
    let battlefield = BattlefieldSnapshot {
        resources: 20,
        goal_health: 0.2,
        ..snapshot(vec![fast_wounded_raider()], eighty_percent_coverage())
    };

    let action = engine
        .tick(Duration::ZERO, &battlefield)
        .expect("liquidation is always affordable");

    assert_eq!(action.kind(), ActionKind::Liquidate);
    assert_eq!(action.bucket, Bucket::Survival);
    assert_eq!(action.reason, ActionReason::EmergencyFunds);
    assert_eq!(action.cost, 0);
}

#[test]
fn inactive_sessions_and_short_intervals_are_skipped() {
    let config = sector_config();
    let authority = TestAuthority::new(&config);
    let mut engine = DecisionEngine::new(config, grid(), GOAL, &authority).expect("valid engine");
    let running = snapshot(vec![fast_wounded_raider()], eighty_percent_coverage());

    for session in [SessionState::Paused, SessionState::Ended] {
        let halted = BattlefieldSnapshot {
            session,
            ..running.clone()
        };
        assert_eq!(engine.tick(Duration::ZERO, &halted), None);
        assert_eq!(
            engine.last_report().skipped,
            Some(SkipReason::SessionInactive)
        );
    }

    assert!(engine.tick(Duration::from_millis(100), &running).is_some());
    assert_eq!(engine.tick(Duration::from_millis(400), &running), None);
    assert_eq!(engine.last_report().skipped, Some(SkipReason::Throttled));
    assert!(engine.tick(Duration::from_millis(600), &running).is_some());
    assert_eq!(engine.last_report().skipped, None);
}

#[test]
fn rejection_clears_inertia_and_returns_to_idle() {
    let config = sector_config();
    let authority = TestAuthority::new(&config);
    let mut engine = DecisionEngine::new(config, grid(), GOAL, &authority).expect("valid engine");
    let battlefield = snapshot(vec![fast_wounded_raider()], eighty_percent_coverage());

    let first = engine
        .tick(Duration::ZERO, &battlefield)
        .expect("first decision");
    assert_eq!(
        engine.inertia().favoured(Duration::from_millis(1)),
        Some(first.kind())
    );
    assert_eq!(
        engine.last_report().transitions,
        vec![EngineState::Planning, EngineState::Executed, EngineState::Idle]
    );

    authority.reject.set(true);
    let now = Duration::from_secs(1);
    assert_eq!(engine.tick(now, &battlefield), None);

    let report = engine.last_report();
    assert_eq!(report.rejection, Some(Rejection::Blocked));
    assert_eq!(
        report.transitions,
        vec![EngineState::Planning, EngineState::Rejected, EngineState::Idle]
    );
    assert_eq!(engine.state(), EngineState::Idle);
    assert_eq!(engine.inertia().favoured(now), None);
}

#[test]
fn executor_rejection_clears_inertia() {
    let config = sector_config();
    let authority = TestAuthority::new(&config);
    let mut engine = DecisionEngine::new(config, grid(), GOAL, &authority).expect("valid engine");
    let battlefield = snapshot(vec![fast_wounded_raider()], eighty_percent_coverage());

    assert!(engine.tick(Duration::ZERO, &battlefield).is_some());
    assert!(engine.inertia().favoured(Duration::ZERO).is_some());

    engine.acknowledge_rejection(Rejection::TooClose);
    assert_eq!(engine.inertia().favoured(Duration::ZERO), None);
}

#[test]
fn identical_inputs_replay_identically() {
    let config = sector_config();
    let authority = TestAuthority::new(&config);
    let mut first = DecisionEngine::new(config.clone(), grid(), GOAL, &authority)
        .expect("valid engine");
    let mut second = DecisionEngine::new(config, grid(), GOAL, &authority).expect("valid engine");

    for step in 0..6u32 {
        let raider = HostileSnapshot {
            position: Vec2::new(34.0 - 2.0 * step as f32, 20.0),
            ..fast_wounded_raider()
        };
        let battlefield = BattlefieldSnapshot {
            resources: 80 + 60 * step,
            ..snapshot(vec![raider], eighty_percent_coverage())
        };
        let now = Duration::from_millis(500 * u64::from(step));

        assert_eq!(first.tick(now, &battlefield), second.tick(now, &battlefield));
        assert_eq!(first.last_report(), second.last_report());
    }
}

fn held_kind_config(bonus: f32) -> PlannerConfig {
    PlannerConfig {
        defense_radius: 40.0,
        inertia: InertiaTuning {
            bonus,
            switch_threshold: 0.05,
            persistence_ms: 5_000,
        },
        ..sector_config()
    }
}

/// Quiet field first, then one raider a second later.
fn calm_then_raided() -> (BattlefieldSnapshot, BattlefieldSnapshot) {
    let calm = BattlefieldSnapshot {
        resources: 1_000,
        wave: 2,
        phase: WavePhase::Preparing,
        ..snapshot(Vec::new(), eighty_percent_coverage())
    };
    let raided = BattlefieldSnapshot {
        resources: 1_000,
        wave: 2,
        ..snapshot(vec![fast_wounded_raider()], eighty_percent_coverage())
    };
    (calm, raided)
}

#[test]
fn held_kind_survives_a_weight_shift_inside_the_persistence_window() {
    let config = held_kind_config(1.0);
    let authority = TestAuthority::new(&config);
    let mut engine = DecisionEngine::new(config, grid(), GOAL, &authority).expect("valid engine");
    let (calm, raided) = calm_then_raided();

    let first = engine.tick(Duration::ZERO, &calm).expect("upgrade on a quiet field");
    assert_eq!(first.kind(), ActionKind::Upgrade);

    let held = engine
        .tick(Duration::from_secs(1), &raided)
        .expect("an action is affordable");
    let weights = engine.last_report().weights;
    assert!(weights.get(Bucket::Defense) > weights.get(Bucket::Economy));
    assert!(weights.get(Bucket::Defense) < weights.get(Bucket::Economy) + 1.0 + 0.05);
    assert!(engine.last_report().candidate_counts[Bucket::Defense.index()] > 0);
    assert_eq!(held.kind(), ActionKind::Upgrade);
    assert_eq!(engine.last_report().chosen_bucket, Some(Bucket::Economy));

    let switched = engine
        .tick(Duration::from_secs(10), &raided)
        .expect("an action is affordable");
    assert_eq!(switched.kind(), ActionKind::Place);
    assert_eq!(switched.bucket, Bucket::Defense);
}

#[test]
fn clear_weight_lead_displaces_the_held_kind() {
    let config = held_kind_config(0.1);
    let authority = TestAuthority::new(&config);
    let mut engine = DecisionEngine::new(config, grid(), GOAL, &authority).expect("valid engine");
    let (calm, raided) = calm_then_raided();

    let first = engine.tick(Duration::ZERO, &calm).expect("upgrade on a quiet field");
    assert_eq!(first.kind(), ActionKind::Upgrade);

    let next = engine
        .tick(Duration::from_secs(1), &raided)
        .expect("an action is affordable");
    let weights = engine.last_report().weights;
    assert!(weights.get(Bucket::Defense) > weights.get(Bucket::Economy) + 0.1 + 0.05);
    assert_eq!(next.kind(), ActionKind::Place);
}

#[test]
fn influence_cells_finer_than_the_grid_are_refused() {
    let config = PlannerConfig {
        influence_cell_size: 1e-4,
        ..PlannerConfig::default()
    };
    let authority = TestAuthority::new(&config);
    assert!(matches!(
        DecisionEngine::new(config, grid(), GOAL, &authority),
        Err(ConfigError::InvertedRange {
            upper: "influence_cell_size",
            ..
        })
    ));
}

#[test]
fn invalid_configuration_is_refused() {
    let config = PlannerConfig {
        sector_rows: 0,
        ..PlannerConfig::default()
    };
    let authority = TestAuthority::new(&config);
    assert!(DecisionEngine::new(config, grid(), GOAL, &authority).is_err());
}
