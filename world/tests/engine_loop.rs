use std::time::Duration;

use rampart_core::{PlannerConfig, SessionState};
use rampart_system_navigation::Grid;
use rampart_system_planner::DecisionEngine;
use rampart_world::{apply, query, Command, Event, WaveSpawner, WaveTuning, World, WorldConfig};

const STEP: Duration = Duration::from_millis(100);
const TICKS_PER_WAVE: u32 = 600;

fn run(seed: u64, waves: u32) -> Vec<Event> {
    let config = WorldConfig::default();
    let mut world = World::new(config.clone()).expect("valid world");
    let grid = Grid::new(config.bounds(), config.cell_size).expect("valid grid");
    let mut engine = DecisionEngine::new(
        PlannerConfig::default(),
        grid,
        config.goal,
        query::rules(&world).clone(),
    )
    .expect("valid engine");
    let mut spawner = WaveSpawner::new(seed, config.bounds(), WaveTuning::default());

    let mut log = Vec::new();
    for wave in 1..=waves {
        apply(&mut world, Command::StartWave, &mut log);
        for spawn in spawner.compose(wave) {
            apply(&mut world, Command::SpawnHostile { spawn }, &mut log);
        }

        for _ in 0..TICKS_PER_WAVE {
            let snapshot = query::snapshot(&world);
            if let Some(action) = engine.tick(query::elapsed(&world), &snapshot) {
                assert!(action.cost <= snapshot.resources);
                apply(&mut world, Command::Execute { action }, &mut log);
            }

            let mut events = Vec::new();
            apply(&mut world, Command::Tick { dt: STEP }, &mut events);
            let cleared = events
                .iter()
                .any(|event| matches!(event, Event::WaveCleared { .. }));
            log.extend(events);
            if cleared || query::session(&world) == SessionState::Ended {
                break;
            }
        }
        if query::session(&world) == SessionState::Ended {
            break;
        }
    }
    log
}

#[test]
fn engine_actions_pass_the_world_rules() {
    let log = run(42, 3);

    assert!(log
        .iter()
        .any(|event| matches!(event, Event::PlacementBuilt { .. })));
    assert!(
        log.iter()
            .all(|event| !matches!(event, Event::ActionRejected { .. })),
        "the engine validates against the same rules and state"
    );
}

#[test]
fn seeded_sessions_replay_identically() {
    assert_eq!(run(7, 2), run(7, 2));
}
