use rampart_core::{Bounds, CellCoord, Obstacle, Vec2, IMPASSABLE};
use rampart_system_navigation::{FlowOptions, Grid, Guidance, Navigator};

fn navigator(size: f32, goal: Vec2, options: FlowOptions) -> Navigator {
    let grid = Grid::new(Bounds::from_size(size, size), 1.0).expect("valid grid");
    let mut navigator = Navigator::new(grid, goal, options);
    assert!(navigator.refresh(), "first refresh must solve");
    navigator
}

#[test]
fn boundary_flow_points_at_central_goal_within_one_degree() {
    let goal = Vec2::new(20.5, 20.5);
    let navigator = navigator(41.0, goal, FlowOptions::default());
    assert_eq!(navigator.guidance(), Guidance::Field);

    let grid = navigator.grid();
    let boundary = grid.boundary_cells();
    assert_eq!(boundary.len(), 160);

    let tolerance = 1.0_f32.to_radians();
    for cell in boundary {
        let center = grid.cell_center(cell);
        let expected = (goal - center).normalize();
        let actual = navigator.direction_at(center);
        let angle = expected.angle_between(actual).abs();
        assert!(
            angle <= tolerance,
            "cell {cell:?} deviates by {} degrees",
            angle.to_degrees()
        );
    }
}

#[test]
fn every_reachable_cell_has_a_unit_direction() {
    let mut navigator = navigator(16.0, Vec2::new(8.5, 8.5), FlowOptions::default());
    navigator.apply_obstacle(&Obstacle::blocking(Vec2::new(4.5, 8.5), 2.0));
    navigator.apply_obstacle(&Obstacle {
        center: Vec2::new(12.5, 3.5),
        radius: 1.5,
        cost: 6,
    });
    assert!(navigator.refresh());

    let field = navigator.flow_field().expect("field solved");
    let grid = navigator.grid();
    for index in 0..grid.cell_count() {
        let cell = grid.coord(index);
        let direction = field.direction(cell);
        if cell == field.goal() || !field.integration().is_reachable(cell) {
            assert_eq!(direction, Vec2::ZERO, "cell {cell:?} should not flow");
        } else {
            assert!(
                (direction.length() - 1.0).abs() < 1e-4,
                "cell {cell:?} has non-unit direction {direction:?}"
            );
        }
    }
}

#[test]
fn walled_pocket_is_unreachable() {
    let grid = Grid::new(Bounds::from_size(9.0, 9.0), 1.0).expect("valid grid");
    let mut navigator = Navigator::new(grid, Vec2::new(7.5, 7.5), FlowOptions::default());
    for column in 0..3 {
        navigator.set_cost(CellCoord::new(column, 2), IMPASSABLE);
    }
    for row in 0..3 {
        navigator.set_cost(CellCoord::new(2, row), IMPASSABLE);
    }
    assert!(navigator.refresh());

    let pocket = Vec2::new(0.5, 0.5);
    assert_eq!(navigator.direction_at(pocket), Vec2::ZERO);
    assert!(navigator.integration_at(pocket).is_infinite());

    let mut path = Vec::new();
    assert!(!navigator.trace(CellCoord::new(0, 0), 64, &mut path));
    assert!(path.is_empty());
}

#[test]
fn trace_reaches_goal_from_every_boundary_cell() {
    let mut navigator = navigator(20.0, Vec2::new(10.5, 10.5), FlowOptions::default());
    navigator.apply_obstacle(&Obstacle::blocking(Vec2::new(10.5, 6.5), 2.5));
    assert!(navigator.refresh());

    let boundary = navigator.grid().boundary_cells();
    let budget = navigator.grid().cell_count();
    for cell in boundary {
        let mut path = Vec::new();
        assert!(
            navigator.trace(cell, budget, &mut path),
            "trace from {cell:?} never arrived"
        );
        let costs: Vec<f32> = path
            .iter()
            .map(|&step| {
                navigator
                    .flow_field()
                    .expect("field solved")
                    .integration()
                    .value(step)
            })
            .collect();
        assert!(
            costs.windows(2).all(|pair| pair[1] < pair[0]),
            "integration must strictly decrease along the trace from {cell:?}"
        );
    }
}

#[test]
fn line_of_sight_can_be_disabled() {
    let options = FlowOptions {
        line_of_sight: false,
    };
    let navigator = navigator(11.0, Vec2::new(5.5, 5.5), options);
    let direction = navigator.direction_at(Vec2::new(0.5, 3.5));
    let diagonal = Vec2::new(1.0, 1.0).normalize();
    let east = Vec2::X;
    assert!(
        (direction - diagonal).length() < 1e-5 || (direction - east).length() < 1e-5,
        "grid-aligned direction expected, got {direction:?}"
    );
}

#[test]
fn solves_only_after_goal_or_obstacle_changes() {
    let mut navigator = navigator(16.0, Vec2::new(8.0, 8.0), FlowOptions::default());
    let revision = navigator.revision();
    assert!(!navigator.is_dirty());
    assert!(!navigator.refresh());

    navigator.set_goal(Vec2::new(8.0, 8.0));
    assert!(!navigator.is_dirty(), "same goal is not a change");

    navigator.apply_obstacle(&Obstacle::blocking(Vec2::new(3.0, 3.0), 1.0));
    assert!(navigator.is_dirty());
    assert!(navigator.refresh());
    assert_eq!(navigator.revision(), revision + 1);
}
