#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Grid, cost field, integration field and flow field for hostile guidance.
//!
//! The [`Navigator`] owns the cost grid and the last valid [`FlowField`]. The
//! full Dijkstra solve is comparatively expensive, so it only reruns when the
//! goal or an obstacle changed; every other query reads the cached field.

mod field;
mod grid;

pub use field::{build_integration, derive_flow, descend, FlowField, FlowOptions, IntegrationField};
pub use grid::Grid;

use rampart_core::{CellCoord, Obstacle, Vec2};

/// Source of the guidance currently served by a [`Navigator`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Guidance {
    /// Directions come from a solved flow field.
    Field,
    /// No valid field exists; directions point straight at the goal.
    StraightLine,
}

/// Caching owner of the cost grid and the flow field toward a single goal.
#[derive(Clone, Debug)]
pub struct Navigator {
    grid: Grid,
    options: FlowOptions,
    goal: Vec2,
    field: Option<FlowField>,
    guidance: Guidance,
    dirty: bool,
    revision: u64,
}

impl Navigator {
    /// Creates a navigator guiding toward `goal`; the first [`Navigator::refresh`] solves the field.
    #[must_use]
    pub fn new(grid: Grid, goal: Vec2, options: FlowOptions) -> Self {
        Self {
            grid,
            options,
            goal,
            field: None,
            guidance: Guidance::StraightLine,
            dirty: true,
            revision: 0,
        }
    }

    /// Cost grid guiding the solve.
    #[must_use]
    pub const fn grid(&self) -> &Grid {
        &self.grid
    }

    /// Goal the navigator guides toward.
    #[must_use]
    pub const fn goal(&self) -> Vec2 {
        self.goal
    }

    /// Source of the guidance served since the last refresh.
    #[must_use]
    pub const fn guidance(&self) -> Guidance {
        self.guidance
    }

    /// Counter bumped every time the served guidance is recomputed.
    #[must_use]
    pub const fn revision(&self) -> u64 {
        self.revision
    }

    /// Reports whether a goal or obstacle change is waiting for a solve.
    #[must_use]
    pub const fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Last valid flow field, if one was ever solved.
    #[must_use]
    pub fn flow_field(&self) -> Option<&FlowField> {
        self.field.as_ref()
    }

    /// Moves the goal, scheduling a solve when it changed.
    pub fn set_goal(&mut self, goal: Vec2) {
        if goal != self.goal {
            self.goal = goal;
            self.dirty = true;
        }
    }

    /// Overwrites a single cell cost, scheduling a solve when it changed.
    pub fn set_cost(&mut self, cell: CellCoord, cost: u8) {
        if self.grid.set_cost(cell, cost) {
            self.dirty = true;
        }
    }

    /// Stamps an obstacle onto the grid, scheduling a solve when any cell changed.
    pub fn apply_obstacle(&mut self, obstacle: &Obstacle) {
        if self.grid.apply_obstacle(obstacle) > 0 {
            self.dirty = true;
        }
    }

    /// Re-solves the field if the goal or an obstacle changed since the last solve.
    ///
    /// Returns `true` when a solve was attempted. An impassable or
    /// out-of-bounds goal keeps the previous valid field, or falls back to
    /// straight-line guidance when there has never been one.
    pub fn refresh(&mut self) -> bool {
        if !self.dirty {
            return false;
        }
        self.dirty = false;
        self.revision += 1;

        let goal_cell = self.grid.cell_at(self.goal);
        let integration = goal_cell.and_then(|cell| build_integration(&self.grid, cell));

        match integration {
            Some(integration) => {
                self.field = Some(derive_flow(&self.grid, integration, self.options));
                self.guidance = Guidance::Field;
            }
            None if self.field.is_some() => {
                tracing::warn!(
                    goal_x = self.goal.x,
                    goal_y = self.goal.y,
                    "goal cell is not traversable; keeping previous flow field"
                );
                self.guidance = Guidance::Field;
            }
            None => {
                tracing::warn!(
                    goal_x = self.goal.x,
                    goal_y = self.goal.y,
                    "goal cell is not traversable; using straight-line guidance"
                );
                self.guidance = Guidance::StraightLine;
            }
        }

        true
    }

    /// Unit guidance direction at a world position.
    ///
    /// Zero when the position sits on the goal cell or cannot reach it.
    #[must_use]
    pub fn direction_at(&self, position: Vec2) -> Vec2 {
        match (&self.field, self.guidance) {
            (Some(field), Guidance::Field) => match self.grid.cell_at(position) {
                Some(cell) => field.direction(cell),
                None => (self.goal - position).normalize_or_zero(),
            },
            _ => (self.goal - position).normalize_or_zero(),
        }
    }

    /// Accumulated cost from a world position to the goal, infinite when unknown.
    #[must_use]
    pub fn integration_at(&self, position: Vec2) -> f32 {
        match (&self.field, self.grid.cell_at(position)) {
            (Some(field), Some(cell)) => field.integration().value(cell),
            _ => f32::INFINITY,
        }
    }

    /// Follows the integration gradient from `start` toward the goal.
    ///
    /// Visited cells, including `start`, are appended to `out`. Returns
    /// `true` when the goal was reached within `max_steps`.
    pub fn trace(&self, start: CellCoord, max_steps: usize, out: &mut Vec<CellCoord>) -> bool {
        let Some(field) = &self.field else {
            return false;
        };
        let integration = field.integration();
        if !integration.is_reachable(start) {
            return false;
        }

        let mut current = start;
        for _ in 0..=max_steps {
            out.push(current);
            if current == integration.goal() {
                return true;
            }

            match descend(&self.grid, integration, current) {
                Some(next) => current = next,
                None => return false,
            }
        }

        false
    }
}
