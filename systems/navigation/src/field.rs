//! Integration and flow fields derived from a [`Grid`] and a goal cell.

use std::{cmp::Ordering, collections::BinaryHeap};

use rampart_core::{CellCoord, Vec2};

use crate::grid::Grid;

/// Neighbour offsets in the fixed iteration order used for tie-breaking.
///
/// Cardinal steps come first so that a diagonal only wins when it is
/// strictly cheaper than every orthogonal alternative.
const NEIGHBOURS: [(i64, i64); 8] = [
    (0, -1),
    (1, 0),
    (0, 1),
    (-1, 0),
    (1, -1),
    (1, 1),
    (-1, 1),
    (-1, -1),
];

/// Options controlling how flow directions are derived.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FlowOptions {
    /// Point straight at the goal from cells with an unobstructed, uniform-cost sight line.
    pub line_of_sight: bool,
}

impl Default for FlowOptions {
    fn default() -> Self {
        Self {
            line_of_sight: true,
        }
    }
}

/// Accumulated traversal cost from every cell to the goal.
///
/// Unvisited cells hold `f32::INFINITY`.
#[derive(Clone, Debug, PartialEq)]
pub struct IntegrationField {
    columns: u32,
    rows: u32,
    goal: CellCoord,
    values: Vec<f32>,
}

impl IntegrationField {
    /// Goal cell the field was seeded from.
    #[must_use]
    pub const fn goal(&self) -> CellCoord {
        self.goal
    }

    /// Accumulated cost of the cell, `f32::INFINITY` when unreachable or outside the grid.
    #[must_use]
    pub fn value(&self, cell: CellCoord) -> f32 {
        self.offset(cell)
            .map_or(f32::INFINITY, |index| self.values[index])
    }

    /// Dense accumulated costs in row-major order.
    #[must_use]
    pub fn values(&self) -> &[f32] {
        &self.values
    }

    /// Reports whether the goal can be reached from the cell.
    #[must_use]
    pub fn is_reachable(&self, cell: CellCoord) -> bool {
        self.value(cell).is_finite()
    }

    fn offset(&self, cell: CellCoord) -> Option<usize> {
        if cell.column() >= self.columns || cell.row() >= self.rows {
            return None;
        }
        Some(cell.row() as usize * self.columns as usize + cell.column() as usize)
    }
}

/// Per-cell unit directions toward decreasing integration cost.
///
/// The direction is zero exactly at the goal and at unreachable cells.
#[derive(Clone, Debug, PartialEq)]
pub struct FlowField {
    directions: Vec<Vec2>,
    integration: IntegrationField,
}

impl FlowField {
    /// Goal cell the field guides toward.
    #[must_use]
    pub const fn goal(&self) -> CellCoord {
        self.integration.goal
    }

    /// Underlying integration field.
    #[must_use]
    pub const fn integration(&self) -> &IntegrationField {
        &self.integration
    }

    /// Unit direction stored for the cell; zero at the goal, when unreachable, or outside the grid.
    #[must_use]
    pub fn direction(&self, cell: CellCoord) -> Vec2 {
        self.integration
            .offset(cell)
            .map_or(Vec2::ZERO, |index| self.directions[index])
    }

    /// Dense directions in row-major order.
    #[must_use]
    pub fn directions(&self) -> &[Vec2] {
        &self.directions
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
struct Frontier {
    cost: f32,
    index: usize,
}

impl Eq for Frontier {}

impl Ord for Frontier {
    // Reversed so that `BinaryHeap` pops the cheapest entry first.
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .cost
            .total_cmp(&self.cost)
            .then_with(|| other.index.cmp(&self.index))
    }
}

impl PartialOrd for Frontier {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Runs a Dijkstra sweep from `goal` over the grid's cost field.
///
/// Entering a cell costs its traversal cost (zero is treated as one), and a
/// diagonal step costs `√2` times that. Diagonals may not cut past an
/// impassable orthogonal neighbour. Returns `None` when the goal itself lies
/// outside the grid or is impassable, in which case no field can be built.
#[must_use]
pub fn build_integration(grid: &Grid, goal: CellCoord) -> Option<IntegrationField> {
    let goal_index = grid.index(goal)?;
    if !grid.is_passable(goal) {
        return None;
    }

    let mut values = vec![f32::INFINITY; grid.cell_count()];
    let mut heap = BinaryHeap::with_capacity(grid.cell_count() / 4 + 1);
    values[goal_index] = 0.0;
    heap.push(Frontier {
        cost: 0.0,
        index: goal_index,
    });

    let mut expanded = 0_usize;
    while let Some(Frontier { cost, index }) = heap.pop() {
        if cost > values[index] {
            continue;
        }
        expanded += 1;

        let cell = grid.coord(index);
        for (neighbour, diagonal) in passable_neighbours(grid, cell) {
            let Some(neighbour_index) = grid.index(neighbour) else {
                continue;
            };
            let step = f32::from(grid.costs()[neighbour_index].max(1));
            let step = if diagonal {
                step * std::f32::consts::SQRT_2
            } else {
                step
            };
            let next = cost + step;
            if next < values[neighbour_index] {
                values[neighbour_index] = next;
                heap.push(Frontier {
                    cost: next,
                    index: neighbour_index,
                });
            }
        }
    }

    tracing::trace!(
        expanded,
        cells = grid.cell_count(),
        goal_column = goal.column(),
        goal_row = goal.row(),
        "integration sweep complete"
    );

    Some(IntegrationField {
        columns: grid.columns(),
        rows: grid.rows(),
        goal,
        values,
    })
}

/// Derives per-cell flow directions from a completed integration field.
#[must_use]
pub fn derive_flow(grid: &Grid, integration: IntegrationField, options: FlowOptions) -> FlowField {
    let goal = integration.goal;
    let goal_center = grid.cell_center(goal);
    let mut directions = vec![Vec2::ZERO; integration.values.len()];

    for (index, direction) in directions.iter_mut().enumerate() {
        let value = integration.values[index];
        if !value.is_finite() {
            continue;
        }

        let cell = grid.coord(index);
        if cell == goal {
            continue;
        }

        if options.line_of_sight && has_line_of_sight(grid, cell, goal) {
            *direction = (goal_center - grid.cell_center(cell)).normalize_or_zero();
            if *direction != Vec2::ZERO {
                continue;
            }
        }

        if let Some(next) = descend(grid, &integration, cell) {
            let offset = Vec2::new(
                next.column() as f32 - cell.column() as f32,
                next.row() as f32 - cell.row() as f32,
            );
            *direction = offset.normalize_or_zero();
        }
    }

    FlowField {
        directions,
        integration,
    }
}

/// Neighbour with the strictly lowest integration value, first in iteration order on ties.
#[must_use]
pub fn descend(grid: &Grid, integration: &IntegrationField, cell: CellCoord) -> Option<CellCoord> {
    let mut best_value = integration.value(cell);
    let mut best = None;

    for (neighbour, _) in passable_neighbours(grid, cell) {
        let value = integration.value(neighbour);
        if value < best_value {
            best_value = value;
            best = Some(neighbour);
        }
    }

    best
}

fn passable_neighbours(
    grid: &Grid,
    cell: CellCoord,
) -> impl Iterator<Item = (CellCoord, bool)> + '_ {
    NEIGHBOURS.iter().filter_map(move |&(dc, dr)| {
        let neighbour = offset(cell, dc, dr)?;
        if !grid.is_passable(neighbour) {
            return None;
        }

        let diagonal = dc != 0 && dr != 0;
        if diagonal {
            let horizontal = offset(cell, dc, 0)?;
            let vertical = offset(cell, 0, dr)?;
            if !grid.is_passable(horizontal) || !grid.is_passable(vertical) {
                return None;
            }
        }

        Some((neighbour, diagonal))
    })
}

fn offset(cell: CellCoord, dc: i64, dr: i64) -> Option<CellCoord> {
    let column = u32::try_from(i64::from(cell.column()) + dc).ok()?;
    let row = u32::try_from(i64::from(cell.row()) + dr).ok()?;
    Some(CellCoord::new(column, row))
}

/// Walks the cells crossed by the segment between two cell centres.
///
/// Every crossed cell except the goal must share the starting cell's cost.
/// When the segment passes exactly through a cell corner both cells touching
/// that corner are checked.
fn has_line_of_sight(grid: &Grid, from: CellCoord, to: CellCoord) -> bool {
    let Some(expected) = grid.cost(from) else {
        return false;
    };

    let target = (i64::from(to.column()), i64::from(to.row()));
    let mut column = i64::from(from.column());
    let mut row = i64::from(from.row());
    let delta_column = target.0 - column;
    let delta_row = target.1 - row;
    let step_column = delta_column.signum();
    let step_row = delta_row.signum();
    let span_column = delta_column.abs();
    let span_row = delta_row.abs();

    let uniform = |column: i64, row: i64| -> bool {
        if (column, row) == target {
            return true;
        }
        let (Ok(column), Ok(row)) = (u32::try_from(column), u32::try_from(row)) else {
            return false;
        };
        grid.cost(CellCoord::new(column, row)) == Some(expected)
    };

    let mut crossed_columns = 0_i64;
    let mut crossed_rows = 0_i64;
    while crossed_columns < span_column || crossed_rows < span_row {
        let column_boundary = (1 + 2 * crossed_columns) * span_row;
        let row_boundary = (1 + 2 * crossed_rows) * span_column;

        match column_boundary.cmp(&row_boundary) {
            Ordering::Equal => {
                if !uniform(column + step_column, row) || !uniform(column, row + step_row) {
                    return false;
                }
                column += step_column;
                row += step_row;
                crossed_columns += 1;
                crossed_rows += 1;
            }
            Ordering::Less => {
                column += step_column;
                crossed_columns += 1;
            }
            Ordering::Greater => {
                row += step_row;
                crossed_rows += 1;
            }
        }

        if !uniform(column, row) {
            return false;
        }
    }

    true
}
