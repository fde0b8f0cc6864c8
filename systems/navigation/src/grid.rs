//! Uniform discretisation of the play area carrying per-cell traversal costs.

use rampart_core::{Bounds, CellCoord, ConfigError, Obstacle, Vec2, IMPASSABLE, OPEN_GROUND};

/// Upper bound on the number of cells a grid may allocate.
const MAX_CELLS: u64 = 1 << 22;

/// Dense cost field covering the play area in row-major order.
///
/// Rows grow along the world `y` axis and columns along `x`, so the centre of
/// cell `(column, row)` sits at `bounds.min + (column + 0.5, row + 0.5) * cell_size`.
#[derive(Clone, Debug)]
pub struct Grid {
    bounds: Bounds,
    cell_size: f32,
    columns: u32,
    rows: u32,
    costs: Vec<u8>,
}

impl Grid {
    /// Allocates an open grid covering `bounds` with square cells.
    ///
    /// Fails when the cell size is not a positive finite number, when the
    /// bounds enclose no area, or when the resulting grid would be absurdly
    /// large for the provided cell size.
    pub fn new(bounds: Bounds, cell_size: f32) -> Result<Self, ConfigError> {
        if !(cell_size.is_finite() && cell_size > 0.0) {
            return Err(ConfigError::InvalidCellSize(cell_size));
        }
        if !bounds.is_valid() {
            return Err(ConfigError::EmptyBounds);
        }

        let columns = (bounds.width() / cell_size).ceil().max(1.0);
        let rows = (bounds.height() / cell_size).ceil().max(1.0);
        if columns * rows > MAX_CELLS as f32 {
            return Err(ConfigError::InvalidCellSize(cell_size));
        }

        let columns = columns as u32;
        let rows = rows as u32;
        let cell_count = usize::try_from(u64::from(columns) * u64::from(rows))
            .map_err(|_| ConfigError::InvalidCellSize(cell_size))?;

        Ok(Self {
            bounds,
            cell_size,
            columns,
            rows,
            costs: vec![OPEN_GROUND; cell_count],
        })
    }

    /// Play area covered by the grid.
    #[must_use]
    pub const fn bounds(&self) -> Bounds {
        self.bounds
    }

    /// Side length of a cell in world units.
    #[must_use]
    pub const fn cell_size(&self) -> f32 {
        self.cell_size
    }

    /// Number of columns in the grid.
    #[must_use]
    pub const fn columns(&self) -> u32 {
        self.columns
    }

    /// Number of rows in the grid.
    #[must_use]
    pub const fn rows(&self) -> u32 {
        self.rows
    }

    /// Total number of cells.
    #[must_use]
    pub fn cell_count(&self) -> usize {
        self.costs.len()
    }

    /// Dense traversal costs in row-major order.
    #[must_use]
    pub fn costs(&self) -> &[u8] {
        &self.costs
    }

    /// Cell containing the provided world position, if it lies inside the grid.
    #[must_use]
    pub fn cell_at(&self, position: Vec2) -> Option<CellCoord> {
        if !position.is_finite() || !self.bounds.contains(position) {
            return None;
        }

        Some(self.cell_at_clamped(position))
    }

    /// Cell containing the provided position after clamping it into the grid.
    #[must_use]
    pub fn cell_at_clamped(&self, position: Vec2) -> CellCoord {
        let local = (position - self.bounds.min()) / self.cell_size;
        let column = clamp_axis(local.x, self.columns);
        let row = clamp_axis(local.y, self.rows);
        CellCoord::new(column, row)
    }

    /// World-space centre of a cell.
    #[must_use]
    pub fn cell_center(&self, cell: CellCoord) -> Vec2 {
        self.bounds.min()
            + Vec2::new(cell.column() as f32 + 0.5, cell.row() as f32 + 0.5) * self.cell_size
    }

    /// Row-major offset of the cell, if it lies inside the grid.
    #[must_use]
    pub fn index(&self, cell: CellCoord) -> Option<usize> {
        if cell.column() >= self.columns || cell.row() >= self.rows {
            return None;
        }

        let column = usize::try_from(cell.column()).ok()?;
        let row = usize::try_from(cell.row()).ok()?;
        let width = usize::try_from(self.columns).ok()?;
        row.checked_mul(width)?.checked_add(column)
    }

    /// Cell stored at the provided row-major offset.
    #[must_use]
    pub fn coord(&self, index: usize) -> CellCoord {
        let width = self.columns as usize;
        CellCoord::new((index % width) as u32, (index / width) as u32)
    }

    /// Traversal cost of the cell, if it lies inside the grid.
    #[must_use]
    pub fn cost(&self, cell: CellCoord) -> Option<u8> {
        self.index(cell).map(|index| self.costs[index])
    }

    /// Reports whether the cell exists and can be entered.
    #[must_use]
    pub fn is_passable(&self, cell: CellCoord) -> bool {
        self.cost(cell).map_or(false, |cost| cost != IMPASSABLE)
    }

    /// Overwrites the cost of a single cell.
    ///
    /// Returns `true` when the stored cost actually changed.
    pub fn set_cost(&mut self, cell: CellCoord, cost: u8) -> bool {
        let Some(index) = self.index(cell) else {
            return false;
        };

        if self.costs[index] == cost {
            return false;
        }

        self.costs[index] = cost;
        true
    }

    /// Stamps an obstacle onto every cell whose centre it covers.
    ///
    /// Returns the number of cells whose cost changed.
    pub fn apply_obstacle(&mut self, obstacle: &Obstacle) -> usize {
        if !(obstacle.radius.is_finite() && obstacle.radius >= 0.0) {
            return 0;
        }

        let reach = Vec2::splat(obstacle.radius);
        let low = self.cell_at_clamped(obstacle.center - reach);
        let high = self.cell_at_clamped(obstacle.center + reach);
        let radius_sq = obstacle.radius * obstacle.radius;
        let mut changed = 0;

        for row in low.row()..=high.row() {
            for column in low.column()..=high.column() {
                let cell = CellCoord::new(column, row);
                if self.cell_center(cell).distance_squared(obstacle.center) > radius_sq {
                    continue;
                }
                if self.set_cost(cell, obstacle.cost) {
                    changed += 1;
                }
            }
        }

        changed
    }

    /// Passable cells on the outer ring of the grid, walked clockwise from the origin.
    #[must_use]
    pub fn boundary_cells(&self) -> Vec<CellCoord> {
        let mut cells = Vec::new();
        let last_column = self.columns - 1;
        let last_row = self.rows - 1;

        for column in 0..=last_column {
            cells.push(CellCoord::new(column, 0));
        }
        for row in 1..=last_row {
            cells.push(CellCoord::new(last_column, row));
        }
        if last_row > 0 {
            for column in (0..last_column).rev() {
                cells.push(CellCoord::new(column, last_row));
            }
        }
        if last_column > 0 {
            for row in (1..last_row).rev() {
                cells.push(CellCoord::new(0, row));
            }
        }

        cells.retain(|&cell| self.is_passable(cell));
        cells
    }
}

fn clamp_axis(local: f32, extent: u32) -> u32 {
    if local <= 0.0 {
        return 0;
    }

    (local as u32).min(extent - 1)
}
