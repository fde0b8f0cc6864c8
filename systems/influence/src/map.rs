//! Dense scalar field accumulated from point sources.

use rampart_core::{Bounds, CellCoord, ConfigError, Vec2};

/// Upper bound on the number of cells a map may allocate.
const MAX_CELLS: u64 = 1 << 22;

/// Falloff applied over the normalised distance `t = d / radius`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum DecayShape {
    /// `s·(1 − t)`
    #[default]
    Linear,
    /// `s·(1 − t)²`
    Quadratic,
    /// `s·e^{−3t}`
    Exponential,
}

impl DecayShape {
    /// Contribution of a unit-strength source at normalised distance `t`.
    #[must_use]
    pub fn falloff(self, t: f32) -> f32 {
        if !(0.0..=1.0).contains(&t) {
            return 0.0;
        }

        match self {
            Self::Linear => 1.0 - t,
            Self::Quadratic => (1.0 - t) * (1.0 - t),
            Self::Exponential => (-3.0 * t).exp(),
        }
    }
}

/// Point source of influence.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct InfluenceSource {
    /// Centre of the source in world units.
    pub position: Vec2,
    /// Value contributed at the centre.
    pub strength: f32,
    /// Distance beyond which the source contributes nothing.
    pub radius: f32,
    /// Falloff between the centre and the radius.
    pub decay: DecayShape,
}

impl InfluenceSource {
    /// Creates a source with linear decay.
    #[must_use]
    pub const fn linear(position: Vec2, strength: f32, radius: f32) -> Self {
        Self {
            position,
            strength,
            radius,
            decay: DecayShape::Linear,
        }
    }

    /// Checks that the source would contribute a well-formed, non-negative field.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.radius.is_finite() && self.radius > 0.0) {
            return Err(ConfigError::InvalidRadius(self.radius));
        }
        if !(self.strength.is_finite() && self.strength >= 0.0) {
            return Err(ConfigError::InvalidStrength(self.strength));
        }
        Ok(())
    }
}

/// Cell of an influence map together with its value.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Sample {
    /// Cell coordinate inside the map.
    pub cell: CellCoord,
    /// World-space centre of the cell.
    pub position: Vec2,
    /// Stored value.
    pub value: f32,
}

/// Non-negative scalar field over the play area, stored in row-major order.
#[derive(Clone, Debug, PartialEq)]
pub struct InfluenceMap {
    bounds: Bounds,
    cell_size: f32,
    columns: u32,
    rows: u32,
    values: Vec<f32>,
}

impl InfluenceMap {
    /// Allocates a zeroed map covering `bounds`.
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
        let len = usize::try_from(u64::from(columns) * u64::from(rows))
            .map_err(|_| ConfigError::InvalidCellSize(cell_size))?;

        Ok(Self {
            bounds,
            cell_size,
            columns,
            rows,
            values: vec![0.0; len],
        })
    }

    /// Play area covered by the map.
    #[must_use]
    pub const fn bounds(&self) -> Bounds {
        self.bounds
    }

    /// Side length of a cell in world units.
    #[must_use]
    pub const fn cell_size(&self) -> f32 {
        self.cell_size
    }

    /// Number of columns.
    #[must_use]
    pub const fn columns(&self) -> u32 {
        self.columns
    }

    /// Number of rows.
    #[must_use]
    pub const fn rows(&self) -> u32 {
        self.rows
    }

    /// Raw values in row-major order.
    #[must_use]
    pub fn cells(&self) -> &[f32] {
        &self.values
    }

    /// Resets every cell to zero.
    pub fn clear(&mut self) {
        self.values.iter_mut().for_each(|value| *value = 0.0);
    }

    /// World-space centre of a cell.
    #[must_use]
    pub fn cell_center(&self, cell: CellCoord) -> Vec2 {
        self.bounds.min()
            + Vec2::new(cell.column() as f32 + 0.5, cell.row() as f32 + 0.5) * self.cell_size
    }

    /// Cell containing the position, if it lies inside the map.
    #[must_use]
    pub fn cell_at(&self, position: Vec2) -> Option<CellCoord> {
        if !position.is_finite() || !self.bounds.contains(position) {
            return None;
        }

        let local = (position - self.bounds.min()) / self.cell_size;
        let column = (local.x.max(0.0) as u32).min(self.columns - 1);
        let row = (local.y.max(0.0) as u32).min(self.rows - 1);
        Some(CellCoord::new(column, row))
    }

    /// Adds a source to every cell whose centre lies within its radius.
    ///
    /// Sources that fail [`InfluenceSource::validate`] are skipped.
    pub fn add_source(&mut self, source: &InfluenceSource) {
        if source.validate().is_err() || !source.position.is_finite() {
            tracing::trace!(?source, "skipping malformed influence source");
            return;
        }

        let reach = Vec2::splat(source.radius);
        let low = ((source.position - reach - self.bounds.min()) / self.cell_size).floor();
        let high = ((source.position + reach - self.bounds.min()) / self.cell_size).floor();
        let max_column = self.columns as f32 - 1.0;
        let max_row = self.rows as f32 - 1.0;
        let column_range = low.x.clamp(0.0, max_column) as u32..=high.x.clamp(0.0, max_column) as u32;
        let row_range = low.y.clamp(0.0, max_row) as u32..=high.y.clamp(0.0, max_row) as u32;

        for row in row_range {
            for column in column_range.clone() {
                let cell = CellCoord::new(column, row);
                let distance = self.cell_center(cell).distance(source.position);
                if distance > source.radius {
                    continue;
                }
                let contribution = source.strength * source.decay.falloff(distance / source.radius);
                let index = self.offset(cell);
                self.values[index] += contribution;
            }
        }
    }

    /// Adds `amount` to the cell containing the position; negative amounts are ignored.
    pub fn deposit(&mut self, position: Vec2, amount: f32) {
        if !(amount.is_finite() && amount > 0.0) {
            return;
        }
        if let Some(cell) = self.cell_at(position) {
            let index = self.offset(cell);
            self.values[index] += amount;
        }
    }

    /// Value of the cell containing the position, zero outside the map.
    #[must_use]
    pub fn value(&self, position: Vec2) -> f32 {
        self.cell_at(position)
            .map_or(0.0, |cell| self.values[self.offset(cell)])
    }

    /// Bilinear interpolation between the four cell centres surrounding the position.
    ///
    /// Positions beyond the outermost centres are clamped to the edge cells.
    #[must_use]
    pub fn value_interpolated(&self, position: Vec2) -> f32 {
        if !position.is_finite() {
            return 0.0;
        }

        let local = (position - self.bounds.min()) / self.cell_size - Vec2::splat(0.5);
        let max_column = self.columns as f32 - 1.0;
        let max_row = self.rows as f32 - 1.0;
        let x = local.x.clamp(0.0, max_column);
        let y = local.y.clamp(0.0, max_row);

        let x0 = x.floor();
        let y0 = y.floor();
        let x1 = (x0 + 1.0).min(max_column);
        let y1 = (y0 + 1.0).min(max_row);
        let fx = x - x0;
        let fy = y - y0;

        let sample = |column: f32, row: f32| {
            self.values[self.offset(CellCoord::new(column as u32, row as u32))]
        };

        let bottom = sample(x0, y0) * (1.0 - fx) + sample(x1, y0) * fx;
        let top = sample(x0, y1) * (1.0 - fx) + sample(x1, y1) * fx;
        bottom * (1.0 - fy) + top * fy
    }

    /// Largest stored value; zero for an empty map.
    #[must_use]
    pub fn max_value(&self) -> f32 {
        self.values.iter().copied().fold(0.0, f32::max)
    }

    /// Cells at least `threshold` that are strictly greater than every neighbour.
    ///
    /// Sorted by descending value, ties broken by row-major position.
    #[must_use]
    pub fn find_peaks(&self, threshold: f32) -> Vec<Sample> {
        let mut peaks = Vec::new();

        for (index, &value) in self.values.iter().enumerate() {
            if value < threshold {
                continue;
            }

            let cell = self.coord(index);
            let dominates = self
                .neighbours(cell)
                .all(|neighbour| value > self.values[self.offset(neighbour)]);
            if dominates {
                peaks.push(Sample {
                    cell,
                    position: self.cell_center(cell),
                    value,
                });
            }
        }

        peaks.sort_by(|a, b| {
            b.value
                .total_cmp(&a.value)
                .then_with(|| (a.cell.row(), a.cell.column()).cmp(&(b.cell.row(), b.cell.column())))
        });
        peaks
    }

    /// Lowest-valued cell, first in row-major order on ties.
    #[must_use]
    pub fn find_minimum(&self) -> Sample {
        let (index, value) = self
            .values
            .iter()
            .copied()
            .enumerate()
            .fold((0, f32::INFINITY), |best, (index, value)| {
                if value < best.1 {
                    (index, value)
                } else {
                    best
                }
            });
        let cell = self.coord(index);

        Sample {
            cell,
            position: self.cell_center(cell),
            value,
        }
    }

    /// Every cell with its value, in row-major order.
    pub fn samples(&self) -> impl Iterator<Item = Sample> + '_ {
        self.values.iter().enumerate().map(|(index, &value)| {
            let cell = self.coord(index);
            Sample {
                cell,
                position: self.cell_center(cell),
                value,
            }
        })
    }

    fn offset(&self, cell: CellCoord) -> usize {
        cell.row() as usize * self.columns as usize + cell.column() as usize
    }

    fn coord(&self, index: usize) -> CellCoord {
        let width = self.columns as usize;
        CellCoord::new((index % width) as u32, (index / width) as u32)
    }

    fn neighbours(&self, cell: CellCoord) -> impl Iterator<Item = CellCoord> + '_ {
        let column = i64::from(cell.column());
        let row = i64::from(cell.row());
        (-1_i64..=1)
            .flat_map(move |dr| (-1_i64..=1).map(move |dc| (dc, dr)))
            .filter(|&(dc, dr)| dc != 0 || dr != 0)
            .filter_map(move |(dc, dr)| {
                let column = u32::try_from(column + dc).ok()?;
                let row = u32::try_from(row + dr).ok()?;
                (column < self.columns && row < self.rows).then(|| CellCoord::new(column, row))
            })
    }
}

#[cfg(test)]
mod tests {
    use super::{DecayShape, InfluenceMap, InfluenceSource};
    use rampart_core::{Bounds, CellCoord, ConfigError, Vec2};

    fn map() -> InfluenceMap {
        InfluenceMap::new(Bounds::from_size(20.0, 20.0), 1.0).expect("valid map")
    }

    #[test]
    fn rejects_degenerate_geometry() {
        let bounds = Bounds::from_size(10.0, 10.0);
        assert_eq!(
            InfluenceMap::new(bounds, -1.0),
            Err(ConfigError::InvalidCellSize(-1.0))
        );
        assert_eq!(
            InfluenceMap::new(Bounds::from_size(10.0, 0.0), 1.0),
            Err(ConfigError::EmptyBounds)
        );
    }

    #[test]
    fn refuses_cell_sizes_that_would_exhaust_memory() {
        assert_eq!(
            InfluenceMap::new(Bounds::from_size(40.0, 40.0), 1e-4),
            Err(ConfigError::InvalidCellSize(1e-4))
        );
        assert!(InfluenceMap::new(Bounds::from_size(40.0, 40.0), 0.05).is_ok());
    }

    #[test]
    fn linear_source_decays_with_distance() {
        let mut map = map();
        map.add_source(&InfluenceSource::linear(Vec2::new(10.5, 10.5), 8.0, 4.0));

        assert!((map.value(Vec2::new(10.5, 10.5)) - 8.0).abs() < 1e-5);
        assert!((map.value(Vec2::new(12.5, 10.5)) - 4.0).abs() < 1e-5);
        assert!((map.value(Vec2::new(14.5, 10.5))).abs() < 1e-5);
        assert_eq!(map.value(Vec2::new(15.5, 10.5)), 0.0);
    }

    #[test]
    fn co_located_sources_sum() {
        let mut map = map();
        let source = InfluenceSource::linear(Vec2::new(5.5, 5.5), 3.0, 5.0);
        map.add_source(&source);
        let single = map.value(Vec2::new(7.5, 5.5));
        map.add_source(&source);
        assert!((map.value(Vec2::new(7.5, 5.5)) - 2.0 * single).abs() < 1e-5);
    }

    #[test]
    fn decay_shapes_order_as_expected() {
        assert_eq!(DecayShape::Linear.falloff(0.5), 0.5);
        assert_eq!(DecayShape::Quadratic.falloff(0.5), 0.25);
        assert!((DecayShape::Exponential.falloff(1.0) - (-3.0_f32).exp()).abs() < 1e-6);
        assert_eq!(DecayShape::Linear.falloff(1.5), 0.0);
    }

    #[test]
    fn malformed_sources_are_skipped() {
        let mut map = map();
        let negative = InfluenceSource::linear(Vec2::new(5.5, 5.5), -2.0, 3.0);
        let flat = InfluenceSource::linear(Vec2::new(5.5, 5.5), 2.0, 0.0);
        assert_eq!(negative.validate(), Err(ConfigError::InvalidStrength(-2.0)));
        assert_eq!(flat.validate(), Err(ConfigError::InvalidRadius(0.0)));

        map.add_source(&negative);
        map.add_source(&flat);
        assert_eq!(map.max_value(), 0.0);
    }

    #[test]
    fn interpolation_blends_neighbouring_centres() {
        let mut map = InfluenceMap::new(Bounds::from_size(2.0, 1.0), 1.0).expect("valid map");
        map.deposit(Vec2::new(0.5, 0.5), 2.0);
        map.deposit(Vec2::new(1.5, 0.5), 4.0);

        assert!((map.value_interpolated(Vec2::new(1.0, 0.5)) - 3.0).abs() < 1e-5);
        assert!((map.value_interpolated(Vec2::new(0.0, 0.0)) - 2.0).abs() < 1e-5);
        assert!((map.value_interpolated(Vec2::new(2.0, 1.0)) - 4.0).abs() < 1e-5);
    }

    #[test]
    fn peaks_are_strict_local_maxima() {
        let mut map = map();
        map.add_source(&InfluenceSource::linear(Vec2::new(4.5, 4.5), 5.0, 3.0));
        map.add_source(&InfluenceSource::linear(Vec2::new(15.5, 15.5), 9.0, 3.0));
        map.deposit(Vec2::new(0.5, 19.5), 1.0);
        map.deposit(Vec2::new(1.5, 19.5), 1.0);

        let peaks = map.find_peaks(0.5);
        let cells: Vec<CellCoord> = peaks.iter().map(|peak| peak.cell).collect();
        assert_eq!(cells, vec![CellCoord::new(15, 15), CellCoord::new(4, 4)]);
        assert!(peaks.windows(2).all(|pair| pair[0].value >= pair[1].value));
    }

    #[test]
    fn minimum_prefers_first_cell_on_ties() {
        let mut map = map();
        map.add_source(&InfluenceSource::linear(Vec2::new(0.5, 0.5), 5.0, 3.0));
        let minimum = map.find_minimum();
        assert_eq!(minimum.value, 0.0);
        assert_eq!(minimum.cell, CellCoord::new(3, 0));

        map.clear();
        assert_eq!(map.find_minimum().cell, CellCoord::new(0, 0));
    }
}
