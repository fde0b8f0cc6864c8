//! Domain layers rebuilt from snapshots each decision cycle.

use rampart_core::{Bounds, ConfigError, PlacementView, ThreatTuning, ThreatVector, Vec2};
use rampart_system_navigation::Navigator;

use crate::map::{InfluenceMap, InfluenceSource};

/// Danger projected by live hostiles and their predicted positions.
#[derive(Clone, Debug)]
pub struct ThreatMap {
    map: InfluenceMap,
}

impl ThreatMap {
    /// Allocates an empty threat layer.
    pub fn new(bounds: Bounds, cell_size: f32) -> Result<Self, ConfigError> {
        Ok(Self {
            map: InfluenceMap::new(bounds, cell_size)?,
        })
    }

    /// Rebuilds the layer from the analysed threats.
    ///
    /// Each threat contributes its score at its current position and a
    /// weaker echo at its predicted position.
    pub fn rebuild(&mut self, threats: &[ThreatVector], tuning: &ThreatTuning) {
        self.map.clear();

        for threat in threats {
            self.map.add_source(&InfluenceSource::linear(
                threat.position,
                threat.score,
                tuning.source_radius,
            ));

            if threat.predicted_position != threat.position {
                self.map.add_source(&InfluenceSource::linear(
                    threat.predicted_position,
                    threat.score * tuning.secondary_factor,
                    tuning.source_radius,
                ));
            }
        }
    }

    /// Underlying influence map.
    #[must_use]
    pub const fn map(&self) -> &InfluenceMap {
        &self.map
    }
}

/// Damage output projected by placed defenses.
#[derive(Clone, Debug)]
pub struct CoverageMap {
    map: InfluenceMap,
}

impl CoverageMap {
    /// Allocates an empty coverage layer.
    pub fn new(bounds: Bounds, cell_size: f32) -> Result<Self, ConfigError> {
        Ok(Self {
            map: InfluenceMap::new(bounds, cell_size)?,
        })
    }

    /// Rebuilds the layer with one source per placement.
    pub fn rebuild(&mut self, placements: &PlacementView) {
        self.map.clear();

        for placement in placements.iter() {
            self.map.add_source(&InfluenceSource::linear(
                placement.position,
                placement.damage_per_second,
                placement.range,
            ));
        }
    }

    /// Underlying influence map.
    #[must_use]
    pub const fn map(&self) -> &InfluenceMap {
        &self.map
    }
}

/// Expected hostile traffic along flow-field paths from the boundary.
#[derive(Clone, Debug)]
pub struct TrafficMap {
    map: InfluenceMap,
    boundary_stride: usize,
    revision: Option<u64>,
}

impl TrafficMap {
    /// Allocates an empty traffic layer tracing every `boundary_stride`-th boundary cell.
    pub fn new(bounds: Bounds, cell_size: f32, boundary_stride: u32) -> Result<Self, ConfigError> {
        if boundary_stride == 0 {
            return Err(ConfigError::ZeroCount("traffic_boundary_stride"));
        }

        Ok(Self {
            map: InfluenceMap::new(bounds, cell_size)?,
            boundary_stride: boundary_stride as usize,
            revision: None,
        })
    }

    /// Retraces the layer when the navigator solved a new field since the last rebuild.
    ///
    /// Returns `true` when the layer was rebuilt.
    pub fn rebuild(&mut self, navigator: &Navigator) -> bool {
        if self.revision == Some(navigator.revision()) {
            return false;
        }
        self.revision = Some(navigator.revision());
        self.map.clear();

        let grid = navigator.grid();
        let budget = grid.cell_count();
        let mut path = Vec::new();
        let mut traced = 0_usize;

        for start in grid.boundary_cells().into_iter().step_by(self.boundary_stride) {
            path.clear();
            if !navigator.trace(start, budget, &mut path) {
                continue;
            }
            traced += 1;
            for &cell in &path {
                self.map.deposit(grid.cell_center(cell), 1.0);
            }
        }

        tracing::trace!(
            traced,
            revision = navigator.revision(),
            peak = self.map.max_value(),
            "traffic layer rebuilt"
        );
        true
    }

    /// Traffic at the position normalised by the busiest cell, in `[0, 1]`.
    #[must_use]
    pub fn density(&self, position: Vec2) -> f32 {
        let max = self.map.max_value();
        if max <= 0.0 {
            return 0.0;
        }
        (self.map.value_interpolated(position) / max).clamp(0.0, 1.0)
    }

    /// Navigator revision the layer was last traced from.
    #[must_use]
    pub const fn revision(&self) -> Option<u64> {
        self.revision
    }

    /// Underlying influence map.
    #[must_use]
    pub const fn map(&self) -> &InfluenceMap {
        &self.map
    }
}
