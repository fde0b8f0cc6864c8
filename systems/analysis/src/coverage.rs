//! Sector-level summary of how well the placements cover the play area.

use rampart_core::{Bounds, ConfigError, HostileView, PlacementView, ThreatVector, Vec2};

/// Aggregated statistics for one sector of the coverage grid.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SectorCoverage {
    /// Row-major index of the sector.
    pub index: usize,
    /// Sector row.
    pub row: u32,
    /// Sector column.
    pub column: u32,
    /// World-space centre of the sector.
    pub center: Vec2,
    /// Placements located inside the sector.
    pub placement_count: u32,
    /// Combined damage output of placements located inside the sector.
    pub total_dps: f32,
    /// Damage output of every placement whose range reaches the sector centre.
    pub reaching_dps: f32,
    /// Live hostiles located inside the sector.
    pub hostile_count: u32,
    /// Summed threat score of hostiles located inside the sector.
    pub threat: f32,
}

impl SectorCoverage {
    /// Reaching damage relative to local threat; lower is weaker.
    #[must_use]
    pub fn strength(&self) -> f32 {
        self.reaching_dps / (1.0 + self.threat)
    }
}

/// Result of a single coverage pass.
#[derive(Clone, Debug, PartialEq)]
pub struct CoverageReport {
    sectors: Vec<SectorCoverage>,
    weakest: usize,
    coverage: f32,
}

impl CoverageReport {
    /// Every sector in row-major order.
    #[must_use]
    pub fn sectors(&self) -> &[SectorCoverage] {
        &self.sectors
    }

    /// Sector with the lowest strength, first in row-major order on ties.
    #[must_use]
    pub fn weakest(&self) -> &SectorCoverage {
        &self.sectors[self.weakest]
    }

    /// Fraction of sectors reached by at least one placement, in `[0, 1]`.
    #[must_use]
    pub const fn coverage(&self) -> f32 {
        self.coverage
    }
}

/// Partitions the play area into a fixed sector grid and summarises each sector.
#[derive(Clone, Debug)]
pub struct CoverageAnalyzer {
    bounds: Bounds,
    rows: u32,
    columns: u32,
}

impl CoverageAnalyzer {
    /// Creates an analyzer with a `rows × columns` sector grid.
    pub fn new(bounds: Bounds, rows: u32, columns: u32) -> Result<Self, ConfigError> {
        if !bounds.is_valid() {
            return Err(ConfigError::EmptyBounds);
        }
        if rows == 0 {
            return Err(ConfigError::ZeroCount("sector_rows"));
        }
        if columns == 0 {
            return Err(ConfigError::ZeroCount("sector_cols"));
        }

        Ok(Self {
            bounds,
            rows,
            columns,
        })
    }

    /// Number of sectors in the grid.
    #[must_use]
    pub fn sector_count(&self) -> usize {
        self.rows as usize * self.columns as usize
    }

    /// Index of the sector containing the position, clamping positions outside the area.
    #[must_use]
    pub fn sector_of(&self, position: Vec2) -> usize {
        let local = (self.bounds.clamp(position) - self.bounds.min())
            / Vec2::new(self.bounds.width(), self.bounds.height());
        let column = ((local.x * self.columns as f32) as u32).min(self.columns - 1);
        let row = ((local.y * self.rows as f32) as u32).min(self.rows - 1);
        row as usize * self.columns as usize + column as usize
    }

    /// Summarises the battlefield; calling it twice on the same inputs yields equal reports.
    #[must_use]
    pub fn analyze(
        &self,
        placements: &PlacementView,
        hostiles: &HostileView,
        threats: &[ThreatVector],
    ) -> CoverageReport {
        let size = Vec2::new(
            self.bounds.width() / self.columns as f32,
            self.bounds.height() / self.rows as f32,
        );
        let mut sectors: Vec<SectorCoverage> = (0..self.sector_count())
            .map(|index| {
                let column = (index % self.columns as usize) as u32;
                let row = (index / self.columns as usize) as u32;
                SectorCoverage {
                    index,
                    row,
                    column,
                    center: self.bounds.min()
                        + Vec2::new(column as f32 + 0.5, row as f32 + 0.5) * size,
                    placement_count: 0,
                    total_dps: 0.0,
                    reaching_dps: 0.0,
                    hostile_count: 0,
                    threat: 0.0,
                }
            })
            .collect();

        for placement in placements.iter() {
            let home = &mut sectors[self.sector_of(placement.position)];
            home.placement_count += 1;
            home.total_dps += placement.damage_per_second;

            for sector in &mut sectors {
                if sector.center.distance(placement.position) <= placement.range {
                    sector.reaching_dps += placement.damage_per_second;
                }
            }
        }

        for hostile in hostiles.iter() {
            sectors[self.sector_of(hostile.position)].hostile_count += 1;
        }
        for threat in threats {
            sectors[self.sector_of(threat.position)].threat += threat.score.max(0.0);
        }

        let reached = sectors
            .iter()
            .filter(|sector| sector.reaching_dps > 0.0)
            .count();
        let coverage = reached as f32 / sectors.len() as f32;

        let weakest = sectors
            .iter()
            .fold(0, |best, sector| {
                if sector.strength() < sectors[best].strength() {
                    sector.index
                } else {
                    best
                }
            });

        CoverageReport {
            sectors,
            weakest,
            coverage,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::CoverageAnalyzer;
    use rampart_core::{
        Bounds, ConfigError, HostileId, HostileView, PlacementId, PlacementSnapshot,
        PlacementView, ThreatVector, Vec2,
    };

    fn placement(id: u32, position: Vec2, range: f32) -> PlacementSnapshot {
        PlacementSnapshot {
            id: PlacementId::new(id),
            position,
            range,
            damage_per_second: 10.0,
            level: 0,
        }
    }

    fn analyzer() -> CoverageAnalyzer {
        CoverageAnalyzer::new(Bounds::from_size(40.0, 40.0), 2, 2).expect("valid analyzer")
    }

    #[test]
    fn zero_sector_grid_is_rejected() {
        let result = CoverageAnalyzer::new(Bounds::from_size(10.0, 10.0), 0, 3);
        assert!(matches!(result, Err(ConfigError::ZeroCount("sector_rows"))));
    }

    #[test]
    fn sectors_partition_the_area_row_major() {
        let analyzer = analyzer();
        assert_eq!(analyzer.sector_of(Vec2::new(1.0, 1.0)), 0);
        assert_eq!(analyzer.sector_of(Vec2::new(39.0, 1.0)), 1);
        assert_eq!(analyzer.sector_of(Vec2::new(1.0, 39.0)), 2);
        assert_eq!(analyzer.sector_of(Vec2::new(40.0, 40.0)), 3);
        assert_eq!(analyzer.sector_of(Vec2::new(-5.0, 90.0)), 2);
    }

    #[test]
    fn report_accumulates_per_sector_statistics() {
        let analyzer = analyzer();
        let placements = PlacementView::from_snapshots(vec![
            placement(0, Vec2::new(10.0, 10.0), 5.0),
            placement(1, Vec2::new(12.0, 12.0), 30.0),
        ]);
        let report = analyzer.analyze(&placements, &HostileView::default(), &[]);

        let first = &report.sectors()[0];
        assert_eq!(first.placement_count, 2);
        assert_eq!(first.total_dps, 20.0);
        assert_eq!(first.reaching_dps, 20.0);
        assert_eq!(report.sectors()[3].reaching_dps, 10.0);
        assert_eq!(report.coverage(), 1.0);
    }

    #[test]
    fn weakest_sector_weighs_local_threat() {
        let analyzer = analyzer();
        let placements = PlacementView::from_snapshots(vec![
            placement(0, Vec2::new(10.0, 10.0), 8.0),
            placement(1, Vec2::new(30.0, 10.0), 8.0),
            placement(2, Vec2::new(10.0, 30.0), 8.0),
            placement(3, Vec2::new(30.0, 30.0), 8.0),
        ]);
        let threat = ThreatVector {
            hostile: HostileId::new(1),
            position: Vec2::new(31.0, 31.0),
            velocity: Vec2::ZERO,
            predicted_position: Vec2::new(31.0, 31.0),
            distance_to_goal: 10.0,
            score: 2.0,
            impact_time: None,
        };
        let report = analyzer.analyze(&placements, &HostileView::default(), &[threat]);

        assert_eq!(report.weakest().index, 3);
        assert_eq!(report.weakest().threat, 2.0);
    }

    #[test]
    fn empty_battlefield_picks_first_sector() {
        let report = analyzer().analyze(&PlacementView::default(), &HostileView::default(), &[]);
        assert_eq!(report.weakest().index, 0);
        assert_eq!(report.coverage(), 0.0);
    }
}
