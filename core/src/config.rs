//! Caller-supplied tuning surface for the planner and its systems.
//!
//! Every threshold and curve constant consumed by the decision pipeline
//! lives here so that parameter sweeps only ever touch one struct.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::{ConfigError, FactionId, Rank};

/// Personality profile that biases the bucket weights.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Profile {
    /// Neutral weighting across every bucket.
    #[default]
    Balanced,
    /// Pushes defenses outward and spends eagerly.
    Aggressive,
    /// Hugs the goal and neglects expansion.
    Defensive,
    /// Favours upgrades over new construction.
    Economic,
}

impl Profile {
    /// Multipliers applied to the context-derived bucket weights.
    #[must_use]
    pub const fn bias(self) -> BucketBias {
        match self {
            Self::Balanced => BucketBias {
                survival: 1.0,
                defense: 1.0,
                economy: 1.0,
                expansion: 1.0,
            },
            Self::Aggressive => BucketBias {
                survival: 0.9,
                defense: 1.1,
                economy: 0.7,
                expansion: 1.4,
            },
            Self::Defensive => BucketBias {
                survival: 1.2,
                defense: 1.3,
                economy: 0.8,
                expansion: 0.6,
            },
            Self::Economic => BucketBias {
                survival: 1.0,
                defense: 0.9,
                economy: 1.4,
                expansion: 1.0,
            },
        }
    }
}

/// Per-bucket weight multipliers.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct BucketBias {
    /// Multiplier applied to the survival weight.
    pub survival: f32,
    /// Multiplier applied to the defense weight.
    pub defense: f32,
    /// Multiplier applied to the economy weight.
    pub economy: f32,
    /// Multiplier applied to the expansion weight.
    pub expansion: f32,
}

/// Steepness of the non-linear scoring curves.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CurveTuning {
    /// Growth rate of the exponential urgency curve.
    pub urgency_steepness: f32,
    /// Slope of the logistic threat-response curve.
    pub threat_response_steepness: f32,
    /// Normalised threat at which the logistic response crosses one half.
    pub threat_response_midpoint: f32,
}

impl Default for CurveTuning {
    fn default() -> Self {
        Self {
            urgency_steepness: 4.0,
            threat_response_steepness: 10.0,
            threat_response_midpoint: 0.35,
        }
    }
}

/// Decision inertia parameters.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InertiaTuning {
    /// Priority bonus granted to candidates repeating the last executed kind.
    pub bonus: f32,
    /// Margin a different kind must exceed to displace the favoured kind.
    pub switch_threshold: f32,
    /// Milliseconds after the last execution during which inertia applies.
    pub persistence_ms: u64,
}

impl InertiaTuning {
    /// Window during which the favoured kind keeps its bonus.
    #[must_use]
    pub const fn persistence(&self) -> Duration {
        Duration::from_millis(self.persistence_ms)
    }
}

impl Default for InertiaTuning {
    fn default() -> Self {
        Self {
            bonus: 0.1,
            switch_threshold: 0.05,
            persistence_ms: 3_000,
        }
    }
}

/// Threat multiplier applied to one faction.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct FactionMultiplier {
    /// Faction the multiplier applies to.
    pub faction: u16,
    /// Multiplier applied to the hostile's threat score.
    pub multiplier: f32,
}

/// Threat scoring and trajectory prediction parameters.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ThreatTuning {
    /// Weight of goal proximity in the threat score.
    pub proximity_weight: f32,
    /// Weight of normalised speed in the threat score.
    pub speed_weight: f32,
    /// Weight of remaining health in the threat score.
    pub health_weight: f32,
    /// Distance at which proximity drops to zero.
    pub reference_distance: f32,
    /// Speed treated as "fast" when normalising.
    pub reference_speed: f32,
    /// Score multiplier applied to elites.
    pub elite_multiplier: f32,
    /// Score multiplier applied to bosses.
    pub boss_multiplier: f32,
    /// Per-faction score multipliers; unlisted factions use one.
    pub faction_multipliers: Vec<FactionMultiplier>,
    /// Fraction of forward progress kept by weaving hostiles.
    pub weave_factor: f32,
    /// How strongly swarming hostiles steer toward the goal, in `[0, 1]`.
    pub swarm_blend: f32,
    /// Score sum at which the overall threat level reaches ~63 percent.
    pub level_scale: f32,
    /// Strength of the predicted-position source relative to the primary one.
    pub secondary_factor: f32,
    /// Radius of each threat influence source.
    pub source_radius: f32,
}

impl ThreatTuning {
    /// Score multiplier for the provided faction.
    #[must_use]
    pub fn faction_multiplier(&self, faction: FactionId) -> f32 {
        self.faction_multipliers
            .iter()
            .find(|entry| entry.faction == faction.get())
            .map_or(1.0, |entry| entry.multiplier)
    }

    /// Score multiplier for the provided rank.
    #[must_use]
    pub fn rank_multiplier(&self, rank: Rank) -> f32 {
        match rank {
            Rank::Regular => 1.0,
            Rank::Elite => self.elite_multiplier,
            Rank::Boss => self.boss_multiplier,
        }
    }
}

impl Default for ThreatTuning {
    fn default() -> Self {
        Self {
            proximity_weight: 0.5,
            speed_weight: 0.3,
            health_weight: 0.2,
            reference_distance: 30.0,
            reference_speed: 4.0,
            elite_multiplier: 1.5,
            boss_multiplier: 3.0,
            faction_multipliers: Vec::new(),
            weave_factor: 0.8,
            swarm_blend: 0.5,
            level_scale: 1.0,
            secondary_factor: 0.5,
            source_radius: 6.0,
        }
    }
}

/// Interception search parameters.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InterceptionTuning {
    /// Engagement radius assumed for a new defense.
    pub radius: f32,
    /// Number of concentric sampling rings around the goal.
    pub ring_count: u32,
    /// Samples taken on each ring.
    pub samples_per_ring: u32,
    /// Samples taken along each predicted trajectory.
    pub trajectory_samples: u32,
    /// Minimum estimated dwell time, in seconds, a candidate must offer.
    pub min_dwell_time: f32,
    /// Maximum number of interception points returned.
    pub max_results: u32,
    /// Hostile speed assumed when no hostile is alive.
    pub reference_speed: f32,
    /// Weight of normalised traffic density.
    pub traffic_weight: f32,
    /// Weight of flow perpendicularity.
    pub perpendicularity_weight: f32,
    /// Weight of intercepted trajectory quality.
    pub intercept_weight: f32,
    /// Weight of normalised dwell time.
    pub dwell_weight: f32,
}

impl Default for InterceptionTuning {
    fn default() -> Self {
        Self {
            radius: 4.0,
            ring_count: 4,
            samples_per_ring: 24,
            trajectory_samples: 6,
            min_dwell_time: 0.5,
            max_results: 8,
            reference_speed: 3.0,
            traffic_weight: 0.35,
            perpendicularity_weight: 0.15,
            intercept_weight: 0.35,
            dwell_weight: 0.15,
        }
    }
}

/// Complete configuration of the decision engine.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlannerConfig {
    /// Minimum milliseconds between two decisions.
    pub decision_interval_ms: u64,
    /// Rows of the coverage sector grid.
    pub sector_rows: u32,
    /// Columns of the coverage sector grid.
    pub sector_cols: u32,
    /// Seconds hostiles are extrapolated forward.
    pub prediction_horizon_secs: f32,
    /// Minimum distance between two defenses.
    pub min_spacing: f32,
    /// Closest a new defense may be to the goal.
    pub min_distance_from_goal: f32,
    /// Farthest a new defense may be from the goal.
    pub max_distance_from_goal: f32,
    /// Placements closer than this count as defense, farther as expansion.
    pub defense_radius: f32,
    /// Resources kept back from economy and expansion spending.
    pub emergency_reserve: u32,
    /// Bucket bias profile.
    pub profile: Profile,
    /// Scoring curve steepness.
    pub curves: CurveTuning,
    /// Decision inertia.
    pub inertia: InertiaTuning,
    /// Threat scoring and prediction.
    pub threat: ThreatTuning,
    /// Interception search.
    pub interception: InterceptionTuning,
    /// Cell size of the influence maps, in world units.
    pub influence_cell_size: f32,
    /// Every n-th boundary cell seeds a traffic trace.
    pub traffic_boundary_stride: u32,
}

impl Default for PlannerConfig {
    fn default() -> Self {
        Self {
            decision_interval_ms: 500,
            sector_rows: 4,
            sector_cols: 4,
            prediction_horizon_secs: 3.0,
            min_spacing: 3.0,
            min_distance_from_goal: 3.0,
            max_distance_from_goal: 18.0,
            defense_radius: 9.0,
            emergency_reserve: 50,
            profile: Profile::Balanced,
            curves: CurveTuning::default(),
            inertia: InertiaTuning::default(),
            threat: ThreatTuning::default(),
            interception: InterceptionTuning::default(),
            influence_cell_size: 2.0,
            traffic_boundary_stride: 2,
        }
    }
}

impl PlannerConfig {
    /// Minimum time between two decisions.
    #[must_use]
    pub const fn decision_interval(&self) -> Duration {
        Duration::from_millis(self.decision_interval_ms)
    }

    /// Validates every option, reporting the first violation.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.sector_rows == 0 {
            return Err(ConfigError::ZeroCount("sector_rows"));
        }
        if self.sector_cols == 0 {
            return Err(ConfigError::ZeroCount("sector_cols"));
        }
        if self.traffic_boundary_stride == 0 {
            return Err(ConfigError::ZeroCount("traffic_boundary_stride"));
        }
        if !(self.influence_cell_size.is_finite() && self.influence_cell_size > 0.0) {
            return Err(ConfigError::InvalidCellSize(self.influence_cell_size));
        }

        non_negative("prediction_horizon_secs", self.prediction_horizon_secs)?;
        non_negative("min_spacing", self.min_spacing)?;
        non_negative("min_distance_from_goal", self.min_distance_from_goal)?;
        non_negative("max_distance_from_goal", self.max_distance_from_goal)?;
        if self.min_distance_from_goal > self.max_distance_from_goal {
            return Err(ConfigError::InvertedRange {
                lower: "min_distance_from_goal",
                lower_value: self.min_distance_from_goal,
                upper: "max_distance_from_goal",
                upper_value: self.max_distance_from_goal,
            });
        }
        positive_radius(self.defense_radius)?;

        let bias = self.profile.bias();
        for value in [bias.survival, bias.defense, bias.economy, bias.expansion] {
            non_negative("profile bias", value)?;
        }

        within("curves.urgency_steepness", self.curves.urgency_steepness, 1e-3, 100.0)?;
        within(
            "curves.threat_response_steepness",
            self.curves.threat_response_steepness,
            1e-3,
            100.0,
        )?;
        within(
            "curves.threat_response_midpoint",
            self.curves.threat_response_midpoint,
            0.0,
            1.0,
        )?;

        non_negative("inertia.bonus", self.inertia.bonus)?;
        non_negative("inertia.switch_threshold", self.inertia.switch_threshold)?;

        let threat = &self.threat;
        for (field, value) in [
            ("threat.proximity_weight", threat.proximity_weight),
            ("threat.speed_weight", threat.speed_weight),
            ("threat.health_weight", threat.health_weight),
            ("threat.elite_multiplier", threat.elite_multiplier),
            ("threat.boss_multiplier", threat.boss_multiplier),
            ("threat.secondary_factor", threat.secondary_factor),
        ] {
            non_negative(field, value)?;
        }
        for entry in &threat.faction_multipliers {
            non_negative("threat.faction_multipliers", entry.multiplier)?;
        }
        within("threat.weave_factor", threat.weave_factor, 0.0, 1.0)?;
        within("threat.swarm_blend", threat.swarm_blend, 0.0, 1.0)?;
        strictly_positive("threat.reference_distance", threat.reference_distance)?;
        strictly_positive("threat.reference_speed", threat.reference_speed)?;
        strictly_positive("threat.level_scale", threat.level_scale)?;
        positive_radius(threat.source_radius)?;

        let interception = &self.interception;
        positive_radius(interception.radius)?;
        if interception.ring_count == 0 {
            return Err(ConfigError::ZeroCount("interception.ring_count"));
        }
        if interception.samples_per_ring == 0 {
            return Err(ConfigError::ZeroCount("interception.samples_per_ring"));
        }
        non_negative("interception.min_dwell_time", interception.min_dwell_time)?;
        strictly_positive("interception.reference_speed", interception.reference_speed)?;
        for (field, value) in [
            ("interception.traffic_weight", interception.traffic_weight),
            (
                "interception.perpendicularity_weight",
                interception.perpendicularity_weight,
            ),
            ("interception.intercept_weight", interception.intercept_weight),
            ("interception.dwell_weight", interception.dwell_weight),
        ] {
            non_negative(field, value)?;
        }

        Ok(())
    }
}

fn within(field: &'static str, value: f32, min: f32, max: f32) -> Result<(), ConfigError> {
    if value.is_finite() && value >= min && value <= max {
        Ok(())
    } else {
        Err(ConfigError::OutOfRange {
            field,
            value,
            min,
            max,
        })
    }
}

fn non_negative(field: &'static str, value: f32) -> Result<(), ConfigError> {
    within(field, value, 0.0, f32::MAX)
}

fn strictly_positive(field: &'static str, value: f32) -> Result<(), ConfigError> {
    within(field, value, f32::MIN_POSITIVE, f32::MAX)
}

fn positive_radius(value: f32) -> Result<(), ConfigError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(ConfigError::InvalidRadius(value))
    }
}

#[cfg(test)]
mod tests {
    use super::{FactionMultiplier, PlannerConfig, Profile};
    use crate::{ConfigError, FactionId, Rank};

    #[test]
    fn default_configuration_is_valid() {
        assert_eq!(PlannerConfig::default().validate(), Ok(()));
    }

    #[test]
    fn zero_cell_size_is_rejected() {
        let config = PlannerConfig {
            influence_cell_size: 0.0,
            ..PlannerConfig::default()
        };
        assert_eq!(config.validate(), Err(ConfigError::InvalidCellSize(0.0)));
    }

    #[test]
    fn negative_radius_is_rejected() {
        let mut config = PlannerConfig::default();
        config.interception.radius = -2.0;
        assert_eq!(config.validate(), Err(ConfigError::InvalidRadius(-2.0)));
    }

    #[test]
    fn inverted_distance_band_is_rejected() {
        let config = PlannerConfig {
            min_distance_from_goal: 10.0,
            max_distance_from_goal: 5.0,
            ..PlannerConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvertedRange { .. })
        ));
    }

    #[test]
    fn empty_sector_grid_is_rejected() {
        let config = PlannerConfig {
            sector_cols: 0,
            ..PlannerConfig::default()
        };
        assert_eq!(config.validate(), Err(ConfigError::ZeroCount("sector_cols")));
    }

    #[test]
    fn every_profile_biases_toward_its_personality() {
        assert!(Profile::Economic.bias().economy > Profile::Balanced.bias().economy);
        assert!(Profile::Defensive.bias().defense > Profile::Balanced.bias().defense);
        assert!(Profile::Aggressive.bias().expansion > Profile::Balanced.bias().expansion);
    }

    #[test]
    fn multipliers_fall_back_to_one() {
        let mut config = PlannerConfig::default();
        config.threat.faction_multipliers.push(FactionMultiplier {
            faction: 7,
            multiplier: 2.5,
        });
        assert_eq!(config.threat.faction_multiplier(FactionId::new(7)), 2.5);
        assert_eq!(config.threat.faction_multiplier(FactionId::new(1)), 1.0);
        assert_eq!(config.threat.rank_multiplier(Rank::Boss), 3.0);
    }
}
