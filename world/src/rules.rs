//! Reference pricing and legality rules.

use rampart_core::{
    ActionParams, BattlefieldSnapshot, Bounds, CandidateAction, ConfigError, LegalityAuthority,
    Obstacle, PlacementSnapshot, Rejection, Vec2, IMPASSABLE,
};
use serde::{Deserialize, Serialize};

/// Prices and construction constraints enforced by [`StandardRules`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RulesConfig {
    /// Price of the first defense.
    pub placement_cost: u32,
    /// Added to the placement price for every defense already standing.
    pub cost_growth: u32,
    /// Upgrade price per target level.
    pub upgrade_cost: u32,
    /// Highest reachable upgrade level.
    pub max_level: u8,
    /// Fraction of the nominal investment returned on liquidation.
    pub refund_ratio: f32,
    /// Minimum distance between two defenses.
    pub min_spacing: f32,
    /// Radius around the goal where nothing may be built.
    pub goal_clearance: f32,
    /// Reach of a level-zero defense.
    pub range: f32,
    /// Reach gained per upgrade level.
    pub range_per_level: f32,
    /// Damage per second of a level-zero defense.
    pub damage_per_second: f32,
    /// Damage per second gained per upgrade level.
    pub damage_per_level: f32,
}

impl Default for RulesConfig {
    fn default() -> Self {
        Self {
            placement_cost: 100,
            cost_growth: 10,
            upgrade_cost: 60,
            max_level: 3,
            refund_ratio: 0.6,
            min_spacing: 3.0,
            goal_clearance: 2.0,
            range: 5.0,
            range_per_level: 1.0,
            damage_per_second: 4.0,
            damage_per_level: 3.0,
        }
    }
}

impl RulesConfig {
    pub(crate) fn validate(&self) -> Result<(), ConfigError> {
        for (field, value) in [
            ("rules.min_spacing", self.min_spacing),
            ("rules.goal_clearance", self.goal_clearance),
            ("rules.range_per_level", self.range_per_level),
            ("rules.damage_per_second", self.damage_per_second),
            ("rules.damage_per_level", self.damage_per_level),
        ] {
            if !(value.is_finite() && value >= 0.0) {
                return Err(ConfigError::OutOfRange {
                    field,
                    value,
                    min: 0.0,
                    max: f32::MAX,
                });
            }
        }
        if !(0.0..=1.0).contains(&self.refund_ratio) {
            return Err(ConfigError::OutOfRange {
                field: "rules.refund_ratio",
                value: self.refund_ratio,
                min: 0.0,
                max: 1.0,
            });
        }
        if !(self.range.is_finite() && self.range > 0.0) {
            return Err(ConfigError::InvalidRadius(self.range));
        }
        Ok(())
    }
}

/// Legality authority of the reference world.
///
/// Both the decision engine and the world's executor consult the same rules,
/// so an action the engine emits is re-validated against the live state
/// before it is applied.
#[derive(Clone, Debug)]
pub struct StandardRules {
    config: RulesConfig,
    bounds: Bounds,
    goal: Vec2,
    obstacles: Vec<Obstacle>,
}

impl StandardRules {
    /// Creates rules for a play area with the provided goal and obstacles.
    #[must_use]
    pub fn new(config: RulesConfig, bounds: Bounds, goal: Vec2, obstacles: Vec<Obstacle>) -> Self {
        Self {
            config,
            bounds,
            goal,
            obstacles,
        }
    }

    /// Prices and constraints in force.
    #[must_use]
    pub const fn config(&self) -> &RulesConfig {
        &self.config
    }

    /// Nominal resources sunk into a defense of the provided level.
    #[must_use]
    pub fn investment(&self, level: u8) -> u32 {
        let level = u32::from(level);
        let upgrades = self.config.upgrade_cost.saturating_mul(level * (level + 1) / 2);
        self.config.placement_cost.saturating_add(upgrades)
    }

    fn site_rejection(&self, position: Vec2, snapshot: &BattlefieldSnapshot) -> Option<Rejection> {
        if !self.bounds.contains(position) {
            return Some(Rejection::OutOfBounds);
        }
        let blocked = position.distance(self.goal) < self.config.goal_clearance
            || self.obstacles.iter().any(|obstacle| {
                obstacle.cost == IMPASSABLE && obstacle.center.distance(position) <= obstacle.radius
            });
        if blocked {
            return Some(Rejection::Blocked);
        }
        let crowded = snapshot
            .placements
            .iter()
            .any(|placement| placement.position.distance(position) < self.config.min_spacing);
        crowded.then_some(Rejection::TooClose)
    }
}

impl LegalityAuthority for StandardRules {
    fn placement_cost(&self, snapshot: &BattlefieldSnapshot) -> u32 {
        let standing = u32::try_from(snapshot.placements.len()).unwrap_or(u32::MAX);
        self.config
            .placement_cost
            .saturating_add(self.config.cost_growth.saturating_mul(standing))
    }

    fn upgrade_cost(&self, placement: &PlacementSnapshot) -> Option<u32> {
        (placement.level < self.config.max_level)
            .then(|| self.config.upgrade_cost.saturating_mul(u32::from(placement.level) + 1))
    }

    fn liquidation_refund(&self, placement: &PlacementSnapshot) -> u32 {
        (self.investment(placement.level) as f32 * self.config.refund_ratio) as u32
    }

    fn validate(
        &self,
        action: &CandidateAction,
        snapshot: &BattlefieldSnapshot,
    ) -> Result<(), Rejection> {
        match action.params {
            ActionParams::Place { position } => {
                if let Some(rejection) = self.site_rejection(position, snapshot) {
                    return Err(rejection);
                }
                if self.placement_cost(snapshot) > snapshot.resources {
                    return Err(Rejection::Unaffordable);
                }
                Ok(())
            }
            ActionParams::Upgrade { placement } => {
                let placement = snapshot
                    .placements
                    .get(placement)
                    .ok_or(Rejection::MissingPlacement)?;
                let cost = self
                    .upgrade_cost(placement)
                    .ok_or(Rejection::UpgradeCeiling)?;
                if cost > snapshot.resources {
                    return Err(Rejection::Unaffordable);
                }
                Ok(())
            }
            ActionParams::Liquidate { placement } => snapshot
                .placements
                .get(placement)
                .map(|_| ())
                .ok_or(Rejection::MissingPlacement),
        }
    }
}
