//! Authoritative defense state management utilities.

use std::collections::BTreeMap;

use rampart_core::{PlacementId, PlacementSnapshot, Vec2};

use crate::rules::RulesConfig;

/// Defense stored inside the world.
#[derive(Clone, Debug)]
pub(crate) struct PlacementState {
    /// Identifier allocated by the world for the defense.
    pub(crate) id: PlacementId,
    /// Centre of the defense in world units.
    pub(crate) position: Vec2,
    /// Upgrade level, starting at zero.
    pub(crate) level: u8,
}

impl PlacementState {
    pub(crate) fn snapshot(&self, rules: &RulesConfig) -> PlacementSnapshot {
        let level = f32::from(self.level);
        PlacementSnapshot {
            id: self.id,
            position: self.position,
            range: rules.range + rules.range_per_level * level,
            damage_per_second: rules.damage_per_second + rules.damage_per_level * level,
            level: self.level,
        }
    }
}

/// Registry that stores defenses and manages identifier allocation.
#[derive(Debug)]
pub(crate) struct PlacementRegistry {
    entries: BTreeMap<PlacementId, PlacementState>,
    next_placement_id: PlacementId,
}

impl PlacementRegistry {
    /// Creates an empty registry with a reset identifier counter.
    pub(crate) fn new() -> Self {
        Self {
            entries: BTreeMap::new(),
            next_placement_id: PlacementId::new(0),
        }
    }

    /// Stores a new level-zero defense and returns its identifier.
    pub(crate) fn insert(&mut self, position: Vec2) -> PlacementId {
        let id = self.next_placement_id;
        self.next_placement_id = PlacementId::new(id.get().saturating_add(1));
        let _ = self.entries.insert(
            id,
            PlacementState {
                id,
                position,
                level: 0,
            },
        );
        id
    }

    pub(crate) fn get_mut(&mut self, id: PlacementId) -> Option<&mut PlacementState> {
        self.entries.get_mut(&id)
    }

    pub(crate) fn remove(&mut self, id: PlacementId) -> Option<PlacementState> {
        self.entries.remove(&id)
    }

    /// Defenses in identifier order.
    pub(crate) fn iter(&self) -> impl Iterator<Item = &PlacementState> {
        self.entries.values()
    }
}
