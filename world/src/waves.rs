//! Seeded hostile wave composition.

use rampart_core::{Bounds, FactionId, MovementBehavior, Rank, Vec2};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

use crate::HostileSpawn;

const BEHAVIORS: [MovementBehavior; 5] = [
    MovementBehavior::Direct,
    MovementBehavior::Weaving,
    MovementBehavior::Orbiting,
    MovementBehavior::Swarming,
    MovementBehavior::Hunter,
];

/// Growth of wave size and hostile strength.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WaveTuning {
    /// Hostiles in the first wave.
    pub base_count: u32,
    /// Hostiles added per wave.
    pub count_growth: u32,
    /// Speed of a first-wave hostile in world units per second.
    pub base_speed: f32,
    /// Relative speed gained per wave.
    pub speed_growth: f32,
    /// Hit points of a first-wave hostile.
    pub base_health: f32,
    /// Relative hit points gained per wave.
    pub health_growth: f32,
    /// Probability that a hostile spawns as an elite.
    pub elite_chance: f64,
    /// Every n-th wave leads with a boss; zero disables bosses.
    pub boss_every: u32,
    /// Number of factions hostiles are drawn from.
    pub factions: u16,
}

impl Default for WaveTuning {
    fn default() -> Self {
        Self {
            base_count: 4,
            count_growth: 2,
            base_speed: 2.0,
            speed_growth: 0.08,
            base_health: 20.0,
            health_growth: 0.25,
            elite_chance: 0.15,
            boss_every: 5,
            factions: 2,
        }
    }
}

/// Deterministic wave generator; equal seeds yield equal waves.
#[derive(Clone, Debug)]
pub struct WaveSpawner {
    rng: ChaCha8Rng,
    bounds: Bounds,
    tuning: WaveTuning,
}

impl WaveSpawner {
    /// Creates a spawner whose hostiles enter from the edges of `bounds`.
    #[must_use]
    pub fn new(seed: u64, bounds: Bounds, tuning: WaveTuning) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(seed),
            bounds,
            tuning,
        }
    }

    /// Composes the hostiles of the provided one-based wave.
    pub fn compose(&mut self, wave: u32) -> Vec<HostileSpawn> {
        let tuning = &self.tuning;
        let waves_elapsed = wave.saturating_sub(1);
        let count = tuning
            .base_count
            .saturating_add(tuning.count_growth.saturating_mul(waves_elapsed));
        let scale = waves_elapsed as f32;
        let speed = tuning.base_speed * (1.0 + tuning.speed_growth * scale);
        let health = tuning.base_health * (1.0 + tuning.health_growth * scale);
        let boss_wave = tuning.boss_every > 0 && wave > 0 && wave % tuning.boss_every == 0;
        let elite_chance = tuning.elite_chance.clamp(0.0, 1.0);
        let factions = tuning.factions.max(1);

        let mut spawns = Vec::with_capacity(count as usize);
        for index in 0..count {
            let rank = if boss_wave && index == 0 {
                Rank::Boss
            } else if self.rng.gen_bool(elite_chance) {
                Rank::Elite
            } else {
                Rank::Regular
            };
            let (speed, health) = match rank {
                Rank::Regular => (speed, health),
                Rank::Elite => (speed * 1.1, health * 2.0),
                Rank::Boss => (speed * 0.7, health * 8.0),
            };
            let behavior = BEHAVIORS[self.rng.gen_range(0..BEHAVIORS.len())];
            let faction = FactionId::new(self.rng.gen_range(0..factions));
            let position = self.edge_point();

            spawns.push(HostileSpawn {
                position,
                speed,
                health,
                behavior,
                faction,
                rank,
            });
        }
        spawns
    }

    fn edge_point(&mut self) -> Vec2 {
        let min = self.bounds.min();
        let max = self.bounds.max();
        let t: f32 = self.rng.gen_range(0.0..1.0);
        let x = min.x + (max.x - min.x) * t;
        let y = min.y + (max.y - min.y) * t;
        let inset = 0.5;
        match self.rng.gen_range(0..4u8) {
            0 => Vec2::new(x, min.y + inset),
            1 => Vec2::new(x, max.y - inset),
            2 => Vec2::new(min.x + inset, y),
            _ => Vec2::new(max.x - inset, y),
        }
    }
}
