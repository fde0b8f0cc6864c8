//! Threat scoring and behaviour-driven trajectory prediction.

use std::cmp::Ordering;

use rampart_core::{HostileSnapshot, HostileView, MovementBehavior, ThreatTuning, ThreatVector, Vec2};

/// Scores hostiles and extrapolates where they will be.
#[derive(Clone, Debug)]
pub struct ThreatAnalyzer {
    tuning: ThreatTuning,
    horizon: f32,
}

impl ThreatAnalyzer {
    /// Creates an analyzer predicting `horizon` seconds ahead.
    #[must_use]
    pub fn new(tuning: ThreatTuning, horizon: f32) -> Self {
        Self {
            tuning,
            horizon: horizon.max(0.0),
        }
    }

    /// Scores every hostile, most dangerous first.
    ///
    /// Equal scores are ordered by hostile identifier.
    #[must_use]
    pub fn analyze_threats(&self, hostiles: &HostileView, goal: Vec2) -> Vec<ThreatVector> {
        let mut threats: Vec<ThreatVector> = hostiles
            .iter()
            .map(|hostile| self.assess(hostile, goal))
            .collect();

        threats.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(Ordering::Equal)
                .then_with(|| a.hostile.cmp(&b.hostile))
        });

        tracing::trace!(count = threats.len(), "threats analysed");
        threats
    }

    /// Aggregate threat in `[0, 100]` that saturates as scores accumulate.
    #[must_use]
    pub fn overall_threat_level(&self, threats: &[ThreatVector]) -> f32 {
        let total: f32 = threats
            .iter()
            .map(|threat| threat.score)
            .filter(|score| score.is_finite() && *score > 0.0)
            .sum();
        (100.0 * (1.0 - (-total / self.tuning.level_scale).exp())).clamp(0.0, 100.0)
    }

    /// Position of the hostile `horizon` seconds from now.
    ///
    /// The result never lies beyond the goal along the hostile's approach.
    #[must_use]
    pub fn predict(&self, hostile: &HostileSnapshot, goal: Vec2, horizon: f32) -> Vec2 {
        let position = hostile.position;
        let to_goal = goal - position;
        let distance = to_goal.length();
        if distance <= f32::EPSILON {
            return goal;
        }
        let toward = to_goal / distance;
        let speed = hostile.speed();
        let t = horizon.max(0.0);

        let predicted = match hostile.behavior {
            MovementBehavior::Direct => position + hostile.velocity * t,
            MovementBehavior::Weaving => position + hostile.velocity * t * self.tuning.weave_factor,
            MovementBehavior::Orbiting => {
                return orbit(position, hostile.velocity, goal, t);
            }
            MovementBehavior::Swarming => {
                let heading = hostile.velocity.normalize_or_zero() * (1.0 - self.tuning.swarm_blend)
                    + toward * self.tuning.swarm_blend;
                position + heading.normalize_or_zero() * speed * t
            }
            MovementBehavior::Hunter => position + toward * speed * t,
        };

        let advance = (predicted - position).dot(toward);
        if advance >= distance {
            goal
        } else {
            predicted
        }
    }

    fn assess(&self, hostile: &HostileSnapshot, goal: Vec2) -> ThreatVector {
        let tuning = &self.tuning;
        let distance = hostile.position.distance(goal);
        let speed = hostile.speed();

        let proximity = (1.0 - distance / tuning.reference_distance).clamp(0.0, 1.0);
        let speed_norm = (speed / tuning.reference_speed).clamp(0.0, 1.0);
        let health = hostile.health.clamp(0.0, 1.0);
        let base = tuning.proximity_weight * proximity
            + tuning.speed_weight * speed_norm
            + tuning.health_weight * health;
        let score = base
            * tuning.faction_multiplier(hostile.faction)
            * tuning.rank_multiplier(hostile.rank);

        ThreatVector {
            hostile: hostile.id,
            position: hostile.position,
            velocity: hostile.velocity,
            predicted_position: self.predict(hostile, goal, self.horizon),
            distance_to_goal: distance,
            score,
            impact_time: impact_time(hostile, goal, distance),
        }
    }
}

fn impact_time(hostile: &HostileSnapshot, goal: Vec2, distance: f32) -> Option<f32> {
    if distance <= f32::EPSILON {
        return Some(0.0);
    }

    let closing = match hostile.behavior {
        MovementBehavior::Hunter => hostile.speed(),
        _ => hostile.velocity.dot((goal - hostile.position) / distance),
    };
    (closing > f32::EPSILON).then(|| distance / closing)
}

fn orbit(position: Vec2, velocity: Vec2, goal: Vec2, t: f32) -> Vec2 {
    let offset = position - goal;
    let radius = offset.length();
    let radial = offset / radius;
    let tangent = radial.perp();

    let radial_speed = velocity.dot(radial).min(0.0);
    let angular_speed = velocity.dot(tangent) / radius;
    let next_radius = (radius + radial_speed * t).max(0.0);

    goal + Vec2::from_angle(angular_speed * t).rotate(radial) * next_radius
}
