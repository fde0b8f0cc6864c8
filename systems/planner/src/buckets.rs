//! Priority buckets and their context-derived weights.

use rampart_core::{ActionParams, Bucket, CurveTuning, Profile, Vec2};

use crate::curves::ResponseCurve;

/// Health below which the survival bucket wakes up.
const SURVIVAL_HEALTH: f32 = 0.5;
/// Expansion requires at least this much goal health.
const EXPANSION_HEALTH: f32 = 0.8;
/// Expansion requires at least this much sector coverage.
const EXPANSION_COVERAGE: f32 = 0.6;
/// Expansion is suppressed above this normalised threat.
const EXPANSION_THREAT: f32 = 0.2;
/// Economy loses this much appeal per wave, down to the floor below.
const ECONOMY_WAVE_DECAY: f32 = 0.1;
const ECONOMY_FLOOR: f32 = 0.3;
/// Expansion weight at full coverage.
const EXPANSION_SCALE: f32 = 0.6;

/// Battlefield summary that drives the bucket weights.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DecisionContext {
    /// Goal health fraction in `[0, 1]`.
    pub health: f32,
    /// Overall threat level normalised to `[0, 1]`.
    pub threat: f32,
    /// Fraction of sectors reached by any placement.
    pub coverage: f32,
    /// One-based wave counter.
    pub wave: u32,
}

/// Weight of every bucket for one decision.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct BucketWeights {
    weights: [f32; 4],
}

impl BucketWeights {
    /// Derives the weights from the context, then applies the profile bias.
    #[must_use]
    pub fn from_context(context: &DecisionContext, curves: &CurveTuning, profile: Profile) -> Self {
        let health = context.health.clamp(0.0, 1.0);
        let threat = context.threat.clamp(0.0, 1.0);
        let coverage = context.coverage.clamp(0.0, 1.0);

        let urgency = ResponseCurve::exponential(curves.urgency_steepness).inverted();
        let threat_response = ResponseCurve::logistic(
            curves.threat_response_steepness,
            curves.threat_response_midpoint,
        );
        let gap = ResponseCurve::quadratic();

        let survival = if health < SURVIVAL_HEALTH {
            urgency.evaluate(health / SURVIVAL_HEALTH)
        } else {
            0.0
        };

        let response = threat_response.evaluate(threat);
        let defense = response.max(gap.evaluate(1.0 - coverage));

        let waves_elapsed = context.wave.saturating_sub(1) as f32;
        let early_wave = (1.0 - ECONOMY_WAVE_DECAY * waves_elapsed).max(ECONOMY_FLOOR);
        let economy = early_wave * (1.0 - response) * (1.0 - response);

        let expansion = if health >= EXPANSION_HEALTH
            && coverage >= EXPANSION_COVERAGE
            && threat <= EXPANSION_THREAT
        {
            EXPANSION_SCALE * coverage * (1.0 - threat)
        } else {
            0.0
        };

        let bias = profile.bias();
        Self {
            weights: [
                survival * bias.survival,
                defense * bias.defense,
                economy * bias.economy,
                expansion * bias.expansion,
            ],
        }
    }

    /// Weight of a single bucket.
    #[must_use]
    pub const fn get(&self, bucket: Bucket) -> f32 {
        self.weights[bucket.index()]
    }

    /// Buckets with a positive weight, heaviest first; ties keep precedence order.
    #[must_use]
    pub fn ranked(&self) -> Vec<Bucket> {
        let mut buckets: Vec<Bucket> = Bucket::ALL
            .into_iter()
            .filter(|bucket| self.get(*bucket) > 0.0)
            .collect();
        buckets.sort_by(|a, b| self.get(*b).total_cmp(&self.get(*a)));
        buckets
    }
}

/// Bucket an action belongs to.
///
/// Liquidations raise emergency funds, upgrades grow existing value, and
/// placements defend or expand depending on their distance from the goal.
#[must_use]
pub fn classify(params: &ActionParams, goal: Vec2, defense_radius: f32) -> Bucket {
    match params {
        ActionParams::Liquidate { .. } => Bucket::Survival,
        ActionParams::Upgrade { .. } => Bucket::Economy,
        ActionParams::Place { position } => {
            if position.distance(goal) <= defense_radius {
                Bucket::Defense
            } else {
                Bucket::Expansion
            }
        }
    }
}

/// Preference in `[0, 1]` for a placement `distance` from the goal.
///
/// The distance is normalised over the placement band and passed through a
/// quadratic curve, inverted for defense so nearer sites score higher.
pub(crate) fn distance_preference(bucket: Bucket, distance: f32, min: f32, max: f32) -> f32 {
    let span = max - min;
    let t = if span > f32::EPSILON {
        (distance - min) / span
    } else {
        0.0
    };
    let curve = match bucket {
        Bucket::Defense => ResponseCurve::quadratic().inverted(),
        _ => ResponseCurve::quadratic(),
    };
    curve.evaluate(t)
}
