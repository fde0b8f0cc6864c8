#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Utility-driven decision engine for the defending side.
//!
//! Every decision tick the [`DecisionEngine`] reads a frozen battlefield
//! snapshot, refreshes navigation and influence layers, scores threats and
//! coverage, weighs the four priority buckets through response curves, and
//! emits at most one action that the injected legality authority accepts.

mod buckets;
mod curves;
mod engine;
mod inertia;

pub use buckets::{classify, BucketWeights, DecisionContext};
pub use curves::{CurveShape, ResponseCurve};
pub use engine::{DecisionEngine, EngineState, SkipReason, TickReport};
pub use inertia::InertiaTracker;
