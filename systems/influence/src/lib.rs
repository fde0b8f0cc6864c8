#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Layered spatial influence maps queried from continuous coordinates.

mod layers;
mod map;

pub use layers::{CoverageMap, ThreatMap, TrafficMap};
pub use map::{DecayShape, InfluenceMap, InfluenceSource, Sample};
