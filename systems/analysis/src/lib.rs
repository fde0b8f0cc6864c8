#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Pure threat and coverage analysis over immutable battlefield snapshots.
//!
//! Nothing in this crate mutates its inputs. [`ThreatAnalyzer`] turns hostile
//! snapshots into scored [`rampart_core::ThreatVector`]s and
//! [`CoverageAnalyzer`] condenses placements into a per-sector report.

mod coverage;
mod threat;

pub use coverage::{CoverageAnalyzer, CoverageReport, SectorCoverage};
pub use threat::ThreatAnalyzer;
