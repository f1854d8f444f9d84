//! Memqos - Memory QoS analyzer for contention benchmarks
//!
//! This library loads periodically-sampled system metrics annotated with a
//! workload phase label, computes per-phase summary statistics, assesses how
//! much available memory each phase retained relative to the baseline, and
//! renders a multi-panel dashboard of the run.

pub mod analysis;
pub mod chart;
pub mod cli;
pub mod metrics;
pub mod phase;
pub mod report;
