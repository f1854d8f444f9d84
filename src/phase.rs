//! Workload phase vocabulary
//!
//! A QoS benchmark run moves through four labeled stages. The set is closed:
//! statistics are only computed for these four, in this order. Labels outside
//! the set may still appear in input data and are tolerated (they occupy
//! timeline extent on the chart but contribute to no statistics).

use std::fmt;

/// A labeled stage of the sampling run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Phase {
    /// Idle system, reference for retention.
    Baseline,
    /// Competing workload starting up.
    Transition,
    /// Competing workload at full pressure.
    Contended,
    /// Competing workload stopped, system settling.
    Recovery,
}

impl Phase {
    /// Canonical iteration order. Load-bearing: statistics, retention bars,
    /// and the summary table all follow this order.
    pub const ALL: [Phase; 4] = [
        Phase::Baseline,
        Phase::Transition,
        Phase::Contended,
        Phase::Recovery,
    ];

    /// Resolve a raw label from the metrics file. Matching is exact and
    /// lowercase; anything else returns `None` and is ignored by the analyzer.
    pub fn from_label(label: &str) -> Option<Phase> {
        match label {
            "baseline" => Some(Phase::Baseline),
            "transition" => Some(Phase::Transition),
            "contended" => Some(Phase::Contended),
            "recovery" => Some(Phase::Recovery),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Phase::Baseline => "baseline",
            Phase::Transition => "transition",
            Phase::Contended => "contended",
            Phase::Recovery => "recovery",
        }
    }

    /// Chart color as an RGB triple (green/orange/red/blue). Kept as plain
    /// bytes so the analysis core stays free of any graphics dependency.
    pub fn color(&self) -> (u8, u8, u8) {
        match self {
            Phase::Baseline => (46, 204, 113),
            Phase::Transition => (243, 156, 18),
            Phase::Contended => (231, 76, 60),
            Phase::Recovery => (52, 152, 219),
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
