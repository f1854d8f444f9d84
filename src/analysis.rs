//! Per-phase statistics and the memory-retention assessment
//!
//! The analyzer reduces a loaded dataset to one `PhaseStats` per present
//! phase, then derives the headline QoS number: how much of the baseline
//! phase's average available memory each phase retained. Pure functions over
//! an immutable dataset; re-running yields identical results.

use serde::{Deserialize, Serialize};

use crate::metrics::Dataset;
use crate::phase::Phase;

/// Retention thresholds (percent) separating verdict tiers.
pub const EXCELLENT_THRESHOLD: f64 = 95.0;
pub const GOOD_THRESHOLD: f64 = 85.0;

/// Swap usage above this percentage indicates memory pressure; drawn as a
/// warning line on the swap panel.
pub const SWAP_WARNING_PERCENT: f64 = 5.0;

/// Descriptive statistics for one phase. Only emitted for phases with at
/// least one sample; there are no zero-filled entries.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PhaseStats {
    /// Number of samples carrying this phase's label.
    pub samples: usize,
    /// Mean available memory (GB), the primary QoS metric.
    pub memory_avg: f64,
    pub memory_min: f64,
    pub memory_max: f64,
    /// Population standard deviation of available memory.
    pub memory_std: f64,
    pub cpu_avg: f64,
    pub swap_avg: f64,
}

/// Phase statistics in canonical phase order, absent phases omitted.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PhaseSummary {
    entries: Vec<(Phase, PhaseStats)>,
}

impl PhaseSummary {
    pub fn get(&self, phase: Phase) -> Option<&PhaseStats> {
        self.entries
            .iter()
            .find(|(p, _)| *p == phase)
            .map(|(_, stats)| stats)
    }

    /// Entries in `Phase::ALL` order.
    pub fn iter(&self) -> impl Iterator<Item = (Phase, &PhaseStats)> {
        self.entries.iter().map(|(p, s)| (*p, s))
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Verdict tier for the contended phase's retention.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Verdict {
    Excellent,
    Good,
    NeedsAttention,
}

impl Verdict {
    pub fn from_retention(retention: f64) -> Verdict {
        if retention >= EXCELLENT_THRESHOLD {
            Verdict::Excellent
        } else if retention >= GOOD_THRESHOLD {
            Verdict::Good
        } else {
            Verdict::NeedsAttention
        }
    }

    pub fn headline(&self) -> &'static str {
        match self {
            Verdict::Excellent => "EXCELLENT: No memory starvation detected. QoS is working perfectly.",
            Verdict::Good => "GOOD: Minimal memory impact. QoS is providing protection.",
            Verdict::NeedsAttention => "NEEDS ATTENTION: Some memory pressure observed.",
        }
    }
}

/// Retention percentages relative to the baseline phase. Only exists when a
/// baseline phase with a positive mean is present.
#[derive(Debug, Clone, PartialEq)]
pub struct RetentionAssessment {
    /// `(phase, retention %)` for each present phase, canonical order.
    /// Baseline itself is included (trivially 100).
    pub retention: Vec<(Phase, f64)>,
    /// Verdict on the contended phase; `None` when contended is absent.
    pub verdict: Option<Verdict>,
}

impl RetentionAssessment {
    pub fn retention_for(&self, phase: Phase) -> Option<f64> {
        self.retention
            .iter()
            .find(|(p, _)| *p == phase)
            .map(|(_, r)| *r)
    }

    /// The contended phase's retention, the headline QoS indicator.
    pub fn contended_retention(&self) -> Option<f64> {
        self.retention_for(Phase::Contended)
    }
}

/// Compute per-phase statistics over a dataset.
///
/// Selection is stable and order-preserving; phases with no samples are
/// omitted. Labels outside the phase vocabulary contribute to nothing.
pub fn summarize(dataset: &Dataset) -> PhaseSummary {
    let mut entries = Vec::new();

    for phase in Phase::ALL {
        let memory: Vec<f64> = dataset
            .samples
            .iter()
            .filter(|s| s.phase == Some(phase))
            .map(|s| s.memory_available_gb)
            .collect();
        if memory.is_empty() {
            continue;
        }

        let cpu: Vec<f64> = dataset
            .samples
            .iter()
            .filter(|s| s.phase == Some(phase))
            .map(|s| s.cpu_percent)
            .collect();
        let swap: Vec<f64> = dataset
            .samples
            .iter()
            .filter(|s| s.phase == Some(phase))
            .map(|s| s.swap_percent)
            .collect();

        let memory_avg = mean(&memory);
        entries.push((
            phase,
            PhaseStats {
                samples: memory.len(),
                memory_avg,
                memory_min: min(&memory),
                memory_max: max(&memory),
                memory_std: population_std(&memory, memory_avg),
                cpu_avg: mean(&cpu),
                swap_avg: mean(&swap),
            },
        ));
    }

    PhaseSummary { entries }
}

/// Derive retention percentages and the verdict from a phase summary.
///
/// Returns `None` when the baseline phase is absent or its mean available
/// memory is not positive; the division is guarded, never a fault.
pub fn assess(summary: &PhaseSummary) -> Option<RetentionAssessment> {
    let baseline_avg = summary.get(Phase::Baseline)?.memory_avg;
    if baseline_avg <= 0.0 {
        return None;
    }

    let retention: Vec<(Phase, f64)> = summary
        .iter()
        .map(|(phase, stats)| (phase, stats.memory_avg / baseline_avg * 100.0))
        .collect();

    let verdict = retention
        .iter()
        .find(|(p, _)| *p == Phase::Contended)
        .map(|(_, r)| Verdict::from_retention(*r));

    Some(RetentionAssessment { retention, verdict })
}

fn mean(values: &[f64]) -> f64 {
    values.iter().sum::<f64>() / values.len() as f64
}

fn min(values: &[f64]) -> f64 {
    values.iter().copied().fold(f64::INFINITY, f64::min)
}

fn max(values: &[f64]) -> f64 {
    values.iter().copied().fold(f64::NEG_INFINITY, f64::max)
}

/// Population standard deviation (divide by n, not n-1).
fn population_std(values: &[f64], mean: f64) -> f64 {
    let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / values.len() as f64;
    variance.sqrt()
}
