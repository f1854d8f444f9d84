//! Console and JSON reports over the analysis results

use serde::{Deserialize, Serialize};

use crate::analysis::{PhaseSummary, RetentionAssessment, Verdict};
use crate::metrics::Dataset;
use crate::phase::Phase;

/// Per-phase entry in the JSON report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonPhaseStats {
    pub phase: String,
    pub samples: usize,
    pub memory_avg_gb: f64,
    pub memory_min_gb: f64,
    pub memory_max_gb: f64,
    pub memory_std_gb: f64,
    pub cpu_avg_percent: f64,
    pub swap_avg_percent: f64,
    /// Absent when retention is undefined (no positive baseline).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub retention_percent: Option<f64>,
}

/// Machine-readable report for `--format json`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonReport {
    pub data_points: usize,
    pub skipped_rows: usize,
    pub phases: Vec<JsonPhaseStats>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub contended_retention_percent: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub verdict: Option<Verdict>,
}

impl JsonReport {
    pub fn build(
        dataset: &Dataset,
        summary: &PhaseSummary,
        assessment: Option<&RetentionAssessment>,
    ) -> JsonReport {
        let phases = summary
            .iter()
            .map(|(phase, stats)| JsonPhaseStats {
                phase: phase.to_string(),
                samples: stats.samples,
                memory_avg_gb: stats.memory_avg,
                memory_min_gb: stats.memory_min,
                memory_max_gb: stats.memory_max,
                memory_std_gb: stats.memory_std,
                cpu_avg_percent: stats.cpu_avg,
                swap_avg_percent: stats.swap_avg,
                retention_percent: assessment.and_then(|a| a.retention_for(phase)),
            })
            .collect();

        JsonReport {
            data_points: dataset.len(),
            skipped_rows: dataset.skipped,
            phases,
            contended_retention_percent: assessment.and_then(RetentionAssessment::contended_retention),
            verdict: assessment.and_then(|a| a.verdict),
        }
    }
}

/// Render the human-readable report, mirroring what lands on the chart's
/// summary table.
pub fn render_text(
    dataset: &Dataset,
    summary: &PhaseSummary,
    assessment: Option<&RetentionAssessment>,
) -> String {
    let mut out = String::new();
    let mut line = |s: String| {
        out.push_str(&s);
        out.push('\n');
    };

    line(format!("Loaded {} data points", dataset.len()));
    if dataset.skipped > 0 {
        line(format!("Skipped {} malformed rows", dataset.skipped));
    }

    line(String::new());
    line("=== Phase Statistics ===".to_string());
    for (phase, stats) in summary.iter() {
        let retention = match assessment.and_then(|a| a.retention_for(phase)) {
            Some(r) => format!("{r:.1}%"),
            None => "undefined".to_string(),
        };
        line(String::new());
        line(format!("{}:", phase.as_str().to_uppercase()));
        line(format!("  Memory Average: {:.2} GB", stats.memory_avg));
        line(format!("  Memory Min: {:.2} GB", stats.memory_min));
        line(format!("  Memory Max: {:.2} GB", stats.memory_max));
        line(format!("  Memory Std Dev: {:.2} GB", stats.memory_std));
        line(format!("  Memory Retention: {retention}"));
        line(format!("  CPU Average: {:.1}%", stats.cpu_avg));
        line(format!("  Swap Average: {:.2}%", stats.swap_avg));
        line(format!("  Samples: {}", stats.samples));
    }

    if let Some(assessment) = assessment {
        if let Some(retention) = assessment.contended_retention() {
            line(String::new());
            line("=== Overall Assessment ===".to_string());
            line(format!(
                "Memory Retention (Contended vs Baseline): {retention:.1}%"
            ));
            if let Some(verdict) = assessment.verdict {
                line(verdict.headline().to_string());
            }
        }
    }

    out
}

/// Which report format the console gets.
pub fn print_report(
    dataset: &Dataset,
    summary: &PhaseSummary,
    assessment: Option<&RetentionAssessment>,
    json: bool,
) -> anyhow::Result<()> {
    if json {
        let report = JsonReport::build(dataset, summary, assessment);
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print!("{}", render_text(dataset, summary, assessment));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::{assess, summarize};
    use crate::metrics::test_support::{row, HEADER};
    use std::io::Cursor;

    fn dataset_of(rows: &[(&str, f64)]) -> Dataset {
        let mut csv = String::from(HEADER);
        csv.push('\n');
        for (i, (phase, mem)) in rows.iter().enumerate() {
            csv.push_str(&row(i as u32, phase, *mem));
            csv.push('\n');
        }
        Dataset::from_reader(Cursor::new(csv)).unwrap()
    }

    #[test]
    fn test_text_report_sections() {
        let dataset = dataset_of(&[("baseline", 100.0), ("contended", 80.0)]);
        let summary = summarize(&dataset);
        let assessment = assess(&summary);
        let text = render_text(&dataset, &summary, assessment.as_ref());

        assert!(text.contains("Loaded 2 data points"));
        assert!(text.contains("=== Phase Statistics ==="));
        assert!(text.contains("BASELINE:"));
        assert!(text.contains("CONTENDED:"));
        assert!(text.contains("Memory Retention: 80.0%"));
        assert!(text.contains("=== Overall Assessment ==="));
        assert!(text.contains("NEEDS ATTENTION"));
    }

    #[test]
    fn test_text_report_undefined_retention() {
        let dataset = dataset_of(&[("contended", 80.0)]);
        let summary = summarize(&dataset);
        let text = render_text(&dataset, &summary, None);
        assert!(text.contains("Memory Retention: undefined"));
        assert!(!text.contains("Overall Assessment"));
    }

    #[test]
    fn test_text_report_no_verdict_without_contended() {
        let dataset = dataset_of(&[("baseline", 100.0), ("recovery", 99.0)]);
        let summary = summarize(&dataset);
        let assessment = assess(&summary);
        let text = render_text(&dataset, &summary, assessment.as_ref());
        // Retention exists for present phases, but no headline verdict
        assert!(text.contains("Memory Retention: 99.0%"));
        assert!(!text.contains("Overall Assessment"));
    }

    #[test]
    fn test_text_report_mentions_skipped_rows() {
        let mut dataset = dataset_of(&[("baseline", 100.0)]);
        dataset.skipped = 3;
        let summary = summarize(&dataset);
        let text = render_text(&dataset, &summary, None);
        assert!(text.contains("Skipped 3 malformed rows"));
    }

    #[test]
    fn test_json_report_round_trip() {
        let dataset = dataset_of(&[("baseline", 100.0), ("contended", 96.0)]);
        let summary = summarize(&dataset);
        let assessment = assess(&summary);
        let report = JsonReport::build(&dataset, &summary, assessment.as_ref());

        let encoded = serde_json::to_string(&report).unwrap();
        let decoded: JsonReport = serde_json::from_str(&encoded).unwrap();
        assert_eq!(decoded.data_points, 2);
        assert_eq!(decoded.phases.len(), 2);
        assert_eq!(decoded.contended_retention_percent, Some(96.0));
        assert!(encoded.contains("\"EXCELLENT\""));
    }

    #[test]
    fn test_json_report_omits_undefined_retention() {
        let dataset = dataset_of(&[("contended", 80.0)]);
        let summary = summarize(&dataset);
        let report = JsonReport::build(&dataset, &summary, None);
        let encoded = serde_json::to_string(&report).unwrap();
        assert!(!encoded.contains("retention_percent"));
        assert!(!encoded.contains("verdict"));
    }
}
