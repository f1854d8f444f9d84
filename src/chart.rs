//! Dashboard rendering
//!
//! Produces one PNG with the full panel grid: memory availability, memory
//! breakdown, swap, CPU, I/O, load averages, CPU frequency, per-phase
//! retention bars, and a phase summary table. Rendering is an optional
//! capability behind the `chart` feature; the analysis and report paths do
//! not depend on it. When a render fails, no partial image is left behind
//! (the backend only writes the file on a successful present).

use std::path::Path;

use crate::analysis::{PhaseSummary, RetentionAssessment};
use crate::metrics::Dataset;

#[cfg(not(feature = "chart"))]
pub fn render_dashboard(
    _dataset: &Dataset,
    _summary: &PhaseSummary,
    _assessment: Option<&RetentionAssessment>,
    _output: &Path,
) -> anyhow::Result<()> {
    anyhow::bail!(
        "chart rendering is not available in this build \
         (rebuild with the `chart` feature, or pass --no-chart)"
    )
}

#[cfg(feature = "chart")]
pub use imp::render_dashboard;

#[cfg(feature = "chart")]
mod imp {
    use super::*;

    use plotters::coord::Shift;
    use plotters::prelude::*;

    use crate::analysis::{SWAP_WARNING_PERCENT, EXCELLENT_THRESHOLD, GOOD_THRESHOLD};
    use crate::phase::Phase;

    const WIDTH: u32 = 1800;
    const HEIGHT: u32 = 2200;
    const UNKNOWN_PHASE_COLOR: (u8, u8, u8) = (149, 165, 166);

    /// A contiguous run of identically-labeled samples, in elapsed seconds.
    struct PhaseSpan {
        start: f64,
        end: f64,
        phase: Option<Phase>,
        label: String,
    }

    pub fn render_dashboard(
        dataset: &Dataset,
        summary: &PhaseSummary,
        assessment: Option<&RetentionAssessment>,
        output: &Path,
    ) -> anyhow::Result<()> {
        let xs = elapsed_seconds(dataset);
        let spans = phase_spans(dataset, &xs);

        let root = BitMapBackend::new(output, (WIDTH, HEIGHT)).into_drawing_area();
        root.fill(&WHITE)
            .map_err(|e| anyhow::anyhow!("failed to initialize chart at {}: {e}", output.display()))?;

        let rows = root.split_evenly((5, 1));

        draw_memory_panel(&rows[0], dataset, &xs, &spans)?;

        let mid_top = rows[1].split_evenly((1, 3));
        draw_breakdown_panel(&mid_top[0], dataset, &xs, &spans)?;
        draw_swap_panel(&mid_top[1], dataset, &xs, &spans)?;
        draw_cpu_panel(&mid_top[2], dataset, &xs, &spans)?;

        let mid_bottom = rows[2].split_evenly((1, 3));
        draw_io_panel(&mid_bottom[0], dataset, &xs, &spans)?;
        draw_load_panel(&mid_bottom[1], dataset, &xs, &spans)?;
        draw_freq_panel(&mid_bottom[2], dataset, &xs, &spans)?;

        draw_retention_panel(&rows[3], assessment)?;
        draw_summary_table(&rows[4], summary, assessment)?;

        root.present()
            .map_err(|e| anyhow::anyhow!("failed to write chart to {}: {e}", output.display()))?;
        Ok(())
    }

    /// Seconds since the first sample, per sample.
    fn elapsed_seconds(dataset: &Dataset) -> Vec<f64> {
        let first = dataset.samples[0].timestamp;
        dataset
            .samples
            .iter()
            .map(|s| (s.timestamp - first).num_milliseconds() as f64 / 1000.0)
            .collect()
    }

    /// Contiguous runs of equal labels, in input order. Input order is what
    /// defines the runs; timestamps only give them extent.
    fn phase_spans(dataset: &Dataset, xs: &[f64]) -> Vec<PhaseSpan> {
        let mut spans: Vec<PhaseSpan> = Vec::new();
        for (sample, &x) in dataset.samples.iter().zip(xs) {
            match spans.last_mut() {
                Some(span) if span.label == sample.label => span.end = x,
                _ => spans.push(PhaseSpan {
                    start: x,
                    end: x,
                    phase: sample.phase,
                    label: sample.label.clone(),
                }),
            }
        }
        spans
    }

    fn span_color(span: &PhaseSpan) -> RGBColor {
        let (r, g, b) = span.phase.map_or(UNKNOWN_PHASE_COLOR, |p| p.color());
        RGBColor(r, g, b)
    }

    /// Padded y range over one or more series; degenerate ranges get a unit
    /// of headroom so the axis always builds.
    fn y_range(series: &[&[f64]]) -> (f64, f64) {
        let mut lo = f64::INFINITY;
        let mut hi = f64::NEG_INFINITY;
        for values in series {
            for &v in *values {
                lo = lo.min(v);
                hi = hi.max(v);
            }
        }
        if !lo.is_finite() || !hi.is_finite() {
            return (0.0, 1.0);
        }
        let pad = ((hi - lo) * 0.1).max(0.5);
        (lo - pad, hi + pad)
    }

    fn x_max(xs: &[f64]) -> f64 {
        xs.last().copied().unwrap_or(0.0).max(1.0)
    }

    /// One time-series panel: phase shading plus one line per series.
    fn draw_line_panel(
        area: &DrawingArea<BitMapBackend, Shift>,
        caption: &str,
        y_desc: &str,
        xs: &[f64],
        spans: &[PhaseSpan],
        series: &[(&str, RGBColor, Vec<f64>)],
        y_bounds: Option<(f64, f64)>,
    ) -> anyhow::Result<()> {
        let slices: Vec<&[f64]> = series.iter().map(|(_, _, v)| v.as_slice()).collect();
        let (y_lo, y_hi) = y_bounds.unwrap_or_else(|| y_range(&slices));

        let mut chart = ChartBuilder::on(area)
            .caption(caption, ("sans-serif", 22))
            .margin(12)
            .x_label_area_size(32)
            .y_label_area_size(55)
            .build_cartesian_2d(0f64..x_max(xs), y_lo..y_hi)
            .map_err(|e| anyhow::anyhow!("chart layout failed: {e}"))?;

        chart
            .configure_mesh()
            .x_desc("Elapsed (s)")
            .y_desc(y_desc)
            .draw()
            .map_err(|e| anyhow::anyhow!("chart mesh failed: {e}"))?;

        chart
            .draw_series(spans.iter().map(|span| {
                Rectangle::new(
                    [(span.start, y_lo), (span.end, y_hi)],
                    span_color(span).mix(0.12).filled(),
                )
            }))
            .map_err(|e| anyhow::anyhow!("phase shading failed: {e}"))?;

        for (name, color, values) in series {
            chart
                .draw_series(LineSeries::new(
                    xs.iter().copied().zip(values.iter().copied()),
                    color.stroke_width(2),
                ))
                .map_err(|e| anyhow::anyhow!("series {name} failed: {e}"))?
                .label(*name)
                .legend({
                    let color = *color;
                    move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], color.stroke_width(2))
                });
        }

        chart
            .configure_series_labels()
            .border_style(BLACK)
            .background_style(WHITE.mix(0.8))
            .draw()
            .map_err(|e| anyhow::anyhow!("chart legend failed: {e}"))?;
        Ok(())
    }

    fn draw_memory_panel(
        area: &DrawingArea<BitMapBackend, Shift>,
        dataset: &Dataset,
        xs: &[f64],
        spans: &[PhaseSpan],
    ) -> anyhow::Result<()> {
        let memory: Vec<f64> = dataset.samples.iter().map(|s| s.memory_available_gb).collect();
        draw_line_panel(
            area,
            "Memory Availability (key QoS metric, higher is better)",
            "Available (GB)",
            xs,
            spans,
            &[("Available Memory", RGBColor(39, 174, 96), memory)],
            None,
        )?;

        // Phase name tags at the midpoint of each recognized run
        for span in spans.iter().filter(|s| s.phase.is_some()) {
            let mid_x = (span.start + span.end) / 2.0 / x_max(xs);
            let px = (f64::from(area.dim_in_pixel().0) * mid_x) as i32;
            area.draw(&Text::new(
                span.label.to_uppercase(),
                (px.max(40), 40),
                ("sans-serif", 18).into_font().color(&span_color(span)),
            ))
            .map_err(|e| anyhow::anyhow!("phase tag failed: {e}"))?;
        }
        Ok(())
    }

    fn draw_breakdown_panel(
        area: &DrawingArea<BitMapBackend, Shift>,
        dataset: &Dataset,
        xs: &[f64],
        spans: &[PhaseSpan],
    ) -> anyhow::Result<()> {
        let used: Vec<f64> = dataset.samples.iter().map(|s| s.memory_used_gb).collect();
        let cached: Vec<f64> = dataset.samples.iter().map(|s| s.memory_cached_gb).collect();
        let buffers: Vec<f64> = dataset.samples.iter().map(|s| s.memory_buffers_gb).collect();
        draw_line_panel(
            area,
            "Memory Usage Breakdown",
            "Memory (GB)",
            xs,
            spans,
            &[
                ("Used", RGBColor(192, 57, 43), used),
                ("Cached", RGBColor(230, 126, 34), cached),
                ("Buffers", RGBColor(241, 196, 15), buffers),
            ],
            None,
        )
    }

    fn draw_swap_panel(
        area: &DrawingArea<BitMapBackend, Shift>,
        dataset: &Dataset,
        xs: &[f64],
        spans: &[PhaseSpan],
    ) -> anyhow::Result<()> {
        let swap: Vec<f64> = dataset.samples.iter().map(|s| s.swap_percent).collect();
        let top = swap.iter().copied().fold(0.0f64, f64::max);
        let warning: Vec<f64> = vec![SWAP_WARNING_PERCENT; xs.len()];
        draw_line_panel(
            area,
            "Swap Usage (memory pressure indicator)",
            "Swap (%)",
            xs,
            spans,
            &[
                ("Swap %", RGBColor(142, 68, 173), swap),
                ("Warning (5%)", RGBColor(192, 57, 43), warning),
            ],
            Some((0.0, (top * 1.2).max(10.0))),
        )
    }

    fn draw_cpu_panel(
        area: &DrawingArea<BitMapBackend, Shift>,
        dataset: &Dataset,
        xs: &[f64],
        spans: &[PhaseSpan],
    ) -> anyhow::Result<()> {
        let cpu: Vec<f64> = dataset.samples.iter().map(|s| s.cpu_percent).collect();
        draw_line_panel(
            area,
            "CPU Usage",
            "CPU (%)",
            xs,
            spans,
            &[("CPU %", RGBColor(41, 128, 185), cpu)],
            Some((0.0, 100.0)),
        )
    }

    fn draw_io_panel(
        area: &DrawingArea<BitMapBackend, Shift>,
        dataset: &Dataset,
        xs: &[f64],
        spans: &[PhaseSpan],
    ) -> anyhow::Result<()> {
        let reads: Vec<f64> = dataset.samples.iter().map(|s| s.io_read_mb_s).collect();
        let writes: Vec<f64> = dataset.samples.iter().map(|s| s.io_write_mb_s).collect();
        draw_line_panel(
            area,
            "I/O Bandwidth",
            "Throughput (MB/s)",
            xs,
            spans,
            &[
                ("Read MB/s", RGBColor(41, 128, 185), reads),
                ("Write MB/s", RGBColor(192, 57, 43), writes),
            ],
            None,
        )
    }

    fn draw_load_panel(
        area: &DrawingArea<BitMapBackend, Shift>,
        dataset: &Dataset,
        xs: &[f64],
        spans: &[PhaseSpan],
    ) -> anyhow::Result<()> {
        let l1: Vec<f64> = dataset.samples.iter().map(|s| s.load_avg_1m).collect();
        let l5: Vec<f64> = dataset.samples.iter().map(|s| s.load_avg_5m).collect();
        let l15: Vec<f64> = dataset.samples.iter().map(|s| s.load_avg_15m).collect();
        draw_line_panel(
            area,
            "System Load Average",
            "Load",
            xs,
            spans,
            &[
                ("1min", RGBColor(39, 174, 96), l1),
                ("5min", RGBColor(230, 126, 34), l5),
                ("15min", RGBColor(192, 57, 43), l15),
            ],
            None,
        )
    }

    fn draw_freq_panel(
        area: &DrawingArea<BitMapBackend, Shift>,
        dataset: &Dataset,
        xs: &[f64],
        spans: &[PhaseSpan],
    ) -> anyhow::Result<()> {
        let freq: Vec<f64> = dataset.samples.iter().map(|s| s.cpu_freq_mhz).collect();
        draw_line_panel(
            area,
            "CPU Frequency",
            "Frequency (MHz)",
            xs,
            spans,
            &[("CPU Freq", RGBColor(142, 68, 173), freq)],
            None,
        )
    }

    /// Per-phase retention bars with the verdict threshold guide lines.
    /// Drawn empty (caption only) when retention is undefined.
    fn draw_retention_panel(
        area: &DrawingArea<BitMapBackend, Shift>,
        assessment: Option<&RetentionAssessment>,
    ) -> anyhow::Result<()> {
        let Some(assessment) = assessment else {
            area.draw(&Text::new(
                "Memory retention undefined (no baseline phase with positive mean)",
                (40, 40),
                ("sans-serif", 20).into_font().color(&BLACK),
            ))
            .map_err(|e| anyhow::anyhow!("retention note failed: {e}"))?;
            return Ok(());
        };

        let bars = &assessment.retention;
        let top = bars
            .iter()
            .map(|(_, r)| *r)
            .fold(105.0f64, f64::max)
            * 1.05;

        let mut chart = ChartBuilder::on(area)
            .caption(
                "Memory Retention by Phase (QoS effectiveness, target >= 95%)",
                ("sans-serif", 22),
            )
            .margin(12)
            .x_label_area_size(32)
            .y_label_area_size(55)
            .build_cartesian_2d(0i32..bars.len() as i32, 0f64..top)
            .map_err(|e| anyhow::anyhow!("retention layout failed: {e}"))?;

        let names: Vec<String> = bars.iter().map(|(p, _)| p.as_str().to_uppercase()).collect();
        chart
            .configure_mesh()
            .y_desc("Retention (%)")
            .x_labels(bars.len())
            .x_label_formatter(&|i: &i32| {
                names.get(*i as usize).cloned().unwrap_or_default()
            })
            .draw()
            .map_err(|e| anyhow::anyhow!("retention mesh failed: {e}"))?;

        for (idx, (phase, retention)) in bars.iter().enumerate() {
            let (r, g, b) = phase.color();
            chart
                .draw_series(std::iter::once(Rectangle::new(
                    [(idx as i32, 0.0), (idx as i32 + 1, *retention)],
                    RGBColor(r, g, b).mix(0.8).filled(),
                )))
                .map_err(|e| anyhow::anyhow!("retention bar failed: {e}"))?;
            chart
                .draw_series(std::iter::once(Text::new(
                    format!("{retention:.1}%"),
                    (idx as i32, *retention),
                    ("sans-serif", 18).into_font().color(&BLACK),
                )))
                .map_err(|e| anyhow::anyhow!("retention label failed: {e}"))?;
        }

        for (threshold, name, color) in [
            (EXCELLENT_THRESHOLD, "Excellent (95%)", RGBColor(39, 174, 96)),
            (GOOD_THRESHOLD, "Good (85%)", RGBColor(230, 126, 34)),
        ] {
            chart
                .draw_series(LineSeries::new(
                    [(0, threshold), (bars.len() as i32, threshold)],
                    color.stroke_width(2),
                ))
                .map_err(|e| anyhow::anyhow!("threshold line failed: {e}"))?
                .label(name)
                .legend(move |(x, y)| {
                    PathElement::new(vec![(x, y), (x + 20, y)], color.stroke_width(2))
                });
        }

        chart
            .configure_series_labels()
            .border_style(BLACK)
            .background_style(WHITE.mix(0.8))
            .draw()
            .map_err(|e| anyhow::anyhow!("retention legend failed: {e}"))?;
        Ok(())
    }

    /// The phase comparison table, drawn as monospace text rows.
    fn draw_summary_table(
        area: &DrawingArea<BitMapBackend, Shift>,
        summary: &PhaseSummary,
        assessment: Option<&RetentionAssessment>,
    ) -> anyhow::Result<()> {
        let mut lines = vec![
            "Phase Comparison Summary".to_string(),
            String::new(),
            format!(
                "{:<12} {:>14} {:>14} {:>14} {:>12} {:>10} {:>10}",
                "Phase", "Mem Avg (GB)", "Mem Min (GB)", "Mem Max (GB)", "Retention", "CPU (%)", "Swap (%)"
            ),
        ];
        for (phase, stats) in summary.iter() {
            let retention = match assessment.and_then(|a| a.retention_for(phase)) {
                Some(r) => format!("{r:.1}%"),
                None => "n/a".to_string(),
            };
            lines.push(format!(
                "{:<12} {:>14.2} {:>14.2} {:>14.2} {:>12} {:>10.1} {:>10.2}",
                phase.as_str().to_uppercase(),
                stats.memory_avg,
                stats.memory_min,
                stats.memory_max,
                retention,
                stats.cpu_avg,
                stats.swap_avg,
            ));
        }

        for (i, line) in lines.iter().enumerate() {
            area.draw(&Text::new(
                line.clone(),
                (40, 40 + i as i32 * 28),
                ("monospace", 18).into_font().color(&BLACK),
            ))
            .map_err(|e| anyhow::anyhow!("summary table failed: {e}"))?;
        }
        Ok(())
    }
}

#[cfg(all(test, feature = "chart"))]
mod tests {
    use super::*;
    use crate::analysis::{assess, summarize};
    use crate::metrics::test_support::{row, HEADER};
    use crate::metrics::Dataset;
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
    fn test_render_dashboard_writes_png() {
        let dataset = dataset_of(&[
            ("baseline", 100.0),
            ("baseline", 99.0),
            ("transition", 98.0),
            ("contended", 80.0),
            ("contended", 81.0),
            ("recovery", 97.0),
        ]);
        let summary = summarize(&dataset);
        let assessment = assess(&summary);

        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("dashboard.png");
        render_dashboard(&dataset, &summary, assessment.as_ref(), &output).unwrap();

        let metadata = std::fs::metadata(&output).unwrap();
        assert!(metadata.len() > 0);
    }

    #[test]
    fn test_render_without_baseline_still_succeeds() {
        let dataset = dataset_of(&[("contended", 80.0), ("recovery", 97.0)]);
        let summary = summarize(&dataset);

        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("no_baseline.png");
        render_dashboard(&dataset, &summary, None, &output).unwrap();
        assert!(output.exists());
    }

    #[test]
    fn test_render_single_sample() {
        let dataset = dataset_of(&[("baseline", 100.0)]);
        let summary = summarize(&dataset);
        let assessment = assess(&summary);

        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("single.png");
        render_dashboard(&dataset, &summary, assessment.as_ref(), &output).unwrap();
        assert!(output.exists());
    }
}
