use anyhow::{Context, Result};
use clap::Parser;
use memqos::{analysis, chart, cli::Cli, cli::ReportFormat, metrics, report};
use tracing_subscriber::EnvFilter;

/// Initialize tracing subscriber for debug output
fn init_tracing(debug: bool) {
    if debug {
        tracing_subscriber::fmt()
            .with_env_filter(
                EnvFilter::from_default_env().add_directive(tracing::Level::DEBUG.into()),
            )
            .with_writer(std::io::stderr)
            .init();
    }
}

fn main() -> Result<()> {
    let args = Cli::parse();
    init_tracing(args.debug);

    if !args.metrics_file.exists() {
        anyhow::bail!("metrics file not found: {}", args.metrics_file.display());
    }

    eprintln!("Loading metrics from: {}", args.metrics_file.display());
    let dataset = metrics::load_metrics(&args.metrics_file)
        .with_context(|| format!("failed to load {}", args.metrics_file.display()))?;

    let summary = analysis::summarize(&dataset);
    let assessment = analysis::assess(&summary);

    report::print_report(
        &dataset,
        &summary,
        assessment.as_ref(),
        args.format == ReportFormat::Json,
    )?;

    if !args.no_chart {
        let output = args.output_path();
        chart::render_dashboard(&dataset, &summary, assessment.as_ref(), &output)?;
        eprintln!("Saved visualization to: {}", output.display());
    }

    Ok(())
}
