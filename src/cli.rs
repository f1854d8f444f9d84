//! CLI argument parsing for Memqos

use std::path::PathBuf;

use clap::{Parser, ValueEnum};

/// Console report format
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ReportFormat {
    /// Human-readable text report (default)
    Text,
    /// JSON report for machine parsing
    Json,
}

#[derive(Parser, Debug)]
#[command(name = "memqos")]
#[command(version)]
#[command(about = "Memory QoS phase analysis and visualization", long_about = None)]
pub struct Cli {
    /// CSV file with sampled metrics (header row required)
    #[arg(long = "metrics-file", value_name = "PATH")]
    pub metrics_file: PathBuf,

    /// Output image file (default: memory_qos_<stem>.png next to the input)
    #[arg(short = 'o', long = "output", value_name = "PATH")]
    pub output: Option<PathBuf>,

    /// Console report format (text or json)
    #[arg(long = "format", value_enum, default_value = "text")]
    pub format: ReportFormat,

    /// Skip chart rendering, print the report only
    #[arg(long = "no-chart")]
    pub no_chart: bool,

    /// Enable debug logging to stderr
    #[arg(long = "debug")]
    pub debug: bool,
}

impl Cli {
    /// Resolved chart path: explicit `--output`, or derived from the input
    /// file name.
    pub fn output_path(&self) -> PathBuf {
        if let Some(output) = &self.output {
            return output.clone();
        }
        let stem = self
            .metrics_file
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "metrics".to_string());
        let name = format!("memory_qos_{stem}.png");
        match self.metrics_file.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.join(name),
            _ => PathBuf::from(name),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_requires_metrics_file() {
        assert!(Cli::try_parse_from(["memqos"]).is_err());
    }

    #[test]
    fn test_cli_parses_metrics_file() {
        let cli = Cli::parse_from(["memqos", "--metrics-file", "run.csv"]);
        assert_eq!(cli.metrics_file, PathBuf::from("run.csv"));
        assert!(!cli.no_chart);
        assert!(!cli.debug);
        assert_eq!(cli.format, ReportFormat::Text);
    }

    #[test]
    fn test_cli_explicit_output() {
        let cli = Cli::parse_from([
            "memqos",
            "--metrics-file",
            "run.csv",
            "-o",
            "charts/out.png",
        ]);
        assert_eq!(cli.output_path(), PathBuf::from("charts/out.png"));
    }

    #[test]
    fn test_cli_derived_output_next_to_input() {
        let cli = Cli::parse_from(["memqos", "--metrics-file", "results/run1.csv"]);
        assert_eq!(
            cli.output_path(),
            PathBuf::from("results/memory_qos_run1.png")
        );
    }

    #[test]
    fn test_cli_derived_output_bare_file() {
        let cli = Cli::parse_from(["memqos", "--metrics-file", "run1.csv"]);
        assert_eq!(cli.output_path(), PathBuf::from("memory_qos_run1.png"));
    }

    #[test]
    fn test_cli_no_chart_flag() {
        let cli = Cli::parse_from(["memqos", "--metrics-file", "run.csv", "--no-chart"]);
        assert!(cli.no_chart);
    }

    #[test]
    fn test_cli_json_format() {
        let cli = Cli::parse_from(["memqos", "--metrics-file", "run.csv", "--format", "json"]);
        assert_eq!(cli.format, ReportFormat::Json);
    }
}
