//! Metrics loader: CSV records into a typed, ordered dataset
//!
//! The input is a header-first CSV produced by an external sampling tool,
//! one row per observation. Fields are looked up by header name, so column
//! order is insignificant. Fault policy is two-tier: a row that fails to
//! parse is skipped (the run continues), but a file that yields zero valid
//! rows is fatal.

use std::collections::{HashMap, HashSet};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use chrono::NaiveDateTime;
use thiserror::Error;
use tracing::debug;

use crate::phase::Phase;

/// Loader failure modes. Row-level parse faults never surface here; they are
/// absorbed by skipping the row.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to read metrics file: {0}")]
    Io(#[from] std::io::Error),
    #[error("metrics file has no header row")]
    MissingHeader,
    #[error("metrics file contains no valid data rows")]
    NoValidData,
}

/// One time-stamped observation. Immutable once parsed; a row missing or
/// failing to parse any field never becomes a partial `Sample`.
#[derive(Debug, Clone, PartialEq)]
pub struct Sample {
    pub timestamp: NaiveDateTime,
    /// Raw label as it appeared in the file.
    pub label: String,
    /// Resolved phase, `None` for labels outside the known vocabulary.
    pub phase: Option<Phase>,
    pub cpu_percent: f64,
    pub memory_percent: f64,
    pub memory_available_gb: f64,
    pub memory_used_gb: f64,
    pub memory_cached_gb: f64,
    pub memory_buffers_gb: f64,
    pub swap_used_gb: f64,
    pub swap_percent: f64,
    pub io_read_mb_s: f64,
    pub io_write_mb_s: f64,
    pub cpu_freq_mhz: f64,
    pub load_avg_1m: f64,
    pub load_avg_5m: f64,
    pub load_avg_15m: f64,
    pub context_switches: u64,
    pub interrupts: u64,
    pub cpu_user: f64,
    pub cpu_system: f64,
}

/// Samples in input order plus the count of rows dropped by the row-level
/// fault policy. Invariant: `samples.len() + skipped` equals the number of
/// data rows seen.
#[derive(Debug, Clone, Default)]
pub struct Dataset {
    pub samples: Vec<Sample>,
    pub skipped: usize,
}

impl Dataset {
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Parse a header-first CSV stream into a dataset.
    ///
    /// Rows with a missing column or an unparsable value are skipped and
    /// counted; the stream is always consumed to the end. Returns
    /// `NoValidData` if nothing parsed.
    pub fn from_reader<R: BufRead>(reader: R) -> Result<Dataset, LoadError> {
        let mut lines = reader.lines();

        let header_line = match lines.next() {
            Some(line) => line?,
            None => return Err(LoadError::MissingHeader),
        };
        let columns = header_index(&header_line);

        let mut dataset = Dataset::default();
        let mut unknown_labels: HashSet<String> = HashSet::new();
        for (line_no, line) in lines.enumerate() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            let fields = split_record(&line);
            match parse_sample(&columns, &fields) {
                Some(sample) => {
                    if sample.phase.is_none() && unknown_labels.insert(sample.label.clone()) {
                        debug!(label = %sample.label, "ignoring unrecognized phase label");
                    }
                    dataset.samples.push(sample);
                }
                None => {
                    // Header occupies line 1
                    debug!(line = line_no + 2, "skipping malformed metrics row");
                    dataset.skipped += 1;
                }
            }
        }

        if dataset.samples.is_empty() {
            return Err(LoadError::NoValidData);
        }
        Ok(dataset)
    }
}

/// Load a metrics CSV from disk.
pub fn load_metrics(path: &Path) -> Result<Dataset, LoadError> {
    let file = File::open(path)?;
    Dataset::from_reader(BufReader::new(file))
}

/// Map header names to column positions.
fn header_index(header: &str) -> HashMap<String, usize> {
    split_record(header)
        .into_iter()
        .enumerate()
        .map(|(i, name)| (name, i))
        .collect()
}

/// Split one CSV record. Handles double-quoted fields with `""` escapes;
/// unquoted fields are taken verbatim.
fn split_record(line: &str) -> Vec<String> {
    let mut fields = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut chars = line.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '"' if in_quotes => {
                if chars.peek() == Some(&'"') {
                    chars.next();
                    current.push('"');
                } else {
                    in_quotes = false;
                }
            }
            '"' => in_quotes = true,
            ',' if !in_quotes => fields.push(std::mem::take(&mut current)),
            _ => current.push(c),
        }
    }
    fields.push(current);
    fields
}

/// Look up a named field in a record. `None` when the column is absent from
/// the header or the row is short.
fn field<'a>(
    columns: &HashMap<String, usize>,
    fields: &'a [String],
    name: &str,
) -> Option<&'a str> {
    let idx = *columns.get(name)?;
    fields.get(idx).map(String::as_str)
}

fn parse_f64(columns: &HashMap<String, usize>, fields: &[String], name: &str) -> Option<f64> {
    field(columns, fields, name)?.trim().parse().ok()
}

fn parse_u64(columns: &HashMap<String, usize>, fields: &[String], name: &str) -> Option<u64> {
    field(columns, fields, name)?.trim().parse().ok()
}

/// Accepts `T` or space separated ISO-8601, with optional fractional seconds.
fn parse_timestamp(raw: &str) -> Option<NaiveDateTime> {
    let raw = raw.trim();
    raw.parse::<NaiveDateTime>()
        .or_else(|_| NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S%.f"))
        .ok()
}

/// Build one sample, or `None` if any required field is missing/malformed.
fn parse_sample(columns: &HashMap<String, usize>, fields: &[String]) -> Option<Sample> {
    let timestamp = parse_timestamp(field(columns, fields, "timestamp")?)?;
    let label = field(columns, fields, "phase")?.to_string();
    let phase = Phase::from_label(&label);

    Some(Sample {
        timestamp,
        phase,
        label,
        cpu_percent: parse_f64(columns, fields, "cpu_percent")?,
        memory_percent: parse_f64(columns, fields, "memory_percent")?,
        memory_available_gb: parse_f64(columns, fields, "memory_available_gb")?,
        memory_used_gb: parse_f64(columns, fields, "memory_used_gb")?,
        memory_cached_gb: parse_f64(columns, fields, "memory_cached_gb")?,
        memory_buffers_gb: parse_f64(columns, fields, "memory_buffers_gb")?,
        swap_used_gb: parse_f64(columns, fields, "swap_used_gb")?,
        swap_percent: parse_f64(columns, fields, "swap_percent")?,
        io_read_mb_s: parse_f64(columns, fields, "io_read_mb_s")?,
        io_write_mb_s: parse_f64(columns, fields, "io_write_mb_s")?,
        cpu_freq_mhz: parse_f64(columns, fields, "cpu_freq_mhz")?,
        load_avg_1m: parse_f64(columns, fields, "load_avg_1m")?,
        load_avg_5m: parse_f64(columns, fields, "load_avg_5m")?,
        load_avg_15m: parse_f64(columns, fields, "load_avg_15m")?,
        context_switches: parse_u64(columns, fields, "context_switches")?,
        interrupts: parse_u64(columns, fields, "interrupts")?,
        cpu_user: parse_f64(columns, fields, "cpu_user")?,
        cpu_system: parse_f64(columns, fields, "cpu_system")?,
    })
}

#[cfg(test)]
pub(crate) mod test_support {
    /// Header matching the sampling tool's output, for building fixtures.
    pub const HEADER: &str = "timestamp,phase,cpu_percent,memory_percent,\
memory_available_gb,memory_used_gb,memory_cached_gb,memory_buffers_gb,\
swap_used_gb,swap_percent,io_read_mb_s,io_write_mb_s,cpu_freq_mhz,\
load_avg_1m,load_avg_5m,load_avg_15m,context_switches,interrupts,\
cpu_user,cpu_system";

    /// One well-formed row with the given timestamp second, phase label, and
    /// memory_available_gb; every other field gets a fixed plausible value.
    pub fn row(second: u32, phase: &str, mem_available: f64) -> String {
        format!(
            "2025-03-14T10:00:{second:02},{phase},25.0,40.0,{mem_available},30.0,8.0,1.5,\
0.0,0.5,120.0,80.0,3400.0,2.5,2.1,1.8,15000,9000,18.0,7.0"
        )
    }
}
