//! CSV and JSON renderings of a finished run.

use std::io::{self, Write};

use chrono::{DateTime, Local, Utc};
use serde::Serialize;

use crate::dispatch::{HostStatus, SessionResult};

/// Report file format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportFormat {
    Csv,
    Json,
}

impl ReportFormat {
    /// File extension for this format.
    pub fn extension(self) -> &'static str {
        match self {
            ReportFormat::Csv => "csv",
            ReportFormat::Json => "json",
        }
    }
}

/// `results-YYYY-MM-DD-HHMMSS.<ext>` for the given local time.
pub fn default_file_name(format: ReportFormat, now: DateTime<Local>) -> String {
    format!(
        "results-{}.{}",
        now.format("%Y-%m-%d-%H%M%S"),
        format.extension()
    )
}

/// Write the `Host,Results` table, one row per host.
pub fn write_csv<W: Write>(results: &[SessionResult], mut out: W) -> io::Result<()> {
    writeln!(out, "Host,Results")?;
    for result in results {
        writeln!(
            out,
            "{},{}",
            csv_field(&result.host),
            csv_field(&result.summary())
        )?;
    }
    out.flush()
}

fn csv_field(value: &str) -> String {
    if value.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

#[derive(Serialize)]
#[serde(rename_all = "PascalCase")]
struct HostRecord<'a> {
    host: &'a str,
    hostname: Option<&'a str>,
    status: HostStatus,
    timestamp: DateTime<Utc>,
    results: Vec<CommandRecord<'a>>,
    error: Option<&'a str>,
}

#[derive(Serialize)]
#[serde(rename_all = "PascalCase")]
struct CommandRecord<'a> {
    command: &'a str,
    output: &'a str,
}

impl<'a> From<&'a SessionResult> for HostRecord<'a> {
    fn from(result: &'a SessionResult) -> Self {
        Self {
            host: &result.host,
            hostname: result.hostname.as_deref(),
            status: result.status,
            timestamp: result.timestamp,
            results: result
                .outputs
                .iter()
                .map(|o| CommandRecord {
                    command: &o.command,
                    output: &o.output,
                })
                .collect(),
            error: result.error.as_deref(),
        }
    }
}

/// Pretty-printed JSON array of host records.
pub fn to_json(results: &[SessionResult]) -> serde_json::Result<String> {
    let records: Vec<HostRecord<'_>> = results.iter().map(HostRecord::from).collect();
    serde_json::to_string_pretty(&records)
}
