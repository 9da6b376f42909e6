//! Rendering a segment table as text, JSON or CSV
//!
//! All formats list segments in [`SegmentTable::sorted`] order.

use crate::cli::OutputFormat;
use crate::segment::{Segment, SegmentTable};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// A segment as it appears in the JSON report
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct JsonSegment {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_us: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub finish_us: Option<u64>,
    /// Finish minus start, when both are known and ordered
    #[serde(skip_serializing_if = "Option::is_none")]
    pub elapsed_us: Option<u64>,
    /// Why `elapsed_us` is absent
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl From<&Segment> for JsonSegment {
    fn from(segment: &Segment) -> Self {
        let elapsed = segment.elapsed();
        Self {
            name: segment.name.clone(),
            start_us: segment.start.map(micros),
            finish_us: segment.finish.map(micros),
            elapsed_us: elapsed.as_ref().ok().copied().map(micros),
            error: elapsed.err().map(|e| e.to_string()),
        }
    }
}

/// Top-level JSON report
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct JsonReport {
    pub segments: Vec<JsonSegment>,
    /// Capture failure, if the run did not finish cleanly
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Render `table` in `format`
///
/// `error` is a capture failure to include in the report; the table is then
/// the partial result gathered before it.
pub fn render(
    table: &SegmentTable,
    format: OutputFormat,
    error: Option<&str>,
) -> Result<String, serde_json::Error> {
    match format {
        OutputFormat::Text => Ok(render_text(table, error)),
        OutputFormat::Json => render_json(table, error),
        OutputFormat::Csv => Ok(render_csv(table)),
    }
}

fn micros(d: Duration) -> u64 {
    u64::try_from(d.as_micros()).unwrap_or(u64::MAX)
}

fn seconds(d: Option<Duration>) -> String {
    match d {
        Some(d) => format!("{:.3}s", d.as_secs_f64()),
        None => "-".to_string(),
    }
}

fn render_text(table: &SegmentTable, error: Option<&str>) -> String {
    let segments = table.sorted();
    let width = segments
        .iter()
        .map(|s| s.name.chars().count())
        .max()
        .unwrap_or(0)
        .max("segment".len());

    let mut out = format!(
        "{:<width$}  {:>10}  {:>10}  {:>10}\n",
        "segment", "start", "finish", "elapsed"
    );
    for segment in segments {
        let elapsed = match segment.elapsed() {
            Ok(d) => seconds(Some(d)),
            Err(e) => format!("({e})"),
        };
        out.push_str(&format!(
            "{:<width$}  {:>10}  {:>10}  {:>10}\n",
            segment.name,
            seconds(segment.start),
            seconds(segment.finish),
            elapsed
        ));
    }
    if let Some(error) = error {
        out.push_str(&format!("capture failed: {error}\n"));
    }
    out
}

fn render_json(table: &SegmentTable, error: Option<&str>) -> Result<String, serde_json::Error> {
    let report = JsonReport {
        segments: table.sorted().into_iter().map(JsonSegment::from).collect(),
        error: error.map(str::to_string),
    };
    serde_json::to_string_pretty(&report)
}

/// Escape CSV field (handle commas, quotes, newlines)
fn escape_field(field: &str) -> String {
    if field.contains(',') || field.contains('"') || field.contains('\n') {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}

fn render_csv(table: &SegmentTable) -> String {
    let optional = |d: Option<Duration>| d.map(|d| micros(d).to_string()).unwrap_or_default();

    let mut out = String::from("segment,start_us,finish_us,elapsed_us\n");
    for segment in table.sorted() {
        out.push_str(&format!(
            "{},{},{},{}\n",
            escape_field(&segment.name),
            optional(segment.start),
            optional(segment.finish),
            optional(segment.elapsed().ok()),
        ));
    }
    out
}
