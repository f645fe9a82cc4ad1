// LogDiag - core/report.rs
//
// Rendering and export of a run report: plain-text summary, JSON verdict,
// and CSV occurrence statistics.
// Core layer: writes to any Write trait object.
//
// The JSON verdict's top-level `severity`, `retryable`, and `reason` fields
// are the stable triple external notifiers depend on.

use crate::core::model::{Diagnosis, NodeReport, RunReport};
use crate::util::error::ReportError;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::io::Write;
use std::path::Path;

/// Render the human-readable verdict summary.
pub fn render_summary(report: &RunReport) -> String {
    let v = &report.verdict;
    let mut out = format!(
        "Verdict\n  severity:  {}\n  retryable: {}\n  reason:    {}\n  action:    {}\n",
        v.severity,
        v.retryable,
        v.reason,
        recommended_action(report)
    );

    if report.nodes.is_empty() {
        out.push_str("\nNo nodes were examined.\n");
        return out;
    }

    for node in &report.nodes {
        out.push_str(&format!("\nNode {}: {}\n", node.name, node.diagnosis));
        for file in &node.files {
            out.push_str(&format!(
                "  [{}] {} ({}, {} lines): {}\n",
                file.category,
                file.path.display(),
                file.status.label(),
                file.lines_read,
                file.diagnosis
            ));
            for occ in file.occurrences.iter().filter(|o| o.severity > 0) {
                let summarised = if occ.filtered_count > 0 {
                    format!(", {} summarised", occ.filtered_count)
                } else {
                    String::new()
                };
                out.push_str(&format!(
                    "      {} x{} (severity {}{summarised})\n",
                    occ.rule_id, occ.match_count, occ.severity
                ));
            }
        }
    }

    out
}

/// Short recommendation derived from the verdict.
pub fn recommended_action(report: &RunReport) -> &'static str {
    if !report.problem_found {
        "accept"
    } else if report.verdict.retryable {
        "retry"
    } else {
        "investigate"
    }
}

#[derive(Serialize)]
struct VerdictDocument<'a> {
    severity: u32,
    retryable: bool,
    reason: &'a str,
    problem_found: bool,
    escalate: bool,
    action: &'static str,
    generated_at: DateTime<Utc>,
    nodes: Vec<NodeDocument<'a>>,
}

#[derive(Serialize)]
struct NodeDocument<'a> {
    name: &'a str,
    #[serde(flatten)]
    diagnosis: &'a Diagnosis,
    problem_found: bool,
    files: &'a [crate::core::model::FileScan],
}

impl<'a> NodeDocument<'a> {
    fn from_node(node: &'a NodeReport) -> Self {
        Self {
            name: &node.name,
            diagnosis: &node.diagnosis,
            problem_found: node.problem_found,
            files: &node.files,
        }
    }
}

/// Export the verdict and per-node breakdown as pretty JSON.
pub fn export_json<W: Write>(
    report: &RunReport,
    writer: W,
    export_path: &Path,
) -> Result<(), ReportError> {
    let doc = VerdictDocument {
        severity: report.verdict.severity,
        retryable: report.verdict.retryable,
        reason: &report.verdict.reason,
        problem_found: report.problem_found,
        escalate: report.should_escalate(),
        action: recommended_action(report),
        generated_at: report.generated_at,
        nodes: report.nodes.iter().map(NodeDocument::from_node).collect(),
    };
    serde_json::to_writer_pretty(writer, &doc).map_err(|e| ReportError::Json {
        path: export_path.to_path_buf(),
        source: e,
    })
}

/// Export one CSV row per (node, category, file, rule) with counts.
///
/// Returns the number of data rows written.
pub fn export_occurrences_csv<W: Write>(
    report: &RunReport,
    writer: W,
    export_path: &Path,
) -> Result<usize, ReportError> {
    let csv_err = |e| ReportError::Csv {
        path: export_path.to_path_buf(),
        source: e,
    };
    let mut csv_writer = csv::Writer::from_writer(writer);

    csv_writer
        .write_record([
            "node",
            "category",
            "file",
            "rule_id",
            "severity",
            "matches",
            "filtered",
        ])
        .map_err(csv_err)?;

    let mut count = 0;
    for node in &report.nodes {
        for file in &node.files {
            let path = file.path.display().to_string();
            for occ in &file.occurrences {
                let severity = occ.severity.to_string();
                let matches = occ.match_count.to_string();
                let filtered = occ.filtered_count.to_string();
                csv_writer
                    .write_record([
                        node.name.as_str(),
                        file.category.as_str(),
                        path.as_str(),
                        occ.rule_id.as_str(),
                        severity.as_str(),
                        matches.as_str(),
                        filtered.as_str(),
                    ])
                    .map_err(csv_err)?;
                count += 1;
            }
        }
    }

    csv_writer.flush().map_err(|e| ReportError::Io {
        path: export_path.to_path_buf(),
        source: e,
    })?;

    Ok(count)
}
