// LogDiag - app/output.rs
//
// Writes verdict artifacts into the diagnostics directory:
//   - summary text (default `diagnosis.txt`)
//   - `verdict.json`
//   - `occurrences.csv`
//   - escalate sentinel (default `must-investigate`), created only when the
//     run must be investigated and removed otherwise so reruns converge.

use crate::core::model::RunReport;
use crate::core::report;
use crate::platform::config::OutputSettings;
use crate::util::constants;
use crate::util::error::ReportError;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

/// Paths of the artifacts written by `write_artifacts`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Artifacts {
    pub summary: Option<PathBuf>,
    pub json: Option<PathBuf>,
    pub csv: Option<PathBuf>,
    /// Present only when the run escalated.
    pub escalate: Option<PathBuf>,
}

/// Write every enabled artifact for `report` into `out_dir`.
pub fn write_artifacts(
    report: &RunReport,
    out_dir: &Path,
    settings: &OutputSettings,
) -> Result<Artifacts, ReportError> {
    fs::create_dir_all(out_dir).map_err(|e| ReportError::Io {
        path: out_dir.to_path_buf(),
        source: e,
    })?;

    let mut artifacts = Artifacts::default();

    if settings.summary {
        let path = out_dir.join(&settings.summary_file);
        write_file(&path, report::render_summary(report).as_bytes())?;
        artifacts.summary = Some(path);
    }

    if settings.json {
        let path = out_dir.join(constants::VERDICT_JSON_FILE);
        let mut writer = BufWriter::new(create(&path)?);
        report::export_json(report, &mut writer, &path)?;
        writer
            .flush()
            .map_err(|e| ReportError::Io {
                path: path.clone(),
                source: e,
            })?;
        artifacts.json = Some(path);
    }

    if settings.csv {
        let path = out_dir.join(constants::OCCURRENCES_CSV_FILE);
        let rows = report::export_occurrences_csv(report, BufWriter::new(create(&path)?), &path)?;
        tracing::debug!(path = %path.display(), rows, "Occurrence CSV written");
        artifacts.csv = Some(path);
    }

    let sentinel = out_dir.join(&settings.escalate_file);
    if report.should_escalate() {
        let body = format!(
            "severity={}\nreason={}\n",
            report.verdict.severity, report.verdict.reason
        );
        write_file(&sentinel, body.as_bytes())?;
        tracing::warn!(path = %sentinel.display(), "Run escalated for investigation");
        artifacts.escalate = Some(sentinel);
    } else if sentinel.exists() {
        fs::remove_file(&sentinel).map_err(|e| ReportError::Io {
            path: sentinel.clone(),
            source: e,
        })?;
        tracing::debug!(path = %sentinel.display(), "Removed stale escalate sentinel");
    }

    Ok(artifacts)
}

fn create(path: &Path) -> Result<File, ReportError> {
    File::create(path).map_err(|e| ReportError::Io {
        path: path.to_path_buf(),
        source: e,
    })
}

fn write_file(path: &Path, bytes: &[u8]) -> Result<(), ReportError> {
    fs::write(path, bytes).map_err(|e| ReportError::Io {
        path: path.to_path_buf(),
        source: e,
    })
}
