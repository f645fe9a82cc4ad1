// LogDiag - app/scan.rs
//
// File-level scan: opens one log, streams it through core::scanner, and
// writes the filtered copy next to it.
//
// Every outcome is absorbed into a `FileScan`:
//   - missing file      -> default diagnosis, status Missing, warning;
//   - open/create error -> default diagnosis, status Degraded, warning;
//   - mid-scan error    -> diagnosis gathered so far, status Degraded, warning;
//   - otherwise         -> the scanner's diagnosis, status Scanned.
// Transient open errors are retried with capped backoff before giving up.

use crate::core::model::{Catalog, Diagnosis, FileScan, FileStatus};
use crate::core::scanner;
use crate::platform::fs::filtered_path;
use std::fs::File;
use std::io::{self, BufReader, BufWriter};
use std::path::Path;
use std::time::Duration;

/// Retry limits for transient I/O errors.
const MAX_RETRIES: u32 = 3;
const RETRY_DELAYS_MS: [u64; 3] = [50, 100, 200];

/// Scan `path` against `catalog` and write `<stem>-filtered.<ext>` beside it.
pub fn scan_log_file(path: &Path, catalog: &Catalog) -> FileScan {
    let source = match open_with_retry(path) {
        Ok(f) => f,
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            tracing::warn!(
                path = %path.display(),
                category = %catalog.category,
                "Log file not found; nothing to diagnose"
            );
            return unscanned(
                path,
                catalog,
                FileStatus::Missing,
                format!("'{}': log file not found", path.display()),
            );
        }
        Err(e) => {
            let msg = format!("Cannot open '{}': {e}", path.display());
            tracing::warn!(warning = %msg, "Log open failed");
            return unscanned(path, catalog, FileStatus::Degraded, msg);
        }
    };

    let out_path = filtered_path(path);
    let out = match File::create(&out_path) {
        Ok(f) => f,
        Err(e) => {
            let msg = format!("Cannot create '{}': {e}", out_path.display());
            tracing::warn!(warning = %msg, "Filtered log create failed");
            return unscanned(path, catalog, FileStatus::Degraded, msg);
        }
    };

    let (status, result, warning) =
        match scanner::scan_lines(BufReader::new(source), BufWriter::new(out), catalog, path) {
            Ok(result) => {
                tracing::info!(
                    path = %path.display(),
                    category = %catalog.category,
                    severity = result.diagnosis.severity,
                    retryable = result.diagnosis.retryable,
                    lines = result.lines_read,
                    "Log scanned"
                );
                (FileStatus::Scanned, result, None)
            }
            Err(partial) => {
                let msg = partial.error.to_string();
                tracing::warn!(
                    warning = %msg,
                    lines = partial.result.lines_read,
                    severity = partial.result.diagnosis.severity,
                    "Scan degraded; keeping the partial diagnosis"
                );
                (FileStatus::Degraded, partial.result, Some(msg))
            }
        };

    FileScan {
        category: catalog.category.clone(),
        path: path.to_path_buf(),
        filtered_path: Some(out_path),
        status,
        diagnosis: result.diagnosis,
        problem_found: result.problem_found,
        lines_read: result.lines_read,
        lines_kept: result.lines_kept,
        occurrences: result.occurrences,
        warning,
    }
}

/// A `FileScan` carrying the default diagnosis.
fn unscanned(path: &Path, catalog: &Catalog, status: FileStatus, warning: String) -> FileScan {
    FileScan {
        category: catalog.category.clone(),
        path: path.to_path_buf(),
        filtered_path: None,
        status,
        diagnosis: Diagnosis::default(),
        problem_found: false,
        lines_read: 0,
        lines_kept: 0,
        occurrences: Vec::new(),
        warning: Some(warning),
    }
}

/// Open a file, retrying transient errors.
fn open_with_retry(path: &Path) -> io::Result<File> {
    let mut last_err: Option<io::Error> = None;

    for attempt in 0..MAX_RETRIES {
        match File::open(path) {
            Ok(f) => return Ok(f),
            Err(e) if is_transient_error(&e) => {
                tracing::debug!(
                    file = %path.display(),
                    attempt = attempt + 1,
                    error = %e,
                    "Transient I/O error, retrying"
                );
                std::thread::sleep(Duration::from_millis(RETRY_DELAYS_MS[attempt as usize]));
                last_err = Some(e);
            }
            Err(e) => return Err(e),
        }
    }

    Err(last_err.unwrap_or_else(|| io::Error::other("Unknown open error")))
}

/// Returns true for transient I/O errors that are worth retrying.
fn is_transient_error(e: &io::Error) -> bool {
    matches!(
        e.kind(),
        io::ErrorKind::WouldBlock | io::ErrorKind::Interrupted | io::ErrorKind::TimedOut
    )
}
