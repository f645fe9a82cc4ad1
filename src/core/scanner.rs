// LogDiag - core/scanner.rs
//
// Streaming log scan: classifies each line, counts occurrences per rule,
// writes a filtered copy, and folds first occurrences into one diagnosis.
// Core layer: works on any BufRead/Write pair; the app layer owns the files.
//
// Filtered output format:
//   - every kept line verbatim, followed by '\n';
//   - then, per rule with summarised lines (in first-match order):
//       <72 x '-'>
//       And {n} more lines similar to
//       \t{first summarised line}

use crate::core::classifier;
use crate::core::merge::DiagnosisFold;
use crate::core::model::{Catalog, Diagnosis, PatternOccurrence, ScanResult};
use crate::util::constants;
use crate::util::error::ScanError;
use std::collections::HashMap;
use std::io::{BufRead, Write};
use std::path::Path;

/// The separator line written before each summary block.
pub fn separator_line() -> String {
    std::iter::repeat(constants::SEPARATOR_CHAR)
        .take(constants::SEPARATOR_WIDTH)
        .collect()
}

/// Summary message for `count` summarised lines.
pub fn summary_message(count: usize, example: &str) -> String {
    format!("And {count} more lines similar to\n\t{example}")
}

/// Read one line, stripping `\n` / `\r\n` and replacing invalid UTF-8.
///
/// Returns `Ok(None)` at end of input.
fn read_line_lossy<R: BufRead>(reader: &mut R, buf: &mut Vec<u8>) -> std::io::Result<Option<String>> {
    buf.clear();
    if reader.read_until(b'\n', buf)? == 0 {
        return Ok(None);
    }
    if buf.last() == Some(&b'\n') {
        buf.pop();
        if buf.last() == Some(&b'\r') {
            buf.pop();
        }
    }
    Ok(Some(String::from_utf8_lossy(buf).into_owned()))
}

/// Truncate a line for debug output on a char boundary.
fn preview(line: &str) -> &str {
    match line.char_indices().nth(constants::DEBUG_MAX_LINE_PREVIEW) {
        Some((idx, _)) => &line[..idx],
        None => line,
    }
}

/// A scan cut short by an I/O error.
///
/// `result` holds everything gathered up to the failing line: the diagnosis
/// folded so far, the counters, and the lines already read.
#[derive(Debug)]
pub struct PartialScan {
    pub result: ScanResult,
    pub error: ScanError,
}

/// Running state of one scan.
#[derive(Default)]
struct ScanState {
    fold: DiagnosisFold,
    problem_found: bool,
    occurrences: Vec<PatternOccurrence>,
    lines_read: usize,
    lines_kept: usize,
}

impl ScanState {
    fn into_result(self) -> ScanResult {
        ScanResult {
            diagnosis: self.fold.finish(),
            problem_found: self.problem_found,
            lines_read: self.lines_read,
            lines_kept: self.lines_kept,
            occurrences: self.occurrences,
        }
    }

    fn fail(self, error: ScanError) -> Box<PartialScan> {
        Box::new(PartialScan {
            result: self.into_result(),
            error,
        })
    }
}

/// Scan `reader` against `catalog`, writing the filtered copy to `writer`.
///
/// `source` is used for error messages and log fields only. On a read or
/// write error the partial result is returned alongside the error.
pub fn scan_lines<R: BufRead, W: Write>(
    mut reader: R,
    mut writer: W,
    catalog: &Catalog,
    source: &Path,
) -> Result<ScanResult, Box<PartialScan>> {
    let read_err = |e| ScanError::Read {
        file: source.to_path_buf(),
        source: e,
    };
    let write_err = |e| ScanError::Write {
        file: source.to_path_buf(),
        source: e,
    };

    let mut state = ScanState::default();
    let mut index_by_id: HashMap<&str, usize> = HashMap::new();
    let mut buf = Vec::new();

    loop {
        let line = match read_line_lossy(&mut reader, &mut buf) {
            Ok(Some(line)) => line,
            Ok(None) => break,
            Err(e) => return Err(state.fail(read_err(e))),
        };
        state.lines_read += 1;

        let keep = match classifier::classify_line(&line, catalog) {
            None => true,
            Some(rule) => {
                let occurrences = &mut state.occurrences;
                let idx = *index_by_id.entry(rule.id.as_str()).or_insert_with(|| {
                    occurrences.push(PatternOccurrence {
                        rule_id: rule.id.clone(),
                        severity: rule.severity,
                        match_count: 0,
                        filtered_count: 0,
                        first_example: None,
                    });
                    occurrences.len() - 1
                });
                let occ = &mut state.occurrences[idx];
                occ.match_count += 1;

                if occ.match_count == 1 && rule.severity > 0 {
                    tracing::debug!(
                        category = %catalog.category,
                        rule_id = %rule.id,
                        mode = rule.matcher.mode_label(),
                        pattern = rule.matcher.pattern(),
                        severity = rule.severity,
                        line = state.lines_read,
                        text = preview(&line),
                        "First occurrence of problematic pattern"
                    );
                    state.fold.absorb(&Diagnosis::from_rule(rule));
                    state.problem_found = true;
                }

                if rule.keeps_occurrence(occ.match_count) {
                    true
                } else {
                    occ.filtered_count += 1;
                    if occ.first_example.is_none() {
                        occ.first_example = Some(line.clone());
                    }
                    false
                }
            }
        };

        if keep {
            if let Err(e) = writeln!(writer, "{line}") {
                return Err(state.fail(write_err(e)));
            }
            state.lines_kept += 1;
        }
    }

    if let Err(e) = write_summaries(&mut writer, &state.occurrences) {
        return Err(state.fail(write_err(e)));
    }

    let result = state.into_result();

    tracing::debug!(
        source = %source.display(),
        category = %catalog.category,
        lines_read = result.lines_read,
        lines_kept = result.lines_kept,
        severity = result.diagnosis.severity,
        "Scan complete"
    );

    Ok(result)
}

/// Separator + summary block per rule with summarised lines, then flush.
fn write_summaries<W: Write>(writer: &mut W, occurrences: &[PatternOccurrence]) -> std::io::Result<()> {
    let separator = separator_line();
    for occ in occurrences.iter().filter(|o| o.filtered_count > 0) {
        let example = occ.first_example.as_deref().unwrap_or_default();
        writeln!(writer, "{separator}")?;
        writeln!(writer, "{}", summary_message(occ.filtered_count, example))?;
    }
    writer.flush()
}
