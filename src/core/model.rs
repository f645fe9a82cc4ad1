// LogDiag - core/model.rs
//
// Core data model types. Pure data definitions with no I/O and no
// platform dependencies.
//
// These types are the shared vocabulary across all layers.

use crate::util::constants;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

// =============================================================================
// Pattern rules (runtime representation of a catalog row)
// =============================================================================

/// How a rule's pattern is tested against a line.
///
/// Chosen at catalog load time; regexes are compiled exactly once and
/// reused across every scan.
#[derive(Debug, Clone)]
pub enum Matcher {
    /// Plain substring containment (case-sensitive).
    Substring(String),

    /// Unanchored regex search.
    Regex(regex::Regex),
}

impl Matcher {
    /// Returns true if the pattern occurs anywhere in `line`.
    pub fn is_match(&self, line: &str) -> bool {
        match self {
            Matcher::Substring(needle) => line.contains(needle.as_str()),
            Matcher::Regex(re) => re.is_match(line),
        }
    }

    /// The source pattern text.
    pub fn pattern(&self) -> &str {
        match self {
            Matcher::Substring(needle) => needle,
            Matcher::Regex(re) => re.as_str(),
        }
    }

    /// Short label for the match mode.
    pub fn mode_label(&self) -> &'static str {
        match self {
            Matcher::Substring(_) => "substring",
            Matcher::Regex(_) => "regex",
        }
    }
}

/// One validated row of a category catalog.
#[derive(Debug, Clone)]
pub struct PatternRule {
    /// Identifier, unique within its category.
    pub id: String,

    /// Compiled matcher for the rule's pattern.
    pub matcher: Matcher,

    /// Severity implied by a match; higher is worse.
    pub severity: u32,

    /// Whether a match implies a transient failure that is safe to retry.
    pub retryable: bool,

    /// Inferred root cause, shown to humans.
    pub explanation: String,

    /// Number of matching lines kept verbatim in the filtered log.
    /// `None` means every matching line is kept.
    pub occurrence_limit: Option<usize>,
}

impl PatternRule {
    /// Returns true if the Nth match (1-based) of this rule is kept verbatim.
    pub fn keeps_occurrence(&self, nth: usize) -> bool {
        self.occurrence_limit.map_or(true, |limit| nth <= limit)
    }
}

/// The immutable set of rules for one log category.
#[derive(Debug, Clone)]
pub struct Catalog {
    /// Category name (e.g. "platform"), taken from the catalog file stem.
    pub category: String,

    /// Rules in declaration order. Declaration order is the tie-break
    /// between same-severity matches on one line.
    pub rules: Vec<PatternRule>,
}

impl Catalog {
    /// Look up a rule by id.
    pub fn rule(&self, id: &str) -> Option<&PatternRule> {
        self.rules.iter().find(|r| r.id == id)
    }
}

// =============================================================================
// Diagnosis
// =============================================================================

/// The (severity, retryable, reason) verdict of one log, or of several merged.
///
/// Immutable once built; merging produces a new value (see `core::merge`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnosis {
    /// Higher is worse. Doubles as the exit code the CI system would report.
    pub severity: u32,

    /// Hint that the failure is transient infrastructure flakiness.
    pub retryable: bool,

    /// Free-text explanation of the inferred cause.
    pub reason: String,
}

impl Default for Diagnosis {
    fn default() -> Self {
        Self {
            severity: constants::DEFAULT_SEVERITY,
            retryable: false,
            reason: constants::DEFAULT_REASON.to_string(),
        }
    }
}

impl Diagnosis {
    pub fn new(severity: u32, retryable: bool, reason: impl Into<String>) -> Self {
        Self {
            severity,
            retryable,
            reason: reason.into(),
        }
    }

    /// Diagnosis implied by a single rule match.
    pub fn from_rule(rule: &PatternRule) -> Self {
        Self::new(rule.severity, rule.retryable, rule.explanation.clone())
    }

    /// Returns true if the reason is still the "nothing found" sentinel.
    pub fn has_default_reason(&self) -> bool {
        self.reason == constants::DEFAULT_REASON
    }
}

impl std::fmt::Display for Diagnosis {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "severity={} retryable={} reason=\"{}\"",
            self.severity, self.retryable, self.reason
        )
    }
}

// =============================================================================
// Occurrence counters (output of one scan)
// =============================================================================

/// Per-pattern counters for one scanned file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PatternOccurrence {
    /// Rule id within the category.
    pub rule_id: String,

    /// Severity of the rule (copied for reporting).
    pub severity: u32,

    /// Total lines whose priority match was this rule.
    pub match_count: usize,

    /// Matching lines summarised rather than kept.
    pub filtered_count: usize,

    /// First summarised line, retained for the summary block.
    pub first_example: Option<String>,
}

/// Result of streaming one log through the scanner.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanResult {
    /// Worst first-seen problem, or the default diagnosis.
    pub diagnosis: Diagnosis,

    /// True if at least one rule with severity > 0 matched.
    pub problem_found: bool,

    /// Lines read from the source.
    pub lines_read: usize,

    /// Lines written to the filtered copy (summary block excluded).
    pub lines_kept: usize,

    /// Counters in first-match order.
    pub occurrences: Vec<PatternOccurrence>,
}

// =============================================================================
// Aggregation reports
// =============================================================================

/// What happened when a log file was scanned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FileStatus {
    /// Scanned to completion.
    Scanned,

    /// File did not exist; contributed the default diagnosis.
    Missing,

    /// An I/O error interrupted the scan; contributed the default diagnosis.
    Degraded,
}

impl FileStatus {
    pub fn label(&self) -> &'static str {
        match self {
            FileStatus::Scanned => "scanned",
            FileStatus::Missing => "missing",
            FileStatus::Degraded => "degraded",
        }
    }
}

/// Outcome of scanning one (node, category, file) triple.
#[derive(Debug, Clone, Serialize)]
pub struct FileScan {
    /// Category whose catalog was applied.
    pub category: String,

    /// Source log path.
    pub path: PathBuf,

    /// Filtered copy path, if one was written.
    pub filtered_path: Option<PathBuf>,

    pub status: FileStatus,

    pub diagnosis: Diagnosis,

    /// True if a rule-based diagnosis was triggered.
    pub problem_found: bool,

    pub lines_read: usize,

    pub lines_kept: usize,

    pub occurrences: Vec<PatternOccurrence>,

    /// Non-fatal warning raised while scanning (missing or degraded file).
    pub warning: Option<String>,
}

/// Merged view of one node (or CI job) across all categories.
#[derive(Debug, Clone, Serialize)]
pub struct NodeReport {
    /// Node directory name.
    pub name: String,

    /// Node directory path.
    pub path: PathBuf,

    /// Fold of every file diagnosis for this node.
    pub diagnosis: Diagnosis,

    pub problem_found: bool,

    /// Per-file outcomes in canonical (category, file name) order.
    pub files: Vec<FileScan>,
}

/// Final verdict of a whole run.
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    /// Fold of every node diagnosis, in node order.
    pub verdict: Diagnosis,

    /// True if any node had a rule-based diagnosis.
    pub problem_found: bool,

    /// Per-node reports in node name order.
    pub nodes: Vec<NodeReport>,

    /// When the report was produced.
    pub generated_at: DateTime<Utc>,
}

impl RunReport {
    /// Whether a human must investigate: a real problem was found that is
    /// not retryable. A clean run (default diagnosis) never escalates.
    pub fn should_escalate(&self) -> bool {
        self.problem_found && !self.verdict.retryable && self.verdict.severity > 0
    }

    /// Warnings raised by individual file scans, in canonical order.
    pub fn warnings(&self) -> impl Iterator<Item = &str> {
        self.nodes
            .iter()
            .flat_map(|n| n.files.iter())
            .filter_map(|f| f.warning.as_deref())
    }
}
