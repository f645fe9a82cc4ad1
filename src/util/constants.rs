// LogDiag - util/constants.rs
//
// Single source of truth for all named constants, limits, and defaults.

// =============================================================================
// Application metadata
// =============================================================================

/// Application display name.
pub const APP_NAME: &str = "LogDiag";

/// Application identifier used for config/data directories.
pub const APP_ID: &str = "LogDiag";

/// Current application version.
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

// =============================================================================
// Diagnosis defaults
// =============================================================================

/// Severity of a diagnosis when nothing diagnostic was found.
///
/// Non-zero: it means "examined, nothing actionable". Severity 0
/// is reserved and never produced by a scan.
pub const DEFAULT_SEVERITY: u32 = 1;

/// Reason text of a diagnosis when nothing diagnostic was found.
pub const DEFAULT_REASON: &str = "no recurring infrastructure issue was detected";

// =============================================================================
// Catalog limits
// =============================================================================

/// Maximum size of a single catalog JSON file in bytes.
pub const MAX_CATALOG_FILE_SIZE: u64 = 1024 * 1024; // 1 MB

/// Maximum number of rules in one category catalog.
pub const MAX_RULES_PER_CATALOG: usize = 1_000;

/// Maximum number of category catalogs loaded from a resources directory.
pub const MAX_CATALOGS: usize = 64;

/// Maximum pattern length to prevent ReDoS.
pub const MAX_REGEX_PATTERN_LENGTH: usize = 4_096;

/// Raw `filterAfterOccurrences` value meaning "never filter".
pub const UNLIMITED_OCCURRENCES: i64 = -1;

/// File extension of catalog files inside the resources directory.
pub const CATALOG_EXTENSION: &str = "json";

// =============================================================================
// Filtered log format
// =============================================================================

/// Suffix inserted before the final extension of a filtered log.
pub const FILTERED_SUFFIX: &str = "-filtered";

/// Width of the separator line preceding each summary block.
pub const SEPARATOR_WIDTH: usize = 72;

/// Character repeated to build the separator line.
pub const SEPARATOR_CHAR: char = '-';

// =============================================================================
// Aggregation
// =============================================================================

/// Default number of worker threads for parallel scans.
/// 0 means auto-detect (use available CPU cores).
pub const DEFAULT_WORKER_THREADS: usize = 0;

/// Hard upper bound on configured worker threads.
pub const MAX_WORKER_THREADS: usize = 256;

/// Extension appended to a category name when no log glob is configured.
pub const DEFAULT_LOG_EXTENSION: &str = "log";

/// Maximum number of node directories discovered under a logs root.
pub const MAX_NODES: usize = 10_000;

// =============================================================================
// Output artifacts
// =============================================================================

/// Human-readable verdict summary file name.
pub const DEFAULT_SUMMARY_FILE: &str = "diagnosis.txt";

/// Machine-readable verdict file name.
pub const VERDICT_JSON_FILE: &str = "verdict.json";

/// Per-pattern occurrence statistics file name.
pub const OCCURRENCES_CSV_FILE: &str = "occurrences.csv";

/// Sentinel file created when the run must be investigated by a human.
pub const DEFAULT_ESCALATE_FILE: &str = "must-investigate";

// =============================================================================
// Exit codes
// =============================================================================

/// Exit code used when the engine itself failed (bad catalog, bad paths).
///
/// Chosen outside the range verdict severities are clamped to, so callers of
/// `--exit-code` can tell "engine failed" from "engine found failures".
pub const ENGINE_FAILURE_EXIT_CODE: u8 = 125;

/// Largest exit code a verdict severity may map to.
pub const MAX_VERDICT_EXIT_CODE: u32 = 124;

// =============================================================================
// Logging
// =============================================================================

/// Default log level.
pub const DEFAULT_LOG_LEVEL: &str = "info";

/// Maximum length of a log line included in debug output.
pub const DEBUG_MAX_LINE_PREVIEW: usize = 200;

// =============================================================================
// Configuration
// =============================================================================

/// Configuration file name.
pub const CONFIG_FILE_NAME: &str = "config.toml";
