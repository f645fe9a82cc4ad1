// LogDiag - util/error.rs
//
// Typed error hierarchy with context-preserving error chains.
// All errors preserve the causal chain for diagnostic logging.
//
// Note the distinction: these errors mean the engine itself could not do its
// job. Failures *found* in the logs are reported through `Diagnosis`, never
// through this hierarchy.

use std::fmt;
use std::io;
use std::path::PathBuf;

/// Top-level error type for all LogDiag operations.
/// Errors are categorised by the subsystem that produced them.
#[derive(Debug)]
pub enum LogDiagError {
    /// Catalog loading or validation failed.
    Catalog(CatalogError),

    /// Node discovery or aggregation failed.
    Aggregate(AggregateError),

    /// Writing a report artifact failed.
    Report(ReportError),

    /// Configuration loading or validation failed.
    Config(ConfigError),
}

impl fmt::Display for LogDiagError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Catalog(e) => write!(f, "Catalog error: {e}"),
            Self::Aggregate(e) => write!(f, "Aggregation error: {e}"),
            Self::Report(e) => write!(f, "Report error: {e}"),
            Self::Config(e) => write!(f, "Configuration error: {e}"),
        }
    }
}

impl std::error::Error for LogDiagError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Catalog(e) => Some(e),
            Self::Aggregate(e) => Some(e),
            Self::Report(e) => Some(e),
            Self::Config(e) => Some(e),
        }
    }
}

// ---------------------------------------------------------------------------
// Catalog errors
// ---------------------------------------------------------------------------

/// Errors related to pattern catalog loading and validation.
///
/// Every variant is fatal: a rule silently dropped could mask a real
/// failure class, so the run aborts before any scanning starts.
#[derive(Debug)]
pub enum CatalogError {
    /// The resources directory does not exist or is not a directory.
    DirectoryNotFound { path: PathBuf },

    /// Catalog file is not valid JSON or does not have the expected shape.
    Json {
        path: PathBuf,
        source: serde_json::Error,
    },

    /// Catalog file exceeds the maximum allowed size.
    FileTooLarge {
        path: PathBuf,
        size: u64,
        max_size: u64,
    },

    /// A required field is missing (or empty) in a rule.
    MissingField {
        category: String,
        index: usize,
        field: &'static str,
    },

    /// A numeric field is outside its allowed range.
    ValueOutOfRange {
        category: String,
        rule_id: String,
        field: &'static str,
        value: i64,
        expected: &'static str,
    },

    /// A regex pattern is invalid.
    InvalidRegex {
        category: String,
        rule_id: String,
        pattern: String,
        source: regex::Error,
    },

    /// A pattern exceeds the maximum allowed length.
    PatternTooLong {
        category: String,
        rule_id: String,
        length: usize,
        max_length: usize,
    },

    /// Two rules in the same category share an id.
    DuplicateId { category: String, id: String },

    /// A category has more rules than allowed.
    TooManyRules {
        category: String,
        count: usize,
        max: usize,
    },

    /// The resources directory holds more catalogs than allowed.
    TooManyCatalogs { count: usize, max: usize },

    /// I/O error reading a catalog file or listing the directory.
    Io { path: PathBuf, source: io::Error },
}

impl fmt::Display for CatalogError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DirectoryNotFound { path } => write!(
                f,
                "Catalog directory '{}' does not exist or is not a directory",
                path.display()
            ),
            Self::Json { path, source } => {
                write!(f, "Failed to parse catalog '{}': {source}", path.display())
            }
            Self::FileTooLarge {
                path,
                size,
                max_size,
            } => write!(
                f,
                "Catalog '{}' is {size} bytes, exceeds maximum of {max_size} bytes",
                path.display()
            ),
            Self::MissingField {
                category,
                index,
                field,
            } => write!(
                f,
                "Catalog '{category}' rule #{index}: missing required field '{field}'"
            ),
            Self::ValueOutOfRange {
                category,
                rule_id,
                field,
                value,
                expected,
            } => write!(
                f,
                "Catalog '{category}' rule '{rule_id}': '{field}' = {value} is out of range. \
                 Expected: {expected}"
            ),
            Self::InvalidRegex {
                category,
                rule_id,
                pattern,
                source,
            } => write!(
                f,
                "Catalog '{category}' rule '{rule_id}': invalid regex ('{pattern}'): {source}"
            ),
            Self::PatternTooLong {
                category,
                rule_id,
                length,
                max_length,
            } => write!(
                f,
                "Catalog '{category}' rule '{rule_id}': pattern is {length} chars, \
                 exceeds maximum of {max_length}"
            ),
            Self::DuplicateId { category, id } => {
                write!(f, "Catalog '{category}': duplicate rule id '{id}'")
            }
            Self::TooManyRules {
                category,
                count,
                max,
            } => write!(
                f,
                "Catalog '{category}' has {count} rules, maximum is {max}"
            ),
            Self::TooManyCatalogs { count, max } => {
                write!(f, "Too many catalogs ({count}), maximum is {max}")
            }
            Self::Io { path, source } => {
                write!(f, "I/O error reading catalog '{}': {source}", path.display())
            }
        }
    }
}

impl std::error::Error for CatalogError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Json { source, .. } => Some(source),
            Self::InvalidRegex { source, .. } => Some(source),
            Self::Io { source, .. } => Some(source),
            _ => None,
        }
    }
}

impl From<CatalogError> for LogDiagError {
    fn from(e: CatalogError) -> Self {
        Self::Catalog(e)
    }
}

// ---------------------------------------------------------------------------
// Scan errors
// ---------------------------------------------------------------------------

/// Errors raised while streaming one log through the scanner.
///
/// Never escalated to `LogDiagError`: the app layer absorbs these into a
/// degraded `FileScan` that keeps the diagnosis gathered before the error.
#[derive(Debug)]
pub enum ScanError {
    /// Reading the source log failed.
    Read { file: PathBuf, source: io::Error },

    /// Writing the filtered copy failed.
    Write { file: PathBuf, source: io::Error },
}

impl fmt::Display for ScanError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Read { file, source } => {
                write!(f, "'{}': read error: {source}", file.display())
            }
            Self::Write { file, source } => {
                write!(f, "'{}': cannot write filtered log: {source}", file.display())
            }
        }
    }
}

impl std::error::Error for ScanError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Read { source, .. } => Some(source),
            Self::Write { source, .. } => Some(source),
        }
    }
}

// ---------------------------------------------------------------------------
// Aggregate errors
// ---------------------------------------------------------------------------

/// Errors related to node discovery and aggregation.
#[derive(Debug)]
pub enum AggregateError {
    /// The logs root does not exist.
    RootNotFound { path: PathBuf },

    /// The logs root is not a directory.
    NotADirectory { path: PathBuf },

    /// No node directories were found and the policy requires at least one.
    NoNodes { path: PathBuf },

    /// More node directories than allowed.
    TooManyNodes { max: usize },

    /// Walkdir traversal error.
    Traversal {
        path: PathBuf,
        source: walkdir::Error,
    },

    /// A configured category log glob is invalid.
    InvalidLogPattern {
        category: String,
        pattern: String,
        source: glob::PatternError,
    },

    /// The scan worker pool could not be created.
    ThreadPool { source: rayon::ThreadPoolBuildError },

    /// One log file is selected by more than one category glob. Each scan
    /// owns its filtered copy, so the run is rejected before scanning.
    OverlappingCategories {
        file: PathBuf,
        categories: Vec<String>,
    },
}

impl fmt::Display for AggregateError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::RootNotFound { path } => {
                write!(f, "Logs root '{}' does not exist", path.display())
            }
            Self::NotADirectory { path } => {
                write!(f, "Logs root '{}' is not a directory", path.display())
            }
            Self::NoNodes { path } => write!(
                f,
                "No node directories found under '{}' and at least one is required",
                path.display()
            ),
            Self::TooManyNodes { max } => {
                write!(f, "Discovery stopped: exceeded maximum of {max} nodes")
            }
            Self::Traversal { path, source } => {
                write!(f, "Error traversing '{}': {source}", path.display())
            }
            Self::InvalidLogPattern {
                category,
                pattern,
                source,
            } => write!(
                f,
                "[categories] {category} = \"{pattern}\" is not a valid glob: {source}"
            ),
            Self::ThreadPool { source } => {
                write!(f, "Cannot start scan worker pool: {source}")
            }
            Self::OverlappingCategories { file, categories } => write!(
                f,
                "'{}' is matched by more than one category ({}); \
                 make the [categories] globs disjoint",
                file.display(),
                categories.join(", ")
            ),
        }
    }
}

impl std::error::Error for AggregateError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Traversal { source, .. } => Some(source),
            Self::InvalidLogPattern { source, .. } => Some(source),
            Self::ThreadPool { source } => Some(source),
            _ => None,
        }
    }
}

impl From<AggregateError> for LogDiagError {
    fn from(e: AggregateError) -> Self {
        Self::Aggregate(e)
    }
}

// ---------------------------------------------------------------------------
// Report errors
// ---------------------------------------------------------------------------

/// Errors related to writing verdict artifacts.
#[derive(Debug)]
pub enum ReportError {
    /// I/O error writing an artifact.
    Io { path: PathBuf, source: io::Error },

    /// CSV serialisation error.
    Csv { path: PathBuf, source: csv::Error },

    /// JSON serialisation error.
    Json {
        path: PathBuf,
        source: serde_json::Error,
    },
}

impl fmt::Display for ReportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io { path, source } => {
                write!(f, "Report I/O error '{}': {source}", path.display())
            }
            Self::Csv { path, source } => {
                write!(f, "CSV report error '{}': {source}", path.display())
            }
            Self::Json { path, source } => {
                write!(f, "JSON report error '{}': {source}", path.display())
            }
        }
    }
}

impl std::error::Error for ReportError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            Self::Csv { source, .. } => Some(source),
            Self::Json { source, .. } => Some(source),
        }
    }
}

impl From<ReportError> for LogDiagError {
    fn from(e: ReportError) -> Self {
        Self::Report(e)
    }
}

// ---------------------------------------------------------------------------
// Config errors
// ---------------------------------------------------------------------------

/// Errors related to configuration loading.
///
/// Only raised for an explicitly requested config file; the implicit
/// platform config degrades to defaults with warnings instead.
#[derive(Debug)]
pub enum ConfigError {
    /// The explicitly requested config file does not exist.
    NotFound { path: PathBuf },

    /// TOML parsing failed.
    TomlParse {
        path: PathBuf,
        source: toml::de::Error,
    },

    /// I/O error reading config file.
    Io { path: PathBuf, source: io::Error },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotFound { path } => {
                write!(f, "Config file '{}' does not exist", path.display())
            }
            Self::TomlParse { path, source } => {
                write!(f, "Config parse error '{}': {source}", path.display())
            }
            Self::Io { path, source } => {
                write!(f, "Config I/O error '{}': {source}", path.display())
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::TomlParse { source, .. } => Some(source),
            Self::Io { source, .. } => Some(source),
            Self::NotFound { .. } => None,
        }
    }
}

impl From<ConfigError> for LogDiagError {
    fn from(e: ConfigError) -> Self {
        Self::Config(e)
    }
}

/// Convenience type alias for LogDiag results.
pub type Result<T> = std::result::Result<T, LogDiagError>;
