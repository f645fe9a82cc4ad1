// LogDiag - platform/config.rs
//
// Platform-specific configuration directory resolution, and config.toml
// loading with startup validation.
//
// Uses the `directories` crate for XDG (Linux), AppData (Windows),
// Library (macOS) compliance.

use crate::util::constants;
use crate::util::error::ConfigError;
use directories::ProjectDirs;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Resolved platform paths for LogDiag configuration.
#[derive(Debug, Clone)]
pub struct PlatformPaths {
    /// Configuration directory (e.g. ~/.config/logdiag/ or %APPDATA%\LogDiag\config\)
    pub config_dir: PathBuf,
}

impl PlatformPaths {
    /// Resolve platform-appropriate paths.
    ///
    /// Falls back to current directory if platform dirs cannot be determined.
    pub fn resolve() -> Self {
        if let Some(proj_dirs) = ProjectDirs::from("", "", constants::APP_ID) {
            let config_dir = proj_dirs.config_dir().to_path_buf();
            tracing::debug!(config = %config_dir.display(), "Platform paths resolved");
            Self { config_dir }
        } else {
            tracing::warn!("Could not determine platform directories, using current directory");
            Self {
                config_dir: PathBuf::from("."),
            }
        }
    }

    /// Default location of config.toml.
    pub fn config_file(&self) -> PathBuf {
        self.config_dir.join(constants::CONFIG_FILE_NAME)
    }
}

// =============================================================================
// config.toml loading and validation
// =============================================================================

/// Raw deserialisable shape of config.toml.
///
/// Unknown keys are silently ignored for forward compatibility.
#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
pub struct RawConfig {
    /// `[scan]` section.
    pub scan: ScanSection,
    /// `[categories]` table: category name -> log file glob.
    pub categories: BTreeMap<String, String>,
    /// `[aggregate]` section.
    pub aggregate: AggregateSection,
    /// `[output]` section.
    pub output: OutputSection,
    /// `[logging]` section.
    pub logging: LoggingSection,
}

/// `[scan]` config section.
#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
pub struct ScanSection {
    /// Scan files on a worker pool.
    pub parallel: Option<bool>,
    /// Number of worker threads (0 = auto).
    pub worker_threads: Option<usize>,
}

/// `[aggregate]` config section.
#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
pub struct AggregateSection {
    /// Fail when the logs root holds no node directories.
    pub require_nodes: Option<bool>,
}

/// `[output]` config section.
#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
pub struct OutputSection {
    pub summary: Option<bool>,
    pub json: Option<bool>,
    pub csv: Option<bool>,
    pub summary_file: Option<String>,
    pub escalate_file: Option<String>,
}

/// `[logging]` config section.
#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
pub struct LoggingSection {
    /// Log level: "error", "warn", "info", "debug", "trace".
    pub level: Option<String>,
}

/// Which verdict artifacts are written to the diagnostics directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputSettings {
    /// Write the human-readable summary.
    pub summary: bool,
    /// Write `verdict.json`.
    pub json: bool,
    /// Write `occurrences.csv`.
    pub csv: bool,
    /// Summary file name inside the diagnostics directory.
    pub summary_file: String,
    /// Escalate sentinel file name inside the diagnostics directory.
    pub escalate_file: String,
}

impl Default for OutputSettings {
    fn default() -> Self {
        Self {
            summary: true,
            json: true,
            csv: true,
            summary_file: constants::DEFAULT_SUMMARY_FILE.to_string(),
            escalate_file: constants::DEFAULT_ESCALATE_FILE.to_string(),
        }
    }
}

/// Validated application configuration derived from `config.toml`.
///
/// Invalid values produce actionable warnings and fall back to defaults.
#[derive(Debug, Clone)]
pub struct AppConfig {
    // -- Scan --
    pub parallel: bool,
    pub worker_threads: usize,

    // -- Categories --
    /// Category name -> log file glob. Categories not listed here use
    /// `<category>.log`.
    pub categories: BTreeMap<String, String>,

    // -- Aggregate --
    pub require_nodes: bool,

    // -- Output --
    pub output: OutputSettings,

    // -- Logging --
    /// Logging level string (for init before tracing is available).
    pub log_level: Option<String>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            parallel: true,
            worker_threads: constants::DEFAULT_WORKER_THREADS,
            categories: BTreeMap::new(),
            require_nodes: false,
            output: OutputSettings::default(),
            log_level: None,
        }
    }
}

/// Parse config TOML content. `path` is used for error messages only.
pub fn parse_config_str(content: &str, path: &Path) -> Result<RawConfig, ConfigError> {
    toml::from_str(content).map_err(|e| ConfigError::TomlParse {
        path: path.to_path_buf(),
        source: e,
    })
}

/// Load and validate configuration.
///
/// With `explicit = Some(path)` (the `--config` flag) every problem reading
/// or parsing the file is fatal. Otherwise the platform default location is
/// used: a missing file is the first-run default, and an unreadable or
/// unparseable file falls back to defaults with a warning.
///
/// Returns the validated config and a list of non-fatal warnings.
pub fn load_config(explicit: Option<&Path>) -> Result<(AppConfig, Vec<String>), ConfigError> {
    if let Some(path) = explicit {
        if !path.exists() {
            return Err(ConfigError::NotFound {
                path: path.to_path_buf(),
            });
        }
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;
        let raw = parse_config_str(&content, path)?;
        tracing::info!(path = %path.display(), "Loaded config.toml");
        return Ok(validate(raw));
    }

    let config_path = PlatformPaths::resolve().config_file();
    if !config_path.exists() {
        tracing::debug!(path = %config_path.display(), "No config.toml found; using defaults");
        return Ok((AppConfig::default(), Vec::new()));
    }

    let raw = std::fs::read_to_string(&config_path)
        .map_err(|e| ConfigError::Io {
            path: config_path.clone(),
            source: e,
        })
        .and_then(|content| parse_config_str(&content, &config_path));

    match raw {
        Ok(raw) => {
            tracing::info!(path = %config_path.display(), "Loaded config.toml");
            Ok(validate(raw))
        }
        Err(e) => {
            let msg = format!("{e}. Using defaults.");
            tracing::warn!("{}", msg);
            Ok((AppConfig::default(), vec![msg]))
        }
    }
}

/// Validate raw config values, accumulating all warnings.
pub fn validate(raw: RawConfig) -> (AppConfig, Vec<String>) {
    let mut config = AppConfig::default();
    let mut warnings: Vec<String> = Vec::new();

    // -- Scan --
    if let Some(parallel) = raw.scan.parallel {
        config.parallel = parallel;
    }
    if let Some(threads) = raw.scan.worker_threads {
        if threads <= constants::MAX_WORKER_THREADS {
            config.worker_threads = threads;
        } else {
            warnings.push(format!(
                "[scan] worker_threads = {threads} is out of range (0-{}). Using default ({}).",
                constants::MAX_WORKER_THREADS,
                constants::DEFAULT_WORKER_THREADS,
            ));
        }
    }

    // -- Categories --
    for (category, pattern) in raw.categories {
        if pattern.trim().is_empty() {
            warnings.push(format!(
                "[categories] {category} has an empty log pattern. Using default ({category}.{}).",
                constants::DEFAULT_LOG_EXTENSION,
            ));
            continue;
        }
        if let Err(e) = glob::Pattern::new(&pattern) {
            warnings.push(format!(
                "[categories] {category} = \"{pattern}\" is not a valid glob ({e}). \
                 Using default ({category}.{}).",
                constants::DEFAULT_LOG_EXTENSION,
            ));
            continue;
        }
        config.categories.insert(category, pattern);
    }

    // -- Aggregate --
    if let Some(require) = raw.aggregate.require_nodes {
        config.require_nodes = require;
    }

    // -- Output --
    let out = raw.output;
    if let Some(v) = out.summary {
        config.output.summary = v;
    }
    if let Some(v) = out.json {
        config.output.json = v;
    }
    if let Some(v) = out.csv {
        config.output.csv = v;
    }
    if let Some(name) = out.summary_file {
        match plain_file_name("summary_file", &name) {
            Ok(()) => config.output.summary_file = name,
            Err(w) => warnings.push(w),
        }
    }
    if let Some(name) = out.escalate_file {
        match plain_file_name("escalate_file", &name) {
            Ok(()) => config.output.escalate_file = name,
            Err(w) => warnings.push(w),
        }
    }

    // -- Logging: level --
    if let Some(ref level) = raw.logging.level {
        let valid = ["error", "warn", "info", "debug", "trace"];
        if valid.contains(&level.to_lowercase().as_str()) {
            config.log_level = Some(level.to_lowercase());
        } else {
            warnings.push(format!(
                "[logging] level = \"{level}\" is not recognised. \
                 Valid values: error, warn, info, debug, trace. Using default (info).",
            ));
        }
    }

    if !warnings.is_empty() {
        tracing::warn!(count = warnings.len(), "Config validation produced warnings");
    }

    (config, warnings)
}

/// Output artifact names must be bare file names inside the diagnostics dir.
fn plain_file_name(field: &str, name: &str) -> Result<(), String> {
    let is_plain = !name.is_empty()
        && name != "."
        && name != ".."
        && Path::new(name).file_name().map(|n| n == name).unwrap_or(false);
    if is_plain {
        Ok(())
    } else {
        Err(format!(
            "[output] {field} = \"{name}\" must be a plain file name. Using default."
        ))
    }
}
