// LogDiag - core/catalog.rs
//
// Pattern catalog parsing and validation.
// Core layer: accepts JSON strings, never touches the filesystem.
// I/O is handled by app::catalog_mgr which feeds content here.

use crate::core::model::{Catalog, Matcher, PatternRule};
use crate::util::constants;
use crate::util::error::CatalogError;
use regex::Regex;
use serde::Deserialize;
use std::collections::HashSet;
use std::path::Path;

// =============================================================================
// JSON deserialization structures (raw input)
// =============================================================================

/// How the `pattern` field is interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum MatchMode {
    #[default]
    Substring,
    Regex,
}

/// Raw catalog row as deserialized from JSON.
///
/// Required fields are `Option` so that a missing field is reported as a
/// `MissingField` naming the rule, not as an opaque serde error.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RuleDefinition {
    pub id: Option<String>,
    pub pattern: Option<String>,
    pub implied_exit_code: Option<i64>,
    #[serde(default = "default_filter_after")]
    pub filter_after_occurrences: i64,
    #[serde(default)]
    pub should_retry: bool,
    #[serde(default)]
    pub readable_inference: String,
    #[serde(default)]
    pub match_mode: MatchMode,
}

fn default_filter_after() -> i64 {
    constants::UNLIMITED_OCCURRENCES
}

// =============================================================================
// Parsing and validation
// =============================================================================

/// Parse a JSON catalog (an array of rule objects).
///
/// `source_path` is used for error messages only (not for I/O).
pub fn parse_catalog_json(
    content: &str,
    source_path: &Path,
) -> Result<Vec<RuleDefinition>, CatalogError> {
    serde_json::from_str(content).map_err(|e| CatalogError::Json {
        path: source_path.to_path_buf(),
        source: e,
    })
}

/// Validate raw rule definitions and compile them into a `Catalog`.
///
/// Validates:
/// - `id`, `pattern`, and `impliedExitCode` are present (`id`/`pattern` non-empty)
/// - ids are unique within the category
/// - `impliedExitCode >= 0`, `filterAfterOccurrences >= -1`
/// - patterns are within the length limit, and regexes compile
///
/// The first violation aborts the whole catalog.
pub fn validate_and_compile(
    category: &str,
    defs: Vec<RuleDefinition>,
) -> Result<Catalog, CatalogError> {
    if defs.len() > constants::MAX_RULES_PER_CATALOG {
        return Err(CatalogError::TooManyRules {
            category: category.to_string(),
            count: defs.len(),
            max: constants::MAX_RULES_PER_CATALOG,
        });
    }

    let mut seen: HashSet<String> = HashSet::with_capacity(defs.len());
    let mut rules = Vec::with_capacity(defs.len());

    for (index, def) in defs.into_iter().enumerate() {
        let rule = compile_rule(category, index, def)?;

        if !seen.insert(rule.id.clone()) {
            return Err(CatalogError::DuplicateId {
                category: category.to_string(),
                id: rule.id,
            });
        }

        if rule.severity == 0 {
            tracing::warn!(
                category,
                rule_id = %rule.id,
                "Rule has impliedExitCode 0 and will never trigger a diagnosis"
            );
        }

        rules.push(rule);
    }

    tracing::debug!(category, rules = rules.len(), "Catalog compiled");

    Ok(Catalog {
        category: category.to_string(),
        rules,
    })
}

fn compile_rule(
    category: &str,
    index: usize,
    def: RuleDefinition,
) -> Result<PatternRule, CatalogError> {
    let missing = |field: &'static str| CatalogError::MissingField {
        category: category.to_string(),
        index,
        field,
    };

    let id = def.id.filter(|s| !s.is_empty()).ok_or_else(|| missing("id"))?;
    let pattern = def
        .pattern
        .filter(|s| !s.is_empty())
        .ok_or_else(|| missing("pattern"))?;
    let exit_code = def
        .implied_exit_code
        .ok_or_else(|| missing("impliedExitCode"))?;

    let severity = u32::try_from(exit_code).map_err(|_| CatalogError::ValueOutOfRange {
        category: category.to_string(),
        rule_id: id.clone(),
        field: "impliedExitCode",
        value: exit_code,
        expected: "a non-negative integer",
    })?;

    let occurrence_limit = match def.filter_after_occurrences {
        constants::UNLIMITED_OCCURRENCES => None,
        n if n >= 0 => Some(n as usize),
        n => {
            return Err(CatalogError::ValueOutOfRange {
                category: category.to_string(),
                rule_id: id,
                field: "filterAfterOccurrences",
                value: n,
                expected: "-1 (never filter) or a non-negative integer",
            })
        }
    };

    let matcher = compile_matcher(category, &id, &pattern, def.match_mode)?;

    Ok(PatternRule {
        id,
        matcher,
        severity,
        retryable: def.should_retry,
        explanation: def.readable_inference,
        occurrence_limit,
    })
}

/// Build the matcher for a pattern, with length validation to prevent ReDoS.
fn compile_matcher(
    category: &str,
    rule_id: &str,
    pattern: &str,
    mode: MatchMode,
) -> Result<Matcher, CatalogError> {
    if pattern.len() > constants::MAX_REGEX_PATTERN_LENGTH {
        return Err(CatalogError::PatternTooLong {
            category: category.to_string(),
            rule_id: rule_id.to_string(),
            length: pattern.len(),
            max_length: constants::MAX_REGEX_PATTERN_LENGTH,
        });
    }

    match mode {
        MatchMode::Substring => Ok(Matcher::Substring(pattern.to_string())),
        MatchMode::Regex => Regex::new(pattern)
            .map(Matcher::Regex)
            .map_err(|e| CatalogError::InvalidRegex {
                category: category.to_string(),
                rule_id: rule_id.to_string(),
                pattern: pattern.to_string(),
                source: e,
            }),
    }
}

/// Parse and compile in one step.
pub fn load_catalog_str(
    category: &str,
    content: &str,
    source_path: &Path,
) -> Result<Catalog, CatalogError> {
    let defs = parse_catalog_json(content, source_path)?;
    validate_and_compile(category, defs)
}

// =============================================================================
// Tests
// =============================================================================
