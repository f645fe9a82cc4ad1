// LogDiag - core/classifier.rs
//
// Single-line classification against a category catalog.
// Core layer: pure functions, no I/O.

use crate::core::model::{Catalog, PatternRule};

/// All rules whose pattern occurs in `line`, in catalog declaration order.
pub fn matching_rules<'a>(line: &str, catalog: &'a Catalog) -> Vec<&'a PatternRule> {
    catalog
        .rules
        .iter()
        .filter(|rule| rule.matcher.is_match(line))
        .collect()
}

/// Select the priority match for `line`: the matching rule with the highest
/// severity.
///
/// Ties on severity resolve to the rule declared first in the catalog. This
/// is a stable contract; reordering a catalog can change which explanation
/// is reported among equally severe rules.
pub fn classify_line<'a>(line: &str, catalog: &'a Catalog) -> Option<&'a PatternRule> {
    let mut best: Option<&PatternRule> = None;
    for rule in &catalog.rules {
        if !rule.matcher.is_match(line) {
            continue;
        }
        // Strictly greater keeps the earliest rule among ties.
        if best.map_or(true, |b| rule.severity > b.severity) {
            best = Some(rule);
        }
    }
    best
}
