// LogDiag - core/merge.rs
//
// Diagnosis merging as a strict left fold.
//
// The fold maintains a running (severity, retryable, reason) triple. For each
// incoming diagnosis with severity > 0:
//   - severity above the running maximum: reason and retryable are replaced;
//   - otherwise: the reason is adopted only while the running reason is still
//     the default sentinel, and retryable is OR-ed in.
// Severity 0 inputs are ignored. The result's severity is always the maximum
// of all inputs (and of the starting value).
//
// The operation is NOT a commutative operator for `reason`; callers must fold
// in a fixed canonical order.

use crate::core::model::Diagnosis;

/// Running reduction over a sequence of diagnoses.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiagnosisFold {
    current: Diagnosis,
}

impl Default for DiagnosisFold {
    fn default() -> Self {
        Self::new()
    }
}

impl DiagnosisFold {
    /// Start from the default diagnosis.
    pub fn new() -> Self {
        Self::starting_at(Diagnosis::default())
    }

    /// Start from an arbitrary running value.
    pub fn starting_at(initial: Diagnosis) -> Self {
        Self { current: initial }
    }

    /// Fold one diagnosis into the running value.
    pub fn absorb(&mut self, next: &Diagnosis) {
        if next.severity == 0 {
            return;
        }

        if next.severity > self.current.severity {
            self.current = next.clone();
            return;
        }

        if self.current.has_default_reason() {
            self.current.reason.clone_from(&next.reason);
        }
        self.current.retryable |= next.retryable;
    }

    pub fn finish(self) -> Diagnosis {
        self.current
    }
}

impl Diagnosis {
    /// Merge `other` into `self`, producing a new diagnosis.
    ///
    /// Equivalent to one step of `DiagnosisFold` starting at `self`.
    pub fn merge(&self, other: &Diagnosis) -> Diagnosis {
        let mut fold = DiagnosisFold::starting_at(self.clone());
        fold.absorb(other);
        fold.finish()
    }
}

/// Left-fold every diagnosis, starting from the default diagnosis.
///
/// An empty sequence yields the default diagnosis exactly.
pub fn merge_all<'a, I>(diagnoses: I) -> Diagnosis
where
    I: IntoIterator<Item = &'a Diagnosis>,
{
    let mut fold = DiagnosisFold::new();
    for d in diagnoses {
        fold.absorb(d);
    }
    fold.finish()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(severity: u32, retryable: bool, reason: &str) -> Diagnosis {
        Diagnosis::new(severity, retryable, reason)
    }

    fn samples() -> Vec<Diagnosis> {
        vec![
            Diagnosis::default(),
            d(0, true, "zero"),
            d(1, true, "low retry"),
            d(2, false, "two"),
            d(2, true, "two retry"),
            d(9, false, "fatal"),
        ]
    }

    #[test]
    fn test_severity_is_max_for_all_pairs() {
        for a in samples() {
            for b in samples() {
                assert_eq!(
                    a.merge(&b).severity,
                    a.severity.max(b.severity),
                    "merge({a}, {b})"
                );
            }
        }
    }

    #[test]
    fn test_default_is_left_identity() {
        for x in samples().into_iter().filter(|x| x.severity > 0) {
            assert_eq!(Diagnosis::default().merge(&x), x, "default ⊕ {x}");
        }
    }

    #[test]
    fn test_default_is_right_identity() {
        for x in samples() {
            let merged = x.merge(&Diagnosis::default());
            assert_eq!(merged.severity, x.severity.max(1));
            if x.severity >= 1 {
                assert_eq!(merged, x, "{x} ⊕ default");
            }
        }
    }

    #[test]
    fn test_higher_severity_replaces_reason_and_retry() {
        let merged = d(2, true, "flaky").merge(&d(9, false, "fatal"));
        assert_eq!(merged, d(9, false, "fatal"));
    }

    #[test]
    fn test_lower_severity_keeps_reason_but_ors_retry() {
        let merged = d(9, false, "fatal").merge(&d(2, true, "flaky"));
        assert_eq!(merged, d(9, true, "fatal"));
    }

    #[test]
    fn test_equal_severity_first_reason_wins() {
        let merged = d(4, false, "first").merge(&d(4, true, "second"));
        assert_eq!(merged, d(4, true, "first"));
    }

    #[test]
    fn test_equal_severity_adopts_reason_over_sentinel() {
        let merged = Diagnosis::default().merge(&d(1, false, "real cause"));
        assert_eq!(merged.reason, "real cause");
    }

    #[test]
    fn test_zero_severity_is_ignored() {
        let merged = Diagnosis::default().merge(&d(0, true, "nothing"));
        assert_eq!(merged, Diagnosis::default());
    }

    #[test]
    fn test_repeated_merge_is_idempotent() {
        for x in samples() {
            let once = Diagnosis::default().merge(&x);
            let mut five = Diagnosis::default();
            for _ in 0..5 {
                five = five.merge(&x);
            }
            assert_eq!(once, five, "merging {x} repeatedly");
        }
    }

    #[test]
    fn test_merge_all_empty_is_default() {
        assert_eq!(merge_all(std::iter::empty()), Diagnosis::default());
    }

    #[test]
    fn test_merge_all_matches_pairwise_left_fold() {
        let seq = samples();
        let pairwise = seq
            .iter()
            .fold(Diagnosis::default(), |acc, next| acc.merge(next));
        assert_eq!(merge_all(&seq), pairwise);
    }

    #[test]
    fn test_fold_order_matters_for_reason_only() {
        let a = d(3, false, "a");
        let b = d(3, true, "b");
        let ab = merge_all([&a, &b]);
        let ba = merge_all([&b, &a]);
        assert_eq!(ab.severity, ba.severity);
        assert_eq!(ab.retryable, ba.retryable);
        assert_eq!(ab.reason, "a");
        assert_eq!(ba.reason, "b");
    }

    #[test]
    fn test_fold_is_over_severity_not_encounter_order() {
        let flaky = d(2, true, "flaky");
        let fatal = d(9, false, "fatal");
        let verdict = merge_all([&flaky, &fatal]);
        assert_eq!(verdict.severity, 9);
        assert!(!verdict.retryable);
        assert_eq!(verdict.reason, "fatal");
    }
}
