use super::category::Category;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// JEE-Advanced qualifying percentile per category.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EligibilityThresholds {
    thresholds: BTreeMap<Category, f64>,
}

impl EligibilityThresholds {
    pub fn new(thresholds: BTreeMap<Category, f64>) -> Self {
        Self { thresholds }
    }

    /// Threshold for a category; General's threshold stands in for any
    /// category the table does not list.
    pub fn threshold_for(&self, category: Category) -> Option<f64> {
        self.thresholds
            .get(&category)
            .or_else(|| self.thresholds.get(&Category::General))
            .copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (Category, f64)> + '_ {
        self.thresholds
            .iter()
            .map(|(category, value)| (*category, *value))
    }
}

/// Outcome of comparing a percentile against the qualifying cutoff.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EligibilityVerdict {
    pub eligible: bool,
    pub threshold: f64,
    pub margin: f64,
}

impl EligibilityVerdict {
    pub fn summary(&self) -> String {
        if self.eligible {
            format!(
                "qualified for JEE Advanced (cutoff {:.2}, ahead by {:.2})",
                self.threshold, self.margin
            )
        } else {
            format!(
                "not qualified for JEE Advanced (cutoff {:.2}, short by {:.2})",
                self.threshold, -self.margin
            )
        }
    }
}

pub fn check_eligibility(
    percentile: f64,
    category: Category,
    thresholds: &EligibilityThresholds,
) -> EligibilityVerdict {
    match thresholds.threshold_for(category) {
        Some(threshold) => EligibilityVerdict {
            eligible: percentile >= threshold,
            threshold,
            margin: percentile - threshold,
        },
        None => EligibilityVerdict {
            eligible: false,
            threshold: 100.0,
            margin: percentile - 100.0,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn thresholds() -> EligibilityThresholds {
        EligibilityThresholds::new(BTreeMap::from([
            (Category::General, 93.75),
            (Category::Obc, 89.75),
            (Category::Sc, 66.25),
        ]))
    }

    #[test]
    fn reports_margin_above_threshold() {
        let verdict = check_eligibility(95.0, Category::General, &thresholds());
        assert!(verdict.eligible);
        assert_eq!(verdict.threshold, 93.75);
        assert!((verdict.margin - 1.25).abs() < 1e-9);
    }

    #[test]
    fn reports_shortfall_below_threshold() {
        let verdict = check_eligibility(60.0, Category::Sc, &thresholds());
        assert!(!verdict.eligible);
        assert!((verdict.margin + 6.25).abs() < 1e-9);
        assert!(verdict.summary().contains("short by 6.25"));
    }

    #[test]
    fn percentile_equal_to_threshold_qualifies() {
        let verdict = check_eligibility(89.75, Category::Obc, &thresholds());
        assert!(verdict.eligible);
        assert_eq!(verdict.margin, 0.0);
    }

    #[test]
    fn unknown_category_uses_general_threshold() {
        let verdict = check_eligibility(92.0, Category::St, &thresholds());
        assert_eq!(verdict.threshold, 93.75);
        assert!(!verdict.eligible);
    }

    #[test]
    fn empty_table_never_qualifies() {
        let verdict = check_eligibility(99.9, Category::General, &EligibilityThresholds::default());
        assert!(!verdict.eligible);
        assert_eq!(verdict.threshold, 100.0);
    }
}
