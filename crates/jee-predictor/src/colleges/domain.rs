use crate::estimation::Category;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Institution family; NITs are the primary tier, IIITs the secondary tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InstitutionClass {
    Nit,
    Iiit,
}

impl InstitutionClass {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Nit => "NIT",
            Self::Iiit => "IIIT",
        }
    }
}

/// Last admitted position for a college-branch-category in the reference
/// year, either as a rank or as the total marks of that candidate.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Cutoff {
    ClosingRank(u32),
    ClosingMarks(f64),
}

/// Static reference record for one branch of one institution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CutoffRecord {
    pub institution: String,
    pub class: InstitutionClass,
    pub branch: String,
    #[serde(default)]
    pub location: String,
    pub state: String,
    pub cutoffs: BTreeMap<Category, Cutoff>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub home_state_cutoffs: Option<BTreeMap<Category, Cutoff>>,
}

impl CutoffRecord {
    /// Whether a candidate from `home_state` is eligible for this record's
    /// home-state quota.
    pub fn serves_home_state(&self, home_state: &str) -> bool {
        self.home_state_cutoffs.is_some()
            && !home_state.trim().is_empty()
            && self.state.trim().eq_ignore_ascii_case(home_state.trim())
    }

    pub fn has_column(&self, category: Category, home_state_quota: bool) -> bool {
        self.cutoff_for(category, home_state_quota).is_some()
    }

    /// Cutoff for a seat category, preferring the home-state column when the
    /// candidate qualifies for it. Returns the cutoff and whether it came
    /// from the home-state quota.
    pub fn cutoff_for(&self, category: Category, home_state_quota: bool) -> Option<(Cutoff, bool)> {
        if home_state_quota {
            if let Some(cutoff) = self
                .home_state_cutoffs
                .as_ref()
                .and_then(|cutoffs| cutoffs.get(&category))
            {
                return Some((*cutoff, true));
            }
        }

        self.cutoffs.get(&category).map(|cutoff| (*cutoff, false))
    }
}

/// Qualitative admission-likelihood bucket, best first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChanceTier {
    Safe,
    Moderate,
    Risky,
}

impl ChanceTier {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Safe => "Safe",
            Self::Moderate => "Moderate",
            Self::Risky => "Risky",
        }
    }
}

/// A shortlisted college-branch with the seat pool it was matched in.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CollegeMatch {
    pub institution: String,
    pub class: InstitutionClass,
    pub branch: String,
    pub location: String,
    pub state: String,
    pub seat_category: Category,
    pub closing_rank: u32,
    pub candidate_rank: u32,
    pub rank_ratio: f64,
    pub chance: ChanceTier,
    pub home_state_quota: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record() -> CutoffRecord {
        CutoffRecord {
            institution: "NIT Trichy".to_string(),
            class: InstitutionClass::Nit,
            branch: "Computer Science and Engineering".to_string(),
            location: "Tiruchirappalli".to_string(),
            state: "Tamil Nadu".to_string(),
            cutoffs: BTreeMap::from([
                (Category::General, Cutoff::ClosingRank(1_200)),
                (Category::Obc, Cutoff::ClosingRank(420)),
            ]),
            home_state_cutoffs: Some(BTreeMap::from([(
                Category::General,
                Cutoff::ClosingRank(2_900),
            )])),
        }
    }

    #[test]
    fn home_state_match_ignores_case_and_padding() {
        let record = record();
        assert!(record.serves_home_state(" tamil nadu "));
        assert!(!record.serves_home_state("Kerala"));
        assert!(!record.serves_home_state(""));
    }

    #[test]
    fn home_state_column_wins_when_present() {
        let record = record();
        assert_eq!(
            record.cutoff_for(Category::General, true),
            Some((Cutoff::ClosingRank(2_900), true))
        );
        assert_eq!(
            record.cutoff_for(Category::Obc, true),
            Some((Cutoff::ClosingRank(420), false))
        );
        assert_eq!(
            record.cutoff_for(Category::General, false),
            Some((Cutoff::ClosingRank(1_200), false))
        );
        assert!(!record.has_column(Category::Sc, true));
    }

    #[test]
    fn record_deserializes_from_reference_json() {
        let record: CutoffRecord = serde_json::from_str(
            r#"{
                "institution": "IIIT Allahabad",
                "class": "iiit",
                "branch": "Information Technology",
                "state": "Uttar Pradesh",
                "cutoffs": {"general": {"closing_rank": 6500}, "obc": {"closing_marks": 205.0}}
            }"#,
        )
        .expect("valid record");

        assert_eq!(record.class, InstitutionClass::Iiit);
        assert_eq!(record.location, "");
        assert_eq!(
            record.cutoffs.get(&Category::Obc),
            Some(&Cutoff::ClosingMarks(205.0))
        );
        assert!(record.home_state_cutoffs.is_none());
    }

    #[test]
    fn chance_tiers_order_best_first() {
        assert!(ChanceTier::Safe < ChanceTier::Moderate);
        assert!(ChanceTier::Moderate < ChanceTier::Risky);
    }
}
