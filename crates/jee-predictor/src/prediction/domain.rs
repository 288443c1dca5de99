use crate::colleges::CollegeMatch;
use crate::estimation::{
    Category, EligibilityVerdict, RankModelKind, SubjectPercentiles, SUBJECT_MAX_MARKS,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Maximum total marks on the paper (three subjects of 100).
pub const TOTAL_MAX_MARKS: f64 = 300.0;

/// Marks as entered by the student.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum MarksInput {
    Subjects {
        physics: f64,
        chemistry: f64,
        mathematics: f64,
    },
    Total {
        total: f64,
    },
}

impl MarksInput {
    pub fn total(&self) -> f64 {
        match *self {
            MarksInput::Subjects {
                physics,
                chemistry,
                mathematics,
            } => physics + chemistry + mathematics,
            MarksInput::Total { total } => total,
        }
    }

    /// Field name, value and maximum for each entered figure.
    pub(crate) fn fields(&self) -> Vec<(&'static str, f64, f64)> {
        match *self {
            MarksInput::Subjects {
                physics,
                chemistry,
                mathematics,
            } => vec![
                ("physics", physics, SUBJECT_MAX_MARKS),
                ("chemistry", chemistry, SUBJECT_MAX_MARKS),
                ("mathematics", mathematics, SUBJECT_MAX_MARKS),
            ],
            MarksInput::Total { total } => vec![("total", total, TOTAL_MAX_MARKS)],
        }
    }
}

/// One calculation request. `total_candidates` overrides the configured
/// candidate count when present.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionRequest {
    pub marks: MarksInput,
    #[serde(default = "default_category")]
    pub category: Category,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub home_state: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_candidates: Option<u32>,
}

fn default_category() -> Category {
    Category::General
}

impl PredictionRequest {
    pub fn from_subjects(physics: f64, chemistry: f64, mathematics: f64) -> Self {
        Self::new(MarksInput::Subjects {
            physics,
            chemistry,
            mathematics,
        })
    }

    pub fn from_total(total: f64) -> Self {
        Self::new(MarksInput::Total { total })
    }

    fn new(marks: MarksInput) -> Self {
        Self {
            marks,
            category: Category::General,
            session: None,
            home_state: None,
            total_candidates: None,
        }
    }

    pub fn with_category(mut self, category: Category) -> Self {
        self.category = category;
        self
    }

    pub fn with_session(mut self, session: impl Into<String>) -> Self {
        self.session = Some(session.into());
        self
    }

    pub fn with_home_state(mut self, home_state: impl Into<String>) -> Self {
        self.home_state = Some(home_state.into());
        self
    }

    pub fn with_total_candidates(mut self, total_candidates: u32) -> Self {
        self.total_candidates = Some(total_candidates);
        self
    }
}

/// Everything computed for one request. Built fresh per calculation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionResult {
    pub total_marks: f64,
    pub max_marks: f64,
    pub percentile: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subject_percentiles: Option<SubjectPercentiles>,
    pub rank: u32,
    pub total_candidates: u32,
    pub rank_model: RankModelKind,
    pub category: Category,
    pub category_rank: u32,
    pub eligibility: EligibilityVerdict,
    pub colleges: Vec<CollegeMatch>,
    pub session: Option<String>,
    /// Session table actually used; `None` means the default table.
    pub session_table: Option<String>,
    pub home_state: Option<String>,
    pub reference_version: String,
    pub computed_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_json_uses_tagged_marks() {
        let request: PredictionRequest = serde_json::from_str(
            r#"{
                "marks": {"kind": "subjects", "physics": 80, "chemistry": 85, "mathematics": 90},
                "category": "OBC-NCL",
                "home_state": "Kerala"
            }"#,
        )
        .expect("valid request");

        assert_eq!(request.marks.total(), 255.0);
        assert_eq!(request.category, Category::Obc);
        assert_eq!(request.home_state.as_deref(), Some("Kerala"));
        assert!(request.session.is_none());
    }

    #[test]
    fn category_defaults_to_general() {
        let request: PredictionRequest =
            serde_json::from_str(r#"{"marks": {"kind": "total", "total": 180}}"#)
                .expect("valid request");
        assert_eq!(request.category, Category::General);
        assert_eq!(request, PredictionRequest::from_total(180.0));
    }
}
