use super::domain::{PredictionRequest, PredictionResult};
use super::engine::PredictionEngine;
use super::format::format_rank;
use super::validation::PredictionError;
use crate::colleges::CollegeMatch;
use serde::Serialize;
use std::collections::BTreeSet;
use std::sync::Arc;

/// Holds the most recent prediction for a presentation layer so it can be
/// shared or explored with what-if changes.
#[derive(Debug, Clone)]
pub struct PredictionSession {
    engine: Arc<PredictionEngine>,
    last: Option<(PredictionRequest, PredictionResult)>,
}

/// Difference between the recorded prediction and a modified request.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PredictionDelta {
    pub scenario: PredictionResult,
    pub marks_change: f64,
    pub percentile_change: f64,
    /// Negative means a better (smaller) rank.
    pub rank_change: i64,
    pub category_rank_change: i64,
    pub eligibility_changed: bool,
    pub gained: Vec<String>,
    pub lost: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SharePayload {
    pub title: String,
    pub text: String,
}

impl PredictionSession {
    pub fn new(engine: Arc<PredictionEngine>) -> Self {
        Self { engine, last: None }
    }

    /// Compute and record a prediction, replacing any earlier one.
    pub fn calculate(
        &mut self,
        request: PredictionRequest,
    ) -> Result<&PredictionResult, PredictionError> {
        let result = self.engine.predict(&request)?;
        Ok(self.record(request, result))
    }

    pub fn record(&mut self, request: PredictionRequest, result: PredictionResult) -> &PredictionResult {
        let (_, result) = self.last.insert((request, result));
        result
    }

    pub fn last(&self) -> Option<&PredictionResult> {
        self.last.as_ref().map(|(_, result)| result)
    }

    pub fn last_request(&self) -> Option<&PredictionRequest> {
        self.last.as_ref().map(|(request, _)| request)
    }

    /// Recompute with a modified copy of the recorded request. The recorded
    /// prediction is left in place.
    pub fn what_if<F>(&self, change: F) -> Result<PredictionDelta, PredictionError>
    where
        F: FnOnce(&mut PredictionRequest),
    {
        let (request, baseline) = self.last.as_ref().ok_or(PredictionError::NoBaseline)?;
        let mut modified = request.clone();
        change(&mut modified);
        let scenario = self.engine.predict(&modified)?;

        let before = college_keys(&baseline.colleges);
        let after = college_keys(&scenario.colleges);

        Ok(PredictionDelta {
            marks_change: scenario.total_marks - baseline.total_marks,
            percentile_change: scenario.percentile - baseline.percentile,
            rank_change: i64::from(scenario.rank) - i64::from(baseline.rank),
            category_rank_change: i64::from(scenario.category_rank)
                - i64::from(baseline.category_rank),
            eligibility_changed: scenario.eligibility.eligible != baseline.eligibility.eligible,
            gained: after.difference(&before).cloned().collect(),
            lost: before.difference(&after).cloned().collect(),
            scenario,
        })
    }

    pub fn share_payload(&self) -> Option<SharePayload> {
        self.last().map(share_text)
    }
}

fn college_keys(colleges: &[CollegeMatch]) -> BTreeSet<String> {
    colleges
        .iter()
        .map(|college| format!("{} - {}", college.institution, college.branch))
        .collect()
}

fn share_text(result: &PredictionResult) -> SharePayload {
    let mut text = format!(
        "JEE Main: {:.0}/{:.0} marks, {:.2} percentile, predicted rank {}",
        result.total_marks,
        result.max_marks,
        result.percentile,
        format_rank(result.rank)
    );
    if result.category.is_reserved() {
        text.push_str(&format!(
            " ({} rank {})",
            result.category.label(),
            format_rank(result.category_rank)
        ));
    }
    text.push_str(". ");
    text.push_str(if result.eligibility.eligible {
        "Qualified for JEE Advanced."
    } else {
        "Not qualified for JEE Advanced."
    });
    if let Some(top) = result.colleges.first() {
        text.push_str(&format!(
            " Top pick: {}, {} ({}).",
            top.institution,
            top.branch,
            top.chance.label()
        ));
    }

    SharePayload {
        title: "My JEE Main rank prediction".to_string(),
        text,
    }
}
