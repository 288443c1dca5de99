use super::domain::{MarksInput, PredictionRequest};
use crate::estimation::Category;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum PredictionError {
    #[error("{field} marks must be a finite number")]
    NonFiniteMarks { field: &'static str },
    #[error("{field} marks {value} must lie between 0 and {max}")]
    MarksOutOfRange {
        field: &'static str,
        value: f64,
        max: f64,
    },
    #[error("{field} code must not be empty")]
    EmptyCode { field: &'static str },
    #[error("total candidates must be at least 1")]
    ZeroCandidates,
    #[error("no prediction has been made yet")]
    NoBaseline,
}

/// A request that passed [`InputGuard::validate`]; codes are trimmed.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedRequest {
    pub marks: MarksInput,
    pub total_marks: f64,
    pub category: Category,
    pub session: Option<String>,
    pub home_state: Option<String>,
    pub total_candidates: Option<u32>,
}

/// Rejects malformed input before any estimation runs.
pub struct InputGuard;

impl InputGuard {
    pub fn validate(request: &PredictionRequest) -> Result<ValidatedRequest, PredictionError> {
        for (field, value, max) in request.marks.fields() {
            if !value.is_finite() {
                return Err(PredictionError::NonFiniteMarks { field });
            }
            if !(0.0..=max).contains(&value) {
                return Err(PredictionError::MarksOutOfRange { field, value, max });
            }
        }

        if request.total_candidates == Some(0) {
            return Err(PredictionError::ZeroCandidates);
        }

        Ok(ValidatedRequest {
            marks: request.marks,
            total_marks: request.marks.total(),
            category: request.category,
            session: non_empty_code(request.session.as_deref(), "session")?,
            home_state: non_empty_code(request.home_state.as_deref(), "home state")?,
            total_candidates: request.total_candidates,
        })
    }
}

fn non_empty_code(
    value: Option<&str>,
    field: &'static str,
) -> Result<Option<String>, PredictionError> {
    match value.map(str::trim) {
        None => Ok(None),
        Some("") => Err(PredictionError::EmptyCode { field }),
        Some(code) => Ok(Some(code.to_string())),
    }
}
