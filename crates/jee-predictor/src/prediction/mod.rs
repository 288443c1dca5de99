//! End-to-end estimate for one student: validation, percentile, rank,
//! category rank, eligibility and the college shortlist.

pub mod domain;
pub mod engine;
pub mod format;
pub mod router;
pub mod session;
pub mod validation;

pub use domain::{MarksInput, PredictionRequest, PredictionResult, TOTAL_MAX_MARKS};
pub use engine::PredictionEngine;
pub use format::format_rank;
pub use router::{prediction_router, PredictionState};
pub use session::{PredictionDelta, PredictionSession, SharePayload};
pub use validation::{InputGuard, PredictionError, ValidatedRequest};
