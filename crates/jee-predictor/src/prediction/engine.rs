use super::domain::{MarksInput, PredictionRequest, PredictionResult, TOTAL_MAX_MARKS};
use super::validation::{InputGuard, PredictionError};
use crate::colleges::{
    match_colleges, CandidateStanding, ChanceBands, Cutoff, CutoffResolver, MatchPolicy,
};
use crate::config::PredictionSettings;
use crate::estimation::{
    check_eligibility, Category, CategoryCoefficients, PercentileTable, RankModel, RankModelKind,
    SubjectEstimator,
};
use crate::reference::ReferenceData;
use chrono::Utc;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::debug;

/// Runs the estimation pipeline against one set of reference tables.
#[derive(Debug, Clone)]
pub struct PredictionEngine {
    reference: Arc<ReferenceData>,
    rank_model: RankModel,
    policy: MatchPolicy,
    total_candidates: u32,
    subjects: SubjectEstimator,
}

impl PredictionEngine {
    pub fn new(reference: Arc<ReferenceData>, settings: &PredictionSettings) -> Self {
        let rank_model = match settings.rank_model {
            RankModelKind::Proportional => RankModel::Proportional,
            RankModelKind::Historical => RankModel::Historical(reference.rank_table.clone()),
        };

        Self {
            reference,
            rank_model,
            policy: MatchPolicy {
                bands: ChanceBands::default(),
                top_n: settings.top_n,
            },
            total_candidates: settings.total_candidates.max(1),
            subjects: SubjectEstimator::default(),
        }
    }

    pub fn reference(&self) -> &ReferenceData {
        &self.reference
    }

    pub fn predict(&self, request: &PredictionRequest) -> Result<PredictionResult, PredictionError> {
        let validated = InputGuard::validate(request)?;
        let total_candidates = validated.total_candidates.unwrap_or(self.total_candidates);
        let category = validated.category;

        let (table, session_table) = self
            .reference
            .sessions
            .table_for(validated.session.as_deref());
        let percentile = table.percentile_for(validated.total_marks);
        let rank = self.rank_model.rank_for(percentile, total_candidates);

        let coefficients = &self.reference.categories.coefficients;
        let category_rank = coefficients.category_rank(rank, category);
        let eligibility =
            check_eligibility(percentile, category, &self.reference.categories.eligibility);

        let subject_percentiles = match validated.marks {
            MarksInput::Subjects {
                physics,
                chemistry,
                mathematics,
            } => Some(self.subjects.estimate(physics, chemistry, mathematics)),
            MarksInput::Total { .. } => None,
        };

        let standing = CandidateStanding::new(
            category,
            validated.home_state.clone(),
            pool_ranks(rank, category, coefficients),
        );
        let resolver = MarksCutoffs {
            table: &self.reference.sessions.default,
            rank_model: &self.rank_model,
            coefficients,
            total_candidates,
        };
        let colleges = match_colleges(&standing, self.reference.colleges(), &self.policy, &resolver);

        debug!(
            total_marks = validated.total_marks,
            percentile,
            rank,
            category = category.code(),
            category_rank,
            eligible = eligibility.eligible,
            matches = colleges.len(),
            "prediction computed"
        );

        Ok(PredictionResult {
            total_marks: validated.total_marks,
            max_marks: TOTAL_MAX_MARKS,
            percentile,
            subject_percentiles,
            rank,
            total_candidates,
            rank_model: self.rank_model.kind(),
            category,
            category_rank,
            eligibility,
            colleges,
            session: validated.session,
            session_table: session_table.map(str::to_string),
            home_state: validated.home_state,
            reference_version: self.reference.version_label(),
            computed_at: Utc::now(),
        })
    }
}

/// Ranks in the open pool, the declared category's pool and its base pool.
fn pool_ranks(
    rank: u32,
    category: Category,
    coefficients: &CategoryCoefficients,
) -> BTreeMap<Category, u32> {
    let mut ranks = BTreeMap::from([(Category::General, rank)]);
    for pool in [category.base(), category] {
        ranks
            .entry(pool)
            .or_insert_with(|| coefficients.category_rank(rank, pool));
    }
    ranks
}

/// Converts closing marks into a closing rank in the same pool, using the
/// default session table and the engine's rank model.
struct MarksCutoffs<'a> {
    table: &'a PercentileTable,
    rank_model: &'a RankModel,
    coefficients: &'a CategoryCoefficients,
    total_candidates: u32,
}

impl CutoffResolver for MarksCutoffs<'_> {
    fn closing_rank(&self, cutoff: Cutoff, pool: Category) -> Option<u32> {
        match cutoff {
            Cutoff::ClosingRank(rank) => Some(rank),
            Cutoff::ClosingMarks(marks) if marks.is_finite() => {
                let percentile = self.table.percentile_for(marks);
                let rank = self.rank_model.rank_for(percentile, self.total_candidates);
                Some(self.coefficients.category_rank(rank, pool))
            }
            Cutoff::ClosingMarks(_) => None,
        }
    }
}
