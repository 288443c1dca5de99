//! Numeric building blocks of the estimate: table interpolation, rank
//! conversion, category adjustment and eligibility.

pub mod category;
pub mod eligibility;
pub mod interpolation;
pub mod rank;
pub mod subject;

pub use category::{
    category_rank, Category, CategoryCoefficients, CoefficientError, UnknownCategory,
};
pub use eligibility::{check_eligibility, EligibilityThresholds, EligibilityVerdict};
pub use interpolation::{ControlPoint, InterpolationTable, PercentileTable, TableError, Trend};
pub use rank::{estimate_rank, RankModel, RankModelKind, RankTable};
pub use subject::{SubjectEstimator, SubjectPercentiles, SUBJECT_MAX_MARKS};
