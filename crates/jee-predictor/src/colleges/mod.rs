//! College cutoff records and the shortlist matcher.

pub mod domain;
pub mod matcher;

pub use domain::{ChanceTier, CollegeMatch, Cutoff, CutoffRecord, InstitutionClass};
pub use matcher::{
    match_colleges, BandError, CandidateStanding, ChanceBands, ClosingRanksOnly, CutoffResolver,
    MatchPolicy, DEFAULT_TOP_N,
};
