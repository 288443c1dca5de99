//! Score-to-rank estimation for JEE Main results.
//!
//! The pipeline turns subject marks into a percentile, an overall rank, a
//! category rank, a JEE-Advanced eligibility verdict and a shortlist of
//! colleges. Every stage is a pure function over read-only reference tables;
//! callers own any state they keep between calculations.

pub mod colleges;
pub mod config;
pub mod error;
pub mod estimation;
pub mod prediction;
pub mod reference;
pub mod telemetry;
