use super::interpolation::{ControlPoint, PercentileTable};
use serde::{Deserialize, Serialize};

pub const SUBJECT_MAX_MARKS: f64 = 100.0;

/// Piecewise curve for a single 100-mark paper: gentle at the top, roughly
/// linear through the middle of the field.
const SUBJECT_CURVE: [ControlPoint; 10] = [
    ControlPoint::new(100.0, 100.0),
    ControlPoint::new(90.0, 99.0),
    ControlPoint::new(80.0, 95.0),
    ControlPoint::new(70.0, 88.0),
    ControlPoint::new(60.0, 78.0),
    ControlPoint::new(50.0, 65.0),
    ControlPoint::new(40.0, 50.0),
    ControlPoint::new(30.0, 35.0),
    ControlPoint::new(20.0, 20.0),
    ControlPoint::new(0.0, 0.0),
];

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SubjectPercentiles {
    pub physics: f64,
    pub chemistry: f64,
    pub mathematics: f64,
}

/// Estimates per-subject percentiles from subject marks.
#[derive(Debug, Clone)]
pub struct SubjectEstimator {
    curve: PercentileTable,
}

impl SubjectEstimator {
    pub fn new(curve: PercentileTable) -> Self {
        Self { curve }
    }

    pub fn percentile_for(&self, marks: f64) -> f64 {
        self.curve.percentile_for(marks)
    }

    pub fn estimate(&self, physics: f64, chemistry: f64, mathematics: f64) -> SubjectPercentiles {
        SubjectPercentiles {
            physics: self.percentile_for(physics),
            chemistry: self.percentile_for(chemistry),
            mathematics: self.percentile_for(mathematics),
        }
    }
}

impl Default for SubjectEstimator {
    fn default() -> Self {
        Self::new(PercentileTable::from_static(&SUBJECT_CURVE))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn built_in_curve_passes_validation() {
        assert!(PercentileTable::new(SUBJECT_CURVE.to_vec()).is_ok());
    }

    #[test]
    fn matches_band_boundaries() {
        let estimator = SubjectEstimator::default();
        assert_eq!(estimator.percentile_for(90.0), 99.0);
        assert_eq!(estimator.percentile_for(60.0), 78.0);
        assert_eq!(estimator.percentile_for(100.0), 100.0);
        assert_eq!(estimator.percentile_for(0.0), 0.0);
    }

    #[test]
    fn interpolates_inside_a_band() {
        let estimator = SubjectEstimator::default();
        assert!((estimator.percentile_for(75.0) - 91.5).abs() < 1e-9);
        assert!((estimator.percentile_for(10.0) - 10.0).abs() < 1e-9);
    }

    #[test]
    fn estimates_all_three_papers() {
        let estimate = SubjectEstimator::default().estimate(60.0, 70.0, 80.0);
        assert_eq!(estimate.physics, 78.0);
        assert_eq!(estimate.chemistry, 88.0);
        assert_eq!(estimate.mathematics, 95.0);
    }
}
