use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// One (input, output) pair of a piecewise-linear lookup table.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ControlPoint {
    pub input: f64,
    pub output: f64,
}

impl ControlPoint {
    pub const fn new(input: f64, output: f64) -> Self {
        Self { input, output }
    }
}

/// Direction in which a table's output moves as its input grows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Trend {
    NonDecreasing,
    NonIncreasing,
}

/// Validation failures raised while building a table.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum TableError {
    #[error("lookup table has no control points")]
    Empty,
    #[error("control point ({input}, {output}) is not a finite number")]
    NonFinite { input: f64, output: f64 },
    #[error("control point input {0} appears more than once")]
    DuplicateInput(f64),
    #[error("table output changes direction at input {0}")]
    NonMonotonic(f64),
    #[error("table output must be {expected:?} but trends {found:?}")]
    UnexpectedTrend { expected: Trend, found: Trend },
    #[error("output {output} at input {input} is outside [{min}, {max}]")]
    OutputOutOfRange {
        input: f64,
        output: f64,
        min: f64,
        max: f64,
    },
    #[error("rank table must be drawn from at least one candidate")]
    ZeroCandidates,
}

/// Piecewise-linear table with clamped boundaries.
///
/// Points are kept in descending input order. Lookups inside the table's
/// domain interpolate linearly between the two neighbouring points; lookups
/// at or past either end return the boundary output unchanged.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InterpolationTable {
    points: Vec<ControlPoint>,
    trend: Trend,
}

impl InterpolationTable {
    pub fn new(mut points: Vec<ControlPoint>) -> Result<Self, TableError> {
        if points.is_empty() {
            return Err(TableError::Empty);
        }

        if let Some(point) = points
            .iter()
            .find(|point| !point.input.is_finite() || !point.output.is_finite())
        {
            return Err(TableError::NonFinite {
                input: point.input,
                output: point.output,
            });
        }

        points.sort_by(|a, b| b.input.partial_cmp(&a.input).unwrap_or(Ordering::Equal));

        let mut trend = None;
        for pair in points.windows(2) {
            let (high, low) = (pair[0], pair[1]);
            if high.input == low.input {
                return Err(TableError::DuplicateInput(high.input));
            }

            let step = match high.output.partial_cmp(&low.output) {
                Some(Ordering::Greater) => Trend::NonDecreasing,
                Some(Ordering::Less) => Trend::NonIncreasing,
                _ => continue,
            };

            match trend {
                None => trend = Some(step),
                Some(existing) if existing != step => {
                    return Err(TableError::NonMonotonic(low.input));
                }
                Some(_) => {}
            }
        }

        Ok(Self {
            points,
            trend: trend.unwrap_or(Trend::NonDecreasing),
        })
    }

    /// Build a table and additionally require the given output direction.
    pub fn with_trend(points: Vec<ControlPoint>, expected: Trend) -> Result<Self, TableError> {
        let table = Self::new(points)?;
        if table.trend != expected && !table.is_flat() {
            return Err(TableError::UnexpectedTrend {
                expected,
                found: table.trend,
            });
        }
        Ok(Self {
            trend: expected,
            ..table
        })
    }

    /// Built-in tables skip validation; their tests check them against `new`.
    pub(crate) fn from_static(points: &[ControlPoint], trend: Trend) -> Self {
        let mut points = points.to_vec();
        points.sort_by(|a, b| b.input.partial_cmp(&a.input).unwrap_or(Ordering::Equal));
        Self { points, trend }
    }

    pub fn points(&self) -> &[ControlPoint] {
        &self.points
    }

    pub fn trend(&self) -> Trend {
        self.trend
    }

    /// Lowest input in the table.
    pub fn min_input(&self) -> f64 {
        self.points[self.points.len() - 1].input
    }

    fn is_flat(&self) -> bool {
        self.points
            .windows(2)
            .all(|pair| pair[0].output == pair[1].output)
    }

    pub fn interpolate(&self, x: f64) -> f64 {
        let first = self.points[0];
        let last = self.points[self.points.len() - 1];

        if x >= first.input {
            return first.output;
        }
        if x.is_nan() || x <= last.input {
            return last.output;
        }

        for pair in self.points.windows(2) {
            let (high, low) = (pair[0], pair[1]);
            if x == high.input {
                return high.output;
            }
            if x == low.input {
                return low.output;
            }
            if x < high.input && x > low.input {
                let ratio = (x - low.input) / (high.input - low.input);
                return low.output + (high.output - low.output) * ratio;
            }
        }

        last.output
    }
}

/// Marks-to-percentile table: outputs lie in `[0, 100]` and never fall as
/// marks rise.
#[derive(Debug, Clone, PartialEq)]
pub struct PercentileTable(InterpolationTable);

impl PercentileTable {
    pub fn new(points: Vec<ControlPoint>) -> Result<Self, TableError> {
        if let Some(point) = points
            .iter()
            .find(|point| !(0.0..=100.0).contains(&point.output))
        {
            return Err(TableError::OutputOutOfRange {
                input: point.input,
                output: point.output,
                min: 0.0,
                max: 100.0,
            });
        }

        InterpolationTable::with_trend(points, Trend::NonDecreasing).map(Self)
    }

    pub(crate) fn from_static(points: &[ControlPoint]) -> Self {
        Self(InterpolationTable::from_static(points, Trend::NonDecreasing))
    }

    pub fn percentile_for(&self, marks: f64) -> f64 {
        self.0.interpolate(marks).clamp(0.0, 100.0)
    }

    pub fn table(&self) -> &InterpolationTable {
        &self.0
    }
}

impl Serialize for PercentileTable {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        self.0.points().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for PercentileTable {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let points = Vec::<ControlPoint>::deserialize(deserializer)?;
        Self::new(points).map_err(serde::de::Error::custom)
    }
}

impl<'de> Deserialize<'de> for InterpolationTable {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        #[derive(Deserialize)]
        struct Raw {
            points: Vec<ControlPoint>,
        }

        let raw = Raw::deserialize(deserializer)?;
        Self::new(raw.points).map_err(serde::de::Error::custom)
    }
}
