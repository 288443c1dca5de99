use super::interpolation::{ControlPoint, InterpolationTable, TableError, Trend};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Convert a percentile into an absolute rank among `total_candidates`.
///
/// `rank = round((100 - p) / 100 * n)` with halves rounded away from zero,
/// then bounded to `[1, n]`. The percentile is clamped into `[0, 100]` first
/// and a NaN percentile is treated as 0.
pub fn estimate_rank(percentile: f64, total_candidates: u32) -> u32 {
    let percentile = clamp_percentile(percentile);
    let candidates = f64::from(total_candidates.max(1));
    let raw = ((100.0 - percentile) / 100.0 * candidates).round();
    bound_rank(raw, total_candidates)
}

pub(crate) fn clamp_percentile(percentile: f64) -> f64 {
    if percentile.is_nan() {
        0.0
    } else {
        percentile.clamp(0.0, 100.0)
    }
}

pub(crate) fn bound_rank(raw: f64, total_candidates: u32) -> u32 {
    let ceiling = f64::from(total_candidates.max(1));
    if raw.is_nan() {
        return total_candidates.max(1);
    }
    raw.clamp(1.0, ceiling) as u32
}

/// Historical percentile-to-rank curve from a past exam cycle.
///
/// Ranks on the curve are relative to `candidates`, the size of that
/// cycle's field, and are rescaled to the field being predicted for.
#[derive(Debug, Clone, PartialEq)]
pub struct RankTable {
    version: String,
    candidates: u32,
    table: InterpolationTable,
}

impl RankTable {
    pub fn new(
        version: impl Into<String>,
        candidates: u32,
        points: Vec<ControlPoint>,
    ) -> Result<Self, TableError> {
        if candidates == 0 {
            return Err(TableError::ZeroCandidates);
        }
        let table = InterpolationTable::with_trend(points, Trend::NonIncreasing)?;
        Ok(Self {
            version: version.into(),
            candidates,
            table,
        })
    }

    pub(crate) fn from_static(version: &str, candidates: u32, points: &[ControlPoint]) -> Self {
        Self {
            version: version.to_string(),
            candidates: candidates.max(1),
            table: InterpolationTable::from_static(points, Trend::NonIncreasing),
        }
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn candidates(&self) -> u32 {
        self.candidates
    }

    pub fn table(&self) -> &InterpolationTable {
        &self.table
    }

    /// Rank among `total_candidates`. Below the curve's lowest percentile the
    /// rank runs linearly down to the last rank at percentile 0.
    pub fn rank_for(&self, percentile: f64, total_candidates: u32) -> u32 {
        let percentile = clamp_percentile(percentile);
        let last_rank = f64::from(total_candidates.max(1));
        let scale = last_rank / f64::from(self.candidates);
        let floor = self.table.min_input();

        let raw = if percentile >= floor || floor <= 0.0 {
            self.table.interpolate(percentile) * scale
        } else {
            let floor_rank = self.table.interpolate(floor) * scale;
            floor_rank + (last_rank - floor_rank) * (floor - percentile) / floor
        };
        bound_rank(raw.round(), total_candidates)
    }
}

impl Serialize for RankTable {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        #[derive(Serialize)]
        struct Raw<'a> {
            version: &'a str,
            candidates: u32,
            points: &'a [ControlPoint],
        }

        Raw {
            version: &self.version,
            candidates: self.candidates,
            points: self.table.points(),
        }
        .serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for RankTable {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        #[derive(Deserialize)]
        struct Raw {
            version: String,
            candidates: u32,
            points: Vec<ControlPoint>,
        }

        let raw = Raw::deserialize(deserializer)?;
        Self::new(raw.version, raw.candidates, raw.points).map_err(serde::de::Error::custom)
    }
}

/// Which percentile-to-rank conversion a deployment uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RankModelKind {
    #[default]
    Proportional,
    Historical,
}

impl FromStr for RankModelKind {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "proportional" | "formula" => Ok(Self::Proportional),
            "historical" | "table" => Ok(Self::Historical),
            other => Err(format!("unknown rank model '{other}'")),
        }
    }
}

/// Percentile-to-rank conversion resolved against the loaded reference data.
#[derive(Debug, Clone, PartialEq)]
pub enum RankModel {
    Proportional,
    Historical(RankTable),
}

impl RankModel {
    pub fn kind(&self) -> RankModelKind {
        match self {
            RankModel::Proportional => RankModelKind::Proportional,
            RankModel::Historical(_) => RankModelKind::Historical,
        }
    }

    pub fn rank_for(&self, percentile: f64, total_candidates: u32) -> u32 {
        match self {
            RankModel::Proportional => estimate_rank(percentile, total_candidates),
            RankModel::Historical(table) => table.rank_for(percentile, total_candidates),
        }
    }
}
