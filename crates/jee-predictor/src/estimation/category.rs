use super::rank::bound_rank;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Reservation category declared on the application form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Category {
    General,
    Ews,
    Obc,
    Sc,
    St,
    PwdGeneral,
    PwdObc,
    PwdSc,
    PwdSt,
}

impl Category {
    pub const fn ordered() -> [Self; 9] {
        [
            Self::General,
            Self::Ews,
            Self::Obc,
            Self::Sc,
            Self::St,
            Self::PwdGeneral,
            Self::PwdObc,
            Self::PwdSc,
            Self::PwdSt,
        ]
    }

    pub const fn code(self) -> &'static str {
        match self {
            Self::General => "general",
            Self::Ews => "ews",
            Self::Obc => "obc",
            Self::Sc => "sc",
            Self::St => "st",
            Self::PwdGeneral => "pwd_general",
            Self::PwdObc => "pwd_obc",
            Self::PwdSc => "pwd_sc",
            Self::PwdSt => "pwd_st",
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::General => "General",
            Self::Ews => "EWS",
            Self::Obc => "OBC-NCL",
            Self::Sc => "SC",
            Self::St => "ST",
            Self::PwdGeneral => "General-PwD",
            Self::PwdObc => "OBC-NCL-PwD",
            Self::PwdSc => "SC-PwD",
            Self::PwdSt => "ST-PwD",
        }
    }

    /// The vertical category with any PwD qualifier removed.
    pub const fn base(self) -> Self {
        match self {
            Self::PwdGeneral => Self::General,
            Self::PwdObc => Self::Obc,
            Self::PwdSc => Self::Sc,
            Self::PwdSt => Self::St,
            other => other,
        }
    }

    pub const fn is_reserved(self) -> bool {
        !matches!(self, Self::General)
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown category code '{0}'")]
pub struct UnknownCategory(pub String);

impl FromStr for Category {
    type Err = UnknownCategory;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let normalized = value.trim().to_ascii_lowercase().replace(['-', ' '], "_");
        let category = match normalized.as_str() {
            "general" | "gen" | "open" | "ur" => Self::General,
            "ews" | "gen_ews" => Self::Ews,
            "obc" | "obc_ncl" => Self::Obc,
            "sc" => Self::Sc,
            "st" => Self::St,
            "pwd" | "pwd_general" | "general_pwd" | "pwd_gen" => Self::PwdGeneral,
            "pwd_obc" | "obc_pwd" | "obc_ncl_pwd" => Self::PwdObc,
            "pwd_sc" | "sc_pwd" => Self::PwdSc,
            "pwd_st" | "st_pwd" => Self::PwdSt,
            _ => return Err(UnknownCategory(value.trim().to_string())),
        };
        Ok(category)
    }
}

impl Serialize for Category {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(self.code())
    }
}

impl<'de> Deserialize<'de> for Category {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// Per-category share of the candidate pool.
///
/// A coefficient of 0.27 for OBC means roughly 27% of candidates ranked
/// ahead of someone belong to that category, so the category rank is
/// `round(absolute_rank * 0.27)`. General is always 1.0.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "BTreeMap<Category, f64>", into = "BTreeMap<Category, f64>")]
pub struct CategoryCoefficients {
    shares: BTreeMap<Category, f64>,
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum CoefficientError {
    #[error("coefficient {value} for {category} must be within (0, 1]")]
    OutOfRange { category: Category, value: f64 },
}

impl CategoryCoefficients {
    pub fn new(shares: BTreeMap<Category, f64>) -> Result<Self, CoefficientError> {
        for (category, value) in &shares {
            if !(value.is_finite() && *value > 0.0 && *value <= 1.0) {
                return Err(CoefficientError::OutOfRange {
                    category: *category,
                    value: *value,
                });
            }
        }
        Ok(Self { shares })
    }

    /// Coefficient for a category, falling back to its base category and
    /// then to 1.0 when neither is configured.
    pub fn coefficient(&self, category: Category) -> f64 {
        if category == Category::General {
            return 1.0;
        }
        self.shares
            .get(&category)
            .or_else(|| self.shares.get(&category.base()))
            .copied()
            .unwrap_or(1.0)
    }

    pub fn iter(&self) -> impl Iterator<Item = (Category, f64)> + '_ {
        self.shares.iter().map(|(category, value)| (*category, *value))
    }

    pub fn category_rank(&self, absolute_rank: u32, category: Category) -> u32 {
        category_rank(absolute_rank, self.coefficient(category))
    }
}

impl TryFrom<BTreeMap<Category, f64>> for CategoryCoefficients {
    type Error = CoefficientError;

    fn try_from(value: BTreeMap<Category, f64>) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<CategoryCoefficients> for BTreeMap<Category, f64> {
    fn from(value: CategoryCoefficients) -> Self {
        value.shares
    }
}

/// `round(absolute_rank * coefficient)`, never below 1 and never above the
/// absolute rank.
pub fn category_rank(absolute_rank: u32, coefficient: f64) -> u32 {
    let absolute_rank = absolute_rank.max(1);
    let coefficient = if coefficient.is_finite() {
        coefficient.clamp(0.0, 1.0)
    } else {
        1.0
    };
    let raw = (f64::from(absolute_rank) * coefficient).round();
    bound_rank(raw, absolute_rank)
}
