use super::{CategoryTables, CollegeCatalog, SessionTables};
use crate::colleges::InstitutionClass;
use crate::estimation::{
    Category, CategoryCoefficients, ControlPoint, EligibilityThresholds, PercentileTable, RankTable,
};
use std::collections::BTreeMap;
use tracing::error;

pub(crate) const EMBEDDED_VERSION: &str = "embedded-2024";

/// Marks out of 300 against NTA percentile from the 2024 sessions.
pub(crate) const MARKS_TO_PERCENTILE: [ControlPoint; 29] = [
    ControlPoint::new(280.0, 99.95),
    ControlPoint::new(270.0, 99.90),
    ControlPoint::new(260.0, 99.85),
    ControlPoint::new(250.0, 99.80),
    ControlPoint::new(240.0, 99.70),
    ControlPoint::new(230.0, 99.60),
    ControlPoint::new(220.0, 99.50),
    ControlPoint::new(210.0, 99.30),
    ControlPoint::new(200.0, 99.00),
    ControlPoint::new(190.0, 98.50),
    ControlPoint::new(180.0, 97.50),
    ControlPoint::new(170.0, 96.00),
    ControlPoint::new(160.0, 94.00),
    ControlPoint::new(150.0, 91.00),
    ControlPoint::new(140.0, 87.00),
    ControlPoint::new(130.0, 82.00),
    ControlPoint::new(120.0, 76.00),
    ControlPoint::new(110.0, 69.00),
    ControlPoint::new(100.0, 61.00),
    ControlPoint::new(90.0, 52.00),
    ControlPoint::new(80.0, 43.00),
    ControlPoint::new(70.0, 34.00),
    ControlPoint::new(60.0, 26.00),
    ControlPoint::new(50.0, 19.00),
    ControlPoint::new(40.0, 13.00),
    ControlPoint::new(30.0, 8.00),
    ControlPoint::new(20.0, 4.00),
    ControlPoint::new(10.0, 1.50),
    ControlPoint::new(0.0, 0.00),
];

/// Registered candidates behind `PERCENTILE_TO_RANK`.
pub(crate) const RANK_TABLE_CANDIDATES: u32 = 1_400_000;

/// Percentile against CRL observed in 2024.
pub(crate) const PERCENTILE_TO_RANK: [ControlPoint; 15] = [
    ControlPoint::new(99.99, 1.0),
    ControlPoint::new(99.9, 50.0),
    ControlPoint::new(99.5, 500.0),
    ControlPoint::new(99.0, 2_000.0),
    ControlPoint::new(98.0, 5_000.0),
    ControlPoint::new(95.0, 15_000.0),
    ControlPoint::new(90.0, 35_000.0),
    ControlPoint::new(80.0, 70_000.0),
    ControlPoint::new(70.0, 100_000.0),
    ControlPoint::new(60.0, 130_000.0),
    ControlPoint::new(50.0, 160_000.0),
    ControlPoint::new(40.0, 200_000.0),
    ControlPoint::new(30.0, 250_000.0),
    ControlPoint::new(20.0, 350_000.0),
    ControlPoint::new(10.0, 500_000.0),
];

pub(crate) const CATEGORY_SHARES: [(Category, f64); 8] = [
    (Category::Ews, 0.10),
    (Category::Obc, 0.27),
    (Category::Sc, 0.15),
    (Category::St, 0.075),
    (Category::PwdGeneral, 0.05),
    (Category::PwdObc, 0.0135),
    (Category::PwdSc, 0.0075),
    (Category::PwdSt, 0.00375),
];

pub(crate) const ADVANCED_CUTOFFS: [(Category, f64); 9] = [
    (Category::General, 93.75),
    (Category::Ews, 91.75),
    (Category::Obc, 89.75),
    (Category::Sc, 66.25),
    (Category::St, 61.25),
    (Category::PwdGeneral, 93.75),
    (Category::PwdObc, 89.75),
    (Category::PwdSc, 66.25),
    (Category::PwdSt, 61.25),
];

const NIT_CUTOFFS_JSON: &str = include_str!("../../data/nit-cutoffs.json");
const IIIT_CUTOFFS_JSON: &str = include_str!("../../data/iiit-cutoffs.json");

pub(crate) fn session_tables() -> SessionTables {
    SessionTables::new(
        EMBEDDED_VERSION,
        PercentileTable::from_static(&MARKS_TO_PERCENTILE),
        BTreeMap::new(),
    )
}

pub(crate) fn rank_table() -> RankTable {
    RankTable::from_static(EMBEDDED_VERSION, RANK_TABLE_CANDIDATES, &PERCENTILE_TO_RANK)
}

pub(crate) fn category_tables() -> CategoryTables {
    let coefficients = CategoryCoefficients::new(CATEGORY_SHARES.into_iter().collect())
        .unwrap_or_else(|err| {
            error!(error = %err, "embedded category shares are invalid; using General for all");
            CategoryCoefficients::default()
        });

    CategoryTables {
        version: EMBEDDED_VERSION.to_string(),
        coefficients,
        eligibility: EligibilityThresholds::new(ADVANCED_CUTOFFS.into_iter().collect()),
    }
}

pub(crate) fn nit_catalog() -> CollegeCatalog {
    parse_catalog(NIT_CUTOFFS_JSON, InstitutionClass::Nit)
}

pub(crate) fn iiit_catalog() -> CollegeCatalog {
    parse_catalog(IIIT_CUTOFFS_JSON, InstitutionClass::Iiit)
}

fn parse_catalog(raw: &str, class: InstitutionClass) -> CollegeCatalog {
    serde_json::from_str(raw).unwrap_or_else(|err| {
        error!(class = class.label(), error = %err, "embedded cutoff catalog is unreadable");
        CollegeCatalog {
            version: EMBEDDED_VERSION.to_string(),
            records: Vec::new(),
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::estimation::TableError;

    #[test]
    fn built_in_tables_pass_validation() -> Result<(), TableError> {
        PercentileTable::new(MARKS_TO_PERCENTILE.to_vec())?;
        RankTable::new(
            EMBEDDED_VERSION,
            RANK_TABLE_CANDIDATES,
            PERCENTILE_TO_RANK.to_vec(),
        )?;
        Ok(())
    }

    #[test]
    fn built_in_category_shares_are_valid() {
        assert!(CategoryCoefficients::new(CATEGORY_SHARES.into_iter().collect()).is_ok());
        assert_eq!(category_tables().coefficients.coefficient(Category::Obc), 0.27);
    }

    #[test]
    fn embedded_catalogs_parse() {
        let nits = serde_json::from_str::<CollegeCatalog>(NIT_CUTOFFS_JSON).expect("nit json");
        let iiits = serde_json::from_str::<CollegeCatalog>(IIIT_CUTOFFS_JSON).expect("iiit json");

        assert!(!nits.records.is_empty());
        assert!(!iiits.records.is_empty());
        assert!(nits
            .records
            .iter()
            .all(|record| record.class == InstitutionClass::Nit));
        assert!(iiits
            .records
            .iter()
            .all(|record| record.class == InstitutionClass::Iiit));
    }

    #[test]
    fn every_embedded_record_lists_an_open_cutoff() {
        for record in nit_catalog().records.iter().chain(&iiit_catalog().records) {
            assert!(
                record.cutoffs.contains_key(&Category::General),
                "{} lacks an open cutoff",
                record.institution
            );
        }
    }
}
