//! Reference tables the estimators read: marks-to-percentile curves per
//! session, the historical percentile-to-rank curve, category shares and
//! Advanced cutoffs, and the NIT/IIIT closing-rank catalogs.
//!
//! Every data set has an embedded default; [`load_reference`] reads
//! overrides from a data directory and falls back per file.

pub(crate) mod embedded;
mod import;
mod loader;

pub use import::{CutoffImportError, CutoffImporter};
pub use loader::{load_reference, LoadedReference};

use crate::colleges::{CutoffRecord, InstitutionClass};
use crate::estimation::{Category, CategoryCoefficients, EligibilityThresholds, PercentileTable, RankTable};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::path::PathBuf;

/// Marks-to-percentile tables keyed by exam session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionTables {
    pub version: String,
    pub default: PercentileTable,
    #[serde(default)]
    pub sessions: BTreeMap<String, PercentileTable>,
}

impl SessionTables {
    pub fn new(
        version: impl Into<String>,
        default: PercentileTable,
        sessions: BTreeMap<String, PercentileTable>,
    ) -> Self {
        Self {
            version: version.into(),
            default,
            sessions: sessions
                .into_iter()
                .map(|(code, table)| (code.trim().to_ascii_lowercase(), table))
                .collect(),
        }
    }

    /// Table for a session or shift code. A shift code such as `jan-s1`
    /// falls back to its session `jan`, then to the default table. The
    /// second element names the session table used, if any.
    pub fn table_for(&self, session: Option<&str>) -> (&PercentileTable, Option<&str>) {
        let Some(code) = session.map(str::trim).filter(|code| !code.is_empty()) else {
            return (&self.default, None);
        };

        let session_part = code.split('-').next().unwrap_or(code);
        for candidate in [code, session_part] {
            if let Some((key, table)) = self
                .sessions
                .iter()
                .find(|(key, _)| key.eq_ignore_ascii_case(candidate))
            {
                return (table, Some(key.as_str()));
            }
        }

        (&self.default, None)
    }

    pub fn session_codes(&self) -> impl Iterator<Item = &str> {
        self.sessions.keys().map(String::as_str)
    }
}

/// Category shares and JEE-Advanced qualifying percentiles.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryTables {
    pub version: String,
    pub coefficients: CategoryCoefficients,
    pub eligibility: EligibilityThresholds,
}

/// Closing-rank records for one institution family.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CollegeCatalog {
    pub version: String,
    pub records: Vec<CutoffRecord>,
}

impl CollegeCatalog {
    fn misclassified(&self, expected: InstitutionClass) -> Option<&CutoffRecord> {
        self.records.iter().find(|record| record.class != expected)
    }
}

/// One of the reference files that can be supplied in a data directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DataSet {
    Percentile,
    PercentileRank,
    Categories,
    NitCutoffs,
    IiitCutoffs,
    CutoffCsv,
}

impl DataSet {
    pub const fn file_name(self) -> &'static str {
        match self {
            Self::Percentile => "percentile.json",
            Self::PercentileRank => "percentile-rank.json",
            Self::Categories => "categories.json",
            Self::NitCutoffs => "nit-cutoffs.json",
            Self::IiitCutoffs => "iiit-cutoffs.json",
            Self::CutoffCsv => "cutoffs.csv",
        }
    }
}

impl fmt::Display for DataSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.file_name())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ReferenceDataError {
    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid reference data in {}: {source}", path.display())]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("{} lists '{institution}' under the wrong institution class", path.display())]
    WrongClass { path: PathBuf, institution: String },
    #[error(transparent)]
    Import(#[from] CutoffImportError),
}

/// The full set of tables a prediction runs against. Built once and shared
/// read-only.
#[derive(Debug, Clone, PartialEq)]
pub struct ReferenceData {
    pub sessions: SessionTables,
    pub rank_table: RankTable,
    pub categories: CategoryTables,
    pub nit: CollegeCatalog,
    pub iiit: CollegeCatalog,
    pub imported: Option<CollegeCatalog>,
    colleges: Vec<CutoffRecord>,
}

impl ReferenceData {
    pub fn new(
        sessions: SessionTables,
        rank_table: RankTable,
        categories: CategoryTables,
        nit: CollegeCatalog,
        iiit: CollegeCatalog,
        imported: Option<CollegeCatalog>,
    ) -> Self {
        let colleges = merge_records(&nit, &iiit, imported.as_ref());
        Self {
            sessions,
            rank_table,
            categories,
            nit,
            iiit,
            imported,
            colleges,
        }
    }

    pub fn embedded() -> Self {
        Self::new(
            embedded::session_tables(),
            embedded::rank_table(),
            embedded::category_tables(),
            embedded::nit_catalog(),
            embedded::iiit_catalog(),
            None,
        )
    }

    /// Every college-branch record; imported rows replace catalog rows for
    /// the same institution and branch.
    pub fn colleges(&self) -> &[CutoffRecord] {
        &self.colleges
    }

    /// Distinct data versions joined with `+`, in load order.
    pub fn version_label(&self) -> String {
        let mut seen = BTreeSet::new();
        let mut parts = Vec::new();
        let versions = [
            Some(self.sessions.version.as_str()),
            Some(self.rank_table.version()),
            Some(self.categories.version.as_str()),
            Some(self.nit.version.as_str()),
            Some(self.iiit.version.as_str()),
            self.imported.as_ref().map(|catalog| catalog.version.as_str()),
        ];
        for version in versions.into_iter().flatten() {
            if seen.insert(version) {
                parts.push(version);
            }
        }
        parts.join("+")
    }

    pub fn summary(&self) -> ReferenceSummary {
        ReferenceSummary {
            version: self.version_label(),
            sessions: self.sessions.session_codes().map(str::to_string).collect(),
            rank_table_version: self.rank_table.version().to_string(),
            coefficients: Category::ordered()
                .into_iter()
                .map(|category| (category, self.categories.coefficients.coefficient(category)))
                .collect(),
            eligibility: self.categories.eligibility.iter().collect(),
            nit_records: self.nit.records.len(),
            iiit_records: self.iiit.records.len(),
            imported_records: self
                .imported
                .as_ref()
                .map_or(0, |catalog| catalog.records.len()),
            fallbacks: Vec::new(),
        }
    }
}

impl Default for ReferenceData {
    fn default() -> Self {
        Self::embedded()
    }
}

/// Printable overview of the loaded tables.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReferenceSummary {
    pub version: String,
    pub sessions: Vec<String>,
    pub rank_table_version: String,
    pub coefficients: BTreeMap<Category, f64>,
    pub eligibility: BTreeMap<Category, f64>,
    pub nit_records: usize,
    pub iiit_records: usize,
    pub imported_records: usize,
    pub fallbacks: Vec<DataSet>,
}

fn merge_records(
    nit: &CollegeCatalog,
    iiit: &CollegeCatalog,
    imported: Option<&CollegeCatalog>,
) -> Vec<CutoffRecord> {
    let mut records: Vec<CutoffRecord> = nit.records.iter().chain(&iiit.records).cloned().collect();

    for row in imported.into_iter().flat_map(|catalog| &catalog.records) {
        match records.iter_mut().find(|existing| same_programme(existing, row)) {
            Some(existing) => *existing = row.clone(),
            None => records.push(row.clone()),
        }
    }

    records
}

fn same_programme(a: &CutoffRecord, b: &CutoffRecord) -> bool {
    a.institution.trim().eq_ignore_ascii_case(b.institution.trim())
        && a.branch.trim().eq_ignore_ascii_case(b.branch.trim())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::colleges::Cutoff;
    use crate::estimation::ControlPoint;

    fn flat_table(percentile: f64) -> PercentileTable {
        PercentileTable::new(vec![
            ControlPoint::new(300.0, percentile),
            ControlPoint::new(0.0, 0.0),
        ])
        .expect("valid table")
    }

    fn tables() -> SessionTables {
        SessionTables::new(
            "test",
            flat_table(90.0),
            BTreeMap::from([
                ("JAN".to_string(), flat_table(95.0)),
                ("apr-s2".to_string(), flat_table(99.0)),
            ]),
        )
    }

    #[test]
    fn session_lookup_ignores_case() {
        let tables = tables();
        let (table, key) = tables.table_for(Some("Jan"));
        assert_eq!(key, Some("jan"));
        assert_eq!(table.percentile_for(300.0), 95.0);
    }

    #[test]
    fn shift_code_falls_back_to_session() {
        let tables = tables();
        let (table, key) = tables.table_for(Some("jan-s1"));
        assert_eq!(key, Some("jan"));
        assert_eq!(table.percentile_for(300.0), 95.0);

        let (table, key) = tables.table_for(Some("APR-S2"));
        assert_eq!(key, Some("apr-s2"));
        assert_eq!(table.percentile_for(300.0), 99.0);
    }

    #[test]
    fn unknown_or_missing_session_uses_default() {
        let tables = tables();
        assert_eq!(tables.table_for(Some("sep")).1, None);
        assert_eq!(tables.table_for(None).1, None);
        assert_eq!(tables.table_for(Some("  ")).0.percentile_for(300.0), 90.0);
    }

    #[test]
    fn embedded_reference_is_complete() {
        let reference = ReferenceData::embedded();
        assert!(reference.colleges().len() >= 10);
        assert_eq!(reference.version_label(), "embedded-2024+josaa-2024-round-6");
        let summary = reference.summary();
        assert_eq!(summary.coefficients.get(&Category::General), Some(&1.0));
        assert_eq!(summary.nit_records + summary.iiit_records, reference.colleges().len());
    }

    #[test]
    fn imported_rows_replace_catalog_programmes() {
        let base = ReferenceData::embedded();
        let mut replacement = base.nit.records[0].clone();
        replacement.institution = replacement.institution.to_uppercase();
        replacement
            .cutoffs
            .insert(Category::General, Cutoff::ClosingRank(1));

        let reference = ReferenceData::new(
            base.sessions.clone(),
            base.rank_table.clone(),
            base.categories.clone(),
            base.nit.clone(),
            base.iiit.clone(),
            Some(CollegeCatalog {
                version: "csv".to_string(),
                records: vec![replacement],
            }),
        );

        assert_eq!(reference.colleges().len(), base.colleges().len());
        assert_eq!(
            reference.colleges()[0].cutoffs.get(&Category::General),
            Some(&Cutoff::ClosingRank(1))
        );
        assert!(reference.version_label().ends_with("+csv"));
    }

    #[test]
    fn wrong_class_is_detected() {
        let mut catalog = embedded::iiit_catalog();
        assert!(catalog.misclassified(InstitutionClass::Iiit).is_none());
        catalog.records[0].class = InstitutionClass::Nit;
        assert!(catalog.misclassified(InstitutionClass::Iiit).is_some());
    }
}
