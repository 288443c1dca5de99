use super::import::CutoffImporter;
use super::{
    embedded, CollegeCatalog, DataSet, ReferenceData, ReferenceDataError, ReferenceSummary,
};
use crate::colleges::InstitutionClass;
use serde::de::DeserializeOwned;
use std::path::Path;
use tracing::{debug, info, warn};

/// Reference data together with the files that could not be used.
#[derive(Debug, Clone)]
pub struct LoadedReference {
    pub data: ReferenceData,
    pub fallbacks: Vec<DataSet>,
}

impl LoadedReference {
    pub fn embedded() -> Self {
        Self {
            data: ReferenceData::embedded(),
            fallbacks: Vec::new(),
        }
    }

    pub fn summary(&self) -> ReferenceSummary {
        ReferenceSummary {
            fallbacks: self.fallbacks.clone(),
            ..self.data.summary()
        }
    }
}

/// Load every reference file from `data_dir`, substituting the embedded
/// default for any file that is missing or invalid. `cutoffs.csv` is
/// optional and only reported as a fallback when present but unreadable.
pub fn load_reference(data_dir: Option<&Path>) -> LoadedReference {
    let Some(dir) = data_dir else {
        info!("no reference data directory configured; using embedded tables");
        return LoadedReference::embedded();
    };

    let mut fallbacks = Vec::new();

    let sessions = load_or_fallback(
        dir,
        DataSet::Percentile,
        &mut fallbacks,
        read_json,
        embedded::session_tables,
    );
    let rank_table = load_or_fallback(
        dir,
        DataSet::PercentileRank,
        &mut fallbacks,
        read_json,
        embedded::rank_table,
    );
    let categories = load_or_fallback(
        dir,
        DataSet::Categories,
        &mut fallbacks,
        read_json,
        embedded::category_tables,
    );
    let nit = load_or_fallback(
        dir,
        DataSet::NitCutoffs,
        &mut fallbacks,
        |path| read_catalog(path, InstitutionClass::Nit),
        embedded::nit_catalog,
    );
    let iiit = load_or_fallback(
        dir,
        DataSet::IiitCutoffs,
        &mut fallbacks,
        |path| read_catalog(path, InstitutionClass::Iiit),
        embedded::iiit_catalog,
    );
    let imported = load_imported(dir, &mut fallbacks);

    let data = ReferenceData::new(sessions, rank_table, categories, nit, iiit, imported);
    info!(
        directory = %dir.display(),
        version = %data.version_label(),
        fallbacks = fallbacks.len(),
        colleges = data.colleges().len(),
        "reference data loaded"
    );

    LoadedReference { data, fallbacks }
}

fn load_or_fallback<T>(
    dir: &Path,
    set: DataSet,
    fallbacks: &mut Vec<DataSet>,
    read: impl FnOnce(&Path) -> Result<T, ReferenceDataError>,
    fallback: impl FnOnce() -> T,
) -> T {
    let path = dir.join(set.file_name());
    match read(&path) {
        Ok(value) => {
            debug!(file = %set, "reference file loaded");
            value
        }
        Err(err) => {
            warn!(file = %set, error = %err, "reference file unusable; using embedded default");
            fallbacks.push(set);
            fallback()
        }
    }
}

fn load_imported(dir: &Path, fallbacks: &mut Vec<DataSet>) -> Option<CollegeCatalog> {
    let path = dir.join(DataSet::CutoffCsv.file_name());
    if !path.exists() {
        return None;
    }

    match CutoffImporter::from_path(&path) {
        Ok(catalog) => {
            debug!(records = catalog.records.len(), "cutoff csv imported");
            Some(catalog)
        }
        Err(err) => {
            let err = ReferenceDataError::from(err);
            warn!(file = %DataSet::CutoffCsv, error = %err, "cutoff csv ignored");
            fallbacks.push(DataSet::CutoffCsv);
            None
        }
    }
}

pub(crate) fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T, ReferenceDataError> {
    let raw = std::fs::read_to_string(path).map_err(|source| ReferenceDataError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&raw).map_err(|source| ReferenceDataError::Json {
        path: path.to_path_buf(),
        source,
    })
}

fn read_catalog(path: &Path, class: InstitutionClass) -> Result<CollegeCatalog, ReferenceDataError> {
    let catalog: CollegeCatalog = read_json(path)?;
    if let Some(record) = catalog.misclassified(class) {
        return Err(ReferenceDataError::WrongClass {
            path: path.to_path_buf(),
            institution: record.institution.clone(),
        });
    }
    Ok(catalog)
}
