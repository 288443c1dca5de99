use super::CollegeCatalog;
use crate::colleges::{Cutoff, CutoffRecord, InstitutionClass};
use crate::estimation::{Category, UnknownCategory};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::io::Read;
use std::path::Path;

pub(crate) const IMPORT_VERSION: &str = "csv-import";

#[derive(Debug, thiserror::Error)]
pub enum CutoffImportError {
    #[error("failed to read cutoff export: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid cutoff CSV data: {0}")]
    Csv(#[from] csv::Error),
    #[error("row {row}: {source}")]
    UnknownCategory {
        row: usize,
        #[source]
        source: UnknownCategory,
    },
    #[error("row {row}: unknown institution class '{value}'")]
    UnknownClass { row: usize, value: String },
    #[error("row {row}: unknown quota '{value}'")]
    UnknownQuota { row: usize, value: String },
    #[error("row {row}: neither a closing rank nor closing marks given")]
    MissingCutoff { row: usize },
}

#[derive(Debug, Deserialize)]
struct CutoffRow {
    #[serde(rename = "Institution")]
    institution: String,
    #[serde(rename = "Class")]
    class: String,
    #[serde(rename = "Branch")]
    branch: String,
    #[serde(rename = "Location", default, deserialize_with = "empty_string_as_none")]
    location: Option<String>,
    #[serde(rename = "State")]
    state: String,
    #[serde(rename = "Category")]
    category: String,
    #[serde(rename = "Quota", default, deserialize_with = "empty_string_as_none")]
    quota: Option<String>,
    #[serde(rename = "Closing Rank", default)]
    closing_rank: Option<u32>,
    #[serde(rename = "Closing Marks", default)]
    closing_marks: Option<f64>,
}

fn empty_string_as_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let opt = Option::<String>::deserialize(deserializer)?;
    Ok(opt.filter(|value| !value.trim().is_empty()))
}

fn parse_class(value: &str, row: usize) -> Result<InstitutionClass, CutoffImportError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "nit" => Ok(InstitutionClass::Nit),
        "iiit" | "iiitm" | "iiitdm" => Ok(InstitutionClass::Iiit),
        _ => Err(CutoffImportError::UnknownClass {
            row,
            value: value.to_string(),
        }),
    }
}

/// `true` for the home-state quota, `false` for other-state/all-India seats.
fn parse_quota(value: Option<&str>, row: usize) -> Result<bool, CutoffImportError> {
    match value.map(|quota| quota.trim().to_ascii_uppercase()) {
        None => Ok(false),
        Some(quota) => match quota.as_str() {
            "HS" => Ok(true),
            "OS" | "AI" => Ok(false),
            _ => Err(CutoffImportError::UnknownQuota { row, value: quota }),
        },
    }
}

/// Builds cutoff records from a JoSAA-style closing-rank export with one row
/// per institution, branch, category and quota.
pub struct CutoffImporter;

impl CutoffImporter {
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<CollegeCatalog, CutoffImportError> {
        let file = std::fs::File::open(path)?;
        Self::from_reader(file)
    }

    pub fn from_reader<R: Read>(reader: R) -> Result<CollegeCatalog, CutoffImportError> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(reader);

        let mut records: Vec<CutoffRecord> = Vec::new();

        for (index, result) in csv_reader.deserialize::<CutoffRow>().enumerate() {
            let row = result?;
            let line = index + 2;

            let class = parse_class(&row.class, line)?;
            let category: Category = row
                .category
                .parse()
                .map_err(|source| CutoffImportError::UnknownCategory { row: line, source })?;
            let home_state = parse_quota(row.quota.as_deref(), line)?;
            let cutoff = match (row.closing_rank, row.closing_marks) {
                (Some(rank), _) => Cutoff::ClosingRank(rank),
                (None, Some(marks)) => Cutoff::ClosingMarks(marks),
                (None, None) => return Err(CutoffImportError::MissingCutoff { row: line }),
            };

            let position = records.iter().position(|record| {
                record.institution.eq_ignore_ascii_case(&row.institution)
                    && record.branch.eq_ignore_ascii_case(&row.branch)
            });
            let record = match position {
                Some(position) => &mut records[position],
                None => {
                    records.push(CutoffRecord {
                        institution: row.institution.clone(),
                        class,
                        branch: row.branch.clone(),
                        location: row.location.clone().unwrap_or_default(),
                        state: row.state.clone(),
                        cutoffs: BTreeMap::new(),
                        home_state_cutoffs: None,
                    });
                    let last = records.len() - 1;
                    &mut records[last]
                }
            };

            if home_state {
                record
                    .home_state_cutoffs
                    .get_or_insert_with(BTreeMap::new)
                    .insert(category, cutoff);
            } else {
                record.cutoffs.insert(category, cutoff);
            }
        }

        Ok(CollegeCatalog {
            version: IMPORT_VERSION.to_string(),
            records,
        })
    }
}
