//! Profile file naming conventions.
//!
//! Two layouts are recognized:
//! - Legacy: `data/<op>/<DATASET>_DATASET_<op>.csv`, one file per dataset size
//! - Generic: any other `<name>.csv`, where the stem is the operator name

use std::path::Path;

/// Dataset sizes of the legacy layout, smallest first.
pub const DEFAULT_DATASETS: &[&str] = &["MINI", "SMALL", "STANDARD", "LARGE", "EXTRALARGE"];

const DATASET_MARKER: &str = "_DATASET_";

/// Operator (and dataset, for legacy files) identified from a file name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProfileName {
    pub operator: String,
    pub dataset: Option<String>,
}

impl ProfileName {
    /// Classify a profile path by its file name.
    pub fn from_path(path: &Path) -> Self {
        let file_name = path
            .file_name()
            .map(|f| f.to_string_lossy().into_owned())
            .unwrap_or_default();

        if let Some((dataset, operator)) = parse_legacy(&file_name) {
            return Self {
                operator,
                dataset: Some(dataset),
            };
        }

        let operator = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or(file_name);
        Self {
            operator,
            dataset: None,
        }
    }

    pub fn is_legacy(&self) -> bool {
        self.dataset.is_some()
    }

    /// Workload label used in reports: `<DATASET>_DATASET` or `UNKNOWN`.
    pub fn workload(&self) -> String {
        workload_label(self.dataset.as_deref())
    }
}

/// Workload label for an optional dataset.
pub fn workload_label(dataset: Option<&str>) -> String {
    match dataset {
        Some(d) => format!("{}_DATASET", d),
        None => "UNKNOWN".to_string(),
    }
}

/// Split `<DATASET>_DATASET_<op>.csv` into (dataset, op).
pub fn parse_legacy(file_name: &str) -> Option<(String, String)> {
    let stem = file_name.strip_suffix(".csv")?;
    let (dataset, operator) = stem.split_once(DATASET_MARKER)?;
    if dataset.is_empty() || operator.is_empty() {
        return None;
    }
    Some((dataset.to_string(), operator.to_string()))
}

/// File name of a legacy profile.
pub fn legacy_file_name(dataset: &str, operator: &str) -> String {
    format!("{}{}{}.csv", dataset, DATASET_MARKER, operator)
}
