//! Profile input - from CSV files to `OperatorInfo` records.

mod csv;
mod naming;

pub use csv::{parse_operator, read_operator};
pub use naming::{legacy_file_name, parse_legacy, workload_label, ProfileName, DEFAULT_DATASETS};
