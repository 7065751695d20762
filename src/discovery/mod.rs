//! Profile discovery.
//!
//! Uses the `ignore` crate to walk directories for CSV profiles, and knows
//! the legacy `data/<op>/<DATASET>_DATASET_<op>.csv` layout.

mod files;

pub use files::{find_profiles, legacy_profiles, operator_dirs, LegacyProfile};
