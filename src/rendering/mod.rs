//! Output rendering - from deductions to reports.
//!
//! Every output format is a `ReportSink`. The CLI builds exactly one sink
//! and passes it down; nothing here keeps global state.
//! - Terminal: detailed per-variable lines, or one line per variable
//! - CSV: rows appended to `<out_dir>/<operator>.csv`
//! - JSON: one document with every deduction, written on finish

mod colors;
mod csv;
mod json;
mod terminal;

pub use colors::Colorizer;
pub use csv::{CsvReport, CSV_COLUMNS};
pub use json::JsonReport;
pub use terminal::{render_summary, TerminalReport, TerminalStyle};

use anyhow::Result;

use crate::input::workload_label;
use crate::types::Deduction;

/// Which profile a batch of deductions came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportContext {
    pub operator: String,
    /// Dataset size label, for legacy-layout profiles
    pub dataset: Option<String>,
}

impl ReportContext {
    pub fn new(operator: impl Into<String>, dataset: Option<String>) -> Self {
        Self {
            operator: operator.into(),
            dataset,
        }
    }

    /// `<DATASET>_DATASET`, or `UNKNOWN` for generic profiles.
    pub fn workload(&self) -> String {
        workload_label(self.dataset.as_deref())
    }
}

/// Destination for deduction results.
pub trait ReportSink {
    /// Called once before the deductions of a profile.
    fn begin_operator(&mut self, _ctx: &ReportContext) -> Result<()> {
        Ok(())
    }

    /// Called once per deduced function.
    fn emit(&mut self, ctx: &ReportContext, deduction: &Deduction) -> Result<()>;

    /// Called once after everything was emitted.
    fn finish(&mut self) -> Result<()> {
        Ok(())
    }
}
