//! JSON report: every deduction of the run in one document.

use std::io::Write;

use anyhow::{Context, Result};
use serde::Serialize;

use super::{ReportContext, ReportSink};
use crate::types::Deduction;

#[derive(Debug, Serialize)]
struct Entry {
    operator: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    dataset: Option<String>,
    workload: String,
    #[serde(flatten)]
    deduction: Deduction,
}

/// Buffers deductions and writes a pretty-printed array on `finish`.
pub struct JsonReport<W: Write> {
    out: W,
    entries: Vec<Entry>,
}

impl<W: Write> JsonReport<W> {
    pub fn new(out: W) -> Self {
        Self {
            out,
            entries: Vec::new(),
        }
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> ReportSink for JsonReport<W> {
    fn emit(&mut self, ctx: &ReportContext, deduction: &Deduction) -> Result<()> {
        self.entries.push(Entry {
            operator: ctx.operator.clone(),
            dataset: ctx.dataset.clone(),
            workload: ctx.workload(),
            deduction: deduction.clone(),
        });
        Ok(())
    }

    fn finish(&mut self) -> Result<()> {
        serde_json::to_writer_pretty(&mut self.out, &self.entries).context("Failed to serialize deductions")?;
        writeln!(self.out)?;
        self.out.flush()?;
        self.entries.clear();
        Ok(())
    }
}
