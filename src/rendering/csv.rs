//! CSV result files.
//!
//! One file per operator at `<out_dir>/<operator>.csv`. A new file gets an
//! optional UTF-8 BOM and the header row; existing files are appended to, so
//! every dataset size of an operator ends up in the same table.

use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::PathBuf;

use anyhow::{Context, Result};
use tracing::warn;

use super::{ReportContext, ReportSink};
use crate::types::{AccessFeatureVector, Deduction};

pub const CSV_COLUMNS: &[&str] = &[
    "workload",
    "kernel",
    "variable",
    "allocated",
    "size",
    "accesses",
    "patterns",
    "density",
    "locality",
    "strategy",
    "line",
    "set",
];

const BOM: &str = "\u{feff}";

pub struct CsvReport {
    out_dir: PathBuf,
    bom: bool,
}

impl CsvReport {
    pub fn new(out_dir: impl Into<PathBuf>, bom: bool) -> Self {
        Self {
            out_dir: out_dir.into(),
            bom,
        }
    }

    fn path_for(&self, operator: &str) -> PathBuf {
        self.out_dir.join(format!("{}.csv", operator))
    }
}

impl ReportSink for CsvReport {
    fn emit(&mut self, ctx: &ReportContext, deduction: &Deduction) -> Result<()> {
        fs::create_dir_all(&self.out_dir)
            .with_context(|| format!("Failed to create output directory {}", self.out_dir.display()))?;

        let path = self.path_for(&ctx.operator);
        let is_new = !path.exists();

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .with_context(|| format!("Failed to open {}", path.display()))?;

        let mut buf = String::new();
        if is_new {
            if self.bom {
                buf.push_str(BOM);
            }
            buf.push_str(&CSV_COLUMNS.join(","));
            buf.push('\n');
        }

        let workload = ctx.workload();
        for v in &deduction.vectors {
            buf.push_str(&row(&workload, &deduction.func_name, v));
            buf.push('\n');
        }

        file.write_all(buf.as_bytes())
            .with_context(|| format!("Failed to write {}", path.display()))?;
        Ok(())
    }
}

/// One result row.
fn row(workload: &str, func_name: &str, v: &AccessFeatureVector) -> String {
    let (density, locality) = clamp_metrics(&v.var_name, v.density, v.locality);
    let patterns: Vec<_> = v.patterns.iter().map(|p| p.render(2)).collect();

    [
        field(workload),
        field(func_name),
        field(&v.var_name),
        v.allocated.to_string(),
        v.size.to_string(),
        v.access.to_string(),
        field(&patterns.join(";")),
        format!("{:.6}", density),
        format!("{:.6}", locality),
        v.strategy.strategy.name().to_string(),
        v.strategy.line.to_string(),
        v.strategy.set.to_string(),
    ]
    .join(",")
}

/// Density must be non-negative and locality within [0, 1] in the table.
fn clamp_metrics(var_name: &str, density: f64, locality: f64) -> (f64, f64) {
    let mut density = density;
    let mut locality = locality;

    if density < 0.0 {
        warn!(variable = var_name, "negative access density {}, writing 0", density);
        density = 0.0;
    }
    if locality < 0.0 {
        warn!(variable = var_name, "negative spatial locality {}, writing 0", locality);
        locality = 0.0;
    } else if locality > 1.0 {
        warn!(variable = var_name, "spatial locality {} above 1, writing 1", locality);
        locality = 1.0;
    }

    (density, locality)
}

/// Quote a field if it would break the row.
fn field(s: &str) -> String {
    if s.contains([',', '"', '\n']) {
        format!("\"{}\"", s.replace('"', "\"\""))
    } else {
        s.to_string()
    }
}
