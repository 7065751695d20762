//! Terminal reports.
//!
//! Detailed style, one line per variable:
//!
//! ```text
//! Function: kernel_2mm
//! A: allocated=61439, size=100, accesses=1000, patterns: 0(100.0%), density=10.00, locality=1.0000, strategy=CACHE_BULK, line=100, set=0
//! ```
//!
//! Compact style, grouped under a `<dataset> <op> <func>:` banner:
//!
//! ```text
//! MINI 2mm kernel_2mm:
//! A [CACHE_BULK] Size:100B Acc:1000 Density:10.00 Locality:1.0000 (set=0,line=100)
//! ```

use std::io::Write;

use anyhow::Result;

use super::colors::Colorizer;
use super::{ReportContext, ReportSink};
use crate::types::{AccessFeatureVector, AccessStrategy, Deduction};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TerminalStyle {
    Detailed,
    OneLine,
}

pub struct TerminalReport<W: Write> {
    out: W,
    style: TerminalStyle,
    show_header: bool,
    colors: Colorizer,
}

impl<W: Write> TerminalReport<W> {
    pub fn new(out: W, style: TerminalStyle, colors: Colorizer) -> Self {
        Self {
            out,
            style,
            show_header: true,
            colors,
        }
    }

    /// Toggle the `Function: <name>` header of the detailed style.
    pub fn with_header(mut self, show_header: bool) -> Self {
        self.show_header = show_header;
        self
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn detailed_line(&self, v: &AccessFeatureVector) -> String {
        let patterns: Vec<_> = v.patterns.iter().map(|p| p.render(1)).collect();
        format!(
            "{}: allocated={}, size={}, accesses={}, patterns: {}, density={:.2}, locality={:.4}, strategy={}, line={}, set={}",
            self.colors.variable(&v.var_name),
            v.allocated,
            v.size,
            v.access,
            patterns.join(" "),
            v.density,
            v.locality,
            self.colors.strategy(v.strategy.strategy),
            v.strategy.line,
            v.strategy.set,
        )
    }

    fn one_line(&self, v: &AccessFeatureVector) -> String {
        one_line_with(&self.colors, v)
    }
}

/// Compact rendering of one decided vector.
fn one_line_with(colors: &Colorizer, v: &AccessFeatureVector) -> String {
    let mut line = format!(
        "{} [{}] Size:{}B Acc:{} Density:{:.2} Locality:{:.4}",
        colors.variable(&v.var_name),
        colors.strategy(v.strategy.strategy),
        v.size,
        v.access,
        v.density,
        v.locality,
    );
    if v.strategy.strategy != AccessStrategy::Unsuitable {
        line.push_str(&format!(" (set={},line={})", v.strategy.set, v.strategy.line));
    }
    line
}

impl<W: Write> ReportSink for TerminalReport<W> {
    fn emit(&mut self, ctx: &ReportContext, deduction: &Deduction) -> Result<()> {
        match self.style {
            TerminalStyle::Detailed => {
                if self.show_header {
                    let header = format!("Function: {}", deduction.func_name);
                    writeln!(self.out, "{}", self.colors.header(&header))?;
                }
                for v in &deduction.vectors {
                    let line = self.detailed_line(v);
                    writeln!(self.out, "{}", line)?;
                }
            }
            TerminalStyle::OneLine => {
                let banner = match &ctx.dataset {
                    Some(dataset) => format!("{} {} {}:", dataset, ctx.operator, deduction.func_name),
                    None => format!("{} {}:", ctx.operator, deduction.func_name),
                };
                writeln!(self.out, "{}", self.colors.header(&banner))?;
                for v in &deduction.vectors {
                    let line = self.one_line(v);
                    writeln!(self.out, "{}", line)?;
                }
            }
        }

        for r in &deduction.rejected {
            let note = format!("skipped {}: {}", r.name, r.reason);
            writeln!(self.out, "{}", self.colors.warning(&note))?;
        }

        if self.style == TerminalStyle::Detailed {
            writeln!(self.out)?;
        }
        Ok(())
    }

    fn finish(&mut self) -> Result<()> {
        self.out.flush()?;
        Ok(())
    }
}

/// Strategy totals over a batch of deductions, for `--stats`.
pub fn render_summary(deductions: &[Deduction], colors: &Colorizer) -> String {
    let mut counts = [0usize; 4];
    let mut rounds = 0;
    let mut rejected = 0;
    for d in deductions {
        for (total, n) in counts.iter_mut().zip(d.strategy_counts()) {
            *total += n;
        }
        rounds += d.rounds;
        rejected += d.rejected.len();
    }

    let mut lines = vec![colors.header("## Statistics")];
    lines.push(format!("Functions: {}", deductions.len()));
    lines.push(format!("Variables: {}", counts.iter().sum::<usize>()));
    for (strategy, n) in AccessStrategy::ALL.iter().zip(counts) {
        lines.push(format!("  {}: {}", colors.strategy(*strategy), n));
    }
    lines.push(format!("Allocation rounds: {}", rounds));
    if rejected > 0 {
        lines.push(colors.warning(&format!("Rejected variables: {}", rejected)));
    }
    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::deduction::Deducer;
    use crate::types::{AccessPattern, FunctionInfo, VariableInfo};

    fn deduction() -> Deduction {
        let func = FunctionInfo::new(
            "kernel",
            vec![
                VariableInfo::new("A", 100, 1000, vec![AccessPattern::new(0, 1.0)]),
                VariableInfo::new("B", 1_000_000, 500, vec![AccessPattern::new(4, 1.0)]),
                VariableInfo::new("Z", 0, 1, vec![]),
            ],
        );
        Deducer::default().deduce(&func)
    }

    fn render(style: TerminalStyle, ctx: &ReportContext) -> String {
        let mut report = TerminalReport::new(Vec::new(), style, Colorizer::plain());
        report.emit(ctx, &deduction()).unwrap();
        report.finish().unwrap();
        String::from_utf8(report.into_inner()).unwrap()
    }

    #[test]
    fn test_detailed_output() {
        let out = render(TerminalStyle::Detailed, &ReportContext::new("op", None));
        let lines: Vec<_> = out.lines().collect();

        assert_eq!(lines[0], "Function: kernel");
        assert!(lines[1].starts_with("A: allocated="));
        assert!(lines[1].contains("size=100, accesses=1000, patterns: 0(100.0%), density=10.00, locality=1.0000"));
        assert!(lines[1].ends_with("strategy=CACHE_BULK, line=100, set=0"));
        assert!(lines[2].contains("strategy=CACHE_DIRECT, line=4, set=11"));
        assert!(lines[3].starts_with("skipped Z:"));
        assert!(out.ends_with("\n\n"));
    }

    #[test]
    fn test_detailed_without_header() {
        let mut report =
            TerminalReport::new(Vec::new(), TerminalStyle::Detailed, Colorizer::plain()).with_header(false);
        report.emit(&ReportContext::new("op", None), &deduction()).unwrap();
        let out = String::from_utf8(report.into_inner()).unwrap();
        assert!(out.starts_with("A: "));
    }

    #[test]
    fn test_one_line_output() {
        let out = render(TerminalStyle::OneLine, &ReportContext::new("2mm", Some("MINI".into())));
        let lines: Vec<_> = out.lines().collect();

        assert_eq!(lines[0], "MINI 2mm kernel:");
        assert_eq!(
            lines[1],
            "A [CACHE_BULK] Size:100B Acc:1000 Density:10.00 Locality:1.0000 (set=0,line=100)"
        );
        assert!(lines[2].starts_with("B [CACHE_DIRECT] Size:1000000B Acc:500 Density:0.00 Locality:0.0183"));
    }

    #[test]
    fn test_one_line_unsuitable_has_no_parameters() {
        let mut d = deduction();
        d.vectors[1].strategy = crate::types::StrategyConfig::unsuitable();
        let line = one_line_with(&Colorizer::plain(), &d.vectors[1]);
        assert!(line.ends_with("Locality:0.0183"));
        assert!(!line.contains("set="));
    }

    #[test]
    fn test_summary_counts() {
        let summary = render_summary(&[deduction()], &Colorizer::plain());
        assert!(summary.contains("Functions: 1"));
        assert!(summary.contains("Variables: 2"));
        assert!(summary.contains("CACHE_BULK: 1"));
        assert!(summary.contains("CACHE_DIRECT: 1"));
        assert!(summary.contains("Rejected variables: 1"));
    }
}
