//! cachemap CLI - shared-memory caching strategy deduction
//!
//! Command-line entry point. It orchestrates the pipeline:
//!
//! 1. Config: cachemap.toml (walking up from the root), then CLI overrides
//! 2. Discovery: explicit files, the legacy `data/<op>/` layout, or every
//!    CSV profile in the root
//! 3. Input: parse each profile into an operator with its functions
//! 4. Deduction: bounded fixpoint per function
//! 5. Reporting: exactly one sink (terminal, one-line, CSV files, JSON)
//!
//! Diagnostics go to stderr through `tracing`; reports go to stdout or to
//! the output directory.

use std::io::IsTerminal;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

use cachemap::config::Config;
use cachemap::deduction::{deduce_operator, Deducer};
use cachemap::discovery::{find_profiles, legacy_profiles, operator_dirs};
use cachemap::input::{read_operator, ProfileName};
use cachemap::rendering::{
    render_summary, Colorizer, CsvReport, JsonReport, ReportContext, ReportSink, TerminalReport,
    TerminalStyle,
};
use cachemap::types::Deduction;

/// Legacy layout root, relative to the project root.
const DATA_DIR: &str = "data";

/// Deduce shared-memory caching strategies from kernel access profiles
///
/// Each profile row describes one variable of one kernel function: its
/// size, how often it is accessed, and a histogram of access strides.
/// cachemap apportions the shared-memory budget across the variables and
/// tags each one BULK, SINGLE, DIRECT or UNSUITABLE.
///
/// Examples:
///   cachemap                           # data/ layout, then *.csv in root
///   cachemap -o gemm -d MINI           # one operator, one dataset size
///   cachemap -f profiles/conv.csv -1   # one file, compact output
///   cachemap --csv --out-dir results   # write <op>.csv result tables
#[derive(Parser, Debug)]
#[command(name = "cachemap")]
#[command(version)]
#[command(about, long_about = None)]
pub struct Cli {
    /// Profile files or directories to process
    ///
    /// Files are processed directly; directories contribute every CSV
    /// profile directly inside them.
    #[arg(value_name = "PATHS")]
    pub paths: Vec<PathBuf>,

    /// Write results to <out-dir>/<operator>.csv instead of the terminal
    #[arg(short, long, conflicts_with = "json")]
    pub csv: bool,

    /// Compact output, one line per variable
    #[arg(short = '1', long)]
    pub oneline: bool,

    /// Omit the `Function: <name>` header in detailed output
    #[arg(short = 'n', long)]
    pub no_header: bool,

    /// Print every deduction as one JSON document
    #[arg(long)]
    pub json: bool,

    /// Only this operator (legacy data/ layout)
    #[arg(short, long, value_name = "NAME")]
    pub operator: Option<String>,

    /// Only this dataset size, e.g. MINI or LARGE (legacy data/ layout)
    #[arg(short, long, value_name = "NAME")]
    pub dataset: Option<String>,

    /// Process a single profile file
    #[arg(short, long, value_name = "PATH")]
    pub file: Option<PathBuf>,

    /// Project root directory
    ///
    /// Base path for the data/ layout, generic profiles, the config file
    /// lookup and a relative output directory.
    #[arg(short, long, default_value = ".")]
    pub root: PathBuf,

    /// Shared-memory bytes per function (overrides config)
    #[arg(long, value_name = "BYTES")]
    pub capacity: Option<u64>,

    /// Locality threshold between SINGLE and DIRECT (overrides config)
    #[arg(long, value_name = "L")]
    pub threshold: Option<f64>,

    /// Minimum DIRECT line exponent (overrides config)
    #[arg(long, value_name = "EXP")]
    pub min_line: Option<u32>,

    /// Directory for CSV results (overrides config)
    #[arg(long, value_name = "DIR")]
    pub out_dir: Option<PathBuf>,

    /// Do not prefix new CSV result files with a UTF-8 BOM
    #[arg(long)]
    pub no_bom: bool,

    /// Disable colored output
    #[arg(long)]
    pub no_color: bool,

    /// Print strategy totals to stderr at the end
    #[arg(long)]
    pub stats: bool,

    /// Verbose diagnostics (debug-level logging on stderr)
    #[arg(short, long)]
    pub verbose: bool,
}

/// One profile to process.
#[derive(Debug, Clone, PartialEq)]
struct Job {
    ctx: ReportContext,
    path: PathBuf,
    /// Explicitly named by the user; a read failure aborts the run
    explicit: bool,
}

impl Job {
    fn from_path(path: PathBuf, explicit: bool) -> Self {
        let name = ProfileName::from_path(&path);
        Self {
            ctx: ReportContext::new(name.operator, name.dataset),
            path,
            explicit,
        }
    }
}

/// What a run produced, for the closing messages.
#[derive(Debug, Default)]
struct RunSummary {
    profiles: usize,
    deductions: Vec<Deduction>,
    csv_dir: Option<PathBuf>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let colors = Colorizer::new(!cli.no_color && std::io::stdout().is_terminal());
    let summary = run(&cli, colors)?;

    if summary.profiles == 0 {
        eprintln!("No profiles found. Check --root, --file or the data/ layout.");
    }

    if cli.stats {
        let stats_colors = Colorizer::new(!cli.no_color && std::io::stderr().is_terminal());
        eprintln!("{}", render_summary(&summary.deductions, &stats_colors));
    }

    if let Some(dir) = summary.csv_dir {
        println!("Results written to {}", dir.display());
    }

    Ok(())
}

/// stderr logging; `RUST_LOG` wins unless --verbose asks for debug.
fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("warn,cachemap=debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

/// Execute the full pipeline with a sink chosen from the flags.
fn run(cli: &Cli, colors: Colorizer) -> Result<RunSummary> {
    let root = cli
        .root
        .canonicalize()
        .with_context(|| format!("Failed to resolve root path '{}'", cli.root.display()))?;

    let mut config = Config::load(&root);
    apply_overrides(&mut config, cli);
    info!("cachemap v{} at {}", env!("CARGO_PKG_VERSION"), root.display());
    for line in config.display_summary().lines() {
        info!("{}", line);
    }

    let jobs = collect_jobs(cli, &root, &config)?;
    debug!("{} profiles to process", jobs.len());

    let csv_dir = cli.csv.then(|| resolve(&root, &config.output_dir));
    let mut sink: Box<dyn ReportSink> = if let Some(dir) = &csv_dir {
        Box::new(CsvReport::new(dir, config.bom))
    } else if cli.json {
        Box::new(JsonReport::new(std::io::stdout()))
    } else {
        let style = if cli.oneline {
            TerminalStyle::OneLine
        } else {
            TerminalStyle::Detailed
        };
        Box::new(TerminalReport::new(std::io::stdout(), style, colors).with_header(!cli.no_header))
    };

    let deducer = Deducer::new(config.deduction.clone());
    let mut summary = process(&deducer, &jobs, sink.as_mut())?;
    sink.finish()?;

    summary.csv_dir = csv_dir;
    Ok(summary)
}

/// Deduce every job into the sink.
fn process(deducer: &Deducer, jobs: &[Job], sink: &mut dyn ReportSink) -> Result<RunSummary> {
    let mut summary = RunSummary::default();

    for job in jobs {
        info!("processing {} ({})", job.ctx.operator, job.ctx.workload());

        let op = match read_operator(&job.ctx.operator, job.ctx.dataset.as_deref(), &job.path) {
            Ok(op) => op,
            Err(e) if job.explicit => return Err(e.into()),
            Err(e) => {
                warn!("skipping {}: {}", job.path.display(), e);
                continue;
            }
        };

        sink.begin_operator(&job.ctx)?;
        for deduction in deduce_operator(deducer, &op) {
            sink.emit(&job.ctx, &deduction)
                .with_context(|| format!("Failed to report {} {}", job.ctx.operator, deduction.func_name))?;
            summary.deductions.push(deduction);
        }
        summary.profiles += 1;
    }

    Ok(summary)
}

/// CLI flags take precedence over cachemap.toml.
fn apply_overrides(config: &mut Config, cli: &Cli) {
    if let Some(capacity) = cli.capacity {
        config.deduction.capacity = capacity;
    }
    if let Some(threshold) = cli.threshold {
        config.deduction.strategy_threshold = threshold;
    }
    if let Some(min_line) = cli.min_line {
        config.deduction.min_line_exponent = min_line;
    }
    if let Some(ref out_dir) = cli.out_dir {
        config.output_dir = out_dir.clone();
    }
    if cli.no_bom {
        config.bom = false;
    }
}

/// Decide which profiles this run covers.
///
/// - explicit file or paths: exactly those (directories expand to their CSVs)
/// - operator or dataset filter: the legacy data/ layout, filtered
/// - otherwise: the whole legacy layout if data/ exists, then every CSV
///   profile directly in the root
fn collect_jobs(cli: &Cli, root: &Path, config: &Config) -> Result<Vec<Job>> {
    let mut jobs = Vec::new();

    if cli.file.is_some() || !cli.paths.is_empty() {
        for path in cli.file.iter().chain(&cli.paths) {
            let path = resolve(root, path);
            if path.is_dir() {
                for file in find_profiles(&path, config)? {
                    jobs.push(Job::from_path(file, false));
                }
            } else {
                jobs.push(Job::from_path(path, true));
            }
        }
        return Ok(jobs);
    }

    let data_root = root.join(DATA_DIR);

    if cli.operator.is_some() || cli.dataset.is_some() {
        if !data_root.is_dir() {
            anyhow::bail!("--operator/--dataset need a {} directory under {}", DATA_DIR, root.display());
        }
        jobs.extend(legacy_jobs(cli, &data_root, config)?);
        return Ok(jobs);
    }

    if data_root.is_dir() {
        jobs.extend(legacy_jobs(cli, &data_root, config)?);
    }
    for file in find_profiles(root, config)? {
        // Legacy-named files belong under data/<op>/, not in the root
        if ProfileName::from_path(&file).is_legacy() {
            debug!("skipping legacy-named root file {}", file.display());
            continue;
        }
        jobs.push(Job::from_path(file, false));
    }

    Ok(jobs)
}

fn legacy_jobs(cli: &Cli, data_root: &Path, config: &Config) -> Result<Vec<Job>> {
    let operators = match &cli.operator {
        Some(op) => vec![op.clone()],
        None => operator_dirs(data_root)?,
    };
    let datasets = match &cli.dataset {
        Some(d) => vec![normalize_dataset(d)],
        None => config.datasets.clone(),
    };

    let profiles = legacy_profiles(data_root, &operators, &datasets);
    if profiles.is_empty() {
        warn!("no legacy profiles under {}", data_root.display());
    }

    Ok(profiles
        .into_iter()
        .map(|p| Job {
            ctx: ReportContext::new(p.operator, Some(p.dataset)),
            path: p.path,
            explicit: false,
        })
        .collect())
}

/// Accept `mini`, `MINI` and `MINI_DATASET` alike.
fn normalize_dataset(name: &str) -> String {
    let upper = name.to_ascii_uppercase();
    upper.strip_suffix("_DATASET").map(str::to_string).unwrap_or(upper)
}

fn resolve(root: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        root.join(path)
    }
}
