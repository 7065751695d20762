//! Configuration loading from cachemap.toml.
//!
//! The file is looked up in the working directory first, then in each
//! parent directory. Missing sections fall back to defaults; CLI flags
//! override whatever the file says.
//!
//! ## Example
//!
//! ```toml
//! [deduction]
//! capacity = 61440
//! strategy-threshold = 0.14
//! min-line-exponent = 4
//! defer-starved = true
//!
//! [input]
//! include = ["*.csv"]
//! extend-exclude = ["scratch/**"]
//! datasets = ["MINI", "SMALL"]
//!
//! [output]
//! dir = "results"
//! bom = true
//! ```

use std::path::{Path, PathBuf};

use serde::Deserialize;
use tracing::warn;

use crate::input::DEFAULT_DATASETS;
use crate::types::DeductionConfig;

pub const CONFIG_FILE_NAME: &str = "cachemap.toml";

/// Default directory for CSV result files.
pub const DEFAULT_OUTPUT_DIR: &str = "results";

/// Default exclude patterns (generated output and tool directories).
pub const DEFAULT_EXCLUDES: &[&str] = &["results/**", "**/.git/**", "**/target/**"];

/// Cachemap configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Source file for this config (for display).
    pub source: Option<PathBuf>,

    /// Engine constants.
    pub deduction: DeductionConfig,

    /// Glob patterns for profiles to include. If empty, include every CSV.
    pub include: Vec<String>,

    /// Glob patterns for profiles to exclude. Replaces defaults if set.
    pub exclude: Vec<String>,

    /// Additional exclude patterns (extends defaults).
    pub extend_exclude: Vec<String>,

    /// Dataset sizes scanned in the legacy `data/` layout.
    pub datasets: Vec<String>,

    /// Directory CSV results are written to.
    pub output_dir: PathBuf,

    /// Prefix new result files with a UTF-8 BOM (spreadsheet friendliness).
    pub bom: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            source: None,
            deduction: DeductionConfig::default(),
            include: Vec::new(),
            exclude: Vec::new(),
            extend_exclude: Vec::new(),
            datasets: DEFAULT_DATASETS.iter().map(|s| s.to_string()).collect(),
            output_dir: PathBuf::from(DEFAULT_OUTPUT_DIR),
            bom: true,
        }
    }
}

/// Raw config as deserialized from TOML.
#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
struct RawConfig {
    deduction: Option<RawDeduction>,
    input: Option<RawInput>,
    output: Option<RawOutput>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
struct RawDeduction {
    capacity: Option<u64>,
    strategy_threshold: Option<f64>,
    min_line_exponent: Option<u32>,
    defer_starved: Option<bool>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
struct RawInput {
    include: Option<Vec<String>>,
    exclude: Option<Vec<String>>,
    extend_exclude: Option<Vec<String>>,
    datasets: Option<Vec<String>>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
struct RawOutput {
    dir: Option<String>,
    bom: Option<bool>,
}

impl Config {
    /// Load configuration for the given directory.
    ///
    /// Search order:
    /// 1. cachemap.toml in directory
    /// 2. Walk up to find cachemap.toml in a parent
    /// 3. Default config if nothing found
    pub fn load(directory: &Path) -> Self {
        let mut current = Some(directory);
        while let Some(dir) = current {
            let candidate = dir.join(CONFIG_FILE_NAME);
            if candidate.exists() {
                if let Some(config) = Self::load_file(&candidate) {
                    return config;
                }
            }
            current = dir.parent();
        }

        Self::default()
    }

    /// Load a specific config file. Unreadable or invalid files yield `None`.
    pub fn load_file(path: &Path) -> Option<Self> {
        let content = match std::fs::read_to_string(path) {
            Ok(c) => c,
            Err(e) => {
                warn!("cannot read {}: {}", path.display(), e);
                return None;
            }
        };
        match Self::parse(&content) {
            Ok(mut config) => {
                config.source = Some(path.to_path_buf());
                Some(config)
            }
            Err(e) => {
                warn!("ignoring invalid {}: {}", path.display(), e);
                None
            }
        }
    }

    /// Parse config TOML text.
    pub fn parse(content: &str) -> Result<Self, toml::de::Error> {
        let raw: RawConfig = toml::from_str(content)?;
        Ok(Self::from_raw(raw))
    }

    fn from_raw(raw: RawConfig) -> Self {
        let defaults = Self::default();
        let deduction = raw.deduction.unwrap_or_default();
        let input = raw.input.unwrap_or_default();
        let output = raw.output.unwrap_or_default();

        Self {
            source: None,
            deduction: DeductionConfig {
                capacity: deduction.capacity.unwrap_or(defaults.deduction.capacity),
                strategy_threshold: deduction
                    .strategy_threshold
                    .unwrap_or(defaults.deduction.strategy_threshold),
                min_line_exponent: deduction
                    .min_line_exponent
                    .unwrap_or(defaults.deduction.min_line_exponent),
                defer_starved: deduction.defer_starved.unwrap_or(defaults.deduction.defer_starved),
            },
            include: input.include.unwrap_or_default(),
            exclude: input.exclude.unwrap_or_default(),
            extend_exclude: input.extend_exclude.unwrap_or_default(),
            datasets: input.datasets.unwrap_or(defaults.datasets),
            output_dir: output.dir.map(PathBuf::from).unwrap_or(defaults.output_dir),
            bom: output.bom.unwrap_or(defaults.bom),
        }
    }

    /// Exclude globs in force: a custom `exclude` list replaces the defaults,
    /// otherwise the defaults plus the output directory plus `extend-exclude`.
    pub fn effective_excludes(&self) -> Vec<String> {
        if !self.exclude.is_empty() {
            return self.exclude.clone();
        }

        let out = self.output_dir.to_string_lossy();
        let out_glob = format!("{}/**", out.trim_end_matches('/'));

        DEFAULT_EXCLUDES
            .iter()
            .map(|s| s.to_string())
            .chain((out != DEFAULT_OUTPUT_DIR).then_some(out_glob))
            .chain(self.extend_exclude.iter().cloned())
            .collect()
    }

    /// A profile path relative to the scanned directory; an empty include
    /// list admits every CSV.
    pub fn matches_include(&self, path: &Path) -> bool {
        self.include.is_empty() || any_glob(&self.include, path)
    }

    pub fn matches_exclude(&self, path: &Path) -> bool {
        any_glob(&self.effective_excludes(), path)
    }

    /// Whether discovery should pick up this profile.
    pub fn should_include(&self, path: &Path) -> bool {
        self.matches_include(path) && !self.matches_exclude(path)
    }

    /// Multi-line summary for `--verbose`.
    pub fn display_summary(&self) -> String {
        let source = match &self.source {
            Some(path) => path.display().to_string(),
            None => "(defaults)".to_string(),
        };
        let d = &self.deduction;

        let mut lines = vec![
            format!("Config: {}", source),
            format!(
                "Deduction: capacity {} B, threshold {}, min line 2^{}, defer starved {}",
                d.capacity, d.strategy_threshold, d.min_line_exponent, d.defer_starved
            ),
            format!("Datasets: {}", self.datasets.join(" ")),
            format!(
                "Output: {}{}",
                self.output_dir.display(),
                if self.bom { " (BOM)" } else { "" }
            ),
        ];
        if !self.include.is_empty() {
            lines.push(format!("Include: {}", self.include.join(", ")));
        }
        lines.push(format!("Exclude: {}", self.effective_excludes().join(", ")));

        lines.join("\n")
    }
}

fn any_glob(patterns: &[String], path: &Path) -> bool {
    let path = path.to_string_lossy();
    patterns.iter().any(|p| glob_match::glob_match(p, &path))
}
