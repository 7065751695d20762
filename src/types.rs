//! Core types for cachemap - the shared-memory strategy deducer.
//!
//! Inputs arrive as plain records (`OperatorInfo` → `FunctionInfo` →
//! `VariableInfo`) produced by the CSV reader. The engine turns each variable
//! into an `AccessFeatureVector` and stamps a `StrategyConfig` on it.
//! Key design decisions:
//! - Strategy tags are a closed enum, mapped exhaustively to their external names
//! - Tunable constants live in `DeductionConfig`, never as literals in the engine
//! - Everything serializes with serde so any sink can emit it verbatim

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Default shared-memory capacity in bytes (60 KiB).
pub const DEFAULT_CAPACITY: u64 = 60 * 1024;

/// Default locality threshold separating SINGLE from DIRECT.
pub const DEFAULT_STRATEGY_THRESHOLD: f64 = 0.14;

/// Default minimum line exponent for DIRECT (2^4 = 16 byte lines).
pub const DEFAULT_MIN_LINE_EXPONENT: u32 = 4;

/// One stride bucket of a variable's access histogram.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AccessPattern {
    /// Distance between consecutive accesses, in elements
    pub stride: i32,
    /// Share of accesses with this stride, as a fraction in [0, 1]
    pub proportion: f64,
}

impl AccessPattern {
    pub fn new(stride: i32, proportion: f64) -> Self {
        Self { stride, proportion }
    }

    /// Render as `stride(pct%)` with the given number of decimals.
    pub fn render(&self, decimals: usize) -> String {
        format!("{}({:.*}%)", self.stride, decimals, self.proportion * 100.0)
    }
}

/// Profiled statistics for one kernel variable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VariableInfo {
    pub name: String,
    /// Working-set size in bytes
    pub size: u64,
    /// Number of accesses observed
    pub access: u64,
    pub patterns: Vec<AccessPattern>,
}

impl VariableInfo {
    pub fn new(name: impl Into<String>, size: u64, access: u64, patterns: Vec<AccessPattern>) -> Self {
        Self {
            name: name.into(),
            size,
            access,
            patterns,
        }
    }
}

/// A kernel function and the variables it touches. One deduction run each.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionInfo {
    pub name: String,
    pub variables: Vec<VariableInfo>,
}

impl FunctionInfo {
    pub fn new(name: impl Into<String>, variables: Vec<VariableInfo>) -> Self {
        Self {
            name: name.into(),
            variables,
        }
    }
}

/// All functions profiled for one operator, usually one CSV file.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct OperatorInfo {
    pub name: String,
    /// Dataset size label (MINI, SMALL, ...) when the file name carries one
    pub dataset: Option<String>,
    /// Ordered by function name
    pub functions: Vec<FunctionInfo>,
}

impl OperatorInfo {
    pub fn variable_count(&self) -> usize {
        self.functions.iter().map(|f| f.variables.len()).sum()
    }
}

/// Caching strategy assigned to a variable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AccessStrategy {
    /// Stage the whole variable in shared memory
    #[serde(rename = "CACHE_BULK")]
    Bulk,
    /// One fully-associative partition sized to the allocation
    #[serde(rename = "CACHE_SINGLE")]
    Single,
    /// Direct-mapped partition indexed by stride
    #[serde(rename = "CACHE_DIRECT")]
    Direct,
    /// Not worth caching
    #[serde(rename = "CACHE_UNSUITABLE")]
    Unsuitable,
}

impl AccessStrategy {
    pub const ALL: [AccessStrategy; 4] = [
        AccessStrategy::Bulk,
        AccessStrategy::Single,
        AccessStrategy::Direct,
        AccessStrategy::Unsuitable,
    ];

    /// External name, preserved verbatim by every sink.
    pub fn name(self) -> &'static str {
        match self {
            AccessStrategy::Bulk => "CACHE_BULK",
            AccessStrategy::Single => "CACHE_SINGLE",
            AccessStrategy::Direct => "CACHE_DIRECT",
            AccessStrategy::Unsuitable => "CACHE_UNSUITABLE",
        }
    }

    /// BULK and UNSUITABLE leave the pending set as soon as they are assigned.
    pub fn is_terminal(self) -> bool {
        matches!(self, AccessStrategy::Bulk | AccessStrategy::Unsuitable)
    }
}

impl fmt::Display for AccessStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for AccessStrategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        AccessStrategy::ALL
            .into_iter()
            .find(|strategy| strategy.name() == s)
            .ok_or_else(|| format!("unknown access strategy '{}'", s))
    }
}

/// Strategy tag plus its structural parameters.
///
/// `set` and `line` are power-of-two exponents, except for BULK where `line`
/// is the raw byte count of the staged variable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StrategyConfig {
    pub strategy: AccessStrategy,
    pub set: u32,
    pub line: u64,
}

impl StrategyConfig {
    pub fn new(strategy: AccessStrategy, set: u32, line: u64) -> Self {
        Self { strategy, set, line }
    }

    pub fn unsuitable() -> Self {
        Self::new(AccessStrategy::Unsuitable, 0, 0)
    }

    pub fn bulk(size: u64) -> Self {
        Self::new(AccessStrategy::Bulk, 0, size)
    }

    /// Shared-memory bytes implied by this configuration.
    pub fn space_usage(&self) -> u64 {
        match self.strategy {
            AccessStrategy::Unsuitable => 0,
            AccessStrategy::Bulk => self.line,
            AccessStrategy::Single | AccessStrategy::Direct => {
                let exponent = u64::from(self.set) + self.line;
                1u64.checked_shl(exponent as u32).unwrap_or(u64::MAX)
            }
        }
    }
}

impl Default for StrategyConfig {
    fn default() -> Self {
        Self::unsuitable()
    }
}

/// Derived access metrics for one variable, plus its (eventual) strategy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccessFeatureVector {
    pub var_name: String,
    /// S: working-set size in bytes
    pub size: u64,
    /// N: access count
    pub access: u64,
    pub patterns: Vec<AccessPattern>,
    /// L: spatial locality, Σ p·e^(−stride)
    pub locality: f64,
    /// D: accesses per byte
    pub density: f64,
    /// F: L × D, drives budget apportioning
    pub partition_factor: f64,
    /// C: bytes apportioned in the last allocation round
    pub allocated: u64,
    pub strategy: StrategyConfig,
}

/// Tunable constants of the deduction engine.
#[derive(Debug, Clone, PartialEq)]
pub struct DeductionConfig {
    /// Total shared-memory bytes available to one function
    pub capacity: u64,
    /// Locality above which a partial allocation becomes SINGLE (strict >)
    pub strategy_threshold: f64,
    /// Lower bound for the DIRECT line exponent
    pub min_line_exponent: u32,
    /// Keep zero-allocation vectors pending when the same round admitted a
    /// BULK, so they compete again for the freed share next round
    pub defer_starved: bool,
}

impl Default for DeductionConfig {
    fn default() -> Self {
        Self {
            capacity: DEFAULT_CAPACITY,
            strategy_threshold: DEFAULT_STRATEGY_THRESHOLD,
            min_line_exponent: DEFAULT_MIN_LINE_EXPONENT,
            defer_starved: true,
        }
    }
}

/// A variable excluded from deduction because its record was unusable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RejectedVariable {
    pub name: String,
    pub reason: String,
}

/// Result of deducing strategies for one function.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Deduction {
    pub func_name: String,
    /// Decided vectors in decision order
    pub vectors: Vec<AccessFeatureVector>,
    /// Allocation rounds executed, including the final pass
    pub rounds: usize,
    /// Capacity left after all BULK admissions
    pub remaining_capacity: u64,
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub rejected: Vec<RejectedVariable>,
}

impl Deduction {
    pub fn get(&self, var_name: &str) -> Option<&AccessFeatureVector> {
        self.vectors.iter().find(|v| v.var_name == var_name)
    }

    /// Count of decided vectors per strategy, in `AccessStrategy::ALL` order.
    pub fn strategy_counts(&self) -> [usize; 4] {
        let mut counts = [0; 4];
        for v in &self.vectors {
            let idx = AccessStrategy::ALL
                .iter()
                .position(|s| *s == v.strategy.strategy)
                .unwrap_or(0);
            counts[idx] += 1;
        }
        counts
    }
}
