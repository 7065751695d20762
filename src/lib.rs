//! cachemap - shared-memory caching strategy deduction
//!
//! Reads offline access profiles of GPU kernels (per variable: size, access
//! count, stride histogram) and decides, for every variable of every kernel
//! function, how it should be staged in a fixed shared-memory budget.
//!
//! # Architecture
//!
//! ```text
//! Discovery → CSV Input → Feature Vectors → Allocation ⇄ Classification → Parameters → Sinks
//!     ↓           ↓             ↓                  ↓                          ↓           ↓
//!   ignore     OperatorInfo   L, D, F        bounded fixpoint            line / set   terminal
//!   + globs                                  over freed budget           exponents    csv, json
//! ```
//!
//! The core (`deduction`) is pure: no I/O, no global state, deterministic
//! for a given input and `DeductionConfig`. Everything that touches the
//! filesystem or the terminal sits in `input`, `discovery` and `rendering`.

pub mod config;
pub mod deduction;
pub mod discovery;
pub mod error;
pub mod input;
pub mod rendering;
pub mod types;

// Re-export core types
pub use types::{
    AccessFeatureVector, AccessPattern, AccessStrategy, Deduction, DeductionConfig, FunctionInfo,
    OperatorInfo, RejectedVariable, StrategyConfig, VariableInfo,
};

pub use config::Config;
pub use deduction::{deduce_operator, Deducer};
pub use error::{DeductionError, InputError};
pub use rendering::{ReportContext, ReportSink};
