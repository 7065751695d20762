//! Feature extraction: raw variable statistics → derived access metrics.
//!
//! Three numbers summarize how worthwhile a variable is to cache:
//! - L (spatial locality): Σ pᵢ·e^(−strideᵢ), 1.0 for pure stride-0 access,
//!   decaying exponentially as the dominant stride grows
//! - D (density): accesses per byte of working set
//! - F (partition factor): L × D, the weight used to apportion shared memory

use crate::error::DeductionError;
use crate::types::{AccessFeatureVector, AccessPattern, StrategyConfig, VariableInfo};

/// Spatial locality of a stride histogram. Empty histograms have no locality.
pub fn spatial_locality(patterns: &[AccessPattern]) -> f64 {
    patterns
        .iter()
        .map(|p| p.proportion * (-f64::from(p.stride)).exp())
        .sum()
}

/// Accesses per byte. A zero-size variable is rejected rather than producing ∞/NaN.
pub fn access_density(name: &str, access: u64, size: u64) -> Result<f64, DeductionError> {
    if size == 0 {
        return Err(DeductionError::zero_size(name));
    }
    Ok(access as f64 / size as f64)
}

impl AccessFeatureVector {
    /// Build the feature vector for one variable.
    ///
    /// The strategy starts out UNSUITABLE with nothing allocated; the
    /// deducer overwrites both.
    pub fn from_variable(var: &VariableInfo) -> Result<Self, DeductionError> {
        let density = access_density(&var.name, var.access, var.size)?;
        let locality = spatial_locality(&var.patterns);
        let partition_factor = locality * density;

        // L and F feed the round's ΣF: finite and non-negative only
        for (metric, value) in [("locality", locality), ("partition factor", partition_factor)] {
            if !(value.is_finite() && value >= 0.0) {
                return Err(DeductionError::bad_metric(&var.name, metric, value));
            }
        }

        Ok(Self {
            var_name: var.name.clone(),
            size: var.size,
            access: var.access,
            patterns: var.patterns.clone(),
            locality,
            density,
            partition_factor,
            allocated: 0,
            strategy: StrategyConfig::default(),
        })
    }

    /// Largest stride in the histogram, never below 1.
    pub fn max_stride(&self) -> i32 {
        self.patterns.iter().map(|p| p.stride).fold(1, i32::max)
    }
}
