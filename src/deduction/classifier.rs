//! Strategy classification against the apportioned size.
//!
//! Rules, first match wins:
//!
//! ```text
//! C == 0            → UNSUITABLE (0, 0)
//! C >= S            → BULK       (0, S)
//! 0 < C < S, L > τ  → SINGLE
//! 0 < C < S, L <= τ → DIRECT
//! ```
//!
//! τ is the strategy threshold (0.14 by default). Strong locality favors a
//! single fully-associative partition; weak locality favors direct-mapped
//! indexing keyed by stride. SINGLE and DIRECT get their parameters later,
//! from `ParameterDeterminer`, once the allocation is final.

use crate::types::{AccessFeatureVector, AccessStrategy, StrategyConfig};

#[derive(Debug, Clone, Copy)]
pub struct StrategyClassifier {
    threshold: f64,
}

impl StrategyClassifier {
    pub fn new(threshold: f64) -> Self {
        Self { threshold }
    }

    /// Classify one vector from its current allocation.
    pub fn classify(&self, v: &AccessFeatureVector) -> StrategyConfig {
        if v.allocated == 0 {
            return StrategyConfig::unsuitable();
        }
        if v.allocated >= v.size {
            return StrategyConfig::bulk(v.size);
        }
        if v.locality > self.threshold {
            StrategyConfig::new(AccessStrategy::Single, 0, 0)
        } else {
            StrategyConfig::new(AccessStrategy::Direct, 0, 0)
        }
    }

    /// Classify every vector in place.
    pub fn classify_all(&self, vectors: &mut [AccessFeatureVector]) {
        for v in vectors.iter_mut() {
            v.strategy = self.classify(v);
        }
    }
}
