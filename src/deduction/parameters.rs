//! Structural parameters for a final strategy.
//!
//! - UNSUITABLE: (0, 0)
//! - BULK: (0, S), line is the raw byte count
//! - SINGLE: line = ⌊log2 C⌋, set = 0
//! - DIRECT: line = round(log2 maxStride) clamped to [min_line, ⌊log2 C⌋],
//!   set = ⌊log2 max(1, ⌊C / 2^line⌋)⌋
//!
//! The min_line floor wins over the ⌊log2 C⌋ ceiling, so a DIRECT partition
//! smaller than 2^min_line bytes still gets a 2^min_line byte line.

use crate::types::{AccessFeatureVector, AccessStrategy, StrategyConfig};

#[derive(Debug, Clone, Copy)]
pub struct ParameterDeterminer {
    min_line_exponent: u32,
}

impl ParameterDeterminer {
    pub fn new(min_line_exponent: u32) -> Self {
        Self { min_line_exponent }
    }

    pub fn determine(&self, v: &AccessFeatureVector) -> StrategyConfig {
        match v.strategy.strategy {
            AccessStrategy::Unsuitable => StrategyConfig::unsuitable(),
            AccessStrategy::Bulk => StrategyConfig::bulk(v.size),
            AccessStrategy::Single => {
                StrategyConfig::new(AccessStrategy::Single, 0, u64::from(floor_log2(v.allocated)))
            }
            AccessStrategy::Direct => {
                let (set, line) = self.direct_layout(v.allocated, v.max_stride());
                StrategyConfig::new(AccessStrategy::Direct, set, u64::from(line))
            }
        }
    }

    pub fn determine_all(&self, vectors: &mut [AccessFeatureVector]) {
        for v in vectors.iter_mut() {
            v.strategy = self.determine(v);
        }
    }

    /// (set, line) exponents for a direct-mapped partition of `allocated` bytes.
    fn direct_layout(&self, allocated: u64, max_stride: i32) -> (u32, u32) {
        let wanted = f64::from(max_stride.max(1)).log2().round() as u32;
        let line = wanted.min(floor_log2(allocated)).max(self.min_line_exponent);

        let lines = allocated.checked_shr(line).unwrap_or(0).max(1);
        (floor_log2(lines), line)
    }
}

/// ⌊log2 n⌋, with 0 for n == 0.
fn floor_log2(n: u64) -> u32 {
    n.checked_ilog2().unwrap_or(0)
}
