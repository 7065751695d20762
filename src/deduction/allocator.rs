//! Proportional shared-memory apportioning.
//!
//! Each round, the remaining capacity is split across the pending vectors in
//! proportion to their partition factor F:
//!
//! ```text
//! C(v) = floor(F(v) / ΣF · capacity)
//! ```
//!
//! ΣF is taken over exactly the slice passed in, with negative factors
//! weighing zero. Truncation means the sum of allocations can fall short of
//! `capacity` by less than one byte per vector, but never exceeds it.

use crate::error::DeductionError;
use crate::types::AccessFeatureVector;

/// Apportion `capacity` across `vectors`, writing each vector's `allocated`.
///
/// Returns the total number of bytes handed out. A set whose partition
/// factors sum to zero (or to something non-finite) cannot be apportioned;
/// it is reported as `DegenerateRound` and the vectors are left untouched.
pub fn allocate(vectors: &mut [AccessFeatureVector], capacity: u64) -> Result<u64, DeductionError> {
    let total_factor: f64 = vectors.iter().map(weight).sum();

    if !(total_factor.is_finite() && total_factor > 0.0) {
        return Err(DeductionError::DegenerateRound { pending: vectors.len() });
    }

    let capacity_f = capacity as f64;
    let mut handed_out = 0u64;

    for v in vectors.iter_mut() {
        let share = (weight(v) / total_factor * capacity_f).floor();
        // `as` saturates; the min guards the single-vector case against rounding up
        v.allocated = (share.max(0.0) as u64).min(capacity);
        handed_out += v.allocated;
    }

    Ok(handed_out)
}

/// Apportioning weight: F, with negative and NaN factors counting as nothing.
fn weight(v: &AccessFeatureVector) -> f64 {
    v.partition_factor.max(0.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{AccessPattern, VariableInfo};

    fn vector(name: &str, size: u64, access: u64, stride: i32) -> AccessFeatureVector {
        let var = VariableInfo::new(name, size, access, vec![AccessPattern::new(stride, 1.0)]);
        AccessFeatureVector::from_variable(&var).unwrap()
    }

    #[test]
    fn test_single_vector_gets_everything() {
        let mut vs = vec![vector("a", 100, 100, 0)];
        let total = allocate(&mut vs, 61440).unwrap();
        assert_eq!(vs[0].allocated, 61440);
        assert_eq!(total, 61440);
    }

    #[test]
    fn test_proportional_split() {
        // F = 1.0 and 3.0
        let mut vs = vec![vector("a", 10, 10, 0), vector("b", 10, 30, 0)];
        allocate(&mut vs, 1000).unwrap();
        assert_eq!(vs[0].allocated, 250);
        assert_eq!(vs[1].allocated, 750);
    }

    #[test]
    fn test_truncation_never_exceeds_capacity() {
        let mut vs: Vec<_> = (0..7)
            .map(|i| vector(&format!("v{}", i), 64, 64 + i * 13, (i % 3) as i32))
            .collect();
        let capacity = 1001;
        let total = allocate(&mut vs, capacity).unwrap();

        assert!(total <= capacity);
        assert!(capacity - total < vs.len() as u64);
        assert_eq!(total, vs.iter().map(|v| v.allocated).sum::<u64>());
    }

    #[test]
    fn test_zero_factor_round_is_degenerate() {
        let mut vs = vec![vector("a", 10, 0, 0), vector("b", 10, 0, 3)];
        vs[0].allocated = 7;
        let err = allocate(&mut vs, 1000).unwrap_err();
        assert_eq!(err, DeductionError::DegenerateRound { pending: 2 });
        assert_eq!(vs[0].allocated, 7);
    }

    #[test]
    fn test_empty_set_is_degenerate() {
        let mut vs: Vec<AccessFeatureVector> = Vec::new();
        assert!(allocate(&mut vs, 1000).is_err());
    }

    #[test]
    fn test_negative_factor_cannot_inflate_shares() {
        let mut vs = vec![vector("a", 40000, 2, 0), vector("b", 40000, 2, 0), vector("c", 40000, 3, 0)];
        vs[2].partition_factor = -3.0 / 40000.0;
        let capacity = 61440;
        let total = allocate(&mut vs, capacity).unwrap();

        assert!(total <= capacity);
        assert_eq!(vs[0].allocated, 30720);
        assert_eq!(vs[1].allocated, 30720);
        assert_eq!(vs[2].allocated, 0);
    }

    #[test]
    fn test_zero_capacity() {
        let mut vs = vec![vector("a", 10, 10, 0)];
        allocate(&mut vs, 0).unwrap();
        assert_eq!(vs[0].allocated, 0);
    }
}
