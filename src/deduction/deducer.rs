//! Fixpoint orchestration of allocation and classification for one function.
//!
//! The algorithm:
//! 1. Build feature vectors; reject zero-size variables (logged, excluded)
//! 2. Apportion the remaining capacity over the pending set
//! 3. Classify; BULK and UNSUITABLE leave the pending set, each BULK
//!    consuming its true size S from the capacity. A vector starved to zero
//!    by a round that admitted a BULK stays pending (`defer_starved`)
//! 4. Repeat while a round moved something and vectors are still pending
//! 5. If a round moves nothing, run one final pass and accept it as-is
//! 6. Fill in structural parameters for everything decided
//!
//! Freed budget flows to the survivors: once small hot variables are staged
//! whole, the next round re-splits what is left among the rest.
//!
//! The loop is capped at `variables + 1` rounds. Every productive round
//! removes at least one vector, so the cap is never the binding condition
//! for well-formed input.

use tracing::{debug, warn};

use super::allocator::allocate;
use super::classifier::StrategyClassifier;
use super::parameters::ParameterDeterminer;
use crate::types::{
    AccessFeatureVector, AccessStrategy, Deduction, DeductionConfig, FunctionInfo, OperatorInfo,
    RejectedVariable,
};

/// Deduces caching strategies for functions under a fixed configuration.
///
/// Holds no per-run state, so one deducer can serve any number of
/// functions, sequentially or from several threads.
#[derive(Debug, Clone)]
pub struct Deducer {
    config: DeductionConfig,
    classifier: StrategyClassifier,
    parameters: ParameterDeterminer,
}

impl Deducer {
    pub fn new(config: DeductionConfig) -> Self {
        let classifier = StrategyClassifier::new(config.strategy_threshold);
        let parameters = ParameterDeterminer::new(config.min_line_exponent);
        Self {
            config,
            classifier,
            parameters,
        }
    }

    /// Run the full deduction for one function.
    pub fn deduce(&self, func: &FunctionInfo) -> Deduction {
        let mut pending = Vec::with_capacity(func.variables.len());
        let mut rejected = Vec::new();

        for var in &func.variables {
            match AccessFeatureVector::from_variable(var) {
                Ok(v) => pending.push(v),
                Err(e) => {
                    warn!(function = %func.name, "skipping variable: {}", e);
                    rejected.push(RejectedVariable {
                        name: var.name.clone(),
                        reason: e.to_string(),
                    });
                }
            }
        }

        let max_rounds = pending.len() + 1;
        let mut capacity = self.config.capacity;
        let mut decided = Vec::with_capacity(pending.len());
        let mut rounds = 0;
        let mut changed = true;

        while changed && !pending.is_empty() && rounds < max_rounds {
            rounds += 1;
            self.run_round(&func.name, &mut pending, capacity);

            let defer = self.config.defer_starved
                && pending.iter().any(|v| v.strategy.strategy == AccessStrategy::Bulk);
            let (settled, open): (Vec<_>, Vec<_>) = pending
                .into_iter()
                .partition(|v| settles(v, defer));

            changed = !settled.is_empty();
            for v in settled {
                capacity = admit(capacity, &v);
                decided.push(v);
            }
            pending = open;

            debug!(
                function = %func.name,
                round = rounds,
                decided = decided.len(),
                pending = pending.len(),
                capacity,
                "allocation round finished"
            );
        }

        // Whatever is left sits in SINGLE/DIRECT territory; settle it in one pass.
        if !pending.is_empty() {
            rounds += 1;
            self.run_round(&func.name, &mut pending, capacity);
            for v in pending {
                capacity = admit(capacity, &v);
                decided.push(v);
            }
        }

        self.parameters.determine_all(&mut decided);

        Deduction {
            func_name: func.name.clone(),
            vectors: decided,
            rounds,
            remaining_capacity: capacity,
            rejected,
        }
    }

    /// One allocate + classify pass over the pending set.
    ///
    /// A set whose partition factors sum to zero has nothing to weigh the
    /// split by; every vector in it gets nothing and ends up UNSUITABLE.
    fn run_round(&self, func_name: &str, pending: &mut [AccessFeatureVector], capacity: u64) {
        if let Err(e) = allocate(pending, capacity) {
            debug!(function = %func_name, "{}; forcing pending set to UNSUITABLE", e);
            for v in pending.iter_mut() {
                v.allocated = 0;
            }
        }
        self.classifier.classify_all(pending);
    }
}

impl Default for Deducer {
    fn default() -> Self {
        Self::new(DeductionConfig::default())
    }
}

/// Whether a classified vector leaves the pending set this round.
///
/// With `defer`, a zero allocation only means the vector lost out to this
/// round's BULK admissions, so it stays pending and competes again.
fn settles(v: &AccessFeatureVector, defer: bool) -> bool {
    let strategy = v.strategy.strategy;
    strategy.is_terminal() && !(defer && strategy == AccessStrategy::Unsuitable)
}

/// Charge a BULK admission against the capacity.
fn admit(capacity: u64, v: &AccessFeatureVector) -> u64 {
    if v.strategy.strategy == AccessStrategy::Bulk {
        capacity.saturating_sub(v.size)
    } else {
        capacity
    }
}

/// Deduce every function of an operator, in the operator's function order.
pub fn deduce_operator(deducer: &Deducer, op: &OperatorInfo) -> Vec<Deduction> {
    op.functions.iter().map(|f| deducer.deduce(f)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{AccessPattern, StrategyConfig, VariableInfo};

    fn var(name: &str, size: u64, access: u64, patterns: &[(i32, f64)]) -> VariableInfo {
        VariableInfo::new(
            name,
            size,
            access,
            patterns.iter().map(|&(s, p)| AccessPattern::new(s, p)).collect(),
        )
    }

    #[test]
    fn test_end_to_end_bulk_then_direct() {
        let func = FunctionInfo::new(
            "kernel",
            vec![
                var("A", 100, 1000, &[(0, 1.0)]),
                var("B", 1_000_000, 500, &[(4, 1.0)]),
            ],
        );
        let result = Deducer::default().deduce(&func);

        assert_eq!(result.func_name, "kernel");
        assert_eq!(result.vectors.len(), 2);

        let a = result.get("A").unwrap();
        assert_eq!(a.locality, 1.0);
        assert_eq!(a.density, 10.0);
        assert_eq!(a.partition_factor, 10.0);
        assert!(a.allocated >= 100);
        assert_eq!(a.strategy, StrategyConfig::new(AccessStrategy::Bulk, 0, 100));

        let b = result.get("B").unwrap();
        assert!((b.locality - (-4.0f64).exp()).abs() < 1e-12);
        assert_eq!(b.density, 0.0005);
        assert_eq!(b.allocated, 61_440 - 100);
        assert_eq!(b.strategy.strategy, AccessStrategy::Direct);
        assert_eq!(b.strategy.line, 4);
        assert_eq!(b.strategy.set, 11);

        assert_eq!(result.remaining_capacity, 61_440 - 100);
        // Round 1 admits A, round 2 moves nothing, then the final pass
        assert_eq!(result.rounds, 3);
    }

    #[test]
    fn test_without_deferral_starved_vector_is_final() {
        let deducer = Deducer::new(DeductionConfig {
            defer_starved: false,
            ..Default::default()
        });
        let func = FunctionInfo::new(
            "kernel",
            vec![
                var("A", 100, 1000, &[(0, 1.0)]),
                var("B", 1_000_000, 500, &[(4, 1.0)]),
            ],
        );
        let result = deducer.deduce(&func);

        assert_eq!(result.get("A").unwrap().strategy.strategy, AccessStrategy::Bulk);
        let b = result.get("B").unwrap();
        assert_eq!(b.allocated, 0);
        assert_eq!(b.strategy, StrategyConfig::unsuitable());
        assert_eq!(result.rounds, 1);
    }

    #[test]
    fn test_everything_fits() {
        let func = FunctionInfo::new(
            "small",
            vec![var("a", 64, 10, &[(0, 1.0)]), var("b", 128, 10, &[(1, 1.0)])],
        );
        let result = Deducer::default().deduce(&func);

        for v in &result.vectors {
            assert_eq!(v.strategy.strategy, AccessStrategy::Bulk);
            assert_eq!(v.strategy.line, v.size);
            assert_eq!(v.strategy.set, 0);
        }
        assert_eq!(result.remaining_capacity, 61_440 - 192);
        assert_eq!(result.rounds, 1);
    }

    #[test]
    fn test_freed_budget_promotes_second_round() {
        // a is hot and small; b gets < 4000 in round 1 but all the rest in round 2
        let func = FunctionInfo::new(
            "promote",
            vec![
                var("a", 1000, 100_000, &[(0, 1.0)]),
                var("b", 40_000, 40_000, &[(0, 1.0)]),
            ],
        );
        let result = Deducer::default().deduce(&func);

        let b = result.get("b").unwrap();
        assert_eq!(b.strategy.strategy, AccessStrategy::Bulk);
        assert_eq!(result.remaining_capacity, 61_440 - 41_000);
        assert_eq!(result.vectors[0].var_name, "a");
        assert_eq!(result.vectors[1].var_name, "b");
    }

    #[test]
    fn test_zero_locality_is_unsuitable() {
        // No patterns → L = 0 → F = 0 for the whole set
        let func = FunctionInfo::new("cold", vec![var("x", 100, 100, &[]), var("y", 50, 10, &[])]);
        let result = Deducer::default().deduce(&func);

        assert_eq!(result.vectors.len(), 2);
        for v in &result.vectors {
            assert_eq!(v.allocated, 0);
            assert_eq!(v.strategy, StrategyConfig::unsuitable());
        }
    }

    #[test]
    fn test_zero_factor_member_is_unsuitable_alongside_others() {
        let func = FunctionInfo::new(
            "mixed",
            vec![var("hot", 100, 100, &[(0, 1.0)]), var("cold", 100, 100, &[])],
        );
        let result = Deducer::default().deduce(&func);

        assert_eq!(result.get("hot").unwrap().strategy.strategy, AccessStrategy::Bulk);
        assert_eq!(result.get("cold").unwrap().strategy.strategy, AccessStrategy::Unsuitable);
    }

    #[test]
    fn test_zero_size_variable_is_rejected_locally() {
        let func = FunctionInfo::new(
            "partial",
            vec![var("bad", 0, 10, &[(0, 1.0)]), var("good", 10, 10, &[(0, 1.0)])],
        );
        let result = Deducer::default().deduce(&func);

        assert_eq!(result.vectors.len(), 1);
        assert_eq!(result.vectors[0].var_name, "good");
        assert_eq!(result.rejected.len(), 1);
        assert_eq!(result.rejected[0].name, "bad");
    }

    #[test]
    fn test_non_finite_variable_is_rejected_locally() {
        let func = FunctionInfo::new(
            "partial",
            vec![var("good", 100, 1000, &[(0, 1.0)]), var("wild", 100, 1000, &[(-1000, 1.0)])],
        );
        let result = Deducer::default().deduce(&func);

        assert_eq!(result.vectors.len(), 1);
        let good = result.get("good").unwrap();
        assert_eq!(good.strategy.strategy, AccessStrategy::Bulk);
        assert_eq!(result.rejected.len(), 1);
        assert_eq!(result.rejected[0].name, "wild");
    }

    #[test]
    fn test_negative_proportion_cannot_overcommit_budget() {
        let func = FunctionInfo::new(
            "overcommit",
            vec![
                var("a", 40_000, 2, &[(0, 1.0)]),
                var("b", 40_000, 2, &[(0, 1.0)]),
                var("c", 40_000, 3, &[(0, -1.0)]),
            ],
        );
        let result = Deducer::default().deduce(&func);

        let bulk: u64 = result
            .vectors
            .iter()
            .filter(|v| v.strategy.strategy == AccessStrategy::Bulk)
            .map(|v| v.size)
            .sum();
        assert!(bulk <= 61_440);
        assert_eq!(result.rejected.len(), 1);
        assert_eq!(result.rejected[0].name, "c");
    }

    #[test]
    fn test_empty_function() {
        let result = Deducer::default().deduce(&FunctionInfo::new("empty", vec![]));
        assert!(result.vectors.is_empty());
        assert_eq!(result.rounds, 0);
        assert_eq!(result.remaining_capacity, 61_440);
    }

    #[test]
    fn test_single_when_local_but_too_big() {
        let func = FunctionInfo::new("big", vec![var("big", 1 << 20, 1 << 20, &[(0, 0.9), (1, 0.1)])]);
        let result = Deducer::default().deduce(&func);

        let v = &result.vectors[0];
        assert_eq!(v.allocated, 61_440);
        assert_eq!(v.strategy.strategy, AccessStrategy::Single);
        assert_eq!(v.strategy.line, 15);
    }

    #[test]
    fn test_zero_capacity_makes_everything_unsuitable() {
        let deducer = Deducer::new(DeductionConfig {
            capacity: 0,
            ..Default::default()
        });
        let func = FunctionInfo::new("none", vec![var("a", 1, 100, &[(0, 1.0)])]);
        let result = deducer.deduce(&func);
        assert_eq!(result.vectors[0].strategy.strategy, AccessStrategy::Unsuitable);
    }

    #[test]
    fn test_properties_hold_for_mixed_function() {
        let func = FunctionInfo::new(
            "mixed",
            vec![
                var("a", 256, 4096, &[(0, 0.8), (1, 0.2)]),
                var("b", 500_000, 20_000, &[(1, 1.0)]),
                var("c", 2_000_000, 1000, &[(32, 1.0)]),
                var("d", 3000, 300, &[(2, 0.5), (8, 0.5)]),
                var("e", 10, 0, &[(0, 1.0)]),
            ],
        );
        let result = Deducer::default().deduce(&func);
        assert_eq!(result.vectors.len(), 5);

        for v in &result.vectors {
            if v.allocated >= v.size {
                assert_eq!(v.strategy, StrategyConfig::bulk(v.size));
            }
            if v.allocated == 0 {
                assert_eq!(v.strategy, StrategyConfig::unsuitable());
            }
            assert!(v.allocated <= 61_440);
        }
    }

    #[test]
    fn test_deduction_is_idempotent() {
        let func = FunctionInfo::new(
            "repeat",
            vec![
                var("a", 4096, 9000, &[(0, 0.6), (2, 0.4)]),
                var("b", 90_000, 1200, &[(16, 1.0)]),
                var("c", 12, 12, &[(1, 1.0)]),
            ],
        );
        let deducer = Deducer::default();
        assert_eq!(deducer.deduce(&func), deducer.deduce(&func));
    }

    #[test]
    fn test_deduce_operator_keeps_function_order() {
        let op = OperatorInfo {
            name: "op".into(),
            dataset: None,
            functions: vec![
                FunctionInfo::new("f1", vec![var("a", 1, 1, &[(0, 1.0)])]),
                FunctionInfo::new("f2", vec![var("b", 1, 1, &[(0, 1.0)])]),
            ],
        };
        let results = deduce_operator(&Deducer::default(), &op);
        let names: Vec<_> = results.iter().map(|d| d.func_name.as_str()).collect();
        assert_eq!(names, vec!["f1", "f2"]);
    }
}
