//! Strategy deduction - from access statistics to caching decisions.
//!
//! The engine combines:
//! - Feature extraction (locality, density, partition factor)
//! - Proportional shared-memory apportioning across pending variables
//! - Tag classification against the apportioned size
//! - Structural parameter selection once tags are final
//! - A bounded fixpoint loop that re-apportions freed budget

mod allocator;
mod classifier;
mod deducer;
mod features;
mod parameters;

pub use allocator::allocate;
pub use classifier::StrategyClassifier;
pub use deducer::{deduce_operator, Deducer};
pub use features::{access_density, spatial_locality};
pub use parameters::ParameterDeterminer;
