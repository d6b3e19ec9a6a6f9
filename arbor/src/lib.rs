//! # Arbor - Property Testing on Shrink Trees
//!
//! Arbor is a property-based testing engine: describe how to generate random
//! values, state a property over them, and the engine runs many randomized
//! trials, shrinking any failure to a minimal counterexample while staying
//! fully reproducible (same seed, same run).
//!
//! Generation is built on a splittable random [`Source`]: every independent
//! sub-generation draws from its own stream, so shrinking one part of a value
//! never perturbs its siblings. Every generated value carries a lazy tree of
//! simpler candidates ([`Shrinkable`]), and a greedy search walks that tree
//! when a property fails.
//!
//! ## Quick Start
//!
//! ```rust
//! use arbor::{check_with_config, int_range, Config};
//!
//! let config = Config::default().with_seed(42);
//! let pairs = int_range(0i64, 100).zip(int_range(0i64, 100));
//! let result = check_with_config(&config, &pairs, |_case, (a, b)| a + b == b + a);
//! assert!(result.is_success());
//! ```

// Public modules
pub mod bits;
pub mod config;
pub mod container;
pub mod error;
pub mod gen;
#[cfg(feature = "persistence")]
pub mod persistence;
pub mod primitives;
pub mod recipe;
pub mod report;
pub mod rng;
pub mod runner;
pub mod sequence;
pub mod shrink;
pub mod shrinkable;

// Re-export the main public API
pub use bits::{BitStream, NOMINAL_SIZE};
pub use config::{Config, ConfigError};
pub use container::{
    btree_map_of, btree_set_of, hash_map_of, hash_set_of, shrink_elements, shrink_elements_keyed,
    vec_of, vec_of_len,
};
pub use error::{GenerationError, IntoVerdict, Verdict};
pub use gen::{Gen, MAX_FILTER_RETRIES, Size, tuple3, tuple4};
#[cfg(feature = "persistence")]
pub use persistence::{FailureSnapshot, ReproToken};
pub use primitives::{
    any_bool, any_int, ascii_alphanumeric, ascii_lowercase, ascii_printable, element_of,
    int_range, option_of, string_of,
};
pub use recipe::{Cursor, Recipe};
pub use report::{DefaultFormatter, OutputFormatter, VerboseFormatter, render_value};
pub use rng::{Source, avalanche, random_seed};
pub use runner::{
    Case, CaseResult, TestCase, TestResult, check, check_with_config, shrink_search,
};
pub use sequence::Sequence;
pub use shrinkable::Shrinkable;
