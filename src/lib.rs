//! A miniature conjecture-style property-based testing harness,
//! demonstrated on three toy functions.
//!
//! All randomness flows through integer choices recorded on a [`TestCase`].
//! [`check`] runs a property against many generated trials: trials failing
//! an [`TestCase::assume`] precondition are discarded without counting
//! toward the budget, guidance scores reported via [`TestCase::target`]
//! bias later generation toward higher-scoring inputs, and the choice
//! sequence of any failing trial is shrunk to a minimal reproduction
//! before being reported.
//!
//! The functions under test (`add`, `find_majority`,
//! `remove_triple_one_plus_strings`) live in [`functions`]; their property
//! checks are the integration tests of this crate.

pub mod choice;
pub mod data;
pub mod engine;
pub mod functions;
pub mod shrink;

pub use choice::{sort_key, ChoiceNode, IntegerConstraints};
pub use data::{ensure, ChoiceSource, RandomSource, Status, TestCase, TrialError};
pub use engine::{check, CheckConfig, CheckError, CheckStats, Verbosity};
pub use functions::{add, decimal_ones, find_majority, remove_triple_one_plus_strings};
