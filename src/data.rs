//! Trial state: one generated input in flight.
//!
//! A [`TestCase`] records every choice it hands out, drawing fresh values
//! from a pluggable [`ChoiceSource`] and optionally replaying a prefix of
//! choices from an earlier trial first. The
//! shrinker and the target-guided mutator both work by feeding an edited
//! choice sequence back in as the prefix of a new trial.

use crate::choice::{ChoiceNode, IntegerConstraints};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use thiserror::Error;

/// How a trial ended up.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Status {
    /// Ran to completion without violating anything.
    #[default]
    Valid,
    /// Failed a discard condition; does not count toward the trial budget.
    Discarded,
    /// Violated an invariant. Candidate for shrinking.
    Interesting,
    /// Drew more choices than allowed, or a replayed choice no longer fit
    /// the draw requested at its position.
    Overrun,
}

/// Errors surfaced from inside a property body.
///
/// Property bodies are `Fn(&mut TestCase) -> Result<(), TrialError>` and
/// propagate draw failures with `?`.
#[derive(Debug, Error)]
pub enum TrialError {
    /// A precondition failed; the trial is dropped without counting as a
    /// success or a failure.
    #[error("trial discarded by precondition")]
    Discard,
    /// The trial could not draw as requested: choice budget exceeded,
    /// replayed choice misaligned, or an empty draw range.
    #[error("trial overran its choice budget")]
    Overrun,
    /// An invariant over (input, output) did not hold.
    #[error("{0}")]
    Failed(String),
}

/// Invariant assertion for property bodies. The message closure only runs
/// on failure, so passing trials pay nothing for it.
pub fn ensure(condition: bool, message: impl FnOnce() -> String) -> Result<(), TrialError> {
    if condition {
        Ok(())
    } else {
        Err(TrialError::Failed(message()))
    }
}

/// Source of fresh choices once a trial's replay prefix is spent.
///
/// Implementations own whatever internal state generation needs (RNG,
/// search history); trials and the functions under test only ever see the
/// drawn values. `None` means the source cannot produce a value and the
/// trial overruns.
pub trait ChoiceSource {
    fn next_integer(&mut self, constraints: &IntegerConstraints) -> Option<i64>;
}

/// Uniform random source backed by a seeded ChaCha8 stream.
pub struct RandomSource {
    rng: ChaCha8Rng,
}

impl RandomSource {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(seed),
        }
    }
}

impl ChoiceSource for RandomSource {
    fn next_integer(&mut self, constraints: &IntegerConstraints) -> Option<i64> {
        Some(self.rng.gen_range(constraints.min_value..=constraints.max_value))
    }
}

/// Source that never produces fresh values. Shrink candidates use it so a
/// candidate is judged on its replayed choices alone.
struct ExhaustedSource;

impl ChoiceSource for ExhaustedSource {
    fn next_integer(&mut self, _constraints: &IntegerConstraints) -> Option<i64> {
        None
    }
}

/// State for a single trial.
pub struct TestCase {
    source: Box<dyn ChoiceSource>,
    prefix: Vec<ChoiceNode>,
    prefix_index: usize,
    nodes: Vec<ChoiceNode>,
    max_len: usize,
    max_choices: usize,
    pub status: Status,
    /// Best guidance observation reported by this trial, if any.
    pub target_score: Option<f64>,
}

impl TestCase {
    /// Fresh trial generating every choice from a seeded random source.
    pub fn new(seed: u64, max_len: usize, max_choices: usize) -> Self {
        Self::with_prefix(Vec::new(), seed, max_len, max_choices)
    }

    /// Trial that replays `prefix` first, then falls back to fresh
    /// generation once the prefix is exhausted.
    pub fn with_prefix(prefix: Vec<ChoiceNode>, seed: u64, max_len: usize, max_choices: usize) -> Self {
        Self::with_source(prefix, Box::new(RandomSource::new(seed)), max_len, max_choices)
    }

    /// Replay-only trial for evaluating a shrink candidate. Draws beyond
    /// the recorded sequence overrun rather than generating new values.
    pub fn for_choices(choices: Vec<ChoiceNode>, max_len: usize, max_choices: usize) -> Self {
        Self::with_source(choices, Box::new(ExhaustedSource), max_len, max_choices)
    }

    /// Trial with a caller-supplied generation backend.
    pub fn with_source(
        prefix: Vec<ChoiceNode>,
        source: Box<dyn ChoiceSource>,
        max_len: usize,
        max_choices: usize,
    ) -> Self {
        Self {
            source,
            prefix,
            prefix_index: 0,
            nodes: Vec::new(),
            max_len,
            max_choices,
            status: Status::Valid,
            target_score: None,
        }
    }

    fn overrun(&mut self) -> TrialError {
        self.status = Status::Overrun;
        TrialError::Overrun
    }

    /// Draws an integer uniformly from `min..=max` and records it.
    pub fn draw_integer(&mut self, min: i64, max: i64) -> Result<i64, TrialError> {
        if min > max || self.nodes.len() >= self.max_choices {
            return Err(self.overrun());
        }
        let constraints = IntegerConstraints::new(min, max);
        let value = if self.prefix_index < self.prefix.len() {
            let replayed = self.prefix[self.prefix_index].value;
            self.prefix_index += 1;
            if !constraints.permits(replayed) {
                // Misaligned replay: the edited sequence no longer lines up
                // with the draws the property makes.
                return Err(self.overrun());
            }
            replayed
        } else {
            match self.source.next_integer(&constraints) {
                Some(value) => value,
                None => return Err(self.overrun()),
            }
        };
        self.nodes.push(ChoiceNode { value, constraints });
        Ok(value)
    }

    /// Draws a sequence: a length in `0..=max_len`, then that many elements
    /// from `min..=max`. The length bound comes from the check
    /// configuration.
    pub fn draw_integer_vec(&mut self, min: i64, max: i64) -> Result<Vec<i64>, TrialError> {
        let len = self.draw_integer(0, self.max_len as i64)? as usize;
        let mut values = Vec::with_capacity(len);
        for _ in 0..len {
            values.push(self.draw_integer(min, max)?);
        }
        Ok(values)
    }

    /// Discard condition. A false `condition` drops the trial: it counts
    /// neither toward the budget nor as a success or failure.
    pub fn assume(&mut self, condition: bool) -> Result<(), TrialError> {
        if condition {
            Ok(())
        } else {
            self.status = Status::Discarded;
            Err(TrialError::Discard)
        }
    }

    /// Reports a guidance observation. The engine biases later generation
    /// toward trials that increase this score; it never affects pass/fail.
    /// Repeated calls keep the maximum.
    pub fn target(&mut self, score: f64) {
        self.target_score = Some(match self.target_score {
            Some(best) if best > score => best,
            _ => score,
        });
    }

    /// Choices recorded so far.
    pub fn nodes(&self) -> &[ChoiceNode] {
        &self.nodes
    }

    /// Consumes the trial, yielding its recorded choice sequence.
    pub fn into_nodes(self) -> Vec<ChoiceNode> {
        self.nodes
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn case(seed: u64) -> TestCase {
        TestCase::new(seed, 64, 4096)
    }

    #[test]
    fn same_seed_draws_the_same_values() {
        let mut a = case(7);
        let mut b = case(7);
        for _ in 0..20 {
            assert_eq!(a.draw_integer(0, 1000).unwrap(), b.draw_integer(0, 1000).unwrap());
        }
    }

    #[test]
    fn draws_are_recorded_in_order() {
        let mut case = case(1);
        let x = case.draw_integer(-10, 10).unwrap();
        let y = case.draw_integer(0, 5).unwrap();
        let values: Vec<i64> = case.nodes().iter().map(|n| n.value).collect();
        assert_eq!(values, vec![x, y]);
    }

    #[test]
    fn empty_range_overruns() {
        let mut case = case(1);
        assert!(matches!(case.draw_integer(5, 4), Err(TrialError::Overrun)));
        assert_eq!(case.status, Status::Overrun);
    }

    #[test]
    fn choice_budget_overruns() {
        let mut case = TestCase::new(1, 64, 3);
        for _ in 0..3 {
            case.draw_integer(0, 10).unwrap();
        }
        assert!(matches!(case.draw_integer(0, 10), Err(TrialError::Overrun)));
    }

    #[test]
    fn failed_assumption_discards_the_trial() {
        let mut case = case(1);
        assert!(case.assume(true).is_ok());
        assert!(matches!(case.assume(false), Err(TrialError::Discard)));
        assert_eq!(case.status, Status::Discarded);
    }

    #[test]
    fn prefix_is_replayed_before_fresh_generation() {
        let mut original = case(3);
        let first = original.draw_integer(0, 100).unwrap();
        let mut replay = TestCase::with_prefix(original.into_nodes(), 99, 64, 4096);
        assert_eq!(replay.draw_integer(0, 100).unwrap(), first);
        // Past the prefix, generation continues from the new seed.
        replay.draw_integer(0, 100).unwrap();
        assert_eq!(replay.nodes().len(), 2);
    }

    #[test]
    fn misaligned_replay_overruns() {
        let prefix = vec![ChoiceNode {
            value: 50,
            constraints: IntegerConstraints::new(0, 100),
        }];
        let mut replay = TestCase::with_prefix(prefix, 0, 64, 4096);
        // The replayed 50 does not fit a 0..=10 draw.
        assert!(matches!(replay.draw_integer(0, 10), Err(TrialError::Overrun)));
        assert_eq!(replay.status, Status::Overrun);
    }

    #[test]
    fn replay_only_trials_do_not_extend() {
        let mut replay = TestCase::for_choices(Vec::new(), 64, 4096);
        assert!(matches!(replay.draw_integer(0, 10), Err(TrialError::Overrun)));
    }

    #[test]
    fn vec_draws_respect_the_length_bound() {
        let mut case = TestCase::new(11, 10, 4096);
        for _ in 0..50 {
            let values = case.draw_integer_vec(1, 9).unwrap();
            assert!(values.len() <= 10);
            assert!(values.iter().all(|v| (1..=9).contains(v)));
        }
    }

    #[test]
    fn custom_sources_plug_into_trials() {
        struct MinimalSource;
        impl ChoiceSource for MinimalSource {
            fn next_integer(&mut self, constraints: &IntegerConstraints) -> Option<i64> {
                Some(constraints.min_value)
            }
        }
        let mut case = TestCase::with_source(Vec::new(), Box::new(MinimalSource), 64, 4096);
        assert_eq!(case.draw_integer(5, 9).unwrap(), 5);
        assert_eq!(case.draw_integer(-3, 3).unwrap(), -3);
    }

    #[test]
    fn target_keeps_the_maximum_score() {
        let mut case = case(1);
        case.target(3.0);
        case.target(1.0);
        case.target(5.0);
        assert_eq!(case.target_score, Some(5.0));
    }
}
