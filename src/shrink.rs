//! Choice-sequence shrinking.
//!
//! Greedy multi-pass minimization of a failing trial's recorded choices:
//! drop trailing choices, drop individual choices, then move each remaining
//! choice toward its shrink target. Candidates are replayed through a
//! replay-only [`TestCase`]; a candidate is accepted only if the property
//! still fails on it and its [`sort_key`] improves.

use crate::choice::{sort_key, ChoiceNode};
use crate::data::{Status, TestCase, TrialError};
use std::collections::HashSet;

/// Outcome of a shrink run: the minimal failing choices found, the failure
/// message they produce, and the number of property calls spent.
pub struct ShrinkResult {
    pub choices: Vec<ChoiceNode>,
    pub message: String,
    pub calls: u32,
}

pub struct Shrinker<'a, F> {
    property: &'a F,
    max_len: usize,
    max_choices: usize,
    current: Vec<ChoiceNode>,
    message: String,
    /// Candidate value sequences already replayed.
    seen: HashSet<Vec<i64>>,
    calls: u32,
    max_calls: u32,
}

impl<'a, F> Shrinker<'a, F>
where
    F: Fn(&mut TestCase) -> Result<(), TrialError>,
{
    /// `initial` must be the recorded choices of a failing trial, with
    /// `message` the failure it produced.
    pub fn new(
        property: &'a F,
        initial: Vec<ChoiceNode>,
        message: String,
        max_len: usize,
        max_choices: usize,
        max_calls: u32,
    ) -> Self {
        let mut seen = HashSet::new();
        seen.insert(initial.iter().map(|n| n.value).collect());
        Self {
            property,
            max_len,
            max_choices,
            current: initial,
            message,
            seen,
            calls: 0,
            max_calls,
        }
    }

    /// Runs shrink passes until none makes progress or the call budget is
    /// spent.
    pub fn shrink(mut self) -> ShrinkResult {
        loop {
            let mut progress = false;
            progress |= self.delete_trailing();
            progress |= self.delete_individual();
            progress |= self.minimize_individual();
            if !progress || self.calls >= self.max_calls {
                break;
            }
        }
        ShrinkResult {
            choices: self.current,
            message: self.message,
            calls: self.calls,
        }
    }

    /// Replays `candidate` and adopts it if the property still fails on it
    /// with an improved sort key.
    fn consider(&mut self, candidate: Vec<ChoiceNode>) -> bool {
        let key: Vec<i64> = candidate.iter().map(|n| n.value).collect();
        if self.calls >= self.max_calls || !self.seen.insert(key) {
            return false;
        }
        self.calls += 1;
        let mut case = TestCase::for_choices(candidate, self.max_len, self.max_choices);
        match (self.property)(&mut case) {
            Err(TrialError::Failed(message)) => {
                case.status = Status::Interesting;
                // Keep only the choices the property actually consumed.
                let recorded = case.into_nodes();
                if sort_key(&recorded) < sort_key(&self.current) {
                    self.current = recorded;
                    self.message = message;
                    true
                } else {
                    false
                }
            }
            _ => false,
        }
    }

    fn delete_trailing(&mut self) -> bool {
        let mut progress = false;
        while !self.current.is_empty() {
            let mut candidate = self.current.clone();
            candidate.pop();
            if self.consider(candidate) {
                progress = true;
            } else {
                break;
            }
        }
        progress
    }

    fn delete_individual(&mut self) -> bool {
        for index in (0..self.current.len()).rev() {
            let mut candidate = self.current.clone();
            candidate.remove(index);
            if self.consider(candidate) {
                // One deletion per pass; indices shift under us otherwise.
                return true;
            }
        }
        false
    }

    fn minimize_individual(&mut self) -> bool {
        let mut progress = false;
        for index in 0..self.current.len() {
            progress |= self.minimize_at(index);
        }
        progress
    }

    /// Moves the choice at `index` toward its shrink target: jump straight
    /// to the target, then binary-search the boundary between passing and
    /// failing values.
    fn minimize_at(&mut self, index: usize) -> bool {
        let Some(node) = self.current.get(index) else {
            return false;
        };
        let value = node.value;
        let target = node.constraints.shrink_towards;
        if value == target {
            return false;
        }
        if self.try_value(index, target) {
            return true;
        }
        // Invariant: `hi` is the best failing value adopted so far, `lo` a
        // value on the passing side (or at least one not adopted). Widened
        // arithmetic so the midpoint cannot overflow.
        let mut progress = false;
        let mut lo = i128::from(target);
        let mut hi = i128::from(value);
        while (hi - lo).abs() > 1 {
            let mid = lo + (hi - lo) / 2;
            if self.try_value(index, mid as i64) {
                hi = mid;
                progress = true;
            } else {
                lo = mid;
            }
        }
        progress
    }

    fn try_value(&mut self, index: usize, value: i64) -> bool {
        match self.current.get(index) {
            Some(node) if node.value != value => {
                let mut candidate = self.current.clone();
                candidate[index] = candidate[index].with_value(value);
                self.consider(candidate)
            }
            _ => false,
        }
    }
}
