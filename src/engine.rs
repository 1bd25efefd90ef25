//! The check primitive: run a property against many generated trials.
//!
//! [`check`] drives the generator → function-under-test → property loop:
//! it generates trials until the budget of non-discarded trials is met,
//! drops trials whose preconditions fail, biases generation toward the
//! best guidance score seen so far, and shrinks the first failure to a
//! minimal reproduction.

use crate::choice::ChoiceNode;
use crate::data::{Status, TestCase, TrialError};
use crate::shrink::Shrinker;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use thiserror::Error;

/// Trial reporting level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Verbosity {
    #[default]
    Quiet,
    /// Print every generated trial and its outcome to stdout.
    Verbose,
}

/// Per-check configuration, passed explicitly to [`check`]. No process-wide
/// settings exist; two checks in the same process can disagree freely.
#[derive(Debug, Clone)]
pub struct CheckConfig {
    /// Non-discarded trials required for the check to pass.
    pub max_examples: u32,
    /// Upper bound on generated sequence lengths.
    pub max_len: usize,
    /// Upper bound on choices recorded per trial.
    pub max_choices: usize,
    /// Upper bound on property calls spent shrinking a failure.
    pub max_shrinks: u32,
    /// Seed for deterministic generation and replay.
    pub seed: u64,
    pub verbosity: Verbosity,
    /// Print the best guidance score once the check completes.
    pub print_target_stats: bool,
}

impl Default for CheckConfig {
    fn default() -> Self {
        Self {
            max_examples: 1000,
            max_len: 64,
            max_choices: 4096,
            max_shrinks: 1000,
            seed: 0,
            verbosity: Verbosity::Quiet,
            print_target_stats: false,
        }
    }
}

/// Counters accumulated over one check.
#[derive(Debug, Clone, Default)]
pub struct CheckStats {
    /// Non-discarded trials executed.
    pub trials: u32,
    /// Trials dropped by a discard condition (overruns included).
    pub discarded: u32,
    /// Trials that overran their choice budget or misaligned on replay.
    pub overruns: u32,
    /// Trials seeded from a mutation of the best-scoring sequence.
    pub targeted: u32,
    /// Best guidance score observed, if any trial reported one.
    pub best_target: Option<f64>,
}

#[derive(Debug, Error)]
pub enum CheckError {
    /// An invariant was violated. `message` and `choices` describe the
    /// minimal failing trial found by shrinking.
    #[error("property failed: {message} (minimal choices {choices:?}, {shrink_calls} shrink calls)")]
    Failed {
        message: String,
        choices: Vec<i64>,
        shrink_calls: u32,
    },
    /// The discard retry budget ran out before enough trials survived
    /// their preconditions. A harness-level condition, not a bug in the
    /// function under test.
    #[error("check exhausted: {discarded} trials discarded with only {valid} valid")]
    Exhausted { valid: u32, discarded: u32 },
}

/// Discarded trials allowed per required example before giving up.
const DISCARD_MULTIPLIER: u32 = 100;

/// Once a guidance score exists, one in this many trials mutates the
/// best-scoring sequence instead of generating from scratch.
const TARGET_FRACTION: u32 = 4;

/// Runs `property` against generated trials until `config.max_examples`
/// non-discarded trials pass, a trial fails, or generation is exhausted.
pub fn check<F>(config: &CheckConfig, property: F) -> Result<CheckStats, CheckError>
where
    F: Fn(&mut TestCase) -> Result<(), TrialError>,
{
    let mut stats = CheckStats::default();
    let mut best: Option<Vec<ChoiceNode>> = None;
    let mut mutation_rng = ChaCha8Rng::seed_from_u64(config.seed ^ 0x9e37_79b9_7f4a_7c15);
    let max_discards = config.max_examples.saturating_mul(DISCARD_MULTIPLIER);
    let mut trial_seed = config.seed;

    while stats.trials < config.max_examples {
        trial_seed = trial_seed.wrapping_add(1);
        let mut case = match &best {
            Some(nodes) if stats.trials % TARGET_FRACTION == 0 => {
                stats.targeted += 1;
                let mutated = mutate(nodes, &mut mutation_rng);
                TestCase::with_prefix(mutated, trial_seed, config.max_len, config.max_choices)
            }
            _ => TestCase::new(trial_seed, config.max_len, config.max_choices),
        };

        let outcome = property(&mut case);
        if config.verbosity == Verbosity::Verbose {
            print_trial(&case, &outcome);
        }

        match outcome {
            Ok(()) => {
                stats.trials += 1;
                if let Some(score) = case.target_score {
                    if stats.best_target.map_or(true, |b| score > b) {
                        stats.best_target = Some(score);
                        best = Some(case.into_nodes());
                    }
                }
            }
            Err(TrialError::Failed(message)) => {
                case.status = Status::Interesting;
                let shrinker = Shrinker::new(
                    &property,
                    case.into_nodes(),
                    message,
                    config.max_len,
                    config.max_choices,
                    config.max_shrinks,
                );
                let result = shrinker.shrink();
                return Err(CheckError::Failed {
                    message: result.message,
                    choices: result.choices.iter().map(|n| n.value).collect(),
                    shrink_calls: result.calls,
                });
            }
            Err(TrialError::Discard) => {
                stats.discarded += 1;
            }
            Err(TrialError::Overrun) => {
                stats.overruns += 1;
                stats.discarded += 1;
            }
        }

        if stats.discarded > max_discards {
            return Err(CheckError::Exhausted {
                valid: stats.trials,
                discarded: stats.discarded,
            });
        }
    }

    if config.print_target_stats {
        match stats.best_target {
            Some(score) => println!(
                "target: best score {score} ({} of {} trials guided)",
                stats.targeted, stats.trials
            ),
            None => println!("target: no guidance scores reported"),
        }
    }
    Ok(stats)
}

/// Nudges one choice of the best-scoring sequence within its constraints.
fn mutate(nodes: &[ChoiceNode], rng: &mut ChaCha8Rng) -> Vec<ChoiceNode> {
    let mut nodes = nodes.to_vec();
    if nodes.is_empty() {
        return nodes;
    }
    let index = rng.gen_range(0..nodes.len());
    let node = &nodes[index];
    let (min, max) = (node.constraints.min_value, node.constraints.max_value);
    if min < max {
        let delta = if rng.gen_bool(0.5) { 1 } else { -1 };
        let value = node.value.saturating_add(delta).clamp(min, max);
        nodes[index] = node.with_value(value);
    }
    nodes
}

fn print_trial(case: &TestCase, outcome: &Result<(), TrialError>) {
    let values: Vec<i64> = case.nodes().iter().map(|n| n.value).collect();
    match outcome {
        Ok(()) => println!("trial {values:?} -> ok"),
        Err(err) => println!("trial {values:?} -> {err}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::ensure;

    #[test]
    fn default_config_is_quiet_and_large() {
        let config = CheckConfig::default();
        assert_eq!(config.max_examples, 1000);
        assert_eq!(config.verbosity, Verbosity::Quiet);
        assert!(!config.print_target_stats);
    }

    #[test]
    fn trivial_property_runs_the_full_budget() {
        let config = CheckConfig {
            max_examples: 25,
            seed: 42,
            ..CheckConfig::default()
        };
        let stats = check(&config, |case| {
            let _ = case.draw_integer(0, 10)?;
            Ok(())
        })
        .expect("trivial property must pass");
        assert_eq!(stats.trials, 25);
        assert_eq!(stats.discarded, 0);
    }

    #[test]
    fn mutation_stays_within_constraints() {
        let mut rng = ChaCha8Rng::seed_from_u64(9);
        let nodes = vec![ChoiceNode {
            value: 9,
            constraints: crate::choice::IntegerConstraints::new(0, 9),
        }];
        for _ in 0..100 {
            let mutated = mutate(&nodes, &mut rng);
            assert!(mutated[0].constraints.permits(mutated[0].value));
        }
    }

    #[test]
    fn failure_is_reported_with_minimal_choices() {
        let config = CheckConfig {
            max_examples: 50,
            seed: 3,
            ..CheckConfig::default()
        };
        let err = check(&config, |case| {
            let x = case.draw_integer(0, 1000)?;
            ensure(x < 500, || format!("drew {x}"))
        })
        .expect_err("half the range fails");
        match err {
            CheckError::Failed { message, choices, .. } => {
                assert_eq!(choices, vec![500]);
                assert_eq!(message, "drew 500");
            }
            other => panic!("expected Failed, got {other}"),
        }
    }
}
