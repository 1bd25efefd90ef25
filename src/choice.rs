//! Choice recording for the generation subsystem.
//!
//! Every value a trial draws flows through a typed choice with an attached
//! constraint. The harness only ever draws integers (sequences are encoded
//! as a length choice followed by element choices), so the choice layer is
//! integer-only.

/// Range constraint attached to every integer draw.
///
/// `shrink_towards` is where the shrinker moves the choice while the
/// surrounding trial stays interesting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IntegerConstraints {
    pub min_value: i64,
    pub max_value: i64,
    pub shrink_towards: i64,
}

impl IntegerConstraints {
    /// Constraint for a closed range. Requires `min_value <= max_value`.
    /// Shrinks toward zero, clamped into the range.
    pub fn new(min_value: i64, max_value: i64) -> Self {
        Self {
            min_value,
            max_value,
            shrink_towards: 0i64.clamp(min_value, max_value),
        }
    }

    /// True if `value` lies within the range.
    pub fn permits(&self, value: i64) -> bool {
        self.min_value <= value && value <= self.max_value
    }
}

/// A single choice made during a trial.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChoiceNode {
    pub value: i64,
    pub constraints: IntegerConstraints,
}

impl ChoiceNode {
    /// Copy of this node with a different value under the same constraints.
    pub fn with_value(&self, value: i64) -> Self {
        Self {
            value,
            constraints: self.constraints,
        }
    }
}

/// Distance of a choice from its shrink target.
fn choice_to_index(node: &ChoiceNode) -> u64 {
    node.value.abs_diff(node.constraints.shrink_towards)
}

/// Shortlex sort key over a choice sequence.
///
/// Shorter sequences are always simpler; equal lengths compare by per-choice
/// distance from the shrink target, left to right.
pub fn sort_key(nodes: &[ChoiceNode]) -> (usize, Vec<u64>) {
    (nodes.len(), nodes.iter().map(choice_to_index).collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn node(value: i64, min: i64, max: i64) -> ChoiceNode {
        ChoiceNode {
            value,
            constraints: IntegerConstraints::new(min, max),
        }
    }

    #[test]
    fn shrink_target_is_zero_clamped_into_range() {
        assert_eq!(IntegerConstraints::new(-5, 5).shrink_towards, 0);
        assert_eq!(IntegerConstraints::new(3, 9).shrink_towards, 3);
        assert_eq!(IntegerConstraints::new(-9, -3).shrink_towards, -3);
    }

    #[test]
    fn permits_checks_the_closed_range() {
        let constraints = IntegerConstraints::new(0, 10);
        assert!(constraints.permits(0));
        assert!(constraints.permits(10));
        assert!(!constraints.permits(-1));
        assert!(!constraints.permits(11));
    }

    #[test]
    fn shorter_sequences_sort_first() {
        let short = vec![node(100, 0, 1000)];
        let long = vec![node(0, 0, 1000), node(0, 0, 1000)];
        assert!(sort_key(&short) < sort_key(&long));
    }

    #[test]
    fn closer_to_target_sorts_first_at_equal_length() {
        let near = vec![node(2, -100, 100)];
        let far = vec![node(-50, -100, 100)];
        assert!(sort_key(&near) < sort_key(&far));
    }
}
