//! Expected-value matching for sequence confirmation.

use serde::{Deserialize, Serialize};

/// How one confirmation frame's velocity is compared.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MatchPredicate {
    /// The reading must equal the value.
    Exact(u32),
    /// The reading must be at or above the value.
    AtLeast(u32),
}

impl MatchPredicate {
    pub fn matches(&self, value: u32) -> bool {
        match *self {
            MatchPredicate::Exact(expected) => value == expected,
            MatchPredicate::AtLeast(floor) => value >= floor,
        }
    }
}

/// Tracks progress through an expected sequence of readings.
///
/// A matching reading advances the cursor. A mismatching reading resets
/// it to the start and is then tried against the first predicate, so a
/// run can begin on the very reading that broke the previous one.
#[derive(Debug, Clone)]
pub struct SequenceMatcher<'a> {
    expected: &'a [MatchPredicate],
    cursor: usize,
    run_start: u64,
}

impl<'a> SequenceMatcher<'a> {
    pub fn new(expected: &'a [MatchPredicate]) -> Self {
        Self {
            expected,
            cursor: 0,
            run_start: 0,
        }
    }

    /// Number of predicates matched by the current run.
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// Feeds one successful reading taken from frame `index`.
    ///
    /// Returns the index of the run's first frame once the whole
    /// sequence has matched.
    pub fn observe(&mut self, index: u64, value: u32) -> Option<u64> {
        if self.expected.is_empty() {
            return None;
        }

        if !self.expected[self.cursor].matches(value) {
            self.cursor = 0;
            if !self.expected[0].matches(value) {
                return None;
            }
        }

        if self.cursor == 0 {
            self.run_start = index;
        }
        self.cursor += 1;

        if self.cursor == self.expected.len() {
            self.cursor = 0;
            return Some(self.run_start);
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use MatchPredicate::{AtLeast, Exact};

    const LIFTOFF: [MatchPredicate; 2] = [Exact(0), Exact(1)];

    fn run(expected: &[MatchPredicate], values: &[u32]) -> Option<u64> {
        let mut matcher = SequenceMatcher::new(expected);
        values
            .iter()
            .enumerate()
            .find_map(|(i, &v)| matcher.observe(i as u64, v))
    }

    #[test]
    fn test_exact_and_floor() {
        assert!(Exact(5).matches(5));
        assert!(!Exact(5).matches(6));
        assert!(AtLeast(1998).matches(1998));
        assert!(AtLeast(1998).matches(3000));
        assert!(!AtLeast(1998).matches(1997));
    }

    #[test]
    fn test_clean_run_locks() {
        assert_eq!(run(&LIFTOFF, &[7, 0, 1]), Some(1));
    }

    #[test]
    fn test_mismatch_resets_without_partial_credit() {
        let mut matcher = SequenceMatcher::new(&LIFTOFF);

        assert_eq!(matcher.observe(0, 0), None);
        assert_eq!(matcher.cursor(), 1);
        assert_eq!(matcher.observe(1, 5), None);
        assert_eq!(matcher.cursor(), 0);
        assert_eq!(matcher.observe(2, 1), None);
        assert_eq!(matcher.cursor(), 0);

        // Matching restarts after the 5.
        assert_eq!(matcher.observe(3, 0), None);
        assert_eq!(matcher.observe(4, 1), Some(3));
    }

    #[test]
    fn test_breaking_reading_can_start_new_run() {
        // The idle overlay shows 0 for many frames before 1.
        assert_eq!(run(&LIFTOFF, &[0, 0, 0, 0, 1]), Some(3));
    }

    #[test]
    fn test_floor_sequence_needs_consecutive_readings() {
        let floor = [AtLeast(1998); 3];

        assert_eq!(run(&floor, &[2998, 2999, 12, 3001, 3002]), None);
        assert_eq!(run(&floor, &[2998, 2999, 12, 3001, 3002, 3003]), Some(3));
    }

    proptest! {
        #[test]
        fn prop_liftoff_lock_is_first_adjacent_zero_one(values in prop::collection::vec(0u32..3, 0..40)) {
            let expected = values
                .windows(2)
                .position(|w| w == [0, 1])
                .map(|i| i as u64);

            prop_assert_eq!(run(&LIFTOFF, &values), expected);
        }
    }
}
