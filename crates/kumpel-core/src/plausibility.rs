//! Word-count plausibility check run before any grading call.
//!
//! An answer is plausible when its word count lies within two standard
//! deviations of the reference translation's word count, with the standard
//! deviation taken as a quarter of that count and the lower bound never
//! below one word.

/// Number of whitespace-separated words in `text`.
pub fn word_count(text: &str) -> usize {
    text.split_whitespace().count()
}

/// Accepted word-count range for answers to one sentence.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LengthRange {
    /// Word count of the reference translation.
    pub expected: usize,
    /// Smallest accepted word count (inclusive).
    pub min: f64,
    /// Largest accepted word count (inclusive).
    pub max: f64,
}

/// Outcome of the plausibility check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LengthVerdict {
    /// The answer may be graded.
    Plausible,
    /// The answer has too few words.
    TooShort {
        /// Words in the answer.
        actual: usize,
        /// Words in the reference translation.
        expected: usize,
    },
    /// The answer has too many words.
    TooLong {
        /// Words in the answer.
        actual: usize,
        /// Words in the reference translation.
        expected: usize,
    },
}

impl LengthRange {
    /// Range for answers to the given reference translation.
    ///
    /// # Examples
    ///
    /// ```
    /// use kumpel_core::LengthRange;
    ///
    /// let range = LengthRange::for_translation("The dog sleeps in the sun.");
    /// assert_eq!(range.expected, 6);
    /// assert_eq!(range.min, 3.0);
    /// assert_eq!(range.max, 9.0);
    /// ```
    #[must_use]
    pub fn for_translation(english: &str) -> Self {
        let expected = word_count(english);
        let n = expected as f64;
        let std_dev = 0.25 * n;
        Self {
            expected,
            min: (n - 2.0 * std_dev).max(1.0),
            max: n + 2.0 * std_dev,
        }
    }

    /// Checks an answer against the range.
    #[must_use]
    pub fn check(&self, answer: &str) -> LengthVerdict {
        let actual = word_count(answer);
        let words = actual as f64;
        if words < self.min {
            LengthVerdict::TooShort {
                actual,
                expected: self.expected,
            }
        } else if words > self.max {
            LengthVerdict::TooLong {
                actual,
                expected: self.expected,
            }
        } else {
            LengthVerdict::Plausible
        }
    }
}
