//! Tolerance model used to judge a computed product against the reference answer.
//!
//! Each output element of an `M × K` by `K × N` product accumulates `K` multiply-adds, so
//! the expected rounding error grows linearly with `K`. Two thresholds are derived from it:
//!
//! ```text
//! threshold = K * 2^(2 * E - mantissa - digits)
//! ```
//!
//! where `E` is [`Element::MAGNITUDE_EXPONENT`], `mantissa` is [`Element::MANTISSA_DIGITS`]
//! and `digits` is the per-tier value from [`Standards`]. Differences above the strict
//! threshold (or non-finite ones) are strict violations and are also counted as loose
//! violations. Differences above only the loose threshold are loose violations.

use std::fmt;

use crate::element::Element;

/// Per-tier binary digit offsets applied to the accumulation error bound.
///
/// A larger value shrinks the threshold of its tier. With the defaults the strict tier is
/// sixteen times more permissive than the loose tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Standards {
    /// Digits subtracted from the exponent of the loose threshold.
    pub loose_standard_digits: i32,
    /// Digits subtracted from the exponent of the strict threshold.
    pub strict_standard_digits: i32,
}

impl Default for Standards {
    fn default() -> Self {
        Standards {
            loose_standard_digits: 4,
            strict_standard_digits: 0,
        }
    }
}

impl Standards {
    /// Returns a copy with `loose_standard_digits` replaced.
    pub fn with_loose_digits(mut self, digits: i32) -> Self {
        self.loose_standard_digits = digits;
        self
    }

    /// Returns a copy with `strict_standard_digits` replaced.
    pub fn with_strict_digits(mut self, digits: i32) -> Self {
        self.strict_standard_digits = digits;
        self
    }

    /// Threshold of one tier for a summation depth of `depth` terms.
    pub fn threshold<E: Element>(depth: u32, digits: i32) -> E {
        let exponent = 2 * E::MAGNITUDE_EXPONENT - E::MANTISSA_DIGITS - digits;
        E::from_f64(depth as f64 * 2f64.powi(exponent))
    }
}

/// An output element that exceeded the strict threshold.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Violation<E> {
    pub row: u32,
    pub col: u32,
    pub calced: E,
    pub answer: E,
}

/// Aggregated outcome of scoring one computed matrix.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Score<E> {
    pub loose_standard: E,
    pub strict_standard: E,
    pub loose_violations: usize,
    pub strict_violations: usize,
    pub max_difference: E,
}

impl<E: Element> Score<E> {
    /// Creates an empty score with thresholds for a summation depth of `depth`.
    pub fn new(depth: u32, standards: &Standards) -> Self {
        Score {
            loose_standard: Standards::threshold(depth, standards.loose_standard_digits),
            strict_standard: Standards::threshold(depth, standards.strict_standard_digits),
            loose_violations: 0,
            strict_violations: 0,
            max_difference: E::zero(),
        }
    }

    /// Evaluates one element and returns whether it is within the strict threshold.
    #[inline]
    pub fn check(&mut self, calced: E, answer: E) -> bool {
        let diff = (calced - answer).abs();

        // NaN never compares greater, so it leaves the running maximum untouched.
        if diff > self.max_difference {
            self.max_difference = diff;
        }

        if !diff.is_finite() || diff > self.strict_standard {
            self.loose_violations += 1;
            self.strict_violations += 1;
            false
        } else {
            if diff > self.loose_standard {
                self.loose_violations += 1;
            }
            true
        }
    }

    /// Folds a partial score computed over a disjoint set of elements into `self`.
    pub fn merge(&mut self, other: &Score<E>) {
        debug_assert!(self.strict_standard == other.strict_standard);
        debug_assert!(self.loose_standard == other.loose_standard);

        self.loose_violations += other.loose_violations;
        self.strict_violations += other.strict_violations;
        if other.max_difference > self.max_difference {
            self.max_difference = other.max_difference;
        }
    }

    /// `true` when no element exceeded the strict threshold.
    pub fn is_acceptable(&self) -> bool {
        self.strict_violations == 0
    }
}

impl<E: Element> fmt::Display for Score<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "strict violations: {} (> {:e}), loose violations: {} (> {:e}), max difference: {:e}",
            self.strict_violations,
            self.strict_standard,
            self.loose_violations,
            self.loose_standard,
            self.max_difference
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_thresholds_f32() {
        let score = Score::<f32>::new(1024, &Standards::default());
        // 1024 * 2^(4 - 24 - 0) == 2^-10
        assert_eq!(score.strict_standard, 2f32.powi(-10));
        // 1024 * 2^(4 - 24 - 4) == 2^-14
        assert_eq!(score.loose_standard, 2f32.powi(-14));
        assert!(score.loose_standard < score.strict_standard);
    }

    #[test]
    fn test_thresholds_scale_with_depth() {
        let standards = Standards::default();
        let shallow = Score::<f64>::new(16, &standards);
        let deep = Score::<f64>::new(32, &standards);
        assert_eq!(deep.strict_standard, 2.0 * shallow.strict_standard);
        assert_eq!(deep.loose_standard, 2.0 * shallow.loose_standard);
    }

    #[test]
    fn test_custom_digits() {
        let standards = Standards::default().with_strict_digits(2).with_loose_digits(6);
        let score = Score::<f32>::new(1, &standards);
        assert_eq!(score.strict_standard, 2f32.powi(-22));
        assert_eq!(score.loose_standard, 2f32.powi(-26));
    }

    #[test]
    fn test_check_tiers() {
        let mut score = Score::<f64>::new(1, &Standards::default());
        let strict = score.strict_standard;
        let loose = score.loose_standard;

        assert!(score.check(1.0, 1.0));
        assert_eq!((score.loose_violations, score.strict_violations), (0, 0));

        // Between the two thresholds: loose only.
        assert!(score.check((loose + strict) / 2.0, 0.0));
        assert_eq!((score.loose_violations, score.strict_violations), (1, 0));

        // Beyond the strict threshold: both tiers.
        assert!(!score.check(4.0 * strict, 0.0));
        assert_eq!((score.loose_violations, score.strict_violations), (2, 1));
        assert!(!score.is_acceptable());
    }

    #[test]
    fn test_non_finite_difference_is_strict_violation() {
        let mut score = Score::<f32>::new(8, &Standards::default());
        assert!(!score.check(f32::NAN, 1.0));
        assert_eq!(score.max_difference, 0.0);
        assert!(!score.check(f32::INFINITY, 1.0));
        assert_eq!(score.max_difference, f32::INFINITY);
        assert_eq!(score.strict_violations, 2);
        assert_eq!(score.loose_violations, 2);
    }

    #[test]
    fn test_max_difference_tracks_all_elements() {
        let mut score = Score::<f64>::new(4, &Standards::default());
        score.check(1e-20, 0.0);
        score.check(0.0, 1e-18);
        score.check(3.0, 3.0);
        assert_eq!(score.max_difference, 1e-18);
        assert!(score.is_acceptable());
    }

    #[test]
    fn test_merge_is_sum_and_max() {
        let standards = Standards::default();
        let mut left = Score::<f32>::new(2, &standards);
        let mut right = Score::<f32>::new(2, &standards);
        left.check(0.0, 1.0);
        right.check(0.0, 3.0);
        right.check(0.0, 0.0);

        let mut a = left;
        a.merge(&right);
        let mut b = right;
        b.merge(&left);

        assert_eq!(a, b);
        assert_eq!(a.strict_violations, 2);
        assert_eq!(a.max_difference, 3.0);
    }

    #[test]
    fn test_display_summary() {
        let mut score = Score::<f32>::new(2, &Standards::default());
        score.check(0.0, 1.0);
        let display = format!("{}", score);
        assert!(display.contains("strict violations: 1"));
        assert!(display.contains("loose violations: 1"));
    }
}
