//! Absolute time offset estimation from reference pairs.

use contracts::{secs_to_micros, OffsetEstimate, OffsetSource, ReferencePair};
use serde::Serialize;

/// Collects reference pairs and a fallback guess for one system.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct OffsetEstimator {
    pairs: Vec<ReferencePair>,
    guess_us: i64,
}

impl OffsetEstimator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a pair; pairs without a positive absolute time are ignored.
    pub fn add_reference(&mut self, relative_us: i64, absolute_us: i64) -> bool {
        if absolute_us <= 0 {
            return false;
        }
        self.pairs.push(ReferencePair::new(relative_us, absolute_us));
        true
    }

    /// Record `epoch - relative` as the fallback guess when `epoch_us > 0`.
    pub fn update_guess(&mut self, relative_us: i64, epoch_us: i64) {
        if epoch_us > 0 {
            self.guess_us = epoch_us - relative_us;
        }
    }

    pub fn guess_us(&self) -> i64 {
        self.guess_us
    }

    pub fn pairs(&self) -> &[ReferencePair] {
        &self.pairs
    }

    /// Append pairs not already present (merge support).
    pub fn absorb(&mut self, other: &OffsetEstimator) {
        for pair in &other.pairs {
            if !self.pairs.contains(pair) {
                self.pairs.push(*pair);
            }
        }
        if self.guess_us == 0 {
            self.guess_us = other.guess_us;
        }
    }

    /// Mean of `absolute - relative` over all pairs, rounded half away from
    /// zero to whole µs; the guess when there are no pairs.
    pub fn determine(&self) -> OffsetEstimate {
        if self.pairs.is_empty() {
            return OffsetEstimate {
                offset_us: self.guess_us,
                source: OffsetSource::Guess,
                pairs: 0,
            };
        }
        let sum: i128 = self.pairs.iter().map(|p| p.offset_us() as i128).sum();
        let n = self.pairs.len() as i128;
        OffsetEstimate {
            offset_us: div_round(sum, n) as i64,
            source: OffsetSource::ReferencePairs,
            pairs: self.pairs.len(),
        }
    }

    /// Rigidly translate every pair and the guess by `delay_s`.
    ///
    /// Pairs move earlier in relative time, so data aligns `delay_s` later.
    pub fn shift(&mut self, delay_s: f64) {
        let delay_us = secs_to_micros(delay_s);
        for pair in &mut self.pairs {
            pair.relative_us -= delay_us;
        }
        self.guess_us += delay_us;
    }
}

/// Integer division rounding half away from zero.
fn div_round(numerator: i128, denominator: i128) -> i128 {
    let quotient = numerator / denominator;
    let remainder = numerator % denominator;
    if 2 * remainder.abs() >= denominator.abs() {
        quotient + numerator.signum() * denominator.signum()
    } else {
        quotient
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_offset_mean() {
        let mut est = OffsetEstimator::new();
        est.add_reference(0, 1000);
        est.add_reference(10_000_000, 1_011_000_000);
        let offset = est.determine();
        assert_eq!(offset.offset_us, 500_500_500);
        assert_eq!(offset.source, OffsetSource::ReferencePairs);
        assert_eq!(offset.pairs, 2);
    }

    #[test]
    fn test_offset_rounding() {
        let mut est = OffsetEstimator::new();
        est.add_reference(0, 1);
        est.add_reference(0, 2);
        assert_eq!(est.determine().offset_us, 2);

        let mut est = OffsetEstimator::new();
        est.add_reference(0, 1);
        est.add_reference(0, 1);
        est.add_reference(0, 2);
        assert_eq!(est.determine().offset_us, 1);
        assert_eq!(div_round(-3, 2), -2);
    }

    #[test]
    fn test_guess_fallback() {
        let mut est = OffsetEstimator::new();
        assert!(!est.add_reference(5, 0));
        est.update_guess(2_000_000, 1_700_000_000_000_000);
        let offset = est.determine();
        assert!(offset.is_speculative());
        assert_eq!(offset.offset_us, 1_699_999_998_000_000);

        est.update_guess(0, 0);
        assert_eq!(est.guess_us(), 1_699_999_998_000_000);
    }

    #[test]
    fn test_shift() {
        let mut est = OffsetEstimator::new();
        est.add_reference(10_000_000, 1_010_000_000);
        est.update_guess(0, 500);
        est.shift(2.5);
        assert_eq!(est.pairs()[0].relative_us, 7_500_000);
        assert_eq!(est.guess_us(), 2_500_500);
        assert_eq!(est.determine().offset_us, 1_002_500_000);
    }

    #[test]
    fn test_absorb_dedups() {
        let mut a = OffsetEstimator::new();
        a.add_reference(0, 100);
        let b = a.clone();
        a.absorb(&b);
        assert_eq!(a.pairs().len(), 1);
    }
}
