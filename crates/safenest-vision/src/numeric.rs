//! Rounding helpers shared by the detector, tracker and scorer.

/// Round to 2 decimal places, half to even.
pub fn round2(value: f64) -> f64 {
    if !value.is_finite() {
        return 0.0;
    }
    (value * 100.0).round_ties_even() / 100.0
}

/// Round to the nearest integer score in [0, 100], half to even.
pub fn round_score(value: f64) -> u8 {
    if !value.is_finite() {
        return 0;
    }
    value.clamp(0.0, 100.0).round_ties_even() as u8
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round2() {
        assert_eq!(round2(6.0025), 6.0);
        assert_eq!(round2(1.234), 1.23);
        assert_eq!(round2(f64::NAN), 0.0);
    }

    #[test]
    fn test_round_score_half_even() {
        assert_eq!(round_score(76.5), 76);
        assert_eq!(round_score(77.5), 78);
        assert_eq!(round_score(-3.0), 0);
        assert_eq!(round_score(130.0), 100);
    }
}
