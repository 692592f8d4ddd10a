//! Participation percentage (integer-first; one float conversion at the end).

/// `ballots × 100 / eligible`, rounded half-up to one decimal place.
///
/// `None` when the electorate size is unknown or zero. Values above 100 are
/// returned as-is.
pub fn participation_pct(ballots: u64, eligible: Option<u64>) -> Option<f64> {
    let eligible = eligible.filter(|&e| e > 0)?;
    let num = u128::from(ballots) * 1000 * 2 + u128::from(eligible);
    let den = u128::from(eligible) * 2;
    let tenths = num / den;
    Some(tenths as f64 / 10.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_or_empty_roll_is_none() {
        assert_eq!(participation_pct(10, None), None);
        assert_eq!(participation_pct(10, Some(0)), None);
    }

    #[test]
    fn rounds_half_up_to_one_decimal() {
        assert_eq!(participation_pct(7, Some(8)), Some(87.5));
        assert_eq!(participation_pct(2, Some(3)), Some(66.7));
        assert_eq!(participation_pct(1, Some(3)), Some(33.3));
        // 1/16 = 6.25% → 6.3
        assert_eq!(participation_pct(1, Some(16)), Some(6.3));
        assert_eq!(participation_pct(0, Some(5)), Some(0.0));
        assert_eq!(participation_pct(5, Some(5)), Some(100.0));
    }

    #[test]
    fn stale_roll_is_not_clamped() {
        assert_eq!(participation_pct(12, Some(10)), Some(120.0));
    }
}
