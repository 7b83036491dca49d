//! Fixed-point helpers
//!
//! Every ratio in the ledger is computed as `a * b / c` over `u128`
//! intermediates and floored.

/// Basis-point denominator (10000 bps = 100%)
pub const BPS_DENOMINATOR: u64 = 10_000;

/// Exchange-rate scale (1.0 == `RATE_SCALE`)
pub const RATE_SCALE: u64 = 1_000_000_000;

/// Exchange rate of an empty vault
pub const INITIAL_EXCHANGE_RATE: u64 = RATE_SCALE;

/// Floor of `a * b / c`.
///
/// Returns `None` when `c == 0` or the quotient does not fit in `u64`.
#[inline]
pub fn mul_div(a: u64, b: u64, c: u64) -> Option<u64> {
    if c == 0 {
        return None;
    }
    let q = a as u128 * b as u128 / c as u128;
    u64::try_from(q).ok()
}

/// `part` as basis points of `whole`, floored. Zero when `whole` is zero.
#[inline]
pub fn bps_of(part: u64, whole: u64) -> u64 {
    mul_div(part, BPS_DENOMINATOR, whole).unwrap_or(0)
}

/// `bps` of `amount`, floored.
#[inline]
pub fn apply_bps(amount: u64, bps: u64) -> u64 {
    // bps <= BPS_DENOMINATOR in every caller, so the quotient fits
    mul_div(amount, bps, BPS_DENOMINATOR).unwrap_or(u64::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mul_div_floors() {
        assert_eq!(mul_div(500, 1100, 1000), Some(550));
        assert_eq!(mul_div(10, 1, 3), Some(3));
        assert_eq!(mul_div(1, 1, 0), None);
    }

    #[test]
    fn test_mul_div_wide_intermediate() {
        assert_eq!(mul_div(u64::MAX, u64::MAX, u64::MAX), Some(u64::MAX));
        assert_eq!(mul_div(u64::MAX, 2, 1), None);
    }

    #[test]
    fn test_bps_helpers() {
        assert_eq!(bps_of(6000, 10000), 6000);
        assert_eq!(bps_of(1, 0), 0);
        assert_eq!(apply_bps(10000, 2000), 2000);
    }
}
