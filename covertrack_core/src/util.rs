//! Common time helpers for covertrack_core.

use std::time::Duration;

/// Number of nanoseconds in one second.
pub const NANOS_PER_SEC: u128 = 1_000_000_000;

/// Scale `full` by `num / den` in integer nanoseconds, truncating.
/// - `den == 0` yields `Duration::ZERO` instead of dividing by zero.
/// - Saturates at `Duration::MAX`.
#[inline]
pub fn scale_duration(full: Duration, num: u32, den: u32) -> Duration {
    if den == 0 {
        return Duration::ZERO;
    }
    let nanos = full.as_nanos().saturating_mul(u128::from(num)) / u128::from(den);
    duration_from_nanos(nanos)
}

/// Build a `Duration` from a `u128` nanosecond count, saturating.
#[inline]
pub fn duration_from_nanos(nanos: u128) -> Duration {
    let secs = nanos / NANOS_PER_SEC;
    let sub = (nanos % NANOS_PER_SEC) as u32;
    match u64::try_from(secs) {
        Ok(s) => Duration::new(s, sub),
        Err(_) => Duration::MAX,
    }
}

/// Seconds as `Duration`, rejecting NaN, infinities and values <= 0.
#[inline]
pub fn positive_secs(secs: f64) -> Option<Duration> {
    if secs.is_finite() && secs > 0.0 {
        Duration::try_from_secs_f64(secs).ok()
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scales_linearly_and_truncates() {
        let full = Duration::from_secs(40);
        assert_eq!(scale_duration(full, 100, 100), full);
        assert_eq!(scale_duration(full, 50, 100), Duration::from_secs(20));
        assert_eq!(scale_duration(full, 37, 100), Duration::from_millis(14_800));
        assert_eq!(scale_duration(Duration::from_nanos(3), 1, 2), Duration::from_nanos(1));
        assert_eq!(scale_duration(full, 1, 0), Duration::ZERO);
    }

    #[test]
    fn positive_secs_filters_invalid() {
        assert_eq!(positive_secs(1.5), Some(Duration::from_millis(1500)));
        assert_eq!(positive_secs(0.0), None);
        assert_eq!(positive_secs(-1.0), None);
        assert_eq!(positive_secs(f64::NAN), None);
    }
}
