//! General time utility functions

use chrono;

/// Number of nanoseconds in a second
pub const NANOS_PER_SECOND: i64 = 1_000_000_000;

/// Convert a duration into a number of seconds, or `None` if overflow
pub fn duration_to_seconds(duration: chrono::Duration) -> Option<f64> {
    duration
        .num_nanoseconds()
        .map(|ns| ns as f64 / NANOS_PER_SECOND as f64)
}

/// Convert a number of control cycles at the given period into elapsed seconds.
///
/// Multiplying the cycle count out avoids the drift of accumulating the period
/// each cycle.
pub fn cycles_to_seconds(num_cycles: u64, period_s: f64) -> f64 {
    num_cycles as f64 * period_s
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_duration_to_seconds() {
        assert_eq!(
            duration_to_seconds(chrono::Duration::milliseconds(1500)),
            Some(1.5)
        );
        assert_eq!(duration_to_seconds(chrono::Duration::max_value()), None);
    }

    #[test]
    fn test_cycles_to_seconds() {
        assert_eq!(cycles_to_seconds(0, 0.02), 0.0);
        assert!((cycles_to_seconds(50, 0.02) - 1.0).abs() < 1e-12);
    }
}
