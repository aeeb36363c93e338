//! Time functions.
//!
//! Pure conversions behind `gettimeofday`. The clock read itself
//! (`clock_gettime(CLOCK_REALTIME)`) happens in the ABI crate; this module
//! turns a clock reading into a `struct timeval` value.

use std::time::{SystemTime, UNIX_EPOCH};

/// Microseconds per second.
pub const USEC_PER_SEC: i64 = 1_000_000;
/// Nanoseconds per microsecond.
pub const NSEC_PER_USEC: i64 = 1_000;

/// Seconds + microseconds since the Unix epoch (like `struct timeval`).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord)]
pub struct Timeval {
    /// Seconds.
    pub tv_sec: i64,
    /// Microseconds (0 to 999_999 once normalized).
    pub tv_usec: i64,
}

/// Obsolete timezone record (like `struct timezone`).
///
/// `gettimeofday` never reports a timezone: when the caller asks for one it
/// gets the zero value.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Timezone {
    /// Minutes west of Greenwich.
    pub tz_minuteswest: i32,
    /// Type of DST correction.
    pub tz_dsttime: i32,
}

impl Timeval {
    /// Build from a `timespec` reading. Nanoseconds are truncated to
    /// microseconds.
    #[must_use]
    pub fn from_timespec(tv_sec: i64, tv_nsec: i64) -> Self {
        Self {
            tv_sec,
            tv_usec: tv_nsec / NSEC_PER_USEC,
        }
        .normalize()
    }

    /// Build from a seconds + milliseconds reading (the resolution `ftime`
    /// style clocks offer).
    #[must_use]
    pub fn from_millis(tv_sec: i64, millis: u16) -> Self {
        Self {
            tv_sec,
            tv_usec: i64::from(millis) * 1_000,
        }
        .normalize()
    }

    /// Build from a `SystemTime`. Times before the epoch come out with a
    /// negative `tv_sec` and a non-negative `tv_usec`.
    #[must_use]
    pub fn from_system_time(t: SystemTime) -> Self {
        match t.duration_since(UNIX_EPOCH) {
            Ok(d) => Self {
                tv_sec: d.as_secs() as i64,
                tv_usec: i64::from(d.subsec_micros()),
            },
            Err(e) => {
                let d = e.duration();
                Self {
                    tv_sec: -(d.as_secs() as i64),
                    tv_usec: -i64::from(d.subsec_micros()),
                }
                .normalize()
            }
        }
    }

    /// Current wall-clock time.
    #[must_use]
    pub fn now() -> Self {
        Self::from_system_time(SystemTime::now())
    }

    /// Carry out-of-range microseconds into seconds so that
    /// `0 <= tv_usec < 1_000_000`.
    #[must_use]
    pub fn normalize(self) -> Self {
        let carry = self.tv_usec.div_euclid(USEC_PER_SEC);
        Self {
            tv_sec: self.tv_sec + carry,
            tv_usec: self.tv_usec.rem_euclid(USEC_PER_SEC),
        }
    }

    /// Total microseconds since the epoch.
    #[must_use]
    pub fn as_micros(self) -> i128 {
        i128::from(self.tv_sec) * i128::from(USEC_PER_SEC) + i128::from(self.tv_usec)
    }

    /// Returns true if `tv_usec` is in range.
    #[must_use]
    pub fn is_normalized(self) -> bool {
        (0..USEC_PER_SEC).contains(&self.tv_usec)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn from_timespec_truncates_nanos() {
        let tv = Timeval::from_timespec(1_700_000_000, 123_456_789);
        assert_eq!(tv.tv_sec, 1_700_000_000);
        assert_eq!(tv.tv_usec, 123_456);
    }

    #[test]
    fn from_timespec_carries_overflowing_nanos() {
        let tv = Timeval::from_timespec(10, 1_500_000_000);
        assert_eq!(tv, Timeval { tv_sec: 11, tv_usec: 500_000 });
    }

    #[test]
    fn from_millis_scales_to_micros() {
        let tv = Timeval::from_millis(42, 999);
        assert_eq!(tv, Timeval { tv_sec: 42, tv_usec: 999_000 });
    }

    #[test]
    fn from_system_time_after_epoch() {
        let t = UNIX_EPOCH + Duration::new(86_400, 250_000_000);
        assert_eq!(
            Timeval::from_system_time(t),
            Timeval { tv_sec: 86_400, tv_usec: 250_000 }
        );
    }

    #[test]
    fn from_system_time_before_epoch() {
        let t = UNIX_EPOCH - Duration::new(1, 250_000_000);
        let tv = Timeval::from_system_time(t);
        assert_eq!(tv, Timeval { tv_sec: -2, tv_usec: 750_000 });
        assert_eq!(tv.as_micros(), -1_250_000);
    }

    #[test]
    fn normalize_handles_negative_micros() {
        let tv = Timeval { tv_sec: 5, tv_usec: -1 }.normalize();
        assert_eq!(tv, Timeval { tv_sec: 4, tv_usec: 999_999 });
        assert!(tv.is_normalized());
    }

    #[test]
    fn now_is_normalized_and_after_2020() {
        let tv = Timeval::now();
        assert!(tv.is_normalized());
        assert!(tv.tv_sec > 1_577_836_800);
    }

    #[test]
    fn timezone_defaults_to_zero() {
        let tz = Timezone::default();
        assert_eq!(tz.tz_minuteswest, 0);
        assert_eq!(tz.tz_dsttime, 0);
    }
}
