//! Per-session token bucket rate limiter.
//!
//! Tokens are denominated in bits. Each session constructs one limiter
//! at accept time and both of its read loops draw from it, so the limit
//! applies to the combined traffic of the pipe.

use parking_lot::Mutex;
use std::time::Instant;

/// Token bucket with bit-denominated tokens.
///
/// The bucket starts full. `allow` refills proportionally to the time
/// elapsed since the previous call, capped at the burst capacity, then
/// either deducts the requested amount or refuses without deducting.
///
/// The limiter carries its own lock and must be called outside the
/// session and bridge entry locks.
#[derive(Debug)]
pub struct RateLimiter {
    /// Refill rate in bits per second
    rate: f64,
    /// Burst capacity in bits
    burst: f64,
    state: Mutex<LimiterState>,
}

#[derive(Debug)]
struct LimiterState {
    tokens: f64,
    last: Instant,
}

impl RateLimiter {
    /// Creates a full bucket with the given refill rate and capacity.
    #[must_use]
    pub fn new(rate_bits_per_sec: u64, burst_bits: u64) -> Self {
        #[allow(clippy::cast_precision_loss)]
        let burst = burst_bits as f64;
        #[allow(clippy::cast_precision_loss)]
        let rate = rate_bits_per_sec as f64;
        Self {
            rate,
            burst,
            state: Mutex::new(LimiterState {
                tokens: burst,
                last: Instant::now(),
            }),
        }
    }

    /// Attempts to consume `bits` tokens at time `now`.
    ///
    /// Returns `true` and deducts on success. Returns `false` without
    /// deducting when the bucket does not hold enough tokens; the
    /// refill credited for the elapsed time is kept either way.
    pub fn allow(&self, bits: u64, now: Instant) -> bool {
        let mut state = self.state.lock();
        let elapsed = now.saturating_duration_since(state.last);
        state.tokens = (state.tokens + elapsed.as_secs_f64() * self.rate).min(self.burst);
        state.last = now;

        #[allow(clippy::cast_precision_loss)]
        let requested = bits as f64;
        if state.tokens >= requested {
            state.tokens -= requested;
            true
        } else {
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_starts_full() {
        let limiter = RateLimiter::new(8, 8_000);
        assert!(limiter.allow(8_000, Instant::now()));
    }

    #[test]
    fn test_refuses_over_burst() {
        let limiter = RateLimiter::new(8, 8_000);
        assert!(!limiter.allow(8_001, Instant::now()));
    }

    #[test]
    fn test_refusal_does_not_deduct() {
        let limiter = RateLimiter::new(0, 800);
        let now = Instant::now();
        assert!(!limiter.allow(1_000, now));
        // The full 800 bits must still be available.
        assert!(limiter.allow(800, now));
    }

    #[test]
    fn test_refills_over_time() {
        let limiter = RateLimiter::new(100, 1_000);
        let start = Instant::now();
        assert!(limiter.allow(1_000, start));
        assert!(!limiter.allow(100, start));
        // One second refills 100 bits.
        assert!(limiter.allow(100, start + Duration::from_secs(1)));
    }

    #[test]
    fn test_refill_caps_at_burst() {
        let limiter = RateLimiter::new(1_000_000, 500);
        let start = Instant::now();
        assert!(limiter.allow(500, start));
        // An hour of refill still caps at the 500-bit burst.
        let later = start + Duration::from_secs(3600);
        assert!(limiter.allow(500, later));
        assert!(!limiter.allow(1, later));
    }

    #[test]
    fn test_stale_now_does_not_panic() {
        let limiter = RateLimiter::new(100, 1_000);
        let start = Instant::now();
        assert!(limiter.allow(500, start + Duration::from_secs(1)));
        // A caller observing an earlier instant gets no refill.
        assert!(limiter.allow(500, start));
        assert!(!limiter.allow(1, start));
    }
}
