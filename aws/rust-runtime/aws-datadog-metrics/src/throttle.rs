/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

const NEVER: u64 = u64::MAX;

/// Lets at most one log through per interval, counting the ones it held back.
#[derive(Debug)]
pub(crate) struct LogThrottle {
    interval: Duration,
    last_logged_ms: AtomicU64,
    suppressed: AtomicU64,
}

impl LogThrottle {
    pub(crate) fn new(interval: Duration) -> Self {
        Self {
            interval,
            last_logged_ms: AtomicU64::new(NEVER),
            suppressed: AtomicU64::new(0),
        }
    }

    /// Returns the number of logs suppressed since the last one if a log may be written at
    /// `now`, `None` otherwise.
    pub(crate) fn check(&self, now: SystemTime) -> Option<u64> {
        let now_ms = now
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_millis() as u64;
        let last = self.last_logged_ms.load(Ordering::Acquire);
        let interval_ms = self.interval.as_millis() as u64;
        if last != NEVER && now_ms.saturating_sub(last) < interval_ms {
            self.suppressed.fetch_add(1, Ordering::Relaxed);
            return None;
        }
        match self.last_logged_ms.compare_exchange(
            last,
            now_ms,
            Ordering::AcqRel,
            Ordering::Acquire,
        ) {
            Ok(_) => Some(self.suppressed.swap(0, Ordering::AcqRel)),
            // someone else logged in the meantime
            Err(_) => {
                self.suppressed.fetch_add(1, Ordering::Relaxed);
                None
            }
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn one_log_per_interval() {
        let throttle = LogThrottle::new(Duration::from_secs(60));
        let start = UNIX_EPOCH + Duration::from_secs(1_000_000);
        assert_eq!(Some(0), throttle.check(start));
        assert_eq!(None, throttle.check(start + Duration::from_secs(1)));
        assert_eq!(None, throttle.check(start + Duration::from_secs(59)));
        assert_eq!(Some(2), throttle.check(start + Duration::from_secs(60)));
        assert_eq!(None, throttle.check(start + Duration::from_secs(61)));
    }

    #[test]
    fn a_zero_interval_never_throttles() {
        let throttle = LogThrottle::new(Duration::ZERO);
        let now = UNIX_EPOCH + Duration::from_secs(5);
        assert_eq!(Some(0), throttle.check(now));
        assert_eq!(Some(0), throttle.check(now));
    }

    #[test]
    fn the_clock_going_backwards_doesnt_unlock() {
        let throttle = LogThrottle::new(Duration::from_secs(60));
        let start = UNIX_EPOCH + Duration::from_secs(1_000);
        assert_eq!(Some(0), throttle.check(start));
        assert_eq!(None, throttle.check(start - Duration::from_secs(500)));
    }
}
