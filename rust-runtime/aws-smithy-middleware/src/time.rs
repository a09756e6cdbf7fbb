/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */

//! Time source abstraction to support testing

use std::fmt::Debug;
use std::sync::Arc;
use std::time::{Duration, SystemTime};

/// Trait with a `now()` function returning the current time
pub trait TimeSource: Debug + Send + Sync {
    /// Returns the current time.
    fn now(&self) -> SystemTime;

    /// Returns the time elapsed since `earlier`.
    ///
    /// If `earlier` is in the future (the clock went backwards), this returns a zero duration.
    fn elapsed_since(&self, earlier: SystemTime) -> Duration {
        self.now()
            .duration_since(earlier)
            .unwrap_or(Duration::ZERO)
    }
}

/// Time source delegating to `SystemTime::now()`
#[non_exhaustive]
#[derive(Debug, Default)]
pub struct SystemTimeSource;

impl SystemTimeSource {
    /// Creates a new SystemTimeSource
    pub fn new() -> Self {
        SystemTimeSource
    }
}

impl TimeSource for SystemTimeSource {
    fn now(&self) -> SystemTime {
        SystemTime::now()
    }
}

/// Time source that always returns the same time
#[derive(Debug)]
pub struct StaticTimeSource {
    time: SystemTime,
}

impl StaticTimeSource {
    /// Creates a new static time source that always returns the same time
    pub fn new(time: SystemTime) -> Self {
        Self { time }
    }
}

impl TimeSource for StaticTimeSource {
    fn now(&self) -> SystemTime {
        self.time
    }
}

/// Shared, reference-counted [`TimeSource`].
#[derive(Clone, Debug)]
pub struct SharedTimeSource(Arc<dyn TimeSource>);

impl SharedTimeSource {
    /// Wraps `time_source` so it can be shared.
    pub fn new(time_source: impl TimeSource + 'static) -> Self {
        Self(Arc::new(time_source))
    }
}

impl Default for SharedTimeSource {
    fn default() -> Self {
        Self::new(SystemTimeSource::new())
    }
}

impl TimeSource for SharedTimeSource {
    fn now(&self) -> SystemTime {
        self.0.now()
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use std::time::UNIX_EPOCH;

    #[test]
    fn elapsed_never_goes_negative() {
        let time = SharedTimeSource::new(StaticTimeSource::new(UNIX_EPOCH));
        assert_eq!(
            Duration::ZERO,
            time.elapsed_since(UNIX_EPOCH + Duration::from_secs(5))
        );
        assert_eq!(
            Duration::from_secs(5),
            time.elapsed_since(UNIX_EPOCH - Duration::from_secs(5))
        );
    }
}
