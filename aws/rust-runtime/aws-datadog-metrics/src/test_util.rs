/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */

//! Timing clients for testing.

use crate::client::RecordTiming;
use aws_smithy_middleware::BoxError;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// A timing reported to a [`CapturingTimingClient`].
#[derive(Clone, Debug, PartialEq)]
pub struct TimingSample {
    /// Metric name.
    pub name: String,
    /// Reported duration.
    pub duration: Duration,
    /// `key:value` tags.
    pub tags: Vec<String>,
    /// Sample rate.
    pub sample_rate: f64,
}

/// Client that keeps every timing reported to it.
///
/// Clones share the captured timings.
#[derive(Clone, Debug, Default)]
pub struct CapturingTimingClient {
    samples: Arc<Mutex<Vec<TimingSample>>>,
}

impl CapturingTimingClient {
    /// Creates a client with nothing captured.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the timings reported so far, oldest first.
    pub fn samples(&self) -> Vec<TimingSample> {
        self.samples.lock().unwrap().clone()
    }

    /// Returns the only timing reported so far.
    ///
    /// # Panics
    /// If not exactly one timing was reported.
    #[track_caller]
    pub fn expect_one(&self) -> TimingSample {
        let samples = self.samples();
        assert_eq!(1, samples.len(), "expected exactly one timing: {samples:#?}");
        samples.into_iter().next().expect("checked above")
    }
}

impl RecordTiming for CapturingTimingClient {
    fn timing(
        &self,
        name: &str,
        duration: Duration,
        tags: &[String],
        sample_rate: f64,
    ) -> Result<(), BoxError> {
        self.samples.lock().unwrap().push(TimingSample {
            name: name.to_owned(),
            duration,
            tags: tags.to_vec(),
            sample_rate,
        });
        Ok(())
    }
}

/// Client failing every timing reported to it.
#[derive(Clone, Debug, Default)]
pub struct FailingTimingClient {
    attempts: Arc<AtomicUsize>,
}

impl FailingTimingClient {
    /// Creates a new failing client.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns how many timings were attempted.
    pub fn attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }
}

impl RecordTiming for FailingTimingClient {
    fn timing(
        &self,
        _name: &str,
        _duration: Duration,
        _tags: &[String],
        _sample_rate: f64,
    ) -> Result<(), BoxError> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        Err("statsd agent is unreachable".into())
    }
}
