/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */

use aws_smithy_middleware::BoxError;
use cadence::prelude::*;
use cadence::StatsdClient;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

/// A client able to report timings to a metrics backend.
///
/// Implementations must be safe to call from many requests at once. The middleware adds no
/// locking around them.
pub trait RecordTiming: Send + Sync + fmt::Debug {
    /// Reports that `name` took `duration`.
    ///
    /// `tags` are `key:value` strings. `sample_rate` is between 0 and 1.
    fn timing(
        &self,
        name: &str,
        duration: Duration,
        tags: &[String],
        sample_rate: f64,
    ) -> Result<(), BoxError>;
}

/// Shared, reference-counted [`RecordTiming`] client.
#[derive(Clone, Debug)]
pub struct SharedTimingClient(Arc<dyn RecordTiming>);

impl SharedTimingClient {
    /// Wraps `client` so it can be shared.
    pub fn new(client: impl RecordTiming + 'static) -> Self {
        Self(Arc::new(client))
    }
}

impl RecordTiming for SharedTimingClient {
    fn timing(
        &self,
        name: &str,
        duration: Duration,
        tags: &[String],
        sample_rate: f64,
    ) -> Result<(), BoxError> {
        self.0.timing(name, duration, tags, sample_rate)
    }
}

/// [`RecordTiming`] client backed by a [`cadence::StatsdClient`].
///
/// Tags are sent as DogStatsD tags. A sample rate below 1 is applied here: only that fraction
/// of timings is forwarded to the sink, each carrying the rate (`|@0.5`) so the agent can scale
/// them back up.
#[derive(Clone)]
pub struct CadenceClient {
    statsd: Arc<StatsdClient>,
}

impl CadenceClient {
    /// Creates a client reporting through `statsd`.
    pub fn new(statsd: StatsdClient) -> Self {
        Self::from_shared(Arc::new(statsd))
    }

    /// Creates a client reporting through a `statsd` client shared with the rest of the
    /// application.
    pub fn from_shared(statsd: Arc<StatsdClient>) -> Self {
        Self { statsd }
    }
}

impl fmt::Debug for CadenceClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CadenceClient").finish_non_exhaustive()
    }
}

impl RecordTiming for CadenceClient {
    fn timing(
        &self,
        name: &str,
        duration: Duration,
        tags: &[String],
        sample_rate: f64,
    ) -> Result<(), BoxError> {
        if sample_rate < 1.0 && fastrand::f64() >= sample_rate {
            return Ok(());
        }
        let mut metric = self.statsd.time_with_tags(name, duration);
        if sample_rate < 1.0 {
            metric = metric.with_sampling_rate(sample_rate);
        }
        for tag in tags {
            metric = match tag.split_once(':') {
                Some((key, value)) => metric.with_tag(key, value),
                None => metric.with_tag_value(tag),
            };
        }
        metric.try_send()?;
        Ok(())
    }
}
