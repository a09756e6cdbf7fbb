/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */

use std::borrow::Cow;
use std::time::Duration;

const DEFAULT_METRIC_PREFIX: &str = "aws";
const DEFAULT_SAMPLE_RATE: f64 = 1.0;
const DEFAULT_ERROR_LOG_INTERVAL: Duration = Duration::from_secs(60);

/// Controls what the Datadog middleware reports.
#[derive(Clone, Debug)]
pub struct MetricsConfig {
    metric_prefix: Cow<'static, str>,
    sample_rate: f64,
    emit_on_cancel: bool,
    tags: Vec<String>,
    tag_http_method: bool,
    error_log_interval: Duration,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Builder::default().build()
    }
}

impl MetricsConfig {
    /// Returns a builder for `MetricsConfig`.
    pub fn builder() -> Builder {
        Builder::default()
    }

    /// Prefix of every metric name.
    pub fn metric_prefix(&self) -> &str {
        &self.metric_prefix
    }

    /// Sample rate reported with every timing, between 0 and 1.
    pub fn sample_rate(&self) -> f64 {
        self.sample_rate
    }

    /// Whether a timing is reported for calls that are dropped before completing.
    pub fn emit_on_cancel(&self) -> bool {
        self.emit_on_cancel
    }

    /// Tags added to every timing, after the built-in ones.
    pub fn tags(&self) -> &[String] {
        &self.tags
    }

    /// Whether timings are tagged with the HTTP method of the request.
    pub fn tag_http_method(&self) -> bool {
        self.tag_http_method
    }

    /// Minimum time between two warnings about timings that couldn't be reported.
    pub fn error_log_interval(&self) -> Duration {
        self.error_log_interval
    }
}

/// Builder for [`MetricsConfig`].
#[derive(Clone, Debug, Default)]
pub struct Builder {
    metric_prefix: Option<Cow<'static, str>>,
    sample_rate: Option<f64>,
    emit_on_cancel: Option<bool>,
    tags: Vec<String>,
    tag_http_method: Option<bool>,
    error_log_interval: Option<Duration>,
}

impl Builder {
    /// Sets the prefix of every metric name. Defaults to `aws`, giving names like
    /// `aws.S3.GetObject`.
    pub fn metric_prefix(mut self, prefix: impl Into<Cow<'static, str>>) -> Self {
        self.set_metric_prefix(Some(prefix.into()));
        self
    }

    /// Sets the prefix of every metric name. Defaults to `aws`.
    pub fn set_metric_prefix(&mut self, prefix: Option<Cow<'static, str>>) -> &mut Self {
        self.metric_prefix = prefix;
        self
    }

    /// Sets the sample rate reported with every timing. Defaults to 1.
    ///
    /// Values outside `0..=1` are clamped.
    pub fn sample_rate(mut self, sample_rate: f64) -> Self {
        self.set_sample_rate(Some(sample_rate));
        self
    }

    /// Sets the sample rate reported with every timing. Defaults to 1.
    pub fn set_sample_rate(&mut self, sample_rate: Option<f64>) -> &mut Self {
        self.sample_rate = sample_rate;
        self
    }

    /// Sets whether a timing tagged `status_code:cancelled` is reported for calls that are
    /// dropped before completing, e.g. because of a timeout. Defaults to `false`.
    ///
    /// Calls that panic are never reported.
    pub fn emit_on_cancel(mut self, emit_on_cancel: bool) -> Self {
        self.set_emit_on_cancel(Some(emit_on_cancel));
        self
    }

    /// Sets whether a timing is reported for calls that are dropped before completing.
    pub fn set_emit_on_cancel(&mut self, emit_on_cancel: Option<bool>) -> &mut Self {
        self.emit_on_cancel = emit_on_cancel;
        self
    }

    /// Adds a `key:value` tag to every timing.
    pub fn tag(mut self, key: impl AsRef<str>, value: impl AsRef<str>) -> Self {
        self.tags
            .push(format!("{}:{}", key.as_ref(), value.as_ref()));
        self
    }

    /// Sets the tags added to every timing, replacing any added so far.
    pub fn set_tags(&mut self, tags: Vec<String>) -> &mut Self {
        self.tags = tags;
        self
    }

    /// Sets whether timings are tagged `http_method:<METHOD>`. Defaults to `false`.
    pub fn tag_http_method(mut self, tag_http_method: bool) -> Self {
        self.set_tag_http_method(Some(tag_http_method));
        self
    }

    /// Sets whether timings are tagged `http_method:<METHOD>`. Defaults to `false`.
    pub fn set_tag_http_method(&mut self, tag_http_method: Option<bool>) -> &mut Self {
        self.tag_http_method = tag_http_method;
        self
    }

    /// Sets the minimum time between two warnings about timings that couldn't be reported.
    /// Defaults to 60 seconds.
    pub fn error_log_interval(mut self, interval: Duration) -> Self {
        self.set_error_log_interval(Some(interval));
        self
    }

    /// Sets the minimum time between two warnings about timings that couldn't be reported.
    pub fn set_error_log_interval(&mut self, interval: Option<Duration>) -> &mut Self {
        self.error_log_interval = interval;
        self
    }

    /// Builds the [`MetricsConfig`].
    pub fn build(self) -> MetricsConfig {
        let sample_rate = self.sample_rate.unwrap_or(DEFAULT_SAMPLE_RATE);
        MetricsConfig {
            metric_prefix: self
                .metric_prefix
                .unwrap_or(Cow::Borrowed(DEFAULT_METRIC_PREFIX)),
            // NaN becomes 0 instead of propagating
            sample_rate: if sample_rate.is_nan() {
                0.0
            } else {
                sample_rate.clamp(0.0, 1.0)
            },
            emit_on_cancel: self.emit_on_cancel.unwrap_or(false),
            tags: self.tags,
            tag_http_method: self.tag_http_method.unwrap_or(false),
            error_log_interval: self
                .error_log_interval
                .unwrap_or(DEFAULT_ERROR_LOG_INTERVAL),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn defaults() {
        let config = MetricsConfig::default();
        assert_eq!("aws", config.metric_prefix());
        assert_eq!(1.0, config.sample_rate());
        assert!(!config.emit_on_cancel());
        assert!(config.tags().is_empty());
        assert!(!config.tag_http_method());
        assert_eq!(Duration::from_secs(60), config.error_log_interval());
    }

    #[test]
    fn sample_rate_is_clamped() {
        assert_eq!(1.0, MetricsConfig::builder().sample_rate(3.0).build().sample_rate());
        assert_eq!(0.0, MetricsConfig::builder().sample_rate(-1.0).build().sample_rate());
        assert_eq!(
            0.0,
            MetricsConfig::builder().sample_rate(f64::NAN).build().sample_rate()
        );
        assert_eq!(0.25, MetricsConfig::builder().sample_rate(0.25).build().sample_rate());
    }

    #[test]
    fn tags_keep_their_order() {
        let config = MetricsConfig::builder()
            .tag("env", "prod")
            .tag("team", "storage")
            .build();
        assert_eq!(["env:prod", "team:storage"], config.tags());
    }
}
