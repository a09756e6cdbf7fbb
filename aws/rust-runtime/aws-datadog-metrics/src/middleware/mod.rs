/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */

use crate::client::{RecordTiming, SharedTimingClient};
use crate::config::MetricsConfig;
use crate::throttle::LogThrottle;
use aws_smithy_middleware::config::{apply_api_options, ApiOption, Config};
use aws_smithy_middleware::stack::{Stack, StackError};
use aws_smithy_middleware::step::Position;
use std::sync::Arc;

mod record;
mod start;
mod wire;

use record::RecordTimingMiddleware;
use start::CallStartMiddleware;
use wire::WireDetailsMiddleware;

/// Id of the middleware stamping the call start time.
pub const CALL_START_MIDDLEWARE_ID: &str = "InitMetricsMiddleware";

/// Id of the middleware reporting the call duration.
pub const RECORD_TIMING_MIDDLEWARE_ID: &str = "StartMetricsMiddleware";

/// Id of the middleware capturing the HTTP method, `User-Agent` and status code.
pub const WIRE_DETAILS_MIDDLEWARE_ID: &str = "DeserializeTraceMiddleware";

const API_OPTION_NAME: &str = "DatadogMetrics";

/// The Datadog timing middleware, ready to be registered on a [`Config`].
#[derive(Clone, Debug)]
pub struct DatadogMiddleware {
    client: SharedTimingClient,
    config: Arc<MetricsConfig>,
    throttle: Arc<LogThrottle>,
}

impl DatadogMiddleware {
    /// Creates middleware reporting to `client` with the default [`MetricsConfig`].
    pub fn new(client: impl RecordTiming + 'static) -> Self {
        Self::from_parts(SharedTimingClient::new(client), MetricsConfig::default())
    }

    /// Replaces the [`MetricsConfig`].
    pub fn with_config(self, config: MetricsConfig) -> Self {
        Self::from_parts(self.client, config)
    }

    fn from_parts(client: SharedTimingClient, config: MetricsConfig) -> Self {
        Self {
            throttle: Arc::new(LogThrottle::new(config.error_log_interval())),
            config: Arc::new(config),
            client,
        }
    }

    /// Returns the [`ApiOption`] registering the middleware on a [`Stack`].
    ///
    /// Prefer [`register`](Self::register), which checks that the middleware can be registered.
    pub fn api_option(&self) -> ApiOption {
        let this = self.clone();
        ApiOption::new(API_OPTION_NAME, move |stack| this.add_to(stack))
    }

    /// Registers the middleware on `config`.
    ///
    /// The registration is tried against a stack built from `config` first, so that an error
    /// (e.g. the middleware being registered twice) is returned here rather than failing every
    /// call made with `config`. `config` is left untouched on error.
    pub fn register(self, config: &mut Config) -> Result<(), StackError> {
        let option = self.api_option();
        let mut probe = Stack::new();
        apply_api_options(&mut probe, config.api_options())?;
        option.apply(&mut probe)?;
        tracing::debug!(stack = %probe, "registered Datadog metrics middleware");
        config.push_api_option(option);
        Ok(())
    }

    fn add_to(&self, stack: &mut Stack) -> Result<(), StackError> {
        stack
            .initialize
            .add(CallStartMiddleware, Position::Before)?;
        stack.initialize.add(
            RecordTimingMiddleware::new(
                self.client.clone(),
                self.config.clone(),
                self.throttle.clone(),
            ),
            Position::After,
        )?;
        stack
            .deserialize
            .add(WireDetailsMiddleware, Position::Before)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::test_util::CapturingTimingClient;
    use aws_smithy_middleware::stack::StackErrorKind;

    #[test]
    fn middleware_lands_in_the_right_steps() {
        let mut config = Config::builder().build();
        DatadogMiddleware::new(CapturingTimingClient::new())
            .register(&mut config)
            .unwrap();
        let stack = config.build_stack().unwrap();
        assert_eq!(
            vec![CALL_START_MIDDLEWARE_ID, RECORD_TIMING_MIDDLEWARE_ID],
            stack.initialize.ids()
        );
        assert!(stack.serialize.is_empty());
        assert_eq!(vec![WIRE_DETAILS_MIDDLEWARE_ID], stack.deserialize.ids());
    }

    #[test]
    fn registering_twice_fails_and_leaves_the_config_alone() {
        let mut config = Config::builder().build();
        let middleware = DatadogMiddleware::new(CapturingTimingClient::new());
        middleware.clone().register(&mut config).unwrap();
        let err = middleware
            .register(&mut config)
            .expect_err("already registered");
        assert_eq!(
            &StackErrorKind::DuplicateId {
                step: "Initialize",
                id: CALL_START_MIDDLEWARE_ID
            },
            err.kind()
        );
        assert_eq!(1, config.api_options().len());
        assert!(config.build_stack().is_ok());
    }
}
