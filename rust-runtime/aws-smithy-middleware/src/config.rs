/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */

//! Client configuration.

use crate::connector::{HttpConnector, MissingConnector, SharedHttpConnector};
use crate::region::Region;
use crate::stack::{Stack, StackError};
use crate::time::{SharedTimeSource, TimeSource};
use std::fmt;
use std::sync::Arc;

/// A modification applied to the [`Stack`] of every operation invoked with a [`Config`].
///
/// Options are applied in the order they were added, to a fresh stack on every invocation.
#[derive(Clone)]
pub struct ApiOption {
    name: &'static str,
    apply: Arc<dyn Fn(&mut Stack) -> Result<(), StackError> + Send + Sync>,
}

impl ApiOption {
    /// Creates a named option from a function modifying the stack.
    pub fn new(
        name: &'static str,
        apply: impl Fn(&mut Stack) -> Result<(), StackError> + Send + Sync + 'static,
    ) -> Self {
        Self {
            name,
            apply: Arc::new(apply),
        }
    }

    /// Name of this option, used in logs.
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Applies this option to `stack`.
    pub fn apply(&self, stack: &mut Stack) -> Result<(), StackError> {
        (self.apply)(stack)
    }
}

impl fmt::Debug for ApiOption {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ApiOption").field(&self.name).finish()
    }
}

/// Configuration for invoking operations.
#[derive(Clone, Debug)]
pub struct Config {
    region: Option<Region>,
    http_connector: SharedHttpConnector,
    time_source: SharedTimeSource,
    api_options: Vec<ApiOption>,
}

impl Config {
    /// Returns a builder for `Config`.
    pub fn builder() -> Builder {
        Builder::default()
    }

    /// Region requests are sent to.
    pub fn region(&self) -> Option<&Region> {
        self.region.as_ref()
    }

    /// Connector requests are dispatched with.
    pub fn http_connector(&self) -> &SharedHttpConnector {
        &self.http_connector
    }

    /// Time source made available to middleware.
    pub fn time_source(&self) -> &SharedTimeSource {
        &self.time_source
    }

    /// Options applied to the stack of every invocation.
    pub fn api_options(&self) -> &[ApiOption] {
        &self.api_options
    }

    /// Adds an option applied to the stack of every subsequent invocation.
    pub fn push_api_option(&mut self, option: ApiOption) {
        self.api_options.push(option);
    }

    /// Builds a new [`Stack`] with every configured option applied.
    pub fn build_stack(&self) -> Result<Stack, StackError> {
        let mut stack = Stack::new();
        apply_api_options(&mut stack, &self.api_options)?;
        Ok(stack)
    }
}

/// Applies `options` to `stack` in order, stopping at the first failure.
pub fn apply_api_options(stack: &mut Stack, options: &[ApiOption]) -> Result<(), StackError> {
    for option in options {
        tracing::trace!(option = option.name(), "applying API option");
        option.apply(stack)?;
    }
    Ok(())
}

/// Builder for [`Config`].
#[derive(Clone, Debug, Default)]
pub struct Builder {
    region: Option<Region>,
    http_connector: Option<SharedHttpConnector>,
    time_source: Option<SharedTimeSource>,
    api_options: Vec<ApiOption>,
}

impl Builder {
    /// Sets the region requests are sent to.
    pub fn region(mut self, region: impl Into<Option<Region>>) -> Self {
        self.set_region(region.into());
        self
    }

    /// Sets the region requests are sent to.
    pub fn set_region(&mut self, region: Option<Region>) -> &mut Self {
        self.region = region;
        self
    }

    /// Sets the connector requests are dispatched with.
    ///
    /// If none is set, every request fails with a dispatch failure.
    pub fn http_connector(mut self, connector: impl HttpConnector + 'static) -> Self {
        self.set_http_connector(Some(SharedHttpConnector::new(connector)));
        self
    }

    /// Sets the connector requests are dispatched with.
    pub fn set_http_connector(&mut self, connector: Option<SharedHttpConnector>) -> &mut Self {
        self.http_connector = connector;
        self
    }

    /// Sets the time source made available to middleware. Defaults to the system clock.
    pub fn time_source(mut self, time_source: impl TimeSource + 'static) -> Self {
        self.set_time_source(Some(SharedTimeSource::new(time_source)));
        self
    }

    /// Sets the time source made available to middleware. Defaults to the system clock.
    pub fn set_time_source(&mut self, time_source: Option<SharedTimeSource>) -> &mut Self {
        self.time_source = time_source;
        self
    }

    /// Adds an option applied to the stack of every invocation.
    pub fn api_option(mut self, option: ApiOption) -> Self {
        self.api_options.push(option);
        self
    }

    /// Builds the [`Config`].
    pub fn build(self) -> Config {
        Config {
            region: self.region,
            http_connector: self
                .http_connector
                .unwrap_or_else(|| SharedHttpConnector::new(MissingConnector)),
            time_source: self.time_source.unwrap_or_default(),
            api_options: self.api_options,
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::stack::StackErrorKind;

    #[test]
    fn options_apply_in_order_and_fail_fast() {
        use crate::step::Position;
        use crate::test_util::PassThrough;

        let config = Config::builder()
            .region(Region::from_static("us-west-2"))
            .api_option(ApiOption::new("first", |stack| {
                stack.initialize.add(PassThrough("a"), Position::After)
            }))
            .api_option(ApiOption::new("second", |stack| {
                stack.initialize.add(PassThrough("b"), Position::Before)
            }))
            .build();
        assert_eq!("us-west-2", config.region().unwrap().as_ref());
        assert_eq!(vec!["b", "a"], config.build_stack().unwrap().initialize.ids());

        let mut config = config;
        config.push_api_option(ApiOption::new("again", |stack| {
            stack.initialize.add(PassThrough("a"), Position::After)
        }));
        let err = config.build_stack().expect_err("`a` is registered twice");
        assert!(matches!(err.kind(), StackErrorKind::DuplicateId { id: "a", .. }));
    }
}
