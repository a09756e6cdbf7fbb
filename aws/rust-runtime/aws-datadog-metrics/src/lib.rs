/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */

#![warn(
    missing_docs,
    rustdoc::missing_crate_level_docs,
    unreachable_pub,
    rust_2018_idioms
)]

//! Reports the duration of every AWS SDK call to [DogStatsD](https://docs.datadoghq.com/developers/dogstatsd/).
//!
//! [`add_datadog_middleware`] registers three middleware on a client [`Config`]:
//!
//! | Id | Step | Does |
//! |----|------|------|
//! | `InitMetricsMiddleware` | `Initialize`, `Before` | Stamps the call start time onto the request context. |
//! | `StartMetricsMiddleware` | `Initialize`, `After` | Once the call completes, reports a timing named `aws.<service>.<operation>`. |
//! | `DeserializeTraceMiddleware` | `Deserialize`, `Before` | Captures the HTTP method, the `User-Agent` and the response status code. |
//!
//! Every timing is tagged with `aws_region:<region>` and `status_code:<code>`. Calls that never
//! received a response (e.g. a connection failure) are tagged `status_code:unknown`.
//!
//! ```no_run
//! use aws_datadog_metrics::{add_datadog_middleware, CadenceClient};
//! use aws_smithy_middleware::config::Config;
//! use aws_smithy_middleware::region::Region;
//! use cadence::{StatsdClient, UdpMetricSink};
//! use std::net::UdpSocket;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let socket = UdpSocket::bind("0.0.0.0:0")?;
//! let sink = UdpMetricSink::from("127.0.0.1:8125", socket)?;
//! let statsd = StatsdClient::from_sink("", sink);
//!
//! let mut config = Config::builder()
//!     .region(Region::from_static("us-east-1"))
//!     .build();
//! add_datadog_middleware(&mut config, CadenceClient::new(statsd))?;
//! # Ok(())
//! # }
//! ```
//!
//! [`DatadogMiddleware`] registers the same middleware with a custom [`MetricsConfig`].

use aws_smithy_middleware::config::Config;
use aws_smithy_middleware::stack::StackError;

mod client;
mod config;
mod error;
mod middleware;
mod observation;
mod tags;
mod throttle;

#[cfg(any(test, feature = "test-util"))]
pub mod test_util;

pub use client::{CadenceClient, RecordTiming, SharedTimingClient};
pub use config::{Builder as MetricsConfigBuilder, MetricsConfig};
pub use error::MissingMetricContext;
pub use middleware::{
    DatadogMiddleware, CALL_START_MIDDLEWARE_ID, RECORD_TIMING_MIDDLEWARE_ID,
    WIRE_DETAILS_MIDDLEWARE_ID,
};
pub use observation::{CallStart, OutboundMethod, ResponseStatus, UserAgent};

/// Registers the Datadog timing middleware on `config`, reporting to `client`.
///
/// Fails if the middleware can't be registered, e.g. because it is already registered on
/// `config`. Nothing is reported for calls made with a config this failed on.
pub fn add_datadog_middleware(
    config: &mut Config,
    client: impl RecordTiming + 'static,
) -> Result<(), StackError> {
    DatadogMiddleware::new(client).register(config)
}
