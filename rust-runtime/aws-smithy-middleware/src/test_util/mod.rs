/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */

//! Connectors, time sources and middleware for testing.

mod capture_request;
mod capture_test_logs;
mod infallible;
mod never;
mod time;

pub use capture_request::{capture_request, CaptureRequestHandler, CaptureRequestReceiver};
pub use capture_test_logs::{capture_test_logs, LogCaptureGuard, Rx};
pub use infallible::{infallible_connection_fn, InfallibleConnectorFn};
pub use never::NeverConnector;
pub use time::ManualTimeSource;

use crate::context::Context;
use crate::step::{Handled, Middleware, Next, Step};
use futures_util::future::BoxFuture;

/// Middleware that hands its input to the rest of the step unchanged.
///
/// Useful to occupy an id when testing how middleware is ordered.
#[derive(Debug)]
pub struct PassThrough(pub &'static str);

impl<S: Step> Middleware<S> for PassThrough {
    fn id(&self) -> &'static str {
        self.0
    }

    fn handle<'a>(
        &'a self,
        ctx: Context,
        input: S::Input,
        next: Next<'a, S>,
    ) -> BoxFuture<'a, Handled<S::Output>> {
        next.handle(ctx, input)
    }
}
