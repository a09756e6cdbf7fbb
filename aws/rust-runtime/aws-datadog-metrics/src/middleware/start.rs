/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */

use super::CALL_START_MIDDLEWARE_ID;
use crate::observation::CallStart;
use aws_smithy_middleware::context::Context;
use aws_smithy_middleware::step::{self, Handled, Initialize, Middleware, Next};
use aws_smithy_middleware::time::{SharedTimeSource, TimeSource};
use futures_util::future::BoxFuture;

/// Stamps [`CallStart`] onto the context. Registered first so that the timing covers every
/// other middleware.
#[derive(Debug)]
pub(super) struct CallStartMiddleware;

impl Middleware<Initialize> for CallStartMiddleware {
    fn id(&self) -> &'static str {
        CALL_START_MIDDLEWARE_ID
    }

    fn handle<'a>(
        &'a self,
        ctx: Context,
        input: step::Input,
        next: Next<'a, Initialize>,
    ) -> BoxFuture<'a, Handled<step::Output>> {
        let now = match ctx.get::<SharedTimeSource>() {
            Some(time_source) => time_source.now(),
            None => SharedTimeSource::default().now(),
        };
        next.handle(ctx.with(CallStart(now)), input)
    }
}
