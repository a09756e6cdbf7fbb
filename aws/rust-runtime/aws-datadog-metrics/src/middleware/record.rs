/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */

use super::RECORD_TIMING_MIDDLEWARE_ID;
use crate::client::{RecordTiming, SharedTimingClient};
use crate::config::MetricsConfig;
use crate::error::MissingMetricContext;
use crate::observation::{CallStart, OutboundMethod, ResponseStatus, UserAgent};
use crate::tags::{build_tags, metric_name, Status};
use crate::throttle::LogThrottle;
use aws_smithy_middleware::context::Context;
use aws_smithy_middleware::operation;
use aws_smithy_middleware::region::Region;
use aws_smithy_middleware::step::{self, Handled, Initialize, Middleware, Next};
use aws_smithy_middleware::time::{SharedTimeSource, TimeSource};
use futures_util::future::{BoxFuture, FutureExt};
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::SystemTime;

/// Reports how long the rest of the stack took once it returns.
#[derive(Debug)]
pub(super) struct RecordTimingMiddleware {
    client: SharedTimingClient,
    config: Arc<MetricsConfig>,
    throttle: Arc<LogThrottle>,
}

/// Everything known about a call before it is handed to the rest of the stack.
struct PendingSample {
    name: String,
    region: Option<Region>,
    start: SystemTime,
    time_source: SharedTimeSource,
}

impl RecordTimingMiddleware {
    pub(super) fn new(
        client: SharedTimingClient,
        config: Arc<MetricsConfig>,
        throttle: Arc<LogThrottle>,
    ) -> Self {
        Self {
            client,
            config,
            throttle,
        }
    }

    fn pending_sample(&self, ctx: &Context) -> PendingSample {
        let time_source = ctx
            .get::<SharedTimeSource>()
            .cloned()
            .unwrap_or_default();

        let operation = ctx.get::<operation::Metadata>();
        if operation.is_none() {
            missing(MissingMetricContext::Operation);
        }
        let region = ctx.get::<Region>().cloned();
        if region.is_none() {
            missing(MissingMetricContext::Region);
        }
        let start = match ctx.get::<CallStart>() {
            Some(CallStart(start)) => *start,
            None => {
                missing(MissingMetricContext::CallStart);
                time_source.now()
            }
        };

        PendingSample {
            name: metric_name(self.config.metric_prefix(), operation),
            region,
            start,
            time_source,
        }
    }

    fn record(
        &self,
        sample: PendingSample,
        status: Status,
        method: Option<&http::Method>,
        user_agent: Option<&UserAgent>,
    ) {
        let duration = sample.time_source.elapsed_since(sample.start);
        let tags = build_tags(&self.config, sample.region.as_ref(), status, method);
        match self
            .client
            .timing(&sample.name, duration, &tags, self.config.sample_rate())
        {
            Ok(()) => tracing::debug!(
                metric = %sample.name,
                ?duration,
                ?tags,
                user_agent = ?user_agent.map(|user_agent| user_agent.0.as_str()),
                "reported call duration"
            ),
            Err(err) => {
                if let Some(suppressed) = self.throttle.check(sample.time_source.now()) {
                    tracing::warn!(
                        metric = %sample.name,
                        error = %err,
                        suppressed,
                        "failed to report call duration to Datadog"
                    );
                }
            }
        }
    }
}

fn missing(what: MissingMetricContext) {
    tracing::debug!(error = %what, "reporting call duration with a placeholder");
}

/// Reports a `status_code:cancelled` timing if the call is dropped before it completes.
struct CancelGuard<'a> {
    recorder: &'a RecordTimingMiddleware,
    pending: Option<PendingSample>,
}

impl CancelGuard<'_> {
    fn disarm(&mut self) -> Option<PendingSample> {
        self.pending.take()
    }
}

impl Drop for CancelGuard<'_> {
    fn drop(&mut self) {
        if let Some(pending) = self.pending.take() {
            if self.recorder.config.emit_on_cancel() && !std::thread::panicking() {
                tracing::debug!(metric = %pending.name, "call was cancelled");
                self.recorder.record(pending, Status::Cancelled, None, None);
            }
        }
    }
}

impl Middleware<Initialize> for RecordTimingMiddleware {
    fn id(&self) -> &'static str {
        RECORD_TIMING_MIDDLEWARE_ID
    }

    fn handle<'a>(
        &'a self,
        ctx: Context,
        input: step::Input,
        next: Next<'a, Initialize>,
    ) -> BoxFuture<'a, Handled<step::Output>> {
        let mut guard = CancelGuard {
            recorder: self,
            pending: Some(self.pending_sample(&ctx)),
        };
        let inner = AssertUnwindSafe(next.handle(ctx, input)).catch_unwind();
        async move {
            let handled = match inner.await {
                Ok(handled) => handled,
                Err(panic) => {
                    guard.disarm();
                    std::panic::resume_unwind(panic)
                }
            };
            if let Some(pending) = guard.disarm() {
                let status = match handled.metadata.get::<ResponseStatus>() {
                    Some(ResponseStatus(status)) => Status::Code(*status),
                    None => {
                        missing(MissingMetricContext::StatusCode);
                        Status::Unknown
                    }
                };
                self.record(
                    pending,
                    status,
                    handled
                        .metadata
                        .get::<OutboundMethod>()
                        .map(|OutboundMethod(method)| method),
                    handled.metadata.get::<UserAgent>(),
                );
            }
            handled
        }
        .boxed()
    }
}
