/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */

use super::WIRE_DETAILS_MIDDLEWARE_ID;
use crate::observation::{OutboundMethod, ResponseStatus, UserAgent};
use aws_smithy_middleware::context::Context;
use aws_smithy_middleware::step::{Deserialize, Handled, Middleware, Next};
use aws_smithy_middleware::{HttpRequest, HttpResponse};
use futures_util::future::{BoxFuture, FutureExt};

/// Records the method and `User-Agent` of the request and the status of its response in the
/// returned metadata.
#[derive(Debug)]
pub(super) struct WireDetailsMiddleware;

impl Middleware<Deserialize> for WireDetailsMiddleware {
    fn id(&self) -> &'static str {
        WIRE_DETAILS_MIDDLEWARE_ID
    }

    fn handle<'a>(
        &'a self,
        ctx: Context,
        request: HttpRequest,
        next: Next<'a, Deserialize>,
    ) -> BoxFuture<'a, Handled<HttpResponse>> {
        let method = OutboundMethod(request.method().clone());
        let user_agent = request
            .headers()
            .get(http::header::USER_AGENT)
            .and_then(|value| value.to_str().ok())
            .map(|value| UserAgent(value.to_owned()));
        async move {
            let mut handled = next.handle(ctx, request).await;
            let status = match &handled.result {
                Ok(response) => Some(response.status()),
                Err(err) => err.raw_response().map(|raw| raw.status()),
            };
            handled.metadata.insert(method);
            if let Some(user_agent) = user_agent {
                handled.metadata.insert(user_agent);
            }
            if let Some(status) = status {
                handled.metadata.insert(ResponseStatus(status));
            }
            handled
        }
        .boxed()
    }
}
