/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */

use crate::connector::{self, HttpConnector, HttpConnectorFuture};
use crate::{HttpRequest, HttpResponse};
use std::fmt;
use std::sync::Arc;

/// Create a connector from `Fn(HttpRequest) -> HttpResponse`
///
/// # Examples
///
/// ```rust
/// use aws_smithy_middleware::test_util::infallible_connection_fn;
/// let connector = infallible_connection_fn(|_req| {
///     http::Response::builder().status(200).body(bytes::Bytes::from("OK!")).unwrap()
/// });
/// ```
pub fn infallible_connection_fn(
    f: impl Fn(HttpRequest) -> HttpResponse + Send + Sync + 'static,
) -> InfallibleConnectorFn {
    InfallibleConnectorFn {
        response: Arc::new(f),
    }
}

/// Connector returned by [`infallible_connection_fn`].
#[derive(Clone)]
pub struct InfallibleConnectorFn {
    response: Arc<dyn Fn(HttpRequest) -> HttpResponse + Send + Sync>,
}

impl fmt::Debug for InfallibleConnectorFn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InfallibleConnectorFn").finish()
    }
}

impl HttpConnector for InfallibleConnectorFn {
    fn call(&self, request: HttpRequest) -> HttpConnectorFuture {
        connector::ready(Ok((self.response)(request)))
    }
}
