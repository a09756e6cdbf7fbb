/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */

//! The seam between the middleware stack and an HTTP library.
//!
//! An [`HttpConnector`] takes an [`HttpRequest`] and returns a future with its response. It is
//! the terminal of the [`Deserialize`](crate::step::Deserialize) step. Fake connectors for
//! tests live in [`test_util`](crate::test_util) behind the `test-util` feature.

use crate::error::ConnectorError;
use crate::{HttpRequest, HttpResponse};
use futures_util::future::{self, BoxFuture, FutureExt};
use std::fmt;
use std::future::Future;
use std::sync::Arc;

/// Future for [`HttpConnector::call`].
pub type HttpConnectorFuture = BoxFuture<'static, Result<HttpResponse, ConnectorError>>;

/// Returns an [`HttpConnectorFuture`] that is immediately ready with `result`.
pub fn ready(result: Result<HttpResponse, ConnectorError>) -> HttpConnectorFuture {
    future::ready(result).boxed()
}

/// Boxes `future` into an [`HttpConnectorFuture`].
pub fn boxed(
    future: impl Future<Output = Result<HttpResponse, ConnectorError>> + Send + 'static,
) -> HttpConnectorFuture {
    future.boxed()
}

/// Trait with a `call` function that asynchronously converts a request into a response.
pub trait HttpConnector: Send + Sync + fmt::Debug {
    /// Asynchronously converts a request into a response.
    fn call(&self, request: HttpRequest) -> HttpConnectorFuture;
}

/// A shared [`HttpConnector`] implementation.
#[derive(Clone, Debug)]
pub struct SharedHttpConnector(Arc<dyn HttpConnector>);

impl SharedHttpConnector {
    /// Returns a new [`SharedHttpConnector`].
    pub fn new(connector: impl HttpConnector + 'static) -> Self {
        Self(Arc::new(connector))
    }
}

impl HttpConnector for SharedHttpConnector {
    fn call(&self, request: HttpRequest) -> HttpConnectorFuture {
        (*self.0).call(request)
    }
}

/// Connector used when none was configured. Every request fails with a user error.
#[derive(Debug, Default)]
pub(crate) struct MissingConnector;

impl HttpConnector for MissingConnector {
    fn call(&self, _request: HttpRequest) -> HttpConnectorFuture {
        ready(Err(ConnectorError::user(
            "no HTTP connector was configured. Set one with `Config::builder().http_connector(..)`",
        )))
    }
}
