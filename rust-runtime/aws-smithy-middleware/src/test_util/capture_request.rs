/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */

use crate::connector::{self, HttpConnector, HttpConnectorFuture};
use crate::{HttpRequest, HttpResponse};
use std::fmt::Debug;
use std::sync::{Arc, Mutex};

/// Test connector capturing every request sent through it
#[derive(Debug, Clone)]
pub struct CaptureRequestHandler(Arc<Inner>);

#[derive(Debug)]
struct Inner {
    response: HttpResponse,
    requests: Mutex<Vec<HttpRequest>>,
}

/// Receiver for [`CaptureRequestHandler`](CaptureRequestHandler)
#[derive(Debug)]
pub struct CaptureRequestReceiver(Arc<Inner>);

impl CaptureRequestReceiver {
    /// Expect that a request was sent. Returns the first captured request.
    ///
    /// # Panics
    /// If no request was received
    #[track_caller]
    pub fn expect_request(self) -> HttpRequest {
        let mut requests = self.0.requests.lock().unwrap();
        assert!(!requests.is_empty(), "no request was received");
        requests.remove(0)
    }

    /// Expect that no request was captured. Panics if a request was received.
    ///
    /// # Panics
    /// If a request was received
    #[track_caller]
    pub fn expect_no_request(self) {
        let requests = self.0.requests.lock().unwrap();
        assert!(
            requests.is_empty(),
            "expected no request to be received! got {requests:?}"
        );
    }
}

/// Test connector used to capture requests
///
/// If response is `None`, it will reply with a 200 response with an empty body
///
/// Example:
/// ```rust
/// use aws_smithy_middleware::config::Config;
/// use aws_smithy_middleware::test_util::capture_request;
///
/// let (connector, request) = capture_request(None);
/// let config = Config::builder().http_connector(connector).build();
/// // ... invoke an operation with `config` ...
/// request.expect_no_request();
/// ```
pub fn capture_request(
    response: Option<HttpResponse>,
) -> (CaptureRequestHandler, CaptureRequestReceiver) {
    let inner = Arc::new(Inner {
        response: response.unwrap_or_else(|| {
            http::Response::builder()
                .status(200)
                .body(bytes::Bytes::new())
                .expect("unreachable")
        }),
        requests: Mutex::new(Vec::new()),
    });
    (
        CaptureRequestHandler(inner.clone()),
        CaptureRequestReceiver(inner),
    )
}

impl HttpConnector for CaptureRequestHandler {
    fn call(&self, request: HttpRequest) -> HttpConnectorFuture {
        self.0.requests.lock().unwrap().push(request);
        let mut response = http::Response::new(self.0.response.body().clone());
        *response.status_mut() = self.0.response.status();
        *response.headers_mut() = self.0.response.headers().clone();
        connector::ready(Ok(response))
    }
}
