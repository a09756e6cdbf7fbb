/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */

//! Errors returned when invoking an operation.

use crate::{BoxError, HttpResponse};
use std::error::Error;
use std::fmt;

#[derive(Debug)]
enum ConnectorErrorKind {
    /// A user-caused error (e.g. invalid HTTP request)
    User,

    /// Socket/IO error
    Io,
}

/// Error from the underlying connector.
///
/// Connector exists to attach a `ConnectorErrorKind` to what would otherwise be an opaque
/// `Box<dyn Error>` that comes off a potentially generic or dynamic connector.
#[derive(Debug)]
pub struct ConnectorError {
    kind: ConnectorErrorKind,
    source: BoxError,
}

impl fmt::Display for ConnectorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            ConnectorErrorKind::User => write!(f, "user error"),
            ConnectorErrorKind::Io => write!(f, "io error"),
        }
    }
}

impl Error for ConnectorError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        Some(self.source.as_ref())
    }
}

impl ConnectorError {
    /// Construct a [`ConnectorError`] from an error caused by the user (e.g. invalid request)
    pub fn user(source: impl Into<BoxError>) -> Self {
        Self {
            kind: ConnectorErrorKind::User,
            source: source.into(),
        }
    }

    /// Construct a [`ConnectorError`] from an IO related error (e.g. socket hangup)
    pub fn io(source: impl Into<BoxError>) -> Self {
        Self {
            kind: ConnectorErrorKind::Io,
            source: source.into(),
        }
    }

    /// Returns true if the error is an IO error
    pub fn is_io(&self) -> bool {
        matches!(self.kind, ConnectorErrorKind::Io)
    }

    /// Returns true if the error is a user-caused error (e.g., invalid HTTP request)
    pub fn is_user(&self) -> bool {
        matches!(self.kind, ConnectorErrorKind::User)
    }
}

/// Failed SDK Result
///
/// `E` is the modeled error of the operation. Inside the middleware stack, where operations
/// are type-erased, it is a [`BoxError`].
#[non_exhaustive]
#[derive(Debug)]
pub enum SdkError<E = BoxError> {
    /// The request failed during construction. It was not dispatched over the network.
    ConstructionFailure(BoxError),

    /// The request failed during dispatch. An HTTP response was not received. The request MAY
    /// have been sent.
    DispatchFailure(ConnectorError),

    /// A response was received but it was not parseable according the protocol (for example
    /// the server hung up while the body was being read)
    ResponseError {
        /// Error encountered while parsing the response
        err: BoxError,
        /// Raw response that was available
        raw: HttpResponse,
    },

    /// An error response was received from the service
    ServiceError {
        /// Modeled service error
        err: E,
        /// Raw response from the service
        raw: HttpResponse,
    },
}

impl<E> SdkError<E> {
    /// Construct a `SdkError` for a construction failure
    pub fn construction_failure(source: impl Into<BoxError>) -> Self {
        Self::ConstructionFailure(source.into())
    }

    /// Construct a `SdkError` for a dispatch failure with a [`ConnectorError`]
    pub fn dispatch_failure(source: ConnectorError) -> Self {
        Self::DispatchFailure(source)
    }

    /// Construct a `SdkError` for a response error
    pub fn response_error(source: impl Into<BoxError>, raw: HttpResponse) -> Self {
        Self::ResponseError {
            err: source.into(),
            raw,
        }
    }

    /// Construct a `SdkError` for a service failure
    pub fn service_error(err: E, raw: HttpResponse) -> Self {
        Self::ServiceError { err, raw }
    }

    /// Returns the raw response, if one was received.
    pub fn raw_response(&self) -> Option<&HttpResponse> {
        match self {
            Self::ResponseError { raw, .. } | Self::ServiceError { raw, .. } => Some(raw),
            Self::ConstructionFailure(_) | Self::DispatchFailure(_) => None,
        }
    }

    /// Returns the modeled service error, if there is one.
    pub fn as_service_error(&self) -> Option<&E> {
        match self {
            Self::ServiceError { err, .. } => Some(err),
            _ => None,
        }
    }

    /// Maps the service error type in `SdkError::ServiceError`
    pub fn map_service_error<E2>(self, map: impl FnOnce(E) -> E2) -> SdkError<E2> {
        match self {
            Self::ConstructionFailure(err) => SdkError::ConstructionFailure(err),
            Self::DispatchFailure(err) => SdkError::DispatchFailure(err),
            Self::ResponseError { err, raw } => SdkError::ResponseError { err, raw },
            Self::ServiceError { err, raw } => SdkError::ServiceError {
                err: map(err),
                raw,
            },
        }
    }
}

impl<E> fmt::Display for SdkError<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SdkError::ConstructionFailure(_) => write!(f, "failed to construct request"),
            SdkError::DispatchFailure(_) => write!(f, "dispatch failure"),
            SdkError::ResponseError { .. } => write!(f, "response error"),
            SdkError::ServiceError { .. } => write!(f, "service error"),
        }
    }
}

impl<E> Error for SdkError<E>
where
    E: Error + 'static,
{
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            SdkError::ConstructionFailure(err) | SdkError::ResponseError { err, .. } => {
                Some(err.as_ref())
            }
            SdkError::DispatchFailure(err) => Some(err),
            SdkError::ServiceError { err, .. } => Some(err),
        }
    }
}

#[cfg(test)]
mod test {
    use super::{ConnectorError, SdkError};
    use crate::BoxError;
    use std::error::Error;

    #[derive(Debug)]
    struct NoSuchKey;
    impl std::fmt::Display for NoSuchKey {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            write!(f, "no such key")
        }
    }
    impl Error for NoSuchKey {}

    #[test]
    fn map_service_error_keeps_the_raw_response() {
        let raw = http::Response::builder()
            .status(404)
            .body(bytes::Bytes::new())
            .unwrap();
        let err: SdkError<BoxError> = SdkError::service_error(Box::new(NoSuchKey) as BoxError, raw);
        let err: SdkError<NoSuchKey> =
            err.map_service_error(|err| *err.downcast::<NoSuchKey>().expect("it's a NoSuchKey"));
        assert_eq!(404, err.raw_response().unwrap().status().as_u16());
        assert_eq!(
            "no such key",
            err.source().expect("has a source").to_string()
        );
    }

    #[test]
    fn dispatch_failures_have_no_response() {
        let err: SdkError<NoSuchKey> = SdkError::dispatch_failure(ConnectorError::io("hangup"));
        assert!(err.raw_response().is_none());
        assert!(err.as_service_error().is_none());
        assert_eq!("dispatch failure", err.to_string());
        match err {
            SdkError::DispatchFailure(err) => assert!(err.is_io()),
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
