/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */

/// A value needed to report a timing was not available.
///
/// This never fails the call. The timing is reported with a placeholder instead, and this
/// error is logged at `DEBUG`.
#[non_exhaustive]
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MissingMetricContext {
    /// The call start time was not found in the request context.
    #[error("the call start time is missing from the request context (is `InitMetricsMiddleware` registered?)")]
    CallStart,

    /// The service and operation names were not found in the request context.
    #[error("the operation metadata is missing from the request context")]
    Operation,

    /// No region was configured.
    #[error("no region is set in the request context")]
    Region,

    /// No response status was observed, e.g. because the request failed to dispatch.
    #[error("no response status code was observed")]
    StatusCode,
}
