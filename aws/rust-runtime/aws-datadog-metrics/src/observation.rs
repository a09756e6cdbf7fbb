/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */

//! Values the middleware pass to each other.

use std::time::SystemTime;

/// When the call started. Carried down the stack in the request context.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CallStart(pub SystemTime);

/// HTTP method of the dispatched request. Returned up the stack in the response metadata.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OutboundMethod(pub http::Method);

/// `User-Agent` header of the dispatched request. Returned up the stack in the response
/// metadata.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UserAgent(pub String);

/// Status code of the response. Returned up the stack in the response metadata.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ResponseStatus(pub http::StatusCode);
