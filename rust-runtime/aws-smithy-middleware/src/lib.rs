/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */

#![warn(
    missing_docs,
    rustdoc::missing_crate_level_docs,
    unreachable_pub,
    rust_2018_idioms
)]

//! Step-based middleware stack for smithy-rs clients.
//!
//! An operation is executed by flowing its input through an ordered [`Stack`](stack::Stack)
//! of steps:
//!
//! 1. [`Initialize`](step::Initialize): has the operation input.
//! 2. [`Serialize`](step::Serialize): has the operation input. The end of this step serializes
//!    the input into an [`HttpRequest`] and enters the next step.
//! 3. [`Deserialize`](step::Deserialize): has the serialized [`HttpRequest`] on the way out and
//!    the raw [`HttpResponse`] on the way back. The end of this step hands the request to the
//!    configured [`HttpConnector`](connector::HttpConnector).
//!
//! Middleware registered in a step wraps everything that comes after it, so a middleware
//! registered early in the [`Initialize`](step::Initialize) step observes the entire call.
//!
//! Per-request information travels in two directions:
//! - Down the stack in an immutable [`Context`](context::Context). A middleware derives a new
//!   context carrying additional values and hands it to the next middleware.
//! - Up the stack in [`Metadata`](metadata::Metadata), which is returned alongside every
//!   result in [`Handled`](step::Handled).

pub mod config;
pub mod connector;
pub mod context;
pub mod error;
pub mod metadata;
pub mod operation;
pub mod region;
pub mod stack;
pub mod step;
pub mod time;
pub mod type_erasure;

#[cfg(any(test, feature = "test-util"))]
pub mod test_util;

/// The wire representation of a request.
pub type HttpRequest = http::Request<bytes::Bytes>;

/// The wire representation of a response.
pub type HttpResponse = http::Response<bytes::Bytes>;

/// A type-erased, thread-safe error.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;
