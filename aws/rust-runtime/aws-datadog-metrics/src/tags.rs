/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */

use crate::config::MetricsConfig;
use aws_smithy_middleware::operation::Metadata;
use aws_smithy_middleware::region::Region;
use std::fmt;

const TAG_AWS_REGION: &str = "aws_region";
const TAG_STATUS_CODE: &str = "status_code";
const TAG_HTTP_METHOD: &str = "http_method";
const UNKNOWN: &str = "unknown";

/// `<prefix>.<service>.<operation>`
pub(crate) fn metric_name(prefix: &str, operation: Option<&Metadata>) -> String {
    let (service, name) = operation
        .map(|operation| (operation.service(), operation.name()))
        .unwrap_or((UNKNOWN, UNKNOWN));
    if prefix.is_empty() {
        format!("{service}.{name}")
    } else {
        format!("{prefix}.{service}.{name}")
    }
}

/// What the `status_code` tag says about the call.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Status {
    Code(http::StatusCode),
    Unknown,
    Cancelled,
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Status::Code(code) => write!(f, "{}", code.as_u16()),
            Status::Unknown => f.write_str(UNKNOWN),
            Status::Cancelled => f.write_str("cancelled"),
        }
    }
}

pub(crate) fn build_tags(
    config: &MetricsConfig,
    region: Option<&Region>,
    status: Status,
    method: Option<&http::Method>,
) -> Vec<String> {
    let mut tags = Vec::with_capacity(3 + config.tags().len());
    tags.push(format!(
        "{TAG_AWS_REGION}:{}",
        region.map_or(UNKNOWN, |region| region.as_ref())
    ));
    tags.push(format!("{TAG_STATUS_CODE}:{status}"));
    if config.tag_http_method() {
        if let Some(method) = method {
            tags.push(format!("{TAG_HTTP_METHOD}:{method}"));
        }
    }
    tags.extend(config.tags().iter().cloned());
    tags
}
