/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */

use aws_datadog_metrics::test_util::{CapturingTimingClient, FailingTimingClient, TimingSample};
use aws_datadog_metrics::{
    add_datadog_middleware, CadenceClient, DatadogMiddleware, MetricsConfig,
    CALL_START_MIDDLEWARE_ID,
};
use aws_smithy_middleware::config::Config;
use aws_smithy_middleware::connector::{self, HttpConnector, HttpConnectorFuture};
use aws_smithy_middleware::error::{ConnectorError, SdkError};
use aws_smithy_middleware::operation::{DeserializeError, Operation};
use aws_smithy_middleware::region::Region;
use aws_smithy_middleware::stack::StackErrorKind;
use aws_smithy_middleware::test_util::{
    infallible_connection_fn, ManualTimeSource, NeverConnector,
};
use aws_smithy_middleware::{BoxError, HttpRequest, HttpResponse};
use bytes::Bytes;
use futures_util::FutureExt;
use pretty_assertions::assert_eq;
use std::fmt;
use std::sync::Arc;
use std::time::{Duration, UNIX_EPOCH};
use tracing_test::traced_test;

#[derive(Debug)]
struct GetObjectInput {
    key: String,
}

#[derive(Debug)]
struct GetObjectOutput;

#[derive(Debug)]
struct GetObjectError(u16);

impl fmt::Display for GetObjectError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "GetObject failed with status {}", self.0)
    }
}

impl std::error::Error for GetObjectError {}

fn get_object() -> Operation<GetObjectInput, GetObjectOutput, GetObjectError> {
    Operation::builder()
        .service_name("S3")
        .operation_name("GetObject")
        .serializer(|input: GetObjectInput| -> Result<HttpRequest, BoxError> {
            Ok(http::Request::builder()
                .method("GET")
                .uri(format!("https://bucket.s3.amazonaws.com/{}", input.key))
                .body(Bytes::new())?)
        })
        .deserializer(|response: &HttpResponse| {
            if response.status().is_success() {
                Ok(GetObjectOutput)
            } else {
                Err(DeserializeError::Service(GetObjectError(
                    response.status().as_u16(),
                )))
            }
        })
        .build()
        .expect("valid operation")
}

fn input(key: &str) -> GetObjectInput {
    GetObjectInput { key: key.into() }
}

fn response(status: u16) -> HttpResponse {
    http::Response::builder()
        .status(status)
        .body(Bytes::new())
        .unwrap()
}

fn clock() -> ManualTimeSource {
    ManualTimeSource::new(UNIX_EPOCH + Duration::from_secs(1_700_000_000))
}

/// Connector responding with `status` after 50ms have passed on `clock`.
fn respond_after_50ms(clock: &ManualTimeSource, status: u16) -> impl HttpConnector {
    let clock = clock.clone();
    infallible_connection_fn(move |_| {
        clock.advance(Duration::from_millis(50));
        response(status)
    })
}

fn config(clock: &ManualTimeSource, connector: impl HttpConnector + 'static) -> Config {
    Config::builder()
        .region(Region::from_static("us-east-1"))
        .time_source(clock.clone())
        .http_connector(connector)
        .build()
}

#[derive(Debug)]
struct ConnectionReset;

impl HttpConnector for ConnectionReset {
    fn call(&self, _request: HttpRequest) -> HttpConnectorFuture {
        connector::ready(Err(ConnectorError::io("connection reset by peer")))
    }
}

#[tokio::test]
async fn reports_one_timing_per_call() {
    let clock = clock();
    let client = CapturingTimingClient::new();
    let mut config = config(&clock, respond_after_50ms(&clock, 200));
    add_datadog_middleware(&mut config, client.clone()).unwrap();

    get_object().invoke(&config, input("key")).await.unwrap();

    assert_eq!(
        TimingSample {
            name: "aws.S3.GetObject".into(),
            duration: Duration::from_millis(50),
            tags: vec!["aws_region:us-east-1".into(), "status_code:200".into()],
            sample_rate: 1.0,
        },
        client.expect_one()
    );
}

#[tokio::test]
async fn service_errors_are_tagged_with_their_status() {
    let clock = clock();
    let client = CapturingTimingClient::new();
    let mut config = config(&clock, respond_after_50ms(&clock, 404));
    add_datadog_middleware(&mut config, client.clone()).unwrap();

    let err = get_object()
        .invoke(&config, input("missing"))
        .await
        .expect_err("404");
    assert_eq!(404, err.as_service_error().expect("modeled error").0);

    let sample = client.expect_one();
    assert_eq!(
        vec!["aws_region:us-east-1", "status_code:404"],
        sample.tags
    );
    assert_eq!(Duration::from_millis(50), sample.duration);
}

#[tokio::test]
#[traced_test]
async fn calls_without_a_response_are_tagged_unknown() {
    let clock = clock();
    let client = CapturingTimingClient::new();
    let mut config = config(&clock, ConnectionReset);
    add_datadog_middleware(&mut config, client.clone()).unwrap();

    let err = get_object()
        .invoke(&config, input("key"))
        .await
        .expect_err("connection reset");
    match err {
        SdkError::DispatchFailure(err) => assert!(err.is_io()),
        other => panic!("unexpected error: {other:?}"),
    }

    let sample = client.expect_one();
    assert_eq!(
        vec!["aws_region:us-east-1", "status_code:unknown"],
        sample.tags
    );
    assert_eq!(Duration::ZERO, sample.duration);
    assert!(logs_contain("no response status code was observed"));
}

#[tokio::test]
async fn calls_without_a_region_are_tagged_unknown() {
    let clock = clock();
    let client = CapturingTimingClient::new();
    let mut config = Config::builder()
        .time_source(clock.clone())
        .http_connector(respond_after_50ms(&clock, 200))
        .build();
    add_datadog_middleware(&mut config, client.clone()).unwrap();

    get_object().invoke(&config, input("key")).await.unwrap();
    assert_eq!(
        vec!["aws_region:unknown", "status_code:200"],
        client.expect_one().tags
    );
}

#[tokio::test]
#[traced_test]
async fn reporting_failures_dont_fail_the_call() {
    let clock = clock();
    let client = FailingTimingClient::new();
    let mut config = config(&clock, respond_after_50ms(&clock, 200));
    add_datadog_middleware(&mut config, client.clone()).unwrap();

    get_object().invoke(&config, input("a")).await.unwrap();
    get_object().invoke(&config, input("b")).await.unwrap();
    assert_eq!(2, client.attempts());

    // the second failure happens within the log interval
    logs_assert(|lines: &[&str]| {
        let warnings = lines
            .iter()
            .filter(|line| line.contains("failed to report call duration to Datadog"))
            .count();
        match warnings {
            1 => Ok(()),
            n => Err(format!("expected 1 warning, found {n}")),
        }
    });
    assert!(logs_contain("statsd agent is unreachable"));
}

#[tokio::test]
#[traced_test]
async fn reporting_failures_are_logged_again_after_the_interval() {
    let clock = clock();
    let client = FailingTimingClient::new();
    let mut config = config(&clock, respond_after_50ms(&clock, 200));
    DatadogMiddleware::new(client.clone())
        .with_config(
            MetricsConfig::builder()
                .error_log_interval(Duration::from_secs(10))
                .build(),
        )
        .register(&mut config)
        .unwrap();

    get_object().invoke(&config, input("a")).await.unwrap();
    get_object().invoke(&config, input("b")).await.unwrap();
    clock.advance(Duration::from_secs(10));
    get_object().invoke(&config, input("c")).await.unwrap();

    assert!(logs_contain("suppressed=1"));
    logs_assert(|lines: &[&str]| {
        let warnings = lines
            .iter()
            .filter(|line| line.contains("failed to report call duration to Datadog"))
            .count();
        match warnings {
            2 => Ok(()),
            n => Err(format!("expected 2 warnings, found {n}")),
        }
    });
}

#[tokio::test(start_paused = true)]
async fn cancelled_calls_are_not_reported_by_default() {
    let client = CapturingTimingClient::new();
    let mut config = config(&clock(), NeverConnector::new());
    add_datadog_middleware(&mut config, client.clone()).unwrap();

    let result = tokio::time::timeout(
        Duration::from_secs(1),
        get_object().invoke(&config, input("key")),
    )
    .await;
    assert!(result.is_err(), "the connector never responds");
    assert_eq!(Vec::<TimingSample>::new(), client.samples());
}

#[test]
fn cancelled_calls_can_be_reported() {
    let clock = clock();
    let client = CapturingTimingClient::new();
    let connector = NeverConnector::new();
    let mut config = config(&clock, connector.clone());
    DatadogMiddleware::new(client.clone())
        .with_config(MetricsConfig::builder().emit_on_cancel(true).build())
        .register(&mut config)
        .unwrap();

    let operation = get_object();
    let mut call = Box::pin(operation.invoke(&config, input("key")));
    assert!(call.as_mut().now_or_never().is_none(), "the connector never responds");
    assert_eq!(1, connector.num_calls());
    assert_eq!(Vec::<TimingSample>::new(), client.samples());

    clock.advance(Duration::from_millis(250));
    drop(call);

    let sample = client.expect_one();
    assert_eq!(
        vec!["aws_region:us-east-1", "status_code:cancelled"],
        sample.tags
    );
    assert_eq!(Duration::from_millis(250), sample.duration);
}

#[tokio::test]
async fn panicking_calls_are_never_reported() {
    let client = CapturingTimingClient::new();
    let mut config = config(
        &clock(),
        infallible_connection_fn(|_| panic!("connector panicked")),
    );
    DatadogMiddleware::new(client.clone())
        .with_config(MetricsConfig::builder().emit_on_cancel(true).build())
        .register(&mut config)
        .unwrap();

    let task = tokio::spawn(async move { get_object().invoke(&config, input("key")).await });
    let err = task.await.expect_err("the call panicked");
    assert!(err.is_panic());
    assert_eq!(Vec::<TimingSample>::new(), client.samples());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_calls_are_reported_independently() {
    const STATUSES: [u16; 4] = [200, 404, 500, 503];
    const CALLS: usize = 40;

    let client = CapturingTimingClient::new();
    let mut config = Config::builder()
        .region(Region::from_static("us-east-1"))
        .http_connector(infallible_connection_fn(|request| {
            let status = request.uri().path().trim_start_matches('/').parse().unwrap();
            response(status)
        }))
        .build();
    add_datadog_middleware(&mut config, client.clone()).unwrap();
    let config = Arc::new(config);

    let tasks: Vec<_> = (0..CALLS)
        .map(|i| {
            let config = config.clone();
            let status = STATUSES[i % STATUSES.len()];
            tokio::spawn(async move {
                let result = get_object()
                    .invoke(&config, input(&status.to_string()))
                    .await;
                (status, result.is_ok())
            })
        })
        .collect();
    let mut expected = Vec::new();
    for task in tasks {
        let (status, ok) = task.await.unwrap();
        assert_eq!(status == 200, ok);
        expected.push(format!("status_code:{status}"));
    }

    let mut reported: Vec<String> = client
        .samples()
        .into_iter()
        .map(|sample| {
            assert_eq!("aws.S3.GetObject", sample.name);
            assert_eq!("aws_region:us-east-1", sample.tags[0]);
            sample.tags[1].clone()
        })
        .collect();
    reported.sort();
    expected.sort();
    assert_eq!(expected, reported);
}

#[tokio::test]
async fn configured_prefix_rate_and_tags() {
    let clock = clock();
    let client = CapturingTimingClient::new();
    let mut config = config(&clock, respond_after_50ms(&clock, 200));
    DatadogMiddleware::new(client.clone())
        .with_config(
            MetricsConfig::builder()
                .metric_prefix("myapp.aws")
                .sample_rate(0.5)
                .tag_http_method(true)
                .tag("env", "test")
                .build(),
        )
        .register(&mut config)
        .unwrap();

    get_object().invoke(&config, input("key")).await.unwrap();
    assert_eq!(
        TimingSample {
            name: "myapp.aws.S3.GetObject".into(),
            duration: Duration::from_millis(50),
            tags: vec![
                "aws_region:us-east-1".into(),
                "status_code:200".into(),
                "http_method:GET".into(),
                "env:test".into(),
            ],
            sample_rate: 0.5,
        },
        client.expect_one()
    );
}

#[test]
fn registering_twice_is_an_error() {
    let mut config = Config::builder().build();
    add_datadog_middleware(&mut config, CapturingTimingClient::new()).unwrap();
    let err = add_datadog_middleware(&mut config, CapturingTimingClient::new())
        .expect_err("already registered");
    assert!(matches!(
        err.kind(),
        StackErrorKind::DuplicateId { id, .. } if *id == CALL_START_MIDDLEWARE_ID
    ));
}

mod cadence_client {
    use super::*;
    use pretty_assertions::assert_eq;
    use cadence::{MetricSink, StatsdClient};
    use std::io;
    use std::sync::Mutex;

    #[derive(Clone, Debug, Default)]
    struct Lines(Arc<Mutex<Vec<String>>>);

    impl MetricSink for Lines {
        fn emit(&self, metric: &str) -> io::Result<usize> {
            self.0.lock().unwrap().push(metric.to_owned());
            Ok(metric.len())
        }
    }

    #[tokio::test]
    async fn sends_dogstatsd_timings() {
        let clock = clock();
        let lines = Lines::default();
        let client = CadenceClient::new(StatsdClient::from_sink("", lines.clone()));
        let mut config = config(&clock, respond_after_50ms(&clock, 200));
        add_datadog_middleware(&mut config, client).unwrap();

        get_object().invoke(&config, input("key")).await.unwrap();
        assert_eq!(
            vec!["aws.S3.GetObject:50|ms|#aws_region:us-east-1,status_code:200"],
            *lines.0.lock().unwrap()
        );
    }
}
