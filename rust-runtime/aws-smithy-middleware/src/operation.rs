/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */

//! Typed operations and their invocation through the middleware stack.

use crate::config::Config;
use crate::connector::{HttpConnector, SharedHttpConnector};
use crate::context::Context;
use crate::error::SdkError;
use crate::stack::Stack;
use crate::step::{self, Deserialize, Handled, Handler, Initialize, Serialize, StepStack};
use crate::type_erasure::TypeErasedBox;
use crate::{BoxError, HttpRequest, HttpResponse};
use futures_util::future::{BoxFuture, FutureExt};
use std::borrow::Cow;
use std::error::Error;
use std::fmt;
use std::sync::Arc;
use tracing::Instrument;

const DEFAULT_USER_AGENT: &str = concat!("aws-smithy-middleware/", env!("CARGO_PKG_VERSION"));

/// Names of the service and operation being invoked.
///
/// Available to middleware through the request [`Context`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Metadata {
    operation: Cow<'static, str>,
    service: Cow<'static, str>,
}

impl Metadata {
    /// Name of the operation, e.g. `GetObject`.
    pub fn name(&self) -> &str {
        &self.operation
    }

    /// Identifier of the service, e.g. `S3`.
    pub fn service(&self) -> &str {
        &self.service
    }

    /// Creates metadata for `operation` of `service`.
    pub fn new(
        operation: impl Into<Cow<'static, str>>,
        service: impl Into<Cow<'static, str>>,
    ) -> Self {
        Metadata {
            operation: operation.into(),
            service: service.into(),
        }
    }
}

/// Why a response couldn't be turned into the operation output.
#[derive(Debug)]
pub enum DeserializeError<E> {
    /// The service responded with a modeled error.
    Service(E),
    /// The response couldn't be parsed.
    Unparseable(BoxError),
}

impl<E> DeserializeError<E> {
    /// The response couldn't be parsed because of `source`.
    pub fn unparseable(source: impl Into<BoxError>) -> Self {
        Self::Unparseable(source.into())
    }
}

type Serializer = Arc<dyn Fn(step::Input) -> Result<HttpRequest, BoxError> + Send + Sync>;
type Deserializer =
    Arc<dyn Fn(&HttpResponse) -> Result<step::Output, DeserializeError<BoxError>> + Send + Sync>;

/// An operation taking `I`, returning `O` and failing with the modeled error `E`.
pub struct Operation<I, O, E> {
    metadata: Metadata,
    serializer: Serializer,
    deserializer: Deserializer,
    _phantom: std::marker::PhantomData<fn(I) -> Result<O, E>>,
}

impl<I, O, E> Clone for Operation<I, O, E> {
    fn clone(&self) -> Self {
        Self {
            metadata: self.metadata.clone(),
            serializer: self.serializer.clone(),
            deserializer: self.deserializer.clone(),
            _phantom: Default::default(),
        }
    }
}

impl<I, O, E> fmt::Debug for Operation<I, O, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Operation")
            .field("metadata", &self.metadata)
            .finish()
    }
}

impl Operation<(), (), ()> {
    /// Returns a builder for an operation.
    pub fn builder() -> OperationBuilder {
        OperationBuilder::new()
    }
}

impl<I, O, E> Operation<I, O, E>
where
    I: fmt::Debug + Send + Sync + 'static,
    O: fmt::Debug + Send + Sync + 'static,
    E: Error + Send + Sync + 'static,
{
    /// Names of the service and operation.
    pub fn metadata(&self) -> &Metadata {
        &self.metadata
    }

    /// Invokes this operation with `input`.
    ///
    /// A fresh [`Stack`] is built from the options in `config` and `input` is run through it.
    pub async fn invoke(&self, config: &Config, input: I) -> Result<O, SdkError<E>> {
        let span = tracing::debug_span!(
            "invoke",
            service = %self.metadata.service(),
            operation = %self.metadata.name(),
        );
        let handled = self
            .invoke_erased(config, TypeErasedBox::new(input))
            .instrument(span)
            .await;
        tracing::trace!(metadata = ?handled.metadata, "invocation complete");
        match handled.result {
            Ok(output) => output.downcast::<O>().map(|output| *output).map_err(|output| {
                SdkError::construction_failure(format!(
                    "expected the output of {} to be a `{}` but found a `{}`",
                    self.metadata.name(),
                    std::any::type_name::<O>(),
                    output.type_name(),
                ))
            }),
            Err(err) => Err(downcast_service_error(err)),
        }
    }

    async fn invoke_erased(&self, config: &Config, input: step::Input) -> Handled<step::Output> {
        let stack = match config.build_stack() {
            Ok(stack) => stack,
            Err(err) => return Handled::err(SdkError::construction_failure(err)),
        };
        tracing::trace!(stack = %stack, "built middleware stack");

        let mut ctx = Context::new()
            .with(self.metadata.clone())
            .with(config.time_source().clone());
        if let Some(region) = config.region() {
            ctx = ctx.with(region.clone());
        }

        let Stack {
            initialize,
            serialize,
            deserialize,
        } = &stack;
        let transmit = Transmit {
            connector: config.http_connector().clone(),
        };
        let serialize_terminal = SerializeTerminal {
            serializer: &*self.serializer,
            deserializer: &*self.deserializer,
            deserialize,
            transmit: &transmit,
        };
        let initialize_terminal = InitializeTerminal {
            serialize,
            terminal: &serialize_terminal,
        };
        initialize
            .handle(ctx, input, &initialize_terminal)
            .await
    }
}

fn downcast_service_error<E>(err: SdkError) -> SdkError<E>
where
    E: Error + Send + Sync + 'static,
{
    match err {
        SdkError::ServiceError { err, raw } => match err.downcast::<E>() {
            Ok(err) => SdkError::ServiceError { err: *err, raw },
            Err(err) => SdkError::ResponseError { err, raw },
        },
        SdkError::ConstructionFailure(err) => SdkError::ConstructionFailure(err),
        SdkError::DispatchFailure(err) => SdkError::DispatchFailure(err),
        SdkError::ResponseError { err, raw } => SdkError::ResponseError { err, raw },
    }
}

struct InitializeTerminal<'a> {
    serialize: &'a StepStack<Serialize>,
    terminal: &'a SerializeTerminal<'a>,
}

impl Handler<Initialize> for InitializeTerminal<'_> {
    fn handle<'a>(
        &'a self,
        ctx: Context,
        input: step::Input,
    ) -> BoxFuture<'a, Handled<step::Output>> {
        self.serialize.handle(ctx, input, self.terminal)
    }
}

struct SerializeTerminal<'a> {
    serializer: &'a (dyn Fn(step::Input) -> Result<HttpRequest, BoxError> + Send + Sync),
    deserializer: &'a (dyn Fn(&HttpResponse) -> Result<step::Output, DeserializeError<BoxError>>
             + Send
             + Sync),
    deserialize: &'a StepStack<Deserialize>,
    transmit: &'a Transmit,
}

impl Handler<Serialize> for SerializeTerminal<'_> {
    fn handle<'a>(
        &'a self,
        ctx: Context,
        input: step::Input,
    ) -> BoxFuture<'a, Handled<step::Output>> {
        async move {
            let mut request = match (self.serializer)(input) {
                Ok(request) => request,
                Err(err) => return Handled::err(SdkError::construction_failure(err)),
            };
            if !request.headers().contains_key(http::header::USER_AGENT) {
                request.headers_mut().insert(
                    http::header::USER_AGENT,
                    http::HeaderValue::from_static(DEFAULT_USER_AGENT),
                );
            }

            let Handled { result, metadata } =
                self.deserialize.handle(ctx, request, self.transmit).await;
            let result = result.and_then(|response| match (self.deserializer)(&response) {
                Ok(output) => Ok(output),
                Err(DeserializeError::Service(err)) => Err(SdkError::service_error(err, response)),
                Err(DeserializeError::Unparseable(err)) => {
                    Err(SdkError::response_error(err, response))
                }
            });
            Handled { result, metadata }
        }
        .boxed()
    }
}

struct Transmit {
    connector: SharedHttpConnector,
}

impl Handler<Deserialize> for Transmit {
    fn handle<'a>(
        &'a self,
        _ctx: Context,
        request: HttpRequest,
    ) -> BoxFuture<'a, Handled<HttpResponse>> {
        tracing::debug!(method = %request.method(), uri = %request.uri(), "dispatching request");
        let response = self.connector.call(request);
        async move {
            match response.await {
                Ok(response) => {
                    tracing::debug!(status = %response.status(), "received response");
                    Handled::ok(response)
                }
                Err(err) => {
                    tracing::debug!(error = %err, "dispatch failed");
                    Handled::err(SdkError::dispatch_failure(err))
                }
            }
        }
        .boxed()
    }
}

/// Builder for [`Operation`].
pub struct OperationBuilder<I = (), O = (), E = ()> {
    service_name: Option<Cow<'static, str>>,
    operation_name: Option<Cow<'static, str>>,
    serializer: Option<Serializer>,
    deserializer: Option<Deserializer>,
    _phantom: std::marker::PhantomData<fn(I) -> Result<O, E>>,
}

impl<I, O, E> fmt::Debug for OperationBuilder<I, O, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OperationBuilder")
            .field("service_name", &self.service_name)
            .field("operation_name", &self.operation_name)
            .finish()
    }
}

impl Default for OperationBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl OperationBuilder {
    /// Creates a new builder.
    pub fn new() -> Self {
        Self {
            service_name: None,
            operation_name: None,
            serializer: None,
            deserializer: None,
            _phantom: Default::default(),
        }
    }
}

impl<I, O, E> OperationBuilder<I, O, E> {
    /// Sets the service identifier, e.g. `S3`.
    pub fn service_name(mut self, service_name: impl Into<Cow<'static, str>>) -> Self {
        self.service_name = Some(service_name.into());
        self
    }

    /// Sets the operation name, e.g. `GetObject`.
    pub fn operation_name(mut self, operation_name: impl Into<Cow<'static, str>>) -> Self {
        self.operation_name = Some(operation_name.into());
        self
    }

    /// Sets the function turning the operation input into an HTTP request.
    pub fn serializer<I2>(
        self,
        serializer: impl Fn(I2) -> Result<HttpRequest, BoxError> + Send + Sync + 'static,
    ) -> OperationBuilder<I2, O, E>
    where
        I2: fmt::Debug + Send + Sync + 'static,
    {
        OperationBuilder {
            service_name: self.service_name,
            operation_name: self.operation_name,
            serializer: Some(Arc::new(move |input: step::Input| -> Result<HttpRequest, BoxError> {
                let input = input.downcast::<I2>().map_err(|input| {
                    format!(
                        "expected the input to be a `{}` but found a `{}`",
                        std::any::type_name::<I2>(),
                        input.type_name()
                    )
                })?;
                serializer(*input)
            })),
            deserializer: self.deserializer,
            _phantom: Default::default(),
        }
    }

    /// Sets the function turning an HTTP response into the operation output or error.
    pub fn deserializer<O2, E2>(
        self,
        deserializer: impl Fn(&HttpResponse) -> Result<O2, DeserializeError<E2>>
            + Send
            + Sync
            + 'static,
    ) -> OperationBuilder<I, O2, E2>
    where
        O2: fmt::Debug + Send + Sync + 'static,
        E2: Error + Send + Sync + 'static,
    {
        OperationBuilder {
            service_name: self.service_name,
            operation_name: self.operation_name,
            serializer: self.serializer,
            deserializer: Some(Arc::new(
                move |response: &HttpResponse| -> Result<step::Output, DeserializeError<BoxError>> {
                match deserializer(response) {
                    Ok(output) => Ok(TypeErasedBox::new(output)),
                    Err(DeserializeError::Service(err)) => {
                        Err(DeserializeError::Service(Box::new(err) as BoxError))
                    }
                    Err(DeserializeError::Unparseable(err)) => {
                        Err(DeserializeError::Unparseable(err))
                    }
                }
            },
            )),
            _phantom: Default::default(),
        }
    }

    /// Builds the operation.
    pub fn build(self) -> Result<Operation<I, O, E>, BuildError> {
        Ok(Operation {
            metadata: Metadata::new(
                self.operation_name
                    .ok_or(BuildError::missing("operation_name"))?,
                self.service_name.ok_or(BuildError::missing("service_name"))?,
            ),
            serializer: self.serializer.ok_or(BuildError::missing("serializer"))?,
            deserializer: self
                .deserializer
                .ok_or(BuildError::missing("deserializer"))?,
            _phantom: Default::default(),
        })
    }
}

/// Error returned when an [`Operation`] is missing a required field.
#[derive(Debug)]
pub struct BuildError {
    field: &'static str,
}

impl BuildError {
    fn missing(field: &'static str) -> Self {
        Self { field }
    }
}

impl fmt::Display for BuildError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "`{}` is required to build an operation", self.field)
    }
}

impl Error for BuildError {}
