/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */

//! Steps, and the middleware that can be registered in them.
//!
//! A step is an ordered list of [`Middleware`] that ends in a terminal [`Handler`]. Each
//! middleware receives the [`Next`] handler and decides when (and whether) to call it, so a
//! middleware wraps everything that is registered after it in the same step, the terminal
//! handler, and every step that follows.

use crate::context::Context;
use crate::error::SdkError;
use crate::metadata::Metadata;
use crate::stack::StackError;
use crate::type_erasure::TypeErasedBox;
use crate::{HttpRequest, HttpResponse};
use futures_util::future::BoxFuture;
use std::fmt;
use std::sync::Arc;

/// Type-erased operation input.
pub type Input = TypeErasedBox;

/// Type-erased operation output.
pub type Output = TypeErasedBox;

/// Defines the types flowing in and out of a step.
pub trait Step: Send + Sync + 'static {
    /// Name of the step, used in logs and errors.
    const NAME: &'static str;

    /// What middleware in this step receives.
    type Input: Send + 'static;

    /// What middleware in this step returns.
    type Output: Send + 'static;
}

/// The first step of an operation. Middleware here sees the operation input and wraps the
/// entire call.
#[non_exhaustive]
#[derive(Debug)]
pub struct Initialize;

impl Step for Initialize {
    const NAME: &'static str = "Initialize";
    type Input = Input;
    type Output = Output;
}

/// The step that turns the operation input into an [`HttpRequest`].
///
/// Middleware here sees the operation input right before it is serialized. The output is the
/// deserialized operation output.
#[non_exhaustive]
#[derive(Debug)]
pub struct Serialize;

impl Step for Serialize {
    const NAME: &'static str = "Serialize";
    type Input = Input;
    type Output = Output;
}

/// The step at the wire boundary.
///
/// Middleware here sees the serialized [`HttpRequest`] on the way out and the raw
/// [`HttpResponse`] on the way back, before it is deserialized.
#[non_exhaustive]
#[derive(Debug)]
pub struct Deserialize;

impl Step for Deserialize {
    const NAME: &'static str = "Deserialize";
    type Input = HttpRequest;
    type Output = HttpResponse;
}

/// The result of handling a request, together with the [`Metadata`] gathered along the way.
#[derive(Debug)]
pub struct Handled<O> {
    /// Output of the handler, or why there is none.
    pub result: Result<O, SdkError>,
    /// Values returned up the stack.
    pub metadata: Metadata,
}

impl<O> Handled<O> {
    /// A successful result with empty metadata.
    pub fn ok(output: O) -> Self {
        Self {
            result: Ok(output),
            metadata: Metadata::new(),
        }
    }

    /// A failed result with empty metadata.
    pub fn err(error: SdkError) -> Self {
        Self {
            result: Err(error),
            metadata: Metadata::new(),
        }
    }

    /// Maps the successful output, keeping the metadata.
    pub fn map<O2>(self, f: impl FnOnce(O) -> Result<O2, SdkError>) -> Handled<O2> {
        Handled {
            result: self.result.and_then(f),
            metadata: self.metadata,
        }
    }
}

/// Where to register middleware within a step.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Position {
    /// At the front of the step, or in front of a relative middleware.
    Before,
    /// At the back of the step, or behind a relative middleware.
    After,
}

/// Middleware registered in step `S`.
///
/// Middleware must not store request-specific information in itself: requests may be
/// handled concurrently. Hand information down the stack in the [`Context`] and up the
/// stack in the returned [`Metadata`].
pub trait Middleware<S: Step>: Send + Sync + fmt::Debug {
    /// Identifier of this middleware. Identifiers are unique within a step.
    fn id(&self) -> &'static str;

    /// Handles `input`, usually by calling `next` with it.
    fn handle<'a>(
        &'a self,
        ctx: Context,
        input: S::Input,
        next: Next<'a, S>,
    ) -> BoxFuture<'a, Handled<S::Output>>;
}

/// Shared, reference-counted [`Middleware`].
pub struct SharedMiddleware<S: Step>(Arc<dyn Middleware<S>>);

impl<S: Step> SharedMiddleware<S> {
    /// Wraps `middleware` so it can be shared.
    pub fn new(middleware: impl Middleware<S> + 'static) -> Self {
        Self(Arc::new(middleware))
    }

    /// Identifier of the wrapped middleware.
    pub fn id(&self) -> &'static str {
        self.0.id()
    }
}

impl<S: Step> Clone for SharedMiddleware<S> {
    fn clone(&self) -> Self {
        Self(self.0.clone())
    }
}

impl<S: Step> fmt::Debug for SharedMiddleware<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&self.0, f)
    }
}

impl<S: Step> Middleware<S> for SharedMiddleware<S> {
    fn id(&self) -> &'static str {
        self.0.id()
    }

    fn handle<'a>(
        &'a self,
        ctx: Context,
        input: S::Input,
        next: Next<'a, S>,
    ) -> BoxFuture<'a, Handled<S::Output>> {
        self.0.handle(ctx, input, next)
    }
}

/// The end of a step.
pub trait Handler<S: Step>: Send + Sync {
    /// Handles `input` once every middleware of the step has run.
    fn handle<'a>(&'a self, ctx: Context, input: S::Input) -> BoxFuture<'a, Handled<S::Output>>;
}

/// The remainder of a step, as seen by a middleware.
pub struct Next<'a, S: Step> {
    remaining: &'a [SharedMiddleware<S>],
    terminal: &'a dyn Handler<S>,
}

impl<'a, S: Step> Next<'a, S> {
    /// Passes `input` along to the rest of the step.
    pub fn handle(self, ctx: Context, input: S::Input) -> BoxFuture<'a, Handled<S::Output>> {
        match self.remaining.split_first() {
            Some((middleware, remaining)) => middleware.handle(
                ctx,
                input,
                Next {
                    remaining,
                    terminal: self.terminal,
                },
            ),
            None => self.terminal.handle(ctx, input),
        }
    }
}

impl<S: Step> fmt::Debug for Next<'_, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Next")
            .field("step", &S::NAME)
            .field("remaining", &self.remaining)
            .finish()
    }
}

/// Ordered list of middleware registered in step `S`.
pub struct StepStack<S: Step> {
    entries: Vec<SharedMiddleware<S>>,
}

impl<S: Step> Default for StepStack<S> {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
        }
    }
}

impl<S: Step> Clone for StepStack<S> {
    fn clone(&self) -> Self {
        Self {
            entries: self.entries.clone(),
        }
    }
}

impl<S: Step> fmt::Debug for StepStack<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StepStack")
            .field("step", &S::NAME)
            .field("ids", &self.ids())
            .finish()
    }
}

impl<S: Step> StepStack<S> {
    /// Creates an empty step.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `middleware` at the front or back of the step.
    pub fn add(
        &mut self,
        middleware: impl Middleware<S> + 'static,
        position: Position,
    ) -> Result<(), StackError> {
        let middleware = SharedMiddleware::new(middleware);
        self.check_id(middleware.id())?;
        match position {
            Position::Before => self.entries.insert(0, middleware),
            Position::After => self.entries.push(middleware),
        }
        Ok(())
    }

    /// Registers `middleware` in front of or behind the middleware identified by `relative_to`.
    pub fn insert_relative(
        &mut self,
        middleware: impl Middleware<S> + 'static,
        relative_to: &str,
        position: Position,
    ) -> Result<(), StackError> {
        let middleware = SharedMiddleware::new(middleware);
        self.check_id(middleware.id())?;
        let index = self
            .index_of(relative_to)
            .ok_or_else(|| StackError::not_found(S::NAME, relative_to))?;
        match position {
            Position::Before => self.entries.insert(index, middleware),
            Position::After => self.entries.insert(index + 1, middleware),
        }
        Ok(())
    }

    /// Removes the middleware identified by `id`.
    pub fn remove(&mut self, id: &str) -> Result<SharedMiddleware<S>, StackError> {
        let index = self
            .index_of(id)
            .ok_or_else(|| StackError::not_found(S::NAME, id))?;
        Ok(self.entries.remove(index))
    }

    /// Returns the middleware identified by `id`.
    pub fn get(&self, id: &str) -> Option<&SharedMiddleware<S>> {
        self.entries.iter().find(|middleware| middleware.id() == id)
    }

    /// Identifiers of the registered middleware, in the order they run.
    pub fn ids(&self) -> Vec<&'static str> {
        self.entries.iter().map(SharedMiddleware::id).collect()
    }

    /// Number of registered middleware.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if no middleware is registered.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Runs `input` through every middleware of this step and then through `terminal`.
    pub fn handle<'a>(
        &'a self,
        ctx: Context,
        input: S::Input,
        terminal: &'a dyn Handler<S>,
    ) -> BoxFuture<'a, Handled<S::Output>> {
        tracing::trace!(step = S::NAME, middleware = ?self.ids(), "entering step");
        Next {
            remaining: &self.entries,
            terminal,
        }
        .handle(ctx, input)
    }

    fn index_of(&self, id: &str) -> Option<usize> {
        self.entries
            .iter()
            .position(|middleware| middleware.id() == id)
    }

    fn check_id(&self, id: &'static str) -> Result<(), StackError> {
        if id.is_empty() {
            return Err(StackError::invalid_id(S::NAME));
        }
        if self.index_of(id).is_some() {
            return Err(StackError::duplicate_id(S::NAME, id));
        }
        Ok(())
    }
}
