/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */

//! Immutable, append-only per-request context.
//!
//! A [`Context`] accompanies a single request down the stack. Middleware never changes the
//! context it was handed; it derives a new one with [`Context::with`] and passes that to the
//! next middleware. Middleware that runs later (further down the stack) sees everything
//! earlier middleware added, while earlier middleware never observes what later middleware
//! adds. Information that needs to travel back up the stack belongs in
//! [`Metadata`](crate::metadata::Metadata) instead.
//!
//! Values are keyed by their type. Storing a second value of the same type shadows the first
//! one for every context derived from that point on.

use std::any::{type_name, Any, TypeId};
use std::fmt;
use std::sync::Arc;

struct Entry {
    type_id: TypeId,
    type_name: &'static str,
    value: Box<dyn Any + Send + Sync>,
    debug: fn(&(dyn Any + Send + Sync), &mut fmt::Formatter<'_>) -> fmt::Result,
    parent: Option<Arc<Entry>>,
}

impl fmt::Debug for Entry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: ", self.type_name)?;
        (self.debug)(&*self.value, f)
    }
}

fn debug_value<T: fmt::Debug + 'static>(
    value: &(dyn Any + Send + Sync),
    f: &mut fmt::Formatter<'_>,
) -> fmt::Result {
    match value.downcast_ref::<T>() {
        Some(value) => fmt::Debug::fmt(value, f),
        None => f.write_str("<type mismatch>"),
    }
}

/// Per-request key/value carrier that flows down the middleware stack.
///
/// Cloning a context is cheap: entries are shared between a context and every context
/// derived from it.
#[derive(Clone, Default)]
#[must_use]
pub struct Context {
    head: Option<Arc<Entry>>,
}

impl Context {
    /// Creates an empty context.
    pub fn new() -> Self {
        Self::default()
    }

    /// Derives a new context that additionally carries `value`.
    ///
    /// `self` is left untouched.
    pub fn with<T>(&self, value: T) -> Context
    where
        T: fmt::Debug + Send + Sync + 'static,
    {
        Context {
            head: Some(Arc::new(Entry {
                type_id: TypeId::of::<T>(),
                type_name: type_name::<T>(),
                value: Box::new(value),
                debug: debug_value::<T>,
                parent: self.head.clone(),
            })),
        }
    }

    /// Returns the most recently added value of type `T`, if any.
    pub fn get<T: Send + Sync + 'static>(&self) -> Option<&T> {
        self.entries()
            .find(|entry| entry.type_id == TypeId::of::<T>())
            .and_then(|entry| entry.value.downcast_ref::<T>())
    }

    /// Number of values added to this context, including shadowed ones.
    pub fn len(&self) -> usize {
        self.entries().count()
    }

    /// Returns true if nothing has been added to this context.
    pub fn is_empty(&self) -> bool {
        self.head.is_none()
    }

    fn entries(&self) -> impl Iterator<Item = &Entry> {
        let mut next = self.head.as_deref();
        std::iter::from_fn(move || {
            let entry = next?;
            next = entry.parent.as_deref();
            Some(entry)
        })
    }
}

impl fmt::Debug for Context {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.entries()).finish()
    }
}
