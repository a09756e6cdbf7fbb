/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */

//! Typed values returned up the middleware stack.

use std::any::{type_name, Any, TypeId};
use std::collections::HashMap;
use std::fmt;

struct Value {
    type_name: &'static str,
    inner: Box<dyn Any + Send + Sync>,
    debug: fn(&(dyn Any + Send + Sync), &mut fmt::Formatter<'_>) -> fmt::Result,
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: ", self.type_name)?;
        (self.debug)(&*self.inner, f)
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

/// Values produced while handling a request, returned alongside its result.
///
/// Unlike [`Context`](crate::context::Context), metadata is owned by whoever currently holds
/// the [`Handled`](crate::step::Handled) result, so middleware can add to it after the rest
/// of the stack has returned. Values are keyed by their type.
#[derive(Default)]
pub struct Metadata {
    values: HashMap<TypeId, Value>,
}

impl Metadata {
    /// Creates empty metadata.
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores `value`, returning the previous value of the same type if there was one.
    pub fn insert<T>(&mut self, value: T) -> Option<T>
    where
        T: fmt::Debug + Send + Sync + 'static,
    {
        self.values
            .insert(
                TypeId::of::<T>(),
                Value {
                    type_name: type_name::<T>(),
                    inner: Box::new(value),
                    debug: debug_value::<T>,
                },
            )
            .and_then(|previous| previous.inner.downcast().ok())
            .map(|previous| *previous)
    }

    /// Returns the stored value of type `T`, if any.
    pub fn get<T: Send + Sync + 'static>(&self) -> Option<&T> {
        self.values
            .get(&TypeId::of::<T>())
            .and_then(|value| value.inner.downcast_ref())
    }

    /// Removes and returns the stored value of type `T`, if any.
    pub fn remove<T: Send + Sync + 'static>(&mut self) -> Option<T> {
        self.values
            .remove(&TypeId::of::<T>())
            .and_then(|value| value.inner.downcast().ok())
            .map(|value| *value)
    }

    /// Number of stored values.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Returns true if nothing is stored.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl fmt::Debug for Metadata {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.values.values()).finish()
    }
}

#[cfg(test)]
mod test {
    use super::Metadata;

    #[derive(Debug, PartialEq)]
    struct StatusCode(u16);
    #[derive(Debug, PartialEq)]
    struct RequestId(String);

    #[test]
    fn insert_get_remove() {
        let mut metadata = Metadata::new();
        assert!(metadata.is_empty());
        assert_eq!(None, metadata.insert(StatusCode(200)));
        assert_eq!(Some(StatusCode(200)), metadata.insert(StatusCode(503)));
        assert_eq!(Some(&StatusCode(503)), metadata.get::<StatusCode>());
        assert_eq!(None, metadata.get::<RequestId>());
        metadata.insert(RequestId("abc".into()));
        assert_eq!(2, metadata.len());
        assert_eq!(Some(StatusCode(503)), metadata.remove::<StatusCode>());
        assert_eq!(Some(RequestId("abc".into())), metadata.remove::<RequestId>());
        assert!(metadata.is_empty());
    }
}
