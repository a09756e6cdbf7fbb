/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */

//! Type-erased containers for operation inputs and outputs.
//!
//! Middleware is registered against a step, not against an operation, so the same middleware
//! must be able to handle the input of any operation. Inputs and outputs are erased into a
//! [`TypeErasedBox`] while they travel through the stack and recovered by the operation that
//! created them.

use std::any::{type_name, Any};
use std::fmt;

/// Abstraction over `Box<dyn Any + Send + Sync>` that keeps a `Debug` implementation around.
pub struct TypeErasedBox {
    field: Box<dyn Any + Send + Sync>,
    type_name: &'static str,
    debug: fn(&(dyn Any + Send + Sync), &mut fmt::Formatter<'_>) -> fmt::Result,
}

impl fmt::Debug for TypeErasedBox {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("TypeErasedBox[")?;
        (self.debug)(&*self.field, f)?;
        f.write_str("]")
    }
}

fn debug_erased<T: fmt::Debug + 'static>(
    value: &(dyn Any + Send + Sync),
    f: &mut fmt::Formatter<'_>,
) -> fmt::Result {
    match value.downcast_ref::<T>() {
        Some(value) => fmt::Debug::fmt(value, f),
        None => f.write_str(type_name::<T>()),
    }
}

impl TypeErasedBox {
    /// Create a new `TypeErasedBox` from `value` of type `T`.
    pub fn new<T: Send + Sync + fmt::Debug + 'static>(value: T) -> Self {
        Self {
            field: Box::new(value),
            type_name: type_name::<T>(),
            debug: debug_erased::<T>,
        }
    }

    /// Name of the type that was erased.
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    /// Downcast into a `Box<T>`, or return `Self` if it is not a `T`.
    pub fn downcast<T: fmt::Debug + Send + Sync + 'static>(self) -> Result<Box<T>, Self> {
        let Self {
            field,
            type_name,
            debug,
        } = self;
        field.downcast().map_err(|field| Self {
            field,
            type_name,
            debug,
        })
    }

    /// Downcast as a `&T` if possible.
    pub fn downcast_ref<T: fmt::Debug + Send + Sync + 'static>(&self) -> Option<&T> {
        self.field.downcast_ref()
    }

    /// Downcast as a `&mut T` if possible.
    pub fn downcast_mut<T: fmt::Debug + Send + Sync + 'static>(&mut self) -> Option<&mut T> {
        self.field.downcast_mut()
    }
}

#[cfg(test)]
mod tests {
    use super::TypeErasedBox;

    #[derive(Debug)]
    struct Foo(&'static str);
    #[derive(Debug)]
    struct Bar(isize);

    #[test]
    fn downcasting() {
        let mut foo = TypeErasedBox::new(Foo("1"));
        foo.downcast_mut::<Foo>().expect("it's a Foo").0 = "3";
        assert!(foo.downcast_ref::<Bar>().is_none());

        let foo = foo.downcast::<Bar>().expect_err("it's not a Bar");
        assert_eq!("3", foo.downcast_ref::<Foo>().expect("it's a Foo").0);
        assert_eq!("3", foo.downcast::<Foo>().expect("it's a Foo").0);
    }

    #[test]
    fn debug_prints_the_erased_value() {
        let bar = TypeErasedBox::new(Bar(7));
        assert_eq!("TypeErasedBox[Bar(7)]", format!("{bar:?}"));
        assert!(bar.type_name().ends_with("Bar"));
    }
}
