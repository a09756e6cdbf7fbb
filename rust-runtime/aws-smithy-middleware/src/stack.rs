/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */

//! The middleware stack of an operation.

use crate::step::{Deserialize, Initialize, Serialize, StepStack};
use std::error::Error;
use std::fmt;

/// Every step an operation goes through, in order.
#[derive(Clone, Debug, Default)]
pub struct Stack {
    /// Middleware with access to the operation input, wrapping the entire call.
    pub initialize: StepStack<Initialize>,
    /// Middleware with access to the operation input right before serialization.
    pub serialize: StepStack<Serialize>,
    /// Middleware with access to the serialized request and the raw response.
    pub deserialize: StepStack<Deserialize>,
}

impl Stack {
    /// Creates a stack with no middleware registered.
    pub fn new() -> Self {
        Self::default()
    }
}

impl fmt::Display for Stack {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Stack:")?;
        writeln!(f, "  Initialize stack step")?;
        for id in self.initialize.ids() {
            writeln!(f, "    {id}")?;
        }
        writeln!(f, "  Serialize stack step")?;
        for id in self.serialize.ids() {
            writeln!(f, "    {id}")?;
        }
        writeln!(f, "  Deserialize stack step")?;
        for id in self.deserialize.ids() {
            writeln!(f, "    {id}")?;
        }
        Ok(())
    }
}

/// What went wrong when modifying a [`Stack`].
#[non_exhaustive]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StackErrorKind {
    /// A middleware with the same id is already registered in the step.
    DuplicateId {
        /// Step the middleware was registered in.
        step: &'static str,
        /// The conflicting id.
        id: &'static str,
    },
    /// The middleware id is empty.
    InvalidId {
        /// Step the middleware was registered in.
        step: &'static str,
    },
    /// No middleware with the given id is registered in the step.
    NotFound {
        /// Step that was searched.
        step: &'static str,
        /// The id that wasn't found.
        id: String,
    },
}

/// Error returned when middleware can't be registered or removed.
#[derive(Debug)]
pub struct StackError {
    kind: StackErrorKind,
}

impl StackError {
    pub(crate) fn duplicate_id(step: &'static str, id: &'static str) -> Self {
        Self {
            kind: StackErrorKind::DuplicateId { step, id },
        }
    }

    pub(crate) fn invalid_id(step: &'static str) -> Self {
        Self {
            kind: StackErrorKind::InvalidId { step },
        }
    }

    pub(crate) fn not_found(step: &'static str, id: impl Into<String>) -> Self {
        Self {
            kind: StackErrorKind::NotFound {
                step,
                id: id.into(),
            },
        }
    }

    /// Returns what went wrong.
    pub fn kind(&self) -> &StackErrorKind {
        &self.kind
    }
}

impl fmt::Display for StackError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            StackErrorKind::DuplicateId { step, id } => {
                write!(f, "`{id}` is already registered in the {step} step")
            }
            StackErrorKind::InvalidId { step } => {
                write!(f, "middleware registered in the {step} step must have a non-empty id")
            }
            StackErrorKind::NotFound { step, id } => {
                write!(f, "`{id}` is not registered in the {step} step")
            }
        }
    }
}

impl Error for StackError {}

#[cfg(test)]
mod test {
    use super::*;
    use crate::context::Context;
    use crate::step::{Handled, Middleware, Next, Position};
    use crate::type_erasure::TypeErasedBox;
    use futures_util::future::BoxFuture;

    #[derive(Debug)]
    struct Noop(&'static str);

    impl Middleware<Initialize> for Noop {
        fn id(&self) -> &'static str {
            self.0
        }

        fn handle<'a>(
            &'a self,
            ctx: Context,
            input: TypeErasedBox,
            next: Next<'a, Initialize>,
        ) -> BoxFuture<'a, Handled<TypeErasedBox>> {
            next.handle(ctx, input)
        }
    }

    #[test]
    fn display_lists_every_step() {
        let mut stack = Stack::new();
        stack.initialize.add(Noop("first"), Position::After).unwrap();
        stack.initialize.add(Noop("zeroth"), Position::Before).unwrap();
        pretty_assertions::assert_eq!(
            "Stack:\n  Initialize stack step\n    zeroth\n    first\n  Serialize stack step\n  Deserialize stack step\n",
            stack.to_string()
        );
    }

    #[test]
    fn error_messages() {
        assert_eq!(
            "`AddUserAgent` is already registered in the Initialize step",
            StackError::duplicate_id("Initialize", "AddUserAgent").to_string()
        );
        assert_eq!(
            "`Missing` is not registered in the Deserialize step",
            StackError::not_found("Deserialize", "Missing").to_string()
        );
    }
}
