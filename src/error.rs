//! Error taxonomy for effect evaluation.
//!
//! Three kinds of problem travel inside an [`Outcome`](crate::outcome::Outcome):
//!
//! - [`Failure::Domain`]: an error a step produced on purpose
//! - [`Failure::Fault`]: a panic that a capture barrier turned into a value
//! - [`Failure::Lookup`]: a type-directed argument that could not be resolved
//!
//! Absence is not an error at all; it is the `Ok(None)` layer of the outcome.
//!
//! [`FatalError`] is the fourth kind. It never appears inside an outcome:
//! resource bracketing failures and output type mismatches mean the caller
//! wired the system incorrectly, so `try_run` reports them separately and
//! `run` escalates them as a panic.

use std::any::Any;
use std::backtrace::{Backtrace, BacktraceStatus};
use std::error::Error;
use std::fmt;

use thiserror::Error;

use crate::capture::panic_message;

/// A boxed, type-erased domain error.
pub type BoxError = Box<dyn Error + 'static>;

/// A failure produced while evaluating a step.
///
/// # Examples
///
/// ```rust
/// use effectum::error::Failure;
///
/// #[derive(Debug, PartialEq)]
/// struct Invalid;
///
/// impl std::fmt::Display for Invalid {
///     fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
///         formatter.write_str("invalid")
///     }
/// }
///
/// impl std::error::Error for Invalid {}
///
/// let failure = Failure::domain(Invalid);
/// assert_eq!(failure.to_string(), "invalid");
/// assert_eq!(failure.downcast_ref::<Invalid>(), Some(&Invalid));
/// ```
#[derive(Debug, Error)]
pub enum Failure {
    /// A user-level error produced deliberately by a step.
    #[error("{0}")]
    Domain(BoxError),
    /// A panic caught at a node, chain or pipeline boundary.
    #[error(transparent)]
    Fault(Fault),
    /// A type-directed lookup could not supply an argument.
    #[error(transparent)]
    Lookup(#[from] LookupError),
}

static_assertions::assert_impl_all!(Failure: Error, fmt::Debug, fmt::Display);

impl Failure {
    /// Wraps any error (or `&str`/`String`) as a domain failure.
    ///
    /// A boxed `Failure` is unwrapped rather than nested.
    pub fn domain<E>(error: E) -> Self
    where
        E: Into<BoxError>,
    {
        match error.into().downcast::<Self>() {
            Ok(failure) => *failure,
            Err(other) => Self::Domain(other),
        }
    }

    /// Creates a domain failure carrying only a message.
    pub fn message(message: impl Into<String>) -> Self {
        let message: String = message.into();
        Self::Domain(message.into())
    }

    /// Returns the underlying error if it has type `E`.
    #[must_use]
    pub fn downcast_ref<E: Error + 'static>(&self) -> Option<&E> {
        match self {
            Self::Domain(error) => error.downcast_ref::<E>(),
            Self::Fault(fault) => (fault as &dyn Error).downcast_ref::<E>(),
            Self::Lookup(error) => (error as &dyn Error).downcast_ref::<E>(),
        }
    }

    /// Returns the fault, if this failure came from a contained panic.
    #[must_use]
    pub const fn fault(&self) -> Option<&Fault> {
        match self {
            Self::Fault(fault) => Some(fault),
            _ => None,
        }
    }

    /// Returns `true` if this failure came from a contained panic.
    #[must_use]
    pub const fn is_fault(&self) -> bool {
        matches!(self, Self::Fault(_))
    }
}

/// An unexpected panic converted into a value at a capture barrier.
///
/// Carries the boundary it was caught at, the panic message and a
/// backtrace captured when the barrier converted it. Whether the backtrace
/// is populated follows `RUST_BACKTRACE`/`RUST_LIB_BACKTRACE`.
#[derive(Debug)]
pub struct Fault {
    context: String,
    message: String,
    backtrace: Backtrace,
}

impl Fault {
    /// Creates a fault for `context` with the given message.
    pub fn new(context: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            context: context.into(),
            message: message.into(),
            backtrace: Backtrace::capture(),
        }
    }

    /// Creates a fault from a panic payload returned by `catch_unwind`.
    pub fn from_panic(context: impl Into<String>, payload: &(dyn Any + Send)) -> Self {
        Self::new(context, panic_message(payload))
    }

    /// The boundary at which the fault was caught.
    #[must_use]
    pub fn context(&self) -> &str {
        &self.context
    }

    /// The panic message.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }

    /// The backtrace captured at conversion time.
    #[must_use]
    pub const fn backtrace(&self) -> &Backtrace {
        &self.backtrace
    }

    /// Returns `true` if a backtrace was actually captured.
    #[must_use]
    pub fn has_backtrace(&self) -> bool {
        self.backtrace.status() == BacktraceStatus::Captured
    }
}

impl fmt::Display for Fault {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(formatter, "fault in {}: {}", self.context, self.message)
    }
}

impl Error for Fault {}

/// A failed store access.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LookupError {
    /// No entry with this name exists.
    #[error("no variable named `{name}`")]
    NameNotFound {
        /// The requested name.
        name: String,
    },
    /// No entry resolves to the requested type.
    #[error("no variable of type `{type_name}`")]
    TypeNotFound {
        /// The requested type.
        type_name: &'static str,
    },
    /// The named entry exists but holds another type.
    #[error("variable `{name}` holds `{found}`, not `{expected}`")]
    TypeMismatch {
        /// The requested name.
        name: String,
        /// The requested type.
        expected: &'static str,
        /// The type actually stored.
        found: &'static str,
    },
    /// A step declares more parameters than the store has entries.
    #[error("step needs {required} arguments but only {available} variables are available")]
    Arity {
        /// Parameters the step declares.
        required: usize,
        /// Entries currently in the store.
        available: usize,
    },
}

/// A wiring error that escalates past `run`.
#[derive(Debug, Error)]
pub enum FatalError {
    /// A resource's `open` failed.
    #[error("resource `{name}` failed to open")]
    ResourceOpen {
        /// The resource name.
        name: String,
        /// Why it failed.
        #[source]
        source: Failure,
    },
    /// A resource's `open` produced no value.
    #[error("resource `{name}` opened to nothing")]
    ResourceAbsent {
        /// The resource name.
        name: String,
    },
    /// A resource's `close` failed.
    #[error("resource `{name}` failed to close")]
    ResourceClose {
        /// The resource name.
        name: String,
        /// Why it failed.
        #[source]
        source: Failure,
    },
    /// The terminal value is not of the declared output type.
    #[error("expected output of type `{expected}`, found `{found}`")]
    OutputMismatch {
        /// The declared output type.
        expected: &'static str,
        /// The type actually produced.
        found: &'static str,
    },
    /// A previous run already ended in a fatal error.
    #[error("evaluation was aborted by an earlier fatal error")]
    AlreadyAborted,
}
