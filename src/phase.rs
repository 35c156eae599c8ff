//! Run-once bookkeeping shared by [`Runtime`](crate::runtime::Runtime) and
//! [`Pipeline`](crate::pipeline::Pipeline).

use std::any::{Any, type_name};

use crate::error::FatalError;
use crate::outcome::Outcome;
use crate::store::StoredValue;

/// `Ready -> Done | Aborted`. Both end states are final.
pub(crate) enum Phase<T> {
    Ready,
    Done(Outcome<T>),
    Aborted,
}

impl<T> Phase<T> {
    pub(crate) const fn is_ready(&self) -> bool {
        matches!(self, Self::Ready)
    }

    /// Records the result of the one and only evaluation.
    pub(crate) fn settle(&mut self, result: Result<Outcome<T>, FatalError>) -> Result<(), FatalError> {
        match result {
            Ok(outcome) => {
                *self = Self::Done(outcome);
                Ok(())
            }
            Err(fatal) => {
                *self = Self::Aborted;
                Err(fatal)
            }
        }
    }

    pub(crate) const fn outcome(&self) -> Result<&Outcome<T>, FatalError> {
        match self {
            Self::Done(outcome) => Ok(outcome),
            Self::Ready | Self::Aborted => Err(FatalError::AlreadyAborted),
        }
    }

    pub(crate) const fn yielded(&self) -> Option<&T> {
        match self {
            Self::Done(Ok(Some(value))) => Some(value),
            _ => None,
        }
    }

    pub(crate) fn into_outcome(self) -> Result<Outcome<T>, FatalError> {
        match self {
            Self::Done(outcome) => Ok(outcome),
            Self::Ready | Self::Aborted => Err(FatalError::AlreadyAborted),
        }
    }
}

/// Recovers the declared output type from a type-erased terminal value.
pub(crate) fn cast_output<T: Any>(value: Box<dyn StoredValue>) -> Result<T, FatalError> {
    let found = value.stored_type_name();
    value
        .into_any()
        .downcast::<T>()
        .map(|value| *value)
        .map_err(|_| FatalError::OutputMismatch {
            expected: type_name::<T>(),
            found,
        })
}

/// Unwraps a finished outcome, panicking on failure or absence.
pub(crate) fn expect_value<T>(outcome: Outcome<T>, owner: &str) -> T {
    match outcome {
        Ok(Some(value)) => value,
        Ok(None) => panic!("{owner} produced no value"),
        Err(failure) => panic!("{owner} failed: {failure}"),
    }
}
