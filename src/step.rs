//! Normalized step results.
//!
//! User functions plugged into a pipeline or an injected attempt may return
//! a bare value, nothing, an `Option`, a `Result`, or a `(value, error)`
//! pair. [`IntoStepOutcome`] folds every one of those shapes into the closed
//! [`StepOutcome`] sum, so the engines only ever see three cases.

use crate::error::{BoxError, Failure};
use crate::outcome::{Outcome, Status};

/// The normalized result of one step.
#[derive(Debug)]
pub enum StepOutcome<T> {
    /// The step produced a value.
    Value(T),
    /// The step produced nothing, without failing.
    Absent,
    /// The step failed.
    Failed(Failure),
}

impl<T> StepOutcome<T> {
    /// A present value.
    pub const fn value(value: T) -> Self {
        Self::Value(value)
    }

    /// Absence.
    #[must_use]
    pub const fn absent() -> Self {
        Self::Absent
    }

    /// A domain failure.
    pub fn fail<E: Into<BoxError>>(error: E) -> Self {
        Self::Failed(Failure::domain(error))
    }

    /// `Some` becomes a value, `None` absence.
    pub fn from_option(option: Option<T>) -> Self {
        option.map_or(Self::Absent, Self::Value)
    }

    /// `Ok` becomes a value, `Err` a domain failure.
    pub fn from_result<E: Into<BoxError>>(result: Result<T, E>) -> Self {
        match result {
            Ok(value) => Self::Value(value),
            Err(error) => Self::fail(error),
        }
    }

    /// Lifts an [`Outcome`].
    pub fn from_outcome(outcome: Outcome<T>) -> Self {
        match outcome {
            Ok(Some(value)) => Self::Value(value),
            Ok(None) => Self::Absent,
            Err(failure) => Self::Failed(failure),
        }
    }

    /// A `(value, error)` pair: any error wins and the value is discarded.
    pub fn from_pair<E: Into<BoxError>>((value, error): (T, Option<E>)) -> Self {
        match error {
            Some(error) => Self::fail(error),
            None => Self::Value(value),
        }
    }

    /// Lowers into an [`Outcome`].
    ///
    /// # Errors
    ///
    /// The carried failure for [`StepOutcome::Failed`].
    pub fn into_outcome(self) -> Outcome<T> {
        match self {
            Self::Value(value) => Ok(Some(value)),
            Self::Absent => Ok(None),
            Self::Failed(failure) => Err(failure),
        }
    }

    /// The shape of this outcome.
    pub const fn status(&self) -> Status {
        match self {
            Self::Value(_) => Status::Present,
            Self::Absent => Status::Absent,
            Self::Failed(_) => Status::Failed,
        }
    }
}

/// A return shape that can be normalized into a [`StepOutcome`].
///
/// A bare value has no blanket implementation here (it would overlap with
/// the others); engines accept bare values through a separate entry point.
pub trait IntoStepOutcome {
    /// The value carried on success.
    type Value: 'static;

    /// Normalizes `self`.
    fn into_step_outcome(self) -> StepOutcome<Self::Value>;
}

/// Returning nothing is a successful unit step.
impl IntoStepOutcome for () {
    type Value = ();

    fn into_step_outcome(self) -> StepOutcome<()> {
        StepOutcome::Value(())
    }
}

impl<T: 'static> IntoStepOutcome for StepOutcome<T> {
    type Value = T;

    fn into_step_outcome(self) -> Self {
        self
    }
}

impl<T: 'static> IntoStepOutcome for Option<T> {
    type Value = T;

    fn into_step_outcome(self) -> StepOutcome<T> {
        StepOutcome::from_option(self)
    }
}

impl<T: 'static, E: Into<BoxError>> IntoStepOutcome for Result<T, E> {
    type Value = T;

    fn into_step_outcome(self) -> StepOutcome<T> {
        StepOutcome::from_result(self)
    }
}

impl<T: 'static, E: Into<BoxError>> IntoStepOutcome for (T, Option<E>) {
    type Value = T;

    fn into_step_outcome(self) -> StepOutcome<T> {
        StepOutcome::from_pair(self)
    }
}
