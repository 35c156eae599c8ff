//! The reflective pipeline.
//!
//! A [`Pipeline<T>`] runs plain functions in order. Each step declares its
//! inputs as ordinary parameters; they are resolved from the shared
//! [`Store`] by type (see [`Computation`]) and the step's result is bound
//! back into the store, where later steps can ask for it.
//!
//! Steps run against a scratch copy of the store. Only a step that yields a
//! value has its copy (with its consumed arguments removed and its result
//! added) committed; a failing or absent step leaves the store untouched and
//! ends the pipeline.
//!
//! # Examples
//!
//! ```rust
//! use effectum::pipeline::Pipeline;
//!
//! let mut pipeline = Pipeline::<i32>::new()
//!     .next(|| 5)
//!     .next(|| 2)
//!     .next(|x: i32, y: i32| x + y);
//!
//! // The newest `i32` is 2, so x = 2 and y = 5.
//! assert_eq!(pipeline.run().as_ref().ok(), Some(&Some(7)));
//! ```

use std::any::{Any, TypeId, type_name};
use std::fmt;

use crate::capture::capture;
use crate::error::{FatalError, LookupError};
use crate::outcome::{Outcome, OutcomeExt};
use crate::phase::{Phase, cast_output, expect_value};
use crate::step::{IntoStepOutcome, StepOutcome};
use crate::store::{Computation, Parameter, Store, StoredValue};

type StepFn = Box<dyn FnOnce(&mut Store) -> Outcome<Box<dyn StoredValue>>>;

/// Metadata describing one pipeline step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepInfo {
    position: usize,
    parameters: Vec<Parameter>,
    required_entries: usize,
    output: &'static str,
}

impl StepInfo {
    /// Zero-based position in the pipeline.
    #[must_use]
    pub const fn position(&self) -> usize {
        self.position
    }

    /// The step's declared parameters, in order.
    #[must_use]
    pub fn parameters(&self) -> &[Parameter] {
        &self.parameters
    }

    /// Number of store entries the parameters draw from.
    #[must_use]
    pub const fn required_entries(&self) -> usize {
        self.required_entries
    }

    /// The type bound into the store on success.
    #[must_use]
    pub const fn output(&self) -> &'static str {
        self.output
    }
}

impl fmt::Display for StepInfo {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(formatter, "#{}(", self.position)?;
        for (index, parameter) in self.parameters.iter().enumerate() {
            if index > 0 {
                formatter.write_str(", ")?;
            }
            formatter.write_str(parameter.type_name())?;
        }
        write!(formatter, ") -> {}", self.output)
    }
}

struct Step {
    info: StepInfo,
    body: StepFn,
}

/// Runs functions whose arguments are injected from a shared store.
pub struct Pipeline<T> {
    steps: Vec<Step>,
    store: Store,
    phase: Phase<T>,
}

static_assertions::assert_not_impl_any!(Pipeline<i32>: Send, Sync);

impl<T: Any> Pipeline<T> {
    /// Creates a pipeline with an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::with_store(Store::new())
    }

    /// Creates a pipeline whose first step draws from `store`.
    #[must_use]
    pub fn with_store(store: Store) -> Self {
        Self {
            steps: Vec::new(),
            store,
            phase: Phase::Ready,
        }
    }

    /// Appends a step returning a bare value.
    ///
    /// A unit return is a successful step that binds nothing.
    #[must_use]
    pub fn next<Args, F>(self, function: F) -> Self
    where
        F: Computation<Args>,
        F::Output: StoredValue,
    {
        self.push_step::<Args, F, F::Output, _>(move |store| {
            function.invoke(store).map(StepOutcome::Value)
        })
    }

    /// Appends a step returning any [`IntoStepOutcome`] shape: `Option`,
    /// `Result`, a `(value, error)` pair, `()` or a [`StepOutcome`].
    ///
    /// # Examples
    ///
    /// ```rust
    /// use effectum::pipeline::Pipeline;
    ///
    /// let mut pipeline = Pipeline::<u8>::new()
    ///     .next(|| "300".to_string())
    ///     .try_next(|text: String| text.parse::<u8>());
    ///
    /// assert!(pipeline.run().is_err());
    /// ```
    #[must_use]
    pub fn try_next<Args, F>(self, function: F) -> Self
    where
        F: Computation<Args>,
        F::Output: IntoStepOutcome,
        <F::Output as IntoStepOutcome>::Value: StoredValue,
    {
        self.push_step::<Args, F, <F::Output as IntoStepOutcome>::Value, _>(move |store| {
            function.invoke(store).map(IntoStepOutcome::into_step_outcome)
        })
    }

    fn push_step<Args, F, V, B>(mut self, body: B) -> Self
    where
        F: Computation<Args>,
        V: StoredValue,
        B: FnOnce(&mut Store) -> Result<StepOutcome<V>, LookupError> + 'static,
    {
        let info = StepInfo {
            position: self.steps.len(),
            parameters: F::parameters(),
            required_entries: F::required_entries(),
            output: type_name::<V>(),
        };
        self.steps.push(Step {
            info,
            body: Box::new(move |store| {
                body(store)?
                    .into_outcome()
                    .map(|value| value.map(|value| Box::new(value) as Box<dyn StoredValue>))
            }),
        });
        self
    }

    /// Describes every step, in order.
    pub fn steps(&self) -> impl Iterator<Item = &StepInfo> {
        self.steps.iter().map(|step| &step.info)
    }

    /// Runs the pipeline, or returns the outcome of the run that already happened.
    ///
    /// # Panics
    ///
    /// Panics with the [`FatalError`] [`Pipeline::try_run`] would return.
    pub fn run(&mut self) -> &Outcome<T> {
        match self.try_run() {
            Ok(outcome) => outcome,
            Err(fatal) => panic!("{fatal}"),
        }
    }

    /// Runs the pipeline, or returns the outcome of the run that already happened.
    ///
    /// # Errors
    ///
    /// - [`FatalError::OutputMismatch`] if the last bound value is not a `T`
    /// - [`FatalError::AlreadyAborted`] if an earlier run was fatal
    pub fn try_run(&mut self) -> Result<&Outcome<T>, FatalError> {
        if self.phase.is_ready() {
            let result = self.evaluate();
            self.phase.settle(result)?;
        }
        self.phase.outcome()
    }

    /// The outcome, if the pipeline has run successfully.
    #[must_use]
    pub fn outcome(&self) -> Option<&Outcome<T>> {
        self.phase.outcome().ok()
    }

    /// The terminal value, if the pipeline has run and produced one.
    #[must_use]
    pub fn yielded(&self) -> Option<&T> {
        self.phase.yielded()
    }

    /// Runs if needed and returns the terminal value.
    ///
    /// # Panics
    ///
    /// Panics on a fatal error, a failure or absence.
    pub fn unsafe_yield(self) -> T {
        expect_value(self.into_outcome(), "pipeline")
    }

    /// Runs if needed and returns the outcome.
    ///
    /// # Panics
    ///
    /// Panics on a fatal error.
    pub fn into_outcome(mut self) -> Outcome<T> {
        if let Err(fatal) = self.try_run() {
            panic!("{fatal}");
        }
        match self.phase.into_outcome() {
            Ok(outcome) => outcome,
            Err(fatal) => panic!("{fatal}"),
        }
    }

    /// The store, with every committed step's result bound.
    #[must_use]
    pub const fn store(&self) -> &Store {
        &self.store
    }

    fn evaluate(&mut self) -> Result<Outcome<T>, FatalError> {
        let span = tracing::debug_span!("pipeline", steps = self.steps.len());
        let _entered = span.enter();

        let mut last: Option<Box<dyn StoredValue>> = None;
        for step in std::mem::take(&mut self.steps) {
            let position = step.info.position;
            let available = self.store.len();
            if step.info.required_entries > available {
                let error = LookupError::Arity {
                    required: step.info.required_entries,
                    available,
                };
                tracing::debug!(position, %error, "step rejected");
                return Ok(Err(error.into()));
            }

            let mut scratch = self.store.copy();
            let outcome = capture(|| format!("pipeline step #{position}"), || (step.body)(&mut scratch));
            tracing::trace!(position, status = %outcome.status(), "step finished");

            match outcome {
                Ok(Some(value)) => {
                    if value.stored_type_id() != TypeId::of::<()>() {
                        scratch.insert_boxed(value.clone_boxed());
                        last = Some(value);
                    }
                    self.store = scratch;
                }
                Ok(None) => return Ok(Ok(None)),
                Err(failure) => return Ok(Err(failure)),
            }
        }

        if TypeId::of::<T>() == TypeId::of::<()>() {
            return cast_output::<T>(Box::new(())).map(|unit| Ok(Some(unit)));
        }
        match last {
            Some(value) => cast_output::<T>(value).map(|value| Ok(Some(value))),
            None => Ok(Ok(None)),
        }
    }
}

impl<T: Any> Default for Pipeline<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> fmt::Debug for Pipeline<T> {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("Pipeline")
            .field("output", &type_name::<T>())
            .field(
                "steps",
                &self.steps.iter().map(|step| step.info.to_string()).collect::<Vec<_>>(),
            )
            .field("store", &self.store)
            .finish_non_exhaustive()
    }
}
