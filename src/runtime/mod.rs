//! The application runtime.
//!
//! A [`Runtime<T>`] owns a [`Store`], a list of effect chains and a list of
//! bracketed [`Resource`]s. Running it:
//!
//! 1. opens every resource in declared order, binding each handle into the
//!    store under the resource's name
//! 2. runs the chains in order against the shared store, writing each
//!    chain's present value back under the chain's name (or a synthesized
//!    one), and stops at the first failure or absence
//! 3. closes every opened resource, in declared order, whatever happened in
//!    step 2
//!
//! The last evaluated chain's outcome is the runtime's outcome, cast to `T`.
//!
//! Wiring problems (a resource that fails to open or close, a terminal value
//! of the wrong type) are not [`Failure`](crate::error::Failure)s: they are
//! [`FatalError`]s. [`Runtime::try_run`] returns them; [`Runtime::run`]
//! panics with them.
//!
//! # Examples
//!
//! ```rust
//! use effectum::effect::Effect;
//! use effectum::runtime::Runtime;
//!
//! let mut runtime = Runtime::<i32>::new()
//!     .named_chain("x", Effect::pure(5))
//!     .named_chain("y", Effect::pure(2))
//!     .chain(Effect::attempt_auto(|x: i32, y: i32| Some(x + y)));
//!
//! assert_eq!(runtime.run().as_ref().ok(), Some(&Some(7)));
//! ```

mod resource;

pub use resource::Resource;

use std::any::{Any, type_name};
use std::fmt;
use std::rc::Rc;

use crate::effect::Effect;
use crate::error::FatalError;
use crate::outcome::{Outcome, OutcomeExt};
use crate::phase::{Phase, cast_output, expect_value};
use crate::store::{Store, StoredValue};
use resource::Slot;

type ChainFn = Box<dyn FnOnce(&mut Store) -> Outcome<Box<dyn StoredValue>>>;

struct Chain {
    name: Option<String>,
    output: &'static str,
    body: ChainFn,
}

/// Runs effect chains between bracketed resources.
pub struct Runtime<T> {
    chains: Vec<Chain>,
    resources: Vec<Box<dyn Slot>>,
    store: Store,
    phase: Phase<T>,
}

static_assertions::assert_not_impl_any!(Runtime<i32>: Send, Sync);

impl<T: Any> Runtime<T> {
    /// Creates a runtime with an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::with_store(Store::new())
    }

    /// Creates a runtime whose chains start from `store`.
    #[must_use]
    pub fn with_store(store: Store) -> Self {
        Self {
            chains: Vec::new(),
            resources: Vec::new(),
            store,
            phase: Phase::Ready,
        }
    }

    /// Appends a chain whose present value is stored under a synthesized name.
    #[must_use]
    pub fn chain<A: StoredValue>(self, effect: Effect<A>) -> Self {
        self.push_chain(None, effect)
    }

    /// Appends a chain whose present value is stored under `name`.
    #[must_use]
    pub fn named_chain<A: StoredValue>(self, name: impl Into<String>, effect: Effect<A>) -> Self {
        self.push_chain(Some(name.into()), effect)
    }

    /// Declares a resource to open before the chains and close after them.
    #[must_use]
    pub fn resource(mut self, resource: Resource) -> Self {
        self.resources.push(resource.into_slot());
        self
    }

    fn push_chain<A: StoredValue>(mut self, name: Option<String>, effect: Effect<A>) -> Self {
        self.chains.push(Chain {
            name,
            output: type_name::<A>(),
            body: Box::new(move |store| {
                effect
                    .run_in(store)
                    .map(|value| value.map(|value| Box::new(value) as Box<dyn StoredValue>))
            }),
        });
        self
    }

    /// Runs the runtime, or returns the outcome of the run that already happened.
    ///
    /// # Panics
    ///
    /// Panics with the [`FatalError`] [`Runtime::try_run`] would return.
    pub fn run(&mut self) -> &Outcome<T> {
        match self.try_run() {
            Ok(outcome) => outcome,
            Err(fatal) => panic!("{fatal}"),
        }
    }

    /// Runs the runtime, or returns the outcome of the run that already happened.
    ///
    /// # Errors
    ///
    /// - [`FatalError::ResourceOpen`] / [`FatalError::ResourceAbsent`] if a
    ///   resource could not be opened; the already opened ones are closed
    /// - [`FatalError::ResourceClose`] if a close failed (the first one; the
    ///   others are logged)
    /// - [`FatalError::OutputMismatch`] if the terminal value is not a `T`
    /// - [`FatalError::AlreadyAborted`] if an earlier run was fatal
    pub fn try_run(&mut self) -> Result<&Outcome<T>, FatalError> {
        if self.phase.is_ready() {
            let result = self.evaluate();
            self.phase.settle(result)?;
        }
        self.phase.outcome()
    }

    /// The outcome, if the runtime has run successfully.
    #[must_use]
    pub fn outcome(&self) -> Option<&Outcome<T>> {
        self.phase.outcome().ok()
    }

    /// The terminal value, if the runtime has run and produced one.
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
        expect_value(self.into_outcome(), "runtime")
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

    /// The store, with everything bound so far.
    #[must_use]
    pub const fn store(&self) -> &Store {
        &self.store
    }

    fn evaluate(&mut self) -> Result<Outcome<T>, FatalError> {
        let span = tracing::debug_span!(
            "runtime",
            chains = self.chains.len(),
            resources = self.resources.len()
        );
        let _entered = span.enter();

        let mut resources = std::mem::take(&mut self.resources);
        open_all(&mut resources, &mut self.store)?;

        let terminal = self.run_chains();

        if let Err(fatal) = close_all(&mut resources) {
            match &terminal {
                Err(failure) => tracing::error!(error = %failure, "chain failure superseded by close failure"),
                outcome => tracing::debug!(status = %outcome.status(), "chain outcome superseded by close failure"),
            }
            return Err(fatal);
        }

        match terminal {
            Ok(Some(value)) => cast_output::<T>(value).map(|value| Ok(Some(value))),
            Ok(None) => Ok(Ok(None)),
            Err(failure) => Ok(Err(failure)),
        }
    }

    fn run_chains(&mut self) -> Outcome<Box<dyn StoredValue>> {
        let mut terminal = Ok(None);
        for (position, chain) in std::mem::take(&mut self.chains).into_iter().enumerate() {
            let outcome = (chain.body)(&mut self.store);
            let status = outcome.status();
            tracing::debug!(position, name = chain.name.as_deref(), output = chain.output, %status, "chain finished");

            if let Ok(Some(value)) = &outcome {
                let stored = (**value).clone_boxed();
                match chain.name {
                    Some(name) => self.store.set_boxed(name, stored, Rc::from([])),
                    None => {
                        self.store.insert_boxed(stored);
                    }
                }
            }
            terminal = outcome;
            if status.short_circuits() {
                break;
            }
        }
        terminal
    }
}

impl<T: Any> Default for Runtime<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> fmt::Debug for Runtime<T> {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("Runtime")
            .field("output", &type_name::<T>())
            .field(
                "chains",
                &self.chains.iter().map(|chain| chain.output).collect::<Vec<_>>(),
            )
            .field(
                "resources",
                &self.resources.iter().map(|slot| slot.name()).collect::<Vec<_>>(),
            )
            .field("store", &self.store)
            .finish_non_exhaustive()
    }
}

/// Opens every resource, binding handles into `store`. On the first failure
/// the already opened resources are closed before the error is returned.
fn open_all(resources: &mut [Box<dyn Slot>], store: &mut Store) -> Result<(), FatalError> {
    for position in 0..resources.len() {
        let slot = &mut resources[position];
        let name = slot.name().to_string();
        let fatal = match slot.open() {
            Ok(Some(handle)) => {
                tracing::info!(resource = %name, "resource opened");
                store.set_boxed(name, handle, Rc::from([]));
                continue;
            }
            Ok(None) => FatalError::ResourceAbsent { name },
            Err(source) => FatalError::ResourceOpen { name, source },
        };
        tracing::error!(error = %fatal, "resource open failed");
        if let Err(close_failure) = close_all(&mut resources[..position]) {
            tracing::error!(error = %close_failure, "cleanup after failed open also failed");
        }
        return Err(fatal);
    }
    Ok(())
}

/// Closes every resource in order. All closes are attempted; the first
/// failure is returned and the rest are logged.
fn close_all(resources: &mut [Box<dyn Slot>]) -> Result<(), FatalError> {
    let mut first = None;
    for slot in resources.iter_mut() {
        match slot.close() {
            Ok(()) => tracing::info!(resource = slot.name(), "resource closed"),
            Err(source) => {
                let fatal = FatalError::ResourceClose {
                    name: slot.name().to_string(),
                    source,
                };
                tracing::error!(error = %fatal, "resource close failed");
                if first.is_none() {
                    first = Some(fatal);
                }
            }
        }
    }
    first.map_or(Ok(()), Err)
}
