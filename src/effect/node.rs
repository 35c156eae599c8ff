//! Effect nodes: the links of a chain and the policy that runs them.
//!
//! A node never decides for itself whether it should run. Its [`Logic`]
//! declares which predecessor outcome it reacts to, and [`Link::run`]
//! applies the common policy:
//!
//! 1. a node with no predecessor sees its input as absent
//! 2. a failed predecessor propagates untouched unless the node observes failures
//! 3. an absent predecessor propagates untouched unless the node observes absence
//! 4. otherwise the node's own logic runs against the present value
//!
//! `Ensure` is the only kind that runs for every input; it then repropagates
//! the input unchanged.

use std::any::{Any, type_name};
use std::fmt;

use crate::capture::capture;
use crate::error::{Failure, Fault};
use crate::outcome::{Outcome, OutcomeExt, Status};
use crate::store::Store;

pub(crate) type Erased = Box<dyn Any>;
pub(crate) type ErasedOutcome = Outcome<Erased>;

type SourceFn = Box<dyn FnOnce(&mut Store) -> ErasedOutcome>;
type PresentFn = Box<dyn FnOnce(Erased, &mut Store) -> ErasedOutcome>;
type FailedFn = Box<dyn FnOnce(Failure, &mut Store) -> ErasedOutcome>;
type EnsureFn = Box<dyn FnOnce()>;

/// The kind of an effect node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    /// A fixed value.
    Pure,
    /// A value computed when the node runs.
    Lazy,
    /// Absence.
    Empty,
    /// A fixed failure.
    Fail,
    /// A fallible computation.
    Attempt,
    /// A fallible computation reporting `(value, error)`.
    AttemptPair,
    /// A fallible computation with access to the store.
    AttemptWith,
    /// A fallible computation whose arguments are injected from the store.
    AttemptAuto,
    /// A type-directed or named read from the store.
    FromStore,
    /// A sub-chain constructed when the node runs.
    Suspend,
    /// Transforms the present value.
    Map,
    /// Transforms the present value with access to the store.
    MapWith,
    /// Transforms the present value with a fallible function.
    AttemptMap,
    /// Observes the present value by reference.
    Tap,
    /// Consumes the present value for a side effect.
    Foreach,
    /// Turns a present value absent when a predicate fails.
    Filter,
    /// Writes the present value into the store.
    Bind,
    /// Continues with a sub-chain built from the present value.
    FlatMap,
    /// Continues with another chain, discarding the present value.
    Then,
    /// Continues with a sub-chain whose arguments come from a store copy.
    Pipe {
        /// Number of injected parameters.
        arity: usize,
    },
    /// Turns a failure into a value.
    Recover,
    /// Turns a failure into a replacement sub-chain.
    CatchAll,
    /// Turns absence into a value.
    Or,
    /// Turns absence into a replacement sub-chain.
    OrElse,
    /// Turns a present value into a failure.
    FailWith,
    /// Turns a present value into a failure when a predicate holds.
    FailIf,
    /// Turns absence into a failure.
    FailIfEmpty,
    /// Turns a present value into a failure when a check reports one.
    MaybeFail,
    /// Runs a side effect regardless of the outcome.
    Ensure,
    /// Transforms every element of a sequence.
    SliceMap,
    /// Keeps matching elements; absent if none remain.
    SliceFilter,
    /// Transforms every element fallibly; the first failure wins.
    SliceAttemptEach,
    /// Runs a sub-chain per element; absent elements are dropped.
    SliceFlatMap,
    /// Observes every element.
    SliceForeach,
    /// Folds a sequence into one value.
    SliceFold,
    /// Finds the first matching element; absent if none.
    SliceFind,
    /// Turns an empty sequence absent.
    SliceNonEmpty,
}

impl NodeKind {
    /// Returns `true` for kinds that run without needing a present input.
    #[must_use]
    pub const fn is_source(self) -> bool {
        matches!(
            self,
            Self::Pure
                | Self::Lazy
                | Self::Empty
                | Self::Fail
                | Self::Attempt
                | Self::AttemptPair
                | Self::AttemptWith
                | Self::AttemptAuto
                | Self::FromStore
                | Self::Suspend
        )
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pipe { arity } => write!(formatter, "Pipe{arity}"),
            other => fmt::Debug::fmt(other, formatter),
        }
    }
}

/// Diagnostic description of a node: its kind and declared type flow.
///
/// The types are recorded for diagnostics only; dispatch never uses them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NodeInfo {
    kind: NodeKind,
    input: &'static str,
    output: &'static str,
}

impl NodeInfo {
    pub(crate) fn of<A: ?Sized, B: ?Sized>(kind: NodeKind) -> Self {
        Self {
            kind,
            input: type_name::<A>(),
            output: type_name::<B>(),
        }
    }

    /// The node kind.
    #[must_use]
    pub const fn kind(&self) -> NodeKind {
        self.kind
    }

    /// The declared input type.
    #[must_use]
    pub const fn input(&self) -> &'static str {
        self.input
    }

    /// The declared output type.
    #[must_use]
    pub const fn output(&self) -> &'static str {
        self.output
    }
}

impl fmt::Display for NodeInfo {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(formatter, "{}({} -> {})", self.kind, self.input, self.output)
    }
}

/// Lifecycle of a node.
///
/// `Built -> Linked -> Ran`. `Ran` is permanent; a node is never re-run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeState {
    /// Created, not yet part of a chain.
    Built,
    /// Wired to its predecessor (`None` for the base of the chain).
    Linked {
        /// Index of the predecessor in the chain.
        predecessor: Option<usize>,
    },
    /// Evaluated.
    Ran {
        /// The status the node ended with.
        status: Status,
        /// Whether the node's own logic ran, as opposed to propagating.
        invoked: bool,
    },
}

/// What a node reacts to, together with its type-erased behaviour.
pub(crate) enum Logic {
    /// Runs with no input or a present input (ignored).
    Source(SourceFn),
    /// Runs with a present input.
    Present(PresentFn),
    /// Runs with no input or an absent input.
    Absent(SourceFn),
    /// Runs with a failed input.
    Failed(FailedFn),
    /// Runs for every input, then repropagates it.
    Ensure(EnsureFn),
}

impl Logic {
    pub(crate) fn source<B, F>(function: F) -> Self
    where
        B: 'static,
        F: FnOnce(&mut Store) -> Outcome<B> + 'static,
    {
        Self::Source(Box::new(move |store| erase(function(store))))
    }

    pub(crate) fn present<A, B, F>(function: F) -> Self
    where
        A: 'static,
        B: 'static,
        F: FnOnce(A, &mut Store) -> Outcome<B> + 'static,
    {
        Self::Present(Box::new(move |value, store| {
            erase(function(unerase::<A>(value)?, store))
        }))
    }

    pub(crate) fn absent<B, F>(function: F) -> Self
    where
        B: 'static,
        F: FnOnce(&mut Store) -> Outcome<B> + 'static,
    {
        Self::Absent(Box::new(move |store| erase(function(store))))
    }

    pub(crate) fn failed<B, F>(function: F) -> Self
    where
        B: 'static,
        F: FnOnce(Failure, &mut Store) -> Outcome<B> + 'static,
    {
        Self::Failed(Box::new(move |failure, store| erase(function(failure, store))))
    }

    pub(crate) fn ensure<F>(function: F) -> Self
    where
        F: FnOnce() + 'static,
    {
        Self::Ensure(Box::new(function))
    }
}

/// One node in a chain's arena.
pub(crate) struct Link {
    info: NodeInfo,
    state: NodeState,
    logic: Option<Logic>,
}

impl Link {
    pub(crate) fn new(info: NodeInfo, logic: Logic) -> Self {
        Self {
            info,
            state: NodeState::Built,
            logic: Some(logic),
        }
    }

    pub(crate) fn link(&mut self, predecessor: Option<usize>) {
        self.state = NodeState::Linked { predecessor };
    }

    pub(crate) const fn info(&self) -> &NodeInfo {
        &self.info
    }

    pub(crate) const fn state(&self) -> NodeState {
        self.state
    }

    pub(crate) const fn predecessor(&self) -> Option<usize> {
        match self.state {
            NodeState::Linked { predecessor } => predecessor,
            NodeState::Built | NodeState::Ran { .. } => None,
        }
    }

    /// Runs the node against its predecessor's outcome.
    ///
    /// Returns the predecessor's outcome unchanged when the policy skips the
    /// node. Panics raised by the node's logic are contained.
    pub(crate) fn run(
        &mut self,
        index: usize,
        input: Option<ErasedOutcome>,
        store: &mut Store,
    ) -> ErasedOutcome {
        let Some(logic) = self.logic.take() else {
            let fault = Fault::new(self.context(index), "node has already run");
            return Err(Failure::Fault(fault));
        };
        let (outcome, invoked) = self.apply(index, logic, input, store);
        let status = outcome.status();
        self.state = NodeState::Ran { status, invoked };
        if invoked {
            tracing::trace!(index, kind = %self.info.kind, %status, "node ran");
        } else {
            tracing::debug!(index, kind = %self.info.kind, %status, "node short-circuited");
        }
        outcome
    }

    fn apply(
        &self,
        index: usize,
        logic: Logic,
        input: Option<ErasedOutcome>,
        store: &mut Store,
    ) -> (ErasedOutcome, bool) {
        let context = || self.context(index);
        match (logic, input) {
            (Logic::Source(function), None | Some(Ok(Some(_)))) => {
                (capture(context, || function(store)), true)
            }
            (Logic::Present(function), Some(Ok(Some(value)))) => {
                (capture(context, || function(value, store)), true)
            }
            (Logic::Absent(function), None | Some(Ok(None))) => {
                (capture(context, || function(store)), true)
            }
            (Logic::Failed(function), Some(Err(failure))) => {
                (capture(context, || function(failure, store)), true)
            }
            (Logic::Ensure(function), input) => {
                let outcome = input.unwrap_or(Ok(None));
                match capture(context, || {
                    function();
                    Ok(())
                }) {
                    Ok(()) => (outcome, true),
                    Err(failure) => (Err(failure), true),
                }
            }
            (Logic::Present(_) | Logic::Failed(_), None) => (Ok(None), false),
            (_, Some(passthrough)) => (passthrough, false),
        }
    }

    fn context(&self, index: usize) -> String {
        format!("{} node #{index}", self.info.kind)
    }
}

pub(crate) fn erase<B: 'static>(outcome: Outcome<B>) -> ErasedOutcome {
    outcome.map(|value| value.map(|value| Box::new(value) as Erased))
}

pub(crate) fn unerase<A: 'static>(value: Erased) -> Result<A, Failure> {
    value.downcast::<A>().map(|value| *value).map_err(|_| {
        Failure::Fault(Fault::new(
            "effect chain",
            format!("value flowing between nodes is not `{}`", type_name::<A>()),
        ))
    })
}

pub(crate) fn unerase_outcome<A: 'static>(outcome: ErasedOutcome) -> Outcome<A> {
    match outcome {
        Ok(Some(value)) => unerase(value).map(Some),
        Ok(None) => Ok(None),
        Err(failure) => Err(failure),
    }
}
