//! Effect chains.
//!
//! An [`Effect<A>`] is a lazily evaluated chain of nodes that, when run
//! against a [`Store`], yields an [`Outcome<A>`]. Building a chain does
//! nothing; every combinator appends one node and returns a new handle
//! whose output type reflects the node's output.
//!
//! Evaluation starts at the last node, walks predecessor links down to the
//! base, and runs the nodes bottom-up. Each node sees only its predecessor's
//! outcome, and a shared policy decides whether its logic runs or the
//! outcome is propagated as-is.
//!
//! # Examples
//!
//! ```rust
//! use effectum::effect::Effect;
//!
//! let outcome = Effect::pure(20)
//!     .map(|age| age + 1)
//!     .filter(|age| *age > 20)
//!     .map(|age| format!("age {age}"))
//!     .run();
//!
//! assert_eq!(outcome.unwrap(), Some("age 21".to_string()));
//! ```
//!
//! Failures short-circuit everything but the failure-aware kinds:
//!
//! ```rust
//! use effectum::effect::Effect;
//!
//! let outcome = Effect::<i32>::fail("boom")
//!     .map(|value| value * 2)
//!     .recover(|failure| failure.to_string().len() as i32)
//!     .run();
//!
//! assert_eq!(outcome.unwrap(), Some(4));
//! ```

mod compose;
mod fail;
mod node;
mod recover;
mod slice;
mod source;
mod transform;

pub use node::{NodeInfo, NodeKind, NodeState};

use std::any::type_name;
use std::fmt;
use std::marker::PhantomData;

use smallvec::SmallVec;

use crate::capture::capture;
use crate::outcome::{Outcome, OutcomeExt, Status};
use crate::store::Store;
use node::{ErasedOutcome, Link, Logic, unerase_outcome};

/// Chains shorter than this keep their nodes inline.
const INLINE_LINKS: usize = 8;

/// A lazily evaluated chain of effect nodes producing an [`Outcome<A>`].
///
/// An effect runs at most once: every run method consumes it.
pub struct Effect<A> {
    links: SmallVec<[Link; INLINE_LINKS]>,
    _output: PhantomData<fn() -> A>,
}

static_assertions::assert_not_impl_any!(Effect<i32>: Send, Sync);

impl<A: 'static> Effect<A> {
    pub(crate) fn source(kind: NodeKind, logic: Logic) -> Self {
        let mut link = Link::new(NodeInfo::of::<(), A>(kind), logic);
        link.link(None);
        let mut links = SmallVec::new();
        links.push(link);
        Self {
            links,
            _output: PhantomData,
        }
    }

    pub(crate) fn push<B: 'static>(self, kind: NodeKind, logic: Logic) -> Effect<B> {
        let mut links = self.links;
        let mut link = Link::new(NodeInfo::of::<A, B>(kind), logic);
        link.link(links.len().checked_sub(1));
        links.push(link);
        Effect {
            links,
            _output: PhantomData,
        }
    }

    /// Describes every node, base first.
    pub fn nodes(&self) -> impl Iterator<Item = &NodeInfo> {
        self.links.iter().map(Link::info)
    }

    /// Number of nodes in the chain.
    #[must_use]
    pub fn node_count(&self) -> usize {
        self.links.len()
    }

    /// Runs the chain against a fresh, empty store.
    ///
    /// # Errors
    ///
    /// Whatever failure the chain ends with, including faults converted from
    /// panics inside nodes.
    pub fn run(self) -> Outcome<A> {
        let mut store = Store::new();
        self.run_in(&mut store)
    }

    /// Runs the chain against `store`.
    ///
    /// Nodes that write to the store (`bind`, `map_with`, `attempt_with`, ...)
    /// leave their writes behind after the run.
    ///
    /// # Errors
    ///
    /// Whatever failure the chain ends with.
    pub fn run_in(self, store: &mut Store) -> Outcome<A> {
        self.run_traced(store).outcome
    }

    /// Runs the chain against `store` and reports how every node ended.
    pub fn run_traced(mut self, store: &mut Store) -> Evaluation<A> {
        let span = tracing::debug_span!("effect", nodes = self.links.len());
        let _entered = span.enter();

        let erased = capture(|| "effect chain".to_string(), || self.evaluate_links(store));
        let outcome = unerase_outcome::<A>(erased);
        tracing::debug!(status = %outcome.status(), "effect finished");

        Evaluation {
            outcome,
            nodes: self
                .links
                .iter()
                .map(|link| (*link.info(), link.state()))
                .collect(),
        }
    }

    /// Evaluates the chain without its own barrier. Used for sub-chains,
    /// whose enclosing node already runs under one.
    pub(crate) fn evaluate(mut self, store: &mut Store) -> Outcome<A> {
        unerase_outcome::<A>(self.evaluate_links(store))
    }

    fn evaluate_links(&mut self, store: &mut Store) -> ErasedOutcome {
        let Some(top) = self.links.len().checked_sub(1) else {
            return Ok(None);
        };

        let mut order: SmallVec<[usize; INLINE_LINKS]> = SmallVec::new();
        let mut cursor = Some(top);
        while let Some(index) = cursor {
            order.push(index);
            cursor = self.links[index].predecessor();
        }

        let mut carried: Option<ErasedOutcome> = None;
        for &index in order.iter().rev() {
            carried = Some(self.links[index].run(index, carried, store));
        }
        carried.unwrap_or(Ok(None))
    }
}

impl<A> fmt::Debug for Effect<A> {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("Effect")
            .field("output", &type_name::<A>())
            .field(
                "nodes",
                &self.links.iter().map(|link| link.info().kind()).collect::<Vec<_>>(),
            )
            .finish()
    }
}

impl<A> fmt::Display for Effect<A> {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str("Effect[")?;
        for (index, link) in self.links.iter().enumerate() {
            if index > 0 {
                formatter.write_str(" -> ")?;
            }
            write!(formatter, "{}", link.info().kind())?;
        }
        formatter.write_str("]")
    }
}

/// The result of [`Effect::run_traced`].
#[derive(Debug)]
pub struct Evaluation<A> {
    /// The chain's outcome.
    pub outcome: Outcome<A>,
    /// Every node with its final state, base first.
    pub nodes: Vec<(NodeInfo, NodeState)>,
}

impl<A> Evaluation<A> {
    /// Number of nodes whose own logic ran.
    #[must_use]
    pub fn invoked(&self) -> usize {
        self.nodes
            .iter()
            .filter(|(_, state)| matches!(state, NodeState::Ran { invoked: true, .. }))
            .count()
    }

    /// The final status of the node at `index`, if it ran.
    #[must_use]
    pub fn status_of(&self, index: usize) -> Option<Status> {
        match self.nodes.get(index) {
            Some((_, NodeState::Ran { status, .. })) => Some(*status),
            _ => None,
        }
    }
}
