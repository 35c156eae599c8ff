//! Nodes that react to failure or absence, and `ensure`.

use super::Effect;
use super::node::{Logic, NodeKind};
use crate::error::Failure;
use crate::store::Store;

impl<A: 'static> Effect<A> {
    /// Turns a failure into a value. Present values and absence pass through.
    ///
    /// Faults converted from panics are failures too and are recovered the
    /// same way.
    pub fn recover<F>(self, function: F) -> Self
    where
        F: FnOnce(Failure) -> A + 'static,
    {
        self.push(
            NodeKind::Recover,
            Logic::failed(move |failure, _: &mut Store| Ok(Some(function(failure)))),
        )
    }

    /// Turns a failure into the chain `function` builds from it.
    pub fn catch_all<F>(self, function: F) -> Self
    where
        F: FnOnce(Failure) -> Self + 'static,
    {
        self.push(
            NodeKind::CatchAll,
            Logic::failed(move |failure, store: &mut Store| function(failure).evaluate(store)),
        )
    }

    /// Turns absence into `value`.
    pub fn or(self, value: A) -> Self {
        self.push(NodeKind::Or, Logic::absent(move |_: &mut Store| Ok(Some(value))))
    }

    /// Turns absence into the chain `function` builds.
    pub fn or_else<F>(self, function: F) -> Self
    where
        F: FnOnce() -> Self + 'static,
    {
        self.push(
            NodeKind::OrElse,
            Logic::absent(move |store: &mut Store| function().evaluate(store)),
        )
    }

    /// Runs `function` whatever the chain ended with, then passes that
    /// outcome on unchanged.
    ///
    /// A panic inside `function` replaces the outcome with a fault.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use std::cell::Cell;
    /// use std::rc::Rc;
    /// use effectum::effect::Effect;
    ///
    /// let closed = Rc::new(Cell::new(false));
    /// let flag = Rc::clone(&closed);
    ///
    /// let outcome = Effect::<i32>::fail("boom").ensure(move || flag.set(true)).run();
    ///
    /// assert!(outcome.is_err());
    /// assert!(closed.get());
    /// ```
    pub fn ensure<F>(self, function: F) -> Self
    where
        F: FnOnce() + 'static,
    {
        self.push(NodeKind::Ensure, Logic::ensure(function))
    }
}
