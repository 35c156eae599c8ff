//! Nodes that act on a present value.

use std::rc::Rc;

use super::Effect;
use super::node::{Logic, NodeKind};
use crate::error::{BoxError, Failure};
use crate::store::{Store, StoredValue};

impl<A: 'static> Effect<A> {
    /// Transforms the present value.
    pub fn map<B, F>(self, function: F) -> Effect<B>
    where
        B: 'static,
        F: FnOnce(A) -> B + 'static,
    {
        self.push(
            NodeKind::Map,
            Logic::present(move |value: A, _: &mut Store| Ok(Some(function(value)))),
        )
    }

    /// Transforms the present value with access to the store.
    pub fn map_with<B, F>(self, function: F) -> Effect<B>
    where
        B: 'static,
        F: FnOnce(A, &mut Store) -> B + 'static,
    {
        self.push(
            NodeKind::MapWith,
            Logic::present(move |value: A, store: &mut Store| Ok(Some(function(value, store)))),
        )
    }

    /// Transforms the present value with a fallible function.
    pub fn attempt_map<B, E, F>(self, function: F) -> Effect<B>
    where
        B: 'static,
        E: Into<BoxError>,
        F: FnOnce(A) -> Result<B, E> + 'static,
    {
        self.push(
            NodeKind::AttemptMap,
            Logic::present(move |value: A, _: &mut Store| {
                function(value).map(Some).map_err(Failure::domain)
            }),
        )
    }

    /// Observes the present value without changing it.
    pub fn tap<F>(self, function: F) -> Self
    where
        F: FnOnce(&A) + 'static,
    {
        self.push(
            NodeKind::Tap,
            Logic::present(move |value: A, _: &mut Store| {
                function(&value);
                Ok(Some(value))
            }),
        )
    }

    /// Consumes the present value for a side effect.
    pub fn foreach<F>(self, function: F) -> Effect<()>
    where
        F: FnOnce(A) + 'static,
    {
        self.push(
            NodeKind::Foreach,
            Logic::present(move |value: A, _: &mut Store| {
                function(value);
                Ok(Some(()))
            }),
        )
    }

    /// Keeps the present value only if `predicate` holds; otherwise the
    /// chain becomes absent.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use effectum::effect::Effect;
    ///
    /// assert_eq!(Effect::pure(15).filter(|age| *age > 20).run().unwrap(), None);
    /// assert_eq!(Effect::pure(15).filter(|age| *age > 10).run().unwrap(), Some(15));
    /// ```
    pub fn filter<F>(self, predicate: F) -> Self
    where
        F: FnOnce(&A) -> bool + 'static,
    {
        self.push(
            NodeKind::Filter,
            Logic::present(move |value: A, _: &mut Store| Ok(predicate(&value).then_some(value))),
        )
    }
}

impl<A: StoredValue> Effect<A> {
    /// Writes a copy of the present value into the store under `name` and
    /// passes the value on.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use effectum::effect::Effect;
    /// use effectum::store::Store;
    ///
    /// let mut store = Store::new();
    /// let outcome = Effect::pure(7).bind("seven").map(|n| n + 1).run_in(&mut store);
    ///
    /// assert_eq!(outcome.unwrap(), Some(8));
    /// assert_eq!(store.get::<i32>("seven"), Ok(&7));
    /// ```
    pub fn bind(self, name: impl Into<String>) -> Self {
        let name = name.into();
        self.push(
            NodeKind::Bind,
            Logic::present(move |value: A, store: &mut Store| {
                store.set_boxed(name, value.clone_boxed(), Rc::from([]));
                Ok(Some(value))
            }),
        )
    }
}
