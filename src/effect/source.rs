//! Source nodes: the base of a chain.
//!
//! A source ignores whatever precedes it. Sources are usually the first
//! node, but `then` style chaining can put one in the middle, where it runs
//! only if everything before it ended with a present value.

use super::Effect;
use super::node::{Logic, NodeKind};
use crate::error::{BoxError, Failure};
use crate::outcome::Outcome;
use crate::step::IntoStepOutcome;
use crate::store::{Computation, Store, StoredValue};

impl<A: 'static> Effect<A> {
    /// A chain that yields `value`.
    pub fn pure(value: A) -> Self {
        Self::source(NodeKind::Pure, Logic::source(move |_: &mut Store| Ok(Some(value))))
    }

    /// A chain that yields the result of `function`, computed when run.
    pub fn lazy<F>(function: F) -> Self
    where
        F: FnOnce() -> A + 'static,
    {
        Self::source(
            NodeKind::Lazy,
            Logic::source(move |_: &mut Store| Ok(Some(function()))),
        )
    }

    /// A chain that yields nothing.
    #[must_use]
    pub fn none() -> Self {
        Self::source(NodeKind::Empty, Logic::source(|_: &mut Store| Ok(None::<A>)))
    }

    /// A chain that fails with `error`.
    pub fn fail<E: Into<BoxError>>(error: E) -> Self {
        let failure = Failure::domain(error);
        Self::source(NodeKind::Fail, Logic::source(move |_: &mut Store| Err::<Option<A>, _>(failure)))
    }

    /// `Some` yields the value, `None` yields nothing.
    pub fn from_option(option: Option<A>) -> Self {
        Self::source(NodeKind::Pure, Logic::source(move |_: &mut Store| Ok(option)))
    }

    /// `Ok` yields the value, `Err` fails.
    pub fn from_result<E: Into<BoxError>>(result: Result<A, E>) -> Self {
        let outcome = result.map(Some).map_err(Failure::domain);
        Self::from_outcome(outcome)
    }

    /// A chain that ends with `outcome`.
    pub fn from_outcome(outcome: Outcome<A>) -> Self {
        Self::source(NodeKind::Pure, Logic::source(move |_: &mut Store| outcome))
    }

    /// Runs a fallible computation.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use effectum::effect::Effect;
    ///
    /// let parsed = Effect::attempt(|| "42".parse::<i32>()).run();
    /// assert_eq!(parsed.unwrap(), Some(42));
    ///
    /// let failed = Effect::attempt(|| "x".parse::<i32>()).run();
    /// assert!(failed.is_err());
    /// ```
    pub fn attempt<E, F>(function: F) -> Self
    where
        E: Into<BoxError>,
        F: FnOnce() -> Result<A, E> + 'static,
    {
        Self::source(
            NodeKind::Attempt,
            Logic::source(move |_: &mut Store| function().map(Some).map_err(Failure::domain)),
        )
    }

    /// Runs a computation that may fail or legitimately produce nothing.
    pub fn attempt_optional<E, F>(function: F) -> Self
    where
        E: Into<BoxError>,
        F: FnOnce() -> Result<Option<A>, E> + 'static,
    {
        Self::source(
            NodeKind::Attempt,
            Logic::source(move |_: &mut Store| function().map_err(Failure::domain)),
        )
    }

    /// Runs a computation reporting `(value, error)`; a reported error wins.
    pub fn attempt_pair<E, F>(function: F) -> Self
    where
        E: Into<BoxError>,
        F: FnOnce() -> (A, Option<E>) + 'static,
    {
        Self::source(
            NodeKind::AttemptPair,
            Logic::source(move |_: &mut Store| match function() {
                (_, Some(error)) => Err(Failure::domain(error)),
                (value, None) => Ok(Some(value)),
            }),
        )
    }

    /// Runs a fallible computation with access to the store.
    pub fn attempt_with<E, F>(function: F) -> Self
    where
        E: Into<BoxError>,
        F: FnOnce(&mut Store) -> Result<A, E> + 'static,
    {
        Self::source(
            NodeKind::AttemptWith,
            Logic::source(move |store: &mut Store| {
                function(store).map(Some).map_err(Failure::domain)
            }),
        )
    }

    /// Runs a computation whose arguments are injected from the store by type.
    ///
    /// Arguments are drawn from a copy of the store. The copy, with the
    /// arguments consumed, replaces the store only when the computation
    /// yields a value.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use effectum::effect::Effect;
    /// use effectum::store::Store;
    ///
    /// let mut store = Store::new();
    /// store.insert(5_i32);
    /// store.insert(2_i32);
    ///
    /// let difference = Effect::attempt_auto(|x: i32, y: i32| Some(x - y)).run_in(&mut store);
    /// assert_eq!(difference.unwrap(), Some(-3));
    /// assert!(store.is_empty());
    /// ```
    pub fn attempt_auto<Args, F>(function: F) -> Self
    where
        F: Computation<Args>,
        F::Output: IntoStepOutcome<Value = A>,
    {
        Self::source(
            NodeKind::AttemptAuto,
            Logic::source(move |store: &mut Store| {
                let mut scratch = store.copy();
                let outcome = function
                    .invoke(&mut scratch)?
                    .into_step_outcome()
                    .into_outcome()?;
                if outcome.is_some() {
                    *store = scratch;
                }
                Ok(outcome)
            }),
        )
    }

    /// Builds the chain to run only when this node is reached.
    pub fn suspend<F>(function: F) -> Self
    where
        F: FnOnce() -> Self + 'static,
    {
        Self::source(
            NodeKind::Suspend,
            Logic::source(move |store: &mut Store| function().evaluate(store)),
        )
    }
}

impl<A: StoredValue> Effect<A> {
    /// Yields the newest store value of type `A` (or a capability that
    /// resolves to it), without consuming it.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use effectum::effect::Effect;
    /// use effectum::store::Store;
    ///
    /// let mut store = Store::new();
    /// store.set("limit", 10_u32);
    ///
    /// let doubled = Effect::<u32>::from_store().map(|limit| limit * 2).run_in(&mut store);
    /// assert_eq!(doubled.unwrap(), Some(20));
    /// ```
    #[must_use]
    pub fn from_store() -> Self {
        Self::source(
            NodeKind::FromStore,
            Logic::source(|store: &mut Store| Ok(Some(store.lookup::<A>()?))),
        )
    }

    /// Yields a copy of the variable called `name`.
    pub fn variable(name: impl Into<String>) -> Self {
        let name = name.into();
        Self::source(
            NodeKind::FromStore,
            Logic::source(move |store: &mut Store| {
                let value = store.get::<A>(&name)?;
                Ok(downcast_owned::<A>(value.clone_boxed()))
            }),
        )
    }
}

fn downcast_owned<A: 'static>(value: Box<dyn StoredValue>) -> Option<A> {
    value.into_any().downcast::<A>().ok().map(|value| *value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::LookupError;
    use crate::outcome::OutcomeExt;
    use rstest::rstest;
    use std::cell::Cell;
    use std::rc::Rc;

    #[rstest]
    fn test_pure_yields_value() {
        assert_eq!(Effect::pure("x").run().ok(), Some(Some("x")));
    }

    #[rstest]
    fn test_none_is_absent() {
        assert!(Effect::<i32>::none().run().is_absent());
    }

    #[rstest]
    fn test_fail_is_domain_failure() {
        let failure = Effect::<i32>::fail("nope").run().err().expect("failure");
        assert_eq!(failure.to_string(), "nope");
        assert!(!failure.is_fault());
    }

    #[rstest]
    fn test_lazy_defers_until_run() {
        let calls = Rc::new(Cell::new(0));
        let counter = Rc::clone(&calls);
        let effect = Effect::lazy(move || {
            counter.set(counter.get() + 1);
            1
        });
        assert_eq!(calls.get(), 0);

        assert_eq!(effect.run().ok(), Some(Some(1)));
        assert_eq!(calls.get(), 1);
    }

    #[rstest]
    #[case(Ok(Some(1)), Some(Some(1)))]
    #[case(Ok(None), Some(None))]
    #[case(Err("bad"), None)]
    fn test_attempt_optional_shapes(
        #[case] result: Result<Option<i32>, &'static str>,
        #[case] expected: Option<Option<i32>>,
    ) {
        assert_eq!(Effect::attempt_optional(move || result).run().ok(), expected);
    }

    #[rstest]
    fn test_attempt_pair_prefers_error() {
        let outcome = Effect::attempt_pair(|| (1, Some("broken"))).run();
        assert!(outcome.is_failure());
    }

    #[rstest]
    fn test_attempt_with_writes_store() {
        let mut store = Store::new();
        let outcome = Effect::attempt_with(|store: &mut Store| {
            store.set("seen", true);
            Ok::<_, BoxError>(3)
        })
        .run_in(&mut store);

        assert_eq!(outcome.ok(), Some(Some(3)));
        assert_eq!(store.get::<bool>("seen"), Ok(&true));
    }

    #[rstest]
    fn test_attempt_auto_keeps_store_on_failure() {
        let mut store = Store::new();
        store.insert(1_i32);

        let outcome = Effect::<i32>::attempt_auto(|value: i32| Err::<i32, _>(format!("rejected {value}")))
            .run_in(&mut store);

        assert!(outcome.is_failure());
        assert_eq!(store.len(), 1);
    }

    #[rstest]
    fn test_attempt_auto_missing_argument_is_lookup_failure() {
        let outcome = Effect::attempt_auto(|text: String| Some(text)).run();

        assert!(matches!(
            outcome,
            Err(Failure::Lookup(LookupError::TypeNotFound { .. }))
        ));
    }

    #[rstest]
    fn test_from_store_reads_newest() {
        let mut store = Store::new();
        store.insert(1_u8);
        store.insert(2_u8);
        assert_eq!(Effect::<u8>::from_store().run_in(&mut store).ok(), Some(Some(2)));
        assert_eq!(store.len(), 2);
    }

    #[rstest]
    fn test_variable_reads_by_name() {
        let mut store = Store::new();
        store.set("user", "ada".to_string());

        let outcome = Effect::<String>::variable("user").run_in(&mut store);
        assert_eq!(outcome.ok(), Some(Some("ada".to_string())));

        let missing = Effect::<String>::variable("admin").run_in(&mut store);
        assert!(missing.is_failure());
    }

    #[rstest]
    fn test_suspend_builds_on_run() {
        let built = Rc::new(Cell::new(false));
        let flag = Rc::clone(&built);
        let effect = Effect::suspend(move || {
            flag.set(true);
            Effect::pure(9)
        });
        assert!(!built.get());
        assert_eq!(effect.run().ok(), Some(Some(9)));
        assert!(built.get());
    }
}
