//! Sequencing nodes: continuing a chain with another chain.

use super::Effect;
use super::node::{Logic, NodeKind};
use crate::store::{Computation, Store, StoredValue};

impl<A: 'static> Effect<A> {
    /// Continues with the chain `function` builds from the present value.
    ///
    /// The sub-chain runs against the same store.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use effectum::effect::Effect;
    ///
    /// let outcome = Effect::pure(4)
    ///     .flat_map(|n| if n % 2 == 0 { Effect::pure(n / 2) } else { Effect::none() })
    ///     .run();
    /// assert_eq!(outcome.unwrap(), Some(2));
    /// ```
    pub fn flat_map<B, F>(self, function: F) -> Effect<B>
    where
        B: 'static,
        F: FnOnce(A) -> Effect<B> + 'static,
    {
        self.push(
            NodeKind::FlatMap,
            Logic::present(move |value: A, store: &mut Store| function(value).evaluate(store)),
        )
    }

    /// Alias for [`Effect::flat_map`].
    pub fn and_then<B, F>(self, function: F) -> Effect<B>
    where
        B: 'static,
        F: FnOnce(A) -> Effect<B> + 'static,
    {
        self.flat_map(function)
    }

    /// Continues with `next` once this chain yields a value, discarding it.
    pub fn then<B: 'static>(self, next: Effect<B>) -> Effect<B> {
        self.push(
            NodeKind::Then,
            Logic::present(move |_: A, store: &mut Store| next.evaluate(store)),
        )
    }
}

impl<A: StoredValue> Effect<A> {
    /// Continues with the chain built by `function`, whose arguments are
    /// injected from the store by type.
    ///
    /// The branch works on a copy of the store with the present value
    /// inserted as its newest entry. Arguments are consumed from that copy
    /// and the sub-chain runs against it too, so nothing the branch does is
    /// visible to the caller's store.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use effectum::effect::Effect;
    /// use effectum::store::Store;
    ///
    /// let mut store = Store::new();
    /// store.set("greeting", "hello".to_string());
    ///
    /// let outcome = Effect::pure(3_usize)
    ///     .pipe(|times: usize, word: String| Effect::pure(word.repeat(times)))
    ///     .run_in(&mut store);
    ///
    /// assert_eq!(outcome.unwrap(), Some("hellohellohello".to_string()));
    /// assert!(store.contains("greeting"));
    /// ```
    pub fn pipe<Args, B, F>(self, function: F) -> Effect<B>
    where
        B: 'static,
        F: Computation<Args, Output = Effect<B>>,
    {
        let arity = F::parameters().len();
        self.push(
            NodeKind::Pipe { arity },
            Logic::present(move |value: A, store: &mut Store| {
                let mut branch = store.copy();
                branch.insert(value);
                function.invoke(&mut branch)?.evaluate(&mut branch)
            }),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{Failure, LookupError};
    use crate::outcome::OutcomeExt;
    use rstest::rstest;

    #[rstest]
    fn test_flat_map_sub_chain_failure_propagates() {
        let outcome = Effect::pure(1)
            .flat_map(|_| Effect::<i32>::fail("inner"))
            .map(|value| value + 1)
            .run();
        assert_eq!(outcome.err().map(|failure| failure.to_string()), Some("inner".to_string()));
    }

    #[rstest]
    fn test_flat_map_shares_store() {
        let mut store = Store::new();
        let outcome = Effect::pure(5)
            .flat_map(|value| Effect::pure(value).bind("inner"))
            .run_in(&mut store);

        assert_eq!(outcome.ok(), Some(Some(5)));
        assert_eq!(store.get::<i32>("inner"), Ok(&5));
    }

    #[rstest]
    fn test_then_skipped_when_absent() {
        let outcome = Effect::<()>::none().then(Effect::pure(1)).run();
        assert!(outcome.is_absent());
    }

    #[rstest]
    fn test_then_discards_value() {
        let outcome = Effect::pure("first").then(Effect::pure(2)).run();
        assert_eq!(outcome.ok(), Some(Some(2)));
    }

    #[rstest]
    fn test_pipe_sees_propagated_value_first() {
        let mut store = Store::new();
        store.insert(100_i32);

        let outcome = Effect::pure(1_i32)
            .pipe(|newest: i32, older: i32| Effect::pure(newest - older))
            .run_in(&mut store);

        assert_eq!(outcome.ok(), Some(Some(-99)));
        assert_eq!(store.len(), 1);
    }

    #[rstest]
    fn test_pipe_branch_writes_stay_isolated() {
        let mut store = Store::new();
        let outcome = Effect::pure(2_u8)
            .pipe(|value: u8| Effect::pure(value).bind("branch"))
            .run_in(&mut store);

        assert_eq!(outcome.ok(), Some(Some(2)));
        assert!(!store.contains("branch"));
    }

    #[rstest]
    fn test_pipe_missing_argument_fails_with_lookup() {
        let outcome = Effect::pure(1_i32)
            .pipe(|_: i32, text: String| Effect::pure(text))
            .run();
        assert!(matches!(
            outcome,
            Err(Failure::Lookup(LookupError::TypeNotFound { .. }))
        ));
    }

    #[rstest]
    fn test_pipe_records_arity() {
        let effect = Effect::pure(1_i32).pipe(|a: i32, b: Store| Effect::pure(a + b.len() as i32));
        let last = effect.nodes().last().map(|info| info.kind());
        assert_eq!(last, Some(NodeKind::Pipe { arity: 2 }));
    }

    #[rstest]
    fn test_pipe_store_parameter_sees_branch() {
        let outcome = Effect::pure(9_u16)
            .pipe(|store: Store| Effect::pure(store.lookup::<u16>().ok()))
            .run();
        assert_eq!(outcome.ok(), Some(Some(Some(9))));
    }
}
