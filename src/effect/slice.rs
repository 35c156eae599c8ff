//! Element-wise nodes over `Effect<Vec<T>>`.

use super::Effect;
use super::node::{Logic, NodeKind};
use crate::error::{BoxError, Failure};
use crate::outcome::Outcome;
use crate::store::Store;

impl<T: 'static> Effect<Vec<T>> {
    /// Transforms every element.
    pub fn slice_map<U, F>(self, function: F) -> Effect<Vec<U>>
    where
        U: 'static,
        F: FnMut(T) -> U + 'static,
    {
        self.push(
            NodeKind::SliceMap,
            Logic::present(move |items: Vec<T>, _: &mut Store| {
                Ok(Some(items.into_iter().map(function).collect::<Vec<U>>()))
            }),
        )
    }

    /// Keeps the elements matching `predicate`; absent if none remain.
    pub fn slice_filter<F>(self, mut predicate: F) -> Self
    where
        F: FnMut(&T) -> bool + 'static,
    {
        self.push(
            NodeKind::SliceFilter,
            Logic::present(move |items: Vec<T>, _: &mut Store| {
                let kept: Vec<T> = items.into_iter().filter(|item| predicate(item)).collect();
                Ok((!kept.is_empty()).then_some(kept))
            }),
        )
    }

    /// Transforms every element with a fallible function. The first error
    /// fails the whole sequence and the remaining elements are not visited.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use effectum::effect::Effect;
    ///
    /// let parsed = Effect::pure(vec!["1", "2", "x", "4"])
    ///     .slice_attempt_each(str::parse::<u8>)
    ///     .run();
    /// assert!(parsed.is_err());
    /// ```
    pub fn slice_attempt_each<U, E, F>(self, mut function: F) -> Effect<Vec<U>>
    where
        U: 'static,
        E: Into<BoxError>,
        F: FnMut(T) -> Result<U, E> + 'static,
    {
        self.push(
            NodeKind::SliceAttemptEach,
            Logic::present(move |items: Vec<T>, _: &mut Store| {
                items
                    .into_iter()
                    .map(|item| function(item).map_err(Failure::domain))
                    .collect::<Result<Vec<U>, Failure>>()
                    .map(Some)
            }),
        )
    }

    /// Runs each element through the chain `function` builds. Absent
    /// elements are dropped; the first failure fails the sequence.
    pub fn slice_flat_map<U, F>(self, mut function: F) -> Effect<Vec<U>>
    where
        U: 'static,
        F: FnMut(T) -> Effect<U> + 'static,
    {
        self.push(
            NodeKind::SliceFlatMap,
            Logic::present(move |items: Vec<T>, store: &mut Store| -> Outcome<Vec<U>> {
                let mut results = Vec::with_capacity(items.len());
                for item in items {
                    if let Some(result) = function(item).evaluate(store)? {
                        results.push(result);
                    }
                }
                Ok(Some(results))
            }),
        )
    }

    /// Observes every element.
    pub fn slice_foreach<F>(self, mut function: F) -> Self
    where
        F: FnMut(&T) + 'static,
    {
        self.push(
            NodeKind::SliceForeach,
            Logic::present(move |items: Vec<T>, _: &mut Store| {
                items.iter().for_each(&mut function);
                Ok(Some(items))
            }),
        )
    }

    /// Folds the elements into one value.
    pub fn slice_fold<B, F>(self, initial: B, function: F) -> Effect<B>
    where
        B: 'static,
        F: FnMut(B, T) -> B + 'static,
    {
        self.push(
            NodeKind::SliceFold,
            Logic::present(move |items: Vec<T>, _: &mut Store| {
                Ok(Some(items.into_iter().fold(initial, function)))
            }),
        )
    }

    /// Yields the first element matching `predicate`; absent if none does.
    pub fn slice_find<F>(self, mut predicate: F) -> Effect<T>
    where
        F: FnMut(&T) -> bool + 'static,
    {
        self.push(
            NodeKind::SliceFind,
            Logic::present(move |items: Vec<T>, _: &mut Store| {
                Ok(items.into_iter().find(|item| predicate(item)))
            }),
        )
    }

    /// Turns an empty sequence into absence.
    #[must_use]
    pub fn slice_non_empty(self) -> Self {
        self.push(
            NodeKind::SliceNonEmpty,
            Logic::present(|items: Vec<T>, _: &mut Store| Ok((!items.is_empty()).then_some(items))),
        )
    }
}
