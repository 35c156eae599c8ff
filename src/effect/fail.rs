//! Nodes that turn a value, or its absence, into a failure.

use super::Effect;
use super::node::{Logic, NodeKind};
use crate::error::{BoxError, Failure};
use crate::store::Store;

impl<A: 'static> Effect<A> {
    /// Fails with the error `function` builds from the present value.
    pub fn fail_with<E, F>(self, function: F) -> Self
    where
        E: Into<BoxError>,
        F: FnOnce(A) -> E + 'static,
    {
        self.push(
            NodeKind::FailWith,
            Logic::present(move |value: A, _: &mut Store| {
                Err::<Option<A>, _>(Failure::domain(function(value)))
            }),
        )
    }

    /// Fails when `predicate` holds for the present value.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use effectum::effect::Effect;
    ///
    /// let outcome = Effect::pure(-5)
    ///     .fail_if(|amount| *amount < 0, |amount| format!("negative amount {amount}"))
    ///     .run();
    ///
    /// assert_eq!(outcome.unwrap_err().to_string(), "negative amount -5");
    /// ```
    pub fn fail_if<E, P, F>(self, predicate: P, error: F) -> Self
    where
        E: Into<BoxError>,
        P: FnOnce(&A) -> bool + 'static,
        F: FnOnce(A) -> E + 'static,
    {
        self.push(
            NodeKind::FailIf,
            Logic::present(move |value: A, _: &mut Store| {
                if predicate(&value) {
                    Err(Failure::domain(error(value)))
                } else {
                    Ok(Some(value))
                }
            }),
        )
    }

    /// Fails when the chain is absent.
    pub fn fail_if_empty<E, F>(self, error: F) -> Self
    where
        E: Into<BoxError>,
        F: FnOnce() -> E + 'static,
    {
        self.push(
            NodeKind::FailIfEmpty,
            Logic::absent(move |_: &mut Store| Err::<Option<A>, _>(Failure::domain(error()))),
        )
    }

    /// Fails with the error `check` reports, if any.
    pub fn maybe_fail<E, F>(self, check: F) -> Self
    where
        E: Into<BoxError>,
        F: FnOnce(&A) -> Option<E> + 'static,
    {
        self.push(
            NodeKind::MaybeFail,
            Logic::present(move |value: A, _: &mut Store| match check(&value) {
                Some(error) => Err(Failure::domain(error)),
                None => Ok(Some(value)),
            }),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::outcome::OutcomeExt;
    use rstest::rstest;
    use std::fmt;

    #[derive(Debug, PartialEq)]
    struct Overdrawn(i64);

    impl fmt::Display for Overdrawn {
        fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
            write!(formatter, "overdrawn by {}", self.0)
        }
    }

    impl std::error::Error for Overdrawn {}

    #[rstest]
    fn test_fail_with_keeps_typed_error() {
        let outcome = Effect::pure(-20_i64).fail_with(|balance| Overdrawn(-balance)).run();

        let failure = outcome.err().expect("failure");
        assert_eq!(failure.downcast_ref::<Overdrawn>(), Some(&Overdrawn(20)));
    }

    #[rstest]
    #[case(5, true)]
    #[case(-5, false)]
    fn test_fail_if_checks_predicate(#[case] amount: i32, #[case] passes: bool) {
        let outcome = Effect::pure(amount).fail_if(|value| *value < 0, |_| "negative").run();
        assert_eq!(outcome.is_present(), passes);
    }

    #[rstest]
    fn test_fail_if_empty_converts_absence() {
        let outcome = Effect::<i32>::none().fail_if_empty(|| "nothing found").run();
        assert_eq!(outcome.err().map(|failure| failure.to_string()), Some("nothing found".to_string()));
    }

    #[rstest]
    fn test_fail_if_empty_passes_value() {
        let outcome = Effect::pure(1).fail_if_empty(|| "unused").run();
        assert_eq!(outcome.ok(), Some(Some(1)));
    }

    #[rstest]
    #[case("", Some("empty name"))]
    #[case("ada", None)]
    fn test_maybe_fail_reports(#[case] name: &'static str, #[case] error: Option<&str>) {
        let outcome = Effect::pure(name)
            .maybe_fail(|name| name.is_empty().then_some("empty name"))
            .run();
        assert_eq!(outcome.err().map(|failure| failure.to_string()).as_deref(), error);
    }
}
