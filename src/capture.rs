//! The run-and-capture barrier.
//!
//! Every node, chain and pipeline step runs through [`capture`], which
//! catches a panic raised by user code and converts it into
//! [`Failure::Fault`]. A panic never unwinds past an evaluation boundary.
//!
//! # Examples
//!
//! ```rust
//! use effectum::capture::capture;
//! use effectum::error::Failure;
//!
//! let result: Result<i32, Failure> = capture(|| "example".to_string(), || panic!("oops"));
//! let failure = result.unwrap_err();
//! assert_eq!(failure.fault().map(|fault| fault.message()), Some("oops"));
//! ```

use std::any::Any;
use std::panic::{AssertUnwindSafe, catch_unwind};

use crate::error::{Failure, Fault};

/// Runs `body`, converting a panic into a [`Failure::Fault`].
///
/// `context` is only evaluated when a panic is caught and names the
/// boundary in the resulting fault.
///
/// # Errors
///
/// Returns whatever `body` returns, or `Failure::Fault` if it panicked.
pub fn capture<T, C, B>(context: C, body: B) -> Result<T, Failure>
where
    C: FnOnce() -> String,
    B: FnOnce() -> Result<T, Failure>,
{
    match catch_unwind(AssertUnwindSafe(body)) {
        Ok(result) => result,
        Err(payload) => {
            let fault = Fault::from_panic(context(), payload.as_ref());
            tracing::warn!(
                context = fault.context(),
                message = fault.message(),
                "panic contained at evaluation boundary"
            );
            Err(Failure::Fault(fault))
        }
    }
}

/// Extracts a readable message from a panic payload.
#[must_use]
pub fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "Unknown panic".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    fn test_passes_through_success() {
        let result = capture(|| "unused".to_string(), || Ok::<_, Failure>(42));
        assert_eq!(result.ok(), Some(42));
    }

    #[rstest]
    fn test_passes_through_failure() {
        let result: Result<i32, Failure> =
            capture(|| "unused".to_string(), || Err(Failure::message("boom")));
        let failure = result.unwrap_err();
        assert!(!failure.is_fault());
        assert_eq!(failure.to_string(), "boom");
    }

    #[rstest]
    fn test_converts_str_panic() {
        let result: Result<i32, Failure> = capture(|| "map node #1".to_string(), || panic!("oops"));
        let failure = result.unwrap_err();
        let fault = failure.fault().expect("fault");
        assert_eq!(fault.context(), "map node #1");
        assert_eq!(fault.message(), "oops");
    }

    #[rstest]
    fn test_converts_formatted_panic() {
        let index = 7;
        let result: Result<i32, Failure> =
            capture(|| "chain".to_string(), || panic!("index {index} out of range"));
        assert_eq!(
            result.unwrap_err().fault().map(Fault::message),
            Some("index 7 out of range")
        );
    }

    #[rstest]
    fn test_unknown_payload() {
        let payload: Box<dyn Any + Send> = Box::new(17_u8);
        assert_eq!(panic_message(payload.as_ref()), "Unknown panic");
    }
}
