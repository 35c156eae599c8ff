//! The two-layer result contract shared by every step.
//!
//! Every node, chain, runtime and pipeline in this crate reports through
//! [`Outcome<T>`], which is `Result<Option<T>, Failure>`:
//!
//! - `Ok(Some(value))` - a present value
//! - `Ok(None)` - legitimate absence
//! - `Err(failure)` - a failure
//!
//! Error dominates absence, and absence dominates presence: once a chain has
//! failed it stays failed, and once it is empty only the absence-aware node
//! kinds can bring a value back.
//!
//! # Examples
//!
//! ```rust
//! use effectum::outcome::{Outcome, OutcomeExt, Status};
//!
//! let present: Outcome<i32> = Ok(Some(1));
//! let absent: Outcome<i32> = Ok(None);
//!
//! assert_eq!(present.status(), Status::Present);
//! assert!(absent.is_absent());
//! assert_eq!(present.present(), Some(&1));
//! ```

use std::fmt;

use crate::error::Failure;

/// The result of running a step: failure, absence or a present value.
pub type Outcome<T> = Result<Option<T>, Failure>;

/// The shape of an [`Outcome`] without its payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Status {
    /// The step produced a value.
    Present,
    /// The step produced nothing, without failing.
    Absent,
    /// The step failed.
    Failed,
}

impl Status {
    /// Returns `true` when evaluation should stop at this status.
    ///
    /// Both failure and absence stop a runtime's chain list.
    #[must_use]
    pub const fn short_circuits(self) -> bool {
        !matches!(self, Self::Present)
    }
}

impl fmt::Display for Status {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Present => "present",
            Self::Absent => "absent",
            Self::Failed => "failed",
        };
        formatter.write_str(label)
    }
}

/// Inspection helpers for [`Outcome`].
pub trait OutcomeExt<T> {
    /// Returns the [`Status`] of this outcome.
    fn status(&self) -> Status;

    /// Returns a reference to the present value, if any.
    fn present(&self) -> Option<&T>;

    /// Returns `true` for `Ok(Some(_))`.
    fn is_present(&self) -> bool {
        self.status() == Status::Present
    }

    /// Returns `true` for `Ok(None)`.
    fn is_absent(&self) -> bool {
        self.status() == Status::Absent
    }

    /// Returns `true` for `Err(_)`.
    fn is_failure(&self) -> bool {
        self.status() == Status::Failed
    }
}

impl<T> OutcomeExt<T> for Outcome<T> {
    fn status(&self) -> Status {
        match self {
            Ok(Some(_)) => Status::Present,
            Ok(None) => Status::Absent,
            Err(_) => Status::Failed,
        }
    }

    fn present(&self) -> Option<&T> {
        match self {
            Ok(Some(value)) => Some(value),
            _ => None,
        }
    }
}
