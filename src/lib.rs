//! # effectum
//!
//! A small runtime for composing effectful steps.
//!
//! ## Overview
//!
//! Every step in this crate reports through the same two-layer contract,
//! [`Outcome<T>`](outcome::Outcome): a step either fails, legitimately
//! produces nothing, or produces a value. On top of that contract the crate
//! provides:
//!
//! - **Store**: a typed, ordered variable store with type-directed lookup
//! - **Effect chains**: lazily evaluated node chains with short-circuiting,
//!   recovery and cleanup
//! - **Runtime**: runs a list of chains between bracketed resources
//! - **Pipeline**: runs plain functions whose arguments are injected from
//!   the store by type
//!
//! Panics raised by user code are contained at every evaluation boundary
//! and surface as [`Failure::Fault`](error::Failure::Fault).
//!
//! ## Feature Flags
//!
//! - `effect`: Store and effect chains
//! - `runtime`: Runtime with resource bracketing
//! - `pipeline`: Reflective pipeline
//! - `json`: JSON and transport collaborators
//! - `full`: Enable all features
//!
//! ## Example
//!
//! ```rust
//! use effectum::prelude::*;
//!
//! let outcome = Effect::pure(5)
//!     .map(|value| value * 2)
//!     .filter(|value| *value > 5)
//!     .run();
//!
//! assert_eq!(outcome.unwrap(), Some(10));
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
// Note: Disabling redundant_closure_for_method_calls due to clippy 0.1.92 panic bug
#![allow(clippy::redundant_closure_for_method_calls)]

/// Prelude module for convenient imports.
///
/// Re-exports commonly used types and traits.
///
/// # Usage
///
/// ```rust
/// use effectum::prelude::*;
/// ```
pub mod prelude {
    pub use crate::error::{BoxError, FatalError, Failure, Fault, LookupError};
    pub use crate::outcome::{Outcome, OutcomeExt, Status};

    #[cfg(feature = "effect")]
    pub use crate::effect::{Effect, Evaluation, NodeInfo, NodeKind, NodeState};

    #[cfg(feature = "effect")]
    pub use crate::step::{IntoStepOutcome, StepOutcome};

    #[cfg(feature = "effect")]
    pub use crate::store::{Capability, Computation, Store};

    #[cfg(feature = "runtime")]
    pub use crate::runtime::{Resource, Runtime};

    #[cfg(feature = "pipeline")]
    pub use crate::pipeline::{Pipeline, StepInfo};

    #[cfg(feature = "json")]
    pub use crate::codec::Transport;
}

pub mod capture;
pub mod error;
pub mod outcome;

#[cfg(feature = "effect")]
pub mod store;

#[cfg(feature = "effect")]
pub mod step;

#[cfg(feature = "effect")]
pub mod effect;

#[cfg(any(feature = "runtime", feature = "pipeline"))]
mod phase;

#[cfg(feature = "runtime")]
pub mod runtime;

#[cfg(feature = "pipeline")]
pub mod pipeline;

#[cfg(feature = "json")]
pub mod codec;
