//! Bracketed resources.
//!
//! A [`Resource`] pairs an `open` with a `close`. The runtime opens every
//! declared resource before its first chain, binds the opened value into
//! the store under the resource's name, and closes every opened resource
//! after the chains, whatever they ended with.

use std::fmt;

use crate::capture::capture;
use crate::error::{BoxError, Failure};
use crate::outcome::Outcome;
use crate::store::StoredValue;

/// Erased open/close pair held by a runtime.
pub(crate) trait Slot {
    fn name(&self) -> &str;

    /// Opens the resource and returns the value to bind into the store.
    fn open(&mut self) -> Outcome<Box<dyn StoredValue>>;

    /// Closes the resource if it was opened. Closing twice is a no-op.
    fn close(&mut self) -> Result<(), Failure>;
}

type OpenFn<R> = Box<dyn FnOnce() -> Outcome<R>>;
type CloseFn<R> = Box<dyn FnOnce(R) -> Result<(), Failure>>;

struct Bracket<R> {
    name: String,
    open: Option<OpenFn<R>>,
    close: Option<CloseFn<R>>,
    handle: Option<R>,
}

impl<R: StoredValue + Clone> Slot for Bracket<R> {
    fn name(&self) -> &str {
        &self.name
    }

    fn open(&mut self) -> Outcome<Box<dyn StoredValue>> {
        let Some(open) = self.open.take() else {
            return Ok(None);
        };
        let opened = capture(|| format!("resource `{}` open", self.name), open)?;
        Ok(opened.map(|handle| {
            let bound: Box<dyn StoredValue> = Box::new(handle.clone());
            self.handle = Some(handle);
            bound
        }))
    }

    fn close(&mut self) -> Result<(), Failure> {
        let (Some(handle), Some(close)) = (self.handle.take(), self.close.take()) else {
            return Ok(());
        };
        capture(|| format!("resource `{}` close", self.name), || close(handle))
    }
}

/// A named resource with guaranteed cleanup.
///
/// `close` receives the handle `open` produced. The store holds a clone of
/// that handle, so handles are typically cheap shared references
/// (`Rc<RefCell<_>>`, connection pools, ...).
///
/// # Examples
///
/// ```rust
/// use std::cell::RefCell;
/// use std::rc::Rc;
/// use effectum::runtime::Resource;
///
/// let log = Rc::new(RefCell::new(Vec::new()));
/// let closing = Rc::clone(&log);
///
/// let resource = Resource::new(
///     "connection",
///     || Ok::<_, String>(Rc::new("db://local".to_string())),
///     move |connection: Rc<String>| {
///         closing.borrow_mut().push(format!("closed {connection}"));
///         Ok::<_, String>(())
///     },
/// );
/// assert_eq!(resource.name(), "connection");
/// ```
pub struct Resource {
    slot: Box<dyn Slot>,
}

impl Resource {
    /// Declares a resource whose `open` always produces a handle or fails.
    pub fn new<R, E1, E2, O, C>(name: impl Into<String>, open: O, close: C) -> Self
    where
        R: StoredValue + Clone,
        E1: Into<BoxError>,
        E2: Into<BoxError>,
        O: FnOnce() -> Result<R, E1> + 'static,
        C: FnOnce(R) -> Result<(), E2> + 'static,
    {
        Self::optional(name, move || open().map(Some), close)
    }

    /// Declares a resource whose `open` may legitimately produce nothing.
    ///
    /// A runtime treats an absent open as fatal.
    pub fn optional<R, E1, E2, O, C>(name: impl Into<String>, open: O, close: C) -> Self
    where
        R: StoredValue + Clone,
        E1: Into<BoxError>,
        E2: Into<BoxError>,
        O: FnOnce() -> Result<Option<R>, E1> + 'static,
        C: FnOnce(R) -> Result<(), E2> + 'static,
    {
        let bracket = Bracket {
            name: name.into(),
            open: Some(Box::new(move || open().map_err(Failure::domain))),
            close: Some(Box::new(move |handle| close(handle).map_err(Failure::domain))),
            handle: None,
        };
        Self {
            slot: Box::new(bracket),
        }
    }

    /// The name the opened handle is bound under.
    #[must_use]
    pub fn name(&self) -> &str {
        self.slot.name()
    }

    pub(crate) fn into_slot(self) -> Box<dyn Slot> {
        self.slot
    }
}

impl fmt::Debug for Resource {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("Resource")
            .field("name", &self.name())
            .finish_non_exhaustive()
    }
}
