//! Type-erased values and capability projections held by a [`Store`](super::Store).

use std::any::{Any, TypeId, type_name};
use std::fmt;
use std::rc::Rc;

/// A value that can live in a [`Store`](super::Store).
///
/// Implemented for every `Any + Clone` type. Cloning is what lets a store be
/// copied so that consuming from the copy leaves the original untouched.
pub trait StoredValue: Any {
    /// Clones the value behind a fresh box.
    fn clone_boxed(&self) -> Box<dyn StoredValue>;

    /// Borrows the value as `Any`.
    fn as_any(&self) -> &dyn Any;

    /// Converts the box into `Box<dyn Any>` for downcasting by value.
    fn into_any(self: Box<Self>) -> Box<dyn Any>;

    /// The `TypeId` of the concrete value.
    fn stored_type_id(&self) -> TypeId;

    /// The type name of the concrete value.
    fn stored_type_name(&self) -> &'static str;
}

impl<T: Any + Clone> StoredValue for T {
    fn clone_boxed(&self) -> Box<dyn StoredValue> {
        Box::new(self.clone())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn into_any(self: Box<Self>) -> Box<dyn Any> {
        self
    }

    fn stored_type_id(&self) -> TypeId {
        TypeId::of::<T>()
    }

    fn stored_type_name(&self) -> &'static str {
        type_name::<T>()
    }
}

type Projection = dyn Fn(&dyn Any) -> Option<Box<dyn Any>>;

/// Declares that a stored value can also be resolved as another type.
///
/// This is how an entry "satisfies an interface": the projection builds the
/// requested view (typically a trait object behind `Rc`/`Box`) from the
/// stored value whenever a type-directed lookup asks for it.
///
/// # Examples
///
/// ```rust
/// use effectum::store::{Capability, Store};
/// use std::fmt::Display;
/// use std::rc::Rc;
///
/// let mut store = Store::new();
/// store.set_with(
///     "answer",
///     42_i32,
///     [Capability::new(|value: &i32| Rc::new(*value) as Rc<dyn Display>)],
/// );
///
/// let shown: Rc<dyn Display> = store.lookup().unwrap();
/// assert_eq!(shown.to_string(), "42");
/// ```
#[derive(Clone)]
pub struct Capability {
    target: TypeId,
    target_name: &'static str,
    project: Rc<Projection>,
}

impl Capability {
    /// Creates a capability projecting a stored `T` into a `K`.
    pub fn new<T, K, F>(project: F) -> Self
    where
        T: Any,
        K: Any,
        F: Fn(&T) -> K + 'static,
    {
        Self {
            target: TypeId::of::<K>(),
            target_name: type_name::<K>(),
            project: Rc::new(move |value: &dyn Any| {
                value
                    .downcast_ref::<T>()
                    .map(|concrete| Box::new(project(concrete)) as Box<dyn Any>)
            }),
        }
    }

    /// The `TypeId` this capability resolves.
    #[must_use]
    pub const fn target(&self) -> TypeId {
        self.target
    }

    /// The name of the type this capability resolves.
    #[must_use]
    pub const fn target_name(&self) -> &'static str {
        self.target_name
    }

    pub(crate) fn apply(&self, value: &dyn Any) -> Option<Box<dyn Any>> {
        (self.project)(value)
    }
}

impl fmt::Debug for Capability {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("Capability")
            .field("target", &self.target_name)
            .finish_non_exhaustive()
    }
}
