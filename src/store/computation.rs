//! Type-directed argument injection.
//!
//! [`Computation`] is implemented for every `FnOnce` of arity 0 through 10
//! whose parameters are storable. Calling it resolves each parameter from a
//! [`Store`] with a *consuming* type-directed lookup, left to right, so the
//! first parameter receives the newest matching value.
//!
//! # Examples
//!
//! ```rust
//! use effectum::store::{Computation, Store};
//!
//! let mut store = Store::new();
//! store.insert(5_i32);
//! store.insert("five".to_string());
//!
//! let describe = |number: i32, name: String| format!("{name} = {number}");
//! assert_eq!(describe.invoke(&mut store), Ok("five = 5".to_string()));
//! assert!(store.is_empty());
//! ```

use std::any::{Any, TypeId, type_name};

use super::{Store, StoredValue};
use crate::error::LookupError;

/// Describes one parameter of a [`Computation`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Parameter {
    type_id: TypeId,
    type_name: &'static str,
}

impl Parameter {
    /// Describes a parameter of type `T`.
    #[must_use]
    pub fn of<T: Any>() -> Self {
        Self {
            type_id: TypeId::of::<T>(),
            type_name: type_name::<T>(),
        }
    }

    /// The parameter's `TypeId`.
    #[must_use]
    pub const fn type_id(&self) -> TypeId {
        self.type_id
    }

    /// The parameter's type name.
    #[must_use]
    pub const fn type_name(&self) -> &'static str {
        self.type_name
    }

    /// Returns `true` if the parameter asks for the whole store.
    ///
    /// Such parameters always resolve and do not draw from the entries.
    #[must_use]
    pub fn is_store(&self) -> bool {
        self.type_id == TypeId::of::<Store>()
    }
}

/// A function whose arguments are resolved from a [`Store`] by type.
///
/// `Args` is the tuple of parameter types and only serves to keep the
/// implementations for different arities apart.
pub trait Computation<Args>: 'static {
    /// The function's return type.
    type Output;

    /// The declared parameters, in order.
    fn parameters() -> Vec<Parameter>;

    /// Number of store entries the parameters draw from.
    fn required_entries() -> usize {
        Self::parameters()
            .iter()
            .filter(|parameter| !parameter.is_store())
            .count()
    }

    /// Resolves every argument from `store` (consuming) and invokes the function.
    ///
    /// # Errors
    ///
    /// The first [`LookupError`] met while resolving arguments. Arguments
    /// resolved before the failure stay consumed, so callers that need
    /// all-or-nothing semantics resolve against a copy.
    fn invoke(self, store: &mut Store) -> Result<Self::Output, LookupError>;
}

macro_rules! computation_for_arity {
    ($($parameter:ident),*) => {
        impl<Function, Output, $($parameter,)*> Computation<($($parameter,)*)> for Function
        where
            Function: FnOnce($($parameter),*) -> Output + 'static,
            $($parameter: StoredValue,)*
        {
            type Output = Output;

            fn parameters() -> Vec<Parameter> {
                vec![$(Parameter::of::<$parameter>()),*]
            }

            #[allow(non_snake_case, unused_variables)]
            fn invoke(self, store: &mut Store) -> Result<Output, LookupError> {
                $(let $parameter = store.take::<$parameter>()?;)*
                Ok(self($($parameter),*))
            }
        }
    };
}

computation_for_arity!();
computation_for_arity!(P1);
computation_for_arity!(P1, P2);
computation_for_arity!(P1, P2, P3);
computation_for_arity!(P1, P2, P3, P4);
computation_for_arity!(P1, P2, P3, P4, P5);
computation_for_arity!(P1, P2, P3, P4, P5, P6);
computation_for_arity!(P1, P2, P3, P4, P5, P6, P7);
computation_for_arity!(P1, P2, P3, P4, P5, P6, P7, P8);
computation_for_arity!(P1, P2, P3, P4, P5, P6, P7, P8, P9);
computation_for_arity!(P1, P2, P3, P4, P5, P6, P7, P8, P9, P10);
