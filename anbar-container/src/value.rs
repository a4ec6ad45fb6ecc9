//! The dynamic value currency of the container.
//!
//! Everything the container stores, resolves, or passes to a constructor
//! is a [`Value`]: a shared, type-erased handle. Memoized services hand
//! out clones of the same `Arc`, so object identity is `Arc::ptr_eq`.

use std::any::{type_name, Any};
use std::sync::Arc;

use crate::error::{AnbarError, Result};

/// A shared, type-erased value.
pub type Value = Arc<dyn Any + Send + Sync>;

/// A callable over resolved argument values.
///
/// Used for descriptor constructors, custom factories, and lazy calls.
/// `Arc` rather than `Box` so a callable can sit in several recipes at
/// once and still be invoked through a shared reference.
pub type CallableFn = Arc<dyn Fn(&[Value]) -> Result<Value> + Send + Sync>;

/// Wraps a concrete value into the container's [`Value`] currency.
///
/// # Examples
/// ```
/// use anbar_container::value::{cast, value};
///
/// let v = value(42i32);
/// assert_eq!(*cast::<i32>(&v).unwrap(), 42);
/// ```
pub fn value<T: Send + Sync + 'static>(v: T) -> Value {
    Arc::new(v)
}

/// Downcasts a [`Value`] to a shared handle on its concrete type.
pub fn cast<T: Send + Sync + 'static>(value: &Value) -> Result<Arc<T>> {
    Arc::clone(value)
        .downcast::<T>()
        .map_err(|_| AnbarError::WrongType { expected: type_name::<T>() })
}

/// Borrows a method receiver as its concrete type.
///
/// The counterpart of [`cast`] for method bodies that only need `&T`.
pub fn receiver<T: Send + Sync + 'static>(value: &Value) -> Result<&T> {
    value
        .downcast_ref::<T>()
        .ok_or(AnbarError::WrongType { expected: type_name::<T>() })
}

/// Extracts argument `index` by cloning it out of its `Arc`.
///
/// Missing or mistyped positions produce the errors that surface arity
/// mismatches at construction time.
pub fn typed<T: Clone + Send + Sync + 'static>(args: &[Value], index: usize) -> Result<T> {
    let v = args.get(index).ok_or(AnbarError::MissingArgument {
        index,
        expected: type_name::<T>(),
    })?;
    v.downcast_ref::<T>()
        .cloned()
        .ok_or(AnbarError::WrongArgumentType { index, expected: type_name::<T>() })
}

/// Extracts argument `index` as a shared handle, preserving identity.
///
/// This is the accessor for injected services: the `Arc` handed out by
/// the registry is the `Arc` the constructor receives.
pub fn shared<T: Send + Sync + 'static>(args: &[Value], index: usize) -> Result<Arc<T>> {
    let v = args.get(index).ok_or(AnbarError::MissingArgument {
        index,
        expected: type_name::<T>(),
    })?;
    Arc::clone(v)
        .downcast::<T>()
        .map_err(|_| AnbarError::WrongArgumentType { index, expected: type_name::<T>() })
}
