//! Deferred, composable computation nodes.
//!
//! A [`Lazy`] stands for a value that does not exist yet: fetch a shared
//! service, construct a fresh instance, invoke a callable, or auto-resolve
//! a typed dependency. Forcing is the only operation; until then a lazy is
//! inert and can sit inside recipes, registries, and other lazies.
//!
//! Resolution is recursive: a call's arguments are themselves [`Arg`]s and
//! any nested lazy among them is forced first.
//!
//! Lazies hold [`Weak`] handles back to the registry and factory, so a
//! registry may store lazies that point at itself without keeping itself
//! alive forever. Forcing a lazy that outlived its container fails with
//! [`AnbarError::ContainerGone`].

use std::fmt;
use std::sync::{Arc, Weak};

use crate::catalog::Catalog;
use crate::error::{AnbarError, Result};
use crate::factory::Factory;
use crate::registry::Registry;
use crate::value::{CallableFn, Value};

/// One configured argument: a literal value or a deferred one.
#[derive(Clone)]
pub enum Arg {
    Value(Value),
    Lazy(Lazy),
}

impl Arg {
    /// Wraps a literal into an argument.
    pub fn of<T: Send + Sync + 'static>(v: T) -> Self {
        Arg::Value(Arc::new(v))
    }

    /// Resolves this argument, forcing it if deferred.
    pub fn resolve(&self) -> Result<Value> {
        match self {
            Arg::Value(v) => Ok(Arc::clone(v)),
            Arg::Lazy(lazy) => lazy.force(),
        }
    }
}

impl From<Lazy> for Arg {
    fn from(lazy: Lazy) -> Self {
        Arg::Lazy(lazy)
    }
}

impl fmt::Debug for Arg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Arg::Value(_) => write!(f, "Arg::Value"),
            Arg::Lazy(lazy) => write!(f, "Arg::Lazy({lazy:?})"),
        }
    }
}

/// Resolves an argument sequence, forcing any lazy among it.
pub fn resolve_args(args: &[Arg]) -> Result<Vec<Value>> {
    args.iter().map(Arg::resolve).collect()
}

/// The target of a [`Lazy::Call`].
#[derive(Clone)]
pub enum CallTarget {
    /// A plain callable.
    Callable(CallableFn),
    /// A method on whatever `target` forces to, dispatched through the
    /// catalog by the receiver's runtime type.
    Method {
        target: Box<Lazy>,
        method: String,
        catalog: Arc<Catalog>,
    },
}

/// A deferred value. Forcing yields the concrete [`Value`].
///
/// Memoization differs by variant: `Service` goes through the registry and
/// is forced at most once per id; `New`, `Call`, and `Auto` without a
/// registry entry perform their work on every force.
#[derive(Clone)]
pub enum Lazy {
    /// Fetch (and thereby memoize) a registry service.
    Service { registry: Weak<Registry>, id: String },
    /// Construct a fresh instance through the factory.
    New {
        factory: Weak<Factory>,
        class: String,
        args: Vec<Arg>,
    },
    /// Invoke a callable or bound method with resolved arguments.
    Call { target: CallTarget, args: Vec<Arg> },
    /// Prefer the registry entry named after the class; fall back to a
    /// fresh factory instance.
    Auto {
        registry: Weak<Registry>,
        factory: Weak<Factory>,
        class: String,
    },
}

impl Lazy {
    /// A lazy registry lookup.
    pub fn service(registry: &Arc<Registry>, id: impl Into<String>) -> Self {
        Lazy::Service { registry: Arc::downgrade(registry), id: id.into() }
    }

    /// A lazy construction of `class`, with positional overrides.
    pub fn make(factory: &Arc<Factory>, class: impl Into<String>, args: Vec<Arg>) -> Self {
        Lazy::New {
            factory: Arc::downgrade(factory),
            class: class.into(),
            args,
        }
    }

    /// A lazy invocation of a callable.
    pub fn call(
        f: impl Fn(&[Value]) -> Result<Value> + Send + Sync + 'static,
        args: Vec<Arg>,
    ) -> Self {
        Lazy::Call { target: CallTarget::Callable(Arc::new(f)), args }
    }

    /// A lazy method invocation on whatever `target` forces to.
    pub fn bound_call(
        target: Lazy,
        method: impl Into<String>,
        catalog: &Arc<Catalog>,
        args: Vec<Arg>,
    ) -> Self {
        Lazy::Call {
            target: CallTarget::Method {
                target: Box::new(target),
                method: method.into(),
                catalog: Arc::clone(catalog),
            },
            args,
        }
    }

    /// A lazy typed-dependency resolution for `class`.
    pub fn auto(
        registry: &Arc<Registry>,
        factory: &Arc<Factory>,
        class: impl Into<String>,
    ) -> Self {
        Lazy::Auto {
            registry: Arc::downgrade(registry),
            factory: Arc::downgrade(factory),
            class: class.into(),
        }
    }

    /// Resolves this lazy to its concrete value.
    pub fn force(&self) -> Result<Value> {
        match self {
            Lazy::Service { registry, id } => strong(registry)?.get(id),
            Lazy::New { factory, class, args } => {
                strong(factory)?.new_instance(class, args.clone(), Vec::new())
            }
            Lazy::Call { target, args } => {
                let argv = resolve_args(args)?;
                match target {
                    CallTarget::Callable(f) => f(&argv),
                    CallTarget::Method { target, method, catalog } => {
                        let receiver = target.force()?;
                        catalog.invoke(&receiver, method, &argv)
                    }
                }
            }
            Lazy::Auto { registry, factory, class } => {
                let registry = strong(registry)?;
                if registry.has(class) {
                    registry.get(class)
                } else {
                    strong(factory)?.new_instance(class, Vec::new(), Vec::new())
                }
            }
        }
    }

    /// Describes this lazy without forcing it.
    pub fn info(&self) -> LazyInfo {
        match self {
            Lazy::Service { id, .. } => LazyInfo { kind: LazyKind::Service, target: id.clone() },
            Lazy::New { class, .. } => LazyInfo { kind: LazyKind::New, target: class.clone() },
            Lazy::Call { target, .. } => {
                let target = match target {
                    CallTarget::Callable(_) => String::from("<callable>"),
                    CallTarget::Method { target, method, .. } => {
                        format!("{}::{}", target.info().target, method)
                    }
                };
                LazyInfo { kind: LazyKind::Call, target }
            }
            Lazy::Auto { class, .. } => LazyInfo { kind: LazyKind::Auto, target: class.clone() },
        }
    }
}

impl fmt::Debug for Lazy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let info = self.info();
        f.debug_struct("Lazy")
            .field("kind", &info.kind)
            .field("target", &info.target)
            .finish()
    }
}

/// Non-forcing diagnostic description of a [`Lazy`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LazyInfo {
    pub kind: LazyKind,
    pub target: String,
}

/// Which variant a [`LazyInfo`] describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LazyKind {
    Service,
    New,
    Call,
    Auto,
}

impl fmt::Display for LazyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LazyKind::Service => write!(f, "service"),
            LazyKind::New => write!(f, "new"),
            LazyKind::Call => write!(f, "call"),
            LazyKind::Auto => write!(f, "auto"),
        }
    }
}

fn strong<T>(handle: &Weak<T>) -> Result<Arc<T>> {
    handle.upgrade().ok_or(AnbarError::ContainerGone)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{Catalog, TypeDescriptor};
    use crate::value::{typed, value};
    use std::sync::atomic::{AtomicU32, Ordering};

    struct Widget;

    fn wired() -> (Arc<Catalog>, Arc<Registry>, Arc<Factory>) {
        let catalog = Arc::new(Catalog::new().add(
            TypeDescriptor::of::<Widget>("Widget", |_| Ok(value(Widget))).build(),
        ));
        let registry = Arc::new(Registry::new());
        let factory = Factory::new(Arc::clone(&catalog), Arc::clone(&registry));
        (catalog, registry, factory)
    }

    #[test]
    fn call_resolves_nested_lazies() {
        let inner = Lazy::call(|_| Ok(value(3i32)), Vec::new());
        let outer = Lazy::call(
            |args| {
                let a: i32 = typed(args, 0)?;
                let b: i32 = typed(args, 1)?;
                Ok(value(a + b))
            },
            vec![Arg::of(2i32), Arg::from(inner)],
        );

        let out = outer.force().unwrap();
        assert_eq!(*out.downcast_ref::<i32>().unwrap(), 5);
    }

    #[test]
    fn call_runs_on_every_force() {
        let count = Arc::new(AtomicU32::new(0));
        let lazy = Lazy::call(
            {
                let count = Arc::clone(&count);
                move |_| {
                    count.fetch_add(1, Ordering::SeqCst);
                    Ok(value(()))
                }
            },
            Vec::new(),
        );

        lazy.force().unwrap();
        lazy.force().unwrap();
        assert_eq!(count.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn service_memoizes_through_registry() {
        let (_catalog, registry, factory) = wired();
        registry.set("Widget", Lazy::make(&factory, "Widget", Vec::new()));

        let lazy = Lazy::service(&registry, "Widget");
        let a = lazy.force().unwrap();
        let b = lazy.force().unwrap();
        assert!(Arc::ptr_eq(&a, &b));
    }

    #[test]
    fn new_builds_fresh_each_force() {
        let (_catalog, _registry, factory) = wired();
        let lazy = Lazy::make(&factory, "Widget", Vec::new());

        let a = lazy.force().unwrap();
        let b = lazy.force().unwrap();
        assert!(!Arc::ptr_eq(&a, &b));
    }

    #[test]
    fn auto_prefers_registry_entry() {
        let (_catalog, registry, factory) = wired();
        registry.set("Widget", value(Widget));

        let lazy = Lazy::auto(&registry, &factory, "Widget");
        let forced = lazy.force().unwrap();
        let stored = registry.get("Widget").unwrap();
        assert!(Arc::ptr_eq(&forced, &stored));
    }

    #[test]
    fn auto_without_entry_is_not_memoized() {
        let (_catalog, registry, factory) = wired();

        let lazy = Lazy::auto(&registry, &factory, "Widget");
        let a = lazy.force().unwrap();
        let b = lazy.force().unwrap();
        assert!(!Arc::ptr_eq(&a, &b));
        assert!(!registry.has("Widget"));
    }

    #[test]
    fn info_does_not_force() {
        let (catalog, registry, factory) = wired();

        let auto = Lazy::auto(&registry, &factory, "Widget");
        assert_eq!(auto.info(), LazyInfo { kind: LazyKind::Auto, target: String::from("Widget") });

        let service = Lazy::service(&registry, "db");
        assert_eq!(service.info().kind, LazyKind::Service);
        assert_eq!(service.info().target, "db");

        let bound = Lazy::bound_call(service, "ping", &catalog, Vec::new());
        assert_eq!(bound.info().target, "db::ping");
        assert!(!registry.has("Widget"));
    }

    #[test]
    fn forcing_outliving_lazy_fails() {
        let (_catalog, registry, _factory) = wired();
        let lazy = Lazy::service(&registry, "Widget");
        drop(registry);
        drop(_factory);

        match lazy.force() {
            Err(AnbarError::ContainerGone) => {}
            other => panic!("expected ContainerGone, got {other:?}"),
        }
    }
}
