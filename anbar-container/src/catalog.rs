//! Type descriptors — the catalog that stands in for runtime reflection.
//!
//! The original model for this container inspects constructor parameter
//! types at runtime. Rust has no such facility, so the embedding
//! application describes each constructible class once, up front: the
//! ordered constructor parameters (name, optional class, optional default),
//! a construction closure, and the named methods that post-construction
//! calls may invoke.
//!
//! A [`Catalog`] indexes descriptors two ways: by class name, which drives
//! construction and auto-wiring, and by [`TypeId`], which drives method
//! dispatch on an already-built instance. The catalog is built before the
//! container and is immutable afterwards; it is owned per container, never
//! process-global.
//!
//! # Examples
//! ```rust,ignore
//! let catalog = Catalog::new()
//!     .add(
//!         TypeDescriptor::of::<Database>("Database", |args| {
//!             Ok(value(Database { logger: shared(args, 0)?, dsn: typed(args, 1)? }))
//!         })
//!         .arg_class("logger", "Logger")
//!         .arg("dsn")
//!         .build(),
//!     );
//! ```

use std::any::TypeId;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use tracing::debug;

use crate::error::{AnbarError, Result};
use crate::value::{CallableFn, Value};

/// A named method on a described class.
///
/// Receives the shared instance and the resolved call arguments. Methods
/// that mutate use interior mutability on the class itself.
pub type MethodFn = Arc<dyn Fn(&Value, &[Value]) -> Result<Value> + Send + Sync>;

/// One constructor parameter, in declaration order.
#[derive(Clone)]
pub struct Param {
    name: &'static str,
    class: Option<&'static str>,
    default: Option<Value>,
}

impl Param {
    /// The parameter name, for diagnostics.
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// The class name to auto-wire this parameter from, if declared.
    pub fn class(&self) -> Option<&'static str> {
        self.class
    }

    /// The literal default for this parameter, if declared.
    pub fn default(&self) -> Option<&Value> {
        self.default.as_ref()
    }
}

impl fmt::Debug for Param {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Param")
            .field("name", &self.name)
            .field("class", &self.class)
            .field("has_default", &self.default.is_some())
            .finish()
    }
}

/// Everything the container needs to know about one constructible class.
pub struct TypeDescriptor {
    name: &'static str,
    type_id: TypeId,
    params: Vec<Param>,
    construct: CallableFn,
    methods: HashMap<&'static str, MethodFn>,
}

impl TypeDescriptor {
    /// Starts a descriptor for `T`, registered under `name`.
    ///
    /// `construct` receives the fully resolved positional arguments and
    /// returns the built instance. Use the accessors in [`crate::value`]
    /// to pull typed arguments out of the slice.
    pub fn of<T: Send + Sync + 'static>(
        name: &'static str,
        construct: impl Fn(&[Value]) -> Result<Value> + Send + Sync + 'static,
    ) -> DescriptorBuilder {
        DescriptorBuilder {
            name,
            type_id: TypeId::of::<T>(),
            params: Vec::new(),
            construct: Arc::new(construct),
            methods: HashMap::new(),
        }
    }

    /// The class name this descriptor is registered under.
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// The [`TypeId`] of the constructed instances.
    pub fn type_id(&self) -> TypeId {
        self.type_id
    }

    /// Constructor parameters in declaration order.
    pub fn params(&self) -> &[Param] {
        &self.params
    }

    /// Builds an instance from resolved positional arguments.
    pub fn construct(&self, args: &[Value]) -> Result<Value> {
        (self.construct)(args)
    }

    /// Invokes a named method on an instance of this class.
    pub fn invoke(&self, receiver: &Value, method: &str, args: &[Value]) -> Result<Value> {
        let f = self.methods.get(method).ok_or_else(|| AnbarError::MissingMethod {
            class: self.name.to_owned(),
            method: method.to_owned(),
        })?;
        f(receiver, args)
    }
}

impl fmt::Debug for TypeDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypeDescriptor")
            .field("name", &self.name)
            .field("params", &self.params)
            .field("methods", &self.methods.len())
            .finish()
    }
}

/// Builds a [`TypeDescriptor`]; created by [`TypeDescriptor::of`].
pub struct DescriptorBuilder {
    name: &'static str,
    type_id: TypeId,
    params: Vec<Param>,
    construct: CallableFn,
    methods: HashMap<&'static str, MethodFn>,
}

impl DescriptorBuilder {
    /// Declares an untyped parameter with no default.
    ///
    /// Auto-wiring stops at the first such parameter; it must be supplied
    /// by explicit configuration or call-time arguments.
    pub fn arg(mut self, name: &'static str) -> Self {
        self.params.push(Param { name, class: None, default: None });
        self
    }

    /// Declares a parameter auto-wired from `class`.
    pub fn arg_class(mut self, name: &'static str, class: &'static str) -> Self {
        self.params.push(Param { name, class: Some(class), default: None });
        self
    }

    /// Declares an untyped parameter with a literal default.
    pub fn arg_default<T: Send + Sync + 'static>(mut self, name: &'static str, default: T) -> Self {
        self.params.push(Param {
            name,
            class: None,
            default: Some(Arc::new(default)),
        });
        self
    }

    /// Registers a named method for post-construction and bound calls.
    pub fn method(
        mut self,
        name: &'static str,
        f: impl Fn(&Value, &[Value]) -> Result<Value> + Send + Sync + 'static,
    ) -> Self {
        self.methods.insert(name, Arc::new(f));
        self
    }

    pub fn build(self) -> TypeDescriptor {
        TypeDescriptor {
            name: self.name,
            type_id: self.type_id,
            params: self.params,
            construct: self.construct,
            methods: self.methods,
        }
    }
}

/// The per-container set of type descriptors.
#[derive(Default)]
pub struct Catalog {
    by_name: HashMap<&'static str, Arc<TypeDescriptor>>,
    by_type: HashMap<TypeId, Arc<TypeDescriptor>>,
}

impl Catalog {
    /// Creates an empty catalog.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a descriptor, replacing any prior one for the same name.
    pub fn add(mut self, descriptor: TypeDescriptor) -> Self {
        let descriptor = Arc::new(descriptor);
        debug!(class = %descriptor.name(), "descriptor added to catalog");
        self.by_type.insert(descriptor.type_id(), Arc::clone(&descriptor));
        self.by_name.insert(descriptor.name(), descriptor);
        self
    }

    /// Whether `class` has a descriptor.
    pub fn contains(&self, class: &str) -> bool {
        self.by_name.contains_key(class)
    }

    /// Registered class names, unordered.
    pub fn classes(&self) -> Vec<&'static str> {
        self.by_name.keys().copied().collect()
    }

    /// Looks a descriptor up by class name.
    pub fn lookup(&self, class: &str) -> Result<Arc<TypeDescriptor>> {
        self.by_name
            .get(class)
            .cloned()
            .ok_or_else(|| AnbarError::UnknownClass { class: class.to_owned() })
    }

    /// Invokes a named method, dispatching on the instance's runtime type.
    ///
    /// Dispatch is by [`TypeId`], not by requested class name, so an
    /// instance produced by a custom factory under a substitute type still
    /// finds its own methods.
    pub fn invoke(&self, receiver: &Value, method: &str, args: &[Value]) -> Result<Value> {
        let type_id = receiver.as_ref().type_id();
        let descriptor = self
            .by_type
            .get(&type_id)
            .ok_or_else(|| AnbarError::UndescribedReceiver { method: method.to_owned() })?;
        descriptor.invoke(receiver, method, args)
    }
}

impl fmt::Debug for Catalog {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Catalog")
            .field("described", &self.by_name.len())
            .finish()
    }
}
