//! Per-class construction recipes.
//!
//! A [`Config`] is the recipe the factory applies when a class is
//! requested: ordered constructor arguments, ordered post-construction
//! calls, and an optional custom factory that replaces plain
//! construction. Recipes are refined in place through `&self` mutators
//! (the factory hands out shared handles to them) and are treated as
//! read-only once the class has been instantiated. No validation happens
//! here; arity mismatches surface at construction time.

use std::fmt;

use parking_lot::RwLock;

use crate::lazy::{Arg, Lazy};
use crate::value::CallableFn;

/// One post-construction call: a method name and its arguments.
#[derive(Clone)]
pub struct MethodCall {
    pub method: String,
    pub args: Vec<Arg>,
}

impl MethodCall {
    pub fn new(method: impl Into<String>, args: Vec<Arg>) -> Self {
        Self { method: method.into(), args }
    }
}

impl fmt::Debug for MethodCall {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MethodCall")
            .field("method", &self.method)
            .field("args", &self.args.len())
            .finish()
    }
}

/// A custom factory overriding plain construction.
#[derive(Clone)]
pub enum Producer {
    /// Invoke this callable directly.
    Callable(CallableFn),
    /// Force this lazy value; it must yield a [`CallableFn`].
    Lazy(Lazy),
    /// Force `target`, then invoke its named method as the factory.
    BoundMethod { target: Lazy, method: String },
}

impl fmt::Debug for Producer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Producer::Callable(_) => write!(f, "Producer::Callable"),
            Producer::Lazy(lazy) => write!(f, "Producer::Lazy({lazy:?})"),
            Producer::BoundMethod { method, .. } => {
                write!(f, "Producer::BoundMethod({method})")
            }
        }
    }
}

#[derive(Default)]
struct Recipe {
    args: Vec<Arg>,
    calls: Vec<MethodCall>,
    factory: Option<Producer>,
}

/// The construction recipe for one class.
pub struct Config {
    inner: RwLock<Recipe>,
}

impl Config {
    /// Creates an empty recipe.
    pub fn new() -> Self {
        Self { inner: RwLock::new(Recipe::default()) }
    }

    /// Appends positional constructor arguments.
    pub fn args(&self, args: impl IntoIterator<Item = Arg>) -> &Self {
        self.inner.write().args.extend(args);
        self
    }

    /// Appends a post-construction call.
    pub fn call(&self, method: impl Into<String>, args: impl IntoIterator<Item = Arg>) -> &Self {
        self.inner
            .write()
            .calls
            .push(MethodCall::new(method, args.into_iter().collect()));
        self
    }

    /// Sets the custom factory, replacing any prior one.
    pub fn factory(&self, producer: Producer) -> &Self {
        self.inner.write().factory = Some(producer);
        self
    }

    /// Copy of the declared constructor arguments.
    pub fn get_args(&self) -> Vec<Arg> {
        self.inner.read().args.clone()
    }

    /// Copy of the declared post-construction calls.
    pub fn get_calls(&self) -> Vec<MethodCall> {
        self.inner.read().calls.clone()
    }

    /// The custom factory, if one is set.
    pub fn get_factory(&self) -> Option<Producer> {
        self.inner.read().factory.clone()
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let recipe = self.inner.read();
        f.debug_struct("Config")
            .field("args", &recipe.args.len())
            .field("calls", &recipe.calls.len())
            .field("factory", &recipe.factory.is_some())
            .finish()
    }
}
